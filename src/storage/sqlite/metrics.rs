//! Metrics recording for store operations.

use std::time::Instant;

/// Records operation metrics for store operations.
///
/// Two metrics are recorded per operation:
/// 1. `storage_operations_total` - counter by backend, operation and status
/// 2. `storage_operation_duration_ms` - latency histogram with the same labels
///
/// # Arguments
///
/// * `backend` - Backend name (e.g., "sqlite")
/// * `operation` - Operation name (e.g., "create", "list_active")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::MetricKind;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    type Labels = Vec<(String, String)>;

    fn labels(key: &metrics::Key) -> Labels {
        let mut labels: Labels = key
            .labels()
            .map(|l| (l.key().to_string(), l.value().to_string()))
            .collect();
        labels.sort();
        labels
    }

    fn expected(operation: &str, status: &str) -> Labels {
        vec![
            ("backend".to_string(), "sqlite".to_string()),
            ("operation".to_string(), operation.to_string()),
            ("status".to_string(), status.to_string()),
        ]
    }

    #[test]
    fn test_record_operation_metrics_counts_and_times() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let start = Instant::now();
            record_operation_metrics("sqlite", "create", start, "success");
            record_operation_metrics("sqlite", "create", start, "success");
            record_operation_metrics("sqlite", "get", start, "error");
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let counter = |operation: &str, status: &str| {
            snapshot.iter().find_map(|(key, _, _, value)| {
                let hit = key.kind() == MetricKind::Counter
                    && key.key().name() == "storage_operations_total"
                    && labels(key.key()) == expected(operation, status);
                match value {
                    DebugValue::Counter(n) if hit => Some(*n),
                    _ => None,
                }
            })
        };
        assert_eq!(counter("create", "success"), Some(2));
        assert_eq!(counter("get", "error"), Some(1));
        assert_eq!(counter("get", "success"), None);

        let samples = |operation: &str, status: &str| {
            snapshot.iter().find_map(|(key, _, _, value)| {
                let hit = key.kind() == MetricKind::Histogram
                    && key.key().name() == "storage_operation_duration_ms"
                    && labels(key.key()) == expected(operation, status);
                match value {
                    DebugValue::Histogram(values) if hit => Some(values.len()),
                    _ => None,
                }
            })
        };
        assert_eq!(samples("create", "success"), Some(2));
        assert_eq!(samples("get", "error"), Some(1));
    }
}
