//! CLI command implementations.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Record an income or expense |
//! | `list` | List active records, optionally filtered |
//! | `trash` | List trashed records, optionally filtered |
//! | `show` | Show one record |
//! | `edit` | Change a record's title or amount |
//! | `delete` | Move a record to the trash |
//! | `restore` | Take a record out of the trash |
//! | `status` | Show storage status and record counts |
//!
//! # Example Usage
//!
//! ```bash
//! tally add "Coffee" 35000 --type expense
//! tally list coff
//! tally list 500 --type income --format json
//! tally delete 0192f3c4-...
//! tally trash
//! ```

mod commands;
mod render;

pub use commands::{RecordCommands, parse_amount, validate_title};
pub use render::{OutputFormat, StatusReport, signed_display, write_record, write_records};
