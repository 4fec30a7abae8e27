// ABOUTME: Migration engine module
// ABOUTME: Table pre-flight check, export to and import from JSON backup files

pub mod dump;
pub mod guard;
pub mod outcome;
pub mod progress;
pub mod restore;

pub use dump::{export, prepare_destination};
pub use guard::{check_table, TableHandle};
pub use outcome::RunOutcome;
pub use progress::Progress;
pub use restore::{import, import_records, load_records};
