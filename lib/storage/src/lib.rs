pub mod manager;
pub mod parser;
pub mod snapshot;

pub use manager::{CaseBase, ImportReport, StorageManager, StorageStatus};
pub use parser::{CaseFormat, CaseParser};
pub use snapshot::{CaseBaseSnapshot, SnapshotStore};
