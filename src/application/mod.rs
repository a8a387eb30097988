pub mod use_cases;

pub use use_cases::sync_controller::{SyncController, SyncSummary};
