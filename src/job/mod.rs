pub mod storage;
pub mod types;

pub use storage::{load_snapshot, save_snapshot};
pub use types::{JobRecord, JobSnapshot, JobState, JobView, TimeLimit};
