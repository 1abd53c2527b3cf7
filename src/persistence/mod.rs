pub mod files;
pub mod merge;
pub mod store;

pub use files::{init_local_dir, report_file};
pub use store::{FileStore, KeyValueStore, LoadOutcome, StateStore, StoreError};

#[cfg(test)]
pub use store::STATE_KEY;
