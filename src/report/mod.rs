pub mod generator;
pub mod stats;

pub use generator::generate_report;
pub use stats::{harmony_message, progress_bar};
