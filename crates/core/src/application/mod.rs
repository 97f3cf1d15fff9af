// Application Layer - polling and process-table inspection

pub mod constants;
pub mod inspector;
pub mod poll;

// Re-exports
pub use inspector::ProcessInspector;
pub use poll::{retry_while, PollLoop};
