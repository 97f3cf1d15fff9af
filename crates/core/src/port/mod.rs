// Port Layer - Interfaces for OS-facing adapters

pub mod command_runner;
pub mod process_spawner;
pub mod process_table;
pub mod signal_sender;
pub mod time_provider; // For deterministic poll-loop tests

// Re-exports
pub use command_runner::CommandRunner;
pub use process_spawner::ProcessSpawner;
pub use process_table::ProcessTable;
pub use signal_sender::SignalSender;
pub use time_provider::TimeProvider;
