// Hostexec Core - Domain Types, Options & Ports
// NO process or OS dependencies (adapters live in hostexec-infra-system)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{ProcessError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
