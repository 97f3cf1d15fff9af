// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Don't know how to handle filterer of type {0}")]
    UnsupportedFilterer(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
