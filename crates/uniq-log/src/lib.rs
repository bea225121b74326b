#[macro_use]

mod log;
pub mod fmt;
mod config;
mod error;

pub use error::LogError;
pub use config::LogConfig;
pub use fmt::{LogFmt, LogFmtBuilder, LogSpec};

pub type Result<T> = core::result::Result<T, LogError>;

pub use log::*;
