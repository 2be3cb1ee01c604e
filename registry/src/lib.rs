pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod logger;
pub mod release;

pub use error::{ReleaseError, ReleaseResult};
