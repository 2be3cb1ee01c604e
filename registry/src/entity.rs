pub mod package;
pub mod release;
pub mod requirement;
