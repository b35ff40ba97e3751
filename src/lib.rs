pub mod config;
pub mod error;
pub mod grading;
pub mod import;
pub mod loader;
pub mod output;
pub mod roster;

pub use error::{GradeError, GradeResult};
