pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod split;
pub mod sync;

pub use error::{Result, ToolError};
