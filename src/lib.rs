pub mod dome;
pub mod error;
pub mod kernel;
pub mod math;

pub use error::{DomeError, Result};
