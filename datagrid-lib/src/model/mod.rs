//! Typed models

mod column;
mod page;
mod preferences;

pub use column::*;
pub use page::*;
pub use preferences::*;
