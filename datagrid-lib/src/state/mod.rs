//! View state: the live, in-memory table state and the controller that keeps
//! the persisted preference record in step with it.

mod controller;
mod filter;
mod live;

pub use controller::*;
pub use filter::*;
pub use live::*;
