//! Data fetching: the transport seam and the orchestrator that decides when
//! to use it.

mod http;
mod orchestrator;
mod transport;

pub use http::*;
pub use orchestrator::*;
pub use transport::*;
