//! Request encoding: the payload for the current view, its flattened query
//! form, share links and the signature that gates refetching.

mod params;
mod payload;
mod signature;

pub use params::*;
pub use payload::*;
pub use signature::*;
