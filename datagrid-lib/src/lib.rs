//! Server-driven data table state engine
//!
//! Reconciles table-definition defaults, persisted view preferences and live
//! view state, derives canonical column orderings, encodes the request payload
//! for the current view and gates data fetches so at most one is triggered per
//! request-relevant change.

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod order;
pub mod prefs;
pub mod request;
pub mod state;

mod session;

pub use config::TableConfig;
pub use session::*;
