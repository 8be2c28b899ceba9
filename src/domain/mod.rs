//! Request normalization for the action broker
//!
//! Route configuration, query shaping and payload construction. Nothing here
//! fails: malformed input degrades to safe defaults.

pub mod payload;
pub mod query;
pub mod routes;
