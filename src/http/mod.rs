//! HTTP transport for the action gateway
//!
//! Request extraction, verb override, reply translation and the route handlers.

pub mod handlers;
pub mod method_override;
pub mod request;
pub mod response;
