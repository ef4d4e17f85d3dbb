//! Caller identity as injected by the API gateway.

pub mod identity;
