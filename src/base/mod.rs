//! Base types and error handling.
//!
//! Provides foundational types shared by every layer:
//! - [`NetError`](neterror::NetError): synchronous request start failures
//! - [`ReadyState`](readystate::ReadyState): transport readiness levels

pub mod context;
pub mod neterror;
pub mod readystate;
