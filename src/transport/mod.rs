//! Host transport abstraction.
//!
//! The network primitive is a host capability, injected as a
//! [`TransportFactory`]. This module defines the traits the request pipeline
//! drives, plus a scripted in-memory host for tests and embedding examples.
//!
//! # Architecture
//!
//! A [`Transport`] is single-use and stateful, shaped after XMLHttpRequest:
//! `open`, `set_request_header`, `send`, and a readiness listener invoked on
//! every [`ReadyState`](crate::base::readystate::ReadyState) transition.

mod primitive;
pub mod scripted;

pub use primitive::{ReadyStateListener, ResponseSource, Transport, TransportFactory};
pub use scripted::{Reply, ScriptedExchange, ScriptedHost, TransportCall};
