//! # xhrnet
//!
//! A browser-style request client layered over a host's XMLHttpRequest-like
//! transport.
//!
//! `xhrnet` normalizes request configuration, guards against stale caching,
//! serializes request bodies and decodes responses by content negotiation.
//! The outcome of each request is a single-settlement future, with readiness
//! progress available as a stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xhrnet::{Reply, ScriptedHost, XhrClient};
//!
//! let host = ScriptedHost::new();
//! host.enqueue(Reply::new(200).header("Content-Type", "application/json").body("{\"ok\":true}"));
//!
//! let client = XhrClient::builder().transport(host.clone()).build();
//! let pending = client.get("https://example.com/status").send()?;
//! host.last_exchange().unwrap().deliver();
//!
//! let envelope = pending.await?;
//! println!("Status: {}", envelope.status());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and readiness levels
//! - [`http`] - Headers, request bodies, codecs and response digestion
//! - [`transport`] - The host transport traits and an in-memory host
//! - [`urlrequest`] - Configuration merging, preparation and completion
//!
//! ## Features
//!
//! - `xml` (default): the `roxmltree`-backed XML codec. The default `auto`
//!   response type needs both a JSON and an XML codec, so a build without
//!   this feature must pass one to `XhrClientBuilder::xml_codec`, or use
//!   `ResponseType::Text`/`Json`. Otherwise requests fail with
//!   `NetError::CodecUnavailable`.
//!
//! ## Threading
//!
//! The client follows a single-threaded event-loop model: it is `!Send`, and
//! all callbacks run on the thread that drives the transport.

pub mod base;
pub mod client;
pub mod http;
pub mod transport;
pub mod urlrequest;

pub use base::neterror::NetError;
pub use base::readystate::ReadyState;
pub use client::{RequestBuilder, XhrClient, XhrClientBuilder};
pub use http::{ParsedResponse, ResponseEnvelope, ResponseType};
pub use transport::{Reply, ScriptedHost, Transport, TransportFactory};
pub use urlrequest::{PendingRequest, Rejection, RequestConfig, RequestOptions};
