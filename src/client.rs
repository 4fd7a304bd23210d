//! XHR client with builder pattern.
//!
//! The client owns an immutable defaults template, the decoding capabilities
//! and the host transport factory. Each call merges its options over the
//! template and drives a fresh transport.
//!
//! # Example
//!
//! ```rust,ignore
//! use xhrnet::{ScriptedHost, XhrClient};
//!
//! let host = ScriptedHost::new();
//! let client = XhrClient::builder().transport(host.clone()).build();
//!
//! let pending = client.get("https://example.com/items")
//!     .header("X-Requested-With", "XMLHttpRequest")
//!     .cache(false)
//!     .send()?;
//! let envelope = pending.await?;
//! ```

use crate::base::neterror::NetError;
use crate::http::codec::{Codecs, JsonCodec, XmlCodec};
use crate::http::digest::ResponseType;
use crate::http::requestbody::{FormFields, RequestData, Scalar};
use crate::transport::TransportFactory;
use crate::urlrequest::completion::PendingRequest;
use crate::urlrequest::config::{RequestConfig, RequestOptions};
use crate::urlrequest::job::URLRequestJob;
use crate::urlrequest::prepare::prepare;
use http::Method;
use std::rc::Rc;

/// XHR client for making requests.
///
/// Use [`XhrClient::builder()`] to configure and create a client. Clones share
/// the same template, codecs and transport factory.
#[derive(Clone, Default)]
pub struct XhrClient {
    defaults: Rc<RequestConfig>,
    codecs: Codecs,
    transport: Option<Rc<dyn TransportFactory>>,
}

impl XhrClient {
    /// A client with the built-in defaults, the standard codecs and no
    /// transport. Every request fails with [`NetError::TransportUnavailable`]
    /// until one is supplied through the builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> XhrClientBuilder {
        XhrClientBuilder::default()
    }

    /// The defaults template every request is merged over.
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    pub fn codecs(&self) -> &Codecs {
        &self.codecs
    }

    /// Issue a request.
    ///
    /// Capability and transport errors are returned here. Everything about
    /// the exchange itself (status policy, body decoding) is reported
    /// through the returned future.
    pub fn request(&self, options: RequestOptions) -> Result<PendingRequest, NetError> {
        let factory = self.transport.as_ref().ok_or(NetError::TransportUnavailable)?;

        let config = self.defaults.merge(&options);
        self.codecs.ensure_available(config.response_type)?;

        let transport = factory.create()?;
        let prepared = prepare(config);

        tracing::debug!(
            method = %prepared.method,
            url = prepared.url.as_deref().unwrap_or("<none>"),
            is_async = prepared.is_async,
            "starting request"
        );

        URLRequestJob::new(transport, prepared, self.codecs.clone()).start()
    }

    /// Start building a GET request.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::DELETE, url)
    }

    /// Start building a HEAD request.
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::HEAD, url)
    }

    /// Start building a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.verb(Method::PATCH, url)
    }

    fn verb(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            options: RequestOptions::new().url(url).method(method),
        }
    }
}

impl std::fmt::Debug for XhrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XhrClient")
            .field("defaults", &self.defaults)
            .field("codecs", &self.codecs)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

/// Builder for [`XhrClient`].
#[derive(Default)]
pub struct XhrClientBuilder {
    defaults: Option<RequestOptions>,
    codecs: Codecs,
    transport: Option<Rc<dyn TransportFactory>>,
}

impl XhrClientBuilder {
    /// Set the host transport factory.
    pub fn transport<F: TransportFactory + 'static>(mut self, factory: F) -> Self {
        self.transport = Some(Rc::new(factory));
        self
    }

    /// Replace the JSON codec.
    pub fn json_codec<C: JsonCodec + 'static>(mut self, codec: C) -> Self {
        self.codecs = self.codecs.with_json(codec);
        self
    }

    /// Replace the XML codec.
    pub fn xml_codec<C: XmlCodec + 'static>(mut self, codec: C) -> Self {
        self.codecs = self.codecs.with_xml(codec);
        self
    }

    pub fn without_json_codec(mut self) -> Self {
        self.codecs = self.codecs.without_json();
        self
    }

    pub fn without_xml_codec(mut self) -> Self {
        self.codecs = self.codecs.without_xml();
        self
    }

    /// Override the built-in defaults template.
    ///
    /// The options are merged over [`RequestConfig::default`] once, at build
    /// time; the result is shared read-only by every request.
    pub fn defaults(mut self, options: RequestOptions) -> Self {
        self.defaults = Some(options);
        self
    }

    pub fn build(self) -> XhrClient {
        let base = RequestConfig::default();
        let defaults = match &self.defaults {
            Some(options) => base.merge(options),
            None => base,
        };

        XhrClient {
            defaults: Rc::new(defaults),
            codecs: self.codecs,
            transport: self.transport,
        }
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: XhrClient,
    options: RequestOptions,
}

impl RequestBuilder {
    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.header(name, value);
        self
    }

    /// Set a raw string body or a field map.
    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.options = self.options.data(data);
        self
    }

    /// Set a url-encoded form body from key/value pairs.
    pub fn form<K, V, I>(mut self, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Scalar>,
        I: IntoIterator<Item = (K, V)>,
    {
        let fields: FormFields = fields.into_iter().collect();
        self.options = self.options.data(fields);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.options = self.options.response_type(response_type);
        self
    }

    /// `false` disables caching for this request.
    pub fn cache(mut self, cache: bool) -> Self {
        self.options = self.options.cache(cache);
        self
    }

    /// Complete the exchange inside [`send`](Self::send).
    pub fn sync(mut self) -> Self {
        self.options = self.options.is_async(false);
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.options = self.options.credentials(user, password);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.options = self.options.content_type(content_type);
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.options = self.options.charset(charset);
        self
    }

    /// The options accumulated so far.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Send the request.
    pub fn send(self) -> Result<PendingRequest, NetError> {
        self.client.request(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedHost;

    #[test]
    fn test_builder_defaults_merge_over_builtin() {
        let client = XhrClient::builder()
            .defaults(
                RequestOptions::new()
                    .header("X-Requested-With", "XMLHttpRequest")
                    .charset("ISO-8859-1"),
            )
            .build();

        let defaults = client.defaults();
        assert_eq!(defaults.charset, "ISO-8859-1");
        assert_eq!(defaults.content_type, "application/x-www-form-urlencoded");
        assert_eq!(defaults.headers.get("X-Requested-With"), Some("XMLHttpRequest"));
        assert!(defaults.is_async);
    }

    #[test]
    fn test_client_without_transport() {
        let client = XhrClient::new();
        let err = client.get("/a").send().unwrap_err();
        assert_eq!(err, NetError::TransportUnavailable);
    }

    #[test]
    fn test_verb_helpers_set_method_and_url() {
        let client = XhrClient::builder().transport(ScriptedHost::new()).build();
        let builder = client.patch("/items/1").form([("n", 1)]).sync();

        let options = builder.options();
        assert_eq!(options.method, Some(Method::PATCH));
        assert_eq!(options.url.as_deref(), Some("/items/1"));
        assert_eq!(options.is_async, Some(false));
        assert!(matches!(options.data, Some(RequestData::Fields(_))));
    }

    #[test]
    fn test_codec_removal_is_reported_before_transport_creation() {
        let host = ScriptedHost::new();
        let client = XhrClient::builder()
            .transport(host.clone())
            .without_xml_codec()
            .build();

        let err = client.get("/doc").send().unwrap_err();
        assert!(matches!(err, NetError::CodecUnavailable(_)));
        assert!(host.exchanges().is_empty());

        // Text responses need no codec.
        assert!(client.get("/doc").response_type(ResponseType::Text).send().is_ok());
        assert_eq!(host.exchanges().len(), 1);
    }
}
