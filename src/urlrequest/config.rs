//! Request configuration: the defaults template and per-call options.
//!
//! A [`RequestConfig`] is a fully populated configuration. The client keeps
//! one as its read-only defaults template; each call supplies a partial
//! [`RequestOptions`] which is merged over a clone of the template.

use crate::base::context::ConfigResultExt;
use crate::base::neterror::NetError;
use crate::http::digest::ResponseType;
use crate::http::headers::Headers;
use crate::http::requestbody::RequestData;
use http::Method;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Default outgoing content type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default outgoing charset.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// A fully populated request configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    /// Target address. There is no default; see [`NetError::InvalidUrl`].
    pub url: Option<String>,

    /// HTTP method.
    pub method: Method,

    /// Transport credentials.
    pub user: Option<String>,
    pub password: Option<String>,

    /// Response decoding policy.
    pub response_type: ResponseType,

    /// Async (listener driven) or sync (blocking `send`) completion.
    pub is_async: bool,

    /// Outgoing `Content-Type` is always `{content_type}; charset={charset}`.
    pub content_type: String,
    pub charset: String,

    /// Extra request headers.
    pub headers: Headers,

    /// Request body.
    pub data: Option<RequestData>,

    /// `false` adds `Cache-Control: no-cache, no-store` and a cache-busting
    /// query parameter.
    pub cache: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: None,
            method: Method::GET,
            user: None,
            password: None,
            response_type: ResponseType::Auto,
            is_async: true,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
            headers: Headers::new(),
            data: None,
            cache: true,
        }
    }
}

impl RequestConfig {
    /// Merge `options` over this template, producing a new configuration.
    ///
    /// Each field present in `options` replaces the template's value. Headers
    /// are rebuilt into a fresh map: the template's entries first, then the
    /// options' entries. Nothing is validated here.
    pub fn merge(&self, options: &RequestOptions) -> RequestConfig {
        let mut headers = Headers::new();
        headers.merge_from(&self.headers);
        if let Some(extra) = &options.headers {
            headers.merge_from(extra);
        }

        RequestConfig {
            url: options.url.clone().or_else(|| self.url.clone()),
            method: options.method.clone().unwrap_or_else(|| self.method.clone()),
            user: options.user.clone().or_else(|| self.user.clone()),
            password: options.password.clone().or_else(|| self.password.clone()),
            response_type: options.response_type.unwrap_or(self.response_type),
            is_async: options.is_async.unwrap_or(self.is_async),
            content_type: options
                .content_type
                .clone()
                .unwrap_or_else(|| self.content_type.clone()),
            charset: options.charset.clone().unwrap_or_else(|| self.charset.clone()),
            headers,
            data: options.data.clone().or_else(|| self.data.clone()),
            cache: options.cache.unwrap_or(self.cache),
        }
    }
}

/// Partial, per-call request options.
///
/// Deserializes from JSON using the option names `url`, `method`, `user`,
/// `password`, `responseType`, `async`, `contentType`, `charset`, `headers`,
/// `data` and `cache`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequestOptions {
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_method")]
    pub method: Option<Method>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub response_type: Option<ResponseType>,
    #[serde(rename = "async")]
    pub is_async: Option<bool>,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub headers: Option<Headers>,
    pub data: Option<RequestData>,
    pub cache: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::invalid_config(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).config_context(path)?;
        serde_json::from_str(&text).config_context(path)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Add one header to the options' own header map.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<Option<Method>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|m| Method::from_bytes(m.as_bytes()).map_err(D::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::requestbody::FormFields;

    #[test]
    fn test_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.url, None);
        assert_eq!(config.method, Method::GET);
        assert_eq!(config.response_type, ResponseType::Auto);
        assert!(config.is_async);
        assert_eq!(config.content_type, "application/x-www-form-urlencoded");
        assert_eq!(config.charset, "UTF-8");
        assert!(config.headers.is_empty());
        assert_eq!(config.data, None);
        assert!(config.cache);
    }

    #[test]
    fn test_merge_overrides_present_fields_only() {
        let template = RequestConfig::default();
        let options = RequestOptions::new()
            .url("http://x/")
            .method(Method::POST)
            .cache(false);

        let merged = template.merge(&options);
        assert_eq!(merged.url.as_deref(), Some("http://x/"));
        assert_eq!(merged.method, Method::POST);
        assert!(!merged.cache);
        assert!(merged.is_async);
        assert_eq!(merged.charset, "UTF-8");
    }

    #[test]
    fn test_merge_combines_headers() {
        let mut template = RequestConfig::default();
        template.headers.insert("X-Requested-With", "XMLHttpRequest");
        template.headers.insert("Accept", "*/*");

        let options = RequestOptions::new().header("Accept", "application/json").header("X-Trace", "1");
        let merged = template.merge(&options);

        let entries: Vec<_> = merged.headers.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("X-Requested-With", "XMLHttpRequest"),
                ("Accept", "application/json"),
                ("X-Trace", "1"),
            ]
        );
        // Template untouched
        assert_eq!(template.headers.get("Accept"), Some("*/*"));
        assert_eq!(template.headers.len(), 2);
    }

    #[test]
    fn test_merge_never_aliases_headers() {
        let template = RequestConfig::default();
        let first_options = RequestOptions::new().header("X-A", "1");
        let second_options = RequestOptions::new().header("X-B", "2");

        let mut first = template.merge(&first_options);
        first.headers.insert("Mutated", "yes");
        let second = template.merge(&second_options);

        assert!(second.headers.get("Mutated").is_none());
        assert!(second.headers.get("X-A").is_none());
        assert!(template.headers.is_empty());
        assert_eq!(first_options.headers.as_ref().map(Headers::len), Some(1));
    }

    #[test]
    fn test_merge_keeps_missing_url() {
        let merged = RequestConfig::default().merge(&RequestOptions::new());
        assert_eq!(merged.url, None);
    }

    #[test]
    fn test_from_json_str() {
        let options = RequestOptions::from_json_str(
            r#"{
                "url": "/search",
                "method": "POST",
                "responseType": "json",
                "async": false,
                "contentType": "text/plain",
                "headers": {"X-B": "2", "X-A": "1"},
                "data": {"q": "a b"},
                "cache": false
            }"#,
        )
        .unwrap();

        assert_eq!(options.method, Some(Method::POST));
        assert_eq!(options.response_type, Some(ResponseType::Json));
        assert_eq!(options.is_async, Some(false));
        let names: Vec<_> = options.headers.as_ref().unwrap().names().collect();
        assert_eq!(names, vec!["X-B", "X-A"]);
        let fields: FormFields = [("q", "a b")].into_iter().collect();
        assert_eq!(options.data, Some(RequestData::Fields(fields)));
    }

    #[test]
    fn test_from_json_str_rejects_unknown_fields() {
        let err = RequestOptions::from_json_str(r#"{"timeout": 5}"#).unwrap_err();
        assert!(matches!(err, NetError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_json_str_rejects_bad_method() {
        let err = RequestOptions::from_json_str(r#"{"method": "GE T"}"#).unwrap_err();
        assert!(matches!(err, NetError::InvalidConfig { .. }));
    }
}
