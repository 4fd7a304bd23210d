//! Derives the wire-ready request from a merged configuration.
//!
//! Three independent steps run in order: `Content-Type` injection, cache
//! control, and body serialization. None of them can fail; a malformed URL is
//! passed through untouched.

use crate::http::digest::ResponseType;
use crate::http::headers::Headers;
use crate::urlrequest::config::RequestConfig;
use http::Method;
use time::OffsetDateTime;

/// Value of the `Cache-Control` header sent when caching is disabled.
pub const NO_CACHE: &str = "no-cache, no-store";

/// A request ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: Option<String>,
    pub method: Method,
    pub user: Option<String>,
    pub password: Option<String>,
    pub response_type: ResponseType,
    pub is_async: bool,
    pub headers: Headers,
    pub body: Option<String>,
}

/// Prepare `config` using the current time for cache busting.
pub fn prepare(config: RequestConfig) -> PreparedRequest {
    prepare_at(config, epoch_millis())
}

/// Prepare `config` with an explicit cache-busting timestamp.
pub fn prepare_at(config: RequestConfig, now_millis: i64) -> PreparedRequest {
    let RequestConfig {
        mut url,
        method,
        user,
        password,
        response_type,
        is_async,
        content_type,
        charset,
        mut headers,
        data,
        cache,
    } = config;

    apply_content_type(&mut headers, &content_type, &charset);

    if !cache {
        headers.insert("Cache-Control", NO_CACHE);
        if let Some(url) = url.as_mut() {
            append_cache_buster(url, now_millis);
        }
    }

    let body = data.map(|data| data.into_body());

    tracing::debug!(
        %method,
        url = url.as_deref().unwrap_or("<none>"),
        cache,
        has_body = body.is_some(),
        "prepared request"
    );

    PreparedRequest {
        url,
        method,
        user,
        password,
        response_type,
        is_async,
        headers,
        body,
    }
}

/// Force `Content-Type`, replacing any value the caller supplied under that name.
pub fn apply_content_type(headers: &mut Headers, content_type: &str, charset: &str) {
    headers.insert("Content-Type", format!("{}; charset={}", content_type, charset));
}

/// The shortest all-underscore query parameter name not already used in `url`.
pub fn cache_bust_name(url: &str) -> String {
    let mut name = String::from("_");
    while url.contains(&format!("?{}=", name)) || url.contains(&format!("&{}=", name)) {
        name.push('_');
    }
    name
}

/// Append `{sep}{name}={now_millis}` to `url`.
pub fn append_cache_buster(url: &mut String, now_millis: i64) {
    let name = cache_bust_name(url);
    let sep = if url.contains('?') { '&' } else { '?' };
    url.push(sep);
    url.push_str(&name);
    url.push('=');
    url.push_str(&now_millis.to_string());
}

fn epoch_millis() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::requestbody::{FormFields, RequestData};

    fn config(url: &str) -> RequestConfig {
        RequestConfig {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_content_type_always_injected() {
        let prepared = prepare_at(config("/a"), 0);
        assert_eq!(
            prepared.headers.get("Content-Type"),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
    }

    #[test]
    fn test_content_type_overrides_caller_value() {
        let mut cfg = config("/a");
        cfg.headers.insert("Content-Type", "application/json");
        cfg.content_type = "text/plain".into();
        cfg.charset = "ISO-8859-1".into();

        let prepared = prepare_at(cfg, 0);
        assert_eq!(prepared.headers.len(), 1);
        assert_eq!(
            prepared.headers.get("Content-Type"),
            Some("text/plain; charset=ISO-8859-1")
        );
    }

    #[test]
    fn test_cache_enabled_leaves_url_alone() {
        let prepared = prepare_at(config("http://x/list?page=2"), 1234);
        assert_eq!(prepared.url.as_deref(), Some("http://x/list?page=2"));
        assert!(prepared.headers.get("Cache-Control").is_none());
    }

    #[test]
    fn test_cache_disabled() {
        let mut cfg = config("http://x/list");
        cfg.cache = false;

        let prepared = prepare_at(cfg, 1700000000000);
        assert_eq!(prepared.url.as_deref(), Some("http://x/list?_=1700000000000"));
        assert_eq!(prepared.headers.get("Cache-Control"), Some("no-cache, no-store"));
    }

    #[test]
    fn test_cache_bust_uses_ampersand_when_query_present() {
        let mut url = String::from("http://x/list?page=2");
        append_cache_buster(&mut url, 5);
        assert_eq!(url, "http://x/list?page=2&_=5");
    }

    #[test]
    fn test_cache_bust_name_skips_taken_names() {
        assert_eq!(cache_bust_name("http://x/"), "_");
        assert_eq!(cache_bust_name("http://x/?_=123"), "__");
        assert_eq!(cache_bust_name("http://x/?a=1&_=1&__=2"), "___");
        // Only exact parameter names count.
        assert_eq!(cache_bust_name("http://x/?__=1"), "_");
        assert_eq!(cache_bust_name("http://x/_=1"), "_");
    }

    #[test]
    fn test_cache_bust_on_taken_name() {
        let mut url = String::from("http://x/?_=123");
        append_cache_buster(&mut url, 9);
        assert_eq!(url, "http://x/?_=123&__=9");
    }

    #[test]
    fn test_cache_disabled_without_url() {
        let cfg = RequestConfig {
            cache: false,
            ..Default::default()
        };
        let prepared = prepare_at(cfg, 1);
        assert_eq!(prepared.url, None);
        assert_eq!(prepared.headers.get("Cache-Control"), Some(NO_CACHE));
    }

    #[test]
    fn test_field_data_is_serialized() {
        let mut cfg = config("/form");
        let fields: FormFields = [("a", "1"), ("b", "x y")].into_iter().collect();
        cfg.data = Some(RequestData::Fields(fields));

        let prepared = prepare_at(cfg, 0);
        assert_eq!(prepared.body.as_deref(), Some("a=1&b=x%20y"));
    }

    #[test]
    fn test_text_and_missing_data_pass_through() {
        let mut cfg = config("/raw");
        cfg.data = Some(RequestData::Text("{\"k\":1}".into()));
        assert_eq!(prepare_at(cfg, 0).body.as_deref(), Some("{\"k\":1}"));

        assert_eq!(prepare_at(config("/none"), 0).body, None);
    }

    #[test]
    fn test_prepare_uses_current_time() {
        let mut cfg = config("/t");
        cfg.cache = false;
        let prepared = prepare(cfg);
        let url = prepared.url.unwrap();
        let stamp: i64 = url.strip_prefix("/t?_=").unwrap().parse().unwrap();
        assert!(stamp > 1_600_000_000_000);
    }
}
