//! Extraction of in-cluster service addresses from free text
//!
//! Recognises `http(s)://<service>.<namespace>.svc.cluster.local[:<port>]`
//! anywhere inside a blob: plain env values, command tokens, or the
//! serialised form of structured configuration.

use crate::models::{Protocol, ServiceReference};
use crate::policy::DEFAULT_DESTINATION_PORT;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SERVICE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(https?)://([a-z0-9-]+)\.([a-z0-9-]+)\.svc\.cluster\.local(?::(\d+))?")
        .expect("valid regex")
});

/// Decodes service references out of text
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    default_port: u16,
}

impl Default for UrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlExtractor {
    pub fn new() -> Self {
        Self {
            default_port: DEFAULT_DESTINATION_PORT,
        }
    }

    pub fn with_default_port(default_port: u16) -> Self {
        Self { default_port }
    }

    /// All references in `text`, in order of appearance
    pub fn extract(&self, text: &str) -> Vec<ServiceReference> {
        if text.is_empty() {
            return Vec::new();
        }

        SERVICE_URL_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let url = caps.get(0)?.as_str();
                let protocol = if caps[1].eq_ignore_ascii_case("https") {
                    Protocol::Https
                } else {
                    Protocol::Http
                };
                let port = match caps.get(4) {
                    Some(p) => match p.as_str().parse::<u16>() {
                        Ok(port) => port,
                        Err(_) => {
                            debug!(url = %url, "Skipping address with out-of-range port");
                            return None;
                        }
                    },
                    None => self.default_port,
                };

                Some(ServiceReference {
                    service: caps[2].to_ascii_lowercase(),
                    namespace: caps[3].to_ascii_lowercase(),
                    port,
                    protocol,
                    url: url.to_string(),
                })
            })
            .collect()
    }

    /// References in the serialised form of a structured value
    pub fn extract_from_value(&self, value: &serde_json::Value) -> Vec<ServiceReference> {
        match value {
            serde_json::Value::String(s) => self.extract(s),
            serde_json::Value::Null => Vec::new(),
            other => self.extract(&other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_port_and_tokens() {
        let refs = UrlExtractor::new().extract("http://billing.prod.svc.cluster.local:8443");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].service, "billing");
        assert_eq!(refs[0].namespace, "prod");
        assert_eq!(refs[0].port, 8443);
        assert_eq!(refs[0].protocol, Protocol::Http);
        assert_eq!(refs[0].service_key(), "billing.prod");
    }

    #[test]
    fn test_missing_port_defaults_to_80() {
        let refs = UrlExtractor::new().extract("https://keycloak.auth.svc.cluster.local/realms/main");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].port, 80);
        assert_eq!(refs[0].protocol, Protocol::Https);
        assert_eq!(refs[0].url, "https://keycloak.auth.svc.cluster.local");
    }

    #[test]
    fn test_scheme_and_host_are_case_insensitive() {
        let refs = UrlExtractor::new().extract("HTTPS://Api.Core.svc.cluster.local:443");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].protocol, Protocol::Https);
        assert_eq!(refs[0].service, "api");
        assert_eq!(refs[0].namespace, "core");
        assert_eq!(refs[0].url, "HTTPS://Api.Core.svc.cluster.local:443");
    }

    #[test]
    fn test_protocol_comes_from_scheme_only() {
        let refs = UrlExtractor::new().extract("http://https-proxy.edge.svc.cluster.local:3128");
        assert_eq!(refs[0].protocol, Protocol::Http);
    }

    #[test]
    fn test_multiple_matches_keep_order() {
        let text = "primary=http://a.ns1.svc.cluster.local:1000,fallback=https://b.ns2.svc.cluster.local";
        let refs = UrlExtractor::new().extract(text);
        let keys: Vec<_> = refs.iter().map(|r| (r.service_key(), r.port)).collect();
        assert_eq!(
            keys,
            vec![("a.ns1".to_string(), 1000), ("b.ns2".to_string(), 80)]
        );
    }

    #[test]
    fn test_no_match_yields_empty() {
        let extractor = UrlExtractor::new();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("postgres://db.prod.svc.cluster.local:5432").is_empty());
        assert!(extractor.extract("http://example.com:8080").is_empty());
        assert!(extractor.extract("no urls here").is_empty());
    }

    #[test]
    fn test_extra_host_labels_do_not_decode() {
        let refs = UrlExtractor::new().extract("http://pod-0.db.prod.svc.cluster.local:5432");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_out_of_range_port_is_skipped() {
        let refs = UrlExtractor::new()
            .extract("http://a.b.svc.cluster.local:99999 http://c.d.svc.cluster.local:81");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].service_key(), "c.d");
    }

    #[test]
    fn test_structured_value_is_scanned() {
        let value = json!({
            "upstreams": [
                {"url": "http://orders.shop.svc.cluster.local:8080"},
                {"url": "https://auth.iam.svc.cluster.local"}
            ]
        });
        let refs = UrlExtractor::new().extract_from_value(&value);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].service_key(), "auth.iam");
    }

    #[test]
    fn test_custom_default_port() {
        let refs = UrlExtractor::with_default_port(8000).extract("http://x.y.svc.cluster.local");
        assert_eq!(refs[0].port, 8000);
    }
}
