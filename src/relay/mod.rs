//! CORS relay descriptors: request building and response unwrapping.
//!
//! Each relay forwards a browser-blocked request to the target URL, but the
//! services differ in how the target is passed and how the upstream body
//! comes back. The three conventions are captured by [`RelayKind`]; a
//! [`RelayDescriptor`] pairs a kind with a concrete service endpoint.

pub(crate) mod unwrap;

use crate::error::{FetchError, Result};
use reqwest::Url;
use serde_json::Value;
use unwrap::extract_json_object;

/// Field holding the embedded upstream body in a wrapped-JSON envelope.
const ENVELOPE_CONTENT_FIELD: &str = "contents";

/// How a relay accepts the target URL and wraps the upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    /// Target passed URL-encoded in a query parameter; body passed through.
    RawQueryParam,
    /// Target appended verbatim after the relay's path; body passed through.
    PathPrefix,
    /// Target in a query parameter; body returned inside a JSON envelope
    /// whose content field is a string with the upstream body embedded.
    WrappedJson,
}

/// One statically configured relay service.
#[derive(Debug, Clone)]
pub struct RelayDescriptor {
    pub name: String,
    pub kind: RelayKind,
    pub base: String,
    /// Query parameter carrying the target URL; unused for path-prefix.
    pub query_param: Option<String>,
}

impl RelayDescriptor {
    pub fn new(name: &str, kind: RelayKind, base: &str, query_param: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            base: base.to_string(),
            query_param: query_param.map(str::to_string),
        }
    }

    /// Build the relay-specific request URL for `target`.
    pub fn request_url(&self, target: &str) -> Result<Url> {
        match self.kind {
            RelayKind::PathPrefix => Url::parse(&format!("{}{}", self.base, target))
                .map_err(|e| FetchError::Parse(format!("{}: bad relay URL: {e}", self.name))),
            RelayKind::RawQueryParam | RelayKind::WrappedJson => {
                let mut url = Url::parse(&self.base)
                    .map_err(|e| FetchError::Parse(format!("{}: bad relay base: {e}", self.name)))?;
                let param = self.query_param.as_deref().unwrap_or("url");
                url.query_pairs_mut().append_pair(param, target);
                Ok(url)
            }
        }
    }

    /// Decode a relay response body into the upstream JSON payload.
    pub fn unwrap_response(&self, body: &str) -> Result<Value> {
        match self.kind {
            RelayKind::WrappedJson => {
                let envelope: Value = serde_json::from_str(body).map_err(|e| {
                    FetchError::Parse(format!("{}: envelope is not JSON: {e}", self.name))
                })?;
                let contents = envelope
                    .get(ENVELOPE_CONTENT_FIELD)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        FetchError::Parse(format!(
                            "{}: envelope missing '{ENVELOPE_CONTENT_FIELD}' string field",
                            self.name
                        ))
                    })?;
                let object = extract_json_object(contents)?;
                Ok(serde_json::from_str(object)?)
            }
            RelayKind::RawQueryParam | RelayKind::PathPrefix => {
                match serde_json::from_str::<Value>(body) {
                    Ok(value) => Ok(value),
                    // Some pass-through relays decorate the body; salvage
                    // the first embedded object.
                    Err(_) => {
                        let object = extract_json_object(body)?;
                        Ok(serde_json::from_str(object)?)
                    }
                }
            }
        }
    }
}

/// The statically configured relay table, in default preference order.
pub fn default_relays() -> Vec<RelayDescriptor> {
    vec![
        RelayDescriptor::new(
            "allorigins",
            RelayKind::WrappedJson,
            "https://api.allorigins.win/get",
            Some("url"),
        ),
        RelayDescriptor::new(
            "corsproxy",
            RelayKind::RawQueryParam,
            "https://corsproxy.io/",
            Some("url"),
        ),
        RelayDescriptor::new(
            "codetabs",
            RelayKind::RawQueryParam,
            "https://api.codetabs.com/v1/proxy",
            Some("quest"),
        ),
        RelayDescriptor::new(
            "thingproxy",
            RelayKind::PathPrefix,
            "https://thingproxy.freeboard.io/fetch/",
            None,
        ),
    ]
}
