//! Event endpoint derivation.
//!
//! The event stream lives at a fixed path on the same host as the web app.
//! Its scheme follows the app's: plain HTTP pairs with `ws`, HTTPS with `wss`.

use std::fmt;
use url::Url;

use crate::traits::TransportError;

/// Path of the event stream on the app's origin.
pub const WEBSOCKET_PATH: &str = "/api/ws";

/// A resolved WebSocket URL for the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Derive the endpoint from the app's origin, e.g. `https://chat.example.com`.
    ///
    /// Any path, query or fragment on the origin is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin does not parse, has no host, or uses a
    /// scheme other than `http` or `https`.
    pub fn from_origin(origin: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(origin)
            .map_err(|e| TransportError::InvalidOrigin(format!("{origin}: {e}")))?;

        let scheme = match parsed.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(TransportError::InvalidOrigin(format!(
                    "{origin}: unsupported scheme '{other}'"
                )))
            }
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| TransportError::InvalidOrigin(format!("{origin}: missing host")))?;

        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let url = Url::parse(&format!("{scheme}://{authority}{WEBSOCKET_PATH}"))
            .map_err(|e| TransportError::InvalidOrigin(format!("{origin}: {e}")))?;

        Ok(Self { url })
    }

    /// Get the full URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Whether the endpoint uses TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_origin() {
        let endpoint = Endpoint::from_origin("https://chat.example.com:8443").unwrap();
        assert_eq!(endpoint.as_str(), "wss://chat.example.com:8443/api/ws");
        assert!(endpoint.is_secure());
    }

    #[test]
    fn test_plain_origin() {
        let endpoint = Endpoint::from_origin("http://localhost").unwrap();
        assert_eq!(endpoint.as_str(), "ws://localhost/api/ws");
        assert!(!endpoint.is_secure());
    }

    #[test]
    fn test_origin_path_is_ignored() {
        let endpoint = Endpoint::from_origin("https://chat.example.com/channels/42?tab=1").unwrap();
        assert_eq!(endpoint.as_str(), "wss://chat.example.com/api/ws");
    }

    #[test]
    fn test_default_port_is_dropped() {
        let endpoint = Endpoint::from_origin("https://chat.example.com:443").unwrap();
        assert_eq!(endpoint.as_str(), "wss://chat.example.com/api/ws");
    }

    #[test]
    fn test_ip_origin() {
        let endpoint = Endpoint::from_origin("http://127.0.0.1:8080").unwrap();
        assert_eq!(endpoint.as_str(), "ws://127.0.0.1:8080/api/ws");
    }

    #[test]
    fn test_invalid_origins() {
        assert!(Endpoint::from_origin("ftp://files.example.com").is_err());
        assert!(Endpoint::from_origin("ws://chat.example.com").is_err());
        assert!(Endpoint::from_origin("not a url").is_err());
        assert!(Endpoint::from_origin("").is_err());
    }
}
