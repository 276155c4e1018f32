//! SugarCRM REST endpoint paths and request/response types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Names
// ============================================================================

/// OAuth2 token exchange.
pub const OAUTH_TOKEN: &str = "oauth2/token";

/// Lightweight liveness probe.
pub const PING: &str = "ping";

/// Server metadata.
pub const METADATA: &str = "metadata";

/// Language strings, followed by `/{language}`.
pub const LANG: &str = "lang";

/// Header carrying the access token on authenticated requests.
pub const OAUTH_TOKEN_HEADER: &str = "OAuth-Token";

/// Language requested by [`SugarClient::lang`](crate::SugarClient::lang) callers
/// that have no preference.
pub const DEFAULT_LANGUAGE: &str = "en";

// ============================================================================
// Paths
// ============================================================================

/// `{module}/{record}`
pub fn record_path(module: &str, record: &str) -> String {
    format!("{}/{}", module, record)
}

/// `{module}/{record}/favorite`
pub fn favorite_path(module: &str, record: &str) -> String {
    format!("{}/{}/favorite", module, record)
}

/// `{module}/{record}/link/{link}`
pub fn link_path(module: &str, record: &str, link: &str) -> String {
    format!("{}/{}/link/{}", module, record, link)
}

/// `{module}/{record}/link/{link}/{related}`
pub fn related_record_path(module: &str, record: &str, link: &str, related: &str) -> String {
    format!("{}/{}/link/{}/{}", module, record, link, related)
}

/// `{module}/{record}/file`
pub fn files_path(module: &str, record: &str) -> String {
    format!("{}/{}/file", module, record)
}

/// `{module}/{record}/file/{field}`
pub fn file_path(module: &str, record: &str, field: &str) -> String {
    format!("{}/{}/file/{}", module, record, field)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Form body for `oauth2/token`.
#[derive(Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest<'a> {
    Password {
        client_id: &'a str,
        client_secret: &'a str,
        username: &'a str,
        password: &'a str,
        platform: &'a str,
    },
    RefreshToken {
        client_id: &'a str,
        client_secret: &'a str,
        refresh_token: &'a str,
    },
}

/// Response from `oauth2/token`.
#[derive(Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sugar_core::form;

    #[test]
    fn paths() {
        assert_eq!(record_path("Accounts", "123"), "Accounts/123");
        assert_eq!(favorite_path("Accounts", "123"), "Accounts/123/favorite");
        assert_eq!(
            related_record_path("Accounts", "1", "contacts", "2"),
            "Accounts/1/link/contacts/2"
        );
        assert_eq!(file_path("Notes", "9", "filename"), "Notes/9/file/filename");
    }

    #[test]
    fn password_grant_fields() {
        let mut pairs = form::to_pairs(&TokenRequest::Password {
            client_id: "sugar",
            client_secret: "",
            username: "admin",
            password: "pw",
            platform: "api",
        })
        .unwrap();
        pairs.sort();

        let expected: Vec<(String, String)> = [
            ("client_id", "sugar"),
            ("client_secret", ""),
            ("grant_type", "password"),
            ("password", "pw"),
            ("platform", "api"),
            ("username", "admin"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn refresh_grant_fields() {
        let pairs = form::to_pairs(&TokenRequest::RefreshToken {
            client_id: "sugar",
            client_secret: "",
            refresh_token: "R",
        })
        .unwrap();

        assert!(pairs.contains(&("grant_type".to_string(), "refresh_token".to_string())));
        assert!(pairs.contains(&("refresh_token".to_string(), "R".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "username" || k == "platform"));
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let response: TokenResponse = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert!(response.access_token.is_none());
        assert!(response.refresh_token.is_none());
    }
}
