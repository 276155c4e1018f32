//! Login credentials type.

use std::fmt;

/// OAuth2 client id the SugarCRM REST API expects from API clients.
pub const DEFAULT_CLIENT_ID: &str = "sugar";

/// Platform identifier used when none is configured.
pub const DEFAULT_PLATFORM: &str = "api";

/// Login credentials for the SugarCRM OAuth2 password grant.
///
/// Holds the user's name and password together with the OAuth2 client
/// identity and the platform the session is opened for.
///
/// # Security
///
/// The password and client secret are never exposed in Debug output.
///
/// # Example
///
/// ```
/// use sugar_core::Credentials;
///
/// let creds = Credentials::new("admin", "secret");
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.client_id(), "sugar");
/// assert_eq!(creds.platform(), "api");
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    client_id: String,
    client_secret: String,
    platform: String,
}

impl Credentials {
    /// Create new credentials with the default client identity and platform.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: String::new(),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the OAuth2 client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the platform identifier.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    /// Set the platform identifier.
    ///
    /// Returns `false` and keeps the current platform if `platform` is empty.
    pub fn set_platform(&mut self, platform: impl Into<String>) -> bool {
        let platform = platform.into();
        if platform.is_empty() {
            return false;
        }
        self.platform = platform;
        true
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("", "")
    }
}

// Intentionally hide secrets in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("platform", &self.platform)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_hides_password_in_debug() {
        let creds = Credentials::new("admin", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn empty_platform_is_rejected() {
        let mut creds = Credentials::new("admin", "secret");
        assert!(!creds.set_platform(""));
        assert_eq!(creds.platform(), "api");

        assert!(creds.set_platform("portal"));
        assert_eq!(creds.platform(), "portal");
    }

    #[test]
    fn fixed_client_identity() {
        let creds = Credentials::default();
        assert_eq!(creds.client_id(), "sugar");
        assert_eq!(creds.client_secret(), "");
    }
}
