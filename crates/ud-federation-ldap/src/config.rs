//! Validated LDAP connection and search settings.
//!
//! ## Security
//!
//! Only `ldaps://` URLs are accepted. `ldap://` would send the bind
//! credential and every user password in cleartext, and STARTTLS can be
//! stripped by an active attacker.

use std::fmt;
use std::time::Duration;

use ud_core::LdapDirectoryConfig;

use crate::error::{LdapError, LdapResult};

/// LDAP settings derived from the `[readonly-directory]` section.
#[derive(Clone)]
pub struct LdapSettings {
    // === Connection ===
    /// LDAPS URL.
    pub connection_url: String,
    /// Service account DN.
    pub bind_dn: String,
    /// Service account password.
    pub bind_credential: String,
    /// Whether server certificates are checked.
    pub validate_certificates: bool,
    /// Connect timeout.
    pub connection_timeout: Duration,
    /// Maximum concurrent connections.
    pub pool_max_size: usize,

    // === Search ===
    /// Base DN for user entries.
    pub users_dn: String,
    /// Object classes every user entry carries.
    pub user_object_classes: Vec<String>,
    /// Extra filter ANDed into every user search.
    pub custom_user_filter: Option<String>,
    /// Entries per page when listing.
    pub page_size: i32,

    // === Attributes ===
    /// Attribute holding the username.
    pub username_attribute: String,
    /// Attribute holding the display name.
    pub display_name_attribute: String,
    /// Attribute holding the email address.
    pub email_attribute: String,
}

impl fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapSettings")
            .field("connection_url", &self.connection_url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_credential", &"[REDACTED]")
            .field("validate_certificates", &self.validate_certificates)
            .field("users_dn", &self.users_dn)
            .field("username_attribute", &self.username_attribute)
            .finish_non_exhaustive()
    }
}

impl LdapSettings {
    /// Builds and validates settings from the repository configuration.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::InsecureProtocol` for a non-LDAPS URL and
    /// `LdapError::Configuration` for missing or out of range values.
    pub fn from_config(config: &LdapDirectoryConfig) -> LdapResult<Self> {
        let custom_user_filter = config
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| {
                if f.starts_with('(') {
                    f.to_string()
                } else {
                    format!("({f})")
                }
            });

        let settings = Self {
            connection_url: config.url.trim().to_string(),
            bind_dn: config.bind_dn.clone(),
            bind_credential: config.bind_credential.clone(),
            validate_certificates: config.validate_certificates,
            connection_timeout: Duration::from_secs(config.connection_timeout_secs),
            pool_max_size: config.pool_size,
            users_dn: config.users_dn.clone(),
            user_object_classes: config.object_classes.clone(),
            custom_user_filter,
            page_size: config.page_size,
            username_attribute: config.username_attribute.clone(),
            display_name_attribute: config.display_name_attribute.clone(),
            email_attribute: config.email_attribute.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings.
    ///
    /// ## Errors
    ///
    /// See [`LdapSettings::from_config`].
    pub fn validate(&self) -> LdapResult<()> {
        validate_ldaps_url(&self.connection_url)?;

        if self.bind_dn.is_empty() {
            return Err(LdapError::config("bind_dn cannot be empty"));
        }
        if self.users_dn.is_empty() {
            return Err(LdapError::config("users_dn cannot be empty"));
        }
        if self.user_object_classes.is_empty() {
            return Err(LdapError::config("user_object_classes cannot be empty"));
        }
        if self.username_attribute.is_empty() {
            return Err(LdapError::config("username_attribute cannot be empty"));
        }
        if self.page_size <= 0 {
            return Err(LdapError::config("page_size must be positive"));
        }
        if self.pool_max_size == 0 {
            return Err(LdapError::config("pool_max_size must be at least 1"));
        }
        Ok(())
    }

    /// Gets the search filter matching every user entry.
    #[must_use]
    pub fn user_search_filter(&self) -> String {
        let object_classes: Vec<String> = self
            .user_object_classes
            .iter()
            .map(|c| format!("(objectClass={})", ldap_escape(c)))
            .collect();

        let base_filter = if object_classes.len() == 1 {
            object_classes[0].clone()
        } else {
            format!("(&{})", object_classes.join(""))
        };

        match &self.custom_user_filter {
            Some(custom) => format!("(&{base_filter}{custom})"),
            None => base_filter,
        }
    }

    /// Gets the search filter matching one username.
    #[must_use]
    pub fn user_by_username_filter(&self, username: &str) -> String {
        let base = self.user_search_filter();
        let escaped = ldap_escape(username);
        format!("(&{base}({}={escaped}))", self.username_attribute)
    }

    /// Attributes fetched for every user entry.
    #[must_use]
    pub fn user_attributes(&self) -> Vec<String> {
        vec![
            self.username_attribute.clone(),
            self.display_name_attribute.clone(),
            self.email_attribute.clone(),
        ]
    }
}

fn validate_ldaps_url(url: &str) -> LdapResult<()> {
    if !url.to_lowercase().starts_with("ldaps://") {
        return Err(LdapError::InsecureProtocol);
    }
    if url.len() <= "ldaps://".len() {
        return Err(LdapError::config("Invalid LDAPS URL: missing host"));
    }
    Ok(())
}

/// Escapes a value for use inside an LDAP filter (RFC 4515).
#[must_use]
pub fn ldap_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '*' | '(' | ')' | '\0' => {
                result.push('\\');
                result.push_str(&hex::encode([c as u8]));
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_config() -> LdapDirectoryConfig {
        LdapDirectoryConfig {
            url: "ldaps://ldap.example.com:636".to_string(),
            bind_dn: "cn=reader,dc=example,dc=com".to_string(),
            bind_credential: "secret".to_string(),
            users_dn: "ou=people,dc=example,dc=com".to_string(),
            username_attribute: "uid".to_string(),
            display_name_attribute: "cn".to_string(),
            email_attribute: "mail".to_string(),
            object_classes: vec!["inetOrgPerson".to_string()],
            filter: None,
            page_size: 500,
            pool_size: 4,
            connection_timeout_secs: 5,
            validate_certificates: true,
        }
    }

    #[test]
    fn accepts_ldaps() {
        let settings = LdapSettings::from_config(&directory_config()).unwrap();
        assert_eq!(settings.connection_timeout, Duration::from_secs(5));
        assert_eq!(settings.pool_max_size, 4);
    }

    #[test]
    fn rejects_plain_ldap() {
        let mut config = directory_config();
        config.url = "ldap://ldap.example.com:389".to_string();
        let err = LdapSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, LdapError::InsecureProtocol));

        config.url = "LDAPS://".to_string();
        let err = LdapSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, LdapError::Configuration(_)));
    }

    #[test]
    fn rejects_empty_object_classes() {
        let mut config = directory_config();
        config.object_classes.clear();
        assert!(LdapSettings::from_config(&config).is_err());
    }

    #[test]
    fn escapes_filter_metacharacters() {
        assert_eq!(ldap_escape("john*"), "john\\2a");
        assert_eq!(ldap_escape("(admin)"), "\\28admin\\29");
        assert_eq!(ldap_escape("user\\name"), "user\\5cname");
        assert_eq!(ldap_escape("nul\0"), "nul\\00");
        assert_eq!(ldap_escape("normal"), "normal");
    }

    #[test]
    fn username_filter() {
        let settings = LdapSettings::from_config(&directory_config()).unwrap();
        assert_eq!(
            settings.user_by_username_filter("jdoe"),
            "(&(objectClass=inetOrgPerson)(uid=jdoe))"
        );
        assert_eq!(
            settings.user_by_username_filter("*)(uid=*"),
            "(&(objectClass=inetOrgPerson)(uid=\\2a\\29\\28uid=\\2a))"
        );
    }

    #[test]
    fn custom_filter_is_parenthesized() {
        let mut config = directory_config();
        config.object_classes = vec!["person".to_string(), "posixAccount".to_string()];
        config.filter = Some("memberOf=cn=staff,dc=example,dc=com".to_string());
        let settings = LdapSettings::from_config(&config).unwrap();
        assert_eq!(
            settings.user_search_filter(),
            "(&(&(objectClass=person)(objectClass=posixAccount))(memberOf=cn=staff,dc=example,dc=com))"
        );
    }

    #[test]
    fn debug_redacts_bind_credential() {
        let settings = LdapSettings::from_config(&directory_config()).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
