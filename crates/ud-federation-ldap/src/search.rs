//! LDAP search operations.

use std::collections::HashMap;

use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Scope, SearchEntry, SearchStream};

use crate::config::LdapSettings;
use crate::connection::LdapConnection;
use crate::error::{LdapError, LdapResult};

/// Represents an LDAP entry with parsed attributes.
#[derive(Debug, Clone, Default)]
pub struct LdapEntry {
    /// Distinguished Name.
    pub dn: String,

    /// Attributes (all values are multi-valued).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Creates a new LDAP entry from a search result.
    #[must_use]
    pub fn from_search_entry(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }

    /// Gets the values of an attribute. Attribute names are matched
    /// case-insensitively.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values)
        })
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.get_attrs(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

/// Finds the single user entry for a username.
///
/// ## Errors
///
/// Returns `LdapError::Search` if the search fails and
/// `LdapError::AttributeMapping` if more than one entry matches.
pub async fn find_user(
    conn: &mut LdapConnection,
    settings: &LdapSettings,
    username: &str,
) -> LdapResult<Option<LdapEntry>> {
    let filter = settings.user_by_username_filter(username);
    let result = conn
        .ldap_mut()
        .search(
            &settings.users_dn,
            Scope::Subtree,
            &filter,
            settings.user_attributes(),
        )
        .await
        .and_then(ldap3::SearchResult::success);

    let (entries, _) = match result {
        Ok(found) => found,
        Err(e) => {
            conn.mark_broken();
            return Err(LdapError::Search(e.to_string()));
        }
    };

    if entries.len() > 1 {
        return Err(LdapError::mapping(format!(
            "{} entries match username '{username}'",
            entries.len()
        )));
    }
    Ok(entries
        .into_iter()
        .next()
        .map(|entry| LdapEntry::from_search_entry(SearchEntry::construct(entry))))
}

/// A paged walk over every user entry.
///
/// The connection stays checked out for the whole walk and only returns to
/// the pool once the server has confirmed the end of the result set.
pub struct UserListing {
    stream: SearchStream<'static, String, Vec<String>>,
    conn: LdapConnection,
}

impl UserListing {
    /// Starts a paged subtree search for user entries.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Search` if the server rejects the search.
    pub async fn start(mut conn: LdapConnection, settings: &LdapSettings) -> LdapResult<Self> {
        let adapters: Vec<Box<dyn Adapter<'static, String, Vec<String>>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(settings.page_size)),
        ];
        let filter = settings.user_search_filter();

        // Not reusable until the walk completes.
        conn.mark_broken();
        let stream = conn
            .ldap_mut()
            .streaming_search_with(
                adapters,
                &settings.users_dn,
                Scope::Subtree,
                &filter,
                settings.user_attributes(),
            )
            .await
            .map_err(|e| LdapError::Search(e.to_string()))?;

        Ok(Self { stream, conn })
    }

    /// Gets the next entry, or `None` once every page has been read.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Search` if a page cannot be fetched.
    pub async fn next_entry(&mut self) -> LdapResult<Option<LdapEntry>> {
        let entry = self
            .stream
            .next()
            .await
            .map_err(|e| LdapError::Search(e.to_string()))?;
        Ok(entry.map(|e| LdapEntry::from_search_entry(SearchEntry::construct(e))))
    }

    /// Completes the search and releases the connection.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Search` if the server reports a failed search.
    pub async fn finish(mut self) -> LdapResult<()> {
        self.stream
            .finish()
            .await
            .success()
            .map_err(|e| LdapError::Search(e.to_string()))?;
        self.conn.mark_reusable();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LdapEntry {
        LdapEntry {
            dn: "uid=bob,ou=people,dc=example,dc=com".to_string(),
            attributes: HashMap::from([
                ("uid".to_string(), vec!["bob".to_string()]),
                ("CN".to_string(), vec!["Bob Builder".to_string()]),
            ]),
        }
    }

    #[test]
    fn attribute_lookup_ignores_case() {
        let entry = entry();
        assert_eq!(entry.get_attr("uid"), Some("bob"));
        assert_eq!(entry.get_attr("cn"), Some("Bob Builder"));
        assert_eq!(entry.get_attr("mail"), None);
    }
}
