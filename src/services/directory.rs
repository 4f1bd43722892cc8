/*
 * Responsibility
 * - verify a username/password pair against the LDAP directory
 * - one connection per lookup: dial, service bind, subtree search, unbind
 * - filter values are escaped before interpolation (RFC 4515)
 */
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{
    DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions,
    ldap_escape,
};
use thiserror::Error;

use crate::config::Config;

const PERSON_CLASS: &str = "inetOrgPerson";
const USERNAME_ATTR: &str = "cn";
const PASSWORD_ATTR: &str = "userPassword";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory rejected the service bind")]
    BindRejected,

    #[error("directory query failed: {0}")]
    Query(String),
}

/// One matching entry, with the values of the configured group attribute in
/// the order the directory returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub dn: String,
    pub groups: Vec<String>,
}

/// Seam for the review handler; production uses [`LdapDirectory`], tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Zero-or-one matching entry. `Ok(None)` means the pair did not verify;
    /// it is not an error.
    async fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryRecord>, DirectoryError>;
}

/// Interpolate caller-supplied values into the credential filter. Both values
/// go through `ldap_escape`, so filter metacharacters (`(`, `)`, `*`, `\`)
/// in a token can never widen the match.
pub fn credential_filter(username: &str, password: &str) -> String {
    format!(
        "(&(objectClass={})({}={})({}={}))",
        PERSON_CLASS,
        USERNAME_ATTR,
        ldap_escape(username),
        PASSWORD_ATTR,
        ldap_escape(password),
    )
}

/// Map search entries to the lookup outcome. No entry is no match; exactly
/// one yields a record; more than one means the identity is ambiguous, and
/// refusing to pick keeps an ambiguous identity from ever authenticating.
///
/// Attribute names are matched case-insensitively (LDAP attribute names are
/// not case-sensitive, and servers differ in the casing they return).
fn interpret_entries(mut entries: Vec<SearchEntry>, group_attr: &str) -> Option<DirectoryRecord> {
    if entries.len() > 1 {
        return None;
    }

    entries.pop().map(|mut entry| {
        let group_key = entry
            .attrs
            .keys()
            .find(|name| name.eq_ignore_ascii_case(group_attr))
            .cloned();
        let groups = group_key
            .and_then(|key| entry.attrs.remove(&key))
            .unwrap_or_default();

        DirectoryRecord {
            dn: entry.dn,
            groups,
        }
    })
}

pub struct LdapDirectory {
    url: String,
    bind_dn: String,
    bind_password: String,
    search_base: String,
    group_attr: String,
    timeout: Duration,
}

impl LdapDirectory {
    pub fn new(config: &Config) -> Self {
        Self {
            url: config.ldap_url.clone(),
            bind_dn: config.ldap_bind_dn.clone(),
            bind_password: config.ldap_bind_password.clone(),
            search_base: config.ldap_search_base.clone(),
            group_attr: config.ldap_group_attr.clone(),
            timeout: config.ldap_timeout,
        }
    }

    async fn search_entry(
        &self,
        ldap: &mut Ldap,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let bound = ldap
            .simple_bind(&self.bind_dn, &self.bind_password)
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        if bound.rc != 0 {
            tracing::warn!(rc = bound.rc, "service bind rejected");
            return Err(DirectoryError::BindRejected);
        }

        let filter = credential_filter(username, password);
        let result = ldap
            .with_search_options(SearchOptions::new().deref(DerefAliases::Never))
            .search(&self.search_base, Scope::Subtree, &filter, vec!["*"])
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        let (entries, _) = result
            .success()
            .map_err(|e| DirectoryError::Query(e.to_string()))?;

        let entries: Vec<SearchEntry> = entries.into_iter().map(SearchEntry::construct).collect();
        if entries.len() > 1 {
            tracing::warn!(
                username,
                matches = entries.len(),
                "multiple directory entries matched, treating as no match"
            );
        }

        Ok(interpret_entries(entries, &self.group_attr))
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    async fn lookup(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<DirectoryRecord>, DirectoryError> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.url)
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        ldap3::drive!(conn);

        // The deadline bounds bind+search only, so the unbind below runs on
        // the timeout path just like on every other path.
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.search_entry(&mut ldap, username, password),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(DirectoryError::Unavailable(format!(
                "lookup timed out after {:?}",
                self.timeout
            ))),
        };

        // Release the connection on every exit path, including errors.
        let _ = ldap.unbind().await;

        outcome
    }
}
