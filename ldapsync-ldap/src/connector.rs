use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, warn};

use ldapsync_core::{
    AttributeMap, AttributeSource, ConnectorError, DirectoryConfig, DirectorySession, UserId,
};

/// Directory connector. Holds configuration only; every [`open`] call dials
/// and binds a new connection.
///
/// [`open`]: AttributeSource::open
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: Arc<DirectoryConfig>,
}

/// A bound LDAP connection owned by a single sync run.
pub struct LdapSession {
    ldap: Ldap,
    config: Arc<DirectoryConfig>,
}

impl LdapDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl AttributeSource for LdapDirectory {
    type Session = LdapSession;

    async fn open(&self) -> Result<LdapSession, ConnectorError> {
        let url = &self.config.url;
        debug!(url = %url, "connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connect_timeout)
            .set_starttls(self.config.starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if let Some(bind_dn) = &self.config.bind_dn {
            debug!(bind_dn = %bind_dn, "performing LDAP bind");
            let password = self.config.bind_password.as_deref().unwrap_or("");
            ldap.simple_bind(bind_dn, password)
                .await
                .and_then(|result| result.success())
                .map_err(|e| {
                    ConnectorError::connection_failed_with_source(
                        format!("LDAP bind failed for {bind_dn}"),
                        e,
                    )
                })?;
        }

        info!(url = %url, "LDAP connection established");
        Ok(LdapSession {
            ldap,
            config: self.config.clone(),
        })
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(&mut self, user: &UserId) -> Result<AttributeMap, ConnectorError> {
        let filter = user_filter(&self.config, user);
        let attributes = self.config.attributes.clone();

        let (entries, _) = self
            .ldap
            .search(&self.config.base_dn, Scope::Subtree, &filter, attributes)
            .await
            .and_then(|result| result.success())
            .map_err(|e| {
                ConnectorError::query_failed_with_source(format!("LDAP search {filter} failed"), e)
            })?;

        let entry = single_match(user, entries)?;
        Ok(entry_to_attributes(
            SearchEntry::construct(entry),
            &self.config.attributes,
        ))
    }

    async fn close(mut self) {
        if let Err(e) = self.ldap.unbind().await {
            warn!(error = %e, "error during LDAP unbind");
        }
    }
}

/// Filter matching exactly one user: the configured user filter ANDed with an
/// equality match on the identifier attribute.
fn user_filter(config: &DirectoryConfig, user: &UserId) -> String {
    let base = config.user_filter.trim();
    let base = if base.starts_with('(') {
        base.to_string()
    } else {
        format!("({base})")
    };
    format!(
        "(&{base}({}={}))",
        config.id_attribute,
        ldap_escape(user.as_str())
    )
}

/// The only entry a per-user search returned.
fn single_match<T>(user: &UserId, entries: Vec<T>) -> Result<T, ConnectorError> {
    let count = entries.len();
    let mut entries = entries.into_iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        (None, _) => Err(ConnectorError::NotFound { user: user.clone() }),
        (Some(_), Some(_)) => Err(ConnectorError::Ambiguous {
            user: user.clone(),
            count,
        }),
    }
}

/// Keep the first value of each requested attribute, spelled as configured.
///
/// LDAP attribute names are case-insensitive and servers may answer with their
/// schema's spelling (`givenname` for `givenName`).
fn entry_to_attributes(entry: SearchEntry, wanted: &[String]) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    for (name, values) in entry.attrs {
        let Some(canonical) = wanted.iter().find(|w| w.eq_ignore_ascii_case(&name)) else {
            continue;
        };
        if let Some(first) = values.into_iter().next() {
            attrs.insert(canonical.clone(), first);
        }
    }
    attrs
}
