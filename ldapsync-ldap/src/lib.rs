//! LDAP implementation of the [`AttributeSource`](ldapsync_core::AttributeSource)
//! capability, built on `ldap3`.

mod connector;

pub use connector::{LdapDirectory, LdapSession};
