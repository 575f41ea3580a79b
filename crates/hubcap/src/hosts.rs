//! symbolic hostname lookup through the inherited alias table
//!
//! A host table maps names to other names or to literal addresses. Lookups follow the chain until
//! they reach a literal address or a name that is not in the table. Names that stay unresolved
//! are returned as is, resolving them further (e.g. via DNS) is up to the caller.
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::net::{IpAddr, SocketAddr};

pub type HostTable = IndexMap<String, String>;

/// Whether `name` already is a network address (optionally with a port)
pub fn is_address(name: &str) -> bool {
    name.parse::<IpAddr>().is_ok() || name.parse::<SocketAddr>().is_ok()
}

/// Dereference `name` through `hosts`
///
/// Fails with [Error::HostCircularReference] when a name in the chain comes up again.
#[tracing::instrument(level = "trace", skip(hosts), ret)]
pub fn resolve(hosts: &HostTable, name: &str) -> Result<String> {
    let mut chain = vec![name.to_string()];

    loop {
        let current = chain.last().map(String::as_str).unwrap_or(name);
        if is_address(current) {
            break;
        }

        let Some(next) = hosts.get(current) else {
            break;
        };

        if chain.contains(next) {
            chain.push(next.clone());
            return Err(Error::HostCircularReference(chain));
        }

        tracing::trace!(from = current, to = %next, "host alias");
        chain.push(next.clone());
    }

    Ok(chain.pop().unwrap_or_else(|| name.to_string()))
}
