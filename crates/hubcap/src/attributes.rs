//! per-node attribute deltas and how they cascade from the hub down
//!
//! Every node holds only what its own body declared. The effective attributes of a node are
//! obtained by folding the deltas of its lineage, hub first:
//! - `cap_roles` are concatenated in ancestor-to-descendant order, duplicates kept
//! - `puppet_roles` and `params` are merged per key, recursively for nested maps, the deepest
//!   declaration winning. A puppet class without parameters replaces the inherited entry.
//! - `cap_attributes` and `hosts` are merged per key, the deepest declaration winning
use crate::value::{Map, Value};
use indexmap::IndexMap;

/// Puppet class name mapped to its (optional) class parameters
pub type PuppetRoles = IndexMap<String, Option<Map>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub cap_roles: Vec<String>,
    pub puppet_roles: PuppetRoles,
    pub cap_attributes: Map,
    pub params: Map,
    pub hosts: IndexMap<String, String>,
}

impl Attributes {
    /// Layer the delta of a descendant on top of these attributes
    pub fn inherit(&mut self, descendant: &Attributes) {
        self.cap_roles.extend(descendant.cap_roles.iter().cloned());

        for (class, parameters) in &descendant.puppet_roles {
            inherit_puppet_role(&mut self.puppet_roles, class, parameters.as_ref());
        }

        self.cap_attributes.extend(
            descendant
                .cap_attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        deep_merge(&mut self.params, &descendant.params);

        self.hosts.extend(
            descendant
                .hosts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.cap_roles.is_empty()
            && self.puppet_roles.is_empty()
            && self.cap_attributes.is_empty()
            && self.params.is_empty()
            && self.hosts.is_empty()
    }

    /// `cap_roles` and `puppet_roles` describe the same plain list of roles
    pub fn roles_coincide(&self) -> bool {
        self.cap_roles.len() == self.puppet_roles.len()
            && self
                .cap_roles
                .iter()
                .zip(&self.puppet_roles)
                .all(|(cap, (puppet, parameters))| cap == puppet && parameters.is_none())
    }
}

/// Fold a lineage of deltas (hub first) into effective attributes
pub fn cascade<'a>(lineage: impl IntoIterator<Item = &'a Attributes>) -> Attributes {
    lineage
        .into_iter()
        .fold(Attributes::default(), |mut effective, delta| {
            effective.inherit(delta);
            effective
        })
}

/// Merge `src` into `dest`; nested maps are merged key by key, anything else is replaced
pub fn deep_merge(dest: &mut Map, src: &Map) {
    for (key, value) in src {
        match (dest.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            _ => {
                dest.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Parameters of both sides are merged recursively, a class without parameters replaces the
/// inherited entry
fn inherit_puppet_role(roles: &mut PuppetRoles, class: &str, parameters: Option<&Map>) {
    match (roles.get_mut(class), parameters) {
        (Some(Some(existing)), Some(parameters)) => deep_merge(existing, parameters),
        _ => {
            roles.insert(class.to_string(), parameters.cloned());
        }
    }
}
