//! declaration context handed to a node's body
//!
//! A body receives a [Scope] for the node being built. Setters only touch that node's own
//! attributes. `group`, `application` and `server` build a child and run the child's body
//! before returning, so a node's subtree is complete once its constructor returns.
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::hosts;
use crate::hub::Hub;
use crate::node::{Node, NodeId, NodeKind, NodeRef};
use crate::settings::{Deferred, Setting};
use crate::target::Target;
use crate::value::{Map, Value};
use std::path::Path;

/// Options for [Scope::application]
#[derive(Debug, Clone, Default, derive_new::new)]
pub struct ApplicationOptions {
    /// recipes loaded into the target in application mode
    pub recipes: Vec<String>,
}

impl ApplicationOptions {
    pub fn recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipes.push(recipe.into());
        self
    }
}

/// Options for [Scope::server]
#[derive(Debug, Clone, Default, derive_new::new)]
pub struct ServerOptions {
    /// explicit address, skips host table inference
    pub address: Option<String>,
}

impl ServerOptions {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }
}

pub struct Scope<'h> {
    hub: &'h mut Hub,
    id: NodeId,
}

impl<'h> Scope<'h> {
    pub(crate) fn new(hub: &'h mut Hub, id: NodeId) -> Self {
        Self { hub, id }
    }

    /// The node being declared
    pub fn node(&self) -> NodeRef<'_> {
        self.hub.get(self.id)
    }

    fn own(&mut self) -> &mut Node {
        self.hub.node_mut(self.id)
    }

    fn kind(&self) -> &NodeKind {
        &self.hub.node(self.id).kind
    }

    /// Add roles to both the capistrano and the puppet roles
    pub fn role<S: AsRef<str>>(&mut self, roles: impl IntoIterator<Item = S>) -> Result<()> {
        let roles: Vec<String> = roles.into_iter().map(|r| r.as_ref().to_string()).collect();
        self.cap_role(&roles)?;
        self.puppet_role(roles)
    }

    pub fn cap_role<S: AsRef<str>>(&mut self, roles: impl IntoIterator<Item = S>) -> Result<()> {
        let roles: Vec<String> = roles.into_iter().map(|r| r.as_ref().to_string()).collect();
        if let Some(invalid) = roles.iter().find(|role| !is_name(role)) {
            return Err(Error::InvalidRole(invalid.clone()));
        }

        self.own().attributes.cap_roles.extend(roles);
        Ok(())
    }

    /// Add puppet classes
    ///
    /// Each entry is either a class name or a map from class name to a map of class parameters.
    pub fn puppet_role<V: Into<Value>>(&mut self, entries: impl IntoIterator<Item = V>) -> Result<()> {
        let mut classes: Vec<(String, Option<Map>)> = Vec::new();
        for entry in entries {
            match entry.into() {
                Value::String(class) if is_name(&class) => classes.push((class, None)),
                Value::Object(map) => {
                    for (class, parameters) in map {
                        match parameters {
                            Value::Object(parameters) if is_name(&class) => {
                                classes.push((class, Some(parameters)))
                            }
                            other => {
                                return Err(Error::InvalidPuppetRole(format!("{class} = {other}")))
                            }
                        }
                    }
                }
                other => return Err(Error::InvalidPuppetRole(other.to_string())),
            }
        }

        // a class declared again replaces the earlier declaration
        self.own().attributes.puppet_roles.extend(classes);
        Ok(())
    }

    /// Merge values into the params handed to puppet
    ///
    /// `params` must be a map, its top-level keys may not be blank.
    pub fn param(&mut self, params: impl Into<Value>) -> Result<()> {
        let params = expect_map("param", params.into())?;
        if let Some(invalid) = params.keys().find(|key| !is_name(key)) {
            return Err(Error::InvalidParamKeyType(format!("{invalid:?}")));
        }

        crate::attributes::deep_merge(&mut self.own().attributes.params, &params);
        Ok(())
    }

    /// Attribute passed along with every server declaration below this node
    pub fn cap_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.own()
            .attributes
            .cap_attributes
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Global setting applied to the target in application mode
    pub fn cap_set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.hub
            .settings
            .set(key, Setting::Immediate(value.into()));
        Ok(())
    }

    /// Global setting whose value is computed when the target is configured
    pub fn cap_set_deferred(
        &mut self,
        key: impl Into<String>,
        value: impl Fn(&dyn Target) -> Result<Value> + 'static,
    ) -> Result<()> {
        self.hub
            .settings
            .set(key, Setting::Deferred(Deferred::new(value)));
        Ok(())
    }

    /// Host table entry: `alias` resolves to `target`, another name or an address
    pub fn host(&mut self, alias: impl Into<String>, target: impl Into<String>) -> Result<()> {
        self.own()
            .attributes
            .hosts
            .insert(alias.into(), target.into());
        Ok(())
    }

    /// Evaluate a declaration file as if it was part of this node's body
    ///
    /// Tries `path` and then `path` with the `.hcl` extension.
    pub fn absorb(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = crate::documents::locate(path.as_ref())?;
        let document = Document::load(&path)?;
        self.declare(&document)
    }

    /// Declare `document` in this scope
    ///
    /// Fails when the document's file is already being declared further up, which happens when
    /// files absorb each other.
    pub(crate) fn declare(&mut self, document: &Document) -> Result<()> {
        let Some(path) = document.source().clone() else {
            return crate::declare::declare(self, document);
        };

        if let Some(start) = self.hub.declaring.iter().position(|open| *open == path) {
            let mut chain: Vec<String> = self.hub.declaring[start..]
                .iter()
                .map(|open| open.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(Error::AbsorbCircularReference(chain));
        }

        tracing::trace!(path=%path.display(), "declaring file");
        self.hub.declaring.push(path);
        let result = crate::declare::declare(self, document);
        self.hub.declaring.pop();
        result
    }

    pub fn group<F>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<()>,
    {
        if matches!(self.kind(), NodeKind::Server { .. }) {
            return Err(Error::ServerSubgroupDisallowed("group"));
        }

        self.add_child(name, NodeKind::Group, None, body)
    }

    pub fn application<F>(&mut self, name: &str, options: ApplicationOptions, body: F) -> Result<()>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<()>,
    {
        if matches!(self.kind(), NodeKind::Server { .. }) {
            return Err(Error::ServerSubgroupDisallowed("application"));
        }

        let current = self.node();
        if current.is_application() || current.application_parent().is_some() {
            return Err(Error::NestedApplicationDisallowed(name.to_string()));
        }

        let recipe_paths = options
            .recipes
            .into_iter()
            .map(|recipe| recipe.trim().to_string())
            .filter(|recipe| !recipe.is_empty())
            .collect();

        self.add_child(name, NodeKind::Application { recipe_paths }, None, body)
    }

    pub fn server<F>(&mut self, name: &str, options: ServerOptions, body: F) -> Result<()>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<()>,
    {
        if matches!(self.kind(), NodeKind::Server { .. }) {
            return Err(Error::ServerSubgroupDisallowed("server"));
        }

        let address = options.address.clone().unwrap_or_else(|| name.to_string());
        self.add_child(name, NodeKind::Server { address }, options.address, body)
    }

    /// Build a child: run its body if the filters let it through, attach it and register it
    fn add_child<F>(
        &mut self,
        name: &str,
        kind: NodeKind,
        explicit_address: Option<String>,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<()>,
    {
        let node = Node::new(Some(self.id), name, kind)?;

        let mut history: Vec<String> = self.node().history().into_iter().map(String::from).collect();
        history.push(name.to_string());
        if !self.hub.filters().processable(&history) {
            tracing::trace!(?history, "skipping node outside of filter");
            return Ok(());
        }
        let collectable = self.hub.filters().collectable(&history);

        let label = node.kind.label();
        let id = self.hub.insert(node);
        tracing::debug!(kind = label, ?history, "building node");

        body(&mut Scope::new(&mut *self.hub, id))?;

        if matches!(self.hub.node(id).kind, NodeKind::Server { .. }) {
            let resolved = resolve_address(self.hub.get(id), explicit_address)?;
            self.hub.node_mut(id).kind = NodeKind::Server { address: resolved };
        }

        self.own().children.push(id);
        if collectable {
            self.hub.collect(id);
        }
        Ok(())
    }
}

/// Explicit address, else the full path through the host table, else the bare name through the
/// host table, else the name itself
fn resolve_address(server: NodeRef<'_>, explicit: Option<String>) -> Result<String> {
    if let Some(address) = explicit {
        return Ok(address);
    }

    let hosts = server.hosts();
    let path = server.path();
    let resolved = hosts::resolve(&hosts, &path)?;
    if resolved != path {
        return Ok(resolved);
    }

    hosts::resolve(&hosts, server.name())
}

fn expect_map(operation: &'static str, value: Value) -> Result<Map> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::UnexpectedType {
            operation,
            expected: "object",
            found: other.kind(),
        }),
    }
}

/// Role, class and param names may be any string that is not blank
pub fn is_name(token: &str) -> bool {
    !token.trim().is_empty()
}
