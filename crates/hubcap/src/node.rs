//! tree nodes and read-only views on them
//!
//! All nodes of a tree live in the [Hub]'s arena and refer to each other by [NodeId]. A parent
//! owns its children, the `parent` id is a back-reference used to walk towards the hub.
use crate::attributes::{cascade, Attributes, PuppetRoles};
use crate::error::{Error, Result};
use crate::filter::PATH_SEPARATOR;
use crate::hub::Hub;
use crate::value::Map;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const HUB: NodeId = NodeId(0);
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Hub,
    Group,
    Application { recipe_paths: Vec<String> },
    Server { address: String },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Hub => "HUB",
            NodeKind::Group => "GROUP",
            NodeKind::Application { .. } => "APPLICATION",
            NodeKind::Server { .. } => "SERVER",
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    /// what this node's own body declared
    pub(crate) attributes: Attributes,
}

impl Node {
    pub(crate) fn new(parent: Option<NodeId>, name: impl Into<String>, kind: NodeKind) -> Result<Self> {
        let name = name.into();
        if parent.is_none() && kind != NodeKind::Hub {
            return Err(Error::GroupWithoutParent(name));
        }

        Ok(Self {
            name,
            parent,
            children: Vec::new(),
            kind,
            attributes: Attributes::default(),
        })
    }
}

/// Borrowed view on a node of a [Hub]
#[derive(Clone, Copy)]
pub struct NodeRef<'h> {
    hub: &'h Hub,
    id: NodeId,
}

impl<'h> NodeRef<'h> {
    pub(crate) fn new(hub: &'h Hub, id: NodeId) -> Self {
        Self { hub, id }
    }

    fn node(&self) -> &'h Node {
        self.hub.node(self.id)
    }

    pub fn name(&self) -> &'h str {
        &self.node().name
    }

    pub fn kind(&self) -> &'h NodeKind {
        &self.node().kind
    }

    pub fn is_application(&self) -> bool {
        matches!(self.kind(), NodeKind::Application { .. })
    }

    pub fn parent(&self) -> Option<NodeRef<'h>> {
        self.node().parent.map(|id| NodeRef::new(self.hub, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'h>> + 'h {
        let hub = self.hub;
        self.node()
            .children
            .iter()
            .map(move |id| NodeRef::new(hub, *id))
    }

    /// Names from the hub (exclusive) down to this node (inclusive)
    pub fn history(&self) -> Vec<&'h str> {
        self.hub
            .lineage(self.id)
            .into_iter()
            .filter_map(|id| {
                let node = self.hub.node(id);
                node.parent.map(|_| node.name.as_str())
            })
            .collect()
    }

    /// History joined by the path separator
    pub fn path(&self) -> String {
        self.history().join(&PATH_SEPARATOR.to_string())
    }

    /// Attributes declared by this node itself
    pub fn own_attributes(&self) -> &'h Attributes {
        &self.node().attributes
    }

    /// Attributes of this node merged with everything inherited from its ancestors
    pub fn attributes(&self) -> Attributes {
        cascade(
            self.hub
                .lineage(self.id)
                .into_iter()
                .map(|id| &self.hub.node(id).attributes),
        )
    }

    pub fn cap_roles(&self) -> Vec<String> {
        self.attributes().cap_roles
    }

    pub fn puppet_roles(&self) -> PuppetRoles {
        self.attributes().puppet_roles
    }

    pub fn cap_attributes(&self) -> Map {
        self.attributes().cap_attributes
    }

    pub fn params(&self) -> Map {
        self.attributes().params
    }

    pub fn hosts(&self) -> crate::hosts::HostTable {
        self.attributes().hosts
    }

    /// Resolved address of a server
    pub fn address(&self) -> Option<&'h str> {
        match self.kind() {
            NodeKind::Server { address } => Some(address),
            _ => None,
        }
    }

    pub fn recipe_paths(&self) -> &'h [String] {
        match self.kind() {
            NodeKind::Application { recipe_paths } => recipe_paths,
            _ => &[],
        }
    }

    /// Nearest application above this node, not looking past the hub
    pub fn application_parent(&self) -> Option<NodeRef<'h>> {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.is_application() {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Classes and parameters handed to the provisioner for this node
    pub fn export(&self) -> ServerExport {
        let attributes = self.attributes();
        ServerExport {
            classes: attributes.puppet_roles,
            parameters: attributes.params,
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("kind", &self.kind().label())
            .field("path", &self.path())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.hub, other.hub) && self.id == other.id
    }
}

/// Per-server document consumed by the provisioning push step
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServerExport {
    pub classes: PuppetRoles,
    pub parameters: Map,
}

impl ServerExport {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<ServerExport> for crate::value::Value {
    fn from(value: ServerExport) -> Self {
        let classes: Map = value
            .classes
            .into_iter()
            .map(|(class, parameters)| (class, parameters.map(crate::value::Value::Object).into()))
            .collect();

        let mut map = Map::new();
        map.insert("classes".into(), classes.into());
        map.insert("parameters".into(), crate::value::Value::Object(value.parameters));
        crate::value::Value::Object(map)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_the_hub_may_lack_a_parent() {
        assert!(Node::new(None, "∞", NodeKind::Hub).is_ok());
        assert!(matches!(
            Node::new(None, "orphan", NodeKind::Group),
            Err(Error::GroupWithoutParent(name)) if name == "orphan"
        ));
        assert!(Node::new(Some(NodeId::HUB), "child", NodeKind::Group).is_ok());
    }
}
