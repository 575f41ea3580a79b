//! the root of a configuration tree
use crate::documents::Documents;
use crate::error::{Error, Result};
use crate::filter::Filters;
use crate::node::{Node, NodeId, NodeKind, NodeRef};
use crate::scope::Scope;
use crate::settings::Settings;
use crate::target::{self, Target};
use crate::value::{Map, Value};
use std::path::PathBuf;

/// Name displayed for the hub, it never shows up in a history
pub const HUB_NAME: &str = "∞";
/// Setting under which the hub registers itself on a target
pub const REGISTRATION_KEY: &str = "hubcap";
/// Setting caching whether the target runs in agnostic mode
pub const AGNOSTIC_KEY: &str = "hubcap_agnostic";
/// Setting naming the application being deployed
pub const APPLICATION_KEY: &str = "application";

#[derive(Debug)]
pub struct Hub {
    filters: Filters,
    nodes: Vec<Node>,
    pub(crate) settings: Settings,
    applications: Vec<NodeId>,
    servers: Vec<NodeId>,
    groups: Vec<NodeId>,
    /// files being declared, outermost first
    pub(crate) declaring: Vec<PathBuf>,
}

impl Hub {
    pub fn new(filters: Filters) -> Self {
        let root = Node {
            name: HUB_NAME.to_string(),
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Hub,
            attributes: Default::default(),
        };

        Self {
            filters,
            nodes: vec![root],
            settings: Settings::default(),
            applications: Vec::new(),
            servers: Vec::new(),
            groups: Vec::new(),
            declaring: Vec::new(),
        }
    }

    /// Build a hub by declaring every document in order, as if they were one body
    pub fn from_documents(filters: Filters, documents: &Documents) -> Result<Self> {
        let mut hub = Hub::new(filters);
        for document in documents.iter() {
            hub.scope().declare(document)?;
        }
        Ok(hub)
    }

    /// Declaration context for the hub's own body
    pub fn scope(&mut self) -> Scope<'_> {
        Scope::new(self, NodeId::HUB)
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, NodeId::HUB)
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, id)
    }

    /// Collected applications in the order their declarations completed
    pub fn applications(&self) -> Vec<NodeRef<'_>> {
        self.refs(&self.applications)
    }

    /// Collected servers in declaration order
    pub fn servers(&self) -> Vec<NodeRef<'_>> {
        self.refs(&self.servers)
    }

    /// Collected groups in the order their declarations completed
    pub fn groups(&self) -> Vec<NodeRef<'_>> {
        self.refs(&self.groups)
    }

    /// Collected server by its path, e.g. `production.db.db-1`
    pub fn server(&self, path: &str) -> Option<NodeRef<'_>> {
        self.servers().into_iter().find(|server| server.path() == path)
    }

    fn refs(&self, ids: &[NodeId]) -> Vec<NodeRef<'_>> {
        ids.iter().map(|id| NodeRef::new(self, *id)).collect()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Ids from the hub down to `id`, both inclusive
    pub(crate) fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut lineage = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            lineage.push(parent);
            current = self.node(parent).parent;
        }
        lineage.reverse();
        lineage
    }

    /// Register a finished node in the flat list matching its kind
    pub(crate) fn collect(&mut self, id: NodeId) {
        match self.node(id).kind {
            NodeKind::Hub => {}
            NodeKind::Group => self.groups.push(id),
            NodeKind::Application { .. } => self.applications.push(id),
            NodeKind::Server { .. } => self.servers.push(id),
        }
    }

    /// Multi-line dump of the whole tree
    pub fn tree(&self) -> String {
        crate::report::tree(self)
    }

    /// Describe the collected servers to a deployment target
    ///
    /// Outside agnostic mode this also requires exactly one application for all servers and no
    /// conflicting settings, then loads the application's recipes and applies all settings.
    #[tracing::instrument(level = "debug", skip_all, fields(filters = %self.filters))]
    pub fn configure(&self, target: &mut dyn Target) -> Result<()> {
        if target.exists(REGISTRATION_KEY) {
            return Err(Error::AlreadyConfigured);
        }
        target.set(REGISTRATION_KEY, self.registration());

        for module in [target::SERVERS_MODULE, target::PUPPET_MODULE] {
            target.load(module).map_err(Error::Target)?;
        }

        for server in self.servers() {
            let attributes = server.attributes();
            let address = server.address().unwrap_or_else(|| server.name());
            tracing::debug!(address, roles = ?attributes.cap_roles, "declare server");
            target.declare_server(address, &attributes.cap_roles, &attributes.cap_attributes);
        }

        if is_agnostic(target) {
            tracing::debug!("agnostic mode, skipping application configuration");
            return Ok(());
        }

        self.configure_application(target)
    }

    fn configure_application(&self, target: &mut dyn Target) -> Result<()> {
        let mut applications: Vec<NodeRef<'_>> = Vec::new();
        for application in self.servers().iter().filter_map(NodeRef::application_parent) {
            if !applications.contains(&application) {
                applications.push(application);
            }
        }

        if applications.len() > 1 {
            return Err(Error::TooManyApplications(
                applications.iter().map(|app| app.name().to_string()).collect(),
            ));
        }

        if !self.settings.clashes().is_empty() {
            return Err(Error::DuplicateSets(
                self.settings
                    .clashes()
                    .iter()
                    .map(|(key, setting)| format!("{key} = {setting}"))
                    .collect(),
            ));
        }

        let Some(application) = applications.first() else {
            return Err(Error::NoApplications);
        };

        tracing::debug!(application = application.name(), "application mode");
        target.set(APPLICATION_KEY, application.name().into());

        for recipe in application.recipe_paths() {
            target.load(recipe).map_err(Error::Target)?;
        }

        for (key, setting) in self.settings.iter() {
            let value = setting.resolve(&*target)?;
            target.set(key, value);
        }

        Ok(())
    }

    /// What the hub leaves on the target for the modules it loads: the active filter and the
    /// export of every collected server keyed by address
    fn registration(&self) -> Value {
        let servers: Map = self
            .servers()
            .iter()
            .map(|server| {
                let address = server.address().unwrap_or_else(|| server.name());
                (address.to_string(), server.export().into())
            })
            .collect();

        let mut registration = Map::new();
        registration.insert("filter".into(), self.filters.to_string().into());
        registration.insert("servers".into(), Value::Object(servers));
        Value::Object(registration)
    }
}

/// Agnostic mode: every requested task is one the target already knows without any application
/// recipes. The answer is cached on the target.
fn is_agnostic(target: &mut dyn Target) -> bool {
    if let Some(Value::Boolean(agnostic)) = target.fetch(AGNOSTIC_KEY) {
        return agnostic;
    }

    let agnostic = target
        .requested_tasks()
        .iter()
        .all(|task| target.find_task(task));
    target.set(AGNOSTIC_KEY, agnostic.into());
    agnostic
}
