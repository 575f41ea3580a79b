//! the deployment target a [crate::hub::Hub] configures
//!
//! The target owns named settings, declared servers and loaded modules. How it pushes anything to
//! remote hosts is none of our business. [MemoryTarget] keeps everything in memory, it backs the
//! `configure` dry run of the cli and the tests.
use crate::value::{Map, Value};
use indexmap::{IndexMap, IndexSet};

/// Module listing servers and rendering the tree
pub const SERVERS_MODULE: &str = "hubcap/recipes/servers";
/// Module pushing server exports and running the provisioner
pub const PUPPET_MODULE: &str = "hubcap/recipes/puppet";

/// Tasks registered by the built-in modules
pub fn builtin_tasks(module: &str) -> &'static [&'static str] {
    match module {
        SERVERS_MODULE => &["servers", "servers:list", "servers:tree"],
        PUPPET_MODULE => &[
            "puppet:freshen",
            "puppet:check",
            "puppet:update",
            "puppet:properties",
            "puppet:noop",
            "puppet:apply",
        ],
        _ => &[],
    }
}

pub trait Target {
    fn exists(&self, key: &str) -> bool;

    fn fetch(&self, key: &str) -> Option<Value>;

    fn set(&mut self, key: &str, value: Value);

    /// Declare a server by address with its roles and attributes
    fn declare_server(&mut self, address: &str, roles: &[String], attributes: &Map);

    /// Load an additional module (a recipe) into the target
    fn load(&mut self, module: &str) -> anyhow::Result<()>;

    /// Whether a task with this name is registered
    fn find_task(&self, name: &str) -> bool;

    /// Names of the tasks the operator asked to run
    fn requested_tasks(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeclaredServer {
    pub address: String,
    pub roles: Vec<String>,
    pub attributes: Map,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct MemoryTarget {
    settings: IndexMap<String, Value>,
    servers: Vec<DeclaredServer>,
    loaded: Vec<String>,
    #[serde(skip)]
    tasks: IndexSet<String>,
    #[serde(skip)]
    requested: Vec<String>,
}

impl MemoryTarget {
    /// Target on which the operator requested `tasks`
    pub fn requesting<S: Into<String>>(tasks: impl IntoIterator<Item = S>) -> Self {
        Self {
            requested: tasks.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Register a task as if some module provided it
    pub fn register_task(&mut self, name: impl Into<String>) {
        self.tasks.insert(name.into());
    }

    pub fn settings(&self) -> &IndexMap<String, Value> {
        &self.settings
    }

    pub fn servers(&self) -> &[DeclaredServer] {
        &self.servers
    }

    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }
}

impl Target for MemoryTarget {
    fn exists(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    fn fetch(&self, key: &str) -> Option<Value> {
        self.settings.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.settings.insert(key.to_string(), value);
    }

    fn declare_server(&mut self, address: &str, roles: &[String], attributes: &Map) {
        self.servers.push(DeclaredServer {
            address: address.to_string(),
            roles: roles.to_vec(),
            attributes: attributes.clone(),
        });
    }

    fn load(&mut self, module: &str) -> anyhow::Result<()> {
        anyhow::ensure!(!module.trim().is_empty(), "empty module name");

        tracing::debug!(module, "loading module");
        self.tasks
            .extend(builtin_tasks(module).iter().map(ToString::to_string));
        self.loaded.push(module.to_string());
        Ok(())
    }

    fn find_task(&self, name: &str) -> bool {
        self.tasks.contains(name)
    }

    fn requested_tasks(&self) -> Vec<String> {
        self.requested.clone()
    }
}
