//! # hubcap - hierarchical server configuration
//!
//! Describe servers once, as a tree, and hand a filtered slice of that tree to a deployment
//! target.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `hubcap` works internally.
//!
//! ### The tree
//!
//! - the [Hub] is the root, there is exactly one per configuration
//! - below it are `group`s, `application`s and `server`s
//! - groups and applications may contain further nodes, servers are leaves
//! - an application may not contain another application anywhere below it
//!
//! Every node has a `history`: the names from the hub (exclusive) down to the node itself. The
//! history joined with `.` is the node's path, e.g. `production.shop.web-1`.
//!
//! ### Declaring
//!
//! A node is declared with a body. The body receives a [Scope] for the new node and may add
//! roles, params, host table entries and so on, or declare children.
//!
//! ```
//! use hubcap::{ServerOptions, Filters};
//!
//! let hub = hubcap::build(Filters::default(), |s| {
//!     s.role(["baseline"])?;
//!     s.group("production", |s| {
//!         s.host("db", "10.0.0.5")?;
//!         s.server("db", ServerOptions::default(), |s| s.role(["postgres"]))
//!     })
//! })?;
//!
//! let db = hub.server("production.db").unwrap();
//! assert_eq!(db.address(), Some("10.0.0.5"));
//! assert_eq!(db.cap_roles(), ["baseline", "postgres"]);
//! # Ok::<(), hubcap::Error>(())
//! ```
//!
//! Usually bodies come from `.hcl` files instead, see [declare] for the available attributes and
//! blocks and [documents] for loading.
//!
//! ### Inheritance
//!
//! Nodes only store what their own body declared (see [attributes::Attributes]). Effective values
//! are computed by walking from the hub down to a node: role lists are concatenated, maps are
//! merged with the deepest node winning. `params` merge recursively.
//!
//! ### Filters
//!
//! A hub is built with [Filters], e.g. `production.shop`. A node whose history diverges from the
//! filter is not built at all (its body never runs). Nodes on the way to the filter point are
//! built but only nodes at or below the filter depth are collected into [Hub::servers],
//! [Hub::applications] and [Hub::groups].
//!
//! ### Configuring a target
//!
//! [Hub::configure] declares the collected servers on a [target::Target]. Unless the target only
//! runs tasks it already knows ("agnostic mode") the servers must all belong to one application
//! whose recipes and `cap_set` settings are then applied to the target.
pub mod attributes;
pub mod declare;
pub mod documents;
mod error;
pub mod filter;
pub mod hosts;
pub mod hub;
pub mod node;
pub mod report;
mod scope;
pub mod settings;
pub mod target;
pub mod value;
mod visit;

pub use error::{Error, Result};
pub use filter::Filters;
pub use hub::Hub;
pub use node::NodeRef;
pub use scope::{is_name, ApplicationOptions, Scope, ServerOptions};
pub use value::Value;

use std::path::Path;

/// Build a hub from a rust body
pub fn build<F>(filters: Filters, body: F) -> Result<Hub>
where
    F: FnOnce(&mut Scope<'_>) -> Result<()>,
{
    let mut hub = Hub::new(filters);
    body(&mut hub.scope())?;
    Ok(hub)
}

/// Build a hub from declaration files and directories, in the given order
pub fn load<P: AsRef<Path>>(filters: Filters, paths: impl IntoIterator<Item = P>) -> Result<Hub> {
    let mut documents = documents::Documents::default();
    for path in paths {
        documents.load_path(path.as_ref())?;
    }
    Hub::from_documents(filters, &documents)
}
