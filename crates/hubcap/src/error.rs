//! error kinds shared by building, loading and configuring a hub
use crate::documents::LoadError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Group `{0}` has no parent")]
    GroupWithoutParent(String),

    #[error("Application `{0}` may not be declared inside another application")]
    NestedApplicationDisallowed(String),

    #[error("Server may not declare a child ({0})")]
    ServerSubgroupDisallowed(&'static str),

    #[error("Param key may not be blank: {0}")]
    InvalidParamKeyType(String),

    #[error("Role must be a name: {0:?}")]
    InvalidRole(String),

    #[error("Puppet role must be a class name or a map of class parameters: {0}")]
    InvalidPuppetRole(String),

    #[error("`{operation}` expects {expected}, found {found}")]
    UnexpectedType {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Circular host reference: {}", .0.join(" -> "))]
    HostCircularReference(Vec<String>),

    #[error("Circular absorb: {}", .0.join(" -> "))]
    AbsorbCircularReference(Vec<String>),

    #[error("Servers belong to more than one application: {}", .0.join(", "))]
    TooManyApplications(Vec<String>),

    #[error("No application found for the selected servers")]
    NoApplications,

    #[error("Conflicting settings: {}", .0.join(", "))]
    DuplicateSets(Vec<String>),

    #[error("Target was already configured by hubcap")]
    AlreadyConfigured,

    #[error("Unknown {kind} `{name}`")]
    UnknownDeclaration { kind: &'static str, name: String },

    #[error("Block `{0}` requires exactly one label")]
    InvalidLabels(String),

    #[error("Unable to evaluate expression")]
    Eval(#[from] hcl::eval::Errors),

    #[error("Target operation failed")]
    Target(#[source] anyhow::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}
