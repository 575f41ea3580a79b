//! human readable renderings of a hub, for inspection only
use crate::attributes::Attributes;
use crate::hub::Hub;
use crate::node::{NodeKind, NodeRef};
use crate::value::Value;

const INDENT: &str = "  ";

/// Every built node with the attributes it declared itself
pub fn tree(hub: &Hub) -> String {
    let mut lines = Vec::new();
    tree_lines(hub, hub.root(), 0, &mut lines);
    lines.join("\n")
}

fn tree_lines(hub: &Hub, node: NodeRef<'_>, depth: usize, lines: &mut Vec<String>) {
    let title = match node.address() {
        Some(address) if address != node.name() => {
            format!("{}: {} ({address})", node.kind().label(), node.name())
        }
        _ => format!("{}: {}", node.kind().label(), node.name()),
    };
    lines.push(format!("{}{title}", INDENT.repeat(depth)));

    let indent = INDENT.repeat(depth + 1);
    let attributes = node.own_attributes();
    if !attributes.cap_attributes.is_empty() {
        lines.push(format!("{indent}Atts: {}", json(attributes.cap_attributes.clone())));
    }
    if let Some(roles) = roles(attributes) {
        lines.push(format!("{indent}Role: {roles}"));
    }
    if !attributes.params.is_empty() {
        lines.push(format!("{indent}Parm: {}", json(attributes.params.clone())));
    }
    if !attributes.hosts.is_empty() {
        lines.push(format!("{indent}Host: {}", json(attributes.hosts.clone())));
    }

    match node.kind() {
        NodeKind::Hub if !hub.settings().is_empty() => {
            let sets: Vec<String> = hub
                .settings()
                .iter()
                .map(|(key, setting)| format!("{key} = {setting}"))
                .collect();
            lines.push(format!("{indent}Sets: {}", sets.join(", ")));
        }
        NodeKind::Application { recipe_paths } if !recipe_paths.is_empty() => {
            lines.push(format!("{indent}Load: {}", json(recipe_paths.clone())));
        }
        _ => {}
    }

    for child in node.children() {
        tree_lines(hub, child, depth + 1, lines);
    }
}

/// Collected servers with their effective attributes, separated by blank lines
pub fn summary(hub: &Hub) -> String {
    let servers: Vec<String> = hub
        .servers()
        .into_iter()
        .map(|server| {
            let attributes = server.attributes();
            let mut lines = vec![display_name(server)];

            if let Some(application) = server.application_parent() {
                lines.push(format!("{INDENT}Appli: {}", application.name()));
            }
            if !attributes.cap_attributes.is_empty() {
                lines.push(format!("{INDENT}Attrs: {}", json(attributes.cap_attributes.clone())));
            }
            if let Some(roles) = roles(&attributes) {
                lines.push(format!("{INDENT}Roles: {roles}"));
            }
            if !attributes.params.is_empty() {
                lines.push(format!("{INDENT}Parms: {}", json(attributes.params.clone())));
            }
            lines.join("\n")
        })
        .collect();

    servers.join("\n\n")
}

/// One line per collected server: path, address, application and roles
pub fn list(hub: &Hub) -> String {
    let servers: Vec<String> = hub
        .servers()
        .into_iter()
        .map(|server| {
            let attributes = server.attributes();
            let mut fields = vec![
                server.path(),
                server.address().unwrap_or_else(|| server.name()).to_string(),
            ];

            if let Some(application) = server.application_parent() {
                fields.push(format!("App[{}]", application.name()));
            }
            if attributes.roles_coincide() {
                fields.push(format!("Role{}", json(attributes.cap_roles.clone())));
            } else {
                if !attributes.cap_roles.is_empty() {
                    fields.push(format!("Cap{}", json(attributes.cap_roles.clone())));
                }
                if !attributes.puppet_roles.is_empty() {
                    fields.push(format!("Pup{}", json(attributes.puppet_roles.clone())));
                }
            }
            fields.join(", ")
        })
        .collect();

    servers.join("\n")
}

fn display_name(server: NodeRef<'_>) -> String {
    match server.address() {
        Some(address) if address != server.name() => format!("{} ({address})", server.name()),
        _ => server.name().to_string(),
    }
}

/// `None` when there are no roles at all
fn roles(attributes: &Attributes) -> Option<String> {
    if attributes.cap_roles.is_empty() && attributes.puppet_roles.is_empty() {
        return None;
    }

    if attributes.roles_coincide() {
        return Some(json(attributes.cap_roles.clone()));
    }

    let mut parts = Vec::new();
    if !attributes.cap_roles.is_empty() {
        parts.push(format!("Cap - {}", json(attributes.cap_roles.clone())));
    }
    if !attributes.puppet_roles.is_empty() {
        parts.push(format!("Puppet - {}", json(attributes.puppet_roles.clone())));
    }
    Some(parts.join(" | "))
}

fn json(value: impl Into<Value>) -> String {
    value.into().to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::filter::Filters;
    use crate::scope::{ApplicationOptions, ServerOptions};
    use pretty_assertions::assert_eq;

    fn hub() -> Hub {
        let mut hub = Hub::new(Filters::default());
        let mut scope = hub.scope();
        scope.role(["baseline"]).unwrap();
        scope.cap_set("branch", "main").unwrap();
        scope
            .application("shop", ApplicationOptions::default().recipe("deploy"), |s| {
                s.server("web", ServerOptions::address("10.0.0.1"), |s| {
                    s.cap_role(["app"])?;
                    s.param(serde_json::json!({ "port": 80 }))
                })
            })
            .unwrap();
        hub
    }

    #[test]
    fn tree_shows_own_attributes() {
        assert_eq!(
            tree(&hub()),
            [
                "HUB: ∞",
                "  Role: [\"baseline\"]",
                "  Sets: branch = \"main\"",
                "  APPLICATION: shop",
                "    Load: [\"deploy\"]",
                "    SERVER: web (10.0.0.1)",
                "      Role: Cap - [\"app\"]",
                "      Parm: {\"port\":80}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn summary_shows_effective_attributes() {
        assert_eq!(
            summary(&hub()),
            [
                "web (10.0.0.1)",
                "  Appli: shop",
                "  Roles: Cap - [\"baseline\",\"app\"] | Puppet - {\"baseline\":null}",
                "  Parms: {\"port\":80}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn list_is_one_line_per_server() {
        assert_eq!(
            list(&hub()),
            "web, 10.0.0.1, App[shop], Cap[\"baseline\",\"app\"], Pup{\"baseline\":null}"
        );
    }
}
