//! evaluate an hcl declaration body against a [Scope]
//!
//! ```hcl
//! role = ["baseline"]
//! host = { "db" = "10.0.0.5" }
//!
//! application "shop" {
//!   recipes = ["deploy"]
//!   cap_set = { repository = "git@example.com:shop.git" }
//!
//!   group "production" {
//!     param = { env = { FORCE_SSL = "1" } }
//!
//!     server "db" {
//!       role = "db"
//!     }
//!   }
//! }
//! ```
//!
//! Attributes are evaluated right away with a context that knows `self.name` and `self.path` of
//! the node being declared. `cap_set_deferred` blocks are evaluated when a target is configured,
//! their variables refer to settings of that target.
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::scope::{ApplicationOptions, Scope, ServerOptions};
use crate::target::Target;
use crate::value::{Map, Value};
use crate::visit::VisitVariables;
use hcl::eval::{Context, Evaluate};
use hcl::expr::Variable;
use hcl::{Attribute, Block, Body, Expression, ObjectKey, Structure};
use std::path::Path;

const RECIPES: &str = "recipes";
const ADDRESS: &str = "address";

/// Declare the contents of `document` in `scope`
pub fn declare(scope: &mut Scope<'_>, document: &Document) -> Result<()> {
    declare_body(scope, document.body(), document.dir(), &[])
}

/// `options` are attributes already consumed while building the node
fn declare_body(
    scope: &mut Scope<'_>,
    body: &Body,
    dir: Option<&Path>,
    options: &[&str],
) -> Result<()> {
    for structure in body.iter() {
        match structure {
            Structure::Attribute(attribute) if options.contains(&attribute.key.as_str()) => {}
            Structure::Attribute(attribute) => declare_attribute(scope, attribute, dir)?,
            Structure::Block(block) => declare_block(scope, block, dir)?,
        }
    }
    Ok(())
}

#[tracing::instrument(level = "trace", skip_all, fields(key = %attribute.key.as_str()))]
fn declare_attribute(scope: &mut Scope<'_>, attribute: &Attribute, dir: Option<&Path>) -> Result<()> {
    let key = attribute.key.as_str();
    let node = scope.node();
    let context = context(node.name(), &node.path());

    let evaluate = |expr: &Expression| -> Result<Value> { Ok(expr.evaluate(&context).map_err(hcl::eval::Errors::from)?.into()) };

    match key {
        "role" => scope.role(roles(evaluate(&attribute.expr)?)?),
        "cap_role" => scope.cap_role(roles(evaluate(&attribute.expr)?)?),
        "puppet_role" => scope.puppet_role(list(evaluate(&attribute.expr)?)),
        "param" => {
            check_param_keys(&attribute.expr)?;
            scope.param(evaluate(&attribute.expr)?)
        }
        "cap_attribute" => {
            for (key, value) in map("cap_attribute", evaluate(&attribute.expr)?)? {
                scope.cap_attribute(key, value)?;
            }
            Ok(())
        }
        "cap_set" => {
            for (key, value) in map("cap_set", evaluate(&attribute.expr)?)? {
                scope.cap_set(key, value)?;
            }
            Ok(())
        }
        "host" => {
            for (alias, target) in map("host", evaluate(&attribute.expr)?)? {
                let Value::String(target) = target else {
                    return Err(unexpected("host", "string", &target));
                };
                scope.host(alias, target)?;
            }
            Ok(())
        }
        "absorb" => {
            for path in strings("absorb", evaluate(&attribute.expr)?)? {
                let path = match dir {
                    Some(dir) => dir.join(path),
                    None => path.into(),
                };
                scope.absorb(path)?;
            }
            Ok(())
        }
        _ => Err(Error::UnknownDeclaration {
            kind: "attribute",
            name: key.to_string(),
        }),
    }
}

fn declare_block(scope: &mut Scope<'_>, block: &Block, dir: Option<&Path>) -> Result<()> {
    let identifier = block.identifier.as_str();
    match identifier {
        "group" => {
            let name = label(block)?;
            scope.group(name, |child| declare_body(child, &block.body, dir, &[]))
        }
        "application" => {
            let name = label(block)?;
            let recipes = match option(scope, block, name, RECIPES)? {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => strings(RECIPES, value)?,
            };
            scope.application(name, ApplicationOptions::new(recipes), |child| {
                declare_body(child, &block.body, dir, &[RECIPES])
            })
        }
        "server" => {
            let name = label(block)?;
            let address = match option(scope, block, name, ADDRESS)? {
                None | Some(Value::Null) => None,
                Some(Value::String(address)) => Some(address),
                Some(other) => return Err(unexpected(ADDRESS, "string", &other)),
            };
            scope.server(name, ServerOptions::new(address), |child| {
                declare_body(child, &block.body, dir, &[ADDRESS])
            })
        }
        "cap_set_deferred" => {
            if !block.labels.is_empty() {
                return Err(Error::InvalidLabels(identifier.to_string()));
            }
            for attribute in block.body.attributes() {
                declare_deferred(scope, attribute)?;
            }
            Ok(())
        }
        _ => Err(Error::UnknownDeclaration {
            kind: "block",
            name: identifier.to_string(),
        }),
    }
}

/// The expression is kept as is, the variables it uses are looked up on the target
fn declare_deferred(scope: &mut Scope<'_>, attribute: &Attribute) -> Result<()> {
    let expression = attribute.expr.clone();

    let mut variables: Vec<String> = Vec::new();
    expression.visit_variables(&mut |variable: &Variable| {
        let name = variable.as_str().to_string();
        if !variables.contains(&name) {
            variables.push(name);
        }
    });

    scope.cap_set_deferred(attribute.key.as_str(), move |target: &dyn Target| {
        let mut context = Context::new();
        for name in &variables {
            if let Some(value) = target.fetch(name) {
                context.declare_var(hcl::Identifier::unchecked(name.clone()), hcl::Value::from(value));
            }
        }
        Ok(expression.evaluate(&context).map_err(hcl::eval::Errors::from)?.into())
    })
}

/// Evaluate an option attribute of a block before the node exists
fn option(scope: &Scope<'_>, block: &Block, name: &str, key: &str) -> Result<Option<Value>> {
    let Some(attribute) = block.body.attributes().find(|a| a.key.as_str() == key) else {
        return Ok(None);
    };

    let mut path = scope.node().history();
    path.push(name);
    let context = context(name, &path.join("."));
    Ok(Some(attribute.expr.evaluate(&context).map_err(hcl::eval::Errors::from)?.into()))
}

fn context(name: &str, path: &str) -> Context<'static> {
    let mut this = Map::new();
    this.insert("name".into(), name.into());
    this.insert("path".into(), path.into());

    let mut context = Context::new();
    context.declare_var(
        hcl::Identifier::unchecked("self"),
        hcl::Value::from(Value::Object(this)),
    );
    context
}

fn label(block: &Block) -> Result<&str> {
    match block.labels.as_slice() {
        [label] => Ok(label.as_str()),
        _ => Err(Error::InvalidLabels(block.identifier.as_str().to_string())),
    }
}

/// Literal object keys of a `param` must be identifiers or strings
fn check_param_keys(expr: &Expression) -> Result<()> {
    let Expression::Object(object) = expr else {
        return Ok(());
    };

    for key in object.keys() {
        match key {
            ObjectKey::Identifier(_) => {}
            ObjectKey::Expression(Expression::String(_) | Expression::TemplateExpr(_)) => {}
            other => return Err(Error::InvalidParamKeyType(format!("{other:?}"))),
        }
    }
    Ok(())
}

/// A single value or an array of values
fn list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        value => vec![value],
    }
}

fn roles(value: Value) -> Result<Vec<String>> {
    list(value)
        .into_iter()
        .map(|value| match value {
            Value::String(role) => Ok(role),
            other => Err(Error::InvalidRole(other.to_string())),
        })
        .collect()
}

fn strings(operation: &'static str, value: Value) -> Result<Vec<String>> {
    list(value)
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Ok(s),
            other => Err(unexpected(operation, "string", &other)),
        })
        .collect()
}

fn map(operation: &'static str, value: Value) -> Result<Map> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(unexpected(operation, "object", &other)),
    }
}

fn unexpected(operation: &'static str, expected: &'static str, found: &Value) -> Error {
    Error::UnexpectedType {
        operation,
        expected,
        found: found.kind(),
    }
}
