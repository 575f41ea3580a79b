//! global settings declared anywhere in the tree via `cap_set`
//!
//! Settings are applied to the deployment target only in application mode. A key that is set
//! twice to different values is recorded as a clash, clashes are reported at configure time.
use crate::error::Result;
use crate::target::Target;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

/// A value computed when the target is configured, not when it is declared
#[derive(Clone)]
pub struct Deferred(Rc<dyn Fn(&dyn Target) -> Result<Value>>);

impl Deferred {
    pub fn new(f: impl Fn(&dyn Target) -> Result<Value> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn resolve(&self, target: &dyn Target) -> Result<Value> {
        (self.0)(target)
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<deferred>")
    }
}

#[derive(Debug, Clone)]
pub enum Setting {
    Immediate(Value),
    Deferred(Deferred),
}

impl Setting {
    pub fn resolve(&self, target: &dyn Target) -> Result<Value> {
        match self {
            Setting::Immediate(value) => Ok(value.clone()),
            Setting::Deferred(deferred) => deferred.resolve(target),
        }
    }
}

/// Immediate values compare by value, deferred values only equal themselves
impl PartialEq for Setting {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Setting::Immediate(a), Setting::Immediate(b)) => a == b,
            (Setting::Deferred(a), Setting::Deferred(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Immediate(value) => std::fmt::Display::fmt(value, f),
            Setting::Deferred(deferred) => std::fmt::Debug::fmt(deferred, f),
        }
    }
}

impl From<Value> for Setting {
    fn from(value: Value) -> Self {
        Setting::Immediate(value)
    }
}

impl From<Deferred> for Setting {
    fn from(value: Deferred) -> Self {
        Setting::Deferred(value)
    }
}

#[derive(Debug, Default)]
pub struct Settings {
    values: IndexMap<String, Setting>,
    clashes: Vec<(String, Setting)>,
}

impl Settings {
    pub fn set(&mut self, key: impl Into<String>, setting: Setting) {
        let key = key.into();
        match self.values.get(&key) {
            Some(existing) if *existing != setting => {
                tracing::debug!(%key, %existing, new = %setting, "setting clash");
                self.clashes.push((key, setting));
            }
            _ => {
                self.values.insert(key, setting);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Setting> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Setting)> {
        self.values.iter()
    }

    pub fn clashes(&self) -> &[(String, Setting)] {
        &self.clashes
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
