//! Configuring targets from built hubs
use hubcap::hub::{AGNOSTIC_KEY, APPLICATION_KEY, REGISTRATION_KEY};
use hubcap::target::{MemoryTarget, Target, PUPPET_MODULE, SERVERS_MODULE};
use hubcap::{ApplicationOptions, Error, Filters, Hub, ServerOptions, Value};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn two_applications() -> Hub {
    hubcap::build(Filters::default(), |s| {
        s.application("a1", ApplicationOptions::default(), |s| {
            s.server("s1", ServerOptions::default(), |_| Ok(()))
        })?;
        s.application("a2", ApplicationOptions::default(), |s| {
            s.server("s2", ServerOptions::default(), |_| Ok(()))
        })
    })
    .unwrap()
}

#[test]
fn application_mode() {
    let hub = hubcap::load(Filters::parse("shop"), [data()]).unwrap();

    let mut target = MemoryTarget::requesting(["deploy"]);
    hub.configure(&mut target).unwrap();

    assert_eq!(target.loaded(), [SERVERS_MODULE, PUPPET_MODULE, "deploy"]);
    assert_eq!(target.fetch(AGNOSTIC_KEY), Some(Value::Boolean(false)));
    assert_eq!(target.fetch(APPLICATION_KEY), Some(Value::from("shop")));
    assert_eq!(target.fetch("branch"), Some(Value::from("main")));
    assert_eq!(target.fetch("deploy_to"), Some(Value::from("/srv/shop")));

    let declared: Vec<_> = target
        .servers()
        .iter()
        .map(|server| (server.address.as_str(), server.roles.clone()))
        .collect();
    assert_eq!(
        declared,
        [
            ("10.0.0.1", vec!["baseline".to_string(), "app".into(), "web".into()]),
            ("10.0.0.5", vec!["baseline".to_string(), "db".into()]),
        ]
    );
}

#[test]
fn registration_describes_filter_and_exports() {
    let hub = hubcap::load(Filters::parse("shop"), [data()]).unwrap();

    let mut target = MemoryTarget::default();
    hub.configure(&mut target).unwrap();

    let registration = target.fetch(REGISTRATION_KEY).unwrap();
    let registration = registration.as_object().unwrap();
    assert_eq!(registration["filter"], Value::from("shop"));

    let servers = registration["servers"].as_object().unwrap();
    assert_eq!(servers.keys().collect::<Vec<_>>(), ["10.0.0.1", "10.0.0.5"]);
    assert_eq!(
        servers["10.0.0.5"],
        Value::from(serde_json::json!({
            "classes": { "baseline": null, "db": null },
            "parameters": { "env": { "RAILS_ENV": "production" } },
        }))
    );
}

#[test]
fn agnostic_mode_skips_applications() {
    let hub = two_applications();

    let mut target = MemoryTarget::requesting(["servers:list"]);
    hub.configure(&mut target).unwrap();

    assert_eq!(target.servers().len(), 2);
    assert!(!target.exists(APPLICATION_KEY));
    assert_eq!(target.loaded(), [SERVERS_MODULE, PUPPET_MODULE]);
}

#[test]
fn too_many_applications() {
    let hub = two_applications();

    let mut target = MemoryTarget::requesting(["deploy"]);
    let result = hub.configure(&mut target);
    assert!(matches!(
        result,
        Err(Error::TooManyApplications(names)) if names == ["a1", "a2"]
    ));
}

#[test]
fn no_applications() {
    let hub = hubcap::build(Filters::default(), |s| {
        s.server("lonely", ServerOptions::default(), |_| Ok(()))
    })
    .unwrap();

    let mut target = MemoryTarget::requesting(["deploy"]);
    assert!(matches!(hub.configure(&mut target), Err(Error::NoApplications)));
}

#[test]
fn conflicting_settings() {
    let hub = hubcap::build(Filters::default(), |s| {
        s.cap_set("foo", "bar")?;
        s.application("app", ApplicationOptions::default(), |s| {
            s.server("test", ServerOptions::default(), |s| s.cap_set("foo", "baz"))
        })
    })
    .unwrap();

    let mut target = MemoryTarget::requesting(["deploy"]);
    let result = hub.configure(&mut target);
    assert!(matches!(
        result,
        Err(Error::DuplicateSets(clashes)) if clashes == [r#"foo = "baz""#]
    ));
}

#[test]
fn configure_only_once() {
    let hub = two_applications();

    let mut target = MemoryTarget::default();
    hub.configure(&mut target).unwrap();
    assert!(matches!(hub.configure(&mut target), Err(Error::AlreadyConfigured)));
}

#[test]
fn export() {
    let hub = hubcap::build(Filters::default(), |s| {
        s.server("test", ServerOptions::default(), |s| {
            s.param(serde_json::json!({ "foo": 1, "bar": 2 }))?;
            s.role(["baseline", "test::server"])
        })
    })
    .unwrap();

    let export = hub.server("test").unwrap().export();
    assert_eq!(
        export.to_json().unwrap(),
        r#"{
  "classes": {
    "baseline": null,
    "test::server": null
  },
  "parameters": {
    "foo": 1,
    "bar": 2
  }
}"#
    );

    let yaml: serde_json::Value = serde_yaml::from_str(&export.to_yaml().unwrap()).unwrap();
    assert_eq!(
        yaml,
        serde_json::json!({
            "classes": { "baseline": null, "test::server": null },
            "parameters": { "foo": 1, "bar": 2 },
        })
    );
}

#[test]
fn deferred_settings_are_resolved_on_configure() {
    let hub = hubcap::build(Filters::default(), |s| {
        s.application("shop", ApplicationOptions::default(), |s| {
            s.cap_set("user", "deploy")?;
            s.cap_set_deferred("home", |target: &dyn Target| {
                let user = target.fetch("user").unwrap_or(Value::Null);
                Ok(format!("/home/{}", user.as_str().unwrap_or("nobody")).into())
            })?;
            s.server("web", ServerOptions::default(), |_| Ok(()))
        })
    })
    .unwrap();

    let mut target = MemoryTarget::requesting(["deploy"]);
    hub.configure(&mut target).unwrap();
    assert_eq!(target.fetch("home"), Some(Value::from("/home/deploy")));
}
