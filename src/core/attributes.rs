//! SO-023: Node attribute document.
//!
//! Caller attributes win. Context defaults only fill keys that are missing
//! or null, so filling twice gives the same document as filling once. The
//! run list always lands under `run_list`.

use super::types::DeployContext;
use serde_json::{Map, Value};

pub type Attributes = Map<String, Value>;

/// Reserved key holding the run list.
pub const RUN_LIST_KEY: &str = "run_list";

/// Default attributes taken from the deployment context.
pub fn context_defaults(ctx: &DeployContext, release_name: &str) -> Attributes {
    let entries = [
        ("application", ctx.application.clone()),
        ("deploy_to", ctx.deploy_to()),
        ("user", ctx.user.clone()),
        ("password", ctx.password.clone()),
        ("main_server", ctx.main_server.clone()),
        ("migrate_env", ctx.migrate_env.clone()),
        ("scm", ctx.scm.clone()),
        ("repository", ctx.repository.clone()),
        ("current_path", ctx.current_path()),
        ("release_path", ctx.release_path(release_name)),
        ("shared_path", ctx.shared_path()),
    ];
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(Value::String).unwrap_or(Value::Null)))
        .collect()
}

/// Fill `defaults` into `attrs` without overwriting anything set.
pub fn fill_defaults(attrs: &mut Attributes, defaults: &Attributes) {
    for (key, value) in defaults {
        match attrs.get(key) {
            Some(existing) if !existing.is_null() => {}
            _ => {
                attrs.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Build the document chef-solo reads with `-j`.
///
/// `defaults` is `None` when default attributes are switched off.
pub fn build(seed: &Attributes, defaults: Option<&Attributes>, run_list: &[String]) -> Attributes {
    let mut attrs = seed.clone();
    if let Some(defaults) = defaults {
        fill_defaults(&mut attrs, defaults);
    }
    attrs.insert(
        RUN_LIST_KEY.to_string(),
        Value::Array(run_list.iter().cloned().map(Value::String).collect()),
    );
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ctx() -> DeployContext {
        DeployContext {
            application: Some("myapp".into()),
            deploy_to: Some("/srv/myapp".into()),
            user: Some("deploy".into()),
            ..DeployContext::default()
        }
    }

    fn obj(v: Value) -> Attributes {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_so023_context_defaults() {
        let d = context_defaults(&ctx(), "20260101000000");
        assert_eq!(d["application"], "myapp");
        assert_eq!(d["deploy_to"], "/srv/myapp");
        assert_eq!(d["current_path"], "/srv/myapp/current");
        assert_eq!(d["shared_path"], "/srv/myapp/shared");
        assert_eq!(d["release_path"], "/srv/myapp/releases/20260101000000");
        assert_eq!(d["scm"], Value::Null);
        assert_eq!(d.len(), 11);
    }

    #[test]
    fn test_so023_caller_values_win() {
        let seed = obj(json!({ "application": "override", "nginx": { "port": 80 } }));
        let defaults = context_defaults(&ctx(), "r1");
        let doc = build(&seed, Some(&defaults), &["recipe[foo]".into()]);
        assert_eq!(doc["application"], "override");
        assert_eq!(doc["nginx"]["port"], 80);
        assert_eq!(doc["user"], "deploy");
    }

    #[test]
    fn test_so023_null_is_filled() {
        let mut attrs = obj(json!({ "user": null }));
        fill_defaults(&mut attrs, &context_defaults(&ctx(), "r1"));
        assert_eq!(attrs["user"], "deploy");
    }

    #[test]
    fn test_so023_defaults_disabled() {
        let seed = obj(json!({ "foo": { "bar": "baz" } }));
        let doc = build(&seed, None, &["recipe[foo]".into()]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["foo"]["bar"], "baz");
        assert_eq!(doc[RUN_LIST_KEY], json!(["recipe[foo]"]));
    }

    #[test]
    fn test_so023_run_list_replaced() {
        let seed = obj(json!({ "run_list": ["recipe[stale]"] }));
        let doc = build(&seed, None, &["recipe[a]".into(), "role[b]".into()]);
        assert_eq!(doc[RUN_LIST_KEY], json!(["recipe[a]", "role[b]"]));
    }

    #[test]
    fn test_so023_run_list_last_key() {
        let defaults = context_defaults(&ctx(), "r1");
        let doc = build(&Attributes::new(), Some(&defaults), &["recipe[a]".into()]);
        assert_eq!(doc.keys().last().map(String::as_str), Some(RUN_LIST_KEY));
    }

    proptest! {
        #[test]
        fn test_so023_fill_idempotent(
            seeded in proptest::collection::btree_map("[a-z_]{1,12}", "[a-z0-9]{0,8}", 0..8),
            app in proptest::option::of("[a-z]{1,8}"),
        ) {
            let seed: Attributes = seeded
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let context = DeployContext { application: app, ..DeployContext::default() };
            let defaults = context_defaults(&context, "r1");

            let mut once = seed.clone();
            fill_defaults(&mut once, &defaults);
            let mut twice = once.clone();
            fill_defaults(&mut twice, &defaults);
            prop_assert_eq!(&once, &twice);

            for (k, v) in &seed {
                prop_assert_eq!(&once[k], v);
            }
        }
    }
}
