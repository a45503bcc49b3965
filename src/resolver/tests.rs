//! Tests for layered resolution and document write-backs.

use std::cell::RefCell;

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

/// Prompter double that records the pre-filled value it was shown.
#[derive(Debug, Default)]
struct FakePrompter {
    args_reply: Option<String>,
    seen_initial: RefCell<Option<String>>,
}

impl FakePrompter {
    fn replying(args: &str) -> Self {
        Self {
            args_reply: Some(String::from(args)),
            seen_initial: RefCell::new(None),
        }
    }
}

impl Prompter for FakePrompter {
    fn select_host(&self, hosts: &[String]) -> Result<String, PromptError> {
        hosts.first().cloned().ok_or(PromptError::NoHosts)
    }

    fn edit_args(&self, current: &str) -> Result<String, PromptError> {
        *self.seen_initial.borrow_mut() = Some(String::from(current));
        Ok(self
            .args_reply
            .clone()
            .unwrap_or_else(|| String::from(current)))
    }
}

fn script_key() -> TargetKey {
    TargetKey::Plain(Utf8PathBuf::from("/home/u/proj/src/a.py"))
}

#[fixture]
fn layered_document() -> Document {
    serde_json::from_value(json!({
        "global": {"interpreter": "global-python", "remote_base_dir": "/srv"},
        "host_cfg": {
            "devbox": {
                "interpreter": "host-python",
                "scripts": {
                    "/home/u/proj/src/a.py": {"interpreter": "target-python"}
                }
            }
        }
    }))
    .unwrap_or_else(|err| panic!("layered document should parse: {err}"))
}

#[rstest]
fn target_layer_wins_over_host_global_and_defaults(mut layered_document: Document) {
    let runtime = resolve(
        &mut layered_document,
        &CliOverrides::default(),
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert_eq!(runtime.interpreter, "target-python");
    // Keys untouched by later layers keep the earlier layer's value.
    assert_eq!(runtime.remote_base_dir, Utf8PathBuf::from("/srv"));
    assert!(runtime.auto_add_hosts);
}

#[rstest]
fn host_layer_wins_when_target_leaf_is_silent(mut layered_document: Document) {
    let other = TargetKey::Plain(Utf8PathBuf::from("/home/u/proj/src/b.py"));

    let runtime = resolve(
        &mut layered_document,
        &CliOverrides::default(),
        "devbox",
        &other,
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert_eq!(runtime.interpreter, "host-python");
}

#[rstest]
fn resolving_twice_without_overrides_is_idempotent(mut layered_document: Document) {
    let overrides = CliOverrides::default();
    let prompter = FakePrompter::default();

    let first = resolve(
        &mut layered_document,
        &overrides,
        "devbox",
        &script_key(),
        &prompter,
    )
    .unwrap_or_else(|err| panic!("first resolve: {err}"));
    let second = resolve(
        &mut layered_document,
        &overrides,
        "devbox",
        &script_key(),
        &prompter,
    )
    .unwrap_or_else(|err| panic!("second resolve: {err}"));

    assert_eq!(first, second);
}

#[test]
fn cli_args_become_sticky_for_the_same_target_and_host() {
    let mut document = Document::default();
    let overrides = CliOverrides {
        args: Some(String::from("--foo")),
        ..CliOverrides::default()
    };

    resolve(
        &mut document,
        &overrides,
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve with args: {err}"));

    // A later run without -a resolves the persisted value.
    let rerun = resolve(
        &mut document,
        &CliOverrides::default(),
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve without args: {err}"));

    assert_eq!(rerun.args.as_deref(), Some("--foo"));
}

#[test]
fn cli_interpreter_becomes_sticky_like_args() {
    let mut document = Document::default();
    let overrides = CliOverrides {
        interpreter: Some(String::from("pypy3")),
        ..CliOverrides::default()
    };

    resolve(
        &mut document,
        &overrides,
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve with interpreter: {err}"));

    let rerun = resolve(
        &mut document,
        &CliOverrides::default(),
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve without interpreter: {err}"));

    assert_eq!(rerun.interpreter, "pypy3");
}

#[test]
fn mru_host_records_the_chosen_host_on_every_resolve() {
    let mut document = Document {
        mru_host: Some(String::from("oldbox")),
        ..Document::default()
    };

    resolve(
        &mut document,
        &CliOverrides::default(),
        "newbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert_eq!(document.mru_host.as_deref(), Some("newbox"));
}

#[test]
fn unknown_host_gains_an_entry_and_a_target_leaf() {
    let mut document = Document::default();

    resolve(
        &mut document,
        &CliOverrides::default(),
        "freshbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert!(document.host_cfg.contains_key("freshbox"));
    assert!(document.target_leaf("freshbox", &script_key()).is_some());
}

#[test]
fn edit_args_prompts_with_the_current_value_and_overwrites_it() {
    let mut document: Document = serde_json::from_value(json!({
        "global": {"args": "--old"},
        "host_cfg": {}
    }))
    .unwrap_or_else(|err| panic!("document should parse: {err}"));
    let prompter = FakePrompter::replying("--new");
    let overrides = CliOverrides {
        edit_args: true,
        ..CliOverrides::default()
    };

    let runtime = resolve(&mut document, &overrides, "devbox", &script_key(), &prompter)
        .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert_eq!(prompter.seen_initial.borrow().as_deref(), Some("--old"));
    assert_eq!(runtime.args.as_deref(), Some("--new"));
    let leaf = document
        .target_leaf("devbox", &script_key())
        .unwrap_or_else(|| panic!("leaf should exist"));
    assert_eq!(leaf.get("args"), Some(&json!("--new")));
}

#[test]
fn edit_args_prompt_defaults_to_empty_when_no_args_resolved() {
    let mut document = Document::default();
    let prompter = FakePrompter::replying("--fresh");
    let overrides = CliOverrides {
        edit_args: true,
        ..CliOverrides::default()
    };

    resolve(&mut document, &overrides, "devbox", &script_key(), &prompter)
        .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert_eq!(prompter.seen_initial.borrow().as_deref(), Some(""));
}

#[test]
fn cli_flags_overlay_merged_values_when_set() {
    let mut document: Document = serde_json::from_value(json!({
        "global": {"verbose": false, "prompt": false},
        "host_cfg": {}
    }))
    .unwrap_or_else(|err| panic!("document should parse: {err}"));
    let overrides = CliOverrides {
        verbose: true,
        prompt: true,
        test: Some(String::from("TestLogin")),
        ..CliOverrides::default()
    };

    let runtime = resolve(
        &mut document,
        &overrides,
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    )
    .unwrap_or_else(|err| panic!("resolve: {err}"));

    assert!(runtime.verbose);
    assert!(runtime.prompt);
    assert_eq!(runtime.test.as_deref(), Some("TestLogin"));
}

#[test]
fn malformed_layer_types_surface_as_merge_errors() {
    let mut document: Document = serde_json::from_value(json!({
        "global": {"interpreter": 5},
        "host_cfg": {}
    }))
    .unwrap_or_else(|err| panic!("document should parse: {err}"));

    let result = resolve(
        &mut document,
        &CliOverrides::default(),
        "devbox",
        &script_key(),
        &FakePrompter::default(),
    );

    assert!(
        matches!(result, Err(ResolveError::Merge(_))),
        "expected Merge error, got {result:?}"
    );
}
