//! Tests for the document model and target keys.

use super::*;
use serde_json::json;

#[test]
fn storage_key_keeps_plain_paths_verbatim() {
    let key = TargetKey::Plain(Utf8PathBuf::from("/home/u/proj/src/a.py"));
    assert_eq!(key.storage_key(), "/home/u/proj/src/a.py");
}

#[test]
fn storage_key_distinguishes_module_from_plain() {
    let plain = TargetKey::Plain(Utf8PathBuf::from("/home/u/proj"));
    let module = TargetKey::WithModule {
        dir: Utf8PathBuf::from("/home/u/proj"),
        module: String::from("tool.main"),
    };

    assert_ne!(plain.storage_key(), module.storage_key());
    assert_eq!(module.storage_key(), "/home/u/proj::module::tool.main");
}

#[test]
fn storage_key_is_stable_for_equal_targets() {
    let first = TargetKey::WithModule {
        dir: Utf8PathBuf::from("/work"),
        module: String::from("pkg.cli"),
    };
    let second = TargetKey::WithModule {
        dir: Utf8PathBuf::from("/work"),
        module: String::from("pkg.cli"),
    };

    assert_eq!(first.storage_key(), second.storage_key());
}

#[test]
fn target_leaf_mut_creates_intermediate_entries() {
    let mut document = Document::default();
    let key = TargetKey::Plain(Utf8PathBuf::from("/proj/a.py"));

    let leaf = document.target_leaf_mut("devbox", &key);
    leaf.insert(String::from("args"), json!("--fast"));

    let stored = document
        .target_leaf("devbox", &key)
        .unwrap_or_else(|| panic!("leaf should exist after get-or-create"));
    assert_eq!(stored.get("args"), Some(&json!("--fast")));
}

#[test]
fn host_entry_parses_flattened_overrides_next_to_scripts() {
    let raw = json!({
        "global": {"interpreter": "python3"},
        "host_cfg": {
            "devbox": {
                "remote_base_dir": "/srv/mirror",
                "scripts": {
                    "/proj/a.py": {"args": "--fast"}
                }
            }
        },
        "mru_host": "devbox"
    });

    let document: Document = serde_json::from_value(raw)
        .unwrap_or_else(|err| panic!("document should parse: {err}"));

    let entry = document
        .host_cfg
        .get("devbox")
        .unwrap_or_else(|| panic!("host entry should exist"));
    assert_eq!(entry.overrides.get("remote_base_dir"), Some(&json!("/srv/mirror")));
    assert_eq!(document.mru_host.as_deref(), Some("devbox"));

    let key = TargetKey::Plain(Utf8PathBuf::from("/proj/a.py"));
    let leaf = document
        .target_leaf("devbox", &key)
        .unwrap_or_else(|| panic!("target leaf should exist"));
    assert_eq!(leaf.get("args"), Some(&json!("--fast")));
}

#[test]
fn document_serialises_global_even_when_empty() {
    let rendered = serde_json::to_value(Document::default())
        .unwrap_or_else(|err| panic!("document should serialise: {err}"));

    assert_eq!(rendered.get("global"), Some(&json!({})));
    assert_eq!(rendered.get("mru_host"), None);
}
