// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn hook(plugin: &str, hook_name: &str) -> PendingHook {
    PendingHook {
        plugin: plugin.to_string(),
        hook: hook_name.to_string(),
        directory: "/project".into(),
        command: "true".to_string(),
        if_changed: vec!["**/*.ts".to_string()],
        deferred: false,
    }
}

#[test]
fn save_load_delete_roundtrip() {
    let temp = tempfile::tempdir().unwrap();
    let store = PendingStore::new(StateDir::at(temp.path().to_path_buf()));
    let id = OrchestrationId::new("o-1");

    let hooks = vec![hook("lint-core", "lint"), hook("fmt", "format")];
    store.save(&id, &hooks).unwrap();
    assert_eq!(store.load(&id).unwrap(), hooks);

    store.delete(&id).unwrap();
    assert!(store.load(&id).unwrap().is_empty());
    // Deleting again is a no-op
    store.delete(&id).unwrap();
}

#[test]
fn load_unknown_orchestration_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    let store = PendingStore::new(StateDir::at(temp.path().to_path_buf()));
    assert!(store.load(&OrchestrationId::new("missing")).unwrap().is_empty());
}
