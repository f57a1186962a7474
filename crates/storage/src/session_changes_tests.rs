// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn append_and_read_deduplicates() {
    let temp = tempfile::tempdir().unwrap();
    let log = SessionChangeLog::new(StateDir::at(temp.path().to_path_buf()));
    let session = SessionId::new("s-1");

    log.append(&session, Path::new("/p/a.ts")).unwrap();
    log.append(&session, Path::new("/p/b.ts")).unwrap();
    log.append(&session, Path::new("/p/a.ts")).unwrap();

    let set = log.read_set(&session).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains(Path::new("/p/a.ts")));
    assert!(set.contains(Path::new("/p/b.ts")));
}

#[test]
fn unknown_session_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    let log = SessionChangeLog::new(StateDir::at(temp.path().to_path_buf()));
    assert!(log.read_set(&SessionId::new("nope")).unwrap().is_empty());
}

#[test]
fn torn_tail_line_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let state = StateDir::at(temp.path().to_path_buf());
    let log = SessionChangeLog::new(state.clone());
    let session = SessionId::new("s-1");

    log.append(&session, Path::new("/p/a.ts")).unwrap();
    // Simulate a crash mid-append
    let path = state.file_changes_path(&session);
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"path\": \"/p/tr");
    std::fs::write(&path, content).unwrap();

    let set = log.read_set(&session).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn sessions_are_isolated() {
    let temp = tempfile::tempdir().unwrap();
    let log = SessionChangeLog::new(StateDir::at(temp.path().to_path_buf()));

    log.append(&SessionId::new("s-1"), Path::new("/p/a.ts"))
        .unwrap();

    assert!(log.read_set(&SessionId::new("s-2")).unwrap().is_empty());
}
