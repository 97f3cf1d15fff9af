//! Process inspector Integration Tests
//!
//! `ps` / `pid_find` against the live host table

use std::process::Command as OsCommand;

use hostexec_core::domain::{FieldMatch, Filterer, PsResult};
use hostexec_core::ProcessError;
use hostexec_infra_system::identity::user_name;
use hostexec_infra_system::{pid_find, ps, ps_value};
use serde_json::json;

#[test]
fn test_all_includes_self() {
    let own = std::process::id();
    let records = ps(Filterer::All).unwrap().into_vec();
    assert!(records.iter().any(|r| r.pid == own));
}

#[test]
fn test_filter_shapes_against_child() {
    let mut child = OsCommand::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id();
    let me = user_name(nix::unistd::getuid().as_raw());

    let single = ps(pid).unwrap();
    assert!(matches!(single, PsResult::Single(Some(ref r)) if r.user == me));

    let fields = ps(FieldMatch::new().user(me.as_str()).cmd("sleep").full_cmd("sleep 30")).unwrap();
    assert!(fields.into_vec().iter().any(|r| r.pid == pid));

    let predicate = ps(Filterer::predicate(move |r| r.pid == pid)).unwrap();
    assert_eq!(predicate.len(), 1);

    let dynamic = ps_value(json!({ "pid": pid })).unwrap();
    assert!(matches!(dynamic, PsResult::Many(ref v) if v.len() == 1));

    child.kill().unwrap();
    child.wait().unwrap();
    assert_eq!(ps(pid).unwrap(), PsResult::Single(None));

    println!("✅ Filterers: pid, fields, predicate and JSON all select the child");
}

#[test]
fn test_unsupported_filterer_shape() {
    let err = ps_value(json!(["sleep"])).unwrap_err();
    assert!(matches!(err, ProcessError::Validation(_)));
    assert!(err.to_string().contains("Don't know how to handle filterer of type array"));
}

#[test]
fn test_zombie_is_listed_but_not_after_reap() {
    let mut child = OsCommand::new("sh").args(["-c", "exit 0"]).spawn().unwrap();
    let pid = child.id();

    // Exited but not yet reaped: still in the table
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(pid_find(pid).unwrap());

    child.wait().unwrap();
    assert!(!pid_find(pid).unwrap());
}
