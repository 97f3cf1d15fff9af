//! Async spawner Integration Tests
//!
//! Live handles: running flag, timeouts, callbacks, kill and ps visibility

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hostexec_core::domain::{Command, FieldMatch, LaunchOptions, PsResult, SpawnOptions};
use hostexec_core::ProcessError;
use hostexec_infra_system::{kill, pid_find, ps, spawn_async};

#[tokio::test]
async fn test_running_flips_once_after_exit() {
    let started = Instant::now();
    let outcome = spawn_async(&Command::with_args("sleep", ["0.5"]), SpawnOptions::new())
        .await
        .unwrap();
    let handle = outcome.handle;
    assert!(outcome.running);
    assert!(handle.is_running());

    // Sample the flag; it must never flip back once false
    let mut flipped_at = None;
    while started.elapsed() < Duration::from_secs(5) {
        match (handle.is_running(), flipped_at) {
            (false, None) => flipped_at = Some(started.elapsed()),
            (true, Some(_)) => panic!("running flipped back to true"),
            _ => {}
        }
        if flipped_at.is_some() && started.elapsed() > flipped_at.unwrap() + Duration::from_millis(100) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let flipped_at = flipped_at.expect("running never became false");
    assert!(flipped_at >= Duration::from_millis(450), "flipped early: {:?}", flipped_at);
    assert_eq!(handle.exit_code(), Some(0));

    println!("✅ running: true until ~0.5s, then false for good");
}

#[tokio::test]
async fn test_timeout_detaches_with_snapshot() {
    let outcome = spawn_async(
        &Command::with_args("sleep", ["1"]),
        SpawnOptions::new().wait(true).timeout(0.2),
    )
    .await
    .unwrap();

    assert!(outcome.running);
    assert!(outcome.handle.kill(0), "still addressable after the timeout");

    let termination = outcome.handle.wait().await.unwrap();
    assert!(termination.success());
    assert!(outcome.running);
    assert!(!outcome.handle.kill(0));
}

#[tokio::test]
async fn test_throw_on_timeout_keeps_child_running() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("child.pid");
    let script = format!("echo $$ > {}; exec sleep 2", pid_file.display());

    let err = spawn_async(
        &Command::with_args("sh", ["-c", script.as_str()]),
        SpawnOptions::new()
            .wait(true)
            .timeout(0.3)
            .throw_on_timeout(true),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProcessError::TimeoutExceeded { .. }));
    assert_eq!(err.to_string(), "Exceeded timeout of 0.3 seconds");

    let pid: i64 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(kill(pid, 0));
    assert!(kill(pid, "SIGKILL"));
}

#[tokio::test]
async fn test_callbacks_match_handle_output() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let err = Arc::new(Mutex::new(Vec::new()));
    let (out_sink, err_sink) = (Arc::clone(&out), Arc::clone(&err));

    let outcome = spawn_async(
        &Command::with_args("sh", ["-c", "for i in 1 2 3; do echo out $i; echo err $i >&2; done"]),
        SpawnOptions::new()
            .wait(true)
            .on_stdout(move |chunk| out_sink.lock().unwrap().extend_from_slice(chunk))
            .on_stderr(move |chunk| err_sink.lock().unwrap().extend_from_slice(chunk)),
    )
    .await
    .unwrap();

    assert_eq!(outcome.handle.stdout(), "out 1\nout 2\nout 3\n");
    assert_eq!(outcome.handle.stderr(), "err 1\nerr 2\nerr 3\n");
    assert_eq!(String::from_utf8_lossy(&out.lock().unwrap()), outcome.handle.stdout());
    assert_eq!(String::from_utf8_lossy(&err.lock().unwrap()), outcome.handle.stderr());
}

#[tokio::test]
async fn test_cwd_and_stdout_file() {
    let dir = tempfile::tempdir().unwrap();
    let stdout_file = dir.path().join("stdout.log");
    let launch = LaunchOptions::new()
        .cwd(dir.path())
        .stdout_file(&stdout_file);

    let outcome = spawn_async(
        &Command::new("pwd"),
        SpawnOptions::new().with_launch(launch).wait(true),
    )
    .await
    .unwrap();

    let expected = format!("{}\n", dir.path().canonicalize().unwrap().display());
    assert_eq!(outcome.handle.stdout(), expected);
    assert_eq!(std::fs::read_to_string(&stdout_file).unwrap(), expected);
}

#[tokio::test]
async fn test_second_kill_returns_false() {
    let outcome = spawn_async(&Command::with_args("sleep", ["10"]), SpawnOptions::new())
        .await
        .unwrap();
    let handle = outcome.handle;

    assert!(handle.kill("SIGKILL"));
    let termination = handle.wait().await.unwrap();
    assert_eq!(termination.signal(), Some(9));
    assert_eq!(termination.code(), 137);
    assert!(!handle.kill("SIGKILL"));
}

#[tokio::test]
async fn test_ps_sees_spawned_process() {
    let outcome = spawn_async(&Command::with_args("sleep", ["10"]), SpawnOptions::new())
        .await
        .unwrap();
    let pid = outcome.handle.pid();

    let found = ps(pid).unwrap();
    let record = match found {
        PsResult::Single(Some(record)) => record,
        other => panic!("expected a single record, got {:?}", other),
    };
    assert_eq!(record.cmd, "sleep");
    assert_eq!(record.full_cmd, "sleep 10");

    let by_fields = ps(FieldMatch::new().pid(pid).full_cmd("sleep 10")).unwrap();
    assert_eq!(by_fields.len(), 1);
    assert!(pid_find(pid).unwrap());

    assert!(outcome.handle.terminate());
    outcome.handle.wait().await;
    assert!(!pid_find(pid).unwrap(), "reaped child must leave the table");
}
