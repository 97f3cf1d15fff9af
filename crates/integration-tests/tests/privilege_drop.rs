//! Privilege drop Integration Tests
//!
//! Running as another user/group. Root-only cases return early otherwise.

use hostexec_core::domain::{Command, ExecutionOptions, LaunchOptions, SpawnOptions};
use hostexec_core::ProcessError;
use hostexec_infra_system::identity::{resolve_group, resolve_user};
use hostexec_infra_system::{run_program, running_as_root, spawn_async};

fn id_of(launch: LaunchOptions) -> hostexec_core::Result<String> {
    run_program(
        &Command::with_args("id", "-u && id -g"),
        &ExecutionOptions::new().with_launch(launch),
    )
    .map(|out| out.into_stdout())
}

#[test]
fn test_unknown_user_is_lookup_error() {
    let err = id_of(LaunchOptions::new().run_as("hostexec-no-such-user")).unwrap_err();
    assert!(matches!(err, ProcessError::UserLookup(_)));
}

#[test]
fn test_drop_without_privilege_fails_loudly() {
    if running_as_root() {
        return;
    }
    // Switching to root is never silently ignored
    let err = id_of(LaunchOptions::new().run_as(0u32)).unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed(_)), "{:?}", err);
}

#[test]
fn test_run_as_nobody() {
    if !running_as_root() {
        println!("skipping: needs root");
        return;
    }
    let Ok(uid) = resolve_user(&"nobody".into()) else {
        return;
    };

    let output = id_of(LaunchOptions::new().run_as("nobody")).unwrap();
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some(uid.to_string().as_str()));
    // Only a user given: the gid is inherited
    let own_gid = nix::unistd::getgid().as_raw().to_string();
    assert_eq!(lines.next(), Some(own_gid.as_str()));
}

#[test]
fn test_run_as_user_and_group() {
    if !running_as_root() {
        println!("skipping: needs root");
        return;
    }
    let group = resolve_group(&"nogroup".into()).or_else(|_| resolve_group(&"nobody".into()));
    let (Ok(uid), Ok(gid)) = (resolve_user(&"nobody".into()), group) else {
        return;
    };

    let output = id_of(LaunchOptions::new().run_as(uid).gid(gid)).unwrap();
    assert_eq!(output, format!("{}\n{}\n", uid, gid));
}

#[tokio::test]
async fn test_spawn_as_nobody() {
    if !running_as_root() {
        println!("skipping: needs root");
        return;
    }
    let Ok(uid) = resolve_user(&"nobody".into()) else {
        return;
    };

    let outcome = spawn_async(
        &Command::with_args("id", ["-u"]),
        SpawnOptions::new()
            .with_launch(LaunchOptions::new().run_as(uid))
            .wait(true),
    )
    .await
    .unwrap();
    assert_eq!(outcome.handle.stdout(), format!("{}\n", uid));
}
