//! End-to-end tests for the `hook` command.

mod common;
use common::prelude::*;

fn configs_repo() -> TestFixture {
    let fixture = TestFixture::new().with_registry("- widget\n");
    std::fs::create_dir_all(fixture.configs().join(".git")).unwrap();
    fixture
}

#[test]
fn test_hook_activate_writes_update_call() {
    let fixture = configs_repo();

    fixture
        .command()
        .args(["hook", "activate"])
        .arg("-c")
        .arg(fixture.configs())
        .args(["-a", "--foo bar --baz quux", "-b", "master", "-n", "acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hook installed"));

    let hook = fixture.configs().join(".git/hooks/pre-push");
    let content = std::fs::read_to_string(&hook).unwrap();
    assert!(content.starts_with("#!/usr/bin/env bash"));
    assert!(content.contains("message=`git log -1 --format=%B`"));
    assert!(content.contains(
        "modsync update -m \"$message\" -n acme -b master --foo bar --baz quux"
    ));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&hook).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn test_hook_activate_uses_default_namespace() {
    let fixture = configs_repo();

    fixture
        .command()
        .args(["hook", "activate", "-c"])
        .arg(fixture.configs())
        .assert()
        .success();

    let content = std::fs::read_to_string(fixture.configs().join(".git/hooks/pre-push")).unwrap();
    assert!(content.contains("modsync update -m \"$message\" -n modsync\n"));
}

#[test]
fn test_hook_deactivate_is_idempotent() {
    let fixture = configs_repo();
    let hook = fixture.configs().join(".git/hooks/pre-push");

    fixture
        .command()
        .args(["hook", "activate", "-c"])
        .arg(fixture.configs())
        .assert()
        .success();
    assert!(hook.exists());

    for _ in 0..2 {
        fixture
            .command()
            .args(["hook", "deactivate", "-c"])
            .arg(fixture.configs())
            .assert()
            .success();
        assert!(!hook.exists());
    }
}

#[test]
fn test_hook_outside_git_repository_fails() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["hook", "activate", "-c"])
        .arg(fixture.configs())
        .assert()
        .code(1);
}

#[test]
fn test_hook_deactivate_takes_no_namespace() {
    let fixture = configs_repo();

    fixture
        .command()
        .args(["hook", "deactivate", "-n", "acme", "-c"])
        .arg(fixture.configs())
        .assert()
        .code(2);
}
