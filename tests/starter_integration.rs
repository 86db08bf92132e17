//! Process starter integration tests.
//!
//! These tests spawn real helper processes (`printf`, `sh`, `sleep`), so they
//! only run on Unix.

#![cfg(unix)]

use std::time::{Duration, Instant};

use process_starter::{Arguments, ExecutableStarter, ProcessStarter, StarterError};

fn sh(script: &str) -> Arguments {
    ["-c", script].into()
}

// ============================================================================
// Spawn failures
// ============================================================================

#[tokio::test]
async fn test_missing_binary_is_spawn_failure() {
    let mut starter = ExecutableStarter::new("definitely-not-a-real-binary-xyz");
    let err = starter
        .start("--version", Duration::from_secs(1))
        .await
        .unwrap_err();

    match err {
        StarterError::Spawn { executable, source } => {
            assert_eq!(executable, "definitely-not-a-real-binary-xyz");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Spawn, got {:?}", other),
    }
    assert!(starter.standard_output().is_empty());
    assert!(starter.standard_error().is_empty());
}

#[tokio::test]
async fn test_spawn_failure_clears_previous_output() {
    // A symlink has no open write handle, so exec never sees ETXTBSY.
    let dir = tempfile::tempdir().unwrap();
    let tool = dir.path().join("sh");
    std::os::unix::fs::symlink("/bin/sh", &tool).unwrap();

    let mut starter = ExecutableStarter::new(tool.to_string_lossy());
    let code = starter
        .start(sh("echo out; echo err >&2"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(code, 0);
    assert_eq!(starter.standard_output(), "out\n");
    assert_eq!(starter.standard_error(), "err\n");

    std::fs::remove_file(&tool).unwrap();
    let err = starter
        .start(sh("echo again"), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, StarterError::Spawn { .. }));
    assert!(starter.standard_output().is_empty());
    assert!(starter.standard_error().is_empty());
}

// ============================================================================
// Normal completion
// ============================================================================

#[tokio::test]
async fn test_echo_lines_captured_with_terminators() {
    let mut starter = ExecutableStarter::new("printf");
    let code = starter
        .start([r"A\nB\nC"], Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(starter.standard_output(), "A\nB\nC\n");
    assert!(starter.standard_error().is_empty());
}

#[tokio::test]
async fn test_exit_code_is_reported() {
    let mut starter = ExecutableStarter::new("sh");
    for expected in [0, 1, 42, 255] {
        let code = starter
            .start(sh(&format!("exit {expected}")), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(code, expected);
    }
}

#[tokio::test]
async fn test_numbered_lines_in_order() {
    let mut starter = ExecutableStarter::new("sh");
    let code = starter
        .start(
            sh(r#"i=1; while [ "$i" -le 2000 ]; do echo "$i"; i=$((i+1)); done"#),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    assert_eq!(code, 0);
    let lines: Vec<u32> = starter
        .standard_output()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect();
    assert_eq!(lines, (1..=2000).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_stdout_and_stderr_are_separate() {
    let mut starter = ExecutableStarter::new("sh");
    let code = starter
        .start(sh("echo out; echo err >&2; echo; exit 3"), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(code, 3);
    assert_eq!(starter.standard_output(), "out\n\n");
    assert_eq!(starter.standard_error(), "err\n");
}

#[tokio::test]
async fn test_arguments_are_not_shell_interpreted() {
    let mut starter = ExecutableStarter::new("printf");
    starter
        .start(r#""%s|%s" "$HOME; echo hi" '*'"#, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(starter.standard_output(), "$HOME; echo hi|'*'\n");
}

#[tokio::test]
async fn test_reuse_does_not_leak_previous_output() {
    let mut starter = ExecutableStarter::new("sh");

    starter.start(sh("echo first; echo oops >&2"), Duration::from_secs(5)).await.unwrap();
    assert_eq!(starter.standard_output(), "first\n");

    starter.start(sh("echo second"), Duration::from_secs(5)).await.unwrap();
    assert_eq!(starter.standard_output(), "second\n");
    assert!(starter.standard_error().is_empty());
}

#[tokio::test]
async fn test_run_reports_duration() {
    let mut starter = ExecutableStarter::new("sh");
    let report = starter
        .run(sh("echo done"), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(report.success());
    assert_eq!(report.stdout, "done\n");
    assert!(report.duration < Duration::from_secs(5));
}

#[tokio::test]
async fn test_start_future_can_be_spawned() {
    let handle = tokio::spawn(async move {
        let mut starter = ExecutableStarter::new("printf");
        let code = starter.start(["spawned"], Duration::from_secs(1)).await?;
        Ok::<_, StarterError>((code, starter.standard_output().to_owned()))
    });

    let (code, stdout) = handle.await.unwrap().unwrap();
    assert_eq!(code, 0);
    assert_eq!(stdout, "spawned\n");
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test]
async fn test_sleep_times_out() {
    let mut starter = ExecutableStarter::new("sleep");
    let started = Instant::now();
    let err = starter.start("5", Duration::from_millis(50)).await.unwrap_err();

    assert!(matches!(err, StarterError::Timeout(d) if d == Duration::from_millis(50)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_no_writes_after_timeout() {
    for kill in [true, false] {
        let mut starter = ExecutableStarter::new("sh").with_kill_on_timeout(kill);
        let err = starter
            .start(
                sh(r#"i=0; while [ "$i" -lt 100 ]; do echo tick; sleep 0.01; i=$((i+1)); done"#),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let before = starter.standard_output().len();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let after = starter.standard_output().len();

        assert!(before > 0);
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_open_pipe_after_exit_still_times_out() {
    // The shell exits at once but its background child keeps stdout open.
    let mut starter = ExecutableStarter::new("sh");
    let err = starter
        .start(sh("sleep 2 & echo started"), Duration::from_millis(300))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(starter.standard_output(), "started\n");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timed_out_process_is_killed() {
    let mut starter = ExecutableStarter::new("sh");
    let err = starter
        .start(sh("echo $$; exec sleep 5"), Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let pid: u32 = starter.standard_output().trim().parse().unwrap();
    assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timed_out_process_survives_without_kill() {
    let mut starter = ExecutableStarter::new("sh").with_kill_on_timeout(false);
    let err = starter
        .start(sh("echo $$; exec sleep 5"), Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let pid: u32 = starter.standard_output().trim().parse().unwrap();
    let alive = std::path::Path::new(&format!("/proc/{pid}")).exists();

    let _ = std::process::Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status();
    assert!(alive);
}
