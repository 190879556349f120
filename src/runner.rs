//! Command Runner (C9): runs a shell command in its own process group
//! so a timeout can kill not just the immediate child but everything
//! it spawned, and reports wall-clock timing alongside output.
//!
//! Grounded on the upstream `CommandExecutor.run_command`: spawn with
//! a fresh session, wait with a timeout, and on expiry signal the
//! whole process group rather than just the direct child. Also used
//! for `test_dependency_command`, which is just another shell command
//! with its own timeout.

use crate::errors::RunError;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

#[derive(Debug)]
pub struct CommandOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub started_at_ms: u128,
    pub duration_ms: u128,
}

pub fn run_command(command: &str, cwd: Option<&std::path::Path>, timeout: Duration) -> Result<CommandOutcome, RunError> {
    let started_at = Instant::now();
    let started_at_ms = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            Ok(())
        });
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| RunError::TestLaunch(format!("failed to spawn '{command}': {e}")))?;

    let pid = child.id();
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let (stdout_tx, stdout_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        let _ = stdout_tx.send(buf);
    });

    let (stderr_tx, stderr_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        let _ = stderr_tx.send(buf);
    });

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout_rx.recv().unwrap_or_default();
                let stderr = stderr_rx.recv().unwrap_or_default();
                let duration_ms = started_at.elapsed().as_millis();
                return Ok(CommandOutcome {
                    stdout,
                    stderr,
                    exit_code: status.code().unwrap_or(-1),
                    started_at_ms,
                    duration_ms,
                });
            }
            Ok(None) => {
                if started_at.elapsed() >= timeout {
                    kill_process_group(pid);
                    let _ = child.wait();
                    tracing::warn!(command, timeout_secs = timeout.as_secs(), "command timed out, process group terminated");
                    return Err(RunError::Timeout);
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(RunError::TestRuntime(format!("failed to wait on '{command}': {e}"))),
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    let _ = signal::killpg(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let outcome = run_command("echo hello", None, Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.stdout.trim(), "hello");
        assert_eq!(outcome.exit_code, 0);
    }

    #[test]
    fn nonzero_exit_is_reported_not_errored() {
        let outcome = run_command("exit 3", None, Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.exit_code, 3);
    }

    #[test]
    fn long_running_command_times_out() {
        let err = run_command("sleep 5", None, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, RunError::Timeout));
    }
}
