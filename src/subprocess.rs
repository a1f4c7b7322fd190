//! Subprocess execution with a timeout.
//!
//! Platform query tools (`sysctl`, `wmic`, `hostname`) can hang on some
//! hosts; the blocking `output()` call runs on a helper thread so a wedged
//! command cannot stall the poll loop.

use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs a command and returns its stdout.
///
/// Returns `None` on timeout, spawn failure, or non-zero exit status. A
/// timed-out child is left to the helper thread to reap.
#[must_use]
pub fn run_with_timeout(cmd: &str, args: &[&str], timeout: Duration) -> Option<String> {
    let cmd = cmd.to_string();
    let args: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(Command::new(&cmd).args(&args).output());
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_successful_command() {
        let out = run_with_timeout("echo", &["hello"], Duration::from_secs(1));
        assert_eq!(out.unwrap().trim(), "hello");
    }

    #[test]
    fn test_timeout_returns_none_quickly() {
        let start = Instant::now();
        let out = run_with_timeout("sleep", &["10"], Duration::from_millis(100));

        assert!(out.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_nonexistent_command_returns_none() {
        let out = run_with_timeout("this_command_does_not_exist_12345", &[], Duration::from_secs(1));
        assert!(out.is_none());
    }

    #[test]
    fn test_failed_command_returns_none() {
        let out = run_with_timeout("false", &[], Duration::from_secs(1));
        assert!(out.is_none());
    }
}
