//! Test execution
//!
//! Spawns the test runner as a child process and captures stdout and stderr
//! into one combined stream. A non-zero exit code means "failure, needs
//! repair"; assertion failures and crashes are not distinguished. A
//! subprocess that fails to launch at all is folded into a failed outcome
//! rather than an error, so it flows through the normal retry path.

use std::process::Command;

/// Result of one test run.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub output: String,
    pub exit_code: i32,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam between the repair loop and the test subprocess, so the loop can be
/// exercised with fakes.
pub trait TestExecutor {
    fn run(&self, test_id: &str) -> TestOutcome;
}

/// Runs `<program> <test_id>` and captures everything.
#[derive(Debug, Clone)]
pub struct TestRunner {
    program: String,
}

impl TestRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new("pytest")
    }
}

impl TestExecutor for TestRunner {
    fn run(&self, test_id: &str) -> TestOutcome {
        let output = Command::new(&self.program).arg(test_id).output();

        match output {
            Ok(out) => {
                let mut combined = String::new();
                if !out.stdout.is_empty() {
                    combined.push_str(&String::from_utf8_lossy(&out.stdout));
                }
                if !out.stderr.is_empty() {
                    if !combined.is_empty() {
                        combined.push('\n');
                    }
                    combined.push_str(&String::from_utf8_lossy(&out.stderr));
                }
                TestOutcome {
                    output: combined,
                    // A None status code means the child died to a signal.
                    exit_code: out.status.code().unwrap_or(-1),
                }
            }
            Err(e) => TestOutcome {
                output: format!("failed to run {}: {}", self.program, e),
                exit_code: 127,
            },
        }
    }
}
