// tool/src/bridge.rs
//
// Seam to an external test runner. Structural equivalence alone cannot
// certify a submission; the bridge hands the original (not canonical)
// source to whatever executes it and folds each run into a per-case
// status. Execution itself lives behind the `TestExecutor` trait so the
// harness stays runnable without a JVM on the machine.

use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub input: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed { actual: String },
    Error { message: String },
    Timeout,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: String,
    pub status: CaseStatus,
}

/// Runs one submission against one input. Implementations are expected
/// to be process-isolated; a panic inside still only loses that case.
pub trait TestExecutor: Send + Sync {
    fn execute(&self, source: &str, input: &str) -> Result<String, String>;
}

/// Every case gets its own worker thread and a hard deadline. A case
/// that exceeds the deadline is reported as `Timeout`; its thread is
/// left to finish on its own since the executor owns cleanup.
pub fn run_cases(
    executor: Arc<dyn TestExecutor>,
    source: &str,
    cases: &[TestCase],
    timeout: Duration,
) -> Vec<CaseResult> {
    cases
        .iter()
        .map(|case| {
            let (tx, rx) = mpsc::channel();
            let executor = Arc::clone(&executor);
            let source = source.to_string();
            let input = case.input.clone();
            thread::spawn(move || {
                let _ = tx.send(executor.execute(&source, &input));
            });
            let status = match rx.recv_timeout(timeout) {
                Ok(Ok(actual)) => {
                    if actual.trim_end() == case.expected.trim_end() {
                        CaseStatus::Passed
                    } else {
                        CaseStatus::Failed { actual }
                    }
                }
                Ok(Err(message)) => CaseStatus::Error { message },
                Err(_) => CaseStatus::Timeout,
            };
            CaseResult { id: case.id.clone(), status }
        })
        .collect()
}

pub fn load_cases(text: &str) -> Result<Vec<TestCase>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Shells out to an external runner, e.g. a script that compiles and
/// runs a Java file. `{source}` in the command line is replaced by the
/// path of a temp file holding the submission; the case input goes to
/// the runner's stdin.
pub struct CommandExecutor {
    pub command: String,
}

impl TestExecutor for CommandExecutor {
    fn execute(&self, source: &str, input: &str) -> Result<String, String> {
        let path = std::env::temp_dir().join(format!(
            "gradecmp-{}.java",
            blake3::hash(source.as_bytes()).to_hex()
        ));
        std::fs::write(&path, source).map_err(|e| format!("cannot stage submission: {e}"))?;

        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or("runner command is empty")?;
        let args: Vec<String> = parts
            .map(|arg| {
                if arg == "{source}" {
                    path.display().to_string()
                } else {
                    arg.to_string()
                }
            })
            .collect();

        let mut child = std::process::Command::new(program)
            .args(&args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| format!("cannot start runner '{program}': {e}"))?;
        if let Some(stdin) = child.stdin.as_mut() {
            use std::io::Write;
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| format!("cannot feed input: {e}"))?;
        }
        let output = child.wait_with_output().map_err(|e| format!("runner failed: {e}"))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(format!(
                "runner exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockExecutor;

    impl TestExecutor for MockExecutor {
        fn execute(&self, _source: &str, input: &str) -> Result<String, String> {
            match input {
                "boom" => Err("process exited with status 1".to_string()),
                "hang" => {
                    thread::sleep(Duration::from_secs(5));
                    Ok(String::new())
                }
                other => Ok(format!("{other}\n")),
            }
        }
    }

    fn case(id: &str, input: &str, expected: &str) -> TestCase {
        TestCase { id: id.to_string(), input: input.to_string(), expected: expected.to_string() }
    }

    #[test]
    fn matching_output_passes_modulo_trailing_newline() {
        let results = run_cases(
            Arc::new(MockExecutor),
            "class C { }",
            &[case("echo", "5", "5")],
            Duration::from_secs(1),
        );
        assert_eq!(results[0].status, CaseStatus::Passed);
    }

    #[test]
    fn wrong_output_reports_the_actual_text() {
        let results = run_cases(
            Arc::new(MockExecutor),
            "class C { }",
            &[case("echo", "5", "8")],
            Duration::from_secs(1),
        );
        assert_eq!(results[0].status, CaseStatus::Failed { actual: "5\n".to_string() });
    }

    #[test]
    fn executor_error_is_distinct_from_failure() {
        let results = run_cases(
            Arc::new(MockExecutor),
            "class C { }",
            &[case("crash", "boom", "")],
            Duration::from_secs(1),
        );
        assert!(matches!(results[0].status, CaseStatus::Error { .. }));
    }

    #[test]
    fn slow_case_times_out_without_blocking_the_rest() {
        let results = run_cases(
            Arc::new(MockExecutor),
            "class C { }",
            &[case("slow", "hang", ""), case("echo", "1", "1")],
            Duration::from_millis(50),
        );
        assert_eq!(results[0].status, CaseStatus::Timeout);
        assert_eq!(results[1].status, CaseStatus::Passed);
    }

    #[test]
    fn cases_load_from_json() {
        let cases = load_cases(
            r#"[{"id": "t1", "input": "3", "expected": "2"}, {"id": "t2", "input": "10", "expected": "55"}]"#,
        )
        .unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].expected, "55");
    }
}
