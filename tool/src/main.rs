// tool/src/main.rs
//
// gradecmp: grades Java submissions against a reference solution.
//
//   compare <candidate> <reference>   verdict plus localized diffs
//   print <file>                      canonical (or documented) form
//   batch <reference> <dir>           grade every .java file in a directory
//   run-cases <file> <cases.json>     execute test cases via --cmd

mod batch;
mod bridge;
mod report;

use batch::{grade_batch, Submission};
use bridge::{load_cases, run_cases, CaseStatus, CommandExecutor};
use gradecmp_lang::{
    canonicalize_source, compare_sources, print_unit, CompareConfig, PrintMode, Verdict,
};
use report::CompareReport;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let mut raw_args: Vec<String> = std::env::args().skip(1).collect();
    let json = take_flag(&mut raw_args, "--json");
    let documented = take_flag(&mut raw_args, "--documented");
    let config_path = take_arg_value(&mut raw_args, "--config");
    let runner = take_arg_value(&mut raw_args, "--cmd");
    let cases_path = take_arg_value(&mut raw_args, "--cases");
    let timeout_ms = take_arg_value(&mut raw_args, "--timeout-ms");
    let mut args = raw_args.into_iter();
    let cmd = args.next();

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    };

    let bridge_setup = match bridge_options(cases_path, runner.clone(), timeout_ms.clone()) {
        Ok(setup) => setup,
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    };

    let code = match cmd.as_deref() {
        Some("compare") => cmd_compare(args.next(), args.next(), &config, json, bridge_setup),
        Some("print") => cmd_print(args.next(), &config, documented),
        Some("batch") => cmd_batch(args.next(), args.next(), &config, json),
        Some("run-cases") => cmd_run_cases(args.next(), args.next(), runner, timeout_ms, json),
        _ => {
            usage();
            2
        }
    };
    process::exit(code);
}

fn usage() {
    eprintln!("usage: gradecmp <command> [options]");
    eprintln!("  compare <candidate> <reference> [--config file] [--json] [--cases file --cmd '<runner> {{source}}']");
    eprintln!("  print <file> [--config file] [--documented]");
    eprintln!("  batch <reference> <dir> [--config file] [--json]");
    eprintln!("  run-cases <file> <cases.json> --cmd '<runner> {{source}}' [--timeout-ms n] [--json]");
}

fn load_config(path: Option<&str>) -> Result<CompareConfig, String> {
    match path {
        None => Ok(CompareConfig::default()),
        Some(path) => {
            let text = read_file(path)?;
            CompareConfig::from_json(&text).map_err(|e| format!("bad config {path}: {e}"))
        }
    }
}

fn read_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))
}

/// `--cases` joins bridge execution onto the structural comparison; it
/// needs a `--cmd` runner and an optional `--timeout-ms`.
fn bridge_options(
    cases_path: Option<String>,
    runner: Option<String>,
    timeout_ms: Option<String>,
) -> Result<Option<(String, String, Duration)>, String> {
    let Some(cases_path) = cases_path else {
        return Ok(None);
    };
    let Some(runner) = runner else {
        return Err("--cases requires --cmd to run the submission".to_string());
    };
    let timeout = timeout_ms
        .as_deref()
        .unwrap_or("10000")
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| "--timeout-ms expects milliseconds".to_string())?;
    Ok(Some((cases_path, runner, timeout)))
}

fn cmd_compare(
    candidate: Option<String>,
    reference: Option<String>,
    config: &CompareConfig,
    json: bool,
    bridge_setup: Option<(String, String, Duration)>,
) -> i32 {
    let (Some(candidate), Some(reference)) = (candidate, reference) else {
        usage();
        return 2;
    };
    let sources = read_file(&candidate).and_then(|c| read_file(&reference).map(|r| (c, r)));
    let (cand_text, ref_text) = match sources {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let outcome = compare_sources(&cand_text, &ref_text, config);
    let mut report = CompareReport::from_outcome(&outcome);
    if let Some((cases_path, runner, timeout)) = bridge_setup {
        if outcome.result.verdict != Verdict::Unparseable {
            let cases_text = match read_file(&cases_path) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("{err}");
                    return 2;
                }
            };
            let cases = match load_cases(&cases_text) {
                Ok(cases) => cases,
                Err(err) => {
                    eprintln!("bad cases {cases_path}: {err}");
                    return 2;
                }
            };
            // the bridge always sees the submission as written, never the
            // canonical text
            let executor = Arc::new(CommandExecutor { command: runner });
            report.cases = run_cases(executor, &cand_text, &cases, timeout);
        }
    }
    let all_passed = report.cases.iter().all(|r| r.status == CaseStatus::Passed);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("cannot serialize report: {err}");
                return 2;
            }
        }
    } else {
        println!("verdict: {}", verdict_label(outcome.result.verdict));
        for error in &outcome.candidate_errors {
            println!("  candidate: {error}");
        }
        for error in &outcome.reference_errors {
            println!("  reference: {error}");
        }
        for diff in &outcome.result.diffs {
            let weight = if diff.significant { "!" } else { "~" };
            println!("  {weight} {:?} at {}: {}", diff.kind, diff.path, diff.detail);
        }
        print_case_results(&report.cases);
    }
    match outcome.result.verdict {
        Verdict::Identical | Verdict::Equivalent => {
            if all_passed {
                0
            } else {
                1
            }
        }
        Verdict::Different => 1,
        Verdict::Unparseable => 2,
    }
}

fn cmd_print(path: Option<String>, config: &CompareConfig, documented: bool) -> i32 {
    let Some(path) = path else {
        usage();
        return 2;
    };
    let source = match read_file(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    match canonicalize_source(&source, &path, config) {
        Ok(canon) => {
            let mode = if documented { PrintMode::Documented } else { PrintMode::Canonical };
            print!("{}", print_unit(&canon.unit, mode));
            0
        }
        Err(failure) => {
            for error in &failure.errors {
                eprintln!("{path}: {error}");
            }
            2
        }
    }
}

fn cmd_batch(
    reference: Option<String>,
    dir: Option<String>,
    config: &CompareConfig,
    json: bool,
) -> i32 {
    let (Some(reference), Some(dir)) = (reference, dir) else {
        usage();
        return 2;
    };
    let ref_text = match read_file(&reference) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let submissions = match collect_submissions(Path::new(&dir)) {
        Ok(submissions) => submissions,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let batch = match grade_batch(&ref_text, &submissions, config) {
        Ok(batch) => batch,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    if json {
        match serde_json::to_string_pretty(&batch) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("cannot serialize report: {err}");
                return 2;
            }
        }
    } else {
        println!(
            "{} submissions: {} identical, {} equivalent, {} different, {} unparseable",
            batch.total, batch.identical, batch.equivalent, batch.different, batch.unparseable
        );
        for submission in &batch.submissions {
            println!(
                "  {} {} ({} significant, {} informational)",
                verdict_label(submission.verdict),
                submission.path,
                submission.significant,
                submission.informational
            );
        }
    }
    if batch.different == 0 && batch.unparseable == 0 {
        0
    } else {
        1
    }
}

fn cmd_run_cases(
    source_path: Option<String>,
    cases_path: Option<String>,
    runner: Option<String>,
    timeout_ms: Option<String>,
    json: bool,
) -> i32 {
    let (Some(source_path), Some(cases_path), Some(runner)) = (source_path, cases_path, runner)
    else {
        usage();
        return 2;
    };
    let timeout = match timeout_ms.as_deref().unwrap_or("10000").parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            eprintln!("--timeout-ms expects milliseconds");
            return 2;
        }
    };
    let loaded = read_file(&source_path).and_then(|source| {
        let cases_text = read_file(&cases_path)?;
        let cases =
            load_cases(&cases_text).map_err(|e| format!("bad cases {cases_path}: {e}"))?;
        Ok((source, cases))
    });
    let (source, cases) = match loaded {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let executor = Arc::new(CommandExecutor { command: runner });
    let results = run_cases(executor, &source, &cases, timeout);
    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("cannot serialize results: {err}");
                return 2;
            }
        }
    } else {
        print_case_results(&results);
    }
    if results.iter().all(|r| r.status == CaseStatus::Passed) {
        0
    } else {
        1
    }
}

fn print_case_results(results: &[bridge::CaseResult]) {
    for result in results {
        match &result.status {
            CaseStatus::Passed => println!("  pass {}", result.id),
            CaseStatus::Failed { actual } => {
                println!("  FAIL {}: got '{}'", result.id, actual.trim_end())
            }
            CaseStatus::Error { message } => println!("  ERROR {}: {}", result.id, message),
            CaseStatus::Timeout => println!("  TIMEOUT {}", result.id),
        }
    }
}

fn collect_submissions(dir: &Path) -> Result<Vec<Submission>, String> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("cannot read {}: {e}", dir.display()))?;
    let mut submissions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("cannot read {}: {e}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        submissions.push(Submission { path, source });
    }
    submissions.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(submissions)
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Identical => "identical",
        Verdict::Equivalent => "equivalent",
        Verdict::Different => "different",
        Verdict::Unparseable => "unparseable",
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(index) = args.iter().position(|arg| arg == flag) {
        args.remove(index);
        true
    } else {
        false
    }
}

fn take_arg_value(args: &mut Vec<String>, flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    if let Some(index) = args.iter().position(|arg| arg.starts_with(&prefix)) {
        let raw = args.remove(index);
        return Some(raw[prefix.len()..].to_string());
    }
    if let Some(index) = args.iter().position(|arg| arg == flag) {
        let value = if index + 1 < args.len() {
            args.remove(index + 1)
        } else {
            String::new()
        };
        args.remove(index);
        if value.is_empty() {
            return None;
        }
        return Some(value);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_flag_removes_only_the_flag() {
        let mut args = vec!["compare".to_string(), "--json".to_string(), "a.java".to_string()];
        assert!(take_flag(&mut args, "--json"));
        assert!(!take_flag(&mut args, "--json"));
        assert_eq!(args, vec!["compare".to_string(), "a.java".to_string()]);
    }

    #[test]
    fn take_arg_value_supports_both_spellings() {
        let mut args = vec!["--config=policy.json".to_string()];
        assert_eq!(take_arg_value(&mut args, "--config"), Some("policy.json".to_string()));
        let mut args = vec!["--config".to_string(), "policy.json".to_string()];
        assert_eq!(take_arg_value(&mut args, "--config"), Some("policy.json".to_string()));
        assert!(args.is_empty());
    }

    #[test]
    fn missing_config_path_falls_back_to_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.preserve_top_level_names);
    }
}
