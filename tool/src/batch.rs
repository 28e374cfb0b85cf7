// tool/src/batch.rs
//
// Grades a whole directory of submissions against one reference. The
// reference is canonicalized once; submissions are independent, so they
// fan out across the rayon pool. One broken submission never takes the
// batch down with it.

use crate::report::{canonical_digest, BatchReport, SubmissionReport};
use gradecmp_lang::{canonicalize_source, compare, print_canonical, CompareConfig, Verdict};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Submission {
    pub path: PathBuf,
    pub source: String,
}

pub fn grade_batch(
    reference: &str,
    submissions: &[Submission],
    config: &CompareConfig,
) -> Result<BatchReport, String> {
    let refr = canonicalize_source(reference, "reference.java", config)
        .map_err(|f| format!("reference does not parse: {f}"))?;
    let reference_digest = canonical_digest(&print_canonical(&refr.unit));

    let reports: Vec<SubmissionReport> = submissions
        .par_iter()
        .map(|submission| {
            let path = submission.path.display().to_string();
            match canonicalize_source(&submission.source, &path, config) {
                Ok(cand) => {
                    let result = compare(&cand, &refr, config);
                    SubmissionReport {
                        path,
                        verdict: result.verdict,
                        significant: result.diffs.iter().filter(|d| d.significant).count(),
                        informational: result.diffs.iter().filter(|d| !d.significant).count(),
                        digest: Some(canonical_digest(&print_canonical(&cand.unit))),
                        errors: Vec::new(),
                    }
                }
                Err(failure) => SubmissionReport {
                    path,
                    verdict: Verdict::Unparseable,
                    significant: 0,
                    informational: 0,
                    digest: None,
                    errors: failure.errors.iter().map(|e| e.to_string()).collect(),
                },
            }
        })
        .collect();

    Ok(BatchReport::tally(reference_digest, reports))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "class Fib { int fib(int n) { int a = 0; int b = 1; for (int i = 0; i < n; i++) { int s = a + b; a = b; b = s; } return a; } }";

    fn submission(name: &str, source: &str) -> Submission {
        Submission { path: PathBuf::from(name), source: source.to_string() }
    }

    #[test]
    fn batch_buckets_each_submission() {
        let submissions = vec![
            submission("clean.java", REFERENCE),
            submission(
                "renamed.java",
                "class Fib { int fib(int n) { int lo = 0; int hi = 1; for (int i = 0; i < n; i++) { int s = lo + hi; lo = hi; hi = s; } return lo; } }",
            ),
            submission("regressed.java", &REFERENCE.replace("a + b", "a - b")),
            submission("broken.java", "class Fib { int fib(int n) { return }"),
        ];
        let batch = grade_batch(REFERENCE, &submissions, &CompareConfig::default()).unwrap();
        assert_eq!(batch.total, 4);
        assert_eq!(batch.identical, 1);
        assert_eq!(batch.equivalent, 1);
        assert_eq!(batch.different, 1);
        assert_eq!(batch.unparseable, 1);
    }

    #[test]
    fn identical_submission_shares_the_reference_digest() {
        let batch = grade_batch(
            REFERENCE,
            &[submission("clean.java", "class Fib{int fib(int n){int a=0;int b=1;for(int i=0;i<n;i++){int s=a+b;a=b;b=s;}return a;}}")],
            &CompareConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.submissions[0].digest.as_deref(), Some(batch.reference_digest.as_str()));
    }

    #[test]
    fn unparseable_reference_is_an_error() {
        let result = grade_batch("class {", &[], &CompareConfig::default());
        assert!(result.is_err());
    }
}
