// tool/src/report.rs
//
// JSON-facing shapes for single comparisons and batch runs. The digest
// is over the canonical print, so two submissions with the same digest
// are the same program regardless of layout.

use crate::bridge::CaseResult;
use gradecmp_lang::{SourceComparison, Verdict};
use serde::Serialize;

pub fn canonical_digest(text: &str) -> String {
    hex::encode(blake3::hash(text.as_bytes()).as_bytes())
}

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub verdict: Verdict,
    pub diffs: Vec<gradecmp_lang::Diff>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidate_errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_digest: Option<String>,
    /// Bridge results, when a case file and runner were supplied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<CaseResult>,
}

impl CompareReport {
    pub fn from_outcome(outcome: &SourceComparison) -> Self {
        Self {
            verdict: outcome.result.verdict,
            diffs: outcome.result.diffs.clone(),
            candidate_errors: outcome.candidate_errors.iter().map(|e| e.to_string()).collect(),
            reference_errors: outcome.reference_errors.iter().map(|e| e.to_string()).collect(),
            candidate_digest: outcome.canonical_candidate.as_deref().map(canonical_digest),
            reference_digest: outcome.canonical_reference.as_deref().map(canonical_digest),
            cases: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionReport {
    pub path: String,
    pub verdict: Verdict,
    pub significant: usize,
    pub informational: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub reference_digest: String,
    pub total: usize,
    pub identical: usize,
    pub equivalent: usize,
    pub different: usize,
    pub unparseable: usize,
    pub submissions: Vec<SubmissionReport>,
}

impl BatchReport {
    pub fn tally(reference_digest: String, submissions: Vec<SubmissionReport>) -> Self {
        let count =
            |v: Verdict| submissions.iter().filter(|s| s.verdict == v).count();
        Self {
            reference_digest,
            total: submissions.len(),
            identical: count(Verdict::Identical),
            equivalent: count(Verdict::Equivalent),
            different: count(Verdict::Different),
            unparseable: count(Verdict::Unparseable),
            submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradecmp_lang::{compare_sources, CompareConfig};

    #[test]
    fn digest_is_stable_hex() {
        let a = canonical_digest("class C {\n}\n");
        let b = canonical_digest("class C {\n}\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn report_carries_matching_digests_for_identical_sources() {
        let outcome = compare_sources(
            "class C { int m() { return 1; } }",
            "class C{int m(){return 1;}}",
            &CompareConfig::default(),
        );
        let report = CompareReport::from_outcome(&outcome);
        assert_eq!(report.verdict, Verdict::Identical);
        assert_eq!(report.candidate_digest, report.reference_digest);
    }

    #[test]
    fn tally_counts_verdicts() {
        let reports = vec![
            SubmissionReport {
                path: "a.java".into(),
                verdict: Verdict::Identical,
                significant: 0,
                informational: 0,
                digest: Some("00".into()),
                errors: vec![],
            },
            SubmissionReport {
                path: "b.java".into(),
                verdict: Verdict::Different,
                significant: 1,
                informational: 0,
                digest: Some("01".into()),
                errors: vec![],
            },
        ];
        let batch = BatchReport::tally("ff".into(), reports);
        assert_eq!(batch.total, 2);
        assert_eq!(batch.identical, 1);
        assert_eq!(batch.different, 1);
        assert_eq!(batch.equivalent, 0);
    }
}
