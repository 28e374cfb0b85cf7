// lang/src/lib.rs
//
// Core comparison library:
// - Lexer: Java-subset tokenization with comment trivia
// - Parser: recursive descent, collects every error before giving up
// - Canonicalizer: layout/naming/order normal form with a rewrite report
// - Printer: deterministic rendering of the canonical tree
// - Comparator: verdict plus localized diffs against a reference

pub mod ast;
pub mod canonicalizer;
pub mod comparator;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use ast::*;
pub use canonicalizer::{
    canonicalize, CanonicalizeReport, RenameNote, ReorderNote, UnreachableNote,
};
pub use comparator::{compare, CanonUnit, Comparison, Diff, DiffKind, Verdict};
pub use config::CompareConfig;
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use parser::{ParseError, ParseErrorKind, ParseFailure, Parser};
pub use printer::{print_canonical, print_unit, PrintMode};

/// Convenience: source text to tree. A lexer error surfaces as a
/// single-entry parse failure so callers handle one error type.
pub fn parse(source: &str, file_path: &str) -> Result<CompilationUnit, ParseFailure> {
    let tokens = Lexer::new(source).tokenize().map_err(|e| ParseFailure {
        errors: vec![ParseError {
            span: e.span,
            kind: ParseErrorKind::Syntax,
            message: e.message,
        }],
    })?;
    Parser::new(tokens).parse_unit(source.to_string(), file_path.to_string())
}

/// Convenience: source text to canonical form plus the rewrite report.
pub fn canonicalize_source(
    source: &str,
    file_path: &str,
    config: &CompareConfig,
) -> Result<CanonUnit, ParseFailure> {
    let mut unit = parse(source, file_path)?;
    let report = canonicalize(&mut unit, config);
    Ok(CanonUnit { unit, report })
}

/// Full comparison outcome for a candidate/reference source pair,
/// including whatever could still be produced when a side fails to parse.
#[derive(Debug, Clone)]
pub struct SourceComparison {
    pub result: Comparison,
    pub candidate_errors: Vec<ParseError>,
    pub reference_errors: Vec<ParseError>,
    pub canonical_candidate: Option<String>,
    pub canonical_reference: Option<String>,
}

/// Compares two sources end to end. Parse failure on either side yields
/// an `Unparseable` verdict with the collected errors; it never panics
/// on student input.
pub fn compare_sources(
    candidate: &str,
    reference: &str,
    config: &CompareConfig,
) -> SourceComparison {
    let cand = canonicalize_source(candidate, "candidate.java", config);
    let refr = canonicalize_source(reference, "reference.java", config);
    match (cand, refr) {
        (Ok(cand), Ok(refr)) => {
            let result = compare(&cand, &refr, config);
            SourceComparison {
                result,
                candidate_errors: Vec::new(),
                reference_errors: Vec::new(),
                canonical_candidate: Some(print_canonical(&cand.unit)),
                canonical_reference: Some(print_canonical(&refr.unit)),
            }
        }
        (cand, refr) => SourceComparison {
            result: Comparison { verdict: Verdict::Unparseable, diffs: Vec::new() },
            candidate_errors: cand.as_ref().err().map(|f| f.errors.clone()).unwrap_or_default(),
            reference_errors: refr.as_ref().err().map(|f| f.errors.clone()).unwrap_or_default(),
            canonical_candidate: cand.ok().map(|c| print_canonical(&c.unit)),
            canonical_reference: refr.ok().map(|r| print_canonical(&r.unit)),
        },
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    const REFERENCE: &str = r#"
public class FibonacciCalculator {

    /**
     * Computes the n-th Fibonacci number iteratively.
     */
    public static int fibonacci(int n) {
        if (n < 0) {
            throw new IllegalArgumentException("n must not be negative");
        }
        int a = 0;
        int b = 1;
        for (int i = 0; i < n; i++) {
            int sum = a + b;
            a = b;
            b = sum;
        }
        return a;
    }
}
"#;

    // layout mangled, multi-declarator, single-statement branch without
    // braces, and the classic off-by-one-operator regression
    const MANGLED_REGRESSED: &str = r#"
public class FibonacciCalculator {
  public static int fibonacci(int n) {
      if(n<0)
        throw new IllegalArgumentException("n must not be negative");
    int a=0,b=1;
        for(int i=0;i<n;i++){ int sum=a-b; a=b; b=sum; }
    return a; }
}
"#;

    const WIDENED_WITH_DEAD_CODE: &str = r#"
public class FibonacciCalculator {

    public static long fibonacci(long n) {
        if (n < 0) {
            throw new IllegalArgumentException("n must not be negative");
        }
        long a = 0;
        long b = 1;
        for (long i = 0; i < n; i++) {
            long sum = a + b;
            a = b;
            b = sum;
        }
        return a;
    }

    private static void nothing() {
        for (;;) {
            int a = 0;
        }
    }
}
"#;

    #[test]
    fn clean_layout_variants_are_identical() {
        let mangled = MANGLED_REGRESSED.replace("a-b", "a+b");
        let outcome = compare_sources(&mangled, REFERENCE, &CompareConfig::default());
        assert_eq!(outcome.result.verdict, Verdict::Identical);
        assert_eq!(outcome.canonical_candidate, outcome.canonical_reference);
    }

    #[test]
    fn regression_is_pinned_to_the_operator() {
        let outcome = compare_sources(MANGLED_REGRESSED, REFERENCE, &CompareConfig::default());
        assert_eq!(outcome.result.verdict, Verdict::Different);
        let significant: Vec<&Diff> =
            outcome.result.diffs.iter().filter(|d| d.significant).collect();
        assert_eq!(significant.len(), 1);
        assert_eq!(significant[0].kind, DiffKind::ValueChange);
        assert!(significant[0].path.contains("fibonacci"));
    }

    #[test]
    fn widened_submission_with_dead_helper_is_equivalent() {
        let outcome =
            compare_sources(WIDENED_WITH_DEAD_CODE, REFERENCE, &CompareConfig::default());
        assert_eq!(outcome.result.verdict, Verdict::Equivalent);
        assert!(outcome.result.diffs.iter().all(|d| !d.significant));
        assert!(outcome.result.diffs.iter().any(|d| d.kind == DiffKind::Retype));
        assert!(outcome.result.diffs.iter().any(|d| d.kind == DiffKind::Insert));
    }

    #[test]
    fn strict_policy_rejects_the_same_submission() {
        let config = CompareConfig {
            treat_widening_as_difference: true,
            unreachable_code_is_error: true,
            ..Default::default()
        };
        let outcome = compare_sources(WIDENED_WITH_DEAD_CODE, REFERENCE, &config);
        assert_eq!(outcome.result.verdict, Verdict::Different);
    }

    #[test]
    fn renamed_variables_stay_equivalent() {
        let renamed = REFERENCE
            .replace("int a = 0;", "int first = 0;")
            .replace("int b = 1;", "int second = 1;")
            .replace("a + b", "first + second")
            .replace("a = b;", "first = second;")
            .replace("b = sum;", "second = sum;")
            .replace("return a;", "return first;");
        let outcome = compare_sources(&renamed, REFERENCE, &CompareConfig::default());
        assert_eq!(outcome.result.verdict, Verdict::Equivalent);
        assert!(outcome.result.diffs.iter().all(|d| d.kind == DiffKind::Rename));
    }

    #[test]
    fn unparseable_candidate_reports_errors() {
        let outcome = compare_sources(
            "public class Broken { public static int f( { return 0; } }",
            REFERENCE,
            &CompareConfig::default(),
        );
        assert_eq!(outcome.result.verdict, Verdict::Unparseable);
        assert!(!outcome.candidate_errors.is_empty());
        assert!(outcome.reference_errors.is_empty());
        assert!(outcome.canonical_reference.is_some());
    }

    #[test]
    fn unsupported_constructs_are_flagged_not_crashed() {
        let outcome = compare_sources(
            "public class G { java.util.List<String> xs; }",
            REFERENCE,
            &CompareConfig::default(),
        );
        assert_eq!(outcome.result.verdict, Verdict::Unparseable);
        assert!(outcome
            .candidate_errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::Unsupported || e.kind == ParseErrorKind::Syntax));
    }

    #[test]
    fn comparison_is_not_symmetric_for_widening() {
        let config = CompareConfig::default();
        let widened = compare_sources(WIDENED_WITH_DEAD_CODE, REFERENCE, &config);
        assert_eq!(widened.result.verdict, Verdict::Equivalent);
        let narrowed = compare_sources(REFERENCE, WIDENED_WITH_DEAD_CODE, &config);
        assert_eq!(narrowed.result.verdict, Verdict::Different);
    }
}
