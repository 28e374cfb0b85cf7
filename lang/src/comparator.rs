// lang/src/comparator.rs
//
// Decides how a candidate submission relates to the reference solution.
// The fast path is byte equality of the canonical prints; the slow path
// aligns the two trees structurally (classes by name, methods by name
// and arity, statements by fingerprint LCS inside each block) and
// localizes every mismatch to the smallest differing construct.

use crate::ast::*;
use crate::canonicalizer::CanonicalizeReport;
use crate::config::CompareConfig;
use crate::printer::{print_canonical, stmt_text};
use serde::Serialize;
use std::collections::HashMap;

/// A canonicalized unit together with the notes the canonicalizer took
/// while producing it. The notes are what distinguish `Identical` from
/// `Equivalent` when the canonical bytes agree.
#[derive(Debug, Clone)]
pub struct CanonUnit {
    pub unit: CompilationUnit,
    pub report: CanonicalizeReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Same program modulo layout and comments.
    Identical,
    /// Same canonical behavior; only neutral rewrites separate the two.
    Equivalent,
    /// At least one difference that can change observable behavior.
    Different,
    /// One or both sides failed to parse.
    Unparseable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Reorder,
    Rename,
    Insert,
    Delete,
    Retype,
    ValueChange,
}

/// One localized finding. `significant` findings force a `Different`
/// verdict; informational ones are reported but tolerated.
#[derive(Debug, Clone, Serialize)]
pub struct Diff {
    pub path: String,
    pub kind: DiffKind,
    pub detail: String,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub verdict: Verdict,
    pub diffs: Vec<Diff>,
}

pub fn compare(candidate: &CanonUnit, reference: &CanonUnit, config: &CompareConfig) -> Comparison {
    let cand_text = print_canonical(&candidate.unit);
    let ref_text = print_canonical(&reference.unit);
    if cand_text == ref_text {
        let diffs = note_diffs(&candidate.report, &reference.report);
        let verdict = if diffs.is_empty() { Verdict::Identical } else { Verdict::Equivalent };
        return Comparison { verdict, diffs };
    }

    // no shared class name means there is nothing to align against; the
    // verdict stands on its own with no localized findings
    let shared = candidate
        .unit
        .classes
        .iter()
        .any(|c| reference.unit.classes.iter().any(|r| r.name == c.name));
    if !shared {
        return Comparison { verdict: Verdict::Different, diffs: Vec::new() };
    }

    let mut ctx = DiffContext { config, diffs: note_diffs(&candidate.report, &reference.report) };
    ctx.units(&candidate.unit, &reference.unit);
    let significant = ctx.diffs.iter().any(|d| d.significant);
    let verdict = if significant { Verdict::Different } else { Verdict::Equivalent };
    Comparison { verdict, diffs: ctx.diffs }
}

/// Diffs derived purely from canonicalizer notes: locals that carried
/// different original names, and assignment runs that arrived in a
/// different order. Both are neutral rewrites, so always informational.
fn note_diffs(candidate: &CanonicalizeReport, reference: &CanonicalizeReport) -> Vec<Diff> {
    let mut diffs = Vec::new();
    let ref_renames: HashMap<(&str, &str), &str> = reference
        .renames
        .iter()
        .map(|n| ((n.scope.as_str(), n.canonical.as_str()), n.original.as_str()))
        .collect();
    for note in &candidate.renames {
        if let Some(other) = ref_renames.get(&(note.scope.as_str(), note.canonical.as_str())) {
            if *other != note.original {
                diffs.push(Diff {
                    path: note.scope.clone(),
                    kind: DiffKind::Rename,
                    detail: format!(
                        "local '{}' is named '{}' in the reference (canonical {})",
                        note.original, other, note.canonical
                    ),
                    significant: false,
                });
            }
        }
    }
    let mut ref_reorders: HashMap<&str, Vec<&Vec<String>>> = HashMap::new();
    for note in &reference.reorders {
        ref_reorders.entry(note.scope.as_str()).or_default().push(&note.original_order);
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for note in &candidate.reorders {
        let idx = seen.entry(note.scope.as_str()).or_insert(0);
        if let Some(orders) = ref_reorders.get(note.scope.as_str()) {
            if let Some(other) = orders.get(*idx) {
                if **other != note.original_order {
                    diffs.push(Diff {
                        path: note.scope.clone(),
                        kind: DiffKind::Reorder,
                        detail: format!(
                            "independent assignments written as [{}], reference has [{}]",
                            note.original_order.join(", "),
                            other.join(", ")
                        ),
                        significant: false,
                    });
                }
            }
        }
        *idx += 1;
    }
    diffs
}

struct DiffContext<'a> {
    config: &'a CompareConfig,
    diffs: Vec<Diff>,
}

impl<'a> DiffContext<'a> {
    fn push(&mut self, path: &str, kind: DiffKind, detail: String, significant: bool) {
        self.diffs.push(Diff { path: path.to_string(), kind, detail, significant });
    }

    fn units(&mut self, cand: &CompilationUnit, refr: &CompilationUnit) {
        for class in &cand.classes {
            match refr.classes.iter().find(|r| r.name == class.name) {
                Some(other) => self.classes(class, other),
                None => self.push(
                    &class.name,
                    DiffKind::Insert,
                    format!("class '{}' has no counterpart in the reference", class.name),
                    true,
                ),
            }
        }
        for class in &refr.classes {
            if !cand.classes.iter().any(|c| c.name == class.name) {
                self.push(
                    &class.name,
                    DiffKind::Delete,
                    format!("reference class '{}' is missing", class.name),
                    true,
                );
            }
        }
    }

    fn classes(&mut self, cand: &ClassDecl, refr: &ClassDecl) {
        self.fields(cand, refr);
        self.methods(cand, refr);
    }

    fn fields(&mut self, cand: &ClassDecl, refr: &ClassDecl) {
        let cand_fields: Vec<&FieldDecl> = cand
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(f),
                _ => None,
            })
            .collect();
        let ref_fields: Vec<&FieldDecl> = refr
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(f),
                _ => None,
            })
            .collect();
        for field in &cand_fields {
            let name = &field.decls[0].name;
            let path = format!("{}.{}", cand.name, name);
            match ref_fields.iter().find(|f| &f.decls[0].name == name) {
                Some(other) => {
                    self.typed(&path, &field.type_name, &other.type_name, "field");
                    let a = field.decls[0].init.as_ref().map(expr_text);
                    let b = other.decls[0].init.as_ref().map(expr_text);
                    if a != b && !widened_init(&field.decls[0], &other.decls[0]) {
                        self.push(
                            &path,
                            DiffKind::ValueChange,
                            format!(
                                "initializer '{}' differs from reference '{}'",
                                a.unwrap_or_default(),
                                b.unwrap_or_default()
                            ),
                            true,
                        );
                    }
                }
                None => self.push(
                    &path,
                    DiffKind::Insert,
                    format!("field '{name}' has no counterpart in the reference"),
                    true,
                ),
            }
        }
        for field in &ref_fields {
            let name = &field.decls[0].name;
            if !cand_fields.iter().any(|f| &f.decls[0].name == name) {
                self.push(
                    &format!("{}.{}", cand.name, name),
                    DiffKind::Delete,
                    format!("reference field '{name}' is missing"),
                    true,
                );
            }
        }
    }

    fn methods(&mut self, cand: &ClassDecl, refr: &ClassDecl) {
        let cand_methods: Vec<&MethodDecl> = methods_of(cand);
        let ref_methods: Vec<&MethodDecl> = methods_of(refr);
        let mut matched_ref = vec![false; ref_methods.len()];
        for method in &cand_methods {
            let path = format!("{}.{}", cand.name, method.name);
            let slot = ref_methods
                .iter()
                .position(|r| r.name == method.name && r.params.len() == method.params.len());
            match slot {
                Some(i) => {
                    matched_ref[i] = true;
                    self.method_pair(&path, method, ref_methods[i]);
                }
                None => {
                    let tolerated = method.unreachable && !self.config.unreachable_code_is_error;
                    self.push(
                        &path,
                        DiffKind::Insert,
                        format!("method '{}' has no counterpart in the reference", method.name),
                        !tolerated,
                    );
                }
            }
        }
        for (i, method) in ref_methods.iter().enumerate() {
            if !matched_ref[i] {
                let tolerated = method.unreachable && !self.config.unreachable_code_is_error;
                self.push(
                    &format!("{}.{}", cand.name, method.name),
                    DiffKind::Delete,
                    format!("reference method '{}' is missing", method.name),
                    !tolerated,
                );
            }
        }
    }

    fn method_pair(&mut self, path: &str, cand: &MethodDecl, refr: &MethodDecl) {
        self.typed(path, &cand.return_type, &refr.return_type, "return type");
        for (a, b) in cand.params.iter().zip(&refr.params) {
            let param_path = format!("{path}({})", a.name);
            self.typed(&param_path, &a.type_name, &b.type_name, "parameter");
        }
        match (&cand.body, &refr.body) {
            (Some(a), Some(b)) => self.blocks(path, a, b),
            (Some(_), None) => {
                self.push(path, DiffKind::Insert, "method body where reference has none".into(), true)
            }
            (None, Some(_)) => {
                self.push(path, DiffKind::Delete, "reference method body is missing".into(), true)
            }
            (None, None) => {}
        }
    }

    fn for_init_pair(&mut self, path: &str, cand: &Option<ForInit>, refr: &Option<ForInit>) {
        match (cand, refr) {
            (None, None) => {}
            (
                Some(ForInit::Decl { type_name: at, decls: ad, .. }),
                Some(ForInit::Decl { type_name: bt, decls: bd, .. }),
            ) if ad.len() == 1 && bd.len() == 1 && ad[0].name == bd[0].name => {
                self.typed(path, at, bt, "loop variable type");
                if widened_init(&ad[0], &bd[0]) {
                    return;
                }
                match (&ad[0].init, &bd[0].init) {
                    (Some(a), Some(b)) => self.expr_pair(path, a, b),
                    (None, None) => {}
                    (a, b) => self.push(
                        path,
                        DiffKind::ValueChange,
                        format!(
                            "loop initializer '{}' differs from reference '{}'",
                            a.as_ref().map(expr_text).unwrap_or_default(),
                            b.as_ref().map(expr_text).unwrap_or_default()
                        ),
                        true,
                    ),
                }
            }
            (Some(ForInit::Exprs(a)), Some(ForInit::Exprs(b))) if a.len() == b.len() => {
                for (x, y) in a.iter().zip(b) {
                    self.expr_pair(path, x, y);
                }
            }
            _ => self.push(
                path,
                DiffKind::ValueChange,
                "loop initialization differs from the reference".into(),
                true,
            ),
        }
    }

    /// Widening relative to the reference (the candidate type can hold
    /// every reference value) is a `Retype`, significant only under
    /// `treat_widening_as_difference`. Narrowing and any other type
    /// change are significant outright.
    fn typed(&mut self, path: &str, cand: &TypeName, refr: &TypeName, what: &str) {
        if cand == refr {
            return;
        }
        let widening = is_widening(refr, cand);
        self.push(
            path,
            DiffKind::Retype,
            format!("{} '{}' differs from reference '{}'", what, cand.render(), refr.render()),
            if widening { self.config.treat_widening_as_difference } else { true },
        );
    }

    /// Statement-level alignment: exact matches come from an LCS over
    /// blake3 fingerprints of the canonical statement text; the gaps
    /// between matches are paired positionally and descended into.
    fn blocks(&mut self, path: &str, cand: &Block, refr: &Block) {
        let cand_prints: Vec<blake3::Hash> = cand.stmts.iter().map(fingerprint).collect();
        let ref_prints: Vec<blake3::Hash> = refr.stmts.iter().map(fingerprint).collect();
        let pairs = lcs_pairs(&cand_prints, &ref_prints);

        let mut ci = 0;
        let mut ri = 0;
        for &(mc, mr) in pairs.iter().chain([(cand.stmts.len(), refr.stmts.len())].iter()) {
            self.gap(path, &cand.stmts[ci..mc], &refr.stmts[ri..mr]);
            ci = mc + 1;
            ri = mr + 1;
        }
    }

    /// One unmatched region. Reachable statements pair up positionally
    /// and get a localized diff; unreachable ones are reported on their
    /// own so dead code never absorbs a live statement.
    fn gap(&mut self, path: &str, cand: &[Stmt], refr: &[Stmt]) {
        let (cand_live, cand_dead): (Vec<&Stmt>, Vec<&Stmt>) =
            cand.iter().partition(|s| !s.unreachable);
        let (ref_live, ref_dead): (Vec<&Stmt>, Vec<&Stmt>) =
            refr.iter().partition(|s| !s.unreachable);

        let paired = cand_live.len().min(ref_live.len());
        for i in 0..paired {
            self.stmt_pair(path, cand_live[i], ref_live[i]);
        }
        for stmt in &cand_live[paired..] {
            self.push(
                path,
                DiffKind::Insert,
                format!("statement '{}' has no counterpart in the reference", stmt_text(stmt)),
                true,
            );
        }
        for stmt in &ref_live[paired..] {
            self.push(
                path,
                DiffKind::Delete,
                format!("reference statement '{}' is missing", stmt_text(stmt)),
                true,
            );
        }
        let dead_significant = self.config.unreachable_code_is_error;
        for stmt in cand_dead {
            self.push(
                path,
                DiffKind::Insert,
                format!("unreachable statement '{}'", stmt_text(stmt)),
                dead_significant,
            );
        }
        for stmt in ref_dead {
            self.push(
                path,
                DiffKind::Delete,
                format!("reference has unreachable statement '{}'", stmt_text(stmt)),
                dead_significant,
            );
        }
    }

    fn stmt_pair(&mut self, path: &str, cand: &Stmt, refr: &Stmt) {
        match (&cand.kind, &refr.kind) {
            (
                StmtKind::VarDecl { type_name: ct, decls: cd, .. },
                StmtKind::VarDecl { type_name: rt, decls: rd, .. },
            ) if cd.len() == 1 && rd.len() == 1 && cd[0].name == rd[0].name => {
                let decl_path = format!("{path}.{}", cd[0].name);
                self.typed(&decl_path, ct, rt, "declared type");
                if widened_init(&cd[0], &rd[0]) {
                    return;
                }
                match (&cd[0].init, &rd[0].init) {
                    (Some(a), Some(b)) => self.expr_pair(&decl_path, a, b),
                    (Some(a), None) => self.push(
                        &decl_path,
                        DiffKind::ValueChange,
                        format!("initializer '{}' where reference has none", expr_text(a)),
                        true,
                    ),
                    (None, Some(b)) => self.push(
                        &decl_path,
                        DiffKind::ValueChange,
                        format!("reference initializer '{}' is missing", expr_text(b)),
                        true,
                    ),
                    (None, None) => {}
                }
            }
            (StmtKind::Expr(a), StmtKind::Expr(b)) => self.expr_pair(path, a, b),
            (StmtKind::Return(Some(a)), StmtKind::Return(Some(b))) => self.expr_pair(path, a, b),
            (StmtKind::Throw(a), StmtKind::Throw(b)) => self.expr_pair(path, a, b),
            (
                StmtKind::If { cond: ac, then_branch: at, else_branch: ae },
                StmtKind::If { cond: bc, then_branch: bt, else_branch: be },
            ) => {
                if expr_text(ac) != expr_text(bc) {
                    self.expr_pair(&format!("{path}.if"), ac, bc);
                }
                self.branch_pair(&format!("{path}.then"), at, bt);
                match (ae, be) {
                    (Some(a), Some(b)) => self.branch_pair(&format!("{path}.else"), a, b),
                    (Some(a), None) => self.push(
                        path,
                        DiffKind::Insert,
                        format!("else branch '{}' has no counterpart", stmt_text(a)),
                        true,
                    ),
                    (None, Some(b)) => self.push(
                        path,
                        DiffKind::Delete,
                        format!("reference else branch '{}' is missing", stmt_text(b)),
                        true,
                    ),
                    (None, None) => {}
                }
            }
            (StmtKind::While { cond: ac, body: ab }, StmtKind::While { cond: bc, body: bb }) => {
                if expr_text(ac) != expr_text(bc) {
                    self.expr_pair(&format!("{path}.while"), ac, bc);
                }
                self.branch_pair(&format!("{path}.while"), ab, bb);
            }
            (
                StmtKind::For { init: ai, cond: ac, update: au, body: ab },
                StmtKind::For { init: bi, cond: bc, update: bu, body: bb },
            ) => {
                let for_path = format!("{path}.for");
                self.for_init_pair(&for_path, ai, bi);
                match (ac, bc) {
                    (Some(a), Some(b)) => {
                        if expr_text(a) != expr_text(b) {
                            self.expr_pair(&for_path, a, b);
                        }
                    }
                    (None, None) => {}
                    (a, b) => self.push(
                        &for_path,
                        DiffKind::ValueChange,
                        format!(
                            "loop condition '{}' differs from reference '{}'",
                            a.as_ref().map(expr_text).unwrap_or_default(),
                            b.as_ref().map(expr_text).unwrap_or_default()
                        ),
                        true,
                    ),
                }
                if au.len() == bu.len() {
                    for (a, b) in au.iter().zip(bu) {
                        self.expr_pair(&for_path, a, b);
                    }
                } else {
                    self.push(
                        &for_path,
                        DiffKind::ValueChange,
                        "loop update list differs from the reference".into(),
                        true,
                    );
                }
                self.branch_pair(&for_path, ab, bb);
            }
            _ => {
                self.push(
                    path,
                    DiffKind::ValueChange,
                    format!(
                        "statement '{}' differs from reference '{}'",
                        stmt_text(cand),
                        stmt_text(refr)
                    ),
                    true,
                );
            }
        }
    }

    fn branch_pair(&mut self, path: &str, cand: &Stmt, refr: &Stmt) {
        match (&cand.kind, &refr.kind) {
            (StmtKind::Block(a), StmtKind::Block(b)) => self.blocks(path, a, b),
            _ => self.stmt_pair(path, cand, refr),
        }
    }

    fn expr_pair(&mut self, path: &str, cand: &Expr, refr: &Expr) {
        if expr_text(cand) == expr_text(refr) {
            return;
        }
        match (&cand.kind, &refr.kind) {
            (
                ExprKind::Binary { op: ao, left: al, right: ar },
                ExprKind::Binary { op: bo, left: bl, right: br },
            ) => {
                let operands_match =
                    expr_text(al) == expr_text(bl) && expr_text(ar) == expr_text(br);
                if ao != bo && operands_match {
                    self.push(
                        path,
                        DiffKind::ValueChange,
                        format!("operator '{}' where reference has '{}'", ao.symbol(), bo.symbol()),
                        true,
                    );
                    return;
                }
                if ao == bo {
                    self.expr_pair(path, al, bl);
                    self.expr_pair(path, ar, br);
                    return;
                }
                self.generic_value_change(path, cand, refr);
            }
            (ExprKind::Literal(a), ExprKind::Literal(b)) => {
                if a.same_value_widened(b) {
                    let cand_wider = matches!(a, Literal::Long(_));
                    self.push(
                        path,
                        DiffKind::Retype,
                        format!(
                            "literal '{}' differs in width from reference '{}'",
                            expr_text(cand),
                            expr_text(refr)
                        ),
                        if cand_wider { self.config.treat_widening_as_difference } else { true },
                    );
                } else {
                    self.generic_value_change(path, cand, refr);
                }
            }
            (
                ExprKind::Assign { op: ao, target: at, value: av },
                ExprKind::Assign { op: bo, target: bt, value: bv },
            ) if ao == bo && expr_text(at) == expr_text(bt) => {
                self.expr_pair(path, av, bv);
            }
            (
                ExprKind::Call { name: an, args: aa, .. },
                ExprKind::Call { name: bn, args: ba, .. },
            ) if an == bn && aa.len() == ba.len() => {
                for (a, b) in aa.iter().zip(ba) {
                    self.expr_pair(path, a, b);
                }
            }
            _ => self.generic_value_change(path, cand, refr),
        }
    }

    fn generic_value_change(&mut self, path: &str, cand: &Expr, refr: &Expr) {
        self.push(
            path,
            DiffKind::ValueChange,
            format!("'{}' differs from reference '{}'", expr_text(cand), expr_text(refr)),
            true,
        );
    }
}

fn methods_of(class: &ClassDecl) -> Vec<&MethodDecl> {
    class
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Method(m) => Some(m),
            _ => None,
        })
        .collect()
}

fn fingerprint(stmt: &Stmt) -> blake3::Hash {
    blake3::hash(stmt_text(stmt).as_bytes())
}

fn expr_text(expr: &Expr) -> String {
    let stmt = Stmt {
        id: 0,
        span: expr.span,
        unreachable: false,
        kind: StmtKind::Expr(expr.clone()),
    };
    let mut text = stmt_text(&stmt);
    text.pop(); // drop the statement terminator
    text
}

/// `long v = 0L` against `int v = 0` is one widening, not a retype plus
/// a value change.
fn widened_init(cand: &Declarator, refr: &Declarator) -> bool {
    match (&cand.init, &refr.init) {
        (Some(a), Some(b)) => match (&a.kind, &b.kind) {
            (ExprKind::Literal(la), ExprKind::Literal(lb)) => {
                la == lb || la.same_value_widened(lb)
            }
            _ => false,
        },
        _ => false,
    }
}

/// Longest common subsequence over statement fingerprints; returns the
/// matched index pairs in order. Quadratic in the block size, which is
/// bounded by method length in practice.
fn lcs_pairs(a: &[blake3::Hash], b: &[blake3::Hash]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    let mut table = vec![0u32; (n + 1) * (m + 1)];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * (m + 1) + j] = if a[i] == b[j] {
                table[(i + 1) * (m + 1) + j + 1] + 1
            } else {
                table[(i + 1) * (m + 1) + j].max(table[i * (m + 1) + j + 1])
            };
        }
    }
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * (m + 1) + j] >= table[i * (m + 1) + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::canonicalize;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn canon(source: &str, config: &CompareConfig) -> CanonUnit {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let mut unit = Parser::new(tokens)
            .parse_unit(source.to_string(), "Test.java".to_string())
            .unwrap();
        let report = canonicalize(&mut unit, config);
        CanonUnit { unit, report }
    }

    fn run(cand: &str, refr: &str) -> Comparison {
        run_with(cand, refr, &CompareConfig::default())
    }

    fn run_with(cand: &str, refr: &str, config: &CompareConfig) -> Comparison {
        compare(&canon(cand, config), &canon(refr, config), config)
    }

    const REFERENCE: &str = r#"
class Fib {
    int fib(int n) {
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

    #[test]
    fn same_bytes_are_identical() {
        let result = run(REFERENCE, REFERENCE);
        assert_eq!(result.verdict, Verdict::Identical);
        assert!(result.diffs.is_empty());
    }

    #[test]
    fn layout_changes_are_identical() {
        let mangled = "class Fib{int fib(int n){int a=0;int b=1;\nfor(int i=0;i<n;i++){int sum=a+b;a=b;b=sum;}return a;}}";
        let result = run(mangled, REFERENCE);
        assert_eq!(result.verdict, Verdict::Identical);
    }

    #[test]
    fn renamed_locals_are_equivalent_with_rename_diffs() {
        let renamed = r#"
class Fib {
    int fib(int count) {
        int first = 0;
        int second = 1;
        for (int step = 0; step < count; step++) {
            int next = first + second;
            first = second;
            second = next;
        }
        return first;
    }
}
"#;
        let result = run(renamed, REFERENCE);
        assert_eq!(result.verdict, Verdict::Equivalent);
        assert!(result.diffs.iter().all(|d| !d.significant));
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Rename));
    }

    #[test]
    fn operator_change_is_localized() {
        let regressed = REFERENCE.replace("a + b", "a - b");
        let result = run(&regressed, REFERENCE);
        assert_eq!(result.verdict, Verdict::Different);
        let significant: Vec<&Diff> = result.diffs.iter().filter(|d| d.significant).collect();
        assert_eq!(significant.len(), 1);
        assert_eq!(significant[0].kind, DiffKind::ValueChange);
        assert!(significant[0].path.contains("Fib.fib"));
        assert!(significant[0].detail.contains("'-'"));
        assert!(significant[0].detail.contains("'+'"));
    }

    #[test]
    fn reordered_independent_assignments_are_equivalent() {
        let cand = "class C { void m(int p, int q) { int a; int b; b = q; a = p; } }";
        let refr = "class C { void m(int p, int q) { int a; int b; a = p; b = q; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Equivalent);
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Reorder && !d.significant));
    }

    #[test]
    fn dependent_swap_is_different() {
        let cand = "class C { int m(int p) { int a; int b; a = p; b = a; return b; } }";
        let refr = "class C { int m(int p) { int a; int b; b = a; a = p; return b; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Different);
    }

    #[test]
    fn dead_private_method_is_tolerated() {
        let padded = REFERENCE.replace(
            "return a;\n    }",
            "return a;\n    }\n\n    private void nothing() {\n        for (;;) {\n            int x = 0;\n        }\n    }",
        );
        let result = run(&padded, REFERENCE);
        assert_eq!(result.verdict, Verdict::Equivalent);
        assert!(result
            .diffs
            .iter()
            .any(|d| d.kind == DiffKind::Insert && !d.significant));
    }

    #[test]
    fn dead_code_counts_when_configured() {
        let padded = REFERENCE.replace(
            "return a;\n    }",
            "return a;\n    }\n\n    private void nothing() {\n        for (;;) {\n            int x = 0;\n        }\n    }",
        );
        let config = CompareConfig { unreachable_code_is_error: true, ..Default::default() };
        let result = run_with(&padded, REFERENCE, &config);
        assert_eq!(result.verdict, Verdict::Different);
    }

    #[test]
    fn statements_after_return_are_informational() {
        let cand = "class C { int m() { return 1; int waste = 2; } }";
        let refr = "class C { int m() { return 1; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Equivalent);
        assert!(result.diffs.iter().any(|d| d.detail.contains("unreachable")));
    }

    #[test]
    fn widening_is_equivalent_by_default() {
        let widened = REFERENCE.replace("int", "long");
        let result = run(&widened, REFERENCE);
        assert_eq!(result.verdict, Verdict::Equivalent);
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Retype));
    }

    #[test]
    fn widening_counts_when_configured() {
        let widened = REFERENCE.replace("int", "long");
        let config = CompareConfig { treat_widening_as_difference: true, ..Default::default() };
        let result = run_with(&widened, REFERENCE, &config);
        assert_eq!(result.verdict, Verdict::Different);
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Retype && d.significant));
    }

    #[test]
    fn narrowing_is_always_different() {
        let cand = "class C { int m() { int a = 0; return a; } }";
        let refr = "class C { int m() { long a = 0; return a; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Different);
    }

    #[test]
    fn extra_live_statement_is_different() {
        let cand = "class C { int m(int p) { int a = p; a = a + 1; return a; } }";
        let refr = "class C { int m(int p) { int a = p; return a; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Different);
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Insert && d.significant));
    }

    #[test]
    fn missing_method_is_different() {
        let cand = "class C { int m() { return 1; } }";
        let refr = "class C { int m() { return 1; } int n() { return 2; } }";
        let result = run(cand, refr);
        assert_eq!(result.verdict, Verdict::Different);
        assert!(result.diffs.iter().any(|d| d.kind == DiffKind::Delete));
    }

    #[test]
    fn no_shared_class_yields_bare_different() {
        let result = run("class A { }", "class B { }");
        assert_eq!(result.verdict, Verdict::Different);
        assert!(result.diffs.is_empty());
    }

    #[test]
    fn diff_serializes_to_json() {
        let result = run(&REFERENCE.replace("a + b", "a - b"), REFERENCE);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"verdict\":\"different\""));
        assert!(json.contains("\"valuechange\""));
    }
}
