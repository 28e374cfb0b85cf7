// lang/src/canonicalizer.rs
//
// Rewrites a parsed tree into its canonical form. Pass order is fixed so
// the result is reproducible:
//   0. branch bodies wrapped in blocks (layout normal form)
//   1. multi-declarator split
//   2. alpha-renaming of params and locals to v0, v1, ...
//   3. literal width normalization
//   4. canonical ordering of independent adjacent assignments
//      (preceded by bare-block flattening when cross-block reordering
//      is enabled)
//   5. unreachable tagging (after return/throw/break/continue, after
//      infinite loops with no escaping break, private unused methods)
//
// Canonicalization is total: it never fails on a structurally valid tree.

use crate::ast::*;
use crate::config::CompareConfig;
use std::collections::{HashMap, HashSet};

/// One local declaration rename, keyed by the enclosing `Class.method`
/// scope and the canonical name. The comparator uses these to tell
/// `Identical` from `Equivalent`-via-rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameNote {
    pub scope: String,
    pub canonical: String,
    pub original: String,
}

/// A run of independent adjacent assignments that was put into canonical
/// order; `original_order` lists the canonical target names as they
/// appeared before sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderNote {
    pub scope: String,
    pub span: Span,
    pub original_order: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnreachableNote {
    pub span: Span,
    pub what: String,
}

#[derive(Debug, Clone, Default)]
pub struct CanonicalizeReport {
    pub renames: Vec<RenameNote>,
    pub reorders: Vec<ReorderNote>,
    pub unreachable: Vec<UnreachableNote>,
}

pub fn canonicalize(unit: &mut CompilationUnit, config: &CompareConfig) -> CanonicalizeReport {
    let mut canon = Canonicalizer {
        config,
        report: CanonicalizeReport::default(),
    };
    canon.run(unit);
    canon.report
}

struct Canonicalizer<'a> {
    config: &'a CompareConfig,
    report: CanonicalizeReport,
}

impl<'a> Canonicalizer<'a> {
    fn run(&mut self, unit: &mut CompilationUnit) {
        if !self.config.preserve_top_level_names {
            self.rename_top_level(unit);
        }
        for ci in 0..unit.classes.len() {
            self.canonicalize_class(&mut unit.classes[ci]);
        }
    }

    fn canonicalize_class(&mut self, class: &mut ClassDecl) {
        split_field_declarators(class);
        let class_name = class.name.clone();
        for member in &mut class.members {
            if let Member::Method(method) = member {
                let scope = format!("{}.{}", class_name, method.name);
                if let Some(body) = method.body.as_mut() {
                    wrap_branch_bodies(body);
                    split_block_declarators(body);
                }
                let mut renamer = Renamer::new(scope.clone());
                for param in &mut method.params {
                    renamer.declare(param.span, &mut param.name);
                }
                if let Some(body) = method.body.as_mut() {
                    renamer.rename_block(body);
                }
                self.report.renames.append(&mut renamer.notes);
                if let Some(body) = method.body.as_mut() {
                    normalize_literal_widths(body);
                    if self.config.cross_block_reordering {
                        flatten_bare_blocks(body);
                    }
                    if self.config.reorder_independent_statements {
                        reorder_block(body, &scope, &mut self.report.reorders);
                    }
                    mark_unreachable_block(body, &mut self.report.unreachable);
                }
            }
        }
        self.tag_private_unused(class);
    }

    /// Positional renaming of classes and methods, only under
    /// `preserve_top_level_names: false`.
    fn rename_top_level(&mut self, unit: &mut CompilationUnit) {
        for (ci, class) in unit.classes.iter_mut().enumerate() {
            let canonical_class = format!("c{ci}");
            self.report.renames.push(RenameNote {
                scope: String::new(),
                canonical: canonical_class.clone(),
                original: class.name.clone(),
            });
            let mut method_map: HashMap<String, String> = HashMap::new();
            let mut mi = 0usize;
            for member in &mut class.members {
                if let Member::Method(method) = member {
                    if method.is_ctor {
                        method.name = canonical_class.clone();
                        continue;
                    }
                    let canonical = format!("m{mi}");
                    mi += 1;
                    self.report.renames.push(RenameNote {
                        scope: canonical_class.clone(),
                        canonical: canonical.clone(),
                        original: method.name.clone(),
                    });
                    method_map.insert(method.name.clone(), canonical.clone());
                    method.name = canonical;
                }
            }
            class.name = canonical_class;
            for member in &mut class.members {
                match member {
                    Member::Method(method) => {
                        if let Some(body) = method.body.as_mut() {
                            rewrite_calls_block(body, &method_map);
                        }
                    }
                    Member::Field(field) => {
                        for decl in &mut field.decls {
                            if let Some(init) = decl.init.as_mut() {
                                rewrite_calls_expr(init, &method_map);
                            }
                        }
                    }
                }
            }
        }
    }

    fn tag_private_unused(&mut self, class: &mut ClassDecl) {
        let mut called: HashSet<String> = HashSet::new();
        for member in &class.members {
            match member {
                Member::Method(method) => {
                    if let Some(body) = &method.body {
                        collect_called_names_block(body, &mut called);
                    }
                }
                Member::Field(field) => {
                    for decl in &field.decls {
                        if let Some(init) = &decl.init {
                            collect_called_names_expr(init, &mut called);
                        }
                    }
                }
            }
        }
        for member in &mut class.members {
            if let Member::Method(method) = member {
                if method.modifiers.contains(&Modifier::Private)
                    && !method.is_ctor
                    && !called.contains(&method.name)
                {
                    method.unreachable = true;
                    self.report.unreachable.push(UnreachableNote {
                        span: method.span,
                        what: format!("private method '{}' is never called", method.name),
                    });
                }
            }
        }
    }
}

// ── pass 0: branch bodies become blocks ─────────────────────────────

fn wrap_branch_bodies(block: &mut Block) {
    for stmt in &mut block.stmts {
        wrap_branch_stmt(stmt);
    }
}

fn wrap_branch_stmt(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::If { then_branch, else_branch, .. } => {
            wrap_into_block(then_branch);
            if let Some(branch) = else_branch {
                wrap_into_block(branch);
            }
        }
        StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
            wrap_into_block(body);
        }
        StmtKind::Block(inner) => wrap_branch_bodies(inner),
        _ => {}
    }
}

fn wrap_into_block(branch: &mut Box<Stmt>) {
    if let StmtKind::Block(inner) = &mut branch.kind {
        wrap_branch_bodies(inner);
        return;
    }
    let span = branch.span;
    let inner = std::mem::replace(
        branch.as_mut(),
        Stmt { id: 0, span, unreachable: false, kind: StmtKind::Empty },
    );
    let mut block = Block { id: inner.id, span, stmts: vec![inner] };
    wrap_branch_bodies(&mut block);
    branch.as_mut().kind = StmtKind::Block(block);
    branch.as_mut().id = 0;
}

// ── pass 1: multi-declarator split ──────────────────────────────────

fn split_field_declarators(class: &mut ClassDecl) {
    let mut members = Vec::with_capacity(class.members.len());
    for member in class.members.drain(..) {
        match member {
            Member::Field(field) if field.decls.len() > 1 => {
                for decl in field.decls {
                    let span = decl.span;
                    members.push(Member::Field(FieldDecl {
                        id: decl.id,
                        span,
                        doc: field.doc.clone(),
                        modifiers: field.modifiers.clone(),
                        type_name: field.type_name.clone(),
                        decls: vec![decl],
                    }));
                }
            }
            other => members.push(other),
        }
    }
    class.members = members;
}

fn split_block_declarators(block: &mut Block) {
    let mut stmts = Vec::with_capacity(block.stmts.len());
    for mut stmt in block.stmts.drain(..) {
        split_in_children(&mut stmt);
        match stmt.kind {
            StmtKind::VarDecl { is_final, type_name, decls } if decls.len() > 1 => {
                for decl in decls {
                    let span = decl.span;
                    stmts.push(Stmt {
                        id: decl.id,
                        span,
                        unreachable: false,
                        kind: StmtKind::VarDecl {
                            is_final,
                            type_name: type_name.clone(),
                            decls: vec![decl],
                        },
                    });
                }
            }
            kind => {
                stmt.kind = kind;
                stmts.push(stmt);
            }
        }
    }
    block.stmts = stmts;
}

fn split_in_children(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Block(inner) => split_block_declarators(inner),
        StmtKind::If { then_branch, else_branch, .. } => {
            if let StmtKind::Block(b) = &mut then_branch.kind {
                split_block_declarators(b);
            }
            if let Some(branch) = else_branch {
                if let StmtKind::Block(b) = &mut branch.kind {
                    split_block_declarators(b);
                }
            }
        }
        StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
            if let StmtKind::Block(b) = &mut body.kind {
                split_block_declarators(b);
            }
        }
        _ => {}
    }
}

// ── pass 2: alpha-renaming ──────────────────────────────────────────

struct Renamer {
    scope_name: String,
    scopes: Vec<HashMap<String, String>>,
    counter: usize,
    notes: Vec<RenameNote>,
}

impl Renamer {
    fn new(scope_name: String) -> Self {
        Self {
            scope_name,
            scopes: vec![HashMap::new()],
            counter: 0,
            notes: Vec::new(),
        }
    }

    fn declare(&mut self, _span: Span, name: &mut String) {
        let canonical = format!("v{}", self.counter);
        self.counter += 1;
        self.notes.push(RenameNote {
            scope: self.scope_name.clone(),
            canonical: canonical.clone(),
            original: name.clone(),
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.clone(), canonical.clone());
        }
        *name = canonical;
    }

    fn resolve(&self, name: &str) -> Option<&String> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit(&mut self) {
        self.scopes.pop();
    }

    fn rename_block(&mut self, block: &mut Block) {
        self.enter();
        for stmt in &mut block.stmts {
            self.rename_stmt(stmt);
        }
        self.exit();
    }

    fn rename_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::VarDecl { decls, .. } => {
                for decl in decls {
                    if let Some(init) = decl.init.as_mut() {
                        self.rename_expr(init);
                    }
                    self.declare(decl.span, &mut decl.name);
                }
            }
            StmtKind::Expr(expr) => self.rename_expr(expr),
            StmtKind::If { cond, then_branch, else_branch } => {
                self.rename_expr(cond);
                self.rename_branch(then_branch);
                if let Some(branch) = else_branch {
                    self.rename_branch(branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.rename_expr(cond);
                self.rename_branch(body);
            }
            StmtKind::For { init, cond, update, body } => {
                // the for header and body share one scope
                self.enter();
                match init {
                    Some(ForInit::Decl { decls, .. }) => {
                        for decl in decls {
                            if let Some(init) = decl.init.as_mut() {
                                self.rename_expr(init);
                            }
                            self.declare(decl.span, &mut decl.name);
                        }
                    }
                    Some(ForInit::Exprs(exprs)) => {
                        for expr in exprs {
                            self.rename_expr(expr);
                        }
                    }
                    None => {}
                }
                if let Some(cond) = cond {
                    self.rename_expr(cond);
                }
                for expr in update {
                    self.rename_expr(expr);
                }
                if let StmtKind::Block(b) = &mut body.kind {
                    for stmt in &mut b.stmts {
                        self.rename_stmt(stmt);
                    }
                }
                self.exit();
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.rename_expr(value);
                }
            }
            StmtKind::Throw(value) => self.rename_expr(value),
            StmtKind::Block(inner) => self.rename_block(inner),
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
        }
    }

    fn rename_branch(&mut self, branch: &mut Box<Stmt>) {
        if let StmtKind::Block(b) = &mut branch.kind {
            self.rename_block(b);
        }
    }

    fn rename_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Name(name) => {
                if let Some(canonical) = self.resolve(name) {
                    *name = canonical.clone();
                }
            }
            ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => {
                self.rename_expr(operand);
            }
            ExprKind::Binary { left, right, .. } => {
                self.rename_expr(left);
                self.rename_expr(right);
            }
            ExprKind::Assign { target, value, .. } => {
                self.rename_expr(target);
                self.rename_expr(value);
            }
            ExprKind::Call { receiver, args, .. } => {
                if let Some(receiver) = receiver {
                    self.rename_expr(receiver);
                }
                for arg in args {
                    self.rename_expr(arg);
                }
            }
            ExprKind::FieldAccess { target, .. } => self.rename_expr(target),
            ExprKind::Index { target, index } => {
                self.rename_expr(target);
                self.rename_expr(index);
            }
            ExprKind::New { args, .. } => {
                for arg in args {
                    self.rename_expr(arg);
                }
            }
            ExprKind::NewArray { len, .. } => self.rename_expr(len),
            ExprKind::Literal(_) => {}
        }
    }
}

// ── pass 3: literal width normalization ─────────────────────────────

/// An int literal initializing a long variable is rewritten to the long
/// representation, so `long a = 0;` and `long a = 0L;` print the same.
fn normalize_literal_widths(block: &mut Block) {
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::VarDecl { type_name, decls, .. } => {
                for decl in decls.iter_mut() {
                    widen_init(type_name, decl);
                }
            }
            StmtKind::For { init, body, .. } => {
                if let Some(ForInit::Decl { type_name, decls, .. }) = init {
                    for decl in decls.iter_mut() {
                        widen_init(type_name, decl);
                    }
                }
                if let StmtKind::Block(b) = &mut body.kind {
                    normalize_literal_widths(b);
                }
            }
            StmtKind::If { then_branch, else_branch, .. } => {
                if let StmtKind::Block(b) = &mut then_branch.kind {
                    normalize_literal_widths(b);
                }
                if let Some(branch) = else_branch {
                    if let StmtKind::Block(b) = &mut branch.kind {
                        normalize_literal_widths(b);
                    }
                }
            }
            StmtKind::While { body, .. } => {
                if let StmtKind::Block(b) = &mut body.kind {
                    normalize_literal_widths(b);
                }
            }
            StmtKind::Block(inner) => normalize_literal_widths(inner),
            _ => {}
        }
    }
}

fn widen_init(type_name: &TypeName, decl: &mut Declarator) {
    if type_name.numeric_rank() != Some(3) {
        return;
    }
    if let Some(init) = decl.init.as_mut() {
        if let ExprKind::Literal(Literal::Int(value)) = init.kind {
            init.kind = ExprKind::Literal(Literal::Long(value));
        }
    }
}

// ── cross-block flattening (behind config flag) ─────────────────────

/// Splices bare nested blocks into their parent statement list. Safe
/// after renaming: canonical names are unique per method, so hoisting
/// cannot capture.
fn flatten_bare_blocks(block: &mut Block) {
    let mut stmts = Vec::with_capacity(block.stmts.len());
    for mut stmt in block.stmts.drain(..) {
        flatten_in_children(&mut stmt);
        match stmt.kind {
            StmtKind::Block(mut inner) => {
                flatten_bare_blocks(&mut inner);
                stmts.extend(inner.stmts);
            }
            kind => {
                stmt.kind = kind;
                stmts.push(stmt);
            }
        }
    }
    block.stmts = stmts;
}

fn flatten_in_children(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::If { then_branch, else_branch, .. } => {
            if let StmtKind::Block(b) = &mut then_branch.kind {
                flatten_bare_blocks(b);
            }
            if let Some(branch) = else_branch {
                if let StmtKind::Block(b) = &mut branch.kind {
                    flatten_bare_blocks(b);
                }
            }
        }
        StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
            if let StmtKind::Block(b) = &mut body.kind {
                flatten_bare_blocks(b);
            }
        }
        _ => {}
    }
}

// ── pass 4: canonical ordering of independent assignments ───────────

fn reorder_block(block: &mut Block, scope: &str, notes: &mut Vec<ReorderNote>) {
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::Block(inner) => reorder_block(inner, scope, notes),
            StmtKind::If { then_branch, else_branch, .. } => {
                if let StmtKind::Block(b) = &mut then_branch.kind {
                    reorder_block(b, scope, notes);
                }
                if let Some(branch) = else_branch {
                    if let StmtKind::Block(b) = &mut branch.kind {
                        reorder_block(b, scope, notes);
                    }
                }
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                if let StmtKind::Block(b) = &mut body.kind {
                    reorder_block(b, scope, notes);
                }
            }
            _ => {}
        }
    }
    let mut i = 0;
    while i < block.stmts.len() {
        let Some(first) = simple_assignment(&block.stmts[i]) else {
            i += 1;
            continue;
        };
        let mut run = vec![first];
        let mut end = i + 1;
        while end < block.stmts.len() {
            let Some(next) = simple_assignment(&block.stmts[end]) else {
                break;
            };
            if !run.iter().all(|prev| independent(prev, &next)) {
                break;
            }
            run.push(next);
            end += 1;
        }
        if run.len() > 1 {
            let span = block.stmts[i].span.merge(&block.stmts[end - 1].span);
            notes.push(ReorderNote {
                scope: scope.to_string(),
                span,
                original_order: run.iter().map(|a| a.target.clone()).collect(),
            });
            block.stmts[i..end].sort_by(|x, y| {
                let tx = simple_assignment(x).map(|a| a.target).unwrap_or_default();
                let ty = simple_assignment(y).map(|a| a.target).unwrap_or_default();
                tx.cmp(&ty)
            });
        }
        i = end;
    }
}

struct SimpleAssignment {
    target: String,
    reads: HashSet<String>,
}

fn independent(a: &SimpleAssignment, b: &SimpleAssignment) -> bool {
    a.target != b.target && !a.reads.contains(&b.target) && !b.reads.contains(&a.target)
}

/// `target = <side-effect-free expr>;` — anything with a call, allocation
/// or embedded mutation is excluded; those statements keep their order.
fn simple_assignment(stmt: &Stmt) -> Option<SimpleAssignment> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    let ExprKind::Assign { op: AssignOp::Assign, target, value } = &expr.kind else {
        return None;
    };
    let ExprKind::Name(target) = &target.kind else {
        return None;
    };
    if !is_pure(value) {
        return None;
    }
    let mut reads = HashSet::new();
    collect_names(value, &mut reads);
    Some(SimpleAssignment { target: target.clone(), reads })
}

fn is_pure(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) => true,
        ExprKind::Unary { op, operand } => {
            !matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) && is_pure(operand)
        }
        ExprKind::Binary { left, right, .. } => is_pure(left) && is_pure(right),
        ExprKind::FieldAccess { target, .. } => is_pure(target),
        ExprKind::Index { target, index } => is_pure(target) && is_pure(index),
        ExprKind::Assign { .. }
        | ExprKind::Postfix { .. }
        | ExprKind::Call { .. }
        | ExprKind::New { .. }
        | ExprKind::NewArray { .. } => false,
    }
}

fn collect_names(expr: &Expr, names: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Name(name) => {
            names.insert(name.clone());
        }
        ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => {
            collect_names(operand, names);
        }
        ExprKind::Binary { left, right, .. } => {
            collect_names(left, names);
            collect_names(right, names);
        }
        ExprKind::Assign { target, value, .. } => {
            collect_names(target, names);
            collect_names(value, names);
        }
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                collect_names(receiver, names);
            }
            for arg in args {
                collect_names(arg, names);
            }
        }
        ExprKind::FieldAccess { target, .. } => collect_names(target, names),
        ExprKind::Index { target, index } => {
            collect_names(target, names);
            collect_names(index, names);
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                collect_names(arg, names);
            }
        }
        ExprKind::NewArray { len, .. } => collect_names(len, names),
        ExprKind::Literal(_) => {}
    }
}

// ── pass 5: unreachable tagging ─────────────────────────────────────

fn mark_unreachable_block(block: &mut Block, notes: &mut Vec<UnreachableNote>) {
    let mut dead_from = None;
    for (idx, stmt) in block.stmts.iter_mut().enumerate() {
        mark_unreachable_children(stmt, notes);
        if dead_from.is_none() && terminates_flow(stmt) {
            dead_from = Some(idx + 1);
        }
    }
    if let Some(from) = dead_from {
        for stmt in &mut block.stmts[from..] {
            if !stmt.unreachable {
                stmt.unreachable = true;
                notes.push(UnreachableNote {
                    span: stmt.span,
                    what: "statement cannot be reached".to_string(),
                });
            }
        }
    }
}

fn mark_unreachable_children(stmt: &mut Stmt, notes: &mut Vec<UnreachableNote>) {
    match &mut stmt.kind {
        StmtKind::Block(inner) => mark_unreachable_block(inner, notes),
        StmtKind::If { then_branch, else_branch, .. } => {
            if let StmtKind::Block(b) = &mut then_branch.kind {
                mark_unreachable_block(b, notes);
            }
            if let Some(branch) = else_branch {
                if let StmtKind::Block(b) = &mut branch.kind {
                    mark_unreachable_block(b, notes);
                }
            }
        }
        StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
            if let StmtKind::Block(b) = &mut body.kind {
                mark_unreachable_block(b, notes);
            }
        }
        _ => {}
    }
}

/// True if control never reaches the statement after this one within the
/// same block.
fn terminates_flow(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Throw(_) | StmtKind::Break | StmtKind::Continue => true,
        StmtKind::For { cond: None, body, .. } => !has_escaping_break(body),
        StmtKind::While { cond, body } => {
            matches!(cond.kind, ExprKind::Literal(Literal::Bool(true))) && !has_escaping_break(body)
        }
        _ => false,
    }
}

/// A `break` that would leave the loop whose body is `stmt`; breaks
/// inside nested loops bind to those loops.
fn has_escaping_break(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Break => true,
        StmtKind::Block(inner) => inner.stmts.iter().any(has_escaping_break),
        StmtKind::If { then_branch, else_branch, .. } => {
            has_escaping_break(then_branch)
                || else_branch.as_deref().map(has_escaping_break).unwrap_or(false)
        }
        StmtKind::While { .. } | StmtKind::For { .. } => false,
        _ => false,
    }
}

// ── shared walkers ──────────────────────────────────────────────────

fn collect_called_names_block(block: &Block, called: &mut HashSet<String>) {
    for stmt in &block.stmts {
        collect_called_names_stmt(stmt, called);
    }
}

fn collect_called_names_stmt(stmt: &Stmt, called: &mut HashSet<String>) {
    match &stmt.kind {
        StmtKind::VarDecl { decls, .. } => {
            for decl in decls {
                if let Some(init) = &decl.init {
                    collect_called_names_expr(init, called);
                }
            }
        }
        StmtKind::Expr(expr) => collect_called_names_expr(expr, called),
        StmtKind::If { cond, then_branch, else_branch } => {
            collect_called_names_expr(cond, called);
            collect_called_names_stmt(then_branch, called);
            if let Some(branch) = else_branch {
                collect_called_names_stmt(branch, called);
            }
        }
        StmtKind::While { cond, body } => {
            collect_called_names_expr(cond, called);
            collect_called_names_stmt(body, called);
        }
        StmtKind::For { init, cond, update, body } => {
            match init {
                Some(ForInit::Decl { decls, .. }) => {
                    for decl in decls {
                        if let Some(init) = &decl.init {
                            collect_called_names_expr(init, called);
                        }
                    }
                }
                Some(ForInit::Exprs(exprs)) => {
                    for expr in exprs {
                        collect_called_names_expr(expr, called);
                    }
                }
                None => {}
            }
            if let Some(cond) = cond {
                collect_called_names_expr(cond, called);
            }
            for expr in update {
                collect_called_names_expr(expr, called);
            }
            collect_called_names_stmt(body, called);
        }
        StmtKind::Return(Some(value)) | StmtKind::Throw(value) => {
            collect_called_names_expr(value, called);
        }
        StmtKind::Block(inner) => collect_called_names_block(inner, called),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
    }
}

fn collect_called_names_expr(expr: &Expr, called: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Call { receiver, name, args } => {
            called.insert(name.clone());
            if let Some(receiver) = receiver {
                collect_called_names_expr(receiver, called);
            }
            for arg in args {
                collect_called_names_expr(arg, called);
            }
        }
        ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => {
            collect_called_names_expr(operand, called);
        }
        ExprKind::Binary { left, right, .. } => {
            collect_called_names_expr(left, called);
            collect_called_names_expr(right, called);
        }
        ExprKind::Assign { target, value, .. } => {
            collect_called_names_expr(target, called);
            collect_called_names_expr(value, called);
        }
        ExprKind::FieldAccess { target, .. } => collect_called_names_expr(target, called),
        ExprKind::Index { target, index } => {
            collect_called_names_expr(target, called);
            collect_called_names_expr(index, called);
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                collect_called_names_expr(arg, called);
            }
        }
        ExprKind::NewArray { len, .. } => collect_called_names_expr(len, called),
        ExprKind::Literal(_) | ExprKind::Name(_) => {}
    }
}

fn rewrite_calls_block(block: &mut Block, map: &HashMap<String, String>) {
    for stmt in &mut block.stmts {
        rewrite_calls_stmt(stmt, map);
    }
}

fn rewrite_calls_stmt(stmt: &mut Stmt, map: &HashMap<String, String>) {
    match &mut stmt.kind {
        StmtKind::VarDecl { decls, .. } => {
            for decl in decls {
                if let Some(init) = decl.init.as_mut() {
                    rewrite_calls_expr(init, map);
                }
            }
        }
        StmtKind::Expr(expr) => rewrite_calls_expr(expr, map),
        StmtKind::If { cond, then_branch, else_branch } => {
            rewrite_calls_expr(cond, map);
            rewrite_calls_stmt(then_branch, map);
            if let Some(branch) = else_branch {
                rewrite_calls_stmt(branch, map);
            }
        }
        StmtKind::While { cond, body } => {
            rewrite_calls_expr(cond, map);
            rewrite_calls_stmt(body, map);
        }
        StmtKind::For { init, cond, update, body } => {
            match init {
                Some(ForInit::Decl { decls, .. }) => {
                    for decl in decls {
                        if let Some(init) = decl.init.as_mut() {
                            rewrite_calls_expr(init, map);
                        }
                    }
                }
                Some(ForInit::Exprs(exprs)) => {
                    for expr in exprs {
                        rewrite_calls_expr(expr, map);
                    }
                }
                None => {}
            }
            if let Some(cond) = cond {
                rewrite_calls_expr(cond, map);
            }
            for expr in update {
                rewrite_calls_expr(expr, map);
            }
            rewrite_calls_stmt(body, map);
        }
        StmtKind::Return(Some(value)) | StmtKind::Throw(value) => rewrite_calls_expr(value, map),
        StmtKind::Block(inner) => rewrite_calls_block(inner, map),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
    }
}

fn rewrite_calls_expr(expr: &mut Expr, map: &HashMap<String, String>) {
    match &mut expr.kind {
        ExprKind::Call { receiver, name, args } => {
            if receiver.is_none() {
                if let Some(canonical) = map.get(name) {
                    *name = canonical.clone();
                }
            }
            if let Some(receiver) = receiver {
                rewrite_calls_expr(receiver, map);
            }
            for arg in args {
                rewrite_calls_expr(arg, map);
            }
        }
        ExprKind::Unary { operand, .. } | ExprKind::Postfix { operand, .. } => {
            rewrite_calls_expr(operand, map);
        }
        ExprKind::Binary { left, right, .. } => {
            rewrite_calls_expr(left, map);
            rewrite_calls_expr(right, map);
        }
        ExprKind::Assign { target, value, .. } => {
            rewrite_calls_expr(target, map);
            rewrite_calls_expr(value, map);
        }
        ExprKind::FieldAccess { target, .. } => rewrite_calls_expr(target, map),
        ExprKind::Index { target, index } => {
            rewrite_calls_expr(target, map);
            rewrite_calls_expr(index, map);
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                rewrite_calls_expr(arg, map);
            }
        }
        ExprKind::NewArray { len, .. } => rewrite_calls_expr(len, map),
        ExprKind::Literal(_) | ExprKind::Name(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::printer::print_canonical;

    fn canon(source: &str) -> (CompilationUnit, CanonicalizeReport) {
        canon_with(source, &CompareConfig::default())
    }

    fn canon_with(source: &str, config: &CompareConfig) -> (CompilationUnit, CanonicalizeReport) {
        let tokens = Lexer::new(source).tokenize().unwrap();
        let mut unit = Parser::new(tokens)
            .parse_unit(source.to_string(), "Test.java".to_string())
            .unwrap();
        let report = canonicalize(&mut unit, config);
        (unit, report)
    }

    fn body_of<'u>(unit: &'u CompilationUnit, method: &str) -> &'u Block {
        for member in &unit.classes[0].members {
            if let Member::Method(m) = member {
                if m.name == method {
                    return m.body.as_ref().unwrap();
                }
            }
        }
        panic!("method {method} not found");
    }

    #[test]
    fn splits_multi_declarator() {
        let (unit, _) = canon("class C { void m() { int a = 0, b = 1; } }");
        let body = body_of(&unit, "m");
        assert_eq!(body.stmts.len(), 2);
        for stmt in &body.stmts {
            match &stmt.kind {
                StmtKind::VarDecl { decls, .. } => assert_eq!(decls.len(), 1),
                other => panic!("var decl expected, got {other:?}"),
            }
        }
    }

    #[test]
    fn renames_params_then_locals_in_declaration_order() {
        let (unit, report) = canon("class C { int m(int x, int y) { int sum = x + y; return sum; } }");
        let body = body_of(&unit, "m");
        match &body.stmts[0].kind {
            StmtKind::VarDecl { decls, .. } => assert_eq!(decls[0].name, "v2"),
            other => panic!("var decl expected, got {other:?}"),
        }
        let originals: Vec<&str> = report.renames.iter().map(|n| n.original.as_str()).collect();
        assert_eq!(originals, vec!["x", "y", "sum"]);
        let canonicals: Vec<&str> = report.renames.iter().map(|n| n.canonical.as_str()).collect();
        assert_eq!(canonicals, vec!["v0", "v1", "v2"]);
    }

    #[test]
    fn shadowing_resolves_to_nearest_declaration() {
        let source = "class C { int m(int x) { { int y = x; } int y = 2; return y; } }";
        let (unit, _) = canon(source);
        let body = body_of(&unit, "m");
        // outer y is v2; the return must reference it, not the inner v1
        let StmtKind::Return(Some(expr)) = &body.stmts[2].kind else {
            panic!("return expected");
        };
        let ExprKind::Name(name) = &expr.kind else {
            panic!("name expected");
        };
        assert_eq!(name, "v2");
    }

    #[test]
    fn field_and_method_names_stay_by_default() {
        let (unit, _) = canon("class C { int count; int get() { return count; } }");
        assert_eq!(unit.classes[0].name, "C");
        let body = body_of(&unit, "get");
        let StmtKind::Return(Some(expr)) = &body.stmts[0].kind else {
            panic!("return expected");
        };
        assert!(matches!(&expr.kind, ExprKind::Name(n) if n == "count"));
    }

    #[test]
    fn top_level_renaming_is_positional_when_configured() {
        let config = CompareConfig { preserve_top_level_names: false, ..Default::default() };
        let (unit, _) = canon_with(
            "class Fib { int fib(int x) { return helper(x); } int helper(int x) { return x; } }",
            &config,
        );
        assert_eq!(unit.classes[0].name, "c0");
        let body = body_of(&unit, "m0");
        let StmtKind::Return(Some(expr)) = &body.stmts[0].kind else {
            panic!("return expected");
        };
        assert!(matches!(&expr.kind, ExprKind::Call { name, .. } if name == "m1"));
    }

    #[test]
    fn long_decl_literal_is_widened() {
        let (unit, _) = canon("class C { void m() { long a = 0; } }");
        let body = body_of(&unit, "m");
        let StmtKind::VarDecl { decls, .. } = &body.stmts[0].kind else {
            panic!("var decl expected");
        };
        let init = decls[0].init.as_ref().unwrap();
        assert!(matches!(init.kind, ExprKind::Literal(Literal::Long(0))));
    }

    #[test]
    fn independent_assignments_sort_by_target() {
        let (unit, report) = canon("class C { void m(int p, int q) { int a; int b; b = q; a = p; } }");
        let body = body_of(&unit, "m");
        // decls are v2 (a), v3 (b); assignments sorted back to v2 = v0; v3 = v1
        let targets: Vec<String> = body.stmts[2..]
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Expr(e) => match &e.kind {
                    ExprKind::Assign { target, .. } => match &target.kind {
                        ExprKind::Name(n) => n.clone(),
                        _ => panic!("name target expected"),
                    },
                    _ => panic!("assign expected"),
                },
                _ => panic!("expr stmt expected"),
            })
            .collect();
        assert_eq!(targets, vec!["v2".to_string(), "v3".to_string()]);
        assert_eq!(report.reorders.len(), 1);
        assert_eq!(report.reorders[0].original_order, vec!["v3".to_string(), "v2".to_string()]);
    }

    #[test]
    fn dependent_assignments_keep_order() {
        let (unit, report) = canon("class C { void m(int p) { int a; int b; a = p; b = a; } }");
        let body = body_of(&unit, "m");
        let StmtKind::Expr(first) = &body.stmts[2].kind else { panic!() };
        let ExprKind::Assign { target, .. } = &first.kind else { panic!() };
        assert!(matches!(&target.kind, ExprKind::Name(n) if n == "v1"));
        assert!(report.reorders.is_empty());
    }

    #[test]
    fn call_assignments_are_never_reordered() {
        let (_, report) = canon("class C { void m() { int a; int b; b = f(); a = g(); } int f() { return 1; } int g() { return 2; } }");
        assert!(report.reorders.is_empty());
    }

    #[test]
    fn statements_after_return_are_tagged() {
        let (unit, report) = canon("class C { int m() { return 1; int a = 2; } }");
        let body = body_of(&unit, "m");
        assert!(!body.stmts[0].unreachable);
        assert!(body.stmts[1].unreachable);
        assert_eq!(report.unreachable.len(), 1);
    }

    #[test]
    fn infinite_loop_without_break_terminates_flow() {
        let (unit, _) = canon("class C { void m() { for (;;) { int a = 0; } int b = 1; } }");
        let body = body_of(&unit, "m");
        assert!(body.stmts[1].unreachable);
    }

    #[test]
    fn escaping_break_keeps_following_code_reachable() {
        let (unit, _) = canon("class C { void m(int x) { while (true) { if (x > 0) { break; } } int b = 1; } }");
        let body = body_of(&unit, "m");
        assert!(!body.stmts[1].unreachable);
    }

    #[test]
    fn break_in_nested_loop_does_not_escape() {
        let (unit, _) = canon(
            "class C { void m() { for (;;) { for (int i = 0; i < 3; i++) { break; } } int b = 1; } }",
        );
        let body = body_of(&unit, "m");
        assert!(body.stmts[1].unreachable);
    }

    #[test]
    fn private_unused_method_is_tagged() {
        let (unit, report) = canon(
            "class C { int m() { return 1; } private void nothing() { for (;;) { int a = 0; } } }",
        );
        let Member::Method(nothing) = &unit.classes[0].members[1] else {
            panic!("method expected");
        };
        assert!(nothing.unreachable);
        assert!(report.unreachable.iter().any(|n| n.what.contains("nothing")));
    }

    #[test]
    fn private_called_method_is_not_tagged() {
        let (unit, _) = canon("class C { int m() { return helper(); } private int helper() { return 1; } }");
        let Member::Method(helper) = &unit.classes[0].members[1] else {
            panic!("method expected");
        };
        assert!(!helper.unreachable);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let source = r#"
class C {
    int m(int first, int second) {
        if (first < 0)
            throw new IllegalArgumentException();
        int a = 0, b = 1;
        b = second;
        a = first;
        for (int i = 0; i < second; i++) {
            a = a + 1;
        }
        return a;
    }
}
"#;
        let (mut unit, _) = canon(source);
        let once = print_canonical(&unit);
        let _ = canonicalize(&mut unit, &CompareConfig::default());
        let twice = print_canonical(&unit);
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_blocks_flatten_only_under_cross_block_flag() {
        let source = "class C { void m(int p) { { int a = p; } int b = p; } }";
        let (unit, _) = canon(source);
        assert_eq!(body_of(&unit, "m").stmts.len(), 2);
        let config = CompareConfig { cross_block_reordering: true, ..Default::default() };
        let (unit, _) = canon_with(source, &config);
        assert_eq!(body_of(&unit, "m").stmts.len(), 2);
        match &body_of(&unit, "m").stmts[0].kind {
            StmtKind::VarDecl { .. } => {}
            other => panic!("flattened decl expected, got {other:?}"),
        }
    }
}
