// lang/src/printer.rs
//
// Deterministic source renderer. The canonical text it produces is the
// comparison key: same tree in, same bytes out, independent of the
// submission's original layout. Parentheses are reconstructed from
// operator precedence, so redundant grouping from the source never
// survives a round trip.

use crate::ast::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Comparison form: no comments, fully normalized layout.
    Canonical,
    /// Same layout, but doc comments ride along for human review.
    Documented,
}

pub fn print_unit(unit: &CompilationUnit, mode: PrintMode) -> String {
    let mut printer = Printer { mode, indent: 0, out: String::new() };
    printer.unit(unit);
    printer.out
}

pub fn print_canonical(unit: &CompilationUnit) -> String {
    print_unit(unit, PrintMode::Canonical)
}

/// Renders one statement the way it would appear in canonical output,
/// without surrounding indentation. Used for statement fingerprints.
pub fn stmt_text(stmt: &Stmt) -> String {
    let mut printer = Printer { mode: PrintMode::Canonical, indent: 0, out: String::new() };
    printer.stmt(stmt);
    printer.out.trim_end().to_string()
}

struct Printer {
    mode: PrintMode,
    indent: usize,
    out: String,
}

impl Printer {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
    }

    fn unit(&mut self, unit: &CompilationUnit) {
        for (i, class) in unit.classes.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.class(class);
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        self.doc(&class.doc);
        self.write_indent();
        self.modifiers(&class.modifiers);
        self.write("class ");
        self.write(&class.name);
        self.write(" {");
        self.newline();
        self.indent += 1;
        for (i, member) in class.members.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            match member {
                Member::Field(field) => self.field(field),
                Member::Method(method) => self.method(method),
            }
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
        self.newline();
    }

    fn field(&mut self, field: &FieldDecl) {
        self.doc(&field.doc);
        self.write_indent();
        self.modifiers(&field.modifiers);
        self.write(&field.type_name.render());
        self.write(" ");
        self.declarators(&field.decls);
        self.write(";");
        self.newline();
    }

    fn method(&mut self, method: &MethodDecl) {
        self.doc(&method.doc);
        self.write_indent();
        self.modifiers(&method.modifiers);
        if !method.is_ctor {
            self.write(&method.return_type.render());
            self.write(" ");
        }
        self.write(&method.name);
        self.write("(");
        for (i, param) in method.params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.modifiers(&param.modifiers);
            self.write(&param.type_name.render());
            self.write(" ");
            self.write(&param.name);
        }
        self.write(")");
        if !method.throws.is_empty() {
            self.write(" throws ");
            self.write(&method.throws.join(", "));
        }
        match &method.body {
            Some(body) => {
                self.write(" {");
                self.newline();
                self.indent += 1;
                for stmt in &body.stmts {
                    self.stmt_line(stmt);
                }
                self.indent -= 1;
                self.write_indent();
                self.write("}");
                self.newline();
            }
            None => {
                self.write(";");
                self.newline();
            }
        }
    }

    fn doc(&mut self, doc: &Option<String>) {
        if self.mode != PrintMode::Documented {
            return;
        }
        let Some(text) = doc else { return };
        for (i, line) in text.lines().enumerate() {
            self.write_indent();
            let trimmed = line.trim();
            if i > 0 && trimmed.starts_with('*') {
                self.write(" ");
            }
            self.write(trimmed);
            self.newline();
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) {
        for modifier in modifiers {
            self.write(modifier.keyword());
            self.write(" ");
        }
    }

    fn stmt_line(&mut self, stmt: &Stmt) {
        self.write_indent();
        self.stmt(stmt);
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { is_final, type_name, decls } => {
                if *is_final {
                    self.write("final ");
                }
                self.write(&type_name.render());
                self.write(" ");
                self.declarators(decls);
                self.write(";");
                self.newline();
            }
            StmtKind::Expr(expr) => {
                self.expr(expr, 0);
                self.write(";");
                self.newline();
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.write("if (");
                self.expr(cond, 0);
                self.write(") {");
                self.newline();
                self.branch(then_branch);
                self.write_indent();
                self.write("}");
                if let Some(branch) = else_branch {
                    self.write(" else {");
                    self.newline();
                    self.branch(branch);
                    self.write_indent();
                    self.write("}");
                }
                self.newline();
            }
            StmtKind::While { cond, body } => {
                self.write("while (");
                self.expr(cond, 0);
                self.write(") {");
                self.newline();
                self.branch(body);
                self.write_indent();
                self.write("}");
                self.newline();
            }
            StmtKind::For { init, cond, update, body } => {
                self.write("for (");
                match init {
                    Some(ForInit::Decl { is_final, type_name, decls }) => {
                        if *is_final {
                            self.write("final ");
                        }
                        self.write(&type_name.render());
                        self.write(" ");
                        self.declarators(decls);
                    }
                    Some(ForInit::Exprs(exprs)) => self.expr_list(exprs),
                    None => {}
                }
                self.write(";");
                if let Some(cond) = cond {
                    self.write(" ");
                    self.expr(cond, 0);
                }
                self.write(";");
                if !update.is_empty() {
                    self.write(" ");
                    self.expr_list(update);
                }
                self.write(") {");
                self.newline();
                self.branch(body);
                self.write_indent();
                self.write("}");
                self.newline();
            }
            StmtKind::Return(value) => {
                self.write("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, 0);
                }
                self.write(";");
                self.newline();
            }
            StmtKind::Throw(value) => {
                self.write("throw ");
                self.expr(value, 0);
                self.write(";");
                self.newline();
            }
            StmtKind::Break => {
                self.write("break;");
                self.newline();
            }
            StmtKind::Continue => {
                self.write("continue;");
                self.newline();
            }
            StmtKind::Block(inner) => {
                self.write("{");
                self.newline();
                self.indent += 1;
                for stmt in &inner.stmts {
                    self.stmt_line(stmt);
                }
                self.indent -= 1;
                self.write_indent();
                self.write("}");
                self.newline();
            }
            StmtKind::Empty => {
                self.write(";");
                self.newline();
            }
        }
    }

    /// Branch bodies always print inside braces, whether or not the tree
    /// was canonicalized.
    fn branch(&mut self, branch: &Stmt) {
        self.indent += 1;
        match &branch.kind {
            StmtKind::Block(inner) => {
                for stmt in &inner.stmts {
                    self.stmt_line(stmt);
                }
            }
            _ => self.stmt_line(branch),
        }
        self.indent -= 1;
    }

    fn declarators(&mut self, decls: &[Declarator]) {
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&decl.name);
            if let Some(init) = &decl.init {
                self.write(" = ");
                self.expr(init, 0);
            }
        }
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(expr, 0);
        }
    }

    /// Precedence-directed rendering; parentheses appear exactly where the
    /// tree shape requires them.
    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let prec = expr_prec(expr);
        let parens = prec < min_prec;
        if parens {
            self.write("(");
        }
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Name(name) => self.write(name),
            ExprKind::Unary { op, operand } => {
                self.write(op.symbol());
                // avoid `--x` when negating a negation
                let glued = matches!(
                    (op, &operand.kind),
                    (UnaryOp::Neg, ExprKind::Unary { op: UnaryOp::Neg | UnaryOp::PreDec, .. })
                );
                if glued {
                    self.write("(");
                    self.expr(operand, 0);
                    self.write(")");
                } else {
                    self.expr(operand, UNARY_PREC);
                }
            }
            ExprKind::Postfix { op, operand } => {
                self.expr(operand, POSTFIX_PREC);
                self.write(op.symbol());
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left, op.precedence());
                self.write(" ");
                self.write(op.symbol());
                self.write(" ");
                self.expr(right, op.precedence() + 1);
            }
            ExprKind::Assign { op, target, value } => {
                self.expr(target, POSTFIX_PREC);
                self.write(" ");
                self.write(op.symbol());
                self.write(" ");
                self.expr(value, ASSIGN_PREC);
            }
            ExprKind::Call { receiver, name, args } => {
                if let Some(receiver) = receiver {
                    self.expr(receiver, POSTFIX_PREC);
                    self.write(".");
                }
                self.write(name);
                self.write("(");
                self.expr_list(args);
                self.write(")");
            }
            ExprKind::FieldAccess { target, name } => {
                self.expr(target, POSTFIX_PREC);
                self.write(".");
                self.write(name);
            }
            ExprKind::Index { target, index } => {
                self.expr(target, POSTFIX_PREC);
                self.write("[");
                self.expr(index, 0);
                self.write("]");
            }
            ExprKind::New { type_name, args } => {
                self.write("new ");
                self.write(&type_name.render());
                self.write("(");
                self.expr_list(args);
                self.write(")");
            }
            ExprKind::NewArray { elem, len } => {
                self.write("new ");
                self.write(&elem.name);
                self.write("[");
                self.expr(len, 0);
                self.write("]");
                for _ in 1..elem.dims.max(1) {
                    self.write("[]");
                }
            }
        }
        if parens {
            self.write(")");
        }
    }

    fn literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(value) => self.write(&value.to_string()),
            Literal::Long(value) => {
                self.write(&value.to_string());
                self.write("L");
            }
            Literal::Float(digits) => self.write(digits),
            Literal::Bool(value) => self.write(if *value { "true" } else { "false" }),
            Literal::Char(ch) => {
                self.write("'");
                let mut buf = String::new();
                escape_into(*ch, &mut buf, '\'');
                self.write(&buf);
                self.write("'");
            }
            Literal::Str(text) => {
                self.write("\"");
                let mut buf = String::new();
                for ch in text.chars() {
                    escape_into(ch, &mut buf, '"');
                }
                self.write(&buf);
                self.write("\"");
            }
            Literal::Null => self.write("null"),
        }
    }
}

const ASSIGN_PREC: u8 = 1;
const UNARY_PREC: u8 = 8;
const POSTFIX_PREC: u8 = 9;

fn expr_prec(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Assign { .. } => ASSIGN_PREC,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Unary { .. } => UNARY_PREC,
        _ => POSTFIX_PREC,
    }
}

fn escape_into(ch: char, buf: &mut String, quote: char) {
    match ch {
        '\n' => buf.push_str("\\n"),
        '\t' => buf.push_str("\\t"),
        '\r' => buf.push_str("\\r"),
        '\\' => buf.push_str("\\\\"),
        c if c == quote => {
            buf.push('\\');
            buf.push(c);
        }
        c => buf.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::canonicalize;
    use crate::config::CompareConfig;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> CompilationUnit {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens)
            .parse_unit(source.to_string(), "Test.java".to_string())
            .unwrap()
    }

    fn canonical(source: &str) -> String {
        let mut unit = parse(source);
        let _ = canonicalize(&mut unit, &CompareConfig::default());
        print_canonical(&unit)
    }

    #[test]
    fn layout_is_normalized() {
        let mangled = "class C{int m(int x){if(x>0)\n\n\n  return x;return 0;}}";
        let expected = "\
class C {
    int m(int v0) {
        if (v0 > 0) {
            return v0;
        }
        return 0;
    }
}
";
        assert_eq!(canonical(mangled), expected);
    }

    #[test]
    fn same_tree_different_layout_prints_identically() {
        let a = "class C { int m(int x) { int y = x * 2; return y; } }";
        let b = "class C {\n  int m(int q)\n  {\n    int r = (q * 2);\n    return r;\n  }\n}";
        assert_eq!(canonical(a), canonical(b));
    }

    #[test]
    fn redundant_parens_do_not_survive() {
        let printed = canonical("class C { int m(int a, int b) { return ((a) + (b)); } }");
        assert!(printed.contains("return v0 + v1;"));
    }

    #[test]
    fn required_parens_are_reconstructed() {
        let printed = canonical("class C { int m(int a, int b, int c) { return (a + b) * c; } }");
        assert!(printed.contains("return (v0 + v1) * v2;"));
    }

    #[test]
    fn left_associativity_needs_no_parens() {
        let printed = canonical("class C { int m(int a, int b, int c) { return a - b - c; } }");
        assert!(printed.contains("return v0 - v1 - v2;"));
    }

    #[test]
    fn right_nested_subtraction_keeps_parens() {
        let printed = canonical("class C { int m(int a, int b, int c) { return a - (b - c); } }");
        assert!(printed.contains("return v0 - (v1 - v2);"));
    }

    #[test]
    fn canonical_mode_drops_comments() {
        let printed = canonical(
            "class C { /** Returns zero. */ int m() { // inline\n return 0; } }",
        );
        assert!(!printed.contains("Returns zero"));
        assert!(!printed.contains("inline"));
    }

    #[test]
    fn documented_mode_keeps_doc_comments() {
        let unit = parse("class C { /** Returns zero. */ int m() { return 0; } }");
        let printed = print_unit(&unit, PrintMode::Documented);
        assert!(printed.contains("/** Returns zero. */"));
    }

    #[test]
    fn for_header_renders_all_sections() {
        let printed = canonical(
            "class C { int m(int n) { int s = 0; for (int i = 0; i < n; i++) { s = s + i; } return s; } }",
        );
        assert!(printed.contains("for (int v2 = 0; v2 < v0; v2++) {"));
    }

    #[test]
    fn infinite_for_renders_bare_semicolons() {
        let printed = canonical("class C { void m() { for (;;) { break; } } }");
        assert!(printed.contains("for (;;) {"));
    }

    #[test]
    fn members_are_separated_by_blank_lines() {
        let printed = canonical("class C { int a; int b; void m() { } }");
        let expected = "\
class C {
    int a;

    int b;

    void m() {
    }
}
";
        assert_eq!(printed, expected);
    }

    #[test]
    fn long_literal_prints_with_suffix() {
        let printed = canonical("class C { void m() { long a = 5; } }");
        assert!(printed.contains("long v0 = 5L;"));
    }

    #[test]
    fn string_escapes_round_trip() {
        let printed = canonical("class C { void m() { String s = \"a\\n\\\"b\\\"\"; } }");
        assert!(printed.contains("String v0 = \"a\\n\\\"b\\\"\";"));
    }

    #[test]
    fn no_trailing_whitespace_on_any_line() {
        let printed = canonical(
            "class C { int m(int n) { for (int i = 0; ; i++) { if (i > n) { break; } } return n; } }",
        );
        for line in printed.lines() {
            assert_eq!(line, line.trim_end());
        }
    }
}
