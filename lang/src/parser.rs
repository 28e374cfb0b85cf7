// lang/src/parser.rs
use crate::ast::*;
use crate::lexer::{Token, TokenKind, Trivia};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Genuine grammar violation in the submission.
    Syntax,
    /// Valid Java the grammar does not model (generics, switch, ...).
    /// Kept distinct so grammar gaps are diagnosable apart from student
    /// mistakes.
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    fn syntax(span: Span, message: String) -> Self {
        Self { span, kind: ParseErrorKind::Syntax, message }
    }
    fn unsupported(span: Span, message: String) -> Self {
        Self { span, kind: ParseErrorKind::Unsupported, message }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self.kind {
            ParseErrorKind::Syntax => "parse error",
            ParseErrorKind::Unsupported => "unsupported construct",
        };
        write!(f, "{} at {}..{}: {}", tag, self.span.start, self.span.end, self.message)
    }
}
impl std::error::Error for ParseError {}

/// All errors collected during one parse. Any entry means the file is
/// refused for comparison (`Verdict::Unparseable`); no partial tree is
/// handed downstream.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
impl std::error::Error for ParseFailure {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nid: u64,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, nid: 1, errors: Vec::new() }
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.nid;
        self.nid += 1;
        id
    }

    pub fn parse_unit(
        &mut self,
        source: String,
        file_path: String,
    ) -> Result<CompilationUnit, ParseFailure> {
        let mut classes = Vec::new();
        while !self.is_at_end() {
            match self.parse_class() {
                Ok(class) => classes.push(class),
                Err(err) => {
                    self.errors.push(err);
                    self.recover_to_class();
                }
            }
        }
        if !self.errors.is_empty() {
            return Err(ParseFailure { errors: std::mem::take(&mut self.errors) });
        }
        Ok(CompilationUnit {
            id: self.next_id(),
            classes,
            origin: OriginMap { file_path, source },
        })
    }

    fn parse_class(&mut self) -> Result<ClassDecl, ParseError> {
        let start = self.current_span();
        let doc = doc_comment(self.current());
        let modifiers = self.parse_modifiers();
        self.expect(&TokenKind::KwClass, "'class'")?;
        let name = self.expect_ident("class name")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_member(&name) {
                Ok(member) => members.push(member),
                Err(err) => {
                    self.errors.push(err);
                    self.recover_member();
                }
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(ClassDecl {
            id: self.next_id(),
            span: start.merge(&self.previous_span()),
            doc,
            modifiers,
            name,
            members,
        })
    }

    fn parse_member(&mut self, class_name: &str) -> Result<Member, ParseError> {
        let start = self.current_span();
        let doc = doc_comment(self.current());
        let modifiers = self.parse_modifiers();
        if let TokenKind::KwUnsupported(word) = &self.current().kind {
            return Err(ParseError::unsupported(
                self.current_span(),
                format!("'{word}' members are not modeled by the grammar"),
            ));
        }
        if self.check(&TokenKind::KwClass) {
            return Err(ParseError::unsupported(
                self.current_span(),
                "nested classes are not modeled by the grammar".to_string(),
            ));
        }
        // constructor: the class name followed directly by '('
        if let TokenKind::Ident(name) = &self.current().kind {
            if name == class_name && self.peek_kind(1) == Some(&TokenKind::LParen) {
                let name = name.clone();
                self.advance();
                return Ok(Member::Method(self.finish_method(
                    start,
                    doc,
                    modifiers,
                    TypeName::simple("void"),
                    name,
                    true,
                )?));
            }
        }
        let type_name = self.parse_type()?;
        let name = self.expect_ident("member name")?;
        if self.check(&TokenKind::LParen) {
            Ok(Member::Method(self.finish_method(start, doc, modifiers, type_name, name, false)?))
        } else {
            let decls = self.parse_declarators(name)?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            Ok(Member::Field(FieldDecl {
                id: self.next_id(),
                span: start.merge(&self.previous_span()),
                doc,
                modifiers,
                type_name,
                decls,
            }))
        }
    }

    fn finish_method(
        &mut self,
        start: Span,
        doc: Option<String>,
        modifiers: Vec<Modifier>,
        return_type: TypeName,
        name: String,
        is_ctor: bool,
    ) -> Result<MethodDecl, ParseError> {
        let params = self.parse_params()?;
        let mut throws = Vec::new();
        if self.check(&TokenKind::KwThrows) {
            self.advance();
            throws.push(self.expect_ident("exception type")?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                throws.push(self.expect_ident("exception type")?);
            }
        }
        let body = if self.check(&TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            Some(self.parse_block()?)
        };
        Ok(MethodDecl {
            id: self.next_id(),
            span: start.merge(&self.previous_span()),
            doc,
            modifiers,
            return_type,
            name,
            params,
            throws,
            body,
            is_ctor,
            unreachable: false,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let start = self.current_span();
            let mut modifiers = Vec::new();
            if self.check(&TokenKind::KwFinal) {
                self.advance();
                modifiers.push(Modifier::Final);
            }
            let type_name = self.parse_type()?;
            let name = self.expect_ident("parameter name")?;
            params.push(Param {
                id: self.next_id(),
                span: start.merge(&self.previous_span()),
                modifiers,
                type_name,
                name,
            });
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma, "','")?;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(params)
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.current().kind {
                TokenKind::KwPublic => Modifier::Public,
                TokenKind::KwPrivate => Modifier::Private,
                TokenKind::KwProtected => Modifier::Protected,
                TokenKind::KwStatic => Modifier::Static,
                TokenKind::KwFinal => Modifier::Final,
                TokenKind::KwAbstract => Modifier::Abstract,
                _ => return modifiers,
            };
            modifiers.push(modifier);
            self.advance();
        }
    }

    fn parse_type(&mut self) -> Result<TypeName, ParseError> {
        let name = match &self.current().kind {
            TokenKind::KwVoid => {
                self.advance();
                return Ok(TypeName::simple("void"));
            }
            TokenKind::Ident(name) => name.clone(),
            other => {
                return Err(ParseError::syntax(
                    self.current_span(),
                    format!("expected type name, found {}", describe(other)),
                ));
            }
        };
        self.advance();
        if self.check(&TokenKind::Lt) {
            return Err(ParseError::unsupported(
                self.current_span(),
                format!("generic type '{name}<...>' is not modeled by the grammar"),
            ));
        }
        let mut dims = 0u8;
        while self.check(&TokenKind::LBracket) && self.peek_kind(1) == Some(&TokenKind::RBracket) {
            self.advance();
            self.advance();
            dims += 1;
        }
        Ok(TypeName { name, dims })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize_stmt();
                }
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Block {
            id: self.next_id(),
            span: start.merge(&self.previous_span()),
            stmts,
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        match &self.current().kind {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Ok(self.stmt(start, StmtKind::Block(block)))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.stmt(start, StmtKind::Empty))
            }
            TokenKind::KwIf => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                let then_branch = Box::new(self.parse_stmt()?);
                let else_branch = if self.check(&TokenKind::KwElse) {
                    self.advance();
                    Some(Box::new(self.parse_stmt()?))
                } else {
                    None
                };
                Ok(self.stmt(start, StmtKind::If { cond, then_branch, else_branch }))
            }
            TokenKind::KwWhile => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmt()?);
                Ok(self.stmt(start, StmtKind::While { cond, body }))
            }
            TokenKind::KwFor => {
                self.advance();
                self.expect(&TokenKind::LParen, "'('")?;
                let init = if self.check(&TokenKind::Semicolon) {
                    None
                } else if self.check(&TokenKind::KwFinal) || self.is_local_decl_start() {
                    let is_final = if self.check(&TokenKind::KwFinal) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    let type_name = self.parse_type()?;
                    let first = self.expect_ident("variable name")?;
                    let decls = self.parse_declarators(first)?;
                    Some(ForInit::Decl { is_final, type_name, decls })
                } else {
                    let mut exprs = vec![self.parse_expr()?];
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        exprs.push(self.parse_expr()?);
                    }
                    Some(ForInit::Exprs(exprs))
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                let cond = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                let mut update = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    update.push(self.parse_expr()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        update.push(self.parse_expr()?);
                    }
                }
                self.expect(&TokenKind::RParen, "')'")?;
                let body = Box::new(self.parse_stmt()?);
                Ok(self.stmt(start, StmtKind::For { init, cond, update, body }))
            }
            TokenKind::KwReturn => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(self.stmt(start, StmtKind::Return(value)))
            }
            TokenKind::KwThrow => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(self.stmt(start, StmtKind::Throw(value)))
            }
            TokenKind::KwBreak => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(self.stmt(start, StmtKind::Break))
            }
            TokenKind::KwContinue => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(self.stmt(start, StmtKind::Continue))
            }
            TokenKind::KwUnsupported(word) => Err(ParseError::unsupported(
                start,
                format!("'{word}' statements are not modeled by the grammar"),
            )),
            TokenKind::KwFinal => {
                self.advance();
                self.parse_var_decl_stmt(start, true)
            }
            TokenKind::Ident(_) if self.is_local_decl_start() => {
                self.parse_var_decl_stmt(start, false)
            }
            TokenKind::Ident(name) if self.looks_like_generic_type() => {
                Err(ParseError::unsupported(
                    start,
                    format!("generic type '{name}<...>' is not modeled by the grammar"),
                ))
            }
            TokenKind::Ident(_) if self.peek_kind(1) == Some(&TokenKind::Colon) => {
                Err(ParseError::unsupported(
                    start,
                    "labeled statements are not modeled by the grammar".to_string(),
                ))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(self.stmt(start, StmtKind::Expr(expr)))
            }
        }
    }

    fn parse_var_decl_stmt(&mut self, start: Span, is_final: bool) -> Result<Stmt, ParseError> {
        let type_name = self.parse_type()?;
        let first = self.expect_ident("variable name")?;
        let decls = self.parse_declarators(first)?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(self.stmt(start, StmtKind::VarDecl { is_final, type_name, decls }))
    }

    /// `first` has already been consumed; parses `[= init] (, name [= init])*`.
    fn parse_declarators(&mut self, first: String) -> Result<Vec<Declarator>, ParseError> {
        let mut decls = Vec::new();
        let mut name = first;
        let mut start = self.previous_span();
        loop {
            let init = if self.check(&TokenKind::Assign) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            decls.push(Declarator {
                id: self.next_id(),
                span: start.merge(&self.previous_span()),
                name,
                init,
            });
            if !self.check(&TokenKind::Comma) {
                return Ok(decls);
            }
            self.advance();
            start = self.current_span();
            name = self.expect_ident("variable name")?;
        }
    }

    // ── expressions: precedence climbing ────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_or()?;
        if self.check(&TokenKind::Question) {
            return Err(ParseError::unsupported(
                self.current_span(),
                "the ternary conditional operator is not modeled by the grammar".to_string(),
            ));
        }
        let op = match self.current().kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::AddAssign,
            TokenKind::MinusAssign => AssignOp::SubAssign,
            TokenKind::StarAssign => AssignOp::MulAssign,
            TokenKind::SlashAssign => AssignOp::DivAssign,
            TokenKind::PercentAssign => AssignOp::RemAssign,
            _ => return Ok(left),
        };
        if !matches!(
            left.kind,
            ExprKind::Name(_) | ExprKind::FieldAccess { .. } | ExprKind::Index { .. }
        ) {
            return Err(ParseError::syntax(left.span, "invalid assignment target".to_string()));
        }
        self.advance();
        let value = self.parse_assign()?;
        let span = left.span.merge(&value.span);
        Ok(Expr::new(
            self.next_id(),
            span,
            ExprKind::Assign { op, target: Box::new(left), value: Box::new(value) },
        ))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            self.advance();
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            self.advance();
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_relational()?;
            left = self.binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            TokenKind::Plus => {
                // unary plus is inert; drop it
                self.advance();
                return self.parse_unary();
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(&operand.span);
        Ok(Expr::new(self.next_id(), span, ExprKind::Unary { op, operand: Box::new(operand) }))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_ident("member name")?;
                    if self.check(&TokenKind::LParen) {
                        let args = self.parse_args()?;
                        let span = expr.span.merge(&self.previous_span());
                        expr = Expr::new(
                            self.next_id(),
                            span,
                            ExprKind::Call { receiver: Some(Box::new(expr)), name, args },
                        );
                    } else {
                        let span = expr.span.merge(&self.previous_span());
                        expr = Expr::new(
                            self.next_id(),
                            span,
                            ExprKind::FieldAccess { target: Box::new(expr), name },
                        );
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    let span = expr.span.merge(&self.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        span,
                        ExprKind::Index { target: Box::new(expr), index: Box::new(index) },
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(&TokenKind::PlusPlus) {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    self.advance();
                    let span = expr.span.merge(&self.previous_span());
                    expr = Expr::new(
                        self.next_id(),
                        span,
                        ExprKind::Postfix { op, operand: Box::new(expr) },
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let kind = match self.current().kind.clone() {
            TokenKind::IntLit(v) => { self.advance(); ExprKind::Literal(Literal::Int(v)) }
            TokenKind::LongLit(v) => { self.advance(); ExprKind::Literal(Literal::Long(v)) }
            TokenKind::FloatLit(v) => { self.advance(); ExprKind::Literal(Literal::Float(v)) }
            TokenKind::CharLit(v) => { self.advance(); ExprKind::Literal(Literal::Char(v)) }
            TokenKind::StrLit(v) => { self.advance(); ExprKind::Literal(Literal::Str(v)) }
            TokenKind::KwTrue => { self.advance(); ExprKind::Literal(Literal::Bool(true)) }
            TokenKind::KwFalse => { self.advance(); ExprKind::Literal(Literal::Bool(false)) }
            TokenKind::KwNull => { self.advance(); ExprKind::Literal(Literal::Null) }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    ExprKind::Call { receiver: None, name, args }
                } else {
                    ExprKind::Name(name)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                // grouping is layout, not structure; precedence decides
                // parentheses when printing
                return Ok(inner);
            }
            TokenKind::KwNew => {
                self.advance();
                let type_name = self.parse_type()?;
                if self.check(&TokenKind::LBracket) {
                    self.advance();
                    let len = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    ExprKind::NewArray { elem: type_name, len: Box::new(len) }
                } else {
                    let args = self.parse_args()?;
                    if self.check(&TokenKind::LBrace) {
                        return Err(ParseError::unsupported(
                            self.current_span(),
                            "anonymous classes are not modeled by the grammar".to_string(),
                        ));
                    }
                    ExprKind::New { type_name, args }
                }
            }
            TokenKind::KwUnsupported(word) => {
                return Err(ParseError::unsupported(
                    start,
                    format!("'{word}' expressions are not modeled by the grammar"),
                ));
            }
            other => {
                return Err(ParseError::syntax(
                    start,
                    format!("expected expression, found {}", describe(&other)),
                ));
            }
        };
        let span = start.merge(&self.previous_span());
        Ok(Expr::new(self.next_id(), span, kind))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma, "','")?;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(args)
    }

    // ── lookahead and recovery ──────────────────────────────────────

    /// `Ident ([])* Ident` starting at the current token.
    fn is_local_decl_start(&self) -> bool {
        if !matches!(self.current().kind, TokenKind::Ident(_)) {
            return false;
        }
        let mut k = 1;
        while self.peek_kind(k) == Some(&TokenKind::LBracket)
            && self.peek_kind(k + 1) == Some(&TokenKind::RBracket)
        {
            k += 2;
        }
        matches!(self.peek_kind(k), Some(TokenKind::Ident(_)))
    }

    /// `Ident < Ident (> | , | <)` — a generic type usage, as opposed to a
    /// relational expression chain.
    fn looks_like_generic_type(&self) -> bool {
        matches!(self.current().kind, TokenKind::Ident(_))
            && self.peek_kind(1) == Some(&TokenKind::Lt)
            && matches!(self.peek_kind(2), Some(TokenKind::Ident(_)))
            && matches!(
                self.peek_kind(3),
                Some(TokenKind::Gt) | Some(TokenKind::Comma) | Some(TokenKind::Lt)
            )
    }

    /// Skip to the next statement terminator so one malformed statement
    /// yields one error, not a cascade.
    fn synchronize_stmt(&mut self) {
        while !self.is_at_end() {
            match self.current().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                _ => self.advance(),
            }
        }
    }

    fn recover_member(&mut self) {
        while !self.is_at_end() {
            match self.current().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    self.skip_balanced_braces();
                    return;
                }
                TokenKind::RBrace => return,
                _ => self.advance(),
            }
        }
    }

    fn recover_to_class(&mut self) {
        while !self.is_at_end() && !self.check(&TokenKind::KwClass) {
            self.advance();
        }
    }

    fn skip_balanced_braces(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ── token plumbing ──────────────────────────────────────────────

    fn stmt(&mut self, start: Span, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            span: start.merge(&self.previous_span()),
            unreachable: false,
            kind,
        }
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(&right.span);
        Expr::new(
            self.next_id(),
            span,
            ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
        )
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            self.current_span()
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            return Ok(());
        }
        if let TokenKind::KwUnsupported(word) = &self.current().kind {
            return Err(ParseError::unsupported(
                self.current_span(),
                format!("'{word}' is not modeled by the grammar"),
            ));
        }
        Err(ParseError::syntax(
            self.current_span(),
            format!("expected {what}, found {}", describe(&self.current().kind)),
        ))
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::syntax(
                self.current_span(),
                format!("expected {what}, found {}", describe(other)),
            )),
        }
    }
}

fn doc_comment(token: &Token) -> Option<String> {
    token.trivia.iter().rev().find_map(|t| match t {
        Trivia::Doc(text) | Trivia::Block(text) => Some(text.clone()),
        Trivia::Line(_) => None,
    })
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier '{name}'"),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::KwUnsupported(word) => format!("keyword '{word}'"),
        TokenKind::IntLit(v) => format!("literal '{v}'"),
        TokenKind::LongLit(v) => format!("literal '{v}L'"),
        TokenKind::StrLit(_) => "string literal".to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_ok(source: &str) -> CompilationUnit {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens)
            .parse_unit(source.to_string(), "Test.java".to_string())
            .unwrap()
    }

    fn parse_err(source: &str) -> Vec<ParseError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens)
            .parse_unit(source.to_string(), "Test.java".to_string())
            .unwrap_err()
            .errors
    }

    fn only_method(unit: &CompilationUnit) -> &MethodDecl {
        match &unit.classes[0].members[0] {
            Member::Method(m) => m,
            Member::Field(_) => panic!("method expected"),
        }
    }

    #[test]
    fn parses_fibonacci_reference() {
        let unit = parse_ok(
            r#"
public class Fibonacci {
    public static int fib(final int x) {
        if (x < 0) {
            throw new IllegalArgumentException("x must be greater than or equal zero");
        }
        int a = 0;
        int b = 1;
        for (int i = 0; i < x; i++) {
            int sum = a + b;
            a = b;
            b = sum;
        }
        return a;
    }
}
"#,
        );
        assert_eq!(unit.classes.len(), 1);
        assert_eq!(unit.classes[0].name, "Fibonacci");
        let method = only_method(&unit);
        assert_eq!(method.name, "fib");
        assert_eq!(method.params.len(), 1);
        assert_eq!(method.params[0].modifiers, vec![Modifier::Final]);
        let body = method.body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 5);
        assert!(matches!(body.stmts[0].kind, StmtKind::If { .. }));
        assert!(matches!(body.stmts[3].kind, StmtKind::For { .. }));
        assert!(matches!(body.stmts[4].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn multi_declarator_is_one_statement() {
        let unit = parse_ok("class C { void m() { int a = 0, b = 1; } }");
        let body = only_method(&unit).body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 1);
        match &body.stmts[0].kind {
            StmtKind::VarDecl { decls, .. } => {
                assert_eq!(decls.len(), 2);
                assert_eq!(decls[0].name, "a");
                assert_eq!(decls[1].name, "b");
            }
            other => panic!("var decl expected, got {other:?}"),
        }
    }

    #[test]
    fn infinite_for_parses() {
        let unit = parse_ok("class C { void m() { for (;;) { int a = 0; } } }");
        let body = only_method(&unit).body.as_ref().unwrap();
        match &body.stmts[0].kind {
            StmtKind::For { init, cond, update, .. } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(update.is_empty());
            }
            other => panic!("for expected, got {other:?}"),
        }
    }

    #[test]
    fn single_statement_branch_parses() {
        let unit = parse_ok("class C { int m(int x) { if (x < 0) throw new E(); return x; } }");
        let body = only_method(&unit).body.as_ref().unwrap();
        match &body.stmts[0].kind {
            StmtKind::If { then_branch, else_branch, .. } => {
                assert!(matches!(then_branch.kind, StmtKind::Throw(_)));
                assert!(else_branch.is_none());
            }
            other => panic!("if expected, got {other:?}"),
        }
    }

    #[test]
    fn throws_clause_is_recorded() {
        let unit = parse_ok("class C { void m() throws IOException, FooException { } }");
        let method = only_method(&unit);
        assert_eq!(method.throws, vec!["IOException".to_string(), "FooException".to_string()]);
    }

    #[test]
    fn constructor_parses() {
        let unit = parse_ok("class C { private int x; C(int x) { this.x = x; } }");
        match &unit.classes[0].members[1] {
            Member::Method(m) => {
                assert!(m.is_ctor);
                assert_eq!(m.name, "C");
            }
            Member::Field(_) => panic!("ctor expected"),
        }
    }

    #[test]
    fn expression_precedence() {
        let unit = parse_ok("class C { int m() { return 1 + 2 * 3; } }");
        let body = only_method(&unit).body.as_ref().unwrap();
        let StmtKind::Return(Some(expr)) = &body.stmts[0].kind else {
            panic!("return expected");
        };
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("binary expected");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn collects_multiple_errors() {
        let errors = parse_err("class C { void m() { int a = ; int b = ; } }");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ParseErrorKind::Syntax));
    }

    #[test]
    fn switch_is_unsupported_not_syntax() {
        let errors = parse_err("class C { void m(int x) { switch (x) { } } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported));
    }

    #[test]
    fn generics_are_unsupported() {
        let errors = parse_err("class C { void m() { List<Integer> xs = null; } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported
            && e.message.contains("generic")));
    }

    #[test]
    fn ternary_is_unsupported() {
        let errors = parse_err("class C { int m(int x) { return x < 0 ? 0 : x; } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported));
    }

    #[test]
    fn lambda_is_unsupported() {
        let errors = parse_err("class C { void m() { run(x -> x + 1); } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported
            && e.message.contains("->")));
    }

    #[test]
    fn labeled_statement_is_unsupported() {
        let errors = parse_err("class C { void m() { outer: while (true) { break; } } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported
            && e.message.contains("labeled")));
    }

    #[test]
    fn anonymous_class_is_unsupported() {
        let errors = parse_err("class C { void m() { run(new Runnable() { }); } }");
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Unsupported
            && e.message.contains("anonymous")));
    }

    #[test]
    fn invalid_assignment_target() {
        let errors = parse_err("class C { void m() { 1 + 2 = 3; } }");
        assert!(errors.iter().any(|e| e.message.contains("invalid assignment target")));
    }

    #[test]
    fn doc_comment_attaches_to_method() {
        let unit = parse_ok("class C { /** adds one */ int m(int x) { return x + 1; } }");
        let method = only_method(&unit);
        assert_eq!(method.doc.as_deref(), Some("/** adds one */"));
    }

    #[test]
    fn error_names_expected_and_found() {
        let errors = parse_err("class C { void m() { if x) { } } }");
        assert!(errors[0].message.contains("expected '('"));
    }
}
