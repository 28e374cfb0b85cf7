// lang/src/lexer.rs
use crate::ast::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    IntLit(i64),
    LongLit(i64),
    FloatLit(String),
    CharLit(char),
    StrLit(String),
    KwClass, KwPublic, KwPrivate, KwProtected, KwStatic, KwFinal, KwAbstract,
    KwVoid, KwIf, KwElse, KwFor, KwWhile, KwReturn, KwThrow, KwThrows, KwNew,
    KwBreak, KwContinue, KwTrue, KwFalse, KwNull,
    /// Java keyword the grammar does not model (switch, try, enum, ...).
    /// Lexed as its own kind so the parser can report `Unsupported`
    /// instead of a plain syntax error.
    KwUnsupported(String),
    LParen, RParen, LBrace, RBrace, LBracket, RBracket,
    Semicolon, Comma, Dot, Question, Colon,
    Plus, Minus, Star, Slash, Percent,
    Assign, PlusAssign, MinusAssign, StarAssign, SlashAssign, PercentAssign,
    EqEq, NotEq, Lt, Gt, LtEq, GtEq, AndAnd, OrOr, Bang,
    PlusPlus, MinusMinus,
    Eof,
}

/// Comment trivia collected between tokens and attached to the token that
/// follows it. Canonical printing discards it; documented printing keeps
/// `Doc` entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Trivia {
    Line(String),
    Block(String),
    Doc(String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub raw: String,
    pub trivia: Vec<Trivia>,
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Produces the full token vector; re-tokenizing the same source is
    /// always possible and yields the same result.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let trivia = self.skip_trivia()?;
            if self.is_eof() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.pos, self.pos),
                    raw: String::new(),
                    trivia,
                });
                return Ok(tokens);
            }
            let mut token = self.next_token()?;
            token.trivia = trivia;
            tokens.push(token);
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let ch = self
            .peek_char()
            .ok_or_else(|| LexError::new(Span::new(self.pos, self.pos), "unexpected end of input"))?;
        let kind = match ch {
            '0'..='9' => return self.read_number(),
            '"' => return self.read_string(),
            '\'' => return self.read_char(),
            'a'..='z' | 'A'..='Z' | '_' | '$' => return self.read_word(),
            '(' => { self.advance(); TokenKind::LParen }
            ')' => { self.advance(); TokenKind::RParen }
            '{' => { self.advance(); TokenKind::LBrace }
            '}' => { self.advance(); TokenKind::RBrace }
            '[' => { self.advance(); TokenKind::LBracket }
            ']' => { self.advance(); TokenKind::RBracket }
            ';' => { self.advance(); TokenKind::Semicolon }
            ',' => { self.advance(); TokenKind::Comma }
            '.' => { self.advance(); TokenKind::Dot }
            '?' => { self.advance(); TokenKind::Question }
            ':' => { self.advance(); TokenKind::Colon }
            '+' => {
                self.advance();
                match self.peek_char() {
                    Some('+') => { self.advance(); TokenKind::PlusPlus }
                    Some('=') => { self.advance(); TokenKind::PlusAssign }
                    _ => TokenKind::Plus,
                }
            }
            '-' => {
                self.advance();
                match self.peek_char() {
                    Some('-') => { self.advance(); TokenKind::MinusMinus }
                    Some('=') => { self.advance(); TokenKind::MinusAssign }
                    // lambda arrow, surfaced as an unsupported construct
                    Some('>') => { self.advance(); TokenKind::KwUnsupported("->".to_string()) }
                    _ => TokenKind::Minus,
                }
            }
            '*' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::StarAssign } else { TokenKind::Star }
            }
            '/' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::SlashAssign } else { TokenKind::Slash }
            }
            '%' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::PercentAssign } else { TokenKind::Percent }
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::EqEq } else { TokenKind::Assign }
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::NotEq } else { TokenKind::Bang }
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::LtEq } else { TokenKind::Lt }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') { self.advance(); TokenKind::GtEq } else { TokenKind::Gt }
            }
            '&' => {
                self.advance();
                if self.peek_char() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    return Err(LexError::new(
                        Span::new(start, self.pos),
                        "bitwise '&' is not modeled; expected '&&'",
                    ));
                }
            }
            '|' => {
                self.advance();
                if self.peek_char() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    return Err(LexError::new(
                        Span::new(start, self.pos),
                        "bitwise '|' is not modeled; expected '||'",
                    ));
                }
            }
            _ => {
                self.advance();
                return Err(LexError::new(
                    Span::new(start, self.pos),
                    &format!("illegal character '{ch}'"),
                ));
            }
        };
        Ok(self.token(kind, start))
    }

    fn read_word(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "class" => TokenKind::KwClass,
            "public" => TokenKind::KwPublic,
            "private" => TokenKind::KwPrivate,
            "protected" => TokenKind::KwProtected,
            "static" => TokenKind::KwStatic,
            "final" => TokenKind::KwFinal,
            "abstract" => TokenKind::KwAbstract,
            "void" => TokenKind::KwVoid,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "for" => TokenKind::KwFor,
            "while" => TokenKind::KwWhile,
            "return" => TokenKind::KwReturn,
            "throw" => TokenKind::KwThrow,
            "throws" => TokenKind::KwThrows,
            "new" => TokenKind::KwNew,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            "null" => TokenKind::KwNull,
            "switch" | "case" | "default" | "do" | "try" | "catch" | "finally"
            | "interface" | "enum" | "import" | "package" | "extends" | "implements"
            | "instanceof" | "synchronized" | "assert" | "goto" | "strictfp"
            | "native" | "transient" | "volatile" => TokenKind::KwUnsupported(text.to_string()),
            _ => TokenKind::Ident(text.to_string()),
        };
        Ok(self.token(kind, start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        // hex: 0x.. / 0X..
        if self.peek_char() == Some('0') && matches!(self.peek_ahead(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            let digits_start = self.pos;
            while let Some(ch) = self.peek_char() {
                if ch.is_ascii_hexdigit() { self.advance(); } else { break; }
            }
            if self.pos == digits_start {
                return Err(LexError::new(Span::new(start, self.pos), "malformed hex literal"));
            }
            let value = i64::from_str_radix(&self.source[digits_start..self.pos], 16)
                .map_err(|_| LexError::new(Span::new(start, self.pos), "hex literal out of range"))?;
            let kind = if matches!(self.peek_char(), Some('l') | Some('L')) {
                self.advance();
                TokenKind::LongLit(value)
            } else {
                TokenKind::IntLit(value)
            };
            return Ok(self.token(kind, start));
        }
        let mut is_float = false;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && self.peek_ahead(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }
        let digits = self.source[start..self.pos].to_string();
        let kind = match self.peek_char() {
            Some('l') | Some('L') if !is_float => {
                self.advance();
                let value = digits
                    .parse()
                    .map_err(|_| LexError::new(Span::new(start, self.pos), "long literal out of range"))?;
                TokenKind::LongLit(value)
            }
            Some('f') | Some('F') | Some('d') | Some('D') => {
                self.advance();
                TokenKind::FloatLit(digits)
            }
            _ if is_float => TokenKind::FloatLit(digits),
            _ => {
                let value = digits
                    .parse()
                    .map_err(|_| LexError::new(Span::new(start, self.pos), "int literal out of range"))?;
                TokenKind::IntLit(value)
            }
        };
        Ok(self.token(kind, start))
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(LexError::new(Span::new(start, self.pos), "unterminated string literal"));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    value.push(self.read_escape(start)?);
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
        Ok(self.token(TokenKind::StrLit(value), start))
    }

    fn read_char(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.advance();
        let value = match self.peek_char() {
            None | Some('\n') | Some('\'') => {
                return Err(LexError::new(Span::new(start, self.pos), "malformed char literal"));
            }
            Some('\\') => {
                self.advance();
                self.read_escape(start)?
            }
            Some(ch) => {
                self.advance();
                ch
            }
        };
        if self.peek_char() != Some('\'') {
            return Err(LexError::new(Span::new(start, self.pos), "unterminated char literal"));
        }
        self.advance();
        Ok(self.token(TokenKind::CharLit(value), start))
    }

    fn read_escape(&mut self, start: usize) -> Result<char, LexError> {
        let ch = match self.peek_char() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('\\') => '\\',
            _ => {
                return Err(LexError::new(Span::new(start, self.pos), "unknown escape sequence"));
            }
        };
        self.advance();
        Ok(ch)
    }

    /// Skips whitespace; collects comments in order of appearance so they
    /// can ride on the following token.
    fn skip_trivia(&mut self) -> Result<Vec<Trivia>, LexError> {
        let mut trivia = Vec::new();
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    let start = self.pos;
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    trivia.push(Trivia::Line(self.source[start..self.pos].to_string()));
                }
                Some('/') if self.peek_ahead(1) == Some('*') => {
                    let start = self.pos;
                    self.advance();
                    self.advance();
                    let is_doc = self.peek_char() == Some('*') && self.peek_ahead(1) != Some('/');
                    loop {
                        match self.peek_char() {
                            None => {
                                return Err(LexError::new(
                                    Span::new(start, self.pos),
                                    "unterminated block comment",
                                ));
                            }
                            Some('*') if self.peek_ahead(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                    let text = self.source[start..self.pos].to_string();
                    trivia.push(if is_doc { Trivia::Doc(text) } else { Trivia::Block(text) });
                }
                _ => return Ok(trivia),
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
            raw: self.source[start..self.pos].to_string(),
            trivia: Vec::new(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }
    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}
impl LexError {
    fn new(span: Span, message: &str) -> Self {
        Self {
            span,
            message: message.to_string(),
        }
    }
}
impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "lex error at {}..{}: {}", self.span.start, self.span.end, self.message)
    }
}
impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_declaration() {
        let k = kinds("int a = 0;");
        assert_eq!(
            k,
            vec![
                TokenKind::Ident("int".into()),
                TokenKind::Ident("a".into()),
                TokenKind::Assign,
                TokenKind::IntLit(0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn long_suffix_and_hex() {
        assert_eq!(kinds("0L")[0], TokenKind::LongLit(0));
        assert_eq!(kinds("42l")[0], TokenKind::LongLit(42));
        assert_eq!(kinds("0x1F")[0], TokenKind::IntLit(31));
        assert_eq!(kinds("1.5")[0], TokenKind::FloatLit("1.5".into()));
        assert_eq!(kinds("1.5f")[0], TokenKind::FloatLit("1.5".into()));
    }

    #[test]
    fn two_char_operators() {
        let k = kinds("a <= b && c++ != --d");
        assert!(k.contains(&TokenKind::LtEq));
        assert!(k.contains(&TokenKind::AndAnd));
        assert!(k.contains(&TokenKind::PlusPlus));
        assert!(k.contains(&TokenKind::NotEq));
        assert!(k.contains(&TokenKind::MinusMinus));
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::new(r#""a\n\"b""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StrLit("a\n\"b".into()));
    }

    #[test]
    fn unterminated_string_is_error() {
        let err = Lexer::new("\"oops").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn unterminated_comment_is_error() {
        let err = Lexer::new("/* forever").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn comments_attach_to_following_token() {
        let tokens = Lexer::new("// note\n/** doc */ class").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::KwClass);
        assert_eq!(
            tokens[0].trivia,
            vec![
                Trivia::Line("// note".into()),
                Trivia::Doc("/** doc */".into()),
            ]
        );
    }

    #[test]
    fn unsupported_keyword_is_its_own_kind() {
        assert_eq!(kinds("switch")[0], TokenKind::KwUnsupported("switch".into()));
    }

    #[test]
    fn illegal_character_reports_span() {
        let err = Lexer::new("int a = #;").tokenize().unwrap_err();
        assert_eq!(err.span.start, 8);
        assert!(err.message.contains("illegal character"));
    }
}
