//! Core corecall lexer — converts preprocessed C declaration source to a
//! token stream.
//!
//! Features:
//! - Declaration keywords, identifiers, integer/hex/char literals
//! - `//` and `/* */` comments stripped
//! - Preprocessor line markers tracked (logical file per token)
//! - Other `#` directives skipped without complaint
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use corecall_types::{BindError, Diagnostics, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The corecall declaration lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`corecall_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based, physical position in the body).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Logical file per the most recent line marker.
    current_file: String,
    /// True when the last emitted token was `)`: a `{` seen next opens a
    /// function body, which is discarded rather than tokenized.
    after_rparen: bool,
    /// The `}` closing a discarded body, held for the next `scan` call.
    pending: Option<Token>,
    /// Collected errors.
    errors: Diagnostics,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            current_file: source_file.name.clone(),
            after_rparen: false,
            pending: None,
            errors: Diagnostics::empty(),
        }
    }

    /// Lex the entire source into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= corecall_types::MAX_ERRORS {
                break;
            }
            let token = self.scan();
            self.after_rparen = token.kind == TokenKind::RParen;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        // Ensure the stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(self.token_here(TokenKind::Eof));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn token_here(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::point(self.line, self.col),
            self.current_file.clone(),
        )
    }

    fn token(&self, kind: TokenKind, start_line: u32, start_col: u32) -> Token {
        Token::new(
            kind,
            self.span_from(start_line, start_col),
            self.current_file.clone(),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("").to_string();
        let err = BindError::new(&self.current_file, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace, comments & directives
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace (including newlines — C is not line-oriented),
    /// comments, and preprocessor directive lines.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.skip_block_comment();
                }
                Some(b'#') => {
                    self.scan_directive();
                }
                _ => break,
            }
        }
    }

    /// Skip a `/* ... */` comment; unterminated comments are an error.
    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "unterminated block comment",
                        span,
                    );
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Discard a function body whose `{` has just been consumed, through
    /// the matching `}`. String and character literals and comments may
    /// contain braces and are stepped over whole.
    fn skip_function_body(&mut self) -> Token {
        let mut depth = 1u32;
        loop {
            let start_line = self.line;
            let start_col = self.col;
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNBALANCED_DELIMITER,
                        "unbalanced '{' in function body",
                        span,
                    );
                    return self.token_here(TokenKind::RBrace);
                }
                Some(b'{') => depth += 1,
                Some(b'}') => {
                    depth -= 1;
                    if depth == 0 {
                        return self.token(TokenKind::RBrace, start_line, start_col);
                    }
                }
                Some(b'"') => self.skip_quoted(b'"'),
                Some(b'\'') => self.skip_quoted(b'\''),
                Some(b'/') if self.peek() == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek() == Some(b'*') => {
                    self.advance();
                    loop {
                        match self.advance() {
                            None => break,
                            Some(b'*') if self.peek() == Some(b'/') => {
                                self.advance();
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Step over a quoted literal inside a discarded body. Escapes keep
    /// the closing quote honest; a newline ends an unterminated literal.
    fn skip_quoted(&mut self, quote: u8) {
        loop {
            match self.advance() {
                None | Some(b'\n') => break,
                Some(b'\\') => {
                    self.advance();
                }
                Some(ch) if ch == quote => break,
                _ => {}
            }
        }
    }

    /// Consume a `#` directive line.
    ///
    /// Line markers (`# 12 "file.h"` or `#line 12 "file.h"`) update the
    /// logical file so downstream filtering can drop system-header
    /// declarations. Every other directive is skipped — macros are assumed
    /// expanded before the source reaches the bridge.
    fn scan_directive(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // '#'

        // Horizontal whitespace after '#'
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.advance();
        }

        // Optional 'line' keyword
        if self.source[self.pos..].starts_with(b"line") {
            for _ in 0..4 {
                self.advance();
            }
            while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
                self.advance();
            }
        }

        // A line marker continues with a line number; anything else is an
        // ordinary directive to skip.
        if matches!(self.peek(), Some(b'0'..=b'9')) {
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
            while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
                self.advance();
            }
            if self.peek() == Some(b'"') {
                self.advance();
                let mut file = String::new();
                loop {
                    match self.peek() {
                        None | Some(b'\n') => {
                            let span = self.span_from(start_line, start_col);
                            self.emit_error(
                                ErrorCode::MALFORMED_LINE_MARKER,
                                "unterminated file name in line marker",
                                span,
                            );
                            break;
                        }
                        Some(b'"') => {
                            self.advance();
                            break;
                        }
                        Some(ch) => {
                            self.advance();
                            file.push(ch as char);
                        }
                    }
                }
                if !file.is_empty() {
                    self.current_file = file;
                }
            }
        }

        // Skip the remainder of the directive line (flags etc.)
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token.
    fn scan(&mut self) -> Token {
        if let Some(token) = self.pending.take() {
            return token;
        }
        self.skip_trivia();

        if self.at_end() {
            return self.token_here(TokenKind::Eof);
        }

        let start_line = self.line;
        let start_col = self.col;
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return self.token_here(TokenKind::Eof),
        };

        match ch {
            // ── Number literal ──
            b'0'..=b'9' => self.scan_number(ch, start_line, start_col),

            // ── Character constant ──
            b'\'' => self.scan_char(start_line, start_col),

            // ── Identifiers & keywords ──
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start_line, start_col),

            // ── Punctuation ──
            b'*' => self.token(TokenKind::Star, start_line, start_col),
            b'(' => self.token(TokenKind::LParen, start_line, start_col),
            b')' => self.token(TokenKind::RParen, start_line, start_col),
            b'{' => {
                let open = self.token(TokenKind::LBrace, start_line, start_col);
                if self.after_rparen {
                    // `) {` opens a function body: its statements are not
                    // declaration syntax, so the bytes are discarded and
                    // only the closing brace surfaces as a token.
                    self.pending = Some(self.skip_function_body());
                }
                open
            }
            b'}' => self.token(TokenKind::RBrace, start_line, start_col),
            b'[' => self.token(TokenKind::LBracket, start_line, start_col),
            b']' => self.token(TokenKind::RBracket, start_line, start_col),
            b',' => self.token(TokenKind::Comma, start_line, start_col),
            b';' => self.token(TokenKind::Semi, start_line, start_col),
            b'=' => self.token(TokenKind::Eq, start_line, start_col),
            b'-' => self.token(TokenKind::Minus, start_line, start_col),

            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    self.token(TokenKind::Ellipsis, start_line, start_col)
                } else {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "unexpected character '.'",
                        span,
                    );
                    self.scan()
                }
            }

            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{}'", ch as char),
                    span,
                );
                // Error recovery: skip the character and try again
                self.scan()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, first: u8, start_line: u32, start_col: u32) -> Token {
        let value: i64;

        if first == b'0' && matches!(self.peek(), Some(b'x') | Some(b'X')) {
            self.advance();
            let mut text = String::new();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() {
                    text.push(ch as char);
                    self.advance();
                } else {
                    break;
                }
            }
            match i64::from_str_radix(&text, 16) {
                Ok(v) => value = v,
                Err(_) => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_LITERAL,
                        format!("invalid hex literal '0x{text}'"),
                        span,
                    );
                    value = 0;
                }
            }
        } else {
            let mut text = String::new();
            text.push(first as char);
            while let Some(ch @ b'0'..=b'9') = self.peek() {
                text.push(ch as char);
                self.advance();
            }
            match text.parse::<i64>() {
                Ok(v) => value = v,
                Err(_) => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_LITERAL,
                        format!("integer literal '{text}' out of range"),
                        span,
                    );
                    value = 0;
                }
            }
        }

        // Integer suffixes carry no wire meaning
        while matches!(self.peek(), Some(b'u') | Some(b'U') | Some(b'l') | Some(b'L')) {
            self.advance();
        }

        self.token(TokenKind::IntLit(value), start_line, start_col)
    }

    /// Scan a character constant: `'A'`, `'\n'`, `'\0'`.
    fn scan_char(&mut self, start_line: u32, start_col: u32) -> Token {
        let value = match self.advance() {
            Some(b'\\') => match self.advance() {
                Some(b'n') => b'\n' as i64,
                Some(b't') => b'\t' as i64,
                Some(b'r') => b'\r' as i64,
                Some(b'0') => 0,
                Some(b'\\') => b'\\' as i64,
                Some(b'\'') => b'\'' as i64,
                other => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_LITERAL,
                        format!(
                            "unsupported escape '\\{}' in character constant",
                            other.map(|c| c as char).unwrap_or(' ')
                        ),
                        span,
                    );
                    0
                }
            },
            Some(ch) => ch as i64,
            None => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::INVALID_LITERAL,
                    "unterminated character constant",
                    span,
                );
                return self.token(TokenKind::IntLit(0), start_line, start_col);
            }
        };

        if self.peek() == Some(b'\'') {
            self.advance();
        } else {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_LITERAL,
                "unterminated character constant",
                span,
            );
        }

        self.token(TokenKind::IntLit(value), start_line, start_col)
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos - 1;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let kind = TokenKind::from_keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));

        self.token(kind, start_line, start_col)
    }
}
