//! Core parser infrastructure: token cursor, error reporting, recovery.

use corecall_lexer::token::{Token, TokenKind};
use corecall_types::{ast::TranslationUnit, BindError, Diagnostics, ErrorCode, SourceFile, Span};

/// The corecall declaration parser.
///
/// Consumes a token stream produced by the lexer and builds a
/// [`TranslationUnit`]. Collects errors and recovers to the next
/// declaration boundary when possible.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Collected errors.
    pub(crate) errors: Diagnostics,
}

/// Result of parsing.
pub struct ParseResult {
    pub unit: TranslationUnit,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should end with Eof")
        })
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Logical file of the current token.
    pub(crate) fn current_file(&self) -> String {
        self.peek().file.clone()
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        let idx = self.pos + n;
        self.tokens
            .get(idx)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits
    /// an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self) -> Option<corecall_types::ast::Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(corecall_types::ast::Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    // ── Error Reporting & Recovery ────────────────────────────────────────────

    /// Report an error at the current token.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        let file = self.current_file();
        let source_line = self
            .source_file
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        self.errors
            .push_error(BindError::new(file, code, message, span, source_line));
    }

    /// Returns `true` once the error cap is reached.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= corecall_types::MAX_ERRORS
    }

    /// Skip to the next declaration boundary: past the next `;`, or past a
    /// balanced `{ ... }` block followed by an optional `;`.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    self.skip_braced_block();
                    self.eat(&TokenKind::Semi);
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip a balanced `{ ... }` block. The opening brace must be current.
    pub(crate) fn skip_braced_block(&mut self) {
        if !self.eat(&TokenKind::LBrace) {
            return;
        }
        let mut depth = 1u32;
        while depth > 0 && !self.at_end() {
            match self.advance().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            self.error_at_current(
                ErrorCode::UNBALANCED_DELIMITER,
                "unbalanced '{' — reached end of input inside a block",
            );
        }
    }
}
