//! Top-level declaration parsing: function prototypes, typedefs, enums.
//!
//! Function bodies are skipped by brace matching — the bridge only needs
//! the header. Global variables and bare struct/union definitions are
//! consumed without producing a declaration.

use corecall_lexer::token::TokenKind;
use corecall_types::ast::*;
use corecall_types::ErrorCode;

use crate::parser::{ParseResult, Parser};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Translation Unit
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse the whole token stream into a [`TranslationUnit`].
    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let mut decls = Vec::new();

        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            // Stray semicolons between declarations are legal C.
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            if !self.parse_top_level(&mut decls) {
                self.synchronize();
            }
        }

        let span = start.merge(self.previous_span());
        ParseResult {
            unit: TranslationUnit { decls, span },
            errors: self.errors,
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Top-Level Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse one top-level declaration, pushing any produced nodes.
    /// Returns `false` if the caller should synchronize.
    fn parse_top_level(&mut self, decls: &mut Vec<Decl>) -> bool {
        let file = self.current_file();
        let start = self.current_span();

        let specs = match self.parse_decl_specs() {
            Some(specs) => specs,
            None => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected declaration, got '{}'", self.peek_kind()),
                );
                return false;
            }
        };

        // An inline `enum { ... }` body is a declaration in its own right,
        // whether it appeared bare, behind a typedef, or as a return type.
        let mut pending_enum = specs.inline_enum.clone().map(|(tag, enumerators)| EnumDecl {
            name: tag,
            enumerators,
            file: file.clone(),
            span: specs.span,
        });

        if specs.is_typedef {
            // typedef <type> Name;   |   typedef enum { ... } Name;
            let depth = self.parse_pointers();
            let name = match self.expect_identifier() {
                Some(name) => name,
                None => return false,
            };
            let mut depth = depth;
            self.parse_array_suffix(&mut depth);
            if self.expect(&TokenKind::Semi).is_none() {
                return false;
            }
            if let Some(e) = pending_enum.as_mut() {
                // The typedef name owns an anonymous enum's constants.
                if e.name.is_none() {
                    e.name = Some(name.clone());
                }
            }
            if let Some(e) = pending_enum {
                decls.push(Decl::Enum(e));
            }
            let span = start.merge(self.previous_span());
            decls.push(Decl::Typedef(TypedefDecl {
                ty: Self::type_node(&specs, depth),
                name,
                file,
                span,
            }));
            return true;
        }

        if let Some(e) = pending_enum {
            decls.push(Decl::Enum(e));
        }

        // Bare `enum X { ... };` / `struct def;` — nothing more to do.
        if self.eat(&TokenKind::Semi) {
            return true;
        }

        // Declarator: pointers + name.
        let depth = self.parse_pointers();
        let name = match self.peek_kind().clone() {
            TokenKind::Identifier(n) => {
                let span = self.advance().span;
                Ident::new(n, span)
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected declarator name, got '{}'", self.peek_kind()),
                );
                return false;
            }
        };

        if self.check(&TokenKind::LParen) {
            self.advance();
            let (params, variadic) = match self.parse_params() {
                Some(result) => result,
                None => return false,
            };
            let ret = Self::type_node(&specs, depth);

            // Prototype or definition — bodies are skipped.
            if self.check(&TokenKind::LBrace) {
                self.skip_braced_block();
            } else if self.expect(&TokenKind::Semi).is_none() {
                return false;
            }

            let span = start.merge(self.previous_span());
            decls.push(Decl::Function(FunctionDecl {
                name,
                ret,
                params,
                is_static: specs.is_static,
                variadic,
                file,
                span,
            }));
            return true;
        }

        // A global variable — not callable, consumed silently.
        while !self.at_end() && !self.check(&TokenKind::Semi) {
            if self.check(&TokenKind::LBrace) {
                self.skip_braced_block();
            } else {
                self.advance();
            }
        }
        self.eat(&TokenKind::Semi);
        true
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Parameter Lists
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a parameter list after the opening `(` has been consumed.
    fn parse_params(&mut self) -> Option<(Vec<ParamDecl>, bool)> {
        let mut params = Vec::new();
        let mut variadic = false;

        // `()` and `(void)` both mean "no parameters".
        if self.eat(&TokenKind::RParen) {
            return Some((params, variadic));
        }
        if self.check(&TokenKind::Void) && self.look_ahead(1) == &TokenKind::RParen {
            self.advance();
            self.advance();
            return Some((params, variadic));
        }

        loop {
            if self.eat(&TokenKind::Ellipsis) {
                variadic = true;
                break;
            }

            let start = self.current_span();
            let specs = match self.parse_decl_specs() {
                Some(specs) => specs,
                None => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected parameter type, got '{}'", self.peek_kind()),
                    );
                    return None;
                }
            };
            let mut depth = self.parse_pointers();
            let name = match self.peek_kind().clone() {
                TokenKind::Identifier(n) => {
                    let span = self.advance().span;
                    Some(Ident::new(n, span))
                }
                _ => None, // prototypes may omit parameter names
            };
            self.parse_array_suffix(&mut depth);

            let span = start.merge(self.previous_span());
            params.push(ParamDecl {
                name,
                ty: Self::type_node(&specs, depth),
                span,
            });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RParen)?;
        Some((params, variadic))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Enumerators
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse `{ A, B = 5, C }`. The opening brace must be current.
    ///
    /// Only integer-literal initialisers are supported (with unary minus);
    /// expression initialisers are reported and the enumerator keeps no
    /// explicit value.
    pub(crate) fn parse_enumerator_list(&mut self) -> Vec<EnumeratorDecl> {
        let mut out = Vec::new();
        if self.expect(&TokenKind::LBrace).is_none() {
            return out;
        }

        loop {
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            if self.at_end() {
                self.error_at_current(
                    ErrorCode::UNBALANCED_DELIMITER,
                    "unbalanced '{' in enum body",
                );
                break;
            }

            let name = match self.expect_identifier() {
                Some(name) => name,
                None => {
                    // Skip to the next enumerator or the end of the body.
                    while !self.at_end()
                        && !self.check(&TokenKind::Comma)
                        && !self.check(&TokenKind::RBrace)
                    {
                        self.advance();
                    }
                    self.eat(&TokenKind::Comma);
                    continue;
                }
            };

            let start = name.span;
            let mut value = None;
            if self.eat(&TokenKind::Eq) {
                let negative = self.eat(&TokenKind::Minus);
                match self.peek_kind().clone() {
                    TokenKind::IntLit(v) => {
                        self.advance();
                        value = Some(if negative { -v } else { v });
                    }
                    _ => {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!(
                                "enumerator '{}': only integer literal initialisers are supported",
                                name.name
                            ),
                        );
                        while !self.at_end()
                            && !self.check(&TokenKind::Comma)
                            && !self.check(&TokenKind::RBrace)
                        {
                            self.advance();
                        }
                    }
                }
            }

            let span = start.merge(self.previous_span());
            out.push(EnumeratorDecl { name, value, span });

            if !self.eat(&TokenKind::Comma) {
                if !self.eat(&TokenKind::RBrace) {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected ',' or '}}' in enum body, got '{}'", self.peek_kind()),
                    );
                    self.synchronize();
                }
                break;
            }
        }

        out
    }
}
