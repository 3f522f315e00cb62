//! Declaration-specifier and declarator parsing.
//!
//! C type syntax is a flat bag of specifier keywords (`unsigned long int
//! const`) followed by a declarator (`* name[]`). This module folds the bag
//! into a [`TypeNode`] plus the storage flags the extractor needs.

use corecall_lexer::token::TokenKind;
use corecall_types::ast::*;
use corecall_types::{ErrorCode, Span};

use crate::parser::Parser;

/// The folded result of one declaration-specifier list.
#[derive(Debug, Clone)]
pub(crate) struct DeclSpecs {
    pub base: BaseType,
    pub signedness: Signedness,
    pub is_const: bool,
    pub is_static: bool,
    pub is_typedef: bool,
    /// `enum { ... }` body met inline — surfaces `typedef enum {..} name;`.
    pub inline_enum: Option<(Option<Ident>, Vec<EnumeratorDecl>)>,
    pub span: Span,
}

impl<'src> Parser<'src> {
    /// Parse a declaration-specifier list. Returns `None` if the current
    /// token cannot begin one (the caller decides how to recover).
    pub(crate) fn parse_decl_specs(&mut self) -> Option<DeclSpecs> {
        if !self.peek_kind().starts_type()
            && !matches!(
                self.peek_kind(),
                TokenKind::Static | TokenKind::Extern | TokenKind::Inline | TokenKind::Typedef
            )
        {
            return None;
        }

        let start = self.current_span();
        let mut is_const = false;
        let mut is_static = false;
        let mut is_typedef = false;
        let mut signedness = Signedness::Default;
        let mut n_short = 0u8;
        let mut n_long = 0u8;
        let mut base: Option<BaseType> = None;
        let mut inline_enum = None;

        loop {
            match self.peek_kind().clone() {
                TokenKind::Const => {
                    is_const = true;
                    self.advance();
                }
                // No wire meaning
                TokenKind::Volatile
                | TokenKind::Extern
                | TokenKind::Inline
                | TokenKind::Register => {
                    self.advance();
                }
                TokenKind::Static => {
                    is_static = true;
                    self.advance();
                }
                TokenKind::Typedef => {
                    is_typedef = true;
                    self.advance();
                }
                TokenKind::Signed => {
                    signedness = Signedness::Signed;
                    self.advance();
                }
                TokenKind::Unsigned => {
                    signedness = Signedness::Unsigned;
                    self.advance();
                }
                TokenKind::Short => {
                    n_short += 1;
                    self.advance();
                }
                TokenKind::Long => {
                    n_long += 1;
                    self.advance();
                }
                TokenKind::Void => {
                    self.set_base(&mut base, BaseType::Void);
                    self.advance();
                }
                TokenKind::Char => {
                    self.set_base(&mut base, BaseType::Char);
                    self.advance();
                }
                TokenKind::Bool => {
                    self.set_base(&mut base, BaseType::Bool);
                    self.advance();
                }
                TokenKind::Int => {
                    // `short int` / `long int` — the modifier wins, `int`
                    // just confirms an integer base.
                    if base.is_none() {
                        base = Some(BaseType::Int);
                    }
                    self.advance();
                }
                TokenKind::Float => {
                    self.set_base(&mut base, BaseType::Float);
                    self.advance();
                }
                TokenKind::Double => {
                    self.set_base(&mut base, BaseType::Double);
                    self.advance();
                }
                TokenKind::Enum => {
                    self.advance();
                    let tag = match self.peek_kind().clone() {
                        TokenKind::Identifier(name) => {
                            let span = self.advance().span;
                            Some(Ident::new(name, span))
                        }
                        _ => None,
                    };
                    if self.check(&TokenKind::LBrace) {
                        let enumerators = self.parse_enumerator_list();
                        inline_enum = Some((tag, enumerators));
                    }
                    // Enums are int-compatible on the wire.
                    self.set_base(&mut base, BaseType::Int);
                }
                TokenKind::Struct | TokenKind::Union => {
                    let is_union = matches!(self.peek_kind(), TokenKind::Union);
                    self.advance();
                    let tag = match self.peek_kind().clone() {
                        TokenKind::Identifier(name) => {
                            self.advance();
                            Some(name)
                        }
                        _ => None,
                    };
                    if self.check(&TokenKind::LBrace) {
                        self.skip_braced_block();
                    }
                    let b = if is_union {
                        BaseType::Union(tag)
                    } else {
                        BaseType::Struct(tag)
                    };
                    self.set_base(&mut base, b);
                }
                TokenKind::Identifier(name) => {
                    // A typedef name can only be the base type if nothing
                    // else has claimed it — otherwise this identifier is
                    // the declarator name.
                    if base.is_none()
                        && n_short == 0
                        && n_long == 0
                        && signedness == Signedness::Default
                    {
                        base = Some(BaseType::Named(name));
                        self.advance();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }

        // Fold the modifier counters into the final base type.
        let base = match base {
            Some(BaseType::Int) | None => {
                if n_long >= 2 {
                    BaseType::LongLong
                } else if n_long == 1 {
                    BaseType::Long
                } else if n_short > 0 {
                    BaseType::Short
                } else {
                    BaseType::Int
                }
            }
            Some(BaseType::Double) if n_long > 0 => BaseType::Double, // long double: best effort
            Some(other) => other,
        };

        Some(DeclSpecs {
            base,
            signedness,
            is_const,
            is_static,
            is_typedef,
            inline_enum,
            span: start.merge(self.previous_span()),
        })
    }

    fn set_base(&mut self, base: &mut Option<BaseType>, new: BaseType) {
        if base.is_some() {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("conflicting type specifier '{}'", self.peek_kind()),
            );
        } else {
            *base = Some(new);
        }
    }

    /// Parse `*` levels, returning the depth. A `const`/`volatile` met
    /// here follows a `*` and qualifies the pointer object itself
    /// (`int * const buf` is a const pointer to mutable data), so it is
    /// consumed without touching the pointee's constness. The pointee
    /// qualifier always sits in the declaration specifiers.
    pub(crate) fn parse_pointers(&mut self) -> u8 {
        let mut depth = 0u8;
        loop {
            match self.peek_kind() {
                TokenKind::Star => {
                    depth = depth.saturating_add(1);
                    self.advance();
                }
                TokenKind::Const | TokenKind::Volatile => {
                    self.advance();
                }
                _ => break,
            }
        }
        depth
    }

    /// Build a [`TypeNode`] from parsed specs plus declarator pointers.
    pub(crate) fn type_node(specs: &DeclSpecs, pointer_depth: u8) -> TypeNode {
        TypeNode {
            base: specs.base.clone(),
            signedness: specs.signedness,
            is_const: specs.is_const,
            pointer_depth,
            span: specs.span,
        }
    }

    /// Parse an optional `[N]` / `[]` array suffix. An array parameter
    /// decays to one pointer level.
    pub(crate) fn parse_array_suffix(&mut self, pointer_depth: &mut u8) {
        while self.eat(&TokenKind::LBracket) {
            if let TokenKind::IntLit(_) = self.peek_kind() {
                self.advance();
            }
            if !self.eat(&TokenKind::RBracket) {
                self.error_at_current(
                    ErrorCode::UNBALANCED_DELIMITER,
                    "expected ']' after array bound",
                );
                return;
            }
            *pointer_depth = pointer_depth.saturating_add(1);
        }
    }
}
