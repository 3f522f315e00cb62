//! corecall lexer: converts preprocessed C declaration source into a token
//! stream.
//!
//! Scope matches what the bridge needs to extract callable signatures:
//! - Declaration keywords, identifiers, integer/char literals, punctuation
//! - `//` and `/* */` comments stripped (docstrings are scraped from the
//!   raw source separately, by line)
//! - Preprocessor line markers (`# 12 "file.h"`, `#line 12 "file.h"`)
//!   tracked so every token knows its logical file — system-header
//!   declarations are filtered on that basis downstream
//! - All other `#` directives skipped; macros are assumed expanded upstream

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer};
pub use token::{Token, TokenKind};
