//! corecall parser: token stream to declaration AST.
//!
//! Accepts the C subset the bridge can marshal: function prototypes (and
//! definitions — bodies are skipped by brace matching), scalar typedefs,
//! and enums. Global variables and bare struct definitions are skipped
//! without complaint; malformed declarations are reported and recovered
//! past, so one bad declaration never sinks the whole bind.

mod parse_decl;
mod parse_type;
pub mod parser;

pub use parser::{ParseResult, Parser};

use corecall_lexer::Lexer;
use corecall_types::SourceFile;

/// Convenience entry point: lex and parse one source body.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    // Lex errors come first — they usually explain the parse errors.
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}
