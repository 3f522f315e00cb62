//! Lexer tests: keywords, literals, punctuation, comments, line markers,
//! and error recovery.

use corecall_lexer::{LexResult, Lexer, TokenKind};
use corecall_types::SourceFile;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn lex(source: &str) -> LexResult {
    let sf = SourceFile::new("decls.h", source);
    Lexer::new(&sf).lex()
}

/// Lex and return the token kinds (without the trailing Eof), panicking on
/// any error.
fn kinds(source: &str) -> Vec<TokenKind> {
    let result = lex(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected lex errors (see above)");
    }
    let mut kinds: Vec<TokenKind> = result.tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds.pop(), Some(TokenKind::Eof));
    kinds
}

fn error_count(source: &str) -> usize {
    lex(source).errors.total_errors
}

// ─────────────────────────────────────────────────────────────────────
// Basic declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_function_prototype() {
    let toks = kinds("int add(int a, int b);");
    assert_eq!(
        toks,
        vec![
            TokenKind::Int,
            TokenKind::Identifier("add".to_string()),
            TokenKind::LParen,
            TokenKind::Int,
            TokenKind::Identifier("a".to_string()),
            TokenKind::Comma,
            TokenKind::Int,
            TokenKind::Identifier("b".to_string()),
            TokenKind::RParen,
            TokenKind::Semi,
        ]
    );
}

#[test]
fn test_pointer_and_const() {
    let toks = kinds("void write(const char *data, unsigned short n);");
    assert!(toks.contains(&TokenKind::Const));
    assert!(toks.contains(&TokenKind::Star));
    assert!(toks.contains(&TokenKind::Unsigned));
    assert!(toks.contains(&TokenKind::Short));
}

#[test]
fn test_all_type_keywords() {
    let toks = kinds("void char short int long float double signed unsigned _Bool");
    assert_eq!(toks.len(), 10);
    assert!(!toks.iter().any(|k| matches!(k, TokenKind::Identifier(_))));
}

#[test]
fn test_typedef_and_enum_keywords() {
    let toks = kinds("typedef enum struct union static extern");
    assert_eq!(
        toks,
        vec![
            TokenKind::Typedef,
            TokenKind::Enum,
            TokenKind::Struct,
            TokenKind::Union,
            TokenKind::Static,
            TokenKind::Extern,
        ]
    );
}

#[test]
fn test_variadic_ellipsis() {
    let toks = kinds("int printf(const char *fmt, ...);");
    assert!(toks.contains(&TokenKind::Ellipsis));
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_decimal_literal() {
    assert_eq!(kinds("42"), vec![TokenKind::IntLit(42)]);
}

#[test]
fn test_hex_literal() {
    assert_eq!(kinds("0x2A"), vec![TokenKind::IntLit(42)]);
    assert_eq!(kinds("0xff"), vec![TokenKind::IntLit(255)]);
}

#[test]
fn test_literal_suffixes_ignored() {
    assert_eq!(kinds("42u"), vec![TokenKind::IntLit(42)]);
    assert_eq!(kinds("0x10UL"), vec![TokenKind::IntLit(16)]);
}

#[test]
fn test_char_constant() {
    assert_eq!(kinds("'A'"), vec![TokenKind::IntLit(65)]);
    assert_eq!(kinds("'\\n'"), vec![TokenKind::IntLit(10)]);
    assert_eq!(kinds("'\\0'"), vec![TokenKind::IntLit(0)]);
}

#[test]
fn test_negative_enum_value_tokens() {
    let toks = kinds("FAILED = -1");
    assert_eq!(
        toks,
        vec![
            TokenKind::Identifier("FAILED".to_string()),
            TokenKind::Eq,
            TokenKind::Minus,
            TokenKind::IntLit(1),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_comment_stripped() {
    let toks = kinds("// leading comment\nint x;");
    assert_eq!(
        toks,
        vec![
            TokenKind::Int,
            TokenKind::Identifier("x".to_string()),
            TokenKind::Semi,
        ]
    );
}

#[test]
fn test_block_comment_stripped() {
    let toks = kinds("int /* inline */ x;");
    assert_eq!(toks.len(), 3);
}

#[test]
fn test_unterminated_block_comment_is_error() {
    assert_eq!(error_count("int x; /* never closed"), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Line markers & directives
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_marker_updates_logical_file() {
    let result = lex("# 1 \"/usr/include/stdio.h\"\nint remote(void);\n# 10 \"user.c\"\nint local(void);\n");
    assert!(!result.errors.has_errors());

    let files: Vec<&str> = result
        .tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::Identifier(name) => Some((name.as_str(), t.file.as_str())),
            _ => None,
        })
        .map(|(_, f)| f)
        .collect();
    assert_eq!(files, vec!["/usr/include/stdio.h", "user.c"]);
}

#[test]
fn test_hash_line_form() {
    let result = lex("#line 5 \"wrapped.h\"\nvoid f(void);");
    assert!(!result.errors.has_errors());
    assert_eq!(result.tokens[0].file, "wrapped.h");
}

#[test]
fn test_other_directives_skipped() {
    let toks = kinds("#pragma once\n#define IGNORED 1\nint x;");
    assert_eq!(toks.len(), 3);
}

// ─────────────────────────────────────────────────────────────────────
// Function bodies
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_function_body_is_discarded() {
    let toks = kinds("int add(int a, int b) { return a + b; }\n");
    assert_eq!(
        &toks[toks.len() - 2..],
        &[TokenKind::LBrace, TokenKind::RBrace]
    );
    // Nothing between the braces leaked into the stream.
    assert!(!toks.contains(&TokenKind::Identifier("return".to_string())));
}

#[test]
fn test_body_braces_in_literals_and_comments() {
    let toks = kinds(concat!(
        "void emit(int n) {\n",
        "    const char *s = \"closing } brace\";\n",
        "    char c = '}'; /* } */ // }\n",
        "    if (n) { s = \"{\\\"}\"; }\n",
        "}\n",
        "int after(void);\n",
    ));
    // The body collapses to one brace pair, and the next declaration
    // still lexes.
    assert_eq!(
        toks.iter()
            .filter(|k| matches!(k, TokenKind::LBrace | TokenKind::RBrace))
            .count(),
        2
    );
    assert!(toks.contains(&TokenKind::Identifier("after".to_string())));
}

#[test]
fn test_enum_body_is_still_tokenized() {
    let toks = kinds("enum mode { IDLE, RUN = 5 };");
    assert!(toks.contains(&TokenKind::Identifier("IDLE".to_string())));
    assert!(toks.contains(&TokenKind::IntLit(5)));
}

#[test]
fn test_unbalanced_body_is_an_error() {
    assert_eq!(error_count("void f(void) { if (1) {"), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unexpected_character_recovers() {
    let result = lex("int x @ y;");
    assert_eq!(result.errors.total_errors, 1);
    // The surrounding tokens still come through
    let idents: Vec<_> = result
        .tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Identifier(_)))
        .collect();
    assert_eq!(idents.len(), 2);
}

#[test]
fn test_empty_source() {
    let result = lex("");
    assert!(!result.errors.has_errors());
    assert_eq!(result.tokens.len(), 1);
    assert_eq!(result.tokens[0].kind, TokenKind::Eof);
}
