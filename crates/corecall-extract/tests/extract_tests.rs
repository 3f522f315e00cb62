//! End-to-end extraction tests: source text in, dispatcher table, enums,
//! groups and diagnostics out.

use corecall_extract::{extract, extract_strict, Extraction, Registry};
use corecall_types::descriptor::{Primitive, SemanticOverride, TypeDescriptor};
use corecall_types::{ErrorCode, SourceFile};

fn run(source: &str) -> Extraction {
    let file = SourceFile::new("decls.c", source);
    extract(&file, &Registry::new())
}

fn warning_codes(ex: &Extraction) -> Vec<ErrorCode> {
    ex.diagnostics.warnings.iter().map(|w| w.code).collect()
}

// ── Table assembly ────────────────────────────────────────────────────────────

#[test]
fn test_selectors_follow_declaration_order() {
    let ex = run("int add(int a, int b);\nvoid fire(int n);\nfloat half(float x);\n");
    assert!(!ex.diagnostics.has_errors());
    assert_eq!(ex.table.len(), 3);
    assert_eq!(ex.table.selector_of("add"), Some(0));
    assert_eq!(ex.table.selector_of("fire"), Some(1));
    assert_eq!(ex.table.selector_of("half"), Some(2));
}

#[test]
fn test_prototype_then_definition_share_one_selector() {
    let ex = run(concat!(
        "int add(int a, int b);\n",
        "int add(int a, int b) { return a + b; }\n",
        "int sub(int a, int b);\n",
    ));
    assert_eq!(ex.table.len(), 2);
    assert_eq!(ex.table.selector_of("add"), Some(0));
    assert_eq!(ex.table.selector_of("sub"), Some(1));
    assert_eq!(ex.diagnostics.total_warnings, 0);
}

#[test]
fn test_unnamed_parameters_are_synthesized() {
    let ex = run("int mix(int, float);\n");
    let (_, sig) = ex.table.by_name("mix").unwrap();
    assert_eq!(sig.params[0].name, "arg0");
    assert_eq!(sig.params[1].name, "arg1");
}

#[test]
fn test_blocking_classification() {
    let ex = run(concat!(
        "int add(int a, int b);\n",
        "void fire(int n);\n",
        "void scale(int *buf, int factor);\n",
        "void dump(const char *msg);\n",
    ));
    assert!(ex.table.by_name("add").unwrap().1.blocks());
    assert!(!ex.table.by_name("fire").unwrap().1.blocks());
    assert!(ex.table.by_name("scale").unwrap().1.blocks());
    assert!(!ex.table.by_name("dump").unwrap().1.blocks());
}

#[test]
fn test_pointer_constness_follows_the_pointee() {
    let ex = run(concat!(
        "void f(int * const locked);\n",
        "void g(const int *frozen);\n",
    ));
    assert!(!ex.diagnostics.has_errors());

    // A const pointer to mutable data still round-trips its contents.
    let (_, f) = ex.table.by_name("f").unwrap();
    assert_eq!(
        f.params[0].desc,
        TypeDescriptor::Pointer(Box::new(TypeDescriptor::Primitive(Primitive::I32)))
    );
    assert!(f.params[0].desc.needs_readback());
    assert!(f.blocks());

    let (_, g) = ex.table.by_name("g").unwrap();
    assert_eq!(
        g.params[0].desc,
        TypeDescriptor::ConstPointer(Box::new(TypeDescriptor::Primitive(Primitive::I32)))
    );
    assert!(!g.params[0].desc.needs_readback());
}

// ── Filtering ─────────────────────────────────────────────────────────────────

#[test]
fn test_system_header_declarations_are_ignored() {
    let ex = run(concat!(
        "# 1 \"/usr/include/stdio.h\"\n",
        "int printf(const char *fmt, ...);\n",
        "int getchar(void);\n",
        "# 5 \"decls.c\"\n",
        "int add(int a, int b);\n",
    ));
    assert_eq!(ex.table.len(), 1);
    assert_eq!(ex.table.selector_of("add"), Some(0));
    // printf is variadic, but a system declaration never even warns.
    assert_eq!(ex.diagnostics.total_warnings, 0);
}

#[test]
fn test_static_functions_are_skipped_silently() {
    let ex = run("static int helper(int x);\nint public_fn(int x);\n");
    assert_eq!(ex.table.len(), 1);
    assert!(ex.table.selector_of("helper").is_none());
    assert_eq!(ex.diagnostics.total_warnings, 0);
}

#[test]
fn test_unmarshallable_functions_warn_and_are_omitted() {
    let ex = run(concat!(
        "struct point { int x; int y; };\n",
        "int area(struct point p);\n",
        "char *name_of(int id);\n",
        "int trace(const char *fmt, ...);\n",
        "int good(int x);\n",
    ));
    assert_eq!(ex.table.len(), 1);
    assert_eq!(ex.table.selector_of("good"), Some(0));
    let codes = warning_codes(&ex);
    assert!(codes.contains(&ErrorCode::AGGREGATE_BY_VALUE));
    assert!(codes.contains(&ErrorCode::POINTER_RETURN));
    assert!(codes.contains(&ErrorCode::VARIADIC_FUNCTION));
}

#[test]
fn test_multi_level_pointer_param_warns() {
    let ex = run("int fill(int **rows, int n);\nint ok(int n);\n");
    assert_eq!(ex.table.len(), 1);
    assert_eq!(warning_codes(&ex), vec![ErrorCode::MULTI_LEVEL_POINTER]);
}

#[test]
fn test_empty_table_warns() {
    let ex = run("typedef unsigned int handle_t;\n");
    assert!(ex.table.is_empty());
    assert!(warning_codes(&ex).contains(&ErrorCode::EMPTY_DISPATCH_TABLE));
}

#[test]
fn test_strict_mode_fails_on_any_diagnostic() {
    let file = SourceFile::new("decls.c", "int area(struct point p);\nint good(int x);\n");
    assert!(extract_strict(&file, &Registry::new()).is_err());

    let file = SourceFile::new("decls.c", "int add(int a, int b);\n");
    let ex = extract_strict(&file, &Registry::new()).unwrap();
    assert_eq!(ex.table.len(), 1);
}

// ── Enums ─────────────────────────────────────────────────────────────────────

#[test]
fn test_enum_auto_increment() {
    let ex = run("enum color { RED, GREEN = 5, BLUE };\nvoid paint(int c);\n");
    assert_eq!(ex.enums.len(), 1);
    let e = &ex.enums[0];
    assert_eq!(e.name.as_deref(), Some("color"));
    assert_eq!(
        e.entries,
        vec![
            ("RED".to_string(), 0),
            ("GREEN".to_string(), 5),
            ("BLUE".to_string(), 6),
        ]
    );
}

#[test]
fn test_enum_negative_and_anonymous() {
    let ex = run("enum { E_OK = 0, E_FAIL = -1, E_NEXT };\nvoid f(int c);\n");
    let e = &ex.enums[0];
    assert!(e.name.is_none());
    assert_eq!(
        e.entries,
        vec![
            ("E_OK".to_string(), 0),
            ("E_FAIL".to_string(), -1),
            ("E_NEXT".to_string(), 0),
        ]
    );
}

#[test]
fn test_typedef_enum_yields_named_enum() {
    let ex = run("typedef enum { STOP, GO } signal_t;\nvoid set_signal(int s);\n");
    assert_eq!(ex.enums.len(), 1);
    assert_eq!(ex.enums[0].name.as_deref(), Some("signal_t"));
    assert_eq!(
        ex.enums[0].entries,
        vec![("STOP".to_string(), 0), ("GO".to_string(), 1)]
    );
}

#[test]
fn test_duplicate_enum_label_warns_and_keeps_first() {
    let ex = run("enum dup { A = 1, A = 2, B };\nvoid f(int c);\n");
    assert!(warning_codes(&ex).contains(&ErrorCode::DUPLICATE_ENUM_LABEL));
    assert_eq!(
        ex.enums[0].entries,
        vec![("A".to_string(), 1), ("B".to_string(), 3)]
    );
}

// ── Typedefs and semantic overrides ───────────────────────────────────────────

#[test]
fn test_typedef_alias_flows_into_signature() {
    let ex = run("typedef unsigned int handle_t;\nvoid open_port(handle_t h);\n");
    let (_, sig) = ex.table.by_name("open_port").unwrap();
    assert_eq!(sig.params[0].desc.alias_name(), Some("handle_t"));
    assert_eq!(
        sig.params[0].desc.resolve(),
        &TypeDescriptor::Primitive(Primitive::U32)
    );
}

#[test]
fn test_errno_override_on_return_type() {
    let ex = run("typedef int cc_int;\ncc_int cmd_go(int target);\n");
    let (_, sig) = ex.table.by_name("cmd_go").unwrap();
    assert_eq!(sig.ret.semantic(), Some(SemanticOverride::ErrnoInt));
}

// ── Typedef groups ────────────────────────────────────────────────────────────

#[test]
fn test_typedef_grouping() {
    let ex = run(concat!(
        "typedef unsigned int motor;\n",
        "void motor_start(motor m);\n",
        "int motor_speed(motor m);\n",
        "void motor_reset_all(int flags);\n",
        "void unrelated(int x);\n",
    ));
    assert_eq!(ex.groups.len(), 1);
    let g = &ex.groups[0];
    assert_eq!(g.name, "motor");
    assert_eq!(g.methods.len(), 3);

    let start = g.methods.iter().find(|m| m.suffix == "start").unwrap();
    assert!(start.takes_receiver);
    assert_eq!(ex.table.get(start.selector).unwrap().name, "motor_start");

    let reset = g.methods.iter().find(|m| m.suffix == "reset_all").unwrap();
    assert!(!reset.takes_receiver);
}

#[test]
fn test_typedef_without_matching_functions_forms_no_group() {
    let ex = run("typedef unsigned int handle_t;\nint add(int a, int b);\n");
    assert!(ex.groups.is_empty());
}

// ── Docstrings ────────────────────────────────────────────────────────────────

#[test]
fn test_line_comment_docstring() {
    let ex = run(concat!(
        "// Adds two numbers\n",
        "// with wrap on overflow.\n",
        "int add(int a, int b);\n",
    ));
    let (_, sig) = ex.table.by_name("add").unwrap();
    assert_eq!(
        sig.doc.as_deref(),
        Some("Adds two numbers\nwith wrap on overflow.")
    );
}

#[test]
fn test_block_comment_docstring() {
    let ex = run(concat!(
        "/* Scales each element\n",
        " * by the factor. */\n",
        "void scale(int *buf, int factor);\n",
    ));
    let (_, sig) = ex.table.by_name("scale").unwrap();
    assert_eq!(sig.doc.as_deref(), Some("Scales each element\nby the factor."));
}

#[test]
fn test_detached_comment_is_not_a_docstring() {
    let ex = run("// A file header comment.\n\nint add(int a, int b);\n");
    let (_, sig) = ex.table.by_name("add").unwrap();
    assert!(sig.doc.is_none());
}

// ── Digest ────────────────────────────────────────────────────────────────────

#[test]
fn test_digest_is_stable_across_binds() {
    let a = run("int add(int a, int b);\nvoid fire(int n);\n");
    let b = run("int add(int a, int b);\nvoid fire(int n);\n");
    assert_eq!(a.table.digest(), b.table.digest());
    assert_eq!(a.table.digest().len(), 64);
}

#[test]
fn test_digest_tracks_signature_changes() {
    let a = run("int add(int a, int b);\n");
    let b = run("int add(int a, int b);\nvoid fire(int n);\n");
    let c = run("long long add(int a, int b);\n");
    assert_ne!(a.table.digest(), b.table.digest());
    assert_ne!(a.table.digest(), c.table.digest());
}
