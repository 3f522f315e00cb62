//! Generated-dispatcher tests: extract a table from C text, generate the
//! dispatcher, and check the emitted structure.

use corecall_codegen::{compile, CodegenError, TargetLayout};
use corecall_extract::{extract, Registry};
use corecall_types::sig::DispatcherTable;
use corecall_types::SourceFile;

fn generate(source: &str) -> String {
    let file = SourceFile::new("decls.c", source);
    let ex = extract(&file, &Registry::new());
    assert!(!ex.diagnostics.has_errors());
    assert_eq!(ex.diagnostics.total_warnings, 0);
    compile(&ex.table, &file, &TargetLayout::default()).unwrap()
}

#[test]
fn test_scalar_call_case() {
    let out = generate("int add(int a, int b) { return a + b; }\n");
    assert!(out.contains("case 0u: { /* add(i32,i32)->i32 */"));
    assert!(out.contains("int32_t a = (int32_t)cc_read_u32();"));
    assert!(out.contains("int32_t b = (int32_t)cc_read_u32();"));
    assert!(out.contains("int32_t cc_ret = add(a, b);"));
    assert!(out.contains("cc_write_u8(0u);"));
    assert!(out.contains("cc_write_u32((uint32_t)cc_ret);"));
}

#[test]
fn test_void_call_acks_without_blocking_frame() {
    let out = generate("void fire(int n);\n");
    assert!(out.contains("fire(n);"));
    assert!(out.contains("cc_write_u8(2u);"));
    assert!(!out.contains("cc_write_u8(0u);"));
}

#[test]
fn test_mutable_buffer_is_read_back() {
    let out = generate("void scale(int *buf, int factor);\n");
    assert!(out.contains("uint16_t buf_len = cc_read_u16();"));
    assert!(out.contains("int32_t buf[buf_len ? buf_len : 1];"));
    assert!(out.contains("cc_read_bytes((uint8_t *)buf, (uint32_t)buf_len * 4u);"));
    // Mutable buffers make the call blocking even with a void return.
    assert!(out.contains("cc_write_u8(0u);"));
    assert!(out.contains("cc_write_u16(buf_len);"));
    assert!(out.contains("cc_write_bytes((const uint8_t *)buf, (uint32_t)buf_len * 4u);"));
}

#[test]
fn test_const_buffer_is_not_read_back() {
    let out = generate("int sum(const char *vals, int n);\n");
    assert!(out.contains("uint16_t vals_len = cc_read_u16();"));
    assert!(out.contains("cc_read_bytes((uint8_t *)vals, (uint32_t)vals_len * 1u);"));
    assert!(!out.contains("cc_write_u16(vals_len);"));
}

#[test]
fn test_void_pointer_is_a_raw_address() {
    let out = generate("void poke(void *dst, int v);\n");
    assert!(out.contains("void *dst = (void *)(uintptr_t)cc_read_u32();"));
    // No readback possible through a void pointer, so no one waits.
    assert!(out.contains("cc_write_u8(2u);"));
}

#[test]
fn test_float_and_double_marshalling() {
    let out = generate("float lerp(float a, double t);\n");
    assert!(out.contains("float a = cc_read_f32();"));
    assert!(out.contains("double t = cc_read_f64();"));
    assert!(out.contains("cc_write_f32(cc_ret);"));
}

#[test]
fn test_wide_integers() {
    let out = generate("long long shift(long long a, unsigned short by);\n");
    assert!(out.contains("int64_t a = (int64_t)cc_read_u64();"));
    assert!(out.contains("uint16_t by = (uint16_t)cc_read_u16();"));
    assert!(out.contains("cc_write_u64((uint64_t)cc_ret);"));
}

#[test]
fn test_alias_keeps_its_typedef_name() {
    let out = generate("typedef int cc_int;\ncc_int cmd_go(int target);\n");
    assert!(out.contains("cc_int cc_ret = cmd_go(target);"));
    // On the wire it is still a plain 32-bit write.
    assert!(out.contains("cc_write_u32((uint32_t)cc_ret);"));
}

#[test]
fn test_application_source_is_included_verbatim() {
    let source = "int add(int a, int b) { return a + b; }\n";
    let out = generate(source);
    assert!(out.contains(source));
}

#[test]
fn test_digest_and_layout_constants() {
    let file = SourceFile::new("decls.c", "int add(int a, int b);\n");
    let ex = extract(&file, &Registry::new());
    let layout = TargetLayout {
        cmd_base: 0x8000_0000,
        resp_base: 0x8000_2000,
        ring_capacity: 0x2000,
        void_ptr_base: 0x9000_0000,
    };
    let out = compile(&ex.table, &file, &layout).unwrap();
    assert!(out.contains(&format!("/* Table digest: {} */", ex.table.digest())));
    assert!(out.contains("#define CC_CMD_BASE   0x80000000u"));
    assert!(out.contains("#define CC_RESP_BASE  0x80002000u"));
    // Data window excludes the 8-byte cursor header.
    assert!(out.contains(&format!("#define CC_RING_BYTES {}u", 0x2000 - 8)));
}

#[test]
fn test_serve_loop_and_default_arm() {
    let out = generate("int add(int a, int b);\n");
    assert!(out.contains("void corecall_dispatch(void)"));
    assert!(out.contains("void corecall_serve(void)"));
    assert!(out.contains("default:"));
}

#[test]
fn test_dispatch_returns_until_a_full_selector_arrives() {
    let out = generate("int add(int a, int b);\n");
    let guard = out.find("if (cc_cmd_buffered() < 4u)").unwrap();
    let selector = out.find("uint32_t selector = cc_read_u32();").unwrap();
    assert!(guard < selector);
}

#[test]
fn test_empty_table_is_rejected() {
    let file = SourceFile::new("decls.c", "");
    let table = DispatcherTable::new(Vec::new(), String::new());
    let err = compile(&table, &file, &TargetLayout::default()).unwrap_err();
    assert!(matches!(err, CodegenError::EmptyTable));
}

#[test]
fn test_invalid_layout_is_rejected() {
    let file = SourceFile::new("decls.c", "int add(int a, int b);\n");
    let ex = extract(&file, &Registry::new());
    let layout = TargetLayout {
        ring_capacity: 8,
        ..TargetLayout::default()
    };
    let err = compile(&ex.table, &file, &layout).unwrap_err();
    assert!(matches!(err, CodegenError::Layout(_)));
}
