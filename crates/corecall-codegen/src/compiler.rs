//! Dispatcher emission: one C translation unit holding the transport
//! helpers, the application source verbatim, and `corecall_dispatch()`.

use std::fmt::Write;

use corecall_types::descriptor::{Encoding, Primitive, TypeDescriptor};
use corecall_types::sig::{DispatcherTable, FunctionSignature};
use corecall_types::SourceFile;

use crate::error::{CodegenError, CodegenResult, MAX_SELECTORS};
use crate::layout::TargetLayout;
use crate::prologue;

/// Generate the embedded dispatcher translation unit.
///
/// The output is self-contained: transport helpers first, then the
/// application source exactly as given, then the selector switch. Each
/// selector case materialises its arguments from the command ring in
/// declaration order, calls the function, and answers on the response
/// ring with a terminal frame (or a bare ack for calls the host does
/// not wait on).
pub fn compile(
    table: &DispatcherTable,
    source: &SourceFile,
    layout: &TargetLayout,
) -> CodegenResult<String> {
    layout.validate()?;
    if table.is_empty() {
        return Err(CodegenError::EmptyTable);
    }
    if table.len() > MAX_SELECTORS {
        return Err(CodegenError::TableTooLarge(table.len()));
    }

    let mut out = String::new();
    writeln!(
        out,
        "/* Dispatcher generated from {} ({} function(s)). */",
        source.name,
        table.len()
    )?;
    writeln!(out, "/* Table digest: {} */", table.digest())?;
    writeln!(out)?;
    prologue::emit(&mut out, layout)?;
    writeln!(out)?;

    out.push_str(&source.source);
    if !source.source.ends_with('\n') {
        out.push('\n');
    }
    writeln!(out)?;

    emit_dispatch(&mut out, table)?;
    Ok(out)
}

// ══════════════════════════════════════════════════════════════════════════════
// Dispatch switch
// ══════════════════════════════════════════════════════════════════════════════

fn emit_dispatch(out: &mut String, table: &DispatcherTable) -> CodegenResult<()> {
    writeln!(out, "void corecall_dispatch(void)")?;
    writeln!(out, "{{")?;
    writeln!(out, "    if (cc_cmd_buffered() < 4u) {{")?;
    writeln!(out, "        return; /* no selector yet */")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    uint32_t selector = cc_read_u32();")?;
    writeln!(out, "    switch (selector) {{")?;
    for (selector, sig) in table.iter() {
        emit_case(out, selector, sig)?;
    }
    writeln!(out, "    default:")?;
    writeln!(
        out,
        "        /* unknown selector: host and dispatcher disagree on the table */"
    )?;
    writeln!(out, "        break;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "void corecall_serve(void)")?;
    writeln!(out, "{{")?;
    writeln!(out, "    for (;;) {{")?;
    writeln!(out, "        corecall_dispatch();")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn emit_case(out: &mut String, selector: u32, sig: &FunctionSignature) -> CodegenResult<()> {
    writeln!(out, "    case {selector}u: {{ /* {} */", sig.canonical())?;

    let mut args: Vec<String> = Vec::with_capacity(sig.params.len());
    for p in &sig.params {
        match p.desc.resolve() {
            TypeDescriptor::Primitive(prim) => {
                writeln!(
                    out,
                    "        {} {} = {};",
                    value_ctype(&p.desc)?,
                    p.name,
                    read_expr(prim)?
                )?;
                args.push(p.name.clone());
            }
            TypeDescriptor::VoidPointer => {
                writeln!(
                    out,
                    "        void *{} = (void *)(uintptr_t)cc_read_u32();",
                    p.name
                )?;
                args.push(p.name.clone());
            }
            TypeDescriptor::Pointer(elem) | TypeDescriptor::ConstPointer(elem) => {
                let prim = elem_primitive(elem)?;
                writeln!(out, "        uint16_t {}_len = cc_read_u16();", p.name)?;
                writeln!(
                    out,
                    "        {} {}[{}_len ? {}_len : 1];",
                    scalar_ctype(&prim)?,
                    p.name,
                    p.name,
                    p.name
                )?;
                writeln!(
                    out,
                    "        cc_read_bytes((uint8_t *){}, (uint32_t){}_len * {}u);",
                    p.name, p.name, prim.width
                )?;
                args.push(p.name.clone());
            }
            other => {
                return Err(CodegenError::Internal(format!(
                    "parameter '{}' of '{}' has no argument materialisation: {}",
                    p.name,
                    sig.name,
                    other.canonical()
                )))
            }
        }
    }

    let arglist = args.join(", ");
    if sig.ret.is_void() {
        writeln!(out, "        {}({});", sig.name, arglist)?;
    } else {
        writeln!(
            out,
            "        {} cc_ret = {}({});",
            value_ctype(&sig.ret)?,
            sig.name,
            arglist
        )?;
    }

    if !sig.blocks() {
        writeln!(out, "        cc_write_u8(2u); /* ack only, the host is not waiting */")?;
    } else {
        writeln!(out, "        cc_write_u8(0u);")?;
        for p in sig.params.iter().filter(|p| p.desc.needs_readback()) {
            let prim = match p.desc.resolve() {
                TypeDescriptor::Pointer(elem) => elem_primitive(elem)?,
                other => {
                    return Err(CodegenError::Internal(format!(
                        "readback parameter '{}' of '{}' is not a pointer: {}",
                        p.name,
                        sig.name,
                        other.canonical()
                    )))
                }
            };
            writeln!(out, "        cc_write_u16({}_len);", p.name)?;
            writeln!(
                out,
                "        cc_write_bytes((const uint8_t *){}, (uint32_t){}_len * {}u);",
                p.name, p.name, prim.width
            )?;
        }
        if !sig.ret.is_void() {
            let prim = ret_primitive(&sig.ret, sig)?;
            writeln!(out, "        {};", write_stmt(&prim, "cc_ret")?)?;
        }
    }

    writeln!(out, "        break;")?;
    writeln!(out, "    }}")?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Scalar mapping
// ══════════════════════════════════════════════════════════════════════════════

/// C type name of a by-value descriptor. An alias keeps its typedef name,
/// which the application source above the dispatcher defines.
fn value_ctype(desc: &TypeDescriptor) -> CodegenResult<String> {
    if let Some(name) = desc.alias_name() {
        return Ok(name.to_string());
    }
    match desc {
        TypeDescriptor::Primitive(prim) => Ok(scalar_ctype(prim)?.to_string()),
        other => Err(CodegenError::Internal(format!(
            "no by-value C type for {}",
            other.canonical()
        ))),
    }
}

fn scalar_ctype(prim: &Primitive) -> CodegenResult<&'static str> {
    let name = match (prim.encoding, prim.width, prim.signed) {
        (Encoding::Ieee754, 4, _) => "float",
        (Encoding::Ieee754, 8, _) => "double",
        (Encoding::Integer, 1, true) => "int8_t",
        (Encoding::Integer, 1, false) => "uint8_t",
        (Encoding::Integer, 2, true) => "int16_t",
        (Encoding::Integer, 2, false) => "uint16_t",
        (Encoding::Integer, 4, true) => "int32_t",
        (Encoding::Integer, 4, false) => "uint32_t",
        (Encoding::Integer, 8, true) => "int64_t",
        (Encoding::Integer, 8, false) => "uint64_t",
        _ => {
            return Err(CodegenError::Internal(format!(
                "no C scalar for width {} encoding {:?}",
                prim.width, prim.encoding
            )))
        }
    };
    Ok(name)
}

fn read_expr(prim: &Primitive) -> CodegenResult<String> {
    let expr = match (prim.encoding, prim.width) {
        (Encoding::Ieee754, 4) => "cc_read_f32()".to_string(),
        (Encoding::Ieee754, 8) => "cc_read_f64()".to_string(),
        (Encoding::Integer, w) => {
            format!("({})cc_read_u{}()", scalar_ctype(prim)?, u32::from(w) * 8)
        }
        _ => {
            return Err(CodegenError::Internal(format!(
                "no read primitive for width {}",
                prim.width
            )))
        }
    };
    Ok(expr)
}

fn write_stmt(prim: &Primitive, expr: &str) -> CodegenResult<String> {
    let stmt = match (prim.encoding, prim.width) {
        (Encoding::Ieee754, 4) => format!("cc_write_f32({expr})"),
        (Encoding::Ieee754, 8) => format!("cc_write_f64({expr})"),
        (Encoding::Integer, w) => {
            let bits = u32::from(w) * 8;
            format!("cc_write_u{bits}((uint{bits}_t){expr})")
        }
        _ => {
            return Err(CodegenError::Internal(format!(
                "no write primitive for width {}",
                prim.width
            )))
        }
    };
    Ok(stmt)
}

fn elem_primitive(elem: &TypeDescriptor) -> CodegenResult<Primitive> {
    match elem.resolve() {
        TypeDescriptor::Primitive(prim) => Ok(*prim),
        other => Err(CodegenError::Internal(format!(
            "pointer element is not a scalar: {}",
            other.canonical()
        ))),
    }
}

fn ret_primitive(ret: &TypeDescriptor, sig: &FunctionSignature) -> CodegenResult<Primitive> {
    match ret.resolve() {
        TypeDescriptor::Primitive(prim) => Ok(*prim),
        other => Err(CodegenError::Internal(format!(
            "return of '{}' is not a scalar: {}",
            sig.name,
            other.canonical()
        ))),
    }
}
