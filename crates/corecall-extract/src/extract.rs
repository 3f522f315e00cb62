//! The extraction walk: declarations → dispatcher table, enum definitions,
//! typedef groups, docstrings, and the table digest.

use corecall_parser::parse_source;
use corecall_types::ast::{Decl, EnumDecl, FunctionDecl};
use corecall_types::descriptor::TypeDescriptor;
use corecall_types::sig::{
    DispatcherTable, EnumDefinition, FunctionSignature, GroupMethod, Parameter, TypedefGroup,
};
use corecall_types::{BindError, Diagnostics, ErrorCode, SourceFile, Span};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::derive::Deriver;
use crate::registry::Registry;

/// Everything one bind of one source body produces.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub table: DispatcherTable,
    pub enums: Vec<EnumDefinition>,
    pub groups: Vec<TypedefGroup>,
    pub diagnostics: Diagnostics,
}

/// Extract leniently: functions that cannot be marshalled are omitted with
/// a warning; only syntax problems count as errors.
pub fn extract(source: &SourceFile, registry: &Registry) -> Extraction {
    let parsed = parse_source(source);
    let mut diagnostics = parsed.errors;

    let mut typedefs: BTreeMap<String, TypeDescriptor> = BTreeMap::new();
    // Declaration order, for deterministic group output.
    let mut typedef_order: Vec<(String, TypeDescriptor, String)> = Vec::new();
    let mut enums = Vec::new();
    let mut functions: Vec<FunctionSignature> = Vec::new();

    for decl in &parsed.unit.decls {
        // Declarations pulled in from system/toolchain headers are not
        // callable surface.
        if registry.is_system_file(decl.file()) {
            continue;
        }

        match decl {
            Decl::Typedef(td) => {
                let deriver = Deriver::new(registry, &typedefs);
                match deriver.derive(&td.ty) {
                    Ok(desc) => {
                        if typedefs.contains_key(&td.name.name) {
                            warn(
                                &mut diagnostics,
                                source,
                                &td.file,
                                td.span,
                                ErrorCode::DUPLICATE_FUNCTION,
                                format!("typedef '{}' shadows an earlier definition", td.name.name),
                            );
                            continue;
                        }
                        typedefs.insert(td.name.name.clone(), desc.clone());
                        typedef_order.push((td.name.name.clone(), desc, td.file.clone()));
                    }
                    Err(e) => warn(
                        &mut diagnostics,
                        source,
                        &td.file,
                        td.span,
                        e.code,
                        format!("skipping typedef '{}': {}", td.name.name, e.message),
                    ),
                }
            }
            Decl::Enum(e) => {
                enums.push(resolve_enum(e, source, &mut diagnostics));
            }
            Decl::Function(f) => {
                if f.is_static {
                    continue; // internal linkage, never exported
                }
                if let Some(sig) =
                    extract_function(f, source, registry, &typedefs, &functions, &mut diagnostics)
                {
                    functions.push(sig);
                }
            }
        }
    }

    if functions.is_empty() {
        warn(
            &mut diagnostics,
            source,
            &source.name,
            Span::point(1, 1),
            ErrorCode::EMPTY_DISPATCH_TABLE,
            "no callable functions were extracted from this source",
        );
    }

    let digest = table_digest(&functions);
    let table = DispatcherTable::new(functions, digest);
    let groups = build_groups(&typedef_order, &table);

    Extraction {
        table,
        enums,
        groups,
        diagnostics,
    }
}

/// Extract, failing the whole bind if any diagnostic (error or derivation
/// skip) was raised.
pub fn extract_strict(source: &SourceFile, registry: &Registry) -> Result<Extraction, Diagnostics> {
    let extraction = extract(source, registry);
    if extraction.diagnostics.has_errors() || extraction.diagnostics.total_warnings > 0 {
        Err(extraction.diagnostics)
    } else {
        Ok(extraction)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

fn extract_function(
    f: &FunctionDecl,
    source: &SourceFile,
    registry: &Registry,
    typedefs: &BTreeMap<String, TypeDescriptor>,
    already: &[FunctionSignature],
    diagnostics: &mut Diagnostics,
) -> Option<FunctionSignature> {
    if already.iter().any(|s| s.name == f.name.name) {
        // Prototype followed by definition is normal; only the first
        // occurrence claims the selector.
        return None;
    }

    if f.variadic {
        warn(
            diagnostics,
            source,
            &f.file,
            f.span,
            ErrorCode::VARIADIC_FUNCTION,
            format!("skipping '{}': variadic parameter lists cannot be marshalled", f.name.name),
        );
        return None;
    }

    let deriver = Deriver::new(registry, typedefs);

    let ret = match deriver.derive_return(&f.ret) {
        Ok(desc) => desc,
        Err(e) => {
            warn(
                diagnostics,
                source,
                &f.file,
                f.span,
                e.code,
                format!("skipping '{}': {}", f.name.name, e.message),
            );
            return None;
        }
    };

    let mut params = Vec::with_capacity(f.params.len());
    for (i, p) in f.params.iter().enumerate() {
        let desc = match deriver.derive(&p.ty) {
            Ok(desc) => desc,
            Err(e) => {
                let pname = p
                    .name
                    .as_ref()
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| format!("#{}", i + 1));
                warn(
                    diagnostics,
                    source,
                    &f.file,
                    p.span,
                    e.code,
                    format!("skipping '{}': parameter '{}': {}", f.name.name, pname, e.message),
                );
                return None;
            }
        };
        if desc.is_void() {
            warn(
                diagnostics,
                source,
                &f.file,
                p.span,
                ErrorCode::VOID_PARAMETER,
                format!("skipping '{}': parameter {} has type 'void'", f.name.name, i + 1),
            );
            return None;
        }
        params.push(Parameter {
            name: p
                .name
                .as_ref()
                .map(|n| n.name.clone())
                .unwrap_or_else(|| format!("arg{i}")),
            desc,
        });
    }

    Some(FunctionSignature {
        name: f.name.name.clone(),
        params,
        ret,
        file: f.file.clone(),
        doc: scrape_doc(source, f.span.start_line),
        span: f.span,
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Enums
// ══════════════════════════════════════════════════════════════════════════════

/// Apply C auto-increment: an unlabeled entry is one more than the
/// previous entry's value; the first defaults to zero.
fn resolve_enum(e: &EnumDecl, source: &SourceFile, diagnostics: &mut Diagnostics) -> EnumDefinition {
    let mut entries: Vec<(String, i64)> = Vec::with_capacity(e.enumerators.len());
    let mut next = 0i64;

    for en in &e.enumerators {
        let value = en.value.unwrap_or(next);
        // The counter advances past a duplicate too, so later unlabeled
        // entries keep their C values.
        next = value.wrapping_add(1);
        if entries.iter().any(|(name, _)| name == &en.name.name) {
            warn(
                diagnostics,
                source,
                &e.file,
                en.span,
                ErrorCode::DUPLICATE_ENUM_LABEL,
                format!("duplicate enumerator '{}'", en.name.name),
            );
            continue;
        }
        entries.push((en.name.name.clone(), value));
    }

    EnumDefinition {
        name: e.name.as_ref().map(|n| n.name.clone()),
        file: e.file.clone(),
        entries,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Typedef Groups
// ══════════════════════════════════════════════════════════════════════════════

fn build_groups(
    typedef_order: &[(String, TypeDescriptor, String)],
    table: &DispatcherTable,
) -> Vec<TypedefGroup> {
    let mut groups = Vec::new();

    for (name, desc, file) in typedef_order {
        let prefix = format!("{name}_");
        let mut methods = Vec::new();

        for (selector, sig) in table.iter() {
            let Some(suffix) = sig.name.strip_prefix(&prefix) else {
                continue;
            };
            if suffix.is_empty() {
                continue;
            }
            let takes_receiver = sig
                .params
                .first()
                .is_some_and(|p| alias_chain_contains(&p.desc, name));
            methods.push(GroupMethod {
                suffix: suffix.to_string(),
                selector,
                takes_receiver,
            });
        }

        if !methods.is_empty() {
            groups.push(TypedefGroup {
                name: name.clone(),
                desc: desc.clone(),
                file: file.clone(),
                methods,
            });
        }
    }

    groups
}

fn alias_chain_contains(desc: &TypeDescriptor, name: &str) -> bool {
    match desc {
        TypeDescriptor::NamedAlias {
            name: n,
            underlying,
            ..
        } => n == name || alias_chain_contains(underlying, name),
        _ => false,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Docstrings
// ══════════════════════════════════════════════════════════════════════════════

/// Pull the contiguous run of `//` lines, or the `/* ... */` block, that
/// ends on the line directly above the declaration. Best-effort: anything
/// unparseable just yields no docstring.
fn scrape_doc(source: &SourceFile, decl_line: u32) -> Option<String> {
    let mut line = decl_line.checked_sub(1)?;
    if line == 0 {
        return None;
    }

    let tail = source.line(line)?.trim();
    let mut collected: Vec<String> = Vec::new();

    if tail.ends_with("*/") {
        // Walk upward to the opening `/*`.
        loop {
            let text = source.line(line)?.trim().to_string();
            let opens = text.starts_with("/*");
            collected.push(text);
            if opens {
                break;
            }
            line = line.checked_sub(1)?;
            if line == 0 {
                return None;
            }
        }
        collected.reverse();
        let doc: Vec<String> = collected
            .iter()
            .map(|l| {
                l.trim_start_matches("/*")
                    .trim_end_matches("*/")
                    .trim_start_matches('*')
                    .trim()
                    .to_string()
            })
            .collect();
        let doc = doc.join("\n").trim().to_string();
        return if doc.is_empty() { None } else { Some(doc) };
    }

    while line > 0 {
        let text = source.line(line)?.trim().to_string();
        if let Some(rest) = text.strip_prefix("//") {
            collected.push(rest.trim().to_string());
            line -= 1;
        } else {
            break;
        }
    }

    if collected.is_empty() {
        return None;
    }
    collected.reverse();
    let doc = collected.join("\n").trim().to_string();
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Digest
// ══════════════════════════════════════════════════════════════════════════════

/// Fingerprint of the canonical signature layout. Two binds agree on
/// selectors and wire encodings exactly when their digests agree; the
/// wire protocol itself never checks this.
fn table_digest(functions: &[FunctionSignature]) -> String {
    let mut hasher = Sha256::new();
    for sig in functions {
        hasher.update(sig.canonical().as_bytes());
        hasher.update(b"\n");
    }
    let hash = hasher.finalize();
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn warn(
    diagnostics: &mut Diagnostics,
    source: &SourceFile,
    file: &str,
    span: Span,
    code: ErrorCode,
    message: impl Into<String>,
) {
    let source_line = source.line(span.start_line).unwrap_or("").to_string();
    diagnostics.push_warning(BindError::new(file, code, message, span, source_line));
}
