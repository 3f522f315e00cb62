//! Extracted signature model: functions, enums, typedef groups and the
//! dispatcher table that assigns selectors.

use crate::descriptor::TypeDescriptor;
use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Function Signatures
// ══════════════════════════════════════════════════════════════════════════════

/// One marshalled parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub desc: TypeDescriptor,
}

/// A callable signature extracted from the declaration source.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: TypeDescriptor,
    /// Logical file the declaration came from.
    pub file: String,
    /// Declaration location — used to pull the preceding comment block.
    pub span: Span,
    /// Docstring scraped from the comment run above the declaration.
    pub doc: Option<String>,
}

impl FunctionSignature {
    /// Whether a call must wait for a response: true unless the function
    /// is void-returning and has no mutable-pointer outputs.
    pub fn blocks(&self) -> bool {
        !self.ret.is_void() || self.params.iter().any(|p| p.desc.needs_readback())
    }

    /// Canonical one-line form feeding the table digest.
    pub fn canonical(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.desc.canonical()).collect();
        format!("{}({})->{}", self.name, params.join(","), self.ret.canonical())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Enums
// ══════════════════════════════════════════════════════════════════════════════

/// A C enum with fully resolved values (auto-increment applied).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    /// Enum tag or typedef name; anonymous enums have none.
    pub name: Option<String>,
    /// Logical file the enum was declared in — drives constant grouping.
    pub file: String,
    /// Label → value, in declaration order.
    pub entries: Vec<(String, i64)>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Typedef Groups
// ══════════════════════════════════════════════════════════════════════════════

/// A named type plus the functions prefixed `<typedef>_` that act on it.
///
/// A matched function whose first parameter resolves to the typedef takes
/// it as an implicit receiver; the suffix becomes the method name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefGroup {
    pub name: String,
    pub desc: TypeDescriptor,
    pub file: String,
    pub methods: Vec<GroupMethod>,
}

/// One method bound to a typedef group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMethod {
    /// The part after `<typedef>_` in the function name.
    pub suffix: String,
    /// Selector of the underlying function in the dispatcher table.
    pub selector: u32,
    /// Whether the first parameter is the receiver.
    pub takes_receiver: bool,
}

// ══════════════════════════════════════════════════════════════════════════════
// Dispatcher Table
// ══════════════════════════════════════════════════════════════════════════════

/// The full ordered signature list, selectors assigned densely by
/// declaration order. Stable for the lifetime of one generated program.
///
/// The wire protocol carries no schema handshake: the selector order here
/// IS the API version. `digest` is a fingerprint of the canonical signature
/// layout so tooling can detect a host/embedded build mismatch that the
/// protocol itself would silently corrupt on.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherTable {
    functions: Vec<FunctionSignature>,
    digest: String,
}

impl DispatcherTable {
    /// Assemble a table. The caller (the extractor) supplies the digest
    /// computed over the canonical signature list.
    pub fn new(functions: Vec<FunctionSignature>, digest: String) -> Self {
        Self { functions, digest }
    }

    /// Selector for a function name, if present.
    pub fn selector_of(&self, name: &str) -> Option<u32> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as u32)
    }

    /// Signature at a selector.
    pub fn get(&self, selector: u32) -> Option<&FunctionSignature> {
        self.functions.get(selector as usize)
    }

    /// Signature by name.
    pub fn by_name(&self, name: &str) -> Option<(u32, &FunctionSignature)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (i as u32, f))
    }

    /// Iterate `(selector, signature)` in selector order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &FunctionSignature)> {
        self.functions.iter().enumerate().map(|(i, f)| (i as u32, f))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Layout fingerprint (hex). Identical digests mean identical selector
    /// assignment and identical wire encodings on both sides.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// One-line human summary.
    pub fn describe(&self) -> String {
        format!(
            "{} function(s), digest {}",
            self.functions.len(),
            &self.digest[..self.digest.len().min(12)]
        )
    }
}
