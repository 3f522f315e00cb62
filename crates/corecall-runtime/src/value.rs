//! Host-side runtime values crossing the call boundary.

use std::fmt;

use crate::error::{CallError, CallResult};

/// A value passed to or returned from a remote function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value; the return of `void` functions.
    Void,
    /// Any integer scalar, regardless of declared width.
    Int(i64),
    /// Any floating scalar.
    Float(f64),
    Bool(bool),
    /// A buffer argument: scalar elements, length-prefixed on the wire.
    Array(Vec<Value>),
    /// A raw address in the embedded address space, for `void *`.
    PhysAddr(u32),
    /// A scalar returned through a typedef: the raw value plus the
    /// alias name, so a handle stays distinguishable from a bare int.
    Tagged { alias: String, value: Box<Value> },
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::PhysAddr(_) => "address",
            Value::Tagged { .. } => "tagged",
        }
    }

    /// The typedef name this value came back through, if any.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Value::Tagged { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// Integer content. Bools coerce the way C does, and a tagged
    /// value converts through its payload so handles can be passed
    /// straight back as arguments.
    pub fn as_i64(&self, name: &str) -> CallResult<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Tagged { value, .. } => value.as_i64(name),
            other => Err(mismatch(name, "int", other)),
        }
    }

    /// Float content. Integers widen losslessly enough for marshalling.
    pub fn as_f64(&self, name: &str) -> CallResult<f64> {
        match self {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Tagged { value, .. } => value.as_f64(name),
            other => Err(mismatch(name, "float", other)),
        }
    }

    pub fn as_array(&self, name: &str) -> CallResult<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(mismatch(name, "array", other)),
        }
    }

    /// Address content for `void *` arguments. A plain non-negative
    /// integer is accepted too.
    pub fn as_addr(&self, name: &str) -> CallResult<u32> {
        match self {
            Value::PhysAddr(a) => Ok(*a),
            Value::Int(v) if *v >= 0 && *v <= i64::from(u32::MAX) => Ok(*v as u32),
            Value::Tagged { value, .. } => value.as_addr(name),
            other => Err(mismatch(name, "address", other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::PhysAddr(a) => write!(f, "{a:#010x}"),
            Value::Tagged { alias, value } => write!(f, "{alias}({value})"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> CallError {
    CallError::TypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got: got.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::Int(7).as_i64("x").unwrap(), 7);
        assert_eq!(Value::Bool(true).as_i64("x").unwrap(), 1);
        assert_eq!(Value::Int(2).as_f64("x").unwrap(), 2.0);
        assert_eq!(Value::PhysAddr(0x100).as_addr("x").unwrap(), 0x100);
        assert_eq!(Value::Int(0x80).as_addr("x").unwrap(), 0x80);
        assert!(Value::Float(1.5).as_i64("x").is_err());
        assert!(Value::Int(-1).as_addr("x").is_err());
    }

    #[test]
    fn test_tagged_converts_through_its_payload() {
        let handle = Value::Tagged {
            alias: "motor".to_string(),
            value: Box::new(Value::Int(3)),
        };
        assert_eq!(handle.as_i64("m").unwrap(), 3);
        assert_eq!(handle.alias(), Some("motor"));
        assert_eq!(handle.to_string(), "motor(3)");
    }

    #[test]
    fn test_display() {
        let v = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
        assert_eq!(Value::PhysAddr(0x4200_0000).to_string(), "0x42000000");
    }
}
