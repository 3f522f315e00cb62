//! Wire marshalling: runtime values to command frames and response
//! frames back to values.
//!
//! Command frame: `u32` selector, then each argument in declaration
//! order. Scalars are raw little-endian at their declared width;
//! buffers are a `u16` element count followed by the elements; `void *`
//! is a `u32` address with the configured base OR'd in.
//!
//! Response stream: tagged frames. Tag `1` is an interleaved print
//! service message, tag `2` the ack of an earlier call nobody waits on,
//! tag `0` the terminal frame: mutable-buffer readbacks in declaration
//! order (count echo first), then the return value.

use log::{debug, info};

use corecall_types::descriptor::{Encoding, Primitive, SemanticOverride, TypeDescriptor};
use corecall_types::sig::FunctionSignature;

use crate::channel::Channel;
use crate::errno;
use crate::error::{CallError, CallResult};
use crate::mailbox::Wait;
use crate::value::Value;

const TAG_DONE: u8 = 0;
const TAG_PRINT: u8 = 1;
const TAG_ACK: u8 = 2;

/// Execute one call end to end. Mutable-buffer arguments are replaced
/// in place with the values read back from the target.
pub(crate) fn perform_call(
    channel: &mut Channel,
    selector: u32,
    sig: &FunctionSignature,
    args: &mut [Value],
) -> CallResult<Value> {
    if args.len() != sig.params.len() {
        return Err(CallError::Arity {
            name: sig.name.clone(),
            expected: sig.params.len(),
            given: args.len(),
        });
    }

    let wait = channel.wait();
    let mut frame = Vec::with_capacity(16);
    frame.extend_from_slice(&selector.to_le_bytes());

    // Element counts actually sent, in declaration order, for the
    // readback echo check.
    let mut sent_counts: Vec<u16> = Vec::new();
    for (param, value) in sig.params.iter().zip(args.iter()) {
        if let Some(count) =
            encode_arg(&param.desc, value, &param.name, channel.void_ptr_base(), &mut frame)?
        {
            sent_counts.push(count);
        }
    }

    debug!("call {} (selector {}, {} bytes)", sig.name, selector, frame.len());
    channel.send(&frame, wait)?;

    if !sig.blocks() {
        return Ok(Value::Void);
    }

    // Service tags until the terminal frame.
    loop {
        match channel.read_u8(wait)? {
            TAG_DONE => break,
            TAG_PRINT => {
                let len = channel.read_u16(wait)? as usize;
                let bytes = channel.read_vec(len, wait)?;
                info!("target: {}", String::from_utf8_lossy(&bytes));
            }
            TAG_ACK => continue,
            tag => {
                return Err(CallError::Protocol(format!(
                    "unexpected response tag {tag} for '{}'",
                    sig.name
                )))
            }
        }
    }

    // Readbacks, declaration order.
    let mut echo = sent_counts.into_iter();
    for (i, param) in sig.params.iter().enumerate() {
        if !param.desc.needs_readback() {
            continue;
        }
        let prim = pointer_element(&param.desc, &param.name)?;
        let sent = echo.next().ok_or_else(|| {
            CallError::Protocol(format!("lost the sent count for '{}'", param.name))
        })?;
        let count = channel.read_u16(wait)?;
        if count != sent {
            return Err(CallError::Protocol(format!(
                "readback of '{}' echoed {count} element(s), {sent} were sent",
                param.name
            )));
        }
        let bytes = channel.read_vec(count as usize * prim.width as usize, wait)?;
        args[i] = Value::Array(
            bytes
                .chunks_exact(prim.width as usize)
                .map(|chunk| decode_scalar(&prim, chunk))
                .collect(),
        );
    }

    decode_return(channel, sig, wait)
}

// ══════════════════════════════════════════════════════════════════════════════
// Encoding
// ══════════════════════════════════════════════════════════════════════════════

/// Encode one argument. Returns the element count for buffer arguments
/// so the caller can verify the readback echo.
fn encode_arg(
    desc: &TypeDescriptor,
    value: &Value,
    name: &str,
    void_ptr_base: u32,
    out: &mut Vec<u8>,
) -> CallResult<Option<u16>> {
    match desc.resolve() {
        TypeDescriptor::Primitive(prim) => {
            encode_scalar(prim, value, name, out)?;
            Ok(None)
        }
        TypeDescriptor::Pointer(_) | TypeDescriptor::ConstPointer(_) => {
            let prim = pointer_element(desc, name)?;
            let items = value.as_array(name)?;
            let count = u16::try_from(items.len()).map_err(|_| {
                CallError::Encode(format!(
                    "buffer '{name}' has {} elements, the wire limit is {}",
                    items.len(),
                    u16::MAX
                ))
            })?;
            out.extend_from_slice(&count.to_le_bytes());
            for item in items {
                encode_scalar(&prim, item, name, out)?;
            }
            // Only mutable buffers are echoed back.
            Ok(desc.needs_readback().then_some(count))
        }
        TypeDescriptor::VoidPointer => {
            let addr = value.as_addr(name)?;
            out.extend_from_slice(&(void_ptr_base | addr).to_le_bytes());
            Ok(None)
        }
        other => Err(CallError::Encode(format!(
            "'{name}' has no argument encoding: {}",
            other.canonical()
        ))),
    }
}

fn encode_scalar(
    prim: &Primitive,
    value: &Value,
    name: &str,
    out: &mut Vec<u8>,
) -> CallResult<()> {
    match prim.encoding {
        Encoding::Integer => {
            let v = value.as_i64(name)?;
            check_int_range(prim, v, name)?;
            out.extend_from_slice(&(v as u64).to_le_bytes()[..prim.width as usize]);
        }
        Encoding::Ieee754 => {
            let f = value.as_f64(name)?;
            if prim.width == 4 {
                out.extend_from_slice(&(f as f32).to_le_bytes());
            } else {
                out.extend_from_slice(&f.to_le_bytes());
            }
        }
    }
    Ok(())
}

fn check_int_range(prim: &Primitive, v: i64, name: &str) -> CallResult<()> {
    let bits = u32::from(prim.width) * 8;
    let fits = if prim.signed {
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        (i128::from(v) >= min) && (i128::from(v) <= max)
    } else {
        v >= 0 && (bits == 64 || i128::from(v) < (1i128 << bits))
    };
    if fits {
        Ok(())
    } else {
        Err(CallError::Encode(format!(
            "'{name}'={v} does not fit a {}-bit {} field",
            bits,
            if prim.signed { "signed" } else { "unsigned" }
        )))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Decoding
// ══════════════════════════════════════════════════════════════════════════════

fn decode_scalar(prim: &Primitive, bytes: &[u8]) -> Value {
    match prim.encoding {
        Encoding::Ieee754 => {
            if prim.width == 4 {
                let mut b = [0u8; 4];
                b.copy_from_slice(bytes);
                Value::Float(f64::from(f32::from_le_bytes(b)))
            } else {
                let mut b = [0u8; 8];
                b.copy_from_slice(bytes);
                Value::Float(f64::from_le_bytes(b))
            }
        }
        Encoding::Integer => {
            let mut b = [0u8; 8];
            b[..bytes.len()].copy_from_slice(bytes);
            let raw = u64::from_le_bytes(b);
            let v = if prim.signed {
                let shift = 64 - u32::from(prim.width) * 8;
                ((raw << shift) as i64) >> shift
            } else {
                raw as i64
            };
            Value::Int(v)
        }
    }
}

fn decode_return(
    channel: &mut Channel,
    sig: &FunctionSignature,
    wait: Wait,
) -> CallResult<Value> {
    if sig.ret.is_void() {
        return Ok(Value::Void);
    }
    let prim = match sig.ret.resolve() {
        TypeDescriptor::Primitive(prim) => *prim,
        other => {
            return Err(CallError::Protocol(format!(
                "return of '{}' is not a scalar: {}",
                sig.name,
                other.canonical()
            )))
        }
    };
    let bytes = channel.read_vec(prim.width as usize, wait)?;
    let value = decode_scalar(&prim, &bytes);

    match (sig.ret.semantic(), &value) {
        (Some(SemanticOverride::ErrnoInt), Value::Int(v)) if *v < 0 => {
            Err(CallError::Application {
                name: sig.name.clone(),
                code: -v,
                message: errno::message(-v),
            })
        }
        (Some(SemanticOverride::ErrnoBool), Value::Int(v)) => {
            if *v == 0 {
                Err(CallError::Failure(sig.name.clone()))
            } else {
                Ok(Value::Bool(true))
            }
        }
        (Some(SemanticOverride::NanFloat), Value::Float(f)) if f.is_nan() => {
            Err(CallError::Failure(sig.name.clone()))
        }
        _ => Ok(tag_alias(&sig.ret, value)),
    }
}

/// A value returned through a plain typedef keeps that identity, so a
/// handle produced by one call can be told apart from a bare integer.
/// Overridden aliases already turned into their convention above.
fn tag_alias(ret: &TypeDescriptor, value: Value) -> Value {
    match (ret.semantic(), ret.alias_name()) {
        (None, Some(alias)) => Value::Tagged {
            alias: alias.to_string(),
            value: Box::new(value),
        },
        _ => value,
    }
}

fn pointer_element(desc: &TypeDescriptor, name: &str) -> CallResult<Primitive> {
    match desc.resolve() {
        TypeDescriptor::Pointer(elem) | TypeDescriptor::ConstPointer(elem) => {
            match elem.resolve() {
                TypeDescriptor::Primitive(prim) => Ok(*prim),
                other => Err(CallError::Encode(format!(
                    "buffer '{name}' element is not a scalar: {}",
                    other.canonical()
                ))),
            }
        }
        other => Err(CallError::Encode(format!(
            "'{name}' is not a buffer: {}",
            other.canonical()
        ))),
    }
}
