//! The primitive codec table: scalar encode/decode for each type code,
//! width and endianness. Pure and stateless; the field layer decides how
//! many bytes to move and where.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::errors::CodecError;
use crate::format::{Code, Endianness};
use crate::value::{TypeTag, Value};

fn code_name(code: Code) -> String {
    match code {
        Code::I8 => "i8".to_string(),
        Code::U8 => "u8".to_string(),
        Code::I16 => "i16".to_string(),
        Code::U16 => "u16".to_string(),
        Code::I32 => "i32".to_string(),
        Code::U32 => "u32".to_string(),
        Code::I64 => "i64".to_string(),
        Code::U64 => "u64".to_string(),
        Code::F32 => "f32".to_string(),
        Code::F64 => "f64".to_string(),
        Code::Bool => "bool".to_string(),
        Code::Bytes(n) => format!("{n}s"),
    }
}

fn expected_tag(code: Code) -> TypeTag {
    match code {
        Code::I8 | Code::I16 | Code::I32 | Code::I64 => TypeTag::Int,
        Code::U8 | Code::U16 | Code::U32 | Code::U64 => TypeTag::Uint,
        Code::F32 | Code::F64 => TypeTag::Float,
        Code::Bool => TypeTag::Bool,
        Code::Bytes(_) => TypeTag::Bytes,
    }
}

fn mismatch(code: Code, value: &Value) -> CodecError {
    CodecError::ValueTypeMismatch {
        name: code_name(code),
        expected: expected_tag(code),
        got: value.describe(),
    }
}

fn out_of_range(code: Code, value: &Value) -> CodecError {
    CodecError::ValueOutOfRange {
        fmt: code_name(code),
        value: value.describe(),
    }
}

fn read_uint(bytes: &[u8], little: bool) -> u64 {
    if little {
        LittleEndian::read_uint(bytes, bytes.len())
    } else {
        BigEndian::read_uint(bytes, bytes.len())
    }
}

fn read_int(bytes: &[u8], little: bool) -> i64 {
    if little {
        LittleEndian::read_int(bytes, bytes.len())
    } else {
        BigEndian::read_int(bytes, bytes.len())
    }
}

/// Decodes exactly `code.size()` bytes into a [Value].
pub fn decode(code: Code, endian: Endianness, bytes: &[u8]) -> Result<Value, CodecError> {
    if bytes.len() < code.size() {
        return Err(CodecError::UnexpectedEndOfStream {
            needed: code.size(),
            got: bytes.len(),
        });
    }
    let bytes = &bytes[..code.size()];
    let little = endian.is_little();
    let value = match code {
        Code::U8 | Code::U16 | Code::U32 | Code::U64 => Value::U64(read_uint(bytes, little)),
        Code::I8 | Code::I16 | Code::I32 | Code::I64 => Value::I64(read_int(bytes, little)),
        Code::F32 => {
            let v = if little {
                LittleEndian::read_f32(bytes)
            } else {
                BigEndian::read_f32(bytes)
            };
            Value::F64(v as f64)
        }
        Code::F64 => Value::F64(if little {
            LittleEndian::read_f64(bytes)
        } else {
            BigEndian::read_f64(bytes)
        }),
        Code::Bool => Value::Bool(bytes[0] != 0),
        Code::Bytes(n) => Value::Bytes(bytes[..n].to_vec()),
    };
    Ok(value)
}

fn encode_uint(code: Code, little: bool, value: &Value) -> Result<Vec<u8>, CodecError> {
    let v = value.as_u64().ok_or_else(|| mismatch(code, value))?;
    let size = code.size();
    let max = if size == 8 { u64::MAX } else { (1u64 << (size * 8)) - 1 };
    if v > max {
        return Err(out_of_range(code, value));
    }
    let mut buf = vec![0u8; size];
    if little {
        LittleEndian::write_uint(&mut buf, v, size);
    } else {
        BigEndian::write_uint(&mut buf, v, size);
    }
    Ok(buf)
}

fn encode_int(code: Code, little: bool, value: &Value) -> Result<Vec<u8>, CodecError> {
    let v = value.as_i64().ok_or_else(|| mismatch(code, value))?;
    let size = code.size();
    if size < 8 {
        let max = (1i64 << (size * 8 - 1)) - 1;
        let min = -(1i64 << (size * 8 - 1));
        if v < min || v > max {
            return Err(out_of_range(code, value));
        }
    }
    let mut buf = vec![0u8; size];
    if little {
        LittleEndian::write_int(&mut buf, v, size);
    } else {
        BigEndian::write_int(&mut buf, v, size);
    }
    Ok(buf)
}

/// Encodes a [Value] into exactly `code.size()` bytes. Fixed-length byte
/// strings are zero-padded or truncated to the declared length.
pub fn encode(code: Code, endian: Endianness, value: &Value) -> Result<Vec<u8>, CodecError> {
    let little = endian.is_little();
    match code {
        Code::U8 | Code::U16 | Code::U32 | Code::U64 => encode_uint(code, little, value),
        Code::I8 | Code::I16 | Code::I32 | Code::I64 => encode_int(code, little, value),
        Code::F32 => {
            let v = value.as_f64().ok_or_else(|| mismatch(code, value))?;
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                return Err(out_of_range(code, value));
            }
            let mut buf = vec![0u8; 4];
            if little {
                LittleEndian::write_f32(&mut buf, v as f32);
            } else {
                BigEndian::write_f32(&mut buf, v as f32);
            }
            Ok(buf)
        }
        Code::F64 => {
            let v = value.as_f64().ok_or_else(|| mismatch(code, value))?;
            let mut buf = vec![0u8; 8];
            if little {
                LittleEndian::write_f64(&mut buf, v);
            } else {
                BigEndian::write_f64(&mut buf, v);
            }
            Ok(buf)
        }
        Code::Bool => {
            let v = value.as_bool().ok_or_else(|| mismatch(code, value))?;
            Ok(vec![v as u8])
        }
        Code::Bytes(n) => {
            let bytes = value.as_bytes().ok_or_else(|| mismatch(code, value))?;
            let mut buf = bytes.to_vec();
            buf.resize(n, 0x00);
            Ok(buf)
        }
    }
}
