//! The format specifier mini-language and its resolver.
//!
//! A field's format parameter is one of: a literal specifier string
//! (optional endianness marker followed by a single type code, e.g. `"<I"`
//! or `"12s"`), a literal byte count (size-only shorthand for raw bytes),
//! or a deferred expression producing either. Literal strings are checked at
//! schema build time; deferred results are checked when they are produced.

use crate::context::Context;
use crate::errors::CodecError;
use crate::expr::Expr;

/// Byte order applied to multi-byte primitive codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=` — whatever the target uses.
    Native,
    /// `!` — big-endian, by convention.
    Network,
}

impl Endianness {
    pub(crate) fn is_little(self) -> bool {
        match self {
            Endianness::Little => true,
            Endianness::Big | Endianness::Network => false,
            Endianness::Native => cfg!(target_endian = "little"),
        }
    }

    fn from_marker(c: char) -> Option<Self> {
        match c {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '=' => Some(Endianness::Native),
            '!' => Some(Endianness::Network),
            _ => None,
        }
    }
}

/// A single primitive type code from the conventional struct-format set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    /// Fixed-length byte string (`Ns`).
    Bytes(usize),
}

impl Code {
    /// Exact byte span this code reads or writes.
    pub fn size(&self) -> usize {
        match self {
            Code::I8 | Code::U8 | Code::Bool => 1,
            Code::I16 | Code::U16 => 2,
            Code::I32 | Code::U32 | Code::F32 => 4,
            Code::I64 | Code::U64 | Code::F64 => 8,
            Code::Bytes(n) => *n,
        }
    }
}

/// A parsed specifier: optional endianness marker plus one type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spec {
    pub endian: Option<Endianness>,
    pub code: Code,
}

/// An unresolved format parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// A specifier string, parsed when resolved.
    Spec(String),
    /// A plain byte count: raw bytes of that exact length.
    Size(usize),
}

impl From<&str> for Format {
    fn from(s: &str) -> Self {
        Format::Spec(s.to_string())
    }
}

impl From<String> for Format {
    fn from(s: String) -> Self {
        Format::Spec(s)
    }
}

impl From<usize> for Format {
    fn from(n: usize) -> Self {
        Format::Size(n)
    }
}

impl From<&str> for Expr<Format> {
    fn from(s: &str) -> Self {
        Expr::Lit(Format::Spec(s.to_string()))
    }
}

impl From<usize> for Expr<Format> {
    fn from(n: usize) -> Self {
        Expr::Lit(Format::Size(n))
    }
}

/// Parses a specifier string. A numeric length prefix is only meaningful
/// for `s`; other codes describe exactly one value.
pub fn parse_spec(fmt: &str) -> Result<Spec, CodecError> {
    let bad = || CodecError::UnsupportedSpecifier(fmt.to_string());

    let mut chars = fmt.chars();
    let mut rest = fmt;
    let endian = match chars.next() {
        Some(c) => {
            let marker = Endianness::from_marker(c);
            if marker.is_some() {
                rest = &fmt[c.len_utf8()..];
            }
            marker
        }
        None => return Err(bad()),
    };

    let code_char = rest.chars().next_back().ok_or_else(bad)?;
    let count = &rest[..rest.len() - code_char.len_utf8()];
    let len: Option<usize> = if count.is_empty() {
        None
    } else {
        Some(count.parse().map_err(|_| bad())?)
    };

    let code = match (code_char, len) {
        ('s', n) => Code::Bytes(n.unwrap_or(1)),
        (_, Some(_)) => return Err(bad()),
        ('b', None) => Code::I8,
        ('B', None) => Code::U8,
        ('h', None) => Code::I16,
        ('H', None) => Code::U16,
        ('i', None) => Code::I32,
        ('I', None) => Code::U32,
        ('q', None) => Code::I64,
        ('Q', None) => Code::U64,
        ('f', None) => Code::F32,
        ('d', None) => Code::F64,
        ('?', None) => Code::Bool,
        _ => return Err(bad()),
    };

    Ok(Spec { endian, code })
}

/// A resolved format parameter: a primitive codec entry, or a raw byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Prim { code: Code, endian: Endianness },
    Raw(usize),
}

impl Resolved {
    pub fn size(&self) -> usize {
        match self {
            Resolved::Prim { code, .. } => code.size(),
            Resolved::Raw(n) => *n,
        }
    }
}

/// Resolves a format parameter at the moment it is needed: literals
/// verbatim, deferred expressions against the current context, then applies
/// the schema's default endianness where the specifier carries no marker.
pub fn resolve(
    fmt: &Expr<Format>,
    ctx: &Context<'_, '_>,
    default_endian: Endianness,
) -> Result<Resolved, CodecError> {
    match fmt.eval(ctx)? {
        Format::Size(n) => Ok(Resolved::Raw(n)),
        Format::Spec(s) => {
            let spec = parse_spec(&s)?;
            Ok(Resolved::Prim {
                code: spec.code,
                endian: spec.endian.unwrap_or(default_endian),
            })
        }
    }
}
