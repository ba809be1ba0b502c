//! The field variant model: typed descriptors for every field shape, the
//! composition constructors that build them, their build-time validation,
//! and the per-variant pack/unpack contract over a [Context].

use std::rc::Rc;

use indexmap::IndexMap;

use crate::codec;
use crate::context::Context;
use crate::errors::{BuildError, CodecError};
use crate::expr::Expr;
use crate::format::{self, Format, Resolved};
use crate::schema::Schema;
use crate::value::{TypeTag, Value};

/// A single named field in a schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Name used in the record and in context lookups.
    pub name: String,
    /// Declared value type, validated at build time and on pack.
    pub ty: TypeTag,
    /// Variant-specific shape and parameters.
    pub kind: FieldKind,
}

/// The supported field shapes.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A primitive or raw-bytes span, read/written via the codec table.
    Fixed {
        fmt: Expr<Format>,
        default: Option<Value>,
    },
    /// A fixed span whose value is recomputed from an expression on every
    /// pack; bytes are authoritative on unpack.
    Built {
        fmt: Expr<Format>,
        builder: Expr<Value>,
    },
    /// N fill bytes, skipped on unpack (optionally verified), emitted on
    /// pack. Carries no value.
    Padding {
        len: PadLen,
        fill: Option<u8>,
        check: Option<bool>,
    },
    /// Repositions the stream; carries no value.
    Seek { offset: Expr<u64>, absolute: bool },
    /// Moves relative to the current position; carries no value.
    Skip { delta: Expr<i64> },
    /// Wraps an inner field behind a predicate.
    Cond {
        when: Expr<bool>,
        if_false: Option<Value>,
        inner: Box<Field>,
    },
    /// Discriminated union: a key expression selects one of several inner
    /// fields.
    Switch {
        key: Expr<Value>,
        cases: Vec<SwitchCase>,
        default: Option<Box<SwitchCase>>,
    },
    /// An ordered sequence of one inner field, bounded by a count and/or a
    /// stop condition.
    Repeat {
        count: Option<Expr<u64>>,
        until: Option<Expr<bool>>,
        inner: Box<Field>,
    },
    /// A nested structure, processed by a recursive engine pass.
    Subfield {
        schema: Rc<Schema>,
        params: Vec<(String, Expr<Value>)>,
    },
}

/// How a padding field's byte count is determined.
#[derive(Debug, Clone)]
pub enum PadLen {
    /// Exactly N bytes.
    Bytes(Expr<u64>),
    /// Pad up to the next multiple of N, relative to the structure start or
    /// to the stream origin.
    Align { modulus: Expr<u64>, absolute: bool },
    /// Pad up to the given structure-relative offset.
    Until(Expr<u64>),
}

/// One arm of a switch field.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Normalized discriminant key (see [CaseKey]).
    pub key: String,
    /// Declared type of this arm, part of the switch's declared union.
    pub ty: TypeTag,
    pub field: Field,
}

impl SwitchCase {
    pub fn new(key: impl Into<CaseKey>, ty: TypeTag, field: Field) -> Self {
        SwitchCase {
            key: key.into().0,
            ty,
            field,
        }
    }
}

/// A switch-case key, normalized exactly like runtime discriminants:
/// integers by decimal rendering, booleans as `true`/`false`, names
/// verbatim. One normalization, used at build time and at dispatch time.
pub struct CaseKey(String);

impl From<u64> for CaseKey {
    fn from(v: u64) -> Self {
        CaseKey(v.to_string())
    }
}

impl From<i64> for CaseKey {
    fn from(v: i64) -> Self {
        CaseKey(v.to_string())
    }
}

impl From<i32> for CaseKey {
    fn from(v: i32) -> Self {
        CaseKey(v.to_string())
    }
}

impl From<u32> for CaseKey {
    fn from(v: u32) -> Self {
        CaseKey(v.to_string())
    }
}

impl From<bool> for CaseKey {
    fn from(v: bool) -> Self {
        CaseKey(if v { "true" } else { "false" }.to_string())
    }
}

impl From<&str> for CaseKey {
    fn from(v: &str) -> Self {
        CaseKey(v.to_string())
    }
}

/// Renders a runtime discriminant with the same normalization as [CaseKey].
pub fn switch_key(value: &Value) -> Result<String, CodecError> {
    match value {
        Value::U64(v) => Ok(v.to_string()),
        Value::I64(v) => Ok(v.to_string()),
        Value::Bool(v) => Ok(if *v { "true" } else { "false" }.to_string()),
        Value::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        other => Err(CodecError::ValueTypeMismatch {
            name: "switch discriminant".to_string(),
            expected: TypeTag::Union(vec![
                TypeTag::Int,
                TypeTag::Uint,
                TypeTag::Bool,
                TypeTag::Bytes,
            ]),
            got: other.describe(),
        }),
    }
}

// Composition constructors. Each returns an owned descriptor node; wrappers
// adopt the inner field's name.
impl Field {
    pub fn fixed(name: &str, ty: TypeTag, fmt: impl Into<Expr<Format>>) -> Self {
        Field {
            name: name.to_string(),
            ty,
            kind: FieldKind::Fixed {
                fmt: fmt.into(),
                default: None,
            },
        }
    }

    /// Static default used when a record is constructed without an explicit
    /// value. Only meaningful for fixed fields.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        if let FieldKind::Fixed { default, .. } = &mut self.kind {
            *default = Some(value.into());
        }
        self
    }

    pub fn built<F>(name: &str, ty: TypeTag, fmt: impl Into<Expr<Format>>, builder: F) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<Value, CodecError> + 'static,
    {
        Field {
            name: name.to_string(),
            ty,
            kind: FieldKind::Built {
                fmt: fmt.into(),
                builder: Expr::defer(builder),
            },
        }
    }

    pub fn padding(name: &str, len: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Padding {
                len: PadLen::Bytes(len.into()),
                fill: None,
                check: None,
            },
        }
    }

    /// Pads up to the next multiple of `modulus`, relative to the structure
    /// start.
    pub fn align(name: &str, modulus: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Padding {
                len: PadLen::Align {
                    modulus: modulus.into(),
                    absolute: false,
                },
                fill: None,
                check: None,
            },
        }
    }

    /// Pads up to the next multiple of `modulus` of the absolute stream
    /// position.
    pub fn align_abs(name: &str, modulus: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Padding {
                len: PadLen::Align {
                    modulus: modulus.into(),
                    absolute: true,
                },
                fill: None,
                check: None,
            },
        }
    }

    /// Pads up to the given structure-relative offset.
    pub fn align_to(name: &str, offset: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Padding {
                len: PadLen::Until(offset.into()),
                fill: None,
                check: None,
            },
        }
    }

    /// Overrides the schema's fill byte for this padding field.
    pub fn with_fill(mut self, byte: u8) -> Self {
        if let FieldKind::Padding { fill, .. } = &mut self.kind {
            *fill = Some(byte);
        }
        self
    }

    /// Overrides the schema's padding verification flag for this field.
    pub fn with_check(mut self, value: bool) -> Self {
        if let FieldKind::Padding { check, .. } = &mut self.kind {
            *check = Some(value);
        }
        self
    }

    /// Seeks to a structure-relative offset.
    pub fn seek(name: &str, offset: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Seek {
                offset: offset.into(),
                absolute: false,
            },
        }
    }

    /// Seeks to an absolute stream offset.
    pub fn seek_abs(name: &str, offset: impl Into<Expr<u64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Seek {
                offset: offset.into(),
                absolute: true,
            },
        }
    }

    /// Moves relative to the current position (backwards allowed).
    pub fn skip(name: &str, delta: impl Into<Expr<i64>>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::NoValue,
            kind: FieldKind::Skip {
                delta: delta.into(),
            },
        }
    }

    pub fn cond<F>(ty: TypeTag, when: F, inner: Field) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<bool, CodecError> + 'static,
    {
        Field {
            name: inner.name.clone(),
            ty,
            kind: FieldKind::Cond {
                when: Expr::defer(when),
                if_false: None,
                inner: Box::new(inner),
            },
        }
    }

    /// Value a conditional field takes on unpack when the predicate is
    /// false. Without it the field is simply absent.
    pub fn with_if_false(mut self, value: impl Into<Value>) -> Self {
        if let FieldKind::Cond { if_false, .. } = &mut self.kind {
            *if_false = Some(value.into());
        }
        self
    }

    pub fn switch<F>(name: &str, ty: TypeTag, key: F, cases: Vec<SwitchCase>) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<Value, CodecError> + 'static,
    {
        Field {
            name: name.to_string(),
            ty,
            kind: FieldKind::Switch {
                key: Expr::defer(key),
                cases,
                default: None,
            },
        }
    }

    /// Arm used when no case key matches the discriminant.
    pub fn with_default_case(mut self, ty: TypeTag, field: Field) -> Self {
        if let FieldKind::Switch { default, .. } = &mut self.kind {
            *default = Some(Box::new(SwitchCase {
                key: "default".to_string(),
                ty,
                field,
            }));
        }
        self
    }

    pub fn repeat(count: impl Into<Expr<u64>>, inner: Field) -> Self {
        Field {
            name: inner.name.clone(),
            ty: TypeTag::Array,
            kind: FieldKind::Repeat {
                count: Some(count.into()),
                until: None,
                inner: Box::new(inner),
            },
        }
    }

    /// Unbounded repetition stopped by a condition evaluated after each
    /// item, which sees the running index and the just-produced item.
    pub fn repeat_until<F>(until: F, inner: Field) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<bool, CodecError> + 'static,
    {
        Field {
            name: inner.name.clone(),
            ty: TypeTag::Array,
            kind: FieldKind::Repeat {
                count: None,
                until: Some(Expr::defer(until)),
                inner: Box::new(inner),
            },
        }
    }

    /// Adds a stop condition to a counted repeat.
    pub fn with_until<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<bool, CodecError> + 'static,
    {
        if let FieldKind::Repeat { until, .. } = &mut self.kind {
            *until = Some(Expr::defer(f));
        }
        self
    }

    pub fn subfield(name: &str, schema: Rc<Schema>) -> Self {
        Field {
            name: name.to_string(),
            ty: TypeTag::Struct,
            kind: FieldKind::Subfield {
                schema,
                params: Vec::new(),
            },
        }
    }

    /// Literal keyword parameter exposed to the nested structure's
    /// expressions as part of its `extra` scope.
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        if let FieldKind::Subfield { params, .. } = &mut self.kind {
            params.push((name.to_string(), Expr::Lit(value.into())));
        }
        self
    }

    /// Deferred keyword parameter, evaluated against the parent context
    /// when the nested structure is entered.
    pub fn with_param_expr<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Context<'_, '_>) -> Result<Value, CodecError> + 'static,
    {
        if let FieldKind::Subfield { params, .. } = &mut self.kind {
            params.push((name.to_string(), Expr::defer(f)));
        }
        self
    }
}

// Build-time validation and record defaults.
impl Field {
    fn type_error(&self, reason: &str) -> BuildError {
        BuildError::InvalidFieldType {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.name.is_empty() {
            return Err(BuildError::EmptyFieldName);
        }
        match &self.kind {
            FieldKind::Fixed { fmt, default } => {
                self.validate_value_type()?;
                check_literal_fmt(fmt)?;
                if let Some(d) = default {
                    if !self.ty.matches(d) {
                        return Err(self.type_error("default value does not fit declared type"));
                    }
                }
                Ok(())
            }
            FieldKind::Built { fmt, .. } => {
                self.validate_value_type()?;
                check_literal_fmt(fmt)
            }
            FieldKind::Padding { .. } | FieldKind::Seek { .. } | FieldKind::Skip { .. } => {
                if self.ty != TypeTag::NoValue {
                    return Err(self.type_error("padding and seek fields carry no value"));
                }
                Ok(())
            }
            FieldKind::Cond {
                if_false, inner, ..
            } => {
                inner.validate()?;
                if !self.ty.covers(&inner.ty) {
                    return Err(BuildError::CondTypeMismatch {
                        name: self.name.clone(),
                        reason: format!(
                            "inner field type {:?} is not covered by declared type {:?}",
                            inner.ty, self.ty
                        ),
                    });
                }
                if let Some(v) = if_false {
                    if !self.ty.matches(v) {
                        return Err(BuildError::CondTypeMismatch {
                            name: self.name.clone(),
                            reason: format!(
                                "when-false value ({}) is not covered by declared type {:?}",
                                v.describe(),
                                self.ty
                            ),
                        });
                    }
                }
                Ok(())
            }
            FieldKind::Switch { cases, default, .. } => {
                let mut seen: Vec<&str> = Vec::new();
                let mut tags: Vec<TypeTag> = Vec::new();
                let arms = cases.iter().chain(default.as_deref());
                for case in arms {
                    if case.key != "default" && seen.contains(&case.key.as_str()) {
                        return Err(BuildError::DuplicateSwitchCase {
                            name: self.name.clone(),
                            key: case.key.clone(),
                        });
                    }
                    seen.push(&case.key);
                    case.field.validate()?;
                    if case.ty != TypeTag::Any && !case.ty.covers(&case.field.ty) {
                        return Err(self.type_error(&format!(
                            "case '{}' inner field type {:?} does not fit case type {:?}",
                            case.key, case.field.ty, case.ty
                        )));
                    }
                    if !tags.contains(&case.ty) {
                        tags.push(case.ty.clone());
                    }
                }
                if !self.ty.is_union_of(&tags) {
                    return Err(BuildError::SwitchTypeMismatch {
                        name: self.name.clone(),
                        declared: self.ty.clone(),
                        cases: tags,
                    });
                }
                Ok(())
            }
            FieldKind::Repeat {
                count,
                until,
                inner,
            } => {
                if self.ty != TypeTag::Array {
                    return Err(self.type_error("repeat fields have the array type"));
                }
                if count.is_none() && until.is_none() {
                    return Err(BuildError::UnboundedRepeat {
                        name: self.name.clone(),
                    });
                }
                if inner.ty == TypeTag::NoValue {
                    return Err(self.type_error("repeat cannot wrap a no-value field"));
                }
                inner.validate()
            }
            FieldKind::Subfield { .. } => {
                if self.ty != TypeTag::Struct {
                    return Err(self.type_error("subfields have the struct type"));
                }
                Ok(())
            }
        }
    }

    fn validate_value_type(&self) -> Result<(), BuildError> {
        if self.ty == TypeTag::NoValue {
            return Err(self.type_error("value-carrying fields cannot use the no-value type"));
        }
        Ok(())
    }

    /// Initial value when a record is constructed: the fixed default, the
    /// not-yet-computed sentinel for built fields, empty containers where
    /// they are unambiguous, absence otherwise.
    pub(crate) fn default_value(&self) -> Option<Value> {
        match &self.kind {
            FieldKind::Fixed { default, .. } => default.clone(),
            FieldKind::Built { .. } => Some(Value::Unset),
            FieldKind::Padding { .. } | FieldKind::Seek { .. } | FieldKind::Skip { .. } => None,
            FieldKind::Cond { inner, .. } => inner.default_value(),
            FieldKind::Switch { .. } => None,
            FieldKind::Repeat { .. } => Some(Value::Array(Vec::new())),
            FieldKind::Subfield { schema, .. } => Some(Value::Struct(schema.record())),
        }
    }
}

// The pack/unpack contract.
impl Field {
    /// Reads this field from the stream. `None` means the field carries no
    /// value (padding family, false conditional without a when-false value).
    pub(crate) fn unpack(&self, ctx: &mut Context<'_, '_>) -> Result<Option<Value>, CodecError> {
        match &self.kind {
            FieldKind::Fixed { fmt, .. } | FieldKind::Built { fmt, .. } => {
                let value = self.read_fixed(ctx, fmt)?;
                Ok(Some(value))
            }
            FieldKind::Padding { .. } => {
                let (len, fill, check) = self.padding_params(ctx)?;
                let bytes = ctx.read_bytes(len)?;
                if check && bytes.iter().any(|b| *b != fill) {
                    return Err(CodecError::BadPadding(format!(
                        "expected {len} bytes of {fill:#04x}"
                    )));
                }
                Ok(None)
            }
            FieldKind::Seek { .. } | FieldKind::Skip { .. } => {
                self.reposition(ctx)?;
                Ok(None)
            }
            FieldKind::Cond {
                when,
                if_false,
                inner,
            } => {
                if when.eval(ctx)? {
                    inner.unpack(ctx)
                } else {
                    Ok(if_false.clone())
                }
            }
            FieldKind::Switch { .. } => {
                let case = self.switch_arm(ctx)?;
                case.field.unpack(ctx)
            }
            FieldKind::Repeat {
                count,
                until,
                inner,
            } => {
                let count = match count {
                    Some(c) => Some(c.eval(ctx)?),
                    None => None,
                };
                // an enclosing repeat on this frame keeps its own scope
                let saved = ctx.take_repeat();
                let mut items = Vec::new();
                let mut i: u64 = 0;
                loop {
                    if let Some(c) = count {
                        if i >= c {
                            break;
                        }
                    }
                    ctx.set_index(i);
                    let item = inner.unpack(ctx)?.unwrap_or(Value::Unset);
                    items.push(item.clone());
                    if let Some(until) = until {
                        ctx.set_item(item);
                        let stop = until.eval(ctx);
                        ctx.clear_item();
                        if stop? {
                            break;
                        }
                    }
                    i += 1;
                }
                ctx.restore_repeat(saved);
                Ok(Some(Value::Array(items)))
            }
            FieldKind::Subfield { schema, params } => {
                let extra = eval_params(params, ctx)?;
                let child = Context::nested(&*ctx, schema.config(), extra)?;
                let record = schema.unpack_fields(child)?;
                Ok(Some(Value::Struct(record)))
            }
        }
    }

    /// Writes this field to the stream. `value` is the record's current
    /// value, if any. Returns the recomputed value for built fields so the
    /// engine can publish it to the context.
    pub(crate) fn pack(
        &self,
        ctx: &mut Context<'_, '_>,
        value: Option<&Value>,
    ) -> Result<Option<Value>, CodecError> {
        match &self.kind {
            FieldKind::Fixed { fmt, .. } => {
                let value = self.required(value)?;
                self.check_type(value)?;
                self.write_fixed(ctx, fmt, value)?;
                Ok(None)
            }
            FieldKind::Built { fmt, builder } => {
                // whatever the record holds is discarded: the expression is
                // the single source of truth on pack
                let value = builder.eval(ctx)?;
                self.check_type(&value)?;
                self.write_fixed(ctx, fmt, &value)?;
                Ok(Some(value))
            }
            FieldKind::Padding { .. } => {
                let (len, fill, _) = self.padding_params(ctx)?;
                ctx.write_bytes(&vec![fill; len])?;
                Ok(None)
            }
            FieldKind::Seek { .. } | FieldKind::Skip { .. } => {
                self.reposition(ctx)?;
                Ok(None)
            }
            FieldKind::Cond { when, inner, .. } => {
                if when.eval(ctx)? {
                    inner.pack(ctx, value)
                } else {
                    Ok(None)
                }
            }
            FieldKind::Switch { .. } => {
                let case = self.switch_arm(ctx)?;
                case.field.pack(ctx, value)
            }
            FieldKind::Repeat { inner, .. } => {
                // counts are the producer's responsibility (typically a
                // built sibling); the stored sequence is packed as-is
                let value = self.required(value)?;
                let items = value.as_array().ok_or_else(|| self.mismatch(value))?;
                let saved = ctx.take_repeat();
                for (i, item) in items.iter().enumerate() {
                    ctx.set_index(i as u64);
                    inner.pack(ctx, Some(item))?;
                }
                ctx.restore_repeat(saved);
                Ok(None)
            }
            FieldKind::Subfield { schema, params } => {
                let value = self.required(value)?;
                let record = value.as_struct().ok_or_else(|| self.mismatch(value))?;
                let extra = eval_params(params, ctx)?;
                let mut child = Context::nested(&*ctx, schema.config(), extra)?;
                child.seed(record.values().clone());
                schema.pack_fields(child)?;
                Ok(None)
            }
        }
    }

    fn required<'v>(&self, value: Option<&'v Value>) -> Result<&'v Value, CodecError> {
        match value {
            Some(Value::Unset) | None => {
                Err(CodecError::UnknownContextName(self.name.clone()))
            }
            Some(v) => Ok(v),
        }
    }

    fn mismatch(&self, value: &Value) -> CodecError {
        CodecError::ValueTypeMismatch {
            name: self.name.clone(),
            expected: self.ty.clone(),
            got: value.describe(),
        }
    }

    fn check_type(&self, value: &Value) -> Result<(), CodecError> {
        if self.ty.matches(value) {
            Ok(())
        } else {
            Err(self.mismatch(value))
        }
    }

    fn read_fixed(
        &self,
        ctx: &mut Context<'_, '_>,
        fmt: &Expr<Format>,
    ) -> Result<Value, CodecError> {
        match format::resolve(fmt, ctx, ctx.config().endianness)? {
            Resolved::Raw(n) => Ok(Value::Bytes(ctx.read_bytes(n)?)),
            Resolved::Prim { code, endian } => {
                let bytes = ctx.read_bytes(code.size())?;
                codec::decode(code, endian, &bytes)
            }
        }
    }

    fn write_fixed(
        &self,
        ctx: &mut Context<'_, '_>,
        fmt: &Expr<Format>,
        value: &Value,
    ) -> Result<(), CodecError> {
        match format::resolve(fmt, ctx, ctx.config().endianness)? {
            Resolved::Raw(n) => {
                let bytes = value.as_bytes().ok_or_else(|| self.mismatch(value))?;
                if bytes.len() != n {
                    return Err(CodecError::ValueOutOfRange {
                        fmt: format!("{n} raw bytes"),
                        value: value.describe(),
                    });
                }
                ctx.write_bytes(bytes)
            }
            Resolved::Prim { code, endian } => {
                let bytes = codec::encode(code, endian, value)?;
                ctx.write_bytes(&bytes)
            }
        }
    }

    fn padding_params(&self, ctx: &Context<'_, '_>) -> Result<(usize, u8, bool), CodecError> {
        let FieldKind::Padding { len, fill, check } = &self.kind else {
            unreachable!("padding_params on a non-padding field");
        };
        let length = match len {
            PadLen::Bytes(e) => e.eval(ctx)?,
            PadLen::Align { modulus, absolute } => {
                let modulus = modulus.eval(ctx)?;
                if modulus == 0 {
                    return Err(CodecError::BadPadding("zero alignment modulus".to_string()));
                }
                let pos = if *absolute { ctx.tell()? } else { ctx.tell_rel()? };
                (modulus - pos % modulus) % modulus
            }
            PadLen::Until(e) => {
                let offset = e.eval(ctx)?;
                let pos = ctx.tell_rel()?;
                if offset < pos {
                    return Err(CodecError::BadPadding(format!(
                        "target offset {offset} is behind position {pos}"
                    )));
                }
                offset - pos
            }
        };
        Ok((
            length as usize,
            fill.unwrap_or(ctx.config().fill),
            check.unwrap_or(ctx.config().check_padding),
        ))
    }

    fn reposition(&self, ctx: &Context<'_, '_>) -> Result<(), CodecError> {
        match &self.kind {
            FieldKind::Seek { offset, absolute } => {
                let offset = offset.eval(ctx)?;
                if *absolute {
                    ctx.seek(offset)?;
                } else {
                    ctx.seek_rel(offset)?;
                }
                Ok(())
            }
            FieldKind::Skip { delta } => {
                ctx.skip(delta.eval(ctx)?)?;
                Ok(())
            }
            _ => unreachable!("reposition on a non-seek field"),
        }
    }

    fn switch_arm(&self, ctx: &Context<'_, '_>) -> Result<&SwitchCase, CodecError> {
        let FieldKind::Switch {
            key,
            cases,
            default,
        } = &self.kind
        else {
            unreachable!("switch_arm on a non-switch field");
        };
        let discriminant = key.eval(ctx)?;
        let key = switch_key(&discriminant)?;
        tracing::debug!(field = %self.name, key = %key, "switch dispatch");
        if let Some(case) = cases.iter().find(|c| c.key == key) {
            return Ok(case);
        }
        match default {
            Some(case) => Ok(case),
            None => Err(CodecError::UnmatchedSwitchCase { key }),
        }
    }
}

fn check_literal_fmt(fmt: &Expr<Format>) -> Result<(), BuildError> {
    if let Some(Format::Spec(s)) = fmt.literal() {
        format::parse_spec(s).map_err(|_| BuildError::UnsupportedSpecifier(s.clone()))?;
    }
    Ok(())
}

fn eval_params(
    params: &[(String, Expr<Value>)],
    ctx: &Context<'_, '_>,
) -> Result<IndexMap<String, Value>, CodecError> {
    let mut extra = IndexMap::new();
    for (name, expr) in params {
        extra.insert(name.clone(), expr.eval(ctx)?);
    }
    Ok(extra)
}
