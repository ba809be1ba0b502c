//! The struct engine: a compiled schema and its two symmetric passes.
//!
//! A [Schema] is built once from a field list, validating everything that
//! can be validated without data. Each pack or unpack call then walks the
//! fields in declaration order against a fresh [Context] frame, so the two
//! directions traverse the same structure and expressions see the same
//! names at the same points.

use std::io::Cursor;

use indexmap::IndexMap;

use crate::context::{Context, Mode, Scope};
use crate::errors::{BuildError, CodecError};
use crate::field::Field;
use crate::format::Endianness;
use crate::record::Record;
use crate::stream::Stream;
use crate::value::Value;

/// Schema-wide defaults, overridable per field where it makes sense.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Applied to every specifier without an explicit endianness marker.
    pub endianness: Endianness,
    /// Byte emitted by padding fields.
    pub fill: u8,
    /// Whether unpack verifies that padding bytes equal the fill byte.
    pub check_padding: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endianness: Endianness::Little,
            fill: 0x00,
            check_padding: false,
        }
    }
}

/// A validated, ordered field list plus its configuration.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    config: Config,
}

impl Schema {
    /// Builds a schema with the default configuration. Fails fast on any
    /// structural mistake; a built schema never fails for schema reasons.
    pub fn build(fields: Vec<Field>) -> Result<Self, BuildError> {
        Self::build_with(fields, Config::default())
    }

    pub fn build_with(fields: Vec<Field>, config: Config) -> Result<Self, BuildError> {
        let mut seen: Vec<&str> = Vec::new();
        for field in &fields {
            field.validate()?;
            if seen.contains(&field.name.as_str()) {
                return Err(BuildError::DuplicateFieldName(field.name.clone()));
            }
            seen.push(&field.name);
        }
        Ok(Schema { fields, config })
    }

    pub(crate) fn config(&self) -> Config {
        self.config
    }

    /// A fresh record with every field's default: fixed defaults, the
    /// not-yet-computed sentinel for built fields, empty arrays, nested
    /// defaults for subfields. Fields without a natural default are absent.
    pub fn record(&self) -> Record {
        let mut record = Record::new();
        for field in &self.fields {
            if let Some(value) = field.default_value() {
                record.set(&field.name, value);
            }
        }
        record
    }

    /// Unpacks one structure instance from a byte slice.
    pub fn unpack(&self, bytes: &[u8]) -> Result<Record, CodecError> {
        self.unpack_with(bytes, IndexMap::new())
    }

    /// Like [Schema::unpack], with caller-supplied context names visible to
    /// every expression of this instance.
    pub fn unpack_with(
        &self,
        bytes: &[u8],
        extra: IndexMap<String, Value>,
    ) -> Result<Record, CodecError> {
        let mut cursor = Cursor::new(bytes.to_vec());
        self.unpack_from_with(&mut cursor, extra)
    }

    /// Unpacks one structure instance starting at the stream's current
    /// position. The position after the call is wherever the last field
    /// left it.
    pub fn unpack_from(&self, stream: &mut dyn Stream) -> Result<Record, CodecError> {
        self.unpack_from_with(stream, IndexMap::new())
    }

    pub fn unpack_from_with(
        &self,
        stream: &mut dyn Stream,
        extra: IndexMap<String, Value>,
    ) -> Result<Record, CodecError> {
        let scope = Scope::new(stream, Mode::Unpack);
        let ctx = Context::root(&scope, self.config, extra)?;
        self.unpack_fields(ctx)
    }

    /// Packs one record into a fresh byte vector.
    pub fn pack(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        self.pack_with(record, IndexMap::new())
    }

    pub fn pack_with(
        &self,
        record: &Record,
        extra: IndexMap<String, Value>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut cursor = Cursor::new(Vec::new());
        self.pack_into_with(&mut cursor, record, extra)?;
        Ok(cursor.into_inner())
    }

    /// Packs one record at the stream's current position. A failed pack may
    /// leave partially written bytes behind.
    pub fn pack_into(&self, stream: &mut dyn Stream, record: &Record) -> Result<(), CodecError> {
        self.pack_into_with(stream, record, IndexMap::new())
    }

    pub fn pack_into_with(
        &self,
        stream: &mut dyn Stream,
        record: &Record,
        extra: IndexMap<String, Value>,
    ) -> Result<(), CodecError> {
        let scope = Scope::new(stream, Mode::Pack);
        let mut ctx = Context::root(&scope, self.config, extra)?;
        ctx.seed(record.values().clone());
        self.pack_fields(ctx)
    }

    /// The unpack pass over one context frame. Consumes the frame and turns
    /// the values it accumulated into the result record.
    pub(crate) fn unpack_fields(&self, mut ctx: Context<'_, '_>) -> Result<Record, CodecError> {
        for field in &self.fields {
            tracing::trace!(field = %field.name, "unpack");
            if let Some(value) = field.unpack(&mut ctx).map_err(|e| e.at(&field.name))? {
                ctx.set(&field.name, value);
            }
        }
        Ok(Record::from_values(ctx.into_values()))
    }

    /// The pack pass over one pre-seeded context frame. Values recomputed by
    /// built fields are published back to the frame, so later expressions
    /// see what was actually written.
    pub(crate) fn pack_fields(&self, mut ctx: Context<'_, '_>) -> Result<(), CodecError> {
        for field in &self.fields {
            tracing::trace!(field = %field.name, "pack");
            let current = ctx.local(&field.name).cloned();
            let written = field
                .pack(&mut ctx, current.as_ref())
                .map_err(|e| e.at(&field.name))?;
            if let Some(value) = written {
                ctx.set(&field.name, value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::Expr;
    use crate::field::SwitchCase;
    use crate::format::Format;
    use crate::value::TypeTag;

    fn extras(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_fixed_fields_round_trip_little_endian_default() {
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "I"),
            Field::fixed("b", TypeTag::Uint, "H"),
        ])
        .unwrap();

        let record = schema
            .unpack(&[0x05, 0x00, 0x00, 0x00, 0x34, 0x12])
            .unwrap();
        assert_eq!(record.get_u64("a"), Some(5));
        assert_eq!(record.get_u64("b"), Some(0x1234));

        let bytes = schema.pack(&record).unwrap();
        assert_eq!(bytes, vec![0x05, 0x00, 0x00, 0x00, 0x34, 0x12]);
    }

    #[test]
    fn test_config_endianness_applies_only_without_marker() {
        let schema = Schema::build_with(
            vec![
                Field::fixed("big", TypeTag::Uint, "H"),
                Field::fixed("little", TypeTag::Uint, "<H"),
            ],
            Config {
                endianness: Endianness::Big,
                ..Config::default()
            },
        )
        .unwrap();

        let record = schema.unpack(&[0x12, 0x34, 0x12, 0x34]).unwrap();
        assert_eq!(record.get_u64("big"), Some(0x1234));
        assert_eq!(record.get_u64("little"), Some(0x3412));
    }

    #[test]
    fn test_padded_structure_round_trip() {
        let schema = Schema::build(vec![
            Field::fixed("number", TypeTag::Uint, "I").with_default(123u64),
            Field::padding("pad", 8u64).with_fill(0xFF),
            Field::fixed("binary", TypeTag::Bytes, "12s"),
        ])
        .unwrap();

        let mut record = schema.record();
        record.set("number", 5u64);
        record.set("binary", "Hello World!");
        let bytes = schema.pack(&record).unwrap();
        let mut expected = vec![0x05, 0x00, 0x00, 0x00];
        expected.extend([0xFF; 8]);
        expected.extend(b"Hello World!");
        assert_eq!(bytes, expected);

        assert_eq!(schema.unpack(&bytes).unwrap(), record);
    }

    #[test]
    fn test_cond_with_default_consumes_exactly_the_flag_byte() {
        let schema = Schema::build(vec![
            Field::fixed("has_text", TypeTag::Bool, "?"),
            Field::cond(
                TypeTag::Bytes,
                |ctx| ctx.get_bool("has_text"),
                Field::fixed("text", TypeTag::Bytes, "8s"),
            )
            .with_if_false(""),
        ])
        .unwrap();

        let record = schema
            .unpack(&[0x01, b'H', b'E', b'L', b'O', b'W', b'R', b'L', b'D'])
            .unwrap();
        assert_eq!(record.get_bool("has_text"), Some(true));
        assert_eq!(record.get_bytes("text"), Some(&b"HELOWRLD"[..]));

        let mut cursor = Cursor::new(vec![0x00, 0xEE, 0xEE]);
        let record = schema.unpack_from(&mut cursor).unwrap();
        assert_eq!(record.get_bool("has_text"), Some(false));
        assert_eq!(record.get_bytes("text"), Some(&b""[..]));
        assert_eq!(cursor.tell().unwrap(), 1);
    }

    #[test]
    fn test_built_count_prefix_is_recomputed_on_pack() {
        let schema = Schema::build(vec![
            Field::built("count", TypeTag::Uint, "H", |ctx| {
                Ok(Value::U64(ctx.get_array("items")?.len() as u64))
            }),
            Field::repeat(
                Expr::defer(|ctx| ctx.get_u64("count")),
                Field::fixed("items", TypeTag::Uint, "H"),
            ),
        ])
        .unwrap();

        // whatever the record claims the count is, the expression wins
        let mut record = schema.record();
        record.set("count", 99u64);
        record.set(
            "items",
            vec![
                Value::U64(0x5555),
                Value::U64(0x4444),
                Value::U64(0x3333),
                Value::U64(0x2222),
            ],
        );
        let bytes = schema.pack(&record).unwrap();
        assert_eq!(
            bytes,
            vec![0x04, 0x00, 0x55, 0x55, 0x44, 0x44, 0x33, 0x33, 0x22, 0x22]
        );

        let record = schema.unpack(&bytes).unwrap();
        assert_eq!(record.get_u64("count"), Some(4));
        assert_eq!(record.get_array("items").map(<[Value]>::len), Some(4));
    }

    #[test]
    fn test_cond_false_consumes_and_produces_nothing() {
        let schema = Schema::build(vec![
            Field::fixed("has_extra", TypeTag::Bool, "?"),
            Field::cond(
                TypeTag::Uint,
                |ctx| ctx.get_bool("has_extra"),
                Field::fixed("extra", TypeTag::Uint, "I"),
            ),
        ])
        .unwrap();

        let record = schema.unpack(&[0x00]).unwrap();
        assert!(!record.contains("extra"));

        let record = schema.unpack(&[0x01, 0x07, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(record.get_u64("extra"), Some(7));

        // packing the false branch writes only the flag byte
        let mut record = schema.record();
        record.set("has_extra", false);
        assert_eq!(schema.pack(&record).unwrap(), vec![0x00]);
    }

    #[test]
    fn test_cond_if_false_substitute() {
        let schema = Schema::build(vec![
            Field::fixed("version", TypeTag::Uint, "B"),
            Field::cond(
                TypeTag::Uint,
                |ctx| Ok(ctx.get_u64("version")? >= 2),
                Field::fixed("flags", TypeTag::Uint, "B"),
            )
            .with_if_false(0u64),
        ])
        .unwrap();

        let record = schema.unpack(&[0x01]).unwrap();
        assert_eq!(record.get_u64("flags"), Some(0));
    }

    #[test]
    fn test_switch_dispatch_and_default_arm() {
        let schema = Schema::build(vec![
            Field::fixed("tag", TypeTag::Uint, "B"),
            Field::switch(
                "body",
                TypeTag::Union(vec![TypeTag::Uint, TypeTag::Bytes]),
                |ctx| Ok(ctx.get("tag")?.clone()),
                vec![SwitchCase::new(
                    1,
                    TypeTag::Uint,
                    Field::fixed("body", TypeTag::Uint, "H"),
                )],
            )
            .with_default_case(TypeTag::Bytes, Field::fixed("body", TypeTag::Bytes, "4s")),
        ])
        .unwrap();

        let record = schema.unpack(&[0x01, 0x34, 0x12]).unwrap();
        assert_eq!(record.get_u64("body"), Some(0x1234));

        let record = schema.unpack(&[0x09, b'a', b'b', b'c', b'd']).unwrap();
        assert_eq!(record.get_bytes("body"), Some(&b"abcd"[..]));
    }

    #[test]
    fn test_switch_without_default_rejects_unknown_key() {
        let schema = Schema::build(vec![
            Field::fixed("tag", TypeTag::Uint, "B"),
            Field::switch(
                "body",
                TypeTag::Uint,
                |ctx| Ok(ctx.get("tag")?.clone()),
                vec![SwitchCase::new(
                    1,
                    TypeTag::Uint,
                    Field::fixed("body", TypeTag::Uint, "H"),
                )],
            ),
        ])
        .unwrap();

        let err = schema.unpack(&[0x02]).unwrap_err();
        let CodecError::At { path, source } = err else {
            panic!("expected a wrapped error");
        };
        assert_eq!(path, "body");
        assert!(matches!(
            *source,
            CodecError::UnmatchedSwitchCase { ref key } if key == "2"
        ));
    }

    #[test]
    fn test_switch_declared_union_must_match_case_types() {
        let result = Schema::build(vec![
            Field::fixed("tag", TypeTag::Uint, "B"),
            Field::switch(
                "body",
                TypeTag::Uint,
                |ctx| Ok(ctx.get("tag")?.clone()),
                vec![
                    SwitchCase::new(1, TypeTag::Uint, Field::fixed("body", TypeTag::Uint, "H")),
                    SwitchCase::new(
                        2,
                        TypeTag::Bytes,
                        Field::fixed("body", TypeTag::Bytes, "2s"),
                    ),
                ],
            ),
        ]);
        assert!(matches!(
            result,
            Err(BuildError::SwitchTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_repeat_until_sentinel() {
        let schema = Schema::build(vec![Field::repeat_until(
            |ctx| Ok(ctx.item().and_then(Value::as_u64) == Some(0)),
            Field::fixed("codes", TypeTag::Uint, "B"),
        )])
        .unwrap();

        let record = schema.unpack(&[0x05, 0x09, 0x00, 0xAA]).unwrap();
        assert_eq!(
            record.get_array("codes"),
            Some(&[Value::U64(5), Value::U64(9), Value::U64(0)][..])
        );

        let bytes = schema.pack(&record).unwrap();
        assert_eq!(bytes, vec![0x05, 0x09, 0x00]);
    }

    #[test]
    fn test_repeat_index_is_visible_to_inner_expressions() {
        // element width grows with the index: 1 byte, then 2, then 2
        let schema = Schema::build(vec![Field::repeat(
            3u64,
            Field::fixed(
                "xs",
                TypeTag::Uint,
                Expr::defer(|ctx| {
                    Ok(if ctx.index() == Some(0) {
                        Format::from("B")
                    } else {
                        Format::from("H")
                    })
                }),
            ),
        )])
        .unwrap();

        let record = schema.unpack(&[0x01, 0x02, 0x00, 0x03, 0x00]).unwrap();
        assert_eq!(
            record.get_array("xs"),
            Some(&[Value::U64(1), Value::U64(2), Value::U64(3)][..])
        );
    }

    #[test]
    fn test_subfield_round_trip_with_params() {
        let point = Rc::new(
            Schema::build(vec![
                Field::fixed("x", TypeTag::Uint, "B"),
                Field::cond(
                    TypeTag::Uint,
                    |ctx| ctx.get_bool("wide"),
                    Field::fixed("y", TypeTag::Uint, "H"),
                ),
            ])
            .unwrap(),
        );
        let schema = Schema::build(vec![
            Field::subfield("narrow", point.clone()).with_param("wide", false),
            Field::subfield("wide", point).with_param("wide", true),
        ])
        .unwrap();

        let record = schema.unpack(&[0x01, 0x02, 0x34, 0x12]).unwrap();
        let narrow = record.get("narrow").and_then(Value::as_struct).unwrap();
        assert_eq!(narrow.get_u64("x"), Some(1));
        assert!(!narrow.contains("y"));
        let wide = record.get("wide").and_then(Value::as_struct).unwrap();
        assert_eq!(wide.get_u64("x"), Some(2));
        assert_eq!(wide.get_u64("y"), Some(0x1234));

        let bytes = schema.pack(&record).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x34, 0x12]);
    }

    #[test]
    fn test_nested_failure_carries_the_field_path() {
        let inner = Rc::new(
            Schema::build(vec![Field::fixed("x", TypeTag::Uint, "I")]).unwrap(),
        );
        let schema = Schema::build(vec![Field::subfield("point", inner)]).unwrap();

        let err = schema.unpack(&[0x01]).unwrap_err();
        let CodecError::At { path, source } = err else {
            panic!("expected a wrapped error");
        };
        assert_eq!(path, "point");
        let CodecError::At { path, source } = *source else {
            panic!("expected the inner field in the chain");
        };
        assert_eq!(path, "x");
        assert!(matches!(*source, CodecError::UnexpectedEndOfStream { .. }));
    }

    #[test]
    fn test_padding_and_alignment() {
        let schema = Schema::build_with(
            vec![
                Field::fixed("a", TypeTag::Uint, "B"),
                Field::align("pad", 4u64),
                Field::fixed("b", TypeTag::Uint, "B"),
            ],
            Config {
                fill: 0xFF,
                ..Config::default()
            },
        )
        .unwrap();

        let mut record = schema.record();
        record.set("a", 1u64);
        record.set("b", 2u64);
        let bytes = schema.pack(&record).unwrap();
        assert_eq!(bytes, vec![0x01, 0xFF, 0xFF, 0xFF, 0x02]);

        let record = schema.unpack(&bytes).unwrap();
        assert_eq!(record.get_u64("b"), Some(2));
    }

    #[test]
    fn test_padding_check_flag() {
        let schema = Schema::build(vec![
            Field::padding("pad", 2u64).with_fill(0xAA).with_check(true),
            Field::fixed("v", TypeTag::Uint, "B"),
        ])
        .unwrap();

        assert!(schema.unpack(&[0xAA, 0xAA, 0x07]).is_ok());
        let err = schema.unpack(&[0xAA, 0x00, 0x07]).unwrap_err();
        let CodecError::At { source, .. } = err else {
            panic!("expected a wrapped error");
        };
        assert!(matches!(*source, CodecError::BadPadding(_)));
    }

    #[test]
    fn test_align_after_seeking_before_the_start_is_an_error() {
        let schema = Schema::build(vec![
            Field::seek_abs("back", 0u64),
            Field::align("pad", 4u64),
        ])
        .unwrap();

        // the structure starts at offset 2, then seeks behind it
        let mut cursor = Cursor::new(vec![0u8; 8]);
        cursor.seek_to(2).unwrap();
        let err = schema.unpack_from(&mut cursor).unwrap_err();
        let CodecError::At { path, source } = err else {
            panic!("expected a wrapped error");
        };
        assert_eq!(path, "pad");
        assert!(matches!(
            *source,
            CodecError::PositionBeforeStart { pos: 0, start: 2 }
        ));
    }

    #[test]
    fn test_nested_repeat_keeps_the_outer_stop_condition() {
        let schema = Schema::build(vec![Field::repeat_until(
            |ctx| Ok(ctx.item().is_some()),
            Field::repeat(1u64, Field::fixed("rows", TypeTag::Uint, "B")),
        )])
        .unwrap();

        // the outer condition fires after the first row; the second byte
        // stays unread
        let mut cursor = Cursor::new(vec![0x01, 0x02]);
        let record = schema.unpack_from(&mut cursor).unwrap();
        assert_eq!(
            record.get_array("rows"),
            Some(&[Value::Array(vec![Value::U64(1)])][..])
        );
        assert_eq!(cursor.tell().unwrap(), 1);

        assert_eq!(schema.pack(&record).unwrap(), vec![0x01]);
    }

    #[test]
    fn test_align_abs_uses_the_stream_position() {
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "B"),
            Field::align_abs("pad", 4u64),
            Field::fixed("b", TypeTag::Uint, "B"),
        ])
        .unwrap();

        // structure starts at 2; the absolute position 3 pads one byte to
        // the next multiple of 4, where relative alignment would pad three
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all_bytes(&[0xEE, 0xEE]).unwrap();
        let mut record = schema.record();
        record.set("a", 1u64);
        record.set("b", 2u64);
        schema.pack_into(&mut cursor, &record).unwrap();
        assert_eq!(cursor.into_inner(), vec![0xEE, 0xEE, 0x01, 0x00, 0x02]);
    }

    #[test]
    fn test_align_to_rejects_backwards_target() {
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "I"),
            Field::align_to("pad", 2u64),
        ])
        .unwrap();
        let err = schema.unpack(&[0; 8]).unwrap_err();
        let CodecError::At { source, .. } = err else {
            panic!("expected a wrapped error");
        };
        assert!(matches!(*source, CodecError::BadPadding(_)));
    }

    #[test]
    fn test_seek_and_skip() {
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "B"),
            Field::skip("gap", 2i64),
            Field::fixed("b", TypeTag::Uint, "B"),
            Field::seek("rewind", 1u64),
            Field::fixed("c", TypeTag::Uint, "B"),
        ])
        .unwrap();

        let record = schema.unpack(&[0x10, 0x20, 0x30, 0x40]).unwrap();
        assert_eq!(record.get_u64("a"), Some(0x10));
        assert_eq!(record.get_u64("b"), Some(0x40));
        assert_eq!(record.get_u64("c"), Some(0x20));
    }

    #[test]
    fn test_forward_reference_fails() {
        let schema = Schema::build(vec![
            Field::fixed(
                "data",
                TypeTag::Bytes,
                Expr::defer(|ctx| Ok(Format::Size(ctx.get_u64("len")? as usize))),
            ),
            Field::fixed("len", TypeTag::Uint, "B"),
        ])
        .unwrap();

        let err = schema.unpack(&[0x01, 0x02]).unwrap_err();
        let CodecError::At { path, source } = err else {
            panic!("expected a wrapped error");
        };
        assert_eq!(path, "data");
        assert!(matches!(*source, CodecError::UnknownContextName(_)));
    }

    #[test]
    fn test_extra_names_are_visible_but_not_recorded() {
        let schema = Schema::build(vec![Field::fixed(
            "data",
            TypeTag::Bytes,
            Expr::defer(|ctx| Ok(Format::Size(ctx.get_u64("len")? as usize))),
        )])
        .unwrap();

        let record = schema
            .unpack_with(&[0x01, 0x02, 0x03], extras(&[("len", Value::U64(3))]))
            .unwrap();
        assert_eq!(record.get_bytes("data"), Some(&[1u8, 2, 3][..]));
        assert!(!record.contains("len"));
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let result = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "B"),
            Field::fixed("a", TypeTag::Uint, "B"),
        ]);
        assert!(matches!(result, Err(BuildError::DuplicateFieldName(_))));
    }

    #[test]
    fn test_record_defaults() {
        let inner = Rc::new(
            Schema::build(vec![
                Field::fixed("x", TypeTag::Uint, "B").with_default(7u64)
            ])
            .unwrap(),
        );
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "B").with_default(1u64),
            Field::built("n", TypeTag::Uint, "B", |_| Ok(Value::U64(0))),
            Field::repeat(
                Expr::defer(|ctx| ctx.get_u64("n")),
                Field::fixed("xs", TypeTag::Uint, "B"),
            ),
            Field::padding("pad", 1u64),
            Field::subfield("inner", inner),
        ])
        .unwrap();

        let record = schema.record();
        assert_eq!(record.get_u64("a"), Some(1));
        assert_eq!(record.get("n"), Some(&Value::Unset));
        assert_eq!(record.get_array("xs"), Some(&[][..]));
        assert!(!record.contains("pad"));
        let inner = record.get("inner").and_then(Value::as_struct).unwrap();
        assert_eq!(inner.get_u64("x"), Some(7));
    }

    #[test]
    fn test_pack_missing_required_value() {
        let schema = Schema::build(vec![Field::fixed("a", TypeTag::Uint, "B")]).unwrap();
        let err = schema.pack(&Record::new()).unwrap_err();
        let CodecError::At { path, source } = err else {
            panic!("expected a wrapped error");
        };
        assert_eq!(path, "a");
        assert!(matches!(*source, CodecError::UnknownContextName(_)));
    }

    #[test]
    fn test_pack_into_existing_stream_offset() {
        let schema = Schema::build(vec![
            Field::fixed("a", TypeTag::Uint, "B"),
            Field::align("pad", 4u64),
        ])
        .unwrap();

        // alignment is relative to where the structure starts, not to the
        // stream origin
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all_bytes(&[0xEE, 0xEE]).unwrap();
        let mut record = schema.record();
        record.set("a", 1u64);
        schema.pack_into(&mut cursor, &record).unwrap();
        assert_eq!(
            cursor.into_inner(),
            vec![0xEE, 0xEE, 0x01, 0x00, 0x00, 0x00]
        );
    }
}
