//! The hierarchical evaluation context threaded through one pack or unpack
//! pass of one structure instance.
//!
//! Each structure level gets its own frame holding the values resolved so
//! far; nested structures link back to their parent frame for lookup only.
//! The stream handle and the operation mode live in a [`Scope`] shared by
//! every frame of the nesting tree.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::errors::CodecError;
use crate::schema::Config;
use crate::stream::Stream;
use crate::value::{TypeTag, Value};

/// Which direction the current operation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Pack,
    Unpack,
}

/// State shared by every context frame of one operation: the stream adapter
/// and the operation mode. Interior mutability keeps the stream reachable
/// from expression closures that only see `&Context`; the whole model is
/// single-threaded (one operation per stream at a time).
pub struct Scope<'io> {
    stream: RefCell<&'io mut dyn Stream>,
    mode: Mode,
}

impl<'io> Scope<'io> {
    pub fn new(stream: &'io mut dyn Stream, mode: Mode) -> Self {
        Scope {
            stream: RefCell::new(stream),
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Per-iteration state while a repeat field is active.
#[derive(Debug, Default)]
pub(crate) struct RepeatScope {
    index: u64,
    item: Option<Value>,
}

/// One evaluation frame: the values of fields processed so far at this
/// structure level, caller-supplied extras, and a lookup-only link to the
/// enclosing frame.
pub struct Context<'io, 'p> {
    scope: &'p Scope<'io>,
    parent: Option<&'p Context<'io, 'p>>,
    /// Absolute stream position where this structure started.
    start: u64,
    config: Config,
    values: IndexMap<String, Value>,
    extra: IndexMap<String, Value>,
    repeat: Option<RepeatScope>,
}

impl<'io, 'p> Context<'io, 'p> {
    /// Root frame for one top-level operation; records the current stream
    /// position as the structure start.
    pub(crate) fn root(
        scope: &'p Scope<'io>,
        config: Config,
        extra: IndexMap<String, Value>,
    ) -> Result<Self, CodecError> {
        let start = scope.stream.borrow_mut().tell()?;
        Ok(Context {
            scope,
            parent: None,
            start,
            config,
            values: IndexMap::new(),
            extra,
            repeat: None,
        })
    }

    /// Child frame for a nested structure.
    pub(crate) fn nested(
        parent: &'p Context<'io, 'p>,
        config: Config,
        extra: IndexMap<String, Value>,
    ) -> Result<Self, CodecError> {
        let start = parent.scope.stream.borrow_mut().tell()?;
        Ok(Context {
            scope: parent.scope,
            parent: Some(parent),
            start,
            config,
            values: IndexMap::new(),
            extra,
            repeat: None,
        })
    }

    pub fn mode(&self) -> Mode {
        self.scope.mode
    }

    pub fn is_packing(&self) -> bool {
        self.scope.mode == Mode::Pack
    }

    pub fn is_unpacking(&self) -> bool {
        self.scope.mode == Mode::Unpack
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves a name: this frame's values first, then its extras, then the
    /// parent chain. Never searches siblings or descendants.
    pub fn get(&self, name: &str) -> Result<&Value, CodecError> {
        if let Some(v) = self.values.get(name) {
            return Ok(v);
        }
        if let Some(v) = self.extra.get(name) {
            return Ok(v);
        }
        match self.parent {
            Some(parent) => parent.get(name),
            None => Err(CodecError::UnknownContextName(name.to_string())),
        }
    }

    fn typed_get<T>(
        &self,
        name: &str,
        expected: TypeTag,
        narrow: impl Fn(&Value) -> Option<T>,
    ) -> Result<T, CodecError> {
        let value = self.get(name)?;
        narrow(value).ok_or_else(|| CodecError::ValueTypeMismatch {
            name: name.to_string(),
            expected,
            got: value.describe(),
        })
    }

    /// `get` narrowed to an unsigned integer.
    pub fn get_u64(&self, name: &str) -> Result<u64, CodecError> {
        self.typed_get(name, TypeTag::Uint, Value::as_u64)
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, CodecError> {
        self.typed_get(name, TypeTag::Int, Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, CodecError> {
        self.typed_get(name, TypeTag::Bool, Value::as_bool)
    }

    pub fn get_bytes(&self, name: &str) -> Result<&[u8], CodecError> {
        let value = self.get(name)?;
        value
            .as_bytes()
            .ok_or_else(|| CodecError::ValueTypeMismatch {
                name: name.to_string(),
                expected: TypeTag::Bytes,
                got: value.describe(),
            })
    }

    pub fn get_array(&self, name: &str) -> Result<&[Value], CodecError> {
        let value = self.get(name)?;
        value
            .as_array()
            .ok_or_else(|| CodecError::ValueTypeMismatch {
                name: name.to_string(),
                expected: TypeTag::Array,
                got: value.describe(),
            })
    }

    /// Looks a name up in this frame only, ignoring extras and parents.
    pub(crate) fn local(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Inserts or overwrites a value in this frame only.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Pre-populates this frame from a record snapshot (pack direction).
    pub(crate) fn seed(&mut self, values: IndexMap<String, Value>) {
        self.values = values;
    }

    pub(crate) fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }

    // Stream positioning. Effects are globally visible: the stream is
    // shared by the whole nesting tree.

    /// Absolute stream position.
    pub fn tell(&self) -> Result<u64, CodecError> {
        Ok(self.scope.stream.borrow_mut().tell()?)
    }

    /// Position relative to this structure's start. Fails when a seek moved
    /// the stream before the start.
    pub fn tell_rel(&self) -> Result<u64, CodecError> {
        let pos = self.tell()?;
        pos.checked_sub(self.start)
            .ok_or(CodecError::PositionBeforeStart {
                pos,
                start: self.start,
            })
    }

    /// Seeks to an absolute position.
    pub fn seek(&self, pos: u64) -> Result<u64, CodecError> {
        Ok(self.scope.stream.borrow_mut().seek_to(pos)?)
    }

    /// Seeks relative to this structure's start.
    pub fn seek_rel(&self, pos: u64) -> Result<u64, CodecError> {
        self.seek(self.start + pos)
    }

    /// Moves relative to the current position.
    pub fn skip(&self, delta: i64) -> Result<u64, CodecError> {
        Ok(self.scope.stream.borrow_mut().skip(delta)?)
    }

    /// Reads exactly `n` bytes or fails with `UnexpectedEndOfStream`.
    pub(crate) fn read_bytes(&self, n: usize) -> Result<Vec<u8>, CodecError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let bytes = self.scope.stream.borrow_mut().read_bytes(n)?;
        if bytes.len() < n {
            return Err(CodecError::UnexpectedEndOfStream {
                needed: n,
                got: bytes.len(),
            });
        }
        Ok(bytes)
    }

    pub(crate) fn write_bytes(&self, buf: &[u8]) -> Result<(), CodecError> {
        if buf.is_empty() {
            return Ok(());
        }
        Ok(self.scope.stream.borrow_mut().write_all_bytes(buf)?)
    }

    // Repeat scope: present only while a repetition field is active on this
    // frame; the item is set only around a stop-condition evaluation.

    /// The running index of the active repeat field, if any.
    pub fn index(&self) -> Option<u64> {
        self.repeat.as_ref().map(|r| r.index)
    }

    /// The just-produced item during a stop-condition evaluation.
    pub fn item(&self) -> Option<&Value> {
        self.repeat.as_ref().and_then(|r| r.item.as_ref())
    }

    /// Detaches the current repeat scope so an inner repeat on the same
    /// frame can run without touching it; pass the result back to
    /// [Context::restore_repeat] afterwards.
    pub(crate) fn take_repeat(&mut self) -> Option<RepeatScope> {
        self.repeat.take()
    }

    pub(crate) fn restore_repeat(&mut self, saved: Option<RepeatScope>) {
        self.repeat = saved;
    }

    pub(crate) fn set_index(&mut self, index: u64) {
        match &mut self.repeat {
            Some(r) => r.index = index,
            None => self.repeat = Some(RepeatScope { index, item: None }),
        }
    }

    pub(crate) fn set_item(&mut self, item: Value) {
        if let Some(r) = &mut self.repeat {
            r.item = Some(item);
        }
    }

    pub(crate) fn clear_item(&mut self) {
        if let Some(r) = &mut self.repeat {
            r.item = None;
        }
    }
}
