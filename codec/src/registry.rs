//! Closed resolution of wire names to decoders.

use crate::{
    buffer::ReadBuffer,
    error::Error,
    schema::{Named, Schema},
    value::Value,
};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use std::{collections::HashMap, fmt};

/// Decodes one element of a registered type from a composite payload.
pub(crate) type ElementFn = fn(&mut ReadBuffer) -> Result<Value, Error>;

/// Closed mapping from wire names to element decoders.
///
/// Names resolve only to what was registered ahead of time: nothing carried
/// on the wire can select code outside this table. The builtin scalar
/// vocabulary is seeded at construction and its names are reserved.
pub struct Registry {
    entries: HashMap<&'static str, ElementFn>,
}

impl Registry {
    /// Creates a registry holding the builtin scalar vocabulary.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };
        registry.insert(bool::NAME, |buf| Ok(Value::Bool(bool::read_fields(buf)?)));
        registry.insert(i8::NAME, |buf| Ok(Value::I8(i8::read_fields(buf)?)));
        registry.insert(i16::NAME, |buf| Ok(Value::I16(i16::read_fields(buf)?)));
        registry.insert(i32::NAME, |buf| Ok(Value::I32(i32::read_fields(buf)?)));
        registry.insert(i64::NAME, |buf| Ok(Value::I64(i64::read_fields(buf)?)));
        registry.insert(f32::NAME, |buf| Ok(Value::F32(f32::read_fields(buf)?)));
        registry.insert(f64::NAME, |buf| Ok(Value::F64(f64::read_fields(buf)?)));
        registry.insert(<String as Named>::NAME, |buf| {
            Ok(Value::Str(String::read_fields(buf)?))
        });
        registry.insert(<Bytes as Named>::NAME, |buf| {
            Ok(Value::Bytes(Bytes::read_fields(buf)?))
        });
        registry.insert(<BigInt as Named>::NAME, |buf| {
            Ok(Value::BigInt(BigInt::read_fields(buf)?))
        });
        registry.insert(<BigDecimal as Named>::NAME, |buf| {
            Ok(Value::Decimal(BigDecimal::read_fields(buf)?))
        });
        registry
    }

    /// Registers a structure type under its wire name.
    ///
    /// Panics if the name is already taken, builtin names included: colliding
    /// registrations are a configuration bug, not runtime data.
    pub fn register<T>(&mut self)
    where
        T: Named + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        let decode: ElementFn = |buf| Ok(Value::structure(T::read_fields(buf)?));
        self.insert(T::NAME, decode);
    }

    fn insert(&mut self, name: &'static str, decode: ElementFn) {
        let previous = self.entries.insert(name, decode);
        assert!(previous.is_none(), "wire name already registered: {name}");
    }

    /// Resolves a wire name to its element decoder.
    pub(crate) fn resolve(&self, name: &str) -> Result<ElementFn, Error> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered names, builtins included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no names. Always false in practice since
    /// builtins are seeded at construction.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("names", &names).finish()
    }
}
