//! Dynamic values for self-describing encode and decode.

use crate::{
    buffer::WriteBuffer,
    fault::Fault,
    schema::{Named, Schema},
};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use std::{any::Any, collections::BTreeMap, fmt};

/// Object-safe face of a registered structure value.
///
/// Implemented automatically for every [`Named`] type that is `Clone`,
/// `PartialEq`, `Debug`, `Send`, and `Sync`. User code goes through
/// [`Value::structure`] and [`Value::downcast_struct`] instead of this trait.
pub trait DynSchema: fmt::Debug + Send + Sync {
    /// Wire name of the concrete type.
    fn wire_name(&self) -> &'static str;

    /// Exact encoded length of the field form.
    fn dyn_fields_len(&self) -> usize;

    /// Appends the field form to `buf`.
    fn dyn_write_fields(&self, buf: &mut WriteBuffer);

    /// Clones into a fresh box.
    fn clone_box(&self) -> Box<dyn DynSchema>;

    /// Compares against another boxed value of possibly different type.
    fn eq_box(&self, other: &dyn DynSchema) -> bool;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;
}

impl<T> DynSchema for T
where
    T: Named + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn wire_name(&self) -> &'static str {
        T::NAME
    }

    fn dyn_fields_len(&self) -> usize {
        self.fields_len()
    }

    fn dyn_write_fields(&self, buf: &mut WriteBuffer) {
        self.write_fields(buf);
    }

    fn clone_box(&self) -> Box<dyn DynSchema> {
        Box::new(self.clone())
    }

    fn eq_box(&self, other: &dyn DynSchema) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for Box<dyn DynSchema> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for Box<dyn DynSchema> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_box(other.as_ref())
    }
}

/// A runtime value of any encodable kind.
///
/// This is the input to [`crate::Encoder::write_object`] and the output of
/// [`crate::Decoder::read_object`]. Collection variants must be homogeneous
/// to encode; the first element supplies the wire name for the rest.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No value. Encodes as the boolean-true frame (heartbeat convention),
    /// so it decodes back as `Bool(true)`.
    Absent,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    BigInt(BigInt),
    Decimal(BigDecimal),
    Str(String),
    Bytes(Bytes),
    /// Homogeneous ordered collection.
    Sequence(Vec<Value>),
    /// Homogeneous unordered collection. Encode order follows the vector.
    Set(Vec<Value>),
    /// String-keyed map with homogeneous values.
    Map(BTreeMap<String, Value>),
    /// Registered structure value.
    Struct(Box<dyn DynSchema>),
    /// Flattened error value.
    Fault(Fault),
}

impl Value {
    /// Boxes a structure value for dynamic encoding.
    ///
    /// Scalar types boxed this way decode back as their scalar kinds, not as
    /// `Struct`.
    pub fn structure<T>(value: T) -> Self
    where
        T: Named + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self::Struct(Box::new(value))
    }

    /// Recovers a structure of known concrete type.
    pub fn downcast_struct<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Struct(inner) => inner.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Wire name used when this value travels as a collection element.
    /// `None` for kinds that cannot appear inside a collection.
    pub(crate) fn element_name(&self) -> Option<&'static str> {
        match self {
            Self::Bool(_) => Some(bool::NAME),
            Self::I8(_) => Some(i8::NAME),
            Self::I16(_) => Some(i16::NAME),
            Self::I32(_) => Some(i32::NAME),
            Self::I64(_) => Some(i64::NAME),
            Self::F32(_) => Some(f32::NAME),
            Self::F64(_) => Some(f64::NAME),
            Self::BigInt(_) => Some(<BigInt as Named>::NAME),
            Self::Decimal(_) => Some(<BigDecimal as Named>::NAME),
            Self::Str(_) => Some(<String as Named>::NAME),
            Self::Bytes(_) => Some(<Bytes as Named>::NAME),
            Self::Struct(inner) => Some(inner.wire_name()),
            Self::Absent | Self::Sequence(_) | Self::Set(_) | Self::Map(_) | Self::Fault(_) => {
                None
            }
        }
    }

    /// Field-form length as a collection element.
    ///
    /// Callers must have checked [`Value::element_name`] first.
    pub(crate) fn element_len(&self) -> usize {
        match self {
            Self::Bool(v) => v.fields_len(),
            Self::I8(v) => v.fields_len(),
            Self::I16(v) => v.fields_len(),
            Self::I32(v) => v.fields_len(),
            Self::I64(v) => v.fields_len(),
            Self::F32(v) => v.fields_len(),
            Self::F64(v) => v.fields_len(),
            Self::BigInt(v) => v.fields_len(),
            Self::Decimal(v) => v.fields_len(),
            Self::Str(v) => v.fields_len(),
            Self::Bytes(v) => v.fields_len(),
            Self::Struct(inner) => inner.dyn_fields_len(),
            Self::Absent | Self::Sequence(_) | Self::Set(_) | Self::Map(_) | Self::Fault(_) => {
                unreachable!("not a collection element")
            }
        }
    }

    /// Appends the field form as a collection element.
    ///
    /// Callers must have checked [`Value::element_name`] first.
    pub(crate) fn write_element(&self, buf: &mut WriteBuffer) {
        match self {
            Self::Bool(v) => v.write_fields(buf),
            Self::I8(v) => v.write_fields(buf),
            Self::I16(v) => v.write_fields(buf),
            Self::I32(v) => v.write_fields(buf),
            Self::I64(v) => v.write_fields(buf),
            Self::F32(v) => v.write_fields(buf),
            Self::F64(v) => v.write_fields(buf),
            Self::BigInt(v) => v.write_fields(buf),
            Self::Decimal(v) => v.write_fields(buf),
            Self::Str(v) => v.write_fields(buf),
            Self::Bytes(v) => v.write_fields(buf),
            Self::Struct(inner) => inner.dyn_write_fields(buf),
            Self::Absent | Self::Sequence(_) | Self::Set(_) | Self::Map(_) | Self::Fault(_) => {
                unreachable!("not a collection element")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    crate::impl_schema!(Point, "test.Point", { x, y });

    #[derive(Debug, Clone, PartialEq)]
    struct Label {
        text: String,
    }

    crate::impl_schema!(Label, "test.Label", { text });

    #[test]
    fn test_structure_downcast() {
        let value = Value::structure(Point { x: 1, y: 2 });
        assert_eq!(value.downcast_struct::<Point>(), Some(&Point { x: 1, y: 2 }));
        assert_eq!(value.downcast_struct::<Label>(), None);
        assert_eq!(Value::I32(5).downcast_struct::<Point>(), None);
    }

    #[test]
    fn test_structure_eq() {
        let a = Value::structure(Point { x: 1, y: 2 });
        let b = Value::structure(Point { x: 1, y: 2 });
        let c = Value::structure(Point { x: 1, y: 3 });
        let d = Value::structure(Label { text: "p".into() });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_structure_clone() {
        let a = Value::structure(Point { x: 7, y: 8 });
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_element_names() {
        assert_eq!(Value::Bool(true).element_name(), Some("bool"));
        assert_eq!(Value::I8(0).element_name(), Some("i8"));
        assert_eq!(Value::I16(0).element_name(), Some("i16"));
        assert_eq!(Value::I32(0).element_name(), Some("i32"));
        assert_eq!(Value::I64(0).element_name(), Some("i64"));
        assert_eq!(Value::F32(0.0).element_name(), Some("f32"));
        assert_eq!(Value::F64(0.0).element_name(), Some("f64"));
        assert_eq!(Value::Str(String::new()).element_name(), Some("string"));
        assert_eq!(Value::Bytes(Bytes::new()).element_name(), Some("bytes"));
        assert_eq!(Value::BigInt(BigInt::from(1)).element_name(), Some("bigint"));
        assert_eq!(
            Value::structure(Point { x: 0, y: 0 }).element_name(),
            Some("test.Point")
        );

        assert_eq!(Value::Absent.element_name(), None);
        assert_eq!(Value::Sequence(Vec::new()).element_name(), None);
        assert_eq!(Value::Set(Vec::new()).element_name(), None);
        assert_eq!(Value::Map(BTreeMap::new()).element_name(), None);
        assert_eq!(Value::Fault(Fault::new("x", "y")).element_name(), None);
    }

    #[test]
    fn test_element_len_matches_write() {
        let values = [
            Value::I64(12),
            Value::Str("abc".to_string()),
            Value::structure(Point { x: 1, y: 2 }),
        ];
        for value in values {
            let mut buf = WriteBuffer::new();
            value.write_element(&mut buf);
            assert_eq!(buf.len(), value.element_len());
        }
    }
}
