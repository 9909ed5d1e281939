use crate::codec::{Deserializer, Serializer};

/// The closed set of column types. `String(capacity)` is zero-padded on disk to exactly
/// `capacity` bytes, preceded by a 4-byte big-endian length of the logical (unpadded) content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    String(u32),
}

impl Type {
    /// On-disk footprint in bytes.
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String(capacity) => 4 + *capacity as usize,
        }
    }
}

/// A single column value. `String` values carry only their logical content; padding to a type's
/// capacity happens at serialize time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Str(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            Value::Int(_) => None,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Str(_) => "String",
        }
    }

    pub(crate) fn serialize(&self, buffer: &mut [u8], field_type: Type) {
        let mut ser = Serializer::new(buffer);
        match (self, field_type) {
            (Value::Int(v), Type::Int) => ser.serialize_i32(*v),
            (Value::Str(s), Type::String(capacity)) => {
                let capacity = capacity as usize;
                let bytes = s.as_bytes();
                ser.serialize_u32(bytes.len() as u32);
                ser.copy_bytes(bytes);
                let padding = capacity - bytes.len();
                ser.copy_bytes(&vec![0u8; padding]);
            }
            _ => panic!("value does not match field type"),
        }
    }

    pub(crate) fn parse(bytes: &[u8], field_type: Type) -> Self {
        let mut de = Deserializer::new(bytes);
        match field_type {
            Type::Int => Value::Int(de.deserialize_i32()),
            Type::String(capacity) => {
                let len = de.deserialize_u32() as usize;
                let content = de.take_bytes(capacity as usize);
                Value::Str(String::from_utf8_lossy(&content[..len]).into_owned())
            }
        }
    }
}

/// Comparison operators a `Filter` predicate or a join predicate may apply between a field and a
/// constant (or another field, for joins).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    /// Evaluates `lhs OP rhs`. `Like` is substring containment and only defined over strings.
    pub fn apply(&self, lhs: &Value, rhs: &Value) -> bool {
        match self {
            CompareOp::Like => match (lhs, rhs) {
                (Value::Str(l), Value::Str(r)) => l.contains(r.as_str()),
                _ => false,
            },
            _ => {
                let ord = match (lhs, rhs) {
                    (Value::Int(l), Value::Int(r)) => l.cmp(r),
                    (Value::Str(l), Value::Str(r)) => l.cmp(r),
                    _ => return false,
                };
                match self {
                    CompareOp::Eq => ord.is_eq(),
                    CompareOp::Ne => ord.is_ne(),
                    CompareOp::Lt => ord.is_lt(),
                    CompareOp::Le => ord.is_le(),
                    CompareOp::Gt => ord.is_gt(),
                    CompareOp::Ge => ord.is_ge(),
                    CompareOp::Like => unreachable!(),
                }
            }
        }
    }
}
