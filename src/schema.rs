use crate::field::Type;

/// A single column: its type and an optional display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDesc {
    pub field_type: Type,
    pub name: Option<String>,
}

impl FieldDesc {
    pub fn new(field_type: Type, name: Option<String>) -> Self {
        Self { field_type, name }
    }
}

/// The schema of a tuple: an ordered, non-empty sequence of typed fields. Equality compares types
/// only, ignoring names, so a join's merged schema and a renamed scan compare equal to a schema
/// built directly with the same field types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleDesc {
    fields: Vec<FieldDesc>,
}

impl TupleDesc {
    pub fn new(fields: Vec<FieldDesc>) -> Self {
        assert!(!fields.is_empty(), "a tuple desc needs at least one field");
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Total on-disk footprint of a tuple conforming to this schema.
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.len()).sum()
    }

    /// First field whose name matches exactly.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_deref() == Some(name))
    }

    /// Prepends `alias.` to every named field, the way a scan tags its columns with a table alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        if alias.is_empty() {
            return self;
        }
        for field in self.fields.iter_mut() {
            if let Some(name) = &field.name {
                field.name = Some(format!("{}.{}", alias, name));
            }
        }
        self
    }

    /// Concatenates two schemas, used by joins to build the output schema of their combined rows.
    pub fn merge(left: &TupleDesc, right: &TupleDesc) -> TupleDesc {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.clone());
        TupleDesc { fields }
    }

    /// Schema equality ignoring field names (two field-type sequences that match positionally).
    pub fn type_compatible(&self, other: &TupleDesc) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(names: &[&str]) -> TupleDesc {
        TupleDesc::new(
            names
                .iter()
                .map(|n| FieldDesc::new(Type::Int, Some((*n).to_owned())))
                .collect(),
        )
    }

    #[test]
    fn merge_concatenates_fields() {
        let merged = TupleDesc::merge(&desc(&["a"]), &desc(&["b", "c"]));
        assert_eq!(merged.num_fields(), 3);
    }

    #[test]
    fn type_compatible_ignores_names() {
        let a = desc(&["a", "b"]);
        let b = desc(&["x", "y"]);
        assert!(a.type_compatible(&b));
    }

    #[test]
    fn alias_prefixes_names() {
        let d = desc(&["id"]).with_alias("t");
        assert_eq!(d.index_of("t.id"), Some(0));
    }
}
