use crate::relation::RelationType;

/// Normalized, relation-aware schema extracted from one source file.
///
/// Built once per run and only ever handed out by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    pub tables: Vec<TableSchema>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    /// Source declaration order.
    pub fields: Vec<FieldDefinition>,
    pub object_type: Option<ObjectType>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    /// Opaque validator expression for the dialect the model was built for.
    /// Empty when the field carries no tag for that dialect.
    pub definition: String,
    pub description: Option<String>,
    pub column_type: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Strict,
    Loose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub from_model: String,
    pub from_field: String,
    pub to_model: String,
    pub to_field: String,
    pub kind: RelationType,
}

impl SchemaModel {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
