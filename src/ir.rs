//! Assembles the schema model from table declarations, their documentation
//! blocks and the relation directives of a source file.

use crate::ast::{FieldDefinition, Relation, SchemaModel, TableSchema};
use crate::comment::{description, doc_block, parse_annotation};
use crate::dialect::Dialect;
use crate::parser::ParseError;
use crate::relation::{RelationError, extract_relations};
use crate::walker::{FieldCandidate, TableDecl, walk};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Relation error: {0}")]
    Relation(#[from] RelationError),
    #[error("Table `{0}` is declared more than once")]
    DuplicateTable(String),
    #[error("Relation `{relation}` references undeclared model `{model}`")]
    UnknownModel { model: String, relation: String },
    #[error("Relation `{relation}` references undeclared field `{model}.{field}`")]
    UnknownField {
        model: String,
        field: String,
        relation: String,
    },
}

/// Dialect-independent result of reading one source file.
///
/// Holds every table with its raw documentation blocks so a [`SchemaModel`]
/// can be produced for any dialect without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    tables: Vec<ExtractedTable>,
    relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq)]
struct ExtractedTable {
    name: String,
    doc: Vec<String>,
    fields: Vec<(FieldCandidate, Vec<String>)>,
}

impl Extraction {
    pub fn from_source(source: &str) -> Result<Self, SchemaError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let lines: Vec<&str> = source.lines().collect();
        let decls = walk(source)?;
        let relations = extract_relations(&lines)?;

        check_duplicates(&decls)?;

        let block = |line: usize| -> Vec<String> {
            doc_block(&lines, line).into_iter().map(String::from).collect()
        };

        let tables = decls
            .into_iter()
            .map(|decl| ExtractedTable {
                doc: block(decl.line),
                fields: decl
                    .fields
                    .into_iter()
                    .map(|field| {
                        let doc = block(field.line);
                        (field, doc)
                    })
                    .collect(),
                name: decl.name,
            })
            .collect();

        let extraction = Self { tables, relations };
        extraction.check_relations()?;

        debug!(
            tables = extraction.tables.len(),
            relations = extraction.relations.len(),
            "extracted schema"
        );
        Ok(extraction)
    }

    fn check_relations(&self) -> Result<(), SchemaError> {
        for rel in &self.relations {
            for (model, field) in [
                (&rel.from_model, &rel.from_field),
                (&rel.to_model, &rel.to_field),
            ] {
                let relation = format!(
                    "{}.{} {}.{} {}",
                    rel.from_model, rel.from_field, rel.to_model, rel.to_field, rel.kind
                );
                let table = self
                    .tables
                    .iter()
                    .find(|t| &t.name == model)
                    .ok_or_else(|| SchemaError::UnknownModel {
                        model: model.clone(),
                        relation: relation.clone(),
                    })?;
                if !table.fields.iter().any(|(f, _)| &f.name == field) {
                    return Err(SchemaError::UnknownField {
                        model: model.clone(),
                        field: field.clone(),
                        relation,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Build the schema model for `dialect`.
    ///
    /// With no dialect every `definition` is empty and no object shape is
    /// resolved; descriptions are still attached.
    pub fn schema(&self, dialect: Option<Dialect>) -> SchemaModel {
        let tables = self
            .tables
            .iter()
            .map(|table| {
                let table_doc = as_strs(&table.doc);
                let fields = table
                    .fields
                    .iter()
                    .map(|(candidate, doc)| field_definition(candidate, &as_strs(doc), dialect))
                    .collect();

                TableSchema {
                    name: table.name.clone(),
                    fields,
                    object_type: dialect
                        .and_then(|d| parse_annotation(&table_doc, d).object_type),
                    description: description(&table_doc),
                }
            })
            .collect();

        SchemaModel {
            tables,
            relations: self.relations.clone(),
        }
    }
}

impl SchemaModel {
    /// Extract and assemble in one step.
    pub fn from_source(source: &str, dialect: Option<Dialect>) -> Result<Self, SchemaError> {
        Ok(Extraction::from_source(source)?.schema(dialect))
    }
}

fn check_duplicates(decls: &[TableDecl]) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for decl in decls {
        if !seen.insert(decl.name.as_str()) {
            return Err(SchemaError::DuplicateTable(decl.name.clone()));
        }
    }
    Ok(())
}

fn field_definition(
    candidate: &FieldCandidate,
    doc: &[&str],
    dialect: Option<Dialect>,
) -> FieldDefinition {
    let (definition, description) = match dialect {
        Some(d) => {
            let annotation = parse_annotation(doc, d);
            (annotation.definition.unwrap_or_default(), annotation.description)
        }
        None => (String::new(), description(doc)),
    };

    FieldDefinition {
        name: candidate.name.clone(),
        definition,
        description,
        column_type: candidate.column_type.clone(),
        primary_key: candidate.primary_key,
    }
}

fn as_strs(lines: &[String]) -> Vec<&str> {
    lines.iter().map(String::as_str).collect()
}
