//! Mermaid `erDiagram` emitter.

use crate::ast::{SchemaModel, TableSchema};
use unicode_width::UnicodeWidthStr;

const FALLBACK_TYPE: &str = "unknown";

#[derive(Default)]
pub struct MermaidRenderer {
    fenced: bool,
}

impl MermaidRenderer {
    pub fn new(fenced: bool) -> Self {
        Self { fenced }
    }

    pub fn render(&self, model: &SchemaModel) -> String {
        let mut out = String::new();
        if self.fenced {
            out.push_str("```mermaid\n");
        }
        out.push_str("erDiagram\n");

        for rel in &model.relations {
            out.push_str(&format!(
                "    {} {} {} : \"({}) - ({})\"\n",
                rel.from_model,
                rel.kind.connector(),
                rel.to_model,
                rel.from_field,
                rel.to_field
            ));
        }

        for table in &model.tables {
            render_entity(&mut out, model, table);
        }

        if self.fenced {
            out.push_str("```\n");
        }
        out
    }
}

fn render_entity(out: &mut String, model: &SchemaModel, table: &TableSchema) {
    let rows: Vec<[String; 4]> = table
        .fields
        .iter()
        .map(|field| {
            let is_fk = model
                .relations
                .iter()
                .any(|r| r.to_model == table.name && r.to_field == field.name);
            let key = match (field.primary_key, is_fk) {
                (true, true) => "PK, FK",
                (true, false) => "PK",
                (false, true) => "FK",
                (false, false) => "",
            };
            [
                field
                    .column_type
                    .clone()
                    .unwrap_or_else(|| FALLBACK_TYPE.to_string()),
                attribute_name(&field.name),
                key.to_string(),
                field
                    .description
                    .as_deref()
                    .map(|d| format!("\"{}\"", d.replace('"', "'")))
                    .unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = [0usize; 3];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.width());
        }
    }

    out.push_str(&format!("    {} {{\n", table.name));
    for row in &rows {
        let mut line = String::from("        ");
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(cell);
            if let Some(&w) = widths.get(i) {
                line.push_str(&" ".repeat(w.saturating_sub(cell.width())));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str("    }\n");
}

/// Attribute names are bare words in an entity block.
fn attribute_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldDefinition, Relation};

    fn field(name: &str, ty: Option<&str>, pk: bool, desc: Option<&str>) -> FieldDefinition {
        FieldDefinition {
            name: name.into(),
            definition: String::new(),
            description: desc.map(String::from),
            column_type: ty.map(String::from),
            primary_key: pk,
        }
    }

    fn model() -> SchemaModel {
        SchemaModel {
            tables: vec![
                TableSchema {
                    name: "user".into(),
                    fields: vec![
                        field("id", Some("varchar"), true, Some("Primary key")),
                        field("name", Some("text"), false, None),
                    ],
                    object_type: None,
                    description: None,
                },
                TableSchema {
                    name: "post".into(),
                    fields: vec![
                        field("id", Some("uuid"), true, None),
                        field("userId", None, false, Some("the \"author\"")),
                    ],
                    object_type: None,
                    description: None,
                },
            ],
            relations: vec![Relation {
                from_model: "user".into(),
                from_field: "id".into(),
                to_model: "post".into(),
                to_field: "userId".into(),
                kind: "one-to-many".parse().unwrap(),
            }],
        }
    }

    #[test]
    fn test_render_diagram() {
        let out = MermaidRenderer::default().render(&model());
        assert_eq!(
            out,
            r#"erDiagram
    user ||--|{ post : "(id) - (userId)"
    user {
        varchar id   PK "Primary key"
        text    name
    }
    post {
        uuid    id     PK
        unknown userId FK "the 'author'"
    }
"#
        );
    }

    #[test]
    fn test_fenced() {
        let out = MermaidRenderer::new(true).render(&SchemaModel {
            tables: vec![],
            relations: vec![],
        });
        assert_eq!(out, "```mermaid\nerDiagram\n```\n");
    }

    #[test]
    fn test_wide_chars_aligned() {
        let m = SchemaModel {
            tables: vec![TableSchema {
                name: "t".into(),
                fields: vec![
                    field("名前", Some("text"), false, Some("x")),
                    field("abcde", Some("text"), false, Some("y")),
                ],
                object_type: None,
                description: None,
            }],
            relations: vec![],
        };
        let out = MermaidRenderer::default().render(&m);
        assert!(out.contains("        text 名前   \"x\""));
        assert!(out.contains("        text abcde  \"y\""));
    }

    #[test]
    fn test_attribute_names_are_bare_words() {
        let m = SchemaModel {
            tables: vec![TableSchema {
                name: "t".into(),
                fields: vec![
                    field("user-id", Some("uuid"), false, None),
                    field("display name", Some("text"), false, None),
                    field("2fa", Some("bool"), false, None),
                ],
                object_type: None,
                description: None,
            }],
            relations: vec![],
        };
        let out = MermaidRenderer::default().render(&m);
        assert!(out.contains("        uuid user-id\n"));
        assert!(out.contains("        text display_name\n"));
        assert!(out.contains("        bool _2fa\n"));
    }
}
