//! Text emitters over an assembled [`SchemaModel`].

pub mod mermaid;
pub mod validator;

pub use mermaid::MermaidRenderer;
pub use validator::{ValidatorRenderer, ZodVariant};

use crate::ast::SchemaModel;
use crate::dialect::Dialect;

/// Flags shared by every validator emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Render descriptions as block comments.
    pub comment: bool,
    /// Append an inferred type alias after each schema.
    pub include_type: bool,
    /// Emit a relation-extended schema per related table.
    pub include_relations: bool,
}

/// One output artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Zod(ZodVariant),
    Valibot,
    ArkType,
    Effect,
    /// `fenced` wraps the diagram in a markdown code fence.
    Mermaid { fenced: bool },
}

impl Target {
    /// Parse target from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zod" => Some(Self::Zod(ZodVariant::V4)),
            "zod-mini" => Some(Self::Zod(ZodVariant::Mini)),
            "zod-openapi" => Some(Self::Zod(ZodVariant::OpenApi)),
            "valibot" => Some(Self::Valibot),
            "arktype" => Some(Self::ArkType),
            "effect" => Some(Self::Effect),
            "mermaid" => Some(Self::Mermaid { fenced: false }),
            "mermaid-md" => Some(Self::Mermaid { fenced: true }),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self.dialect() {
            Some(dialect) => dialect.name(),
            None => "mermaid",
        }
    }

    /// Annotation dialect the schema model must be built for.
    pub fn dialect(self) -> Option<Dialect> {
        match self {
            Self::Zod(_) => Some(Dialect::Zod),
            Self::Valibot => Some(Dialect::Valibot),
            Self::ArkType => Some(Dialect::ArkType),
            Self::Effect => Some(Dialect::Effect),
            Self::Mermaid { .. } => None,
        }
    }

    /// Language identifier handed to the formatter.
    pub fn language(self) -> &'static str {
        match self {
            Self::Mermaid { fenced: true } => "markdown",
            Self::Mermaid { fenced: false } => "mermaid",
            _ => "typescript",
        }
    }

    pub fn render(self, model: &SchemaModel, options: EmitOptions) -> String {
        match self {
            Self::Zod(variant) => ValidatorRenderer::new(Dialect::Zod, options)
                .with_variant(variant)
                .render(model),
            Self::Valibot => ValidatorRenderer::new(Dialect::Valibot, options).render(model),
            Self::ArkType => ValidatorRenderer::new(Dialect::ArkType, options).render(model),
            Self::Effect => ValidatorRenderer::new(Dialect::Effect, options).render(model),
            Self::Mermaid { fenced } => MermaidRenderer::new(fenced).render(model),
        }
    }
}

/// A property added to a table's relation schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationProperty<'a> {
    pub name: String,
    pub model: &'a str,
    pub many: bool,
}

/// Relation properties of `table`, in relation order.
///
/// The `from` side of a relation gains the `to` model with the right-hand
/// cardinality, the `to` side gains the `from` model with the left-hand one.
/// A repeated property name keeps its first occurrence.
pub fn relation_properties<'a>(model: &'a SchemaModel, table: &str) -> Vec<RelationProperty<'a>> {
    let mut props: Vec<RelationProperty<'a>> = Vec::new();

    for rel in &model.relations {
        let mut sides = Vec::with_capacity(2);
        if rel.from_model == table {
            sides.push((rel.to_model.as_str(), rel.kind.to.is_many()));
        }
        if rel.to_model == table {
            sides.push((rel.from_model.as_str(), rel.kind.from.is_many()));
        }

        for (other, many) in sides {
            let name = if many {
                pluralize(other)
            } else {
                other.to_string()
            };
            if props.iter().all(|p| p.name != name) {
                props.push(RelationProperty {
                    name,
                    model: other,
                    many,
                });
            }
        }
    }

    props
}

/// `user_profile` / `userProfile` -> `UserProfile`.
pub fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Relation;

    fn model(relations: &[(&str, &str, &str, &str, &str)]) -> SchemaModel {
        SchemaModel {
            tables: vec![],
            relations: relations
                .iter()
                .map(|(fm, ff, tm, tf, kind)| Relation {
                    from_model: fm.to_string(),
                    from_field: ff.to_string(),
                    to_model: tm.to_string(),
                    to_field: tf.to_string(),
                    kind: kind.parse().unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("user"), "User");
        assert_eq!(pascal_case("userProfile"), "UserProfile");
        assert_eq!(pascal_case("user_profile"), "UserProfile");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
    }

    #[test]
    fn test_relation_properties_both_sides() {
        let m = model(&[("user", "id", "post", "userId", "one-to-many")]);

        let user = relation_properties(&m, "user");
        assert_eq!(
            user,
            vec![RelationProperty {
                name: "posts".into(),
                model: "post",
                many: true
            }]
        );

        let post = relation_properties(&m, "post");
        assert_eq!(post[0].name, "user");
        assert!(!post[0].many);
        assert!(relation_properties(&m, "tag").is_empty());
    }

    #[test]
    fn test_relation_properties_first_wins() {
        let m = model(&[
            ("user", "id", "post", "authorId", "one-to-many"),
            ("user", "id", "post", "editorId", "one-to-zero-many"),
        ]);
        assert_eq!(relation_properties(&m, "user").len(), 1);
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!(Target::from_str("zod-mini"), Some(Target::Zod(ZodVariant::Mini)));
        assert_eq!(Target::from_str("Effect").map(Target::name), Some("effect"));
        assert_eq!(Target::Mermaid { fenced: true }.language(), "markdown");
        assert_eq!(Target::from_str("yup"), None);
    }
}
