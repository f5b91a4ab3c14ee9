//! `@relation` directives and their diagram cardinalities.

use crate::ast::Relation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DIRECTIVE: &str = "@relation";

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@relation\s+(\w+)\.(\w+)\s+(\w+)\.(\w+)\s+(\S+)\s*$")
        .expect("relation directive pattern is valid")
});

#[derive(Debug, Error, PartialEq)]
pub enum RelationError {
    #[error("Unknown relation type: {0}")]
    UnknownType(String),
    #[error("Malformed relation directive on line {line}: {text}")]
    Malformed { line: usize, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ZeroOne,
    One,
    ZeroMany,
    Many,
}

impl Cardinality {
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "zero-one" => Some(Self::ZeroOne),
            "one" => Some(Self::One),
            "zero-many" => Some(Self::ZeroMany),
            "many" => Some(Self::Many),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::ZeroOne => "zero-one",
            Self::One => "one",
            Self::ZeroMany => "zero-many",
            Self::Many => "many",
        }
    }

    /// Crow's-foot symbol when this side sits left of the connector.
    pub fn left_symbol(self) -> &'static str {
        match self {
            Self::ZeroOne => "|o",
            Self::One => "||",
            Self::ZeroMany => "}o",
            Self::Many => "}|",
        }
    }

    /// Crow's-foot symbol when this side sits right of the connector.
    pub fn right_symbol(self) -> &'static str {
        match self {
            Self::ZeroOne => "o|",
            Self::One => "||",
            Self::ZeroMany => "o{",
            Self::Many => "|{",
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self, Self::ZeroMany | Self::Many)
    }
}

/// `<cardinality>-to-<cardinality>[-optional]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationType {
    pub from: Cardinality,
    pub to: Cardinality,
    pub optional: bool,
}

impl RelationType {
    /// Diagram connector, e.g. `||--|{` for `one-to-many`.
    pub fn connector(&self) -> String {
        let line = if self.optional { ".." } else { "--" };
        format!("{}{}{}", self.from.left_symbol(), line, self.to.right_symbol())
    }
}

impl FromStr for RelationType {
    type Err = RelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || RelationError::UnknownType(s.to_string());

        let (body, optional) = match s.strip_suffix("-optional") {
            Some(body) => (body, true),
            None => (s, false),
        };
        let (left, right) = body.split_once("-to-").ok_or_else(unknown)?;
        let from = Cardinality::from_token(left).ok_or_else(unknown)?;
        let to = Cardinality::from_token(right).ok_or_else(unknown)?;

        Ok(Self { from, to, optional })
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-to-{}", self.from.token(), self.to.token())?;
        if self.optional {
            f.write_str("-optional")?;
        }
        Ok(())
    }
}

/// Map a relation type token straight to its diagram connector.
pub fn connector(token: &str) -> Result<String, RelationError> {
    Ok(token.parse::<RelationType>()?.connector())
}

/// True if a comment-stripped line is a relation directive (well-formed or not).
pub fn is_relation_directive(line: &str) -> bool {
    match line.strip_prefix(DIRECTIVE) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// A source line without its comment decoration: `///`, `//`, `/**`, a
/// leading `*` inside a block comment, and a closing `*/`.
fn directive_text(raw: &str) -> &str {
    let text = raw
        .trim()
        .trim_start_matches('/')
        .trim_start_matches('*')
        .trim();
    text.strip_suffix("*/").unwrap_or(text).trim()
}

/// Scan raw source lines for relation directives.
///
/// Any line that starts like a directive but does not parse is an error.
pub fn extract_relations(lines: &[&str]) -> Result<Vec<Relation>, RelationError> {
    let mut relations = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let text = directive_text(raw);
        if !is_relation_directive(text) {
            continue;
        }

        let caps = DIRECTIVE_RE
            .captures(text)
            .ok_or_else(|| RelationError::Malformed {
                line: idx + 1,
                text: text.to_string(),
            })?;

        relations.push(Relation {
            from_model: caps[1].to_string(),
            from_field: caps[2].to_string(),
            to_model: caps[3].to_string(),
            to_field: caps[4].to_string(),
            kind: caps[5].parse()?,
        });
    }

    Ok(relations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_many_connector() {
        assert_eq!(connector("one-to-many").unwrap(), "||--|{");
    }

    #[test]
    fn test_optional_uses_dashed_line() {
        assert_eq!(connector("zero-one-to-zero-many-optional").unwrap(), "|o..o{");
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            connector("one-to-banana"),
            Err(RelationError::UnknownType("one-to-banana".into()))
        );
        assert!(connector("one").is_err());
        assert!(connector("many-to-one-required").is_err());
        assert!(connector("optional-to-one").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let t: RelationType = "zero-many-to-one-optional".parse().unwrap();
        assert_eq!(t.to_string(), "zero-many-to-one-optional");
    }

    #[test]
    fn test_extract() {
        let src = "/// @relation user.id post.userId one-to-many\nexport const post = 1\n// @relation user.id like.userId one-to-zero-many";
        let lines: Vec<&str> = src.lines().collect();
        let rels = extract_relations(&lines).unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].from_model, "user");
        assert_eq!(rels[0].from_field, "id");
        assert_eq!(rels[0].to_model, "post");
        assert_eq!(rels[0].to_field, "userId");
        assert_eq!(rels[0].kind.to, Cardinality::Many);
    }

    #[test]
    fn test_extract_rejects_bad_type() {
        let lines = vec!["/// @relation user.id post.userId one-to-banana"];
        assert_eq!(
            extract_relations(&lines),
            Err(RelationError::UnknownType("one-to-banana".into()))
        );
    }

    #[test]
    fn test_extract_rejects_malformed() {
        let lines = vec!["", "/// @relation user post.userId one-to-many"];
        assert!(matches!(
            extract_relations(&lines),
            Err(RelationError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_lookalike_prefix_ignored() {
        let lines = vec!["/// @relations are documented elsewhere"];
        assert!(extract_relations(&lines).unwrap().is_empty());
    }

    #[test]
    fn test_block_comment_directives() {
        let src = concat!(
            "/**\n",
            " * @relation user.id post.userId one-to-many\n",
            " */\n",
            "/* @relation user.id tag.userId many-to-many */",
        );
        let lines: Vec<&str> = src.lines().collect();
        let rels = extract_relations(&lines).unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].to_model, "post");
        assert_eq!(rels[1].to_model, "tag");
        assert_eq!(rels[1].kind.from, Cardinality::Many);
    }

    #[test]
    fn test_block_comment_bad_type_is_rejected() {
        let lines = vec!["/** @relation user.id post.userId one-to-banana */"];
        assert_eq!(
            extract_relations(&lines),
            Err(RelationError::UnknownType("one-to-banana".into()))
        );
    }
}
