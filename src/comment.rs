//! Documentation blocks and the annotation tags embedded in them.

use crate::ast::ObjectType;
use crate::dialect::Dialect;
use crate::relation::is_relation_directive;

pub const DOC_MARKER: &str = "///";

/// Collect the documentation block immediately preceding `line` (0-based).
///
/// Walks upward over `///` lines and blank lines, stopping at the first line
/// that is neither. Blank lines are skipped, not returned. The result is in
/// source order.
pub fn doc_block<'a>(lines: &[&'a str], line: usize) -> Vec<&'a str> {
    let mut block = Vec::new();
    let end = line.min(lines.len());

    for raw in lines[..end].iter().rev() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with(DOC_MARKER) {
            block.push(*raw);
        } else {
            break;
        }
    }

    block.reverse();
    block
}

/// Strip the comment marker and surrounding whitespace. Empty lines are dropped.
pub fn doc_lines<'a>(block: &[&'a str]) -> Vec<&'a str> {
    block
        .iter()
        .map(|raw| {
            let trimmed = raw.trim();
            trimmed.strip_prefix(DOC_MARKER).unwrap_or(trimmed).trim()
        })
        .filter(|l| !l.is_empty())
        .collect()
}

/// What a documentation block says for one dialect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub definition: Option<String>,
    pub description: Option<String>,
    pub object_type: Option<ObjectType>,
}

/// Parse a raw documentation block for `dialect`.
pub fn parse_annotation(block: &[&str], dialect: Dialect) -> Annotation {
    let mut annotation = Annotation {
        description: description(block),
        ..Annotation::default()
    };

    for line in doc_lines(block) {
        if let Some(shape) = object_type_directive(line, dialect) {
            annotation.object_type.get_or_insert(shape);
        } else if annotation.definition.is_none() && !is_object_directive(line) {
            annotation.definition = dialect.definition(line);
        }
    }
    annotation
}

/// Free-text part of a documentation block: every line that carries no tag
/// for any dialect and is not a relation directive, joined with spaces.
pub fn description(block: &[&str]) -> Option<String> {
    let text: Vec<&str> = doc_lines(block)
        .into_iter()
        .filter(|line| !Dialect::is_any_tag(line) && !is_relation_directive(line))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    }
}

fn object_type_directive(line: &str, dialect: Dialect) -> Option<ObjectType> {
    let rest = line.strip_prefix(dialect.tag())?;
    match rest {
        "strictObject" => Some(ObjectType::Strict),
        "looseObject" => Some(ObjectType::Loose),
        _ => None,
    }
}

fn is_object_directive(line: &str) -> bool {
    Dialect::ALL
        .iter()
        .any(|d| object_type_directive(line, *d).is_some())
}
