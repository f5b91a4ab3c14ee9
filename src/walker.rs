//! Finds table declarations and their field lists in a parsed module.

use crate::parser::{Declaration, Expr, ParseError, Parser, Property};
use tracing::debug;

/// Table constructors are recognised by this callee suffix (`pgTable`, ...).
pub const TABLE_SUFFIX: &str = "Table";
/// Relation constructors are `relations(...)` or anything containing `Relations`.
pub const RELATIONS_CALLEE: &str = "relations";
pub const RELATIONS_MARKER: &str = "Relations";

#[derive(Debug, Clone, PartialEq)]
pub struct TableDecl {
    pub name: String,
    /// 0-based line the declaration statement starts on.
    pub line: usize,
    pub fields: Vec<FieldCandidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub name: String,
    pub line: usize,
    pub column_type: Option<String>,
    pub primary_key: bool,
}

enum Shape<'a> {
    Table(Option<&'a [Property]>),
    Relations,
    Other,
}

/// Parse `source` and return its exported table declarations in source order.
pub fn walk(source: &str) -> Result<Vec<TableDecl>, ParseError> {
    let module = Parser::new(source)?.parse()?;

    let tables: Vec<TableDecl> = module
        .declarations
        .iter()
        .filter(|d| d.exported)
        .filter_map(table_decl)
        .collect();

    debug!(
        declarations = module.declarations.len(),
        tables = tables.len(),
        "walked source"
    );
    Ok(tables)
}

fn table_decl(decl: &Declaration) -> Option<TableDecl> {
    let init = decl.init.as_ref()?;
    match classify(init) {
        Shape::Table(Some(props)) => Some(TableDecl {
            name: decl.name.clone(),
            line: decl.line,
            fields: props.iter().map(field_candidate).collect(),
        }),
        Shape::Table(None) => {
            debug!(table = %decl.name, "table constructor without a field object, skipped");
            None
        }
        Shape::Relations | Shape::Other => None,
    }
}

fn classify(expr: &Expr) -> Shape<'_> {
    let Expr::Call { callee, args } = unparen(expr) else {
        return Shape::Other;
    };

    if let Some(name) = callee_name(callee) {
        if name == RELATIONS_CALLEE || name.contains(RELATIONS_MARKER) {
            return Shape::Relations;
        }
        if name.ends_with(TABLE_SUFFIX) {
            return Shape::Table(args.iter().find_map(field_object));
        }
    }

    // `pgTable(...).enableRLS()`
    match callee.as_ref() {
        Expr::Member { object, .. } => classify(object),
        _ => Shape::Other,
    }
}

fn callee_name(callee: &Expr) -> Option<&str> {
    match callee {
        Expr::Ident(name) => Some(name.as_str()),
        Expr::Member { property, .. } => Some(property.as_str()),
        _ => None,
    }
}

/// First object literal reachable through parentheses and arrow bodies.
fn field_object(arg: &Expr) -> Option<&[Property]> {
    match arg {
        Expr::Object(props) => Some(props.as_slice()),
        Expr::Paren(inner) | Expr::Arrow(inner) => field_object(inner),
        _ => None,
    }
}

fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(inner) = expr {
        expr = inner;
    }
    expr
}

fn field_candidate(prop: &Property) -> FieldCandidate {
    let (column_type, primary_key) = column_facts(&prop.value);
    FieldCandidate {
        name: prop.key.clone(),
        line: prop.line,
        column_type,
        primary_key,
    }
}

/// Walk a builder chain such as `varchar('id').notNull().primaryKey()` down
/// to its root call.
fn column_facts(value: &Expr) -> (Option<String>, bool) {
    let mut primary_key = false;
    let mut cur = unparen(value);

    loop {
        let Expr::Call { callee, .. } = cur else {
            return (None, primary_key);
        };
        match callee.as_ref() {
            Expr::Ident(name) => return (Some(name.clone()), primary_key),
            Expr::Member { object, property } => {
                if property == "primaryKey" {
                    primary_key = true;
                }
                match unparen(object) {
                    next @ Expr::Call { .. } => cur = next,
                    // `t.uuid()`
                    _ => return (Some(property.clone()), primary_key),
                }
            }
            _ => return (None, primary_key),
        }
    }
}
