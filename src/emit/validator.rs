//! Validator-library schema emitters (Zod, Valibot, ArkType, Effect).

use super::{EmitOptions, RelationProperty, pascal_case, relation_properties};
use crate::ast::{ObjectType, SchemaModel, TableSchema};
use crate::dialect::Dialect;
use serde::Deserialize;

const INDENT: &str = "  ";

/// Zod import flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ZodVariant {
    #[default]
    #[serde(rename = "v4")]
    V4,
    #[serde(rename = "mini")]
    Mini,
    #[serde(rename = "@hono/zod-openapi", alias = "openapi")]
    OpenApi,
}

/// Opening and closing text around an object body.
struct Wrapper {
    open: String,
    head: Option<String>,
    tail: Option<String>,
    close: String,
}

impl Wrapper {
    fn call(open: String) -> Self {
        Self {
            open,
            head: None,
            tail: None,
            close: "})".to_string(),
        }
    }
}

/// Per-dialect spelling of the emitted constructs.
#[derive(Debug, Clone, Copy)]
struct Syntax {
    dialect: Dialect,
    variant: ZodVariant,
}

impl Syntax {
    fn import(&self) -> &'static str {
        match (self.dialect, self.variant) {
            (Dialect::Zod, ZodVariant::V4) => "import * as z from 'zod'",
            (Dialect::Zod, ZodVariant::Mini) => "import * as z from 'zod/mini'",
            (Dialect::Zod, ZodVariant::OpenApi) => "import { z } from '@hono/zod-openapi'",
            (Dialect::Valibot, _) => "import * as v from 'valibot'",
            (Dialect::ArkType, _) => "import { type } from 'arktype'",
            (Dialect::Effect, _) => "import { Schema } from 'effect'",
        }
    }

    fn unknown(&self) -> &'static str {
        match self.dialect {
            Dialect::Zod => "z.unknown()",
            Dialect::Valibot => "v.unknown()",
            Dialect::ArkType => "'unknown'",
            Dialect::Effect => "Schema.Unknown",
        }
    }

    fn object(&self, object_type: Option<ObjectType>) -> Wrapper {
        match self.dialect {
            Dialect::Zod | Dialect::Valibot => {
                let combinator = match object_type {
                    None => "object",
                    Some(ObjectType::Strict) => "strictObject",
                    Some(ObjectType::Loose) => "looseObject",
                };
                Wrapper::call(format!("{}.{}({{", self.dialect.namespace(), combinator))
            }
            Dialect::ArkType => Wrapper {
                tail: object_type.map(|t| match t {
                    ObjectType::Strict => "'+': 'reject',".to_string(),
                    ObjectType::Loose => "'+': 'ignore',".to_string(),
                }),
                ..Wrapper::call("type({".to_string())
            },
            Dialect::Effect => {
                let mut wrapper = Wrapper::call("Schema.Struct({".to_string());
                if let Some(t) = object_type {
                    let policy = match t {
                        ObjectType::Strict => "error",
                        ObjectType::Loose => "preserve",
                    };
                    wrapper.close = format!(
                        "}}).annotations({{ parseOptions: {{ onExcessProperty: '{policy}' }} }})"
                    );
                }
                wrapper
            }
        }
    }

    fn extend(&self, base: &str) -> Wrapper {
        match (self.dialect, self.variant) {
            (Dialect::Zod, ZodVariant::Mini) => Wrapper::call(format!("z.extend({base}, {{")),
            (Dialect::Zod, _) => Wrapper::call(format!("{base}.extend({{")),
            (Dialect::Valibot, _) => Wrapper {
                head: Some(format!("...{base}.entries,")),
                ..Wrapper::call("v.object({".to_string())
            },
            (Dialect::ArkType, _) => Wrapper::call(format!("{base}.and({{")),
            (Dialect::Effect, _) => Wrapper {
                head: Some(format!("...{base}.fields,")),
                ..Wrapper::call("Schema.Struct({".to_string())
            },
        }
    }

    fn array(&self, schema: &str) -> String {
        match self.dialect {
            Dialect::Zod => format!("z.array({schema})"),
            Dialect::Valibot => format!("v.array({schema})"),
            Dialect::ArkType => format!("{schema}.array()"),
            Dialect::Effect => format!("Schema.Array({schema})"),
        }
    }

    fn infer(&self, schema: &str) -> String {
        match self.dialect {
            Dialect::Zod => format!("z.infer<typeof {schema}>"),
            Dialect::Valibot => format!("v.InferInput<typeof {schema}>"),
            Dialect::ArkType => format!("typeof {schema}.infer"),
            Dialect::Effect => format!("Schema.Schema.Type<typeof {schema}>"),
        }
    }
}

/// Renders every table of a model as validator schemas for one dialect.
pub struct ValidatorRenderer {
    syntax: Syntax,
    options: EmitOptions,
}

impl ValidatorRenderer {
    pub fn new(dialect: Dialect, options: EmitOptions) -> Self {
        Self {
            syntax: Syntax {
                dialect,
                variant: ZodVariant::default(),
            },
            options,
        }
    }

    /// Select the Zod import flavour. Ignored by other dialects.
    pub fn with_variant(mut self, variant: ZodVariant) -> Self {
        self.syntax.variant = variant;
        self
    }

    /// Base schemas for all tables come first, then relation schemas.
    pub fn render(&self, model: &SchemaModel) -> String {
        let mut out = String::new();
        out.push_str(self.syntax.import());
        out.push('\n');

        for table in &model.tables {
            out.push('\n');
            self.render_table(&mut out, table);
        }

        if self.options.include_relations {
            for table in &model.tables {
                let props = relation_properties(model, &table.name);
                if !props.is_empty() {
                    out.push('\n');
                    self.render_relations(&mut out, table, &props);
                }
            }
        }

        out
    }

    fn render_table(&self, out: &mut String, table: &TableSchema) {
        let pascal = pascal_case(&table.name);
        let schema = format!("{pascal}Schema");

        if self.options.comment {
            if let Some(desc) = &table.description {
                push_doc(out, "", desc);
            }
        }

        let body: Vec<(Option<&str>, String)> = table
            .fields
            .iter()
            .map(|field| {
                let value = if field.definition.is_empty() {
                    self.syntax.unknown()
                } else {
                    field.definition.as_str()
                };
                (
                    field.description.as_deref(),
                    format!("{}: {},", property_key(&field.name), value),
                )
            })
            .collect();

        self.push_const(out, &schema, self.syntax.object(table.object_type), &body);
        self.push_type(out, &pascal, &schema);
    }

    fn render_relations(&self, out: &mut String, table: &TableSchema, props: &[RelationProperty]) {
        let pascal = pascal_case(&table.name);
        let base = format!("{pascal}Schema");
        let schema = format!("{pascal}RelationsSchema");

        let body: Vec<(Option<&str>, String)> = props
            .iter()
            .map(|prop| {
                let target = format!("{}Schema", pascal_case(prop.model));
                let value = if prop.many {
                    self.syntax.array(&target)
                } else {
                    target
                };
                (None, format!("{}: {},", property_key(&prop.name), value))
            })
            .collect();

        self.push_const(out, &schema, self.syntax.extend(&base), &body);
        self.push_type(out, &format!("{pascal}Relations"), &schema);
    }

    fn push_const(
        &self,
        out: &mut String,
        name: &str,
        wrapper: Wrapper,
        body: &[(Option<&str>, String)],
    ) {
        out.push_str(&format!("export const {name} = {}\n", wrapper.open));
        if let Some(head) = &wrapper.head {
            out.push_str(&format!("{INDENT}{head}\n"));
        }
        for (description, line) in body {
            if self.options.comment {
                if let Some(desc) = description {
                    push_doc(out, INDENT, desc);
                }
            }
            out.push_str(&format!("{INDENT}{line}\n"));
        }
        if let Some(tail) = &wrapper.tail {
            out.push_str(&format!("{INDENT}{tail}\n"));
        }
        out.push_str(&wrapper.close);
        out.push('\n');
    }

    fn push_type(&self, out: &mut String, alias: &str, schema: &str) {
        if self.options.include_type {
            out.push_str(&format!(
                "\nexport type {alias} = {}\n",
                self.syntax.infer(schema)
            ));
        }
    }
}

fn push_doc(out: &mut String, indent: &str, text: &str) {
    let text = text.replace("*/", "*\\/");
    out.push_str(&format!("{indent}/**\n{indent} * {text}\n{indent} */\n"));
}

/// Object key spelling for `name`: bare when it is an identifier, quoted otherwise.
fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}
