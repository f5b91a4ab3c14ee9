use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use tablegen::ast::SchemaModel;
use tablegen::config::Config;
use tablegen::dialect::Dialect;
use tablegen::emit::{EmitOptions, Target, ValidatorRenderer};
use tablegen::generate::{self, FsWriter, Passthrough};
use tablegen::ir::SchemaError;
use tablegen::parser::{Expr, Parser};
use tablegen::relation::{RelationError, connector};

const SCHEMA: &str = r#"
import { pgTable, uuid, text, varchar } from 'drizzle-orm/pg-core'

/// @z.strictObject
/// @v.strictObject
/// @a.strictObject
/// @e.strictObject
export const user = pgTable('user', {
  /// Primary key
  /// @z.uuid()
  /// @v.pipe(v.string(), v.uuid())
  /// @a."string.uuid"
  /// @e.Schema.UUID
  id: uuid('id').primaryKey(),
  /// @z.string().min(1)
  /// @v.pipe(v.string(), v.minLength(1))
  /// @a."string > 0"
  /// @e.Schema.NonEmptyString
  name: varchar('name', { length: 50 }).notNull(),
})

/// @relation user.id post.userId one-to-many
export const post = pgTable('post', {
  /// @z.uuid()
  id: uuid('id').primaryKey(),
  /// Author of the post
  /// @z.uuid()
  userId: uuid('user_id').notNull(),
  body: text('body'),
})
"#;

fn options(comment: bool) -> EmitOptions {
    EmitOptions {
        comment,
        include_type: true,
        include_relations: true,
    }
}

/// Keys of the object literal in the first call chain of `name`'s initializer.
fn emitted_keys(text: &str, name: &str) -> Vec<String> {
    fn object_keys(expr: &Expr) -> Option<Vec<String>> {
        match expr {
            Expr::Object(props) => Some(props.iter().map(|p| p.key.clone()).collect()),
            Expr::Call { callee, args } => args
                .iter()
                .find_map(object_keys)
                .or_else(|| object_keys(callee)),
            Expr::Member { object, .. } => object_keys(object),
            _ => None,
        }
    }

    let module = Parser::new(text).unwrap().parse().unwrap();
    let decl = module
        .declarations
        .iter()
        .find(|d| d.name == name)
        .unwrap();
    object_keys(decl.init.as_ref().unwrap()).unwrap()
}

#[test]
fn scenario_a_single_description_comment() {
    let source = r#"
export const user = pgTable('user', {
  /// Primary key
  /// @z.uuid()
  id: uuid('id'),
  /// @z.string()
  name: text('name'),
})
"#;
    let model = SchemaModel::from_source(source, Some(Dialect::Zod)).unwrap();
    let out = ValidatorRenderer::new(Dialect::Zod, options(true)).render(&model);

    assert_eq!(out.matches("/**").count(), 1);
    assert!(out.contains("  /**\n   * Primary key\n   */\n  id: z.uuid(),"));

    let plain = ValidatorRenderer::new(Dialect::Zod, options(false)).render(&model);
    assert!(!plain.contains("Primary key"));
}

#[test]
fn scenario_b_one_to_many_connector() {
    let model = SchemaModel::from_source(SCHEMA, None).unwrap();
    assert_eq!(model.relations.len(), 1);
    assert_eq!(model.relations[0].kind.connector(), "||--|{");

    let diagram = Target::Mermaid { fenced: false }.render(&model, EmitOptions::default());
    assert!(diagram.contains("    user ||--|{ post : \"(id) - (userId)\""));
    assert!(diagram.contains("        uuid userId FK \"Author of the post\"\n"));
}

#[test]
fn scenario_c_bad_relation_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("tablegen.yml");
    fs::write(
        &config_path,
        "input: schema.ts\nzod:\n  output: gen/zod.ts\nmermaid:\n  output: docs/er.md\n",
    )
    .unwrap();
    let config = Config::load(&config_path).unwrap();

    let source = SCHEMA.replace("one-to-many", "one-to-banana");
    let err = generate::run(&config, &source, &Passthrough, &FsWriter).unwrap_err();

    assert!(matches!(
        &err,
        SchemaError::Relation(RelationError::UnknownType(token)) if token == "one-to-banana"
    ));
    assert!(err.to_string().contains("one-to-banana"));
    assert!(!dir.path().join("docs/er.md").exists());
    assert!(!dir.path().join("gen/zod.ts").exists());
}

#[test]
fn scenario_d_strict_wrapper_only_on_marked_table() {
    let cases = [
        (
            Target::Zod(Default::default()),
            "UserSchema = z.strictObject({",
            "PostSchema = z.object({",
        ),
        (Target::Valibot, "UserSchema = v.strictObject({", "PostSchema = v.object({"),
        (Target::ArkType, "  '+': 'reject',\n})", "PostSchema = type({"),
        (
            Target::Effect,
            "}).annotations({ parseOptions: { onExcessProperty: 'error' } })",
            "PostSchema = Schema.Struct({",
        ),
    ];

    for (target, user_spelling, post_spelling) in cases {
        let model = SchemaModel::from_source(SCHEMA, target.dialect()).unwrap();
        let out = target.render(&model, EmitOptions::default());
        assert!(out.contains(user_spelling), "{}:\n{out}", target.name());
        assert!(out.contains(post_spelling), "{}:\n{out}", target.name());
        assert_eq!(out.matches(user_spelling).count(), 1, "{}", target.name());
    }
}

#[test]
fn partially_annotated_fields_stay_present() {
    let model = SchemaModel::from_source(SCHEMA, Some(Dialect::Effect)).unwrap();
    let post = model.table("post").unwrap();
    assert_eq!(post.fields.len(), 3);
    assert!(post.fields.iter().all(|f| f.definition.is_empty()));

    let out = Target::Effect.render(&model, EmitOptions::default());
    assert!(out.contains("  body: Schema.Unknown,"));
}

#[test]
fn generated_fields_reparse_in_order() {
    let model = SchemaModel::from_source(SCHEMA, Some(Dialect::Zod)).unwrap();
    let out = Target::Zod(Default::default()).render(&model, options(true));

    assert_eq!(emitted_keys(&out, "UserSchema"), vec!["id", "name"]);
    assert_eq!(emitted_keys(&out, "PostSchema"), vec!["id", "userId", "body"]);
    assert_eq!(emitted_keys(&out, "UserRelationsSchema"), vec!["posts"]);
    assert_eq!(emitted_keys(&out, "PostRelationsSchema"), vec!["user"]);
}

#[test]
fn quoted_keys_survive_generation() {
    let source = r#"
export const user = pgTable('user', {
  /// @z.uuid()
  'user-id': uuid('user_id'),
  "display name": text('display_name'),
  2: text('slot'),
})
"#;
    let model = SchemaModel::from_source(source, Some(Dialect::Zod)).unwrap();
    let out = Target::Zod(Default::default()).render(&model, EmitOptions::default());

    assert!(out.contains("  'user-id': z.uuid(),\n"));
    assert_eq!(
        emitted_keys(&out, "UserSchema"),
        vec!["user-id", "display name", "2"]
    );
}

#[test]
fn end_to_end_writes_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("tablegen.yml");
    fs::write(
        &config_path,
        r#"
input: schema.ts
zod: { output: gen/zod.ts, comment: true, type: true, relation: true, variant: v4 }
valibot: { output: gen/valibot.ts }
arktype: { output: gen/arktype.ts }
effect: { output: gen/effect.ts }
mermaid: { output: docs/er.md }
"#,
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let report = generate::run(&config, SCHEMA, &Passthrough, &FsWriter).unwrap();
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 5);

    let zod = fs::read_to_string(dir.path().join("gen/zod.ts")).unwrap();
    assert!(zod.starts_with("import * as z from 'zod'\n"));
    assert!(zod.contains("export type UserRelations = z.infer<typeof UserRelationsSchema>"));

    let ark = fs::read_to_string(dir.path().join("gen/arktype.ts")).unwrap();
    assert!(ark.contains("  id: \"string.uuid\","));

    let er = fs::read_to_string(dir.path().join("docs/er.md")).unwrap();
    assert!(er.starts_with("```mermaid\nerDiagram\n"));
    assert!(er.ends_with("```\n"));
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}"
}

fn description() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,3}"
}

fn unique(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

fn table_source(fields: &[(String, Option<String>)]) -> String {
    let mut src = String::from("export const item = sqliteTable('item', {\n");
    for (name, desc) in fields {
        if let Some(desc) = desc {
            src.push_str(&format!("  /// {desc}\n"));
        }
        src.push_str(&format!("  /// @z.string()\n  {name}: text('{name}'),\n"));
    }
    src.push_str("})\n");
    src
}

proptest! {
    #[test]
    fn field_order_is_preserved(
        names in prop::collection::vec(ident(), 1..10),
        descs in prop::collection::vec(prop::option::of(description()), 10),
    ) {
        let names = unique(names);
        let fields: Vec<(String, Option<String>)> = names
            .iter()
            .cloned()
            .zip(descs.iter().cloned())
            .collect();
        let source = table_source(&fields);

        let model = SchemaModel::from_source(&source, Some(Dialect::Zod)).unwrap();
        let extracted: Vec<&str> = model.tables[0].fields.iter().map(|f| f.name.as_str()).collect();
        prop_assert_eq!(&extracted, &names.iter().map(String::as_str).collect::<Vec<_>>());

        let out = Target::Zod(Default::default()).render(&model, options(true));
        prop_assert_eq!(emitted_keys(&out, "ItemSchema"), names.clone());

        for (name, desc) in &fields {
            if let Some(desc) = desc {
                let block = format!("   * {desc}\n   */\n  {name}: z.string(),");
                prop_assert!(out.contains(&block));
            }
        }
        let plain = Target::Zod(Default::default()).render(&model, options(false));
        prop_assert!(!plain.contains("/**"));
    }

    #[test]
    fn extraction_is_idempotent(
        names in prop::collection::vec(ident(), 1..8),
        descs in prop::collection::vec(prop::option::of(description()), 8),
    ) {
        let fields: Vec<(String, Option<String>)> = unique(names).into_iter().zip(descs).collect();
        let source = table_source(&fields);
        let first = SchemaModel::from_source(&source, Some(Dialect::Zod)).unwrap();
        let second = SchemaModel::from_source(&source, Some(Dialect::Zod)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn connector_rejects_tokens_outside_the_set(token in "[a-z-]{0,30}") {
        let sides = ["zero-one", "one", "zero-many", "many"];
        let valid = sides.iter().any(|l| {
            sides.iter().any(|r| {
                token == format!("{l}-to-{r}") || token == format!("{l}-to-{r}-optional")
            })
        });
        prop_assert_eq!(connector(&token).is_ok(), valid);
    }
}

#[test]
fn connector_is_total_over_the_closed_set() {
    let sides = ["zero-one", "one", "zero-many", "many"];
    let mut seen = HashSet::new();
    for l in sides {
        for r in sides {
            for suffix in ["", "-optional"] {
                let token = format!("{l}-to-{r}{suffix}");
                let glyph = connector(&token).unwrap();
                assert_eq!(connector(&token).unwrap(), glyph);
                assert!(seen.insert(glyph), "{token} collides");
            }
        }
    }
    assert_eq!(seen.len(), 32);
}
