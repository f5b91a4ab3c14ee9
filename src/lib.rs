pub mod ast;
pub mod comment;
pub mod config;
pub mod dialect;
pub mod emit;
pub mod generate;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod relation;
pub mod walker;

use wasm_bindgen::prelude::*;

use emit::{EmitOptions, Target};
use ir::{Extraction, SchemaError};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render one target from in-memory table-definition source.
pub fn render(source: &str, target: Target, options: EmitOptions) -> Result<String, SchemaError> {
    let extraction = Extraction::from_source(source)?;
    let model = extraction.schema(target.dialect());
    Ok(target.render(&model, options))
}

/// Render table-definition source to the named target
/// (`zod`, `zod-mini`, `zod-openapi`, `valibot`, `arktype`, `effect`, `mermaid`).
#[wasm_bindgen(js_name = "generateSchema")]
pub fn generate_schema(
    source: &str,
    target: &str,
    comment: bool,
    include_type: bool,
    include_relations: bool,
) -> Result<String, String> {
    let target = Target::from_str(target).ok_or_else(|| format!("Unknown target: {}", target))?;
    let options = EmitOptions {
        comment,
        include_type,
        include_relations,
    };
    render(source, target, options).map_err(|e| e.to_string())
}
