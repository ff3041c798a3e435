//! Argument validation against a tool's JSON Schema.

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::warn;

/// Check `value` against `schema`. Returns every violation found, each
/// prefixed with the JSON path it applies to (`$` is the argument object).
///
/// A schema that does not compile is logged and treated as accepting
/// everything.
pub fn validate(value: &Value, schema: &Value) -> Result<(), Vec<String>> {
    if !schema.is_object() {
        return Ok(());
    }

    let compiled = match JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!(error = %e, "invalid tool schema");
            return Ok(());
        }
    };

    let result = compiled.validate(value).map_err(|errors| {
        errors
            .map(|err| format!("{}: {}", json_path(&err.instance_path.to_string()), err))
            .collect::<Vec<_>>()
    });
    result
}

/// `/days/0` → `$.days[0]`.
fn json_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for chunk in pointer.split('/').skip(1) {
        if chunk.parse::<usize>().is_ok() {
            path.push_str(&format!("[{chunk}]"));
        } else {
            path.push('.');
            path.push_str(&chunk.replace("~1", "/").replace("~0", "~"));
        }
    }
    path
}
