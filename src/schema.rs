use rmcp::model::JsonObject;
use rmcp::schemars::{self, JsonSchema, generate::SchemaSettings};
use std::sync::Arc;

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// so the `mode` enum of `search` is rendered as an inline choice instead of a `$ref`.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SearchRequest;
    use assert2::{check, let_assert};

    #[test]
    fn test_search_schema_inlines_mode() {
        let schema = inline_schema_for_type::<SearchRequest>();
        let_assert!(Some(properties) = schema.get("properties").and_then(|p| p.as_object()));
        check!(properties.contains_key("query"));
        check!(properties.contains_key("mode"));
        check!(!serde_json::to_string(&*schema).unwrap_or_default().contains("$ref"));
    }
}
