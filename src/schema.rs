use jsonschema::{validator_for, Validator};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("{0}")]
    ValidationFailed(String),
}

/// A tool input schema compiled once at registration time.
pub struct ArgumentSchema {
    validator: Validator,
}

impl ArgumentSchema {
    pub fn compile(schema: &Value) -> Result<Self, SchemaValidationError> {
        let validator =
            validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Validate an argument object. Every violation is reported, joined by `; `.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed(errors.join("; ")))
        }
    }
}

/// Build the `{type: object, properties, required}` schema shared by every
/// tool here: all parameters are required strings.
pub fn string_params(params: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = params
        .iter()
        .map(|(name, description)| {
            (
                (*name).to_string(),
                serde_json::json!({ "type": "string", "description": description }),
            )
        })
        .collect();
    let required: Vec<&str> = params.iter().map(|(name, _)| *name).collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_is_rejected() {
        let schema = ArgumentSchema::compile(&string_params(&[("query", "The search query.")])).unwrap();
        let err = schema.validate(&json!({})).unwrap_err();
        assert!(err.to_string().contains("query"), "unexpected message: {err}");
    }

    #[test]
    fn wrong_type_is_rejected() {
        let schema = ArgumentSchema::compile(&string_params(&[("url", "Page URL.")])).unwrap();
        assert!(schema.validate(&json!({ "url": 42 })).is_err());
    }

    #[test]
    fn valid_arguments_pass() {
        let schema = ArgumentSchema::compile(&string_params(&[
            ("query", "The search query."),
            ("context", "Relevance context."),
        ]))
        .unwrap();
        schema
            .validate(&json!({ "query": "rust", "context": "async runtimes" }))
            .expect("arguments should validate");
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        assert!(ArgumentSchema::compile(&json!({ "type": 12 })).is_err());
    }
}
