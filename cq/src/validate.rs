//! Content validation for template leaves
//!
//! A [`Validator`] gates what a leaf is allowed to commit: content that fails
//! is thrown away and the leaf's source is asked again, up to the validation
//! budget. Validators see only the candidate text, never the session.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Outcome of one validation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// True when the content is acceptable
    pub valid: bool,
    /// Human-readable reasons for rejection, empty when valid
    pub errors: Vec<String>,
}

impl Validation {
    /// Accept the content
    pub fn ok() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    /// Reject the content with the given reasons
    pub fn fail(errors: Vec<String>) -> Self {
        Self { valid: false, errors }
    }
}

/// Acceptance check applied to leaf content before it is committed
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, content: &str) -> Validation;
}

/// Validator wrapping a synchronous closure
pub struct FnValidator {
    check: Box<dyn Fn(&str) -> Validation + Send + Sync>,
}

impl FnValidator {
    pub fn new(check: impl Fn(&str) -> Validation + Send + Sync + 'static) -> Self {
        Self { check: Box::new(check) }
    }
}

#[async_trait]
impl Validator for FnValidator {
    async fn validate(&self, content: &str) -> Validation {
        (self.check)(content)
    }
}

/// Validator that parses the content as JSON and checks it against a schema
///
/// Parsing tolerates markdown code fences and surrounding prose, since model
/// output rarely arrives as bare JSON.
pub struct SchemaValidator {
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    /// Compile `schema`; fails when the schema itself is invalid
    pub fn new(schema: Value) -> eyre::Result<Self> {
        debug!("SchemaValidator::new: called");
        let compiled =
            jsonschema::validator_for(&schema).map_err(|e| eyre::eyre!("invalid schema: {e}"))?;
        Ok(Self { compiled })
    }
}

#[async_trait]
impl Validator for SchemaValidator {
    async fn validate(&self, content: &str) -> Validation {
        let Some(value) = extract_json(content) else {
            return Validation::fail(vec!["no JSON value found in content".to_string()]);
        };
        let errors: Vec<String> = self.compiled.iter_errors(&value).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Validation::ok()
        } else {
            debug!(error_count = errors.len(), "SchemaValidator::validate: rejected");
            Validation::fail(errors)
        }
    }
}

/// Pull a JSON value out of model text
///
/// Tries, in order: the whole text, the first fenced code block, the widest
/// brace-delimited slice. Returns `None` when nothing parses.
pub(crate) fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    if let Some(fenced) = fenced_block(trimmed)
        && let Ok(value) = serde_json::from_str(fenced.trim())
    {
        return Some(value);
    }
    let start = trimmed.find(['{', '['])?;
    let close = if trimmed.as_bytes()[start] == b'{' { '}' } else { ']' };
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Body of the first ``` fence, skipping the info string line
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": { "type": "string" },
                "confidence": { "type": "number" }
            },
            "required": ["answer"]
        })
    }

    #[tokio::test]
    async fn test_fn_validator_runs_the_closure() {
        let validator = FnValidator::new(|content| {
            if content.contains("8") {
                Validation::ok()
            } else {
                Validation::fail(vec!["must mention 8".to_string()])
            }
        });

        assert!(validator.validate("the answer is 8").await.valid);
        let rejected = validator.validate("no idea").await;
        assert!(!rejected.valid);
        assert_eq!(rejected.errors, vec!["must mention 8".to_string()]);
    }

    #[tokio::test]
    async fn test_schema_validator_accepts_conforming_json() {
        let validator = SchemaValidator::new(answer_schema()).unwrap();
        let result = validator.validate(r#"{"answer": "8", "confidence": 0.9}"#).await;
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_schema_validator_rejects_violations() {
        let validator = SchemaValidator::new(answer_schema()).unwrap();
        let result = validator.validate(r#"{"confidence": "high"}"#).await;
        assert!(!result.valid);
        assert!(!result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_schema_validator_reads_fenced_json() {
        let validator = SchemaValidator::new(answer_schema()).unwrap();
        let content = "Here you go:\n```json\n{\"answer\": \"8\"}\n```\nDone.";
        assert!(validator.validate(content).await.valid);
    }

    #[tokio::test]
    async fn test_schema_validator_fails_on_prose() {
        let validator = SchemaValidator::new(answer_schema()).unwrap();
        let result = validator.validate("I could not produce JSON, sorry.").await;
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["no JSON value found in content".to_string()]);
    }

    #[test]
    fn test_schema_validator_rejects_invalid_schema() {
        // "type" must be a string or array of strings
        let result = SchemaValidator::new(json!({ "type": 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_json_plain() {
        let value = extract_json(r#"  {"a": 1}  "#).unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[test]
    fn test_extract_json_fenced_without_language() {
        let value = extract_json("```\n[1, 2, 3]\n```").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let value = extract_json("The result is {\"done\": true} as requested.").unwrap();
        assert_eq!(value, json!({ "done": true }));
    }

    #[test]
    fn test_extract_json_none_for_prose() {
        assert!(extract_json("nothing structured here").is_none());
    }
}
