//! Structured response rendering and schema validation
//!
//! Every structured response is checked twice: once as typed data
//! (the refusal invariant) and once as serialized JSON (the wire
//! contract). A response that fails either check is never returned.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Answer, StructuredResponse, REFUSAL_TEXT};

/// Render an answer into the structured wire form.
///
/// `confidence` is clamped into [0, 1]. Fails with a schema error if
/// the answer violates the refusal invariant or the serialized value
/// does not meet the wire contract.
pub fn to_structured(answer: &Answer, confidence: f32) -> Result<StructuredResponse> {
    check_answer_invariant(answer)?;

    let response = StructuredResponse {
        answer: answer.text.clone(),
        citations: answer.citations.clone(),
        refused: answer.refused,
        confidence: confidence.clamp(0.0, 1.0),
    };

    validate_value(&serde_json::to_value(&response)?)?;
    Ok(response)
}

/// The refusal invariant: `refused`, the canonical refusal text, and
/// empty citations always travel together.
fn check_answer_invariant(answer: &Answer) -> Result<()> {
    if answer.refused {
        if answer.text != REFUSAL_TEXT {
            return Err(Error::schema_invariant(
                "refused answer does not carry the canonical refusal text",
            ));
        }
        if !answer.citations.is_empty() {
            return Err(Error::schema_invariant(
                "refused answer must not carry citations",
            ));
        }
    } else {
        if answer.citations.is_empty() {
            return Err(Error::schema_invariant(
                "grounded answer must carry at least one citation",
            ));
        }
        if answer.text == REFUSAL_TEXT {
            return Err(Error::schema_invariant(
                "grounded answer carries the refusal text",
            ));
        }
    }
    Ok(())
}

/// Validate a serialized response against the wire contract:
/// `answer` string, `citations` array of `{source, chunk, excerpt}`,
/// `refused` boolean, optional `confidence` number in [0, 1], with the
/// refusal invariant holding across the three core fields.
pub fn validate_value(value: &Value) -> Result<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::schema_invariant("response must be a JSON object"))?;

    let answer = require(obj, "answer")?
        .as_str()
        .ok_or_else(|| Error::schema_invariant("field 'answer' must be a string"))?;
    let refused = require(obj, "refused")?
        .as_bool()
        .ok_or_else(|| Error::schema_invariant("field 'refused' must be a boolean"))?;
    let citations = require(obj, "citations")?
        .as_array()
        .ok_or_else(|| Error::schema_invariant("field 'citations' must be an array"))?;

    for (i, citation) in citations.iter().enumerate() {
        validate_citation(citation)
            .map_err(|err| Error::schema_invariant(format!("citations[{i}]: {err}")))?;
    }

    if let Some(confidence) = obj.get("confidence") {
        let confidence = confidence
            .as_f64()
            .ok_or_else(|| Error::schema_invariant("field 'confidence' must be a number"))?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::schema_invariant(format!(
                "field 'confidence' ({confidence}) must be within [0, 1]"
            )));
        }
    }

    let is_refusal_text = answer == REFUSAL_TEXT;
    if refused != is_refusal_text || refused != citations.is_empty() {
        return Err(Error::schema_invariant(format!(
            "refusal invariant violated: refused={refused}, canonical_text={is_refusal_text}, citations={}",
            citations.len()
        )));
    }
    Ok(())
}

fn validate_citation(value: &Value) -> std::result::Result<(), String> {
    let obj = value.as_object().ok_or("must be an object")?;

    obj.get("source")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or("field 'source' must be a non-empty string")?;
    obj.get("chunk")
        .and_then(Value::as_u64)
        .ok_or("field 'chunk' must be a non-negative integer")?;
    obj.get("excerpt")
        .and_then(Value::as_str)
        .ok_or("field 'excerpt' must be a string")?;
    Ok(())
}

fn require<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| Error::schema_invariant(format!("missing required field '{key}'")))
}
