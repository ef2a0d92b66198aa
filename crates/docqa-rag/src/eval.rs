//! Evaluation harness for refusal discipline and citation coverage

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generation::citation::make_excerpt;
use crate::pipeline::{QueryOptions, RagPipeline};
use crate::schema;
use crate::types::{StructuredResponse, REFUSAL_TEXT};

/// One evaluation case: a question and whether it must be refused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub expect_refusal: bool,
}

impl EvalCase {
    pub fn answerable(question: &str) -> Self {
        Self {
            question: question.to_string(),
            expect_refusal: false,
        }
    }

    pub fn refusal(question: &str) -> Self {
        Self {
            question: question.to_string(),
            expect_refusal: true,
        }
    }
}

/// Built-in smoke set: three questions a leave-policy corpus answers
/// and two that no document corpus should
pub fn default_cases() -> Vec<EvalCase> {
    vec![
        EvalCase::answerable("What are the leave policies?"),
        EvalCase::answerable("How does sick leave work and what documentation is required?"),
        EvalCase::answerable("Is annual leave payout allowed on termination?"),
        EvalCase::refusal("What is the capital of Japan?"),
        EvalCase::refusal("What is the CEO's favorite color?"),
    ]
}

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Expected a refusal, got a grounded answer
    ExpectedRefusal,
    /// Expected a grounded answer, got a refusal
    UnexpectedRefusal,
    /// Refused, but not with the canonical refusal text
    RefusalTextMismatch,
    /// Grounded answer arrived without citations
    MissingCitations,
    /// Structured response failed schema validation
    SchemaViolation(String),
    /// The pipeline returned an error for this question
    PipelineError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedRefusal => write!(f, "expected a refusal, got an answer"),
            Self::UnexpectedRefusal => write!(f, "expected an answer, got a refusal"),
            Self::RefusalTextMismatch => write!(f, "refusal text is not canonical"),
            Self::MissingCitations => write!(f, "answer carries no citations"),
            Self::SchemaViolation(msg) => write!(f, "schema violation: {msg}"),
            Self::PipelineError(msg) => write!(f, "pipeline error: {msg}"),
        }
    }
}

/// Outcome of one case
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub question: String,
    pub expect_refusal: bool,
    pub passed: bool,
    pub refused: bool,
    pub citations: usize,
    pub confidence: f32,
    /// Short single-line answer preview
    pub preview: String,
    pub reason: Option<FailureReason>,
}

/// Full run outcome, renderable as a plain-text report
#[derive(Debug)]
pub struct EvalReport {
    pub results: Vec<CaseResult>,
}

impl EvalReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Evaluation Report ===")?;
        writeln!(f, "Passed: {}/{}", self.passed(), self.total())?;

        for result in &self.results {
            let status = if result.passed { "PASS" } else { "FAIL" };
            writeln!(f)?;
            writeln!(f, "[{status}] {}", result.question)?;
            writeln!(
                f,
                "       refused={} citations={} confidence={:.2}",
                result.refused, result.citations, result.confidence
            )?;
            if !result.preview.is_empty() {
                writeln!(f, "       {}", result.preview)?;
            }
            if let Some(reason) = &result.reason {
                writeln!(f, "       reason: {reason}")?;
            }
        }
        Ok(())
    }
}

/// Run every case through the pipeline with default query options.
///
/// Each structured response is re-validated against the wire schema
/// here, independently of the pipeline's own checks. A pipeline error
/// fails the case rather than aborting the run.
pub async fn run(pipeline: &RagPipeline, cases: &[EvalCase]) -> EvalReport {
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let result = match pipeline
            .answer_structured(&case.question, QueryOptions::default())
            .await
        {
            Ok(response) => {
                let reason = validate_and_judge(case, &response);
                CaseResult {
                    question: case.question.clone(),
                    expect_refusal: case.expect_refusal,
                    passed: reason.is_none(),
                    refused: response.refused,
                    citations: response.citations.len(),
                    confidence: response.confidence,
                    preview: make_excerpt(&response.answer, 140),
                    reason,
                }
            }
            Err(err) => CaseResult {
                question: case.question.clone(),
                expect_refusal: case.expect_refusal,
                passed: false,
                refused: false,
                citations: 0,
                confidence: 0.0,
                preview: String::new(),
                reason: Some(FailureReason::PipelineError(err.to_string())),
            },
        };

        info!(
            question = %result.question,
            passed = result.passed,
            refused = result.refused,
            "evaluation case finished"
        );
        results.push(result);
    }

    EvalReport { results }
}

fn validate_and_judge(case: &EvalCase, response: &StructuredResponse) -> Option<FailureReason> {
    match serde_json::to_value(response) {
        Ok(value) => {
            if let Err(err) = schema::validate_value(&value) {
                return Some(FailureReason::SchemaViolation(err.to_string()));
            }
        }
        Err(err) => return Some(FailureReason::SchemaViolation(err.to_string())),
    }
    judge(case, response)
}

/// Pass rules: the refusal flag must match the expectation, refusals
/// must carry the canonical text byte for byte, and grounded answers
/// must carry at least one citation.
fn judge(case: &EvalCase, response: &StructuredResponse) -> Option<FailureReason> {
    if case.expect_refusal {
        if !response.refused {
            return Some(FailureReason::ExpectedRefusal);
        }
        if response.answer != REFUSAL_TEXT {
            return Some(FailureReason::RefusalTextMismatch);
        }
    } else {
        if response.refused {
            return Some(FailureReason::UnexpectedRefusal);
        }
        if response.citations.is_empty() {
            return Some(FailureReason::MissingCitations);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Citation;

    fn grounded_response() -> StructuredResponse {
        StructuredResponse {
            answer: "Twenty days [C1].".to_string(),
            citations: vec![Citation {
                source_path: "leave_policy.txt".to_string(),
                position_index: 0,
                excerpt: "twenty days".to_string(),
            }],
            refused: false,
            confidence: 0.6,
        }
    }

    fn refusal_response() -> StructuredResponse {
        StructuredResponse {
            answer: REFUSAL_TEXT.to_string(),
            citations: Vec::new(),
            refused: true,
            confidence: 0.1,
        }
    }

    #[test]
    fn test_default_cases_cover_both_expectations() {
        let cases = default_cases();
        assert_eq!(cases.len(), 5);
        assert_eq!(cases.iter().filter(|c| c.expect_refusal).count(), 2);
        assert_eq!(cases.iter().filter(|c| !c.expect_refusal).count(), 3);
    }

    #[test]
    fn test_judge_accepts_matching_outcomes() {
        let answerable = EvalCase::answerable("q");
        assert_eq!(validate_and_judge(&answerable, &grounded_response()), None);

        let refusing = EvalCase::refusal("q");
        assert_eq!(validate_and_judge(&refusing, &refusal_response()), None);
    }

    #[test]
    fn test_judge_flags_expectation_mismatches() {
        let answerable = EvalCase::answerable("q");
        assert_eq!(
            judge(&answerable, &refusal_response()),
            Some(FailureReason::UnexpectedRefusal)
        );

        let refusing = EvalCase::refusal("q");
        assert_eq!(
            judge(&refusing, &grounded_response()),
            Some(FailureReason::ExpectedRefusal)
        );
    }

    #[test]
    fn test_judge_requires_canonical_refusal_text() {
        let mut response = refusal_response();
        response.answer = "I cannot answer that.".to_string();

        // judge sees the mismatch on its own; schema validation would too
        assert_eq!(
            judge(&EvalCase::refusal("q"), &response),
            Some(FailureReason::RefusalTextMismatch)
        );
        assert!(matches!(
            validate_and_judge(&EvalCase::refusal("q"), &response),
            Some(FailureReason::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_contract_violations() {
        let mut response = grounded_response();
        response.citations.clear();

        let reason = validate_and_judge(&EvalCase::answerable("q"), &response);
        assert!(matches!(reason, Some(FailureReason::SchemaViolation(_))));
    }

    #[test]
    fn test_report_rendering() {
        let report = EvalReport {
            results: vec![
                CaseResult {
                    question: "What are the leave policies?".to_string(),
                    expect_refusal: false,
                    passed: true,
                    refused: false,
                    citations: 2,
                    confidence: 0.61,
                    preview: "Employees receive twenty days [C1].".to_string(),
                    reason: None,
                },
                CaseResult {
                    question: "What is the capital of Japan?".to_string(),
                    expect_refusal: true,
                    passed: false,
                    refused: false,
                    citations: 1,
                    confidence: 0.4,
                    preview: "Tokyo [C1].".to_string(),
                    reason: Some(FailureReason::ExpectedRefusal),
                },
            ],
        };

        let rendered = report.to_string();
        assert!(rendered.starts_with("=== Evaluation Report ==="));
        assert!(rendered.contains("Passed: 1/2"));
        assert!(rendered.contains("[PASS] What are the leave policies?"));
        assert!(rendered.contains("[FAIL] What is the capital of Japan?"));
        assert!(rendered.contains("reason: expected a refusal, got an answer"));
        assert!(!report.all_passed());
    }
}
