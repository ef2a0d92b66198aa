//! Deterministic in-process providers and fixtures for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::types::REFUSAL_TEXT;

/// Bag-of-words embedder over a per-instance vocabulary.
///
/// Every distinct token of at least four characters gets its own
/// dimension, so cosine similarity reduces to exact token overlap:
/// texts sharing no vocabulary score 0.0, and related texts score high
/// enough to clear any sane threshold. Share one instance wherever
/// stored vectors will be compared against fresh queries.
pub struct MockEmbedder {
    name: String,
    dimensions: usize,
    reported_dimensions: usize,
    vocab: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::named("mock-embedder")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dimensions: 256,
            reported_dimensions: 256,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Every embedding call fails
    pub fn failing() -> Self {
        let embedder = Self::new();
        embedder.set_failing(true);
        embedder
    }

    /// Reports a dimension count that disagrees with emitted vectors
    pub fn with_reported_dimensions(reported: usize) -> Self {
        Self {
            reported_dimensions: reported,
            ..Self::new()
        }
    }

    /// Toggle failure of all subsequent embedding calls
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of embedding calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Deterministic vector for `text`, also usable to embed queries
    /// directly in index-level tests
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let mut vocab = self.vocab.lock();

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 4)
        {
            let next = vocab.len();
            let slot = *vocab.entry(token.to_string()).or_insert(next);
            vector[slot % self.dimensions] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::provider(&self.name, "simulated embedding failure"));
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.reported_dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

enum LlmBehavior {
    Answer(String),
    Refuse,
    Fail,
}

/// Scripted generation provider that records every prompt it sees
pub struct MockLlm {
    behavior: LlmBehavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Always returns `answer`
    pub fn answering(answer: &str) -> Self {
        Self {
            behavior: LlmBehavior::Answer(answer.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always returns the canonical refusal text
    pub fn refusing() -> Self {
        Self {
            behavior: LlmBehavior::Refuse,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every generation call fails
    pub fn failing() -> Self {
        Self {
            behavior: LlmBehavior::Fail,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of generation calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts seen so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match &self.behavior {
            LlmBehavior::Answer(answer) => Ok(answer.clone()),
            LlmBehavior::Refuse => Ok(REFUSAL_TEXT.to_string()),
            LlmBehavior::Fail => Err(Error::provider("mock-llm", "simulated generation failure")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!matches!(self.behavior, LlmBehavior::Fail))
    }

    fn name(&self) -> &str {
        "mock-llm"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Leave policy fixture. Answers the three answerable evaluation
/// questions and shares no four-letter token with the unanswerable
/// ones, so their similarity is exactly zero.
pub const LEAVE_POLICY: &str = "\
Leave Policies Overview

Full-time employees receive twenty days of paid annual leave per year, \
accrued monthly from the start date. Up to five unused days may be \
carried into the next year; any remaining balance above that limit \
expires in January.

Sick leave covers up to ten working days per year at full pay. For \
absences longer than three consecutive days, employees must provide a \
medical certificate as documentation. The certificate is required \
within one week of returning, and human resources records it against \
the sick leave balance.

Annual leave payout on termination is allowed for accrued, unused \
days. The payout is calculated from the employee's base salary and is \
settled with the final pay cycle. Termination during probation follows \
the same payout rules.

Leave requests are submitted through the portal and require manager \
approval two weeks in advance for planned absences.";

/// Second fixture so retrieval spans multiple sources
pub const EXPENSE_POLICY: &str = "\
Expense Reimbursement Policy

Business expenses are reimbursed when submitted within thirty days of \
purchase with an itemized receipt. Travel bookings go through the \
approved agency; meals on business trips are reimbursed up to a daily \
limit. Personal purchases, fines, and undocumented spending are not \
eligible. Reimbursements are paid with the next payroll run after \
finance approves the claim.";

/// Write the fixture corpus into `dir`
pub fn write_corpus(dir: &std::path::Path) {
    std::fs::write(dir.join("leave_policy.txt"), LEAVE_POLICY).unwrap();
    std::fs::write(dir.join("expense_policy.txt"), EXPENSE_POLICY).unwrap();
}

/// Install a subscriber for test log output; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::index::cosine_similarity;

    #[test]
    fn test_embedder_is_deterministic() {
        let embedder = MockEmbedder::new();
        let a = tokio_test::block_on(embedder.embed("annual leave payout")).unwrap();
        let b = tokio_test::block_on(embedder.embed("annual leave payout")).unwrap();
        assert_eq!(a, b);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_disjoint_vocabulary_scores_zero() {
        let embedder = MockEmbedder::new();
        let policy = embedder.embed(LEAVE_POLICY).await.unwrap();
        let unrelated = embedder.embed("What is the capital of Japan?").await.unwrap();
        assert_eq!(cosine_similarity(&policy, &unrelated), 0.0);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_high() {
        let embedder = MockEmbedder::new();
        let policy = embedder.embed(LEAVE_POLICY).await.unwrap();
        let related = embedder.embed("Is annual leave payout allowed on termination?").await.unwrap();
        assert!(cosine_similarity(&policy, &related) > 0.25);
    }

    #[tokio::test]
    async fn test_scripted_llm_modes() {
        let answering = MockLlm::answering("Twenty days [C1].");
        assert_eq!(answering.generate("prompt").await.unwrap(), "Twenty days [C1].");
        assert_eq!(answering.calls(), 1);
        assert_eq!(answering.prompts(), vec!["prompt".to_string()]);

        let refusing = MockLlm::refusing();
        assert_eq!(refusing.generate("prompt").await.unwrap(), REFUSAL_TEXT);

        let failing = MockLlm::failing();
        assert!(failing.generate("prompt").await.unwrap_err().is_provider());
    }
}
