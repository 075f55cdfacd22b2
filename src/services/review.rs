//! Bounded propose/review loop
//!
//! Plain iteration over the extraction seam: propose, review, loop rejection
//! feedback back into the next proposal. The round cap guarantees termination
//! against a collaborator that never approves — the last candidate set is
//! taken as final in that case.

use crate::domain::LineItem;
use crate::services::ai_client::{ExtractionBackend, ReviewOutcome};

pub async fn run_extraction<B: ExtractionBackend>(
    backend: &B,
    document_text: &str,
    max_rounds: u32,
) -> Vec<LineItem> {
    let max_rounds = max_rounds.max(1);
    let mut feedback: Option<String> = None;
    let mut last_candidate: Vec<LineItem> = Vec::new();

    for round in 1..=max_rounds {
        let candidate = backend
            .propose(document_text, round, feedback.as_deref())
            .await;

        match backend.review(&candidate).await {
            ReviewOutcome::Approved(finalized) => {
                tracing::debug!(round, items = finalized.len(), "Review approved");
                return finalized;
            }
            ReviewOutcome::Rejected(reason) => {
                tracing::debug!(round, reason = %reason, "Review rejected, looping feedback");
                feedback = Some(reason);
                last_candidate = candidate;
            }
        }
    }

    tracing::warn!(
        rounds = max_rounds,
        "Reviewer never approved; taking last candidate set"
    );
    last_candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn item(description: &str) -> LineItem {
        LineItem {
            item_code: None,
            description: description.to_string(),
            quantity: 1.0,
            unit: "ea".to_string(),
        }
    }

    /// Rejects the first `rejections` rounds, then approves.
    struct CountingBackend {
        rejections: u32,
        proposals: AtomicU32,
    }

    impl CountingBackend {
        fn new(rejections: u32) -> Self {
            Self {
                rejections,
                proposals: AtomicU32::new(0),
            }
        }
    }

    impl ExtractionBackend for CountingBackend {
        async fn propose(
            &self,
            _document_text: &str,
            round: u32,
            feedback: Option<&str>,
        ) -> Vec<LineItem> {
            self.proposals.fetch_add(1, Ordering::SeqCst);
            if round > 1 {
                assert!(feedback.is_some(), "rejection feedback must loop back");
            }
            vec![item(&format!("candidate round {}", round))]
        }

        async fn review(&self, candidate: &[LineItem]) -> ReviewOutcome {
            if self.proposals.load(Ordering::SeqCst) <= self.rejections {
                ReviewOutcome::Rejected("tighten the quantities".to_string())
            } else {
                ReviewOutcome::Approved(candidate.to_vec())
            }
        }
    }

    #[tokio::test]
    async fn approves_on_first_round() {
        let backend = CountingBackend::new(0);
        let items = run_extraction(&backend, "text", 2).await;
        assert_eq!(items[0].description, "candidate round 1");
        assert_eq!(backend.proposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn feedback_loops_into_second_round() {
        let backend = CountingBackend::new(1);
        let items = run_extraction(&backend, "text", 2).await;
        assert_eq!(items[0].description, "candidate round 2");
        assert_eq!(backend.proposals.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_approving_reviewer_terminates_with_last_candidate() {
        let backend = CountingBackend::new(u32::MAX);
        let items = run_extraction(&backend, "text", 2).await;
        // Exactly max_rounds proposals, then the last candidate wins
        assert_eq!(backend.proposals.load(Ordering::SeqCst), 2);
        assert_eq!(items[0].description, "candidate round 2");
    }

    #[tokio::test]
    async fn round_cap_has_a_floor_of_one() {
        let backend = CountingBackend::new(0);
        let items = run_extraction(&backend, "text", 0).await;
        assert_eq!(items.len(), 1);
        assert_eq!(backend.proposals.load(Ordering::SeqCst), 1);
    }
}
