//! Moderation scenarios run through the default analyzer panel.
//!
//! Each scenario is realistic content with a known expected outcome from
//! the four built-in frameworks.

use ethiq_core::{Decision, Ethiq, EthiqConfig, ModerationContext};

fn ethiq() -> Ethiq {
    Ethiq::new(EthiqConfig::default()).unwrap()
}

// =============================================================================
// Clearly harmful content
// =============================================================================

#[tokio::test]
async fn test_incitement_is_removed_unanimously() {
    let ethiq = ethiq();
    let content = "Incitement to violence: spread hate speech, harassment and threats. \
                   This degrading privacy violation uses ethnic slurs, racial stereotypes \
                   and xenophobia.";
    let context = ModerationContext::new().with_audience_size(50_000);

    let outcome = ethiq.moderate(content, context).await;

    assert_eq!(outcome.decision, Decision::Remove);
    assert!((outcome.confidence - 0.95).abs() < 1e-9);
    assert!(outcome
        .per_analyzer
        .values()
        .all(|a| a.decision == Decision::Remove));
    assert!(outcome
        .evidence
        .contains(&"Unanimous agreement among all analyzers".to_string()));
    assert!(outcome
        .evidence
        .contains(&"free_speech: Speech restriction: incitement_to_violence".to_string()));
}

#[tokio::test]
async fn test_harm_without_consensus_goes_to_review() {
    let ethiq = ethiq();
    let content = "This post spreads violence, harassment, threats and hate speech. \
                   It is degrading and a privacy violation.";
    let context = ModerationContext::new().with_audience_size(50_000);

    let record = ethiq.deliberate(content, context).await;

    assert_eq!(record.verdicts["utilitarian"].decision(), Decision::Remove);
    assert_eq!(record.verdicts["deontological"].decision(), Decision::Remove);
    assert_eq!(record.verdicts["cultural"].decision(), Decision::Allow);
    assert_eq!(record.verdicts["free_speech"].decision(), Decision::FlagForReview);

    // REMOVE leads but conflict damping pushes it under the threshold.
    assert_eq!(record.final_verdict.decision(), Decision::FlagForReview);
    assert!(record.final_verdict.confidence().value() < 0.6);
    assert!(record.examination.has_conflict());
}

// =============================================================================
// Clearly valuable content
// =============================================================================

#[tokio::test]
async fn test_educational_dialogue_is_allowed() {
    let ethiq = ethiq();
    let content = "Cultural education and diversity celebration through cross cultural \
                   dialogue: an academic debate with scientific discussion, in the public \
                   interest.";
    let context = ModerationContext::new()
        .with_educational_value(true)
        .with_public_interest(true);

    let outcome = ethiq.moderate(content, context).await;

    assert_eq!(outcome.decision, Decision::Allow);
    assert!((outcome.confidence - 0.95).abs() < 1e-9);
    assert_eq!(outcome.per_analyzer["utilitarian"].confidence, 0.9);
    assert_eq!(outcome.per_analyzer["cultural"].confidence, 0.8);
    assert_eq!(outcome.per_analyzer["free_speech"].confidence, 0.9);
    assert!(outcome.reasoning.starts_with("Final decision: ALLOW"));
}

// =============================================================================
// Ambiguous content
// =============================================================================

#[tokio::test]
async fn test_deceptive_content_is_flagged() {
    let ethiq = ethiq();
    let content = "BREAKING: this fake cure is a misleading hoax, share before it is deleted";

    let record = ethiq.deliberate(content, ModerationContext::new()).await;

    assert_eq!(record.verdicts["deontological"].decision(), Decision::FlagForReview);
    assert_eq!(record.final_verdict.decision(), Decision::FlagForReview);
    assert_eq!(record.scores.leader(), Decision::FlagForReview);
    assert!(record.scores.flag_for_review > record.scores.allow);
}

#[tokio::test]
async fn test_neutral_content_is_not_removed() {
    let ethiq = ethiq();
    let outcome = ethiq
        .moderate("Meeting moved to Thursday at noon.", ModerationContext::new())
        .await;

    assert_ne!(outcome.decision, Decision::Remove);
    assert_eq!(outcome.per_analyzer.len(), 4);
    assert!(outcome.confidence >= 0.1 && outcome.confidence <= 0.95);
}

// =============================================================================
// Context sensitivity
// =============================================================================

#[tokio::test]
async fn test_audience_amplifies_harm() {
    let ethiq = ethiq();
    let content = "a thread with misinformation and bullying";

    let small = ethiq
        .deliberate(content, ModerationContext::new().with_audience_size(100))
        .await;
    let large = ethiq
        .deliberate(
            content,
            ModerationContext::new()
                .with_audience_size(1_000_000)
                .with_vulnerable_audience(true),
        )
        .await;

    let small_u = &small.verdicts["utilitarian"];
    let large_u = &large.verdicts["utilitarian"];
    assert_eq!(small_u.decision(), Decision::Remove);
    assert_eq!(large_u.decision(), Decision::Remove);
    assert!(large_u.confidence().value() > small_u.confidence().value());
}

#[tokio::test]
async fn test_history_and_report_track_scenarios() {
    let ethiq = ethiq();
    ethiq.moderate("first", ModerationContext::new()).await;
    ethiq.moderate("second", ModerationContext::new()).await;
    ethiq.flush().await.unwrap();

    let report = ethiq.report(ethiq_core::ReportPeriod::All);
    assert_eq!(report.total_deliberations, 2);
    assert_eq!(report.analyzer_performance.len(), 4);
    assert_eq!(ethiq.history().len(), 2);
}
