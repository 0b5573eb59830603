use std::time::Duration;

use sigsim_core::{CorpusError, CorpusRecord, DetectionRule, MalformedRule, RuleCorpus};
use sigsim_rules::{parse_rule, MemoryCorpus};

use super::*;
use crate::StepDown;

fn rule(id: &str, yaml: &str) -> DetectionRule {
    parse_rule(yaml, id).unwrap()
}

fn process_rule(id: &str, image: &str, cmdline: &str) -> DetectionRule {
    rule(
        id,
        &format!(
            "detection:\n  selection:\n    Image|endswith: '{image}'\n    CommandLine|contains: '{cmdline}'\n  condition: selection\n"
        ),
    )
}

fn target() -> DetectionRule {
    process_rule("target", "\\powershell.exe", "DownloadString")
}

/// Mix of exact copies, near misses and unrelated rules, in a fixed order.
fn corpus(n: usize) -> MemoryCorpus {
    let images = ["\\powershell.exe", "\\pwsh.exe", "\\cmd.exe", "\\rundll32.exe"];
    let cmdlines = ["DownloadString", "DownloadFile", "Invoke-WebRequest", "whoami"];
    let rules = (0..n)
        .map(|i| {
            process_rule(
                &format!("rule-{i:03}"),
                images[i % images.len()],
                cmdlines[(i / images.len()) % cmdlines.len()],
            )
        })
        .collect();
    MemoryCorpus::new(rules)
}

fn orchestrator(threshold: f64, top_n: usize, workers: usize) -> BatchOrchestrator {
    let config = ScoringConfig::default()
        .with_threshold(threshold)
        .with_top_n(top_n);
    BatchOrchestrator::new(config, workers).unwrap()
}

struct BrokenCorpus;

impl RuleCorpus for BrokenCorpus {
    fn rules(&self) -> Result<Vec<CorpusRecord>, CorpusError> {
        Err(CorpusError::Unavailable("connection refused".into()))
    }
}

#[test]
fn parallel_runs_are_identical() {
    let corpus = corpus(64);
    let batch = orchestrator(0.0, 64, 4);

    let first = batch
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap();
    let second = batch
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap();

    assert_eq!(first.results.len(), 64);
    assert_eq!(
        serde_json::to_string(&first.results).unwrap(),
        serde_json::to_string(&second.results).unwrap()
    );
}

#[test]
fn parallel_matches_sequential_ranking() {
    let corpus = corpus(40);
    let rules: Vec<DetectionRule> = corpus.rules().unwrap().into_iter().map(Result::unwrap).collect();
    let batch = orchestrator(0.3, 10, 3);

    let parallel = batch
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap()
        .results;
    let sequential = batch.ranker().rank(&target(), &rules);
    assert_eq!(parallel, sequential);
}

#[test]
fn exact_copies_rank_first_in_corpus_order() {
    let corpus = corpus(32);
    let outcome = orchestrator(0.5, 3, 2)
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap();

    // indices 0, 16 are powershell + DownloadString
    let ids: Vec<&str> = outcome.results.iter().map(|r| r.candidate_id.as_str()).collect();
    assert_eq!(&ids[..2], &["rule-000", "rule-016"]);
    assert_eq!(outcome.results[0].weighted_similarity, 1.0);
    assert!(outcome.report.matched >= 2);
    assert_eq!(outcome.report.scored, 32);
}

#[test]
fn malformed_records_are_dropped_not_fatal() {
    let mut corpus = corpus(4);
    corpus.push_malformed(MalformedRule::new("bad.yml", "mapping values are not allowed"));
    corpus.push(target());

    let outcome = orchestrator(0.5, 10, 2)
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap();

    assert_eq!(outcome.report.total, 6);
    assert_eq!(outcome.report.failed, 1);
    assert_eq!(outcome.report.scored, 5);
    assert!(outcome.results.iter().any(|r| r.candidate_id == "target"));
}

#[test]
fn corpus_failure_is_fatal() {
    let err = orchestrator(0.5, 10, 1)
        .compare_all(&target(), &BrokenCorpus, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::Corpus(CorpusError::Unavailable(_))));
}

#[test]
fn cancelled_batch_returns_no_results() {
    let corpus = corpus(16);
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = orchestrator(0.0, 10, 2)
        .compare_all(&target(), &corpus, &cancel)
        .unwrap();

    assert!(outcome.results.is_empty());
    assert!(outcome.report.cancelled);
    assert_eq!(outcome.report.skipped, 16);
    assert_eq!(outcome.report.scored, 0);
}

#[test]
fn expired_deadline_behaves_like_cancel() {
    let corpus = corpus(8);
    let outcome = orchestrator(0.0, 10, 2)
        .compare_all(&target(), &corpus, &CancelToken::with_timeout(Duration::ZERO))
        .unwrap();
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.report.skipped, 8);
}

#[test]
fn invalid_config_fails_before_scoring() {
    let config = ScoringConfig::default().with_top_n(0);
    assert!(matches!(
        BatchOrchestrator::new(config, 2),
        Err(BatchError::Config(ConfigError::TopN))
    ));
}

#[test]
fn find_first_returns_earliest_match_in_corpus_order() {
    let corpus = MemoryCorpus::new(vec![
        process_rule("unrelated", "\\rundll32.exe", "javascript:"),
        process_rule("partial", "\\powershell.exe", "DownloadFile"),
        target(),
    ]);
    let batch = orchestrator(0.5, 10, 2);

    let hit = batch
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap()
        .unwrap();
    assert_eq!(hit.candidate_id, "partial");

    let strict = orchestrator(1.0, 10, 2);
    let hit = strict
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap()
        .unwrap();
    assert_eq!(hit.candidate_id, "target");
}

#[test]
fn find_first_without_match_is_none() {
    let corpus = MemoryCorpus::new(vec![process_rule("other", "\\cmd.exe", "whoami")]);
    let found = orchestrator(0.9, 10, 1)
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn report_serializes() {
    let outcome = orchestrator(0.5, 10, 1)
        .compare_all(&target(), &corpus(4), &CancelToken::new())
        .unwrap();
    let json = serde_json::to_value(&outcome.report).unwrap();
    assert_eq!(json["total"], 4);
    assert_eq!(json["cancelled"], false);
    assert!(json["started_at"].is_string());
}

#[test]
fn cancel_mid_batch_keeps_collected_results() {
    let corpus = corpus(32);
    let cancel = CancelToken::new();
    // One worker runs tasks in corpus order; stop while scoring rule-010.
    let batch = orchestrator(0.0, 32, 1).with_hook(|candidate, cancel| {
        if candidate.id == "rule-010" {
            cancel.cancel();
        }
    });

    let outcome = batch.compare_all(&target(), &corpus, &cancel).unwrap();
    let report = &outcome.report;

    assert!(report.cancelled);
    assert_eq!(report.scored, 10);
    assert_eq!(report.skipped, 22);
    assert_eq!(report.scored + report.skipped + report.failed, report.total);
    assert_eq!(outcome.results.len(), 10);
    assert_eq!(outcome.results[0].candidate_id, "rule-000");
    assert!(outcome
        .results
        .iter()
        .all(|r| r.candidate_id.as_str() < "rule-010"));
    assert!(outcome
        .results
        .windows(2)
        .all(|w| w[0].weighted_similarity >= w[1].weighted_similarity));
}

#[test]
fn panicking_scorer_fails_only_its_candidate() {
    let corpus = corpus(8);
    let batch = orchestrator(0.0, 10, 2).with_hook(|candidate, _| {
        if candidate.id == "rule-003" {
            panic!("scorer blew up on {}", candidate.id);
        }
    });

    let outcome = batch
        .compare_all(&target(), &corpus, &CancelToken::new())
        .unwrap();

    assert_eq!(outcome.report.failed, 1);
    assert_eq!(outcome.report.scored, 7);
    assert!(!outcome.report.cancelled);
    assert!(outcome.results.iter().all(|r| r.candidate_id != "rule-003"));
    assert_eq!(outcome.results.len(), 7);
}

#[test]
fn find_first_steps_threshold_down_when_enabled() {
    let corpus = MemoryCorpus::new(vec![
        process_rule("other", "\\cmd.exe", "whoami"),
        process_rule("partial", "\\powershell.exe", "DownloadFile"),
    ]);
    let config = ScoringConfig::default().with_threshold(0.95);

    let plain = BatchOrchestrator::new(config.clone(), 1).unwrap();
    assert!(plain
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap()
        .is_none());

    let relaxed = BatchOrchestrator::new(
        config.with_step_down(StepDown { step: 0.1, floor: 0.5 }),
        1,
    )
    .unwrap();
    let hit = relaxed
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap()
        .unwrap();
    assert_eq!(hit.candidate_id, "partial");
    assert!(hit.weighted_similarity < 0.95);
    assert!(!hit.details.common_keys.is_empty());
}

#[test]
fn step_down_stops_at_floor() {
    // only the shared field names line up: weighted stays well under 0.5
    let corpus = MemoryCorpus::new(vec![process_rule("other", "\\cmd.exe", "whoami")]);
    let config = ScoringConfig::default()
        .with_threshold(0.9)
        .with_step_down(StepDown { step: 0.1, floor: 0.5 });
    let found = BatchOrchestrator::new(config, 1)
        .unwrap()
        .find_first(&target(), &corpus, &CancelToken::new())
        .unwrap();
    assert!(found.is_none());
}
