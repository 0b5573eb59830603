use sigsim_core::DetectionRule;
use sigsim_rules::parse_rule;

use super::*;
use crate::config::WeightPreset;

fn rule(id: &str, yaml: &str) -> DetectionRule {
    parse_rule(yaml, id).unwrap()
}

fn ranker(threshold: f64) -> CompositeRanker {
    CompositeRanker::new(ScoringConfig::default().with_threshold(threshold)).unwrap()
}

const POWERSHELL_DOWNLOAD: &str = r#"
title: PowerShell DownloadString
level: high
tags: [attack.execution, attack.t1059.001]
logsource:
  category: process_creation
  product: windows
detection:
  selection:
    Image|endswith: '\powershell.exe'
    CommandLine|contains: DownloadString
  condition: selection
"#;

const POWERSHELL_DOWNLOAD_FILE: &str = r#"
title: PowerShell DownloadFile
level: medium
tags: [attack.execution, attack.t1105]
logsource:
  category: process_creation
  product: windows
detection:
  selection:
    Image|endswith: '\powershell.exe'
    CommandLine|contains: DownloadFile
    EventID: 1
  condition: selection
"#;

#[test]
fn self_comparison_is_perfect() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let results = ranker(0.5).rank(&target, std::slice::from_ref(&target));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].field_similarity, 1.0);
    assert_eq!(results[0].value_similarity, 1.0);
    assert_eq!(results[0].weighted_similarity, 1.0);
}

#[test]
fn related_rule_scores_partial_match() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let candidate = rule("c", POWERSHELL_DOWNLOAD_FILE);
    let results = ranker(0.0).rank(&target, &[candidate]);

    let r = &results[0];
    // {image, commandline} vs {image, commandline, eventid}
    assert!((r.field_similarity - 2.0 / 3.0).abs() < 1e-9);
    assert!((r.value_similarity - (1.0 + 18.0 / 26.0) / 2.0).abs() < 1e-9);
    let expected = r.value_similarity * 0.8 + r.field_similarity * 0.2;
    assert!((r.weighted_similarity - expected).abs() < 1e-12);
    assert_eq!(r.content_similarity, None);
}

#[test]
fn details_describe_the_difference() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let candidate = rule("c", POWERSHELL_DOWNLOAD_FILE);
    let details = &ranker(0.0).rank(&target, &[candidate])[0].details;

    assert_eq!(details.common_keys, vec!["condition", "selection"]);
    assert!(details.unique_to_target.is_empty());
    assert!(details.logsource_match);
    assert!(!details.level_match);
    assert_eq!(details.tag_overlap, vec!["attack.execution"]);
    assert_eq!(details.value_matches.len(), 2);
    assert_eq!(details.value_matches[0].candidate_value, "powershell");
    assert_eq!(details.value_matches[1].target_value, "downloadstring");
    assert_eq!(details.value_matches[1].candidate_value, "downloadfile");
}

#[test]
fn threshold_is_inclusive() {
    // identical values, disjoint fields: 1.0 * 0.8 + 0.0 * 0.2
    let target = rule("t", "detection:\n  selection:\n    Image: whoami.exe\n");
    let candidate = rule("c", "detection:\n  selection:\n    ParentImage: whoami.exe\n");

    let at = ranker(0.8).rank(&target, std::slice::from_ref(&candidate));
    assert_eq!(at.len(), 1);
    assert_eq!(at[0].weighted_similarity, 0.8);

    let just_above = f64::from_bits(0.8f64.to_bits() + 1);
    assert!(ranker(just_above).rank(&target, &[candidate]).is_empty());
}

#[test]
fn ties_keep_corpus_order_and_top_n_truncates() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let candidates: Vec<DetectionRule> = ["b", "a", "c"]
        .iter()
        .map(|id| rule(id, POWERSHELL_DOWNLOAD))
        .chain(std::iter::once(rule("partial", POWERSHELL_DOWNLOAD_FILE)))
        .collect();

    let ranker = CompositeRanker::new(ScoringConfig::default().with_top_n(3)).unwrap();
    let ids: Vec<String> = ranker
        .rank(&target, &candidates)
        .into_iter()
        .map(|r| r.candidate_id)
        .collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn results_are_sorted_descending() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let candidates = vec![
        rule("partial", POWERSHELL_DOWNLOAD_FILE),
        rule("same", POWERSHELL_DOWNLOAD),
    ];
    let results = ranker(0.0).rank(&target, &candidates);
    assert_eq!(results[0].candidate_id, "same");
    assert!(results
        .windows(2)
        .all(|w| w[0].weighted_similarity >= w[1].weighted_similarity));
}

#[test]
fn empty_detection_never_matches() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let empty = rule("empty", "title: No detection\n");

    let results = ranker(0.0).rank(&target, &[empty.clone()]);
    assert_eq!(results[0].weighted_similarity, 0.0);
    assert!(ranker(0.5).rank(&target, &[empty.clone()]).is_empty());
    assert!(ranker(0.01)
        .rank(&empty, std::slice::from_ref(&empty))
        .is_empty());
}

#[test]
fn content_preset_adds_content_score() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let ranker = CompositeRanker::new(
        ScoringConfig::from_preset(WeightPreset::ContentFieldValue).with_threshold(0.0),
    )
    .unwrap();

    let same = &ranker.rank(&target, std::slice::from_ref(&target))[0];
    assert_eq!(same.content_similarity, Some(1.0));
    assert!((same.weighted_similarity - 1.0).abs() < 1e-9);

    let other = &ranker.rank(&target, &[rule("c", POWERSHELL_DOWNLOAD_FILE)])[0];
    let content = other.content_similarity.unwrap();
    assert!(content > 0.5 && content < 1.0);
}

#[test]
fn invalid_config_fails_fast() {
    assert!(CompositeRanker::new(ScoringConfig::default().with_threshold(1.2)).is_err());
}

#[test]
fn results_serialize_without_empty_optionals() {
    let target = rule("t", POWERSHELL_DOWNLOAD);
    let results = ranker(0.5).rank(&target, std::slice::from_ref(&target));
    let json = serde_json::to_value(&results[0]).unwrap();

    assert_eq!(json["candidate_id"], "t");
    assert!(json.get("summary").is_none());
    assert!(json.get("content_similarity").is_none());
    assert_eq!(json["details"]["logsource_match"], true);
}
