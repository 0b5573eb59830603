use sigsim_core::DetectionRule;

/// Render a rule's identity and detection block for the prompt.
fn describe(label: &str, rule: &DetectionRule) -> String {
    let detection = serde_yaml::to_string(&rule.detection)
        .unwrap_or_else(|e| format!("<unrenderable detection: {e}>"));
    let level = rule.level.as_deref().unwrap_or("unspecified");
    format!(
        "## {label}\nID: {}\nTitle: {}\nDescription: {}\nLevel: {level}\nDetection:\n{detection}\n",
        rule.id, rule.title, rule.description,
    )
}

/// Prompt asking for a short comparison of two detection rules.
pub fn comparison_prompt(target: &DetectionRule, candidate: &DetectionRule) -> String {
    format!(
        "You are a detection engineer reviewing Sigma rules for overlap.\n\n\
         {}\n{}\n\
         In at most four sentences: do both rules detect the same behaviour, \
         on the same log source, with overlapping indicators? Name the main \
         difference and say whether one rule makes the other redundant.",
        describe("New rule", target),
        describe("Existing rule", candidate),
    )
}

#[cfg(test)]
mod tests {
    use sigsim_core::{DetectionRule, Node};

    use super::*;

    #[test]
    fn prompt_names_both_rules() {
        let target = DetectionRule::new("t-1", "Whoami", Node::Scalar("x".into())).with_level("low");
        let candidate = DetectionRule::new("c-2", "Whoami Alt", Node::default());
        let prompt = comparison_prompt(&target, &candidate);

        assert!(prompt.contains("ID: t-1"));
        assert!(prompt.contains("Title: Whoami Alt"));
        assert!(prompt.contains("Level: low"));
        assert!(prompt.contains("Level: unspecified"));
    }
}
