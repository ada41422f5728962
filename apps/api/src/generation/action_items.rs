//! Next-step suggestions for a job application.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::model_gateway::{prompts, ModelGateway};

const ACTION_ITEMS_MAX_TOKENS: u32 = 400;

pub const CANNED_ACTION_ITEMS: [&str; 4] = [
    "[high] Review job requirements - Carefully review the job description and match your skills. (30 minutes)",
    "[medium] Research the company - Learn about company culture and recent projects. (45 minutes)",
    "[medium] Prepare for interviews - Research common questions for this role. (60 minutes)",
    "[low] Follow up in 1 week - Send a polite follow-up email after one week. (15 minutes)",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ActionItems {
    pub items: Vec<String>,
    /// True when the items came from the model rather than the canned list.
    pub generated: bool,
}

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[(high|medium|low)\]\s+(.+?)\s+-\s+(.+?)\s+\((\d+)\s+minutes?\)$")
            .expect("valid action item regex")
    })
}

/// Drops a leading bullet (`-`, `*`, `•`) or list number (`3.`).
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    match after_digits.strip_prefix('.') {
        Some(rest) if after_digits.len() < line.len() => rest.trim(),
        _ => line.trim_end(),
    }
}

/// Keeps the lines in `[priority] Title - Description (N minutes)` form.
pub fn parse_action_items(text: &str) -> Vec<String> {
    let pattern = item_pattern();
    text.lines()
        .map(strip_list_marker)
        .filter(|line| pattern.is_match(line))
        .map(str::to_string)
        .collect()
}

fn canned() -> ActionItems {
    ActionItems {
        items: CANNED_ACTION_ITEMS.iter().map(|s| s.to_string()).collect(),
        generated: false,
    }
}

/// Asks the model when it is available; any failure or unparseable output
/// falls back to the canned list.
pub async fn suggest_action_items(
    gateway: &ModelGateway,
    job_description: Option<&str>,
    company_info: Option<&str>,
) -> ActionItems {
    if !gateway.is_available().await {
        return canned();
    }

    let prompt = prompts::action_items_prompt(job_description, company_info);
    match gateway.complete(&prompt, ACTION_ITEMS_MAX_TOKENS).await {
        Ok(text) => {
            let items = parse_action_items(&text);
            if items.is_empty() {
                warn!("Model returned no parseable action items");
                canned()
            } else {
                ActionItems {
                    items,
                    generated: true,
                }
            }
        }
        Err(e) => {
            warn!("Action item generation failed: {e}");
            canned()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model_gateway::testing::{ready_gateway, unconfigured_gateway, StubBackend};

    #[test]
    fn test_canned_items_match_the_line_format() {
        for item in CANNED_ACTION_ITEMS {
            assert!(item_pattern().is_match(item), "{item}");
        }
    }

    #[test]
    fn test_parse_keeps_only_well_formed_lines() {
        let text = "Here are your next steps:\n\
                    1. not an item\n\
                    [high] Tailor resume - Match keywords to the posting. (20 minutes)\n\
                    - [low] Connect on LinkedIn - Reach out to the hiring manager. (1 minute)\n\
                    [urgent] Panic - Do everything at once. (5 minutes)\n\
                    [medium] Missing duration - No time given.";
        assert_eq!(
            parse_action_items(text),
            vec![
                "[high] Tailor resume - Match keywords to the posting. (20 minutes)",
                "[low] Connect on LinkedIn - Reach out to the hiring manager. (1 minute)",
            ]
        );
    }

    #[test]
    fn test_parse_strips_list_numbers() {
        let text = "1. [high] Update portfolio - Add the payments project. (40 minutes)\n\
                    12.[medium] Mock interview - Run one with a friend. (60 minutes)\n\
                    2024 [low] Not numbered - Year prefix stays. (5 minutes)";
        assert_eq!(
            parse_action_items(text),
            vec![
                "[high] Update portfolio - Add the payments project. (40 minutes)",
                "[medium] Mock interview - Run one with a friend. (60 minutes)",
            ]
        );
    }

    #[tokio::test]
    async fn test_unavailable_model_returns_canned_items() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = unconfigured_gateway(dir.path()).await;

        let result = suggest_action_items(&gateway, Some("Backend role"), None).await;
        assert!(!result.generated);
        assert_eq!(result.items.len(), 4);
    }

    #[tokio::test]
    async fn test_model_items_are_used_when_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(StubBackend::replying(
            "[high] Practice system design - Review distributed caching. (90 minutes)",
        ));
        let gateway = ready_gateway(dir.path(), backend).await;

        let result = suggest_action_items(&gateway, None, None).await;
        assert!(result.generated);
        assert_eq!(
            result.items,
            vec!["[high] Practice system design - Review distributed caching. (90 minutes)"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_model_output_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let gateway =
            ready_gateway(dir.path(), Arc::new(StubBackend::replying("Good luck!"))).await;

        let result = suggest_action_items(&gateway, None, None).await;
        assert!(!result.generated);
        assert_eq!(result.items[0], CANNED_ACTION_ITEMS[0]);
    }
}
