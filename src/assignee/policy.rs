use regex::Regex;

use crate::config::ReturnToCreatorConfig;

/// Sends "return"-style actions back to the record creator.
///
/// Matches action names by keyword, so it is a heuristic: it can be turned
/// off or given different keywords without touching the resolver.
#[derive(Debug, Clone)]
pub struct ReturnToCreatorPolicy {
    pattern: Option<Regex>,
}

impl ReturnToCreatorPolicy {
    pub fn new(enabled: bool, keywords: &[String]) -> Self {
        let alternatives: Vec<String> = keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(k))
            .collect();

        let pattern = if enabled && !alternatives.is_empty() {
            Regex::new(&alternatives.join("|")).ok()
        } else {
            None
        };
        Self { pattern }
    }

    pub fn disabled() -> Self {
        Self { pattern: None }
    }

    pub fn from_config(config: &ReturnToCreatorConfig) -> Self {
        Self::new(config.enabled, &config.keywords)
    }

    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn applies_to(&self, action: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(action))
    }

    pub fn next_assignee(&self, action: &str, creator: Option<&str>) -> Option<String> {
        if !self.applies_to(action) {
            return None;
        }
        creator.filter(|c| !c.is_empty()).map(str::to_string)
    }
}

impl Default for ReturnToCreatorPolicy {
    fn default() -> Self {
        Self::from_config(&ReturnToCreatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keywords_match_return_actions() {
        let policy = ReturnToCreatorPolicy::default();
        assert!(policy.applies_to("差し戻す"));
        assert!(policy.applies_to("申請者に戻す"));
        assert!(!policy.applies_to("承認"));
        assert_eq!(policy.next_assignee("差し戻す", Some("author")), Some("author".to_string()));
        assert_eq!(policy.next_assignee("差し戻す", None), None);
    }

    #[test]
    fn test_disabled_policy_never_applies() {
        let policy = ReturnToCreatorPolicy::disabled();
        assert!(!policy.is_enabled());
        assert_eq!(policy.next_assignee("差し戻す", Some("author")), None);

        let no_keywords = ReturnToCreatorPolicy::new(true, &[]);
        assert!(!no_keywords.is_enabled());
    }

    #[test]
    fn test_keywords_are_literal() {
        let policy = ReturnToCreatorPolicy::new(true, &["reject (final)".to_string()]);
        assert!(policy.applies_to("reject (final) now"));
        assert!(!policy.applies_to("reject final"));
    }
}
