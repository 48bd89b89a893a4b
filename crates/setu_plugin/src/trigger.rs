//! Keyword matching on inbound text.
//!
//! Plain substring checks, no tokenization. The first matching rule wins.

use setu_core::{RequestMode, TriggerProfile};

pub const ADULT_KEYWORDS: &[&str] = &["色色", "涩涩"];
pub const FILTERED_KEYWORDS: &[&str] = &["想要", "我要"];
/// Forces filtered mode under the qualifier profile.
pub const SAFE_QUALIFIER: &str = "健康";

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Pick a request mode for already case-folded `text`, or `None` to ignore it.
pub fn detect(profile: TriggerProfile, text: &str) -> Option<RequestMode> {
    match profile {
        TriggerProfile::Classic => {
            if contains_any(text, ADULT_KEYWORDS) {
                Some(RequestMode::Adult)
            } else if contains_any(text, FILTERED_KEYWORDS) {
                Some(RequestMode::Filtered)
            } else {
                None
            }
        }
        TriggerProfile::Qualifier => {
            let mode = detect(TriggerProfile::Classic, text)?;
            if text.contains(SAFE_QUALIFIER) {
                Some(RequestMode::Filtered)
            } else {
                Some(mode)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic() {
        assert_eq!(detect(TriggerProfile::Classic, "来点色色"), Some(RequestMode::Adult));
        assert_eq!(detect(TriggerProfile::Classic, "涩涩!"), Some(RequestMode::Adult));
        assert_eq!(detect(TriggerProfile::Classic, "我要看图"), Some(RequestMode::Filtered));
        assert_eq!(detect(TriggerProfile::Classic, "想要"), Some(RequestMode::Filtered));
        assert_eq!(detect(TriggerProfile::Classic, "今天天气不错"), None);
        assert_eq!(detect(TriggerProfile::Classic, ""), None);
    }

    #[test]
    fn test_classic_adult_wins_overlap() {
        assert_eq!(detect(TriggerProfile::Classic, "我要色色"), Some(RequestMode::Adult));
        // The qualifier means nothing to the classic rules.
        assert_eq!(detect(TriggerProfile::Classic, "健康的色色"), Some(RequestMode::Adult));
    }

    #[test]
    fn test_qualifier() {
        assert_eq!(detect(TriggerProfile::Qualifier, "色色"), Some(RequestMode::Adult));
        // Filtered keywords stay filtered without the qualifier.
        assert_eq!(detect(TriggerProfile::Qualifier, "我要"), Some(RequestMode::Filtered));
        assert_eq!(detect(TriggerProfile::Qualifier, "想要色色"), Some(RequestMode::Adult));
        assert_eq!(detect(TriggerProfile::Qualifier, "健康的色色"), Some(RequestMode::Filtered));
        assert_eq!(detect(TriggerProfile::Qualifier, "我要健康"), Some(RequestMode::Filtered));
        // Qualifier alone is not a trigger.
        assert_eq!(detect(TriggerProfile::Qualifier, "健康第一"), None);
    }
}
