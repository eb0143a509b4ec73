//! Turns a fetched status page into per-signal verdicts.
//!
//! Matching is case-insensitive substring search. For every signal the
//! negative phrase ("no ghost ban") is tested before the positive one
//! ("ghost ban"), because the negative phrase always contains the positive
//! one.

use crate::{AccountHandle, ScanResult, Signal, Verdict};

/// Marker the status page prints once it has resolved the account.
pub const EXISTENCE_MARKER: &str = "exists.";

pub fn classify(handle: &AccountHandle, content: &str) -> ScanResult {
    let content = content.to_lowercase();

    if !content.contains(EXISTENCE_MARKER) {
        return ScanResult::not_found(handle.clone());
    }

    let signals = Signal::ALL
        .iter()
        .map(|signal| (*signal, detect(&content, *signal)))
        .collect();

    ScanResult {
        handle: handle.clone(),
        exists: true,
        signals,
    }
}

/// `content` must already be lowercased.
fn detect(content: &str, signal: Signal) -> Verdict {
    if content.contains(signal.negative_phrase()) {
        Verdict::Ok
    } else if content.contains(signal.positive_phrase()) {
        Verdict::Positive
    } else {
        Verdict::Indeterminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> AccountHandle {
        AccountHandle::normalize("@Someone")
    }

    #[test]
    fn test_missing_marker_yields_no_signals() {
        let result = classify(&handle(), "Search Ban. Ghost Ban. No Reply Deboosting.");
        assert!(!result.exists);
        assert!(result.signals.is_empty());
        assert_eq!(result.handle.as_str(), "someone");
    }

    #[test]
    fn test_empty_page() {
        let result = classify(&handle(), "");
        assert!(!result.exists);
        assert!(result.signals.is_empty());
    }

    #[test]
    fn test_mixed_page() {
        let page = "...exists. no search ban... ghost ban detected... no reply deboosting...";
        let result = classify(&handle(), page);

        assert!(result.exists);
        assert_eq!(result.verdict(Signal::SearchBan), Some(Verdict::Ok));
        assert_eq!(result.verdict(Signal::GhostBan), Some(Verdict::Positive));
        assert_eq!(
            result.verdict(Signal::SearchSuggestionBan),
            Some(Verdict::Indeterminate)
        );
        assert_eq!(result.verdict(Signal::ReplyDeboosting), Some(Verdict::Ok));
    }

    #[test]
    fn test_precedence() {
        let only_negative = classify(&handle(), "exists. No Ghost Ban");
        assert_eq!(only_negative.verdict(Signal::GhostBan), Some(Verdict::Ok));

        let only_positive = classify(&handle(), "exists. Ghost Ban");
        assert_eq!(only_positive.verdict(Signal::GhostBan), Some(Verdict::Positive));

        let neither = classify(&handle(), "exists.");
        assert_eq!(neither.verdict(Signal::GhostBan), Some(Verdict::Indeterminate));

        let both = classify(&handle(), "exists. Ghost Ban ... No Ghost Ban");
        assert_eq!(both.verdict(Signal::GhostBan), Some(Verdict::Ok));
    }

    #[test]
    fn test_case_insensitive() {
        let result = classify(&handle(), "@someone EXISTS. NO SEARCH SUGGESTION BAN");
        assert!(result.exists);
        assert_eq!(
            result.verdict(Signal::SearchSuggestionBan),
            Some(Verdict::Ok)
        );
    }

    #[test]
    fn test_signal_order_is_fixed() {
        let result = classify(
            &handle(),
            "exists. reply deboosting ghost ban search ban search suggestion ban",
        );
        let order: Vec<Signal> = result.signals.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, Signal::ALL.to_vec());
        assert!(result.signals.iter().all(|(_, v)| *v == Verdict::Positive));
    }
}
