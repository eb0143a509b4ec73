use std::fmt;

use crate::FetchError;

/// A chat/workspace on whose behalf accounts are watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TenantId(pub i64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized account identifier: lowercase, no leading `@`.
///
/// The only way to build one is through [`AccountHandle::normalize`], so two
/// handles differing only by case or sigil always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountHandle(String);

impl AccountHandle {
    pub fn normalize(raw: &str) -> Self {
        let stripped = raw
            .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
            .trim_end();
        Self(stripped.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification outcome for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Positive,
    Indeterminate,
}

/// The four shadowban indicators reported by the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    SearchSuggestionBan,
    SearchBan,
    GhostBan,
    ReplyDeboosting,
}

impl Signal {
    /// Report order.
    pub const ALL: [Signal; 4] = [
        Signal::SearchSuggestionBan,
        Signal::SearchBan,
        Signal::GhostBan,
        Signal::ReplyDeboosting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Signal::SearchSuggestionBan => "Search Suggestion Ban",
            Signal::SearchBan => "Search Ban",
            Signal::GhostBan => "Ghost Ban",
            Signal::ReplyDeboosting => "Reply Deboosting",
        }
    }

    /// Lowercased phrase the page uses when the signal is present.
    pub fn positive_phrase(&self) -> &'static str {
        match self {
            Signal::SearchSuggestionBan => "search suggestion ban",
            Signal::SearchBan => "search ban",
            Signal::GhostBan => "ghost ban",
            Signal::ReplyDeboosting => "reply deboosting",
        }
    }

    /// Lowercased phrase the page uses when the signal is clear.
    pub fn negative_phrase(&self) -> &'static str {
        match self {
            Signal::SearchSuggestionBan => "no search suggestion ban",
            Signal::SearchBan => "no search ban",
            Signal::GhostBan => "no ghost ban",
            Signal::ReplyDeboosting => "no reply deboosting",
        }
    }
}

/// Verdicts for one account, produced fresh by every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub handle: AccountHandle,
    pub exists: bool,
    pub signals: Vec<(Signal, Verdict)>,
}

impl ScanResult {
    /// The page did not carry the existence marker.
    pub fn not_found(handle: AccountHandle) -> Self {
        Self {
            handle,
            exists: false,
            signals: Vec::new(),
        }
    }

    pub fn verdict(&self, signal: Signal) -> Option<Verdict> {
        self.signals
            .iter()
            .find(|(s, _)| *s == signal)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Checked(ScanResult),
    Failed(FetchError),
}

impl ScanOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScanOutcome::Failed(_))
    }
}

/// One account's scan together with what was checked, so the rendered
/// message can always name the handle and the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub handle: AccountHandle,
    pub url: String,
    pub outcome: ScanOutcome,
}
