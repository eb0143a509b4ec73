//! Plain-text rendering of scan results for chat delivery.

use crate::{FetchError, ScanOutcome, ScanReport, ScanResult, Verdict};

/// Lead message sent before a scheduled sweep's per-account results.
pub const SWEEP_HEADER: &str = "🔁 Automatic check of watched accounts...";

const NOT_FOUND_LINE: &str =
    "❌ The site reports that this account does not exist or could not be tested.";

impl ScanReport {
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Result for @{}:", self.handle),
            format!("URL: {}", self.url),
            String::new(),
        ];

        match &self.outcome {
            ScanOutcome::Failed(err) => lines.push(render_failure(err)),
            ScanOutcome::Checked(result) => lines.extend(render_verdicts(result)),
        }

        lines.join("\n")
    }
}

fn render_failure(err: &FetchError) -> String {
    match err {
        FetchError::Status(code) => format!("❌ Could not reach the site (HTTP {code})."),
        FetchError::Timeout => "❌ Timed out contacting the site.".to_string(),
        FetchError::Transport(cause) => format!("❌ Network error: {cause}"),
    }
}

fn render_verdicts(result: &ScanResult) -> Vec<String> {
    if !result.exists {
        return vec![NOT_FOUND_LINE.to_string()];
    }

    result
        .signals
        .iter()
        .map(|(signal, verdict)| match verdict {
            Verdict::Ok => format!("✅ {}: OK", signal.label()),
            Verdict::Positive => format!("❌ {}: POSITIVE", signal.label()),
            Verdict::Indeterminate => format!("❓ {}: indeterminate", signal.label()),
        })
        .collect()
}
