//! Backoff hints embedded in throttling messages
//!
//! Upstream services occasionally end an error message with an instruction
//! such as `"... backoff for 44m0s"`. The format is a Go style duration and
//! is not documented anywhere, so parsing is lenient: anything that does not
//! look like a hint yields `None` instead of an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static HINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)backoff\s+for\s+((?:\d+(?:\.\d+)?(?:h|ms|m|s))+)")
        .expect("hint pattern is valid")
});

static COMPONENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)(h|ms|m|s)")
        .expect("component pattern is valid")
});

/// Extract the backoff instruction from `message`
///
/// Hours, minutes, seconds and milliseconds components are summed; missing
/// components count as zero. The last matching instruction wins when a
/// message carries several.
///
/// ```
/// use std::time::Duration;
/// use tempo_governor::hint::parse_backoff_hint;
///
/// assert_eq!(parse_backoff_hint("quota hit, backoff for 44m0s"), Some(Duration::from_secs(2640)));
/// assert_eq!(parse_backoff_hint("backoff for 1h"), Some(Duration::from_secs(3600)));
/// assert_eq!(parse_backoff_hint("slow down"), None);
/// ```
#[must_use]
pub fn parse_backoff_hint(message: &str) -> Option<Duration> {
    let captures = HINT_PATTERN.captures_iter(message).last()?;
    let components = captures.get(1)?.as_str();

    let mut total_secs = 0.0_f64;
    for component in COMPONENT_PATTERN.captures_iter(components) {
        let value: f64 = component[1].parse().ok()?;
        total_secs += match component[2].to_ascii_lowercase().as_str() {
            "h" => value * 3600.0,
            "m" => value * 60.0,
            "s" => value,
            "ms" => value / 1000.0,
            _ => return None,
        };
    }

    let hint = Duration::try_from_secs_f64(total_secs).ok();
    if hint.is_none() {
        tracing::debug!(components, "backoff hint out of range, ignoring");
    }
    hint
}
