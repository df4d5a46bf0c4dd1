//! Duration-literal parsing for configuration values.
//!
//! Token TTLs and similar knobs are configured as compact literals such as
//! `"15m"` or `"7d"`. Invalid literals never fail startup; callers fall back
//! to a documented default via [`parse_duration_or`].

use chrono::Duration;

/// Parse a duration literal into a [`chrono::Duration`].
///
/// Accepted forms: a bare integer (seconds) or an integer with one of the
/// suffixes `s`, `m`, `h`, `d`. Whitespace around the literal is ignored.
/// Zero and negative durations are rejected.
pub fn parse_duration(literal: &str) -> Option<Duration> {
    let literal = literal.trim();
    if literal.is_empty() {
        return None;
    }

    let (digits, multiplier) = match literal.as_bytes()[literal.len() - 1] {
        b's' => (&literal[..literal.len() - 1], 1),
        b'm' => (&literal[..literal.len() - 1], 60),
        b'h' => (&literal[..literal.len() - 1], 3_600),
        b'd' => (&literal[..literal.len() - 1], 86_400),
        _ => (literal, 1),
    };

    let value: i64 = digits.parse().ok()?;
    if value <= 0 {
        return None;
    }

    value.checked_mul(multiplier).map(Duration::seconds)
}

/// Parse a duration literal, falling back to `default` when the literal is
/// absent or invalid. The fallback is logged so misconfiguration is visible.
pub fn parse_duration_or(literal: Option<&str>, default: Duration) -> Duration {
    match literal {
        None => default,
        Some(raw) => match parse_duration(raw) {
            Some(parsed) => parsed,
            None => {
                tracing::warn!(literal = raw, "invalid duration literal; using default");
                default
            }
        },
    }
}
