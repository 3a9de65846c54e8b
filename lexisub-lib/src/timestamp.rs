//! Subtitle timestamp parsing
//!
//! Accepts the clock forms used by WebVTT, SRT and TTML, tried in order:
//! - `H:MM:SS[.mmm]` / `H:MM:SS[,mmm]`
//! - `MM:SS[.mmm]`
//! - `SECONDS[.mmm]`
//!
//! The fractional part may have any number of digits. It is right-padded to
//! three digits and truncated to milliseconds, so `"1"` is 100ms and
//! `"12345"` is 123ms. Input matching none of the forms parses as zero.

/// Parse a timestamp string into seconds.
///
/// Never fails: unparsable input yields `0.0` so a single bad timestamp
/// degrades one segment instead of aborting a whole document.
pub fn parse_timestamp(raw: &str) -> f64 {
    match parse_timestamp_ms(raw) {
        Some(ms) => ms as f64 / 1000.0,
        None => {
            tracing::debug!("Unparsable timestamp {:?}, using 0", raw);
            0.0
        }
    }
}

/// Parse a timestamp string into whole milliseconds, or `None` when no
/// form matches.
pub fn parse_timestamp_ms(raw: &str) -> Option<u64> {
    let s = raw.trim();

    if let Some(caps) = regex!(r"^(\d+):(\d{1,2}):(\d{1,2})(?:[.,](\d+))?$").captures(s) {
        let hours = number(caps.get(1)?.as_str())?;
        let minutes = number(caps.get(2)?.as_str())?;
        let seconds = number(caps.get(3)?.as_str())?;
        let millis = caps.get(4).map(|m| fraction_ms(m.as_str())).unwrap_or(0);
        return clock_ms(hours, minutes, seconds, millis);
    }

    if let Some(caps) = regex!(r"^(\d+):(\d{1,2})(?:[.,](\d+))?$").captures(s) {
        let minutes = number(caps.get(1)?.as_str())?;
        let seconds = number(caps.get(2)?.as_str())?;
        let millis = caps.get(3).map(|m| fraction_ms(m.as_str())).unwrap_or(0);
        return clock_ms(0, minutes, seconds, millis);
    }

    if let Some(caps) = regex!(r"^(\d+)(?:[.,](\d+))?$").captures(s) {
        let seconds = number(caps.get(1)?.as_str())?;
        let millis = caps.get(2).map(|m| fraction_ms(m.as_str())).unwrap_or(0);
        return clock_ms(0, 0, seconds, millis);
    }

    None
}

/// Total milliseconds, or `None` if the value does not fit.
fn clock_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

fn number(s: &str) -> Option<u64> {
    s.parse::<u64>().ok()
}

/// Right-pad to three digits, then keep the first three.
fn fraction_ms(digits: &str) -> u64 {
    let padded: String = digits.chars().chain("000".chars()).take(3).collect();
    padded.parse().unwrap_or(0)
}
