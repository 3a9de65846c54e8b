//! WebVTT cue parser

use crate::timestamp::parse_timestamp;
use crate::types::Segment;

use super::clean::clean_text;
use super::{push_segment, FormatParser, CUE_TIME_SEPARATOR};

/// Parser for WebVTT payloads.
///
/// The header block (and anything else before the first timing line) is
/// skipped. Each timing line starts a cue; the non-blank lines that follow,
/// up to the next blank line or timing line, form its text.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebVttParser;

impl FormatParser for WebVttParser {
    fn parse(&self, raw: &str) -> Vec<Segment> {
        let lines: Vec<&str> = raw.lines().collect();
        let mut segments = Vec::new();

        let mut i = match lines.iter().position(|l| l.contains(CUE_TIME_SEPARATOR)) {
            Some(first) => first,
            None => return segments,
        };

        while i < lines.len() {
            let line = lines[i];
            if !line.contains(CUE_TIME_SEPARATOR) {
                i += 1;
                continue;
            }

            let (start, end) = parse_timing_line(line);
            i += 1;

            let mut text_lines = Vec::new();
            while i < lines.len() {
                let next = lines[i].trim();
                if next.is_empty() || next.contains(CUE_TIME_SEPARATOR) {
                    break;
                }
                text_lines.push(next);
                i += 1;
            }

            if text_lines.is_empty() {
                tracing::debug!("Dropping WebVTT cue at {} with no text", start);
                continue;
            }

            let text = clean_text(&text_lines.join(" "));
            push_segment(&mut segments, start, end, text);
        }

        segments
    }
}

/// Split `start --> end [settings]` and parse both sides.
fn parse_timing_line(line: &str) -> (f64, f64) {
    let mut parts = line.splitn(2, CUE_TIME_SEPARATOR);
    let start = parts.next().unwrap_or("").trim();
    // Cue settings (align:start, position:10%...) follow the end time.
    let end = parts
        .next()
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("");
    (parse_timestamp(start), parse_timestamp(end))
}
