//! SubRip (SRT) parser

use crate::timestamp::parse_timestamp;
use crate::types::Segment;

use super::clean::clean_text;
use super::{push_segment, FormatParser};

/// Parser for SubRip payloads.
///
/// Blocks are separated by blank lines and need at least three lines:
/// index, time range and one or more text lines. Blocks whose time range
/// does not match `HH:MM:SS,mmm --> HH:MM:SS,mmm` are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SrtParser;

impl FormatParser for SrtParser {
    fn parse(&self, raw: &str) -> Vec<Segment> {
        let normalized = raw.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let mut segments = Vec::new();

        for block in regex!(r"\n\s*\n").split(normalized.trim()) {
            let lines: Vec<&str> = block.lines().collect();
            if lines.len() < 3 {
                tracing::debug!("Skipping SRT block with {} line(s)", lines.len());
                continue;
            }

            let caps = match regex!(
                r"(\d{2}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2},\d{3})"
            )
            .captures(lines[1])
            {
                Some(caps) => caps,
                None => {
                    tracing::debug!("Skipping SRT block with bad time range: {:?}", lines[1]);
                    continue;
                }
            };

            let start = parse_timestamp(&caps[1].replace(',', "."));
            let end = parse_timestamp(&caps[2].replace(',', "."));
            let text = clean_text(&lines[2..].join(" "));
            push_segment(&mut segments, start, end, text);
        }

        segments
    }
}
