//! TTML / DFXP parser

use roxmltree::{Document, Node};

use crate::timestamp::parse_timestamp;
use crate::types::Segment;

use super::clean::clean_decoded_text;
use super::{push_segment, FormatParser};

const DEFAULT_TICK_RATE: f64 = 10_000_000.0;
const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Parser for TTML and DFXP documents.
///
/// Every `<p>` carrying both `begin` and `end` becomes a segment. A document
/// that is not well-formed XML parses to an empty list.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtmlParser;

/// Timing parameters declared on the `<tt>` root.
#[derive(Debug, Clone, Copy)]
struct TimeBase {
    tick_rate: f64,
    frame_rate: f64,
}

impl TimeBase {
    fn from_root(root: Node) -> Self {
        let mut base = TimeBase {
            tick_rate: DEFAULT_TICK_RATE,
            frame_rate: DEFAULT_FRAME_RATE,
        };
        // ttp: namespace differs between TTML and legacy DFXP, so match on local name
        for attr in root.attributes() {
            let value = attr.value().trim().parse::<f64>().ok().filter(|v| *v > 0.0);
            match (attr.name(), value) {
                ("tickRate", Some(v)) => base.tick_rate = v,
                ("frameRate", Some(v)) => base.frame_rate = v,
                _ => {}
            }
        }
        base
    }

    /// Resolve a TTML time expression to seconds.
    ///
    /// Offset times (`1.5s`, `1500ms`, `900f`, `15000000t`) and frame clock
    /// times (`HH:MM:SS:FF`) are handled here; plain clock times go to the
    /// shared timestamp parser.
    fn resolve(&self, expr: &str) -> f64 {
        let expr = expr.trim();

        if let Some(caps) = regex!(r"^(\d+(?:\.\d+)?)(h|ms|m|s|f|t)$").captures(expr) {
            let value: f64 = caps[1].parse().unwrap_or(0.0);
            let seconds = match &caps[2] {
                "h" => value * 3600.0,
                "m" => value * 60.0,
                "s" => value,
                "ms" => value / 1000.0,
                "f" => value / self.frame_rate,
                "t" => value / self.tick_rate,
                _ => 0.0,
            };
            return round_ms(seconds);
        }

        if let Some(caps) = regex!(r"^(\d+):(\d{2}):(\d{2}):(\d+(?:\.\d+)?)$").captures(expr) {
            let hours: f64 = caps[1].parse().unwrap_or(0.0);
            let minutes: f64 = caps[2].parse().unwrap_or(0.0);
            let seconds: f64 = caps[3].parse().unwrap_or(0.0);
            let frames: f64 = caps[4].parse().unwrap_or(0.0);
            return round_ms(hours * 3600.0 + minutes * 60.0 + seconds + frames / self.frame_rate);
        }

        parse_timestamp(expr)
    }
}

fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Concatenate the text of a paragraph, turning `<br/>` into a space.
fn collect_text(node: Node, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                out.push_str(text);
            }
        } else if child.is_element() {
            if child.tag_name().name() == "br" {
                out.push(' ');
            } else {
                collect_text(child, out);
            }
        }
    }
}

impl FormatParser for TtmlParser {
    fn parse(&self, raw: &str) -> Vec<Segment> {
        let doc = match Document::parse(raw.trim_start_matches('\u{feff}')) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to parse TTML document: {}", e);
                return Vec::new();
            }
        };

        let base = TimeBase::from_root(doc.root_element());
        let mut segments = Vec::new();

        for p in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "p")
        {
            let (begin, end) = match (p.attribute("begin"), p.attribute("end")) {
                (Some(begin), Some(end)) => (begin, end),
                _ => {
                    tracing::debug!("Skipping TTML paragraph without begin/end");
                    continue;
                }
            };

            let mut raw_text = String::new();
            collect_text(p, &mut raw_text);
            let text = clean_decoded_text(&raw_text);
            if text.is_empty() {
                continue;
            }

            push_segment(&mut segments, base.resolve(begin), base.resolve(end), text);
        }

        segments
    }
}
