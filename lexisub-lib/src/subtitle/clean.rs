//! Text cleaning shared by every format parser

/// Clean raw cue text for display.
///
/// Strips inline markup tags (`<i>`, `<c.yellow>`, `<00:00:01.000>`), strips
/// style-code braces (`{\an8}`), decodes the common entities, collapses
/// whitespace runs and trims.
pub fn clean_text(raw: &str) -> String {
    let without_tags = regex!(r"<[^>]*>").replace_all(raw, "");
    let without_styles = regex!(r"\{[^}]*\}").replace_all(&without_tags, "");
    let decoded = decode_entities(&without_styles);
    collapse_whitespace(&decoded)
}

/// Clean text that a document parser has already decoded.
///
/// Only style-code braces and whitespace are touched; `<` and `&` here are
/// literal characters, not markup.
pub fn clean_decoded_text(decoded: &str) -> String {
    let without_styles = regex!(r"\{[^}]*\}").replace_all(decoded, "");
    collapse_whitespace(&without_styles)
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // last, so "&amp;lt;" stays "&lt;"
        .replace("&amp;", "&")
}
