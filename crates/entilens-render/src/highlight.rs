//! Highlighted text view
//!
//! Produces displaCy-style markup: every entity becomes a coloured `<mark>`
//! with its label in a trailing `<span>`. All text is HTML-escaped and line
//! breaks are kept as `<br>`.

use std::fmt::Write;

use entilens_core::EntityOccurrence;

/// Download name of the standalone document
pub const HIGHLIGHT_FILE_NAME: &str = "highlighted_entities.html";

const WRAPPER_STYLE: &str = "line-height: 2.5; direction: ltr";
const MARK_STYLE: &str =
    "padding: 0.45em 0.6em; margin: 0 0.25em; line-height: 1; border-radius: 0.35em;";
const LABEL_STYLE: &str = "font-size: 0.8em; font-weight: bold; line-height: 1; border-radius: 0.35em; vertical-align: middle; margin-left: 0.5rem";

/// Escape text for HTML and turn newlines into `<br>`
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' => out.push_str("<br>"),
            '\r' => {}
            c => out.push(c),
        }
    }
}

/// Entities in start order with overlapping and out-of-range spans removed
fn visible_entities<'a>(entities: &'a [EntityOccurrence], char_count: usize) -> Vec<&'a EntityOccurrence> {
    let mut sorted: Vec<&EntityOccurrence> = entities.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut visible: Vec<&EntityOccurrence> = Vec::with_capacity(sorted.len());
    let mut cursor = 0;
    for entity in sorted {
        if entity.start >= entity.end || entity.end > char_count {
            tracing::debug!(start = entity.start, end = entity.end, "Skipping entity outside the text");
            continue;
        }
        if entity.start < cursor {
            continue;
        }
        cursor = entity.end;
        visible.push(entity);
    }
    visible
}

/// Render the highlighted text as an HTML fragment
pub fn render_fragment(text: &str, entities: &[EntityOccurrence]) -> String {
    // Byte offset of every character, plus the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    let mut out = String::with_capacity(text.len() * 2);
    let _ = write!(out, "<div class=\"entities\" style=\"{WRAPPER_STYLE}\">");

    let mut cursor = 0;
    for entity in visible_entities(entities, char_count) {
        push_text(&mut out, &text[offsets[cursor]..offsets[entity.start]]);

        let _ = write!(
            out,
            "<mark class=\"entity\" style=\"background: {}; {MARK_STYLE}\">",
            entity.label.color()
        );
        push_text(&mut out, &text[offsets[entity.start]..offsets[entity.end]]);
        let _ = write!(
            out,
            "<span class=\"entity-label\" style=\"{LABEL_STYLE}\">{}</span></mark>",
            entity.label
        );

        cursor = entity.end;
    }
    push_text(&mut out, &text[offsets[cursor]..]);

    out.push_str("</div>");
    out
}

/// Render a standalone HTML document for download
pub fn render_document(text: &str, entities: &[EntityOccurrence]) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Highlighted entities</title>\n</head>\n<body style=\"font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; padding: 1.5rem;\">\n{}\n</body>\n</html>\n",
        render_fragment(text, entities)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use entilens_core::EntityLabel;

    fn marks(html: &str) -> usize {
        html.matches("<mark class=\"entity\"").count()
    }

    #[test]
    fn test_fragment_wraps_entities() {
        let text = "Obama visited Berlin.";
        let html = render_fragment(
            text,
            &[
                EntityOccurrence::new("Obama", 0, 5, EntityLabel::Person),
                EntityOccurrence::new("Berlin", 14, 20, EntityLabel::Gpe),
            ],
        );

        assert!(html.starts_with("<div class=\"entities\""));
        assert!(html.ends_with(".</div>"));
        assert_eq!(marks(&html), 2);
        assert!(html.contains(EntityLabel::Person.color()));
        assert!(html.contains(">Obama<span class=\"entity-label\""));
        assert!(html.contains(">PERSON</span></mark> visited <mark"));
        assert!(html.contains(">GPE</span></mark>.</div>"));
    }

    #[test]
    fn test_escapes_text_and_keeps_line_breaks() {
        let text = "<b>AT&T</b>\nin Texas";
        let html = render_fragment(
            text,
            &[
                EntityOccurrence::new("AT&T", 3, 7, EntityLabel::Org),
                EntityOccurrence::new("Texas", 15, 20, EntityLabel::Gpe),
            ],
        );

        assert!(html.contains("&lt;b&gt;<mark"));
        assert!(html.contains(">AT&amp;T<span"));
        assert!(html.contains("&lt;/b&gt;<br>in <mark"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_overlapping_spans_keep_the_first() {
        let text = "New York City";
        let html = render_fragment(
            text,
            &[
                EntityOccurrence::new("York City", 4, 13, EntityLabel::Gpe),
                EntityOccurrence::new("New York", 0, 8, EntityLabel::Gpe),
            ],
        );

        assert_eq!(marks(&html), 1);
        assert!(html.contains(">New York<span"));
        assert!(html.contains("</mark> City</div>"));
    }

    #[test]
    fn test_multibyte_offsets() {
        let text = "Café in Zürich";
        let html = render_fragment(
            text,
            &[EntityOccurrence::new("Zürich", 8, 14, EntityLabel::Gpe)],
        );
        assert!(html.contains(">Café in <mark"));
        assert!(html.contains(">Zürich<span"));
    }

    #[test]
    fn test_out_of_range_entities_are_ignored() {
        let html = render_fragment(
            "short",
            &[EntityOccurrence::new("ghost", 3, 40, EntityLabel::Org)],
        );
        assert_eq!(marks(&html), 0);
        assert!(html.contains(">short</div>"));
    }

    #[test]
    fn test_document_is_standalone() {
        let html = render_document("Paris", &[EntityOccurrence::new("Paris", 0, 5, EntityLabel::Gpe)]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert_eq!(marks(&html), 1);
        assert_eq!(HIGHLIGHT_FILE_NAME, "highlighted_entities.html");
    }
}
