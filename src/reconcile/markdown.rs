//! Render-time sanitization of the display text.
//!
//! Input is HTML-escaped first, then a small set of line-oriented markdown
//! markers is translated: `#`/`##`/`###` headings, `**bold**`, `-`/`*` list
//! items (grouped into one `<ul>`), and blank-line paragraph breaks. Anything
//! else stays literal text. The conversion is lossy and one-way.

use regex::Regex;

lazy_static::lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid");
}

enum Block {
    Paragraph(Vec<String>),
    List(Vec<String>),
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn inline(text: &str) -> String {
    BOLD.replace_all(text, "<strong>$1</strong>").into_owned()
}

fn heading(line: &str) -> Option<(usize, &str)> {
    for level in (1..=3).rev() {
        let marker = &"### "[3 - level..];
        if let Some(rest) = line.strip_prefix(marker) {
            return Some((level, rest.trim()));
        }
    }
    None
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
}

fn flush(block: &mut Option<Block>, out: &mut String) {
    match block.take() {
        Some(Block::Paragraph(lines)) => {
            out.push_str("<p>");
            out.push_str(&lines.join("<br>"));
            out.push_str("</p>");
        }
        Some(Block::List(items)) => {
            out.push_str("<ul>");
            for item in items {
                out.push_str("<li>");
                out.push_str(&item);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        None => {}
    }
}

/// Convert pipeline display text into presentational HTML.
pub fn render_display(text: &str) -> String {
    let escaped = escape_html(text);
    let mut out = String::with_capacity(escaped.len() + 32);
    let mut current: Option<Block> = None;

    for raw_line in escaped.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            flush(&mut current, &mut out);
            continue;
        }

        if let Some((level, title)) = heading(line) {
            flush(&mut current, &mut out);
            out.push_str(&format!("<h{level}>{}</h{level}>", inline(title)));
            continue;
        }

        if let Some(item) = list_item(line) {
            match current.as_mut() {
                Some(Block::List(items)) => items.push(inline(item)),
                _ => {
                    flush(&mut current, &mut out);
                    current = Some(Block::List(vec![inline(item)]));
                }
            }
            continue;
        }

        match current.as_mut() {
            Some(Block::Paragraph(lines)) => lines.push(inline(line)),
            _ => {
                flush(&mut current, &mut out);
                current = Some(Block::Paragraph(vec![inline(line)]));
            }
        }
    }

    flush(&mut current, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_before_translating() {
        assert_eq!(
            render_display("<script>alert('x')</script> & **more**"),
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; <strong>more</strong></p>"
        );
    }

    #[test]
    fn headings_up_to_level_three() {
        assert_eq!(
            render_display("# Top\n## Mid\n### Low\n#### Deep"),
            "<h1>Top</h1><h2>Mid</h2><h3>Low</h3><p>#### Deep</p>"
        );
    }

    #[test]
    fn list_items_are_grouped() {
        let text = "Picks:\n- **Jazz** at 7\n* Market\n\nSee you there";
        assert_eq!(
            render_display(text),
            "<p>Picks:</p><ul><li><strong>Jazz</strong> at 7</li><li>Market</li></ul><p>See you there</p>"
        );
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        assert_eq!(
            render_display("one\ntwo\n\n\nthree"),
            "<p>one<br>two</p><p>three</p>"
        );
    }

    #[test]
    fn empty_text_renders_nothing() {
        assert_eq!(render_display(""), "");
        assert_eq!(render_display("\n\n"), "");
    }
}
