//! Markdown rendering: turn a finished answer into a self-contained HTML fragment.
//!
//! Answers from the QA service use a small, predictable subset of Markdown:
//! `##`/`###` headings, `**bold**`, `**Label**:` definition lines, numbered
//! and bulleted lists, and `` `inline code` ``. Rather than pulling in a full
//! CommonMark engine (and having to sanitise its raw-HTML passthrough), this
//! module handles exactly that subset, line by line, and styles every block
//! with inline `style` attributes so the fragment renders the same wherever
//! it is embedded.
//!
//! ## Rule Order
//!
//! 1. HTML-escape `&`, `<`, `>`: before anything else, so text from the
//!    answer can never become markup
//! 2. Headings (`### `, `## `): bold is the only inline rule applied inside
//! 3. Ordered items (`1. `): consecutive items share one `<ol>`
//! 4. Unordered items (`- `, `* `): share one `<ul>`; opening either list
//!    kind closes the other
//! 5. Blank line → spacer, anything else → paragraph block
//!
//! Inside list items and paragraphs the inline rules run as
//! label → bold → code, code last so backticks work everywhere.
//!
//! Lists never nest. No rendering happens while an answer is still
//! streaming: the consumer calls [`render_markdown`] once, on completion.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Styles ──────────────────────────────────────────────────────────────────

const H2_OPEN: &str = r#"<h2 style="color: #1e293b; font-size: 1.2rem; font-weight: 700; margin: 1.5rem 0 0.75rem 0; padding-bottom: 0.5rem; border-bottom: 2px solid #e2e8f0;">"#;
const H3_OPEN: &str = r#"<h3 style="color: #1e293b; font-size: 1.1rem; font-weight: 700; margin: 1.5rem 0 0.75rem 0; padding-bottom: 0.5rem; border-bottom: 2px solid #e2e8f0;">"#;
const OL_STYLE: &str = "margin-left: 1.5rem; margin-top: 0.75rem; margin-bottom: 1rem; list-style-type: decimal; padding-left: 0.5rem;";
const UL_OPEN: &str = r#"<ul style="margin-left: 1.5rem; margin-top: 0.75rem; margin-bottom: 1rem; list-style-type: disc; padding-left: 0.5rem;">"#;
const LI_OPEN: &str = r#"<li style="margin-bottom: 0.75rem; line-height: 1.7;">"#;
const PARAGRAPH_OPEN: &str = r#"<div style="margin-bottom: 0.5rem; line-height: 1.8;">"#;
const SPACER: &str = r#"<div style="height: 0.5rem;"></div>"#;
const LABEL_BLOCK: &str = r#"<div style="margin-top: 0.75rem; margin-bottom: 0.25rem;"><strong style="color: #4f46e5; font-weight: 600; display: inline-block;">${1}:</strong></div>"#;
const BOLD_SPAN: &str = r#"<strong style="color: #4f46e5; font-weight: 600;">${1}</strong>"#;
const CODE_SPAN: &str = r#"<code style="background: #f1f5f9; padding: 0.2rem 0.5rem; border-radius: 4px; font-family: monospace; font-size: 0.9rem; color: #dc2626;">${1}</code>"#;

// ── Patterns ────────────────────────────────────────────────────────────────

static RE_ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+").unwrap());
static RE_UNORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[*-]\s+").unwrap());
static RE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*:").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());

/// Escape the three characters that could open or close markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Render `text` to an HTML fragment.
///
/// Pure and deterministic; list state starts fresh on every call.
pub fn render_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut state = RenderState::default();

    for raw in text.split('\n') {
        let escaped = escape_html(raw.trim());
        let line = escaped.as_str();

        if let Some(heading) = line.strip_prefix("### ") {
            state.close(&mut out);
            push_block(&mut out, H3_OPEN, &bold(heading), "</h3>");
        } else if let Some(heading) = line.strip_prefix("## ") {
            state.close(&mut out);
            push_block(&mut out, H2_OPEN, &bold(heading), "</h2>");
        } else if let Some(caps) = RE_ORDERED_ITEM.captures(line) {
            let marker_end = caps.get(0).map_or(0, |m| m.end());
            state.enter(ListKind::Ordered, &caps[1], &mut out);
            push_block(&mut out, LI_OPEN, &inline(&line[marker_end..]), "</li>");
        } else if let Some(m) = RE_UNORDERED_ITEM.find(line) {
            state.enter(ListKind::Unordered, "", &mut out);
            push_block(&mut out, LI_OPEN, &inline(&line[m.end()..]), "</li>");
        } else if line.is_empty() {
            state.close(&mut out);
            out.push_str(SPACER);
        } else {
            state.close(&mut out);
            if is_label_line(line) {
                out.push_str(&inline(line));
            } else {
                push_block(&mut out, PARAGRAPH_OPEN, &inline(line), "</div>");
            }
        }
    }

    state.close(&mut out);
    out
}

// ── List state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

/// Which list, if any, the current render pass is inside.
#[derive(Debug, Default)]
struct RenderState {
    open_list: Option<ListKind>,
}

impl RenderState {
    /// Make sure a list of `kind` is open, closing a list of the other kind.
    ///
    /// `first_number` is the literal number of the item that opens an ordered
    /// list; it becomes the `start` attribute when the list does not begin at 1.
    fn enter(&mut self, kind: ListKind, first_number: &str, out: &mut String) {
        if self.open_list == Some(kind) {
            return;
        }
        self.close(out);
        match kind {
            ListKind::Ordered => {
                let digits = first_number.trim_start_matches('0');
                if digits.is_empty() || digits == "1" {
                    out.push_str(&format!(r#"<ol style="{OL_STYLE}">"#));
                } else {
                    out.push_str(&format!(r#"<ol start="{digits}" style="{OL_STYLE}">"#));
                }
            }
            ListKind::Unordered => out.push_str(UL_OPEN),
        }
        self.open_list = Some(kind);
    }

    fn close(&mut self, out: &mut String) {
        match self.open_list.take() {
            Some(ListKind::Ordered) => out.push_str("</ol>"),
            Some(ListKind::Unordered) => out.push_str("</ul>"),
            None => {}
        }
    }
}

// ── Inline rules ────────────────────────────────────────────────────────────

fn push_block(out: &mut String, open: &str, body: &str, close: &str) {
    out.push_str(open);
    out.push_str(body);
    out.push_str(close);
}

fn bold(text: &str) -> String {
    RE_BOLD.replace_all(text, BOLD_SPAN).into_owned()
}

/// Label, then bold, then code.
fn inline(text: &str) -> String {
    let s = RE_LABEL.replace_all(text, LABEL_BLOCK);
    let s = RE_BOLD.replace_all(&s, BOLD_SPAN);
    RE_CODE.replace_all(&s, CODE_SPAN).into_owned()
}

/// The whole line is one `**Label**:` and nothing else.
fn is_label_line(line: &str) -> bool {
    RE_LABEL
        .find(line)
        .is_some_and(|m| m.start() == 0 && m.end() == line.len())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    static RE_OWN_TAG: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"</?(?:h2|h3|div|strong|ol|ul|li|code)(?: start="\d+")?(?: style="[^"<>]*")?>"#)
            .unwrap()
    });

    /// Remove every tag the renderer itself emits.
    fn strip_own_tags(html: &str) -> String {
        RE_OWN_TAG.replace_all(html, "").into_owned()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_no_raw_angle_brackets_survive() {
        let inputs = [
            "<script>alert(1)</script>",
            "## <b>Title</b>",
            "1. <img src=x onerror=alert(1)>",
            "- a -> b & c",
            "**<i>bold</i>**: x",
            "`<div>`",
            "x > y\n\n< z",
            "&lt; already escaped",
        ];
        for input in inputs {
            let html = render_markdown(input);
            let text = strip_own_tags(&html);
            assert!(
                !text.contains('<') && !text.contains('>'),
                "raw bracket leaked for {input:?}: {html}"
            );
        }
    }

    #[test]
    fn test_ampersand_escaped_first() {
        let html = render_markdown("&lt;");
        assert!(html.contains("&amp;lt;"), "got: {html}");
    }

    #[test]
    fn test_headings() {
        let html = render_markdown("## Summary\n### Details");
        assert!(html.starts_with(H2_OPEN));
        assert!(html.contains("Summary</h2>"));
        assert!(html.contains(&format!("{H3_OPEN}Details</h3>")));
    }

    #[test]
    fn test_heading_applies_bold_but_not_code() {
        let html = render_markdown("## **Key** `term`");
        assert!(html.contains("<strong"));
        assert!(!html.contains("<code"));
        assert!(html.contains("`term`"));
    }

    #[test]
    fn test_label_line_is_standalone_block() {
        let html = render_markdown("**Label**:");
        assert!(html.starts_with("<div style=\"margin-top: 0.75rem;"), "got: {html}");
        assert!(html.contains("Label:</strong></div>"));
        assert!(!html.contains(PARAGRAPH_OPEN));
        assert!(!html.contains("</strong>:"));
    }

    #[test]
    fn test_label_requires_adjacent_colon() {
        let html = render_markdown("**Label** :");
        assert!(html.contains(PARAGRAPH_OPEN));
        assert!(html.contains("Label</strong> :"));
    }

    #[test]
    fn test_label_followed_by_text_stays_in_paragraph() {
        let html = render_markdown("**Note**: read carefully");
        assert!(html.starts_with(PARAGRAPH_OPEN));
        assert!(html.contains("Note:</strong></div> read carefully"));
    }

    #[test]
    fn test_inline_bold() {
        let html = render_markdown("this is **very** important");
        assert_eq!(
            html,
            format!(
                "{PARAGRAPH_OPEN}this is <strong style=\"color: #4f46e5; font-weight: 600;\">very</strong> important</div>"
            )
        );
    }

    #[test]
    fn test_numbered_run_is_one_list() {
        let html = render_markdown("1. first\n2. second\n3. third");
        assert_eq!(count(&html, "<ol"), 1);
        assert_eq!(count(&html, "</ol>"), 1);
        assert_eq!(count(&html, "<li"), 3);
        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        let third = html.find("third").unwrap();
        assert!(first < second && second < third);
        assert!(html.ends_with("</ol>"));
    }

    #[test]
    fn test_ordered_list_keeps_start_number() {
        let html = render_markdown("4. four\n5. five");
        assert!(html.starts_with("<ol start=\"4\""), "got: {html}");
    }

    #[test]
    fn test_interleaved_lists_reopen_containers() {
        let html = render_markdown("1. one\n- bullet\n2. two");
        assert_eq!(count(&html, "<ol"), 2);
        assert_eq!(count(&html, "<ul"), 1);
        let ol1 = html.find("<ol").unwrap();
        let ul = html.find("<ul").unwrap();
        let ol2 = html.rfind("<ol").unwrap();
        assert!(ol1 < ul && ul < ol2);
        assert_eq!(count(&html, "</ol>"), 2);
        assert_eq!(count(&html, "</ul>"), 1);
    }

    #[test]
    fn test_list_closed_by_paragraph() {
        let html = render_markdown("- a\n* b\nafter");
        assert_eq!(count(&html, "<ul"), 1);
        let close = html.find("</ul>").unwrap();
        let para = html.find("after").unwrap();
        assert!(close < para);
    }

    #[test]
    fn test_bold_star_line_is_not_bullet() {
        let html = render_markdown("**Heads up** here");
        assert!(!html.contains("<ul"));
        assert!(html.contains("<strong"));
    }

    #[test]
    fn test_inline_code_inside_list_and_paragraph() {
        let html = render_markdown("- run `cargo`\nthen `exit`");
        assert_eq!(count(&html, "<code"), 2);
        assert!(html.contains(">cargo</code>"));
    }

    #[test]
    fn test_blank_line_spacer() {
        let html = render_markdown("a\n\nb");
        assert_eq!(count(&html, SPACER), 1);
        let a = html.find(">a<").unwrap();
        let spacer = html.find(SPACER).unwrap();
        let b = html.find(">b<").unwrap();
        assert!(a < spacer && spacer < b);
    }

    #[test]
    fn test_lines_are_trimmed() {
        assert_eq!(render_markdown("   1. x  "), render_markdown("1. x"));
    }

    #[test]
    fn test_render_state_resets_between_calls() {
        let _ = render_markdown("1. dangling");
        let html = render_markdown("plain");
        assert!(!html.contains("</ol>"));
    }
}
