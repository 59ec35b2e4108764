//! Reply formatting: the fixed analysis wrapper and Markdown → Telegram HTML rendering.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::Error;

pub const REPLY_HEADER: &str = "🔍 **Analysis Result**";
pub const REPLY_FOOTER: &str = "_Verified by Satya.ai_";

/// Wrap raw analysis text between the fixed header and footer. No validation, no truncation.
pub fn format_reply(analysis: &str) -> String {
    format!("{REPLY_HEADER}\n\n{analysis}\n\n{REPLY_FOOTER}")
}

/// Text shown in place of an analysis when the remote call failed.
pub fn analysis_failure_text(err: &Error) -> String {
    format!("❌ Error analyzing content: {}", err.detail())
}

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the Markdown subset LLMs typically emit into Telegram-compatible HTML.
///
/// Telegram HTML supports only `<b>`, `<i>`, `<code>`, `<pre>`, `<blockquote>` and
/// `<a href>`; everything else is escaped so the reply can never be rejected for bad markup.
pub fn markdown_to_telegram_html(input: &str) -> String {
    let (text, blocks) = stash_spans(input, "```", Stash::Block);
    let (text, inline) = stash_spans(&text, "`", Stash::Inline);
    let (text, links) = stash_links(&text);

    let escaped = escape_html(&text);
    let mut lines = Vec::new();
    for line in escaped.split('\n') {
        if is_horizontal_rule(line) {
            continue;
        }
        let mut l = header_line(line);
        l = replace_pairs(&l, "**", "<b>", "</b>");
        l = replace_pairs(&l, "__", "<b>", "</b>");
        l = replace_single(&l, '_', "<i>", "</i>");
        l = replace_single(&l, '*', "<b>", "</b>");
        if let Some(rest) = l.strip_prefix("- ").or_else(|| l.strip_prefix("* ")) {
            l = format!("• {rest}");
        }
        lines.push(l);
    }
    let mut html = blockquotes(&lines);

    // Links first: their text may hold inline-code placeholders.
    for (i, link) in links.iter().enumerate() {
        html = html.replace(&placeholder(Stash::Link, i), link);
    }
    for (i, code) in blocks.iter().enumerate() {
        html = html.replace(
            &placeholder(Stash::Block, i),
            &format!("<pre>{}</pre>", escape_html(code)),
        );
    }
    for (i, code) in inline.iter().enumerate() {
        html = html.replace(
            &placeholder(Stash::Inline, i),
            &format!("<code>{}</code>", escape_html(code)),
        );
    }

    while html.contains("\n\n\n") {
        html = html.replace("\n\n\n", "\n\n");
    }
    html
}

#[derive(Clone, Copy)]
enum Stash {
    Block,
    Inline,
    Link,
}

fn placeholder(kind: Stash, idx: usize) -> String {
    match kind {
        Stash::Block => format!("\0BLOCK{idx}\0"),
        Stash::Inline => format!("\0INLINE{idx}\0"),
        Stash::Link => format!("\0LINK{idx}\0"),
    }
}

/// Render `[text](url)` spans and bare `http(s)://` URLs up front and replace them with
/// placeholders, so emphasis markers inside URLs (`fact_check_moon`) stay literal.
fn stash_links(input: &str) -> (String, Vec<String>) {
    static LINK: OnceLock<Regex> = OnceLock::new();
    let link = LINK.get_or_init(|| {
        Regex::new(r"\[([^\]\n]+)\]\((https?://[^)\s]+)\)|https?://[^\s<>\[\]()]+")
            .expect("valid regex")
    });

    let mut rendered = Vec::new();
    let text = link.replace_all(input, |caps: &regex::Captures<'_>| {
        let (html, tail) = match (caps.get(1), caps.get(2)) {
            (Some(label), Some(url)) => (
                format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(url.as_str()),
                    escape_html(label.as_str())
                ),
                "",
            ),
            _ => {
                // Sentence punctuation right after a bare URL is not part of it.
                let raw = &caps[0];
                let url = raw.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
                (escape_html(url), &raw[url.len()..])
            }
        };
        let out = format!("{}{tail}", placeholder(Stash::Link, rendered.len()));
        rendered.push(html);
        out
    });
    (text.into_owned(), rendered)
}

/// Replace `fence ... fence` spans with placeholders so later passes leave them alone.
/// An unclosed fence is kept as literal text.
fn stash_spans(input: &str, fence: &str, kind: Stash) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut stashed = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find(fence) {
        let after = &rest[start + fence.len()..];
        let body_start = match kind {
            // Skip an optional language tag and the newline after it.
            Stash::Block => {
                let lang = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                let skip_nl = usize::from(after[lang..].starts_with('\n'));
                lang + skip_nl
            }
            Stash::Inline | Stash::Link => 0,
        };
        let Some(end) = after[body_start..].find(fence) else {
            break;
        };

        out.push_str(&rest[..start]);
        out.push_str(&placeholder(kind, stashed.len()));
        stashed.push(after[body_start..body_start + end].to_string());
        rest = &after[body_start + end + fence.len()..];
    }

    out.push_str(rest);
    (out, stashed)
}

fn is_horizontal_rule(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| c == '-' || c == '*')
}

fn header_line(line: &str) -> String {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(title) = line[hashes..].strip_prefix(' ') {
            return format!("<b>{title}</b>");
        }
    }
    line.to_string()
}

fn replace_pairs(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find(delim) {
        let inner = &rest[start + delim.len()..];
        let Some(end) = inner.find(delim) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&inner[..end]);
        out.push_str(close);
        rest = &inner[end + delim.len()..];
    }
    out.push_str(rest);
    out
}

/// Single-character emphasis. Doubled delimiters and unmatched ones stay literal.
fn replace_single(text: &str, delim: char, open: &str, close: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_single = |i: usize| {
        chars[i] == delim
            && !(i > 0 && chars[i - 1] == delim)
            && chars.get(i + 1) != Some(&delim)
    };

    let mut out = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        if is_single(i) {
            // "* item" bullets are not emphasis.
            let opens_word = chars.get(i + 1).is_some_and(|c| !c.is_whitespace());
            if opens_word {
                if let Some(j) = (i + 1..chars.len()).find(|&j| is_single(j)) {
                    out.push_str(open);
                    out.extend(&chars[i + 1..j]);
                    out.push_str(close);
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn blockquotes(lines: &[String]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut quote: Vec<&str> = Vec::new();

    for line in lines {
        if line == "&gt;" {
            quote.push("");
            continue;
        }
        if let Some(rest) = line.strip_prefix("&gt; ") {
            quote.push(rest);
            continue;
        }
        if !quote.is_empty() {
            out.push(format!("<blockquote>{}</blockquote>", quote.join("\n")));
            quote.clear();
        }
        out.push(line.clone());
    }
    if !quote.is_empty() {
        out.push(format!("<blockquote>{}</blockquote>", quote.join("\n")));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_analysis_between_header_and_footer() {
        assert_eq!(
            format_reply("[Score: 82/100] ..."),
            "🔍 **Analysis Result**\n\n[Score: 82/100] ...\n\n_Verified by Satya.ai_"
        );
    }

    #[test]
    fn analysis_failure_keeps_error_detail() {
        let err = Error::Analysis("openrouter returned 401".to_string());
        assert_eq!(
            analysis_failure_text(&err),
            "❌ Error analyzing content: openrouter returned 401"
        );
    }

    #[test]
    fn renders_reply_wrapper() {
        let html = markdown_to_telegram_html(&format_reply("[Score: 10/100] fine"));
        assert_eq!(
            html,
            "🔍 <b>Analysis Result</b>\n\n[Score: 10/100] fine\n\n<i>Verified by Satya.ai</i>"
        );
    }

    #[test]
    fn escapes_html_outside_markup() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
        assert_eq!(markdown_to_telegram_html("1 < 2 & 3"), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn code_blocks_are_not_reformatted() {
        let md = "hi\n```js\nconst x = '<b>**';\n```\nbye";
        let html = markdown_to_telegram_html(md);
        assert!(html.contains("<pre>const x = '&lt;b&gt;**';\n</pre>"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn headers_bullets_links_and_quotes() {
        let md = "### Red flags\n- no sources\n* anonymous author\n> quoted claim\n[Reuters](https://reuters.com)\n---";
        let html = markdown_to_telegram_html(md);
        assert_eq!(
            html,
            "<b>Red flags</b>\n• no sources\n• anonymous author\n<blockquote>quoted claim</blockquote>\n<a href=\"https://reuters.com\">Reuters</a>"
        );
    }

    #[test]
    fn underscores_inside_urls_stay_literal() {
        let html = markdown_to_telegram_html(&format_reply(
            "4. Sources: https://www.snopes.com/fact_check/moon_cheese.",
        ));
        assert!(html.contains("Sources: https://www.snopes.com/fact_check/moon_cheese.\n"));
        assert!(html.ends_with("<i>Verified by Satya.ai</i>"));

        assert_eq!(
            markdown_to_telegram_html("See [Snopes](https://snopes.com/fact_check/moon_cheese) _now_"),
            "See <a href=\"https://snopes.com/fact_check/moon_cheese\">Snopes</a> <i>now</i>"
        );
    }

    #[test]
    fn link_urls_are_attribute_escaped() {
        assert_eq!(
            markdown_to_telegram_html("[q](https://x.com/?a=1&b=2)"),
            "<a href=\"https://x.com/?a=1&amp;b=2\">q</a>"
        );
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(markdown_to_telegram_html("snake_case"), "snake_case");
        assert_eq!(markdown_to_telegram_html("2 * 3"), "2 * 3");
        assert_eq!(markdown_to_telegram_html("`open"), "`open");
    }
}
