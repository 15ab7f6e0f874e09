//! Markdown conversion and typographic clean-up.
//!
//! [`to_html`] runs CommonMark (plus tables, footnotes, strikethrough and
//! smart punctuation) and passes raw HTML through, so layout output that
//! already is HTML survives a second trip. [`prettify`] then applies two
//! small typographic rules to text outside `pre`/`code`/`script`/`style`:
//!
//! - `&amp;` is wrapped in `<span class="amp">` for styling.
//! - The last space in each paragraph, heading or list item becomes `&nbsp;`
//!   so the final word never sits alone on a line.

use pulldown_cmark::{Options, Parser, html as md_html};

/// Convert markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(markdown, options);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Markdown followed by [`prettify`]; what page content goes through.
pub fn render_markdown(markdown: &str) -> String {
    prettify(&to_html(markdown))
}

const SKIP_TAGS: &[&str] = &["pre", "code", "kbd", "script", "style", "textarea"];
const WIDONT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "dt", "dd"];

#[derive(Debug)]
enum Token {
    Tag(String),
    Text(String),
}

/// Apply typographic rules to an HTML fragment.
pub fn prettify(html: &str) -> String {
    let mut tokens = tokenize(html);
    apply_widont(&mut tokens);

    let mut out = String::with_capacity(html.len() + 32);
    let mut skip_depth = 0usize;
    for token in &tokens {
        match token {
            Token::Tag(tag) => {
                track_skip(tag, &mut skip_depth);
                out.push_str(tag);
            }
            Token::Text(text) if skip_depth == 0 => {
                out.push_str(&text.replace("&amp;", "<span class=\"amp\">&amp;</span>"));
            }
            Token::Text(text) => out.push_str(text),
        }
    }
    out
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            tokens.push(Token::Tag(rest[..end].to_string()));
            rest = &rest[end..];
        } else if rest.starts_with('<') {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            tokens.push(Token::Tag(rest[..end].to_string()));
            rest = &rest[end..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token::Text(rest[..end].to_string()));
            rest = &rest[end..];
        }
    }
    tokens
}

/// `(name, is_closing)` for an element tag; `None` for comments and doctypes.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if name.is_empty() {
        None
    } else {
        Some((name, closing))
    }
}

fn track_skip(tag: &str, depth: &mut usize) {
    if let Some((name, closing)) = tag_name(tag) {
        if SKIP_TAGS.contains(&name.as_str()) {
            if closing {
                *depth = depth.saturating_sub(1);
            } else if !tag.ends_with("/>") {
                *depth += 1;
            }
        }
    }
}

fn apply_widont(tokens: &mut [Token]) {
    let mut skip_depth = 0usize;
    let mut seen_word = false;
    let mut pending: Option<(usize, usize)> = None;
    let mut candidate: Option<(usize, usize)> = None;
    let mut replacements = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Tag(tag) => {
                track_skip(tag, &mut skip_depth);
                let Some((name, closing)) = tag_name(tag) else {
                    continue;
                };
                if !WIDONT_TAGS.contains(&name.as_str()) {
                    continue;
                }
                if closing {
                    if let Some(at) = candidate {
                        replacements.push(at);
                    }
                }
                seen_word = false;
                pending = None;
                candidate = None;
            }
            Token::Text(text) if skip_depth == 0 => {
                for (i, ch) in text.char_indices() {
                    if ch == ' ' {
                        if seen_word {
                            pending = Some((idx, i));
                        }
                    } else if !ch.is_whitespace() {
                        seen_word = true;
                        if let Some(at) = pending.take() {
                            candidate = Some(at);
                        }
                    } else {
                        pending = None;
                    }
                }
            }
            Token::Text(_) => {}
        }
    }

    // Offsets stay valid: at most one replacement per block, applied back to front.
    for (idx, offset) in replacements.into_iter().rev() {
        if let Some(Token::Text(text)) = tokens.get_mut(idx) {
            text.replace_range(offset..offset + 1, "&nbsp;");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn markdown_basics() {
        let html = to_html("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }

    #[test]
    fn markdown_tables_and_strikethrough() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn smart_punctuation() {
        let html = to_html("\"quoted\" -- dash");
        assert!(html.contains('\u{201c}'));
        assert!(html.contains('\u{2013}'));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = to_html("<div class=\"x\">kept</div>\n");
        assert!(html.contains("<div class=\"x\">kept</div>"));
    }

    #[test]
    fn widont_joins_last_two_words() {
        assert_eq!(prettify("<p>one two three</p>"), "<p>one two&nbsp;three</p>");
    }

    #[test]
    fn widont_spans_inline_tags() {
        assert_eq!(
            prettify("<p>hello <em>world</em></p>"),
            "<p>hello&nbsp;<em>world</em></p>"
        );
    }

    #[test]
    fn widont_leaves_single_word_alone() {
        assert_eq!(prettify("<h1>Home</h1>"), "<h1>Home</h1>");
        assert_eq!(prettify("<p> Home </p>"), "<p> Home </p>");
    }

    #[test]
    fn ampersand_wrapped_outside_code() {
        assert_eq!(
            prettify("<p>Tom &amp; Jerry</p>"),
            "<p>Tom <span class=\"amp\">&amp;</span>&nbsp;Jerry</p>"
        );
        assert_eq!(
            prettify("<pre><code>a &amp; b c</code></pre>"),
            "<pre><code>a &amp; b c</code></pre>"
        );
    }

    #[test]
    fn text_outside_blocks_untouched() {
        assert_eq!(prettify("plain words here"), "plain words here");
    }

    #[test]
    fn render_markdown_combines_both() {
        let html = render_markdown("Fish & chips tonight");
        assert_eq!(
            html,
            "<p>Fish <span class=\"amp\">&amp;</span> chips&nbsp;tonight</p>\n"
        );
    }
}
