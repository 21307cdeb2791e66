//! Lyrics extraction from Genius song pages.
//!
//! The public API does not serve lyrics, so they are read from the song page.
//! Lyrics live in one or more `<div data-lyrics-container="true">` blocks;
//! everything else on the page is ignored.

use std::sync::LazyLock;

use regex::Regex;

const CONTAINER_MARKER: &str = "data-lyrics-container=\"true\"";

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Extract plain-text lyrics from a song page.
///
/// Returns `None` when the page holds no lyrics container.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let mut sections = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = html[cursor..].find(CONTAINER_MARKER) {
        let marker = cursor + offset;
        let Some(tag_end) = html[marker..].find('>') else {
            break;
        };
        let body_start = marker + tag_end + 1;
        let Some(body_end) = matching_div_close(html, body_start) else {
            break;
        };

        sections.push(render_fragment(&html[body_start..body_end]));
        cursor = body_end;
    }

    if sections.is_empty() {
        return None;
    }

    Some(sections.join("\n").trim().to_string())
}

/// Find the `</div` closing the div whose body starts at `from`.
fn matching_div_close(html: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;

    loop {
        let rest = &html[pos..];
        let next_close = find_tag(rest, "</div")?;
        match find_tag(rest, "<div") {
            Some(open) if open < next_close => {
                depth += 1;
                pos += open + "<div".len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + next_close);
                }
                pos += next_close + "</div".len();
            }
        }
    }
}

/// Position of `tag` in `html` where the tag name ends right after it, so
/// `<div` matches `<div>` and `<div class=..>` but not `<divider>`.
fn find_tag(html: &str, tag: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = html[offset..].find(tag) {
        let start = offset + found;
        let end = start + tag.len();
        match html.as_bytes().get(end) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            _ => offset = end,
        }
    }
    None
}

fn render_fragment(fragment: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(fragment, "\n");
    let text = TAG.replace_all(&with_breaks, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate.find(';').and_then(|end| {
            decode_entity(&candidate[1..end]).map(|decoded| (decoded, end + 1))
        }) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
