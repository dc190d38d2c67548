//! Plain-text rendering of toots for IRC.

use std::fmt::Write;

use super::api::Status;

/// Reduce status HTML to plain text.
///
/// Paragraph ends and `<br>` become newlines, every other tag is dropped and
/// character references are decoded. Trailing newlines are trimmed.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            // Unterminated tag; keep it as text.
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let tag = rest[start + 1..start + len].trim().to_ascii_lowercase();
        if tag == "/p" || tag.starts_with("br") {
            text.push('\n');
        }
        rest = &rest[start + len + 1..];
    }
    text.push_str(rest);

    let text = unescape(&text);
    text.trim_end_matches('\n').to_string()
}

/// Decode HTML character references.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&after[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Multi-line IRC rendering of a toot under its shorthand.
pub fn render_toot(shorthand: &str, status: &Status) -> String {
    let body = html_to_text(&status.content);
    let mut out = format!(
        "[{shorthand}] Toot by: {} ({})\n> {}",
        status.account.display_name,
        status.account.username,
        body.split('\n').collect::<Vec<_>>().join("\n> ")
    );
    let urls = status.media_attachments.iter().filter_map(|m| m.url.as_deref());
    for (i, url) in urls.enumerate() {
        let _ = write!(out, "\n Attachment {}: {url}", i + 1);
    }
    out.push('\n');
    out.push_str(status.url.as_deref().unwrap_or_default());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paragraphs_and_breaks() {
        assert_eq!(
            html_to_text("<p>Hello <a href=\"x\">@you</a></p><p>line<br>two<br />three</p>"),
            "Hello @you\nline\ntwo\nthree"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(html_to_text("<p>a &amp; b &lt;3 &#39;q&#x27;</p>"), "a & b <3 'q'");
        assert_eq!(html_to_text("AT&T &bogus; &"), "AT&T &bogus; &");
    }

    #[test]
    fn test_render_toot() {
        let status: Status = serde_json::from_value(json!({
            "id": "109876543210",
            "content": "<p>first</p><p>second</p>",
            "url": "https://example.social/@carol/109876543210",
            "account": {"id": "3", "username": "carol", "acct": "carol", "display_name": "Carol"},
            "media_attachments": [{"url": "https://files.example/a.png"}]
        }))
        .unwrap();

        assert_eq!(
            render_toot("ZYT,wS", &status),
            "[ZYT,wS] Toot by: Carol (carol)\n> first\n> second\n Attachment 1: https://files.example/a.png\nhttps://example.social/@carol/109876543210"
        );
    }
}
