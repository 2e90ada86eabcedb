//! Marker-slicing helpers for pulling fields out of upstream pages.
//!
//! The upstream does not ship structured data, so the client scans for known
//! marker pairs and slices the text between them. Helpers are tolerant:
//! every miss is an `Option::None` the caller turns into a parse error with
//! context, never a panic.

/// Returns the text between the first occurrence of `start` and the next
/// occurrence of `end`.
pub(super) fn between<'a>(hay: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let begin = hay.find(start)? + start.len();
    let rest = &hay[begin..];
    let stop = rest.find(end)?;
    Some(&rest[..stop])
}

/// Like [`between`], but keeps scanning: returns the slice and the offset
/// just past `end`, for iterating repeated blocks.
pub(super) fn between_from<'a>(
    hay: &'a str,
    from: usize,
    start: &str,
    end: &str,
) -> Option<(&'a str, usize)> {
    let begin = hay.get(from..)?.find(start)? + from + start.len();
    let rest = &hay[begin..];
    let stop = rest.find(end)?;
    Some((&rest[..stop], begin + stop + end.len()))
}

/// Collects every block between repeated `start`/`end` marker pairs.
pub(super) fn all_between<'a>(hay: &'a str, start: &str, end: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some((block, next)) = between_from(hay, cursor, start, end) {
        blocks.push(block);
        cursor = next;
    }
    blocks
}

/// Splits the haystack at every occurrence of `marker`, returning the
/// segment starting at each occurrence (up to the next one, or the end).
/// Used for repeated blocks whose closing tag is not a reliable marker.
pub(super) fn sections<'a>(hay: &'a str, marker: &str) -> Vec<&'a str> {
    let mut starts = Vec::new();
    let mut cursor = 0;
    while let Some(pos) = hay[cursor..].find(marker) {
        starts.push(cursor + pos);
        cursor += pos + marker.len();
    }
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(hay.len());
            &hay[start..end]
        })
        .collect()
}

/// Strips HTML tags and collapses surrounding whitespace.
pub(super) fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    decode_entities(out.trim())
}

/// Decodes the handful of entities the upstream actually emits.
pub(super) fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
}

/// Converts the upstream's HTML rendering of a long-text field into its
/// BBCode counterpart. Covers the markup the site actually emits: bold,
/// italic, underline, line breaks and links; everything else is stripped.
pub(super) fn html_to_bbcode(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('>') else {
            // Dangling bracket: keep the remainder as text
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let tag = &tail[..close];
        rest = &tail[close + 1..];

        let lower = tag.to_ascii_lowercase();
        match lower.as_str() {
            "b" | "strong" => out.push_str("[b]"),
            "/b" | "/strong" => out.push_str("[/b]"),
            "i" | "em" => out.push_str("[i]"),
            "/i" | "/em" => out.push_str("[/i]"),
            "u" => out.push_str("[u]"),
            "/u" => out.push_str("[/u]"),
            "br" | "br/" | "br /" => out.push('\n'),
            "/a" => out.push_str("[/url]"),
            _ if lower.starts_with("a ") => {
                if let Some(href) = between(tag, "href=\"", "\"") {
                    out.push_str("[url=");
                    out.push_str(href);
                    out.push(']');
                } else {
                    out.push_str("[url]");
                }
            }
            // Unknown tags are stripped
            _ => {}
        }
    }
    out.push_str(rest);
    decode_entities(out.trim())
}

/// Parses the trailing integer of a path like `/view/12345/`.
pub(super) fn trailing_id(path: &str) -> Option<u64> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// Parses a decimal counter, tolerating thousands separators.
pub(super) fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_basic() {
        assert_eq!(between("<b>title</b>", "<b>", "</b>"), Some("title"));
    }

    #[test]
    fn test_between_missing_marker() {
        assert_eq!(between("<b>title", "<b>", "</b>"), None);
        assert_eq!(between("title</b>", "<b>", "</b>"), None);
    }

    #[test]
    fn test_all_between_collects_repeated_blocks() {
        let hay = "<li>a</li><li>b</li><li>c</li>";
        assert_eq!(all_between(hay, "<li>", "</li>"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_all_between_empty_on_no_match() {
        assert!(all_between("nothing here", "<li>", "</li>").is_empty());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<a href=\"/u/x\"> name </a>"), "name");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;3"), "a & b <3");
    }

    #[test]
    fn test_trailing_id() {
        assert_eq!(trailing_id("/view/12345/"), Some(12345));
        assert_eq!(trailing_id("/view/12345"), Some(12345));
        assert_eq!(trailing_id("/view/none/"), None);
    }

    #[test]
    fn test_sections_slices_from_each_marker() {
        let hay = "pre <figure a> one <figure b> two";
        let blocks = sections(hay, "<figure");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("one"));
        assert!(blocks[1].contains("two"));
    }

    #[test]
    fn test_sections_empty_without_marker() {
        assert!(sections("no blocks here", "<figure").is_empty());
    }

    #[test]
    fn test_html_to_bbcode_inline_markup() {
        assert_eq!(
            html_to_bbcode("<strong>hi</strong> <i>there</i><br>next"),
            "[b]hi[/b] [i]there[/i]\nnext"
        );
    }

    #[test]
    fn test_html_to_bbcode_links() {
        assert_eq!(
            html_to_bbcode("<a href=\"/user/fender/\">fender</a>"),
            "[url=/user/fender/]fender[/url]"
        );
    }

    #[test]
    fn test_html_to_bbcode_strips_unknown_tags() {
        assert_eq!(html_to_bbcode("<div class=\"x\">text</div>"), "text");
    }

    #[test]
    fn test_parse_count_with_separator() {
        assert_eq!(parse_count(" 1,234 "), Some(1234));
        assert_eq!(parse_count("17"), Some(17));
        assert_eq!(parse_count("n/a"), None);
    }
}
