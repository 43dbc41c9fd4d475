use std::sync::OnceLock;

use regex::Regex;

/// Entities resolved, in order, once tags are stripped.
const HTML_ENTITIES: [(&str, &str); 11] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&#x2F;", "/"),
    ("&#x5C;", "\\"),
    ("&#x3D;", "="),
];

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_pattern() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is a valid regex"))
}

/// Strip markup from a free-text field.
///
/// Tags are removed with a permissive `<...>` match (not a parser) and the
/// fixed entity table is resolved, repeatedly, until neither changes the text;
/// escaped markup such as `&lt;b&gt;` therefore ends up stripped too. Whitespace
/// runs then collapse to single spaces. Empty or missing input yields an empty
/// string, and cleaning already-clean text returns it unchanged.
pub fn clean_html_tags(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return String::new();
    };

    let mut cleaned = text.to_string();
    loop {
        let next = resolve_entities(&tag_pattern().replace_all(&cleaned, ""));
        // every change shortens the text, so this terminates
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_entities(text: &str) -> String {
    let mut out = text.to_string();
    for (entity, literal) in HTML_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, literal);
        }
    }
    out
}
