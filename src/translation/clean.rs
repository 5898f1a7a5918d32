use crate::text_utils::{collapse_whitespace, truncate_with_ellipsis};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Entities decoded in this order; `&amp;` first so `&amp;lt;` becomes `&lt;`
/// and then `<`.
const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
];

/// Turn a provider's raw definition text into a tooltip-sized gloss.
pub fn clean_gloss(raw: &str, max_chars: usize) -> String {
    let mut text = RE_MARKUP_TAG.replace_all(raw, "").into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    truncate_with_ellipsis(&collapse_whitespace(&text), max_chars)
}
