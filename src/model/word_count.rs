use std::sync::OnceLock;

use regex::Regex;

fn markup() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| {
        Regex::new(r"<[A-Za-z/!][^>]*>|&nbsp;|&#160;").expect("markup pattern is a valid regex")
    })
}

/// Count whitespace-delimited words in rich-text content, ignoring markup.
///
/// Tags are treated as word boundaries, so `<p>one</p><p>two</p>` counts two words.
pub fn word_count(content: &str) -> u32 {
    let text = markup().replace_all(content, " ");
    let words = text.split_whitespace().count();
    u32::try_from(words).unwrap_or(u32::MAX)
}
