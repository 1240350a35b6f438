use once_cell::sync::Lazy;
use regex::Regex;

// Covers <i>, <font color=..>, <color>, <c.class> and any other tag-like span
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("markup pattern is valid")
});

// ASS/SSA override blocks that leak into SRT files, e.g. {\an8}
static OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\[^}]*\}").expect("override pattern is valid")
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("whitespace pattern is valid")
});

/// Strip markup from cue text and collapse whitespace into single spaces.
///
/// `clean(clean(x)) == clean(x)` for every input.
pub fn clean(text: &str) -> String {
    let mut stripped = MARKUP_REGEX.replace_all(text, "").into_owned();
    // removing one override block can splice two halves into a new one
    while OVERRIDE_REGEX.is_match(&stripped) {
        stripped = OVERRIDE_REGEX.replace_all(&stripped, "").into_owned();
    }
    WHITESPACE_REGEX
        .replace_all(stripped.trim(), " ")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_markup() {
        assert_eq!(clean("<i>Goodbye</i> friend"), "Goodbye friend");
        assert_eq!(
            clean("<font color=\"#ffff00\">Look out!</font>"),
            "Look out!"
        );
        assert_eq!(clean("{\\an8}Upstairs"), "Upstairs");
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  Hello\n   world \t again  "), "Hello world again");
        assert_eq!(clean("\n\n"), "");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            "<i>Goodbye</i> friend",
            "<<b>b>",
            "a <> b",
            "< unterminated",
            "{{\\a}x}",
            "{{\\a}\\b}",
            "<b>{\\an8}</b>  text\n\nmore",
            "plain",
            "",
        ];

        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
