use regex::Regex;

/// Literal, case-sensitive matcher for the active search query.
pub fn build_highlight_regex(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    Regex::new(&regex::escape(query)).ok()
}

/// Splits `text` into `(segment, matched)` pieces for styled rendering.
pub fn split_matches<'a>(text: &'a str, regex: Option<&Regex>) -> Vec<(&'a str, bool)> {
    let Some(regex) = regex else {
        return vec![(text, false)];
    };
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            pieces.push((&text[last..found.start()], false));
        }
        pieces.push((found.as_str(), true));
        last = found.end();
    }
    if last < text.len() || pieces.is_empty() {
        pieces.push((&text[last..], false));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_metacharacters_are_literal() {
        let regex = build_highlight_regex("(พ.ศ.)").expect("regex");
        assert!(regex.is_match("ประกาศ (พ.ศ.) 2566"));
        assert!(!regex.is_match("ประกาศ (พxศx) 2566"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let regex = build_highlight_regex("Act").expect("regex");
        assert!(!regex.is_match("act of parliament"));
        assert!(build_highlight_regex("").is_none());
    }

    #[test]
    fn splits_into_marked_segments() {
        let regex = build_highlight_regex("สภา");
        let pieces = split_matches("รัฐสภา และ สภา", regex.as_ref());
        assert_eq!(
            pieces,
            vec![("รัฐ", false), ("สภา", true), (" และ ", false), ("สภา", true)]
        );
        assert_eq!(split_matches("abc", None), vec![("abc", false)]);
    }
}
