use crate::options::{OptionEntry, OptionResponse, ParseError};
use std::cmp::Ordering;

/// Start of every candidate object in backend output.
pub const OPTIONS_MARKER: &str = r#"{"options""#;

/// Extracts the last decodable, non-empty option list from `raw` and ranks it.
///
/// Every occurrence of [`OPTIONS_MARKER`] is a candidate. Each candidate is decoded as
/// a single JSON value starting at the marker, ignoring whatever follows it. A later
/// successful candidate replaces an earlier one, so a backend that prints a draft and
/// then a corrected reply yields the corrected reply.
pub fn parse_options(raw: &str) -> Result<Vec<OptionEntry>, ParseError> {
    let mut last_good: Option<Vec<OptionEntry>> = None;
    let mut cursor = 0usize;

    while let Some(found) = raw[cursor..].find(OPTIONS_MARKER) {
        let start = cursor + found;
        if let Some(options) = decode_candidate(&raw[start..]) {
            last_good = Some(options);
        }
        cursor = start + OPTIONS_MARKER.len();
    }

    let mut options = last_good.ok_or(ParseError::NotFound)?;
    rank_options(&mut options);
    Ok(options)
}

fn decode_candidate(segment: &str) -> Option<Vec<OptionEntry>> {
    let mut stream = serde_json::Deserializer::from_str(segment).into_iter::<OptionResponse>();
    match stream.next() {
        Some(Ok(response)) if !response.options.is_empty() => Some(response.options),
        _ => None,
    }
}

/// Stable ordering: ranked options ascending by rank, then unranked options, with
/// ties and unranked entries kept in decode order.
pub fn rank_options(options: &mut [OptionEntry]) {
    options.sort_by(compare_rank);
}

fn compare_rank(a: &OptionEntry, b: &OptionEntry) -> Ordering {
    match (a.is_ranked(), b.is_ranked()) {
        (true, true) => a.recommendation_order.cmp(&b.recommendation_order),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Single-line rendering for display; stored values are never passed through this.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: &str, rank: i64) -> OptionEntry {
        OptionEntry {
            value: value.to_string(),
            description: String::new(),
            recommendation_order: rank,
        }
    }

    fn values(options: &[OptionEntry]) -> Vec<&str> {
        options.iter().map(|option| option.value.as_str()).collect()
    }

    #[test]
    fn single_object_inside_commentary_is_extracted() {
        let raw = r#"Sure! Here you go:
{"options":[{"value":"ls -la","description":"list all","recommendation_order":1}]}
Let me know if you need more."#;
        let options = parse_options(raw).expect("options");
        assert_eq!(values(&options), vec!["ls -la"]);
        assert_eq!(options[0].description, "list all");
    }

    #[test]
    fn last_successful_object_wins() {
        let raw = r#"{"options":[{"value":"first","description":"","recommendation_order":1}]}
{"options":[{"value":"second","description":"","recommendation_order":1}]}"#;
        let options = parse_options(raw).expect("options");
        assert_eq!(values(&options), vec!["second"]);
    }

    #[test]
    fn malformed_later_draft_does_not_replace_earlier_good_object() {
        let raw = r#"{"options":[{"value":"good","description":"d","recommendation_order":1}]}
then a broken one {"options":[{"value":"bad""#;
        let options = parse_options(raw).expect("options");
        assert_eq!(values(&options), vec!["good"]);
    }

    #[test]
    fn malformed_draft_followed_by_final_reply_uses_final_reply() {
        let raw = r#"draft: {"options":[{"value":"oops",
final: {"options":[{"value":"git status","description":"show status"}]}"#;
        let options = parse_options(raw).expect("options");
        assert_eq!(values(&options), vec!["git status"]);
        assert_eq!(options[0].recommendation_order, 0);
    }

    #[test]
    fn empty_or_missing_option_arrays_are_not_candidates() {
        assert_eq!(parse_options(r#"{"options":[]}"#), Err(ParseError::NotFound));
        assert_eq!(parse_options(r#"{"options":null}"#), Err(ParseError::NotFound));
        assert_eq!(
            parse_options(r#"{"options":"ls"}"#),
            Err(ParseError::NotFound)
        );
    }

    #[test]
    fn text_without_marker_is_not_found() {
        let err = parse_options("I think you want: ls -la").expect_err("no json");
        assert_eq!(err, ParseError::NotFound);
        assert_eq!(err.to_string(), "no valid options JSON found");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = r#"{"options":[{"value":"pwd","description":"cwd","recommendation_order":2,"risk":"low"}],"model":"x"}"#;
        let options = parse_options(raw).expect("options");
        assert_eq!(values(&options), vec!["pwd"]);
    }

    #[test]
    fn ranking_orders_ascending_ranks() {
        let mut options = vec![entry("a", 3), entry("b", 1), entry("c", 2)];
        rank_options(&mut options);
        assert_eq!(values(&options), vec!["b", "c", "a"]);
    }

    #[test]
    fn ranking_keeps_unranked_in_original_order() {
        let mut options = vec![entry("a", 0), entry("b", 0), entry("c", -1)];
        rank_options(&mut options);
        assert_eq!(values(&options), vec!["a", "b", "c"]);

        let mut options = vec![entry("a", 0), entry("b", 5), entry("c", 0)];
        rank_options(&mut options);
        assert_eq!(values(&options), vec!["b", "a", "c"]);
    }

    #[test]
    fn ranking_ties_preserve_decode_order() {
        let mut options = vec![entry("x", 2), entry("y", 1), entry("z", 2)];
        rank_options(&mut options);
        assert_eq!(values(&options), vec!["y", "x", "z"]);
    }

    #[test]
    fn clean_text_collapses_whitespace_and_is_idempotent() {
        let once = clean_text("  ls\n  -la \t| grep   foo \n");
        assert_eq!(once, "ls -la | grep foo");
        assert_eq!(clean_text(&once), once);
        assert_eq!(clean_text(" \n\t "), "");
    }
}
