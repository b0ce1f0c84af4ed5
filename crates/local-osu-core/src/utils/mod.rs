pub mod codec;
pub mod path;
pub mod prompt;

use ahash::AHashSet;
use serde_json::{Map, Value};
use std::borrow::Borrow;

use crate::profile::ScoreRecord;

pub use codec::{bytes_to_string, string_to_bytes};
pub use path::{is_path, is_wsl, wsl_path};

/// Keep the first score seen for each beatmap. Given a pp-descending list
/// this leaves the best play per map, relative order untouched.
pub fn filter_top_scores<S: Borrow<ScoreRecord>>(scores: Vec<S>) -> Vec<S> {
    let mut seen: AHashSet<String> = AHashSet::with_capacity(scores.len());
    scores
        .into_iter()
        .filter(|s| seen.insert(s.borrow().beatmap_md5.clone()))
        .collect()
}

/// Copy of `map` without `keys`. Missing keys are ignored.
pub fn delete_keys(map: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    let mut copy = map.clone();
    for key in keys {
        copy.remove(*key);
    }
    copy
}

/// Best-effort typing of a raw string: integer, then float, then JSON, and
/// finally the string itself.
pub fn real_type(raw: &str) -> Value {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::from(int);
        }
    }

    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }

    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(md5: &str, pp: f64) -> ScoreRecord {
        ScoreRecord {
            beatmap_md5: md5.to_string(),
            pp,
            accuracy: 100.0,
            mods: 0,
        }
    }

    #[test]
    fn test_filter_top_scores_keeps_first_per_map() {
        let scores = vec![score("a", 300.0), score("a", 250.0), score("b", 200.0)];
        let top = filter_top_scores(scores);
        let pps: Vec<f64> = top.iter().map(|s| s.pp).collect();
        assert_eq!(pps, vec![300.0, 200.0]);
    }

    #[test]
    fn test_filter_top_scores_is_idempotent() {
        let scores = vec![
            score("c", 410.0),
            score("a", 300.0),
            score("c", 280.0),
            score("b", 200.0),
            score("a", 100.0),
        ];
        let once = filter_top_scores(scores);
        let twice = filter_top_scores(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_delete_keys_leaves_original_untouched() {
        let original = json!({"a": 1, "b": 2, "c": 3});
        let map = original.as_object().unwrap();

        let trimmed = delete_keys(map, &["a", "missing"]);
        assert!(!trimmed.contains_key("a"));
        assert_eq!(trimmed.len(), 2);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_real_type() {
        assert_eq!(real_type("42"), json!(42));
        assert_eq!(real_type("-7"), json!(-7));
        assert_eq!(real_type("1.5"), json!(1.5));
        assert_eq!(real_type("true"), json!(true));
        assert_eq!(real_type("[1, 2]"), json!([1, 2]));
        assert_eq!(real_type("hello"), json!("hello"));
        assert_eq!(real_type(""), json!(""));
    }
}
