//! Filter key canonicalization.
//!
//! Callers that need the same column twice in one filter category prefix
//! (or suffix) the key with a numeric marker, `1:name` or `name:1`.

use nom::{
    IResult,
    character::complete::{char, digit1},
    combinator::all_consuming,
    sequence::{preceded, terminated},
};

fn leading_marker(input: &str) -> IResult<&str, &str> {
    terminated(digit1, char(':'))(input)
}

fn trailing_marker(input: &str) -> IResult<&str, &str> {
    all_consuming(preceded(char(':'), digit1))(input)
}

/// Strip a numeric disambiguation marker from a filter key.
pub fn canonical_key(key: &str) -> &str {
    if let Ok((rest, _)) = leading_marker(key) {
        if !rest.is_empty() {
            return rest;
        }
    }
    if let Some(pos) = key.rfind(':') {
        if pos > 0 && trailing_marker(&key[pos..]).is_ok() {
            return &key[..pos];
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markers() {
        assert_eq!(canonical_key("1:name"), "name");
        assert_eq!(canonical_key("12:tasks.title"), "tasks.title");
        assert_eq!(canonical_key("name:2"), "name");
        assert_eq!(canonical_key("name"), "name");
    }

    #[test]
    fn test_non_numeric_colons_kept() {
        assert_eq!(canonical_key("a:b"), "a:b");
        assert_eq!(canonical_key("1:"), "1:");
        assert_eq!(canonical_key(":1"), ":1");
    }
}
