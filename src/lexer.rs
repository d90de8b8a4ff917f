//! Splitting of a raw input line into command arguments.

use regex::Regex;
use std::sync::LazyLock;

/// Either a double-quoted run (quotes stripped, inner whitespace kept) or a
/// run of non-whitespace characters.
///
/// Embedded quotes cannot be escaped: `"a \"b\""` is not a single argument.
static ARGUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|(\S+)"#).expect("argument pattern is valid"));

/// Splits `line` into an ordered list of arguments.
///
/// A double quote only opens a quoted argument at the start of a token, so
/// `ab"c d"` yields `ab"c` and `d"`. An unmatched quote is kept as part of a
/// plain word. If nothing matches at all, the whole line is returned as the
/// only argument.
pub fn split_into_args(line: &str) -> Vec<String> {
    let args: Vec<String> = ARGUMENT
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect();

    if args.is_empty() {
        return vec![line.to_string()];
    }
    args
}
