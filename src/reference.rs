/*!
 * Message reference parsing.
 *
 * Operators identify source messages by pasting a message link such as
 * `https://t.me/c/1234567890/45`. Only the trailing run of digits matters;
 * the rest of the link is not validated and the message is not checked
 * for existence.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing decimal digits anchored at the end of the input
static TRAILING_DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+)$").unwrap()
});

/// Extract the message position a reference points at.
///
/// Returns `None` when the text does not end in a digit, or when the digit
/// run is too long to be a position.
pub fn parse_reference(text: &str) -> Option<i64> {
    TRAILING_DIGITS_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<i64>().ok())
}
