/*!
 * Tests for message link parsing
 */

use topic_relay::reference::parse_reference;

#[test]
fn test_parseReference_withChannelLinks_shouldReturnTrailingPosition() {
    assert_eq!(parse_reference("https://t.me/c/1234567890/42"), Some(42));
    assert_eq!(parse_reference("https://t.me/public_channel/1337"), Some(1337));
    assert_eq!(parse_reference("t.me/c/1/000120"), Some(120));
}

#[test]
fn test_parseReference_withNonAsciiDigits_shouldUseTrailingAsciiRun() {
    assert_eq!(parse_reference("t.me/c/1/x٣45"), Some(45));
    assert_eq!(parse_reference("https://t.me/c/1/٤٢"), None);
}

#[test]
fn test_parseReference_withAnyTextEndingInDigits_shouldReturnThatRun() {
    for (text, expected) in [("7", 7), ("message 15", 15), ("abc99", 99), ("x/0", 0)] {
        assert_eq!(parse_reference(text), Some(expected), "input: {}", text);
    }
}

#[test]
fn test_parseReference_withoutTrailingDigit_shouldReportAbsence() {
    for text in ["", "hello", "https://t.me/c/1/42/", "42 ", "https://t.me/c/1/42?single"] {
        assert_eq!(parse_reference(text), None, "input: {:?}", text);
    }
}

#[test]
fn test_parseReference_overflowingNumber_shouldReportAbsence() {
    assert_eq!(parse_reference("https://t.me/c/1/99999999999999999999999"), None);
}
