//! Mojibake repair for Meta exports.
//!
//! Messenger and Instagram exports store UTF-8 text as if every byte were an
//! ISO-8859-1 character, so "Привет" arrives as "ÐŸÑ€Ð¸Ð²ÐµÑ‚" and "❤️" as
//! "â\u{9d}¤ï¸\u{8f}". Repair takes each char back to its byte value and
//! decodes the bytes as UTF-8.
//!
//! [`repair_document`] applies the fix to a decoded JSON tree before any
//! field is read: every string held directly by an object, and every string
//! element of an array held directly by an object, is repaired. Strings in
//! arrays nested inside arrays are left alone, as are object keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatdbError, Result};

/// What to do with a string that cannot be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    /// Abort with [`ChatdbError::Encoding`] (default)
    #[default]
    Strict,
    /// Keep the string as-is and record it in the [`RepairReport`]
    Lenient,
}

/// Outcome of repairing one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Number of strings whose text changed.
    pub repaired: usize,
    /// Strings kept unrepaired under [`EncodingPolicy::Lenient`].
    pub unrepairable: Vec<String>,
}

impl RepairReport {
    /// Returns `true` if every string was repaired (or needed no repair).
    pub fn is_clean(&self) -> bool {
        self.unrepairable.is_empty()
    }
}

/// Reverses Meta's Latin-1 mis-decoding of a single string.
///
/// ASCII text passes through unchanged.
///
/// # Errors
///
/// Returns [`ChatdbError::Encoding`] if the string contains a char above
/// U+00FF (it was never Latin-1 decoded) or if the recovered bytes are not
/// valid UTF-8.
///
/// # Example
///
/// ```rust
/// use chatdb::encoding::repair_text;
///
/// assert_eq!(repair_text("Hello").unwrap(), "Hello");
/// assert_eq!(repair_text("Ð\u{9f}Ñ\u{80}Ð¸Ð²ÐµÑ\u{82}").unwrap(), "Привет");
/// ```
pub fn repair_text(s: &str) -> Result<String> {
    if s.is_ascii() {
        return Ok(s.to_string());
    }

    let bytes = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|_| ChatdbError::encoding(s, "character outside Latin-1"))?;

    String::from_utf8(bytes).map_err(|_| ChatdbError::encoding(s, "bytes are not valid UTF-8"))
}

/// Repairs a string, or the string elements of an array, in place.
///
/// Other values (numbers, objects, nested arrays inside the array) are left
/// untouched.
pub fn repair_value(
    value: &mut Value,
    policy: EncodingPolicy,
    report: &mut RepairReport,
) -> Result<()> {
    match value {
        Value::String(s) => repair_string(s, policy, report),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::String(s) = item {
                    repair_string(s, policy, report)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Repairs every object in a decoded document.
///
/// # Example
///
/// ```rust
/// use chatdb::encoding::{EncodingPolicy, repair_document};
///
/// let mut doc = serde_json::json!({"title": "caf\u{00c3}\u{00a9}", "tags": ["\u{00c3}\u{00a9}"]});
/// let report = repair_document(&mut doc, EncodingPolicy::Strict).unwrap();
/// assert_eq!(doc["title"], "café");
/// assert_eq!(doc["tags"][0], "é");
/// assert_eq!(report.repaired, 2);
/// ```
pub fn repair_document(value: &mut Value, policy: EncodingPolicy) -> Result<RepairReport> {
    let mut report = RepairReport::default();
    walk(value, policy, &mut report)?;
    Ok(report)
}

fn walk(value: &mut Value, policy: EncodingPolicy, report: &mut RepairReport) -> Result<()> {
    match value {
        Value::Object(map) => {
            for field in map.values_mut() {
                repair_value(field, policy, report)?;
                walk(field, policy, report)?;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                walk(item, policy, report)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn repair_string(s: &mut String, policy: EncodingPolicy, report: &mut RepairReport) -> Result<()> {
    match repair_text(s) {
        Ok(fixed) => {
            if fixed != *s {
                report.repaired += 1;
                *s = fixed;
            }
            Ok(())
        }
        Err(err) => match policy {
            EncodingPolicy::Strict => Err(err),
            EncodingPolicy::Lenient => {
                report.unrepairable.push(s.clone());
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Reproduces the export defect: UTF-8 bytes read back as Latin-1.
    fn garble(s: &str) -> String {
        s.bytes().map(char::from).collect()
    }

    #[test]
    fn test_repair_ascii_is_identity() {
        assert_eq!(repair_text("Hello").unwrap(), "Hello");
        assert_eq!(repair_text("").unwrap(), "");
        assert_eq!(repair_text("Test 123 !?").unwrap(), "Test 123 !?");
    }

    #[test]
    fn test_repair_cyrillic() {
        assert_eq!(repair_text(&garble("Привет мир")).unwrap(), "Привет мир");
    }

    #[test]
    fn test_repair_emoji_with_variation_selector() {
        let garbled = garble("❤️");
        assert_eq!(garbled, "\u{e2}\u{9d}\u{a4}\u{ef}\u{b8}\u{8f}");
        assert_eq!(repair_text(&garbled).unwrap(), "❤️");
    }

    #[test]
    fn test_repair_rejects_lone_latin1_byte() {
        // A real "é" was never mis-decoded; 0xE9 alone is not UTF-8.
        let err = repair_text("café").unwrap_err();
        assert!(err.is_encoding());
    }

    #[test]
    fn test_repair_rejects_chars_above_latin1() {
        let err = repair_text("Привет").unwrap_err();
        assert!(err.is_encoding());
        assert!(err.to_string().contains("outside Latin-1"));
    }

    #[test]
    fn test_repair_value_string_and_list() {
        let mut report = RepairReport::default();

        let mut value = json!(garble("Zoë"));
        repair_value(&mut value, EncodingPolicy::Strict, &mut report).unwrap();
        assert_eq!(value, json!("Zoë"));

        let mut value = json!([garble("ñ"), 5, garble("ü")]);
        repair_value(&mut value, EncodingPolicy::Strict, &mut report).unwrap();
        assert_eq!(value, json!(["ñ", 5, "ü"]));
        assert_eq!(report.repaired, 3);
    }

    #[test]
    fn test_repair_value_ignores_other_values() {
        let mut report = RepairReport::default();
        let mut value = json!(42);
        repair_value(&mut value, EncodingPolicy::Strict, &mut report).unwrap();
        assert_eq!(value, json!(42));
        assert_eq!(report.repaired, 0);
    }

    #[test]
    fn test_repair_document_nested_objects() {
        let mut doc = json!({
            "title": garble("Łódź"),
            "participants": [{"name": garble("Zoë")}],
            "messages": [{
                "sender_name": garble("Zoë"),
                "reactions": [{"reaction": garble("👍"), "actor": "Bob"}],
                "share": {"share_text": garble("¡hola!")}
            }]
        });
        let report = repair_document(&mut doc, EncodingPolicy::Strict).unwrap();

        assert_eq!(doc["title"], "Łódź");
        assert_eq!(doc["participants"][0]["name"], "Zoë");
        assert_eq!(doc["messages"][0]["sender_name"], "Zoë");
        assert_eq!(doc["messages"][0]["reactions"][0]["reaction"], "👍");
        assert_eq!(doc["messages"][0]["share"]["share_text"], "¡hola!");
        assert_eq!(report.repaired, 5);
        assert!(report.is_clean());
    }

    #[test]
    fn test_repair_document_skips_doubly_nested_strings() {
        let garbled = garble("é");
        let mut doc = json!({"grid": [[garbled.clone()]], "row": [garbled.clone()]});
        repair_document(&mut doc, EncodingPolicy::Strict).unwrap();
        assert_eq!(doc["grid"][0][0], json!(garbled));
        assert_eq!(doc["row"][0], "é");
    }

    #[test]
    fn test_repair_document_strict_fails() {
        let mut doc = json!({"content": "\u{00ff}"});
        let err = repair_document(&mut doc, EncodingPolicy::Strict).unwrap_err();
        assert!(err.is_encoding());
    }

    #[test]
    fn test_repair_document_lenient_keeps_string() {
        let mut doc = json!({"content": "\u{00ff}", "title": garble("ß")});
        let report = repair_document(&mut doc, EncodingPolicy::Lenient).unwrap();
        assert_eq!(doc["content"], "\u{00ff}");
        assert_eq!(doc["title"], "ß");
        assert_eq!(report.unrepairable, vec!["\u{00ff}".to_string()]);
        assert_eq!(report.repaired, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_policy_serde() {
        assert_eq!(
            serde_json::to_string(&EncodingPolicy::Lenient).unwrap(),
            "\"lenient\""
        );
        assert_eq!(EncodingPolicy::default(), EncodingPolicy::Strict);
    }
}
