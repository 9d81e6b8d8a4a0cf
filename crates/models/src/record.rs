//! Loosely-typed remote records and the coercion rules used to read them.
//!
//! The hosted backend hands rows back as JSON objects whose values are not
//! reliably typed: numbers may arrive as strings, lookups as `{Id, Name}`
//! objects on reads and as bare ids in mutation results. Everything here
//! reads a field the way the presentation layer expects it, falling back to
//! a default instead of failing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;

pub type RecordId = i64;

/// System field holding the record id.
pub const ID: &str = "Id";
/// System field holding the display name.
pub const NAME: &str = "Name";
/// System field set by the backend on insert.
pub const CREATED_ON: &str = "CreatedOn";

/// A lookup field resolved by the backend to the referenced row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRef {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// One row of a remote table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ModelError::NotAnObject),
        }
    }

    /// Serialize a write payload into a record.
    pub fn from_payload<T: Serialize>(payload: &T) -> Result<Self, ModelError> {
        let value = serde_json::to_value(payload).map_err(|e| ModelError::Encode(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.get(ID).and_then(parse_int)
    }

    pub fn require_id(&self) -> Result<RecordId, ModelError> {
        self.id().ok_or(ModelError::MissingId)
    }

    /// Non-empty string value of `field`.
    pub fn opt_str(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn str_or(&self, field: &str, default: &str) -> String {
        self.opt_str(field).unwrap_or_else(|| default.to_string())
    }

    /// First non-empty string among `fields`.
    pub fn first_str(&self, fields: &[&str], default: &str) -> String {
        fields
            .iter()
            .find_map(|f| self.opt_str(f))
            .unwrap_or_else(|| default.to_string())
    }

    /// Missing fields are falsy.
    pub fn truthy(&self, field: &str) -> bool {
        self.get(field).map(truthy).unwrap_or(false)
    }

    /// True unless the field holds exactly `false`.
    pub fn not_false(&self, field: &str) -> bool {
        !matches!(self.get(field), Some(Value::Bool(false)))
    }

    pub fn int_or(&self, field: &str, default: i64) -> i64 {
        self.get(field).and_then(parse_int).filter(|n| *n != 0).unwrap_or(default)
    }

    pub fn float_or(&self, field: &str, default: f64) -> f64 {
        self.float_opt(field).unwrap_or(default)
    }

    /// Parsed number, or `None` when missing, unparsable or zero.
    pub fn float_opt(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(parse_float).filter(|f| *f != 0.0)
    }

    pub fn lookup(&self, field: &str) -> Option<LookupRef> {
        match self.get(field)? {
            Value::Object(map) => {
                let id = map.get(ID).and_then(parse_int)?;
                let name = match map.get(NAME) {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                Some(LookupRef { id, name })
            }
            _ => None,
        }
    }

    /// Id of a lookup given either as a resolved object or a bare id.
    pub fn lookup_id(&self, field: &str) -> Option<RecordId> {
        match self.get(field)? {
            Value::Object(map) => map.get(ID).and_then(parse_int),
            other => parse_int(other).filter(|n| *n != 0),
        }
    }

    /// `field`, falling back to the backend's `CreatedOn`.
    pub fn stamp_or_created(&self, field: &str) -> Option<String> {
        self.opt_str(field).or_else(|| self.opt_str(CREATED_ON))
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Current instant in the backend's timestamp format (`2024-01-15T10:30:00.000Z`).
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

pub fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Input text, or `default` when it is absent or empty.
pub fn text_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Input number, or `default` when it is absent, zero or not finite.
pub fn number_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|f| f.is_finite() && *f != 0.0).unwrap_or(default)
}

/// Truthiness of a JSON value as the presentation layer evaluates it.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integer prefix of a number or numeric string (`"42px"` reads as 42).
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

/// Float prefix of a number or numeric string (`"12.5kg"` reads as 12.5).
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_float_str(s),
        _ => None,
    }
}

fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = split_sign(s);
    let (radix, rest) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude = i64::from_str_radix(&rest[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float_str(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (negative, rest) = split_sign(s);
    let bytes = rest.as_bytes();

    let int_len = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let mut pos = int_len;
    let mut frac_len = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_len = bytes[pos + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        pos += 1 + frac_len;
    }
    if int_len == 0 && frac_len == 0 {
        return None;
    }

    let mut exponent = String::new();
    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut exp_pos = pos + 1;
        let mut exp_sign = "";
        match bytes.get(exp_pos) {
            Some(b'-') => {
                exp_sign = "-";
                exp_pos += 1;
            }
            Some(b'+') => exp_pos += 1,
            _ => {}
        }
        let exp_digits = bytes[exp_pos.min(bytes.len())..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_digits > 0 {
            exponent = format!("e{}{}", exp_sign, &rest[exp_pos..exp_pos + exp_digits]);
        }
    }

    let int_part = if int_len == 0 { "0" } else { &rest[..int_len] };
    let frac_part = if frac_len == 0 { "0" } else { &rest[int_len + 1..int_len + 1 + frac_len] };
    let literal = format!("{}{}.{}{}", if negative { "-" } else { "" }, int_part, frac_part, exponent);
    literal.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).expect("object")
    }

    #[test]
    fn parse_int_follows_prefix_rules() {
        assert_eq!(parse_int(&json!("42")), Some(42));
        assert_eq!(parse_int(&json!("  -7 apples")), Some(-7));
        assert_eq!(parse_int(&json!("0x1F")), Some(31));
        assert_eq!(parse_int(&json!(12.9)), Some(12));
        assert_eq!(parse_int(&json!("abc")), None);
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!(true)), None);
        assert_eq!(parse_int(&Value::Null), None);
    }

    #[test]
    fn parse_float_follows_prefix_rules() {
        assert_eq!(parse_float(&json!("12.5kg")), Some(12.5));
        assert_eq!(parse_float(&json!(".5")), Some(0.5));
        assert_eq!(parse_float(&json!("-3.")), Some(-3.0));
        assert_eq!(parse_float(&json!("1e3")), Some(1000.0));
        assert_eq!(parse_float(&json!("2.5e-1x")), Some(0.25));
        assert_eq!(parse_float(&json!("1E+2")), Some(100.0));
        assert_eq!(parse_float(&json!("2e")), Some(2.0));
        assert_eq!(parse_float(&json!(99)), Some(99.0));
        assert_eq!(parse_float(&json!("abc")), None);
        assert_eq!(parse_float(&json!(".")), None);
        assert_eq!(parse_float(&json!([1])), None);
    }

    #[test]
    fn numeric_accessors_fall_back_on_zero_and_garbage() {
        let r = record(json!({ "a": "abc", "b": 0, "c": "15", "d": "0.0", "e": "3.75" }));
        assert_eq!(r.int_or("a", 10), 10);
        assert_eq!(r.int_or("b", 10), 10);
        assert_eq!(r.int_or("c", 10), 15);
        assert_eq!(r.int_or("missing", 10), 10);
        assert_eq!(r.float_or("a", 0.0), 0.0);
        assert_eq!(r.float_or("d", 1.5), 1.5);
        assert_eq!(r.float_or("e", 0.0), 3.75);
        assert_eq!(r.float_opt("a"), None);
        assert_eq!(r.float_opt("e"), Some(3.75));
    }

    #[test]
    fn string_accessors_treat_empty_as_missing() {
        let r = record(json!({ "title_c": "", "Name": "Fallback", "note": null, "n": 5 }));
        assert_eq!(r.first_str(&["title_c", "Name"], ""), "Fallback");
        assert_eq!(r.str_or("note", "none"), "none");
        assert_eq!(r.str_or("n", ""), "5");
        assert_eq!(r.opt_str("title_c"), None);
    }

    #[test]
    fn boolean_accessors() {
        let r = record(json!({ "t": true, "f": false, "s": "yes", "z": 0, "nul": null }));
        assert!(r.truthy("t"));
        assert!(!r.truthy("f"));
        assert!(r.truthy("s"));
        assert!(!r.truthy("z"));
        assert!(!r.truthy("missing"));
        assert!(r.not_false("missing"));
        assert!(r.not_false("nul"));
        assert!(r.not_false("z"));
        assert!(!r.not_false("f"));
    }

    #[test]
    fn lookups_accept_objects_and_bare_ids() {
        let r = record(json!({
            "recipient_c": { "Id": 4, "Name": "Mom" },
            "gift_c": 9,
            "occasion_c": null,
            "bad_c": "x"
        }));
        assert_eq!(r.lookup("recipient_c"), Some(LookupRef { id: 4, name: "Mom".into() }));
        assert_eq!(r.lookup_id("recipient_c"), Some(4));
        assert_eq!(r.lookup("gift_c"), None);
        assert_eq!(r.lookup_id("gift_c"), Some(9));
        assert_eq!(r.lookup_id("occasion_c"), None);
        assert_eq!(r.lookup_id("bad_c"), None);
    }

    #[test]
    fn stamp_falls_back_to_created_on() {
        let r = record(json!({ "CreatedOn": "2024-01-01T00:00:00Z" }));
        assert_eq!(r.stamp_or_created("created_at_c").as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record(json!({})).stamp_or_created("created_at_c"), None);
    }

    #[test]
    fn input_helpers() {
        assert_eq!(text_or(Some(""), "General"), "General");
        assert_eq!(text_or(None, "General"), "General");
        assert_eq!(text_or(Some("Birthday"), "General"), "Birthday");
        assert_eq!(number_or(Some(f64::NAN), 10.0), 10.0);
        assert_eq!(number_or(Some(0.0), 10.0), 10.0);
        assert_eq!(number_or(Some(25.0), 10.0), 25.0);
    }

    #[test]
    fn now_iso_uses_millisecond_utc_format() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2024-01-15T10:30:00.000Z".len());
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(matches!(Record::from_value(json!([1, 2])), Err(ModelError::NotAnObject)));
    }
}
