//! Normalized holiday snapshot and its flat attribute schema.
//!
//! A [`NormalizedSnapshot`] is what the rest of the system sees of one day's
//! calendar record. Its attribute view is always the same ordered key set,
//! whatever the remote API returned: missing scalars get defaults and the two
//! variable-length lists are expanded into fixed-name slots.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Number;

/// Number of `vacation_NN` slots in every snapshot.
pub const VACATION_SLOTS: usize = 7;

/// Number of `remark_NN` slots in every snapshot.
pub const REMARK_SLOTS: usize = 4;

/// Attribute names of the vacation slots, in order.
pub const VACATION_KEYS: [&str; VACATION_SLOTS] = [
    "vacation_01",
    "vacation_02",
    "vacation_03",
    "vacation_04",
    "vacation_05",
    "vacation_06",
    "vacation_07",
];

/// Attribute names of the remark slots, in order.
pub const REMARK_KEYS: [&str; REMARK_SLOTS] = ["remark_01", "remark_02", "remark_03", "remark_04"];

/// The full attribute key set of a snapshot, in display order.
pub const ATTRIBUTE_KEYS: [&str; 19 + VACATION_SLOTS + REMARK_SLOTS] = [
    "date",
    "daycode",
    "day_type",
    "weekday",
    "weekday_cn",
    "lunar_year",
    "lunar_month",
    "lunar_day",
    "info",
    "start",
    "now",
    "end",
    "holiday",
    "name",
    "name_en",
    "isnotwork",
    "wage",
    "tip",
    "rest",
    "vacation_01",
    "vacation_02",
    "vacation_03",
    "vacation_04",
    "vacation_05",
    "vacation_06",
    "vacation_07",
    "remark_01",
    "remark_02",
    "remark_03",
    "remark_04",
];

/// Classification of a calendar day, keyed by the API's numeric daycode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayType {
    /// Ordinary working day (code 0).
    Workday,
    /// Public holiday (code 1).
    Holiday,
    /// Regular weekend day (code 2).
    Weekend,
    /// Weekend day turned into a working day to compensate a holiday (code 3).
    ShiftedWorkday,
}

impl DayType {
    /// Looks up a daycode. Codes outside the table return `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Workday),
            1 => Some(Self::Holiday),
            2 => Some(Self::Weekend),
            3 => Some(Self::ShiftedWorkday),
            _ => None,
        }
    }

    /// Returns the API daycode for this day type.
    pub fn code(&self) -> i64 {
        match self {
            Self::Workday => 0,
            Self::Holiday => 1,
            Self::Weekend => 2,
            Self::ShiftedWorkday => 3,
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Workday => "workday",
            Self::Holiday => "holiday",
            Self::Weekend => "weekend",
            Self::ShiftedWorkday => "shifted workday",
        }
    }

    /// Returns the label for a raw daycode, or an empty string for unknown codes.
    pub fn label_for_code(code: i64) -> &'static str {
        Self::from_code(code).map(|d| d.label()).unwrap_or("")
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single attribute value.
///
/// The remote API mixes numbers, flags and strings, and absent numeric fields
/// are sometimes reported as an empty string, so every shape is kept as sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    /// Integer value.
    Integer(i64),
    /// Fractional value, e.g. a `1.5` wage multiplier.
    Float(Number),
    /// Boolean flag.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl AttributeValue {
    /// Returns an empty text value.
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Returns the integer value, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Creates a fractional value; `None` for NaN or infinity.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Float)
    }

    /// Returns the text value, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => v.serialize(serializer),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// An ordered, flat key/value attribute mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap(Vec<(&'static str, AttributeValue)>);

impl AttributeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. Keys are expected to be unique.
    pub fn push(&mut self, key: &'static str, value: impl Into<AttributeValue>) {
        self.0.push((key, value.into()));
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Iterates over the attributes in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One day's holiday record, flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSnapshot {
    /// Calendar date, as reported by the API.
    pub date: String,
    /// Raw daycode, or empty text when the API omitted it.
    pub daycode: AttributeValue,
    /// Label derived from the daycode.
    pub day_type: String,
    /// Numeric weekday, or empty text when the API omitted it.
    pub weekday: AttributeValue,
    /// Localized weekday name.
    pub weekday_cn: String,
    pub lunar_year: String,
    pub lunar_month: String,
    pub lunar_day: String,
    /// Free-text description of the day.
    pub info: String,
    pub start: AttributeValue,
    pub now: AttributeValue,
    pub end: AttributeValue,
    /// Holiday date string.
    pub holiday: String,
    /// Holiday name.
    pub name: String,
    /// Holiday name in English.
    pub name_en: String,
    /// Non-workday flag (1 when unknown).
    pub isnotwork: AttributeValue,
    /// Wage multiplier.
    pub wage: AttributeValue,
    pub tip: String,
    pub rest: String,
    /// Vacation dates, one per slot.
    pub vacation: [String; VACATION_SLOTS],
    /// Remarks, one per slot.
    pub remark: [String; REMARK_SLOTS],
}

impl NormalizedSnapshot {
    /// The primary state value: the day-type label.
    pub fn state(&self) -> &str {
        &self.day_type
    }

    /// Returns the full attribute mapping in [`ATTRIBUTE_KEYS`] order.
    pub fn attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap(Vec::with_capacity(ATTRIBUTE_KEYS.len() + 1));
        attrs.push("date", self.date.as_str());
        attrs.push("daycode", self.daycode.clone());
        attrs.push("day_type", self.day_type.as_str());
        attrs.push("weekday", self.weekday.clone());
        attrs.push("weekday_cn", self.weekday_cn.as_str());
        attrs.push("lunar_year", self.lunar_year.as_str());
        attrs.push("lunar_month", self.lunar_month.as_str());
        attrs.push("lunar_day", self.lunar_day.as_str());
        attrs.push("info", self.info.as_str());
        attrs.push("start", self.start.clone());
        attrs.push("now", self.now.clone());
        attrs.push("end", self.end.clone());
        attrs.push("holiday", self.holiday.as_str());
        attrs.push("name", self.name.as_str());
        attrs.push("name_en", self.name_en.as_str());
        attrs.push("isnotwork", self.isnotwork.clone());
        attrs.push("wage", self.wage.clone());
        attrs.push("tip", self.tip.as_str());
        attrs.push("rest", self.rest.as_str());
        for (key, value) in VACATION_KEYS.iter().zip(&self.vacation) {
            attrs.push(*key, value.as_str());
        }
        for (key, value) in REMARK_KEYS.iter().zip(&self.remark) {
            attrs.push(*key, value.as_str());
        }
        attrs
    }
}

impl Serialize for NormalizedSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedSnapshot {
        NormalizedSnapshot {
            date: "2024-10-01".to_string(),
            daycode: AttributeValue::Integer(1),
            day_type: "holiday".to_string(),
            weekday: AttributeValue::Integer(2),
            weekday_cn: "星期二".to_string(),
            lunar_year: "甲辰".to_string(),
            lunar_month: "八月".to_string(),
            lunar_day: "廿九".to_string(),
            info: "节假日".to_string(),
            start: AttributeValue::Integer(0),
            now: AttributeValue::Integer(0),
            end: AttributeValue::Integer(6),
            holiday: "10月1日".to_string(),
            name: "国庆节".to_string(),
            name_en: "National Day".to_string(),
            isnotwork: AttributeValue::Integer(1),
            wage: AttributeValue::Integer(3),
            tip: String::new(),
            rest: String::new(),
            vacation: std::array::from_fn(|i| format!("2024-10-0{}", i + 1)),
            remark: [
                "2024-09-29".to_string(),
                "2024-10-12".to_string(),
                String::new(),
                String::new(),
            ],
        }
    }

    #[test]
    fn day_type_table() {
        assert_eq!(DayType::label_for_code(0), "workday");
        assert_eq!(DayType::label_for_code(1), "holiday");
        assert_eq!(DayType::label_for_code(2), "weekend");
        assert_eq!(DayType::label_for_code(3), "shifted workday");
    }

    #[test]
    fn day_type_unknown_codes_have_empty_label() {
        assert_eq!(DayType::from_code(4), None);
        assert_eq!(DayType::label_for_code(99), "");
        assert_eq!(DayType::label_for_code(-1), "");
        assert_eq!(DayType::label_for_code(i64::MAX), "");
    }

    #[test]
    fn day_type_code_roundtrip() {
        for day in [
            DayType::Workday,
            DayType::Holiday,
            DayType::Weekend,
            DayType::ShiftedWorkday,
        ] {
            assert_eq!(DayType::from_code(day.code()), Some(day));
        }
        assert_eq!(DayType::ShiftedWorkday.to_string(), "shifted workday");
    }

    #[test]
    fn attributes_follow_schema_order() {
        let attrs = sample().attributes();
        let keys: Vec<_> = attrs.keys().collect();
        assert_eq!(keys, ATTRIBUTE_KEYS.to_vec());
    }

    #[test]
    fn attribute_lookup() {
        let attrs = sample().attributes();
        assert_eq!(attrs.get("name_en"), Some(&AttributeValue::from("National Day")));
        assert_eq!(attrs.get("wage").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(attrs.get("vacation_07").and_then(|v| v.as_str()), Some("2024-10-07"));
        assert_eq!(attrs.get("remark_03").and_then(|v| v.as_str()), Some(""));
        assert!(attrs.get("update_time").is_none());
    }

    #[test]
    fn serializes_as_flat_object() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), ATTRIBUTE_KEYS.len());
        assert_eq!(obj["day_type"], "holiday");
        assert_eq!(obj["daycode"], 1);
        assert_eq!(obj["remark_02"], "2024-10-12");
    }

    #[test]
    fn serialization_keeps_key_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let date_pos = json.find("\"date\"").unwrap();
        let rest_pos = json.find("\"rest\"").unwrap();
        let remark_pos = json.find("\"remark_04\"").unwrap();
        assert!(date_pos < rest_pos && rest_pos < remark_pos);
    }

    #[test]
    fn attribute_value_display() {
        assert_eq!(AttributeValue::Integer(42).to_string(), "42");
        assert_eq!(AttributeValue::from("x").to_string(), "x");
        assert_eq!(AttributeValue::default(), AttributeValue::empty());
        assert_eq!(AttributeValue::float(1.5).unwrap().to_string(), "1.5");
        assert_eq!(AttributeValue::from(true).to_string(), "true");
    }

    #[test]
    fn float_and_bool_serialize_as_json_scalars() {
        let wage = AttributeValue::float(1.5).unwrap();
        assert_eq!(serde_json::to_value(&wage).unwrap(), serde_json::json!(1.5));
        assert_eq!(
            serde_json::to_value(AttributeValue::Bool(true)).unwrap(),
            serde_json::json!(true)
        );
        assert!(AttributeValue::float(f64::NAN).is_none());
        assert_eq!(wage.as_i64(), None);
        assert_eq!(wage.as_str(), None);
    }
}
