//! Raw per-day record as returned by the holiday API.
//!
//! Every field is optional: the API omits fields freely and the normalizer
//! supplies defaults. Field names match the API's JSON keys.

use serde::{Deserialize, Deserializer, Serialize};
use tianholiday_core::AttributeValue;

/// One day's record from the `result.list` array of the API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHolidayRecord {
    /// Calendar date (`YYYY-MM-DD`).
    pub date: Option<String>,
    /// Day classification code (0 workday, 1 holiday, 2 weekend, 3 shifted workday).
    #[serde(deserialize_with = "scalar")]
    pub daycode: Option<AttributeValue>,
    /// Numeric weekday.
    #[serde(deserialize_with = "scalar")]
    pub weekday: Option<AttributeValue>,
    /// Localized weekday name.
    pub cnweekday: Option<String>,
    pub lunaryear: Option<String>,
    pub lunarmonth: Option<String>,
    pub lunarday: Option<String>,
    pub info: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub start: Option<AttributeValue>,
    #[serde(deserialize_with = "scalar")]
    pub now: Option<AttributeValue>,
    #[serde(deserialize_with = "scalar")]
    pub end: Option<AttributeValue>,
    pub holiday: Option<String>,
    pub name: Option<String>,
    pub enname: Option<String>,
    /// Non-workday flag.
    #[serde(deserialize_with = "scalar")]
    pub isnotwork: Option<AttributeValue>,
    /// Wage multiplier.
    #[serde(deserialize_with = "scalar")]
    pub wage: Option<AttributeValue>,
    pub tip: Option<String>,
    pub rest: Option<String>,
    /// Vacation dates. Accepts a JSON array or a `|`-joined string.
    #[serde(deserialize_with = "string_list")]
    pub vacation: Option<Vec<String>>,
    /// Remarks. Accepts a JSON array or a `|`-joined string.
    #[serde(deserialize_with = "string_list")]
    pub remark: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Number, flag or text passthrough; `null` and absence both map to `None`.
fn scalar<'de, D>(deserializer: D) -> Result<Option<AttributeValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
            Scalar::Integer(v) => AttributeValue::Integer(v),
            Scalar::Float(v) => AttributeValue::float(v)
                .unwrap_or_else(|| AttributeValue::Text(v.to_string())),
            Scalar::Bool(v) => AttributeValue::Bool(v),
            Scalar::Text(s) => AttributeValue::Text(s),
        }),
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrJoined {
    List(Vec<String>),
    Joined(String),
}

fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<ListOrJoined>::deserialize(deserializer)?.map(|value| match value {
            ListOrJoined::List(items) => items,
            ListOrJoined::Joined(joined) => split_joined(&joined),
        }),
    )
}

fn split_joined(joined: &str) -> Vec<String> {
    if joined.trim().is_empty() {
        return Vec::new();
    }
    joined.split('|').map(|part| part.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_record() {
        let json = r#"{
            "date": "2024-10-01",
            "daycode": 1,
            "weekday": 2,
            "cnweekday": "星期二",
            "lunaryear": "甲辰",
            "lunarmonth": "八月",
            "lunarday": "廿九",
            "info": "节假日",
            "start": 0,
            "now": 0,
            "end": 6,
            "holiday": "10月1日",
            "name": "国庆节",
            "enname": "National Day",
            "isnotwork": 1,
            "vacation": ["2024-10-01", "2024-10-02", "2024-10-03"],
            "remark": ["2024-09-29", "2024-10-12"],
            "wage": 3,
            "tip": "10月1日至7日放假调休，共7天。",
            "rest": "2024年10月8日至10月11日请假4天，与周末连休可拼16天长假。"
        }"#;

        let record: RawHolidayRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.date.as_deref(), Some("2024-10-01"));
        assert_eq!(record.daycode, Some(AttributeValue::Integer(1)));
        assert_eq!(record.enname.as_deref(), Some("National Day"));
        assert_eq!(record.vacation.as_ref().map(Vec::len), Some(3));
        assert_eq!(record.remark.as_ref().unwrap()[1], "2024-10-12");
        assert_eq!(record.wage, Some(AttributeValue::Integer(3)));
    }

    #[test]
    fn parse_sparse_record() {
        let record: RawHolidayRecord =
            serde_json::from_str(r#"{"daycode": 0, "vacation": null}"#).unwrap();
        assert_eq!(record.daycode, Some(AttributeValue::Integer(0)));
        assert!(record.vacation.is_none());
        assert!(record.remark.is_none());
        assert!(record.date.is_none());
        assert!(record.isnotwork.is_none());
    }

    #[test]
    fn parse_empty_object() {
        let record: RawHolidayRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, RawHolidayRecord::default());
    }

    #[test]
    fn joined_lists_are_split() {
        let json = r#"{
            "vacation": "2024-10-01|2024-10-02|2024-10-03",
            "remark": ""
        }"#;
        let record: RawHolidayRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.vacation.unwrap(),
            vec!["2024-10-01", "2024-10-02", "2024-10-03"]
        );
        assert_eq!(record.remark, Some(Vec::new()));
    }

    #[test]
    fn text_scalars_pass_through() {
        let record: RawHolidayRecord =
            serde_json::from_str(r#"{"wage": "3", "weekday": ""}"#).unwrap();
        assert_eq!(record.wage, Some(AttributeValue::from("3")));
        assert_eq!(record.weekday, Some(AttributeValue::empty()));
    }

    #[test]
    fn fractional_and_boolean_scalars_keep_their_type() {
        let record: RawHolidayRecord =
            serde_json::from_str(r#"{"isnotwork": true, "wage": 1.5, "start": false}"#).unwrap();
        assert_eq!(record.isnotwork, Some(AttributeValue::Bool(true)));
        assert_eq!(record.wage, AttributeValue::float(1.5));
        assert_eq!(record.start, Some(AttributeValue::Bool(false)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let record: RawHolidayRecord =
            serde_json::from_str(r#"{"daycode": 2, "lunar": "x", "extra": [1, 2]}"#).unwrap();
        assert_eq!(record.daycode, Some(AttributeValue::Integer(2)));
    }
}
