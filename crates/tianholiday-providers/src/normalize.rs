//! Conversion from a raw API record to a [`NormalizedSnapshot`].
//!
//! Normalization never fails: absent text becomes `""`, absent numbers take
//! their documented defaults, and the vacation/remark lists are spread over
//! fixed slots.

use tianholiday_core::{
    AttributeValue, DayType, NormalizedSnapshot, REMARK_SLOTS, VACATION_SLOTS,
};

use crate::raw_record::RawHolidayRecord;

/// Builds the flattened snapshot for one raw record.
///
/// Defaults for absent fields:
/// - text fields, `daycode`, `weekday`: empty text
/// - `start`, `now`, `end`, `wage`: `0`
/// - `isnotwork`: `1`
/// - `day_type`: `"workday"` when `daycode` is absent, `""` for unknown or
///   non-integer codes
pub fn normalize_record(record: &RawHolidayRecord) -> NormalizedSnapshot {
    NormalizedSnapshot {
        date: text(&record.date),
        daycode: record.daycode.clone().unwrap_or_default(),
        day_type: day_type_label(record.daycode.as_ref()).to_string(),
        weekday: record.weekday.clone().unwrap_or_default(),
        weekday_cn: text(&record.cnweekday),
        lunar_year: text(&record.lunaryear),
        lunar_month: text(&record.lunarmonth),
        lunar_day: text(&record.lunarday),
        info: text(&record.info),
        start: number_or(&record.start, 0),
        now: number_or(&record.now, 0),
        end: number_or(&record.end, 0),
        holiday: text(&record.holiday),
        name: text(&record.name),
        name_en: text(&record.enname),
        isnotwork: number_or(&record.isnotwork, 1),
        wage: number_or(&record.wage, 0),
        tip: text(&record.tip),
        rest: text(&record.rest),
        vacation: expand_slots::<VACATION_SLOTS>(record.vacation.as_deref()),
        remark: expand_slots::<REMARK_SLOTS>(record.remark.as_deref()),
    }
}

fn day_type_label(daycode: Option<&AttributeValue>) -> &'static str {
    match daycode {
        None => DayType::Workday.label(),
        Some(AttributeValue::Integer(code)) => DayType::label_for_code(*code),
        Some(_) => "",
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number_or(value: &Option<AttributeValue>, default: i64) -> AttributeValue {
    value.clone().unwrap_or(AttributeValue::Integer(default))
}

/// Spreads `items` over `N` slots; missing slots are empty, extras dropped.
fn expand_slots<const N: usize>(items: Option<&[String]>) -> [String; N] {
    let items = items.unwrap_or_default();
    std::array::from_fn(|i| items.get(i).cloned().unwrap_or_default())
}
