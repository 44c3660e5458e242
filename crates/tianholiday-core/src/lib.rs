//! Core types: day classification, normalized snapshots, tracing

pub mod snapshot;
pub mod tracing;

pub use snapshot::{
    ATTRIBUTE_KEYS, AttributeMap, AttributeValue, DayType, NormalizedSnapshot, REMARK_KEYS,
    REMARK_SLOTS, VACATION_KEYS, VACATION_SLOTS,
};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
