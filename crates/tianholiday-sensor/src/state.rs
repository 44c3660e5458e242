//! Published sensor state.
//!
//! The worker publishes each successful snapshot into a `watch` channel;
//! readers get a cheap [`SensorView`] clone.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tianholiday_core::{AttributeMap, NormalizedSnapshot};
use tokio::sync::watch;

/// State reported before the first successful fetch.
pub const UNKNOWN_STATE: &str = "unknown";

/// Attribute key carrying the publish time.
pub const UPDATE_TIME_KEY: &str = "update_time";

/// Format of [`UPDATE_TIME_KEY`].
pub const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A snapshot together with the local time it was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSnapshot {
    pub snapshot: NormalizedSnapshot,
    pub updated_at: DateTime<Local>,
}

impl PublishedSnapshot {
    /// Stamps `snapshot` with the current local time.
    pub fn new(snapshot: NormalizedSnapshot) -> Self {
        Self::at(snapshot, Local::now())
    }

    /// Stamps `snapshot` with the given time.
    pub fn at(snapshot: NormalizedSnapshot, updated_at: DateTime<Local>) -> Self {
        Self {
            snapshot,
            updated_at,
        }
    }

    /// Formatted publish time.
    pub fn update_time(&self) -> String {
        self.updated_at.format(UPDATE_TIME_FORMAT).to_string()
    }
}

/// What readers see: the latest published snapshot, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorView {
    published: Option<Arc<PublishedSnapshot>>,
}

impl SensorView {
    /// Returns true once a snapshot has been published.
    pub fn has_data(&self) -> bool {
        self.published.is_some()
    }

    /// The primary state: the day-type label, or `"unknown"` before any data.
    pub fn state(&self) -> &str {
        self.published
            .as_ref()
            .map(|p| p.snapshot.state())
            .unwrap_or(UNKNOWN_STATE)
    }

    /// The full attribute mapping plus `update_time`; empty before any data.
    pub fn attributes(&self) -> AttributeMap {
        match &self.published {
            Some(published) => {
                let mut attrs = published.snapshot.attributes();
                attrs.push(UPDATE_TIME_KEY, published.update_time());
                attrs
            }
            None => AttributeMap::new(),
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Option<&NormalizedSnapshot> {
        self.published.as_ref().map(|p| &p.snapshot)
    }

    /// When the latest snapshot was published.
    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.published.as_ref().map(|p| p.updated_at)
    }
}

impl From<PublishedSnapshot> for SensorView {
    fn from(published: PublishedSnapshot) -> Self {
        Self {
            published: Some(Arc::new(published)),
        }
    }
}

impl Serialize for SensorView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("state", self.state())?;
        map.serialize_entry("attributes", &self.attributes())?;
        map.end()
    }
}

/// Write side of the view channel.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    tx: Arc<watch::Sender<SensorView>>,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    /// Creates a publisher holding an empty view.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SensorView::default());
        Self { tx: Arc::new(tx) }
    }

    /// Publishes `snapshot`, replacing the previous one.
    pub fn publish(&self, snapshot: NormalizedSnapshot) -> SensorView {
        let view = SensorView::from(PublishedSnapshot::new(snapshot));
        self.tx.send_replace(view.clone());
        view
    }

    /// Returns the current view.
    pub fn current(&self) -> SensorView {
        self.tx.borrow().clone()
    }

    /// Subscribes to view changes.
    pub fn subscribe(&self) -> watch::Receiver<SensorView> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tianholiday_core::{ATTRIBUTE_KEYS, AttributeValue};

    fn snapshot(day_type: &str) -> NormalizedSnapshot {
        NormalizedSnapshot {
            date: "2024-10-01".into(),
            daycode: AttributeValue::Integer(1),
            day_type: day_type.into(),
            weekday: AttributeValue::Integer(2),
            weekday_cn: String::new(),
            lunar_year: String::new(),
            lunar_month: String::new(),
            lunar_day: String::new(),
            info: String::new(),
            start: AttributeValue::Integer(0),
            now: AttributeValue::Integer(0),
            end: AttributeValue::Integer(0),
            holiday: String::new(),
            name: "National Day".into(),
            name_en: "National Day".into(),
            isnotwork: AttributeValue::Integer(1),
            wage: AttributeValue::Integer(3),
            tip: String::new(),
            rest: String::new(),
            vacation: Default::default(),
            remark: Default::default(),
        }
    }

    #[test]
    fn empty_view_is_unknown() {
        let view = SensorView::default();
        assert!(!view.has_data());
        assert_eq!(view.state(), UNKNOWN_STATE);
        assert!(view.attributes().is_empty());
        assert!(view.snapshot().is_none());
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            serde_json::json!({"state": "unknown", "attributes": {}})
        );
    }

    #[test]
    fn published_view_has_update_time() {
        let at = Local.with_ymd_and_hms(2024, 10, 1, 0, 1, 5).unwrap();
        let view = SensorView::from(PublishedSnapshot::at(snapshot("holiday"), at));

        assert_eq!(view.state(), "holiday");
        let attrs = view.attributes();
        assert_eq!(attrs.len(), ATTRIBUTE_KEYS.len() + 1);
        assert_eq!(
            attrs.get(UPDATE_TIME_KEY),
            Some(&AttributeValue::from("2024-10-01 00:01:05"))
        );
        assert_eq!(attrs.keys().last(), Some(UPDATE_TIME_KEY));
    }

    #[test]
    fn view_serializes_state_and_attributes() {
        let at = Local.with_ymd_and_hms(2024, 10, 1, 0, 1, 5).unwrap();
        let view = SensorView::from(PublishedSnapshot::at(snapshot("holiday"), at));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "holiday");
        assert_eq!(json["attributes"]["wage"], 3);
        assert_eq!(json["attributes"]["vacation_07"], "");
        assert_eq!(json["attributes"]["update_time"], "2024-10-01 00:01:05");
    }

    #[tokio::test]
    async fn publisher_notifies_subscribers() {
        let publisher = SnapshotPublisher::new();
        let mut rx = publisher.subscribe();
        assert_eq!(publisher.current().state(), UNKNOWN_STATE);

        publisher.publish(snapshot("weekend"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state(), "weekend");

        publisher.publish(snapshot("workday"));
        assert_eq!(publisher.current().state(), "workday");
    }

    #[test]
    fn publish_without_subscribers_is_kept() {
        let publisher = SnapshotPublisher::new();
        let view = publisher.publish(snapshot("holiday"));
        assert_eq!(view, publisher.current());
        assert!(publisher.current().updated_at().is_some());
    }
}
