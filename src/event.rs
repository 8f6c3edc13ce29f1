use crate::{selector, timestamp::TimestampSource};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

/// Anything which has a point in time.
///
/// `None` means the timestamp is missing or unparseable: such items are never selected.
pub trait Dated {
    /// Returns the item's timestamp.
    fn occurs_at(&self) -> Option<DateTime<Utc>>;
}

impl<T: TimeZone> Dated for DateTime<T> {
    #[inline]
    fn occurs_at(&self) -> Option<DateTime<Utc>> {
        Some(self.with_timezone(&Utc))
    }
}

impl<T: Dated> Dated for Option<T> {
    #[inline]
    fn occurs_at(&self) -> Option<DateTime<Utc>> {
        self.as_ref()?.occurs_at()
    }
}

/// Single dated record of the schedule, i.e. a race.
///
/// Keeps all attributes of the source record as is.
/// Timestamp is resolved once, when the event is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    attributes: Map<String, Value>,
    timestamp: Option<DateTime<Utc>>,
}

impl Event {
    /// Builds an event from the JSON `record`, extracting its timestamp as described by `source`.
    pub fn from_record(record: Map<String, Value>, source: &TimestampSource) -> Self {
        let timestamp = source.extract(&record);
        Self {
            attributes: record,
            timestamp,
        }
    }

    /// Returns all the event's attributes.
    #[inline]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Returns a single attribute.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns a string attribute.
    #[inline]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    /// Consumes the event and returns its attributes.
    #[inline]
    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }
}

impl Dated for Event {
    #[inline]
    fn occurs_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

/// Ordered sequence of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCollection {
    events: Vec<Event>,
}

impl EventCollection {
    /// Builds a collection from JSON records.
    ///
    /// Every record which isn't a JSON object is dropped.
    pub fn from_records(records: impl IntoIterator<Item = Value>, source: &TimestampSource) -> Self {
        let events = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match record {
                Value::Object(record) => {
                    let event = Event::from_record(record, source);
                    if event.timestamp.is_none() {
                        debug!(index, field = source.field(), "event has no valid timestamp");
                    }
                    Some(event)
                }
                _ => {
                    debug!(index, "skipping non-object record");
                    None
                }
            })
            .collect();

        Self { events }
    }

    /// Returns the events in their original order.
    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if collection has no events.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the events in their original order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Returns the nearest event strictly after `reference`, see [`select_next`](selector::select_next).
    #[inline]
    pub fn next_after<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Option<&Event> {
        selector::select_next(&self.events, reference)
    }

    /// Returns the latest event within `window` before `reference`, see [`select_recent`](selector::select_recent).
    #[inline]
    pub fn recent_within<Tz: TimeZone>(&self, reference: &DateTime<Tz>, window: TimeDelta) -> Option<&Event> {
        selector::select_recent(&self.events, reference, window)
    }

    /// Returns all events strictly after `reference`, earliest first, see [`upcoming`](selector::upcoming).
    #[inline]
    pub fn upcoming_after<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Vec<&Event> {
        selector::upcoming(&self.events, reference)
    }
}

impl From<Vec<Event>> for EventCollection {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl FromIterator<Event> for EventCollection {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventCollection {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
