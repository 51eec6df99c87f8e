//! Core aggregate and domain event traits.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::store::EventRecord;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for the audit log and for filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates whose state changes are expressed as events.
///
/// Command methods validate against the current state and return events;
/// `apply` folds an event into the state. The store persists the resulting
/// state together with the events, in one unit of work.
pub trait Aggregate: Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier as a UUID.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the number of events applied so far.
    fn version(&self) -> u64;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Applies events and returns their audit log records.
    fn record(&mut self, events: Vec<Self::Event>) -> Result<Vec<EventRecord>, serde_json::Error> {
        let records = event_records(
            Self::aggregate_type(),
            self.aggregate_id(),
            self.version(),
            &events,
        )?;
        self.apply_events(events);
        Ok(records)
    }
}

/// Builds audit log records for events about to be applied.
///
/// Versions continue from `current_version`, so the first record carries
/// `current_version + 1`.
pub fn event_records<E: DomainEvent>(
    aggregate_type: &str,
    aggregate_id: Uuid,
    current_version: u64,
    events: &[E],
) -> Result<Vec<EventRecord>, serde_json::Error> {
    let recorded_at = Utc::now();
    events
        .iter()
        .enumerate()
        .map(|(offset, event)| {
            Ok(EventRecord {
                aggregate_id,
                aggregate_type: aggregate_type.to_string(),
                event_type: event.event_type().to_string(),
                version: current_version + offset as u64 + 1,
                payload: serde_json::to_value(event)?,
                recorded_at,
            })
        })
        .collect()
}
