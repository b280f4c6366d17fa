//! Turning caller events into stamped [`EventRecord`]s.

use rum_types::{Attributes, EventRecord, IdAllocator, RawEvent, SessionContext};

use crate::error::{ReportError, Result};

/// Outcome of building a batch, including how many entries were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub events: Vec<EventRecord>,
    /// Entries missing a name or attributes.
    pub skipped: usize,
}

/// Stamps events with session identity, timestamps, and fresh ids.
///
/// Owns the client's [`IdAllocator`] and [`SessionContext`].
#[derive(Debug)]
pub struct EventPayloadBuilder {
    ids: IdAllocator,
    session: SessionContext,
    source_tag: String,
}

impl EventPayloadBuilder {
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self {
            ids: IdAllocator::new(),
            session: SessionContext::new(),
            source_tag: source_tag.into(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    /// Build one record. Attributes pass through untouched.
    pub fn build_event(&self, name: impl Into<String>, attrs: Attributes) -> EventRecord {
        let (session_id, reporting_id) = self.session.resolve(&self.ids);
        EventRecord {
            name: name.into(),
            session_id,
            reporting_id,
            timestamp_seconds: rum_types::now_secs(),
            event_id: self.ids.next_id(),
            source_tag: self.source_tag.clone(),
            attributes: attrs,
        }
    }

    /// Build a batch, skipping incomplete entries.
    ///
    /// Fails with `InvalidArgument` if nothing is left to send.
    pub fn build_event_list(&self, raw: Vec<RawEvent>) -> Result<Vec<EventRecord>> {
        self.build_event_list_with_report(raw).map(|report| report.events)
    }

    /// Like [`build_event_list`](Self::build_event_list), also counting drops.
    pub fn build_event_list_with_report(&self, raw: Vec<RawEvent>) -> Result<BuildReport> {
        let total = raw.len();
        let events: Vec<EventRecord> = raw
            .into_iter()
            .filter_map(RawEvent::into_parts)
            .map(|(name, attrs)| self.build_event(name, attrs))
            .collect();

        let skipped = total - events.len();
        if skipped > 0 {
            tracing::warn!(skipped, total, "dropping events without a name or attributes");
        }
        if events.is_empty() {
            return Err(ReportError::invalid_argument("no valid events to send"));
        }
        Ok(BuildReport { events, skipped })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("aaa".into(), "bbb".into());
        attrs.insert("bbb".into(), 123.into());
        attrs
    }

    #[test]
    fn test_build_event_stamps_fields() {
        let builder = EventPayloadBuilder::new("rust");
        let before = rum_types::now_secs();
        let event = builder.build_event("error", attrs());

        assert_eq!(event.name, "error");
        assert_eq!(event.source_tag, "rust");
        assert_eq!(event.attributes, attrs());
        assert_ne!(event.session_id, 0);
        assert!(!event.reporting_id.is_empty());
        assert!(event.timestamp_seconds >= before);
    }

    #[test]
    fn test_session_reused_event_id_fresh() {
        let builder = EventPayloadBuilder::new("rust");
        let a = builder.build_event("x", attrs());
        let b = builder.build_event("x", attrs());

        assert_eq!(a.session_id, b.session_id);
        assert_eq!(a.reporting_id, b.reporting_id);
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_session_overrides_apply() {
        let builder = EventPayloadBuilder::new("rust");
        builder.session().set_session_id(123456);
        builder.session().set_reporting_id("ttttttt-rid");

        let event = builder.build_event("x", attrs());
        assert_eq!(event.session_id, 123456);
        assert_eq!(event.reporting_id, "ttttttt-rid");
    }

    #[test]
    fn test_build_event_list_preserves_order() {
        let builder = EventPayloadBuilder::new("rust");
        let events = builder
            .build_event_list(vec![
                RawEvent::new("first", attrs()),
                RawEvent::new("second", attrs()),
            ])
            .unwrap();

        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn test_empty_list_rejected() {
        let builder = EventPayloadBuilder::new("rust");
        let err = builder.build_event_list(vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_only_incomplete_entries_rejected() {
        let builder = EventPayloadBuilder::new("rust");
        let err = builder
            .build_event_list(vec![RawEvent { ev: Some("x".into()), attrs: None }])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_incomplete_entries_skipped_and_counted() {
        let builder = EventPayloadBuilder::new("rust");
        let report = builder
            .build_event_list_with_report(vec![
                RawEvent { ev: None, attrs: Some(attrs()) },
                RawEvent::new("kept", attrs()),
                RawEvent { ev: Some("x".into()), attrs: None },
            ])
            .unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].name, "kept");
    }
}
