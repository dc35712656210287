//! Assertions on dispatched events.
//!
//! Requires a collector that traces the site's event dispatcher (for
//! example the webprofiler module). Every assertion takes a list of event
//! names; a single event is a one-element slice.

use std::collections::BTreeMap;

use crate::result::{ProbeError, ProbeResult};

/// Event name mapped to what handled it
pub type EventData = BTreeMap<String, Vec<String>>;

/// Source of traced event data
pub trait EventCollector {
    /// Dispatched events and the listeners that were called for each
    fn called_listeners(&self) -> ProbeResult<EventData>;

    /// Dispatched events that had no listener
    fn orphaned_events(&self) -> ProbeResult<EventData>;
}

fn was_triggered(data: &EventData, event: &str) -> bool {
    data.get(event).is_some_and(|calls| !calls.is_empty())
}

fn assert_triggered(data: &EventData, expected: &[&str]) -> ProbeResult<()> {
    if data.is_empty() {
        return Err(ProbeError::assertion("No event was triggered"));
    }
    match expected.iter().find(|event| !was_triggered(data, event)) {
        Some(event) => Err(ProbeError::assertion(format!("The '{event}' event did not trigger"))),
        None => Ok(()),
    }
}

fn assert_not_triggered(data: &EventData, expected: &[&str]) -> ProbeResult<()> {
    match expected.iter().find(|event| was_triggered(data, event)) {
        Some(event) => Err(ProbeError::assertion(format!("The '{event}' event triggered"))),
        None => Ok(()),
    }
}

/// Event assertions, available on every [`EventCollector`]
pub trait EventAssertions: EventCollector {
    /// Every `expected` event had at least one listener called
    fn see_event_triggered(&self, expected: &[&str]) -> ProbeResult<()> {
        assert_triggered(&self.called_listeners()?, expected)
    }

    /// None of the `expected` events had a listener called
    fn dont_see_event_triggered(&self, expected: &[&str]) -> ProbeResult<()> {
        assert_not_triggered(&self.called_listeners()?, expected)
    }

    /// Every `expected` event was dispatched without listeners
    fn see_orphan_event(&self, expected: &[&str]) -> ProbeResult<()> {
        assert_triggered(&self.orphaned_events()?, expected)
    }

    /// With `None`, no event at all was orphaned; otherwise none of the
    /// listed ones was
    fn dont_see_orphan_event(&self, expected: Option<&[&str]>) -> ProbeResult<()> {
        let data = self.orphaned_events()?;
        match expected {
            Some(expected) => assert_not_triggered(&data, expected),
            None if data.is_empty() => Ok(()),
            None => Err(ProbeError::assertion(format!(
                "Expected no orphan events, found {}: {}",
                data.len(),
                data.keys().cloned().collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

impl<T: EventCollector + ?Sized> EventAssertions for T {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::RecordingCollector;

    fn collector() -> RecordingCollector {
        let mut collector = RecordingCollector::new();
        collector.listener("kernel.request", "RouterListener::onKernelRequest");
        collector.listener("kernel.response", "FinishResponseSubscriber::onRespond");
        collector.orphan("custom.unheard");
        collector
    }

    mod triggered_tests {
        use super::*;

        #[test]
        fn test_see_event_triggered() {
            let collector = collector();
            collector.see_event_triggered(&["kernel.request"]).unwrap();
            collector
                .see_event_triggered(&["kernel.request", "kernel.response"])
                .unwrap();
        }

        #[test]
        fn test_see_event_triggered_reports_missing_event() {
            let err = collector().see_event_triggered(&["kernel.terminate"]).unwrap_err();
            assert!(err.to_string().contains("The 'kernel.terminate' event did not trigger"));
        }

        #[test]
        fn test_no_events_at_all() {
            let err = RecordingCollector::new().see_event_triggered(&["kernel.request"]).unwrap_err();
            assert!(err.to_string().contains("No event was triggered"));
        }

        #[test]
        fn test_dont_see_event_triggered() {
            let collector = collector();
            collector.dont_see_event_triggered(&["kernel.terminate"]).unwrap();
            let err = collector.dont_see_event_triggered(&["kernel.request"]).unwrap_err();
            assert!(err.to_string().contains("The 'kernel.request' event triggered"));
        }

        #[test]
        fn test_event_without_listeners_does_not_count() {
            let mut collector = collector();
            collector.listeners.insert("kernel.view".to_string(), Vec::new());
            assert!(collector.see_event_triggered(&["kernel.view"]).is_err());
        }
    }

    mod orphan_tests {
        use super::*;

        #[test]
        fn test_see_orphan_event() {
            collector().see_orphan_event(&["custom.unheard"]).unwrap();
            assert!(collector().see_orphan_event(&["kernel.request"]).is_err());
        }

        #[test]
        fn test_dont_see_any_orphan_event() {
            assert!(RecordingCollector::new().dont_see_orphan_event(None).is_ok());
            let err = collector().dont_see_orphan_event(None).unwrap_err();
            assert!(err.to_string().contains("custom.unheard"));
        }

        #[test]
        fn test_dont_see_listed_orphan_event() {
            let collector = collector();
            collector.dont_see_orphan_event(Some(&["other.event"][..])).unwrap();
            assert!(collector.dont_see_orphan_event(Some(&["custom.unheard"][..])).is_err());
        }
    }
}
