use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every monitor lifecycle step and every busy/idle transition produces an Event.
/// Only `GenerationFinished` leads to a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    MonitorStarted {
        at: DateTime<Utc>,
    },
    /// Idle -> busy edge.
    GenerationStarted {
        at: DateTime<Utc>,
    },
    /// Busy -> idle edge. `duration_secs` is 0 when the start was never seen.
    GenerationFinished {
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    MonitorStopped {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Duration of the finished generation, if this is a finish event.
    pub fn finished_duration(&self) -> Option<f64> {
        match self {
            Event::GenerationFinished { duration_secs, .. } => Some(*duration_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_event_serializes_with_type_tag() {
        let event = Event::GenerationFinished {
            duration_secs: 3.5,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "GenerationFinished");
        assert_eq!(json["duration_secs"], 3.5);
        assert_eq!(event.finished_duration(), Some(3.5));
    }

    #[test]
    fn test_only_finish_carries_duration() {
        let event = Event::GenerationStarted { at: Utc::now() };
        assert_eq!(event.finished_duration(), None);
    }
}
