//! Results of a simulation run.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use rail_kernel::{StationId, TrainEvent, TrainId, TrainState};
use serde::Serialize;

/// How one journey ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyOutcome {
    Completed,
    NoPath,
    /// Still underway when the run timed out
    Unfinished,
}

impl fmt::Display for JourneyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JourneyOutcome::Completed => "completed",
            JourneyOutcome::NoPath => "no path",
            JourneyOutcome::Unfinished => "unfinished",
        };
        f.write_str(name)
    }
}

/// Per-train summary.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyReport {
    pub train: TrainId,
    /// Human-readable request, e.g. `(0,0) to (10,0)`
    pub request: String,
    pub destination: StationId,
    pub outcome: JourneyOutcome,
    /// Every state the train passed through, in order
    pub states: Vec<TrainState>,
    /// Intermediate points reached
    pub moves: usize,
    /// Times the train had to wait for a denied lock
    pub waits: usize,
}

impl JourneyReport {
    pub fn new(train: TrainId, request: String, destination: StationId) -> Self {
        Self {
            train,
            request,
            destination,
            outcome: JourneyOutcome::Unfinished,
            states: Vec::new(),
            moves: 0,
            waits: 0,
        }
    }

    /// Fold one event into the summary. Returns `true` if it finished the journey.
    pub fn record(&mut self, event: &TrainEvent) -> bool {
        match event {
            TrainEvent::StateChanged { train, state } if *train == self.train => {
                if *state == TrainState::WaitingForPath {
                    self.waits += 1;
                }
                self.states.push(*state);
                false
            }
            TrainEvent::Moved { train, .. } if *train == self.train => {
                self.moves += 1;
                false
            }
            TrainEvent::JourneyComplete { train, .. } if *train == self.train => {
                self.outcome = JourneyOutcome::Completed;
                true
            }
            TrainEvent::NoPathFound { train, .. } if *train == self.train => {
                self.outcome = JourneyOutcome::NoPath;
                true
            }
            _ => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome != JourneyOutcome::Unfinished
    }
}

/// Whole-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub journeys: Vec<JourneyReport>,
    /// Components handed to a second train while still held
    pub violations: usize,
    /// Components still held when the run ended
    pub held_at_end: usize,
    /// Lock and release events seen by the ledger
    pub occupancy_changes: usize,
    pub elapsed_ms: u64,
    pub timed_out: bool,
}

impl RunReport {
    pub fn all_completed(&self) -> bool {
        self.journeys
            .iter()
            .all(|j| j.outcome == JourneyOutcome::Completed)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_kernel::Location;

    #[test]
    fn test_record_tracks_own_train_only() {
        let mut report = JourneyReport::new(TrainId(1), "a to b".into(), StationId(2));

        assert!(!report.record(&TrainEvent::StateChanged {
            train: TrainId(0),
            state: TrainState::Moving,
        }));
        assert!(!report.record(&TrainEvent::StateChanged {
            train: TrainId(1),
            state: TrainState::WaitingForPath,
        }));
        assert!(!report.record(&TrainEvent::Moved {
            train: TrainId(1),
            location: Location::new(1.0, 0.0),
        }));
        assert!(report.record(&TrainEvent::JourneyComplete {
            train: TrainId(1),
            destination: StationId(2),
        }));

        assert_eq!(report.states, vec![TrainState::WaitingForPath]);
        assert_eq!(report.waits, 1);
        assert_eq!(report.moves, 1);
        assert_eq!(report.outcome, JourneyOutcome::Completed);
        assert!(report.is_finished());
    }

    #[test]
    fn test_no_path_finishes_journey() {
        let mut report = JourneyReport::new(TrainId(0), "a to b".into(), StationId(1));
        assert!(report.record(&TrainEvent::NoPathFound {
            train: TrainId(0),
            destination: StationId(1),
        }));
        assert_eq!(report.outcome, JourneyOutcome::NoPath);
    }
}
