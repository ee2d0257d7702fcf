//! Journey bookkeeping for a single train: state, route plan, lock progress.
//!
//! Everything here is plain data with no messaging, so the train actor's
//! decisions can be exercised without a runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::TrackGraph;
use crate::ids::ComponentId;
use crate::location::{Direction, Location};

/// Train lifecycle.
///
/// ```text
/// Idle ─▶ SeekingPath ─▶ LockingPath ─▶ Moving ─▶ Idle
///            │   ▲           │  ▲          │
///            ▼   │           ▼  │          │ (via station)
///          Idle  │     WaitingForPath      │
///                └─────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrainState {
    #[default]
    Idle,
    SeekingPath,
    LockingPath,
    WaitingForPath,
    Moving,
}

impl fmt::Display for TrainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainState::Idle => "Idle",
            TrainState::SeekingPath => "SeekingPath",
            TrainState::LockingPath => "LockingPath",
            TrainState::WaitingForPath => "WaitingForPath",
            TrainState::Moving => "Moving",
        };
        f.write_str(name)
    }
}

/// The expected route of one leg plus the points the train steps through.
///
/// `points[0]` is where the leg starts. Step `k` moves the train from
/// `points[k]` to `points[k + 1]` while occupying `route[k]`; once the route
/// is exhausted the last component carries any remaining step.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyPlan {
    route: Vec<ComponentId>,
    points: Vec<Location>,
    direction: Direction,
    destination: Location,
    step: usize,
}

impl JourneyPlan {
    pub fn new(
        graph: &TrackGraph,
        origin: Location,
        route: Vec<ComponentId>,
        direction: Direction,
        destination: Location,
    ) -> Self {
        let points = generate_intermediate_points(graph, origin, &route, direction, destination);
        Self {
            route,
            points,
            direction,
            destination,
            step: 0,
        }
    }

    pub fn route(&self) -> &[ComponentId] {
        &self.route
    }

    pub fn points(&self) -> &[Location] {
        &self.points
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn destination(&self) -> Location {
        self.destination
    }

    /// The component the next step moves through.
    pub fn current_component(&self) -> Option<ComponentId> {
        if self.is_complete() {
            return None;
        }
        self.route.get(self.step).or(self.route.last()).copied()
    }

    /// Where the next step ends.
    pub fn next_point(&self) -> Option<Location> {
        self.points.get(self.step + 1).copied()
    }

    /// Record that the train reached the end of the current step.
    ///
    /// Returns the component left behind, if any. The last route component
    /// is never left here; it is released on arrival.
    pub fn complete_step(&mut self) -> Option<ComponentId> {
        let left = if self.step + 1 < self.route.len() {
            Some(self.route[self.step])
        } else {
            None
        };
        self.step += 1;
        left
    }

    pub fn is_complete(&self) -> bool {
        self.step + 1 >= self.points.len()
    }
}

/// Origin, then the exit of each component walking from `origin`,
/// always ending at `destination`.
///
/// A segment is left by the endpoint opposite the one the train entered
/// at, so the points follow the route whichever way a segment is stored.
pub fn generate_intermediate_points(
    graph: &TrackGraph,
    origin: Location,
    route: &[ComponentId],
    direction: Direction,
    destination: Location,
) -> Vec<Location> {
    let mut points = vec![origin];
    let mut entry = origin;

    for component in route {
        if let Some(exit) = graph.exit_point(*component, &entry, direction) {
            points.push(exit);
            entry = exit;
        }
    }

    if points.last() != Some(&destination) {
        points.push(destination);
    }
    points
}

/// What to do after a lock is denied.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    /// Ask the same component again after the short retry delay.
    Retry { attempt: u32 },
    /// Give up this pass: release everything and start over after backoff.
    Restart { release: Vec<ComponentId> },
}

/// Progress through one all-or-nothing locking pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockProgress {
    index: usize,
    denials: u32,
    held: Vec<ComponentId>,
}

impl LockProgress {
    /// The component to request next, or `None` once every one is held.
    pub fn target(&self, route: &[ComponentId]) -> Option<ComponentId> {
        route.get(self.index).copied()
    }

    pub fn held(&self) -> &[ComponentId] {
        &self.held
    }

    /// Record a grant. Returns `true` when the whole route is now held.
    pub fn granted(&mut self, component: ComponentId, route: &[ComponentId]) -> bool {
        self.held.push(component);
        self.index += 1;
        self.denials = 0;
        self.index >= route.len()
    }

    /// Record a denial of the current target.
    pub fn denied(&mut self, retry_limit: u32) -> LockOutcome {
        self.denials += 1;
        if self.denials < retry_limit {
            return LockOutcome::Retry {
                attempt: self.denials,
            };
        }

        let release = std::mem::take(&mut self.held);
        *self = LockProgress::default();
        LockOutcome::Restart { release }
    }

    /// Forget a component the train has moved off.
    pub fn leave(&mut self, component: ComponentId) {
        self.held.retain(|held| *held != component);
    }

    /// Hand over every held component, leaving the progress empty.
    pub fn take_held(&mut self) -> Vec<ComponentId> {
        std::mem::take(self).held
    }
}
