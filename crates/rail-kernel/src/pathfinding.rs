//! Depth-first route search over the track graph.
//!
//! The search is first-match, not shortest-path: neighbours are tried in
//! registration order and the first branch that reaches the destination
//! wins. Each recursive call gets its own copy of the visited set, so a
//! dead end explored in one branch never hides a component from a sibling
//! branch.
//!
//! Segments may be stored either way round. The search carries the point
//! each component is entered at and leaves a segment by its opposite
//! endpoint, so stored orientation never decides reachability.

use std::collections::HashSet;

use tracing::trace;

use crate::graph::TrackGraph;
use crate::ids::{ComponentId, SegmentId};
use crate::location::{Direction, Location};

impl TrackGraph {
    /// Search for a route from `from`, entered at `origin`, to `destination`.
    ///
    /// The returned route starts with `from` and ends with the first
    /// component that touches `destination`. `None` means unreachable.
    pub fn find_path(
        &self,
        from: ComponentId,
        origin: &Location,
        destination: &Location,
        direction: Direction,
    ) -> Option<Vec<ComponentId>> {
        self.search(from, *origin, destination, direction, &HashSet::new())
    }

    fn search(
        &self,
        current: ComponentId,
        entry: Location,
        destination: &Location,
        direction: Direction,
        visited: &HashSet<ComponentId>,
    ) -> Option<Vec<ComponentId>> {
        if visited.contains(&current) {
            trace!(component = %current, "Already visited, backtracking");
            return None;
        }

        if self.reaches(current, destination) {
            trace!(component = %current, destination = %destination, "Found destination");
            return Some(vec![current]);
        }

        let exit = self.exit_point(current, &entry, direction)?;
        let mut branch = visited.clone();
        branch.insert(current);

        for neighbor in self.neighbors(current, &entry, direction) {
            if let Some(mut path) = self.search(neighbor, exit, destination, direction, &branch) {
                path.insert(0, current);
                return Some(path);
            }
        }

        trace!(component = %current, "No path from here");
        None
    }

    /// Whether `component` touches `destination`.
    ///
    /// Segments match on either endpoint so that tracks stored against the
    /// direction of travel still terminate a route.
    pub fn reaches(&self, component: ComponentId, destination: &Location) -> bool {
        match component {
            ComponentId::Segment(id) => self
                .segment(id)
                .is_some_and(|segment| segment.touches(destination)),
            ComponentId::Switch(id) => self
                .switch(id)
                .is_some_and(|switch| switch.location() == *destination),
        }
    }

    /// Where a train that entered `component` at `entry` leaves it.
    ///
    /// A segment is left by the endpoint opposite `entry`; when `entry` is
    /// not an endpoint, by its far end in `direction`. A switch is left
    /// where it stands.
    pub fn exit_point(
        &self,
        component: ComponentId,
        entry: &Location,
        direction: Direction,
    ) -> Option<Location> {
        match component {
            ComponentId::Segment(id) => self.segment(id).map(|segment| {
                segment
                    .other_end(entry)
                    .unwrap_or_else(|| segment.far_end(direction))
            }),
            ComponentId::Switch(id) => self.switch(id).map(|switch| switch.location()),
        }
    }

    /// Components adjacent to `component`, entered at `entry`, in the
    /// direction of travel.
    ///
    /// A switch standing at a segment's exit is the only way through;
    /// otherwise every other segment touching the exit is a neighbour. A
    /// switch leads into each connected segment whose other end is not
    /// behind it.
    pub fn neighbors(
        &self,
        component: ComponentId,
        entry: &Location,
        direction: Direction,
    ) -> Vec<ComponentId> {
        let Some(exit) = self.exit_point(component, entry, direction) else {
            return Vec::new();
        };

        match component {
            ComponentId::Segment(id) => {
                if let Some(switch) = self.switch_at(&exit) {
                    return vec![ComponentId::Switch(switch.id())];
                }

                self.segments()
                    .iter()
                    .filter(|other| other.id() != id && other.touches(&exit))
                    .map(|other| ComponentId::Segment(other.id()))
                    .collect()
            }
            ComponentId::Switch(id) => {
                let Some(switch) = self.switch(id) else {
                    return Vec::new();
                };
                switch
                    .connected_segments()
                    .iter()
                    .filter(|seg| self.leads_ahead(**seg, &exit, direction))
                    .map(|seg| ComponentId::Segment(*seg))
                    .collect()
            }
        }
    }

    /// `segment` touches `from` and its other end is not behind it.
    fn leads_ahead(&self, segment: SegmentId, from: &Location, direction: Direction) -> bool {
        self.segment(segment)
            .and_then(|segment| segment.other_end(from))
            .is_some_and(|far| direction.is_ahead(from, &far))
    }

    /// Check that `route`, entered at `origin`, is a connected walk ending
    /// at `destination`.
    pub fn route_is_connected(
        &self,
        route: &[ComponentId],
        origin: &Location,
        direction: Direction,
        destination: &Location,
    ) -> bool {
        let Some(last) = route.last() else {
            return false;
        };

        let mut entry = *origin;
        for pair in route.windows(2) {
            if !self.neighbors(pair[0], &entry, direction).contains(&pair[1]) {
                return false;
            }
            match self.exit_point(pair[0], &entry, direction) {
                Some(exit) => entry = exit,
                None => return false,
            }
        }

        self.reaches(*last, destination)
    }

    /// The component a train standing at `location` should start routing from.
    ///
    /// Prefers, in order: the station's connected segment when it leads
    /// ahead, a switch at `location`, then the first touching segment that
    /// leads ahead. Segments count whichever way they are stored. If nothing
    /// leads ahead, the station's segment or the first touching segment is
    /// used anyway and the search decides.
    pub fn start_component(&self, location: &Location, direction: Direction) -> Option<ComponentId> {
        let station_segment = self
            .station_at(location)
            .and_then(|station| station.connected_segment());

        if let Some(id) = station_segment
            && self.leads_ahead(id, location, direction)
        {
            return Some(ComponentId::Segment(id));
        }

        if let Some(switch) = self.switch_at(location) {
            return Some(ComponentId::Switch(switch.id()));
        }

        let touching: Vec<SegmentId> = self
            .segments()
            .iter()
            .filter(|segment| segment.touches(location))
            .map(|segment| segment.id())
            .collect();

        touching
            .iter()
            .find(|id| self.leads_ahead(**id, location, direction))
            .or(station_segment.as_ref())
            .or(touching.first())
            .map(|id| ComponentId::Segment(*id))
    }

    /// Travel direction implied by how two consecutive segments join.
    ///
    /// Decided by where the free ends lie either side of the shared point.
    /// When they are level, `a.end == b.start` is rightward and
    /// `a.start == b.end` leftward; anything else compares start X.
    pub fn direction_between(&self, a: ComponentId, b: ComponentId) -> Option<Direction> {
        let (ComponentId::Segment(a), ComponentId::Segment(b)) = (a, b) else {
            return None;
        };
        let (a, b) = (self.segment(a)?, self.segment(b)?);

        let joint = [a.end(), a.start()]
            .into_iter()
            .find(|point| b.touches(point));
        if let Some(joint) = joint
            && let (Some(behind), Some(ahead)) = (a.other_end(&joint), b.other_end(&joint))
            && ahead.x() != behind.x()
        {
            return Some(if ahead.x() > behind.x() {
                Direction::Right
            } else {
                Direction::Left
            });
        }

        let direction = if a.end() == b.start() {
            Direction::Right
        } else if a.start() == b.end() {
            Direction::Left
        } else if b.start().x() > a.start().x() {
            Direction::Right
        } else {
            Direction::Left
        };
        Some(direction)
    }
}
