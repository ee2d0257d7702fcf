//! Track graph: the registry of segments, switches and stations.
//!
//! Built once from layout records and shared read-only (`Arc<TrackGraph>`)
//! by every actor afterwards. Construction runs in three passes:
//!
//! ```text
//! records ──▶ create components ──▶ validate crossings ──▶ wire adjacency
//!              (subdivide tracks)     (shared endpoint       (segments, then
//!                                      pairs exempt)          switches, then
//!                                                             stations)
//! ```
//!
//! Components never point at each other. Adjacency is discovered by
//! matching `Location`s, and the only stored links are the segment
//! left/right neighbour ids, which pathfinding does not rely on.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::LayoutError;
use crate::ids::{ComponentId, SegmentId, StationId, SwitchId};
use crate::layout::LayoutRecord;
use crate::location::{Direction, Location};

/// A directed track edge between two locations.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSegment {
    id: SegmentId,
    start: Location,
    end: Location,
    left_neighbor: Option<SegmentId>,
    right_neighbor: Option<SegmentId>,
}

impl TrackSegment {
    fn new(id: SegmentId, start: Location, end: Location) -> Self {
        Self {
            id,
            start,
            end,
            left_neighbor: None,
            right_neighbor: None,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn start(&self) -> Location {
        self.start
    }

    pub fn end(&self) -> Location {
        self.end
    }

    pub fn left_neighbor(&self) -> Option<SegmentId> {
        self.left_neighbor
    }

    pub fn right_neighbor(&self) -> Option<SegmentId> {
        self.right_neighbor
    }

    /// The endpoint that lies ahead when travelling in `direction`.
    pub fn far_end(&self, direction: Direction) -> Location {
        match direction {
            Direction::Right => self.end,
            Direction::Left => self.start,
        }
    }

    /// Either endpoint equals `location`.
    pub fn touches(&self, location: &Location) -> bool {
        self.start == *location || self.end == *location
    }

    /// The endpoint opposite `location`, whichever way the segment is stored.
    pub fn other_end(&self, location: &Location) -> Option<Location> {
        if self.start == *location {
            Some(self.end)
        } else if self.end == *location {
            Some(self.start)
        } else {
            None
        }
    }

    fn shares_endpoint_with(&self, other: &TrackSegment) -> bool {
        self.touches(&other.start) || self.touches(&other.end)
    }
}

impl std::fmt::Display for TrackSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Track from {} to {}", self.start, self.end)
    }
}

/// A junction node joining every segment that touches its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    id: SwitchId,
    location: Location,
    connected: Vec<SegmentId>,
}

impl Switch {
    pub fn id(&self) -> SwitchId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Connected segments in registration order.
    pub fn connected_segments(&self) -> &[SegmentId] {
        &self.connected
    }
}

/// A journey endpoint with its single connected segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    id: StationId,
    location: Location,
    connected: Option<SegmentId>,
}

impl Station {
    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn connected_segment(&self) -> Option<SegmentId> {
        self.connected
    }
}

/// Immutable registry of all track components.
#[derive(Debug, Clone, Default)]
pub struct TrackGraph {
    segments: Vec<TrackSegment>,
    switches: Vec<Switch>,
    stations: Vec<Station>,
}

impl TrackGraph {
    /// Build and validate a graph from layout records.
    ///
    /// Any configuration error aborts construction; no partially built
    /// graph is ever returned.
    pub fn build(records: &[LayoutRecord]) -> Result<Self, LayoutError> {
        let mut graph = TrackGraph::default();

        for (index, record) in records.iter().enumerate() {
            if record.locations().iter().any(|loc| !loc.is_finite()) {
                return Err(LayoutError::NonFiniteCoordinate { index });
            }

            match record {
                LayoutRecord::Station { location } => graph.add_station(index, *location)?,
                LayoutRecord::Track {
                    start,
                    end,
                    segments,
                } => graph.add_track(index, *start, *end, *segments)?,
                LayoutRecord::Switch { location } => graph.add_switch(index, *location)?,
            }
        }

        if graph.segments.is_empty() {
            return Err(LayoutError::NoTracks);
        }

        graph.validate_crossings()?;
        graph.connect_segments();
        graph.connect_switches();
        graph.connect_stations();

        debug!(
            segments = graph.segments.len(),
            switches = graph.switches.len(),
            stations = graph.stations.len(),
            "Track graph built"
        );

        Ok(graph)
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn segment(&self, id: SegmentId) -> Option<&TrackSegment> {
        self.segments.get(id.0)
    }

    pub fn switch(&self, id: SwitchId) -> Option<&Switch> {
        self.switches.get(id.0)
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.0)
    }

    pub fn station_at(&self, location: &Location) -> Option<&Station> {
        self.stations.iter().find(|s| s.location == *location)
    }

    pub fn switch_at(&self, location: &Location) -> Option<&Switch> {
        self.switches.iter().find(|s| s.location == *location)
    }

    /// Human-readable description of a route component.
    pub fn describe(&self, component: ComponentId) -> String {
        match component {
            ComponentId::Segment(id) => self
                .segment(id)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("unknown {}", id)),
            ComponentId::Switch(id) => self
                .switch(id)
                .map(|s| format!("Switch at {}", s.location))
                .unwrap_or_else(|| format!("unknown {}", id)),
        }
    }

    /// Explicitly link `left` → `right`.
    ///
    /// Rejected unless `left` ends where `right` starts.
    pub fn connect(&mut self, left: SegmentId, right: SegmentId) -> Result<(), LayoutError> {
        self.set_right_neighbor(left, Some(right))?;
        self.set_left_neighbor(right, Some(left))
    }

    fn add_station(&mut self, index: usize, location: Location) -> Result<(), LayoutError> {
        if self.station_at(&location).is_some() {
            return Err(LayoutError::DuplicateStation { index, location });
        }
        let id = StationId(self.stations.len());
        self.stations.push(Station {
            id,
            location,
            connected: None,
        });
        Ok(())
    }

    fn add_switch(&mut self, index: usize, location: Location) -> Result<(), LayoutError> {
        if self.switch_at(&location).is_some() {
            return Err(LayoutError::DuplicateSwitch { index, location });
        }
        let id = SwitchId(self.switches.len());
        self.switches.push(Switch {
            id,
            location,
            connected: Vec::new(),
        });
        Ok(())
    }

    fn add_track(
        &mut self,
        index: usize,
        start: Location,
        end: Location,
        segments: Option<u32>,
    ) -> Result<(), LayoutError> {
        if start == end {
            return Err(LayoutError::ZeroLengthTrack { index, start, end });
        }

        let Some(count) = segments else {
            self.push_segment(start, end);
            return Ok(());
        };

        if count == 0 {
            return Err(LayoutError::ZeroSubdivision { index });
        }

        // Subdivided tracks always run left-to-right, then bottom-to-top
        let (start, end) = if end.x() < start.x() || (end.x() == start.x() && end.y() < start.y()) {
            (end, start)
        } else {
            (start, end)
        };

        let mut previous: Option<SegmentId> = None;
        for i in 0..count {
            // Reuse the record's own endpoints at both ends so joins with other
            // records stay bit-identical.
            let piece_start = if i == 0 {
                start
            } else {
                lerp(&start, &end, f64::from(i) / f64::from(count))
            };
            let piece_end = if i + 1 == count {
                end
            } else {
                lerp(&start, &end, f64::from(i + 1) / f64::from(count))
            };

            let id = self.push_segment(piece_start, piece_end);
            if let Some(prev) = previous {
                self.link(prev, id);
            }
            previous = Some(id);
        }

        Ok(())
    }

    fn push_segment(&mut self, start: Location, end: Location) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.segments.push(TrackSegment::new(id, start, end));
        id
    }

    /// Reject any pair of segments whose lines cross without sharing an endpoint.
    fn validate_crossings(&self) -> Result<(), LayoutError> {
        for (i, first) in self.segments.iter().enumerate() {
            for second in &self.segments[i + 1..] {
                if !lines_cross(&first.start, &first.end, &second.start, &second.end) {
                    continue;
                }
                if first.shares_endpoint_with(second) {
                    continue;
                }
                return Err(LayoutError::CrossingTracks {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
        Ok(())
    }

    fn connect_segments(&mut self) {
        for current in 0..self.segments.len() {
            for other in 0..self.segments.len() {
                if current == other {
                    continue;
                }
                let (current, other) = (SegmentId(current), SegmentId(other));
                let a = &self.segments[current.0];
                let b = &self.segments[other.0];

                if a.end == b.start {
                    self.link(current, other);
                } else if a.start == b.end {
                    self.link(other, current);
                }
            }
        }
    }

    fn connect_switches(&mut self) {
        for switch_idx in 0..self.switches.len() {
            let location = self.switches[switch_idx].location;
            let mut connected = Vec::new();

            for segment in &mut self.segments {
                if segment.start == location {
                    segment.left_neighbor = None;
                } else if segment.end == location {
                    segment.right_neighbor = None;
                } else {
                    continue;
                }
                connected.push(segment.id);
            }

            debug!(
                switch = %location,
                connected = connected.len(),
                "Connected switch"
            );
            self.switches[switch_idx].connected = connected;
        }
    }

    fn connect_stations(&mut self) {
        for station in &mut self.stations {
            let location = station.location;
            let Some(segment) = self.segments.iter_mut().find(|s| s.touches(&location)) else {
                warn!(station = %location, "Station is not connected to any track");
                continue;
            };

            if segment.start == location {
                segment.left_neighbor = None;
            } else {
                segment.right_neighbor = None;
            }
            station.connected = Some(segment.id);
            debug!(station = %location, track = %segment, "Connected station");
        }
    }

    /// Link `left` → `right`, logging instead of failing on a mismatch.
    fn link(&mut self, left: SegmentId, right: SegmentId) {
        if let Err(err) = self.connect(left, right) {
            warn!(error = %err, "Connection not made");
        }
    }

    fn set_right_neighbor(
        &mut self,
        segment: SegmentId,
        neighbor: Option<SegmentId>,
    ) -> Result<(), LayoutError> {
        let this = &self.segments[segment.0];
        if let Some(n) = neighbor.map(|n| &self.segments[n.0]) {
            if n.start != this.end {
                return Err(LayoutError::InvalidConnection {
                    side: "right",
                    segment: this.to_string(),
                    neighbor: n.to_string(),
                });
            }
        }
        self.segments[segment.0].right_neighbor = neighbor;
        Ok(())
    }

    fn set_left_neighbor(
        &mut self,
        segment: SegmentId,
        neighbor: Option<SegmentId>,
    ) -> Result<(), LayoutError> {
        let this = &self.segments[segment.0];
        if let Some(n) = neighbor.map(|n| &self.segments[n.0]) {
            if n.end != this.start {
                return Err(LayoutError::InvalidConnection {
                    side: "left",
                    segment: this.to_string(),
                    neighbor: n.to_string(),
                });
            }
        }
        self.segments[segment.0].left_neighbor = neighbor;
        Ok(())
    }

    /// Distinct locations used by the layout, for diagnostics.
    pub fn junction_points(&self) -> HashSet<Location> {
        self.segments
            .iter()
            .flat_map(|s| [s.start, s.end])
            .collect()
    }
}

fn lerp(a: &Location, b: &Location, t: f64) -> Location {
    Location::new(a.x() + (b.x() - a.x()) * t, a.y() + (b.y() - a.y()) * t)
}

/// `c` lies strictly counter-clockwise of the line `a`→`b`.
fn ccw(a: &Location, b: &Location, c: &Location) -> bool {
    (c.y() - a.y()) * (b.x() - a.x()) > (b.y() - a.y()) * (c.x() - a.x())
}

fn lines_cross(a: &Location, b: &Location, c: &Location, d: &Location) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}
