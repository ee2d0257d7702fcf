//! Rail Kernel: actor-based interlocking for a shared track network.
//!
//! Trains negotiate passage with the segments and switches they need:
//! a depth-first route search, whole-route locking with retry and
//! randomized backoff, then stepwise movement that releases track as the
//! train leaves it.

pub mod actors;
pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod journey;
pub mod layout;
pub mod location;
pub mod messages;
pub mod network;
pub mod observer;
mod pathfinding;

pub use config::SimulationConfig;
pub use error::LayoutError;
pub use graph::{Station, Switch, TrackGraph, TrackSegment};
pub use ids::{ComponentId, SegmentId, StationId, SwitchId, TrainId};
pub use journey::{JourneyPlan, TrainState};
pub use layout::LayoutRecord;
pub use location::{Direction, Location};
pub use network::{ComponentDirectory, RailNetwork, TrainHandle};
pub use observer::{
    ChannelObserver, FanoutObserver, NetworkObserver, NullObserver, OccupancyLedger, TrainEvent,
};
