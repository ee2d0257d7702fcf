//! Spawning a whole rail network as actors.
//!
//! ## Usage
//!
//! ```ignore
//! use rail_kernel::{RailNetwork, SimulationConfig, TrackGraph, NullObserver};
//! use acton_reactive::prelude::*;
//!
//! let graph = TrackGraph::build(&records)?;
//! let mut runtime = ActonApp::launch_async().await;
//! let mut network =
//!     RailNetwork::spawn(&mut runtime, graph, SimulationConfig::default(), Arc::new(NullObserver))
//!         .await;
//!
//! let train = network.spawn_train(&mut runtime, start).await;
//! train.begin_journey(destination).await;
//! ```

use std::sync::Arc;

use acton_reactive::prelude::*;
use tracing::info;

use crate::actors::{SegmentActor, StationActor, SwitchActor, TrainActor};
use crate::config::SimulationConfig;
use crate::graph::TrackGraph;
use crate::ids::{ComponentId, SegmentId, StationId, SwitchId, TrainId};
use crate::location::Location;
use crate::messages::BeginJourney;
use crate::observer::NetworkObserver;

/// Actor handles for every component, indexed like the graph registry.
#[derive(Debug, Clone, Default)]
pub struct ComponentDirectory {
    segments: Vec<ActorHandle>,
    switches: Vec<ActorHandle>,
    stations: Vec<ActorHandle>,
}

impl ComponentDirectory {
    pub fn component(&self, id: ComponentId) -> Option<&ActorHandle> {
        match id {
            ComponentId::Segment(SegmentId(i)) => self.segments.get(i),
            ComponentId::Switch(SwitchId(i)) => self.switches.get(i),
        }
    }

    pub fn station(&self, id: StationId) -> Option<&ActorHandle> {
        self.stations.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.segments.len() + self.switches.len() + self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A running network: shared graph, component actors, and a train counter.
pub struct RailNetwork {
    graph: Arc<TrackGraph>,
    config: SimulationConfig,
    observer: Arc<dyn NetworkObserver>,
    directory: Arc<ComponentDirectory>,
    next_train: u32,
}

impl RailNetwork {
    /// Spawn one actor per segment, switch and station.
    pub async fn spawn(
        runtime: &mut ActorRuntime,
        graph: TrackGraph,
        config: SimulationConfig,
        observer: Arc<dyn NetworkObserver>,
    ) -> Self {
        let graph = Arc::new(graph);
        let mut directory = ComponentDirectory::default();

        for segment in graph.segments() {
            let handle = SegmentActor::new(segment.id(), graph.clone(), observer.clone())
                .spawn(runtime)
                .await;
            directory.segments.push(handle);
        }

        for switch in graph.switches() {
            let handle = SwitchActor::new(switch.id(), graph.clone(), observer.clone())
                .spawn(runtime)
                .await;
            directory.switches.push(handle);
        }

        for station in graph.stations() {
            let handle = StationActor::new(station.id(), station.location(), observer.clone())
                .spawn(runtime)
                .await;
            directory.stations.push(handle);
        }

        info!(
            segments = directory.segments.len(),
            switches = directory.switches.len(),
            stations = directory.stations.len(),
            "Rail network spawned"
        );

        Self {
            graph,
            config,
            observer,
            directory: Arc::new(directory),
            next_train: 0,
        }
    }

    pub fn graph(&self) -> &Arc<TrackGraph> {
        &self.graph
    }

    pub fn directory(&self) -> &Arc<ComponentDirectory> {
        &self.directory
    }

    /// Spawn an idle train at `start`. Ids are handed out in spawn order.
    pub async fn spawn_train(&mut self, runtime: &mut ActorRuntime, start: Location) -> TrainHandle {
        let id = TrainId(self.next_train);
        self.next_train += 1;

        let handle = TrainActor {
            id,
            start,
            graph: self.graph.clone(),
            directory: self.directory.clone(),
            config: self.config.clone(),
            observer: self.observer.clone(),
        }
        .spawn(runtime)
        .await;

        TrainHandle { id, handle }
    }

    /// Spawn a train at `start` and send it toward `destination` at once.
    pub async fn dispatch_train(
        &mut self,
        runtime: &mut ActorRuntime,
        start: Location,
        destination: StationId,
        via: Option<StationId>,
    ) -> TrainHandle {
        let train = self.spawn_train(runtime, start).await;
        train.begin_journey_via(via, destination).await;
        train
    }
}

/// A spawned train.
#[derive(Debug, Clone)]
pub struct TrainHandle {
    pub id: TrainId,
    pub handle: ActorHandle,
}

impl TrainHandle {
    pub async fn begin_journey(&self, destination: StationId) {
        self.begin_journey_via(None, destination).await;
    }

    pub async fn begin_journey_via(&self, via: Option<StationId>, destination: StationId) {
        self.handle
            .send(BeginJourney { destination, via })
            .await;
    }
}
