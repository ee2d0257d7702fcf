//! SwitchActor: owner of one junction's occupancy.
//!
//! Same contract as a segment. The switch's connected-segment list lives in
//! the shared graph, not in the actor.

use std::sync::Arc;

use acton_reactive::prelude::*;

use super::lockable::{LockableState, configure_lockable};
use crate::graph::TrackGraph;
use crate::ids::{ComponentId, SwitchId};
use crate::observer::NetworkObserver;

pub struct SwitchActor {
    pub switch: SwitchId,
    pub graph: Arc<TrackGraph>,
    pub observer: Arc<dyn NetworkObserver>,
}

impl SwitchActor {
    pub fn new(switch: SwitchId, graph: Arc<TrackGraph>, observer: Arc<dyn NetworkObserver>) -> Self {
        Self {
            switch,
            graph,
            observer,
        }
    }

    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<LockableState>(format!("Switch:{}", self.switch.0));

        actor.model.component = Some(ComponentId::Switch(self.switch));
        actor.model.graph = Some(self.graph);
        actor.model.observer = Some(self.observer);

        configure_lockable(&mut actor);

        actor.start().await
    }
}
