//! SegmentActor: owner of one track segment's occupancy.

use std::sync::Arc;

use acton_reactive::prelude::*;

use super::lockable::{LockableState, configure_lockable};
use crate::graph::TrackGraph;
use crate::ids::{ComponentId, SegmentId};
use crate::observer::NetworkObserver;

/// Actor guarding a single [`TrackSegment`](crate::graph::TrackSegment).
///
/// Answers route searches rooted at the segment and serializes lock, move
/// and release requests through its mailbox.
pub struct SegmentActor {
    pub segment: SegmentId,
    pub graph: Arc<TrackGraph>,
    pub observer: Arc<dyn NetworkObserver>,
}

impl SegmentActor {
    pub fn new(
        segment: SegmentId,
        graph: Arc<TrackGraph>,
        observer: Arc<dyn NetworkObserver>,
    ) -> Self {
        Self {
            segment,
            graph,
            observer,
        }
    }

    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<LockableState>(format!("Segment:{}", self.segment.0));

        actor.model.component = Some(ComponentId::Segment(self.segment));
        actor.model.graph = Some(self.graph);
        actor.model.observer = Some(self.observer);

        configure_lockable(&mut actor);

        actor.start().await
    }
}
