//! Lockable track components: exclusive holder state and the handlers that
//! segments and switches share.
//!
//! ```text
//! RouteRequest ─▶ find_path rooted here ─▶ RouteResponse
//! LockRequest  ─▶ grant iff Unlocked     ─▶ LockResponse
//! MoveRequest  ─▶ grant iff Unlocked or
//!                 held by the requester  ─▶ MoveResponse
//! Release      ─▶ clear holder (no reply)
//! ```
//!
//! All handlers use `mutate_on`, so a component processes one request at a
//! time and the holder can never be granted to two trains.

use std::sync::Arc;

use acton_reactive::prelude::*;
use tracing::{debug, trace, warn};

use crate::graph::TrackGraph;
use crate::ids::{ComponentId, TrainId};
use crate::messages::{
    LockRequest, LockResponse, MoveRequest, MoveResponse, ProtocolMessage, Release, RouteRequest,
    RouteResponse,
};
use crate::observer::NetworkObserver;

/// Who, if anyone, holds a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupancy {
    #[default]
    Unlocked,
    LockedBy(TrainId),
}

impl Occupancy {
    pub fn holder(&self) -> Option<TrainId> {
        match self {
            Occupancy::Unlocked => None,
            Occupancy::LockedBy(train) => Some(*train),
        }
    }

    /// Grant only if free.
    pub fn try_lock(&mut self, train: TrainId) -> bool {
        match self {
            Occupancy::Unlocked => {
                *self = Occupancy::LockedBy(train);
                true
            }
            Occupancy::LockedBy(_) => false,
        }
    }

    /// Grant if free or already held by `train`.
    pub fn try_move(&mut self, train: TrainId) -> bool {
        match self {
            Occupancy::LockedBy(holder) if *holder != train => false,
            _ => {
                *self = Occupancy::LockedBy(train);
                true
            }
        }
    }

    /// Clear unconditionally, returning the previous holder.
    pub fn release(&mut self) -> Option<TrainId> {
        std::mem::take(self).holder()
    }
}

/// Actor state for a segment or switch.
#[derive(Default, Clone)]
pub struct LockableState {
    /// Which component this actor guards
    pub component: Option<ComponentId>,
    /// Read-only graph for route searches
    pub graph: Option<Arc<TrackGraph>>,
    /// Occupancy hook
    pub observer: Option<Arc<dyn NetworkObserver>>,
    pub occupancy: Occupancy,
}

impl std::fmt::Debug for LockableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockableState")
            .field("component", &self.component)
            .field("occupancy", &self.occupancy)
            .finish()
    }
}

impl LockableState {
    fn notify(&self, holder: Option<TrainId>) {
        if let (Some(observer), Some(component)) = (&self.observer, self.component) {
            observer.on_occupancy_changed(component, holder);
        }
    }
}

/// Install the route/lock/move/release handlers.
pub(crate) fn configure_lockable(actor: &mut ManagedActor<Idle, LockableState>) {
    actor.mutate_on::<RouteRequest>(|actor, context| {
        let msg = context.message().clone();
        let (Some(component), Some(graph)) = (actor.model.component, actor.model.graph.clone())
        else {
            warn!("RouteRequest before component was initialised");
            return Reply::ready();
        };

        trace!(
            kind = %RouteRequest::KIND,
            component = %component,
            train = %msg.train.id,
            position = %msg.position,
            destination = %msg.destination,
            direction = %msg.direction,
            "Searching for route"
        );

        let path = graph.find_path(component, &msg.position, &msg.destination, msg.direction);
        let note = match &path {
            Some(path) => format!("{} components from {}", path.len(), component),
            None => format!("no route from {} to {}", component, msg.destination),
        };

        let response = RouteResponse {
            journey: msg.journey,
            origin: component,
            path,
            note,
        };
        let handle = msg.train.handle;

        Reply::pending(async move {
            handle.send(response).await;
        })
    });

    actor.mutate_on::<LockRequest>(|actor, context| {
        let msg = context.message().clone();
        let Some(component) = actor.model.component else {
            return Reply::ready();
        };

        let granted = actor.model.occupancy.try_lock(msg.train.id);
        if granted {
            actor.model.notify(Some(msg.train.id));
        }

        debug!(
            kind = %LockRequest::KIND,
            component = %component,
            train = %msg.train.id,
            granted,
            holder = ?actor.model.occupancy.holder(),
            "Lock request"
        );

        let response = LockResponse {
            journey: msg.journey,
            component,
            granted,
        };
        let handle = msg.train.handle;

        Reply::pending(async move {
            handle.send(response).await;
        })
    });

    actor.mutate_on::<MoveRequest>(|actor, context| {
        let msg = context.message().clone();
        let Some(component) = actor.model.component else {
            return Reply::ready();
        };

        let previous = actor.model.occupancy.holder();
        let granted = actor.model.occupancy.try_move(msg.train.id);
        if granted && previous != Some(msg.train.id) {
            actor.model.notify(Some(msg.train.id));
        }

        trace!(
            kind = %MoveRequest::KIND,
            component = %component,
            train = %msg.train.id,
            granted,
            "Move request"
        );

        let response = MoveResponse {
            journey: msg.journey,
            component,
            granted,
        };
        let handle = msg.train.handle;

        Reply::pending(async move {
            handle.send(response).await;
        })
    });

    actor.mutate_on::<Release>(|actor, context| {
        let train = context.message().train;

        if let Some(previous) = actor.model.occupancy.release() {
            actor.model.notify(None);
            if previous != train {
                debug!(
                    component = ?actor.model.component,
                    holder = %previous,
                    releaser = %train,
                    "Released a lock held by another train"
                );
            }
        }

        Reply::ready()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive() {
        let mut occupancy = Occupancy::default();
        assert!(occupancy.try_lock(TrainId(1)));
        assert!(!occupancy.try_lock(TrainId(2)));
        // Not re-entrant for locks
        assert!(!occupancy.try_lock(TrainId(1)));
        assert_eq!(occupancy.holder(), Some(TrainId(1)));
    }

    #[test]
    fn test_move_is_reentrant_for_holder() {
        let mut occupancy = Occupancy::default();
        assert!(occupancy.try_move(TrainId(1)));
        assert!(occupancy.try_move(TrainId(1)));
        assert!(!occupancy.try_move(TrainId(2)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut occupancy = Occupancy::LockedBy(TrainId(3));
        assert_eq!(occupancy.release(), Some(TrainId(3)));
        assert_eq!(occupancy.release(), None);
        assert_eq!(occupancy, Occupancy::Unlocked);
    }
}
