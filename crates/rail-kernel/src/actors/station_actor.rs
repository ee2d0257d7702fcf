//! StationActor: journey endpoint. Never locks; only tracks which trains are
//! dwelling at the platform.

use std::collections::BTreeSet;
use std::sync::Arc;

use acton_reactive::prelude::*;
use tracing::info;

use crate::ids::{StationId, TrainId};
use crate::location::Location;
use crate::messages::{TrainArrived, TrainDeparted};
use crate::observer::NetworkObserver;

#[derive(Default, Clone)]
pub struct StationActorState {
    pub station: StationId,
    pub location: Location,
    /// Trains currently at the platform
    pub dwelling: BTreeSet<TrainId>,
    pub observer: Option<Arc<dyn NetworkObserver>>,
}

impl std::fmt::Debug for StationActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationActorState")
            .field("station", &self.station)
            .field("location", &self.location)
            .field("dwelling", &self.dwelling)
            .finish()
    }
}

pub struct StationActor {
    pub station: StationId,
    pub location: Location,
    pub observer: Arc<dyn NetworkObserver>,
}

impl StationActor {
    pub fn new(station: StationId, location: Location, observer: Arc<dyn NetworkObserver>) -> Self {
        Self {
            station,
            location,
            observer,
        }
    }

    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<StationActorState>(format!("Station:{}", self.station.0));

        actor.model.station = self.station;
        actor.model.location = self.location;
        actor.model.observer = Some(self.observer);

        configure_station_actor(&mut actor);

        actor.start().await
    }
}

fn configure_station_actor(actor: &mut ManagedActor<Idle, StationActorState>) {
    actor.mutate_on::<TrainArrived>(|actor, context| {
        let train = context.message().train;
        actor.model.dwelling.insert(train);

        info!(
            station = %actor.model.location,
            train = %train,
            dwelling = actor.model.dwelling.len(),
            "Train arrived"
        );
        if let Some(observer) = &actor.model.observer {
            observer.on_station_traffic(actor.model.station, train, true);
        }

        Reply::ready()
    });

    actor.mutate_on::<TrainDeparted>(|actor, context| {
        let train = context.message().train;
        actor.model.dwelling.remove(&train);

        info!(station = %actor.model.location, train = %train, "Train departed");
        if let Some(observer) = &actor.model.observer {
            observer.on_station_traffic(actor.model.station, train, false);
        }

        Reply::ready()
    });
}
