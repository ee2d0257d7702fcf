//! TrainActor: the state machine that routes, locks and moves one train.
//!
//! Decisions live on [`TrainActorState`] as plain methods returning
//! [`Effect`]s; the actor handlers only turn effects into messages. Timed
//! waits are spawned tasks that send a [`TrainWakeup`] back to the train, so
//! the mailbox keeps draining while the train is backing off or moving.
//!
//! ```text
//! BeginJourney ─▶ RouteRequest ─▶ start component
//!                 RouteResponse ◀─┘
//!   LockRequest ─▶ route[i] ─▶ LockResponse
//!     granted: i += 1, all held ─▶ Moving
//!     denied:  retry after delay, or release all + backoff + restart at 0
//!   MoveRequest ─▶ current component ─▶ MoveResponse
//!     granted: wait one step ─▶ StepComplete ─▶ release component left behind
//!   arrival: release the rest, notify station, Idle (or next leg)
//! ```

use std::sync::Arc;
use std::time::Duration;

use acton_reactive::prelude::*;
use mti::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::config::SimulationConfig;
use crate::graph::TrackGraph;
use crate::ids::{ComponentId, StationId, TrainId};
use crate::journey::{JourneyPlan, LockOutcome, LockProgress, TrainState};
use crate::location::{Direction, Location};
use crate::messages::{
    BeginJourney, LockRequest, LockResponse, MoveRequest, MoveResponse, Release, RouteRequest,
    RouteResponse, TrainArrived, TrainDeparted, TrainRef, TrainWakeup, Wakeup,
};
use crate::network::ComponentDirectory;
use crate::observer::NetworkObserver;

/// Something the train wants done after handling a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestRoute {
        target: ComponentId,
        position: Location,
        destination: Location,
        direction: Direction,
    },
    RequestLock(ComponentId),
    RequestMove(ComponentId),
    Release(ComponentId),
    Departed(StationId),
    Arrived(StationId),
    Wake { after: Duration, wakeup: Wakeup },
}

/// Actor state for a single train.
#[derive(Default, Clone)]
pub struct TrainActorState {
    pub id: TrainId,
    pub location: Location,
    pub state: TrainState,
    pub direction: Direction,
    /// Station this leg is heading for
    pub leg_destination: Option<StationId>,
    /// Station the whole journey ends at
    pub final_destination: Option<StationId>,
    /// Correlation id of the current leg
    pub journey: String,
    pub plan: Option<JourneyPlan>,
    pub locks: LockProgress,
    /// Distance travelled since spawn
    pub odometer: f64,
    pub config: SimulationConfig,
    pub graph: Option<Arc<TrackGraph>>,
    pub directory: Option<Arc<ComponentDirectory>>,
    pub observer: Option<Arc<dyn NetworkObserver>>,
    /// Backoff jitter source
    pub rng: Option<ChaCha8Rng>,
}

impl std::fmt::Debug for TrainActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainActorState")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("leg_destination", &self.leg_destination)
            .field("final_destination", &self.final_destination)
            .field("held", &self.locks.held().len())
            .finish()
    }
}

impl TrainActorState {
    pub fn new(
        id: TrainId,
        location: Location,
        graph: Arc<TrackGraph>,
        config: SimulationConfig,
        observer: Arc<dyn NetworkObserver>,
    ) -> Self {
        let seed = match config.seed {
            Some(seed) => seed.wrapping_add(u64::from(id.0)),
            None => rand::random(),
        };
        Self {
            id,
            location,
            config,
            graph: Some(graph),
            observer: Some(observer),
            rng: Some(ChaCha8Rng::seed_from_u64(seed)),
            ..Default::default()
        }
    }

    fn set_state(&mut self, state: TrainState) {
        if self.state == state {
            return;
        }
        trace!(train = %self.id, from = %self.state, to = %state, "Train state change");
        self.state = state;
        if let Some(observer) = &self.observer {
            observer.on_train_state_changed(self.id, state);
        }
    }

    fn leg_destination_location(&self, graph: &TrackGraph) -> Option<Location> {
        self.leg_destination
            .and_then(|station| graph.station(station))
            .map(|station| station.location())
    }

    fn backoff(&mut self) -> Duration {
        let rng = self
            .rng
            .get_or_insert_with(|| ChaCha8Rng::seed_from_u64(rand::random()));
        self.config.backoff(rng)
    }

    /// Start a journey. Ignored unless the train is idle.
    pub fn begin_journey(&mut self, destination: StationId, via: Option<StationId>) -> Vec<Effect> {
        if self.state != TrainState::Idle {
            warn!(train = %self.id, state = %self.state, "Journey already in progress, ignoring");
            return Vec::new();
        }
        self.final_destination = Some(destination);
        self.start_leg(via.unwrap_or(destination))
    }

    fn start_leg(&mut self, target: StationId) -> Vec<Effect> {
        self.journey = "journey".create_type_id::<V7>().to_string();
        self.leg_destination = Some(target);
        self.plan = None;
        self.locks = LockProgress::default();

        let Some(graph) = self.graph.clone() else {
            return self.fail_no_path();
        };
        let Some(destination) = self.leg_destination_location(&graph) else {
            warn!(train = %self.id, station = %target, "Unknown destination station");
            return self.fail_no_path();
        };

        if self.location == destination {
            return self.arrive();
        }

        self.direction = Direction::towards(&self.location, &destination);
        let Some(start) = graph.start_component(&self.location, self.direction) else {
            warn!(
                train = %self.id,
                location = %self.location,
                direction = %self.direction,
                "No starting track at current location"
            );
            return self.fail_no_path();
        };

        info!(
            train = %self.id,
            journey = %self.journey,
            from = %self.location,
            to = %destination,
            direction = %self.direction,
            "Seeking path"
        );
        self.set_state(TrainState::SeekingPath);

        vec![Effect::RequestRoute {
            target: start,
            position: self.location,
            destination,
            direction: self.direction,
        }]
    }

    pub fn on_route_response(&mut self, msg: &RouteResponse) -> Vec<Effect> {
        if msg.journey != self.journey || self.state != TrainState::SeekingPath {
            debug!(train = %self.id, journey = %msg.journey, "Ignoring stale route response");
            return Vec::new();
        }

        let Some(graph) = self.graph.clone() else {
            return self.fail_no_path();
        };
        let Some(destination) = self.leg_destination_location(&graph) else {
            return self.fail_no_path();
        };

        let origin = self.location;
        let route = match &msg.path {
            Some(route) if graph.route_is_connected(route, &origin, self.direction, &destination) => {
                route.clone()
            }
            Some(route) => {
                warn!(train = %self.id, components = route.len(), "Route does not connect, discarding");
                return self.fail_no_path();
            }
            None => {
                warn!(train = %self.id, note = %msg.note, "No path found");
                return self.fail_no_path();
            }
        };

        if let Some(direction) = route
            .get(1)
            .and_then(|next| graph.direction_between(route[0], *next))
        {
            self.direction = direction;
        }

        info!(
            train = %self.id,
            components = route.len(),
            origin = %msg.origin,
            "Path found, locking"
        );

        let plan = JourneyPlan::new(&graph, self.location, route, self.direction, destination);
        let first = plan.route().first().copied();
        self.plan = Some(plan);
        self.locks = LockProgress::default();
        self.set_state(TrainState::LockingPath);

        first.map(Effect::RequestLock).into_iter().collect()
    }

    pub fn on_lock_response(&mut self, msg: &LockResponse) -> Vec<Effect> {
        let Some(plan) = self.plan.as_ref() else {
            return Vec::new();
        };
        let expected = self.locks.target(plan.route());
        if msg.journey != self.journey
            || self.state != TrainState::LockingPath
            || expected != Some(msg.component)
        {
            debug!(train = %self.id, component = %msg.component, "Ignoring stale lock response");
            return Vec::new();
        }

        if msg.granted {
            if self.locks.granted(msg.component, plan.route()) {
                return self.start_moving();
            }
            return self.lock_target();
        }

        self.set_state(TrainState::WaitingForPath);
        match self.locks.denied(self.config.locking.retry_limit) {
            LockOutcome::Retry { attempt } => {
                debug!(
                    train = %self.id,
                    component = %msg.component,
                    attempt,
                    limit = self.config.locking.retry_limit,
                    "Path blocked, retrying"
                );
                vec![Effect::Wake {
                    after: self.config.lock_retry_delay(),
                    wakeup: Wakeup::RetryLock,
                }]
            }
            LockOutcome::Restart { release } => {
                let after = self.backoff();
                info!(
                    train = %self.id,
                    component = %msg.component,
                    released = release.len(),
                    backoff_ms = after.as_millis() as u64,
                    "Path blocked, releasing and backing off"
                );
                let mut effects: Vec<Effect> = release.into_iter().map(Effect::Release).collect();
                effects.push(Effect::Wake {
                    after,
                    wakeup: Wakeup::RestartLocking,
                });
                effects
            }
        }
    }

    pub fn on_wakeup(&mut self, msg: &TrainWakeup) -> Vec<Effect> {
        if msg.journey != self.journey {
            return Vec::new();
        }

        match msg.wakeup {
            Wakeup::RetryLock | Wakeup::RestartLocking
                if self.state == TrainState::WaitingForPath =>
            {
                self.set_state(TrainState::LockingPath);
                self.lock_target()
            }
            Wakeup::RetryMove if self.state == TrainState::Moving => self.request_next_movement(),
            Wakeup::StepComplete(point) if self.state == TrainState::Moving => {
                self.on_step_complete(point)
            }
            wakeup => {
                debug!(train = %self.id, ?wakeup, state = %self.state, "Ignoring wakeup");
                Vec::new()
            }
        }
    }

    pub fn on_move_response(&mut self, msg: &MoveResponse) -> Vec<Effect> {
        if msg.journey != self.journey || self.state != TrainState::Moving {
            debug!(train = %self.id, component = %msg.component, "Ignoring stale move response");
            return Vec::new();
        }

        if !msg.granted {
            debug!(train = %self.id, component = %msg.component, "Move denied, retrying");
            return vec![Effect::Wake {
                after: self.config.lock_retry_delay(),
                wakeup: Wakeup::RetryMove,
            }];
        }

        match self.plan.as_ref().and_then(|plan| plan.next_point()) {
            Some(point) => vec![Effect::Wake {
                after: self.config.step_delay(),
                wakeup: Wakeup::StepComplete(point),
            }],
            None => self.arrive(),
        }
    }

    fn on_step_complete(&mut self, point: Location) -> Vec<Effect> {
        self.odometer += self.location.distance_to(&point);
        self.location = point;
        if let Some(observer) = &self.observer {
            observer.on_train_moved(self.id, point);
        }

        let Some(plan) = self.plan.as_mut() else {
            return self.arrive();
        };

        let mut effects = Vec::new();
        if let Some(left) = plan.complete_step() {
            self.locks.leave(left);
            effects.push(Effect::Release(left));
        }

        if plan.is_complete() || plan.destination() == self.location {
            effects.extend(self.arrive());
        } else {
            effects.extend(self.request_next_movement());
        }
        effects
    }

    fn lock_target(&self) -> Vec<Effect> {
        self.plan
            .as_ref()
            .and_then(|plan| self.locks.target(plan.route()))
            .map(Effect::RequestLock)
            .into_iter()
            .collect()
    }

    fn start_moving(&mut self) -> Vec<Effect> {
        info!(train = %self.id, held = self.locks.held().len(), "All path components locked, starting movement");
        self.set_state(TrainState::Moving);

        let mut effects = Vec::new();
        if let Some(station) = self
            .graph
            .as_ref()
            .and_then(|graph| graph.station_at(&self.location))
        {
            effects.push(Effect::Departed(station.id()));
        }
        effects.extend(self.request_next_movement());
        effects
    }

    fn request_next_movement(&mut self) -> Vec<Effect> {
        match self.plan.as_ref().and_then(|plan| plan.current_component()) {
            Some(component) => vec![Effect::RequestMove(component)],
            None => self.arrive(),
        }
    }

    fn arrive(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self
            .locks
            .take_held()
            .into_iter()
            .map(Effect::Release)
            .collect();
        self.plan = None;

        let Some(station) = self.leg_destination else {
            self.set_state(TrainState::Idle);
            return effects;
        };
        effects.push(Effect::Arrived(station));

        match self.final_destination {
            Some(next) if next != station => {
                info!(train = %self.id, station = %station, next = %next, "Reached intermediate station");
                effects.extend(self.start_leg(next));
            }
            _ => {
                info!(
                    train = %self.id,
                    station = %station,
                    location = %self.location,
                    distance = self.odometer,
                    "Journey complete"
                );
                self.set_state(TrainState::Idle);
                if let Some(observer) = &self.observer {
                    observer.on_journey_complete(self.id, station);
                }
            }
        }
        effects
    }

    fn fail_no_path(&mut self) -> Vec<Effect> {
        let effects = self
            .locks
            .take_held()
            .into_iter()
            .map(Effect::Release)
            .collect();
        self.plan = None;
        self.set_state(TrainState::Idle);

        if let (Some(observer), Some(station)) = (&self.observer, self.leg_destination) {
            observer.on_no_path_found(self.id, station);
        }
        effects
    }

    /// Turn effects into outgoing messages, spawning timers for wakeups.
    fn deliveries(&self, me: &ActorHandle, effects: Vec<Effect>) -> Vec<Delivery> {
        let train = TrainRef {
            id: self.id,
            handle: me.clone(),
        };
        let Some(directory) = self.directory.as_ref() else {
            warn!(train = %self.id, "Train has no component directory");
            return Vec::new();
        };

        let mut out = Vec::new();
        for effect in effects {
            let (to, message) = match effect {
                Effect::RequestRoute {
                    target,
                    position,
                    destination,
                    direction,
                } => (
                    directory.component(target),
                    Outgoing::Route(RouteRequest {
                        journey: self.journey.clone(),
                        train: train.clone(),
                        position,
                        destination,
                        direction,
                    }),
                ),
                Effect::RequestLock(target) => (
                    directory.component(target),
                    Outgoing::Lock(LockRequest {
                        journey: self.journey.clone(),
                        train: train.clone(),
                    }),
                ),
                Effect::RequestMove(target) => (
                    directory.component(target),
                    Outgoing::Move(MoveRequest {
                        journey: self.journey.clone(),
                        train: train.clone(),
                    }),
                ),
                Effect::Release(target) => (
                    directory.component(target),
                    Outgoing::Release(Release { train: self.id }),
                ),
                Effect::Departed(station) => (
                    directory.station(station),
                    Outgoing::Departed(TrainDeparted { train: self.id }),
                ),
                Effect::Arrived(station) => (
                    directory.station(station),
                    Outgoing::Arrived(TrainArrived { train: self.id }),
                ),
                Effect::Wake { after, wakeup } => {
                    let handle = me.clone();
                    let msg = TrainWakeup {
                        journey: self.journey.clone(),
                        wakeup,
                    };
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        handle.send(msg).await;
                    });
                    continue;
                }
            };

            match to {
                Some(to) => out.push(Delivery {
                    to: to.clone(),
                    message,
                }),
                None => warn!(train = %self.id, ?message, "No actor for target, dropping"),
            }
        }
        out
    }
}

#[derive(Debug)]
enum Outgoing {
    Route(RouteRequest),
    Lock(LockRequest),
    Move(MoveRequest),
    Release(Release),
    Departed(TrainDeparted),
    Arrived(TrainArrived),
}

struct Delivery {
    to: ActorHandle,
    message: Outgoing,
}

/// Send in effect order so a component sees release before the next lock.
async fn deliver(deliveries: Vec<Delivery>) {
    for Delivery { to, message } in deliveries {
        match message {
            Outgoing::Route(msg) => to.send(msg).await,
            Outgoing::Lock(msg) => to.send(msg).await,
            Outgoing::Move(msg) => to.send(msg).await,
            Outgoing::Release(msg) => to.send(msg).await,
            Outgoing::Departed(msg) => to.send(msg).await,
            Outgoing::Arrived(msg) => to.send(msg).await,
        }
    }
}

/// Spawn parameters for a train.
pub struct TrainActor {
    pub id: TrainId,
    pub start: Location,
    pub graph: Arc<TrackGraph>,
    pub directory: Arc<ComponentDirectory>,
    pub config: SimulationConfig,
    pub observer: Arc<dyn NetworkObserver>,
}

impl TrainActor {
    pub async fn spawn(self, runtime: &mut ActorRuntime) -> ActorHandle {
        let mut actor =
            runtime.new_actor_with_name::<TrainActorState>(format!("Train:{}", self.id.0));

        actor.model = TrainActorState::new(
            self.id,
            self.start,
            self.graph,
            self.config,
            self.observer,
        );
        actor.model.directory = Some(self.directory);

        configure_train_actor(&mut actor);

        actor.start().await
    }
}

fn configure_train_actor(actor: &mut ManagedActor<Idle, TrainActorState>) {
    actor.mutate_on::<BeginJourney>(|actor, context| {
        let msg = context.message().clone();
        let me = actor.handle().clone();
        let effects = actor.model.begin_journey(msg.destination, msg.via);
        Reply::pending(deliver(actor.model.deliveries(&me, effects)))
    });

    actor.mutate_on::<RouteResponse>(|actor, context| {
        let msg = context.message().clone();
        let me = actor.handle().clone();
        let effects = actor.model.on_route_response(&msg);
        Reply::pending(deliver(actor.model.deliveries(&me, effects)))
    });

    actor.mutate_on::<LockResponse>(|actor, context| {
        let msg = context.message().clone();
        let me = actor.handle().clone();
        let effects = actor.model.on_lock_response(&msg);
        Reply::pending(deliver(actor.model.deliveries(&me, effects)))
    });

    actor.mutate_on::<MoveResponse>(|actor, context| {
        let msg = context.message().clone();
        let me = actor.handle().clone();
        let effects = actor.model.on_move_response(&msg);
        Reply::pending(deliver(actor.model.deliveries(&me, effects)))
    });

    actor.mutate_on::<TrainWakeup>(|actor, context| {
        let msg = context.message().clone();
        let me = actor.handle().clone();
        let effects = actor.model.on_wakeup(&msg);
        Reply::pending(deliver(actor.model.deliveries(&me, effects)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{SegmentId, SwitchId};
    use crate::layout::LayoutRecord;
    use crate::observer::{ChannelObserver, NullObserver, TrainEvent};

    fn seg(i: usize) -> ComponentId {
        ComponentId::Segment(SegmentId(i))
    }

    fn line() -> Arc<TrackGraph> {
        Arc::new(
            TrackGraph::build(&[
                LayoutRecord::station(0.0, 0.0),
                LayoutRecord::track(0.0, 0.0, 4.0, 0.0),
                LayoutRecord::station(4.0, 0.0),
            ])
            .unwrap(),
        )
    }

    fn train_at(graph: Arc<TrackGraph>, x: f64, y: f64) -> TrainActorState {
        TrainActorState::new(
            TrainId(1),
            Location::new(x, y),
            graph,
            SimulationConfig::default().with_seed(11),
            Arc::new(NullObserver),
        )
    }

    fn route_response(train: &TrainActorState, path: Option<Vec<ComponentId>>) -> RouteResponse {
        RouteResponse {
            journey: train.journey.clone(),
            origin: seg(0),
            path,
            note: String::new(),
        }
    }

    fn lock_response(train: &TrainActorState, component: ComponentId, granted: bool) -> LockResponse {
        LockResponse {
            journey: train.journey.clone(),
            component,
            granted,
        }
    }

    fn wakeup(train: &TrainActorState, wakeup: Wakeup) -> TrainWakeup {
        TrainWakeup {
            journey: train.journey.clone(),
            wakeup,
        }
    }

    #[test]
    fn test_begin_journey_requests_route() {
        let mut train = train_at(line(), 0.0, 0.0);
        let effects = train.begin_journey(StationId(1), None);

        assert_eq!(train.state, TrainState::SeekingPath);
        assert!(train.journey.starts_with("journey"));
        assert_eq!(
            effects,
            vec![Effect::RequestRoute {
                target: seg(0),
                position: Location::new(0.0, 0.0),
                destination: Location::new(4.0, 0.0),
                direction: Direction::Right,
            }]
        );

        // A second request while busy is ignored
        assert!(train.begin_journey(StationId(0), None).is_empty());
    }

    #[test]
    fn test_single_segment_journey() {
        let mut train = train_at(line(), 0.0, 0.0);
        train.begin_journey(StationId(1), None);

        let effects = train.on_route_response(&route_response(&train, Some(vec![seg(0)])));
        assert_eq!(train.state, TrainState::LockingPath);
        assert_eq!(effects, vec![Effect::RequestLock(seg(0))]);

        let effects = train.on_lock_response(&lock_response(&train, seg(0), true));
        assert_eq!(train.state, TrainState::Moving);
        assert_eq!(
            effects,
            vec![Effect::Departed(StationId(0)), Effect::RequestMove(seg(0))]
        );

        let effects = train.on_move_response(&MoveResponse {
            journey: train.journey.clone(),
            component: seg(0),
            granted: true,
        });
        let Some(Effect::Wake { wakeup: step, .. }) = effects.first().cloned() else {
            panic!("expected a step timer, got {effects:?}");
        };
        assert_eq!(step, Wakeup::StepComplete(Location::new(4.0, 0.0)));

        let effects = train.on_wakeup(&wakeup(&train, step));
        assert_eq!(
            effects,
            vec![Effect::Release(seg(0)), Effect::Arrived(StationId(1))]
        );
        assert_eq!(train.state, TrainState::Idle);
        assert_eq!(train.location, Location::new(4.0, 0.0));
        assert_eq!(train.odometer, 4.0);
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let mut train = train_at(line(), 0.0, 0.0);
        train.begin_journey(StationId(1), None);

        let mut stale = route_response(&train, Some(vec![seg(0)]));
        stale.journey = "journey_old".to_string();
        assert!(train.on_route_response(&stale).is_empty());
        assert_eq!(train.state, TrainState::SeekingPath);

        // Lock response before any route
        assert!(train.on_lock_response(&lock_response(&train, seg(0), true)).is_empty());
    }

    #[test]
    fn test_denied_locks_retry_then_restart() {
        let graph = Arc::new(
            TrackGraph::build(&[
                LayoutRecord::station(0.0, 0.0),
                LayoutRecord::subdivided_track(0.0, 0.0, 6.0, 0.0, 3),
                LayoutRecord::station(6.0, 0.0),
            ])
            .unwrap(),
        );
        let mut train = train_at(graph, 0.0, 0.0);
        train.begin_journey(StationId(1), None);
        train.on_route_response(&route_response(&train, Some(vec![seg(0), seg(1), seg(2)])));

        assert_eq!(
            train.on_lock_response(&lock_response(&train, seg(0), true)),
            vec![Effect::RequestLock(seg(1))]
        );

        // First two denials retry the same component after the short delay
        for _ in 0..2 {
            let effects = train.on_lock_response(&lock_response(&train, seg(1), false));
            assert_eq!(train.state, TrainState::WaitingForPath);
            assert_eq!(
                effects,
                vec![Effect::Wake {
                    after: Duration::from_millis(500),
                    wakeup: Wakeup::RetryLock
                }]
            );
            assert_eq!(
                train.on_wakeup(&wakeup(&train, Wakeup::RetryLock)),
                vec![Effect::RequestLock(seg(1))]
            );
            assert_eq!(train.state, TrainState::LockingPath);
        }

        // Third denial gives up the pass: release what is held, back off
        let effects = train.on_lock_response(&lock_response(&train, seg(1), false));
        assert_eq!(effects[0], Effect::Release(seg(0)));
        let Effect::Wake { after, wakeup: next } = effects[1].clone() else {
            panic!("expected backoff, got {effects:?}");
        };
        assert_eq!(next, Wakeup::RestartLocking);
        assert!(after >= Duration::from_millis(500) && after < Duration::from_millis(1500));
        assert!(train.locks.held().is_empty());

        // Restart begins from the first component again
        assert_eq!(
            train.on_wakeup(&wakeup(&train, Wakeup::RestartLocking)),
            vec![Effect::RequestLock(seg(0))]
        );
    }

    #[test]
    fn test_no_path_reports_and_goes_idle() {
        let (observer, mut rx) = ChannelObserver::new();
        let mut train = TrainActorState::new(
            TrainId(3),
            Location::new(0.0, 0.0),
            line(),
            SimulationConfig::default(),
            Arc::new(observer),
        );
        train.begin_journey(StationId(1), None);
        assert!(train.on_route_response(&route_response(&train, None)).is_empty());
        assert_eq!(train.state, TrainState::Idle);

        let events: Vec<TrainEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(events.contains(&TrainEvent::NoPathFound {
            train: TrainId(3),
            destination: StationId(1),
        }));
    }

    #[test]
    fn test_no_starting_track_fails_immediately() {
        let mut train = train_at(line(), 10.0, 10.0);
        assert!(train.begin_journey(StationId(0), None).is_empty());
        assert_eq!(train.state, TrainState::Idle);
    }

    #[test]
    fn test_disconnected_route_is_rejected() {
        let mut train = train_at(line(), 0.0, 0.0);
        train.begin_journey(StationId(1), None);
        let bogus = Some(vec![ComponentId::Switch(SwitchId(4))]);
        assert!(train.on_route_response(&route_response(&train, bogus)).is_empty());
        assert_eq!(train.state, TrainState::Idle);
    }

    #[test]
    fn test_via_station_starts_next_leg() {
        let graph = Arc::new(
            TrackGraph::build(&[
                LayoutRecord::station(0.0, 0.0),
                LayoutRecord::track(0.0, 0.0, 2.0, 0.0),
                LayoutRecord::station(2.0, 0.0),
                LayoutRecord::track(2.0, 0.0, 4.0, 0.0),
                LayoutRecord::station(4.0, 0.0),
            ])
            .unwrap(),
        );
        let mut train = train_at(graph, 0.0, 0.0);
        train.begin_journey(StationId(2), Some(StationId(1)));
        let first_leg = train.journey.clone();

        train.on_route_response(&route_response(&train, Some(vec![seg(0)])));
        train.on_lock_response(&lock_response(&train, seg(0), true));
        train.on_move_response(&MoveResponse {
            journey: train.journey.clone(),
            component: seg(0),
            granted: true,
        });
        let effects = train.on_wakeup(&wakeup(
            &train,
            Wakeup::StepComplete(Location::new(2.0, 0.0)),
        ));

        assert_eq!(effects[0], Effect::Release(seg(0)));
        assert_eq!(effects[1], Effect::Arrived(StationId(1)));
        assert!(matches!(effects[2], Effect::RequestRoute { .. }));
        assert_eq!(train.state, TrainState::SeekingPath);
        assert_ne!(train.journey, first_leg);
        assert_eq!(train.leg_destination, Some(StationId(2)));
    }

    #[test]
    fn test_reversed_track_is_routed_and_planned() {
        let graph = Arc::new(
            TrackGraph::build(&[
                LayoutRecord::station(0.0, 0.0),
                LayoutRecord::track(4.0, 0.0, 0.0, 0.0),
                LayoutRecord::station(4.0, 0.0),
            ])
            .unwrap(),
        );
        let mut train = train_at(graph, 0.0, 0.0);
        let effects = train.begin_journey(StationId(1), None);
        assert_eq!(
            effects,
            vec![Effect::RequestRoute {
                target: seg(0),
                position: Location::new(0.0, 0.0),
                destination: Location::new(4.0, 0.0),
                direction: Direction::Right,
            }]
        );

        let effects = train.on_route_response(&route_response(&train, Some(vec![seg(0)])));
        assert_eq!(effects, vec![Effect::RequestLock(seg(0))]);
        let plan = train.plan.as_ref().unwrap();
        assert_eq!(
            plan.points(),
            &[Location::new(0.0, 0.0), Location::new(4.0, 0.0)]
        );
    }

    #[test]
    fn test_already_at_destination_completes() {
        let mut train = train_at(line(), 4.0, 0.0);
        let effects = train.begin_journey(StationId(1), None);
        assert_eq!(effects, vec![Effect::Arrived(StationId(1))]);
        assert_eq!(train.state, TrainState::Idle);
    }
}
