//! Acton-reactive actors for the rail network.
//!
//! One actor per segment, switch, station and train. The graph is shared
//! read-only; occupancy lives only inside the segment and switch actors.
//!
//! ```text
//! BeginJourney → Train
//!   ├─ RouteRequest (journey id) → start Segment/Switch
//!   │   └─ RouteResponse (path) → Train
//!   ├─ LockRequest → route[0], route[1], … in order
//!   │   ├─ LockResponse(granted) → Train, next component
//!   │   └─ LockResponse(denied) → retry, or Release all + backoff + restart
//!   ├─ TrainDeparted → Station
//!   ├─ MoveRequest → current component
//!   │   └─ MoveResponse → Train, step timer → Release component left behind
//!   └─ Release remaining + TrainArrived → Station
//! ```
//!
//! Segment and switch mailboxes serialize every lock decision, so a
//! component can never be granted to two trains at once.

mod lockable;
mod segment_actor;
mod station_actor;
mod switch_actor;
mod train_actor;

pub use lockable::{LockableState, Occupancy};
pub use segment_actor::SegmentActor;
pub use station_actor::{StationActor, StationActorState};
pub use switch_actor::SwitchActor;
pub use train_actor::{Effect, TrainActor, TrainActorState};
