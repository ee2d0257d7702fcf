//! Configuration errors raised while building the track graph.
//!
//! Routing failures and lock contention are not errors: the first is an
//! `Option` from the search and a callback on the observer, the second is
//! absorbed by the train's retry loop.

use thiserror::Error;

use crate::location::Location;

/// A layout that cannot be turned into a valid track graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout contains no track segments")]
    NoTracks,

    #[error("record {index}: coordinate is not a finite number")]
    NonFiniteCoordinate { index: usize },

    #[error("record {index}: track from {start} to {end} has zero length")]
    ZeroLengthTrack {
        index: usize,
        start: Location,
        end: Location,
    },

    #[error("record {index}: subdivision count must be at least 1")]
    ZeroSubdivision { index: usize },

    #[error("record {index}: duplicate station at {location}")]
    DuplicateStation { index: usize, location: Location },

    #[error("record {index}: duplicate switch at {location}")]
    DuplicateSwitch { index: usize, location: Location },

    #[error("tracks {first} and {second} cross without sharing an endpoint")]
    CrossingTracks { first: String, second: String },

    #[error("invalid {side} connection: {neighbor} does not meet {segment}")]
    InvalidConnection {
        side: &'static str,
        segment: String,
        neighbor: String,
    },

    #[error("invalid simulation config: {0}")]
    Config(String),
}
