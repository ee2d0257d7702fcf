//! Layout records: the parsed input from which the track graph is built.
//!
//! Reading these from text is the job of the caller; the kernel only
//! consumes an ordered list. Order matters: it becomes the registration
//! order that makes route search deterministic.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// One line of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutRecord {
    /// A journey endpoint.
    Station { location: Location },
    /// A straight track, optionally subdivided into `segments` pieces.
    Track {
        start: Location,
        end: Location,
        segments: Option<u32>,
    },
    /// A junction node.
    Switch { location: Location },
}

impl LayoutRecord {
    pub fn station(x: f64, y: f64) -> Self {
        LayoutRecord::Station {
            location: Location::new(x, y),
        }
    }

    pub fn track(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        LayoutRecord::Track {
            start: Location::new(x1, y1),
            end: Location::new(x2, y2),
            segments: None,
        }
    }

    pub fn subdivided_track(x1: f64, y1: f64, x2: f64, y2: f64, segments: u32) -> Self {
        LayoutRecord::Track {
            start: Location::new(x1, y1),
            end: Location::new(x2, y2),
            segments: Some(segments),
        }
    }

    pub fn switch(x: f64, y: f64) -> Self {
        LayoutRecord::Switch {
            location: Location::new(x, y),
        }
    }

    /// Every coordinate this record mentions.
    pub(crate) fn locations(&self) -> Vec<Location> {
        match self {
            LayoutRecord::Station { location } | LayoutRecord::Switch { location } => {
                vec![*location]
            }
            LayoutRecord::Track { start, end, .. } => vec![*start, *end],
        }
    }
}
