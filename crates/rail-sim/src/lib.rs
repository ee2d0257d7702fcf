//! Rail Sim - command-line harness around the rail kernel.
//!
//! Reads plain-text layouts, parses journey requests, and drives a
//! [`rail_kernel::RailNetwork`] until every train has either arrived or
//! given up.
//!
//! ## Layout format
//!
//! One record per line, whitespace separated, `#` starts a comment:
//!
//! ```text
//! station 0 0
//! track 0 0 4 0 2     # subdivided into two segments
//! switch 4 0
//! ```

pub mod journeys;
pub mod layout_file;
pub mod report;
pub mod runner;

pub use journeys::{JourneySpec, parse_point};
pub use layout_file::{parse_layout, read_layout};
pub use report::{JourneyOutcome, JourneyReport, RunReport};
pub use runner::{RunOptions, run_journeys};
