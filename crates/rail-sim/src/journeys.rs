//! Journey requests from the command line.
//!
//! A journey is written `FROM:TO` or `FROM:VIA:TO`, each point as `x,y`,
//! for example `0,0:4,0:6,1`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use rail_kernel::{Location, StationId, TrackGraph};

/// Parse a point written `x,y`.
pub fn parse_point(text: &str) -> Result<Location> {
    let (x, y) = text
        .split_once(',')
        .with_context(|| format!("`{text}` is not a point, expected x,y"))?;
    let x: f64 = x
        .trim()
        .parse()
        .with_context(|| format!("bad x coordinate in `{text}`"))?;
    let y: f64 = y
        .trim()
        .parse()
        .with_context(|| format!("bad y coordinate in `{text}`"))?;
    Ok(Location::new(x, y))
}

/// A requested journey before it is matched against a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneySpec {
    pub from: Location,
    pub via: Option<Location>,
    pub to: Location,
}

/// A journey whose stops are known stations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJourney {
    pub start: Location,
    pub via: Option<StationId>,
    pub destination: StationId,
}

impl JourneySpec {
    /// Match the stops against the layout's stations.
    ///
    /// The start only has to lie on the network; stops must be stations.
    pub fn resolve(&self, graph: &TrackGraph) -> Result<ResolvedJourney> {
        let station = |location: Location| {
            graph
                .station_at(&location)
                .map(|s| s.id())
                .ok_or_else(|| anyhow!("no station at {location}"))
        };

        Ok(ResolvedJourney {
            start: self.from,
            via: self.via.map(station).transpose()?,
            destination: station(self.to)?,
        })
    }
}

impl FromStr for JourneySpec {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let points = text
            .split(':')
            .map(parse_point)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid journey `{text}`"))?;

        match points.as_slice() {
            [from, to] => Ok(Self {
                from: *from,
                via: None,
                to: *to,
            }),
            [from, via, to] => Ok(Self {
                from: *from,
                via: Some(*via),
                to: *to,
            }),
            _ => bail!("journey `{text}` must be FROM:TO or FROM:VIA:TO"),
        }
    }
}

impl fmt::Display for JourneySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.from)?;
        if let Some(via) = self.via {
            write!(f, " via {via}")?;
        }
        write!(f, " to {}", self.to)
    }
}
