//! Drive a network of trains until every journey has finished.

use std::sync::Arc;
use std::time::Duration;

use acton_reactive::prelude::*;
use anyhow::Result;
use rail_kernel::{
    ChannelObserver, FanoutObserver, OccupancyLedger, RailNetwork, SimulationConfig, TrackGraph,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::journeys::JourneySpec;
use crate::report::{JourneyReport, RunReport};

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: SimulationConfig,
    /// Give up waiting after this long
    pub timeout: Duration,
    /// Pause after the last journey ends so trailing releases land
    pub settle: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            timeout: Duration::from_secs(60),
            settle: Duration::from_millis(100),
        }
    }
}

/// Spawn the network, start every journey at once, and collect the outcome.
///
/// Journey stops are checked against the layout before any actor starts.
pub async fn run_journeys(
    graph: TrackGraph,
    journeys: &[JourneySpec],
    options: RunOptions,
) -> Result<RunReport> {
    let resolved = journeys
        .iter()
        .map(|journey| journey.resolve(&graph))
        .collect::<Result<Vec<_>>>()?;

    let started = Instant::now();
    let mut runtime = ActonApp::launch_async().await;

    let ledger = Arc::new(OccupancyLedger::new());
    let (channel, mut rx) = ChannelObserver::new();
    let observer = FanoutObserver::new()
        .with(ledger.clone())
        .with(Arc::new(channel));

    let mut network =
        RailNetwork::spawn(&mut runtime, graph, options.config, Arc::new(observer)).await;

    // Spawn everything first so no train gets a head start on spawning
    let mut trains = Vec::with_capacity(resolved.len());
    let mut reports = Vec::with_capacity(resolved.len());
    for (request, journey) in journeys.iter().zip(&resolved) {
        let train = network.spawn_train(&mut runtime, journey.start).await;
        reports.push(JourneyReport::new(
            train.id,
            request.to_string(),
            journey.destination,
        ));
        trains.push((train, journey));
    }

    for (train, journey) in &trains {
        info!(train = %train.id, destination = %journey.destination, "Starting journey");
        train
            .begin_journey_via(journey.via, journey.destination)
            .await;
    }

    let deadline = Instant::now() + options.timeout;
    let mut timed_out = false;

    while reports.iter().any(|report| !report.is_finished()) {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => {
                debug!(?event, "Network event");
                for report in reports.iter_mut() {
                    if report.record(&event) {
                        info!(
                            train = %report.train,
                            outcome = %report.outcome,
                            moves = report.moves,
                            waits = report.waits,
                            "Journey finished"
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(_) => {
                let unfinished = reports.iter().filter(|r| !r.is_finished()).count();
                warn!(unfinished, timeout = ?options.timeout, "Run timed out");
                timed_out = true;
                break;
            }
        }
    }

    tokio::time::sleep(options.settle).await;

    if let Err(e) = runtime.shutdown_all().await {
        warn!(error = %e, "Runtime shutdown reported an error");
    }

    Ok(RunReport {
        journeys: reports,
        violations: ledger.violations(),
        held_at_end: ledger.held_count(),
        occupancy_changes: ledger.changes(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        timed_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_file::parse_layout;
    use crate::report::JourneyOutcome;

    const BRANCH_REJOIN: &str = "\
station 0 0
track 0 0 2 0
switch 2 0
track 2 0 4 2
track 4 2 6 2
track 6 2 8 0
track 2 0 4 -2
track 4 -2 6 -2
track 6 -2 8 0
switch 8 0
track 8 0 10 0
station 10 0
";

    fn fast_options() -> RunOptions {
        RunOptions {
            config: SimulationConfig::fast().with_seed(7),
            timeout: Duration::from_secs(20),
            settle: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_opposing_journeys_complete_without_violations() {
        let graph = TrackGraph::build(&parse_layout(BRANCH_REJOIN).unwrap()).unwrap();
        let journeys: Vec<JourneySpec> = vec![
            "0,0:10,0".parse().unwrap(),
            "10,0:0,0".parse().unwrap(),
        ];

        // Slow steps so the second train is refused while the first moves
        let mut options = fast_options();
        options.config.movement.step_delay_ms = 50;

        let report = run_journeys(graph, &journeys, options).await.unwrap();

        assert!(!report.timed_out);
        assert!(report.all_completed(), "{:?}", report.journeys);
        let waits: usize = report.journeys.iter().map(|j| j.waits).sum();
        assert!(waits > 0, "{:?}", report.journeys);
        assert_eq!(report.violations, 0);
        assert_eq!(report.held_at_end, 0);
        assert!(report.occupancy_changes > 0);
        for journey in &report.journeys {
            assert!(journey.moves > 0);
        }
    }

    #[tokio::test]
    async fn test_disconnected_journey_reports_no_path() {
        let graph = TrackGraph::build(
            &parse_layout("station 0 0\ntrack 0 0 2 0\ntrack 5 0 7 0\nstation 7 0").unwrap(),
        )
        .unwrap();
        let journeys: Vec<JourneySpec> = vec!["0,0:7,0".parse().unwrap()];

        let report = run_journeys(graph, &journeys, fast_options()).await.unwrap();

        assert_eq!(report.journeys[0].outcome, JourneyOutcome::NoPath);
        assert!(!report.all_completed());
        assert_eq!(report.occupancy_changes, 0);
    }

    #[tokio::test]
    async fn test_unknown_station_rejected_before_spawn() {
        let graph = TrackGraph::build(&parse_layout(BRANCH_REJOIN).unwrap()).unwrap();
        let journeys: Vec<JourneySpec> = vec!["0,0:4,2".parse().unwrap()];

        let err = run_journeys(graph, &journeys, fast_options()).await.unwrap_err();
        assert!(err.to_string().contains("no station at"));
    }
}
