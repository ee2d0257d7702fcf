//! The sample layouts shipped in `layouts/` load and behave as documented.

use std::path::PathBuf;
use std::time::Duration;

use rail_kernel::{LayoutError, SimulationConfig, TrackGraph};
use rail_sim::{JourneySpec, RunOptions, read_layout, run_journeys};

fn layout(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../layouts")
        .join(name)
}

#[test]
fn test_sample_layouts_build() {
    for name in ["simple.txt", "branch_rejoin.txt", "through_station.txt"] {
        let records = read_layout(layout(name)).unwrap();
        let graph = TrackGraph::build(&records).unwrap();
        assert!(!graph.segments().is_empty(), "{name} has no segments");
        assert!(graph.stations().len() >= 2, "{name} needs two stations");
    }
}

#[test]
fn test_broken_crossing_rejected() {
    let records = read_layout(layout("broken_crossing.txt")).unwrap();
    let err = TrackGraph::build(&records).unwrap_err();
    assert!(matches!(err, LayoutError::CrossingTracks { .. }));
}

#[test]
fn test_sample_config_parses() {
    let json = std::fs::read_to_string(layout("config.json")).unwrap();
    let config = SimulationConfig::from_json(&json).unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.locking.retry_limit, 3);
}

#[tokio::test]
async fn test_through_station_journey_runs() {
    let graph = TrackGraph::build(&read_layout(layout("through_station.txt")).unwrap()).unwrap();
    let journeys: Vec<JourneySpec> = vec!["0,0:4,0:8,0".parse().unwrap()];
    let options = RunOptions {
        config: SimulationConfig::fast().with_seed(11),
        timeout: Duration::from_secs(10),
        settle: Duration::from_millis(50),
    };

    let report = run_journeys(graph, &journeys, options).await.unwrap();

    assert!(report.all_completed(), "{:?}", report.journeys);
    assert_eq!(report.violations, 0);
    assert_eq!(report.held_at_end, 0);
}
