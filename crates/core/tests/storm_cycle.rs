//! End-to-end runs of a configured scenario through the cycle repeater
use hurricane_sim_core::{
    CancellationToken, CycleRepeater, NoopPacer, Pacer, RecordingPublisher, RunSummary,
    SimulationConfig,
};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Marie: L1 always present, L5 weakens below its threshold at tick 45
///
/// L5 wind is `80 - 20 * tick / 60` with no oscillation, so it is 65.33 mph
/// at tick 44 and 65.0 mph at tick 45.
const MARIE: &str = r#"
    [simulation]
    interval_secs = 10
    duration_secs = 600
    seed = 1234

    [[storms]]
    name = "Marie"
    path = [[15.0, -75.0], [27.0, -80.0]]
    intensity_trend_mph = -20.0

    [[storms.levels]]
    level = "L1"
    base_radius_km = 300.0
    base_speed_mph = 45.0

    [[storms.levels]]
    level = "L5"
    base_radius_km = 40.0
    base_speed_mph = 80.0
    speed_amplitude_mph = 0.0
    scaling = { threshold = 65.2 }
"#;

const M1: &str = "producers/hurricane/data/M1";
const M5: &str = "producers/hurricane/data/M5";
const CONTROL: &str = "producers/hurricane/control";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run(cycles: u64, publisher: RecordingPublisher) -> (RunSummary, Vec<(String, Value)>) {
    init_tracing();
    let scenario = SimulationConfig::from_toml_str(MARIE)
        .unwrap()
        .validate()
        .unwrap();
    let purge = scenario.purge_on_start;
    let mut repeater = CycleRepeater::new(scenario.into_cycle(), publisher, NoopPacer)
        .with_max_cycles(Some(cycles))
        .with_purge_on_start(purge);
    let summary = repeater.run();
    let messages = repeater.publisher().json_messages();
    (summary, messages)
}

fn on<'a>(messages: &'a [(String, Value)], topic: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter(|(t, _)| t == topic)
        .map(|(_, v)| v)
        .collect()
}

#[test]
fn test_marie_single_cycle_lifecycle() {
    let (summary, messages) = run(1, RecordingPublisher::new());

    // PURGE goes out before anything else
    assert_eq!(messages[0].0, CONTROL);
    assert_eq!(messages[0].1["action"], "PURGE");

    // Tick 0 births both bands, in configured order
    assert_eq!(messages[1].0, M1);
    assert_eq!(messages[1].1["action"], "PUT");
    assert_eq!(messages[1].1["properties"]["tick"], 0);
    assert_eq!(messages[2].0, M5);
    assert_eq!(messages[2].1["action"], "PUT");

    // L1 refreshes every tick of the cycle
    let l1 = on(&messages, M1);
    let l1_puts: Vec<_> = l1.iter().filter(|v| v["action"] == "PUT").collect();
    assert_eq!(l1_puts.len(), 60);

    // L5 is published for ticks 0..45, then cleared exactly once at tick 45
    let l5 = on(&messages, M5);
    let l5_puts: Vec<_> = l5.iter().filter(|v| v["action"] == "PUT").collect();
    assert_eq!(l5_puts.len(), 45);
    assert_eq!(l5_puts.last().unwrap()["properties"]["tick"], 44);

    let ceased: Vec<_> = l5.iter().filter(|v| v["reason"] == "ceased").collect();
    assert_eq!(ceased.len(), 1);
    assert_eq!(ceased[0]["action"], "CLEAR");
    assert_eq!(ceased[0]["tick"], 45);
    assert_eq!(ceased[0]["timestamp"], 450.0);

    // Boundary: one CLEAR per pair, after every band update
    let boundary: Vec<_> = messages
        .iter()
        .filter(|(_, v)| v["reason"] == "cycle_end")
        .collect();
    assert_eq!(boundary.len(), 2);
    assert_eq!(boundary[0].0, M1);
    assert_eq!(boundary[1].0, M5);
    assert_eq!(boundary[0].1["tick"], 60);
    let tail = &messages[messages.len() - 2..];
    assert!(tail.iter().all(|(_, v)| v["reason"] == "cycle_end"));

    assert_eq!(messages.len(), 1 + 60 + 45 + 1 + 2);
    assert_eq!(
        summary,
        RunSummary {
            cycles_completed: 1,
            ticks_processed: 60,
            records_published: 109,
            publish_failures: 0,
            geometry_skips: 0,
            cancelled: false,
        }
    );
}

#[test]
fn test_put_payload_geometry_and_metadata() {
    let (_, messages) = run(1, RecordingPublisher::new());
    let l1 = on(&messages, M1);

    let first = l1[0];
    assert_eq!(first["id"], "M1");
    assert_eq!(first["geometry"]["type"], "Polygon");
    let ring = first["geometry"]["coordinates"][0].as_array().unwrap();
    assert_eq!(ring.len(), 65);
    assert_eq!(ring[0], ring[64]);

    let props = &first["properties"];
    assert_eq!(props["storm"], "Marie");
    assert_eq!(props["wind_level"], "L1");
    assert_eq!(props["label"], "Low Pressure");
    assert_eq!(props["center_lat"], 15.0);
    assert_eq!(props["center_lon"], -75.0);
    assert_eq!(props["cycle"], 0);
    // Strongest band is L5 at 80 mph: category 1
    assert_eq!(props["category"], 1);

    // Halfway through the cycle the centre is halfway along the track
    let mid = l1
        .iter()
        .find(|v| v["properties"]["tick"] == 30)
        .unwrap();
    let lat = mid["properties"]["center_lat"].as_f64().unwrap();
    let lon = mid["properties"]["center_lon"].as_f64().unwrap();
    assert!((lat - 21.0).abs() < 1e-9);
    assert!((lon + 77.5).abs() < 1e-9);

    // Ring positions are [lon, lat] around the centre
    let lon0 = ring[0][0].as_f64().unwrap();
    let lat0 = ring[0][1].as_f64().unwrap();
    assert!(lon0 > -75.0);
    assert!((lat0 - 15.0).abs() < 0.5);
}

#[test]
fn test_cycle_restarts_with_every_band_absent() {
    let (summary, messages) = run(2, RecordingPublisher::new());
    assert_eq!(summary.cycles_completed, 2);

    let l5 = on(&messages, M5);
    let ceased = l5.iter().filter(|v| v["reason"] == "ceased").count();
    assert_eq!(ceased, 2);

    // First record of the second cycle is a fresh PUT at tick 0
    let second_cycle_start = messages
        .iter()
        .position(|(_, v)| v["action"] == "PUT" && v["properties"]["cycle"] == 1)
        .unwrap();
    let (topic, first) = &messages[second_cycle_start];
    assert_eq!(topic, M1);
    assert_eq!(first["properties"]["tick"], 0);
    assert_eq!(messages[second_cycle_start - 1].1["reason"], "cycle_end");

    // PURGE only once per run
    assert_eq!(on(&messages, CONTROL).len(), 1);
}

#[test]
fn test_publish_failures_do_not_stop_the_loop() {
    let (summary, messages) = run(1, RecordingPublisher::new().fail_on(M5));

    assert!(on(&messages, M5).is_empty());
    assert_eq!(on(&messages, M1).len(), 61);
    assert_eq!(summary.publish_failures, 45 + 1 + 1);
    assert_eq!(summary.cycles_completed, 1);
}

#[test]
fn test_same_seed_same_records() {
    let (_, a) = run(1, RecordingPublisher::new());
    let (_, b) = run(1, RecordingPublisher::new());
    assert_eq!(a, b);
}

/// Cancels the run after a fixed number of inter-tick waits
struct CancelAfter {
    remaining: usize,
    token: CancellationToken,
}

impl Pacer for CancelAfter {
    fn wait(&mut self, interval: Duration) {
        assert_eq!(interval, Duration::from_secs(10));
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancellation_retracts_every_band() {
    init_tracing();
    let scenario = SimulationConfig::from_toml_str(MARIE)
        .unwrap()
        .validate()
        .unwrap();
    let token = CancellationToken::new();
    let pacer = CancelAfter {
        remaining: 10,
        token: token.clone(),
    };
    let mut repeater = CycleRepeater::new(scenario.into_cycle(), RecordingPublisher::new(), pacer)
        .with_cancellation(token)
        .with_max_cycles(None);

    let summary = repeater.run();
    assert!(summary.cancelled);
    assert_eq!(summary.cycles_completed, 0);
    assert_eq!(summary.ticks_processed, 10);

    let messages = repeater.publisher().json_messages();
    let shutdown: Vec<_> = messages
        .iter()
        .filter(|(_, v)| v["reason"] == "shutdown")
        .collect();
    assert_eq!(shutdown.len(), 2);
    assert_eq!(shutdown[0].1["tick"], 10);
    assert_eq!(&messages.last().unwrap().1, &shutdown[1].1);
}
