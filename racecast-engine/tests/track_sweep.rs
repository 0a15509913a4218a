use std::collections::HashSet;

use racecast_engine::{
    ConstantSource, DriverRegistry, FeatureWeights, PredictionResult, QualifyingGrid, RaceEvent,
    RngBundle, TrackRegistry, TrackWeather, generate_predictions, simulate_qualifying,
};

fn run(track_key: &str, seed: u64, chaos: bool) -> (QualifyingGrid, PredictionResult) {
    let drivers = DriverRegistry::builtin();
    let track = TrackRegistry::builtin().require(track_key).unwrap();
    let bundle = RngBundle::from_user_seed(seed);
    let grid = simulate_qualifying(drivers, track, &mut *bundle.qualifying()).unwrap();
    let result = generate_predictions(
        drivers,
        track,
        &grid,
        &FeatureWeights::default(),
        chaos,
        &mut *bundle.race(),
    )
    .unwrap();
    (grid, result)
}

fn assert_well_formed(grid: &QualifyingGrid, result: &PredictionResult) {
    assert_eq!(result.entries.len(), grid.len());

    let codes: HashSet<_> = result.entries.iter().map(|e| &e.driver).collect();
    assert_eq!(codes.len(), grid.len(), "every driver finishes exactly once");

    for (i, entry) in result.entries.iter().enumerate() {
        assert_eq!(entry.position, i + 1);
        assert_eq!(grid.position_of(&entry.driver), Some(entry.grid_position));
        let expected_change = i32::try_from(entry.grid_position).unwrap()
            - i32::try_from(entry.position).unwrap();
        assert_eq!(entry.position_change, expected_change);
        assert!(entry.confidence <= 100);
        for value in [
            entry.factors.track,
            entry.factors.pace,
            entry.factors.quali,
            entry.factors.team,
            entry.factors.weather,
        ] {
            assert!((0.0..=1.0).contains(&value), "factor out of range: {value}");
        }
    }

    let leader = &result.entries[0];
    assert!(leader.gap.abs() < f64::EPSILON);
    for pair in result.entries.windows(2) {
        assert!(pair[0].score >= pair[1].score);
        assert!(pair[0].gap <= pair[1].gap);
    }
}

#[test]
fn every_track_produces_a_well_formed_classification() {
    for track in TrackRegistry::builtin().iter() {
        for seed in [1_u64, 0xF1, 0xDEAD_BEEF] {
            for chaos in [false, true] {
                let (grid, result) = run(&track.key, seed, chaos);
                assert_eq!(result.track_key, track.key);
                assert_eq!(result.chaos, chaos);
                assert_well_formed(&grid, &result);
            }
        }
    }
}

#[test]
fn qualifying_orders_lap_times_on_every_track() {
    for track in TrackRegistry::builtin().iter() {
        let (grid, _) = run(&track.key, 2024, false);
        assert_eq!(grid.len(), DriverRegistry::builtin().len());
        for pair in grid.entries().windows(2) {
            assert!(pair[0].lap_time <= pair[1].lap_time, "{}", track.key);
        }
    }
}

#[test]
fn wet_races_lower_model_confidence() {
    let drivers = DriverRegistry::builtin();
    let tracks = TrackRegistry::builtin();
    let dry = tracks.iter().find(|t| t.weather == TrackWeather::Dry).unwrap();
    let wet = tracks.iter().find(|t| t.weather == TrackWeather::Wet).unwrap();

    let grid = simulate_qualifying(drivers, dry, &mut ConstantSource::neutral()).unwrap();
    let weights = FeatureWeights::default();
    let on_dry =
        generate_predictions(drivers, dry, &grid, &weights, false, &mut ConstantSource::neutral())
            .unwrap();
    let on_wet =
        generate_predictions(drivers, wet, &grid, &weights, false, &mut ConstantSource::neutral())
            .unwrap();

    for entry in &on_dry.entries {
        let wet_entry = on_wet.entry(entry.driver.as_str()).unwrap();
        assert!(wet_entry.confidence < entry.confidence);
    }
}

#[test]
fn chaos_incidents_never_hit_the_front_row_block() {
    for seed in 0..40_u64 {
        let (_, result) = run("singapore", seed, true);
        let incidents: Vec<_> = result.entries.iter().filter(|e| e.incident).collect();
        assert!(incidents.len() <= 1);
        if let Some(hit) = incidents.first() {
            assert!(hit.grid_position > 3);
            assert!(result.events.iter().any(|event| matches!(
                event,
                RaceEvent::Incident { driver, .. } if *driver == hit.driver
            )));
        }
    }
}

#[test]
fn calm_races_report_no_incidents() {
    for seed in 0..20_u64 {
        let (_, result) = run("monaco", seed, false);
        assert!(result.incident().is_none());
        assert!(
            !result
                .events
                .iter()
                .any(|event| matches!(event, RaceEvent::Incident { .. }))
        );
    }
}
