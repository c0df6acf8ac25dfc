use pokemon_battle_rooms::arena::{run_arena, ArenaOptions};
use pokemon_battle_rooms::dex::StaticDex;
use std::sync::Arc;

fn options(matches: usize, seed: u64) -> ArenaOptions {
    ArenaOptions {
        matches,
        seed,
        ..ArenaOptions::default()
    }
}

#[test]
fn every_match_is_accounted_for() {
    let summary = run_arena(Arc::new(StaticDex), &options(12, 7)).expect("arena runs");
    assert_eq!(summary.matches, 12);
    assert_eq!(summary.side_a_wins + summary.side_b_wins + summary.draws, 12);
    assert!(summary.stalled <= summary.draws);
    assert!(summary.average_turns >= 1.0);
    assert!(f64::from(summary.longest_match) >= summary.average_turns);
    assert!(summary.log.is_empty());
}

#[test]
fn same_seed_same_summary() {
    let first = run_arena(Arc::new(StaticDex), &options(8, 42)).expect("arena runs");
    let second = run_arena(Arc::new(StaticDex), &options(8, 42)).expect("arena runs");
    assert_eq!(
        serde_json::to_value(&first).expect("serializable"),
        serde_json::to_value(&second).expect("serializable")
    );
}

#[test]
fn verbose_run_keeps_the_first_log() {
    let opts = ArenaOptions {
        keep_log: true,
        ..options(3, 5)
    };
    let summary = run_arena(Arc::new(StaticDex), &opts).expect("arena runs");
    assert!(summary.log.iter().any(|line| line.contains(" used ")));
}

#[test]
fn zero_matches_is_an_error() {
    assert!(run_arena(Arc::new(StaticDex), &options(0, 1)).is_err());
}
