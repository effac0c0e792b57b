//! End-to-end searches over Conway's Life, verified by re-simulating every
//! found pattern with the reference stepper.

use oscil_engine::{Outcome, Pattern, Row, Rule, Search, SearchConfig, Symmetry};
use oscil_rules::step_rows;

/// Bitmaps of the rendered grid, one per printed row.
fn grid_rows(p: &Pattern) -> Vec<Row> {
    p.grid()
        .iter()
        .map(|cells| {
            cells
                .iter()
                .enumerate()
                .fold(0, |acc, (i, &live)| acc | (u32::from(live) << i))
        })
        .collect()
}

/// The pattern must be live, repeat after `period` generations without
/// leaving its bounding box, and (for `period > 1`) actually change.
fn assert_oscillates(p: &Pattern, rule: Rule, period: usize) {
    let rows = grid_rows(p);
    assert!(rows.iter().any(|&r| r != 0), "pattern is empty:\n{p}");
    let start: Vec<Row> = rows.iter().map(|r| r << 2).collect();

    let mut cur = start.clone();
    for gen in 1..=period {
        cur = step_rows(rule, &cur);
        if gen == 1 && period > 1 {
            assert!(
                cur[1..1 + start.len()] != start[..],
                "pattern is still after one generation:\n{p}"
            );
        }
    }
    // `step_rows` grows one border row per side per generation; all of the
    // growth must have stayed dead and the core must have returned.
    assert_eq!(cur.len(), start.len() + 2 * period);
    for i in 0..period {
        assert_eq!(cur[i], 0, "pattern leaked above:\n{p}");
        assert_eq!(cur[cur.len() - 1 - i], 0, "pattern leaked below:\n{p}");
    }
    assert_eq!(
        &cur[period..period + start.len()],
        &start[..],
        "pattern does not repeat after {period} generations:\n{p}"
    );
}

/// Scenario: a still-life search over a 3-wide box finds a block (or some
/// other genuine still life).
#[test]
fn still_life_search_finds_a_still_life() {
    let cfg = SearchConfig {
        period: 1,
        symmetry: Symmetry::None,
        rotor_width: 3,
        ..SearchConfig::default()
    };
    let mut search = Search::new(cfg).unwrap();
    match search.run().unwrap() {
        Outcome::Found(p) => assert_oscillates(&p, Rule::LIFE, 1),
        Outcome::Exhausted => panic!("still-life search found nothing"),
    }
}

/// Scenario: a symmetric period-2 search finds the blinker (or another
/// true period-2 oscillator).
#[test]
fn symmetric_p2_search_finds_an_oscillator() {
    let cfg = SearchConfig {
        period: 2,
        symmetry: Symmetry::Odd,
        rotor_width: 2,
        right_stator_width: 1,
        ..SearchConfig::default()
    };
    let mut search = Search::new(cfg).unwrap();
    match search.run().unwrap() {
        Outcome::Found(p) => assert_oscillates(&p, Rule::LIFE, 2),
        Outcome::Exhausted => panic!("period-2 search found nothing"),
    }
}

/// Scenario: a narrow period-3 search exhausts and still reports the
/// deepest line it explored.
#[test]
fn narrow_p3_search_exhausts() {
    let cfg = SearchConfig {
        period: 3,
        symmetry: Symmetry::None,
        rotor_width: 4,
        ..SearchConfig::default()
    };
    let mut search = Search::new(cfg).unwrap();
    match search.run().unwrap() {
        Outcome::Found(p) => panic!("unexpected pattern in a 4-wide P3 box:\n{p}"),
        Outcome::Exhausted => {}
    }
    assert!(
        search.deepest_line().is_some(),
        "an exhausted search still dumps its deepest line"
    );
    assert!(search.deepest_lines_rendered().is_some());
}

/// Scenario: equal configurations (same hash seed) reproduce the result
/// byte for byte.
#[test]
fn identical_runs_identical_output() {
    let cfg = SearchConfig {
        period: 2,
        symmetry: Symmetry::Odd,
        rotor_width: 2,
        right_stator_width: 1,
        ..SearchConfig::default()
    };
    let run = |cfg: SearchConfig| -> Vec<String> {
        let mut search = Search::new(cfg).unwrap();
        match search.run().unwrap() {
            Outcome::Found(p) => p.lines,
            Outcome::Exhausted => panic!("expected a pattern"),
        }
    };
    assert_eq!(run(cfg.clone()), run(cfg));
}

/// Still lifes found with row symmetry disabled must close via the stator
/// DP and still verify.
#[test]
fn still_life_without_row_symmetry() {
    let cfg = SearchConfig {
        period: 1,
        symmetry: Symmetry::None,
        rotor_width: 3,
        allow_row_sym: false,
        ..SearchConfig::default()
    };
    let mut search = Search::new(cfg).unwrap();
    match search.run().unwrap() {
        Outcome::Found(p) => assert_oscillates(&p, Rule::LIFE, 1),
        Outcome::Exhausted => panic!("still-life search found nothing"),
    }
}
