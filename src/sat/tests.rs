use super::search::{Options, Status};
use super::*;

fn quick() -> Options {
    Options {
        max_time: std::time::Duration::from_secs(10),
        workers: 1,
        seed: 42,
    }
}

#[test]
fn linear_equality_fixes_the_slack() {
    let mut model = Model::new();
    let x = model.new_int(0, 9);
    let y = model.new_int(0, 9);
    model.fix(x, 3);
    model.linear(vec![(1, x), (1, y)], 7, 7);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(3, outcome.value(x));
    assert_eq!(4, outcome.value(y));
}

#[test]
fn negative_coefficients() {
    let mut model = Model::new();
    let x = model.new_int(0, 9);
    let y = model.new_int(0, 9);
    model.fix(y, 2);
    // x - y == 5
    model.linear(vec![(1, x), (-1, y)], 5, 5);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(7, outcome.value(x));
}

#[test]
fn contradictory_bounds_are_infeasible() {
    let mut model = Model::new();
    let x = model.new_bool();
    let y = model.new_bool();
    model.fix(x, 1);
    model.fix(y, 1);
    model.at_most(&[x, y], 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Infeasible, outcome.status);
}

#[test]
fn eq_reif_in_both_directions() {
    let mut model = Model::new();
    let x = model.new_int(1, 9);
    let b = model.eq_reif(x, 4);
    model.fix(b, 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(4, outcome.value(x));

    let mut model = Model::new();
    let x = model.new_int(1, 9);
    let b = model.eq_reif(x, 4);
    model.fix(x, 4);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(1, outcome.value(b));

    let mut model = Model::new();
    let x = model.new_int(1, 9);
    let b = model.eq_reif(x, 4);
    model.fix(b, 0);
    model.linear(vec![(1, x)], 4, 5);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(5, outcome.value(x));
}

#[test]
fn and_reif_in_both_directions() {
    let mut model = Model::new();
    let x = model.new_bool();
    let y = model.new_bool();
    let b = model.and_reif(vec![x.pos(), y.neg()]);
    model.fix(b, 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!((1, 0), (outcome.value(x), outcome.value(y)));

    let mut model = Model::new();
    let x = model.new_bool();
    let y = model.new_bool();
    let b = model.and_reif(vec![x.pos(), y.pos()]);
    model.fix(x, 1);
    model.fix(y, 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(1, outcome.value(b));

    // forcing the reification false with one conjunct true flips the other
    let mut model = Model::new();
    let x = model.new_bool();
    let y = model.new_bool();
    let b = model.and_reif(vec![x.pos(), y.pos()]);
    model.fix(b, 0);
    model.fix(x, 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(0, outcome.value(y));
}

#[test]
fn enforcement_literal_gates_a_linear() {
    let mut model = Model::new();
    let gate = model.new_bool();
    let x = model.new_int(0, 9);
    model.linear_if(vec![(1, x)], 7, 7, gate.pos());
    model.fix(gate, 1);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(7, outcome.value(x));

    // an unsatisfiable gated constraint drives the gate false
    let mut model = Model::new();
    let gate = model.new_bool();
    let x = model.new_int(0, 5);
    model.linear_if(vec![(1, x)], 7, 7, gate.pos());
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(0, outcome.value(gate));
}

#[test]
fn minimization_prefers_the_cheap_penalty() {
    let mut model = Model::new();
    let costly = model.new_bool();
    let cheap = model.new_bool();
    model.linear(vec![(1, costly), (1, cheap)], 1, 2);
    model.minimize(100, costly);
    model.minimize(50, cheap);
    model.decide(costly);
    model.decide(cheap);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_eq!(50, outcome.objective);
    assert_eq!(0, outcome.value(costly));
    assert_eq!(1, outcome.value(cheap));
}

#[test]
fn deferred_values_are_tried_last() {
    let mut model = Model::new();
    let x = model.new_int(0, 3);
    model.decide_deferring(x, 0);
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    assert_ne!(0, outcome.value(x));
}

#[test]
fn round_robin_toy() {
    // 4 teams, 3 weeks: every pair meets once, every team plays weekly
    let mut model = Model::new();
    let pairs = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    let weeks: Vec<Var> = pairs.iter().map(|_| model.new_int(1, 3)).collect();
    for &week in &weeks {
        model.decide(week);
    }
    for team in 0..4 {
        for week_value in 1..=3 {
            let in_week: Vec<Var> = pairs
                .iter()
                .zip(&weeks)
                .filter(|((t1, t2), _)| *t1 == team || *t2 == team)
                .map(|(_, &week)| model.eq_reif(week, week_value))
                .collect();
            model.exactly(&in_week, 1);
        }
    }
    let outcome = model.solve(&quick());
    assert_eq!(Status::Optimal, outcome.status);
    for team in 0..4 {
        let mut played = [false; 4];
        for (pair, &week) in pairs.iter().zip(&weeks) {
            if pair.0 == team || pair.1 == team {
                let week = outcome.value(week) as usize;
                assert!(!played[week], "team {team} double-booked in week {week}");
                played[week] = true;
            }
        }
        assert_eq!(3, played.iter().filter(|&&p| p).count());
    }
}

#[test]
fn single_worker_same_seed_is_deterministic() {
    let build = || {
        let mut model = Model::new();
        let vars: Vec<Var> = (0..8).map(|_| model.new_int(0, 9)).collect();
        for &var in &vars {
            model.decide(var);
        }
        for window in vars.windows(2) {
            model.linear(vec![(1, window[0]), (1, window[1])], 3, 12);
        }
        model
    };
    let first = build().solve(&quick());
    let second = build().solve(&quick());
    assert_eq!(Status::Optimal, first.status);
    let firsts: Vec<u8> = (0..8).map(|index| first.value(Var(index))).collect();
    let seconds: Vec<u8> = (0..8).map(|index| second.value(Var(index))).collect();
    assert_eq!(firsts, seconds);
}

#[test]
fn unknown_without_time() {
    let mut model = Model::new();
    // a deliberately large pigeonhole-flavoured instance with no time to solve it
    let vars: Vec<Var> = (0..40).map(|_| model.new_int(0, 30)).collect();
    for &var in &vars {
        model.decide(var);
    }
    for (index, window) in vars.windows(2).enumerate() {
        model.linear(
            vec![(1, window[0]), (-1, window[1])],
            index as i32 % 3 - 1,
            index as i32 % 5 + 4,
        );
    }
    let outcome = model.solve(&Options {
        max_time: std::time::Duration::from_millis(0),
        workers: 1,
        seed: 1,
    });
    assert!(matches!(outcome.status, Status::Unknown | Status::Feasible | Status::Optimal));
}
