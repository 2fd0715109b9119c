//! The solving engine: depth-first search with fixpoint propagation, seeded
//! randomized value ordering, geometric restarts and branch-and-bound on the
//! objective, run as a portfolio of independently seeded workers.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tinyrand::{Rand, Seeded, StdRand};
use tracing::debug;

use super::{mask_below, Constraint, Decision, Lit, Model, Var};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Status {
    /// A solution was found and the search space was exhausted.
    Optimal,
    /// A solution was found but time ran out before optimality was proved.
    Feasible,
    /// The search space was exhausted without finding a solution.
    Infeasible,
    /// Time ran out before any solution was found.
    Unknown,
}
impl Status {
    pub fn solved(&self) -> bool {
        matches!(self, Status::Optimal | Status::Feasible)
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub max_time: Duration,
    pub workers: usize,
    pub seed: u64,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            max_time: Duration::from_secs(300),
            workers: 8,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Outcome {
    pub status: Status,
    pub objective: i64,
    values: Vec<u8>,
}
impl Outcome {
    pub fn value(&self, var: Var) -> u8 {
        self.values[var.0 as usize]
    }

    pub fn bool_value(&self, var: Var) -> bool {
        self.values[var.0 as usize] != 0
    }
}

const INITIAL_RESTART_BUDGET: u64 = 512;

impl Model {
    /// Solves the model within the given budget. Statuses follow the usual
    /// CP convention; `Feasible` outcomes carry the best incumbent found.
    pub fn solve(&self, options: &Options) -> Outcome {
        // contradictory pins empty a domain before the search even starts
        if self.domains.iter().any(|&mask| mask == 0) {
            debug!("a variable was pinned to contradictory values");
            return Outcome {
                status: Status::Infeasible,
                objective: 0,
                values: vec![],
            };
        }

        let deadline = Instant::now() + options.max_time;
        let watchers = self.build_watchers();
        let shared = Shared {
            bound: AtomicI64::new(i64::MAX),
            stop: AtomicBool::new(false),
            exhausted: AtomicBool::new(false),
            incumbent: Mutex::new(None),
        };
        let workers = options.workers.max(1);

        thread::scope(|scope| {
            for index in 0..workers {
                let seed = options
                    .seed
                    .wrapping_add((index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
                let watchers = &watchers;
                let shared = &shared;
                scope.spawn(move || {
                    let mut search = Search::new(self, watchers, shared, seed, deadline);
                    search.run();
                });
            }
        });

        let incumbent = shared
            .incumbent
            .lock()
            .expect("incumbent lock poisoned")
            .take();
        let exhausted = shared.exhausted.load(Ordering::Acquire);
        let (status, objective, values) = match (incumbent, exhausted) {
            (Some((objective, values)), true) => (Status::Optimal, objective, values),
            (Some((objective, values)), false) => (Status::Feasible, objective, values),
            (None, true) => (Status::Infeasible, 0, vec![]),
            (None, false) => (Status::Unknown, 0, vec![]),
        };
        debug!("solve finished: {status}, objective {objective}");
        Outcome {
            status,
            objective,
            values,
        }
    }

    fn build_watchers(&self) -> Vec<Vec<u32>> {
        let mut watchers = vec![vec![]; self.num_vars()];
        for (index, constraint) in self.constraints.iter().enumerate() {
            let mut watch = |var: Var| watchers[var.0 as usize].push(index as u32);
            match constraint {
                Constraint::Linear { terms, enforce, .. } => {
                    for &(_, var) in terms {
                        watch(var);
                    }
                    if let Some(lit) = enforce {
                        watch(lit.var);
                    }
                }
                Constraint::EqReif { lit, var, .. } => {
                    watch(*lit);
                    watch(*var);
                }
                Constraint::AndReif { lit, of } => {
                    watch(*lit);
                    for lit in of {
                        watch(lit.var);
                    }
                }
            }
        }
        watchers
    }
}

struct Shared {
    bound: AtomicI64,
    stop: AtomicBool,
    exhausted: AtomicBool,
    incumbent: Mutex<Option<(i64, Vec<u8>)>>,
}

struct Level {
    var: Var,
    value: u8,
    mark: usize,
}

struct Search<'a> {
    model: &'a Model,
    watchers: &'a [Vec<u32>],
    shared: &'a Shared,
    deadline: Instant,
    rand: StdRand,
    domains: Vec<u32>,
    trail: Vec<(u32, u32)>,
    levels: Vec<Level>,
    queue: Vec<u32>,
    in_queue: Vec<bool>,
    conflicts: u64,
    restart_budget: u64,
}

struct Conflict;

impl<'a> Search<'a> {
    fn new(
        model: &'a Model,
        watchers: &'a [Vec<u32>],
        shared: &'a Shared,
        seed: u64,
        deadline: Instant,
    ) -> Self {
        Self {
            model,
            watchers,
            shared,
            deadline,
            rand: StdRand::seed(seed),
            domains: model.domains.clone(),
            trail: vec![],
            levels: vec![],
            queue: (0..model.constraints.len() as u32).collect(),
            in_queue: vec![true; model.constraints.len()],
            conflicts: 0,
            restart_budget: INITIAL_RESTART_BUDGET,
        }
    }

    fn run(&mut self) {
        loop {
            if self.shared.stop.load(Ordering::Acquire) || Instant::now() >= self.deadline {
                return;
            }
            match self.propagate() {
                Err(Conflict) => {
                    self.conflicts += 1;
                    if !self.backtrack() {
                        self.shared.exhausted.store(true, Ordering::Release);
                        self.shared.stop.store(true, Ordering::Release);
                        return;
                    }
                    if self.conflicts >= self.restart_budget {
                        self.restart();
                    }
                }
                Ok(()) => match self.pick_branch() {
                    Some((var, value)) => self.push_level(var, value),
                    None => {
                        let objective = self.record_solution();
                        if self.model.objective.is_empty() {
                            // pure satisfaction: the first solution is final
                            self.shared.exhausted.store(true, Ordering::Release);
                            self.shared.stop.store(true, Ordering::Release);
                            return;
                        }
                        debug!("incumbent with objective {objective}");
                        if !self.backtrack() {
                            self.shared.exhausted.store(true, Ordering::Release);
                            self.shared.stop.store(true, Ordering::Release);
                            return;
                        }
                    }
                },
            }
        }
    }

    // --- domain bookkeeping ---

    fn mask(&self, var: Var) -> u32 {
        self.domains[var.0 as usize]
    }

    fn bounds(&self, var: Var) -> (i64, i64) {
        let mask = self.mask(var);
        (
            mask.trailing_zeros() as i64,
            31 - mask.leading_zeros() as i64,
        )
    }

    fn fixed_value(&self, var: Var) -> Option<u8> {
        let mask = self.mask(var);
        if mask.count_ones() == 1 {
            Some(mask.trailing_zeros() as u8)
        } else {
            None
        }
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.fixed_value(lit.var)
            .map(|value| (value != 0) == lit.positive)
    }

    fn narrow(&mut self, var: Var, keep: u32) -> Result<(), Conflict> {
        let old = self.domains[var.0 as usize];
        let new = old & keep;
        if new == old {
            return Ok(());
        }
        if new == 0 {
            return Err(Conflict);
        }
        self.trail.push((var.0, old));
        self.domains[var.0 as usize] = new;
        for &index in &self.watchers[var.0 as usize] {
            if !self.in_queue[index as usize] {
                self.in_queue[index as usize] = true;
                self.queue.push(index);
            }
        }
        Ok(())
    }

    fn assert_lit(&mut self, lit: Lit, holds: bool) -> Result<(), Conflict> {
        let value = if lit.positive == holds { 1u8 } else { 0u8 };
        self.narrow(lit.var, 1 << value)
    }

    fn narrow_bounds(&mut self, var: Var, lo: i64, hi: i64) -> Result<(), Conflict> {
        let lo = lo.max(0);
        let hi = hi.min(31);
        if lo > hi {
            return Err(Conflict);
        }
        let keep = mask_below(hi as u8 + 1) & !mask_below(lo as u8);
        self.narrow(var, keep)
    }

    // --- propagation ---

    fn propagate(&mut self) -> Result<(), Conflict> {
        loop {
            while let Some(index) = self.queue.pop() {
                self.in_queue[index as usize] = false;
                self.propagate_constraint(index as usize)?;
            }
            if !self.propagate_objective()? {
                return Ok(());
            }
        }
    }

    fn propagate_constraint(&mut self, index: usize) -> Result<(), Conflict> {
        // constraints are immutable; clone-free access needs the split borrow
        match &self.model.constraints[index] {
            Constraint::Linear {
                terms,
                lo,
                hi,
                enforce,
            } => self.propagate_linear(terms, *lo as i64, *hi as i64, *enforce),
            Constraint::EqReif { lit, var, value } => self.propagate_eq_reif(*lit, *var, *value),
            Constraint::AndReif { lit, of } => self.propagate_and_reif(*lit, of),
        }
    }

    fn sum_bounds(&self, terms: &[(i32, Var)]) -> (i64, i64) {
        let mut min = 0i64;
        let mut max = 0i64;
        for &(coef, var) in terms {
            let coef = coef as i64;
            let (lo, hi) = self.bounds(var);
            if coef > 0 {
                min += coef * lo;
                max += coef * hi;
            } else {
                min += coef * hi;
                max += coef * lo;
            }
        }
        (min, max)
    }

    fn propagate_linear(
        &mut self,
        terms: &[(i32, Var)],
        lo: i64,
        hi: i64,
        enforce: Option<Lit>,
    ) -> Result<(), Conflict> {
        if let Some(lit) = enforce {
            match self.lit_value(lit) {
                Some(false) => return Ok(()),
                Some(true) => {}
                None => {
                    let (min, max) = self.sum_bounds(terms);
                    if min > hi || max < lo {
                        self.assert_lit(lit, false)?;
                    }
                    return Ok(());
                }
            }
        }

        let (min, max) = self.sum_bounds(terms);
        if min > hi || max < lo {
            return Err(Conflict);
        }
        for &(coef, var) in terms {
            let coef = coef as i64;
            let (vlo, vhi) = self.bounds(var);
            let (tmin, tmax) = if coef > 0 {
                (coef * vlo, coef * vhi)
            } else {
                (coef * vhi, coef * vlo)
            };
            // the term must fit within what the rest of the sum leaves over
            let term_lo = lo - (max - tmax);
            let term_hi = hi - (min - tmin);
            let (new_lo, new_hi) = if coef > 0 {
                (div_ceil(term_lo, coef), div_floor(term_hi, coef))
            } else {
                (div_ceil(term_hi, coef), div_floor(term_lo, coef))
            };
            self.narrow_bounds(var, new_lo, new_hi)?;
        }
        Ok(())
    }

    fn propagate_eq_reif(&mut self, lit: Var, var: Var, value: u8) -> Result<(), Conflict> {
        let bit = 1u32 << value;
        match self.fixed_value(lit) {
            Some(1) => self.narrow(var, bit),
            Some(_) => self.narrow(var, !bit),
            None => {
                let mask = self.mask(var);
                if mask & bit == 0 {
                    self.narrow(lit, 1 << 0)
                } else if mask == bit {
                    self.narrow(lit, 1 << 1)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn propagate_and_reif(&mut self, lit: Var, of: &[Lit]) -> Result<(), Conflict> {
        match self.fixed_value(lit) {
            Some(1) => {
                for &conjunct in of {
                    self.assert_lit(conjunct, true)?;
                }
                Ok(())
            }
            Some(_) => {
                let mut unknown = None;
                let mut unknowns = 0;
                for &conjunct in of {
                    match self.lit_value(conjunct) {
                        Some(false) => return Ok(()),
                        Some(true) => {}
                        None => {
                            unknown = Some(conjunct);
                            unknowns += 1;
                        }
                    }
                }
                match unknowns {
                    0 => Err(Conflict),
                    1 => self.assert_lit(unknown.expect("an unknown conjunct"), false),
                    _ => Ok(()),
                }
            }
            None => {
                let mut all_true = true;
                for &conjunct in of {
                    match self.lit_value(conjunct) {
                        Some(false) => return self.narrow(lit, 1 << 0),
                        Some(true) => {}
                        None => all_true = false,
                    }
                }
                if all_true {
                    self.narrow(lit, 1 << 1)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Branch-and-bound filtering: prunes once no completion can beat the
    /// incumbent, and zeroes any penalty variable that alone would breach it.
    /// Returns whether any domain changed.
    fn propagate_objective(&mut self) -> Result<bool, Conflict> {
        if self.model.objective.is_empty() {
            return Ok(false);
        }
        let bound = self.shared.bound.load(Ordering::Acquire);
        if bound == i64::MAX {
            return Ok(false);
        }
        let mut lower = 0i64;
        for &(weight, var) in &self.model.objective {
            lower += weight * self.bounds(var).0;
        }
        if lower >= bound {
            return Err(Conflict);
        }
        let mut changed = false;
        for &(weight, var) in &self.model.objective {
            let (lo, hi) = self.bounds(var);
            if lo == 0 && hi == 1 && lower + weight >= bound {
                self.narrow(var, 1 << 0)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    // --- search ---

    fn pick_branch(&mut self) -> Option<(Var, u8)> {
        let mut best: Option<((u8, u32), &Decision)> = None;
        for decision in &self.model.decisions {
            let size = self.mask(decision.var).count_ones();
            let rank = (decision.priority, size);
            if size > 1 && best.map_or(true, |(smallest, _)| rank < smallest) {
                best = Some((rank, decision));
            }
        }
        if let Some((_, decision)) = best {
            let value = self.pick_value(decision);
            return Some((decision.var, value));
        }

        // mop-up: everything the decision variables did not determine
        for index in 0..self.domains.len() {
            let mask = self.domains[index];
            if mask.count_ones() > 1 {
                return Some((Var(index as u32), mask.trailing_zeros() as u8));
            }
        }
        None
    }

    fn pick_value(&mut self, decision: &Decision) -> u8 {
        let mut mask = self.mask(decision.var);
        if let Some(deferred) = decision.deferred {
            let without = mask & !(1u32 << deferred);
            if without != 0 {
                mask = without;
            }
        }
        let mut skip = self.rand.next_u64() % mask.count_ones() as u64;
        let mut value = mask.trailing_zeros() as u8;
        loop {
            if mask & (1 << value) != 0 {
                if skip == 0 {
                    return value;
                }
                skip -= 1;
            }
            value += 1;
        }
    }

    fn push_level(&mut self, var: Var, value: u8) {
        self.levels.push(Level {
            var,
            value,
            mark: self.trail.len(),
        });
        self.narrow(var, 1 << value)
            .unwrap_or_else(|_| unreachable!("branch value taken from the domain"));
    }

    /// Unwinds to the deepest level whose tried value can still be excluded.
    /// Returns false once the root is exhausted.
    fn backtrack(&mut self) -> bool {
        loop {
            let Some(level) = self.levels.pop() else {
                return false;
            };
            self.undo_to(level.mark);
            if self.narrow(level.var, !(1u32 << level.value)).is_ok() {
                return true;
            }
        }
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let (var, mask) = self.trail.pop().expect("trail shorter than its mark");
            self.domains[var as usize] = mask;
        }
    }

    fn restart(&mut self) {
        while let Some(level) = self.levels.pop() {
            self.undo_to(level.mark);
        }
        self.restart_budget *= 2;
        self.conflicts = 0;
        // re-seed propagation so the fresh tree starts from a full fixpoint
        for index in 0..self.in_queue.len() {
            if !self.in_queue[index] {
                self.in_queue[index] = true;
                self.queue.push(index as u32);
            }
        }
    }

    fn record_solution(&mut self) -> i64 {
        let mut objective = 0i64;
        for &(weight, var) in &self.model.objective {
            objective += weight * self.bounds(var).0;
        }
        let values: Vec<u8> = self
            .domains
            .iter()
            .map(|mask| mask.trailing_zeros() as u8)
            .collect();
        self.shared.bound.fetch_min(objective, Ordering::AcqRel);
        let mut incumbent = self
            .shared
            .incumbent
            .lock()
            .expect("incumbent lock poisoned");
        if incumbent
            .as_ref()
            .map_or(true, |(best, _)| objective < *best)
        {
            *incumbent = Some((objective, values));
        }
        objective
    }
}

fn div_floor(dividend: i64, divisor: i64) -> i64 {
    let quotient = dividend / divisor;
    if dividend % divisor != 0 && (dividend < 0) != (divisor < 0) {
        quotient - 1
    } else {
        quotient
    }
}

fn div_ceil(dividend: i64, divisor: i64) -> i64 {
    let quotient = dividend / divisor;
    if dividend % divisor != 0 && (dividend < 0) == (divisor < 0) {
        quotient + 1
    } else {
        quotient
    }
}
