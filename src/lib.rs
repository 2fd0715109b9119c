//! Constraint-driven generation of a full season of cricket fixtures:
//! double round-robins for every division over an 18-week calendar, honouring
//! fixed matches, per-week venue requirements and shared-ground exclusions,
//! with soft penalties steering the schedule away from long same-venue runs.

pub mod csv;
pub mod data;
pub mod domain;
pub mod grounds;
pub mod output;
pub mod print;
pub mod sat;
pub mod solver;
pub mod timed;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
