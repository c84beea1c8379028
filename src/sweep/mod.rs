//! Frequency sweep core
//!
//! - [`qualification`]: retune and decide whether a frequency is usable
//! - [`runner`]: bandwidth test on a qualified frequency
//! - [`controller`]: walks the range and yields one result per step

pub mod controller;
pub mod qualification;
pub mod runner;

pub use controller::SweepController;
pub use qualification::{apply_frequency, qualify};
pub use runner::TestRunner;
