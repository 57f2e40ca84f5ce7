//! Fixed-step animation helpers, meant to be advanced from
//! [`GraphicsFlow::on_tick`](crate::flow::GraphicsFlow::on_tick).

pub mod day_cycle;
pub mod oscillator;
pub mod path;

pub use day_cycle::{DayCycle, Sun};
pub use oscillator::Oscillator;
pub use path::{Path, PathFollower, PathStep, Traffic, ring_points};
