//! Core publishing pipeline and its supporting services

pub mod clock;
pub mod logging;
pub mod observability;
pub mod publishing;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{PeriodicTask, SweepScheduler};
