//! Time-stepped driving of storms and emission of band records

pub mod clock;
pub mod cycle;
pub mod record;
pub mod repeater;

pub use clock::{SimClock, TickTime};
pub use cycle::{LevelPhase, LifecycleTracker, SimulationCycle, TickReport, Transition};
pub use record::{ClearReason, Envelope, OutboundRecord, Topics};
pub use repeater::{CancellationToken, CycleRepeater, NoopPacer, Pacer, RunSummary, ThreadPacer};
