//! Reconciliation core
//!
//! Pure checks (time tokens, deltas, names, fastest lap) plus the two pieces
//! that touch the store: block resolution and the engine that stages and
//! commits a record.

pub mod block;
pub mod delta;
pub mod engine;
pub mod fastest_lap;
pub mod names;
pub mod time_token;
pub mod warnings;

pub use block::{read_grid_label, relocate_block, resolve_block, BlockResolution};
pub use delta::validate_deltas;
pub use engine::{ReconcileOutcome, ReconciliationEngine};
pub use fastest_lap::{FastestLap, FastestLapTracker};
pub use names::{CarResolution, DriverResolution, ReferenceTables};
pub use time_token::{digits_value, parse_time, ParsedTime};
pub use warnings::Warning;
