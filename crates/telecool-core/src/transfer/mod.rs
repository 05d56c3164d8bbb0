//! Transfer domain types, events, errors, and rate caps.
//!
//! Pure data types only. No I/O, networking, or runtime dependencies.
//!
//! # Structure
//!
//! - `types` - identifiers and the task value object (`TaskId`, `TransferTask`, `TransferStatus`)
//! - `rate` - byte-rate caps and presets (`RateCap`)
//! - `events` - task state change events (`TransferEvent`)
//! - `errors` - error type for transfer operations

pub mod errors;
pub mod events;
pub mod rate;
pub mod types;

pub use errors::{TransferError, TransferResult};
pub use events::TransferEvent;
pub use rate::{RateCap, RateCapParseError};
pub use types::{
    COMPLETE_FRACTION, ESTIMATE_CEILING, MAX_ESTIMATED_FRACTION, MediaHandle, SourceRef, TaskId,
    TransferStatus, TransferTask,
};
