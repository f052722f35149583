//! Write coordination.
//!
//! Single-day writes go through [`AttendanceWriteCoordinator`], which
//! serializes writes per employee and day and falls back between write
//! strategies. Bulk writes go through [`BulkWriteCoordinator`], which
//! applies statuses optimistically and rolls them back on failure.

mod bulk;
mod write;

pub use bulk::{
    BULK_FAILURE_MESSAGE, BulkOutcome, BulkWriteCoordinator, RosterEntry, bulk_success_message,
};
pub use write::{AttendanceWriteCoordinator, DayWrite, WriteOutcome, WriteStrategy};
