//! # Repository Module
//!
//! One repository per table. Every repository follows the same shape:
//! fetch/get accessors, single-row insert/update/delete, and `apply_batch`,
//! which drains a [`stockdesk_core::ChangeBatch`] in the fixed save order —
//! deletes, then inserts, then updates — one transaction per operation,
//! commit-on-success and rollback-on-error, with the per-operation results
//! collected into a [`stockdesk_core::SaveOutcome`] instead of aborting the
//! remaining operations.

pub mod category;
pub mod item;
pub mod sku;
pub mod transaction;
pub mod user;
