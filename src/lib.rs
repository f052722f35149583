//! Monthly attendance ledger and salary reconciliation.
//!
//! This crate turns the sparse attendance records kept by a backend into a
//! dense one-row-per-day ledger for a month, prices it from the employee's
//! monthly salary, and coordinates single-day and bulk attendance writes
//! against the backend.

#![warn(missing_docs)]

pub mod cache;
pub mod calculation;
pub mod client;
pub mod clock;
pub mod config;
pub mod coordination;
pub mod error;
pub mod export;
pub mod models;
pub mod service;
