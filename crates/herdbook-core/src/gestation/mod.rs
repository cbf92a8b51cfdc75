//! Gestation date/state calculator.
//!
//! Derives `estimated_due_date`, `current_gestation_days`, `trimester` and
//! `weight_gain` from the inputs of a [`GestationRecord`](crate::models::GestationRecord).
//! Everything here is a pure function of the record and a caller-supplied
//! `today`; the write path in [`crate::db`] invokes it explicitly before
//! persisting.
//!
//! # Basis date
//!
//! ```text
//! confirmation_date + confirmed_gestation_days ──▶ basis = confirmation − days
//!            │ (absent)
//!            ▼
//!        service_date ─────────────────────────▶ basis = service_date
//!            │ (absent)
//!            ▼
//!   nothing to derive: fields left as they are
//! ```
//!
//! `estimated_due_date = basis + 283 days`.

mod calculator;
mod proximity;

pub use calculator::*;
pub use proximity::*;
