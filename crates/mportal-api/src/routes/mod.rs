//! # API Route Modules
//!
//! - `registrations`: staff registration intake and the pre-submit
//!   duplicate check.
//! - `submissions`: read-only submission and call-log views for the
//!   recovery screen.
//! - `storehub`: sync entry points (create, manual retry, cancel) and the
//!   deprecated batch recovery endpoint.

pub mod registrations;
pub mod storehub;
pub mod submissions;
