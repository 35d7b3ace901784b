//! # Meridian Metrics Engine
//!
//! This crate derives the trader-facing statistics from normalized account
//! records: daily and cumulative PNL curves, win rate, profit factor,
//! drawdown, Sharpe/Sortino ratios, and ranked winners/losers.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O, no hidden state. Every invocation is a
//!   deterministic function of the records passed in, which makes the
//!   results reproducible and the crate trivial to test.
//! - **Undefined is a value:** metrics that are mathematically undefined on
//!   a given input (profit factor with no losses, Sharpe with one data
//!   point) come back as `None`, never as a NaN, a zero, or an error.
//!   Callers render "N/A" without special-casing control flow.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the stateless calculator.
//! - `PerformanceReport`: the bundle of computed metrics.
//! - `top_winners` / `top_losers`: deterministic PNL ranking.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod ranking;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use ranking::{top_losers, top_winners};
pub use report::PerformanceReport;
