use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The standardized bundle of performance metrics derived from a trade set.
///
/// This struct is the final output of the `AnalyticsEngine` and the data
/// transfer object the presentation layer renders from. Metrics that can be
/// undefined are `Option<_>`: `None` means "not computable on this input"
/// (no losing trades, fewer than two data points), which the consumer
/// renders as N/A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Core Profitability Metrics
    pub total_net_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    /// Gross profit over gross loss magnitude; undefined with no losses.
    pub profit_factor: Option<Decimal>,

    // II. Risk and Drawdown
    /// Largest peak-to-trough decline of the cumulative PNL curve.
    pub max_drawdown: Decimal,
    /// Mean over standard deviation of the daily PNL series. Requires at
    /// least two days and nonzero deviation.
    pub sharpe_ratio: Option<Decimal>,
    /// Like Sharpe, but the deviation is computed over losing days only.
    pub sortino_ratio: Option<Decimal>,

    // III. Trade-Level Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of trades with positive PNL, in [0, 1]. Zero-PNL trades
    /// count in the denominator only. Zero for an empty set by definition,
    /// so this one is not optional.
    pub win_rate: Decimal,
    pub average_win: Option<Decimal>,
    pub average_loss: Option<Decimal>,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out report: the correct answer for an empty
    /// trade set and the starting point for the calculation passes.
    pub fn new() -> Self {
        Self {
            total_net_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: None,
            max_drawdown: Decimal::ZERO,
            sharpe_ratio: None,
            sortino_ratio: None,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: Decimal::ZERO,
            average_win: None,
            average_loss: None,
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
