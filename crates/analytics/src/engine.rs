use crate::report::PerformanceReport;
use chrono_tz::Tz;
use core_types::{PnlPoint, Trade};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

/// A stateless calculator for deriving performance metrics from trading
/// activity. The only configuration it carries is the reporting time zone,
/// which fixes what "a day" means for PNL bucketing.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine {
    reporting_timezone: Tz,
}

impl AnalyticsEngine {
    pub fn new(reporting_timezone: Tz) -> Self {
        Self { reporting_timezone }
    }

    /// Derives the daily/cumulative PNL curve from a trade set.
    ///
    /// Trades are bucketed by calendar day in the reporting time zone and
    /// accumulated in ascending (timestamp, symbol) order. Decimal addition
    /// is exact, but the order is fixed anyway so results stay reproducible
    /// should the numeric representation ever change.
    pub fn pnl_curve(&self, trades: &[Trade]) -> Vec<PnlPoint> {
        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let mut daily: BTreeMap<chrono::NaiveDate, Decimal> = BTreeMap::new();
        for trade in ordered {
            let day = trade
                .timestamp
                .with_timezone(&self.reporting_timezone)
                .date_naive();
            *daily.entry(day).or_default() += trade.realized_pnl;
        }

        let mut cumulative = Decimal::ZERO;
        daily
            .into_iter()
            .map(|(date, daily_pnl)| {
                cumulative += daily_pnl;
                PnlPoint {
                    date,
                    daily_pnl,
                    cumulative_pnl: cumulative,
                }
            })
            .collect()
    }

    /// The main entry point: computes the full metrics bundle for a trade
    /// set. An empty set yields the zeroed report.
    pub fn calculate(&self, trades: &[Trade]) -> PerformanceReport {
        let mut report = PerformanceReport::new();

        if trades.is_empty() {
            return report;
        }

        self.calculate_profitability(trades, &mut report);

        let curve = self.pnl_curve(trades);
        report.max_drawdown = max_drawdown(&curve);
        self.calculate_ratios(&curve, &mut report);

        report
    }

    /// Profitability pass: gross buckets, counts, win rate, profit factor.
    fn calculate_profitability(&self, trades: &[Trade], report: &mut PerformanceReport) {
        report.total_trades = trades.len();

        for trade in trades {
            let pnl = trade.realized_pnl;
            report.total_net_pnl += pnl;

            // Strict comparisons: a zero-PNL trade is neither a win nor a
            // loss, but it still counts toward the total.
            if pnl > Decimal::ZERO {
                report.gross_profit += pnl;
                report.winning_trades += 1;
            } else if pnl < Decimal::ZERO {
                report.gross_loss += pnl.abs();
                report.losing_trades += 1;
            }
        }

        if report.total_trades > 0 {
            report.win_rate =
                Decimal::from(report.winning_trades) / Decimal::from(report.total_trades);
        }

        if report.gross_loss > Decimal::ZERO {
            report.profit_factor = Some(report.gross_profit / report.gross_loss);
        }

        if report.winning_trades > 0 {
            report.average_win =
                Some(report.gross_profit / Decimal::from(report.winning_trades));
        }

        if report.losing_trades > 0 {
            report.average_loss = Some(report.gross_loss / Decimal::from(report.losing_trades));
        }
    }

    /// Ratio pass: Sharpe and Sortino over the daily PNL series.
    fn calculate_ratios(&self, curve: &[PnlPoint], report: &mut PerformanceReport) {
        let daily: Vec<Decimal> = curve.iter().map(|p| p.daily_pnl).collect();
        if daily.len() < 2 {
            return;
        }

        let n = Decimal::from(daily.len());
        let mean = daily.iter().sum::<Decimal>() / n;

        let variance = daily
            .iter()
            .map(|d| (*d - mean) * (*d - mean))
            .sum::<Decimal>()
            / n;
        report.sharpe_ratio = match variance.sqrt() {
            Some(std_dev) if std_dev > Decimal::ZERO => Some(mean / std_dev),
            _ => None,
        };

        // Downside deviation: only losing days contribute, measured against
        // a zero target.
        let losses: Vec<Decimal> = daily.iter().copied().filter(|d| *d < Decimal::ZERO).collect();
        if losses.is_empty() {
            return;
        }
        let downside_variance =
            losses.iter().map(|d| *d * *d).sum::<Decimal>() / Decimal::from(losses.len());
        report.sortino_ratio = match downside_variance.sqrt() {
            Some(dev) if dev > Decimal::ZERO => Some(mean / dev),
            _ => None,
        };
    }
}

/// Maximum observed decline from a running peak, in one pass over the
/// cumulative series.
fn max_drawdown(curve: &[PnlPoint]) -> Decimal {
    let Some(first) = curve.first() else {
        return Decimal::ZERO;
    };

    let mut peak = first.cumulative_pnl;
    let mut max_decline = Decimal::ZERO;
    for point in curve {
        if point.cumulative_pnl > peak {
            peak = point.cumulative_pnl;
        }
        let decline = peak - point.cumulative_pnl;
        if decline > max_decline {
            max_decline = decline;
        }
    }
    max_decline
}
