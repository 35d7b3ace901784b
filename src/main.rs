use api_client::{BinanceClient, ExchangeClient, SimClient};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use core_types::Position;
use engine::{DashboardEngine, DateRange, OrderFilter, TradeFilter};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian account-analytics dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys live in .env during development; absence is fine for --sim.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = configuration::load_settings()?;

    let client: Arc<dyn ExchangeClient> = if cli.sim {
        Arc::new(SimClient::new())
    } else {
        Arc::new(BinanceClient::new(
            !cli.testnet,
            &settings.api,
            &settings.http,
        ))
    };
    let engine = DashboardEngine::new(client, settings);

    match cli.command {
        Commands::Summary => render_summary(&engine).await,
        Commands::Positions => render_positions(&engine).await,
        Commands::Orders(args) => render_orders(&engine, args).await,
        Commands::Trades(args) => render_trades(&engine, args).await,
        Commands::Report(args) => render_report(&engine, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Account analytics for a derivatives trading account: balances,
/// positions, orders, trade history, and performance metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use the exchange's testnet instead of production.
    #[arg(long, global = true)]
    testnet: bool,

    /// Use the simulated backend (no credentials, deterministic data).
    #[arg(long, global = true)]
    sim: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the account summary (balance, unrealized PNL, margin).
    Summary,
    /// List open positions.
    Positions,
    /// List open orders.
    Orders(OrderArgs),
    /// List executed trades.
    Trades(FilterArgs),
    /// Compute the performance report (PNL curve, win rate, ratios, ranking).
    Report(FilterArgs),
}

#[derive(Parser)]
struct OrderArgs {
    /// Restrict to one symbol (e.g. "BTCUSDT"); omit for all.
    #[arg(long)]
    symbol: Option<String>,
}

#[derive(Parser)]
struct FilterArgs {
    /// Restrict to one symbol (e.g. "BTCUSDT"); omit for all.
    #[arg(long)]
    symbol: Option<String>,

    /// Start of the date range, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date range, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn trade_filter(&self) -> anyhow::Result<TradeFilter> {
        Ok(TradeFilter {
            symbol: self.symbol.clone(),
            range: self.date_range()?,
            sides: None,
        })
    }

    fn date_range(&self) -> anyhow::Result<Option<DateRange>> {
        match (self.from, self.to) {
            (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end))),
            (None, None) => Ok(None),
            _ => anyhow::bail!("--from and --to must be given together"),
        }
    }
}

// ==============================================================================
// View Rendering
// ==============================================================================

async fn render_summary(engine: &DashboardEngine) -> anyhow::Result<()> {
    let summary = engine.account_summary().await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "USDT"]);
    table.add_row(vec!["Balance".to_string(), summary.balance.to_string()]);
    table.add_row(vec![
        "Unrealized PNL".to_string(),
        summary.unrealized_pnl.to_string(),
    ]);
    table.add_row(vec![
        "Margin Balance".to_string(),
        summary.margin_balance.to_string(),
    ]);
    table.add_row(vec![
        "Available Balance".to_string(),
        summary.available_balance.to_string(),
    ]);
    println!("{table}");
    Ok(())
}

async fn render_positions(engine: &DashboardEngine) -> anyhow::Result<()> {
    let positions = engine.positions().await?;
    warn_dropped(positions.dropped);

    if positions.records.is_empty() {
        println!("No open positions.");
        return Ok(());
    }

    println!("{}", position_table(&positions.records));
    Ok(())
}

async fn render_orders(engine: &DashboardEngine, args: OrderArgs) -> anyhow::Result<()> {
    let filter = OrderFilter {
        symbol: args.symbol.clone(),
        ..Default::default()
    };
    let orders = engine.open_orders(&filter).await?;
    warn_dropped(orders.dropped);

    if orders.records.is_empty() {
        println!("No open orders.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Symbol", "Side", "Type", "Price", "Quantity", "Status"]);
    for order in &orders.records {
        table.add_row(vec![
            order.symbol.clone(),
            order.side.to_string(),
            order.order_type.to_string(),
            order.price.to_string(),
            order.quantity.to_string(),
            order.status.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn render_trades(engine: &DashboardEngine, args: FilterArgs) -> anyhow::Result<()> {
    let trades = engine.trade_history(&args.trade_filter()?).await?;
    warn_dropped(trades.dropped);

    if trades.records.is_empty() {
        println!("No trades in the selected window.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Time",
        "Symbol",
        "Side",
        "Price",
        "Quantity",
        "Realized PNL",
        "Commission",
    ]);
    for trade in &trades.records {
        table.add_row(vec![
            trade.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            trade.symbol.clone(),
            trade.side.to_string(),
            trade.price.to_string(),
            trade.quantity.to_string(),
            trade.realized_pnl.to_string(),
            trade.commission.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn render_report(engine: &DashboardEngine, args: FilterArgs) -> anyhow::Result<()> {
    let summary = engine.performance(&args.trade_filter()?).await?;
    let report = &summary.report;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        "Total Net PNL".to_string(),
        report.total_net_pnl.to_string(),
    ]);
    table.add_row(vec![
        "Total Trades".to_string(),
        report.total_trades.to_string(),
    ]);
    table.add_row(vec!["Win Rate".to_string(), format_pct(report.win_rate)]);
    table.add_row(vec![
        "Profit Factor".to_string(),
        format_opt(report.profit_factor),
    ]);
    table.add_row(vec![
        "Max Drawdown".to_string(),
        report.max_drawdown.to_string(),
    ]);
    table.add_row(vec![
        "Sharpe Ratio".to_string(),
        format_opt(report.sharpe_ratio),
    ]);
    table.add_row(vec![
        "Sortino Ratio".to_string(),
        format_opt(report.sortino_ratio),
    ]);
    println!("{table}");

    if !summary.curve.is_empty() {
        let mut curve = Table::new();
        curve
            .load_preset(UTF8_FULL)
            .set_header(vec!["Date", "Daily PNL", "Cumulative PNL"]);
        for point in &summary.curve {
            curve.add_row(vec![
                point.date.to_string(),
                point.daily_pnl.to_string(),
                point.cumulative_pnl.to_string(),
            ]);
        }
        println!("{curve}");
    }

    if !summary.winners.is_empty() {
        println!("Top winners:");
        println!("{}", position_table(&summary.winners));
    }
    if !summary.losers.is_empty() {
        println!("Top losers:");
        println!("{}", position_table(&summary.losers));
    }
    Ok(())
}

fn position_table(positions: &[Position]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Symbol",
        "Size",
        "Entry Price",
        "Mark Price",
        "Unrealized PNL",
    ]);
    for position in positions {
        table.add_row(vec![
            position.symbol.clone(),
            position.size.to_string(),
            position.entry_price.to_string(),
            // Unknown is rendered as such, never as a fake zero.
            position
                .mark_price
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            position.unrealized_pnl.to_string(),
        ]);
    }
    table
}

fn format_opt(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.round_dp(4).to_string())
}

fn format_pct(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::from(100)).round_dp(2))
}

fn warn_dropped(dropped: usize) {
    if dropped > 0 {
        tracing::warn!(dropped, "some venue records were malformed and skipped");
    }
}
