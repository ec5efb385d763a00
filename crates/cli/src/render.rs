use holdings_core::models::analytics::PortfolioTotals;
use holdings_core::models::holding::{Holding, SparkTrend};
use holdings_core::models::portfolio::Portfolio;
use holdings_core::models::settings::Fiat;

const SPARK_TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Width of the terminal sparkline, in characters.
const SPARK_WIDTH: usize = 24;

pub fn money(value: f64, fiat: Fiat) -> String {
    format!("{value:.2} {}", fiat.iso())
}

/// Small quantities get more decimals.
pub fn quantity(value: f64) -> String {
    if value.abs() < 1.0 {
        format!("{value:.8}")
    } else {
        format!("{value:.4}")
    }
}

/// Downsample a series to `width` points and map each to a block glyph.
pub fn sparkline(series: &[f64], width: usize) -> String {
    if series.len() < 2 || width == 0 {
        return String::new();
    }
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max - min > 0.0 { max - min } else { 1.0 };
    let points = width.min(series.len());

    (0..points)
        .map(|i| {
            let idx = i * (series.len() - 1) / (points - 1).max(1);
            let level = ((series[idx] - min) / span * (SPARK_TICKS.len() - 1) as f64).round();
            SPARK_TICKS[level as usize]
        })
        .collect()
}

fn holding_line(h: &Holding, portfolio: &Portfolio) -> String {
    let fiat = portfolio.settings.fiat;
    let mut line = format!(
        "{:<6} {:<18} {:>16} @ {:>14}  value {:>14}  P/L {:>14}",
        h.symbol,
        h.name,
        quantity(h.amount),
        money(h.price, fiat),
        money(h.market_value(), fiat),
        money(h.profit_loss(), fiat),
    );
    if portfolio.settings.show_badges {
        line.push_str(&format!("  24h {:+.2}%  7d {:+.2}%", h.change_24h, h.change_7d));
    }
    if portfolio.settings.show_spark {
        let trend = match h.spark_trend() {
            Some(SparkTrend::Up) => "↑",
            Some(SparkTrend::Down) => "↓",
            None => " ",
        };
        line.push_str(&format!("  {trend} {}", sparkline(&h.spark_7d, SPARK_WIDTH)));
    }
    line
}

pub fn print_portfolio(portfolio: &Portfolio, totals: &PortfolioTotals) {
    let fiat = totals.currency;
    for holding in &portfolio.items {
        println!("{}", holding_line(holding, portfolio));
    }
    if !portfolio.items.is_empty() {
        println!();
    }
    println!(
        "Total value {}   Invested {}   P/L {} ({:.2}%)",
        money(totals.total_value, fiat),
        money(totals.total_invested, fiat),
        money(totals.profit_loss, fiat),
        totals.profit_loss_pct,
    );
    match (&totals.best, &totals.worst) {
        (Some(best), Some(worst)) => println!(
            "Best: {} {}   Worst: {} {}",
            best.symbol,
            money(best.profit_loss, fiat),
            worst.symbol,
            money(worst.profit_loss, fiat),
        ),
        _ => println!("Best: -   Worst: -"),
    }
    for slice in &totals.allocation {
        println!("  {:<6} {:>6.2}%  {}", slice.symbol, slice.pct, slice.color);
    }
}
