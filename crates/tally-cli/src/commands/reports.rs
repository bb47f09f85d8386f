//! Spending analysis and insight commands

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use tally_core::{CancellationToken, GroupBy, Severity, SpendingInsight, SpendingService};

use super::truncate;
use crate::cli::PeriodArgs;

/// Earliest date used by the `all` preset and an open-ended --to
const ALL_TIME_START: (i32, u32, u32) = (2000, 1, 1);

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Invalid date {}-{:02}-{:02}", year, month, day))
}

fn parse_cli_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
}

/// Resolve period arguments into a half-open `[start, end)` range.
///
/// Presets that run "until now" end tomorrow so today is included.
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
) -> Result<(NaiveDate, NaiveDate)> {
    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);
    let (all_y, all_m, all_d) = ALL_TIME_START;

    // Custom dates override the preset; a missing side stays open
    if custom_from.is_some() || custom_to.is_some() {
        let from = match custom_from {
            Some(from) => parse_cli_date(from, "--from")?,
            None => ymd(all_y, all_m, all_d)?,
        };
        let to = match custom_to {
            Some(to) => parse_cli_date(to, "--to")?,
            None => tomorrow,
        };
        return Ok((from, to));
    }

    let this_month = ymd(today.year(), today.month(), 1)?;

    match period.to_lowercase().as_str() {
        "this-month" => Ok((this_month, tomorrow)),
        "last-month" => {
            let last_month = if today.month() == 1 {
                ymd(today.year() - 1, 12, 1)?
            } else {
                ymd(today.year(), today.month() - 1, 1)?
            };
            Ok((last_month, this_month))
        }
        "this-year" => Ok((ymd(today.year(), 1, 1)?, tomorrow)),
        "last-30-days" => Ok((tomorrow - Duration::days(30), tomorrow)),
        "last-90-days" => Ok((tomorrow - Duration::days(90), tomorrow)),
        "all" => Ok((ymd(all_y, all_m, all_d)?, tomorrow)),
        _ => bail!(
            "Unknown period: {}. Available: this-month, last-month, this-year, last-30-days, last-90-days, all",
            period
        ),
    }
}

pub fn cmd_analyze(
    service: &SpendingService,
    user_id: i64,
    period: &PeriodArgs,
    group_by: &str,
    json: bool,
) -> Result<()> {
    let (from, to) = resolve_period(&period.period, period.from.as_deref(), period.to.as_deref())?;
    let group_by: GroupBy = group_by.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let analysis =
        service.analyze_spending(user_id, from, to, group_by, &CancellationToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!();
    println!(
        "📊 Spending for user {} ({} to {}, exclusive)",
        user_id, analysis.period_start, analysis.period_end
    );
    println!();
    println!("   Spent:  ${:>10.2}", analysis.total_spent);
    println!("   Income: ${:>10.2}", analysis.total_income);
    println!("   Net:    ${:>10.2}", analysis.net_amount);

    if analysis.category_breakdown.is_empty() {
        println!();
        println!("No spending in this period.");
    } else {
        println!();
        println!("  Category             │     Amount │      % │ Count");
        println!("───────────────────────┼────────────┼────────┼───────");
        for row in &analysis.category_breakdown {
            println!(
                "  {:<20} │ {:>10.2} │ {:>5.1}% │ {:>5}",
                truncate(&row.category_name, 20),
                row.amount,
                row.percentage,
                row.transaction_count
            );
        }
    }

    if !analysis.spending_trends.is_empty() {
        println!();
        println!("📈 Trends ({}, strategy: {})", group_by.as_str(), service.trend_strategy());
        for trend in &analysis.spending_trends {
            println!(
                "   {:<12} {:>10.2}  {:>+6.1}%  {:?}",
                trend.label, trend.amount, trend.change_percent, trend.direction
            );
        }
    }

    print_insights(&analysis.insights);
    Ok(())
}

pub fn cmd_insights(
    service: &SpendingService,
    user_id: i64,
    period: &PeriodArgs,
    json: bool,
) -> Result<()> {
    let (from, to) = resolve_period(&period.period, period.from.as_deref(), period.to.as_deref())?;
    let insights = service.get_spending_insights(user_id, from, to, &CancellationToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    print_insights(&insights);
    Ok(())
}

fn print_insights(insights: &[SpendingInsight]) {
    println!();
    if insights.is_empty() {
        println!("✅ No insights for this period");
        return;
    }

    println!("💡 Insights");
    for insight in insights {
        let icon = match insight.severity {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🔵",
        };
        println!("   {} [{}] {}", icon, insight.insight_type, insight.title);
        println!("      {}", insight.description);
    }
}
