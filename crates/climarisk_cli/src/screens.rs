//! Text rendering for dashboard, detail and not-found screens.
//!
//! Rendering is pure: every function takes already-loaded data and returns
//! the screen as a string. The `write_*` helpers target any `fmt::Write`
//! sink and propagate its errors.

use climarisk_core::model::analysis::{Analysis, RiskProjection};
use climarisk_core::{Market, MarketId, MarketListing};
use log::warn;
use std::fmt::{self, Write};

const RULE: &str = "----------------------------------------";

pub fn render_dashboard(greeting_name: &str, listing: &MarketListing) -> String {
    build("dashboard", |out| write_dashboard(out, greeting_name, listing))
}

pub fn render_market_detail(market: &Market, preview: &Analysis) -> String {
    build("market_detail", |out| write_market_detail(out, market, preview))
}

pub fn render_not_found(id: &MarketId) -> String {
    format!("Market Not Found\nThis market doesn't exist or has been deleted. (id: {id})\n")
}

pub fn render_saved(market: &Market) -> String {
    format!("Market saved to your dashboard: {}\n", market.id)
}

fn build(screen: &'static str, write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // A String sink only fails when a Display impl reports an error.
    if write(&mut out).is_err() {
        warn!("event=screen_render module=cli status=error screen={screen}");
    }
    out
}

fn write_dashboard(
    out: &mut impl Write,
    greeting_name: &str,
    listing: &MarketListing,
) -> fmt::Result {
    writeln!(out, "Welcome back, {greeting_name}!")?;
    writeln!(
        out,
        "Manage your markets and analyze climate-aware investment opportunities"
    )?;
    writeln!(out)?;
    writeln!(out, "Total markets: {}", listing.count)?;
    writeln!(
        out,
        "Analyses run:  0 ({})",
        if listing.count == 0 {
            "add markets to analyze"
        } else {
            "ready to analyze"
        }
    )?;
    writeln!(out, "{RULE}")?;

    if listing.items.is_empty() {
        writeln!(out, "No markets yet")?;
        return writeln!(
            out,
            "Add your first market to start analyzing climate-aware opportunities: climarisk add"
        );
    }

    writeln!(out, "Your markets")?;
    for market in &listing.items {
        writeln!(out)?;
        write_market_card(out, market)?;
    }
    Ok(())
}

fn write_market_detail(out: &mut impl Write, market: &Market, preview: &Analysis) -> fmt::Result {
    writeln!(out, "{} [{}]", market.market_name, market.asset_class.label())?;
    writeln!(out, "Location: {}", market.location)?;
    writeln!(out, "Added {}", market.created_at.format("%Y-%m-%d"))?;
    if market.updated_at != market.created_at {
        writeln!(out, "Updated {}", market.updated_at.format("%Y-%m-%d"))?;
    }
    writeln!(out, "Id: {}", market.id)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "No Analysis Yet")?;
    writeln!(
        out,
        "Run Analysis (coming soon): available once the analysis backend is connected"
    )?;
    writeln!(out, "{RULE}")?;
    write_preview(out, preview)
}

fn write_market_card(out: &mut impl Write, market: &Market) -> fmt::Result {
    writeln!(
        out,
        "* {} ({})",
        market.market_name,
        market.asset_class.as_str()
    )?;
    writeln!(out, "  {}", market.location)?;
    writeln!(
        out,
        "  Added {}  id={}",
        market.created_at.format("%Y-%m-%d"),
        market.id
    )
}

fn write_preview(out: &mut impl Write, preview: &Analysis) -> fmt::Result {
    writeln!(out, "Preview: What You'll Get [Mock Data]")?;
    writeln!(
        out,
        "Investment Recommendation: {}",
        preview.investment_recommendation.label()
    )?;
    writeln!(out, "  {}", preview.summary)?;
    writeln!(
        out,
        "Climate Risk Score: {:.1}/10",
        preview.climate_risk_score
    )?;
    writeln!(
        out,
        "Target ROI: {:.0}-{:.0}% over {}",
        preview.target_return.min, preview.target_return.max, preview.target_return.timeline
    )?;
    writeln!(out, "Physical risks (current -> 2050):")?;
    write_risk(out, "Flood", &preview.physical_risks.flood)?;
    write_risk(out, "Heat", &preview.physical_risks.heat)?;
    write_risk(out, "Sea level", &preview.physical_risks.sealevel)
}

fn write_risk(out: &mut impl Write, name: &str, risk: &RiskProjection) -> fmt::Result {
    writeln!(
        out,
        "  {name:<10} {} -> {} ({})",
        risk.current, risk.projected_2050, risk.financial_impact
    )
}
