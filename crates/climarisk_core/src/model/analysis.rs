//! Analysis report contract.
//!
//! No component produces real analyses yet. These types pin the JSON shape
//! a future analysis backend returns, and `Analysis::preview` supplies the
//! fixed mock report shown on the market detail screen.

use crate::model::market::MarketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentRecommendation {
    StrongBuy,
    Buy,
    Hold,
    Avoid,
}

impl InvestmentRecommendation {
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Avoid => "AVOID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    Buyers,
    Sellers,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReturn {
    pub min: f64,
    pub max: f64,
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRequired {
    pub acquisition: f64,
    pub climate_adaptation: f64,
    pub ongoing: f64,
}

/// Current and projected level of one physical hazard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProjection {
    pub current: String,
    #[serde(rename = "2050")]
    pub projected_2050: String,
    pub financial_impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalRisks {
    pub flood: RiskProjection,
    pub heat: RiskProjection,
    pub sealevel: RiskProjection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInsights {
    pub avg_building_age: String,
    pub green_building_penetration: String,
    pub retrofit_opportunities: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicInsights {
    pub median_income: f64,
    pub working_class: String,
    pub income_percentile: f64,
    pub price_to_income_ratio: f64,
    pub affordability_index: f64,
    pub target_tenant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub direction: TrendDirection,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// AI-generated climate and investment report for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub market_id: MarketId,
    pub investment_recommendation: InvestmentRecommendation,
    pub investment_horizon: InvestmentHorizon,
    pub climate_risk_score: f64,
    pub sustainability_score: f64,
    pub target_return: TargetReturn,
    pub capital_required: CapitalRequired,
    pub physical_risks: PhysicalRisks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_insights: Option<PropertyInsights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographic_insights: Option<DemographicInsights>,
    pub market_condition: MarketCondition,
    pub price_trend: PriceTrend,
    pub deal_breakers: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub sources: Vec<Source>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    /// Fixed mock report rendered before any real analysis exists.
    pub fn preview(market_id: &MarketId, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("preview_{market_id}"),
            market_id: market_id.clone(),
            investment_recommendation: InvestmentRecommendation::Buy,
            investment_horizon: InvestmentHorizon::Medium,
            climate_risk_score: 6.5,
            sustainability_score: 7.2,
            target_return: TargetReturn {
                min: 8.0,
                max: 12.0,
                timeline: "5-7 years".to_string(),
            },
            capital_required: CapitalRequired {
                acquisition: 5_000_000.0,
                climate_adaptation: 500_000.0,
                ongoing: 75_000.0,
            },
            physical_risks: PhysicalRisks {
                flood: projection("Moderate", "High", "$2-4M potential damage"),
                heat: projection("High", "Extreme", "+15% cooling costs"),
                sealevel: projection("Low", "Low", "Minimal direct exposure"),
            },
            property_insights: None,
            demographic_insights: None,
            market_condition: MarketCondition::Balanced,
            price_trend: PriceTrend {
                direction: TrendDirection::Up,
                confidence: 0.7,
            },
            deal_breakers: Vec::new(),
            competitive_advantages: vec![
                "Strong rental demand".to_string(),
                "Growing employment base".to_string(),
            ],
            sources: Vec::new(),
            summary: "Strong opportunity with manageable risks".to_string(),
            created_at: now,
        }
    }
}

fn projection(current: &str, projected_2050: &str, financial_impact: &str) -> RiskProjection {
    RiskProjection {
        current: current.to_string(),
        projected_2050: projected_2050.to_string(),
        financial_impact: financial_impact.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Unprocessed payloads gathered from external data providers.
///
/// Provider payloads stay opaque JSON until a concrete provider is wired in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_risk: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_level_risk: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_island: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

#[cfg(test)]
mod tests {
    use super::{Analysis, InvestmentRecommendation, RawData};
    use crate::model::market::MarketId;
    use chrono::Utc;

    #[test]
    fn preview_is_bound_to_market() {
        let id = MarketId::new("market_42");
        let analysis = Analysis::preview(&id, Utc::now());
        assert_eq!(analysis.market_id, id);
        assert_eq!(analysis.investment_recommendation.label(), "BUY");
    }

    #[test]
    fn physical_risk_projection_uses_year_key() {
        let analysis = Analysis::preview(&MarketId::new("m"), Utc::now());
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["physicalRisks"]["flood"]["2050"], "High");
        assert_eq!(json["investmentRecommendation"], "buy");
        assert!(json.get("propertyInsights").is_none());
    }

    #[test]
    fn decodes_backend_report_shape() {
        let raw = r#"{
            "id": "analysis_1",
            "marketId": "market_1",
            "investmentRecommendation": "strong_buy",
            "investmentHorizon": "long",
            "climateRiskScore": 3.1,
            "sustainabilityScore": 8.4,
            "targetReturn": { "min": 6, "max": 9, "timeline": "10 years" },
            "capitalRequired": { "acquisition": 1000000, "climateAdaptation": 0, "ongoing": 10000 },
            "physicalRisks": {
                "flood": { "current": "Low", "2050": "Low", "financialImpact": "none" },
                "heat": { "current": "Low", "2050": "Moderate", "financialImpact": "+3%" },
                "sealevel": { "current": "Low", "2050": "Low", "financialImpact": "none" }
            },
            "demographicInsights": {
                "medianIncome": 72000,
                "workingClass": "professional",
                "incomePercentile": 68,
                "priceToIncomeRatio": 4.2,
                "affordabilityIndex": 0.8,
                "targetTenant": "young professionals"
            },
            "marketCondition": "sellers",
            "priceTrend": { "direction": "flat", "confidence": 0.5 },
            "dealBreakers": [],
            "competitiveAdvantages": ["transit"],
            "sources": [{ "title": "NOAA", "url": "https://www.noaa.gov" }],
            "summary": "ok",
            "createdAt": "2025-02-01T00:00:00.000Z"
        }"#;

        let analysis: Analysis = serde_json::from_str(raw).unwrap();
        assert_eq!(
            analysis.investment_recommendation,
            InvestmentRecommendation::StrongBuy
        );
        assert!(analysis.property_insights.is_none());
        assert_eq!(
            analysis.demographic_insights.unwrap().target_tenant,
            "young professionals"
        );
    }

    #[test]
    fn raw_data_keeps_provider_payloads_opaque() {
        let raw = r#"{ "coordinates": { "lat": 41.88, "lon": -87.63 }, "floodRisk": { "zone": "X" } }"#;
        let data: RawData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.flood_risk.unwrap()["zone"], "X");
        assert!(data.climate_data.is_none());
    }
}
