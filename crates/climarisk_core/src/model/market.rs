//! Market domain model.
//!
//! # Responsibility
//! - Define the market record users register for climate-risk analysis.
//! - Own field validation shared by create/update paths.
//!
//! # Invariants
//! - `id` is assigned once at creation and never changes.
//! - `market_name` and `location` are non-empty after trimming.
//! - `updated_at` is never earlier than `created_at`.
//!
//! Serialized field names are camelCase so the stored collection keeps the
//! `marketName`/`assetClass`/`createdAt` layout of the browser-era data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Owner id used when no authenticated identity is available.
pub const PLACEHOLDER_USER_ID: &str = "user_temp";

/// Upper bound for free-text fields, counted in chars.
pub const MAX_TEXT_FIELD_CHARS: usize = 200;

const MARKET_ID_PREFIX: &str = "market_";
const MARKET_ID_SUFFIX_LEN: usize = 8;

/// Opaque market identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(String);

impl MarketId {
    /// Wraps an existing identifier (lookups, imports, tests).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates `market_<epoch_ms>_<8 hex>`.
    ///
    /// The random suffix keeps ids unique when two markets are created in
    /// the same millisecond.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{MARKET_ID_PREFIX}{}_{}",
            at.timestamp_millis(),
            &suffix[..MARKET_ID_SUFFIX_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MarketId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarketId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Property-use category of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Commercial,
    Industrial,
    Multifamily,
    Luxury,
}

impl AssetClass {
    /// Every asset class in display order.
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Commercial,
        AssetClass::Industrial,
        AssetClass::Multifamily,
        AssetClass::Luxury,
    ];

    /// Wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commercial => "commercial",
            Self::Industrial => "industrial",
            Self::Multifamily => "multifamily",
            Self::Luxury => "luxury",
        }
    }

    /// Capitalized name for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Commercial => "Commercial",
            Self::Industrial => "Industrial",
            Self::Multifamily => "Multifamily",
            Self::Luxury => "Luxury",
        }
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = MarketValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == normalized)
            .ok_or_else(|| MarketValidationError::UnknownAssetClass(value.to_string()))
    }
}

/// Validation failures for market records and inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketValidationError {
    EmptyField(&'static str),
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
    },
    UnknownAssetClass(String),
    /// Update request carried no fields.
    EmptyPatch,
    UpdatedBeforeCreated,
}

impl Display for MarketValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} is required"),
            Self::FieldTooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::UnknownAssetClass(value) => write!(
                f,
                "unknown asset class `{value}`; expected commercial|industrial|multifamily|luxury"
            ),
            Self::EmptyPatch => write!(f, "update must change at least one field"),
            Self::UpdatedBeforeCreated => write!(f, "updatedAt must not be earlier than createdAt"),
        }
    }
}

impl Error for MarketValidationError {}

/// A real-estate market registered for analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: MarketId,
    pub user_id: String,
    pub market_name: String,
    pub location: String,
    pub asset_class: AssetClass,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// Builds a new market from user input with a fresh id.
    ///
    /// `created_at` and `updated_at` are both set to `now`.
    pub fn create(
        input: CreateMarketInput,
        user_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, MarketValidationError> {
        input.validate()?;
        Ok(Self {
            id: MarketId::generate(now),
            user_id: user_id.into(),
            market_name: input.market_name,
            location: input.location,
            asset_class: input.asset_class,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates the full record before it is persisted.
    pub fn validate(&self) -> Result<(), MarketValidationError> {
        validate_text("id", self.id.as_str())?;
        validate_text("marketName", &self.market_name)?;
        validate_text("location", &self.location)?;
        if self.updated_at < self.created_at {
            return Err(MarketValidationError::UpdatedBeforeCreated);
        }
        Ok(())
    }

    /// Applies a partial update and refreshes `updated_at`.
    ///
    /// The record is left untouched when the patch is invalid.
    pub fn apply_patch(
        &mut self,
        patch: MarketPatch,
        now: DateTime<Utc>,
    ) -> Result<(), MarketValidationError> {
        patch.validate()?;
        if let Some(name) = patch.market_name {
            self.market_name = name;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(asset_class) = patch.asset_class {
            self.asset_class = asset_class;
        }
        self.updated_at = now.max(self.created_at);
        Ok(())
    }
}

/// Fields collected by the add-market form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketInput {
    pub market_name: String,
    pub location: String,
    pub asset_class: AssetClass,
}

impl CreateMarketInput {
    pub fn new(
        market_name: impl Into<String>,
        location: impl Into<String>,
        asset_class: AssetClass,
    ) -> Self {
        Self {
            market_name: market_name.into(),
            location: location.into(),
            asset_class,
        }
    }

    pub fn validate(&self) -> Result<(), MarketValidationError> {
        validate_text("marketName", &self.market_name)?;
        validate_text("location", &self.location)
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPatch {
    pub market_name: Option<String>,
    pub location: Option<String>,
    pub asset_class: Option<AssetClass>,
}

impl MarketPatch {
    pub fn is_empty(&self) -> bool {
        self.market_name.is_none() && self.location.is_none() && self.asset_class.is_none()
    }

    pub fn validate(&self) -> Result<(), MarketValidationError> {
        if self.is_empty() {
            return Err(MarketValidationError::EmptyPatch);
        }
        if let Some(name) = self.market_name.as_deref() {
            validate_text("marketName", name)?;
        }
        if let Some(location) = self.location.as_deref() {
            validate_text("location", location)?;
        }
        Ok(())
    }
}

fn validate_text(field: &'static str, value: &str) -> Result<(), MarketValidationError> {
    if value.trim().is_empty() {
        return Err(MarketValidationError::EmptyField(field));
    }
    if value.chars().count() > MAX_TEXT_FIELD_CHARS {
        return Err(MarketValidationError::FieldTooLong {
            field,
            max_chars: MAX_TEXT_FIELD_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        AssetClass, CreateMarketInput, Market, MarketId, MarketPatch, MarketValidationError,
        MAX_TEXT_FIELD_CHARS, PLACEHOLDER_USER_ID,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn chicago() -> CreateMarketInput {
        CreateMarketInput::new(
            "Downtown Chicago Commercial",
            "Chicago, IL",
            AssetClass::Commercial,
        )
    }

    #[test]
    fn generated_ids_carry_timestamp_and_are_distinct() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let first = MarketId::generate(at);
        let second = MarketId::generate(at);

        assert!(first.as_str().starts_with("market_1700000000123_"));
        assert_ne!(first, second);
    }

    #[test]
    fn asset_class_parses_case_insensitively() {
        assert_eq!(
            " Multifamily ".parse::<AssetClass>().unwrap(),
            AssetClass::Multifamily
        );
        let err = "retail".parse::<AssetClass>().unwrap_err();
        assert_eq!(err, MarketValidationError::UnknownAssetClass("retail".into()));
    }

    #[test]
    fn create_sets_both_timestamps_to_now() {
        let now = Utc::now();
        let market = Market::create(chicago(), PLACEHOLDER_USER_ID, now).unwrap();

        assert_eq!(market.created_at, now);
        assert_eq!(market.updated_at, now);
        assert_eq!(market.user_id, "user_temp");
        assert_eq!(market.asset_class, AssetClass::Commercial);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut input = chicago();
        input.location = "   ".to_string();
        assert_eq!(
            Market::create(input, PLACEHOLDER_USER_ID, Utc::now()).unwrap_err(),
            MarketValidationError::EmptyField("location")
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut input = chicago();
        input.market_name = "x".repeat(MAX_TEXT_FIELD_CHARS + 1);
        assert!(matches!(
            input.validate(),
            Err(MarketValidationError::FieldTooLong {
                field: "marketName",
                ..
            })
        ));
    }

    #[test]
    fn patch_refreshes_updated_at_and_keeps_created_at() {
        let created = Utc::now();
        let mut market = Market::create(chicago(), PLACEHOLDER_USER_ID, created).unwrap();
        let later = created + Duration::minutes(5);

        market
            .apply_patch(
                MarketPatch {
                    asset_class: Some(AssetClass::Luxury),
                    ..MarketPatch::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(market.asset_class, AssetClass::Luxury);
        assert_eq!(market.market_name, "Downtown Chicago Commercial");
        assert_eq!(market.created_at, created);
        assert_eq!(market.updated_at, later);
    }

    #[test]
    fn empty_patch_is_rejected_without_touching_record() {
        let now = Utc::now();
        let mut market = Market::create(chicago(), PLACEHOLDER_USER_ID, now).unwrap();
        let before = market.clone();

        let err = market
            .apply_patch(MarketPatch::default(), now + Duration::seconds(1))
            .unwrap_err();
        assert_eq!(err, MarketValidationError::EmptyPatch);
        assert_eq!(market, before);
    }

    #[test]
    fn serializes_with_camel_case_layout() {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let mut market = Market::create(chicago(), PLACEHOLDER_USER_ID, at).unwrap();
        market.id = MarketId::new("market_1");

        let json = serde_json::to_value(&market).unwrap();
        assert_eq!(json["id"], "market_1");
        assert_eq!(json["userId"], "user_temp");
        assert_eq!(json["marketName"], "Downtown Chicago Commercial");
        assert_eq!(json["assetClass"], "commercial");
        assert_eq!(json["createdAt"], "2025-01-15T10:30:00Z");
    }

    #[test]
    fn decodes_browser_iso_timestamps() {
        let raw = r#"{
            "id": "market_1736937000000",
            "userId": "user_temp",
            "marketName": "Miami Luxury",
            "location": "Miami, FL",
            "assetClass": "luxury",
            "createdAt": "2025-01-15T10:30:00.000Z",
            "updatedAt": "2025-01-15T10:30:00.000Z"
        }"#;
        let market: Market = serde_json::from_str(raw).unwrap();
        assert_eq!(market.asset_class, AssetClass::Luxury);
        assert_eq!(market.created_at.timestamp_millis(), 1_736_937_000_000);
    }
}
