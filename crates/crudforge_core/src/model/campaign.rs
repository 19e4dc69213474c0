//! Marketing campaign entity and its CREATE/UPDATE/STATE_CHANGE schemas.
//!
//! # Invariants
//! - `status` and `campaign_type` only hold values from their closed sets.
//! - On create, `end_date` must be after `start_date` when both are set.
//! - `budget` is never negative and is kept to whole cents.

use crate::model::attributes::{decode, AttributeError};
use crate::model::entity::{AuditFields, Entity};
use crate::model::operation::Operation;
use crate::validation::registry::{RegistryError, ValidatorRegistry};
use crate::validation::schema::{FieldChecks, Schema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NAME_MAX_CHARS: usize = 200;
pub const CAMPAIGN_TYPE_MAX_CHARS: usize = 50;

/// Campaign lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub const NAMES: &'static [&'static str] =
        &["draft", "active", "paused", "completed", "cancelled"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Delivery channel of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    Email,
    Social,
    Display,
    Search,
    Content,
    Influencer,
    Other,
}

impl CampaignType {
    pub const NAMES: &'static [&'static str] = &[
        "email",
        "social",
        "display",
        "search",
        "content",
        "influencer",
        "other",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Social => "social",
            Self::Display => "display",
            Self::Search => "search",
            Self::Content => "content",
            Self::Influencer => "influencer",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "social" => Some(Self::Social),
            "display" => Some(Self::Display),
            "search" => Some(Self::Search),
            "content" => Some(Self::Content),
            "influencer" => Some(Self::Influencer),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(flatten)]
    pub audit: AuditFields,
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub target_audience: Option<String>,
    pub is_active: bool,
}

impl Campaign {
    /// Active status and the `is_active` flag both set.
    pub fn is_running(&self) -> bool {
        self.status == CampaignStatus::Active && self.is_active
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl Entity for Campaign {
    const ENTITY_NAME: &'static str = "Campaign";

    fn blank(audit: AuditFields) -> Self {
        Self {
            audit,
            name: String::new(),
            description: None,
            campaign_type: CampaignType::Other,
            status: CampaignStatus::Draft,
            start_date: None,
            end_date: None,
            budget: None,
            target_audience: None,
            is_active: true,
        }
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn set_field(&mut self, key: &str, value: Value) -> Result<(), AttributeError> {
        match key {
            "name" => self.name = decode(key, value)?,
            "description" => self.description = decode(key, value)?,
            "campaign_type" => self.campaign_type = decode(key, value)?,
            "status" => self.status = decode(key, value)?,
            "start_date" => self.start_date = decode(key, value)?,
            "end_date" => self.end_date = decode(key, value)?,
            "budget" => self.budget = decode::<Option<f64>>(key, value)?.map(round_to_cents),
            "target_audience" => self.target_audience = decode(key, value)?,
            "is_active" => self.is_active = decode(key, value)?,
            other => {
                return Err(AttributeError::UnknownField {
                    entity: Self::ENTITY_NAME,
                    field: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn default_status() -> String {
    CampaignStatus::Draft.as_str().to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub campaign_type: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Schema for CampaignCreate {
    fn check(&self, checks: &mut FieldChecks) {
        checks
            .length("name", &self.name, 1, NAME_MAX_CHARS)
            .length("campaign_type", &self.campaign_type, 1, CAMPAIGN_TYPE_MAX_CHARS)
            .one_of("campaign_type", &self.campaign_type, CampaignType::NAMES)
            .one_of("status", &self.status, CampaignStatus::NAMES)
            .at_least("budget", self.budget, 0.0);

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            checks.ensure("end_date", end > start, "must be after start_date");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub campaign_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub target_audience: Option<String>,
    pub is_active: Option<bool>,
}

impl Schema for CampaignUpdate {
    fn check(&self, checks: &mut FieldChecks) {
        checks
            .length_opt("name", self.name.as_deref(), 1, NAME_MAX_CHARS)
            .length_opt(
                "campaign_type",
                self.campaign_type.as_deref(),
                1,
                CAMPAIGN_TYPE_MAX_CHARS,
            )
            .one_of_opt(
                "campaign_type",
                self.campaign_type.as_deref(),
                CampaignType::NAMES,
            )
            .one_of_opt("status", self.status.as_deref(), CampaignStatus::NAMES)
            .at_least("budget", self.budget, 0.0);
    }
}

/// Payload of a status transition.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignStatusChange {
    pub status: String,
}

impl Schema for CampaignStatusChange {
    fn check(&self, checks: &mut FieldChecks) {
        checks.one_of("status", &self.status, CampaignStatus::NAMES);
    }
}

pub fn register_campaign_schemas(registry: &mut ValidatorRegistry) -> Result<(), RegistryError> {
    registry.register::<Campaign, CampaignCreate>(Operation::Create)?;
    registry.register::<Campaign, CampaignUpdate>(Operation::Update)?;
    registry.register::<Campaign, CampaignStatusChange>(Operation::StateChange)?;
    Ok(())
}
