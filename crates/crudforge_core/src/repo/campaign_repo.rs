//! Campaign persistence and lookup helpers.
//!
//! # Invariants
//! - Timestamps are stored in a fixed-width RFC 3339 form, so range filters
//!   compare them as text.
//! - `update_status` goes through `STATE_CHANGE` validation; toggles do not
//!   validate.

use crate::model::attributes::attributes;
use crate::model::campaign::{Campaign, CampaignStatus, CampaignType};
use crate::model::entity::AuditFields;
use crate::model::operation::Operation;
use crate::repo::base_repo::{RepoError, RepoResult, Repository};
use crate::repo::encode::{
    contains_pattern, decode_dt_opt, encode_dt, encode_dt_opt, flag, real_opt, text, text_opt,
};
use crate::repo::record::SqlEntity;
use crate::validation::registry::ValidatorRegistry;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde_json::json;
use std::ops::Deref;

impl SqlEntity for Campaign {
    const TABLE: &'static str = "campaigns";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "campaign_type",
        "status",
        "start_date",
        "end_date",
        "budget",
        "target_audience",
        "is_active",
    ];

    fn to_columns(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text_opt(self.description.as_deref()),
            text(self.campaign_type.as_str()),
            text(self.status.as_str()),
            encode_dt_opt(self.start_date),
            encode_dt_opt(self.end_date),
            real_opt(self.budget),
            text_opt(self.target_audience.as_deref()),
            flag(self.is_active),
        ]
    }

    fn from_columns(audit: AuditFields, row: &Row<'_>) -> RepoResult<Self> {
        let campaign_type: String = row.get("campaign_type")?;
        let status: String = row.get("status")?;
        Ok(Self {
            audit,
            name: row.get("name")?,
            description: row.get("description")?,
            campaign_type: CampaignType::parse(&campaign_type).ok_or_else(|| {
                RepoError::InvalidData(format!("unknown campaign_type `{campaign_type}`"))
            })?,
            status: CampaignStatus::parse(&status)
                .ok_or_else(|| RepoError::InvalidData(format!("unknown status `{status}`")))?,
            start_date: decode_dt_opt("start_date", row.get("start_date")?)?,
            end_date: decode_dt_opt("end_date", row.get("end_date")?)?,
            budget: row.get("budget")?,
            target_audience: row.get("target_audience")?,
            is_active: row.get("is_active")?,
        })
    }
}

/// Campaign repository; base CRUD is reachable through `Deref`.
pub struct CampaignRepository<'a> {
    base: Repository<'a, Campaign>,
}

impl<'a> CampaignRepository<'a> {
    pub fn try_new(conn: &'a Connection, registry: &'a ValidatorRegistry) -> RepoResult<Self> {
        Ok(Self {
            base: Repository::try_new(conn, registry)?,
        })
    }

    pub fn find_by_status(
        &self,
        status: CampaignStatus,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Campaign>> {
        self.base
            .find_where("status = ?", vec![text(status.as_str())], skip, limit)
    }

    pub fn find_by_campaign_type(
        &self,
        campaign_type: CampaignType,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Campaign>> {
        self.base.find_where(
            "campaign_type = ?",
            vec![text(campaign_type.as_str())],
            skip,
            limit,
        )
    }

    /// Campaigns with status `active` and the `is_active` flag set.
    pub fn find_active_campaigns(&self, skip: u32, limit: u32) -> RepoResult<Vec<Campaign>> {
        self.base.find_where(
            "status = ? AND is_active = 1",
            vec![text(CampaignStatus::Active.as_str())],
            skip,
            limit,
        )
    }

    /// Campaigns touching `[from, to]`: starting inside it, ending inside it,
    /// or spanning it entirely. Bounds are inclusive.
    pub fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Campaign>> {
        let from = Value::Text(encode_dt(from));
        let to = Value::Text(encode_dt(to));
        self.base.find_where(
            "(start_date >= ? AND start_date <= ?) \
             OR (end_date >= ? AND end_date <= ?) \
             OR (start_date <= ? AND end_date >= ?)",
            vec![
                from.clone(),
                to.clone(),
                from.clone(),
                to.clone(),
                from,
                to,
            ],
            skip,
            limit,
        )
    }

    /// Substring match on `name` (ASCII case-insensitive).
    pub fn find_by_name_contains(
        &self,
        needle: &str,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Campaign>> {
        self.base.find_where(
            "name LIKE ? ESCAPE '\\'",
            vec![Value::Text(contains_pattern(needle))],
            skip,
            limit,
        )
    }

    /// Moves the campaign to `status`, validated as `STATE_CHANGE`.
    pub fn update_status(&self, id: &str, status: CampaignStatus) -> RepoResult<Option<Campaign>> {
        self.base.update_with(
            id,
            &attributes([("status", json!(status.as_str()))]),
            Operation::StateChange,
        )
    }

    /// Flips `is_active`. Returns `None` when `id` does not exist.
    pub fn toggle_active_status(&self, id: &str) -> RepoResult<Option<Campaign>> {
        let Some(mut campaign) = self.base.find(id)? else {
            return Ok(None);
        };
        campaign.is_active = !campaign.is_active;
        self.base.persist(&mut campaign).map(Some)
    }
}

impl<'a> Deref for CampaignRepository<'a> {
    type Target = Repository<'a, Campaign>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
