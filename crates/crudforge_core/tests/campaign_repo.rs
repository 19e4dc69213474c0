use chrono::{DateTime, TimeZone, Utc};
use crudforge_core::{
    attributes, default_registry, open_db_in_memory, Campaign, CampaignRepository,
    CampaignStatus, CampaignType, Entity, RepoError, ValidatorRegistry,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn setup() -> (Connection, ValidatorRegistry) {
    (open_db_in_memory().unwrap(), default_registry().unwrap())
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).unwrap()
}

fn create(
    repo: &CampaignRepository<'_>,
    registry: &ValidatorRegistry,
    pairs: &[(&str, Value)],
) -> Campaign {
    let campaign = registry
        .builder::<Campaign>()
        .with_attributes(&attributes(pairs.iter().cloned()))
        .build()
        .unwrap();
    repo.save(campaign).unwrap()
}

fn names(campaigns: Vec<Campaign>) -> Vec<String> {
    campaigns.into_iter().map(|campaign| campaign.name).collect()
}

#[test]
fn create_round_trips_every_column() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();

    let saved = create(
        &repo,
        &registry,
        &[
            ("name", json!("Spring launch")),
            ("campaign_type", json!("email")),
            ("description", json!("Quarterly newsletter push")),
            ("start_date", json!("2026-03-01T00:00:00Z")),
            ("end_date", json!("2026-03-31T00:00:00Z")),
            ("budget", json!(1250.5)),
            ("target_audience", json!("subscribers")),
        ],
    );

    assert_eq!(saved.campaign_type, CampaignType::Email);
    assert_eq!(saved.status, CampaignStatus::Draft);
    assert_eq!(saved.start_date, Some(day(1)));
    assert_eq!(saved.end_date, Some(day(31)));
    assert_eq!(saved.budget, Some(1250.5));
    assert!(saved.is_active);
    assert!(!saved.is_running());
    assert_eq!(repo.find(saved.id()).unwrap().unwrap(), saved);
}

#[test]
fn status_and_type_filters() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();
    create(
        &repo,
        &registry,
        &[("name", json!("a")), ("campaign_type", json!("social"))],
    );
    create(
        &repo,
        &registry,
        &[
            ("name", json!("b")),
            ("campaign_type", json!("search")),
            ("status", json!("active")),
        ],
    );
    create(
        &repo,
        &registry,
        &[
            ("name", json!("c")),
            ("campaign_type", json!("social")),
            ("status", json!("active")),
            ("is_active", json!(false)),
        ],
    );

    assert_eq!(
        names(repo.find_by_status(CampaignStatus::Active, 0, 10).unwrap()),
        ["b", "c"]
    );
    assert_eq!(
        names(repo.find_by_campaign_type(CampaignType::Social, 0, 10).unwrap()),
        ["a", "c"]
    );
    assert_eq!(names(repo.find_active_campaigns(0, 10).unwrap()), ["b"]);
}

#[test]
fn date_range_matches_overlapping_campaigns() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();
    let span = |name: &str, start: u32, end: u32| {
        create(
            &repo,
            &registry,
            &[
                ("name", json!(name)),
                ("campaign_type", json!("display")),
                ("start_date", json!(day(start))),
                ("end_date", json!(day(end))),
            ],
        );
    };
    span("starts-inside", 12, 25);
    span("ends-inside", 1, 12);
    span("covers", 1, 28);
    span("before", 1, 5);
    span("after", 25, 28);

    assert_eq!(
        names(repo.find_by_date_range(day(10), day(20), 0, 10).unwrap()),
        ["starts-inside", "ends-inside", "covers"]
    );
}

#[test]
fn name_search_is_substring_match() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();
    create(
        &repo,
        &registry,
        &[("name", json!("Winter Sale")), ("campaign_type", json!("other"))],
    );
    create(
        &repo,
        &registry,
        &[("name", json!("Summer Sale")), ("campaign_type", json!("other"))],
    );

    assert_eq!(
        names(repo.find_by_name_contains("sale", 0, 10).unwrap()),
        ["Winter Sale", "Summer Sale"]
    );
    assert_eq!(
        names(repo.find_by_name_contains("Winter", 0, 10).unwrap()),
        ["Winter Sale"]
    );
}

#[test]
fn update_status_uses_state_change_schema() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();
    let saved = create(
        &repo,
        &registry,
        &[("name", json!("launch")), ("campaign_type", json!("content"))],
    );

    let active = repo
        .update_status(saved.id(), CampaignStatus::Active)
        .unwrap()
        .unwrap();
    assert_eq!(active.status, CampaignStatus::Active);
    assert!(active.is_running());

    let err = repo
        .update_with(
            saved.id(),
            &attributes([("status", json!("archived"))]),
            crudforge_core::Operation::StateChange,
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    assert!(repo
        .update_status("missing", CampaignStatus::Paused)
        .unwrap()
        .is_none());
}

#[test]
fn toggle_active_status_flips_flag() {
    let (conn, registry) = setup();
    let repo = CampaignRepository::try_new(&conn, &registry).unwrap();
    let saved = create(
        &repo,
        &registry,
        &[("name", json!("flag")), ("campaign_type", json!("influencer"))],
    );

    let toggled = repo.toggle_active_status(saved.id()).unwrap().unwrap();
    assert!(!toggled.is_active);
    assert!(toggled.audit.updated_at > saved.audit.updated_at);
    assert!(repo.toggle_active_status("missing").unwrap().is_none());
}

#[test]
fn create_rejects_end_before_start() {
    let registry = default_registry().unwrap();
    let err = registry
        .builder::<Campaign>()
        .with_attributes(&attributes([
            ("name", json!("backwards")),
            ("campaign_type", json!("email")),
            ("start_date", json!(day(20))),
            ("end_date", json!(day(10))),
        ]))
        .build()
        .unwrap_err();

    let issues = err.validation_error().unwrap().issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "end_date");
}
