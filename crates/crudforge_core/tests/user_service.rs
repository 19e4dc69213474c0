use crudforge_core::{
    attributes, default_registry, open_db_in_memory, AttributeError, AttributeMap, Entity,
    ServiceError, UserRepository, UserService, ValidatorRegistry,
};
use rusqlite::Connection;
use serde_json::json;

fn setup() -> (Connection, ValidatorRegistry) {
    (open_db_in_memory().unwrap(), default_registry().unwrap())
}

fn ada() -> AttributeMap {
    attributes([
        ("username", json!("ada")),
        ("email", json!("ada@example.com")),
        ("password", json!("Analyt1cal!")),
        ("full_name", json!("Ada Lovelace")),
    ])
}

#[test]
fn create_user_hashes_password() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());

    let user = service.create_user(&ada()).unwrap();
    assert_eq!(user.username, "ada");
    assert!(user.password.is_none());
    assert!(user.hashed_password.starts_with("$argon2"));
    assert_ne!(user.hashed_password, "Analyt1cal!");

    let stored: String = conn
        .query_row(
            "SELECT hashed_password FROM users WHERE username = 'ada';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, user.hashed_password);
}

#[test]
fn duplicate_username_and_email_are_rejected() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    service.create_user(&ada()).unwrap();

    let err = service.create_user(&ada()).unwrap_err();
    assert!(matches!(err, ServiceError::UsernameTaken(ref name) if name == "ada"));

    let mut same_email = ada();
    same_email.insert("username".to_string(), json!("countess"));
    let err = service.create_user(&same_email).unwrap_err();
    assert!(matches!(err, ServiceError::EmailTaken(_)));

    assert_eq!(service.list_users(0, 10).unwrap().len(), 1);
}

#[test]
fn weak_password_fails_build() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());

    let mut weak = ada();
    weak.insert("password".to_string(), json!("password"));
    let err = service.create_user(&weak).unwrap_err();
    assert!(matches!(err, ServiceError::Build(_)));
    assert!(service.list_users(0, 10).unwrap().is_empty());
}

#[test]
fn authenticate_checks_password() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    service.create_user(&ada()).unwrap();

    assert!(service
        .authenticate_user("ada", "Analyt1cal!")
        .unwrap()
        .is_some());
    assert!(service.authenticate_user("ada", "wrong").unwrap().is_none());
    assert!(service
        .authenticate_user("nobody", "Analyt1cal!")
        .unwrap()
        .is_none());
}

#[test]
fn update_rehashes_password_by_username() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    let created = service.create_user(&ada()).unwrap();

    let updated = service
        .update(
            "ada",
            &attributes([
                ("password", json!("N3w-Engine!")),
                ("full_name", json!("Augusta Ada King")),
            ]),
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.full_name.as_deref(), Some("Augusta Ada King"));
    assert_ne!(updated.hashed_password, created.hashed_password);
    assert!(service.authenticate_user("ada", "N3w-Engine!").unwrap().is_some());
    assert!(service.authenticate_user("ada", "Analyt1cal!").unwrap().is_none());
}

#[test]
fn update_rejects_weak_password_and_unknown_user() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    service.create_user(&ada()).unwrap();

    let err = service
        .update("ada", &attributes([("password", json!("weak"))]))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert!(service
        .update("nobody", &attributes([("full_name", json!("x"))]))
        .unwrap()
        .is_none());
}

#[test]
fn delete_by_username() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    service.create_user(&ada()).unwrap();

    assert!(service.delete("ada").unwrap());
    assert!(!service.delete("ada").unwrap());
    assert!(service.get_user_by_username("ada").unwrap().is_none());
}

#[test]
fn lookups_by_unique_keys() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    let created = service.create_user(&ada()).unwrap();

    let repo = service.repository();
    assert_eq!(
        repo.get_user_by_email("ada@example.com").unwrap().unwrap().id(),
        created.id()
    );
    assert!(repo.get_user_by_username("ADA").unwrap().is_none());
}

#[test]
fn update_refuses_fields_outside_the_update_contract() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    let created = service.create_user(&ada()).unwrap();

    for (key, value) in [
        ("hashed_password", json!("forged")),
        ("username", json!("mallory")),
        ("is_active", json!(false)),
        ("created_by", json!("mallory")),
    ] {
        let err = service
            .update(
                "ada",
                &attributes([(key, value), ("full_name", json!("Mallory"))]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Attribute(AttributeError::UnknownField { ref field, .. }) if field == key
        ));
    }

    let stored = service.get_user_by_username("ada").unwrap().unwrap();
    assert_eq!(stored, created);
    assert!(service.get_user_by_username("mallory").unwrap().is_none());
    assert!(service.authenticate_user("ada", "Analyt1cal!").unwrap().is_some());
}

#[test]
fn update_treats_null_password_as_unchanged() {
    let (conn, registry) = setup();
    let service = UserService::new(UserRepository::try_new(&conn, &registry).unwrap());
    let created = service.create_user(&ada()).unwrap();

    let updated = service
        .update(
            "ada",
            &attributes([
                ("password", json!(null)),
                ("email", json!(null)),
                ("full_name", json!(null)),
            ]),
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.hashed_password, created.hashed_password);
    assert_eq!(updated.email, "ada@example.com");
    assert_eq!(updated.full_name, None);
    assert!(service.authenticate_user("ada", "Analyt1cal!").unwrap().is_some());
}
