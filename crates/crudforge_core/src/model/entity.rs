//! Base entity shape: identity, audit metadata and bulk attribute application.
//!
//! # Responsibility
//! - Carry the audit columns shared by every persisted record.
//! - Apply attribute maps onto concrete entities through explicit setters.
//!
//! # Invariants
//! - `id` is empty until a repository assigns it on save.
//! - `updated_at` never moves backwards and strictly advances on `touch()`.
//! - Keys listed in `Entity::UNSET` are never applied through `set_attributes`.

use crate::model::attributes::{decode, AttributeError, AttributeMap};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute key of the primary identifier.
pub const ID_FIELD: &str = "id";

/// Attribute keys owned by `AuditFields` rather than the concrete entity.
pub const AUDIT_FIELDS: &[&str] = &[
    ID_FIELD,
    "created_at",
    "created_by",
    "updated_at",
    "deleted_at",
    "deleted_by",
];

/// Identity and provenance metadata embedded in every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl AuditFields {
    /// Fresh audit block with both timestamps set to now and no id.
    pub fn new() -> Self {
        let now = now_micros();
        Self {
            id: String::new(),
            created_at: now,
            created_by: None,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Refreshes `updated_at`, advancing it by at least one microsecond.
    pub fn touch(&mut self) {
        let now = now_micros();
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = if now > floor { now } else { floor };
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Applies one key listed in `AUDIT_FIELDS`.
    fn apply(&mut self, key: &str, value: Value) -> Result<(), AttributeError> {
        match key {
            ID_FIELD => self.id = decode(key, value)?,
            "created_at" => self.created_at = decode(key, value)?,
            "created_by" => self.created_by = decode(key, value)?,
            "updated_at" => self.updated_at = decode(key, value)?,
            "deleted_at" => self.deleted_at = decode(key, value)?,
            "deleted_by" => self.deleted_by = decode(key, value)?,
            other => {
                return Err(AttributeError::UnknownField {
                    entity: "AuditFields",
                    field: other.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Current UTC time truncated to the microsecond precision used in storage.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Default for AuditFields {
    fn default() -> Self {
        Self::new()
    }
}

/// A persistable domain record with identity and audit metadata.
///
/// Implementors provide a blank constructor and a per-field setter; bulk
/// assignment, deny-list stripping and audit keys are handled here.
pub trait Entity: Sized {
    /// Type name used in registry keys and error messages.
    const ENTITY_NAME: &'static str;

    /// Keys stripped from attribute maps before bulk assignment.
    const UNSET: &'static [&'static str] = &[];

    /// Instance with default domain fields around the given audit block.
    fn blank(audit: AuditFields) -> Self;

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Assigns one domain field by name.
    ///
    /// Must return `AttributeError::UnknownField` for names the entity does not own.
    fn set_field(&mut self, key: &str, value: Value) -> Result<(), AttributeError>;

    fn id(&self) -> &str {
        &self.audit().id
    }

    /// Removes every `UNSET` key from `attributes`.
    fn unset(attributes: &mut AttributeMap) {
        for key in Self::UNSET {
            attributes.remove(*key);
        }
    }

    /// Assigns one attribute, routing audit keys to `AuditFields`.
    fn set_attribute(&mut self, key: &str, value: Value) -> Result<(), AttributeError> {
        if AUDIT_FIELDS.contains(&key) {
            return self.audit_mut().apply(key, value);
        }
        self.set_field(key, value)
    }

    /// Strips `UNSET` keys, then assigns every remaining attribute.
    fn set_attributes(&mut self, mut attributes: AttributeMap) -> Result<(), AttributeError> {
        Self::unset(&mut attributes);
        for (key, value) in attributes {
            self.set_attribute(&key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditFields, Entity};
    use crate::model::attributes::{attributes, decode, AttributeError, AttributeMap};
    use serde_json::{json, Value};

    #[derive(Debug)]
    struct Widget {
        audit: AuditFields,
        name: String,
        secret: Option<String>,
    }

    impl Entity for Widget {
        const ENTITY_NAME: &'static str = "Widget";
        const UNSET: &'static [&'static str] = &["secret"];

        fn blank(audit: AuditFields) -> Self {
            Self {
                audit,
                name: String::new(),
                secret: None,
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
                "secret" => self.secret = decode(key, value)?,
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

    #[test]
    fn set_attributes_routes_audit_keys_and_strips_unset() {
        let mut widget = Widget::blank(AuditFields::new());
        widget
            .set_attributes(attributes([
                ("id", json!("w-1")),
                ("created_by", json!("alice")),
                ("name", json!("gear")),
                ("secret", json!("hunter2")),
            ]))
            .unwrap();

        assert_eq!(widget.id(), "w-1");
        assert_eq!(widget.audit.created_by.as_deref(), Some("alice"));
        assert_eq!(widget.name, "gear");
        assert!(widget.secret.is_none());
    }

    #[test]
    fn unset_leaves_other_keys_untouched() {
        let mut attrs: AttributeMap = attributes([("secret", json!("x")), ("name", json!("y"))]);
        Widget::unset(&mut attrs);
        assert!(!attrs.contains_key("secret"));
        assert!(attrs.contains_key("name"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut widget = Widget::blank(AuditFields::new());
        let err = widget.set_attribute("color", json!("red")).unwrap_err();
        assert!(matches!(err, AttributeError::UnknownField { entity: "Widget", .. }));
    }

    #[test]
    fn touch_strictly_advances_updated_at() {
        let mut audit = AuditFields::new();
        let before = audit.updated_at;
        audit.touch();
        assert!(audit.updated_at > before);
        assert_eq!(audit.created_at, before);
    }
}
