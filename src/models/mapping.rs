// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field mapping tables: local field identifiers to SFMC payload roles.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// Role names reserved by the SFMC subscription payload.
pub mod roles {
    pub const EMAIL_ADDRESS: &str = "EmailAddress";
    pub const OPT_INS: &str = "OptIns";
    pub const OPT_OUTS: &str = "OptOuts";
    pub const SOURCE_ID: &str = "SourceID";
    pub const TIME_STAMP: &str = "TimeStamp";
}

/// Where a mapped field ends up in the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// `keys.EmailAddress`
    EmailAddress,
    /// `values.OptIns` or `values.OptOuts`, depending on the field value
    OptIns,
    /// Any other SFMC attribute, copied into `values`
    Attribute(String),
}

impl MappingTarget {
    /// Parse a configured target name. Empty means "not mapped".
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "" => None,
            roles::EMAIL_ADDRESS => Some(MappingTarget::EmailAddress),
            roles::OPT_INS => Some(MappingTarget::OptIns),
            other => Some(MappingTarget::Attribute(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MappingTarget::EmailAddress => roles::EMAIL_ADDRESS,
            MappingTarget::OptIns => roles::OPT_INS,
            MappingTarget::Attribute(name) => name,
        }
    }
}

impl Serialize for MappingTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn target_or_unmapped<'de, D>(deserializer: D) -> Result<Option<MappingTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(MappingTarget::parse))
}

/// One row of a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Stable field identifier (user field machine name or webform element key)
    pub source: String,
    /// `None` when the admin left the mapping blank
    #[serde(default, deserialize_with = "target_or_unmapped")]
    pub target: Option<MappingTarget>,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: &str) -> Self {
        Self {
            source: source.into(),
            target: MappingTarget::parse(target),
        }
    }
}

/// Mapping of user entity fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    #[serde(default)]
    pub enabled: bool,
    /// Overrides the default subscription id when set
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// Mapping of a single webform's elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_required_roles"))]
pub struct WebformMapping {
    #[serde(default)]
    pub enabled: bool,
    /// Emit `OptOuts` when the opt-in element is empty
    #[serde(default)]
    pub optouts_enabled: bool,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub elements: Vec<FieldMapping>,
}

/// Webform element that holds the submit buttons; never mapped.
pub const ACTIONS_ELEMENT: &str = "actions";

impl WebformMapping {
    fn maps_role(&self, role: &MappingTarget) -> bool {
        self.elements
            .iter()
            .filter(|m| m.source != ACTIONS_ELEMENT)
            .any(|m| m.target.as_ref() == Some(role))
    }
}

/// An enabled webform must map both `EmailAddress` and `OptIns`.
fn validate_required_roles(mapping: &WebformMapping) -> Result<(), ValidationError> {
    if !mapping.enabled {
        return Ok(());
    }

    if mapping.maps_role(&MappingTarget::EmailAddress) && mapping.maps_role(&MappingTarget::OptIns)
    {
        return Ok(());
    }

    let mut error = ValidationError::new("missing_required_role");
    error.message = Some("webform must map 'EmailAddress' and 'OptIns' to one of its elements".into());
    Err(error)
}

/// Resolve the subscription id: per-mapping override, else the default.
pub fn resolve_subscription_id<'a>(overridden: Option<&'a str>, default: &'a str) -> &'a str {
    match overridden {
        Some(id) if !id.trim().is_empty() => id,
        _ => default,
    }
}
