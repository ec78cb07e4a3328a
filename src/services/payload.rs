// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Payload assembly: user records and webform submissions to SFMC
//! `{keys, values}` subscription payloads.

use crate::models::field_value::{is_empty, is_truthy, to_field_string};
use crate::models::mapping::{resolve_subscription_id, roles, MappingTarget, ACTIONS_ELEMENT};
use crate::models::{
    SubscriptionPayload, SubscriptionSettings, UserMapping, UserRecord, WebformMapping,
};
use crate::time_utils::format_sfmc_timestamp;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Clock used for `keys.TimeStamp`.
pub type Clock = fn() -> DateTime<Utc>;

/// Builds subscription payloads from mapped source records.
#[derive(Clone, Copy)]
pub struct PayloadBuilder {
    clock: Clock,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with a fixed clock, for deterministic timestamps.
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    fn base_payload(&self, subscription: &SubscriptionSettings) -> SubscriptionPayload {
        SubscriptionPayload::new(
            &subscription.source_id,
            format_sfmc_timestamp((self.clock)()),
        )
    }

    /// Build a payload for a user, or `None` when user mapping is disabled.
    ///
    /// A field mapped to `OptIns` always yields either `OptIns` or `OptOuts`.
    /// Every other mapped field is copied, even when empty.
    pub fn build_from_user(
        &self,
        user: &UserRecord,
        mapping: &UserMapping,
        subscription: &SubscriptionSettings,
    ) -> Option<SubscriptionPayload> {
        if !mapping.enabled {
            return None;
        }

        let subscription_id = resolve_subscription_id(
            mapping.subscription_id.as_deref(),
            &subscription.subscription_id,
        );

        let mut payload = self.base_payload(subscription);
        payload.set_email(user.email.as_str());

        for field in &mapping.fields {
            let Some(target) = &field.target else {
                continue;
            };
            let value = user.field(&field.source).unwrap_or(&Value::Null);

            match target {
                MappingTarget::OptIns => {
                    let role = if is_truthy(value) {
                        roles::OPT_INS
                    } else {
                        roles::OPT_OUTS
                    };
                    payload.set_value(role, subscription_id);
                }
                other => payload.set_value(other.as_str(), to_field_string(value)),
            }
        }

        Some(payload)
    }

    /// Build a payload for a webform submission, or `None` when the form's
    /// mapping is disabled.
    ///
    /// The result may still lack `keys.EmailAddress`; callers must check
    /// before dispatching. When several elements map to the same role, the
    /// last one wins.
    pub fn build_from_webform(
        &self,
        webform_id: &str,
        data: &Map<String, Value>,
        mapping: &WebformMapping,
        subscription: &SubscriptionSettings,
    ) -> Option<SubscriptionPayload> {
        if !mapping.enabled {
            tracing::debug!(webform_id, "Webform mapping disabled, nothing to send");
            return None;
        }

        let subscription_id = resolve_subscription_id(
            mapping.subscription_id.as_deref(),
            &subscription.subscription_id,
        );

        let mut payload = self.base_payload(subscription);

        for element in &mapping.elements {
            if element.source == ACTIONS_ELEMENT {
                continue;
            }
            let Some(target) = &element.target else {
                continue;
            };
            let value = data.get(&element.source).unwrap_or(&Value::Null);

            match target {
                MappingTarget::EmailAddress => payload.set_email(to_field_string(value)),
                MappingTarget::OptIns if mapping.optouts_enabled => {
                    let role = if is_truthy(value) {
                        roles::OPT_INS
                    } else {
                        roles::OPT_OUTS
                    };
                    payload.set_value(role, subscription_id);
                }
                MappingTarget::OptIns => {
                    if is_truthy(value) {
                        payload.set_value(roles::OPT_INS, subscription_id);
                    }
                }
                MappingTarget::Attribute(name) => {
                    if !is_empty(value) {
                        payload.set_value(name.as_str(), to_field_string(value));
                    }
                }
            }
        }

        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Endpoints, FieldMapping};
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 13, 2, 9).unwrap()
    }

    const TS: &str = "2026-05-04 13:02:09";

    fn builder() -> PayloadBuilder {
        PayloadBuilder::with_clock(fixed_clock)
    }

    fn subscription() -> SubscriptionSettings {
        SubscriptionSettings {
            source_id: "web".to_string(),
            subscription_id: "sub-default".to_string(),
            endpoints: Endpoints {
                developer: "https://dev".to_string(),
                production: "https://prod".to_string(),
            },
        }
    }

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn webform_mapping(optouts_enabled: bool) -> WebformMapping {
        WebformMapping {
            enabled: true,
            optouts_enabled,
            subscription_id: None,
            elements: vec![
                FieldMapping::new("email_field", "EmailAddress"),
                FieldMapping::new("optin_field", "OptIns"),
            ],
        }
    }

    // ─── Users ───────────────────────────────────────────────────

    fn user_mapping() -> UserMapping {
        UserMapping {
            enabled: true,
            subscription_id: None,
            fields: vec![
                FieldMapping::new("field_first_name", "FirstName"),
                FieldMapping::new("field_newsletter", "OptIns"),
                FieldMapping::new("field_ignored", ""),
            ],
        }
    }

    #[test]
    fn user_disabled_mapping_yields_nothing() {
        let mut mapping = user_mapping();
        mapping.enabled = false;
        let user = UserRecord::new(1, "a@b.com").with_field("field_newsletter", json!(true));

        assert!(builder()
            .build_from_user(&user, &mapping, &subscription())
            .is_none());
    }

    #[test]
    fn user_opted_in() {
        let user = UserRecord::new(1, "a@b.com")
            .with_field("field_first_name", json!("Ada"))
            .with_field("field_newsletter", json!("1"))
            .with_field("field_ignored", json!("secret"));

        let payload = builder()
            .build_from_user(&user, &user_mapping(), &subscription())
            .unwrap();

        assert_eq!(
            payload.keys,
            map(&[("EmailAddress", "a@b.com"), ("SourceID", "web"), ("TimeStamp", TS)])
        );
        assert_eq!(
            payload.values,
            map(&[("FirstName", "Ada"), ("OptIns", "sub-default")])
        );
    }

    #[test]
    fn user_not_opted_in_emits_optouts() {
        let user = UserRecord::new(1, "a@b.com").with_field("field_newsletter", json!("0"));

        let payload = builder()
            .build_from_user(&user, &user_mapping(), &subscription())
            .unwrap();

        assert_eq!(payload.values.get("OptOuts").map(String::as_str), Some("sub-default"));
        assert!(!payload.values.contains_key("OptIns"));
        // Mapped user fields are copied even when empty.
        assert_eq!(payload.values.get("FirstName").map(String::as_str), Some(""));
    }

    #[test]
    fn user_subscription_override() {
        let mut mapping = user_mapping();
        mapping.subscription_id = Some("sub-users".to_string());
        let user = UserRecord::new(1, "a@b.com").with_field("field_newsletter", json!(1));

        let payload = builder()
            .build_from_user(&user, &mapping, &subscription())
            .unwrap();

        assert_eq!(payload.values["OptIns"], "sub-users");
    }

    // ─── Webforms ────────────────────────────────────────────────

    #[test]
    fn webform_scenario_optins() {
        let submission = data(json!({"email_field": "a@b.com", "optin_field": "1"}));

        let payload = builder()
            .build_from_webform("contact", &submission, &webform_mapping(false), &subscription())
            .unwrap();

        assert_eq!(
            payload.keys,
            map(&[("EmailAddress", "a@b.com"), ("SourceID", "web"), ("TimeStamp", TS)])
        );
        assert_eq!(payload.values, map(&[("OptIns", "sub-default")]));
    }

    #[test]
    fn webform_empty_optin_without_optouts_emits_neither() {
        let submission = data(json!({"email_field": "a@b.com", "optin_field": ""}));

        let payload = builder()
            .build_from_webform("contact", &submission, &webform_mapping(false), &subscription())
            .unwrap();

        assert!(!payload.values.contains_key("OptIns"));
        assert!(!payload.values.contains_key("OptOuts"));
    }

    #[test]
    fn webform_empty_optin_with_optouts_emits_optouts() {
        let submission = data(json!({"email_field": "a@b.com"}));

        let payload = builder()
            .build_from_webform("contact", &submission, &webform_mapping(true), &subscription())
            .unwrap();

        assert_eq!(payload.values, map(&[("OptOuts", "sub-default")]));
    }

    #[test]
    fn webform_disabled_yields_nothing() {
        let mut mapping = webform_mapping(true);
        mapping.enabled = false;
        let submission = data(json!({"email_field": "a@b.com", "optin_field": "1"}));

        assert!(builder()
            .build_from_webform("contact", &submission, &mapping, &subscription())
            .is_none());
    }

    #[test]
    fn webform_without_email_mapping_has_no_email() {
        let mapping = WebformMapping {
            enabled: true,
            elements: vec![FieldMapping::new("optin_field", "OptIns")],
            ..Default::default()
        };
        let submission = data(json!({"optin_field": "1"}));

        let payload = builder()
            .build_from_webform("contact", &submission, &mapping, &subscription())
            .unwrap();

        assert!(!payload.has_email());
        assert_eq!(payload.keys["SourceID"], "web");
        assert_eq!(payload.keys["TimeStamp"], TS);
    }

    #[test]
    fn webform_skips_actions_unmapped_and_empty_attributes() {
        let mut mapping = webform_mapping(false);
        mapping.elements.extend([
            FieldMapping::new("actions", "Submit"),
            FieldMapping::new("notes", ""),
            FieldMapping::new("first_name", "FirstName"),
            FieldMapping::new("city", "City"),
            FieldMapping::new("interests", "Interests"),
        ]);
        let submission = data(json!({
            "email_field": "a@b.com",
            "optin_field": "1",
            "actions": "Send",
            "notes": "hello",
            "first_name": "Ada",
            "city": "",
            "interests": ["hiking", "birds"]
        }));

        let payload = builder()
            .build_from_webform("contact", &submission, &mapping, &subscription())
            .unwrap();

        assert_eq!(
            payload.values,
            map(&[
                ("FirstName", "Ada"),
                ("Interests", "hiking, birds"),
                ("OptIns", "sub-default"),
            ])
        );
    }

    #[test]
    fn webform_last_mapping_for_role_wins() {
        let mapping = WebformMapping {
            enabled: true,
            optouts_enabled: true,
            subscription_id: Some("sub-form".to_string()),
            elements: vec![
                FieldMapping::new("email_field", "EmailAddress"),
                FieldMapping::new("work_email", "EmailAddress"),
                FieldMapping::new("optin_a", "OptIns"),
                FieldMapping::new("optin_b", "OptIns"),
            ],
        };
        let submission = data(json!({
            "email_field": "home@b.com",
            "work_email": "work@b.com",
            "optin_a": "1",
            "optin_b": "1"
        }));

        let payload = builder()
            .build_from_webform("contact", &submission, &mapping, &subscription())
            .unwrap();

        assert_eq!(payload.email(), Some("work@b.com"));
        assert_eq!(payload.values, map(&[("OptIns", "sub-form")]));
    }

    #[test]
    fn webform_opt_state_is_not_exclusive_across_elements() {
        let mapping = WebformMapping {
            enabled: true,
            optouts_enabled: true,
            subscription_id: None,
            elements: vec![
                FieldMapping::new("email_field", "EmailAddress"),
                FieldMapping::new("optin_a", "OptIns"),
                FieldMapping::new("optin_b", "OptIns"),
            ],
        };
        let submission = data(json!({"email_field": "a@b.com", "optin_a": "1", "optin_b": "0"}));

        let payload = builder()
            .build_from_webform("contact", &submission, &mapping, &subscription())
            .unwrap();

        assert_eq!(
            payload.values,
            map(&[("OptIns", "sub-default"), ("OptOuts", "sub-default")])
        );
    }

    #[test]
    fn default_clock_produces_parseable_timestamp() {
        let payload = PayloadBuilder::new()
            .build_from_webform("contact", &Map::new(), &webform_mapping(false), &subscription())
            .unwrap();

        let ts = &payload.keys["TimeStamp"];
        assert!(chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
