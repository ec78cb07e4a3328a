// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the connector.

pub mod credentials;
pub mod field_value;
pub mod mapping;
pub mod payload;
pub mod record;
pub mod subscription;
pub mod token;
pub mod user;

pub use credentials::{ApiSettings, Credentials, Endpoints, Environment};
pub use mapping::{FieldMapping, MappingTarget, UserMapping, WebformMapping};
pub use payload::SubscriptionPayload;
pub use record::{RecordId, SyncRecord, SyncStatus, WebformSubmission};
pub use subscription::SubscriptionSettings;
pub use token::CachedToken;
pub use user::UserRecord;
