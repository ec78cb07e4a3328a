//! Subscription settings shared by the user and webform mappings.

use super::credentials::{Endpoints, Environment};
use validator::Validate;

/// SFMC-side identifiers and the subscription endpoint pair.
#[derive(Debug, Clone, Validate)]
pub struct SubscriptionSettings {
    /// Originating system id, sent as `keys.SourceID`
    #[validate(length(min = 1, message = "source_id is required"))]
    pub source_id: String,
    /// Default subscription id for OptIns/OptOuts
    #[validate(length(min = 1, message = "subscription_id is required"))]
    pub subscription_id: String,
    #[validate(nested)]
    pub endpoints: Endpoints,
}

impl SubscriptionSettings {
    pub fn endpoint(&self, environment: Environment) -> &str {
        self.endpoints.select(environment)
    }
}
