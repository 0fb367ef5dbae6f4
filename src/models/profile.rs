use serde::{Deserialize, Serialize};

/// An agent/seller account on a marketplace site.
///
/// Tier names are free-form (each site configures its own ladder, e.g.
/// "free", "pro", "premium"); the ledger and effect code treat them as
/// opaque strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,

    pub subscription_tier: String,
    /// None = no active paid subscription.
    pub subscription_expiry: Option<i64>,

    /// Flipped to verified by any successful subscription payment.
    pub is_verified: bool,
    pub verification_status: String,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Data required to create a profile (seed/test provisioning).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfile {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
}
