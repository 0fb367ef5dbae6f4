use serde::{Deserialize, Serialize};

/// A land listing on a marketplace site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub profile_id: String,

    pub title: String,
    pub location: String,

    // Asking price (kobo)
    pub price_kobo: i64,

    /// Set by a successful boost payment; cleared by the site when
    /// `featured_until` passes.
    pub is_featured: bool,
    pub featured_until: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Data required to create a listing (seed/test provisioning).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProperty {
    pub profile_id: String,
    pub title: String,
    pub location: String,
    pub price_kobo: i64,
}
