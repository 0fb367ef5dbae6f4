//! Tenant routing: which site's database owns a payment reference.
//!
//! Every marketplace site in the network is a tenant with its own SQLite
//! database. Payment references are minted as `{prefix}_{opaque}` at
//! initiation time, and inbound gateway events are routed back to the owning
//! site by that prefix alone.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::TenantSite;
use crate::db::{create_pool, init_tenant_db, DbPool};
use crate::error::{AppError, Result};

/// Extract the site prefix from a payment reference.
///
/// Returns the substring before the first `_`, or None when the reference
/// has no underscore or either half is empty.
pub fn site_prefix(reference: &str) -> Option<&str> {
    match reference.split_once('_') {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => Some(prefix),
        _ => None,
    }
}

/// Mint a payment reference for a site.
pub fn new_reference(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Prefix → pool map over all configured tenant databases.
///
/// Built once at startup and handed to handlers through `AppState`; nothing
/// in the crate reaches for ambient/global connection state.
#[derive(Clone)]
pub struct TenantRegistry {
    pools: Arc<HashMap<String, DbPool>>,
}

impl TenantRegistry {
    /// Open and initialize every configured tenant database.
    pub fn open(sites: &[TenantSite]) -> Result<Self> {
        let mut pools = HashMap::new();
        for site in sites {
            let pool = create_pool(&site.database_path)?;
            {
                let conn = pool.get()?;
                init_tenant_db(&conn)?;
            }
            pools.insert(site.prefix.clone(), pool);
        }
        Ok(Self {
            pools: Arc::new(pools),
        })
    }

    /// Build a registry from already-open pools (tests use this with
    /// in-memory databases).
    pub fn from_pools(pools: HashMap<String, DbPool>) -> Self {
        Self {
            pools: Arc::new(pools),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&DbPool> {
        self.pools.get(prefix)
    }

    /// Route a payment reference to its owning tenant.
    ///
    /// A missing or unrecognized prefix is malformed input (the request can
    /// never succeed on retry), so both cases are BadRequest.
    pub fn resolve_reference<'a>(&self, reference: &'a str) -> Result<(&'a str, &DbPool)> {
        let prefix = site_prefix(reference).ok_or_else(|| {
            AppError::BadRequest(format!("Malformed payment reference '{}'", reference))
        })?;
        let pool = self
            .get(prefix)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown site prefix '{}'", prefix)))?;
        Ok((prefix, pool))
    }

    /// Configured prefixes, sorted for stable output.
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.pools.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DbPool)> {
        self.pools.iter()
    }
}
