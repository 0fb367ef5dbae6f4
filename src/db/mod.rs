pub mod from_row;
pub mod queries;
mod schema;

pub use schema::init_tenant_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::PaystackClient;
use crate::tenancy::TenantRegistry;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tenant prefix → database pool map, built once at startup.
    pub tenants: TenantRegistry,
    /// Paystack client: webhook signature verification plus API calls.
    pub gateway: PaystackClient,
    /// Base URL for payment callbacks (e.g., https://pay.example.ng)
    pub base_url: String,
    /// Static bearer token guarding /ops routes; None disables them.
    pub ops_token: Option<String>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
