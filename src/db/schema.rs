use rusqlite::Connection;

/// Initialize one tenant site's database schema.
///
/// Every site gets the same three tables: the payment ledger plus the two
/// entities payment effects land on. Webhook deliveries arrive concurrently,
/// so tenant databases run in WAL mode.
pub fn init_tenant_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- Agent/seller profiles (verification + subscription state lives here)
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL,
            phone TEXT,
            subscription_tier TEXT NOT NULL DEFAULT 'free',
            subscription_expiry INTEGER,
            is_verified INTEGER NOT NULL DEFAULT 0,
            verification_status TEXT NOT NULL DEFAULT 'unverified',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_email ON profiles(email);

        -- Land listings
        CREATE TABLE IF NOT EXISTS properties (
            id TEXT PRIMARY KEY,
            profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            location TEXT NOT NULL,
            price_kobo INTEGER NOT NULL,
            is_featured INTEGER NOT NULL DEFAULT 0,
            featured_until INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_properties_profile ON properties(profile_id);
        CREATE INDEX IF NOT EXISTS idx_properties_featured ON properties(is_featured) WHERE is_featured = 1;

        -- Payment ledger. One row per payment attempt, keyed by the gateway
        -- reference. status='success' is terminal; the conditional updates in
        -- queries.rs are the only writers after creation.
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL UNIQUE,
            profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            transaction_type TEXT NOT NULL CHECK (transaction_type IN ('subscription', 'boost')),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'success', 'failed', 'abandoned')),
            amount_kobo INTEGER NOT NULL,
            subscription_tier TEXT,
            billing_cycle TEXT CHECK (billing_cycle IS NULL OR billing_cycle IN ('monthly', 'annual')),
            property_id TEXT REFERENCES properties(id) ON DELETE SET NULL,
            boost_duration_days INTEGER,
            gateway_response TEXT,
            verified_at INTEGER,
            webhook_received_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_reference ON transactions(reference);
        CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);
        CREATE INDEX IF NOT EXISTS idx_transactions_profile ON transactions(profile_id);
        "#,
    )?;

    Ok(())
}
