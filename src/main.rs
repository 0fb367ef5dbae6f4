use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plotpay::config::{Config, parse_tenant_sites};
use plotpay::db::{AppState, queries};
use plotpay::handlers;
use plotpay::models::{BillingCycle, CreateProfile, CreateProperty, CreateTransaction, TransactionType};
use plotpay::payments::PaystackClient;
use plotpay::tenancy::{self, TenantRegistry};

#[derive(Parser, Debug)]
#[command(name = "plotpay")]
#[command(about = "Payment reconciliation service for a network of land listing sites")]
struct Cli {
    /// Seed each configured site with dev data (profile, property, pending transaction)
    #[arg(long)]
    seed: bool,

    /// Delete tenant databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds every configured site with dev data for testing.
/// Creates: a profile, a property, and a pending subscription transaction.
/// Only runs in dev mode and only for sites that are still empty.
fn seed_dev_data(state: &AppState) {
    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    for (prefix, pool) in state.tenants.iter() {
        let conn = pool.get().expect("Failed to get db connection for seeding");

        let count = queries::count_profiles(&conn).expect("Failed to count profiles");
        if count > 0 {
            tracing::info!("Site {} already has data, skipping seed", prefix);
            continue;
        }

        let profile = queries::create_profile(
            &conn,
            &CreateProfile {
                email: format!("dev@{}.example.ng", prefix),
                full_name: "Dev Agent".to_string(),
                phone: Some("+2348012345678".to_string()),
            },
        )
        .expect("Failed to create dev profile");

        let property = queries::create_property(
            &conn,
            &CreateProperty {
                profile_id: profile.id.clone(),
                title: "600sqm corner plot, Ahmadu Bello Way".to_string(),
                location: "Mabushi, Abuja".to_string(),
                price_kobo: 450_000_000,
            },
        )
        .expect("Failed to create dev property");

        // A pending row to fire test webhooks at.
        let reference = tenancy::new_reference(prefix);
        let transaction = queries::create_transaction(
            &conn,
            &CreateTransaction {
                reference,
                profile_id: profile.id.clone(),
                transaction_type: TransactionType::Subscription,
                amount_kobo: 500_000,
                subscription_tier: Some("pro".to_string()),
                billing_cycle: Some(BillingCycle::Monthly),
                property_id: None,
                boost_duration_days: None,
            },
        )
        .expect("Failed to create dev transaction");

        tracing::info!("Site {}: profile {}", prefix, profile.email);

        // Copy-paste friendly output (no log formatting)
        println!();
        println!("--- COPY FROM HERE ---");
        println!("  site: {}", prefix);
        println!("  profile_id: {}", profile.id);
        println!("  property_id: {}", property.id);
        println!("  pending_reference: {}", transaction.reference);
        println!("--- END COPY ---");
        println!();
    }

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plotpay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // A missing gateway secret means every webhook would be rejected.
    // Refuse to start outside dev mode.
    if config.paystack_secret_key.is_empty() {
        if config.dev_mode {
            tracing::warn!("PAYSTACK_SECRET_KEY is not set; webhook signatures will not verify");
        } else {
            eprintln!("PAYSTACK_SECRET_KEY must be set outside dev mode");
            std::process::exit(1);
        }
    }

    let sites = match parse_tenant_sites(&config.tenant_sites) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid TENANT_SITES: {}", e);
            std::process::exit(1);
        }
    };

    // Open a pool per site and run schema setup
    let tenants = TenantRegistry::open(&sites).expect("Failed to open tenant databases");
    tracing::info!(
        "Routing for {} site(s): {}",
        sites.len(),
        tenants.prefixes().join(", ")
    );

    let gateway = PaystackClient::new(&config.paystack_secret_key, &config.paystack_api_url);

    let state = AppState {
        tenants,
        gateway,
        base_url: config.base_url.clone(),
        ops_token: config.ops_token.clone(),
    };

    if config.ops_token.is_none() {
        tracing::warn!("OPS_TOKEN is not set; /ops endpoints are disabled");
    }

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set PLOTPAY_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Build the application router
    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::router())
        // Webhook endpoint (signature auth)
        .merge(handlers::webhooks::router())
        // Ops API (bearer token auth)
        .merge(handlers::ops::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: tenant databases will be deleted on exit");
    }

    tracing::info!("PlotPay server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for site in &sites {
            if let Err(e) = std::fs::remove_file(&site.database_path) {
                tracing::warn!("Failed to remove {}: {}", site.database_path, e);
            } else {
                tracing::info!("Removed {}", site.database_path);
            }
            // Also remove WAL and SHM files if they exist
            let _ = std::fs::remove_file(format!("{}-wal", site.database_path));
            let _ = std::fs::remove_file(format!("{}-shm", site.database_path));
        }
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
