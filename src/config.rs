use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub paystack_secret_key: String,
    pub paystack_api_url: String,
    /// Raw `TENANT_SITES` value, parsed at startup by [`parse_tenant_sites`].
    pub tenant_sites: String,
    pub ops_token: Option<String>,
    pub dev_mode: bool,
}

/// One marketplace site and the SQLite database backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSite {
    pub prefix: String,
    pub database_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("PLOTPAY_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let tenant_sites = env::var("TENANT_SITES").unwrap_or_else(|_| {
            if dev_mode {
                "demo=plotpay_demo.db".to_string()
            } else {
                String::new()
            }
        });

        Self {
            host,
            port,
            base_url,
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY").unwrap_or_default(),
            paystack_api_url: env::var("PAYSTACK_API_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            tenant_sites,
            ops_token: env::var("OPS_TOKEN").ok(),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `TENANT_SITES`, a comma-separated list of `prefix=database_path`
/// pairs (e.g. `abuja=data/abuja.db,gwarinpa=data/gwarinpa.db`).
///
/// Prefixes become the routing key embedded in payment references, so they
/// must be non-empty, unique, and free of `_` (the reference delimiter).
pub fn parse_tenant_sites(raw: &str) -> std::result::Result<Vec<TenantSite>, String> {
    let mut sites: Vec<TenantSite> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (prefix, path) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid TENANT_SITES entry '{}', expected prefix=path", entry))?;
        let prefix = prefix.trim();
        let path = path.trim();

        if prefix.is_empty() || path.is_empty() {
            return Err(format!("invalid TENANT_SITES entry '{}': empty prefix or path", entry));
        }
        if prefix.contains('_') {
            return Err(format!("tenant prefix '{}' must not contain '_'", prefix));
        }
        if sites.iter().any(|s| s.prefix == prefix) {
            return Err(format!("duplicate tenant prefix '{}'", prefix));
        }

        sites.push(TenantSite {
            prefix: prefix.to_string(),
            database_path: path.to_string(),
        });
    }

    if sites.is_empty() {
        return Err("TENANT_SITES must configure at least one site".to_string());
    }

    Ok(sites)
}
