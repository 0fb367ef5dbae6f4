use serde::{Deserialize, Serialize};

/// A payment attempt in a tenant's ledger, looked up and reconciled by
/// its gateway reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Globally unique gateway reference, `{site_prefix}_{opaque}`.
    /// Immutable once created.
    pub reference: String,
    pub profile_id: String,

    pub transaction_type: TransactionType,
    pub status: TransactionStatus,

    // Amounts (kobo)
    pub amount_kobo: i64,

    // Subscription payments
    pub subscription_tier: Option<String>,
    pub billing_cycle: Option<BillingCycle>,

    // Boost payments
    pub property_id: Option<String>,
    pub boost_duration_days: Option<i64>,

    /// Raw gateway payload snapshot stored on reconciliation, for audit.
    pub gateway_response: Option<String>,

    // Reconciliation timestamps; None means "not yet reconciled"
    pub verified_at: Option<i64>,
    pub webhook_received_at: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Data required to open a new pending transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    pub reference: String,
    pub profile_id: String,
    pub transaction_type: TransactionType,
    pub amount_kobo: i64,

    pub subscription_tier: Option<String>,
    pub billing_cycle: Option<BillingCycle>,

    pub property_id: Option<String>,
    pub boost_duration_days: Option<i64>,
}

/// What the payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Subscription,
    Boost,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Boost => "boost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "subscription" => Some(Self::Subscription),
            "boost" => Some(Self::Boost),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reconciliation state of a payment attempt.
///
/// `Success` is terminal: once set it never regresses, and `Failed`/
/// `Abandoned` may only be reached from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a subscription payment prices its term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "annual" => Some(Self::Annual),
            _ => None,
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Filters for listing a tenant's ledger.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilters {
    pub status: Option<TransactionStatus>,
    pub transaction_type: Option<TransactionType>,
    pub profile_id: Option<String>,
}
