//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a number allocation that lost a race is retried.
    #[serde(default = "default_max_sequence_attempts")]
    pub max_sequence_attempts: u32,
    /// Chart-of-accounts codes used by the automatic posting rules.
    #[serde(default)]
    pub system_accounts: SystemAccountCodes,
}

fn default_max_sequence_attempts() -> u32 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_sequence_attempts: default_max_sequence_attempts(),
            system_accounts: SystemAccountCodes::default(),
        }
    }
}

/// Account codes the posting rules resolve for every tenant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemAccountCodes {
    /// Trade accounts receivable.
    #[serde(default = "default_accounts_receivable")]
    pub accounts_receivable: String,
    /// Sales / service revenue.
    #[serde(default = "default_sales_revenue")]
    pub sales_revenue: String,
    /// Output VAT payable.
    #[serde(default = "default_vat_output")]
    pub vat_output: String,
    /// Trade accounts payable.
    #[serde(default = "default_accounts_payable")]
    pub accounts_payable: String,
    /// Purchases expense.
    #[serde(default = "default_purchases")]
    pub purchases: String,
    /// Input VAT receivable.
    #[serde(default = "default_vat_input")]
    pub vat_input: String,
}

fn default_accounts_receivable() -> String {
    "11210".to_string()
}

fn default_sales_revenue() -> String {
    "41200".to_string()
}

fn default_vat_output() -> String {
    "21210".to_string()
}

fn default_accounts_payable() -> String {
    "21110".to_string()
}

fn default_purchases() -> String {
    "51200".to_string()
}

fn default_vat_input() -> String {
    "11410".to_string()
}

impl Default for SystemAccountCodes {
    fn default() -> Self {
        Self {
            accounts_receivable: default_accounts_receivable(),
            sales_revenue: default_sales_revenue(),
            vat_output: default_vat_output(),
            accounts_payable: default_accounts_payable(),
            purchases: default_purchases(),
            vat_input: default_vat_input(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.max_sequence_attempts, 3);
        assert_eq!(ledger.system_accounts.accounts_receivable, "11210");
        assert_eq!(ledger.system_accounts.sales_revenue, "41200");
        assert_eq!(ledger.system_accounts.vat_output, "21210");
        assert_eq!(ledger.system_accounts.accounts_payable, "21110");
        assert_eq!(ledger.system_accounts.purchases, "51200");
        assert_eq!(ledger.system_accounts.vat_input, "11410");
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-nonexistent")),
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LEDGER__MAX_SEQUENCE_ATTEMPTS", Some("5")),
                ("TALLY__LEDGER__SYSTEM_ACCOUNTS__VAT_OUTPUT", Some("21299")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.ledger.max_sequence_attempts, 5);
                assert_eq!(config.ledger.system_accounts.vat_output, "21299");
                assert_eq!(config.ledger.system_accounts.sales_revenue, "41200");
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-nonexistent")),
                ("TALLY__DATABASE__URL", None::<&str>),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
