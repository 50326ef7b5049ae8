use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Duration;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub paypal: bool,
    pub giftogram: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database && self.paypal && self.giftogram
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Database Connectivity: {}", status(self.database));
        println!("PayPal Connectivity:   {}", status(self.paypal));
        println!("Giftogram Connectivity: {}", status(self.giftogram));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  - {}", error);
            }
        }

        println!(
            "\nOverall Status: {}",
            if self.is_valid() { "PASS" } else { "FAIL" }
        );
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "OK" } else { "FAIL" }
}

pub async fn validate_environment(config: &Config, pool: &PgPool) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        paypal: true,
        giftogram: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = validate_database(pool).await {
        report.database = false;
        report.errors.push(format!("Database: {}", e));
    }

    if let Err(e) = validate_reachable(&config.paypal_api_url).await {
        report.paypal = false;
        report.errors.push(format!("PayPal: {}", e));
    }

    if let Err(e) = validate_reachable(&config.giftogram_api_url).await {
        report.giftogram = false;
        report.errors.push(format!("Giftogram: {}", e));
    }

    Ok(report)
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.paypal_client_id.is_empty() || config.paypal_client_secret.is_empty() {
        anyhow::bail!("PayPal credentials are empty");
    }
    if config.giftogram_api_key.is_empty() {
        anyhow::bail!("GIFTOGRAM_API_KEY is empty");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }

    url::Url::parse(&config.paypal_api_url).context("PAYPAL_API_URL is not a valid URL")?;
    url::Url::parse(&config.giftogram_api_url).context("GIFTOGRAM_API_URL is not a valid URL")?;

    if let Some(notification_url) = &config.notification_url {
        url::Url::parse(notification_url).context("NOTIFICATION_URL is not a valid URL")?;
    }

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}

async fn validate_reachable(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .get(base_url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {}", base_url))?;

    // Any HTTP answer proves the host is reachable; auth errors are expected
    // for unauthenticated probes.
    if response.status().is_server_error() {
        anyhow::bail!("{} returned status: {}", base_url, response.status());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeeSchedule;

    fn test_config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/test".to_string(),
            paypal_api_url: "https://api-m.sandbox.paypal.com".to_string(),
            paypal_client_id: "client-id".to_string(),
            paypal_client_secret: "client-secret".to_string(),
            giftogram_api_url: "https://api.giftogram.com".to_string(),
            giftogram_api_key: "api-key".to_string(),
            notification_url: None,
            fees: FeeSchedule::default(),
        }
    }

    #[test]
    fn accepts_complete_config() {
        assert!(validate_env_vars(&test_config()).is_ok());
    }

    #[test]
    fn rejects_empty_database_url() {
        let mut config = test_config();
        config.database_url = String::new();
        assert!(validate_env_vars(&config).is_err());
    }

    #[test]
    fn rejects_invalid_gateway_url() {
        let mut config = test_config();
        config.paypal_api_url = "not-a-url".to_string();
        assert!(validate_env_vars(&config).is_err());
    }

    #[test]
    fn rejects_missing_credentials() {
        let mut config = test_config();
        config.paypal_client_secret = String::new();
        assert!(validate_env_vars(&config).is_err());
    }
}
