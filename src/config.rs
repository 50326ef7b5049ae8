use anyhow::Result;
use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub paypal_api_url: String,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub giftogram_api_url: String,
    pub giftogram_api_key: String,
    pub notification_url: Option<String>,
    pub fees: FeeSchedule,
}

/// Fee configuration injected into the orchestrator. One source of truth:
/// the withdrawal fee and the platform fee are never hardcoded in a flow.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    /// Fraction of a withdrawal kept as processing fee (e.g. 0.01 = 1%).
    pub withdrawal_fee_rate: BigDecimal,
    /// Fraction of an invoice/milestone total kept by the platform.
    pub platform_fee_rate: BigDecimal,
    pub minimum_withdrawal: BigDecimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            withdrawal_fee_rate: BigDecimal::from_str("0.01").expect("valid decimal"),
            platform_fee_rate: BigDecimal::from_str("0.10").expect("valid decimal"),
            minimum_withdrawal: BigDecimal::from(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            paypal_api_url: env::var("PAYPAL_API_URL")
                .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string()),
            paypal_client_id: env::var("PAYPAL_CLIENT_ID")?,
            paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET")?,
            giftogram_api_url: env::var("GIFTOGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.giftogram.com".to_string()),
            giftogram_api_key: env::var("GIFTOGRAM_API_KEY")?,
            notification_url: env::var("NOTIFICATION_URL").ok(),
            fees: FeeSchedule::from_env()?,
        })
    }
}

impl FeeSchedule {
    pub fn from_env() -> Result<Self> {
        let defaults = FeeSchedule::default();

        Ok(FeeSchedule {
            withdrawal_fee_rate: parse_decimal_var(
                "WITHDRAWAL_FEE_RATE",
                defaults.withdrawal_fee_rate,
            )?,
            platform_fee_rate: parse_decimal_var("PLATFORM_FEE_RATE", defaults.platform_fee_rate)?,
            minimum_withdrawal: parse_decimal_var(
                "MINIMUM_WITHDRAWAL",
                defaults.minimum_withdrawal,
            )?,
        })
    }
}

fn parse_decimal_var(name: &str, default: BigDecimal) -> Result<BigDecimal> {
    match env::var(name) {
        Ok(raw) => BigDecimal::from_str(raw.trim())
            .map_err(|e| anyhow::anyhow!("{} is not a valid decimal: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fee_schedule() {
        let fees = FeeSchedule::default();

        assert_eq!(fees.withdrawal_fee_rate, BigDecimal::from_str("0.01").unwrap());
        assert_eq!(fees.platform_fee_rate, BigDecimal::from_str("0.10").unwrap());
        assert_eq!(fees.minimum_withdrawal, BigDecimal::from(10));
    }

    #[test]
    fn parse_decimal_var_falls_back_to_default() {
        let value = parse_decimal_var("NOT_A_REAL_VAR_12345", BigDecimal::from(5)).unwrap();
        assert_eq!(value, BigDecimal::from(5));
    }
}
