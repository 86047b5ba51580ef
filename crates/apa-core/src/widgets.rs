//! # Widget Script Resolution
//!
//! Picks the hosted widget script the storefront must embed, based on the
//! configured region, environment and login-app setting.
//!
//! ```text
//!   payment_region ──┐ (empty → storefront base country → region)
//!   sandbox ─────────┼──► Widgets.js URL
//!   enable_login_app ┤    (non-app set gets ?sellerId=<seller_id>)
//!   seller_id ───────┘
//! ```

use crate::error::ApaResult;
use crate::region::{Environment, Region};
use crate::settings::Settings;

/// Widget script URLs for one capability variant, indexed by region
#[derive(Debug)]
pub struct WidgetTable {
    sandbox: [&'static str; 4],
    production: [&'static str; 4],
}

impl WidgetTable {
    /// Look up the script for an environment and region
    pub fn get(&self, environment: Environment, region: Region) -> &'static str {
        let row = match environment {
            Environment::Sandbox => &self.sandbox,
            Environment::Production => &self.production,
        };
        row[region.index()]
    }
}

/// Login-app capable widget set
pub static WIDGET_URLS: WidgetTable = WidgetTable {
    sandbox: [
        "https://static-na.payments-amazon.com/OffAmazonPayments/us/sandbox/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/sandbox/lpa/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/sandbox/lpa/js/Widgets.js",
        "https://origin-na.ssl-images-amazon.com/images/G/09/EP/offAmazonPayments/sandbox/prod/lpa/js/Widgets.js",
    ],
    production: [
        "https://static-na.payments-amazon.com/OffAmazonPayments/us/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/lpa/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/lpa/js/Widgets.js",
        "https://origin-na.ssl-images-amazon.com/images/G/09/EP/offAmazonPayments/live/prod/lpa/js/Widgets.js",
    ],
};

/// Widget set used when login app is disabled
pub static NON_APP_WIDGET_URLS: WidgetTable = WidgetTable {
    sandbox: [
        "https://static-na.payments-amazon.com/OffAmazonPayments/us/sandbox/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/sandbox/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/sandbox/js/Widgets.js",
        "https://static-fe.payments-amazon.com/OffAmazonPayments/jp/sandbox/js/Widgets.js",
    ],
    production: [
        "https://static-na.payments-amazon.com/OffAmazonPayments/us/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/js/Widgets.js",
        "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/js/Widgets.js",
        "https://static-fe.payments-amazon.com/OffAmazonPayments/jp/js/Widgets.js",
    ],
};

/// Source of the storefront's base country
pub trait Storefront: Send + Sync {
    /// ISO 3166-1 alpha-2 code of the shop's base location
    fn base_country(&self) -> String;
}

/// Storefront with a fixed base country
#[derive(Debug, Clone)]
pub struct FixedStorefront {
    country: String,
}

impl FixedStorefront {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
        }
    }
}

impl Default for FixedStorefront {
    fn default() -> Self {
        Self::new("US")
    }
}

impl Storefront for FixedStorefront {
    fn base_country(&self) -> String {
        self.country.clone()
    }
}

/// Region to use for the given settings. An empty region falls back to
/// the storefront base country; an unknown code is an error.
pub fn resolve_region(settings: &Settings, storefront: &dyn Storefront) -> ApaResult<Region> {
    if settings.payment_region.trim().is_empty() {
        return Ok(Region::from_country(&storefront.base_country()));
    }
    Region::from_code(&settings.payment_region)
}

/// Resolve the widget script URL for the given settings
pub fn resolve_widget_url(settings: &Settings, storefront: &dyn Storefront) -> ApaResult<String> {
    let region = resolve_region(settings, storefront)?;
    let environment = Environment::from_sandbox(settings.sandbox);

    if settings.enable_login_app {
        return Ok(WIDGET_URLS.get(environment, region).to_string());
    }

    Ok(format!(
        "{}?sellerId={}",
        NON_APP_WIDGET_URLS.get(environment, region),
        settings.seller_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApaError;

    fn settings(region: &str, sandbox: bool, login_app: bool) -> Settings {
        Settings::default()
            .with_region(region)
            .with_sandbox(sandbox)
            .with_login_app(login_app)
            .with_seller_id("A2SELLER")
    }

    #[test]
    fn test_login_app_table() {
        let storefront = FixedStorefront::default();
        let expected = [
            (
                "us",
                true,
                "https://static-na.payments-amazon.com/OffAmazonPayments/us/sandbox/js/Widgets.js",
            ),
            (
                "gb",
                true,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/sandbox/lpa/js/Widgets.js",
            ),
            (
                "eu",
                true,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/sandbox/lpa/js/Widgets.js",
            ),
            (
                "jp",
                true,
                "https://origin-na.ssl-images-amazon.com/images/G/09/EP/offAmazonPayments/sandbox/prod/lpa/js/Widgets.js",
            ),
            (
                "us",
                false,
                "https://static-na.payments-amazon.com/OffAmazonPayments/us/js/Widgets.js",
            ),
            (
                "gb",
                false,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/lpa/js/Widgets.js",
            ),
            (
                "eu",
                false,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/lpa/js/Widgets.js",
            ),
            (
                "jp",
                false,
                "https://origin-na.ssl-images-amazon.com/images/G/09/EP/offAmazonPayments/live/prod/lpa/js/Widgets.js",
            ),
        ];

        for (region, sandbox, url) in expected {
            let resolved =
                resolve_widget_url(&settings(region, sandbox, true), &storefront).unwrap();
            assert_eq!(resolved, url, "region={} sandbox={}", region, sandbox);
        }
    }

    #[test]
    fn test_non_app_table_appends_seller_id() {
        let storefront = FixedStorefront::default();
        let expected = [
            (
                "us",
                true,
                "https://static-na.payments-amazon.com/OffAmazonPayments/us/sandbox/js/Widgets.js",
            ),
            (
                "gb",
                true,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/sandbox/js/Widgets.js",
            ),
            (
                "eu",
                true,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/sandbox/js/Widgets.js",
            ),
            (
                "jp",
                true,
                "https://static-fe.payments-amazon.com/OffAmazonPayments/jp/sandbox/js/Widgets.js",
            ),
            (
                "us",
                false,
                "https://static-na.payments-amazon.com/OffAmazonPayments/us/js/Widgets.js",
            ),
            (
                "gb",
                false,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/gbp/js/Widgets.js",
            ),
            (
                "eu",
                false,
                "https://static-eu.payments-amazon.com/OffAmazonPayments/eur/js/Widgets.js",
            ),
            (
                "jp",
                false,
                "https://static-fe.payments-amazon.com/OffAmazonPayments/jp/js/Widgets.js",
            ),
        ];

        for (region, sandbox, url) in expected {
            let resolved =
                resolve_widget_url(&settings(region, sandbox, false), &storefront).unwrap();
            assert_eq!(resolved, format!("{}?sellerId=A2SELLER", url));
        }
    }

    #[test]
    fn test_seller_id_is_not_encoded() {
        let settings = settings("us", false, false).with_seller_id("A B&C");
        let url = resolve_widget_url(&settings, &FixedStorefront::default()).unwrap();
        assert!(url.ends_with("?sellerId=A B&C"));
    }

    #[test]
    fn test_empty_region_uses_base_country() {
        let settings = settings("", false, true);

        let url = resolve_widget_url(&settings, &FixedStorefront::new("DE")).unwrap();
        assert_eq!(url, WIDGET_URLS.get(Environment::Production, Region::Eu));

        let url = resolve_widget_url(&settings, &FixedStorefront::new("JP")).unwrap();
        assert_eq!(url, WIDGET_URLS.get(Environment::Production, Region::Jp));
    }

    #[test]
    fn test_unknown_region_is_configuration_error() {
        let err = resolve_widget_url(&settings("de", true, true), &FixedStorefront::default())
            .unwrap_err();
        assert!(matches!(err, ApaError::UnknownRegion { ref region } if region == "de"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let settings = settings("gb", true, false);
        let storefront = FixedStorefront::default();
        let first = resolve_widget_url(&settings, &storefront).unwrap();
        let second = resolve_widget_url(&settings, &storefront).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }
}
