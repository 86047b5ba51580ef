//! # Payment Regions and Environments
//!
//! The provider runs four disjoint regional deployments, each with a
//! sandbox and a production environment.

use crate::error::{ApaError, ApaResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Gb,
    Eu,
    Jp,
}

/// Countries served by the `eu` deployment
const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

impl Region {
    /// All regions, in table order
    pub const ALL: [Region; 4] = [Region::Us, Region::Gb, Region::Eu, Region::Jp];

    /// Lowercase region code as stored in settings
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Gb => "gb",
            Region::Eu => "eu",
            Region::Jp => "jp",
        }
    }

    /// Parse a stored region code. Unknown codes are a configuration error.
    pub fn from_code(code: &str) -> ApaResult<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "gb" => Ok(Region::Gb),
            "eu" => Ok(Region::Eu),
            "jp" => Ok(Region::Jp),
            _ => Err(ApaError::UnknownRegion {
                region: code.to_string(),
            }),
        }
    }

    /// Map a storefront base country (ISO 3166-1 alpha-2) to a region.
    /// Countries outside the served markets fall back to `us`.
    pub fn from_country(country: &str) -> Self {
        let country = country.trim().to_ascii_uppercase();
        match country.as_str() {
            "US" => Region::Us,
            "GB" | "UK" => Region::Gb,
            "JP" => Region::Jp,
            c if EU_COUNTRIES.contains(&c) => Region::Eu,
            _ => Region::Us,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Region::Us => 0,
            Region::Gb => 1,
            Region::Eu => 2,
            Region::Jp => 3,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ApaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Provider environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_sandbox(sandbox: bool) -> Self {
        if sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }

    pub fn is_sandbox(&self) -> bool {
        matches!(self, Environment::Sandbox)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_codes() {
        for region in Region::ALL {
            assert_eq!(Region::from_code(region.as_str()).unwrap(), region);
        }
        assert_eq!("GB".parse::<Region>().unwrap(), Region::Gb);
    }

    #[test]
    fn test_unknown_region_code() {
        let err = Region::from_code("de").unwrap_err();
        assert!(matches!(err, ApaError::UnknownRegion { ref region } if region == "de"));
    }

    #[test]
    fn test_region_from_country() {
        assert_eq!(Region::from_country("US"), Region::Us);
        assert_eq!(Region::from_country("gb"), Region::Gb);
        assert_eq!(Region::from_country("JP"), Region::Jp);
        assert_eq!(Region::from_country("DE"), Region::Eu);
        assert_eq!(Region::from_country("FR"), Region::Eu);
        assert_eq!(Region::from_country("BR"), Region::Us);
        assert_eq!(Region::from_country(""), Region::Us);
    }

    #[test]
    fn test_environment() {
        assert_eq!(Environment::from_sandbox(true), Environment::Sandbox);
        assert_eq!(Environment::from_sandbox(false).as_str(), "production");
        assert!(Environment::Sandbox.is_sandbox());
    }
}
