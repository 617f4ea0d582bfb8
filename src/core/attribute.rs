//! Keys identifying a demographic series and a model family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Demographic attribute of the emigrant count series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Total,
    Male,
    Female,
}

impl Attribute {
    /// All attributes, in canonical order.
    pub const ALL: [Attribute; 3] = [Attribute::Total, Attribute::Male, Attribute::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Total => "total",
            Attribute::Male => "male",
            Attribute::Female => "female",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Attribute::Total),
            "male" => Ok(Attribute::Male),
            "female" => Ok(Attribute::Female),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown attribute '{other}'"
            ))),
        }
    }
}

/// Family of the single-step predictor driving a forecast.
///
/// Pointwise models consume the input window as an unordered flat vector;
/// sequential models consume it as an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Pointwise,
    Sequential,
}

impl ModelFamily {
    /// Both families, in canonical order.
    pub const ALL: [ModelFamily; 2] = [ModelFamily::Pointwise, ModelFamily::Sequential];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Pointwise => "pointwise",
            ModelFamily::Sequential => "sequential",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pointwise" => Ok(ModelFamily::Pointwise),
            "sequential" => Ok(ModelFamily::Sequential),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown model family '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_round_trips_through_str() {
        for attr in Attribute::ALL {
            assert_eq!(attr.as_str().parse::<Attribute>().unwrap(), attr);
        }
    }

    #[test]
    fn attribute_parse_is_case_and_space_insensitive() {
        assert_eq!(" Total ".parse::<Attribute>().unwrap(), Attribute::Total);
        assert_eq!("FEMALE".parse::<Attribute>().unwrap(), Attribute::Female);
    }

    #[test]
    fn unknown_attribute_is_invalid_parameter() {
        let err = "households".parse::<Attribute>().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn family_round_trips_through_str() {
        for family in ModelFamily::ALL {
            assert_eq!(family.as_str().parse::<ModelFamily>().unwrap(), family);
        }
    }

    #[test]
    fn unknown_family_is_invalid_parameter() {
        let err = "arima".parse::<ModelFamily>().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }
}
