//! Unit conversion
//!
//! Length and weight use static factor tables relative to a base unit (meter, kilogram).
//! Temperature goes through Celsius.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const LENGTH_FACTORS: &[(&str, f64)] = &[
    ("meter", 1.0),
    ("kilometer", 1000.0),
    ("centimeter", 0.01),
    ("millimeter", 0.001),
    ("mile", 1609.34),
    ("yard", 0.9144),
    ("feet", 0.3048),
    ("inch", 0.0254),
];

const WEIGHT_FACTORS: &[(&str, f64)] = &[
    ("kilogram", 1.0),
    ("gram", 0.001),
    ("pound", 0.453592),
    ("ounce", 0.0283495),
    ("ton", 1000.0),
];

const TEMPERATURE_UNITS: &[&str] = &["celsius", "fahrenheit", "kelvin"];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit category: {0}")]
    UnknownCategory(String),

    #[error("Unknown {category} unit: {unit}")]
    UnknownUnit { category: UnitCategory, unit: String },

    #[error("Value is not a finite number: {0}")]
    NotFinite(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Length,
    Weight,
    Temperature,
}

impl Display for UnitCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UnitCategory::Length => write!(f, "length"),
            UnitCategory::Weight => write!(f, "weight"),
            UnitCategory::Temperature => write!(f, "temperature"),
        }
    }
}

impl FromStr for UnitCategory {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "length" => Ok(UnitCategory::Length),
            "weight" => Ok(UnitCategory::Weight),
            "temperature" => Ok(UnitCategory::Temperature),
            other => Err(UnitError::UnknownCategory(other.to_string())),
        }
    }
}

impl UnitCategory {
    pub fn all() -> [UnitCategory; 3] {
        [
            UnitCategory::Length,
            UnitCategory::Weight,
            UnitCategory::Temperature,
        ]
    }

    /// Unit names of this category, in display order.
    pub fn units(self) -> Vec<&'static str> {
        match self {
            UnitCategory::Length => LENGTH_FACTORS.iter().map(|(u, _)| *u).collect(),
            UnitCategory::Weight => WEIGHT_FACTORS.iter().map(|(u, _)| *u).collect(),
            UnitCategory::Temperature => TEMPERATURE_UNITS.to_vec(),
        }
    }

    /// Decimal places used when a result of this category is displayed.
    pub fn display_precision(self) -> usize {
        match self {
            UnitCategory::Temperature => 2,
            UnitCategory::Length | UnitCategory::Weight => 6,
        }
    }

    fn factor(self, unit: &str) -> Result<f64, UnitError> {
        let table: &[(&str, f64)] = match self {
            UnitCategory::Length => LENGTH_FACTORS,
            UnitCategory::Weight => WEIGHT_FACTORS,
            // Temperature is not linear; it never goes through a factor.
            UnitCategory::Temperature => &[],
        };
        table
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(unit))
            .map(|(_, factor)| *factor)
            .ok_or_else(|| UnitError::UnknownUnit {
                category: self,
                unit: unit.to_string(),
            })
    }
}

fn to_celsius(value: f64, unit: &str) -> Result<f64, UnitError> {
    match unit.to_lowercase().as_str() {
        "celsius" => Ok(value),
        "fahrenheit" => Ok((value - 32.0) * 5.0 / 9.0),
        "kelvin" => Ok(value - 273.15),
        _ => Err(UnitError::UnknownUnit {
            category: UnitCategory::Temperature,
            unit: unit.to_string(),
        }),
    }
}

fn from_celsius(value: f64, unit: &str) -> Result<f64, UnitError> {
    match unit.to_lowercase().as_str() {
        "celsius" => Ok(value),
        "fahrenheit" => Ok(value * 9.0 / 5.0 + 32.0),
        "kelvin" => Ok(value + 273.15),
        _ => Err(UnitError::UnknownUnit {
            category: UnitCategory::Temperature,
            unit: unit.to_string(),
        }),
    }
}

/// Converts `value` from one unit to another within `category`.
pub fn convert_units(
    category: UnitCategory,
    value: f64,
    from: &str,
    to: &str,
) -> Result<f64, UnitError> {
    if !value.is_finite() {
        return Err(UnitError::NotFinite(value));
    }

    match category {
        UnitCategory::Temperature => {
            let celsius = to_celsius(value, from)?;
            from_celsius(celsius, to)
        }
        UnitCategory::Length | UnitCategory::Weight => {
            let from_factor = category.factor(from)?;
            let to_factor = category.factor(to)?;
            Ok(value * from_factor / to_factor)
        }
    }
}

/// Formats a converted value with the precision of its category.
pub fn format_converted(category: UnitCategory, value: f64) -> String {
    format!("{:.*}", category.display_precision(), value)
}
