// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Length and angle units. Internal lengths are millimetres, angles radians.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Nm,
    Um,
    #[default]
    Mm,
    Cm,
    M,
    Km,
}

impl LengthUnit {
    /// Multiplier converting a value in this unit to millimetres
    pub fn factor(self) -> f64 {
        match self {
            Self::Nm => 1e-6,
            Self::Um => 1e-3,
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::M => 1e3,
            Self::Km => 1e6,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nm" => Ok(Self::Nm),
            "um" => Ok(Self::Um),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "m" => Ok(Self::M),
            "km" => Ok(Self::Km),
            other => Err(GeometryError::UnknownUnit { unit: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Rad,
    Deg,
    Mrad,
}

impl AngleUnit {
    /// Multiplier converting a value in this unit to radians
    pub fn factor(self) -> f64 {
        match self {
            Self::Rad => 1.0,
            Self::Deg => std::f64::consts::PI / 180.0,
            Self::Mrad => 1e-3,
        }
    }
}

impl FromStr for AngleUnit {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rad" => Ok(Self::Rad),
            "deg" | "degree" => Ok(Self::Deg),
            "mrad" => Ok(Self::Mrad),
            other => Err(GeometryError::UnknownUnit { unit: other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_factors() {
        assert_relative_eq!(LengthUnit::Cm.factor() * 2.5, 25.0);
        assert_relative_eq!(LengthUnit::M.factor(), 1000.0);
        assert_eq!(LengthUnit::default(), LengthUnit::Mm);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("cm".parse::<LengthUnit>().unwrap(), LengthUnit::Cm);
        assert_eq!("deg".parse::<AngleUnit>().unwrap(), AngleUnit::Deg);
        assert!(matches!(
            "furlong".parse::<LengthUnit>(),
            Err(GeometryError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_angle_factor() {
        assert_relative_eq!(AngleUnit::Deg.factor() * 90.0, std::f64::consts::FRAC_PI_2);
    }
}
