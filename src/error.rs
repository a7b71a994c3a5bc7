// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! Error types for solid evaluation and placement traversal

use thiserror::Error;

/// Errors raised while resolving, evaluating or placing geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A referenced solid, volume or define is absent from the registry.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A boolean operation produced a mesh with no polygons.
    #[error("null mesh produced by boolean solid {solid}")]
    NullMesh { solid: String },

    /// A solid is structurally malformed (e.g. operand/transform count mismatch).
    #[error("configuration error in {solid}: {details}")]
    Configuration { solid: String, details: String },

    /// Solid operands or volume daughters reference themselves.
    #[error("cyclic reference: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    /// Shape parameters cannot describe a valid solid.
    #[error("invalid parameter for {solid}: {details}")]
    InvalidParameter { solid: String, details: String },

    #[error("unknown unit: {unit}")]
    UnknownUnit { unit: String },
}

impl GeometryError {
    pub fn solid_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "solid",
            name: name.into(),
        }
    }

    pub fn volume_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "logical volume",
            name: name.into(),
        }
    }

    pub fn define_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "define",
            name: name.into(),
        }
    }

    /// Name of the solid this error refers to, if any
    pub fn solid(&self) -> Option<&str> {
        match self {
            Self::NullMesh { solid }
            | Self::Configuration { solid, .. }
            | Self::InvalidParameter { solid, .. } => Some(solid),
            Self::NotFound { kind: "solid", name } => Some(name),
            _ => None,
        }
    }
}

/// Result alias for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GeometryError::solid_not_found("boxA");
        assert_eq!(err.to_string(), "solid not found: boxA");

        let err = GeometryError::CyclicReference {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic reference: a -> b -> a");
    }

    #[test]
    fn test_solid_accessor() {
        let err = GeometryError::NullMesh { solid: "sub".into() };
        assert_eq!(err.solid(), Some("sub"));
        assert_eq!(GeometryError::volume_not_found("lv").solid(), None);
    }
}
