// Copyright @yucwang 2026

use std::fmt;

/// Errors raised while configuring or querying a medium.
///
/// Everything except `UnsupportedOperation` is detected while the medium is
/// being built, so a scene either gets a fully valid medium or none at all.
#[derive(Debug, Clone, PartialEq)]
pub enum MediumError {
    MissingVolume(&'static str),
    UnsupportedLookup {
        role: &'static str,
        expected: &'static str,
    },
    UnboundedDensity,
    UnresolvedStepSize,
    MissingOrientation,
    UnknownMethod(String),
    InvalidParameter(String),
    Volume(String),
    UnsupportedOperation(&'static str),
}

impl fmt::Display for MediumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediumError::MissingVolume(role) => write!(f, "no {} volume specified", role),
            MediumError::UnsupportedLookup { role, expected } => {
                write!(f, "the {} volume does not support {} lookups", role, expected)
            }
            MediumError::UnboundedDensity => {
                write!(f, "the density volume must report a bounding box")
            }
            MediumError::UnresolvedStepSize => write!(
                f,
                "unable to infer a suitable step size for deterministic integration, \
                 please specify one manually using the 'step_size' parameter"
            ),
            MediumError::MissingOrientation => write!(
                f,
                "cannot use an anisotropic phase function: no particle orientation volume was specified"
            ),
            MediumError::UnknownMethod(name) => write!(f, "unsupported integration method \"{}\"", name),
            MediumError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            MediumError::Volume(msg) => write!(f, "volume error: {}", msg),
            MediumError::UnsupportedOperation(op) => {
                write!(f, "{}: unsupported by the selected integration method", op)
            }
        }
    }
}

impl std::error::Error for MediumError {}
