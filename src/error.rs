// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Errors reported by readback and by the devices it drives.

use crate::pixel_formats::Format;
use crate::resources::Dimension;

/// An error code returned by a device or context.
///
/// Readback passes these through unchanged inside [`ReadbackError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("subresource is already mapped")]
    AlreadyMapped,
    #[error("{0}")]
    Backend(String),
}

/// Broad category of a [`ReadbackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was rejected before the device was asked for anything.
    Validation,
    /// The device refused to create the staging resource.
    Allocation,
    /// The staging resource could not be mapped, or the mapping could not hold the subresource.
    Mapping,
}

/// Why a readback failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadbackError {
    #[error("resources of dimension {0:?} cannot be read back")]
    UnsupportedDimension(Dimension),
    #[error("resource reports dimension {reported:?} but describes itself as {described:?}")]
    DimensionMismatch {
        reported: Dimension,
        described: Dimension,
    },
    #[error("element type is {element_bits} bits wide but {format:?} is {format_bits} bits per pixel")]
    ElementSizeMismatch {
        format: Format,
        format_bits: u32,
        element_bits: usize,
    },
    #[error("zero-sized element types cannot be read back")]
    ZeroSizedElement,
    #[error("staging allocation failed")]
    Allocation(#[source] DeviceError),
    #[error("mapping subresource {subresource} failed")]
    Map {
        subresource: u32,
        #[source]
        source: DeviceError,
    },
    #[error("mapped subresource {subresource} holds {available} bytes but {required} are needed")]
    MappedRangeTooSmall {
        subresource: u32,
        required: usize,
        available: usize,
    },
    #[error("mapped subresource {subresource} has pitch {pitch} but a row or slice needs {needed} bytes")]
    PitchTooSmall {
        subresource: u32,
        pitch: usize,
        needed: usize,
    },
}

impl ReadbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadbackError::UnsupportedDimension(_)
            | ReadbackError::DimensionMismatch { .. }
            | ReadbackError::ElementSizeMismatch { .. }
            | ReadbackError::ZeroSizedElement => ErrorKind::Validation,
            ReadbackError::Allocation(_) => ErrorKind::Allocation,
            ReadbackError::Map { .. }
            | ReadbackError::MappedRangeTooSmall { .. }
            | ReadbackError::PitchTooSmall { .. } => ErrorKind::Mapping,
        }
    }

    /// The device error underneath, when the failure came from the device.
    pub fn device_error(&self) -> Option<&DeviceError> {
        match self {
            ReadbackError::Allocation(e) => Some(e),
            ReadbackError::Map { source, .. } => Some(source),
            _ => None,
        }
    }
}
