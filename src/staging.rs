// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Staging resources.

A staging resource is a host-readable duplicate of a live resource.  It has the same extents,
format, mips and slices, but it is never bound to the pipeline and never generates mips.
*/

use crate::device::Device;
use crate::error::DeviceError;
use crate::resources::{BindFlags, CpuAccessFlags, Dimension, MiscFlags, ResourceDescription, Usage};

/// A description rewritten for host reads.
///
/// Only obtainable through [`StagingDescription::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingDescription(ResourceDescription);

impl StagingDescription {
    /// Derives the staging counterpart of a live description.
    ///
    /// CPU access becomes read, usage becomes [`Usage::Staging`], every bind flag is cleared
    /// and [`MiscFlags::GENERATE_MIPS`] is removed.  Everything else is kept.
    pub fn derive(live: &ResourceDescription) -> StagingDescription {
        let mut description = *live;
        let access = description.access_mut();
        *access.cpu_access = CpuAccessFlags::READ;
        *access.usage = Usage::Staging;
        *access.bind_flags = BindFlags::empty();
        access.misc_flags.remove(MiscFlags::GENERATE_MIPS);
        StagingDescription(description)
    }

    pub fn description(&self) -> &ResourceDescription {
        &self.0
    }
}

impl AsRef<ResourceDescription> for StagingDescription {
    fn as_ref(&self) -> &ResourceDescription {
        &self.0
    }
}

/// Derives the staging description for `live` and asks `device` to allocate it.
///
/// `dimension` is the shape the resource reported.  If it disagrees with `live`, the device is
/// not called.  Device failures are returned unchanged.
pub fn stage<D: Device>(
    device: &D,
    live: &ResourceDescription,
    dimension: Dimension,
) -> (StagingDescription, Result<D::Resource, DeviceError>) {
    let staging = StagingDescription::derive(live);
    if staging.description().dimension() != dimension {
        let err = DeviceError::InvalidArgument(format!(
            "{dimension:?} resource described as {:?}",
            staging.description().dimension()
        ));
        return (staging, Err(err));
    }
    let created = device.create_resource(staging.description());
    (staging, created)
}
