// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Contracts readback needs from a graphics device.

Readback never owns a device.  It talks to three collaborators:

- a [`Device`], used only to allocate the staging resource,
- a [`Context`], used only to copy, map and unmap,
- the [`Resource`] (or [`ResourceView`]) being read, used only for introspection.

Implementations live in [`crate::backends`].

# Threading

Immediate-mode contexts are generally not safe to drive from several threads at once.
Nothing here adds locking; callers sharing one context across threads must serialize access
themselves.
*/

use crate::error::DeviceError;
use crate::resources::{Dimension, ResourceDescription};
use std::ops::Deref;

/// A GPU resource that can describe itself.
pub trait Resource {
    /// The shape the resource reports.  May be [`Dimension::Unknown`].
    fn dimension(&self) -> Dimension;
    /// The live description, reflecting what was actually allocated.
    fn description(&self) -> ResourceDescription;
}

/// A view bound to a resource for some pipeline usage.
pub trait ResourceView {
    type Resource: Resource;
    /// The resource backing this view.
    fn resource(&self) -> Self::Resource;
}

/// Allocates resources.
pub trait Device {
    type Resource: Resource;
    /// Creates an uninitialized resource matching `description`.
    fn create_resource(&self, description: &ResourceDescription) -> Result<Self::Resource, DeviceError>;
}

/// What the host intends to do with a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapIntent {
    Read,
    Write,
    ReadWrite,
}

/// Host-visible bytes of one mapped subresource.
///
/// Rows of a texture start `row_pitch` bytes apart and depth slices `depth_pitch` bytes apart.
/// Both may exceed the tightly packed sizes.
#[derive(Debug)]
pub struct MappedSubresource<M> {
    pub data: M,
    pub row_pitch: usize,
    pub depth_pitch: usize,
}

/// Issues copies and maps resources for the host.
pub trait Context {
    type Resource: Resource;
    /// Host-visible bytes, borrowed from the context for the life of the mapping.
    type Mapping<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    /// Copies every subresource of `source` into `destination`.
    ///
    /// Completes before returning.  Invalid copies are reported by the backend, not here.
    fn copy_resource(&self, destination: &Self::Resource, source: &Self::Resource);

    /// Maps one subresource.  Must be paired with [`Context::unmap`] once the mapping is dropped.
    fn map<'a>(
        &'a self,
        resource: &'a Self::Resource,
        subresource: u32,
        intent: MapIntent,
    ) -> Result<MappedSubresource<Self::Mapping<'a>>, DeviceError>;

    fn unmap(&self, resource: &Self::Resource, subresource: u32);
}
