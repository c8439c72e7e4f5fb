// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Synchronous readback of one subresource into host memory.

Each call allocates a staging duplicate of the source, copies the entire source into it,
maps the requested subresource, copies the bytes out and releases everything before returning.
Nothing is cached between calls.

```
use std::sync::Arc;
use gpu_readback::backends::soft::SoftDevice;
use gpu_readback::device::Device;
use gpu_readback::pixel_formats::{Format, Unorm4};
use gpu_readback::readback::ReadbackEngine;
use gpu_readback::resources::{SubresourceAddress, Texture2DDescription};

let device = SoftDevice::builder().build();
let context = device.immediate_context();
let texture = device
    .create_resource(&Texture2DDescription::new(4, 4, Format::R8G8B8A8Unorm).into())
    .unwrap();
let engine = ReadbackEngine::new(Arc::new(device), Arc::new(context));
let pixels: Vec<Unorm4> = engine.read(&texture, SubresourceAddress::default());
assert_eq!(pixels.len(), 16);
```
*/

use crate::device::{Context, Device, MapIntent, MappedSubresource, Resource, ResourceView};
use crate::error::{DeviceError, ReadbackError};
use crate::pixel_formats::bits_per_pixel;
use crate::resources::{
    Dimension, MipExtent, ResourceDescription, SubresourceAddress, element_count, subresource_exists,
    subresource_index,
};
use crate::staging::{StagingDescription, stage};
use bytemuck::Pod;
use std::ops::Deref;
use std::sync::Arc;

/// Everything a readback decides before it talks to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackPlan {
    pub dimension: Dimension,
    pub element_size: usize,
    pub element_count: usize,
    pub subresource: u32,
    pub extent: MipExtent,
    pub staging: StagingDescription,
}

impl ReadbackPlan {
    /// Validates a readback of `T` elements and works out its layout.
    ///
    /// `dimension` is what the resource reported and `description` is what it described.
    pub fn new<T: Pod>(
        dimension: Dimension,
        description: &ResourceDescription,
        address: SubresourceAddress,
    ) -> Result<ReadbackPlan, ReadbackError> {
        if dimension == Dimension::Unknown {
            return Err(ReadbackError::UnsupportedDimension(dimension));
        }
        if description.dimension() != dimension {
            return Err(ReadbackError::DimensionMismatch {
                reported: dimension,
                described: description.dimension(),
            });
        }
        let element_size = size_of::<T>();
        if element_size == 0 {
            return Err(ReadbackError::ZeroSizedElement);
        }
        if let Some(format) = description.format() {
            let format_bits = bits_per_pixel(format);
            if element_size * 8 != format_bits as usize {
                return Err(ReadbackError::ElementSizeMismatch {
                    format,
                    format_bits,
                    element_bits: element_size * 8,
                });
            }
        }
        Ok(ReadbackPlan {
            dimension,
            element_size,
            element_count: element_count(description, element_size, address.mip_level),
            subresource: subresource_index(description, address),
            extent: description.extent_at(address.mip_level),
            staging: StagingDescription::derive(description),
        })
    }

    /// Bytes the output occupies once packed.
    pub fn byte_len(&self) -> usize {
        self.element_count * self.element_size
    }

    /// Bytes in one packed row.  Buffers are a single row.
    fn row_bytes(&self) -> usize {
        match self.dimension {
            Dimension::Buffer | Dimension::Unknown => self.byte_len(),
            _ => self.extent.width as usize * self.element_size,
        }
    }

    fn rows(&self) -> usize {
        match self.dimension {
            Dimension::Texture2D | Dimension::Texture3D => self.extent.height as usize,
            _ => 1,
        }
    }

    fn slices(&self) -> usize {
        match self.dimension {
            Dimension::Texture3D => self.extent.depth as usize,
            _ => 1,
        }
    }
}

/// Holds a mapping and unmaps it when dropped.
struct MapGuard<'a, C: Context + 'a> {
    context: &'a C,
    resource: &'a C::Resource,
    subresource: u32,
    mapped: Option<MappedSubresource<C::Mapping<'a>>>, //option for drop!
}

impl<'a, C: Context + 'a> Deref for MapGuard<'a, C> {
    type Target = MappedSubresource<C::Mapping<'a>>;
    fn deref(&self) -> &Self::Target {
        self.mapped.as_ref().expect("mapping released before drop")
    }
}

impl<'a, C: Context + 'a> Drop for MapGuard<'a, C> {
    fn drop(&mut self) {
        // The mapping borrows the resource, so it goes before the unmap.
        drop(self.mapped.take());
        self.context.unmap(self.resource, self.subresource);
    }
}

/// Copies a mapped subresource into `out`, dropping any row or slice padding.
///
/// The layout is checked against the mapping before `out` is modified.
fn copy_mapped<T: Pod>(
    plan: &ReadbackPlan,
    mapped: &MappedSubresource<impl Deref<Target = [u8]>>,
    out: &mut Vec<T>,
) -> Result<(), ReadbackError> {
    let data: &[u8] = &mapped.data;
    let row_bytes = plan.row_bytes();
    let rows = plan.rows();
    let slices = plan.slices();

    if rows > 1 && mapped.row_pitch < row_bytes {
        return Err(ReadbackError::PitchTooSmall {
            subresource: plan.subresource,
            pitch: mapped.row_pitch,
            needed: row_bytes,
        });
    }
    let slice_bytes = mapped.row_pitch.saturating_mul(rows);
    if slices > 1 && mapped.depth_pitch < slice_bytes {
        return Err(ReadbackError::PitchTooSmall {
            subresource: plan.subresource,
            pitch: mapped.depth_pitch,
            needed: slice_bytes,
        });
    }
    let required = if rows == 1 && slices == 1 {
        row_bytes
    } else {
        (slices - 1)
            .saturating_mul(mapped.depth_pitch)
            .saturating_add((rows - 1).saturating_mul(mapped.row_pitch))
            .saturating_add(row_bytes)
    };
    if data.len() < required {
        return Err(ReadbackError::MappedRangeTooSmall {
            subresource: plan.subresource,
            required,
            available: data.len(),
        });
    }

    out.resize(plan.element_count, T::zeroed());
    let dst: &mut [u8] = bytemuck::cast_slice_mut(out.as_mut_slice());
    let tight = (rows == 1 || mapped.row_pitch == row_bytes)
        && (slices == 1 || mapped.depth_pitch == row_bytes * rows);
    if tight {
        dst.copy_from_slice(&data[..dst.len()]);
        return Ok(());
    }
    for (slice, dst_slice) in dst.chunks_exact_mut(row_bytes * rows).enumerate() {
        let slice_start = slice * mapped.depth_pitch;
        for (row, dst_row) in dst_slice.chunks_exact_mut(row_bytes).enumerate() {
            let start = slice_start + row * mapped.row_pitch;
            dst_row.copy_from_slice(&data[start..start + row_bytes]);
        }
    }
    Ok(())
}

/**
Reads subresources of resources created by `D` through the context `C`.

The engine holds no locks and no per-call state.  Calls on one engine may come from several
threads only if `C` tolerates that.
*/
#[derive(Debug)]
pub struct ReadbackEngine<D, C> {
    device: Arc<D>,
    context: Arc<C>,
}

impl<D, C> Clone for ReadbackEngine<D, C> {
    fn clone(&self) -> Self {
        ReadbackEngine {
            device: self.device.clone(),
            context: self.context.clone(),
        }
    }
}

impl<D, C> ReadbackEngine<D, C>
where
    D: Device,
    C: Context<Resource = D::Resource>,
{
    pub fn new(device: Arc<D>, context: Arc<C>) -> Self {
        ReadbackEngine { device, context }
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Validates a readback of `resource` without touching the device.
    pub fn plan<T: Pod>(
        &self,
        resource: &D::Resource,
        address: SubresourceAddress,
    ) -> Result<ReadbackPlan, ReadbackError> {
        ReadbackPlan::new::<T>(resource.dimension(), &resource.description(), address)
    }

    /**
    Reads one subresource of `resource` into `out`.

    On success `out` holds exactly the subresource's elements, densely packed.  On failure `out`
    is unchanged.
    */
    pub fn read_into<T: Pod>(
        &self,
        resource: &D::Resource,
        out: &mut Vec<T>,
        address: SubresourceAddress,
    ) -> Result<(), ReadbackError> {
        let description = resource.description();
        let plan = ReadbackPlan::new::<T>(resource.dimension(), &description, address)?;
        logwise::trace_sync!(
            "readback of {count} elements from subresource {subresource}",
            count = plan.element_count,
            subresource = plan.subresource
        );
        let interval = logwise::perfwarn_begin!("readback copy_resource and map");
        let (_, staging) = stage(self.device.as_ref(), &description, plan.dimension);
        let staging = staging.map_err(ReadbackError::Allocation)?;
        let context = self.context.as_ref();
        context.copy_resource(&staging, resource);
        // Past the last mip, the linear index of a slice lands on the next slice.
        if !subresource_exists(&description, address) {
            return Err(ReadbackError::Map {
                subresource: plan.subresource,
                source: DeviceError::InvalidArgument(format!(
                    "mip {mip} of slice {slice} is outside {mips} mips and {slices} slices",
                    mip = address.mip_level,
                    slice = address.array_index,
                    mips = description.mip_levels(),
                    slices = description.array_size()
                )),
            });
        }
        let mapped = context
            .map(&staging, plan.subresource, MapIntent::Read)
            .map_err(|source| ReadbackError::Map {
                subresource: plan.subresource,
                source,
            })?;
        let guard = MapGuard {
            context,
            resource: &staging,
            subresource: plan.subresource,
            mapped: Some(mapped),
        };
        let result = copy_mapped(&plan, &*guard, out);
        drop(guard);
        drop(interval);
        result
    }

    /// Reads one subresource of `resource`, returning an empty vector on failure.
    ///
    /// The failure is logged.  Use [`ReadbackEngine::read_into`] to observe it.
    pub fn read<T: Pod>(&self, resource: &D::Resource, address: SubresourceAddress) -> Vec<T> {
        let mut out = Vec::new();
        if let Err(e) = self.read_into(resource, &mut out, address) {
            logwise::warn_sync!("readback failed: {e}", e = logwise::privacy::LogIt(&e));
        }
        out
    }

    /// Like [`ReadbackEngine::read_into`], reading the resource behind `view`.
    pub fn read_view_into<T: Pod, V: ResourceView<Resource = D::Resource>>(
        &self,
        view: &V,
        out: &mut Vec<T>,
        address: SubresourceAddress,
    ) -> Result<(), ReadbackError> {
        let resource = view.resource();
        self.read_into(&resource, out, address)
    }

    /// Like [`ReadbackEngine::read`], reading the resource behind `view`.
    pub fn read_view<T: Pod, V: ResourceView<Resource = D::Resource>>(
        &self,
        view: &V,
        address: SubresourceAddress,
    ) -> Vec<T> {
        let resource = view.resource();
        self.read(&resource, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::{Format, Unorm4, f16};
    use crate::resources::{BufferDescription, Texture1DDescription, Texture2DDescription, Texture3DDescription};

    #[test]
    fn plan_rejects_unknown_dimension() {
        let d = ResourceDescription::Buffer(BufferDescription::new(16));
        assert_eq!(
            ReadbackPlan::new::<u32>(Dimension::Unknown, &d, SubresourceAddress::default()),
            Err(ReadbackError::UnsupportedDimension(Dimension::Unknown))
        );
    }

    #[test]
    fn plan_rejects_disagreeing_shape() {
        let d = ResourceDescription::Buffer(BufferDescription::new(16));
        assert_eq!(
            ReadbackPlan::new::<u32>(Dimension::Texture2D, &d, SubresourceAddress::default()),
            Err(ReadbackError::DimensionMismatch {
                reported: Dimension::Texture2D,
                described: Dimension::Buffer
            })
        );
    }

    #[test]
    fn plan_checks_element_width() {
        let d = ResourceDescription::Texture2D(Texture2DDescription::new(8, 8, Format::R8G8B8A8Unorm));
        let err = ReadbackPlan::new::<u16>(Dimension::Texture2D, &d, SubresourceAddress::default()).unwrap_err();
        assert_eq!(
            err,
            ReadbackError::ElementSizeMismatch {
                format: Format::R8G8B8A8Unorm,
                format_bits: 32,
                element_bits: 16
            }
        );
        assert!(ReadbackPlan::new::<Unorm4>(Dimension::Texture2D, &d, SubresourceAddress::default()).is_ok());

        let half = ResourceDescription::Texture1D(Texture1DDescription::new(8, Format::R16Float));
        assert!(ReadbackPlan::new::<f16>(Dimension::Texture1D, &half, SubresourceAddress::default()).is_ok());

        // Block compressed formats have no per-element width that matches any element.
        let bc = ResourceDescription::Texture2D(Texture2DDescription::new(8, 8, Format::Bc1Unorm));
        assert!(ReadbackPlan::new::<u8>(Dimension::Texture2D, &bc, SubresourceAddress::default()).is_err());
    }

    #[test]
    fn plan_rejects_zero_sized_elements() {
        let d = ResourceDescription::Buffer(BufferDescription::new(16));
        assert_eq!(
            ReadbackPlan::new::<()>(Dimension::Buffer, &d, SubresourceAddress::default()),
            Err(ReadbackError::ZeroSizedElement)
        );
    }

    #[test]
    fn plan_layout() {
        let d = ResourceDescription::Texture3D(Texture3DDescription {
            mip_levels: 3,
            ..Texture3DDescription::new(16, 8, 4, Format::R32Float)
        });
        let plan = ReadbackPlan::new::<f32>(Dimension::Texture3D, &d, SubresourceAddress::mip(1)).unwrap();
        assert_eq!(plan.element_count, 8 * 4 * 2);
        assert_eq!(plan.subresource, 1);
        assert_eq!(plan.byte_len(), 8 * 4 * 2 * 4);
        assert_eq!(plan.row_bytes(), 32);
        assert_eq!(plan.rows(), 4);
        assert_eq!(plan.slices(), 2);
        assert_eq!(plan.staging, StagingDescription::derive(&d));
    }

    fn mapped(data: Vec<u8>, row_pitch: usize, depth_pitch: usize) -> MappedSubresource<Vec<u8>> {
        MappedSubresource {
            data,
            row_pitch,
            depth_pitch,
        }
    }

    #[test]
    fn copy_strips_row_padding() {
        let d = ResourceDescription::Texture2D(Texture2DDescription::new(2, 3, Format::R8Uint));
        let plan = ReadbackPlan::new::<u8>(Dimension::Texture2D, &d, SubresourceAddress::default()).unwrap();
        // rows are 4 bytes apart, 2 of them used
        let data = vec![1, 2, 0xAA, 0xAA, 3, 4, 0xAA, 0xAA, 5, 6];
        let mut out: Vec<u8> = Vec::new();
        copy_mapped(&plan, &mapped(data, 4, 12), &mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn copy_strips_slice_padding() {
        let d = ResourceDescription::Texture3D(Texture3DDescription::new(1, 2, 2, Format::R8Uint));
        let plan = ReadbackPlan::new::<u8>(Dimension::Texture3D, &d, SubresourceAddress::default()).unwrap();
        let data = vec![1, 0, 2, 0, 0xAA, 0xAA, 3, 0, 4];
        let mut out = vec![9u8; 7];
        copy_mapped(&plan, &mapped(data, 2, 6), &mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn copy_rejects_short_mapping_without_touching_output() {
        let d = ResourceDescription::Texture2D(Texture2DDescription::new(4, 4, Format::R8Uint));
        let plan = ReadbackPlan::new::<u8>(Dimension::Texture2D, &d, SubresourceAddress::default()).unwrap();
        let mut out = vec![7u8; 3];
        let err = copy_mapped(&plan, &mapped(vec![0; 15], 4, 16), &mut out).unwrap_err();
        assert_eq!(
            err,
            ReadbackError::MappedRangeTooSmall {
                subresource: 0,
                required: 16,
                available: 15
            }
        );
        assert_eq!(out, vec![7u8; 3]);

        let err = copy_mapped(&plan, &mapped(vec![0; 64], 3, 16), &mut out).unwrap_err();
        assert!(matches!(err, ReadbackError::PitchTooSmall { pitch: 3, needed: 4, .. }));
        assert_eq!(out, vec![7u8; 3]);
    }

    #[test]
    fn copy_buffer_ignores_pitches() {
        let d = ResourceDescription::Buffer(BufferDescription::new(10));
        let plan = ReadbackPlan::new::<u32>(Dimension::Buffer, &d, SubresourceAddress::default()).unwrap();
        let data: Vec<u8> = (0..10).collect();
        let mut out: Vec<u32> = Vec::new();
        copy_mapped(&plan, &mapped(data, 0, 0), &mut out).unwrap();
        assert_eq!(out, vec![u32::from_ne_bytes([0, 1, 2, 3]), u32::from_ne_bytes([4, 5, 6, 7])]);
    }
}
