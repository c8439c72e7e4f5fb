// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Subresource arithmetic.

Everything here is pure.  Bounds are deliberately not checked: an out-of-range mip level or
array slice produces an index the device will refuse to map, and that refusal is what callers see.

```
use gpu_readback::pixel_formats::Format;
use gpu_readback::resources::{
    ResourceDescription, SubresourceAddress, Texture2DDescription, element_count, subresource_index,
};

let texture = ResourceDescription::Texture2D(Texture2DDescription {
    mip_levels: 4,
    array_size: 2,
    ..Texture2DDescription::new(256, 256, Format::R8G8B8A8Unorm)
});
assert_eq!(element_count(&texture, 4, 0), 65536);
assert_eq!(element_count(&texture, 4, 2), 64 * 64);
assert_eq!(subresource_index(&texture, SubresourceAddress::new(1, 1)), 5);
```
*/

use crate::resources::ResourceDescription;

/// One (mip level, array slice) unit of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubresourceAddress {
    pub mip_level: u32,
    pub array_index: u32,
}

impl SubresourceAddress {
    pub const fn new(mip_level: u32, array_index: u32) -> Self {
        SubresourceAddress {
            mip_level,
            array_index,
        }
    }

    /// Mip `mip_level` of the first slice.
    pub const fn mip(mip_level: u32) -> Self {
        SubresourceAddress {
            mip_level,
            array_index: 0,
        }
    }
}

/// Extent of one mip level, in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipExtent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// `max(extent >> mip_level, 1)`.
///
/// Levels of 32 or more shift everything out and give 1.
pub const fn mip_extent(extent: u32, mip_level: u32) -> u32 {
    let shifted = match extent.checked_shr(mip_level) {
        Some(s) => s,
        None => 0,
    };
    if shifted == 0 { 1 } else { shifted }
}

/// Number of levels in a complete chain for the largest extent.
pub(crate) const fn full_mip_chain_length(largest_extent: u32) -> u32 {
    if largest_extent == 0 {
        1
    } else {
        32 - largest_extent.leading_zeros()
    }
}

/// Elements in the subresource at `mip_level`.
///
/// For buffers this is `byte_width / element_size`, truncating any remainder.  An
/// `element_size` of 0 yields 0 rather than dividing by zero.
pub fn element_count(description: &ResourceDescription, element_size: usize, mip_level: u32) -> usize {
    match description {
        ResourceDescription::Buffer(d) => {
            if element_size == 0 {
                0
            } else {
                d.byte_width as usize / element_size
            }
        }
        ResourceDescription::Texture1D(d) => mip_extent(d.width, mip_level) as usize,
        ResourceDescription::Texture2D(d) => {
            mip_extent(d.width, mip_level) as usize * mip_extent(d.height, mip_level) as usize
        }
        ResourceDescription::Texture3D(d) => {
            mip_extent(d.width, mip_level) as usize
                * mip_extent(d.height, mip_level) as usize
                * mip_extent(d.depth, mip_level) as usize
        }
    }
}

/// Linear index of `address` within the resource.
///
/// Buffers have one subresource, so this is always 0 for them.  Volumes have no array
/// dimension; their depth slices belong to one subresource, so the array index is ignored.
pub fn subresource_index(description: &ResourceDescription, address: SubresourceAddress) -> u32 {
    match description {
        ResourceDescription::Buffer(_) => 0,
        ResourceDescription::Texture3D(_) => address.mip_level,
        ResourceDescription::Texture1D(_) | ResourceDescription::Texture2D(_) => address
            .array_index
            .saturating_mul(description.mip_levels())
            .saturating_add(address.mip_level),
    }
}

/// Whether `address` names a subresource the resource actually has.
///
/// Buffers ignore the address entirely and volumes ignore the array index, matching
/// [`subresource_index`].
pub fn subresource_exists(description: &ResourceDescription, address: SubresourceAddress) -> bool {
    match description {
        ResourceDescription::Buffer(_) => true,
        ResourceDescription::Texture3D(_) => address.mip_level < description.mip_levels(),
        ResourceDescription::Texture1D(_) | ResourceDescription::Texture2D(_) => {
            address.mip_level < description.mip_levels() && address.array_index < description.array_size()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::Format;
    use crate::resources::{BufferDescription, Texture1DDescription, Texture2DDescription, Texture3DDescription};

    #[test]
    fn mip_halving_is_floored_at_one() {
        let w = 256;
        for k in 0..=8 {
            assert_eq!(mip_extent(w, k), w >> k);
        }
        for k in 9..40 {
            assert_eq!(mip_extent(w, k), 1, "level {k}");
        }
        assert_eq!(mip_extent(300, 2), 75);
        assert_eq!(mip_extent(0, 0), 1);
    }

    #[test]
    fn counts_per_shape() {
        let buffer = ResourceDescription::Buffer(BufferDescription::new(1024));
        assert_eq!(element_count(&buffer, 4, 0), 256);
        assert_eq!(element_count(&buffer, 4, 7), 256);
        assert_eq!(element_count(&buffer, 0, 0), 0);

        let line = ResourceDescription::Texture1D(Texture1DDescription::new(100, Format::R32Float));
        assert_eq!(element_count(&line, 4, 0), 100);
        assert_eq!(element_count(&line, 4, 3), 12);
        assert_eq!(element_count(&line, 4, 10), 1);

        let image = ResourceDescription::Texture2D(Texture2DDescription::new(256, 16, Format::R8G8B8A8Unorm));
        assert_eq!(element_count(&image, 4, 0), 256 * 16);
        assert_eq!(element_count(&image, 4, 5), 8);
        assert_eq!(element_count(&image, 4, 64), 1);

        let volume = ResourceDescription::Texture3D(Texture3DDescription::new(8, 4, 2, Format::R8Unorm));
        assert_eq!(element_count(&volume, 1, 0), 64);
        assert_eq!(element_count(&volume, 1, 1), 4 * 2);
        assert_eq!(element_count(&volume, 1, 2), 2);
    }

    // The buffer count truncates a remainder silently; 10 bytes of 4-byte elements is 2.
    #[test]
    fn buffer_remainder_is_truncated() {
        let buffer = ResourceDescription::Buffer(BufferDescription::new(10));
        assert_eq!(element_count(&buffer, 4, 0), 2);
    }

    #[test]
    fn subresource_indices() {
        let buffer = ResourceDescription::Buffer(BufferDescription::new(1024));
        assert_eq!(subresource_index(&buffer, SubresourceAddress::new(0, 0)), 0);
        assert_eq!(subresource_index(&buffer, SubresourceAddress::new(5, 9)), 0);

        let array = ResourceDescription::Texture2D(Texture2DDescription {
            mip_levels: 3,
            array_size: 4,
            ..Texture2DDescription::new(8, 8, Format::R8Unorm)
        });
        for array_index in 0..4 {
            for mip in 0..3 {
                assert_eq!(
                    subresource_index(&array, SubresourceAddress::new(mip, array_index)),
                    mip + array_index * 3
                );
            }
        }

        let line = ResourceDescription::Texture1D(Texture1DDescription {
            mip_levels: 2,
            array_size: 2,
            ..Texture1DDescription::new(8, Format::R8Unorm)
        });
        assert_eq!(subresource_index(&line, SubresourceAddress::new(1, 1)), 3);

        let volume = ResourceDescription::Texture3D(Texture3DDescription {
            mip_levels: 3,
            ..Texture3DDescription::new(8, 8, 8, Format::R8Unorm)
        });
        assert_eq!(subresource_index(&volume, SubresourceAddress::new(2, 5)), 2);
    }

    #[test]
    fn out_of_range_indices_stay_out_of_range() {
        let single = ResourceDescription::Texture2D(Texture2DDescription::new(8, 8, Format::R8Unorm));
        assert_eq!(subresource_index(&single, SubresourceAddress::mip(3)), 3);
        assert_eq!(
            subresource_index(&single, SubresourceAddress::new(u32::MAX, u32::MAX)),
            u32::MAX
        );
    }

    #[test]
    fn missing_mips_do_not_exist_on_arrays() {
        let array = ResourceDescription::Texture2D(Texture2DDescription {
            array_size: 4,
            ..Texture2DDescription::new(16, 16, Format::R8Unorm)
        });
        // Index 3 is slice 3, mip 0: a real subresource, but not mip 3 of slice 0.
        assert_eq!(subresource_index(&array, SubresourceAddress::mip(3)), 3);
        assert!(!subresource_exists(&array, SubresourceAddress::mip(3)));
        assert!(subresource_exists(&array, SubresourceAddress::new(0, 3)));
        assert!(!subresource_exists(&array, SubresourceAddress::new(0, 4)));

        let volume = ResourceDescription::Texture3D(Texture3DDescription::new(8, 8, 8, Format::R8Unorm));
        assert!(subresource_exists(&volume, SubresourceAddress::new(0, 5)));
        assert!(!subresource_exists(&volume, SubresourceAddress::mip(1)));

        let buffer = ResourceDescription::Buffer(BufferDescription::new(16));
        assert!(subresource_exists(&buffer, SubresourceAddress::new(7, 7)));
    }

    #[test]
    fn full_chain_lengths() {
        assert_eq!(full_mip_chain_length(1), 1);
        assert_eq!(full_mip_chain_length(2), 2);
        assert_eq!(full_mip_chain_length(255), 8);
        assert_eq!(full_mip_chain_length(256), 9);
    }
}
