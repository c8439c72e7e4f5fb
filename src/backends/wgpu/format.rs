// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Translation between [`Format`] and `wgpu::TextureFormat`.

use crate::pixel_formats::Format;
use ::wgpu::TextureFormat;

macro_rules! format_table {
    ($($ours:ident <=> $theirs:ident),* $(,)?) => {
        /// The wgpu format with the same layout, if there is one.
        pub(crate) fn to_wgpu(format: Format) -> Option<TextureFormat> {
            match format {
                $(Format::$ours => Some(TextureFormat::$theirs),)*
                _ => None,
            }
        }

        /// The matching [`Format`], or [`Format::Unknown`] when wgpu has a format this crate does not model.
        pub(crate) fn from_wgpu(format: TextureFormat) -> Format {
            match format {
                $(TextureFormat::$theirs => Format::$ours,)*
                _ => Format::Unknown,
            }
        }
    };
}

format_table! {
    R8Unorm <=> R8Unorm,
    R8Snorm <=> R8Snorm,
    R8Uint <=> R8Uint,
    R8Sint <=> R8Sint,
    R16Unorm <=> R16Unorm,
    R16Snorm <=> R16Snorm,
    R16Uint <=> R16Uint,
    R16Sint <=> R16Sint,
    R16Float <=> R16Float,
    R8G8Unorm <=> Rg8Unorm,
    R8G8Snorm <=> Rg8Snorm,
    R8G8Uint <=> Rg8Uint,
    R8G8Sint <=> Rg8Sint,
    R32Uint <=> R32Uint,
    R32Sint <=> R32Sint,
    R32Float <=> R32Float,
    R16G16Unorm <=> Rg16Unorm,
    R16G16Snorm <=> Rg16Snorm,
    R16G16Uint <=> Rg16Uint,
    R16G16Sint <=> Rg16Sint,
    R16G16Float <=> Rg16Float,
    R8G8B8A8Unorm <=> Rgba8Unorm,
    R8G8B8A8UnormSrgb <=> Rgba8UnormSrgb,
    R8G8B8A8Snorm <=> Rgba8Snorm,
    R8G8B8A8Uint <=> Rgba8Uint,
    R8G8B8A8Sint <=> Rgba8Sint,
    B8G8R8A8Unorm <=> Bgra8Unorm,
    B8G8R8A8UnormSrgb <=> Bgra8UnormSrgb,
    R10G10B10A2Unorm <=> Rgb10a2Unorm,
    R10G10B10A2Uint <=> Rgb10a2Uint,
    R32G32Uint <=> Rg32Uint,
    R32G32Sint <=> Rg32Sint,
    R32G32Float <=> Rg32Float,
    R16G16B16A16Unorm <=> Rgba16Unorm,
    R16G16B16A16Snorm <=> Rgba16Snorm,
    R16G16B16A16Uint <=> Rgba16Uint,
    R16G16B16A16Sint <=> Rgba16Sint,
    R16G16B16A16Float <=> Rgba16Float,
    R32G32B32A32Uint <=> Rgba32Uint,
    R32G32B32A32Sint <=> Rgba32Sint,
    R32G32B32A32Float <=> Rgba32Float,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::bits_per_pixel;

    #[test]
    fn widths_agree() {
        for raw in 0..=191 {
            let format = Format::from_raw(raw);
            if let Some(theirs) = to_wgpu(format) {
                assert_eq!(from_wgpu(theirs), format);
                let block = theirs.block_copy_size(None).expect("color formats copy whole blocks");
                assert_eq!(block * 8, bits_per_pixel(format), "{format:?}");
            }
        }
        assert_eq!(to_wgpu(Format::Bc1Unorm), None);
        assert_eq!(from_wgpu(TextureFormat::Depth24Plus), Format::Unknown);
    }
}
