// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel and element formats for readback.
//!
//! This module provides two things:
//!
//! - [`Format`], the native format enumerant a texture is allocated with, together with
//!   [`bits_per_pixel`], the static width table the readback engine validates element
//!   types against.
//! - Plain-old-data pixel types ([`Float4`], [`Rgba16Pixel`], the [`colors`] rows, ...)
//!   that can be used as the element type of a readback.
//!
//! # Element types
//!
//! Any [`bytemuck::Pod`] type can be read back.  For textures, the type must have exactly
//! the width of the texture's format:
//!
//! ```
//! use gpu_readback::pixel_formats::{bits_per_pixel, Format, Float4};
//!
//! assert_eq!(bits_per_pixel(Format::R32G32B32A32Float), 128);
//! assert_eq!(std::mem::size_of::<Float4>() * 8, 128);
//! ```
//!
//! # Unknown formats
//!
//! [`bits_per_pixel`] returns 0 for anything the table does not cover.  Callers use the 0 to
//! detect unsupported formats; no element type has a width of 0, so such a texture can never
//! pass validation.

pub mod colors;

use bytemuck::{Pod, Zeroable};

pub use colors::{Unorm1, Unorm2, Unorm3, Unorm4};
pub use half::f16;

/*
The enumerant values match the DXGI numbering so that formats coming from a native API
can be carried through `from_raw` without a translation table.
 */
macro_rules! formats {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// A native pixel/element format.
        ///
        /// Values mirror the DXGI enumerants; use [`Format::from_raw`] to convert a raw value.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(u32)]
        #[non_exhaustive]
        pub enum Format {
            #[default]
            Unknown = 0,
            $($(#[$meta])* $name = $value,)*
        }

        impl Format {
            /// Converts a raw enumerant.  Values this crate does not know become [`Format::Unknown`].
            pub const fn from_raw(value: u32) -> Format {
                match value {
                    $($value => Format::$name,)*
                    _ => Format::Unknown,
                }
            }
        }
    };
}

formats! {
    R32G32B32A32Typeless = 1,
    R32G32B32A32Float = 2,
    R32G32B32A32Uint = 3,
    R32G32B32A32Sint = 4,
    R32G32B32Typeless = 5,
    R32G32B32Float = 6,
    R32G32B32Uint = 7,
    R32G32B32Sint = 8,
    R16G16B16A16Typeless = 9,
    R16G16B16A16Float = 10,
    R16G16B16A16Unorm = 11,
    R16G16B16A16Uint = 12,
    R16G16B16A16Snorm = 13,
    R16G16B16A16Sint = 14,
    R32G32Typeless = 15,
    R32G32Float = 16,
    R32G32Uint = 17,
    R32G32Sint = 18,
    R32G8X24Typeless = 19,
    D32FloatS8X24Uint = 20,
    R32FloatX8X24Typeless = 21,
    X32TypelessG8X24Uint = 22,
    R10G10B10A2Typeless = 23,
    R10G10B10A2Unorm = 24,
    R10G10B10A2Uint = 25,
    R11G11B10Float = 26,
    R8G8B8A8Typeless = 27,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R8G8B8A8Uint = 30,
    R8G8B8A8Snorm = 31,
    R8G8B8A8Sint = 32,
    R16G16Typeless = 33,
    R16G16Float = 34,
    R16G16Unorm = 35,
    R16G16Uint = 36,
    R16G16Snorm = 37,
    R16G16Sint = 38,
    R32Typeless = 39,
    D32Float = 40,
    R32Float = 41,
    R32Uint = 42,
    R32Sint = 43,
    R24G8Typeless = 44,
    D24UnormS8Uint = 45,
    R24UnormX8Typeless = 46,
    X24TypelessG8Uint = 47,
    R8G8Typeless = 48,
    R8G8Unorm = 49,
    R8G8Uint = 50,
    R8G8Snorm = 51,
    R8G8Sint = 52,
    R16Typeless = 53,
    R16Float = 54,
    D16Unorm = 55,
    R16Unorm = 56,
    R16Uint = 57,
    R16Snorm = 58,
    R16Sint = 59,
    R8Typeless = 60,
    R8Unorm = 61,
    R8Uint = 62,
    R8Snorm = 63,
    R8Sint = 64,
    A8Unorm = 65,
    R1Unorm = 66,
    R9G9B9E5SharedExp = 67,
    R8G8B8G8Unorm = 68,
    G8R8G8B8Unorm = 69,
    Bc1Typeless = 70,
    Bc1Unorm = 71,
    Bc1UnormSrgb = 72,
    Bc2Typeless = 73,
    Bc2Unorm = 74,
    Bc2UnormSrgb = 75,
    Bc3Typeless = 76,
    Bc3Unorm = 77,
    Bc3UnormSrgb = 78,
    Bc4Typeless = 79,
    Bc4Unorm = 80,
    Bc4Snorm = 81,
    Bc5Typeless = 82,
    Bc5Unorm = 83,
    Bc5Snorm = 84,
    B5G6R5Unorm = 85,
    B5G5R5A1Unorm = 86,
    B8G8R8A8Unorm = 87,
    B8G8R8X8Unorm = 88,
    R10G10B10XrBiasA2Unorm = 89,
    B8G8R8A8Typeless = 90,
    B8G8R8A8UnormSrgb = 91,
    B8G8R8X8Typeless = 92,
    B8G8R8X8UnormSrgb = 93,
    Bc6hTypeless = 94,
    Bc6hUf16 = 95,
    Bc6hSf16 = 96,
    Bc7Typeless = 97,
    Bc7Unorm = 98,
    Bc7UnormSrgb = 99,
    Ayuv = 100,
    Y410 = 101,
    Y416 = 102,
    Nv12 = 103,
    P010 = 104,
    P016 = 105,
    /// `DXGI_FORMAT_420_OPAQUE`
    Opaque420 = 106,
    Yuy2 = 107,
    Y210 = 108,
    Y216 = 109,
    Nv11 = 110,
    Ai44 = 111,
    Ia44 = 112,
    P8 = 113,
    A8P8 = 114,
    B4G4R4A4Unorm = 115,
    P208 = 130,
    V208 = 131,
    V408 = 132,
    SamplerFeedbackMinMipOpaque = 189,
    SamplerFeedbackMipRegionUsedOpaque = 190,
    A4B4G4R4Unorm = 191,
}

impl Format {
    /// The raw enumerant value.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Whether this is one of the 4x4 block-compressed families (BC1 through BC7).
    pub const fn is_block_compressed(self) -> bool {
        matches!(
            self,
            Format::Bc1Typeless
                | Format::Bc1Unorm
                | Format::Bc1UnormSrgb
                | Format::Bc2Typeless
                | Format::Bc2Unorm
                | Format::Bc2UnormSrgb
                | Format::Bc3Typeless
                | Format::Bc3Unorm
                | Format::Bc3UnormSrgb
                | Format::Bc4Typeless
                | Format::Bc4Unorm
                | Format::Bc4Snorm
                | Format::Bc5Typeless
                | Format::Bc5Unorm
                | Format::Bc5Snorm
                | Format::Bc6hTypeless
                | Format::Bc6hUf16
                | Format::Bc6hSf16
                | Format::Bc7Typeless
                | Format::Bc7Unorm
                | Format::Bc7UnormSrgb
        )
    }

    /// Whether this is a planar video format, where one "pixel" is spread over several planes.
    pub const fn is_planar(self) -> bool {
        matches!(
            self,
            Format::Nv12
                | Format::P010
                | Format::P016
                | Format::Opaque420
                | Format::Nv11
                | Format::P208
                | Format::V208
                | Format::V408
        )
    }

    /// Bytes occupied by one element, when one element is a whole number of bytes laid out linearly.
    ///
    /// Returns `None` for unknown, sub-byte, block-compressed and planar formats.
    pub const fn bytes_per_element(self) -> Option<u32> {
        if self.is_block_compressed() || self.is_planar() {
            return None;
        }
        let bits = bits_per_pixel(self);
        if bits == 0 || bits % 8 != 0 {
            None
        } else {
            Some(bits / 8)
        }
    }
}

/// Number of bits one pixel/element of `format` occupies.
///
/// Returns 0 for [`Format::Unknown`] and for any format the table does not model.
/// For block-compressed formats this is the average width per texel of the block.
pub const fn bits_per_pixel(format: Format) -> u32 {
    match format {
        Format::R32G32B32A32Typeless
        | Format::R32G32B32A32Float
        | Format::R32G32B32A32Uint
        | Format::R32G32B32A32Sint => 128,

        Format::R32G32B32Typeless
        | Format::R32G32B32Float
        | Format::R32G32B32Uint
        | Format::R32G32B32Sint => 96,

        Format::R16G16B16A16Typeless
        | Format::R16G16B16A16Float
        | Format::R16G16B16A16Unorm
        | Format::R16G16B16A16Uint
        | Format::R16G16B16A16Snorm
        | Format::R16G16B16A16Sint
        | Format::R32G32Typeless
        | Format::R32G32Float
        | Format::R32G32Uint
        | Format::R32G32Sint
        | Format::R32G8X24Typeless
        | Format::D32FloatS8X24Uint
        | Format::R32FloatX8X24Typeless
        | Format::X32TypelessG8X24Uint
        | Format::Y416
        | Format::Y210
        | Format::Y216 => 64,

        Format::R10G10B10A2Typeless
        | Format::R10G10B10A2Unorm
        | Format::R10G10B10A2Uint
        | Format::R11G11B10Float
        | Format::R8G8B8A8Typeless
        | Format::R8G8B8A8Unorm
        | Format::R8G8B8A8UnormSrgb
        | Format::R8G8B8A8Uint
        | Format::R8G8B8A8Snorm
        | Format::R8G8B8A8Sint
        | Format::R16G16Typeless
        | Format::R16G16Float
        | Format::R16G16Unorm
        | Format::R16G16Uint
        | Format::R16G16Snorm
        | Format::R16G16Sint
        | Format::R32Typeless
        | Format::D32Float
        | Format::R32Float
        | Format::R32Uint
        | Format::R32Sint
        | Format::R24G8Typeless
        | Format::D24UnormS8Uint
        | Format::R24UnormX8Typeless
        | Format::X24TypelessG8Uint
        | Format::R9G9B9E5SharedExp
        | Format::R8G8B8G8Unorm
        | Format::G8R8G8B8Unorm
        | Format::B8G8R8A8Unorm
        | Format::B8G8R8X8Unorm
        | Format::R10G10B10XrBiasA2Unorm
        | Format::B8G8R8A8Typeless
        | Format::B8G8R8A8UnormSrgb
        | Format::B8G8R8X8Typeless
        | Format::B8G8R8X8UnormSrgb
        | Format::Ayuv
        | Format::Y410
        | Format::Yuy2 => 32,

        Format::P010 | Format::P016 => 24,

        Format::R8G8Typeless
        | Format::R8G8Unorm
        | Format::R8G8Uint
        | Format::R8G8Snorm
        | Format::R8G8Sint
        | Format::R16Typeless
        | Format::R16Float
        | Format::D16Unorm
        | Format::R16Unorm
        | Format::R16Uint
        | Format::R16Snorm
        | Format::R16Sint
        | Format::B5G6R5Unorm
        | Format::B5G5R5A1Unorm
        | Format::A8P8
        | Format::B4G4R4A4Unorm => 16,

        Format::Nv12 | Format::Opaque420 | Format::Nv11 => 12,

        Format::R8Typeless
        | Format::R8Unorm
        | Format::R8Uint
        | Format::R8Snorm
        | Format::R8Sint
        | Format::A8Unorm
        | Format::Ai44
        | Format::Ia44
        | Format::P8 => 8,

        Format::R1Unorm => 1,

        Format::Bc1Typeless
        | Format::Bc1Unorm
        | Format::Bc1UnormSrgb
        | Format::Bc4Typeless
        | Format::Bc4Unorm
        | Format::Bc4Snorm => 4,

        Format::Bc2Typeless
        | Format::Bc2Unorm
        | Format::Bc2UnormSrgb
        | Format::Bc3Typeless
        | Format::Bc3Unorm
        | Format::Bc3UnormSrgb
        | Format::Bc5Typeless
        | Format::Bc5Unorm
        | Format::Bc5Snorm
        | Format::Bc6hTypeless
        | Format::Bc6hUf16
        | Format::Bc6hSf16
        | Format::Bc7Typeless
        | Format::Bc7Unorm
        | Format::Bc7UnormSrgb => 8,

        _ => 0,
    }
}

/// Two-channel 32-bit floating point pixel, matching [`Format::R32G32Float`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Float2 {
    pub r: f32,
    pub g: f32,
}

/// Three-channel 32-bit floating point pixel, matching [`Format::R32G32B32Float`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Float3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Four-channel floating point color.
///
/// This is the pixel type for [`Format::R32G32B32A32Float`].  Values are linear.
///
/// ```
/// use gpu_readback::pixel_formats::Float4;
///
/// let linear_red = Float4 { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
/// assert_eq!(std::mem::size_of_val(&linear_red), 16);
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Float4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Pixel type for [`Format::R16G16B16A16Unorm`].
///
/// Values range from 0-65535.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba16Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Rgba16Pixel {
    /// Normalize each channel to 0.0-1.0.
    pub fn as_float4(&self) -> Float4 {
        Float4 {
            r: self.r as f32 / 65535.0,
            g: self.g as f32 / 65535.0,
            b: self.b as f32 / 65535.0,
            a: self.a as f32 / 65535.0,
        }
    }
}

/// Pixel type for [`Format::R16G16B16A16Float`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Half4 {
    pub r: f16,
    pub g: f16,
    pub b: f16,
    pub a: f16,
}

impl From<Half4> for Float4 {
    fn from(h: Half4) -> Self {
        Float4 {
            r: h.r.to_f32(),
            g: h.g.to_f32(),
            b: h.b.to_f32(),
            a: h.a.to_f32(),
        }
    }
}

/// Pixel type for the BGRA 8-bit formats such as [`Format::B8G8R8A8Unorm`].
///
/// Channel order is the in-memory order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Bgra8Pixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl From<Bgra8Pixel> for Unorm4 {
    fn from(p: Bgra8Pixel) -> Self {
        Unorm4 {
            r: p.r,
            g: p.g,
            b: p.b,
            a: p.a,
        }
    }
}
