// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Color rows: 8-bit normalized channel tuples.

These match the 8-bit UNORM formats ([`super::Format::R8Unorm`], [`super::Format::R8G8Unorm`],
[`super::Format::R8G8B8A8Unorm`]) and can be used directly as readback element types.
Each exposes `as_floatN` conversions that divide every channel by 255.

```
use gpu_readback::pixel_formats::Unorm4;

let texel = Unorm4::new(255, 0, 51, 255);
let f = texel.as_float4();
assert_eq!(f.r, 1.0);
assert_eq!(f.b, 0.2);
```
*/
use super::{Float2, Float3, Float4};
use bytemuck::{Pod, Zeroable};

#[inline]
fn normalize(channel: u8) -> f32 {
    channel as f32 / 255.0
}

/// One 8-bit channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Unorm1 {
    pub r: u8,
}

impl Unorm1 {
    pub const fn new(r: u8) -> Self {
        Unorm1 { r }
    }
    pub fn as_float1(&self) -> f32 {
        normalize(self.r)
    }
}

/// Two 8-bit channels.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Unorm2 {
    pub r: u8,
    pub g: u8,
}

impl Unorm2 {
    pub const fn new(r: u8, g: u8) -> Self {
        Unorm2 { r, g }
    }
    pub fn as_float1(&self) -> f32 {
        normalize(self.r)
    }
    pub fn as_float2(&self) -> Float2 {
        Float2 {
            r: normalize(self.r),
            g: normalize(self.g),
        }
    }
}

/// Three 8-bit channels.
///
/// There is no 24-bit texture format, so this is mostly useful for buffer reads.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Unorm3 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Unorm3 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Unorm3 { r, g, b }
    }
    pub fn as_float1(&self) -> f32 {
        normalize(self.r)
    }
    pub fn as_float2(&self) -> Float2 {
        Float2 {
            r: normalize(self.r),
            g: normalize(self.g),
        }
    }
    pub fn as_float3(&self) -> Float3 {
        Float3 {
            r: normalize(self.r),
            g: normalize(self.g),
            b: normalize(self.b),
        }
    }
}

/// C-compatible RGBA pixel with 8-bit normalized unsigned values.
///
/// This is the pixel type for [`super::Format::R8G8B8A8Unorm`] and its sRGB sibling.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Unorm4 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Unorm4 { r, g, b, a }
    }
    pub fn as_float1(&self) -> f32 {
        normalize(self.r)
    }
    pub fn as_float2(&self) -> Float2 {
        Float2 {
            r: normalize(self.r),
            g: normalize(self.g),
        }
    }
    pub fn as_float3(&self) -> Float3 {
        Float3 {
            r: normalize(self.r),
            g: normalize(self.g),
            b: normalize(self.b),
        }
    }
    pub fn as_float4(&self) -> Float4 {
        Float4 {
            r: normalize(self.r),
            g: normalize(self.g),
            b: normalize(self.b),
            a: normalize(self.a),
        }
    }

    /// Convert from normalized float values (0.0-1.0) to 8-bit values (0-255).
    ///
    /// Values are clamped to the valid range and rounded to nearest integer.
    pub fn from_floats(float4: Float4) -> Self {
        Unorm4 {
            r: (float4.r * 255.0).round().clamp(0.0, 255.0) as u8,
            g: (float4.g * 255.0).round().clamp(0.0, 255.0) as u8,
            b: (float4.b * 255.0).round().clamp(0.0, 255.0) as u8,
            a: (float4.a * 255.0).round().clamp(0.0, 255.0) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::{Format, bits_per_pixel};

    #[test]
    fn sizes_match_unorm_formats() {
        assert_eq!(bits_per_pixel(Format::R8Unorm) as usize, std::mem::size_of::<Unorm1>() * 8);
        assert_eq!(bits_per_pixel(Format::R8G8Unorm) as usize, std::mem::size_of::<Unorm2>() * 8);
        assert_eq!(std::mem::size_of::<Unorm3>(), 3);
        assert_eq!(bits_per_pixel(Format::R8G8B8A8Unorm) as usize, std::mem::size_of::<Unorm4>() * 8);
    }

    #[test]
    fn normalization() {
        assert_eq!(Unorm1::new(0).as_float1(), 0.0);
        assert_eq!(Unorm1::new(255).as_float1(), 1.0);
        let two = Unorm2::new(255, 0).as_float2();
        assert_eq!((two.r, two.g), (1.0, 0.0));
        let three = Unorm3::new(0, 255, 0).as_float3();
        assert_eq!((three.r, three.g, three.b), (0.0, 1.0, 0.0));
        let four = Unorm4::new(0, 0, 0, 255).as_float4();
        assert_eq!(four.a, 1.0);
        assert_eq!(Unorm4::new(51, 0, 0, 0).as_float1(), 0.2);
    }

    #[test]
    fn floats_round_trip_through_unorm4() {
        let original = Unorm4::new(12, 34, 56, 78);
        assert_eq!(Unorm4::from_floats(original.as_float4()), original);
        let clamped = Unorm4::from_floats(Float4 { r: 2.0, g: -1.0, b: 0.5, a: 1.0 });
        assert_eq!(clamped, Unorm4::new(255, 0, 128, 255));
    }
}
