// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Resource descriptions and subresource arithmetic.

A resource is one of four shapes: a buffer, or a 1D, 2D or 3D texture.  [`ResourceDescription`]
is the tagged variant describing any of them, and [`subresource`] holds the pure functions that
turn a description plus a [`SubresourceAddress`] into an element count and a linear index.
*/

mod description;
pub mod subresource;

pub use description::{
    BindFlags, BufferDescription, CpuAccessFlags, Dimension, MiscFlags, ResourceDescription,
    SampleDescription, Texture1DDescription, Texture2DDescription, Texture3DDescription, Usage,
};
pub use subresource::{
    MipExtent, SubresourceAddress, element_count, mip_extent, subresource_exists, subresource_index,
};
