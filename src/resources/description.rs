// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Live descriptions of buffers and textures.

use crate::pixel_formats::Format;
use crate::resources::subresource::{MipExtent, full_mip_chain_length, mip_extent};

/// The shape a resource reports for itself.
///
/// `Unknown` exists because a native resource may report a dimension this crate does not model.
/// It is never readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Unknown,
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
}

/// How the device is expected to access a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Usage {
    /// GPU read/write.
    #[default]
    Default,
    /// GPU read only, initialized at creation.
    Immutable,
    /// GPU read, CPU write.
    Dynamic,
    /// Transfer from the GPU to the CPU (or back).  Never bound to the pipeline.
    Staging,
}

bitflags::bitflags! {
    /// Pipeline stages a resource may be bound to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const CONSTANT_BUFFER = 0x4;
        const SHADER_RESOURCE = 0x8;
        const STREAM_OUTPUT = 0x10;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL = 0x40;
        const UNORDERED_ACCESS = 0x80;
        const DECODER = 0x200;
        const VIDEO_ENCODER = 0x400;
    }
}

bitflags::bitflags! {
    /// CPU access a resource permits when mapped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CpuAccessFlags: u32 {
        const WRITE = 0x10000;
        const READ = 0x20000;
    }
}

bitflags::bitflags! {
    /// Less common resource options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MiscFlags: u32 {
        const GENERATE_MIPS = 0x1;
        const SHARED = 0x2;
        const TEXTURE_CUBE = 0x4;
        const DRAW_INDIRECT_ARGS = 0x10;
        const BUFFER_ALLOW_RAW_VIEWS = 0x20;
        const BUFFER_STRUCTURED = 0x40;
        const RESOURCE_CLAMP = 0x80;
        const SHARED_KEYED_MUTEX = 0x100;
        const GDI_COMPATIBLE = 0x200;
    }
}

impl Default for BindFlags {
    fn default() -> Self {
        BindFlags::empty()
    }
}
impl Default for CpuAccessFlags {
    fn default() -> Self {
        CpuAccessFlags::empty()
    }
}
impl Default for MiscFlags {
    fn default() -> Self {
        MiscFlags::empty()
    }
}

/// Multisampling parameters of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleDescription {
    pub count: u32,
    pub quality: u32,
}

impl Default for SampleDescription {
    fn default() -> Self {
        SampleDescription { count: 1, quality: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferDescription {
    pub byte_width: u32,
    pub usage: Usage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: MiscFlags,
    pub structure_byte_stride: u32,
}

impl BufferDescription {
    /// A default-usage buffer bindable as a shader resource.
    pub fn new(byte_width: u32) -> Self {
        BufferDescription {
            byte_width,
            bind_flags: BindFlags::SHADER_RESOURCE,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Texture1DDescription {
    pub width: u32,
    /// 0 requests the full mip chain at allocation; live descriptions carry the resolved count.
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: Format,
    pub usage: Usage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: MiscFlags,
}

impl Texture1DDescription {
    /// A single-mip, single-slice, sampleable texture.
    pub fn new(width: u32, format: Format) -> Self {
        Texture1DDescription {
            width,
            mip_levels: 1,
            array_size: 1,
            format,
            bind_flags: BindFlags::SHADER_RESOURCE,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Texture2DDescription {
    pub width: u32,
    pub height: u32,
    /// 0 requests the full mip chain at allocation; live descriptions carry the resolved count.
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: Format,
    pub sample: SampleDescription,
    pub usage: Usage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: MiscFlags,
}

impl Texture2DDescription {
    /// A single-mip, single-slice, single-sample, sampleable texture.
    pub fn new(width: u32, height: u32, format: Format) -> Self {
        Texture2DDescription {
            width,
            height,
            mip_levels: 1,
            array_size: 1,
            format,
            bind_flags: BindFlags::SHADER_RESOURCE,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Texture3DDescription {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// 0 requests the full mip chain at allocation; live descriptions carry the resolved count.
    pub mip_levels: u32,
    pub format: Format,
    pub usage: Usage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: MiscFlags,
}

impl Texture3DDescription {
    /// A single-mip, sampleable volume.
    pub fn new(width: u32, height: u32, depth: u32, format: Format) -> Self {
        Texture3DDescription {
            width,
            height,
            depth,
            mip_levels: 1,
            format,
            bind_flags: BindFlags::SHADER_RESOURCE,
            ..Default::default()
        }
    }
}

/// Description of one resource, tagged by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDescription {
    Buffer(BufferDescription),
    Texture1D(Texture1DDescription),
    Texture2D(Texture2DDescription),
    Texture3D(Texture3DDescription),
}

/// Mutable view of the access-related fields every shape has.
pub(crate) struct AccessMut<'a> {
    pub usage: &'a mut Usage,
    pub bind_flags: &'a mut BindFlags,
    pub cpu_access: &'a mut CpuAccessFlags,
    pub misc_flags: &'a mut MiscFlags,
}

macro_rules! access_mut {
    ($d:expr) => {
        AccessMut {
            usage: &mut $d.usage,
            bind_flags: &mut $d.bind_flags,
            cpu_access: &mut $d.cpu_access,
            misc_flags: &mut $d.misc_flags,
        }
    };
}

impl ResourceDescription {
    pub fn dimension(&self) -> Dimension {
        match self {
            ResourceDescription::Buffer(_) => Dimension::Buffer,
            ResourceDescription::Texture1D(_) => Dimension::Texture1D,
            ResourceDescription::Texture2D(_) => Dimension::Texture2D,
            ResourceDescription::Texture3D(_) => Dimension::Texture3D,
        }
    }

    /// The element format.  Buffers have none.
    pub fn format(&self) -> Option<Format> {
        match self {
            ResourceDescription::Buffer(_) => None,
            ResourceDescription::Texture1D(d) => Some(d.format),
            ResourceDescription::Texture2D(d) => Some(d.format),
            ResourceDescription::Texture3D(d) => Some(d.format),
        }
    }

    /// Mip levels as described.  Buffers have exactly one.
    pub fn mip_levels(&self) -> u32 {
        match self {
            ResourceDescription::Buffer(_) => 1,
            ResourceDescription::Texture1D(d) => d.mip_levels,
            ResourceDescription::Texture2D(d) => d.mip_levels,
            ResourceDescription::Texture3D(d) => d.mip_levels,
        }
    }

    /// Array slices.  Buffers and volumes have exactly one.
    pub fn array_size(&self) -> u32 {
        match self {
            ResourceDescription::Buffer(_) | ResourceDescription::Texture3D(_) => 1,
            ResourceDescription::Texture1D(d) => d.array_size,
            ResourceDescription::Texture2D(d) => d.array_size,
        }
    }

    pub fn subresource_count(&self) -> u32 {
        self.mip_levels().saturating_mul(self.array_size())
    }

    /// Extent of one subresource at `mip_level`.
    ///
    /// For buffers, the width is the byte width and the level is ignored.
    pub fn extent_at(&self, mip_level: u32) -> MipExtent {
        match self {
            ResourceDescription::Buffer(d) => MipExtent {
                width: d.byte_width,
                height: 1,
                depth: 1,
            },
            ResourceDescription::Texture1D(d) => MipExtent {
                width: mip_extent(d.width, mip_level),
                height: 1,
                depth: 1,
            },
            ResourceDescription::Texture2D(d) => MipExtent {
                width: mip_extent(d.width, mip_level),
                height: mip_extent(d.height, mip_level),
                depth: 1,
            },
            ResourceDescription::Texture3D(d) => MipExtent {
                width: mip_extent(d.width, mip_level),
                height: mip_extent(d.height, mip_level),
                depth: mip_extent(d.depth, mip_level),
            },
        }
    }

    pub fn usage(&self) -> Usage {
        match self {
            ResourceDescription::Buffer(d) => d.usage,
            ResourceDescription::Texture1D(d) => d.usage,
            ResourceDescription::Texture2D(d) => d.usage,
            ResourceDescription::Texture3D(d) => d.usage,
        }
    }

    pub fn bind_flags(&self) -> BindFlags {
        match self {
            ResourceDescription::Buffer(d) => d.bind_flags,
            ResourceDescription::Texture1D(d) => d.bind_flags,
            ResourceDescription::Texture2D(d) => d.bind_flags,
            ResourceDescription::Texture3D(d) => d.bind_flags,
        }
    }

    pub fn cpu_access(&self) -> CpuAccessFlags {
        match self {
            ResourceDescription::Buffer(d) => d.cpu_access,
            ResourceDescription::Texture1D(d) => d.cpu_access,
            ResourceDescription::Texture2D(d) => d.cpu_access,
            ResourceDescription::Texture3D(d) => d.cpu_access,
        }
    }

    pub fn misc_flags(&self) -> MiscFlags {
        match self {
            ResourceDescription::Buffer(d) => d.misc_flags,
            ResourceDescription::Texture1D(d) => d.misc_flags,
            ResourceDescription::Texture2D(d) => d.misc_flags,
            ResourceDescription::Texture3D(d) => d.misc_flags,
        }
    }

    pub(crate) fn access_mut(&mut self) -> AccessMut<'_> {
        match self {
            ResourceDescription::Buffer(d) => access_mut!(d),
            ResourceDescription::Texture1D(d) => access_mut!(d),
            ResourceDescription::Texture2D(d) => access_mut!(d),
            ResourceDescription::Texture3D(d) => access_mut!(d),
        }
    }

    /// A copy with a requested mip count of 0 replaced by the length of the full chain.
    pub fn with_resolved_mips(&self) -> ResourceDescription {
        let mut resolved = *self;
        match &mut resolved {
            ResourceDescription::Buffer(_) => {}
            ResourceDescription::Texture1D(d) => {
                if d.mip_levels == 0 {
                    d.mip_levels = full_mip_chain_length(d.width);
                }
            }
            ResourceDescription::Texture2D(d) => {
                if d.mip_levels == 0 {
                    d.mip_levels = full_mip_chain_length(d.width.max(d.height));
                }
            }
            ResourceDescription::Texture3D(d) => {
                if d.mip_levels == 0 {
                    d.mip_levels = full_mip_chain_length(d.width.max(d.height).max(d.depth));
                }
            }
        }
        resolved
    }
}

impl From<BufferDescription> for ResourceDescription {
    fn from(d: BufferDescription) -> Self {
        ResourceDescription::Buffer(d)
    }
}
impl From<Texture1DDescription> for ResourceDescription {
    fn from(d: Texture1DDescription) -> Self {
        ResourceDescription::Texture1D(d)
    }
}
impl From<Texture2DDescription> for ResourceDescription {
    fn from(d: Texture2DDescription) -> Self {
        ResourceDescription::Texture2D(d)
    }
}
impl From<Texture3DDescription> for ResourceDescription {
    fn from(d: Texture3DDescription) -> Self {
        ResourceDescription::Texture3D(d)
    }
}
