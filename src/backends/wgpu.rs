// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A device backed by wgpu.

wgpu has no host-readable textures, so staging resources are always `MAP_READ | COPY_DST`
buffers.  Each subresource occupies its own range of the buffer with rows aligned to
[`::wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`], which is the row pitch reported when mapping.

Live resources are plain `wgpu::Buffer`s and `wgpu::Texture`s, and their descriptions are read
back from the wgpu objects themselves.
*/

mod format;

use crate::device::{Context, Device, MapIntent, MappedSubresource, Resource, ResourceView};
use crate::error::DeviceError;
use crate::pixel_formats::Format;
use crate::resources::{
    BindFlags, BufferDescription, CpuAccessFlags, Dimension, ResourceDescription, SampleDescription,
    Texture1DDescription, Texture2DDescription, Texture3DDescription, Usage,
};
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError, mpsc};

/// Errors creating a [`WgpuDevice`].
#[derive(Debug, thiserror::Error)]
pub enum WgpuError {
    #[error("no such adapter")]
    NoSuchAdapter(#[from] ::wgpu::RequestAdapterError),
    #[error(transparent)]
    RequestDeviceError(#[from] ::wgpu::RequestDeviceError),
}

/// How to pick an adapter for [`WgpuDevice::headless`].
#[derive(Debug, Clone)]
pub struct WgpuOptions {
    pub power_preference: ::wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub label: String,
}

impl Default for WgpuOptions {
    fn default() -> Self {
        WgpuOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            label: "gpu_readback".to_string(),
        }
    }
}

#[derive(Debug)]
struct Gpu {
    device: ::wgpu::Device,
    queue: ::wgpu::Queue,
}

impl Gpu {
    /// Runs `f` inside validation and out-of-memory error scopes.
    fn scoped<R>(&self, f: impl FnOnce(&::wgpu::Device) -> R) -> Result<R, DeviceError> {
        self.device.push_error_scope(::wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(::wgpu::ErrorFilter::Validation);
        let r = f(&self.device);
        let validation = test_executors::spin_on(self.device.pop_error_scope());
        let oom = test_executors::spin_on(self.device.pop_error_scope());
        if oom.is_some() {
            return Err(DeviceError::OutOfMemory);
        }
        match validation {
            Some(e) => Err(DeviceError::InvalidArgument(e.to_string())),
            None => Ok(r),
        }
    }

    fn wait(&self) -> Result<(), DeviceError> {
        self.device
            .poll(::wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| DeviceError::Backend(e.to_string()))
    }
}

/// Allocates [`WgpuResource`]s.
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    gpu: Arc<Gpu>,
}

impl WgpuDevice {
    /// Requests an adapter and a device with no surface, blocking until both are ready.
    pub fn headless(options: WgpuOptions) -> Result<WgpuDevice, WgpuError> {
        let instance = ::wgpu::Instance::new(&::wgpu::InstanceDescriptor::from_env_or_default());
        let adapter = test_executors::spin_on(instance.request_adapter(&::wgpu::RequestAdapterOptions {
            power_preference: options.power_preference,
            force_fallback_adapter: options.force_fallback_adapter,
            compatible_surface: None,
        }))?;
        logwise::info_sync!(
            "wgpu adapter selected: {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );
        let descriptor = ::wgpu::DeviceDescriptor {
            label: Some(options.label.as_str()),
            required_features: Default::default(),
            required_limits: ::wgpu::Limits::downlevel_defaults(),
            memory_hints: Default::default(),
            trace: ::wgpu::Trace::Off,
        };
        let (device, queue) = test_executors::spin_on(adapter.request_device(&descriptor))?;
        Ok(WgpuDevice {
            gpu: Arc::new(Gpu { device, queue }),
        })
    }

    pub fn immediate_context(&self) -> WgpuContext {
        WgpuContext { gpu: self.gpu.clone() }
    }

    pub fn wgpu_device(&self) -> &::wgpu::Device {
        &self.gpu.device
    }

    /// A view of a texture resource that can be resolved back to it.
    pub fn create_texture_view(&self, resource: &WgpuResource) -> Result<WgpuTextureView, DeviceError> {
        match resource {
            WgpuResource::Texture(texture) => Ok(WgpuTextureView {
                view: texture.create_view(&::wgpu::TextureViewDescriptor::default()),
                texture: texture.clone(),
            }),
            _ => Err(DeviceError::InvalidArgument("views require a texture".to_string())),
        }
    }

    fn create_staging(&self, description: &ResourceDescription) -> Result<WgpuResource, DeviceError> {
        let layouts = staging_layout(description)?;
        let size = layouts.last().map(|l| l.offset + l.size()).unwrap_or(0);
        let buffer = self.gpu.scoped(|device| {
            device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("readback staging"),
                size,
                usage: ::wgpu::BufferUsages::MAP_READ | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;
        let mapped = Mutex::new(vec![false; layouts.len()]);
        Ok(WgpuResource::Staging(Arc::new(StagingBuffer {
            buffer,
            description: *description,
            layouts,
            mapped,
        })))
    }
}

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

fn buffer_usages(bind: BindFlags) -> ::wgpu::BufferUsages {
    let mut usages = ::wgpu::BufferUsages::COPY_SRC | ::wgpu::BufferUsages::COPY_DST;
    if bind.contains(BindFlags::VERTEX_BUFFER) {
        usages |= ::wgpu::BufferUsages::VERTEX;
    }
    if bind.contains(BindFlags::INDEX_BUFFER) {
        usages |= ::wgpu::BufferUsages::INDEX;
    }
    if bind.contains(BindFlags::CONSTANT_BUFFER) {
        usages |= ::wgpu::BufferUsages::UNIFORM;
    }
    if bind.intersects(BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS) {
        usages |= ::wgpu::BufferUsages::STORAGE;
    }
    usages
}

fn texture_usages(bind: BindFlags) -> ::wgpu::TextureUsages {
    let mut usages = ::wgpu::TextureUsages::COPY_SRC | ::wgpu::TextureUsages::COPY_DST;
    if bind.contains(BindFlags::SHADER_RESOURCE) {
        usages |= ::wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if bind.contains(BindFlags::UNORDERED_ACCESS) {
        usages |= ::wgpu::TextureUsages::STORAGE_BINDING;
    }
    if bind.intersects(BindFlags::RENDER_TARGET | BindFlags::DEPTH_STENCIL) {
        usages |= ::wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    usages
}

fn bind_flags_of_texture(usages: ::wgpu::TextureUsages) -> BindFlags {
    let mut bind = BindFlags::empty();
    if usages.contains(::wgpu::TextureUsages::TEXTURE_BINDING) {
        bind |= BindFlags::SHADER_RESOURCE;
    }
    if usages.contains(::wgpu::TextureUsages::STORAGE_BINDING) {
        bind |= BindFlags::UNORDERED_ACCESS;
    }
    if usages.contains(::wgpu::TextureUsages::RENDER_ATTACHMENT) {
        bind |= BindFlags::RENDER_TARGET;
    }
    bind
}

fn bind_flags_of_buffer(usages: ::wgpu::BufferUsages) -> BindFlags {
    let mut bind = BindFlags::empty();
    if usages.contains(::wgpu::BufferUsages::VERTEX) {
        bind |= BindFlags::VERTEX_BUFFER;
    }
    if usages.contains(::wgpu::BufferUsages::INDEX) {
        bind |= BindFlags::INDEX_BUFFER;
    }
    if usages.contains(::wgpu::BufferUsages::UNIFORM) {
        bind |= BindFlags::CONSTANT_BUFFER;
    }
    if usages.contains(::wgpu::BufferUsages::STORAGE) {
        bind |= BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS;
    }
    bind
}

/// Where one subresource sits in a staging buffer.
#[derive(Debug, Clone, Copy)]
struct StagingLayout {
    offset: u64,
    mip_level: u32,
    array_layer: u32,
    width: u32,
    height: u32,
    depth: u32,
    bytes_per_row: u32,
}

impl StagingLayout {
    fn size(&self) -> u64 {
        self.bytes_per_row as u64 * self.height as u64 * self.depth as u64
    }
    fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.size()
    }
}

fn staging_layout(description: &ResourceDescription) -> Result<Vec<StagingLayout>, DeviceError> {
    if let ResourceDescription::Buffer(d) = description {
        let bytes = align_to(d.byte_width as u64, ::wgpu::COPY_BUFFER_ALIGNMENT);
        let bytes_per_row = u32::try_from(bytes)
            .map_err(|_| DeviceError::Unsupported(format!("{} byte staging buffer", d.byte_width)))?;
        return Ok(vec![StagingLayout {
            offset: 0,
            mip_level: 0,
            array_layer: 0,
            width: d.byte_width,
            height: 1,
            depth: 1,
            bytes_per_row,
        }]);
    }
    let element_bytes = description
        .format()
        .filter(|f| format::to_wgpu(*f).is_some())
        .and_then(|f| f.bytes_per_element())
        .ok_or_else(|| DeviceError::Unsupported(format!("{:?}", description.format())))?;
    let mut layouts = Vec::new();
    let mut offset = 0;
    for array_layer in 0..description.array_size() {
        for mip_level in 0..description.mip_levels() {
            let extent = description.extent_at(mip_level);
            let bytes_per_row = align_to(
                extent.width as u64 * element_bytes as u64,
                ::wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            ) as u32;
            let l = StagingLayout {
                offset,
                mip_level,
                array_layer,
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
                bytes_per_row,
            };
            offset += l.size();
            layouts.push(l);
        }
    }
    Ok(layouts)
}

impl Device for WgpuDevice {
    type Resource = WgpuResource;

    fn create_resource(&self, description: &ResourceDescription) -> Result<WgpuResource, DeviceError> {
        let description = description.with_resolved_mips();
        let extent = description.extent_at(0);
        if description.array_size() == 0
            || matches!(&description, ResourceDescription::Buffer(d) if d.byte_width == 0)
        {
            return Err(DeviceError::InvalidArgument("zero-sized resource".to_string()));
        }
        if description.usage() == Usage::Staging {
            if description.cpu_access() != CpuAccessFlags::READ || !description.bind_flags().is_empty() {
                return Err(DeviceError::Unsupported(
                    "staging resources must be CPU readable and unbound".to_string(),
                ));
            }
            if matches!(&description, ResourceDescription::Texture2D(d) if d.sample.count > 1) {
                return Err(DeviceError::Unsupported("multisampled staging textures".to_string()));
            }
            return self.create_staging(&description);
        }
        if !description.cpu_access().is_empty() {
            return Err(DeviceError::Unsupported("CPU access requires staging usage".to_string()));
        }

        let (dimension, layers, samples) = match &description {
            ResourceDescription::Buffer(d) => {
                let buffer = self.gpu.scoped(|device| {
                    device.create_buffer(&::wgpu::BufferDescriptor {
                        label: None,
                        size: align_to(d.byte_width as u64, ::wgpu::COPY_BUFFER_ALIGNMENT),
                        usage: buffer_usages(d.bind_flags),
                        mapped_at_creation: false,
                    })
                })?;
                return Ok(WgpuResource::Buffer {
                    buffer,
                    byte_width: d.byte_width,
                });
            }
            ResourceDescription::Texture1D(d) => (::wgpu::TextureDimension::D1, d.array_size, 1),
            ResourceDescription::Texture2D(d) => (::wgpu::TextureDimension::D2, d.array_size, d.sample.count),
            ResourceDescription::Texture3D(d) => (::wgpu::TextureDimension::D3, extent.depth, 1),
        };
        let format = description
            .format()
            .and_then(format::to_wgpu)
            .ok_or_else(|| DeviceError::Unsupported(format!("{:?}", description.format())))?;
        let texture = self.gpu.scoped(|device| {
            device.create_texture(&::wgpu::TextureDescriptor {
                label: None,
                size: ::wgpu::Extent3d {
                    width: extent.width,
                    height: extent.height,
                    depth_or_array_layers: layers,
                },
                mip_level_count: description.mip_levels(),
                sample_count: samples,
                dimension,
                format,
                usage: texture_usages(description.bind_flags()),
                view_formats: &[],
            })
        })?;
        Ok(WgpuResource::Texture(texture))
    }
}

/// Host-readable copy of a live resource.
#[derive(Debug)]
pub struct StagingBuffer {
    buffer: ::wgpu::Buffer,
    description: ResourceDescription,
    layouts: Vec<StagingLayout>,
    mapped: Mutex<Vec<bool>>,
}

/// A wgpu resource.
#[derive(Debug, Clone)]
pub enum WgpuResource {
    /// `byte_width` is the size asked for; the wgpu buffer behind it is padded to
    /// `COPY_BUFFER_ALIGNMENT`.
    Buffer { buffer: ::wgpu::Buffer, byte_width: u32 },
    Texture(::wgpu::Texture),
    Staging(Arc<StagingBuffer>),
}

impl Resource for WgpuResource {
    fn dimension(&self) -> Dimension {
        match self {
            WgpuResource::Buffer { .. } => Dimension::Buffer,
            WgpuResource::Texture(t) => match t.dimension() {
                ::wgpu::TextureDimension::D1 => Dimension::Texture1D,
                ::wgpu::TextureDimension::D2 => Dimension::Texture2D,
                ::wgpu::TextureDimension::D3 => Dimension::Texture3D,
            },
            WgpuResource::Staging(s) => s.description.dimension(),
        }
    }

    fn description(&self) -> ResourceDescription {
        match self {
            WgpuResource::Buffer { buffer, byte_width } => ResourceDescription::Buffer(BufferDescription {
                byte_width: *byte_width,
                bind_flags: bind_flags_of_buffer(buffer.usage()),
                ..Default::default()
            }),
            WgpuResource::Texture(t) => {
                let format: Format = format::from_wgpu(t.format());
                let bind_flags = bind_flags_of_texture(t.usage());
                match t.dimension() {
                    ::wgpu::TextureDimension::D1 => ResourceDescription::Texture1D(Texture1DDescription {
                        width: t.width(),
                        mip_levels: t.mip_level_count(),
                        array_size: t.depth_or_array_layers(),
                        format,
                        bind_flags,
                        ..Default::default()
                    }),
                    ::wgpu::TextureDimension::D2 => ResourceDescription::Texture2D(Texture2DDescription {
                        width: t.width(),
                        height: t.height(),
                        mip_levels: t.mip_level_count(),
                        array_size: t.depth_or_array_layers(),
                        format,
                        sample: SampleDescription {
                            count: t.sample_count(),
                            quality: 0,
                        },
                        bind_flags,
                        ..Default::default()
                    }),
                    ::wgpu::TextureDimension::D3 => ResourceDescription::Texture3D(Texture3DDescription {
                        width: t.width(),
                        height: t.height(),
                        depth: t.depth_or_array_layers(),
                        mip_levels: t.mip_level_count(),
                        format,
                        bind_flags,
                        ..Default::default()
                    }),
                }
            }
            WgpuResource::Staging(s) => s.description,
        }
    }
}

/// A texture view that remembers its texture.
#[derive(Debug, Clone)]
pub struct WgpuTextureView {
    view: ::wgpu::TextureView,
    texture: ::wgpu::Texture,
}

impl WgpuTextureView {
    pub fn view(&self) -> &::wgpu::TextureView {
        &self.view
    }
}

impl ResourceView for WgpuTextureView {
    type Resource = WgpuResource;
    fn resource(&self) -> WgpuResource {
        WgpuResource::Texture(self.texture.clone())
    }
}

/// Copies, uploads and maps [`WgpuResource`]s.
#[derive(Debug, Clone)]
pub struct WgpuContext {
    gpu: Arc<Gpu>,
}

impl WgpuContext {
    /// Writes packed bytes into one subresource of a live resource and waits for the write.
    pub fn update_subresource(&self, resource: &WgpuResource, subresource: u32, data: &[u8]) -> Result<(), DeviceError> {
        match resource {
            WgpuResource::Buffer { buffer: b, .. } => {
                if subresource != 0 {
                    return Err(DeviceError::InvalidArgument(format!("subresource {subresource} of 1")));
                }
                self.gpu.scoped(|_| self.gpu.queue.write_buffer(b, 0, data))?;
            }
            WgpuResource::Texture(t) => {
                let description = resource.description();
                let mips = description.mip_levels();
                if subresource >= description.subresource_count() {
                    return Err(DeviceError::InvalidArgument(format!(
                        "subresource {subresource} of {}",
                        description.subresource_count()
                    )));
                }
                let element_bytes = description
                    .format()
                    .and_then(Format::bytes_per_element)
                    .ok_or_else(|| DeviceError::Unsupported(format!("{:?}", description.format())))?;
                let mip_level = subresource % mips;
                let extent = description.extent_at(mip_level);
                let (z, depth) = match description.dimension() {
                    Dimension::Texture3D => (0, extent.depth),
                    _ => (subresource / mips, 1),
                };
                self.gpu.scoped(|_| {
                    self.gpu.queue.write_texture(
                        ::wgpu::TexelCopyTextureInfo {
                            texture: t,
                            mip_level,
                            origin: ::wgpu::Origin3d { x: 0, y: 0, z },
                            aspect: ::wgpu::TextureAspect::All,
                        },
                        data,
                        ::wgpu::TexelCopyBufferLayout {
                            offset: 0,
                            bytes_per_row: Some(extent.width * element_bytes),
                            rows_per_image: Some(extent.height),
                        },
                        ::wgpu::Extent3d {
                            width: extent.width,
                            height: extent.height,
                            depth_or_array_layers: depth,
                        },
                    )
                })?;
            }
            WgpuResource::Staging(_) => {
                return Err(DeviceError::InvalidArgument("staging resources are read only".to_string()));
            }
        }
        self.gpu.queue.submit(std::iter::empty());
        self.gpu.wait()
    }

    fn encode_copy(&self, encoder: &mut ::wgpu::CommandEncoder, destination: &WgpuResource, source: &WgpuResource) -> bool {
        match (destination, source) {
            (WgpuResource::Staging(s), WgpuResource::Buffer { buffer: b, .. }) => {
                encoder.copy_buffer_to_buffer(b, 0, &s.buffer, 0, b.size().min(s.buffer.size()));
            }
            (WgpuResource::Staging(s), WgpuResource::Texture(t)) => {
                for l in &s.layouts {
                    encoder.copy_texture_to_buffer(
                        ::wgpu::TexelCopyTextureInfo {
                            texture: t,
                            mip_level: l.mip_level,
                            origin: ::wgpu::Origin3d {
                                x: 0,
                                y: 0,
                                z: l.array_layer,
                            },
                            aspect: ::wgpu::TextureAspect::All,
                        },
                        ::wgpu::TexelCopyBufferInfo {
                            buffer: &s.buffer,
                            layout: ::wgpu::TexelCopyBufferLayout {
                                offset: l.offset,
                                bytes_per_row: Some(l.bytes_per_row),
                                rows_per_image: Some(l.height),
                            },
                        },
                        ::wgpu::Extent3d {
                            width: l.width,
                            height: l.height,
                            depth_or_array_layers: l.depth,
                        },
                    );
                }
            }
            _ => return false,
        }
        true
    }
}

impl Context for WgpuContext {
    type Resource = WgpuResource;
    type Mapping<'a> = Box<[u8]>;

    fn copy_resource(&self, destination: &WgpuResource, source: &WgpuResource) {
        let dst = destination.description();
        let src = source.description();
        if dst.dimension() != src.dimension()
            || dst.extent_at(0) != src.extent_at(0)
            || dst.format() != src.format()
            || dst.mip_levels() != src.mip_levels()
            || dst.array_size() != src.array_size()
        {
            logwise::error_sync!(
                "copy_resource between mismatched resources: {dst} from {src}",
                dst = logwise::privacy::LogIt(&dst),
                src = logwise::privacy::LogIt(&src)
            );
            return;
        }
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor { label: Some("readback copy") });
        let copy = logwise::perfwarn_begin!("wgpu copy_resource");
        let recorded = match self.gpu.scoped(|_| self.encode_copy(&mut encoder, destination, source)) {
            Ok(recorded) => recorded,
            Err(e) => {
                logwise::error_sync!("copy_resource failed: {e}", e = logwise::privacy::LogIt(&e));
                return;
            }
        };
        if !recorded {
            logwise::error_sync!("copy_resource between unsupported resource kinds");
            return;
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        if let Err(e) = self.gpu.wait() {
            logwise::error_sync!("copy_resource wait failed: {e}", e = logwise::privacy::LogIt(&e));
        }
        drop(copy);
    }

    fn map<'a>(
        &'a self,
        resource: &'a WgpuResource,
        subresource: u32,
        intent: MapIntent,
    ) -> Result<MappedSubresource<Box<[u8]>>, DeviceError> {
        let WgpuResource::Staging(staging) = resource else {
            return Err(DeviceError::InvalidArgument("only staging resources can be mapped".to_string()));
        };
        if intent != MapIntent::Read {
            return Err(DeviceError::Unsupported(format!("{intent:?} mappings")));
        }
        let Some(layout) = staging.layouts.get(subresource as usize).copied() else {
            return Err(DeviceError::InvalidArgument(format!(
                "subresource {subresource} of {}",
                staging.layouts.len()
            )));
        };
        let mut mapped = staging.mapped.lock().unwrap_or_else(PoisonError::into_inner);
        // wgpu maps whole buffers, so one subresource at a time.
        if mapped.iter().any(|m| *m) {
            return Err(DeviceError::AlreadyMapped);
        }

        let (sender, receiver) = mpsc::channel();
        staging.buffer.map_async(::wgpu::MapMode::Read, layout.range(), move |result| {
            let _ = sender.send(result);
        });
        self.gpu.wait()?;
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(DeviceError::Backend(e.to_string())),
            Err(_) => return Err(DeviceError::Backend("map callback was dropped".to_string())),
        }
        let data: Box<[u8]> = staging.buffer.slice(layout.range()).get_mapped_range().to_vec().into_boxed_slice();
        mapped[subresource as usize] = true;

        let row_pitch = layout.bytes_per_row as usize;
        Ok(MappedSubresource {
            data,
            row_pitch,
            depth_pitch: row_pitch * layout.height as usize,
        })
    }

    fn unmap(&self, resource: &WgpuResource, subresource: u32) {
        let WgpuResource::Staging(staging) = resource else {
            logwise::error_sync!("unmap of a resource that cannot be mapped");
            return;
        };
        let mut mapped = staging.mapped.lock().unwrap_or_else(PoisonError::into_inner);
        match mapped.get_mut(subresource as usize) {
            Some(m) if *m => {
                *m = false;
                staging.buffer.unmap();
            }
            _ => {
                logwise::error_sync!(
                    "unmap of subresource {subresource} which is not mapped",
                    subresource = subresource
                );
            }
        }
    }
}
