// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-memory device with immediate-context semantics.

Resources live in host memory, laid out one subresource after another.  Texture rows are
padded to the builder's row pitch alignment, so mappings report real pitches that can exceed
the packed row size.

Validation follows the rules a Direct3D 11 device applies to the same descriptions.  Anything
rejected at creation comes back as a [`DeviceError`]; misuse of the context (copying between
mismatched resources, unmapping something never mapped) is logged and otherwise ignored.
*/

use crate::device::{Context, Device, MapIntent, MappedSubresource, Resource, ResourceView};
use crate::error::DeviceError;
use crate::resources::{BindFlags, CpuAccessFlags, Dimension, MiscFlags, ResourceDescription, Usage};
use crate::resources::subresource::full_mip_chain_length;
use std::fmt::Debug;
use std::ops::{Deref, Range};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

/// Configures a [`SoftDevice`].
#[derive(Debug, Clone)]
pub struct SoftDeviceBuilder {
    row_pitch_alignment: usize,
    memory_budget: Option<usize>,
}

impl Default for SoftDeviceBuilder {
    fn default() -> Self {
        SoftDeviceBuilder {
            row_pitch_alignment: 1,
            memory_budget: None,
        }
    }
}

impl SoftDeviceBuilder {
    /// Texture rows start on multiples of this many bytes.  0 is treated as 1.
    pub fn row_pitch_alignment(mut self, alignment: usize) -> Self {
        self.row_pitch_alignment = alignment.max(1);
        self
    }

    /// Creation fails with [`DeviceError::OutOfMemory`] once live resources would exceed this.
    pub fn memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    pub fn build(self) -> SoftDevice {
        logwise::info_sync!(
            "soft device created with row pitch alignment {alignment}",
            alignment = self.row_pitch_alignment
        );
        SoftDevice {
            shared: Arc::new(Shared {
                row_pitch_alignment: self.row_pitch_alignment,
                memory_budget: self.memory_budget,
                live_resources: AtomicUsize::new(0),
                allocations: AtomicUsize::new(0),
                resident_bytes: AtomicUsize::new(0),
            }),
        }
    }
}

#[derive(Debug)]
struct Shared {
    row_pitch_alignment: usize,
    memory_budget: Option<usize>,
    live_resources: AtomicUsize,
    allocations: AtomicUsize,
    resident_bytes: AtomicUsize,
}

/// Where one subresource sits in a resource's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubresourceLayout {
    pub offset: usize,
    pub row_pitch: usize,
    pub depth_pitch: usize,
    /// Bytes of payload in one row.
    pub row_bytes: usize,
    pub rows: usize,
    pub slices: usize,
}

impl SubresourceLayout {
    /// Bytes reserved for the subresource, padding included.
    pub fn size(&self) -> usize {
        self.depth_pitch * self.slices
    }

    fn packed_size(&self) -> usize {
        self.row_bytes * self.rows * self.slices
    }

    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size()
    }
}

fn layout(description: &ResourceDescription, alignment: usize) -> Vec<SubresourceLayout> {
    if let ResourceDescription::Buffer(d) = description {
        let row_bytes = d.byte_width as usize;
        return vec![SubresourceLayout {
            offset: 0,
            row_pitch: row_bytes,
            depth_pitch: row_bytes,
            row_bytes,
            rows: 1,
            slices: 1,
        }];
    }
    let element_bytes = description
        .format()
        .and_then(|f| f.bytes_per_element())
        .unwrap_or(0) as usize;
    let mut layouts = Vec::with_capacity(description.subresource_count() as usize);
    let mut offset = 0;
    for _ in 0..description.array_size() {
        for mip in 0..description.mip_levels() {
            let extent = description.extent_at(mip);
            let row_bytes = extent.width as usize * element_bytes;
            let row_pitch = row_bytes.div_ceil(alignment) * alignment;
            let rows = extent.height as usize;
            let l = SubresourceLayout {
                offset,
                row_pitch,
                depth_pitch: row_pitch * rows,
                row_bytes,
                rows,
                slices: extent.depth as usize,
            };
            offset += l.size();
            layouts.push(l);
        }
    }
    layouts
}

/// Applies creation rules, returning the description the resource will carry.
fn validate(description: &ResourceDescription, has_initial_data: bool) -> Result<ResourceDescription, DeviceError> {
    let resolved = description.with_resolved_mips();
    let extent = resolved.extent_at(0);
    let zero_extent = match &resolved {
        ResourceDescription::Buffer(d) => d.byte_width == 0,
        ResourceDescription::Texture1D(d) => d.width == 0,
        ResourceDescription::Texture2D(d) => d.width == 0 || d.height == 0,
        ResourceDescription::Texture3D(d) => d.width == 0 || d.height == 0 || d.depth == 0,
    };
    if zero_extent || resolved.array_size() == 0 {
        return Err(DeviceError::InvalidArgument(format!("zero-sized {:?}", resolved.dimension())));
    }
    let largest = extent.width.max(extent.height).max(extent.depth);
    if resolved.dimension() != Dimension::Buffer && resolved.mip_levels() > full_mip_chain_length(largest) {
        return Err(DeviceError::InvalidArgument(format!(
            "{} mip levels requested for an extent of {largest}",
            resolved.mip_levels()
        )));
    }

    let usage = resolved.usage();
    let bind = resolved.bind_flags();
    let cpu = resolved.cpu_access();
    let misc = resolved.misc_flags();
    if usage == Usage::Staging && !bind.is_empty() {
        return Err(DeviceError::InvalidArgument("staging resources cannot be bound".to_string()));
    }
    if cpu.contains(CpuAccessFlags::READ) && usage != Usage::Staging {
        return Err(DeviceError::InvalidArgument(format!("CPU reads require staging usage, not {usage:?}")));
    }
    if cpu.contains(CpuAccessFlags::WRITE) && !matches!(usage, Usage::Dynamic | Usage::Staging) {
        return Err(DeviceError::InvalidArgument(format!("CPU writes are not allowed with {usage:?} usage")));
    }
    if misc.contains(MiscFlags::GENERATE_MIPS)
        && (usage == Usage::Staging || !bind.contains(BindFlags::SHADER_RESOURCE | BindFlags::RENDER_TARGET))
    {
        return Err(DeviceError::InvalidArgument(
            "mip generation requires a bindable shader resource and render target".to_string(),
        ));
    }
    if usage == Usage::Immutable && !has_initial_data {
        return Err(DeviceError::InvalidArgument("immutable resources need initial data".to_string()));
    }

    if let Some(format) = resolved.format() {
        if format.is_block_compressed() || format.is_planar() || format.bytes_per_element().is_none() {
            return Err(DeviceError::Unsupported(format!("{format:?}")));
        }
    }
    if let ResourceDescription::Texture2D(d) = &resolved {
        if d.sample.count > 1 && usage == Usage::Staging {
            return Err(DeviceError::Unsupported("multisampled staging textures".to_string()));
        }
    }
    Ok(resolved)
}

/// Allocates [`SoftResource`]s.
#[derive(Debug, Clone)]
pub struct SoftDevice {
    shared: Arc<Shared>,
}

impl Default for SoftDevice {
    fn default() -> Self {
        SoftDevice::builder().build()
    }
}

impl SoftDevice {
    pub fn builder() -> SoftDeviceBuilder {
        SoftDeviceBuilder::default()
    }

    /// The context for this device.  All contexts of one device are interchangeable.
    pub fn immediate_context(&self) -> SoftContext {
        SoftContext {
            shared: self.shared.clone(),
        }
    }

    /// Resources currently alive.
    pub fn live_resources(&self) -> usize {
        self.shared.live_resources.load(Ordering::SeqCst)
    }

    /// Resources created over the device's lifetime.
    pub fn allocations(&self) -> usize {
        self.shared.allocations.load(Ordering::SeqCst)
    }

    /// Bytes held by live resources.
    pub fn resident_bytes(&self) -> usize {
        self.shared.resident_bytes.load(Ordering::SeqCst)
    }

    fn allocate(&self, description: &ResourceDescription, initial: Option<&[u8]>) -> Result<SoftResource, DeviceError> {
        let resolved = validate(description, initial.is_some())?;
        let layouts = layout(&resolved, self.shared.row_pitch_alignment);
        let size = layouts.last().map(|l| l.offset + l.size()).unwrap_or(0);

        let mut storage = vec![0u8; size];
        if let Some(data) = initial {
            let packed: usize = layouts.iter().map(SubresourceLayout::packed_size).sum();
            if data.len() != packed {
                return Err(DeviceError::InvalidArgument(format!(
                    "initial data is {} bytes but the resource packs to {packed}",
                    data.len()
                )));
            }
            let mut source = data;
            for l in &layouts {
                let (head, rest) = source.split_at(l.packed_size());
                write_packed(&mut storage[l.range()], l, head);
                source = rest;
            }
        }

        let budget = self.shared.memory_budget;
        self.shared
            .resident_bytes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |resident| {
                let next = resident.checked_add(size)?;
                match budget {
                    Some(b) if next > b => None,
                    _ => Some(next),
                }
            })
            .map_err(|_| DeviceError::OutOfMemory)?;
        self.shared.live_resources.fetch_add(1, Ordering::SeqCst);
        self.shared.allocations.fetch_add(1, Ordering::SeqCst);

        let subresources = layouts.len();
        Ok(SoftResource(Arc::new(ResourceInner {
            description: resolved,
            layouts,
            size,
            storage: RwLock::new(storage),
            mapped: Mutex::new(vec![false; subresources]),
            shared: self.shared.clone(),
        })))
    }

    /// Creates a resource initialized from `data`.
    ///
    /// `data` holds every subresource in index order, each packed without row padding.
    pub fn create_resource_with_data(
        &self,
        description: &ResourceDescription,
        data: &[u8],
    ) -> Result<SoftResource, DeviceError> {
        self.allocate(description, Some(data))
    }

    fn create_view(&self, resource: &SoftResource, kind: ViewKind) -> Result<SoftView, DeviceError> {
        if !resource.0.description.bind_flags().contains(kind.bind_flag()) {
            return Err(DeviceError::InvalidArgument(format!(
                "{kind:?} view of a resource without {:?}",
                kind.bind_flag()
            )));
        }
        Ok(SoftView {
            resource: resource.clone(),
            kind,
        })
    }

    pub fn create_shader_resource_view(&self, resource: &SoftResource) -> Result<SoftView, DeviceError> {
        self.create_view(resource, ViewKind::ShaderResource)
    }

    pub fn create_unordered_access_view(&self, resource: &SoftResource) -> Result<SoftView, DeviceError> {
        self.create_view(resource, ViewKind::UnorderedAccess)
    }

    pub fn create_render_target_view(&self, resource: &SoftResource) -> Result<SoftView, DeviceError> {
        self.create_view(resource, ViewKind::RenderTarget)
    }
}

impl Device for SoftDevice {
    type Resource = SoftResource;

    fn create_resource(&self, description: &ResourceDescription) -> Result<SoftResource, DeviceError> {
        self.allocate(description, None)
    }
}

/// Copies packed rows into a padded subresource.
fn write_packed(dst: &mut [u8], layout: &SubresourceLayout, packed: &[u8]) {
    if layout.row_bytes == 0 {
        return;
    }
    for (i, row) in packed.chunks_exact(layout.row_bytes).enumerate() {
        let slice = i / layout.rows;
        let start = slice * layout.depth_pitch + (i % layout.rows) * layout.row_pitch;
        dst[start..start + layout.row_bytes].copy_from_slice(row);
    }
}

struct ResourceInner {
    description: ResourceDescription,
    layouts: Vec<SubresourceLayout>,
    size: usize,
    storage: RwLock<Vec<u8>>,
    mapped: Mutex<Vec<bool>>,
    shared: Arc<Shared>,
}

impl Drop for ResourceInner {
    fn drop(&mut self) {
        self.shared.live_resources.fetch_sub(1, Ordering::SeqCst);
        self.shared.resident_bytes.fetch_sub(self.size, Ordering::SeqCst);
    }
}

/// A buffer or texture held in host memory.
///
/// Clones refer to the same resource.
#[derive(Clone)]
pub struct SoftResource(Arc<ResourceInner>);

impl Debug for SoftResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftResource")
            .field("description", &self.0.description)
            .field("size", &self.0.size)
            .finish()
    }
}

impl PartialEq for SoftResource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SoftResource {}

impl SoftResource {
    pub fn subresource_layout(&self, subresource: u32) -> Option<SubresourceLayout> {
        self.0.layouts.get(subresource as usize).copied()
    }
}

impl Resource for SoftResource {
    fn dimension(&self) -> Dimension {
        self.0.description.dimension()
    }
    fn description(&self) -> ResourceDescription {
        self.0.description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    ShaderResource,
    UnorderedAccess,
    RenderTarget,
}

impl ViewKind {
    fn bind_flag(self) -> BindFlags {
        match self {
            ViewKind::ShaderResource => BindFlags::SHADER_RESOURCE,
            ViewKind::UnorderedAccess => BindFlags::UNORDERED_ACCESS,
            ViewKind::RenderTarget => BindFlags::RENDER_TARGET,
        }
    }
}

/// A view of a [`SoftResource`].
#[derive(Debug, Clone)]
pub struct SoftView {
    resource: SoftResource,
    kind: ViewKind,
}

impl SoftView {
    pub fn kind(&self) -> ViewKind {
        self.kind
    }
}

impl ResourceView for SoftView {
    type Resource = SoftResource;
    fn resource(&self) -> SoftResource {
        self.resource.clone()
    }
}

/// Host-visible bytes of a mapped [`SoftResource`] subresource.
pub struct SoftMapping<'a> {
    storage: RwLockReadGuard<'a, Vec<u8>>,
    range: Range<usize>,
}

impl Deref for SoftMapping<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.storage[self.range.clone()]
    }
}

/// Copies and maps [`SoftResource`]s.
#[derive(Debug, Clone)]
pub struct SoftContext {
    shared: Arc<Shared>,
}

impl SoftContext {
    fn same_device(&self, resource: &SoftResource) -> bool {
        Arc::ptr_eq(&self.shared, &resource.0.shared)
    }

    fn any_mapped(resource: &SoftResource) -> bool {
        resource
            .0
            .mapped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|m| *m)
    }

    /// Overwrites one subresource with packed bytes.
    pub fn update_subresource(&self, resource: &SoftResource, subresource: u32, data: &[u8]) -> Result<(), DeviceError> {
        let inner = &resource.0;
        if inner.description.usage() == Usage::Immutable {
            return Err(DeviceError::InvalidArgument("immutable resources cannot be updated".to_string()));
        }
        let Some(layout) = inner.layouts.get(subresource as usize) else {
            return Err(DeviceError::InvalidArgument(format!(
                "subresource {subresource} of {}",
                inner.layouts.len()
            )));
        };
        if data.len() != layout.packed_size() {
            return Err(DeviceError::InvalidArgument(format!(
                "{} bytes for a subresource of {}",
                data.len(),
                layout.packed_size()
            )));
        }
        if Self::any_mapped(resource) {
            return Err(DeviceError::AlreadyMapped);
        }
        let mut storage = inner.storage.write().unwrap_or_else(PoisonError::into_inner);
        write_packed(&mut storage[layout.range()], layout, data);
        Ok(())
    }
}

impl Context for SoftContext {
    type Resource = SoftResource;
    type Mapping<'a> = SoftMapping<'a>;

    fn copy_resource(&self, destination: &SoftResource, source: &SoftResource) {
        let dst = &destination.0.description;
        let src = &source.0.description;
        if destination == source {
            logwise::error_sync!("copy_resource with the same source and destination");
            return;
        }
        if !self.same_device(destination) || !self.same_device(source) {
            logwise::error_sync!("copy_resource between devices");
            return;
        }
        if dst.dimension() != src.dimension()
            || dst.extent_at(0) != src.extent_at(0)
            || dst.format() != src.format()
            || dst.mip_levels() != src.mip_levels()
            || dst.array_size() != src.array_size()
        {
            logwise::error_sync!(
                "copy_resource between mismatched resources: {dst} from {src}",
                dst = logwise::privacy::LogIt(dst),
                src = logwise::privacy::LogIt(src)
            );
            return;
        }
        if dst.usage() == Usage::Immutable {
            logwise::error_sync!("copy_resource into an immutable resource");
            return;
        }
        if Self::any_mapped(destination) || Self::any_mapped(source) {
            logwise::error_sync!("copy_resource on a mapped resource");
            return;
        }
        let from = source.0.storage.read().unwrap_or_else(PoisonError::into_inner);
        let mut to = destination.0.storage.write().unwrap_or_else(PoisonError::into_inner);
        // Same shape and same device means same layout.
        to.copy_from_slice(&from);
    }

    fn map<'a>(
        &'a self,
        resource: &'a SoftResource,
        subresource: u32,
        intent: MapIntent,
    ) -> Result<MappedSubresource<SoftMapping<'a>>, DeviceError> {
        let inner = &resource.0;
        if intent != MapIntent::Read {
            return Err(DeviceError::Unsupported(format!("{intent:?} mappings")));
        }
        if !inner.description.cpu_access().contains(CpuAccessFlags::READ) {
            return Err(DeviceError::InvalidArgument("resource was not created for CPU reads".to_string()));
        }
        let Some(layout) = inner.layouts.get(subresource as usize).copied() else {
            return Err(DeviceError::InvalidArgument(format!(
                "subresource {subresource} of {}",
                inner.layouts.len()
            )));
        };
        {
            let mut mapped = inner.mapped.lock().unwrap_or_else(PoisonError::into_inner);
            if mapped[subresource as usize] {
                return Err(DeviceError::AlreadyMapped);
            }
            mapped[subresource as usize] = true;
        }
        Ok(MappedSubresource {
            data: SoftMapping {
                storage: inner.storage.read().unwrap_or_else(PoisonError::into_inner),
                range: layout.range(),
            },
            row_pitch: layout.row_pitch,
            depth_pitch: layout.depth_pitch,
        })
    }

    fn unmap(&self, resource: &SoftResource, subresource: u32) {
        let mut mapped = resource.0.mapped.lock().unwrap_or_else(PoisonError::into_inner);
        match mapped.get_mut(subresource as usize) {
            Some(m) if *m => *m = false,
            _ => {
                logwise::error_sync!(
                    "unmap of subresource {subresource} which is not mapped",
                    subresource = subresource
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::Format;
    use crate::resources::{BufferDescription, Texture1DDescription, Texture2DDescription, Texture3DDescription};
    use crate::staging::StagingDescription;

    fn staging_of(d: impl Into<ResourceDescription>) -> ResourceDescription {
        *StagingDescription::derive(&d.into()).description()
    }

    #[test]
    fn creation_rules() {
        let device = SoftDevice::default();
        let invalid = |d: ResourceDescription| matches!(device.create_resource(&d), Err(DeviceError::InvalidArgument(_)));

        assert!(invalid(BufferDescription::new(0).into()));
        assert!(invalid(Texture2DDescription::new(0, 4, Format::R8Unorm).into()));
        assert!(invalid(
            Texture2DDescription {
                array_size: 0,
                ..Texture2DDescription::new(4, 4, Format::R8Unorm)
            }
            .into()
        ));
        assert!(invalid(
            Texture1DDescription {
                mip_levels: 4,
                ..Texture1DDescription::new(4, Format::R8Unorm)
            }
            .into()
        ));
        assert!(invalid(
            BufferDescription {
                usage: Usage::Staging,
                ..BufferDescription::new(16)
            }
            .into()
        ));
        assert!(invalid(
            BufferDescription {
                cpu_access: CpuAccessFlags::READ,
                ..BufferDescription::new(16)
            }
            .into()
        ));
        assert!(invalid(
            Texture2DDescription {
                misc_flags: MiscFlags::GENERATE_MIPS,
                ..Texture2DDescription::new(4, 4, Format::R8G8B8A8Unorm)
            }
            .into()
        ));
        assert!(invalid(
            BufferDescription {
                usage: Usage::Immutable,
                ..BufferDescription::new(16)
            }
            .into()
        ));

        assert!(matches!(
            device.create_resource(&Texture2DDescription::new(4, 4, Format::Bc1Unorm).into()),
            Err(DeviceError::Unsupported(_))
        ));
        assert!(matches!(
            device.create_resource(&staging_of(Texture2DDescription {
                sample: crate::resources::SampleDescription { count: 4, quality: 0 },
                ..Texture2DDescription::new(4, 4, Format::R8Unorm)
            })),
            Err(DeviceError::Unsupported(_))
        ));
        assert_eq!(device.allocations(), 0);
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn mip_generation_is_allowed_on_bindable_targets() {
        let device = SoftDevice::default();
        let d = Texture2DDescription {
            mip_levels: 0,
            bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::RENDER_TARGET,
            misc_flags: MiscFlags::GENERATE_MIPS,
            ..Texture2DDescription::new(8, 8, Format::R8G8B8A8Unorm)
        };
        let texture = device.create_resource(&d.into()).unwrap();
        assert_eq!(texture.description().mip_levels(), 4);
        // Staging drops GENERATE_MIPS, so the staging twin is accepted too.
        device.create_resource(&staging_of(d)).unwrap();
    }

    #[test]
    fn budget_and_counters() {
        let device = SoftDevice::builder().memory_budget(100).build();
        let a = device.create_resource(&BufferDescription::new(64).into()).unwrap();
        assert_eq!(
            device.create_resource(&BufferDescription::new(64).into()).err(),
            Some(DeviceError::OutOfMemory)
        );
        assert_eq!(device.live_resources(), 1);
        assert_eq!(device.resident_bytes(), 64);
        drop(a);
        assert_eq!(device.live_resources(), 0);
        assert_eq!(device.resident_bytes(), 0);
        device.create_resource(&BufferDescription::new(64).into()).unwrap();
        assert_eq!(device.allocations(), 2);
    }

    #[test]
    fn layouts_are_padded() {
        let device = SoftDevice::builder().row_pitch_alignment(256).build();
        let texture = device
            .create_resource(
                &Texture2DDescription {
                    mip_levels: 2,
                    array_size: 2,
                    ..Texture2DDescription::new(10, 4, Format::R8G8B8A8Unorm)
                }
                .into(),
            )
            .unwrap();
        let first = texture.subresource_layout(0).unwrap();
        assert_eq!(first.row_bytes, 40);
        assert_eq!(first.row_pitch, 256);
        assert_eq!(first.depth_pitch, 1024);
        let second = texture.subresource_layout(1).unwrap();
        assert_eq!(second.offset, 1024);
        assert_eq!(second.rows, 2);
        assert_eq!(texture.subresource_layout(2).unwrap().offset, 1024 + 512);
        assert_eq!(texture.subresource_layout(4), None);

        let volume = device
            .create_resource(&Texture3DDescription::new(2, 2, 3, Format::R8Unorm).into())
            .unwrap();
        let l = volume.subresource_layout(0).unwrap();
        assert_eq!((l.row_pitch, l.depth_pitch, l.slices), (256, 512, 3));
    }

    #[test]
    fn map_rules() {
        let device = SoftDevice::default();
        let context = device.immediate_context();
        let live = device
            .create_resource_with_data(&BufferDescription::new(4).into(), &[1, 2, 3, 4])
            .unwrap();
        assert!(matches!(
            context.map(&live, 0, MapIntent::Read),
            Err(DeviceError::InvalidArgument(_))
        ));

        let staging = device.create_resource(&staging_of(BufferDescription::new(4))).unwrap();
        context.copy_resource(&staging, &live);
        assert!(matches!(
            context.map(&staging, 1, MapIntent::Read),
            Err(DeviceError::InvalidArgument(_))
        ));
        {
            let mapped = context.map(&staging, 0, MapIntent::Read).unwrap();
            assert_eq!(&*mapped.data, &[1, 2, 3, 4]);
            assert_eq!(
                context.map(&staging, 0, MapIntent::Read).err(),
                Some(DeviceError::AlreadyMapped)
            );
        }
        context.unmap(&staging, 0);
        let again = context.map(&staging, 0, MapIntent::Read).unwrap();
        drop(again);
        context.unmap(&staging, 0);
    }

    #[test]
    fn views_need_bind_flags() {
        let device = SoftDevice::default();
        let texture = device
            .create_resource(&Texture2DDescription::new(4, 4, Format::R8Unorm).into())
            .unwrap();
        let srv = device.create_shader_resource_view(&texture).unwrap();
        assert_eq!(srv.kind(), ViewKind::ShaderResource);
        assert_eq!(srv.resource(), texture);
        assert!(device.create_unordered_access_view(&texture).is_err());
        assert!(device.create_render_target_view(&texture).is_err());
    }

    #[test]
    fn update_and_initial_data_round_trip_through_padding() {
        let device = SoftDevice::builder().row_pitch_alignment(8).build();
        let context = device.immediate_context();
        let d: ResourceDescription = Texture2DDescription::new(3, 2, Format::R8Unorm).into();
        let texture = device.create_resource_with_data(&d, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert!(device.create_resource_with_data(&d, &[1, 2, 3]).is_err());
        context.update_subresource(&texture, 0, &[6, 5, 4, 3, 2, 1]).unwrap();

        let staging = device.create_resource(&staging_of(d)).unwrap();
        context.copy_resource(&staging, &texture);
        let mapped = context.map(&staging, 0, MapIntent::Read).unwrap();
        assert_eq!(mapped.row_pitch, 8);
        assert_eq!(&mapped.data[0..3], &[6, 5, 4]);
        assert_eq!(&mapped.data[8..11], &[3, 2, 1]);
    }

    #[test]
    fn mismatched_copies_are_ignored() {
        let device = SoftDevice::default();
        let context = device.immediate_context();
        let a = device
            .create_resource_with_data(&BufferDescription::new(4).into(), &[9, 9, 9, 9])
            .unwrap();
        let staging = device.create_resource(&staging_of(BufferDescription::new(8))).unwrap();
        context.copy_resource(&staging, &a);
        let mapped = context.map(&staging, 0, MapIntent::Read).unwrap();
        assert!(mapped.data.iter().all(|b| *b == 0));
    }
}
