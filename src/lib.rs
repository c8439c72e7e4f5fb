// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! gpu_readback copies GPU buffers and textures back into host memory, one subresource at a time.

Reading GPU memory from the CPU is a small dance on immediate-mode APIs:

1. Describe a staging twin of the resource: same shape, CPU readable, never bound.
2. Allocate it.
3. Copy the whole resource into it.
4. Map the subresource you want.
5. Copy the mapped bytes out, minding row and slice pitches.
6. Unmap and release.

[`readback::ReadbackEngine`] does all of this synchronously, into a `Vec` of any
[`bytemuck::Pod`] element type whose width matches the texture format.

```
use std::sync::Arc;
use gpu_readback::backends::soft::SoftDevice;
use gpu_readback::device::Device;
use gpu_readback::readback::ReadbackEngine;
use gpu_readback::resources::{BufferDescription, SubresourceAddress};

let device = SoftDevice::default();
let context = device.immediate_context();
let bytes: Vec<u8> = (0..16).collect();
let buffer = device
    .create_resource_with_data(&BufferDescription::new(16).into(), &bytes)
    .unwrap();
let engine = ReadbackEngine::new(Arc::new(device), Arc::new(context));
let words: Vec<u32> = engine.read(&buffer, SubresourceAddress::default());
assert_eq!(words.len(), 4);
```

# Element types

For textures, `size_of::<T>() * 8` must equal [`pixel_formats::bits_per_pixel`] of the format.
Block compressed and planar formats have no per-element width and cannot be read.  Buffers
accept any element type and truncate a trailing partial element.

[`pixel_formats`] provides element types for the common color formats, and `half::f16` is
re-exported there as [`pixel_formats::f16`] for half-float formats.

# Backends

The engine is generic over the [`device::Device`] and [`device::Context`] traits.

* [`backends::soft`] keeps resources in host memory.  It is always available and is what the
  tests run against.
* `backends::wgpu` (feature `backend_wgpu`) runs on a real adapter through [wgpu](https://wgpu.rs).

# Threading

Everything blocks.  The engine holds no locks of its own; how many threads may share one context
is up to the backend.
*/

pub mod backends;
pub mod device;
mod error;
pub mod pixel_formats;
pub mod readback;
pub mod resources;
pub mod staging;

pub use bytemuck;
pub use error::{DeviceError, ErrorKind, ReadbackError};
