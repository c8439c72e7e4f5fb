// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
#![cfg(feature = "backend_wgpu")]
//! Readback on a real adapter.  Skips when the machine has none.

use gpu_readback::backends::wgpu::{WgpuContext, WgpuDevice, WgpuOptions};
use gpu_readback::device::{Device, Resource};
use gpu_readback::pixel_formats::{Format, Unorm4};
use gpu_readback::readback::ReadbackEngine;
use gpu_readback::resources::{
    BindFlags, BufferDescription, Dimension, SampleDescription, SubresourceAddress, Texture2DDescription,
};
use gpu_readback::{DeviceError, ErrorKind};
use std::sync::Arc;

fn engine() -> Option<ReadbackEngine<WgpuDevice, WgpuContext>> {
    match WgpuDevice::headless(WgpuOptions::default()) {
        Ok(device) => {
            let context = device.immediate_context();
            Some(ReadbackEngine::new(Arc::new(device), Arc::new(context)))
        }
        Err(e) => {
            println!("skipping: {e}");
            None
        }
    }
}

#[test]
fn texture_with_unaligned_rows() {
    let Some(engine) = engine() else { return };
    // 100 * 4 bytes is not a multiple of 256, so the staging rows are padded.
    let texture = engine
        .device()
        .create_resource(&Texture2DDescription::new(100, 3, Format::R8G8B8A8Unorm).into())
        .expect("texture");
    assert_eq!(texture.dimension(), Dimension::Texture2D);
    let bytes: Vec<u8> = (0..100 * 3 * 4).map(|i| (i % 251) as u8).collect();
    engine.context().update_subresource(&texture, 0, &bytes).expect("upload");

    let pixels: Vec<Unorm4> = engine.read(&texture, SubresourceAddress::default());
    assert_eq!(pixels.len(), 300);
    assert_eq!(bytemuck::cast_slice::<Unorm4, u8>(&pixels), bytes.as_slice());
}

#[test]
fn buffer_round_trip() {
    let Some(engine) = engine() else { return };
    let buffer = engine
        .device()
        .create_resource(&BufferDescription::new(1024).into())
        .expect("buffer");
    let words: Vec<u32> = (0..256).collect();
    engine
        .context()
        .update_subresource(&buffer, 0, bytemuck::cast_slice(&words))
        .expect("upload");
    let read: Vec<u32> = engine.read(&buffer, SubresourceAddress::new(4, 4));
    assert_eq!(read, words);
}

#[test]
fn view_reads_like_texture() {
    let Some(engine) = engine() else { return };
    let texture = engine
        .device()
        .create_resource(&Texture2DDescription::new(8, 8, Format::R32Float).into())
        .expect("texture");
    let values: Vec<f32> = (0..64).map(|i| i as f32).collect();
    engine
        .context()
        .update_subresource(&texture, 0, bytemuck::cast_slice(&values))
        .expect("upload");
    let view = engine.device().create_texture_view(&texture).expect("view");
    let through_view: Vec<f32> = engine.read_view(&view, SubresourceAddress::default());
    assert_eq!(through_view, values);
}

#[test]
fn missing_mip_fails_to_map() {
    let Some(engine) = engine() else { return };
    let texture = engine
        .device()
        .create_resource(&Texture2DDescription::new(8, 8, Format::R8G8B8A8Unorm).into())
        .expect("texture");
    let err = engine
        .read_into(&texture, &mut Vec::<Unorm4>::new(), SubresourceAddress::mip(3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Mapping);
}

#[test]
fn buffer_width_is_the_requested_width() {
    let Some(engine) = engine() else { return };
    // The wgpu buffer is padded to 12 bytes; reads still see 10 and truncate to 2 words.
    let buffer = engine
        .device()
        .create_resource(&BufferDescription::new(10).into())
        .expect("buffer");
    assert_eq!(buffer.description().extent_at(0).width, 10);
    let words: Vec<u32> = engine.read(&buffer, SubresourceAddress::default());
    assert_eq!(words, vec![0, 0]);
}

#[test]
fn multisampled_texture_is_refused_at_staging() {
    let Some(engine) = engine() else { return };
    let texture = engine
        .device()
        .create_resource(
            &Texture2DDescription {
                sample: SampleDescription { count: 4, quality: 0 },
                bind_flags: BindFlags::RENDER_TARGET,
                ..Texture2DDescription::new(8, 8, Format::R8G8B8A8Unorm)
            }
            .into(),
        )
        .expect("multisampled texture");
    let mut out = vec![Unorm4::new(1, 2, 3, 4)];
    let err = engine
        .read_into(&texture, &mut out, SubresourceAddress::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Allocation);
    assert!(matches!(err.device_error(), Some(DeviceError::Unsupported(_))));
    assert_eq!(out, vec![Unorm4::new(1, 2, 3, 4)]);
}
