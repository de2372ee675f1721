/*
MIT License

Copyright (c) 2025 debye-rs developers
*/

//! wgpu f64 compute backend
//!
//! One [`GpuPool`] owns every usable adapter. Adapters without the
//! `SHADER_F64` feature are skipped at enumeration; the Debye kernels
//! are double precision throughout and have no f32 fallback.
//!
//! Work is split across devices by flat pair range. Each device gets
//! its submission first and is only then asked for its results, so
//! multi-device runs overlap execution instead of serializing on the
//! readback of the first device.

use std::sync::mpsc;

use log::{debug, info};
use ndarray::{Array1, Array3};
use wgpu::util::DeviceExt;

use super::errors::{BackendError, Result};
use super::{shaders, DebyeJob, DebyeKernels};
use crate::atoms::Vector3D;
use crate::kernels::pairs::{self, PairChunk};
use crate::scattering::ScatterTable;

const WORKGROUP: u32 = 8;

/// Pairs walked serially by one F(Q) slice thread
const PAIRS_PER_SLICE: usize = 256;

/// Upper bound on slice threads per dispatch
const MAX_SLICES: usize = 32768;

/// Slice-thread count for a pair range
fn slices_for(pair_len: usize) -> usize {
    pair_len.div_ceil(PAIRS_PER_SLICE).clamp(1, MAX_SLICES)
}

/// Interleave vectors into the x0 y0 z0 x1 y1 z1 ... buffer layout
fn flatten(points: &[Vector3D]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y, p.z]).collect()
}

fn table_values(table: &ScatterTable) -> Vec<f64> {
    table.values().iter().copied().collect()
}

/// One wgpu device with `SHADER_F64` enabled
pub struct GpuDevice {
    name: String,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuDevice {
    fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    /// Open every adapter that supports f64 shaders, in enumeration order
    pub fn enumerate() -> Result<Vec<GpuDevice>> {
        let instance = Self::create_instance();
        let mut devices = Vec::new();
        for adapter in instance.enumerate_adapters(wgpu::Backends::all()) {
            if !adapter.features().contains(wgpu::Features::SHADER_F64) {
                debug!(
                    "skipping adapter without SHADER_F64: {}",
                    adapter.get_info().name
                );
                continue;
            }
            devices.push(Self::from_adapter(adapter)?);
        }
        if devices.is_empty() {
            return Err(BackendError::NoAdapter);
        }
        Ok(devices)
    }

    fn from_adapter(adapter: wgpu::Adapter) -> Result<GpuDevice> {
        let info = adapter.get_info();
        let adapter_limits = adapter.limits();
        // Large gradient tensors need more than the default 128 MiB
        // binding limit; take whatever the adapter actually offers.
        let required_limits = wgpu::Limits {
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            max_buffer_size: adapter_limits.max_buffer_size,
            ..wgpu::Limits::default()
        };
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("debye f64 device"),
                required_features: wgpu::Features::SHADER_F64,
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| BackendError::DeviceCreation(e.to_string()))?;
        info!("GPU device ready: {}", info.name);
        Ok(GpuDevice {
            name: info.name,
            device,
            queue,
        })
    }

    /// Adapter name as reported by the driver
    pub fn name(&self) -> &str {
        &self.name
    }

    fn create_pipeline(&self, source: &str, label: &str) -> wgpu::ComputePipeline {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        self.device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
    }

    fn f64_buffer(&self, data: &[f64], label: &str) -> wgpu::Buffer {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: &bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            })
    }

    fn output_buffer(&self, count: usize, label: &str) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (count * 8) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn bind_group(
        &self,
        pipeline: &wgpu::ComputePipeline,
        buffers: &[&wgpu::Buffer],
    ) -> wgpu::BindGroup {
        let layout = pipeline.get_bind_group_layout(0);
        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(i, buf)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: buf.as_entire_binding(),
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debye bind group"),
            layout: &layout,
            entries: &entries,
        })
    }

    /// Encode one dispatch plus the copy into a fresh staging buffer
    /// and submit it; the caller maps the staging buffer later.
    fn submit(
        &self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        x: u32,
        y: u32,
        output: &wgpu::Buffer,
        count: usize,
    ) -> wgpu::Buffer {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size: (count * 8) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("debye compute"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("debye pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(x, y, 1);
        }
        encoder.copy_buffer_to_buffer(output, 0, &staging, 0, (count * 8) as u64);
        self.queue.submit(std::iter::once(encoder.finish()));
        staging
    }

    fn read_staging(&self, staging: &wgpu::Buffer, count: usize) -> Result<Vec<f64>> {
        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| BackendError::Readback("map callback channel closed".into()))?
            .map_err(|e| BackendError::Readback(e.to_string()))?;
        let data = slice.get_mapped_range();
        let result: Vec<f64> = data
            .chunks_exact(8)
            .map(|chunk| {
                let bytes: [u8; 8] = chunk
                    .try_into()
                    .expect("chunks_exact(8) yields 8-byte slices");
                f64::from_le_bytes(bytes)
            })
            .collect();
        drop(data);
        staging.unmap();
        debug_assert_eq!(result.len(), count);
        Ok(result)
    }
}

/// One device with its four compiled Debye pipelines
struct GpuContext {
    device: GpuDevice,
    fq: wgpu::ComputePipeline,
    fq_adp: wgpu::ComputePipeline,
    grad: wgpu::ComputePipeline,
    grad_adp: wgpu::ComputePipeline,
}

impl GpuContext {
    fn new(device: GpuDevice) -> Self {
        let fq = device.create_pipeline(&shaders::with_math_f64(shaders::SHADER_FQ), "debye_fq");
        let fq_adp = device.create_pipeline(
            &shaders::with_math_f64(shaders::SHADER_FQ_ADP),
            "debye_fq_adp",
        );
        let grad =
            device.create_pipeline(&shaders::with_math_f64(shaders::SHADER_GRAD), "debye_grad");
        let grad_adp = device.create_pipeline(
            &shaders::with_math_f64(shaders::SHADER_GRAD_ADP),
            "debye_grad_adp",
        );
        GpuContext {
            device,
            fq,
            fq_adp,
            grad,
            grad_adp,
        }
    }

    /// Dispatch the F(Q) kernel for one pair range; returns the staging
    /// buffer and its element count.
    fn submit_fq(&self, job: &DebyeJob<'_>, chunk: PairChunk) -> (wgpu::Buffer, usize) {
        let n = job.positions.len();
        let bins = job.qgrid.bins();
        let slices = slices_for(chunk.len);
        let per_slice = chunk.len.div_ceil(slices);
        let params = [
            n as f64,
            bins as f64,
            job.qgrid.qbin,
            chunk.offset as f64,
            chunk.len as f64,
            slices as f64,
            per_slice as f64,
            0.0,
        ];
        let dev = &self.device;
        let positions = dev.f64_buffer(&flatten(job.positions), "positions");
        let scatter = dev.f64_buffer(&table_values(job.table), "scatter");
        let params_buf = dev.f64_buffer(&params, "fq_params");
        let out = dev.output_buffer(slices * bins, "fq_partials");
        let (pipeline, bind) = match job.adps {
            Some(adps) => {
                let adps_buf = dev.f64_buffer(&flatten(adps), "adps");
                let bind = dev.bind_group(
                    &self.fq_adp,
                    &[&positions, &scatter, &adps_buf, &params_buf, &out],
                );
                (&self.fq_adp, bind)
            }
            None => {
                let bind = dev.bind_group(&self.fq, &[&positions, &scatter, &params_buf, &out]);
                (&self.fq, bind)
            }
        };
        let x = (slices as u32).div_ceil(WORKGROUP);
        let y = (bins as u32).div_ceil(WORKGROUP);
        let staging = dev.submit(pipeline, &bind, x, y, &out, slices * bins);
        (staging, slices * bins)
    }

    /// Dispatch the gradient kernel for one pair range
    fn submit_gradient(&self, job: &DebyeJob<'_>, chunk: PairChunk) -> (wgpu::Buffer, usize) {
        let n = job.positions.len();
        let bins = job.qgrid.bins();
        let params = [
            n as f64,
            bins as f64,
            job.qgrid.qbin,
            chunk.offset as f64,
            chunk.len as f64,
            0.0,
            0.0,
            0.0,
        ];
        let dev = &self.device;
        let positions = dev.f64_buffer(&flatten(job.positions), "positions");
        let scatter = dev.f64_buffer(&table_values(job.table), "scatter");
        let params_buf = dev.f64_buffer(&params, "grad_params");
        let out = dev.output_buffer(n * 3 * bins, "grad_partials");
        let (pipeline, bind) = match job.adps {
            Some(adps) => {
                let adps_buf = dev.f64_buffer(&flatten(adps), "adps");
                let bind = dev.bind_group(
                    &self.grad_adp,
                    &[&positions, &scatter, &adps_buf, &params_buf, &out],
                );
                (&self.grad_adp, bind)
            }
            None => {
                let bind = dev.bind_group(&self.grad, &[&positions, &scatter, &params_buf, &out]);
                (&self.grad, bind)
            }
        };
        let x = (n as u32).div_ceil(WORKGROUP);
        let y = (bins as u32).div_ceil(WORKGROUP);
        let staging = dev.submit(pipeline, &bind, x, y, &out, n * 3 * bins);
        (staging, n * 3 * bins)
    }
}

/// All f64-capable devices, ready to split one job by pair range
pub struct GpuPool {
    contexts: Vec<GpuContext>,
}

impl GpuPool {
    /// Open the pool; `multi` keeps every device, otherwise only the
    /// first enumerated one.
    pub fn new(multi: bool) -> Result<Self> {
        let mut devices = GpuDevice::enumerate()?;
        if !multi {
            devices.truncate(1);
        }
        info!(
            "GPU pool: {}",
            devices
                .iter()
                .map(GpuDevice::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(GpuPool {
            contexts: devices.into_iter().map(GpuContext::new).collect(),
        })
    }

    /// Number of devices in the pool
    pub fn device_count(&self) -> usize {
        self.contexts.len()
    }
}

impl DebyeKernels for GpuPool {
    fn label(&self) -> &'static str {
        "gpu"
    }

    fn fq_raw(&self, job: &DebyeJob<'_>) -> Result<Array1<f64>> {
        let bins = job.qgrid.bins();
        let total = pairs::pair_count(job.positions.len());
        let chunks = pairs::partition_even(total, self.contexts.len());

        let mut pending = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let (staging, count) = self.contexts[idx].submit_fq(job, *chunk);
            pending.push((idx, staging, count));
        }

        let mut fq = Array1::zeros(bins);
        for (idx, staging, count) in &pending {
            let partials = self.contexts[*idx].device.read_staging(staging, *count)?;
            for slice_row in partials.chunks_exact(bins) {
                for (q, v) in slice_row.iter().enumerate() {
                    fq[q] += v;
                }
            }
        }
        Ok(fq)
    }

    fn gradient_raw(&self, job: &DebyeJob<'_>) -> Result<Array3<f64>> {
        let n = job.positions.len();
        let bins = job.qgrid.bins();
        let total = pairs::pair_count(n);
        let chunks = pairs::partition_even(total, self.contexts.len());

        let mut pending = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            let (staging, count) = self.contexts[idx].submit_gradient(job, *chunk);
            pending.push((idx, staging, count));
        }

        let mut grad = Array3::zeros((n, 3, bins));
        for (idx, staging, count) in &pending {
            let partial = self.contexts[*idx].device.read_staging(staging, *count)?;
            for (g, v) in grad.iter_mut().zip(partial) {
                *g += v;
            }
        }
        Ok(grad)
    }
}
