//! GPU visibility compactor.
//!
//! Owns the culling compute pipeline and its uniform block. Each frame it
//! clears the visible counter and dispatches `ceil(N / 128)` work-groups;
//! wgpu orders the compute pass before any later pass or copy in the same
//! submission, which is the barrier between the kernel's writes and the
//! indirect draw that consumes them.

use throng_shared::bounds::ObjectBounds;

use super::frustum::FrustumPlanes;
use super::visibility::workgroup_count;
use crate::error::{RenderError, RenderResult};
use crate::instancing::{CullUniforms, InstanceStore, VisibilityBuffers};

/// WGSL source of the culling kernel.
pub const CULLING_SHADER: &str = include_str!("../../shaders/visibility_cull.wgsl");

/// Compiled culling kernel plus its bindings.
pub struct VisibilityCompactor {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    bind_group: Option<(wgpu::BindGroup, (u64, u64))>,
}

impl VisibilityCompactor {
    /// Builds the kernel from the bundled shader.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::KernelBuild`] if compilation or pipeline
    /// creation fails validation.
    pub fn new(device: &wgpu::Device) -> RenderResult<Self> {
        Self::with_source(device, CULLING_SHADER)
    }

    /// Builds the kernel from arbitrary WGSL with a `main` entry point.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::KernelBuild`] if compilation or pipeline
    /// creation fails validation.
    pub fn with_source(device: &wgpu::Device, source: &str) -> RenderResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Visibility Cull Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Visibility Cull Layout"),
            entries: &[
                storage(0, true),
                storage(1, false),
                storage(2, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Visibility Cull Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Visibility Cull Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("culling kernel failed to build: {}", err);
            return Err(RenderError::KernelBuild(err.to_string()));
        }

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cull Uniforms"),
            size: std::mem::size_of::<CullUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::info!("culling kernel ready");

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniforms,
            bind_group: None,
        })
    }

    /// Uploads the six planes.
    pub fn write_frustum(&self, queue: &wgpu::Queue, frustum: &FrustumPlanes) {
        queue.write_buffer(
            &self.uniforms,
            CullUniforms::PLANES_OFFSET,
            bytemuck::cast_slice(&frustum.as_arrays()),
        );
    }

    /// Uploads the object-space box.
    pub fn write_bounds(&self, queue: &wgpu::Queue, bounds: &ObjectBounds) {
        queue.write_buffer(
            &self.uniforms,
            CullUniforms::BOUNDS_OFFSET,
            bytemuck::cast_slice(&CullUniforms::bounds_block(bounds)),
        );
    }

    /// Uploads N, the bound for the out-of-range check.
    pub fn write_instance_count(&self, queue: &wgpu::Queue, instance_count: u32) {
        queue.write_buffer(
            &self.uniforms,
            CullUniforms::PARAMS_OFFSET,
            bytemuck::cast_slice(&CullUniforms::params_block(instance_count)),
        );
    }

    /// Drops the cached bind group, forcing a rebuild on the next `encode`.
    pub fn invalidate_bind_group(&mut self) {
        self.bind_group = None;
    }

    fn ensure_bind_group(
        &mut self,
        device: &wgpu::Device,
        transforms: &wgpu::Buffer,
        key: (u64, u64),
        buffers: &VisibilityBuffers,
    ) {
        let stale = self.bind_group.as_ref().map_or(true, |(_, cached)| *cached != key);
        if stale {
            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Visibility Cull Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: transforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers.visible().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers.counter().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.uniforms.as_entire_binding(),
                    },
                ],
            });
            self.bind_group = Some((group, key));
        }
    }

    /// Encodes counter reset and dispatch. Returns the work-groups dispatched.
    ///
    /// Nothing but the reset is encoded when the store is empty or has not
    /// been committed yet.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        store: &InstanceStore,
        buffers: &VisibilityBuffers,
    ) -> u32 {
        buffers.encode_reset(encoder);

        let workgroups = workgroup_count(store.count_u32());
        let Some(transforms) = store.buffer() else {
            return 0;
        };
        if workgroups == 0 {
            return 0;
        }

        let key = (store.generation(), buffers.generation());
        self.ensure_bind_group(device, transforms, key, buffers);
        let Some((bind_group, _)) = &self.bind_group else {
            return 0;
        };

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Visibility Cull Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups, 1, 1);

        workgroups
    }
}
