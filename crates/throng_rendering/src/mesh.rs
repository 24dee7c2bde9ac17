//! Instanced mesh drawable.
//!
//! One mesh type replicated N times. The mesh owns its geometry, the
//! instance store and two render pipelines: `vs_culled` reads the instance
//! index through the compacted visibility list (indirect draw), `vs_all`
//! draws every instance in order (direct draw).

use throng_shared::bounds::ObjectBounds;
use throng_shared::math::Mat4;
use wgpu::util::DeviceExt;

use crate::error::RenderResult;
use crate::instancing::{CameraUniform, InstanceStore, Vertex, VisibilityBuffers};

/// WGSL source of the mesh shader.
pub const MESH_SHADER: &str = include_str!("../shaders/instanced_mesh.wgsl");

/// CPU-side mesh as handed over by a loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Object-space bounds, accumulated while the vertices were read.
    pub bounds: ObjectBounds,
}

impl MeshData {
    /// Number of indices, as the draw command needs it.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        u32::try_from(self.indices.len()).unwrap_or(u32::MAX)
    }

    /// True if the mesh has at least one triangle.
    #[must_use]
    pub fn has_triangles(&self) -> bool {
        self.indices.len() >= 3 && !self.vertices.is_empty()
    }

    /// Unit cube centred on the origin (24 vertices, 36 indices).
    #[must_use]
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        let mut bounds = ObjectBounds::EMPTY;

        for (normal, u, v) in FACES {
            let base = u32::try_from(vertices.len()).unwrap_or(0);
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = [
                    0.5 * (normal[0] + su * u[0] + sv * v[0]),
                    0.5 * (normal[1] + su * u[1] + sv * v[1]),
                    0.5 * (normal[2] + su * u[2] + sv * v[2]),
                ];
                bounds.extend(position);
                vertices.push(Vertex { position, normal });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices, bounds }
    }
}

/// How the mesh should be drawn this frame.
#[derive(Debug, Clone, Copy)]
pub enum DrawCall<'a> {
    /// Indirect draw through the visibility list.
    Indirect {
        /// `DrawIndexedIndirect` record patched this frame.
        command: &'a wgpu::Buffer,
    },
    /// Direct draw of the first `instance_count` instances, unculled.
    Direct {
        /// Instances to draw.
        instance_count: u32,
    },
}

/// Capability interface of anything the frame loop can draw.
pub trait Drawable {
    /// Uploads the camera block.
    fn bind_camera(&mut self, queue: &wgpu::Queue, camera: &CameraUniform);

    /// Stages a new instance array, committed on the next `prepare`.
    ///
    /// # Errors
    ///
    /// Fails if the array exceeds the instance capacity.
    fn set_instance_transforms(&mut self, transforms: &[Mat4]) -> RenderResult<()>;

    /// Commits staged instances and refreshes bindings. Call once per frame
    /// before any culling work is encoded.
    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, visibility: &VisibilityBuffers);

    /// Records the draw. Returns `false` (drawing nothing) while resources
    /// are not ready.
    fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, call: DrawCall<'a>) -> bool;
}

/// GPU side of one instanced mesh.
pub struct InstancedMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bounds: ObjectBounds,
    camera_buffer: wgpu::Buffer,
    store: InstanceStore,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<(wgpu::BindGroup, (u64, u64))>,
    culled_pipeline: wgpu::RenderPipeline,
    all_pipeline: wgpu::RenderPipeline,
}

impl InstancedMesh {
    /// Uploads geometry and builds both render pipelines.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        mesh: &MeshData,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform"),
            contents: bytemuck::bytes_of(&CameraUniform::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let storage = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Instanced Mesh Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1),
                storage(2),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Instanced Mesh Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Instanced Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
        });

        let build = |label: &str, entry_point: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point,
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        let culled_pipeline = build("Instanced Mesh (culled)", "vs_culled");
        let all_pipeline = build("Instanced Mesh (all)", "vs_all");

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            bounds: mesh.bounds,
            camera_buffer,
            store: InstanceStore::new(),
            bind_group_layout,
            bind_group: None,
            culled_pipeline,
            all_pipeline,
        }
    }

    /// Indices per instance.
    #[must_use]
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Object-space bounds shared by every instance.
    #[must_use]
    pub const fn bounds(&self) -> &ObjectBounds {
        &self.bounds
    }

    /// Instance store.
    #[must_use]
    pub const fn store(&self) -> &InstanceStore {
        &self.store
    }

    /// True once instances are committed and bindings exist.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store.is_ready() && self.bind_group.is_some()
    }
}

impl Drawable for InstancedMesh {
    fn bind_camera(&mut self, queue: &wgpu::Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    fn set_instance_transforms(&mut self, transforms: &[Mat4]) -> RenderResult<()> {
        self.store.stage(transforms)
    }

    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, visibility: &VisibilityBuffers) {
        self.store.commit(device, queue);

        let Some(transforms) = self.store.buffer() else {
            return;
        };
        let key = (self.store.generation(), visibility.generation());
        if self.bind_group.as_ref().is_some_and(|(_, cached)| *cached == key) {
            return;
        }

        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Instanced Mesh Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: transforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: visibility.visible().as_entire_binding(),
                },
            ],
        });
        self.bind_group = Some((group, key));
    }

    fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, call: DrawCall<'a>) -> bool {
        let Some((bind_group, _)) = &self.bind_group else {
            tracing::debug!("draw skipped: instances not ready");
            return false;
        };
        if !self.store.is_ready() || self.index_count == 0 {
            return false;
        }

        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        match call {
            DrawCall::Indirect { command } => {
                pass.set_pipeline(&self.culled_pipeline);
                pass.draw_indexed_indirect(command, 0);
            }
            DrawCall::Direct { instance_count } => {
                pass.set_pipeline(&self.all_pipeline);
                pass.draw_indexed(0..self.index_count, 0, 0..instance_count);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_geometry() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.has_triangles());
        assert_eq!(cube.bounds, ObjectBounds::UNIT);
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = MeshData::cube();
        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| cube.vertices[i as usize].position);
            let e1 = throng_shared::math::sub(b, a);
            let e2 = throng_shared::math::sub(c, a);
            let n = throng_shared::math::cross(e1, e2);
            let expected = cube.vertices[tri[0] as usize].normal;
            assert!(throng_shared::math::dot(n, expected) > 0.0);
        }
    }

    #[test]
    fn test_empty_mesh_has_no_triangles() {
        assert!(!MeshData::default().has_triangles());
    }
}
