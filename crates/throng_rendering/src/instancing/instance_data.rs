//! GPU-visible data layouts.
//!
//! Every struct here is `#[repr(C)]` + `Pod` and mirrors a WGSL struct in
//! `shaders/`. Sizes are pinned by the tests at the bottom.

use bytemuck::{Pod, Zeroable};
use throng_shared::bounds::ObjectBounds;
use throng_shared::constants::PLANE_COUNT;
use throng_shared::math::{Mat4, IDENTITY};

use crate::culling::FrustumPlanes;

/// One instance's world transform (64 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    /// Column-major model matrix.
    pub model: Mat4,
}

impl InstanceTransform {
    /// Wraps a model matrix.
    #[must_use]
    pub const fn new(model: Mat4) -> Self {
        Self { model }
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::new(IDENTITY)
    }
}

impl From<Mat4> for InstanceTransform {
    fn from(model: Mat4) -> Self {
        Self::new(model)
    }
}

/// `DrawIndexedIndirect` arguments as consumed by the GPU (20 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Indices per instance.
    pub index_count: u32,
    /// Number of instances to draw (patched every frame).
    pub instance_count: u32,
    /// First index.
    pub first_index: u32,
    /// Base vertex.
    pub base_vertex: i32,
    /// First instance.
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// Byte offset of `instance_count` inside the record.
    pub const INSTANCE_COUNT_OFFSET: u64 = 4;
    /// Size of the record in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Uniform block read by the culling kernel (144 bytes).
///
/// Layout: planes at 0, bounds at 96, params at 128.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CullUniforms {
    /// Left, right, bottom, top, near, far as (a, b, c, d).
    pub planes: [[f32; 4]; PLANE_COUNT],
    /// Object-space box center (w unused).
    pub bounds_center: [f32; 4],
    /// Object-space box half-extents (w unused).
    pub bounds_half_extents: [f32; 4],
    /// Number of valid entries in the transform array.
    pub instance_count: u32,
    /// Padding to 16 bytes.
    pub _pad: [u32; 3],
}

impl CullUniforms {
    /// Byte offset of the plane block.
    pub const PLANES_OFFSET: u64 = 0;
    /// Byte offset of the bounds block.
    pub const BOUNDS_OFFSET: u64 = 96;
    /// Byte offset of the params block.
    pub const PARAMS_OFFSET: u64 = 128;

    /// Bounds block as uploaded at [`Self::BOUNDS_OFFSET`].
    #[must_use]
    pub fn bounds_block(bounds: &ObjectBounds) -> [[f32; 4]; 2] {
        let c = bounds.center();
        let h = bounds.half_extents();
        [[c[0], c[1], c[2], 0.0], [h[0], h[1], h[2], 0.0]]
    }

    /// Params block as uploaded at [`Self::PARAMS_OFFSET`].
    #[must_use]
    pub const fn params_block(instance_count: u32) -> [u32; 4] {
        [instance_count, 0, 0, 0]
    }

    /// Builds the full block.
    #[must_use]
    pub fn new(frustum: &FrustumPlanes, bounds: &ObjectBounds, instance_count: u32) -> Self {
        let [bounds_center, bounds_half_extents] = Self::bounds_block(bounds);
        Self {
            planes: frustum.as_arrays(),
            bounds_center,
            bounds_half_extents,
            instance_count,
            _pad: [0; 3],
        }
    }
}

/// Camera block for the mesh shader (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// Projection * view.
    pub view_proj: Mat4,
    /// Direction towards the light (w unused).
    pub light_dir: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: IDENTITY,
            light_dir: [0.3, 0.8, 0.5, 0.0],
        }
    }
}

/// Mesh vertex (24 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
}

impl Vertex {
    /// Vertex attributes: position @0, normal @1.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<InstanceTransform>(), 64);
        assert_eq!(std::mem::size_of::<DrawIndexedIndirectArgs>(), 20);
        assert_eq!(std::mem::size_of::<CullUniforms>(), 144);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn test_cull_uniform_offsets() {
        let u = CullUniforms::new(
            &FrustumPlanes::default(),
            &ObjectBounds::new([0.0; 3], [2.0, 4.0, 6.0]),
            77,
        );
        let bytes: &[u8] = bytemuck::bytes_of(&u);

        let bounds: &[f32] =
            bytemuck::cast_slice(&bytes[CullUniforms::BOUNDS_OFFSET as usize..CullUniforms::PARAMS_OFFSET as usize]);
        assert_eq!(bounds, &[1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0]);

        let params: &[u32] = bytemuck::cast_slice(&bytes[CullUniforms::PARAMS_OFFSET as usize..]);
        assert_eq!(params[0], 77);
    }

    #[test]
    fn test_instance_count_offset() {
        let args = DrawIndexedIndirectArgs { instance_count: 9, ..Default::default() };
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&args));
        assert_eq!(words[(DrawIndexedIndirectArgs::INSTANCE_COUNT_OFFSET / 4) as usize], 9);
    }
}
