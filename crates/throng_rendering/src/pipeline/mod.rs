//! Frame orchestration.
//!
//! ```text
//! frustum refresh -> commit instances -> reset counter -> dispatch ceil(N/128)
//!     -> (pass ordering) -> patch indirect instance count -> indirect draw
//! ```
//!
//! [`CullingPipeline`] owns everything the culling stage writes (visibility
//! list, visible count, indirect command) and is handed the drawable that
//! owns the instances. When culling is off, by choice or because the kernel
//! failed to build, the reset/dispatch/patch steps are skipped and all N
//! instances are drawn directly.

mod frame;
mod stats;

pub use frame::{
    plan_frame, FallbackReason, FrameInputs, FrameMode, FrameOutcome, FramePlan, SkipReason,
};
pub use stats::CullStats;

use throng_shared::bounds::ObjectBounds;
use throng_shared::math::Mat4;

use crate::culling::{ClipDepth, FrustumTracker, FrustumUpdate, VisibilityCompactor};
use crate::error::RenderResult;
use crate::instancing::{IndirectDrawCommand, VisibilityBuffers};
use crate::mesh::{DrawCall, Drawable, InstancedMesh};
use crate::readback::CounterReadback;

/// Runtime knobs of the culling stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullingConfig {
    /// Culling switched on at startup.
    pub enabled: bool,
    /// Read the visible count back every this many frames (0 = never).
    pub readback_interval: u32,
    /// Depth convention of the projection planes are extracted from.
    pub clip_depth: ClipDepth,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            readback_interval: 60,
            clip_depth: ClipDepth::ZeroToOne,
        }
    }
}

/// GPU culling stage for one instanced mesh.
pub struct CullingPipeline {
    config: CullingConfig,
    compactor: Option<VisibilityCompactor>,
    kernel_error: Option<String>,
    frustum: FrustumTracker,
    buffers: VisibilityBuffers,
    command: IndirectDrawCommand,
    uploaded_bounds: Option<ObjectBounds>,
    culling_enabled: bool,
    readback: CounterReadback,
    stats: CullStats,
    frame: u64,
}

impl CullingPipeline {
    /// Builds the stage for `mesh`.
    ///
    /// A kernel build failure is not an error: it is logged and the stage
    /// runs every frame as [`FallbackReason::KernelUnavailable`].
    #[must_use]
    pub fn new(device: &wgpu::Device, mesh: &InstancedMesh, config: CullingConfig) -> Self {
        Self::with_compactor(device, mesh, config, VisibilityCompactor::new(device))
    }

    /// Builds the stage around an already-attempted kernel build.
    #[must_use]
    pub fn with_compactor(
        device: &wgpu::Device,
        mesh: &InstancedMesh,
        config: CullingConfig,
        compactor: RenderResult<VisibilityCompactor>,
    ) -> Self {
        let (compactor, kernel_error) = match compactor {
            Ok(compactor) => (Some(compactor), None),
            Err(err) => {
                tracing::warn!("{}; disabling GPU culling this run", err);
                (None, Some(err.to_string()))
            }
        };

        let mut command = IndirectDrawCommand::new();
        command.initialize(device, mesh.index_count());

        Self {
            config,
            compactor,
            kernel_error,
            frustum: FrustumTracker::new(config.clip_depth),
            buffers: VisibilityBuffers::new(device, mesh.store().staged_len()),
            command,
            uploaded_bounds: None,
            culling_enabled: config.enabled,
            readback: CounterReadback::new(device),
            stats: CullStats::default(),
            frame: 0,
        }
    }

    /// Flips the runtime culling switch. Returns the new state.
    pub fn toggle_culling(&mut self) -> bool {
        self.set_culling_enabled(!self.culling_enabled);
        self.culling_enabled
    }

    /// Sets the runtime culling switch.
    pub fn set_culling_enabled(&mut self, enabled: bool) {
        if enabled != self.culling_enabled {
            tracing::info!("GPU culling {}", if enabled { "enabled" } else { "disabled" });
        }
        self.culling_enabled = enabled;
    }

    /// Runtime culling switch.
    #[must_use]
    pub const fn culling_enabled(&self) -> bool {
        self.culling_enabled
    }

    /// True if the kernel built.
    #[must_use]
    pub const fn kernel_available(&self) -> bool {
        self.compactor.is_some()
    }

    /// Validation message of a failed kernel build.
    #[must_use]
    pub fn kernel_error(&self) -> Option<&str> {
        self.kernel_error.as_deref()
    }

    /// Running statistics.
    #[must_use]
    pub const fn stats(&self) -> &CullStats {
        &self.stats
    }

    /// Visibility list and counter.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityBuffers {
        &self.buffers
    }

    /// Indirect draw command.
    #[must_use]
    pub const fn command(&self) -> &IndirectDrawCommand {
        &self.command
    }

    /// Frustum tracker.
    #[must_use]
    pub const fn frustum(&self) -> &FrustumTracker {
        &self.frustum
    }

    /// Encodes the frame's culling work and prepares `mesh` for drawing.
    ///
    /// Must be called once per frame before the render pass that calls
    /// [`CullingPipeline::render`].
    pub fn encode_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        mesh: &mut InstancedMesh,
        view_projection: &Mat4,
    ) -> FrameOutcome {
        self.frame += 1;

        let frustum = self.frustum.refresh(view_projection);

        self.buffers.ensure_capacity(device, mesh.store().staged_len());
        mesh.prepare(device, queue, &self.buffers);

        let plan = plan_frame(&FrameInputs {
            culling_enabled: self.culling_enabled,
            kernel_available: self.compactor.is_some(),
            resources_ready: mesh.is_ready(),
            instance_count: mesh.store().count_u32(),
            frustum,
        });

        let mut workgroups_dispatched = 0;
        let mut readback_requested = false;

        if let (FrameMode::Culled, Some(compactor)) = (plan.mode, self.compactor.as_mut()) {
            if let Some(planes) = self.frustum.planes() {
                compactor.write_frustum(queue, planes);
            }
            if self.uploaded_bounds.as_ref() != Some(mesh.bounds()) {
                compactor.write_bounds(queue, mesh.bounds());
                self.uploaded_bounds = Some(*mesh.bounds());
            }
            compactor.write_instance_count(queue, plan.instance_count);

            workgroups_dispatched = compactor.encode(device, encoder, mesh.store(), &self.buffers);
            self.command.encode_patch_from_counter(encoder, self.buffers.counter());

            let interval = u64::from(self.config.readback_interval);
            if interval > 0 && self.frame % interval == 0 {
                readback_requested = self.readback.encode_copy(encoder, self.buffers.counter());
            }
        }

        let outcome = FrameOutcome {
            frame: self.frame,
            plan,
            workgroups_dispatched,
            readback_requested,
        };
        self.stats.record(&outcome);

        if frustum == FrustumUpdate::Reused {
            tracing::debug!("frame {}: reusing previous frustum", self.frame);
        }
        outcome
    }

    /// Records the draw chosen by `outcome`. Returns `false` if nothing was drawn.
    pub fn render<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        mesh: &'a InstancedMesh,
        outcome: &FrameOutcome,
    ) -> bool {
        let call = match outcome.plan.mode {
            FrameMode::Culled => match self.command.buffer() {
                Some(command) => DrawCall::Indirect { command },
                None => return false,
            },
            FrameMode::Unculled(_) => DrawCall::Direct {
                instance_count: outcome.plan.instance_count,
            },
            FrameMode::Skipped(_) => return false,
        };
        mesh.render(pass, call)
    }

    /// Call after the frame's command buffer is submitted.
    ///
    /// Starts any pending counter read-back and collects a finished one.
    pub fn after_submit(&mut self, device: &wgpu::Device) -> Option<u32> {
        self.readback.begin();
        let visible = self.readback.poll(device)?;
        self.stats.last_visible = Some(visible);
        Some(visible)
    }
}
