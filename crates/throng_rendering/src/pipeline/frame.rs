//! Per-frame decision of what the culling pipeline does.

use std::fmt;

use crate::culling::{workgroup_count, FrustumUpdate};

/// Why a frame drew every instance without culling.
///
/// Both reasons lead to the same direct draw; they are kept apart so that
/// telemetry can tell a user choice from a broken kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// Culling switched off at runtime.
    UserDisabled,
    /// The culling kernel failed to build at startup.
    KernelUnavailable,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserDisabled => f.write_str("culling disabled"),
            Self::KernelUnavailable => f.write_str("culling kernel unavailable"),
        }
    }
}

/// Why a frame drew nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Instances or bounds are not on the device yet.
    ResourcesNotReady,
    /// No valid frustum has been extracted yet.
    CameraNotReady,
}

/// What a frame does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Reset, dispatch, patch, indirect draw.
    Culled,
    /// Direct draw of all N instances.
    Unculled(FallbackReason),
    /// No draw this frame.
    Skipped(SkipReason),
}

impl FrameMode {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Culled => "culled",
            Self::Unculled(FallbackReason::UserDisabled) => "unculled (user)",
            Self::Unculled(FallbackReason::KernelUnavailable) => "unculled (kernel)",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Inputs to [`plan_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInputs {
    /// Runtime culling switch.
    pub culling_enabled: bool,
    /// True if the kernel built.
    pub kernel_available: bool,
    /// True if the drawable's instances and bindings are on the device.
    pub resources_ready: bool,
    /// Committed instance count N.
    pub instance_count: u32,
    /// Result of this frame's frustum refresh.
    pub frustum: FrustumUpdate,
}

/// The steps a frame will encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Chosen mode.
    pub mode: FrameMode,
    /// Committed instance count N.
    pub instance_count: u32,
    /// Work-groups to dispatch (0 skips the dispatch).
    pub workgroups: u32,
}

impl FramePlan {
    /// True if the visible counter is reset this frame.
    #[must_use]
    pub const fn resets_counter(&self) -> bool {
        matches!(self.mode, FrameMode::Culled)
    }

    /// True if the kernel is dispatched this frame.
    #[must_use]
    pub const fn dispatches(&self) -> bool {
        self.resets_counter() && self.workgroups > 0
    }

    /// True if the indirect command's instance count is patched this frame.
    #[must_use]
    pub const fn patches_command(&self) -> bool {
        self.resets_counter()
    }

    /// Instances a direct draw covers, if this frame draws directly.
    #[must_use]
    pub const fn direct_instances(&self) -> Option<u32> {
        match self.mode {
            FrameMode::Unculled(_) => Some(self.instance_count),
            _ => None,
        }
    }
}

/// Decides the frame's steps. Pure.
///
/// Order of precedence: resources not ready, user disabled, kernel
/// unavailable, camera not ready, culled.
#[must_use]
pub fn plan_frame(inputs: &FrameInputs) -> FramePlan {
    let mode = if !inputs.resources_ready {
        FrameMode::Skipped(SkipReason::ResourcesNotReady)
    } else if !inputs.culling_enabled {
        FrameMode::Unculled(FallbackReason::UserDisabled)
    } else if !inputs.kernel_available {
        FrameMode::Unculled(FallbackReason::KernelUnavailable)
    } else if inputs.frustum == FrustumUpdate::Uninitialized {
        FrameMode::Skipped(SkipReason::CameraNotReady)
    } else {
        FrameMode::Culled
    };

    let workgroups = if mode == FrameMode::Culled {
        workgroup_count(inputs.instance_count)
    } else {
        0
    };

    FramePlan {
        mode,
        instance_count: inputs.instance_count,
        workgroups,
    }
}

/// What `encode_frame` actually recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Plan that was executed.
    pub plan: FramePlan,
    /// Work-groups the compactor reported dispatching.
    pub workgroups_dispatched: u32,
    /// True if a counter snapshot for read-back was encoded.
    pub readback_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> FrameInputs {
        FrameInputs {
            culling_enabled: true,
            kernel_available: true,
            resources_ready: true,
            instance_count: 1000,
            frustum: FrustumUpdate::Refreshed,
        }
    }

    #[test]
    fn test_culled_plan() {
        let plan = plan_frame(&inputs());
        assert_eq!(plan.mode, FrameMode::Culled);
        assert_eq!(plan.workgroups, 8);
        assert!(plan.resets_counter());
        assert!(plan.dispatches());
        assert!(plan.patches_command());
        assert_eq!(plan.direct_instances(), None);
    }

    #[test]
    fn test_zero_instances_resets_but_does_not_dispatch() {
        let plan = plan_frame(&FrameInputs { instance_count: 0, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Culled);
        assert_eq!(plan.workgroups, 0);
        assert!(plan.resets_counter());
        assert!(!plan.dispatches());
    }

    #[test]
    fn test_user_disabled_draws_all() {
        let plan = plan_frame(&FrameInputs { culling_enabled: false, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Unculled(FallbackReason::UserDisabled));
        assert!(!plan.resets_counter());
        assert!(!plan.patches_command());
        assert_eq!(plan.direct_instances(), Some(1000));
    }

    #[test]
    fn test_kernel_unavailable_draws_all() {
        let plan = plan_frame(&FrameInputs { kernel_available: false, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Unculled(FallbackReason::KernelUnavailable));
        assert_eq!(plan.direct_instances(), Some(1000));
        assert_eq!(plan.workgroups, 0);
    }

    #[test]
    fn test_fallback_reasons_stay_distinct() {
        let user = plan_frame(&FrameInputs { culling_enabled: false, ..inputs() });
        let kernel = plan_frame(&FrameInputs { kernel_available: false, ..inputs() });
        assert_ne!(user.mode, kernel.mode);
        assert_eq!(user.direct_instances(), kernel.direct_instances());
    }

    #[test]
    fn test_not_ready_skips() {
        let plan = plan_frame(&FrameInputs { resources_ready: false, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Skipped(SkipReason::ResourcesNotReady));
        assert_eq!(plan.direct_instances(), None);
    }

    #[test]
    fn test_reused_frustum_still_culls() {
        let plan = plan_frame(&FrameInputs { frustum: FrustumUpdate::Reused, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Culled);

        let plan = plan_frame(&FrameInputs { frustum: FrustumUpdate::Uninitialized, ..inputs() });
        assert_eq!(plan.mode, FrameMode::Skipped(SkipReason::CameraNotReady));
    }
}
