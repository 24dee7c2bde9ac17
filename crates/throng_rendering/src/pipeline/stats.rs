//! Culling statistics.

use super::frame::{FallbackReason, FrameMode, FrameOutcome};

/// Running statistics of the culling pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullStats {
    /// Frames encoded so far.
    pub frame: u64,
    /// Mode of the most recent frame.
    pub last_mode: FrameMode,
    /// Instance count N of the most recent frame.
    pub instances_total: u32,
    /// Work-groups dispatched in the most recent frame.
    pub workgroups: u32,
    /// Most recent visible count read back from the GPU.
    pub last_visible: Option<u32>,
    /// Frames that ran the kernel.
    pub culled_frames: u64,
    /// Frames drawn unculled because the user disabled culling.
    pub user_disabled_frames: u64,
    /// Frames drawn unculled because the kernel is unavailable.
    pub kernel_unavailable_frames: u64,
    /// Frames that drew nothing.
    pub skipped_frames: u64,
}

impl Default for CullStats {
    fn default() -> Self {
        Self {
            frame: 0,
            last_mode: FrameMode::Culled,
            instances_total: 0,
            workgroups: 0,
            last_visible: None,
            culled_frames: 0,
            user_disabled_frames: 0,
            kernel_unavailable_frames: 0,
            skipped_frames: 0,
        }
    }
}

impl CullStats {
    /// Folds one frame into the totals.
    pub fn record(&mut self, outcome: &FrameOutcome) {
        self.frame = outcome.frame;
        self.last_mode = outcome.plan.mode;
        self.instances_total = outcome.plan.instance_count;
        self.workgroups = outcome.workgroups_dispatched;
        match outcome.plan.mode {
            FrameMode::Culled => self.culled_frames += 1,
            FrameMode::Unculled(FallbackReason::UserDisabled) => self.user_disabled_frames += 1,
            FrameMode::Unculled(FallbackReason::KernelUnavailable) => {
                self.kernel_unavailable_frames += 1;
            }
            FrameMode::Skipped(_) => self.skipped_frames += 1,
        }
    }

    /// Frames that fell back for `reason`.
    #[must_use]
    pub const fn fallback_frames(&self, reason: FallbackReason) -> u64 {
        match reason {
            FallbackReason::UserDisabled => self.user_disabled_frames,
            FallbackReason::KernelUnavailable => self.kernel_unavailable_frames,
        }
    }

    /// Fraction of instances culled at the last read-back, if any.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cull_ratio(&self) -> Option<f32> {
        let visible = self.last_visible?;
        if self.instances_total == 0 {
            return None;
        }
        Some(1.0 - visible as f32 / self.instances_total as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::frame::{FramePlan, SkipReason};

    fn outcome(frame: u64, mode: FrameMode) -> FrameOutcome {
        FrameOutcome {
            frame,
            plan: FramePlan { mode, instance_count: 200, workgroups: 2 },
            workgroups_dispatched: if mode == FrameMode::Culled { 2 } else { 0 },
            readback_requested: false,
        }
    }

    #[test]
    fn test_counts_reasons_separately() {
        let mut stats = CullStats::default();
        stats.record(&outcome(1, FrameMode::Culled));
        stats.record(&outcome(2, FrameMode::Unculled(FallbackReason::UserDisabled)));
        stats.record(&outcome(3, FrameMode::Unculled(FallbackReason::UserDisabled)));
        stats.record(&outcome(4, FrameMode::Unculled(FallbackReason::KernelUnavailable)));
        stats.record(&outcome(5, FrameMode::Skipped(SkipReason::ResourcesNotReady)));

        assert_eq!(stats.frame, 5);
        assert_eq!(stats.culled_frames, 1);
        assert_eq!(stats.fallback_frames(FallbackReason::UserDisabled), 2);
        assert_eq!(stats.fallback_frames(FallbackReason::KernelUnavailable), 1);
        assert_eq!(stats.skipped_frames, 1);
        assert_eq!(stats.workgroups, 0);
    }

    #[test]
    fn test_cull_ratio() {
        let mut stats = CullStats::default();
        assert_eq!(stats.cull_ratio(), None);

        stats.record(&outcome(1, FrameMode::Culled));
        stats.last_visible = Some(50);
        assert!((stats.cull_ratio().unwrap() - 0.75).abs() < 1e-6);
    }
}
