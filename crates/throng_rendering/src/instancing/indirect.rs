//! Indirect draw command lifecycle.
//!
//! ```text
//! Uninitialized --initialize--> Ready --patch--> Updated --patch--> Updated ...
//! ```
//!
//! Index count, first index and base vertex are fixed when the mesh is
//! loaded. After that only the 4-byte `instance_count` field is ever
//! rewritten, either by a GPU-side copy from the visible counter or by a
//! queue write.

use super::instance_data::DrawIndexedIndirectArgs;

/// Where the command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// No device buffer yet.
    Uninitialized,
    /// Created with `instance_count = 0`, never patched.
    Ready,
    /// Instance count patched at least once.
    Updated,
}

/// Device-resident `DrawIndexedIndirect` record for one mesh.
pub struct IndirectDrawCommand {
    buffer: Option<wgpu::Buffer>,
    args: DrawIndexedIndirectArgs,
    state: CommandState,
}

impl Default for IndirectDrawCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl IndirectDrawCommand {
    /// Creates an uninitialized command.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: None,
            args: DrawIndexedIndirectArgs {
                index_count: 0,
                instance_count: 0,
                first_index: 0,
                base_vertex: 0,
                first_instance: 0,
            },
            state: CommandState::Uninitialized,
        }
    }

    /// Allocates the record with the mesh's index count and zero instances.
    pub fn initialize(&mut self, device: &wgpu::Device, index_count: u32) {
        use wgpu::util::DeviceExt;

        self.args = DrawIndexedIndirectArgs {
            index_count,
            ..DrawIndexedIndirectArgs::default()
        };
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Indirect Draw Command"),
            contents: bytemuck::bytes_of(&self.args),
            usage: wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        }));
        self.state = CommandState::Ready;
    }

    /// Encodes a copy of the 4-byte visible counter into `instance_count`.
    ///
    /// Device side, so the host never waits on the kernel. Returns `false`
    /// if the command is not initialized.
    pub fn encode_patch_from_counter(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        counter: &wgpu::Buffer,
    ) -> bool {
        let Some(buffer) = &self.buffer else {
            return false;
        };
        encoder.copy_buffer_to_buffer(
            counter,
            0,
            buffer,
            DrawIndexedIndirectArgs::INSTANCE_COUNT_OFFSET,
            4,
        );
        self.state = CommandState::Updated;
        true
    }

    /// Overwrites `instance_count` from a host-known value.
    pub fn write_instance_count(&mut self, queue: &wgpu::Queue, instance_count: u32) -> bool {
        let Some(buffer) = &self.buffer else {
            return false;
        };
        queue.write_buffer(
            buffer,
            DrawIndexedIndirectArgs::INSTANCE_COUNT_OFFSET,
            bytemuck::bytes_of(&instance_count),
        );
        self.args.instance_count = instance_count;
        self.state = CommandState::Updated;
        true
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CommandState {
        self.state
    }

    /// Host copy of the record.
    ///
    /// `instance_count` is only meaningful after `write_instance_count`;
    /// a GPU-side patch is not mirrored here.
    #[must_use]
    pub const fn args(&self) -> DrawIndexedIndirectArgs {
        self.args
    }

    /// Device buffer, once initialized.
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_uninitialized() {
        let command = IndirectDrawCommand::new();
        assert_eq!(command.state(), CommandState::Uninitialized);
        assert!(command.buffer().is_none());
        assert_eq!(command.args(), DrawIndexedIndirectArgs::default());
    }
}
