use crate::{ContextProperties, DeviceId, PlatformId};

pub(crate) struct ContextObj {
    pub(crate) id: u64,
    pub(crate) platform: PlatformId,
    pub(crate) devices: Vec<DeviceId>,
    pub(crate) properties: ContextProperties,
}

impl ContextObj {
    /// Returns the smallest maximum allocation size of all devices.
    pub(crate) fn max_mem_alloc_size(&self) -> u64 {
        self.devices.iter().map(|d| d.0.config.max_mem_alloc_size).min().unwrap_or(0)
    }

    /// Returns the largest base address alignment of all devices, in bytes.
    pub(crate) fn mem_base_addr_align_bytes(&self) -> usize {
        self.devices.iter()
            .map(|d| (d.0.config.mem_base_addr_align as usize / 8).max(1))
            .max()
            .unwrap_or(1)
    }

    /// Returns true if the context was created with graphics sharing
    /// properties.
    pub(crate) fn is_gl_shared(&self) -> bool {
        self.properties.contains_gl_context_or_sharegroup()
    }
}
