/// Graphics device configuration

/// Capability tier of a graphics device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsProfile {
    /// Constrained tier: 16-bit indices only
    Reach,
    /// Full tier: 16-bit and 32-bit indices
    #[default]
    HiDef,
}

impl GraphicsProfile {
    /// Whether index buffers may use 32-bit indices
    pub fn supports_32bit_indices(&self) -> bool {
        matches!(self, GraphicsProfile::HiDef)
    }
}

/// Graphics device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Capability tier
    pub profile: GraphicsProfile,
    /// Name used in log lines
    pub label: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            profile: GraphicsProfile::HiDef,
            label: "Galaxy3D Device".to_string(),
        }
    }
}
