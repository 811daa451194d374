//! Device configuration

/// Default name reported by host devices
pub const DEFAULT_DEVICE_NAME: &str = "host";

/// Configuration for an interpreted device and its allocator
///
/// # Example
///
/// ```
/// use numr_interp::runtime::DeviceConfig;
///
/// let config = DeviceConfig::default()
///     .with_name("test")
///     .with_memory_limit(1 << 20);
/// assert_eq!(config.name(), "test");
/// assert_eq!(config.memory_limit(), Some(1 << 20));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    name: String,
    memory_limit: Option<usize>,
}

impl DeviceConfig {
    /// Create a configuration with the default name and no memory limit
    pub fn new() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
            memory_limit: None,
        }
    }

    /// Set the device name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound the total live bytes the allocator may hold
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Memory limit in bytes, if any
    pub fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}
