use navigation::Tuning;

/// Default number of taps the blurry post-process takes between the sharp
/// and blur sample points.
pub const DEFAULT_BLUR_SAMPLES: u32 = 8;

/// Post-process applied when combining the sharp and blur sample regions.
///
/// The style is chosen once per process; there is no runtime switch inside a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Average a fixed number of taps spread along the sharp→blur line.
    Blurry { samples: u32 },
    /// Take one hash-jittered tap along the sharp→blur line per pixel.
    Noisy,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self::Blurry {
            samples: DEFAULT_BLUR_SAMPLES,
        }
    }
}

impl std::fmt::Display for PostProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostProcess::Blurry { samples } => write!(f, "blurry({samples})"),
            PostProcess::Noisy => f.write_str("noisy"),
        }
    }
}

/// GPU power preference forwarded to adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration for every overlay session in this process.
#[derive(Debug, Clone)]
pub struct MagnifierConfig {
    pub post_process: PostProcess,
    pub gpu_power: GpuPowerPreference,
    pub tuning: Tuning,
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            post_process: PostProcess::default(),
            gpu_power: GpuPowerPreference::default(),
            tuning: Tuning::DEFAULT,
        }
    }
}

/// The gesture that opened a session: where the pointer was, and how many
/// zoom ticks it already carried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTrigger {
    pub cursor: [f32; 2],
    pub zoom_ticks: i32,
}

/// Returned to the dispatcher once a session has closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub frames: u64,
    pub duration: std::time::Duration,
    pub size: (u32, u32),
}

/// Human-friendly summary of the selected adapter.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}
