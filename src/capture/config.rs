use serde::{Deserialize, Serialize};

/// Which physical camera a configuration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    /// Rear camera, pointing away from the operator.
    Environment,
    /// Front camera.
    User,
    Any,
}

impl FacingMode {
    pub fn accepts(&self, device: FacingMode) -> bool {
        match self {
            FacingMode::Any => true,
            wanted => *wanted == device,
        }
    }
}

/// One entry in the capture fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    pub label: String,
    pub facing: FacingMode,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub min_height: Option<u32>,
    #[serde(default)]
    pub ideal_width: Option<u32>,
    #[serde(default)]
    pub ideal_height: Option<u32>,
}

impl CaptureConfig {
    fn new(label: &str, facing: FacingMode) -> Self {
        Self {
            label: label.to_string(),
            facing,
            min_width: None,
            min_height: None,
            ideal_width: None,
            ideal_height: None,
        }
    }

    fn with_min(mut self, width: u32, height: u32) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    fn with_ideal(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = Some(width);
        self.ideal_height = Some(height);
        self
    }

    /// Hard constraints only; ideal sizes are hints.
    pub fn satisfied_by(&self, width: u32, height: u32) -> bool {
        self.min_width.map_or(true, |min| width >= min)
            && self.min_height.map_or(true, |min| height >= min)
    }
}

/// Fallback chain in descending preference.
pub fn default_chain() -> Vec<CaptureConfig> {
    vec![
        CaptureConfig::new("rear-high", FacingMode::Environment)
            .with_min(1280, 720)
            .with_ideal(1920, 1080),
        CaptureConfig::new("rear-low", FacingMode::Environment)
            .with_min(640, 480)
            .with_ideal(1280, 720),
        CaptureConfig::new("front", FacingMode::User).with_ideal(1280, 720),
        CaptureConfig::new("generic", FacingMode::Any).with_ideal(1280, 720),
        CaptureConfig::new("minimal", FacingMode::Any),
    ]
}

/// What the host environment reports before any hardware is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentCapabilities {
    pub secure_context: bool,
    pub capture_api_present: bool,
}

impl Default for EnvironmentCapabilities {
    fn default() -> Self {
        Self {
            secure_context: true,
            capture_api_present: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_prefers_rear_high_resolution() {
        let chain = default_chain();
        let labels: Vec<&str> = chain.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["rear-high", "rear-low", "front", "generic", "minimal"]);
        assert_eq!(chain[0].facing, FacingMode::Environment);
        assert!(chain[4].satisfied_by(1, 1));
    }

    #[test]
    fn minimum_sizes_are_hard_constraints() {
        let rear_high = &default_chain()[0];
        assert!(rear_high.satisfied_by(1920, 1080));
        assert!(!rear_high.satisfied_by(1024, 768));
    }

    #[test]
    fn any_facing_accepts_every_device() {
        assert!(FacingMode::Any.accepts(FacingMode::User));
        assert!(FacingMode::Environment.accepts(FacingMode::Environment));
        assert!(!FacingMode::Environment.accepts(FacingMode::User));
    }
}
