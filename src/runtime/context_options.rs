use serde_derive::{Deserialize, Serialize};

/// The feature level a context runs at.
///
/// The base tier only provides the array and element array buffer targets; the extended tier
/// (WebGL 2.0) adds the copy, pixel transfer, transform feedback and uniform buffer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTier {
    Base,
    Extended,
}

impl CapabilityTier {
    /// Whether a feature that requires the `required` tier is available in this tier.
    pub fn supports(&self, required: CapabilityTier) -> bool {
        required == CapabilityTier::Base || *self == CapabilityTier::Extended
    }
}

impl Default for CapabilityTier {
    fn default() -> Self {
        CapabilityTier::Extended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContextOptions {
    capability_tier: CapabilityTier,
    shadow_buffer_data: bool,
}

impl ContextOptions {
    pub fn begin() -> ContextOptionsBuilder {
        ContextOptionsBuilder {
            capability_tier: CapabilityTier::default(),
            shadow_buffer_data: true,
        }
    }

    pub fn capability_tier(&self) -> CapabilityTier {
        self.capability_tier
    }

    /// Whether buffers keep a CPU-side copy of their data.
    ///
    /// The copy is what allows index ranges to be validated without reading back from the GPU.
    pub fn shadow_buffer_data(&self) -> bool {
        self.shadow_buffer_data
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions::begin().finish()
    }
}

pub struct ContextOptionsBuilder {
    capability_tier: CapabilityTier,
    shadow_buffer_data: bool,
}

impl ContextOptionsBuilder {
    pub fn capability_tier(mut self, capability_tier: CapabilityTier) -> Self {
        self.capability_tier = capability_tier;

        self
    }

    pub fn shadow_buffer_data(mut self, shadow_buffer_data: bool) -> Self {
        self.shadow_buffer_data = shadow_buffer_data;

        self
    }

    pub fn finish(self) -> ContextOptions {
        ContextOptions {
            capability_tier: self.capability_tier,
            shadow_buffer_data: self.shadow_buffer_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ContextOptions::default();

        assert_eq!(options.capability_tier(), CapabilityTier::Extended);
        assert!(options.shadow_buffer_data());
    }

    #[test]
    fn test_builder() {
        let options = ContextOptions::begin()
            .capability_tier(CapabilityTier::Base)
            .shadow_buffer_data(false)
            .finish();

        assert_eq!(options.capability_tier(), CapabilityTier::Base);
        assert!(!options.shadow_buffer_data());
    }

    #[test]
    fn test_deserialize() {
        let options: ContextOptions =
            serde_json::from_str(r#"{ "capability-tier": "base" }"#).unwrap();

        assert_eq!(options.capability_tier(), CapabilityTier::Base);
        assert!(options.shadow_buffer_data());

        let options: ContextOptions =
            serde_json::from_str(r#"{ "shadow-buffer-data": false }"#).unwrap();

        assert_eq!(options.capability_tier(), CapabilityTier::Extended);
        assert!(!options.shadow_buffer_data());
    }
}
