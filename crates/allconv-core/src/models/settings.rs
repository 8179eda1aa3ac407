use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Active conversion settings of a session.
///
/// Values are not validated; callers are expected to offer valid choices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionSettings {
    /// Target format identifier, e.g. `jpeg`, `png`, `mp4`.
    pub format: String,
    /// Quality percent, 0-100.
    pub quality: Option<u8>,
    pub resolution: Option<String>,
    pub compression: Option<u32>,
    /// Format-specific knobs.
    pub custom: Option<Map<String, Value>>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: Some(85),
            resolution: None,
            compression: Some(6),
            custom: None,
        }
    }
}

impl ConversionSettings {
    /// Quality to use when the settings leave it unset.
    pub const DEFAULT_QUALITY: u8 = 85;

    pub fn effective_quality(&self) -> u8 {
        self.quality.unwrap_or(Self::DEFAULT_QUALITY).min(100)
    }

    /// Shallow merge: every key present in `update` overrides, the rest is kept.
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(format) = update.format {
            self.format = format;
        }
        if let Some(quality) = update.quality {
            self.quality = Some(quality);
        }
        if let Some(resolution) = update.resolution {
            self.resolution = Some(resolution);
        }
        if let Some(compression) = update.compression {
            self.compression = Some(compression);
        }
        if let Some(custom) = update.custom {
            self.custom = Some(custom);
        }
    }
}

/// Partial settings; only the keys that are `Some` are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsUpdate {
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub resolution: Option<String>,
    pub compression: Option<u32>,
    pub custom: Option<Map<String, Value>>,
}

impl SettingsUpdate {
    pub fn format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..Self::default()
        }
    }

    pub fn quality(quality: u8) -> Self {
        Self {
            quality: Some(quality),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_compression(mut self, compression: u32) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
