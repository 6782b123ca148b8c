//! Generation parameters and their accepted ranges.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    fn check(&self, name: &str, value: f32) -> Result<()> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(Error::InvalidInput(format!(
                "`{name}` must be between {} and {}, got {value}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

pub const EXAGGERATION: ParamRange = ParamRange::new(0.0, 1.0, 0.5);
pub const CFG_WEIGHT: ParamRange = ParamRange::new(0.0, 1.0, 0.5);
pub const TEMPERATURE: ParamRange = ParamRange::new(0.1, 1.0, 0.7);
pub const SPEED: ParamRange = ParamRange::new(0.5, 2.0, 1.0);

pub const CHUNK_SIZE_MIN: usize = 200;
pub const CHUNK_SIZE_MAX: usize = 1000;
pub const CHUNK_SIZE_DEFAULT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Emotion intensity (0.0 = neutral, 1.0 = very expressive).
    pub exaggeration: f32,
    /// Guidance strength; lower values give more natural pacing.
    pub cfg_weight: f32,
    pub temperature: f32,
    /// Playback rate applied after synthesis (1.0 = unchanged).
    pub speed: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            exaggeration: EXAGGERATION.default,
            cfg_weight: CFG_WEIGHT.default,
            temperature: TEMPERATURE.default,
            speed: SPEED.default,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<()> {
        EXAGGERATION.check("exaggeration", self.exaggeration)?;
        CFG_WEIGHT.check("cfg_weight", self.cfg_weight)?;
        TEMPERATURE.check("temperature", self.temperature)?;
        SPEED.check("speed", self.speed)?;
        Ok(())
    }

    pub fn changes_speed(&self) -> bool {
        (self.speed - 1.0).abs() > f32::EPSILON
    }
}

/// Character budget per narration chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkSize(usize);

impl ChunkSize {
    pub fn new(chars: usize) -> Result<Self> {
        if !(CHUNK_SIZE_MIN..=CHUNK_SIZE_MAX).contains(&chars) {
            return Err(Error::InvalidInput(format!(
                "`chunk_size` must be between {CHUNK_SIZE_MIN} and {CHUNK_SIZE_MAX}, got {chars}"
            )));
        }
        Ok(Self(chars))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(CHUNK_SIZE_DEFAULT)
    }
}
