use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tileworld_common::ClipHandle;

use crate::AssetError;

/// Playback volume of clips without an override.
pub const DEFAULT_VOLUME: u32 = 100;
/// Volumes above 100 amplify.
pub const MAX_VOLUME: u32 = 200;

/// Volume levels handed to whatever plays clips. Volumes are percentages in
/// `0..=MAX_VOLUME`; a clip without its own level uses the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    default_volume: u32,
    clips: BTreeMap<ClipHandle, u32>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            clips: BTreeMap::new(),
        }
    }
}

fn check_volume(volume: i64) -> Result<u32, AssetError> {
    if !(0..=MAX_VOLUME as i64).contains(&volume) {
        return Err(AssetError::InvalidArgument(format!(
            "volume must be within 0..={MAX_VOLUME}, got {volume}"
        )));
    }
    Ok(volume as u32)
}

impl AudioSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_volume(&self) -> u32 {
        self.default_volume
    }

    /// Applies to clips played from now on that have no override.
    pub fn set_default_volume(&mut self, volume: i64) -> Result<(), AssetError> {
        self.default_volume = check_volume(volume)?;
        Ok(())
    }

    pub fn set_volume(&mut self, clip: ClipHandle, volume: i64) -> Result<(), AssetError> {
        let volume = check_volume(volume)?;
        self.clips.insert(clip, volume);
        Ok(())
    }

    pub fn volume(&self, clip: ClipHandle) -> u32 {
        self.clips.get(&clip).copied().unwrap_or(self.default_volume)
    }

    /// Linear gain factor: volume 100 is unity.
    pub fn gain(&self, clip: ClipHandle) -> f64 {
        f64::from(self.volume(clip)) / 100.0
    }

    /// Gain in decibels; negative infinity when muted.
    pub fn decibels(&self, clip: ClipHandle) -> f64 {
        20.0 * self.gain(clip).log10()
    }
}
