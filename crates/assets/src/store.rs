use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use tileworld_common::{ClipHandle, FontHandle, ImageHandle};
use tileworld_kernel::Sprite;

use crate::AssetError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub name: String,
    /// Source path, relative to the game's resource root.
    pub path: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontAsset {
    pub name: String,
    pub family: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipAsset {
    pub name: String,
    pub path: String,
}

/// Logical-name registry of image, font and clip descriptions.
///
/// Re-registering a name replaces its description. The registry round-trips
/// through a JSON manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetStore {
    images: BTreeMap<String, ImageAsset>,
    fonts: BTreeMap<String, FontAsset>,
    clips: BTreeMap<String, ClipAsset>,
}

fn digest(parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

fn require_name(name: &str) -> Result<(), AssetError> {
    if name.trim().is_empty() {
        return Err(AssetError::InvalidArgument("asset name must not be empty".into()));
    }
    Ok(())
}

impl ImageAsset {
    pub fn handle(&self) -> ImageHandle {
        ImageHandle(digest(&[
            b"image",
            self.name.as_bytes(),
            self.path.as_bytes(),
            &self.width.to_le_bytes(),
            &self.height.to_le_bytes(),
        ]))
    }
}

impl FontAsset {
    pub fn handle(&self) -> FontHandle {
        FontHandle(digest(&[
            b"font",
            self.name.as_bytes(),
            self.family.as_bytes(),
            &self.size.to_le_bytes(),
        ]))
    }
}

impl ClipAsset {
    pub fn handle(&self) -> ClipHandle {
        ClipHandle(digest(&[b"clip", self.name.as_bytes(), self.path.as_bytes()]))
    }
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_image(&mut self, image: ImageAsset) -> Result<ImageHandle, AssetError> {
        require_name(&image.name)?;
        if image.width <= 0 || image.height <= 0 {
            return Err(AssetError::InvalidArgument(format!(
                "image {} must have a positive size, got {}x{}",
                image.name, image.width, image.height
            )));
        }
        let handle = image.handle();
        tracing::debug!(name = %image.name, ?handle, "image registered");
        self.images.insert(image.name.clone(), image);
        Ok(handle)
    }

    pub fn register_font(&mut self, font: FontAsset) -> Result<FontHandle, AssetError> {
        require_name(&font.name)?;
        let handle = font.handle();
        tracing::debug!(name = %font.name, ?handle, "font registered");
        self.fonts.insert(font.name.clone(), font);
        Ok(handle)
    }

    pub fn register_clip(&mut self, clip: ClipAsset) -> Result<ClipHandle, AssetError> {
        require_name(&clip.name)?;
        let handle = clip.handle();
        tracing::debug!(name = %clip.name, ?handle, "clip registered");
        self.clips.insert(clip.name.clone(), clip);
        Ok(handle)
    }

    pub fn image(&self, name: &str) -> Result<&ImageAsset, AssetError> {
        self.images
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    pub fn font(&self, name: &str) -> Result<&FontAsset, AssetError> {
        self.fonts
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    pub fn clip(&self, name: &str) -> Result<&ClipAsset, AssetError> {
        self.clips
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    /// A centre-anchored sprite sized like the named image.
    pub fn sprite(&self, name: &str) -> Result<Sprite, AssetError> {
        let image = self.image(name)?;
        Ok(Sprite::new(image.handle(), image.width, image.height))
    }

    pub fn image_by_handle(&self, handle: ImageHandle) -> Option<&ImageAsset> {
        self.images.values().find(|i| i.handle() == handle)
    }

    pub fn clip_by_handle(&self, handle: ClipHandle) -> Option<&ClipAsset> {
        self.clips.values().find(|c| c.handle() == handle)
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.fonts.len() + self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the registry manifest as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        tracing::info!(path = %path.as_ref().display(), assets = self.len(), "asset manifest saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path.as_ref())?;
        let store: Self = serde_json::from_reader(file)?;
        tracing::info!(path = %path.as_ref().display(), assets = store.len(), "asset manifest loaded");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_kernel::Anchor;

    fn hero() -> ImageAsset {
        ImageAsset {
            name: "hero".into(),
            path: "images/hero.png".into(),
            width: 16,
            height: 24,
        }
    }

    #[test]
    fn register_and_look_up_by_name() {
        let mut store = AssetStore::new();
        let handle = store.register_image(hero()).unwrap();
        assert_eq!(store.image("hero").unwrap().width, 16);
        assert_eq!(store.image_by_handle(handle), Some(&hero()));
        assert!(matches!(store.image("villain"), Err(AssetError::NotFound(n)) if n == "villain"));
    }

    #[test]
    fn handles_are_content_addressed() {
        let mut store = AssetStore::new();
        let a = store.register_image(hero()).unwrap();
        let b = store.register_image(hero()).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        let mut resized = hero();
        resized.width = 32;
        let c = store.register_image(resized).unwrap();
        assert_ne!(a, c);
        assert_eq!(store.len(), 1);
        assert!(store.image_by_handle(a).is_none());
    }

    #[test]
    fn invalid_registrations_rejected() {
        let mut store = AssetStore::new();
        let mut unnamed = hero();
        unnamed.name = "  ".into();
        assert!(matches!(store.register_image(unnamed), Err(AssetError::InvalidArgument(_))));
        let mut flat = hero();
        flat.height = 0;
        assert!(store.register_image(flat).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn sprite_from_image() {
        let mut store = AssetStore::new();
        let handle = store.register_image(hero()).unwrap();
        let sprite = store.sprite("hero").unwrap();
        assert_eq!(sprite.image, Some(handle));
        assert_eq!((sprite.width, sprite.height), (16, 24));
        assert_eq!(sprite.anchor, Anchor::Center);
    }

    #[test]
    fn fonts_and_clips() {
        let mut store = AssetStore::new();
        store
            .register_font(FontAsset {
                name: "ui".into(),
                family: "Monospaced".into(),
                size: 12,
            })
            .unwrap();
        let clip = store
            .register_clip(ClipAsset {
                name: "theme".into(),
                path: "music/theme.wav".into(),
            })
            .unwrap();
        assert_eq!(store.font("ui").unwrap().size, 12);
        assert_eq!(store.clip_by_handle(clip).unwrap().name, "theme");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut store = AssetStore::new();
        store.register_image(hero()).unwrap();
        store
            .register_clip(ClipAsset {
                name: "step".into(),
                path: "sfx/step.wav".into(),
            })
            .unwrap();
        store.save(tmp.path()).unwrap();

        let loaded = AssetStore::load(tmp.path()).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.sprite("hero").unwrap(), store.sprite("hero").unwrap());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AssetStore::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
