//! Asset requests and loading.
//!
//! Scenes declare what they need during their load phase (atlas, plain
//! images, tilemap) and `load_all` resolves everything before setup runs.
//! Metadata files (atlas JSON, map JSON) are parsed eagerly; image files
//! are recorded as paths and decoded later when the renderer uploads them,
//! so a headless scene test never touches the GPU or the PNG decoder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::atlas::{load_atlas_from_path, AtlasRegistry};
use crate::tilemap::{load_tilemap_from_path, Tilemap};

#[derive(Debug, Default)]
pub struct AssetServer {
    atlas_request: Option<(PathBuf, PathBuf)>,
    image_requests: HashMap<String, PathBuf>,
    tilemap_request: Option<PathBuf>,

    atlas: Option<AtlasRegistry>,
    tilemap: Option<Tilemap>,
}

impl AssetServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the sprite atlas: an image file plus its JSON frame metadata.
    pub fn request_atlas(&mut self, image_path: &Path, metadata_path: &Path) {
        self.atlas_request = Some((image_path.to_path_buf(), metadata_path.to_path_buf()));
    }

    /// Request a standalone image under a lookup key (e.g. the tileset sheet).
    pub fn request_image(&mut self, key: &str, path: &Path) {
        self.image_requests.insert(key.to_string(), path.to_path_buf());
    }

    pub fn request_tilemap(&mut self, path: &Path) {
        self.tilemap_request = Some(path.to_path_buf());
    }

    /// Resolve every recorded request. Fails on the first missing or
    /// malformed file; a scene cannot start half-loaded.
    pub fn load_all(&mut self) -> Result<(), String> {
        if let Some((image_path, metadata_path)) = &self.atlas_request {
            if !image_path.is_file() {
                return Err(format!(
                    "Atlas image not found: {}",
                    image_path.display()
                ));
            }
            let atlas = load_atlas_from_path(metadata_path)?;
            log::info!(
                "Loaded atlas {} ({} frames)",
                metadata_path.display(),
                atlas.frame_count()
            );
            self.atlas = Some(atlas);
        }

        for (key, path) in &self.image_requests {
            if !path.is_file() {
                return Err(format!("Image '{key}' not found: {}", path.display()));
            }
        }

        if let Some(path) = &self.tilemap_request {
            let map = load_tilemap_from_path(path)?;
            log::info!(
                "Loaded tilemap {} ({}x{} tiles)",
                path.display(),
                map.width,
                map.height
            );
            self.tilemap = Some(map);
        }

        Ok(())
    }

    pub fn atlas(&self) -> Option<&AtlasRegistry> {
        self.atlas.as_ref()
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn atlas_image_path(&self) -> Option<&Path> {
        self.atlas_request.as_ref().map(|(image, _)| image.as_path())
    }

    pub fn image_path(&self, key: &str) -> Option<&Path> {
        self.image_requests.get(key).map(|p| p.as_path())
    }
}
