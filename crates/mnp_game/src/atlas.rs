//! Sprite atlas metadata loading and frame resolution.
//!
//! The atlas ships as an image plus a "JSON hash" metadata file (the format
//! TexturePacker and Phaser use): a map of frame name to pixel rect inside
//! the sheet. Frame names carry an animation prefix and index, e.g.
//! `menina_walk12.png`; `generate_frame_names` rebuilds those ordered
//! sequences for clip registration.
//!
//! `AtlasRegistry::resolve(frame_name)` is the lookup used at render time.
//! It returns the frame's UV rect and pixel size needed to build a sprite quad.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct AtlasFileJson {
    frames: HashMap<String, AtlasFrameJson>,
    meta: AtlasMetaJson,
}

#[derive(Debug, Deserialize)]
struct AtlasFrameJson {
    frame: AtlasRectJson,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct AtlasRectJson {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Debug, Deserialize)]
struct AtlasMetaJson {
    size: AtlasSizeJson,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct AtlasSizeJson {
    w: u32,
    h: u32,
}

/// A resolved atlas frame: where it sits in the sheet and how big it is.
#[derive(Debug, Clone, Copy)]
pub struct AtlasFrame {
    pub size_px: (u32, u32),
    pub uv: [f32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct AtlasRegistry {
    pub texture_size: (u32, u32),
    frames: HashMap<String, AtlasFrame>,
}

impl AtlasRegistry {
    pub fn resolve(&self, frame_name: &str) -> Option<&AtlasFrame> {
        self.frames.get(frame_name)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

pub fn load_atlas_from_path(path: &Path) -> Result<AtlasRegistry, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read atlas metadata {}: {e}", path.display()))?;
    atlas_from_json_str(&raw).map_err(|e| format!("{} ({})", e, path.display()))
}

pub fn atlas_from_json_str(raw: &str) -> Result<AtlasRegistry, String> {
    let file: AtlasFileJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse atlas metadata: {e}"))?;
    validate_atlas(&file)?;

    let tex_w = file.meta.size.w as f32;
    let tex_h = file.meta.size.h as f32;
    let mut frames = HashMap::new();
    for (name, frame) in file.frames {
        let rect = frame.frame;
        frames.insert(
            name,
            AtlasFrame {
                size_px: (rect.w, rect.h),
                uv: [
                    rect.x as f32 / tex_w,
                    rect.y as f32 / tex_h,
                    (rect.x + rect.w) as f32 / tex_w,
                    (rect.y + rect.h) as f32 / tex_h,
                ],
            },
        );
    }

    Ok(AtlasRegistry {
        texture_size: (file.meta.size.w, file.meta.size.h),
        frames,
    })
}

fn validate_atlas(file: &AtlasFileJson) -> Result<(), String> {
    if file.meta.size.w == 0 || file.meta.size.h == 0 {
        return Err("Atlas validation failed: texture width/height must be > 0".to_string());
    }
    if file.frames.is_empty() {
        return Err("Atlas validation failed: frames map is empty".to_string());
    }
    for (name, frame) in &file.frames {
        let rect = frame.frame;
        if rect.w == 0 || rect.h == 0 {
            return Err(format!(
                "Atlas validation failed: frame '{}' has zero-sized rect",
                name
            ));
        }
        let right = rect.x.checked_add(rect.w).ok_or_else(|| {
            format!(
                "Atlas validation failed: frame '{}' rect overflows u32 range",
                name
            )
        })?;
        let bottom = rect.y.checked_add(rect.h).ok_or_else(|| {
            format!(
                "Atlas validation failed: frame '{}' rect overflows u32 range",
                name
            )
        })?;
        if right > file.meta.size.w || bottom > file.meta.size.h {
            return Err(format!(
                "Atlas validation failed: frame '{}' rect exceeds atlas bounds",
                name
            ));
        }
    }
    Ok(())
}

/// Build the ordered frame-name sequence `{prefix}{start}{suffix}` ..
/// `{prefix}{end}{suffix}`, the naming convention of the sprite sheet.
pub fn generate_frame_names(prefix: &str, start: u32, end: u32, suffix: &str) -> Vec<String> {
    (start..=end)
        .map(|i| format!("{prefix}{i}{suffix}"))
        .collect()
}
