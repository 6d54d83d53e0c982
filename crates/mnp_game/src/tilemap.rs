//! Tiled JSON tilemap loading.
//!
//! Parses the subset of the Tiled map format this game uses: tile layers
//! (flat gid arrays), object layers (named spawn markers), and tileset
//! tile properties (the boolean `collides` flag that marks ground tiles
//! solid). The map is immutable after load; it is the read-only source of
//! spawn coordinates and static collision cells.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TilemapFileJson {
    width: i32,
    height: i32,
    tilewidth: i32,
    tileheight: i32,
    layers: Vec<LayerJson>,
    #[serde(default)]
    tilesets: Vec<TilesetJson>,
}

#[derive(Debug, Deserialize)]
struct LayerJson {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    objects: Vec<ObjectJson>,
}

#[derive(Debug, Deserialize)]
struct ObjectJson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

#[derive(Debug, Deserialize)]
struct TilesetJson {
    firstgid: u32,
    name: String,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    tiles: Vec<TilesetTileJson>,
}

#[derive(Debug, Deserialize)]
struct TilesetTileJson {
    id: u32,
    #[serde(default)]
    properties: Vec<TilePropertyJson>,
}

#[derive(Debug, Deserialize)]
struct TilePropertyJson {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// A grid of tile references. Gid 0 means "no tile".
#[derive(Debug, Clone)]
pub struct TileLayer {
    pub name: String,
    pub data: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct MapObject {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone)]
pub struct Tileset {
    pub firstgid: u32,
    pub name: String,
    pub columns: u32,
    pub image_size: (u32, u32),
    /// Local tile ids whose `collides` property is true.
    collidable_ids: HashSet<u32>,
}

#[derive(Debug, Clone)]
pub struct Tilemap {
    pub width: i32,
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    tile_layers: Vec<TileLayer>,
    object_layers: Vec<ObjectLayer>,
    tilesets: Vec<Tileset>,
}

impl Tilemap {
    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|l| l.name == name)
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|l| l.name == name)
    }

    /// True when the gid belongs to a tile flagged `collides` in its tileset.
    pub fn gid_collides(&self, gid: u32) -> bool {
        if gid == 0 {
            return false;
        }
        self.tileset_for_gid(gid)
            .is_some_and(|ts| ts.collidable_ids.contains(&(gid - ts.firstgid)))
    }

    /// Source pixel rect of a gid inside its tileset image, for rendering.
    pub fn tile_source_rect(&self, gid: u32) -> Option<(u32, u32, u32, u32)> {
        if gid == 0 {
            return None;
        }
        let ts = self.tileset_for_gid(gid)?;
        if ts.columns == 0 {
            return None;
        }
        let local = gid - ts.firstgid;
        let col = local % ts.columns;
        let row = local / ts.columns;
        Some((
            col * self.tile_width as u32,
            row * self.tile_height as u32,
            self.tile_width as u32,
            self.tile_height as u32,
        ))
    }

    /// Grid cells of `layer_name` whose tile carries `collides: true`.
    /// Returns `None` when the layer does not exist (degraded, no geometry).
    pub fn collision_cells(&self, layer_name: &str) -> Option<Vec<(i32, i32)>> {
        let layer = self.tile_layer(layer_name)?;
        let mut cells = Vec::new();
        for (index, &gid) in layer.data.iter().enumerate() {
            if self.gid_collides(gid) {
                let x = index as i32 % self.width;
                let y = index as i32 / self.width;
                cells.push((x, y));
            }
        }
        Some(cells)
    }

    fn tileset_for_gid(&self, gid: u32) -> Option<&Tileset> {
        // Tilesets are kept sorted by firstgid; the owning set is the last
        // one whose range starts at or below the gid.
        self.tilesets
            .iter()
            .rev()
            .find(|ts| gid >= ts.firstgid)
    }
}

pub fn load_tilemap_from_path(path: &Path) -> Result<Tilemap, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read tilemap {}: {e}", path.display()))?;
    tilemap_from_json_str(&raw).map_err(|e| format!("{} ({})", e, path.display()))
}

pub fn tilemap_from_json_str(raw: &str) -> Result<Tilemap, String> {
    let file: TilemapFileJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse tilemap JSON: {e}"))?;
    validate_tilemap(&file)?;

    let mut tile_layers = Vec::new();
    let mut object_layers = Vec::new();
    for layer in file.layers {
        match layer.kind.as_str() {
            "tilelayer" => tile_layers.push(TileLayer {
                name: layer.name,
                data: layer.data,
            }),
            "objectgroup" => object_layers.push(ObjectLayer {
                name: layer.name,
                objects: layer
                    .objects
                    .into_iter()
                    .map(|o| MapObject {
                        name: o.name,
                        x: o.x,
                        y: o.y,
                        width: o.width,
                        height: o.height,
                    })
                    .collect(),
            }),
            other => {
                log::warn!("Ignoring unsupported layer '{}' of type '{}'", layer.name, other);
            }
        }
    }

    let mut tilesets: Vec<Tileset> = file
        .tilesets
        .into_iter()
        .map(|ts| {
            let collidable_ids = ts
                .tiles
                .iter()
                .filter(|tile| {
                    tile.properties
                        .iter()
                        .any(|p| p.name == "collides" && p.value.as_bool() == Some(true))
                })
                .map(|tile| tile.id)
                .collect();
            Tileset {
                firstgid: ts.firstgid,
                name: ts.name,
                columns: ts.columns,
                image_size: (ts.imagewidth, ts.imageheight),
                collidable_ids,
            }
        })
        .collect();
    tilesets.sort_by_key(|ts| ts.firstgid);
    for ts in &tilesets {
        log::debug!(
            "Tileset '{}': firstgid {}, image {}x{}, {} collidable ids",
            ts.name,
            ts.firstgid,
            ts.image_size.0,
            ts.image_size.1,
            ts.collidable_ids.len()
        );
    }

    Ok(Tilemap {
        width: file.width,
        height: file.height,
        tile_width: file.tilewidth,
        tile_height: file.tileheight,
        tile_layers,
        object_layers,
        tilesets,
    })
}

fn validate_tilemap(file: &TilemapFileJson) -> Result<(), String> {
    if file.width <= 0 || file.height <= 0 {
        return Err("Tilemap validation failed: width and height must be > 0".to_string());
    }
    if file.tilewidth <= 0 || file.tileheight <= 0 {
        return Err("Tilemap validation failed: tile dimensions must be > 0".to_string());
    }

    let expected_len = (file.width * file.height) as usize;
    let mut layer_names: HashMap<&str, ()> = HashMap::new();
    for layer in &file.layers {
        if layer_names.insert(layer.name.as_str(), ()).is_some() {
            return Err(format!(
                "Tilemap validation failed: duplicate layer name '{}'",
                layer.name
            ));
        }
        if layer.kind == "tilelayer" && layer.data.len() != expected_len {
            return Err(format!(
                "Tilemap validation failed: layer '{}' has {} gids, expected {}",
                layer.name,
                layer.data.len(),
                expected_len
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "mnp_tilemap_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn sample_map_json() -> String {
        // 4x3 map; gid 1 collides, gid 2 does not.
        r#"
        {
          "width": 4, "height": 3, "tilewidth": 32, "tileheight": 32,
          "layers": [
            {
              "type": "tilelayer", "name": "ground",
              "data": [0, 0, 0, 0,
                       0, 2, 0, 0,
                       1, 1, 1, 1]
            },
            {
              "type": "objectgroup", "name": "objects",
              "objects": [
                { "name": "menina-spawn", "x": 100, "y": 50, "width": 16, "height": 16 },
                { "name": "exit" }
              ]
            }
          ],
          "tilesets": [
            {
              "firstgid": 1, "name": "Tiles", "columns": 4,
              "imagewidth": 128, "imageheight": 64,
              "tiles": [
                { "id": 0, "properties": [ { "name": "collides", "type": "bool", "value": true } ] },
                { "id": 1, "properties": [ { "name": "collides", "type": "bool", "value": false } ] }
              ]
            }
          ]
        }
        "#
        .to_string()
    }

    #[test]
    fn load_tilemap_from_path_parses_valid_map() {
        let path = temp_file_path("valid");
        fs::write(&path, sample_map_json()).expect("write temp map file");

        let map = load_tilemap_from_path(&path).expect("map should load");
        assert_eq!(map.width, 4);
        assert_eq!(map.tile_width, 32);
        assert!(map.tile_layer("ground").is_some());
        assert!(map.object_layer("objects").is_some());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn collision_cells_selects_only_collides_tiles() {
        let map = tilemap_from_json_str(&sample_map_json()).expect("map should parse");
        let cells = map
            .collision_cells("ground")
            .expect("ground layer should exist");
        // The bottom row is gid 1 (collides); the gid 2 tile at (1, 1) is not solid.
        assert_eq!(cells, vec![(0, 2), (1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn collision_cells_missing_layer_returns_none() {
        let map = tilemap_from_json_str(&sample_map_json()).expect("map should parse");
        assert!(map.collision_cells("lava").is_none());
    }

    #[test]
    fn object_fields_default_to_zero() {
        let map = tilemap_from_json_str(&sample_map_json()).expect("map should parse");
        let objects = &map.object_layer("objects").expect("layer exists").objects;
        let exit = objects.iter().find(|o| o.name == "exit").expect("exit");
        assert_eq!(exit.x, 0.0);
        assert_eq!(exit.y, 0.0);
        assert_eq!(exit.width, 0.0);
    }

    #[test]
    fn tile_source_rect_uses_tileset_columns() {
        let map = tilemap_from_json_str(&sample_map_json()).expect("map should parse");
        // gid 1 -> local id 0 -> top-left tile.
        assert_eq!(map.tile_source_rect(1), Some((0, 0, 32, 32)));
        // gid 6 -> local id 5 -> column 1, row 1.
        assert_eq!(map.tile_source_rect(6), Some((32, 32, 32, 32)));
        // gid 0 is "no tile".
        assert_eq!(map.tile_source_rect(0), None);
    }

    #[test]
    fn rejects_wrong_data_length() {
        let json = r#"
        {
          "width": 2, "height": 2, "tilewidth": 32, "tileheight": 32,
          "layers": [ { "type": "tilelayer", "name": "ground", "data": [0, 0, 0] } ]
        }
        "#;
        let err = tilemap_from_json_str(json).expect_err("short data should fail");
        assert!(err.contains("expected 4"));
    }

    #[test]
    fn rejects_duplicate_layer_names() {
        let json = r#"
        {
          "width": 1, "height": 1, "tilewidth": 32, "tileheight": 32,
          "layers": [
            { "type": "tilelayer", "name": "ground", "data": [0] },
            { "type": "objectgroup", "name": "ground", "objects": [] }
          ]
        }
        "#;
        let err = tilemap_from_json_str(json).expect_err("duplicate names should fail");
        assert!(err.contains("duplicate layer name"));
    }
}
