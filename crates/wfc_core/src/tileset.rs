//! Tileset description: the data contract between tileset authoring tools
//! and the solver.
//!
//! The layout matches the JSON files the tile sets ship with:
//!
//! ```json
//! { "tile_set": [
//!     { "image_path": "T.png", "number_of_rotations": 4,
//!       "sides": { "up": "1", "right": "1", "down": "0", "left": "1" } } ] }
//! ```
//!
//! Parsing the file is up to the caller (any serde format works). This
//! module validates a description and expands it into tile variants.

use crate::direction::{Direction, DirectionNames};
use crate::error::ConfigError;
use crate::tile::{EdgeLabels, TileId, TileVariant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

fn default_weight() -> f64 {
    1.0
}

/// Author-specified base tile, before rotation expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePrototype {
    /// Opaque rendering handle.
    pub image_path: String,
    /// 0 or 1: one orientation. 2: looks the same after a half turn.
    /// 4: all four quarter turns are distinct.
    #[serde(default)]
    pub number_of_rotations: u32,
    /// Edge label per configured direction name.
    pub sides: BTreeMap<String, String>,
    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl TilePrototype {
    /// Prototype keyed by the default direction names.
    pub fn new(image_path: impl Into<String>, rotations: u32, sides: [&str; 4]) -> Self {
        let names = DirectionNames::default();
        let sides = names
            .iter()
            .map(|(d, name)| (name.to_string(), sides[d.index()].to_string()))
            .collect();
        Self {
            image_path: image_path.into(),
            number_of_rotations: rotations,
            sides,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Number of distinct orientations this prototype expands into.
    pub fn rotation_count(&self) -> Result<usize, ConfigError> {
        match self.number_of_rotations {
            0 | 1 => Ok(1),
            2 => Ok(2),
            4 => Ok(4),
            rotations => Err(ConfigError::UnsupportedRotations {
                tile: self.image_path.clone(),
                rotations,
            }),
        }
    }

    /// Edge labels of the unrotated prototype.
    pub fn edge_labels(&self, names: &DirectionNames) -> Result<EdgeLabels, ConfigError> {
        if let Some(unknown) = self.sides.keys().find(|k| names.lookup(k).is_none()) {
            return Err(ConfigError::UnknownSide {
                tile: self.image_path.clone(),
                name: unknown.clone(),
            });
        }
        let side = |d: Direction| {
            self.sides
                .get(names.name(d))
                .cloned()
                .ok_or_else(|| ConfigError::MissingSide {
                    tile: self.image_path.clone(),
                    direction: names.name(d).to_string(),
                })
        };
        Ok(EdgeLabels::new(
            side(Direction::Up)?,
            side(Direction::Right)?,
            side(Direction::Down)?,
            side(Direction::Left)?,
        ))
    }

    /// Edge labels of the given orientation.
    ///
    /// `rotation` is taken modulo the rotation count, so a two-way tile
    /// only ever produces two label mappings.
    pub fn variant_edges(
        &self,
        names: &DirectionNames,
        rotation: usize,
    ) -> Result<EdgeLabels, ConfigError> {
        let count = self.rotation_count()?;
        Ok(self.edge_labels(names)?.rotated(rotation % count))
    }

    fn validate_weight(&self) -> Result<(), ConfigError> {
        if self.weight.is_finite() && self.weight > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidWeight {
                tile: self.image_path.clone(),
                weight: self.weight,
            })
        }
    }
}

/// A full tileset: the list of prototypes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilesetDescription {
    pub tile_set: Vec<TilePrototype>,
}

impl TilesetDescription {
    pub fn new(tile_set: Vec<TilePrototype>) -> Self {
        Self { tile_set }
    }

    /// Validate every prototype and expand rotations into tile variants.
    ///
    /// Variant ids are assigned in prototype order, rotations ascending.
    pub fn compile(&self, names: &DirectionNames) -> Result<Vec<TileVariant>, ConfigError> {
        if self.tile_set.is_empty() {
            return Err(ConfigError::EmptyTileset);
        }

        let mut variants = Vec::new();
        for (prototype, tile) in self.tile_set.iter().enumerate() {
            tile.validate_weight()?;
            let count = tile.rotation_count()?;
            let base = tile.edge_labels(names)?;
            let handle: Arc<str> = Arc::from(tile.image_path.as_str());

            for rotation in 0..count {
                variants.push(TileVariant {
                    id: TileId(variants.len()),
                    prototype,
                    edges: base.rotated(rotation),
                    rotation: rotation as u8,
                    weight: tile.weight,
                    handle: Arc::clone(&handle),
                });
            }
            debug!(
                "Expanded tile '{}' into {} orientation(s)",
                tile.image_path, count
            );
        }

        Ok(variants)
    }
}
