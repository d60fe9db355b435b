//! Hex tile terrain: axial grid math, tile placement, climate assignment.
//!
//! Tiles live on an axial grid with pointy-top hexes of unit circumradius.
//! Edge directions, counterclockwise from +x:
//!
//! ```text
//!      2 1
//!     3 - 0
//!      4 5
//! ```
//!
//! The playfield grows outward: placing a tile converts the boundary marker
//! under it into a real tile and surrounds it with fresh boundary markers.
//! A candidate placement must agree with every already-placed neighbor on
//! the shared edge contents.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use rand::Rng;

const SQRT3: f32 = 1.732_050_8;

pub type TileIndex = usize;
pub const INVALID_TILE: TileIndex = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Climate {
    #[default]
    None,
    Grassland,
    Plains,
    Forest,
    RockyDesert,
    SandyDesert,
    Rainforest,
    BorealForest,
    Taiga,
    Tundra,
}

pub const CLIMATE_NAMES: [&str; 10] = [
    "none",
    "grassland",
    "plains",
    "forest",
    "rocky desert",
    "sandy desert",
    "rainforest",
    "boreal forest",
    "taiga",
    "tundra",
];

/// Pairs of climates allowed to border each other. Identical climates are
/// always allowed.
pub const CLIMATE_ADJACENCIES: [(Climate, Climate); 5] = [
    (Climate::Grassland, Climate::Plains),
    (Climate::Grassland, Climate::Forest),
    (Climate::Grassland, Climate::Taiga),
    (Climate::Plains, Climate::SandyDesert),
    (Climate::Taiga, Climate::Tundra),
];

fn climates_compatible(a: Climate, b: Climate) -> bool {
    a == b
        || a == Climate::None
        || b == Climate::None
        || CLIMATE_ADJACENCIES
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

#[derive(Debug, Clone)]
pub struct HexTile {
    pub position: IVec2,
    /// Terrain id per edge, plus the center in slot 6.
    pub contents: [i32; 7],
    pub is_boundary: bool,
    pub is_candidate: bool,
    pub neighbors: [TileIndex; 6],
    pub climate: Climate,
}

impl Default for HexTile {
    fn default() -> Self {
        HexTile {
            position: IVec2::ZERO,
            contents: [0; 7],
            is_boundary: false,
            is_candidate: false,
            neighbors: [INVALID_TILE; 6],
            climate: Climate::None,
        }
    }
}

impl HexTile {
    /// Axial offsets of the six neighbors, in edge order.
    pub const NEIGHBOR_OFFSETS: [IVec2; 6] = [
        IVec2::new(1, 0),
        IVec2::new(0, 1),
        IVec2::new(-1, 1),
        IVec2::new(-1, 0),
        IVec2::new(0, -1),
        IVec2::new(1, -1),
    ];

    /// Corner positions of a unit tile, in edge order.
    pub const VERTICES: [Vec2; 6] = [
        Vec2::new(SQRT3 / 2.0, -0.5),
        Vec2::new(SQRT3 / 2.0, 0.5),
        Vec2::new(0.0, 1.0),
        Vec2::new(-SQRT3 / 2.0, 0.5),
        Vec2::new(-SQRT3 / 2.0, -0.5),
        Vec2::new(0.0, -1.0),
    ];

    /// Grid coordinates of the tile containing the given world position,
    /// by rounding in cube coordinates.
    pub fn world_to_grid(v: Vec2) -> IVec2 {
        let gx = v.x * (SQRT3 / 3.0) - v.y * (1.0 / 3.0);
        let gy = v.y * (2.0 / 3.0);
        let gz = -gx - gy;

        let rx = gx.round();
        let ry = gy.round();
        let rz = gz.round();

        let dx = (gx - rx).abs();
        let dy = (gy - ry).abs();
        let dz = (gz - rz).abs();

        if dx > dy && dx > dz {
            IVec2::new((-ry - rz) as i32, ry as i32)
        } else if dy > dz {
            IVec2::new(rx as i32, (-rx - rz) as i32)
        } else {
            IVec2::new(rx as i32, ry as i32)
        }
    }

    /// World position of the tile origin at the given grid coordinates.
    pub fn grid_to_world(v: IVec2) -> Vec2 {
        Vec2::new(
            v.x as f32 * SQRT3 + v.y as f32 * (SQRT3 / 2.0),
            v.y as f32 * 1.5,
        )
    }

    /// Edge content in direction `edge` after rotating the tile by
    /// `rotation` steps counterclockwise.
    pub fn rotated_content(&self, edge: usize, rotation: usize) -> i32 {
        self.contents[(edge + 6 - rotation % 6) % 6]
    }
}

/// The growing tile field.
#[derive(Debug, Default)]
pub struct HexGrid {
    tiles: Vec<HexTile>,
    boundary: Vec<TileIndex>,
    by_position: HashMap<(i32, i32), TileIndex>,
}

impl HexGrid {
    pub fn new() -> HexGrid {
        HexGrid::default()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.boundary.clear();
        self.by_position.clear();
    }

    pub fn tiles(&self) -> &[HexTile] {
        &self.tiles
    }

    pub fn boundary_tiles(&self) -> &[TileIndex] {
        &self.boundary
    }

    pub fn index_of(&self, position: IVec2) -> Option<TileIndex> {
        self.by_position.get(&(position.x, position.y)).copied()
    }

    pub fn get(&self, position: IVec2) -> Option<&HexTile> {
        self.index_of(position).map(|index| &self.tiles[index])
    }

    /// Place a tile, replacing the boundary marker at its position if one
    /// exists, linking neighbors both ways and surrounding the tile with new
    /// boundary markers.
    pub fn insert_tile(&mut self, position: IVec2, mut tile: HexTile) -> TileIndex {
        tile.position = position;
        tile.is_boundary = false;

        let index = match self.index_of(position) {
            Some(existing) => {
                tile.neighbors = self.tiles[existing].neighbors;
                self.boundary.retain(|&b| b != existing);
                self.tiles[existing] = tile;
                existing
            }
            None => {
                let index = self.tiles.len();
                self.tiles.push(tile);
                self.by_position.insert((position.x, position.y), index);
                index
            }
        };

        for (edge, offset) in HexTile::NEIGHBOR_OFFSETS.iter().enumerate() {
            let neighbor_pos = position + *offset;
            let neighbor = match self.index_of(neighbor_pos) {
                Some(neighbor) => neighbor,
                None => self.insert_boundary_tile(neighbor_pos),
            };
            self.tiles[index].neighbors[edge] = neighbor;
            self.tiles[neighbor].neighbors[(edge + 3) % 6] = index;
        }

        index
    }

    /// Insert an empty boundary marker at a free position.
    pub fn insert_boundary_tile(&mut self, position: IVec2) -> TileIndex {
        debug_assert!(self.index_of(position).is_none());
        let index = self.tiles.len();
        self.tiles.push(HexTile {
            position,
            is_boundary: true,
            ..HexTile::default()
        });
        self.by_position.insert((position.x, position.y), index);
        self.boundary.push(index);
        index
    }

    /// Whether `tile`, rotated by `rotation` steps, agrees with every placed
    /// neighbor of the boundary slot `index` on the shared edge.
    pub fn match_tile(&self, index: TileIndex, tile: &HexTile, rotation: usize) -> bool {
        let slot = &self.tiles[index];
        for edge in 0..6 {
            let neighbor = slot.neighbors[edge];
            if neighbor == INVALID_TILE {
                continue;
            }
            let neighbor = &self.tiles[neighbor];
            if neighbor.is_boundary {
                continue;
            }
            let opposite = neighbor.contents[(edge + 3) % 6];
            if tile.rotated_content(edge, rotation) != opposite {
                return false;
            }
        }
        true
    }

    /// All `(boundary slot, rotation)` pairs where the tile fits.
    pub fn placement_candidates(&self, tile: &HexTile) -> Vec<(TileIndex, usize)> {
        let mut candidates = Vec::new();
        for &index in &self.boundary {
            for rotation in 0..6 {
                if self.match_tile(index, tile, rotation) {
                    candidates.push((index, rotation));
                }
            }
        }
        candidates
    }

    /// Pick a climate for the tile at `index` that may border every placed
    /// neighbor's climate, uniformly among the legal choices.
    pub fn choose_climate(&self, index: TileIndex, rng: &mut impl Rng) -> Climate {
        let neighbor_climates: Vec<Climate> = self.tiles[index]
            .neighbors
            .iter()
            .filter(|&&n| n != INVALID_TILE)
            .map(|&n| &self.tiles[n])
            .filter(|t| !t.is_boundary && t.climate != Climate::None)
            .map(|t| t.climate)
            .collect();

        let all = [
            Climate::Grassland,
            Climate::Plains,
            Climate::Forest,
            Climate::RockyDesert,
            Climate::SandyDesert,
            Climate::Rainforest,
            Climate::BorealForest,
            Climate::Taiga,
            Climate::Tundra,
        ];
        let legal: Vec<Climate> = all
            .iter()
            .copied()
            .filter(|&c| neighbor_climates.iter().all(|&n| climates_compatible(c, n)))
            .collect();

        if legal.is_empty() {
            // Boxed in by incompatible neighbors; extend one of them.
            return neighbor_climates
                .first()
                .copied()
                .unwrap_or(Climate::Grassland);
        }
        legal[rng.gen_range(0..legal.len())]
    }
}
