//! Pointy-topped hexagon geometry and the laid-out board of cells.

use std::collections::HashMap;

use crate::lattice::{CellCoord, Lattice};
use crate::pitch::{pitch_class_name, PITCH_CLASS_COUNT};

/// Continuous position in layout space.
pub type Point = (f32, f32);

/// Default hexagon size, center to vertex.
pub const DEFAULT_HEX_SIZE: f32 = 0.5;

/// Column-to-column spacing for a given hex size.
fn h_spacing(hex_size: f32) -> f32 {
    hex_size * 3.0_f32.sqrt() * 0.93
}

/// Row-to-row spacing for a given hex size.
fn v_spacing(hex_size: f32) -> f32 {
    hex_size * 1.7
}

/// Vertices of a pointy-topped regular hexagon. The 7th point repeats the
/// first so the polygon closes for rendering.
pub fn corner_points(center: Point, size: f32) -> [Point; 7] {
    let mut corners = [(0.0, 0.0); 7];
    for (i, corner) in corners.iter_mut().enumerate() {
        let angle = 2.0 * std::f32::consts::PI * i as f32 / 6.0;
        *corner = (
            center.0 + size * angle.cos(),
            center.1 + size * angle.sin(),
        );
    }
    corners
}

/// Layout position of a lattice cell. Odd columns shift by half a vertical
/// step, which tessellates the pointy-topped grid and makes geometric
/// adjacency match the lattice's interval relationships.
pub fn layout_position(row: i32, col: i32, hex_size: f32) -> Point {
    let x = col as f32 * h_spacing(hex_size);
    let mut y = row as f32 * v_spacing(hex_size);
    if col.rem_euclid(2) == 1 {
        y += v_spacing(hex_size) / 2.0;
    }
    (x, y)
}

/// Exact containment test for a pointy-topped hexagon, not a bounding box.
pub fn point_in_hex(point: Point, center: Point, size: f32) -> bool {
    let dx = (point.0 - center.0).abs();
    let dy = (point.1 - center.1).abs();

    if dy > size {
        return false;
    }

    let max_x = size * 3.0_f32.sqrt() * (1.0 - dy / (2.0 * size));
    dx <= max_x
}

/// One rendered instance of a lattice cell. A note recurs across the
/// board; each instance toggles independently.
#[derive(Debug, Clone)]
pub struct HexCell {
    pub coord: CellCoord,
    pub position: Point,
    pub pitch_index: usize,
    pub note: &'static str,
    /// Position on a 12-hue color wheel; neighbours a fifth apart land on
    /// adjacent hues. Mapping hues to actual colors is the renderer's job.
    pub color_index: usize,
    pub active: bool,
}

/// All cells of a lattice at their layout positions.
#[derive(Debug, Clone)]
pub struct HexBoard {
    hex_size: f32,
    cells: Vec<HexCell>,
    by_coord: HashMap<CellCoord, usize>,
    note_positions: HashMap<&'static str, Vec<CellCoord>>,
}

impl HexBoard {
    /// Lay out every cell of `lattice` with hexagons of `hex_size`.
    pub fn from_lattice(lattice: &Lattice, hex_size: f32) -> Self {
        let mut cells: Vec<HexCell> = lattice
            .iter()
            .map(|((row, col), pitch_index)| HexCell {
                coord: (row, col),
                position: layout_position(row, col, hex_size),
                pitch_index,
                note: pitch_class_name(pitch_index),
                color_index: (pitch_index * 7) % PITCH_CLASS_COUNT,
                active: false,
            })
            .collect();
        cells.sort_by_key(|cell| cell.coord);

        let mut by_coord = HashMap::with_capacity(cells.len());
        let mut note_positions: HashMap<&'static str, Vec<CellCoord>> = HashMap::new();
        for (i, cell) in cells.iter().enumerate() {
            by_coord.insert(cell.coord, i);
            note_positions.entry(cell.note).or_default().push(cell.coord);
        }

        Self {
            hex_size,
            cells,
            by_coord,
            note_positions,
        }
    }

    pub fn hex_size(&self) -> f32 {
        self.hex_size
    }

    /// All cells, ordered by coordinate.
    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    pub fn cell(&self, coord: CellCoord) -> Option<&HexCell> {
        self.by_coord.get(&coord).map(|&i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut HexCell> {
        let i = *self.by_coord.get(&coord)?;
        Some(&mut self.cells[i])
    }

    /// Every board position carrying `note`.
    pub fn positions_of(&self, note: &str) -> &[CellCoord] {
        self.note_positions
            .get(note)
            .map(|coords| coords.as_slice())
            .unwrap_or(&[])
    }

    /// Cell containing `point`, if any. Linear scan, first hit wins; the
    /// board tops out at a few hundred cells, so no spatial index is kept.
    /// A bucketed grid would be a drop-in replacement at larger scales.
    pub fn hex_at(&self, point: Point) -> Option<CellCoord> {
        self.cells
            .iter()
            .find(|cell| point_in_hex(point, cell.position, self.hex_size))
            .map(|cell| cell.coord)
    }
}
