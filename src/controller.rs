//! Toggle/drag/chord interaction state machine.
//!
//! The controller owns the authoritative toggle and highlight state; the
//! embedding renderer observes changes through a [`RenderSink`] and reads
//! cell flags back from the board.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::chord::{chord_indices, tightest_triangle, ChordQuality, TRIANGLE_PERIMETER_LIMIT};
use crate::engine::AudioEngine;
use crate::hex::{HexBoard, Point};
use crate::lattice::CellCoord;
use crate::pitch::{pitch_class_index, pitch_class_name, PitchError};

/// How a cell should currently be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellVisual {
    /// Inactive, base color for its pitch class.
    Base,
    /// Toggled on.
    Active,
    /// Highlighted by a chord request and not toggled on.
    ChordHighlight,
}

/// Redraw callbacks the embedding renderer implements. Invoked whenever a
/// cell's active/highlight state changes.
pub trait RenderSink {
    fn cell_changed(&mut self, coord: CellCoord, visual: CellVisual);
    fn triad_drawn(&mut self, triangle: [Point; 3], quality: ChordQuality);
    fn triads_cleared(&mut self);
}

/// Sink that drops every notification; for headless or audio-only use.
pub struct NullRenderSink;

impl RenderSink for NullRenderSink {
    fn cell_changed(&mut self, _coord: CellCoord, _visual: CellVisual) {}
    fn triad_drawn(&mut self, _triangle: [Point; 3], _quality: ChordQuality) {}
    fn triads_cleared(&mut self) {}
}

/// Press/drag/key state machine over a laid-out board.
pub struct InteractionController {
    board: HexBoard,
    engine: AudioEngine,
    render: Box<dyn RenderSink>,
    active: HashSet<CellCoord>,
    chord_highlights: HashSet<CellCoord>,
    dragging: bool,
    /// While dragging: true turns cells on, false turns them off.
    drag_turn_on: bool,
    /// Cells already toggled in the current gesture; revisits are no-ops.
    visited: HashSet<CellCoord>,
}

impl InteractionController {
    pub fn new(board: HexBoard, engine: AudioEngine, render: Box<dyn RenderSink>) -> Self {
        Self {
            board,
            engine,
            render,
            active: HashSet::new(),
            chord_highlights: HashSet::new(),
            dragging: false,
            drag_turn_on: false,
            visited: HashSet::new(),
        }
    }

    pub fn board(&self) -> &HexBoard {
        &self.board
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    /// Cells currently toggled on.
    pub fn active_cells(&self) -> &HashSet<CellCoord> {
        &self.active
    }

    /// Cells highlighted by the last chord request.
    pub fn chord_highlights(&self) -> &HashSet<CellCoord> {
        &self.chord_highlights
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Pointer press. A hit starts a drag gesture whose direction is the
    /// opposite of the hit cell's current state; a miss is a no-op.
    pub fn on_press(&mut self, point: Point) {
        let Some(coord) = self.board.hex_at(point) else {
            return;
        };

        self.dragging = true;
        self.visited.clear();
        self.visited.insert(coord);
        self.drag_turn_on = !self.active.contains(&coord);
        self.toggle(coord, true);
    }

    /// Pointer motion. While dragging, each newly visited cell whose state
    /// does not already match the gesture direction is toggled once.
    pub fn on_motion(&mut self, point: Point) {
        if !self.dragging {
            return;
        }
        let Some(coord) = self.board.hex_at(point) else {
            return;
        };
        if !self.visited.insert(coord) {
            return;
        }
        if self.active.contains(&coord) != self.drag_turn_on {
            self.toggle(coord, true);
        }
    }

    /// Pointer release ends the gesture.
    pub fn on_release(&mut self) {
        self.dragging = false;
        self.visited.clear();
    }

    /// Space clears everything; C..B request major chords, c..b minor.
    /// Any other key is ignored.
    pub fn on_key(&mut self, key: char) {
        match key {
            ' ' => self.clear_all(),
            'C' | 'D' | 'E' | 'F' | 'G' | 'A' | 'B' => {
                let root = key.to_string();
                if let Err(e) = self.highlight_chord(&root, ChordQuality::Major) {
                    warn!("Chord request failed: {}", e);
                }
            }
            'c' | 'd' | 'e' | 'f' | 'g' | 'a' | 'b' => {
                let root = key.to_ascii_uppercase().to_string();
                if let Err(e) = self.highlight_chord(&root, ChordQuality::Minor) {
                    warn!("Chord request failed: {}", e);
                }
            }
            _ => {}
        }
    }

    /// Flip one cell. The looping tone follows the flag when `play_sound`.
    pub fn toggle(&mut self, coord: CellCoord, play_sound: bool) {
        let note = match self.board.cell(coord) {
            Some(cell) => cell.note,
            None => return,
        };

        if self.active.remove(&coord) {
            if let Some(cell) = self.board.cell_mut(coord) {
                cell.active = false;
            }
            self.render.cell_changed(coord, CellVisual::Base);
            if play_sound {
                self.engine.stop_loop(note);
            }
        } else {
            self.active.insert(coord);
            if let Some(cell) = self.board.cell_mut(coord) {
                cell.active = true;
            }
            self.render.cell_changed(coord, CellVisual::Active);
            if play_sound {
                self.engine.start_loop(note);
            }
        }
    }

    /// Highlight every recurrence of the triad's pitch classes, outline the
    /// tightest compact voicing, and preview the three notes staggered.
    pub fn highlight_chord(
        &mut self,
        root: &str,
        quality: ChordQuality,
    ) -> Result<(), PitchError> {
        self.clear_chord_highlights();

        let root_index = pitch_class_index(root)?;
        let indices = chord_indices(root_index, quality);

        let matches: Vec<(CellCoord, Point)> = self
            .board
            .cells()
            .iter()
            .filter(|cell| indices.contains(&cell.pitch_index))
            .map(|cell| (cell.coord, cell.position))
            .collect();

        let mut positions = Vec::with_capacity(matches.len());
        for (coord, position) in matches {
            self.chord_highlights.insert(coord);
            if !self.active.contains(&coord) {
                self.render.cell_changed(coord, CellVisual::ChordHighlight);
            }
            positions.push(position);
        }

        if let Some((triangle, perimeter)) = tightest_triangle(&positions) {
            if perimeter < TRIANGLE_PERIMETER_LIMIT {
                self.render.triad_drawn(triangle, quality);
            }
        }

        let notes = [
            pitch_class_name(indices[0]),
            pitch_class_name(indices[1]),
            pitch_class_name(indices[2]),
        ];
        self.engine.schedule_previews(&notes);
        debug!("Highlighted {} {:?}", root, quality);
        Ok(())
    }

    /// Drop chord highlights, restoring non-active cells to base visuals,
    /// and remove any drawn triangle.
    pub fn clear_chord_highlights(&mut self) {
        let coords: Vec<CellCoord> = self.chord_highlights.drain().collect();
        for coord in coords {
            if !self.active.contains(&coord) {
                self.render.cell_changed(coord, CellVisual::Base);
            }
        }
        self.render.triads_cleared();
    }

    /// Clear highlights, stop every looping note, deactivate every cell.
    pub fn clear_all(&mut self) {
        self.clear_chord_highlights();
        self.engine.stop_all();

        let coords: Vec<CellCoord> = self.active.drain().collect();
        for coord in coords {
            if let Some(cell) = self.board.cell_mut(coord) {
                cell.active = false;
            }
            self.render.cell_changed(coord, CellVisual::Base);
        }
    }
}
