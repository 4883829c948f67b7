//! # Tonnetz - Interactive Pitch Lattice Engine
//!
//! A Tonnetz (tone network) lays pitch classes out on a hexagonal lattice
//! so that geometric adjacency encodes interval relationships: one column
//! step is a perfect fifth, a northeast diagonal a major third, a
//! southeast diagonal a minor third. This crate is the non-visual engine
//! behind such a grid: lattice generation, hexagon hit-testing, the
//! toggle/drag interaction state machine, triad detection with a compact
//! triangle outline, and sustained-tone playback from additively
//! synthesized loop buffers.
//!
//! Rendering, windowing, and the event loop stay outside. The embedder
//! feeds pointer/key events in, implements [`controller::RenderSink`] to
//! redraw what changed, and hands the engine an audio backend (the
//! bundled cpal one, or anything implementing [`audio::ChannelPool`]).
//!
//! ## Quick Start (headless)
//!
//! ```rust
//! use tonnetz::controller::{InteractionController, NullRenderSink};
//! use tonnetz::engine::{AudioEngine, EngineConfig};
//! use tonnetz::hex::{HexBoard, DEFAULT_HEX_SIZE};
//! use tonnetz::lattice::Lattice;
//!
//! // No audio backend attached; the engine degrades to silence.
//! let config = EngineConfig {
//!     loop_duration_secs: 0.05,
//!     ..Default::default()
//! };
//! let engine = AudioEngine::new(None, config);
//!
//! // Loop buffers render on a background thread; the board is built only
//! // after the completion signal.
//! let task = engine.pregenerate_all();
//! assert!(task.wait());
//!
//! let lattice = Lattice::build(7, 12).unwrap();
//! let board = HexBoard::from_lattice(&lattice, DEFAULT_HEX_SIZE);
//! let mut controller = InteractionController::new(board, engine, Box::new(NullRenderSink));
//!
//! // Press on the center cell: C toggles on.
//! let origin = controller.board().cell((3, 6)).unwrap().position;
//! controller.on_press(origin);
//! controller.on_release();
//! assert_eq!(controller.active_cells().len(), 1);
//!
//! // Key "C" highlights the C major triad across the whole board.
//! controller.on_key('C');
//! assert!(!controller.chord_highlights().is_empty());
//! ```
//!
//! ## With a real audio device
//!
//! ```rust,no_run
//! use tonnetz::audio::CpalOutput;
//! use tonnetz::engine::{AudioEngine, EngineConfig};
//!
//! let output = CpalOutput::new().expect("audio device");
//! let engine = AudioEngine::new(Some(output.pool()), EngineConfig::default());
//! let task = engine.pregenerate_all();
//! // ... drive a loading screen off task.events() ...
//! task.wait();
//! engine.start_loop("A");
//! ```
//!
//! ## Modules
//!
//! - [`pitch`] - pitch-class names, enharmonics, equal-temperament tuning
//! - [`lattice`] - the Tonnetz grid builder
//! - [`hex`] - hexagon geometry, layout, hit-testing, the cell board
//! - [`synth`] - additive harmonic synthesis into PCM buffers
//! - [`audio`] - abstract playback channels and the cpal mixer
//! - [`engine`] - pregeneration, loop playback, previews
//! - [`chord`] - triad spelling and compact-triangle selection
//! - [`controller`] - the interaction state machine

pub mod audio;
pub mod chord;
pub mod controller;
pub mod engine;
pub mod hex;
pub mod lattice;
pub mod pitch;
pub mod synth;

#[cfg(test)]
pub mod test_utils;
