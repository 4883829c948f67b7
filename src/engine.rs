//! Per-note playback lifecycle: pregenerated loop buffers, looping
//! channels, and one-shot previews.
//!
//! Audio is a best-effort enhancement. Every failure path in here (no
//! backend, no free channel, missing buffer) degrades to a logged no-op
//! so the lattice and chord logic stay fully usable without sound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::audio::{ChannelPool, PlaybackChannel};
use crate::pitch::{frequency_of, PITCH_CLASSES};
use crate::synth::{ToneBuffer, ToneSynthesizer, DEFAULT_SAMPLE_RATE};

/// Tuning for buffer generation and playback.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Octave the lattice sounds at.
    pub octave: u8,
    /// Length of each continuous loop buffer, seconds.
    pub loop_duration_secs: f32,
    /// Length of a one-shot preview, seconds.
    pub preview_duration_secs: f32,
    /// Fade-out tail on previews, seconds.
    pub fade_secs: f32,
    /// PCM sample rate for synthesized buffers.
    pub sample_rate: u32,
    /// Delay between successive chord preview notes, seconds.
    pub preview_spacing_secs: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            octave: 4,
            loop_duration_secs: 60.0,
            preview_duration_secs: 1.5,
            fade_secs: 0.3,
            sample_rate: DEFAULT_SAMPLE_RATE,
            preview_spacing_secs: 0.2,
        }
    }
}

/// Progress events from the pregeneration worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PregenEvent {
    /// One loop buffer finished; `done` of `total` are ready.
    NoteReady {
        note: &'static str,
        done: usize,
        total: usize,
    },
    /// Terminal event: the worker exited with `generated` buffers ready.
    /// `generated` falls short of the pitch-class count only after a
    /// cancellation or per-note failure.
    Complete { generated: usize },
}

/// Handle on the background pregeneration task.
pub struct PregenTask {
    events: Receiver<PregenEvent>,
    cancel: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PregenTask {
    /// Event stream, suitable for driving a loading screen.
    pub fn events(&self) -> &Receiver<PregenEvent> {
        &self.events
    }

    /// Ask the worker to stop before its next per-note generation.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the worker exits; true when every buffer was generated.
    /// The foreground builds the lattice and board only after this.
    pub fn wait(mut self) -> bool {
        let mut generated = 0;
        for event in self.events.iter() {
            if let PregenEvent::Complete { generated: n } = event {
                generated = n;
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        generated == PITCH_CLASSES.len()
    }
}

/// Owns buffer pregeneration, the note -> channel registry, and preview
/// scheduling. Clones share all state, so a clone can move into a worker
/// thread.
#[derive(Clone)]
pub struct AudioEngine {
    config: EngineConfig,
    synth: ToneSynthesizer,
    pool: Option<Arc<dyn ChannelPool>>,
    buffers: Arc<Mutex<HashMap<&'static str, Arc<ToneBuffer>>>>,
    playing: Arc<Mutex<HashMap<String, Box<dyn PlaybackChannel>>>>,
    preview_generation: Arc<AtomicU64>,
}

impl AudioEngine {
    /// `pool` is `None` when no audio backend is available; the engine
    /// then runs silently.
    pub fn new(pool: Option<Arc<dyn ChannelPool>>, config: EngineConfig) -> Self {
        Self {
            config,
            synth: ToneSynthesizer::new(config.sample_rate),
            pool,
            buffers: Arc::new(Mutex::new(HashMap::new())),
            playing: Arc::new(Mutex::new(HashMap::new())),
            preview_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Pre-render one loop buffer per pitch class on a background thread.
    pub fn pregenerate_all(&self) -> PregenTask {
        let (tx, rx) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let engine = self.clone();
        let cancel_flag = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name("tone-pregen".into())
            .spawn(move || engine.run_pregeneration(tx, cancel_flag))
            .expect("Failed to spawn pregeneration worker");

        PregenTask {
            events: rx,
            cancel,
            handle: Some(handle),
        }
    }

    fn run_pregeneration(&self, tx: Sender<PregenEvent>, cancel: Arc<AtomicBool>) {
        let total = PITCH_CLASSES.len();
        let mut generated = 0;
        info!(
            "Pregenerating {} loop buffers of {}s each",
            total, self.config.loop_duration_secs
        );

        for &note in PITCH_CLASSES.iter() {
            // Cancellation point between per-note generations, so shutdown
            // during loading cannot hang.
            if cancel.load(Ordering::Relaxed) {
                warn!("Pregeneration cancelled after {} of {} notes", generated, total);
                break;
            }

            match frequency_of(note, self.config.octave) {
                Ok(freq) => {
                    let buffer = self.synth.synthesize(freq, self.config.loop_duration_secs);
                    self.buffers
                        .lock()
                        .unwrap()
                        .insert(note, Arc::new(buffer));
                    generated += 1;
                    let _ = tx.send(PregenEvent::NoteReady {
                        note,
                        done: generated,
                        total,
                    });
                }
                Err(e) => warn!("Skipping {}: {}", note, e),
            }
        }

        info!("Pregeneration finished with {} buffers", generated);
        let _ = tx.send(PregenEvent::Complete { generated });
    }

    /// Whether a loop buffer for `note` is ready.
    pub fn has_buffer(&self, note: &str) -> bool {
        self.buffers.lock().unwrap().contains_key(note)
    }

    /// Start looping `note`'s pregenerated buffer. No-op if the note is
    /// already looping, the buffer is missing, or no channel is free.
    pub fn start_loop(&self, note: &str) {
        let buffer = match self.buffers.lock().unwrap().get(note) {
            Some(buffer) => Arc::clone(buffer),
            None => {
                warn!("No loop buffer for {}; toggled without sound", note);
                return;
            }
        };
        let Some(pool) = self.pool.as_ref() else {
            debug!("Audio backend absent; {} stays silent", note);
            return;
        };

        let mut playing = self.playing.lock().unwrap();
        if playing.contains_key(note) {
            return;
        }
        match pool.find_available_channel() {
            Some(mut channel) => {
                channel.play(buffer, true);
                playing.insert(note.to_string(), channel);
                debug!("Started loop for {}", note);
            }
            None => warn!("No free channel for {}", note),
        }
    }

    /// Stop a looping note and release its channel; no-op if not looping.
    pub fn stop_loop(&self, note: &str) {
        let mut playing = self.playing.lock().unwrap();
        if let Some(mut channel) = playing.remove(note) {
            channel.stop();
            debug!("Stopped loop for {}", note);
        }
    }

    /// Stop and deregister every looping note.
    pub fn stop_all(&self) {
        let mut playing = self.playing.lock().unwrap();
        for (note, mut channel) in playing.drain() {
            channel.stop();
            debug!("Stopped loop for {}", note);
        }
    }

    /// Notes currently looping, sorted. For displays and tests.
    pub fn playing_notes(&self) -> Vec<String> {
        let mut notes: Vec<String> = self.playing.lock().unwrap().keys().cloned().collect();
        notes.sort();
        notes
    }

    /// Synthesize and play a short faded one-shot of `note`, independent
    /// of the loop registry: a looping note can be previewed on top.
    pub fn preview(&self, note: &str) {
        let Some(pool) = self.pool.as_ref() else {
            debug!("Audio backend absent; preview of {} skipped", note);
            return;
        };
        let freq = match frequency_of(note, self.config.octave) {
            Ok(freq) => freq,
            Err(e) => {
                warn!("Preview skipped: {}", e);
                return;
            }
        };

        let buffer = self.synth.synthesize_faded(
            freq,
            self.config.preview_duration_secs,
            self.config.fade_secs,
        );
        match pool.find_available_channel() {
            Some(mut channel) => {
                channel.play(Arc::new(buffer), false);
                debug!("Previewing {}", note);
            }
            None => warn!("No free channel for preview of {}", note),
        }
    }

    /// Schedule previews staggered by the configured spacing so they sound
    /// arpeggiated. Each is an independent deferred task; a later call to
    /// this or `cancel_previews` invalidates any still pending.
    pub fn schedule_previews(&self, notes: &[&'static str]) {
        let generation = self.preview_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let spacing = Duration::from_secs_f32(self.config.preview_spacing_secs);

        for (i, &note) in notes.iter().enumerate() {
            let engine = self.clone();
            let delay = spacing * i as u32;
            thread::Builder::new()
                .name(format!("preview-{}", note))
                .spawn(move || {
                    thread::sleep(delay);
                    // A newer chord request makes this preview stale.
                    if engine.preview_generation.load(Ordering::SeqCst) == generation {
                        engine.preview(note);
                    }
                })
                .expect("Failed to spawn preview timer");
        }
    }

    /// Invalidate previews still waiting on their delay.
    pub fn cancel_previews(&self) {
        self.preview_generation.fetch_add(1, Ordering::SeqCst);
    }
}
