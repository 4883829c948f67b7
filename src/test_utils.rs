//! Recording audio backend for unit tests.
//!
//! We are deaf in CI: playback is verified by observing the commands the
//! engine issues, never by listening.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{ChannelPool, PlaybackChannel};
use crate::synth::ToneBuffer;

/// One playback command observed by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Played {
        channel: usize,
        frames: usize,
        looped: bool,
    },
    Stopped {
        channel: usize,
    },
}

/// Channel pool that records every command. `capacity` bounds how many
/// handles may be outstanding at once; `None` is unlimited.
pub struct RecordingPool {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
    next_channel: AtomicUsize,
    in_use: Arc<AtomicUsize>,
    capacity: Option<usize>,
}

impl RecordingPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Arc::new(Mutex::new(Vec::new())),
            next_channel: AtomicUsize::new(0),
            in_use: Arc::new(AtomicUsize::new(0)),
            capacity: None,
        })
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            events: Arc::new(Mutex::new(Vec::new())),
            next_channel: AtomicUsize::new(0),
            in_use: Arc::new(AtomicUsize::new(0)),
            capacity: Some(capacity),
        })
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn play_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Played { .. }))
            .count()
    }

    pub fn looped_play_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Played { looped: true, .. }))
            .count()
    }

    pub fn one_shot_play_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Played { looped: false, .. }))
            .count()
    }

    pub fn stop_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Stopped { .. }))
            .count()
    }
}

impl ChannelPool for RecordingPool {
    fn find_available_channel(&self) -> Option<Box<dyn PlaybackChannel>> {
        if let Some(capacity) = self.capacity {
            if self.in_use.load(Ordering::SeqCst) >= capacity {
                return None;
            }
        }
        self.in_use.fetch_add(1, Ordering::SeqCst);
        let id = self.next_channel.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(RecordingChannel {
            id,
            events: Arc::clone(&self.events),
            in_use: Arc::clone(&self.in_use),
        }))
    }
}

struct RecordingChannel {
    id: usize,
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
    in_use: Arc<AtomicUsize>,
}

impl PlaybackChannel for RecordingChannel {
    fn play(&mut self, buffer: Arc<ToneBuffer>, looped: bool) {
        self.events.lock().unwrap().push(PlaybackEvent::Played {
            channel: self.id,
            frames: buffer.frames(),
            looped,
        });
    }

    fn stop(&mut self) {
        self.events
            .lock()
            .unwrap()
            .push(PlaybackEvent::Stopped { channel: self.id });
    }
}

impl Drop for RecordingChannel {
    fn drop(&mut self) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}
