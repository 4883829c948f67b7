//! Audio output channels over cpal.
//!
//! Works with JACK, ALSA, OpenSL ES (Android/Termux), etc. The engine
//! only ever talks to the `ChannelPool`/`PlaybackChannel` traits, so a
//! different backend or a test mock can stand in for the device.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::synth::ToneBuffer;

/// Hands out playback channels; `None` when every channel is busy.
pub trait ChannelPool: Send + Sync {
    fn find_available_channel(&self) -> Option<Box<dyn PlaybackChannel>>;
}

/// One playback slot: plays a single buffer, optionally looping, until
/// stopped or the buffer ends. Dropping the handle releases the slot
/// without cutting off a one-shot still playing.
pub trait PlaybackChannel: Send {
    fn play(&mut self, buffer: Arc<ToneBuffer>, looped: bool);
    fn stop(&mut self);
}

/// Number of mixer slots in the default output.
const CHANNEL_COUNT: usize = 8;

#[derive(Default)]
struct Slot {
    buffer: Option<Arc<ToneBuffer>>,
    /// Fractional frame position into the buffer.
    position: f32,
    /// Frames advanced per output frame; buffer rate over device rate.
    step: f32,
    looped: bool,
    active: bool,
    /// Held by an outstanding channel handle.
    reserved: bool,
}

struct Mixer {
    slots: Vec<Slot>,
    out_rate: f32,
}

impl Mixer {
    fn new(out_rate: f32) -> Self {
        let mut slots = Vec::with_capacity(CHANNEL_COUNT);
        for _ in 0..CHANNEL_COUNT {
            slots.push(Slot::default());
        }
        Self { slots, out_rate }
    }

    fn process_audio<T>(&mut self, output: &mut [T], channels: usize)
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        for frame in output.chunks_mut(channels) {
            let mut left = 0.0f32;
            let mut right = 0.0f32;

            for slot in &mut self.slots {
                if !slot.active {
                    continue;
                }
                let Some(buffer) = slot.buffer.as_ref() else {
                    slot.active = false;
                    continue;
                };
                let frames = buffer.frames();
                if frames == 0 {
                    slot.active = false;
                    slot.buffer = None;
                    continue;
                }

                if slot.position >= frames as f32 {
                    if slot.looped {
                        slot.position %= frames as f32;
                    } else {
                        slot.active = false;
                        slot.buffer = None;
                        continue;
                    }
                }

                // Linear interpolation between neighbouring frames; loops
                // wrap to the front of the buffer.
                let idx = slot.position as usize;
                let frac = slot.position - idx as f32;
                let next = if idx + 1 < frames {
                    idx + 1
                } else if slot.looped {
                    0
                } else {
                    idx
                };

                let (l0, r0) = buffer.frame(idx);
                let (l1, r1) = buffer.frame(next);
                left += (l0 as f32 * (1.0 - frac) + l1 as f32 * frac) / 32768.0;
                right += (r0 as f32 * (1.0 - frac) + r1 as f32 * frac) / 32768.0;

                slot.position += slot.step;
            }

            // Soft clipping to prevent distortion
            left = left.tanh() * 0.8;
            right = right.tanh() * 0.8;

            for (i, out) in frame.iter_mut().enumerate() {
                *out = T::from_sample(if i % 2 == 0 { left } else { right });
            }
        }
    }
}

/// Channel pool backed by the shared mixer. Cheap to clone into worker
/// threads; the owning `CpalOutput` keeps the device stream alive.
#[derive(Clone)]
pub struct CpalChannelPool {
    mixer: Arc<Mutex<Mixer>>,
}

impl ChannelPool for CpalChannelPool {
    fn find_available_channel(&self) -> Option<Box<dyn PlaybackChannel>> {
        let mut mixer = self.mixer.lock().unwrap();
        let idx = mixer
            .slots
            .iter()
            .position(|slot| !slot.active && !slot.reserved)?;
        mixer.slots[idx].reserved = true;
        Some(Box::new(CpalChannel {
            mixer: Arc::clone(&self.mixer),
            slot: idx,
        }))
    }
}

struct CpalChannel {
    mixer: Arc<Mutex<Mixer>>,
    slot: usize,
}

impl PlaybackChannel for CpalChannel {
    fn play(&mut self, buffer: Arc<ToneBuffer>, looped: bool) {
        let mut mixer = self.mixer.lock().unwrap();
        let step = buffer.sample_rate() as f32 / mixer.out_rate;
        let slot = &mut mixer.slots[self.slot];
        slot.buffer = Some(buffer);
        slot.position = 0.0;
        slot.step = step;
        slot.looped = looped;
        slot.active = true;
    }

    fn stop(&mut self) {
        let mut mixer = self.mixer.lock().unwrap();
        let slot = &mut mixer.slots[self.slot];
        slot.active = false;
        slot.buffer = None;
        slot.position = 0.0;
    }
}

impl Drop for CpalChannel {
    fn drop(&mut self) {
        // Release the reservation; an unfinished one-shot keeps playing and
        // the slot frees itself when the buffer ends.
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.slots[self.slot].reserved = false;
        }
    }
}

/// Owns the cpal output stream and the slot mixer behind it.
pub struct CpalOutput {
    sample_rate: u32,
    pool: CpalChannelPool,
    _stream: cpal::Stream,
}

impl CpalOutput {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Get the default audio host (JACK/ALSA/OpenSL ES/etc)
        let host = cpal::default_host();
        info!("Audio host: {:?}", host.id());

        let device = host
            .default_output_device()
            .ok_or("No audio output device found")?;
        info!("Audio device: {}", device.name()?);

        let config = device.default_output_config()?;
        info!("Audio config: {:?}", config);

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        let mixer = Arc::new(Mutex::new(Mixer::new(sample_rate as f32)));
        let mixer_clone = Arc::clone(&mixer);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &config.into(), mixer_clone, channels)
            }
            cpal::SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &config.into(), mixer_clone, channels)
            }
            cpal::SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &config.into(), mixer_clone, channels)
            }
            _ => return Err("Unsupported sample format".into()),
        }?;

        stream.play()?;
        info!("Audio stream started at {} Hz", sample_rate);

        Ok(Self {
            sample_rate,
            pool: CpalChannelPool { mixer },
            _stream: stream,
        })
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mixer: Arc<Mutex<Mixer>>,
        channels: usize,
    ) -> Result<cpal::Stream, Box<dyn std::error::Error>>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut mixer = mixer.lock().unwrap();
                mixer.process_audio(data, channels);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;

        Ok(stream)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Pool handle for the engine; shares the mixer with the stream.
    pub fn pool(&self) -> Arc<dyn ChannelPool> {
        Arc::new(self.pool.clone())
    }
}
