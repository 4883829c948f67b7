//! Additive harmonic tone synthesis into 16-bit stereo PCM buffers.

use std::f64::consts::PI;
use std::path::Path;

/// Default PCM sample rate for synthesized tones.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Relative amplitude and frequency multiple of each partial.
const HARMONICS: [(f64, f64); 4] = [(1.0, 1.0), (0.5, 2.0), (0.3, 3.0), (0.2, 4.0)];

/// Peak of the normalized waveform after scaling.
const SCALE: f64 = 15000.0;

const CLIP: f64 = 32767.0;

/// Interleaved stereo 16-bit PCM with identical left and right channels.
#[derive(Debug, Clone)]
pub struct ToneBuffer {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl ToneBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Interleaved L/R samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Frame `i` as (left, right).
    pub fn frame(&self, i: usize) -> (i16, i16) {
        (self.samples[i * 2], self.samples[i * 2 + 1])
    }

    /// Write the buffer to a 16-bit stereo WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

/// Builds tone buffers at a fixed sample rate.
#[derive(Debug, Clone, Copy)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl ToneSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Synthesize `duration_secs` of tone at `frequency`.
    ///
    /// Loop playback wraps wherever the buffer ends; the wrap point is not
    /// forced to a zero crossing, so loop buffers should be long (the
    /// engine uses 60 s) to keep the wrap inaudible in practice.
    pub fn synthesize(&self, frequency: f64, duration_secs: f32) -> ToneBuffer {
        self.render(frequency, duration_secs, 0.0)
    }

    /// Synthesize with a linear fade to zero over the final `fade_secs`,
    /// avoiding the click when a one-shot sample ends.
    pub fn synthesize_faded(
        &self,
        frequency: f64,
        duration_secs: f32,
        fade_secs: f32,
    ) -> ToneBuffer {
        self.render(frequency, duration_secs, fade_secs)
    }

    fn render(&self, frequency: f64, duration_secs: f32, fade_secs: f32) -> ToneBuffer {
        let frames = (duration_secs as f64 * self.sample_rate as f64) as usize;
        let fade_frames = (fade_secs as f64 * self.sample_rate as f64) as usize;
        let mut samples = Vec::with_capacity(frames * 2);

        for i in 0..frames {
            let mut sample = 0.0;
            for (amp, mult) in HARMONICS {
                sample +=
                    amp * (2.0 * PI * frequency * mult * i as f64 / self.sample_rate as f64).sin();
            }
            // Mean of the contributions, by harmonic count rather than by
            // the amplitude sum.
            sample /= HARMONICS.len() as f64;

            if fade_frames > 0 && i + fade_frames >= frames {
                let remaining = frames - i;
                sample *= (remaining - 1) as f64 / fade_frames as f64;
            }

            let value = (sample * SCALE).clamp(-CLIP, CLIP) as i16;
            samples.push(value);
            samples.push(value);
        }

        ToneBuffer {
            sample_rate: self.sample_rate,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_frame_count_and_stereo() {
        let synth = ToneSynthesizer::new(22050);
        let buffer = synth.synthesize(440.0, 1.0);

        assert_eq!(buffer.frames(), 22050);
        assert_eq!(buffer.samples().len(), 44100);

        let mut peak = 0u16;
        for i in 0..buffer.frames() {
            let (left, right) = buffer.frame(i);
            assert_eq!(left, right, "frame {} channels should match", i);
            peak = peak.max(left.unsigned_abs());
        }
        assert!(peak > 0, "buffer should not be silent");
        // Clipped to the signed-16-bit range before quantizing.
        assert!(buffer
            .samples()
            .iter()
            .all(|&s| (-32767..=32767).contains(&s)));
    }

    #[test]
    fn test_sample_matches_formula() {
        let synth = ToneSynthesizer::new(22050);
        let buffer = synth.synthesize(440.0, 0.01);

        for i in [0usize, 1, 17, 100] {
            let mut expected = 0.0f64;
            for (amp, mult) in HARMONICS {
                expected += amp * (2.0 * PI * 440.0 * mult * i as f64 / 22050.0).sin();
            }
            expected /= 4.0;
            let expected = (expected * 15000.0).clamp(-32767.0, 32767.0) as i16;
            assert_eq!(buffer.frame(i).0, expected, "frame {}", i);
        }
    }

    #[test]
    fn test_fade_out_reaches_zero() {
        let synth = ToneSynthesizer::new(22050);
        let buffer = synth.synthesize_faded(440.0, 0.5, 0.3);

        let frames = buffer.frames();
        assert_eq!(
            buffer.frame(frames - 1),
            (0, 0),
            "faded tail must end silent"
        );

        // Before the fade begins the tone is at full level.
        let pre_fade = frames - (0.3 * 22050.0) as usize - 10;
        assert_ne!(buffer.frame(pre_fade).0, 0);

        // The tail envelope never grows.
        let fade_start = frames - (0.3 * 22050.0) as usize;
        let mut last_peak = u16::MAX;
        for chunk_start in (fade_start..frames).step_by(441) {
            let end = (chunk_start + 441).min(frames);
            let peak = (chunk_start..end)
                .map(|i| buffer.frame(i).0.unsigned_abs())
                .max()
                .unwrap();
            assert!(
                peak <= last_peak,
                "fade envelope rose near frame {}",
                chunk_start
            );
            last_peak = peak;
        }
    }

    #[test]
    fn test_unfaded_buffer_has_hot_tail() {
        let synth = ToneSynthesizer::new(22050);
        let buffer = synth.synthesize(440.0, 0.5);
        let frames = buffer.frames();
        let tail_peak = (frames - 441..frames)
            .map(|i| buffer.frame(i).0.unsigned_abs())
            .max()
            .unwrap();
        assert!(tail_peak > 5000, "loop buffers keep full level to the end");
    }

    #[test]
    fn test_write_wav_round_trip() {
        let synth = ToneSynthesizer::new(22050);
        let buffer = synth.synthesize(440.0, 0.1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        buffer.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);

        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, buffer.samples());
    }
}
