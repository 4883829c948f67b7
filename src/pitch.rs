//! Pitch classes, enharmonic spellings, and equal-temperament tuning.

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

/// Number of pitch classes in the octave.
pub const PITCH_CLASS_COUNT: usize = 12;

/// Canonical pitch-class names, sharp spellings only.
pub const PITCH_CLASSES: [&str; PITCH_CLASS_COUNT] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Highest octave with a tabulated frequency.
pub const MAX_OCTAVE: u8 = 8;

lazy_static! {
    /// Alternate spellings, both directions (C# <-> Db, ...).
    static ref ENHARMONICS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("C#", "Db");
        m.insert("D#", "Eb");
        m.insert("F#", "Gb");
        m.insert("G#", "Ab");
        m.insert("A#", "Bb");
        m.insert("Db", "C#");
        m.insert("Eb", "D#");
        m.insert("Gb", "F#");
        m.insert("Ab", "G#");
        m.insert("Bb", "A#");
        m
    };

    /// Frequency in Hz for every (octave, pitch class), octaves 0..=8.
    static ref NOTE_FREQUENCIES: [[f64; PITCH_CLASS_COUNT]; 9] = {
        let mut table = [[0.0; PITCH_CLASS_COUNT]; 9];
        for (octave, row) in table.iter_mut().enumerate() {
            for (index, freq) in row.iter_mut().enumerate() {
                let midi = (octave + 1) * 12 + index;
                *freq = midi_to_freq(midi as u8);
            }
        }
        table
    };
}

/// Errors from pitch-class and frequency lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("unknown pitch class: {0}")]
    UnknownPitchClass(String),

    #[error("no tabulated frequency for {name}{octave}")]
    FrequencyNotTabulated { name: String, octave: u8 },
}

/// Convert a MIDI note number to its frequency in Hz (A4 = 440 Hz, MIDI 69).
pub fn midi_to_freq(midi: u8) -> f64 {
    440.0 * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}

/// Resolve a note name, canonical or enharmonic, to its pitch-class index.
///
/// Unknown names are an error; callers decide how to degrade.
pub fn pitch_class_index(name: &str) -> Result<usize, PitchError> {
    if let Some(index) = PITCH_CLASSES.iter().position(|&pc| pc == name) {
        return Ok(index);
    }
    if let Some(&sharp) = ENHARMONICS.get(name) {
        if let Some(index) = PITCH_CLASSES.iter().position(|&pc| pc == sharp) {
            return Ok(index);
        }
    }
    Err(PitchError::UnknownPitchClass(name.to_string()))
}

/// Canonical name for a pitch-class index; total, wraps mod 12.
pub fn pitch_class_name(index: usize) -> &'static str {
    PITCH_CLASSES[index % PITCH_CLASS_COUNT]
}

/// Frequency in Hz of a named note at an octave in 0..=8.
///
/// The table is computed once at first use; octaves outside it are an
/// error rather than computed on demand.
pub fn frequency_of(name: &str, octave: u8) -> Result<f64, PitchError> {
    let index = pitch_class_index(name)?;
    if octave > MAX_OCTAVE {
        return Err(PitchError::FrequencyNotTabulated {
            name: name.to_string(),
            octave,
        });
    }
    Ok(NOTE_FREQUENCIES[octave as usize][index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_is_440() {
        let freq = frequency_of("A", 4).unwrap();
        assert!((freq - 440.0).abs() < 1e-9, "A4 should be 440 Hz, got {}", freq);
    }

    #[test]
    fn test_middle_c() {
        let freq = frequency_of("C", 4).unwrap();
        assert!(
            (freq - 261.6255653005986).abs() < 1e-6,
            "C4 should be ~261.63 Hz, got {}",
            freq
        );
    }

    #[test]
    fn test_enharmonic_resolution() {
        assert_eq!(pitch_class_index("Db").unwrap(), 1);
        assert_eq!(pitch_class_index("C#").unwrap(), 1);
        assert_eq!(pitch_class_index("Bb").unwrap(), 10);
        assert_eq!(
            frequency_of("Db", 4).unwrap(),
            frequency_of("C#", 4).unwrap()
        );
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let err = pitch_class_index("H").unwrap_err();
        assert_eq!(err, PitchError::UnknownPitchClass("H".to_string()));
        assert!(frequency_of("X", 4).is_err());
    }

    #[test]
    fn test_name_lookup_wraps() {
        assert_eq!(pitch_class_name(0), "C");
        assert_eq!(pitch_class_name(11), "B");
        assert_eq!(pitch_class_name(13), "C#");
    }

    #[test]
    fn test_octave_out_of_range() {
        let err = frequency_of("C", 9).unwrap_err();
        assert_eq!(
            err,
            PitchError::FrequencyNotTabulated {
                name: "C".to_string(),
                octave: 9
            }
        );
    }

    #[test]
    fn test_octave_doubles_frequency() {
        let c3 = frequency_of("C", 3).unwrap();
        let c4 = frequency_of("C", 4).unwrap();
        assert!((c4 / c3 - 2.0).abs() < 1e-9);
    }
}
