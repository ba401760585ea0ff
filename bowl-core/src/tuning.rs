//! # Musical Tuning Module
//!
//! Maps a frequency onto 12-tone equal temperament relative to a movable A4.
//!
//! ## Features
//! - Nearest note name and octave (scientific pitch notation, A4 = MIDI 69)
//! - Exact, unclamped cents deviation from that note
//! - Reference pitch supplied per call, so calibration changes apply at once

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number of A4.
const A4_MIDI: i32 = 69;

/// The 12 pitch classes, starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Pitch class of a MIDI note number; works for negative numbers too.
    pub fn from_midi(midi: i32) -> Self {
        Self::ALL[midi.rem_euclid(12) as usize]
    }

    /// Semitones above C.
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest equal-tempered note to a measured frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteReading {
    pub name: NoteName,
    pub octave: i32,
    /// Deviation from the note in cents. Positive = sharp.
    pub cents_offset: f32,
    /// The frequency that was mapped, in Hz.
    pub frequency_hz: f32,
}

impl NoteReading {
    /// Cents limited to ±50 for display.
    ///
    /// Rounding to the nearest semitone already keeps `cents_offset` within a
    /// half step; this only absorbs floating-point spill at the boundary.
    pub fn clamped_cents(&self) -> f32 {
        self.cents_offset.clamp(-50.0, 50.0)
    }

    /// MIDI number of the nearest note.
    pub fn midi(&self) -> i32 {
        (self.octave + 1) * 12 + self.name.index()
    }

    /// Exact frequency of the nearest note under `a4_hz`.
    pub fn target_frequency(&self, a4_hz: f32) -> f32 {
        midi_to_frequency(self.midi(), a4_hz)
    }
}

impl fmt::Display for NoteReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Maps `freq` to its nearest note relative to `a4_hz`.
///
/// # Arguments
/// * `freq` - Frequency in Hz
/// * `a4_hz` - Reference pitch for A4 in Hz
///
/// # Returns
/// * `Some(reading)` - Note, octave and exact cents
/// * `None` - `freq` or `a4_hz` is not a positive finite number
pub fn frequency_to_note(freq: f32, a4_hz: f32) -> Option<NoteReading> {
    if !(freq.is_finite() && freq > 0.0 && a4_hz.is_finite() && a4_hz > 0.0) {
        return None;
    }
    let semitones = 12.0 * (freq as f64 / a4_hz as f64).log2() + A4_MIDI as f64;
    let midi = semitones.round();
    let cents = ((semitones - midi) * 100.0) as f32;
    let midi = midi as i32;

    Some(NoteReading {
        name: NoteName::from_midi(midi),
        octave: midi.div_euclid(12) - 1,
        cents_offset: cents,
        frequency_hz: freq,
    })
}

/// Equal-tempered frequency of a MIDI note under `a4_hz`.
pub fn midi_to_frequency(midi: i32, a4_hz: f32) -> f32 {
    a4_hz * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}
