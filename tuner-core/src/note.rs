//! # Note Mapper
//!
//! Maps frequencies to the nearest 12-tone equal-tempered note, referenced
//! to A4 = 440 Hz, independently of the active tuning.

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI number of A4.
pub const A4_MIDI: i32 = 69;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The nearest equal-tempered note to a frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Note name with octave (e.g., "A4", "C#3")
    pub name: String,
    /// MIDI note number (A4 = 69)
    pub midi: i32,
}

/// Scientific pitch name for a MIDI number, with sharps (60 -> "C4").
pub fn note_name(midi: i32) -> String {
    let pitch_class = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{pitch_class}{octave}")
}

/// Equal-tempered frequency of a MIDI number.
pub fn midi_to_frequency(midi: i32) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf(f64::from(midi - A4_MIDI) / 12.0)
}

/// Finds the equal-tempered note closest to `freq_hz`.
///
/// `midi = round(69 + 12·log2(freq / 440))`.
///
/// # Returns
/// * `Some(note)` - For positive, finite frequencies
/// * `None` - Zero, negative, NaN or infinite input
pub fn frequency_to_note(freq_hz: f64) -> Option<Note> {
    if !freq_hz.is_finite() || freq_hz <= 0.0 {
        return None;
    }
    let midi = (f64::from(A4_MIDI) + 12.0 * (freq_hz / A4_FREQUENCY).log2()).round() as i32;
    Some(Note {
        name: note_name(midi),
        midi,
    })
}
