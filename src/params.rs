use serde::{Deserialize, Serialize};

pub const CHANNEL_COUNT: usize = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RhythmMode {
    Euclidean,
    PerfectBalance,
    ClassicGroove,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonyMode {
    Basic,
    Driver,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmonyStrategy {
    Steedman,
    NeoRiemannian,
    Parsimonious,
    Auto,
}

/// Engine parameters embedded in every truth record. Field names and
/// order follow the synthesis engine's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicalParams {
    pub bpm: f32,
    pub master_volume: f32,
    pub enable_rhythm: bool,
    pub enable_harmony: bool,
    pub enable_melody: bool,
    pub enable_voicing: bool,

    pub rhythm_mode: RhythmMode,
    pub rhythm_steps: usize,
    pub rhythm_pulses: usize,
    pub rhythm_rotation: usize,
    pub rhythm_density: f32,
    pub rhythm_tension: f32,
    pub rhythm_secondary_steps: usize,
    pub rhythm_secondary_pulses: usize,
    pub rhythm_secondary_rotation: usize,
    pub fixed_kick: bool,

    pub harmony_mode: HarmonyMode,
    pub harmony_strategy: HarmonyStrategy,
    pub harmony_tension: f32,
    pub harmony_valence: f32,
    pub harmony_measures_per_chord: usize,
    pub key_root: u8,

    pub melody_smoothness: f32,
    pub voicing_density: f32,
    pub voicing_tension: f32,
    pub melody_octave: i32,

    pub gain_lead: f32,
    pub gain_bass: f32,
    pub gain_snare: f32,
    pub gain_hat: f32,
    pub vel_base_bass: u8,
    pub vel_base_snare: u8,

    /// -1 routes a channel to the built-in synth, >= 0 to a soundfont bank.
    pub channel_routing: [i32; CHANNEL_COUNT],
    pub muted_channels: [bool; CHANNEL_COUNT],

    pub record_wav: bool,
    pub record_midi: bool,
    pub record_musicxml: bool,
    pub record_truth: bool,
}

/// Parameters stamped into truth records made from recognized notation.
/// Only `bpm` and `key_root` are ever replaced, see
/// [`MusicalParams::with_tempo_and_key`].
pub const OMR_DEFAULTS: MusicalParams = MusicalParams {
    bpm: 120.0,
    master_volume: 1.0,
    enable_rhythm: true,
    enable_harmony: true,
    enable_melody: true,
    enable_voicing: false,

    rhythm_mode: RhythmMode::Euclidean,
    rhythm_steps: 16,
    rhythm_pulses: 4,
    rhythm_rotation: 0,
    rhythm_density: 0.5,
    rhythm_tension: 0.3,
    rhythm_secondary_steps: 12,
    rhythm_secondary_pulses: 3,
    rhythm_secondary_rotation: 0,
    fixed_kick: false,

    harmony_mode: HarmonyMode::Driver,
    harmony_strategy: HarmonyStrategy::Auto,
    harmony_tension: 0.3,
    harmony_valence: 0.3,
    harmony_measures_per_chord: 2,
    key_root: 0,

    melody_smoothness: 0.7,
    voicing_density: 0.5,
    voicing_tension: 0.3,
    melody_octave: 4,

    gain_lead: 1.0,
    gain_bass: 0.6,
    gain_snare: 0.5,
    gain_hat: 0.4,
    vel_base_bass: 85,
    vel_base_snare: 70,

    channel_routing: [-1; CHANNEL_COUNT],
    muted_channels: [false; CHANNEL_COUNT],

    record_wav: false,
    record_midi: false,
    record_musicxml: false,
    record_truth: false,
};

impl MusicalParams {
    pub fn with_tempo_and_key(bpm: f64, key_root: u8) -> Self {
        MusicalParams {
            bpm: bpm as f32,
            key_root: key_root % 12,
            ..OMR_DEFAULTS
        }
    }
}

impl Default for MusicalParams {
    fn default() -> Self {
        OMR_DEFAULTS
    }
}
