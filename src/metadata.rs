use crate::segmenting::Composition;

pub const DEFAULT_BPM: f64 = 120.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Metadata {
    pub bpm: f64,
    pub key_root: u8,
}

/// Reads the static tempo and key of a composition. Only the first tempo
/// marking and the first key signature count; C is assumed without one.
pub fn extract_metadata(composition: &Composition, fallback_bpm: f64) -> Metadata {
    Metadata {
        bpm: composition.first_tempo().unwrap_or(fallback_bpm),
        key_root: composition
            .first_key()
            .map_or(0, |key| key.tonic_pitch_class()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::data::*;
    use pretty_assertions::assert_eq;

    fn key(fifths: i8, mode: Option<Mode>) -> KeySignature {
        KeySignature { fifths, mode }
    }

    #[test]
    fn defaults_without_markings() {
        let composition = Composition::new(vec![Measure::default()]);

        assert_eq!(
            extract_metadata(&composition, DEFAULT_BPM),
            Metadata {
                bpm: 120.0,
                key_root: 0
            }
        );
        assert_eq!(extract_metadata(&composition, 66.0).bpm, 66.0);
    }

    #[test]
    fn later_tempo_changes_are_ignored() {
        let composition = Composition::new(vec![
            Measure {
                tempo: Some(100.0),
                ..Measure::default()
            },
            Measure {
                tempo: Some(60.0),
                ..Measure::default()
            },
        ]);

        assert_eq!(extract_metadata(&composition, DEFAULT_BPM).bpm, 100.0);
    }

    #[test]
    fn key_root_is_the_tonic_pitch_class() {
        fn root(fifths: i8, mode: Option<Mode>) -> u8 {
            let composition = Composition::new(vec![Measure {
                key: Some(key(fifths, mode)),
                ..Measure::default()
            }]);
            extract_metadata(&composition, DEFAULT_BPM).key_root
        }

        assert_eq!(root(0, Some(Mode::Major)), 0);
        assert_eq!(root(1, Some(Mode::Major)), 7);
        assert_eq!(root(2, None), 2);
        assert_eq!(root(-1, Some(Mode::Major)), 5);
        assert_eq!(root(-3, Some(Mode::Major)), 3);
        assert_eq!(root(0, Some(Mode::Minor)), 9);
        assert_eq!(root(1, Some(Mode::Minor)), 4);
        assert_eq!(root(-3, Some(Mode::Minor)), 0);
        assert_eq!(root(6, Some(Mode::Major)), 6);
        assert_eq!(root(-7, Some(Mode::Major)), 11);
    }

    #[test]
    fn first_key_signature_wins() {
        let composition = Composition::new(vec![
            Measure::default(),
            Measure {
                key: Some(key(-1, Some(Mode::Major))),
                ..Measure::default()
            },
            Measure {
                key: Some(key(4, Some(Mode::Major))),
                ..Measure::default()
            },
        ]);

        assert_eq!(extract_metadata(&composition, DEFAULT_BPM).key_root, 5);
    }
}
