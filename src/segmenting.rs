use crate::score::data::{Element, KeySignature, Measure};

/// One playable piece: consecutive measures closed by a `final` or
/// `double` barline, or by the end of the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    measures: Vec<Measure>,
}

/// An element positioned relative to the start of its composition.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedElement<'a> {
    pub offset: f64,
    pub element: &'a Element,
}

impl Composition {
    pub fn new(measures: Vec<Measure>) -> Self {
        Composition { measures }
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn note_count(&self) -> usize {
        self.measures.iter().map(Measure::note_count).sum()
    }

    pub fn has_notes(&self) -> bool {
        self.measures.iter().any(|m| m.note_count() > 0)
    }

    pub fn length(&self) -> f64 {
        self.measures.iter().map(|m| m.length).sum()
    }

    /// Every element in flattened order. Measures are laid end to end in
    /// the order they were appended; within a measure elements are ordered
    /// by onset, keeping source order for equal onsets.
    pub fn elements(&self) -> Vec<PlacedElement<'_>> {
        let mut placed = Vec::new();
        let mut measure_offset = 0.0;

        for measure in &self.measures {
            let start = placed.len();
            placed.extend(measure.elements.iter().map(|element| PlacedElement {
                offset: measure_offset + element.offset,
                element,
            }));
            placed[start..].sort_by(|a, b| a.offset.total_cmp(&b.offset));

            measure_offset += measure.length;
        }

        placed
    }

    pub fn first_tempo(&self) -> Option<f64> {
        self.measures.iter().find_map(|m| m.tempo)
    }

    pub fn first_key(&self) -> Option<KeySignature> {
        self.measures.iter().find_map(|m| m.key)
    }
}

/// Groups a measure stream into compositions. Holds the single open
/// composition between calls to `push`.
#[derive(Debug, Default)]
pub struct Segmenter {
    open: Vec<Measure>,
}

impl Segmenter {
    pub fn new() -> Self {
        Segmenter::default()
    }

    /// Appends `measure` to the open composition and returns the
    /// composition if the measure's barline closed it.
    pub fn push(&mut self, measure: Measure) -> Option<Composition> {
        let closes = measure.ends_piece();
        self.open.push(measure);

        if closes {
            Some(Composition::new(std::mem::take(&mut self.open)))
        } else {
            None
        }
    }

    /// Flushes the open composition. It is dropped if it holds no notes.
    pub fn finish(self) -> Option<Composition> {
        let residual = Composition::new(self.open);
        if residual.has_notes() {
            Some(residual)
        } else {
            None
        }
    }
}

pub fn segment<I>(measures: I) -> Vec<Composition>
where
    I: IntoIterator<Item = Measure>,
{
    let mut segmenter = Segmenter::new();
    let mut compositions: Vec<Composition> = measures
        .into_iter()
        .filter_map(|measure| segmenter.push(measure))
        .collect();

    compositions.extend(segmenter.finish());
    compositions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::data::*;
    use pretty_assertions::assert_eq;

    fn c4() -> Pitch {
        Pitch::from_midi(60)
    }

    fn measure(number: &str, notes: usize, barline: Option<BarlineKind>) -> Measure {
        Measure {
            number: number.to_owned(),
            elements: (0..notes)
                .map(|i| Element::note(i as f64, 1.0, c4()))
                .collect(),
            barline,
            ..Measure::default()
        }
    }

    fn numbers(composition: &Composition) -> Vec<&str> {
        composition
            .measures()
            .iter()
            .map(|m| m.number.as_str())
            .collect()
    }

    #[test]
    fn final_and_double_barlines_close_compositions() {
        let compositions = segment(vec![
            measure("1", 1, None),
            measure("2", 1, Some(BarlineKind::Final)),
            measure("3", 1, Some(BarlineKind::Regular)),
            measure("4", 1, Some(BarlineKind::Double)),
            measure("5", 1, None),
        ]);

        assert_eq!(compositions.len(), 3);
        assert_eq!(numbers(&compositions[0]), vec!["1", "2"]);
        assert_eq!(numbers(&compositions[1]), vec!["3", "4"]);
        assert_eq!(numbers(&compositions[2]), vec!["5"]);
    }

    #[test]
    fn other_barlines_never_close() {
        let kinds = [
            BarlineKind::Regular,
            BarlineKind::Dotted,
            BarlineKind::Dashed,
            BarlineKind::Heavy,
            BarlineKind::HeavyLight,
            BarlineKind::HeavyHeavy,
            BarlineKind::Tick,
            BarlineKind::Short,
            BarlineKind::None,
        ];

        let mut segmenter = Segmenter::new();
        for kind in kinds {
            assert_eq!(segmenter.push(measure("1", 1, Some(kind))), None);
        }
        assert_eq!(segmenter.push(measure("1", 1, None)), None);

        let residual = segmenter.finish().unwrap();
        assert_eq!(residual.measures().len(), kinds.len() + 1);
    }

    #[test]
    fn closing_measure_belongs_to_the_closed_composition() {
        let mut segmenter = Segmenter::new();
        assert_eq!(segmenter.push(measure("1", 1, None)), None);

        let closed = segmenter
            .push(measure("2", 2, Some(BarlineKind::Final)))
            .unwrap();
        assert_eq!(numbers(&closed), vec!["1", "2"]);
        assert_eq!(closed.note_count(), 3);
        assert_eq!(segmenter.finish(), None);
    }

    #[test]
    fn empty_residual_is_discarded() {
        let compositions = segment(vec![
            measure("1", 1, Some(BarlineKind::Final)),
            measure("2", 0, None),
            measure("3", 0, Some(BarlineKind::Regular)),
        ]);

        assert_eq!(compositions.len(), 1);
        assert_eq!(numbers(&compositions[0]), vec!["1"]);
    }

    #[test]
    fn rest_only_residual_is_discarded() {
        let rests = Measure {
            elements: vec![Element::rest(0.0, 4.0)],
            ..Measure::default()
        };
        assert!(segment(vec![rests]).is_empty());
    }

    #[test]
    fn residual_with_notes_is_flushed() {
        let compositions = segment(vec![
            measure("1", 1, Some(BarlineKind::Final)),
            measure("2", 1, None),
        ]);

        assert_eq!(compositions.len(), 2);
        assert_eq!(numbers(&compositions[1]), vec!["2"]);
        assert_eq!(compositions[1].note_count(), 1);
    }

    #[test]
    fn barline_closed_compositions_are_kept_without_notes() {
        let compositions = segment(vec![measure("1", 0, Some(BarlineKind::Double))]);
        assert_eq!(compositions.len(), 1);
        assert!(!compositions[0].has_notes());
    }

    #[test]
    fn segmenting_is_deterministic() {
        let stream = vec![
            measure("1", 2, None),
            measure("2", 0, Some(BarlineKind::Double)),
            measure("3", 3, Some(BarlineKind::Heavy)),
            measure("4", 1, None),
        ];

        assert_eq!(segment(stream.clone()), segment(stream));
    }

    #[test]
    fn measures_are_laid_end_to_end() {
        let composition = Composition::new(vec![
            Measure {
                length: 3.0,
                elements: vec![Element::note(2.0, 1.0, c4())],
                ..Measure::default()
            },
            Measure {
                length: 4.0,
                elements: vec![Element::note(0.5, 1.0, c4())],
                ..Measure::default()
            },
        ]);

        let offsets: Vec<f64> = composition.elements().iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![2.0, 3.5]);
        assert_eq!(composition.length(), 7.0);
    }

    #[test]
    fn elements_within_a_measure_are_ordered_by_onset() {
        let upper = Pitch::from_midi(76);
        let lower = Pitch::from_midi(48);
        let composition = Composition::new(vec![Measure {
            elements: vec![
                Element::note(0.0, 2.0, upper),
                Element::note(2.0, 2.0, upper),
                Element {
                    voice: 2,
                    ..Element::note(0.0, 4.0, lower)
                },
            ],
            ..Measure::default()
        }]);

        let order: Vec<(f64, u8)> = composition
            .elements()
            .iter()
            .map(|p| (p.offset, p.element.voice))
            .collect();
        assert_eq!(order, vec![(0.0, 1), (0.0, 2), (2.0, 1)]);
    }

    #[test]
    fn first_markings_win() {
        let composition = Composition::new(vec![
            measure("1", 1, None),
            Measure {
                tempo: Some(90.0),
                key: Some(KeySignature {
                    fifths: 1,
                    mode: None,
                }),
                ..Measure::default()
            },
            Measure {
                tempo: Some(140.0),
                key: Some(KeySignature {
                    fifths: -2,
                    mode: None,
                }),
                ..Measure::default()
            },
        ]);

        assert_eq!(composition.first_tempo(), Some(90.0));
        assert_eq!(composition.first_key().map(|k| k.fifths), Some(1));
    }
}
