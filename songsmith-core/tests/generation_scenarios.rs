#[cfg(test)]
mod tests {
    use songsmith_core::export::{document, midi};
    use songsmith_core::theory::voicing;
    use songsmith_core::types::time::{beats, to_f64};
    use songsmith_core::{
        Composition, Genre, Mode, PartId, ScoreEventKind, SectionType, SongParams,
    };

    fn bluegrass_in_g() -> SongParams {
        SongParams {
            title: "Dust on the Road".to_string(),
            genre: Genre::Bluegrass,
            key: 7, // G
            mode: Mode::Major,
            tempo: 140.0,
            ..SongParams::default()
        }
    }

    const LYRICS: &str = "dust on the road tonight\n\
                          chasing the fading light\n\
                          carry me home again\n\
                          walking on through the rain";

    #[test]
    fn test_bluegrass_progression_scenario() {
        // 8 bars of the signature bluegrass template in G major:
        // I IV I V repeated, roots G C G D.
        let prog = songsmith_core::ChordProgression::for_genre(
            Genre::Bluegrass,
            0,
            7,
            Mode::Major,
            8,
        );
        let roots: Vec<u8> = prog.chords().iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![7, 0, 7, 2, 7, 0, 7, 2]);
    }

    #[test]
    fn test_generated_voicings_are_minimal_everywhere() {
        // Every adjacent chord pair in every section of a full composition
        // beats or ties every rotation and octave assignment.
        let generation = Composition::generate(bluegrass_in_g(), Some(LYRICS));
        for section in &generation.composition.sections {
            for pair in section.chords.chords().windows(2) {
                let prev = pair[0].voicing();
                let chosen = voicing::total_movement(prev, pair[1].voicing());

                for rotation in voicing::rotations(pair[1].tones()) {
                    let octaves: Vec<i8> =
                        (voicing::OCTAVE_LOW..=voicing::OCTAVE_HIGH).collect();
                    for &o0 in &octaves {
                        for &o1 in &octaves {
                            for &o2 in &octaves {
                                let candidate = vec![
                                    songsmith_core::Note::with_octave(rotation[0], o0).unwrap(),
                                    songsmith_core::Note::with_octave(rotation[1], o1).unwrap(),
                                    songsmith_core::Note::with_octave(rotation[2], o2).unwrap(),
                                ];
                                assert!(
                                    chosen <= voicing::total_movement(prev, &candidate),
                                    "non-minimal voicing in a {} section",
                                    section.kind
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_drum_grid_tiles_the_whole_song() {
        // The bluegrass hi-hat hits all eight slots of every bar, so the
        // flattened drum lane must contain exactly bars * 8 hi-hat events
        // on consecutive half beats.
        let generation = Composition::generate(bluegrass_in_g(), None);
        let composition = &generation.composition;
        let total_bars: u32 = composition.sections.iter().map(|s| s.bars).sum();

        let hihat_starts: Vec<f64> = composition
            .flatten()
            .into_iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    ScoreEventKind::Drum {
                        sound: songsmith_core::DrumSound::HiHat,
                        ..
                    }
                )
            })
            .map(|e| to_f64(e.start))
            .collect();

        assert_eq!(hihat_starts.len(), total_bars as usize * 8);
        for (k, start) in hihat_starts.iter().enumerate() {
            assert_eq!(*start, k as f64 * 0.5, "hit {} drifted", k);
        }
    }

    #[test]
    fn test_document_round_trip_is_lossless() {
        let generation = Composition::generate(bluegrass_in_g(), Some(LYRICS));
        let original = generation.composition;
        let reimported = document::import(&document::export(&original).unwrap()).unwrap();
        assert_eq!(original, reimported);
        assert_eq!(original.flatten(), reimported.flatten());
    }

    #[test]
    fn test_midi_export_parses_back_with_all_tracks() {
        let generation = Composition::generate(bluegrass_in_g(), Some(LYRICS));
        let bytes = midi::export(
            &generation.composition,
            &[PartId::Melody, PartId::Bass, PartId::Drums],
        )
        .unwrap();
        let smf = midly::Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 3);
    }

    #[test]
    fn test_sections_without_lyrics_stay_instrumental() {
        let generation = Composition::generate(bluegrass_in_g(), Some(LYRICS));
        for section in &generation.composition.sections {
            match section.kind {
                SectionType::Verse | SectionType::Chorus => {
                    assert!(!section.melody.is_empty(), "{} lost its melody", section.kind)
                }
                _ => assert!(section.melody.is_empty(), "{} should not sing", section.kind),
            }
            // The band plays everywhere
            assert!(!section.bass.is_empty());
            assert!(section.drums.hit_count() > 0);
        }
    }

    #[test]
    fn test_rhyme_scheme_of_the_scenario_lyrics() {
        let analysis = songsmith_core::lyrics::analyze(LYRICS);
        // tonight/light share "ht"; again/rain share "in"
        assert_eq!(analysis.rhyme_scheme, vec!["A", "A", "B", "B"]);
    }

    #[test]
    fn test_flattened_events_use_exact_grid_times() {
        // Every start beat in the flattened score is representable on a
        // sixteenth grid: rational arithmetic admits no off-grid residue.
        let generation = Composition::generate(bluegrass_in_g(), Some(LYRICS));
        for event in generation.composition.flatten() {
            let on_grid = event.start / beats(1, 4);
            assert!(
                on_grid.is_integer(),
                "event at {} is off the sixteenth grid",
                to_f64(event.start)
            );
        }
    }
}
