//! Song structure assembly
//!
//! Walks the genre's fixed section template, hands lyric lines out to
//! verses (consecutive pairs, round-robin) and choruses (a fixed slice),
//! and invokes the progression and part generators per section. The result
//! is the complete `Composition` plus the generation log shown to the
//! user.

use crate::composition::{Composition, Generation, Section, SongParams};
use crate::generate::{bass, drums, guitar, harmony, melody, piano, progression::ChordProgression};
use crate::genre::SectionType;
use crate::lyrics::{self, LyricAnalysis, LyricLine};
use crate::rng::SongRng;

/// Generate the whole composition.
pub fn assemble(params: SongParams, lyrics_text: Option<&str>) -> Generation {
    let mut log = Vec::new();
    log.push(format!("🎵 Starting composition: \"{}\"", params.title));
    log.push(format!(
        "Genre: {} | Key: {} {} | Tempo: {} BPM",
        params.genre,
        params.key_name(),
        params.mode,
        params.tempo
    ));

    let analysis: Option<LyricAnalysis> = lyrics_text
        .map(lyrics::analyze)
        .filter(|a| !a.lines.is_empty());
    if let Some(a) = &analysis {
        log.push(format!("Rhyme scheme: {}", a.rhyme_scheme.join("-")));
        log.push(format!("Total syllables: {}", a.total_syllables()));
    }

    let template = params.genre.structure();
    log.push(format!(
        "Structure: {}",
        template
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" → ")
    ));

    // Verse pool: the first two of every four lines; choruses reuse a
    // fixed slice so every chorus sings the same hook.
    let empty = Vec::new();
    let all_lines = analysis.as_ref().map(|a| &a.lines).unwrap_or(&empty);
    let verse_pool: Vec<LyricLine> = all_lines
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 < 2)
        .map(|(_, l)| l.clone())
        .collect();
    let chorus_lines: Vec<LyricLine> = all_lines
        .iter()
        .skip(2)
        .take(2)
        .cloned()
        .collect();

    let mut rng = SongRng::from_params(
        &params.title,
        params.genre.name(),
        params.key,
        params.tempo,
    );

    let mut sections = Vec::with_capacity(template.len());
    let mut verse_count = 0usize;

    for &kind in template {
        let lyric_lines = match kind {
            SectionType::Verse => {
                let lines = verse_pair(&verse_pool, verse_count);
                verse_count += 1;
                lines
            }
            SectionType::Chorus => chorus_lines.clone(),
            _ => Vec::new(),
        };

        sections.push(build_section(&params, kind, lyric_lines, &mut rng, &mut log));
    }

    let melody_notes: usize = sections.iter().map(|s| s.melody.len()).sum();
    let drum_hits: usize = sections.iter().map(|s| s.drums.hit_count()).sum();
    log.push("✅ Composition complete".to_string());
    log.push(format!(
        "Sections: {} | Melody notes: {} | Drum hits: {}",
        sections.len(),
        melody_notes,
        drum_hits
    ));

    Generation {
        composition: Composition {
            params,
            lyric_analysis: analysis,
            sections,
        },
        log,
    }
}

/// Consecutive pair of verse-pool lines for the nth verse, wrapping
/// round-robin when the pool runs short.
fn verse_pair(pool: &[LyricLine], verse_index: usize) -> Vec<LyricLine> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..2.min(pool.len()))
        .map(|j| pool[(verse_index * 2 + j) % pool.len()].clone())
        .collect()
}

fn build_section(
    params: &SongParams,
    kind: SectionType,
    lyric_lines: Vec<LyricLine>,
    rng: &mut SongRng,
    log: &mut Vec<String>,
) -> Section {
    let bars = kind.default_bars();
    let chords =
        ChordProgression::for_genre(params.genre, params.variation, params.key, params.mode, bars);
    log.push(format!("{}: {}", kind, chords.symbols()));

    let harmonic_rhythm = harmony::harmonic_rhythm(kind, bars, chords.len());
    let melody = melody::generate(
        &chords,
        &lyric_lines,
        params.genre,
        params.key,
        params.mode,
        rng,
    );
    let bass = bass::generate(&chords, params.genre);
    let guitar = guitar::generate(&chords, params.genre);
    let piano = piano::generate(&chords, &melody);
    let drums = drums::generate(params.genre, bars);

    Section {
        kind,
        bars,
        lyric_lines,
        chords,
        harmonic_rhythm,
        melody,
        bass,
        guitar,
        piano,
        drums,
    }
}
