//! Song setup and generation commands

use colored::*;

use songsmith_core::{Composition, Genre, Mode};

use crate::commands::{CommandContext, CommandResult};

/// Handle `generate [title]`: run the composition engine over the current
/// parameters and lyrics, print the generation log, and keep the score.
pub fn cmd_generate(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if !args.is_empty() {
        ctx.params.title = args.to_string();
    }

    let lyrics = ctx.lyrics_text();
    let generation = Composition::generate(ctx.params.clone(), lyrics.as_deref());

    for line in &generation.log {
        println!("  {}", line.dimmed());
    }

    let composition = &generation.composition;
    let beats = songsmith_core::types::time::to_f64(composition.total_beats());
    let summary = format!(
        "Generated \"{}\" - {} in {} {}, {:.0} BPM, {} sections, {:.0} beats",
        if composition.params.title.is_empty() {
            "untitled"
        } else {
            composition.params.title.as_str()
        },
        composition.params.genre,
        composition.params.key_name(),
        composition.params.mode,
        composition.params.tempo,
        composition.sections.len(),
        beats,
    )
    .bright_green()
    .to_string();

    ctx.conductor
        .set_score(composition.flatten(), composition.params.tempo);
    ctx.generation = Some(generation);
    CommandResult::Message(summary)
}

/// Handle `genre [name]`. Setting a genre whose tempo range excludes the
/// current tempo snaps the tempo to the middle of that range.
pub fn cmd_genre(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current genre: {}", ctx.params.genre));
    }

    ctx.params.genre = Genre::from_name(args);
    let (lo, hi) = ctx.params.genre.tempo_range();
    let mut message = format!("Genre set to {}", ctx.params.genre);
    if ctx.params.tempo < lo || ctx.params.tempo > hi {
        ctx.params.tempo = (lo + hi) / 2.0;
        ctx.clock.set_bpm(ctx.params.tempo);
        ctx.conductor.set_bpm(ctx.params.tempo);
        message.push_str(&format!(", tempo moved to {:.0} BPM", ctx.params.tempo));
    }
    CommandResult::Message(message.bright_green().to_string())
}

/// Handle `key [name]`. Unparseable keys fall back to C.
pub fn cmd_key(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current key: {}", ctx.params.key_name()));
    }
    ctx.params.set_key(args);
    CommandResult::Message(
        format!("Key set to {}", ctx.params.key_name())
            .bright_green()
            .to_string(),
    )
}

/// Handle `mode [name]`. Unknown modes fall back to major.
pub fn cmd_mode(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current mode: {}", ctx.params.mode));
    }
    ctx.params.mode = Mode::from_name(args);
    CommandResult::Message(
        format!("Mode set to {}", ctx.params.mode)
            .bright_green()
            .to_string(),
    )
}

/// Handle `tempo [bpm]`
pub fn cmd_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Current tempo: {:.1} BPM", ctx.params.tempo));
    }

    match args.parse::<f32>() {
        Ok(bpm) if bpm > 0.0 && bpm <= 400.0 => {
            ctx.params.tempo = bpm;
            ctx.clock.set_bpm(bpm);
            ctx.conductor.set_bpm(bpm);
            CommandResult::Message(
                format!("Tempo set to {:.1} BPM", bpm)
                    .bright_green()
                    .to_string(),
            )
        }
        _ => CommandResult::Error("Invalid tempo. Use a value between 1-400 BPM".to_string()),
    }
}

/// Handle `lyrics add <line>`
pub fn cmd_lyrics_add(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: lyrics add <line of text>".to_string());
    }
    ctx.lyric_lines.push(args.to_string());
    CommandResult::Message(format!("Added line {}", ctx.lyric_lines.len()))
}

/// Handle `lyrics clear`
pub fn cmd_lyrics_clear(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.lyric_lines.clear();
    CommandResult::Message("Lyrics cleared".to_string())
}

/// Handle bare `lyrics`: show the current lines with their analysis.
pub fn cmd_lyrics_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    if ctx.lyric_lines.is_empty() {
        return CommandResult::Message(
            "No lyrics set. Add lines with 'lyrics add <text>'".to_string(),
        );
    }

    let text = ctx.lyric_lines.join("\n");
    let analysis = songsmith_core::lyrics::analyze(&text);
    for (line, label) in analysis.lines.iter().zip(&analysis.rhyme_scheme) {
        println!(
            "  {} {} {}",
            label.bright_yellow(),
            line.text,
            format!("({} syllables)", line.total_syllables).dimmed()
        );
    }
    CommandResult::Success
}

/// Handle `song`: show the current parameters and, when generated, the
/// section structure.
pub fn cmd_song(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    println!("{}", "Song parameters".bold());
    println!("  genre: {}", ctx.params.genre.to_string().cyan());
    println!("  key:   {}", ctx.params.key_name().cyan());
    println!("  mode:  {}", ctx.params.mode.to_string().cyan());
    println!("  tempo: {}", format!("{:.0} BPM", ctx.params.tempo).cyan());
    println!("  lyric lines: {}", ctx.lyric_lines.len());

    match &ctx.generation {
        Some(generation) => {
            println!("{}", "Structure".bold());
            for (i, section) in generation.composition.sections.iter().enumerate() {
                println!(
                    "  {:2}. {:12} {} bars  [{}]",
                    i + 1,
                    section.kind.to_string().bright_yellow(),
                    section.bars,
                    section.chords.symbols()
                );
            }
        }
        None => println!("{}", "No composition yet - run 'generate'".dimmed()),
    }
    CommandResult::Success
}

/// Handle `quit` or `exit`
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `help`
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

fn print_help() {
    println!("{}", "Songsmith Help".bold());
    println!("{}", "==============".bold());
    println!();
    println!("{}", "Song setup:".green());
    println!("  {}        - Set the genre (country-ballad, bluegrass, folk-pop)", "genre <name>".cyan());
    println!("  {}          - Set the key center (C, F#, Bb, ...)", "key <name>".cyan());
    println!("  {}         - Set the mode (major, minor, dorian, mixolydian)", "mode <name>".cyan());
    println!("  {}         - Set the tempo", "tempo <bpm>".cyan());
    println!("  {}   - Append a lyric line", "lyrics add <text>".cyan());
    println!("  {}        - Drop all lyric lines", "lyrics clear".cyan());
    println!("  {}              - Show lyrics with rhyme scheme and syllables", "lyrics".cyan());
    println!();
    println!("{}", "Composition:".green());
    println!("  {}    - Compose a song from the current setup", "generate [title]".cyan());
    println!("  {}                - Show parameters and structure", "song".cyan());
    println!();
    println!("{}", "Playback:".green());
    println!("  {}         - Play the composition (optionally from a beat)", "play [beat]".cyan());
    println!("  {}     - Loop a beat range", "loop <from> <to>".cyan());
    println!("  {}                - Stop all sound", "stop".cyan());
    println!("  {}  - Per-part volume / mute / solo", "mixer <part> ...".cyan());
    println!("  {}    - Bar-start click track", "metronome on|off".cyan());
    println!("  {} - Loop a genre's drum pattern", "drumloop <genre>|off".cyan());
    println!("  {} - Play the last song after idling", "autoplay on [secs]|off".cyan());
    println!();
    println!("{}", "Files:".green());
    println!("  {}   - Write the composition document", "export json <path>".cyan());
    println!("  {}   - Read a composition document", "import json <path>".cyan());
    println!("  {} - Write a note-event file", "export midi [parts] <path>".cyan());
    println!();
    println!("{}", "Other:".green());
    println!("  {}                - Show this help", "help".bright_green());
    println!("  {}                - Exit", "quit".bright_red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use songsmith_core::Genre as CoreGenre;

    #[test]
    fn test_generate_stores_a_composition() {
        let mut ctx = test_context();
        ctx.lyric_lines.push("dusty road".to_string());
        ctx.lyric_lines.push("heavy load".to_string());
        let result = cmd_generate("Test Drive", &mut ctx);
        assert!(matches!(result, CommandResult::Message(_)));
        let generation = ctx.generation.as_ref().unwrap();
        assert_eq!(generation.composition.params.title, "Test Drive");
        assert!(!generation.composition.sections.is_empty());
    }

    #[test]
    fn test_unknown_genre_falls_back() {
        let mut ctx = test_context();
        cmd_genre("zydeco-technofolk", &mut ctx);
        assert_eq!(ctx.params.genre, CoreGenre::CountryBallad);
    }

    #[test]
    fn test_genre_change_snaps_tempo_into_range() {
        let mut ctx = test_context();
        ctx.params.tempo = 60.0;
        cmd_genre("bluegrass", &mut ctx);
        let (lo, hi) = CoreGenre::Bluegrass.tempo_range();
        assert!(ctx.params.tempo >= lo && ctx.params.tempo <= hi);
    }

    #[test]
    fn test_bad_key_falls_back_to_c() {
        let mut ctx = test_context();
        cmd_key("Q#", &mut ctx);
        assert_eq!(ctx.params.key, 0);
        cmd_key("G", &mut ctx);
        assert_eq!(ctx.params.key, 7);
    }

    #[test]
    fn test_tempo_rejects_nonsense() {
        let mut ctx = test_context();
        assert!(matches!(cmd_tempo("-5", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(
            cmd_tempo("fast", &mut ctx),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            cmd_tempo("140", &mut ctx),
            CommandResult::Message(_)
        ));
        assert_eq!(ctx.params.tempo, 140.0);
    }

    #[test]
    fn test_lyrics_accumulate_and_clear() {
        let mut ctx = test_context();
        cmd_lyrics_add("first line", &mut ctx);
        cmd_lyrics_add("second line", &mut ctx);
        assert_eq!(ctx.lyric_lines.len(), 2);
        cmd_lyrics_clear("", &mut ctx);
        assert!(ctx.lyric_lines.is_empty());
    }
}
