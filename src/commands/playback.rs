//! Playback and mixer commands

use std::time::Duration;

use colored::*;

use songsmith_core::PartId;

use crate::commands::{CommandContext, CommandResult};

/// Handle `play [beat]`: flatten the current composition and hand it to
/// the conductor. Restarting while playing stops cleanly first.
pub fn cmd_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let start_beat = if args.is_empty() {
        0.0
    } else {
        match args.parse::<f64>() {
            Ok(beat) if beat >= 0.0 => beat,
            _ => return CommandResult::Error("Usage: play [start beat]".to_string()),
        }
    };

    let Some(generation) = &ctx.generation else {
        return CommandResult::Error("Nothing to play - run 'generate' first".to_string());
    };

    let composition = &generation.composition;
    let tempo = composition.params.tempo;
    ctx.clock.set_bpm(tempo);
    ctx.conductor
        .play(composition.flatten(), tempo, start_beat, None);

    CommandResult::Message(
        format!(
            "Playing \"{}\" from beat {:.0} at {:.0} BPM",
            composition.params.title, start_beat, tempo
        )
        .bright_green()
        .to_string(),
    )
}

/// Handle `loop <from> <to>`: loop a beat range of the composition.
pub fn cmd_loop(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let mut parts = args.split_whitespace();
    let range = match (
        parts.next().and_then(|s| s.parse::<f64>().ok()),
        parts.next().and_then(|s| s.parse::<f64>().ok()),
    ) {
        (Some(from), Some(to)) if from >= 0.0 && to > from => (from, to),
        _ => return CommandResult::Error("Usage: loop <from beat> <to beat>".to_string()),
    };

    let Some(generation) = &ctx.generation else {
        return CommandResult::Error("Nothing to loop - run 'generate' first".to_string());
    };

    let composition = &generation.composition;
    let tempo = composition.params.tempo;
    ctx.clock.set_bpm(tempo);
    ctx.conductor
        .play(composition.flatten(), tempo, range.0, Some(range));

    CommandResult::Message(
        format!("Looping beats {:.0}-{:.0} (use 'stop' to stop)", range.0, range.1)
            .bright_green()
            .to_string(),
    )
}

/// Handle `stop`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.conductor.stop();
    CommandResult::Message("Stopped".to_string())
}

/// Handle `mixer` / `mixer <part> volume <v>` / `mixer <part>
/// mute|unmute|solo|unsolo`.
pub fn cmd_mixer(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let mut words = args.split_whitespace();

    let Some(part_name) = words.next() else {
        let mixer = match ctx.mixer.lock() {
            Ok(guard) => guard,
            Err(_) => return CommandResult::Error("Mixer unavailable".to_string()),
        };
        println!("{}", "Mixer".bold());
        for part in PartId::ALL {
            let strip = mixer.strip(part);
            let flags = match (strip.muted, strip.solo) {
                (_, true) => " solo".bright_yellow().to_string(),
                (true, _) => " muted".red().to_string(),
                _ => String::new(),
            };
            println!("  {:8} volume {:.2}{}", part.to_string(), strip.volume, flags);
        }
        return CommandResult::Success;
    };

    let Some(part) = PartId::from_name(part_name) else {
        return CommandResult::Error(format!(
            "Unknown part '{}' (melody, bass, guitar, piano, drums)",
            part_name
        ));
    };

    let mut mixer = match ctx.mixer.lock() {
        Ok(guard) => guard,
        Err(_) => return CommandResult::Error("Mixer unavailable".to_string()),
    };

    match words.next() {
        Some("volume") => match words.next().and_then(|v| v.parse::<f32>().ok()) {
            Some(volume) if (0.0..=1.0).contains(&volume) => {
                mixer.set_volume(part, volume);
                CommandResult::Message(format!("{} volume {:.2}", part, volume))
            }
            _ => CommandResult::Error("Usage: mixer <part> volume <0.0-1.0>".to_string()),
        },
        Some("mute") => {
            mixer.set_muted(part, true);
            CommandResult::Message(format!("{} muted", part))
        }
        Some("unmute") => {
            mixer.set_muted(part, false);
            CommandResult::Message(format!("{} unmuted", part))
        }
        Some("solo") => {
            mixer.set_solo(part, true);
            CommandResult::Message(format!("{} soloed", part))
        }
        Some("unsolo") => {
            mixer.set_solo(part, false);
            CommandResult::Message(format!("{} unsoloed", part))
        }
        _ => CommandResult::Error(
            "Usage: mixer <part> volume <v> | mute | unmute | solo | unsolo".to_string(),
        ),
    }
}

/// Handle `metronome on|off`
pub fn cmd_metronome(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match args {
        "on" => {
            ctx.conductor.set_metronome(true);
            CommandResult::Message("Metronome on".bright_green().to_string())
        }
        "off" => {
            ctx.conductor.set_metronome(false);
            CommandResult::Message("Metronome off".to_string())
        }
        _ => CommandResult::Error("Usage: metronome on|off".to_string()),
    }
}

/// Handle `drumloop <genre>|off`
pub fn cmd_drumloop(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: drumloop <genre>|off".to_string());
    }
    if args == "off" {
        ctx.conductor.set_drum_loop(None);
        return CommandResult::Message("Drum loop off".to_string());
    }
    let genre = songsmith_core::Genre::from_name(args);
    ctx.conductor.set_drum_loop(Some(genre));
    CommandResult::Message(
        format!("Looping the {} drum pattern", genre)
            .bright_green()
            .to_string(),
    )
}

/// Handle `autoplay on [secs]|off`: after the idle threshold with no
/// input, the conductor plays the last composition by itself.
pub fn cmd_autoplay(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let mut words = args.split_whitespace();
    match words.next() {
        Some("on") => {
            let secs = words
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            ctx.conductor
                .set_autoplay(Some(Duration::from_secs(secs)));
            CommandResult::Message(
                format!("Autoplay after {} quiet seconds", secs)
                    .bright_green()
                    .to_string(),
            )
        }
        Some("off") => {
            ctx.conductor.set_autoplay(None);
            CommandResult::Message("Autoplay off".to_string())
        }
        _ => CommandResult::Error("Usage: autoplay on [seconds]|off".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::song::cmd_generate;
    use crate::commands::test_context;

    #[test]
    fn test_play_without_generation_errors() {
        let mut ctx = test_context();
        assert!(matches!(cmd_play("", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_play_accepts_a_start_beat() {
        let mut ctx = test_context();
        cmd_generate("", &mut ctx);
        assert!(matches!(cmd_play("8", &mut ctx), CommandResult::Message(_)));
        assert!(matches!(cmd_play("-3", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_loop_requires_an_ordered_range() {
        let mut ctx = test_context();
        cmd_generate("", &mut ctx);
        assert!(matches!(
            cmd_loop("4 8", &mut ctx),
            CommandResult::Message(_)
        ));
        assert!(matches!(cmd_loop("8 4", &mut ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_loop("4", &mut ctx), CommandResult::Error(_)));
    }

    #[test]
    fn test_mixer_volume_and_mute() {
        let mut ctx = test_context();
        cmd_mixer("bass volume 0.5", &mut ctx);
        cmd_mixer("drums mute", &mut ctx);
        let mixer = ctx.mixer.lock().unwrap();
        assert_eq!(mixer.strip(PartId::Bass).volume, 0.5);
        assert!(mixer.strip(PartId::Drums).muted);
    }

    #[test]
    fn test_mixer_rejects_unknown_part() {
        let mut ctx = test_context();
        assert!(matches!(
            cmd_mixer("vocals volume 0.5", &mut ctx),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_metronome_wants_on_or_off() {
        let mut ctx = test_context();
        assert!(matches!(
            cmd_metronome("sideways", &mut ctx),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            cmd_metronome("on", &mut ctx),
            CommandResult::Message(_)
        ));
    }
}
