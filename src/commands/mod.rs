//! Command registry for REPL commands
//!
//! Prefix-matched dispatch: commands register under a string prefix and
//! the registry tries the longest prefixes first, so `export midi` wins
//! over a hypothetical `export`. Handlers get the shared session context
//! (song parameters, lyrics, the last generation, and the audio runtime
//! handles).

pub mod export;
pub mod playback;
pub mod song;

use std::sync::{Arc, Mutex};

use songsmith_core::{Generation, SongParams};

use crate::audio::clock::MasterClock;
use crate::audio::conductor::Conductor;
use crate::audio::engine::MixerState;

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command
    NotACommand,
    /// Error occurred
    Error(String),
}

/// Session state shared by every command handler.
pub struct CommandContext {
    pub params: SongParams,
    /// Raw lyric text, one line per entry, fed to the analyzer on generate.
    pub lyric_lines: Vec<String>,
    pub generation: Option<Generation>,
    pub conductor: Conductor,
    pub clock: Arc<MasterClock>,
    pub mixer: Arc<Mutex<MixerState>>,
}

impl CommandContext {
    pub fn new(
        conductor: Conductor,
        clock: Arc<MasterClock>,
        mixer: Arc<Mutex<MixerState>>,
    ) -> Self {
        Self {
            params: SongParams::default(),
            lyric_lines: Vec::new(),
            generation: None,
            conductor,
            clock,
            mixer,
        }
    }

    /// The lyric text the generator sees, or None when no lines are set.
    pub fn lyrics_text(&self) -> Option<String> {
        if self.lyric_lines.is_empty() {
            None
        } else {
            Some(self.lyric_lines.join("\n"))
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands, sorted longest-prefix-first.
pub struct CommandRegistry {
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no prefix matches.
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = if input.len() > prefix.len() {
                    input[prefix.len()..].trim()
                } else {
                    ""
                };
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Song setup
    registry.register("generate", song::cmd_generate);
    registry.register("genre", song::cmd_genre);
    registry.register("key", song::cmd_key);
    registry.register("mode", song::cmd_mode);
    registry.register("tempo", song::cmd_tempo);
    registry.register("lyrics clear", song::cmd_lyrics_clear);
    registry.register("lyrics add", song::cmd_lyrics_add);
    registry.register("lyrics", song::cmd_lyrics_show);
    registry.register("song", song::cmd_song);

    // Playback
    registry.register("play", playback::cmd_play);
    registry.register("loop", playback::cmd_loop);
    registry.register("stop", playback::cmd_stop);
    registry.register("mixer", playback::cmd_mixer);
    registry.register("metronome", playback::cmd_metronome);
    registry.register("drumloop", playback::cmd_drumloop);
    registry.register("autoplay", playback::cmd_autoplay);

    // Export / import
    registry.register("export json", export::cmd_export_json);
    registry.register("export midi", export::cmd_export_midi);
    registry.register("import json", export::cmd_import_json);

    // General
    registry.register("help", song::cmd_help);
    registry.register("quit", song::cmd_quit);
    registry.register("exit", song::cmd_quit);

    registry
}

/// Build a context against a stopped clock and a headless mixer, for
/// tests that never open an audio device.
#[cfg(test)]
pub(crate) fn test_context() -> CommandContext {
    let clock = Arc::new(MasterClock::new(120.0));
    let mixer = Arc::new(Mutex::new(MixerState::new()));
    let conductor = Conductor::spawn(mixer.clone(), 44100.0, clock.subscribe());
    CommandContext::new(conductor, clock, mixer)
}
