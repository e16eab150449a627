//! Interactive front-end
//!
//! A rustyline loop over the command registry. The audio engine is
//! optional at startup: on a machine with no output device Songsmith
//! still composes, analyzes, and exports - it just plays nothing.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use colored::*;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::audio::clock::MasterClock;
use crate::audio::conductor::Conductor;
use crate::audio::engine::{AudioEngine, MixerState};
use crate::commands::{CommandContext, CommandResult, create_registry};

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

pub struct Repl {
    editor: DefaultEditor,
    ctx: CommandContext,
    /// Keeps the output stream alive for the session.
    _engine: Option<AudioEngine>,
}

impl Repl {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()?;

        let (engine, mixer, sample_rate) = match AudioEngine::new() {
            Ok(engine) => {
                let mixer = engine.mixer();
                let sample_rate = engine.sample_rate();
                (Some(engine), mixer, sample_rate)
            }
            Err(e) => {
                eprintln!(
                    "{} {} (composing and export still work)",
                    "No audio output:".yellow(),
                    e
                );
                (None, Arc::new(Mutex::new(MixerState::new())), DEFAULT_SAMPLE_RATE)
            }
        };

        let clock = Arc::new(MasterClock::new(120.0));
        clock.start();
        let conductor = Conductor::spawn(mixer.clone(), sample_rate, clock.subscribe());
        let ctx = CommandContext::new(conductor, clock, mixer);

        Ok(Self {
            editor,
            ctx,
            _engine: engine,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", "Songsmith".bright_cyan().bold());
        println!(
            "Set up a song ({}, {}, {}, {}), then {} and {}.",
            "genre".cyan(),
            "key".cyan(),
            "tempo".cyan(),
            "lyrics add".cyan(),
            "generate".bright_green(),
            "play".bright_green()
        );
        println!(
            "Type '{}' for commands, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        let registry = create_registry();
        let prompt = format!("{} ", "songsmith>".bright_magenta().bold());

        loop {
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&line);
                    // Any input counts as activity for the autoplay timer
                    self.ctx.conductor.touch();

                    match registry.execute(&line, &mut self.ctx) {
                        CommandResult::Success => {}
                        CommandResult::Message(msg) => println!("{}", msg),
                        CommandResult::Exit => {
                            self.ctx.conductor.stop();
                            println!("{}", "Goodbye!".bright_cyan());
                            break;
                        }
                        CommandResult::Error(e) => {
                            println!("{} {}", "Error:".bright_red().bold(), e.red());
                        }
                        CommandResult::NotACommand => {
                            println!(
                                "Unknown command '{}'. Type '{}' for the list.",
                                line,
                                "help".bright_green()
                            );
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    self.ctx.conductor.stop();
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(e) => {
                    println!("{} {}", "Input error:".bright_red(), e);
                    break;
                }
            }
        }

        Ok(())
    }
}
