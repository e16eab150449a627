//! The conductor: lookahead scheduler and loop drivers
//!
//! One thread owns a priority queue of (absolute-beat, action) pairs and
//! drains it on every clock tick. Starting playback precomputes absolute
//! start beats for the whole flattened score relative to the current beat
//! plus a fixed lookahead, so per-event dispatch latency never shifts
//! timing. Loop drivers (drum-pattern loop, metronome, idle-triggered
//! autoplay) re-arm themselves one bar at a time, checking a cancellation
//! token before every iteration; stopping kills the token and clears the
//! queue, so no hit lands after stop returns. Starting while already
//! playing stops fully first - restart is idempotent, never additive.
//!
//! Every registry mutation happens on this thread, which is what makes
//! the exactly-once voice teardown enforceable without locking beyond the
//! shared mixer mutex.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use colored::*;
use crossbeam_channel::{Receiver, Sender, select, unbounded};

use songsmith_core::types::time;
use songsmith_core::{DrumSound, Genre, Note, PartId, ScoreEvent, ScoreEventKind};

use crate::audio::adsr::Envelope;
use crate::audio::clock::ClockTick;
use crate::audio::drums::DrumVoice;
use crate::audio::engine::MixerState;
use crate::audio::instrument::{Chain, SamplePlayer};
use crate::audio::library::{InstrumentBank, Patch};
use crate::audio::voice::VoiceId;

/// Fixed scheduling lookahead, converted to beats at the current tempo.
const LOOKAHEAD_SECONDS: f64 = 0.05;

/// Which synthesis patch realizes each score part.
fn instrument_for(part: PartId) -> &'static str {
    match part {
        PartId::Melody => "fiddle",
        PartId::Bass => "bass",
        PartId::Guitar => "guitar",
        PartId::Piano => "piano",
        PartId::Drums => "drums",
    }
}

enum Action {
    NoteOn {
        part: PartId,
        note: Note,
        velocity: f32,
        duration: f64,
        live: Arc<AtomicBool>,
    },
    ReleaseVoice(VoiceId),
    DrumHit {
        sound: DrumSound,
        velocity: f32,
        live: Arc<AtomicBool>,
    },
    Click {
        strong: bool,
        live: Arc<AtomicBool>,
    },
    /// Drum-loop driver: schedule one bar of the genre grid, then re-arm.
    DrumBar {
        genre: Genre,
        bar_start: f64,
        live: Arc<AtomicBool>,
    },
    /// Metronome driver: one bar of clicks, then re-arm.
    MetronomeBar {
        bar_start: f64,
        live: Arc<AtomicBool>,
    },
    /// Loop-range playback: schedule the window again from `origin`.
    RestartScore {
        origin: f64,
        live: Arc<AtomicBool>,
    },
}

struct Scheduled {
    beat: f64,
    seq: u64,
    action: Action,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.beat == other.beat && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // FIFO among equal beats via the sequence counter
        self.beat
            .total_cmp(&other.beat)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

struct PlaybackState {
    events: Arc<Vec<ScoreEvent>>,
    start_beat: f64,
    loop_range: Option<(f64, f64)>,
    end_beat: f64,
    live: Arc<AtomicBool>,
}

pub(crate) enum ConductorCommand {
    Play {
        events: Vec<ScoreEvent>,
        tempo: f32,
        start_beat: f64,
        loop_range: Option<(f64, f64)>,
    },
    /// Retain a score as autoplay material without starting it.
    SetScore { events: Vec<ScoreEvent>, tempo: f32 },
    SetBpm(f32),
    Stop,
    DrumLoop(Option<Genre>),
    Metronome(bool),
    Autoplay(Option<Duration>),
    /// User activity marker; resets the autoplay idle timer.
    Touch,
    Shutdown,
}

struct ConductorLoop {
    mixer: Arc<Mutex<MixerState>>,
    bank: InstrumentBank,
    sample_rate: f32,
    playing: Arc<AtomicBool>,
    queue: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
    /// Beat position of the most recent clock tick.
    now: f64,
    bpm: f32,
    playback: Option<PlaybackState>,
    /// Autoplay material: the most recently generated or played score.
    score: Option<(Arc<Vec<ScoreEvent>>, f32)>,
    drum_loop: Option<(Genre, Arc<AtomicBool>)>,
    metronome: Option<Arc<AtomicBool>>,
    autoplay: Option<Duration>,
    last_activity: Instant,
}

impl ConductorLoop {
    fn new(mixer: Arc<Mutex<MixerState>>, sample_rate: f32, playing: Arc<AtomicBool>) -> Self {
        Self {
            mixer,
            bank: InstrumentBank::new(),
            sample_rate,
            playing,
            queue: BinaryHeap::new(),
            seq: 0,
            now: 0.0,
            bpm: 120.0,
            playback: None,
            score: None,
            drum_loop: None,
            metronome: None,
            autoplay: None,
            last_activity: Instant::now(),
        }
    }

    fn push(&mut self, beat: f64, action: Action) {
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(Reverse(Scheduled { beat, seq, action }));
    }

    fn lookahead_beats(&self) -> f64 {
        LOOKAHEAD_SECONDS * self.bpm as f64 / 60.0
    }

    fn next_bar(&self) -> f64 {
        (self.now / 4.0).floor() * 4.0 + 4.0
    }

    /// True when the command loop should exit.
    fn handle_command(&mut self, cmd: ConductorCommand) -> bool {
        self.last_activity = Instant::now();
        match cmd {
            ConductorCommand::Play {
                events,
                tempo,
                start_beat,
                loop_range,
            } => self.play(events, tempo, start_beat, loop_range),
            ConductorCommand::SetScore { events, tempo } => {
                self.score = Some((Arc::new(events), tempo));
            }
            ConductorCommand::SetBpm(bpm) => self.bpm = bpm,
            ConductorCommand::Stop => self.stop_everything(),
            ConductorCommand::DrumLoop(genre) => self.set_drum_loop(genre),
            ConductorCommand::Metronome(on) => self.set_metronome(on),
            ConductorCommand::Autoplay(threshold) => self.autoplay = threshold,
            ConductorCommand::Touch => {}
            ConductorCommand::Shutdown => {
                self.stop_everything();
                return true;
            }
        }
        false
    }

    fn play(
        &mut self,
        events: Vec<ScoreEvent>,
        tempo: f32,
        start_beat: f64,
        loop_range: Option<(f64, f64)>,
    ) {
        self.stop_everything();

        self.bpm = tempo;
        let events = Arc::new(events);
        self.score = Some((events.clone(), tempo));

        let live = Arc::new(AtomicBool::new(true));
        let origin = self.now + self.lookahead_beats();
        let state = PlaybackState {
            events,
            start_beat,
            loop_range,
            end_beat: 0.0,
            live,
        };
        let end_beat = self.schedule_pass(&state, origin);
        self.playback = Some(PlaybackState { end_beat, ..state });
        self.playing.store(true, Ordering::Relaxed);
    }

    /// Schedule one pass of the playback window starting at `origin`.
    /// Returns the absolute beat where the pass ends.
    fn schedule_pass(&mut self, state: &PlaybackState, origin: f64) -> f64 {
        let lower = state
            .loop_range
            .map(|(a, _)| a.max(state.start_beat))
            .unwrap_or(state.start_beat);
        let upper = state.loop_range.map(|(_, b)| b);

        let events = state.events.clone();
        let live = state.live.clone();
        let mut end = origin;

        for event in events.iter() {
            let start = time::to_f64(event.start);
            if start < lower {
                continue;
            }
            if let Some(upper) = upper {
                if start >= upper {
                    continue;
                }
            }
            let at = origin + (start - lower);
            let duration = time::to_f64(event.duration);
            end = end.max(at + duration);

            match event.kind {
                ScoreEventKind::Note { note, velocity } => self.push(
                    at,
                    Action::NoteOn {
                        part: event.part,
                        note,
                        velocity,
                        duration,
                        live: live.clone(),
                    },
                ),
                ScoreEventKind::Drum { sound, velocity } => self.push(
                    at,
                    Action::DrumHit {
                        sound,
                        velocity,
                        live: live.clone(),
                    },
                ),
            }
        }

        if let Some((a, b)) = state.loop_range {
            let window = (b - a.max(state.start_beat)).max(0.5);
            self.push(
                origin + window,
                Action::RestartScore {
                    origin: origin + window,
                    live: live.clone(),
                },
            );
        }

        end
    }

    fn set_drum_loop(&mut self, genre: Option<Genre>) {
        if let Some((_, live)) = self.drum_loop.take() {
            live.store(false, Ordering::Relaxed);
        }
        if let Some(genre) = genre {
            let live = Arc::new(AtomicBool::new(true));
            self.drum_loop = Some((genre, live.clone()));
            let bar_start = self.next_bar();
            self.push(bar_start, Action::DrumBar { genre, bar_start, live });
        }
    }

    fn set_metronome(&mut self, on: bool) {
        if let Some(live) = self.metronome.take() {
            live.store(false, Ordering::Relaxed);
        }
        if on {
            let live = Arc::new(AtomicBool::new(true));
            self.metronome = Some(live.clone());
            let bar_start = self.next_bar();
            self.push(bar_start, Action::MetronomeBar { bar_start, live });
        }
    }

    /// Full teardown: queued actions, driver tokens, and every live voice.
    /// Safe to call repeatedly and from any command path.
    fn stop_everything(&mut self) {
        self.queue.clear();
        if let Some(state) = self.playback.take() {
            state.live.store(false, Ordering::Relaxed);
        }
        if let Some((_, live)) = self.drum_loop.take() {
            live.store(false, Ordering::Relaxed);
        }
        if let Some(live) = self.metronome.take() {
            live.store(false, Ordering::Relaxed);
        }
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.stop_all();
        }
        self.playing.store(false, Ordering::Relaxed);
    }

    fn on_tick(&mut self, beat: f64) {
        self.now = beat;

        while let Some(Reverse(next)) = self.queue.peek() {
            if next.beat > beat {
                break;
            }
            let Reverse(scheduled) = self.queue.pop().expect("peeked entry vanished");
            self.execute(scheduled.action, scheduled.beat);
        }

        if let Some(state) = &self.playback {
            if state.loop_range.is_none() && beat > state.end_beat {
                self.playback = None;
                self.playing.store(false, Ordering::Relaxed);
            }
        }

        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.sweep();
        }

        self.check_autoplay();
    }

    fn check_autoplay(&mut self) {
        let Some(threshold) = self.autoplay else {
            return;
        };
        if self.playback.is_some() || self.last_activity.elapsed() < threshold {
            return;
        }
        let Some((events, tempo)) = self.score.clone() else {
            return;
        };
        println!(
            "{}",
            "Quiet in here - playing the last composition".bright_cyan()
        );
        self.play(events.to_vec(), tempo, 0.0, None);
        self.last_activity = Instant::now();
    }

    fn execute(&mut self, action: Action, fire_beat: f64) {
        match action {
            Action::NoteOn {
                part,
                note,
                velocity,
                duration,
                live,
            } => {
                if live.load(Ordering::Relaxed) {
                    self.note_on(part, note, velocity, duration, fire_beat);
                }
            }
            Action::ReleaseVoice(id) => {
                if let Ok(mut mixer) = self.mixer.lock() {
                    mixer.registry.release(id);
                }
            }
            Action::DrumHit {
                sound,
                velocity,
                live,
            } => {
                if live.load(Ordering::Relaxed) {
                    if let Ok(mut mixer) = self.mixer.lock() {
                        mixer.add_drum(DrumVoice::new(sound, velocity, self.sample_rate));
                    }
                }
            }
            Action::Click { strong, live } => {
                if live.load(Ordering::Relaxed) {
                    if let Ok(mut mixer) = self.mixer.lock() {
                        mixer.add_click(DrumVoice::click(strong, self.sample_rate));
                    }
                }
            }
            Action::DrumBar {
                genre,
                bar_start,
                live,
            } => {
                if !live.load(Ordering::Relaxed) {
                    return;
                }
                let grid = genre.drum_grid();
                let lanes = [
                    (DrumSound::Kick, grid.kick, songsmith_core::genre::KICK_VELOCITY),
                    (DrumSound::Snare, grid.snare, songsmith_core::genre::SNARE_VELOCITY),
                    (DrumSound::HiHat, grid.hihat, songsmith_core::genre::HIHAT_VELOCITY),
                ];
                for (sound, pattern, velocity) in lanes {
                    for (slot, &hit) in pattern.iter().enumerate() {
                        if hit {
                            self.push(
                                bar_start + slot as f64 * 0.5,
                                Action::DrumHit {
                                    sound,
                                    velocity,
                                    live: live.clone(),
                                },
                            );
                        }
                    }
                }
                self.push(
                    bar_start + 4.0,
                    Action::DrumBar {
                        genre,
                        bar_start: bar_start + 4.0,
                        live,
                    },
                );
            }
            Action::MetronomeBar { bar_start, live } => {
                if !live.load(Ordering::Relaxed) {
                    return;
                }
                for b in 0..4 {
                    self.push(
                        bar_start + b as f64,
                        Action::Click {
                            strong: b == 0,
                            live: live.clone(),
                        },
                    );
                }
                self.push(
                    bar_start + 4.0,
                    Action::MetronomeBar {
                        bar_start: bar_start + 4.0,
                        live,
                    },
                );
            }
            Action::RestartScore { origin, live } => {
                if !live.load(Ordering::Relaxed) {
                    return;
                }
                if let Some(state) = self.playback.take() {
                    let end_beat = self.schedule_pass(&state, origin);
                    self.playback = Some(PlaybackState { end_beat, ..state });
                }
            }
        }
    }

    /// Realize one note: resolve a patch, build its chain, admit the voice,
    /// and arm its natural-expiry release. A failed build is logged and
    /// dropped; the loop never dies for one bad voice.
    fn note_on(&mut self, part: PartId, note: Note, velocity: f32, duration: f64, fire_beat: f64) {
        let instrument = instrument_for(part);
        let frequency = note.frequency();

        let (chain, envelope_params) = match self.bank.resolve(instrument, note) {
            Patch::Profile { profile, envelope } => {
                (profile.build(frequency, velocity, self.sample_rate), envelope)
            }
            Patch::Sample(buffer) => (
                SamplePlayer::new(buffer, frequency).map(Chain::Sample),
                crate::audio::adsr::EnvelopeParams::plain(),
            ),
        };

        let chain = match chain {
            Ok(chain) => chain,
            Err(e) => {
                eprintln!("{} {} ({}): {}", "Voice error:".red(), note, instrument, e);
                return;
            }
        };

        let envelope = Envelope::new(envelope_params, self.sample_rate);
        let id = match self.mixer.lock() {
            Ok(mut mixer) => mixer.registry.admit(
                part,
                instrument,
                note,
                velocity,
                fire_beat,
                chain,
                envelope,
            ),
            Err(_) => return,
        };
        self.push(fire_beat + duration, Action::ReleaseVoice(id));
    }
}

/// Handle to the conductor thread. Dropping it shuts the thread down.
pub struct Conductor {
    command_tx: Sender<ConductorCommand>,
    playing: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Conductor {
    pub fn spawn(
        mixer: Arc<Mutex<MixerState>>,
        sample_rate: f32,
        ticks: Receiver<ClockTick>,
    ) -> Self {
        let (command_tx, command_rx) = unbounded();
        let playing = Arc::new(AtomicBool::new(false));

        let thread = {
            let playing = playing.clone();
            thread::spawn(move || {
                let mut state = ConductorLoop::new(mixer, sample_rate, playing);
                loop {
                    select! {
                        recv(command_rx) -> msg => match msg {
                            Ok(cmd) => {
                                if state.handle_command(cmd) {
                                    break;
                                }
                            }
                            Err(_) => break,
                        },
                        recv(ticks) -> msg => match msg {
                            Ok(tick) => state.on_tick(tick.beat),
                            Err(_) => break,
                        },
                    }
                }
            })
        };

        Self {
            command_tx,
            playing,
            thread: Some(thread),
        }
    }

    pub fn play(
        &self,
        events: Vec<ScoreEvent>,
        tempo: f32,
        start_beat: f64,
        loop_range: Option<(f64, f64)>,
    ) {
        let _ = self.command_tx.send(ConductorCommand::Play {
            events,
            tempo,
            start_beat,
            loop_range,
        });
    }

    pub fn set_score(&self, events: Vec<ScoreEvent>, tempo: f32) {
        let _ = self
            .command_tx
            .send(ConductorCommand::SetScore { events, tempo });
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(ConductorCommand::Stop);
    }

    pub fn set_bpm(&self, bpm: f32) {
        let _ = self.command_tx.send(ConductorCommand::SetBpm(bpm));
    }

    pub fn set_drum_loop(&self, genre: Option<Genre>) {
        let _ = self.command_tx.send(ConductorCommand::DrumLoop(genre));
    }

    pub fn set_metronome(&self, on: bool) {
        let _ = self.command_tx.send(ConductorCommand::Metronome(on));
    }

    pub fn set_autoplay(&self, threshold: Option<Duration>) {
        let _ = self.command_tx.send(ConductorCommand::Autoplay(threshold));
    }

    /// Mark user activity for the autoplay idle timer.
    pub fn touch(&self) {
        let _ = self.command_tx.send(ConductorCommand::Touch);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for Conductor {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ConductorCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
