//! Master clock
//!
//! One thread generates 24-PPQN pulses (the MIDI clock resolution) and
//! broadcasts them to every subscriber over crossbeam channels. The
//! worker waits on its command channel with a deadline set to the next
//! pulse, so commands and pulses interleave without polling; a slow
//! subscriber never stalls the clock because sends are non-blocking.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pulses per quarter note.
pub const TICKS_PER_BEAT: u8 = 24;

/// One broadcast pulse.
#[derive(Debug, Clone, Copy)]
pub struct ClockTick {
    /// Fractional beat position since the clock started (4.5 = halfway
    /// through beat 5).
    pub beat: f64,
    pub beat_number: u64,
    pub tick_in_beat: u8,
}

impl ClockTick {
    pub fn is_beat_boundary(&self) -> bool {
        self.tick_in_beat == 0
    }

    /// Bar boundaries fall every four beats in 4/4.
    pub fn is_bar_boundary(&self) -> bool {
        self.is_beat_boundary() && self.beat_number % 4 == 0
    }
}

enum ClockCommand {
    Start,
    Stop,
    Rewind,
    Subscribe(Sender<ClockTick>),
    Shutdown,
}

/// Clock handle. Tempo changes apply from the next pulse onward.
pub struct MasterClock {
    bpm_bits: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    command_tx: Sender<ClockCommand>,
    worker: Option<JoinHandle<()>>,
}

impl MasterClock {
    pub fn new(bpm: f32) -> Self {
        let bpm_bits = Arc::new(AtomicU32::new(bpm.to_bits()));
        let running = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = unbounded();

        let worker = {
            let bpm_bits = bpm_bits.clone();
            let running = running.clone();
            thread::spawn(move || {
                ClockWorker {
                    bpm_bits,
                    running,
                    command_rx,
                    listeners: Vec::new(),
                    beat_number: 0,
                    tick_in_beat: 0,
                }
                .run()
            })
        };

        Self {
            bpm_bits,
            running,
            command_tx,
            worker: Some(worker),
        }
    }

    /// Open a new tick stream. Every subscriber sees every pulse.
    pub fn subscribe(&self) -> Receiver<ClockTick> {
        let (tx, rx) = unbounded();
        let _ = self.command_tx.send(ClockCommand::Subscribe(tx));
        rx
    }

    pub fn start(&self) {
        let _ = self.command_tx.send(ClockCommand::Start);
    }

    pub fn stop(&self) {
        let _ = self.command_tx.send(ClockCommand::Stop);
    }

    /// Rewind the beat counter to zero.
    pub fn reset(&self) {
        let _ = self.command_tx.send(ClockCommand::Rewind);
    }

    pub fn set_bpm(&self, bpm: f32) {
        self.bpm_bits.store(bpm.to_bits(), Ordering::Relaxed);
    }

    pub fn bpm(&self) -> f32 {
        f32::from_bits(self.bpm_bits.load(Ordering::Relaxed))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Drop for MasterClock {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ClockCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct ClockWorker {
    bpm_bits: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    command_rx: Receiver<ClockCommand>,
    listeners: Vec<Sender<ClockTick>>,
    beat_number: u64,
    tick_in_beat: u8,
}

impl ClockWorker {
    fn pulse_interval(&self) -> Duration {
        let bpm = f32::from_bits(self.bpm_bits.load(Ordering::Relaxed)) as f64;
        Duration::from_secs_f64(60.0 / bpm / TICKS_PER_BEAT as f64)
    }

    fn run(mut self) {
        // Deadline of the next pulse while running
        let mut deadline = Instant::now();

        loop {
            if !self.running.load(Ordering::Relaxed) {
                // Parked: block on commands only
                match self.command_rx.recv() {
                    Ok(cmd) => {
                        if self.handle(cmd) {
                            return;
                        }
                        deadline = Instant::now();
                    }
                    Err(_) => return,
                }
                continue;
            }

            match self.command_rx.recv_deadline(deadline) {
                Ok(cmd) => {
                    if self.handle(cmd) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.broadcast();
                    self.step();
                    deadline += self.pulse_interval();
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    /// Returns true on shutdown.
    fn handle(&mut self, cmd: ClockCommand) -> bool {
        match cmd {
            ClockCommand::Start => self.running.store(true, Ordering::Relaxed),
            ClockCommand::Stop => self.running.store(false, Ordering::Relaxed),
            ClockCommand::Rewind => {
                self.beat_number = 0;
                self.tick_in_beat = 0;
            }
            ClockCommand::Subscribe(tx) => self.listeners.push(tx),
            ClockCommand::Shutdown => {
                self.running.store(false, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    fn broadcast(&mut self) {
        let tick = ClockTick {
            beat: self.beat_number as f64 + self.tick_in_beat as f64 / TICKS_PER_BEAT as f64,
            beat_number: self.beat_number,
            tick_in_beat: self.tick_in_beat,
        };
        // Disconnected listeners drop out on send failure
        self.listeners.retain(|tx| tx.send(tick).is_ok());
    }

    fn step(&mut self) {
        self.tick_in_beat = (self.tick_in_beat + 1) % TICKS_PER_BEAT;
        if self.tick_in_beat == 0 {
            self.beat_number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_parked() {
        let clock = MasterClock::new(120.0);
        assert_eq!(clock.bpm(), 120.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_bpm_change() {
        let clock = MasterClock::new(120.0);
        clock.set_bpm(90.0);
        assert_eq!(clock.bpm(), 90.0);
    }

    #[test]
    fn test_boundary_helpers() {
        let on_bar = ClockTick {
            beat: 8.0,
            beat_number: 8,
            tick_in_beat: 0,
        };
        assert!(on_bar.is_beat_boundary());
        assert!(on_bar.is_bar_boundary());

        let mid_beat = ClockTick {
            beat: 8.5,
            beat_number: 8,
            tick_in_beat: 12,
        };
        assert!(!mid_beat.is_beat_boundary());

        let off_bar = ClockTick {
            beat: 9.0,
            beat_number: 9,
            tick_in_beat: 0,
        };
        assert!(off_bar.is_beat_boundary());
        assert!(!off_bar.is_bar_boundary());
    }

    #[test]
    fn test_start_and_stop_flip_the_flag() {
        let clock = MasterClock::new(120.0);
        clock.start();
        thread::sleep(Duration::from_millis(50));
        assert!(clock.is_running());
        clock.stop();
        thread::sleep(Duration::from_millis(50));
        assert!(!clock.is_running());
    }

    #[test]
    fn test_subscriber_receives_monotonic_beats() {
        let clock = MasterClock::new(480.0); // fast pulses keep the test short
        let rx = clock.subscribe();
        clock.start();
        let mut beats = Vec::new();
        for _ in 0..12 {
            if let Ok(tick) = rx.recv_timeout(Duration::from_secs(1)) {
                beats.push(tick.beat);
            }
        }
        clock.stop();
        assert!(beats.len() >= 2);
        assert!(beats.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pulses_count_through_beats() {
        let clock = MasterClock::new(960.0);
        let rx = clock.subscribe();
        clock.start();
        // A full beat of pulses plus one: the 25th pulse is beat 1, tick 0
        let mut last = None;
        for _ in 0..(TICKS_PER_BEAT as usize + 1) {
            last = rx.recv_timeout(Duration::from_secs(2)).ok();
        }
        clock.stop();
        let tick = last.expect("clock produced no pulses");
        assert_eq!(tick.beat_number, 1);
        assert_eq!(tick.tick_in_beat, 0);
    }
}
