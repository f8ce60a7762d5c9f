// @file host.rs
// @brief contracts between density surfaces and the plotting host

use std::fmt;
use std::time::{Duration, Instant};

pub const PAN_ZOOM_MODE: &str = "pan/zoom";

pub trait ViewHost {
    fn xlim(&self) -> (f64, f64);

    fn ylim(&self) -> (f64, f64);

    fn xscale(&self) -> &str;
    fn yscale(&self) -> &str;

    fn panel_size(&self) -> (f64, f64);

    fn device_dpi(&self) -> f64;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Press,
    Release,
    Resize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Press,
    Release,
    Resize { width: u32, height: u32 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Press => EventKind::Press,
            Event::Release => EventKind::Release,
            Event::Resize { .. } => EventKind::Resize,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub kind: EventKind,
}

pub trait EventSource {
    fn connect(&mut self, kind: EventKind) -> Subscription;
    fn disconnect(&mut self, subscription: Subscription);
}

/// Single-shot timer scheduled by the host. Starting a running timer
/// restarts its countdown.
pub trait DebounceTimer: fmt::Debug {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;

    fn is_due(&self, now: Instant) -> bool;
}

#[derive(Clone, Debug)]
pub struct SingleShotTimer {
    interval: Duration,
    started: Option<Instant>,
}

impl SingleShotTimer {
    pub fn new(interval: Duration) -> SingleShotTimer {
        SingleShotTimer { interval, started: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl DebounceTimer for SingleShotTimer {
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) {
        self.started = None;
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn is_due(&self, now: Instant) -> bool {
        self.started.is_some_and(|t| now.saturating_duration_since(t) >= self.interval)
    }
}
