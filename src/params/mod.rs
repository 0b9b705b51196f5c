//! Parameter configuration and cross-thread exchange.
//!
//! Components do not own a global parameter registry; instead, each
//! composite is constructed with an explicit table of [`ParamInfo`] ranges
//! and accepts typed [`ParamUpdate`] records.
//!
//! Updates produced on a UI/host thread reach the audio thread through one
//! of three lock-free carriers, each consumed exactly once at the top of a
//! block:
//!
//! - [`param_queue`] — a bounded FIFO of discrete update events;
//! - [`ParamLatch`]/[`SelectLatch`] — last-value-wins latches for scalar
//!   and selector parameters;
//! - [`shared`] — a triple-buffered snapshot of a whole parameter struct.

use crate::util::ilerp;
use atomic::Atomic;
use atomic_float::AtomicF64;
use bytemuck::NoUninit;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

/// Identifiers for every host-controllable parameter in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    // Filter parameters
    Freq,
    Reso,
    Mode,
    // Envelope parameters
    Gate,
    AttackTime,
    DecayTime,
    SustainLevel,
    ReleaseTime,
    // Source parameters
    WaveType,
    // Comb/ring-mod parameters
    Offset,
    Depth,
    Rate,
    ModType,
    Feedback,
}

impl Display for ParamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Freq => "freq",
            Self::Reso => "reso",
            Self::Mode => "mode",
            Self::Gate => "gate",
            Self::AttackTime => "att_time",
            Self::DecayTime => "dec_time",
            Self::SustainLevel => "sus_level",
            Self::ReleaseTime => "rel_time",
            Self::WaveType => "wave_type",
            Self::Offset => "offset",
            Self::Depth => "depth",
            Self::Rate => "rate",
            Self::ModType => "mod_type",
            Self::Feedback => "feedback",
        };

        write!(f, "{id}")
    }
}

/// A typed parameter-change record, dispatched by the owning composite.
/// `forced` skips smoothing where the receiving parameter is ramped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamUpdate {
    pub id: ParamId,
    pub value: f64,
    pub forced: bool,
}

impl ParamUpdate {
    #[must_use]
    pub fn new(id: ParamId, value: f64) -> Self {
        Self { id, value, forced: false }
    }

    #[must_use]
    pub fn forced(id: ParamId, value: f64) -> Self {
        Self { id, value, forced: true }
    }
}

/// Static description of one parameter: identity, display information,
/// range, step, and skew.
///
/// The skew follows the usual plugin convention: a normalized position `t`
/// maps to `min + (max - min) · t^(1/skew)`, so skews below `1` give more
/// travel to the low end of the range.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub id: ParamId,
    pub name: &'static str,
    pub unit: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub skew: f64,
}

impl ParamInfo {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: ParamId,
        name: &'static str,
        unit: &'static str,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
        skew: f64,
    ) -> Self {
        debug_assert!(min < max && skew > 0.0);

        Self { id, name, unit, default, min, max, step, skew }
    }

    /// Clamps `value` into the parameter's range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Clamps `value` and snaps it to the nearest step, where a step is
    /// configured.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let value = self.clamp(value);

        if self.step <= 0.0 {
            return value;
        }

        let stepped = ((value - self.min) / self.step).round() * self.step;
        self.clamp(self.min + stepped)
    }

    /// Maps a parameter value to its normalized `[0, 1]` position.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        ilerp(self.min, self.max, self.clamp(value)).powf(self.skew)
    }

    /// Maps a normalized `[0, 1]` position to a parameter value.
    #[must_use]
    pub fn denormalize(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0).powf(self.skew.recip());
        (self.max - self.min).mul_add(t, self.min)
    }
}

/// Creates a bounded single-producer/single-consumer update queue.
///
/// The sender side lives with the UI/host; the receiver is drained exactly
/// once at the top of each processing block.
#[must_use]
pub fn param_queue(capacity: usize) -> (ParamSender, ParamReceiver) {
    let (tx, rx) = bounded(capacity);

    (ParamSender { tx }, ParamReceiver { rx })
}

/// The producing half of a parameter update queue.
#[derive(Debug, Clone)]
pub struct ParamSender {
    tx: Sender<ParamUpdate>,
}

impl ParamSender {
    /// Pushes an update without blocking. Returns `false` if the queue is
    /// full and the update was dropped.
    pub fn push(&self, update: ParamUpdate) -> bool {
        self.tx.try_send(update).is_ok()
    }
}

/// The consuming half of a parameter update queue.
#[derive(Debug)]
pub struct ParamReceiver {
    rx: Receiver<ParamUpdate>,
}

impl ParamReceiver {
    /// Drains all pending updates, oldest first, without blocking.
    pub fn drain(&self, mut apply: impl FnMut(ParamUpdate)) {
        while let Ok(update) = self.rx.try_recv() {
            apply(update);
        }
    }
}

/// A last-value-wins scalar parameter latch. One thread stores, another
/// takes; intermediate values are collapsed.
#[derive(Debug, Default)]
pub struct ParamLatch {
    value: AtomicF64,
    dirty: AtomicBool,
}

impl ParamLatch {
    #[must_use]
    pub fn new(initial: f64) -> Self {
        Self {
            value: AtomicF64::new(initial),
            dirty: AtomicBool::new(false),
        }
    }

    /// Stores a new value from the producing thread.
    pub fn store(&self, value: f64) {
        self.value.store(value, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns the latest value if it changed since the last call.
    pub fn take(&self) -> Option<f64> {
        self.dirty
            .swap(false, Ordering::Acquire)
            .then(|| self.value.load(Ordering::Acquire))
    }

    /// Reads the current value without consuming the change flag.
    #[must_use]
    pub fn load(&self) -> f64 {
        self.value.load(Ordering::Acquire)
    }
}

/// A last-value-wins latch for enum-valued (selector) parameters.
pub struct SelectLatch<T: NoUninit> {
    value: Atomic<T>,
    dirty: AtomicBool,
}

impl<T: NoUninit> SelectLatch<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: Atomic::new(initial),
            dirty: AtomicBool::new(false),
        }
    }

    /// Stores a new selection from the producing thread.
    pub fn store(&self, value: T) {
        self.value.store(value, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns the latest selection if it changed since the last call.
    pub fn take(&self) -> Option<T> {
        self.dirty
            .swap(false, Ordering::Acquire)
            .then(|| self.value.load(Ordering::Acquire))
    }

    /// Reads the current selection without consuming the change flag.
    pub fn load(&self) -> T {
        self.value.load(Ordering::Acquire)
    }
}

/// Creates a triple-buffered snapshot channel for a whole parameter
/// struct. The producer publishes complete snapshots; the audio side reads
/// the most recent one at block start, so a block never observes a torn
/// parameter set.
#[must_use]
pub fn shared<T: Clone + Send>(
    initial: T,
) -> (triple_buffer::Input<T>, triple_buffer::Output<T>) {
    triple_buffer::TripleBuffer::new(&initial).split()
}
