//! Activation state machine.
//!
//! An entity's data is materialized from its model lazily. The
//! [`ActivationCell`] guarantees that the first materialization happens at
//! most once regardless of how many threads ask for it, and that the status
//! only ever moves forward:
//!
//! ```text
//! NotActivated ──► ActivatedRead ──► ActivatedReadWrite
//!       └─────────────────────────────────►┘
//! ```
//!
//! Only the `NotActivated` transition is guarded by the cell's mutex. The
//! read to write upgrade runs unlocked and relies on the model tolerating a
//! redundant or concurrent write activation.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

/// Degree of activation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ActivationStatus {
    /// Only the label is known; no data has been loaded.
    NotActivated = 0,
    /// Data has been loaded for reading.
    ActivatedRead = 1,
    /// Data has been loaded and prepared for mutation.
    ActivatedReadWrite = 2,
}

impl ActivationStatus {
    /// Returns the raw status byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a raw status byte.
    ///
    /// # Errors
    ///
    /// Returns `InvalidActivationState` for any value outside the three
    /// defined states.
    pub fn from_u8(value: u8) -> CoreResult<Self> {
        match value {
            0 => Ok(Self::NotActivated),
            1 => Ok(Self::ActivatedRead),
            2 => Ok(Self::ActivatedReadWrite),
            _ => Err(CoreError::InvalidActivationState { value }),
        }
    }

    /// Returns true once any data has been loaded.
    #[must_use]
    pub const fn is_activated(self) -> bool {
        !matches!(self, Self::NotActivated)
    }

    /// Returns true if the entity is ready for mutation.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ActivatedReadWrite)
    }

    /// Returns true if this status satisfies a request of the given degree.
    #[must_use]
    pub const fn satisfies(self, mode: ActivationMode) -> bool {
        match mode {
            ActivationMode::Read => self.is_activated(),
            ActivationMode::ReadWrite => self.is_writable(),
        }
    }

    const fn for_mode(mode: ActivationMode) -> Self {
        match mode {
            ActivationMode::Read => Self::ActivatedRead,
            ActivationMode::ReadWrite => Self::ActivatedReadWrite,
        }
    }
}

/// Degree of activation requested from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationMode {
    /// Load data for reading.
    Read,
    /// Load data and prepare it for mutation.
    ReadWrite,
}

impl ActivationMode {
    /// Maps the `for_write` flag used throughout the API to a mode.
    #[must_use]
    pub const fn from_write_flag(for_write: bool) -> Self {
        if for_write {
            Self::ReadWrite
        } else {
            Self::Read
        }
    }

    /// Returns true for write activation.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// Outcome of an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status already satisfied the request; the model was not called.
    Unchanged,
    /// The model activated the entity and the status advanced.
    Advanced {
        /// Status before the transition.
        from: ActivationStatus,
        /// Status after the transition.
        to: ActivationStatus,
    },
    /// The model declined; the status did not change.
    Declined(ActivationMode),
}

/// Per-entity activation status with its transition lock.
#[derive(Debug)]
pub struct ActivationCell {
    status: AtomicU8,
    lock: Mutex<()>,
}

impl ActivationCell {
    /// Creates a cell. `activated` seeds `ActivatedRead`.
    #[must_use]
    pub fn new(activated: bool) -> Self {
        let status = if activated {
            ActivationStatus::ActivatedRead
        } else {
            ActivationStatus::NotActivated
        };
        Self {
            status: AtomicU8::new(status.as_u8()),
            lock: Mutex::new(()),
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> CoreResult<ActivationStatus> {
        ActivationStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Brings the status up to the requested degree, calling `activate` as
    /// needed.
    ///
    /// `activate` is called with the degree to load and returns whether the
    /// model succeeded. For a `NotActivated` cell it is called at most once
    /// across all concurrent callers; the upgrade from `ActivatedRead` may
    /// call it more than once under contention.
    pub fn ensure<F>(&self, for_write: bool, activate: F) -> CoreResult<Transition>
    where
        F: Fn(ActivationMode) -> bool,
    {
        let mode = ActivationMode::from_write_flag(for_write);
        let mut current = self.status()?;

        if current == ActivationStatus::NotActivated {
            let _guard = self.lock.lock();
            current = self.status()?;
            if current == ActivationStatus::NotActivated {
                if !activate(mode) {
                    return Ok(Transition::Declined(mode));
                }
                return self.advance(ActivationStatus::for_mode(mode));
            }
            // Lost the race; apply the rules for the status the winner left.
        }

        match current {
            ActivationStatus::ActivatedReadWrite => Ok(Transition::Unchanged),
            ActivationStatus::ActivatedRead if !for_write => Ok(Transition::Unchanged),
            ActivationStatus::ActivatedRead => {
                if !activate(ActivationMode::ReadWrite) {
                    return Ok(Transition::Declined(ActivationMode::ReadWrite));
                }
                self.advance(ActivationStatus::ActivatedReadWrite)
            }
            ActivationStatus::NotActivated => Err(CoreError::InvalidActivationState {
                value: current.as_u8(),
            }),
        }
    }

    /// Runs a one-time custom initializer instead of a model activation.
    ///
    /// Only acts while the status is exactly `NotActivated`; afterwards the
    /// status is `ActivatedRead` and every further call is a no-op. Returns
    /// whether `init` ran.
    pub fn ensure_once<F>(&self, init: F) -> CoreResult<bool>
    where
        F: FnOnce(),
    {
        if self.status()? != ActivationStatus::NotActivated {
            return Ok(false);
        }

        let _guard = self.lock.lock();
        if self.status()? != ActivationStatus::NotActivated {
            return Ok(false);
        }
        init();
        self.advance(ActivationStatus::ActivatedRead)?;
        Ok(true)
    }

    /// Moves the status forward; never backward.
    fn advance(&self, target: ActivationStatus) -> CoreResult<Transition> {
        let previous = self.status.fetch_max(target.as_u8(), Ordering::AcqRel);
        let from = ActivationStatus::from_u8(previous)?;
        Ok(Transition::Advanced {
            from,
            to: from.max(target),
        })
    }
}

impl Default for ActivationCell {
    fn default() -> Self {
        Self::new(false)
    }
}
