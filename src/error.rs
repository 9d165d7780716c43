//! Unified error type for parking-assist.
//!
//! Only construction can fail. Once an FSM exists, `fire` and its guards
//! and actions have no failure path: sensor noise is filtered, stuck lines
//! are bounded by port-side timeouts. All variants carry fixed-size data.

use core::fmt;

/// Configuration errors reported by FSM and port constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Engine
    /// A transition table with no entries.
    EmptyTransitionTable,

    /// The initial state is neither an origin nor a destination in the table.
    UnknownInitialState,

    // Port layer
    /// No hardware record is registered under this id.
    UnknownDeviceId(u32),

    // Devices
    /// Keyboard layout dimensions do not match its key grid.
    InvalidLayout,

    /// Light intensity above `MAX_LEVEL_INTENSITY`.
    InvalidIntensity(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyTransitionTable => f.write_str("transition table is empty"),
            Error::UnknownInitialState => {
                f.write_str("initial state does not appear in the transition table")
            }
            Error::UnknownDeviceId(id) => write!(f, "no device registered with id {}", id),
            Error::InvalidLayout => f.write_str("keyboard layout does not match its key grid"),
            Error::InvalidIntensity(level) => write!(f, "intensity {} out of range", level),
        }
    }
}
