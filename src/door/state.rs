use std::fmt;

/// The debounced, publishable state of a door.
///
/// `Unknown` is the state until the first stable sensor read completes,
/// and again whenever the sensor turns ambiguous for long enough that
/// no stable state has ever been confirmed. It is recoverable: a run of
/// stable samples moves the door back to `Open` or `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
  Open,
  Closed,
  Unknown,
}

impl fmt::Display for DoorState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DoorState::Open => write!(f, "open"),
      DoorState::Closed => write!(f, "closed"),
      DoorState::Unknown => write!(f, "unknown"),
    }
  }
}

/// The direction a relay pulse is meant to move the door in.
///
/// Advisory only: with reed-switch sensing the bridge cannot observe
/// travel, so this is used for pin selection and log output, never for
/// the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseIntent {
  Opening,
  Closing,
  /// A pulse with no known direction (TOGGLE, or STOP on a
  /// travel-limit controller)
  Cycling,
}

impl fmt::Display for PulseIntent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PulseIntent::Opening => write!(f, "opening"),
      PulseIntent::Closing => write!(f, "closing"),
      PulseIntent::Cycling => write!(f, "cycling"),
    }
  }
}
