use std::str::FromStr;

use super::state::{DoorState, PulseIntent};

/// The command vocabulary accepted on a door's action topic.
///
/// Payloads are matched exactly; `"open"` is not a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Open,
  Close,
  Toggle,
  Stop,
}

impl FromStr for Command {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "OPEN" => Ok(Command::Open),
      "CLOSE" => Ok(Command::Close),
      "TOGGLE" => Ok(Command::Toggle),
      "STOP" => Ok(Command::Stop),
      _ => Err(()),
    }
  }
}

/// What a command should do to a door, given its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  /// Fire the relay
  Pulse(PulseIntent),
  /// The door is already in the commanded state
  AlreadyThere,
  /// STOP on a door without travel-limit hardware
  Unsupported,
}

impl Command {
  /// Decide whether this command warrants an actuation.
  ///
  /// OPEN and CLOSE are idempotent: commanding the state the door is
  /// already in does nothing. From `Unknown` both pulse, since the
  /// door may well be in the other state. TOGGLE always pulses; a
  /// pulse-relay door cannot express direction, only "go".
  pub fn decide(&self, state: DoorState, supports_stop: bool) -> Decision {
    match self {
      Command::Open => match state {
        DoorState::Open => Decision::AlreadyThere,
        DoorState::Closed | DoorState::Unknown => Decision::Pulse(PulseIntent::Opening),
      },
      Command::Close => match state {
        DoorState::Closed => Decision::AlreadyThere,
        DoorState::Open | DoorState::Unknown => Decision::Pulse(PulseIntent::Closing),
      },
      Command::Toggle => Decision::Pulse(PulseIntent::Cycling),
      Command::Stop => {
        if supports_stop {
          Decision::Pulse(PulseIntent::Cycling)
        }
        else {
          Decision::Unsupported
        }
      }
    }
  }
}
