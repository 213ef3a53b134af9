use std::time::Duration;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};

use super::state::DoorState;
use crate::config::pin::BoardPin;

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct DoorConfig {
  /// Human-readable name used in log output
  pub alias: String,

  /// The name of the MQTT topic open/close commands are received on
  pub action_topic: String,

  /// The name of the MQTT topic state changes are published on
  pub status_topic: String,

  /// The pin driving the open relay
  pub open_pin: BoardPin,

  /// The pin driving the close relay.
  ///
  /// May equal `open_pin` for pulse-relay controllers where a single
  /// momentary pulse alternates direction.
  pub close_pin: BoardPin,

  /// The pin the door's reed switch is read on
  pub status_pin: BoardPin,

  /// Whether driving an actuator pin high (true) or low (false)
  /// energises the relay
  #[serde(default = "default_active_high")]
  pub active_high_relay: bool,

  /// How the reed switch's raw level maps to a door state
  pub status_switch_logic: SwitchLogic,

  /// Whether the door's controller understands a STOP pulse
  /// (travel-limit hardware only)
  #[serde(default)]
  pub supports_stop: bool,

  #[serde_as(as = "DurationMilliSeconds<u64>")]
  /// How long the relay is held energised per actuation
  #[serde(default = "default_pulse_width")]
  pub pulse_width: Duration,
}

fn default_active_high() -> bool {
  true
}

fn default_pulse_width() -> Duration {
  Duration::from_millis(500)
}

/// Convention for interpreting the reed switch's raw circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SwitchLogic {
  #[serde(rename = "NO")]
  NormallyOpen,
  #[serde(rename = "NC")]
  NormallyClosed,
}

impl SwitchLogic {
  /// Map a raw sensor level to the state it indicates.
  ///
  /// With a normally-open switch an open circuit (low with the switch
  /// unpressed) means the door is resting on it, i.e. closed.
  pub fn door_state(&self, level: bool) -> DoorState {
    match (self, level) {
      (SwitchLogic::NormallyOpen, false) => DoorState::Closed,
      (SwitchLogic::NormallyOpen, true) => DoorState::Open,
      (SwitchLogic::NormallyClosed, false) => DoorState::Open,
      (SwitchLogic::NormallyClosed, true) => DoorState::Closed,
    }
  }
}
