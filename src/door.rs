use std::{
  fmt,
  time::{Duration, Instant},
};

pub use config::DoorConfig;
pub use identifier::Identifier;
#[cfg(feature = "arm")]
use rppal::gpio::{Gpio, InputPin, OutputPin};

use self::{
  command::{Command, Decision},
  config::SwitchLogic,
  debounce::{Debouncer, Transition, SETTLE_SAMPLES},
  state::{DoorState, PulseIntent},
};
#[cfg(not(feature = "arm"))]
use crate::mock_gpio::{Gpio, InputPin, OutputPin};
use crate::error::BridgeResult;

pub mod command;
pub mod config;
pub mod debounce;
pub mod identifier;
pub mod state;

/// An in-flight relay actuation
#[derive(Debug)]
struct Pulse {
  intent: PulseIntent,
  deactivate_at: Instant,
}

/// The result of applying a command to a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
  /// The relay was fired
  Pulsed(PulseIntent),
  /// Idempotent no-op, the door is already in the commanded state
  AlreadyThere(DoorState),
  /// A pulse is in flight; the command is rejected, not queued
  Busy,
  /// STOP without travel-limit hardware
  Unsupported,
}

/// One physical garage door: its relay and sensor pins plus the runtime
/// state derived from them.
///
/// The relay is actuated with a fixed-width pulse whose deactivation is
/// scheduled rather than slept, so callers can keep sampling the sensor
/// while a pulse is in flight. Overlapping pulses are refused.
#[derive(Debug)]
pub struct Door {
  identifier: Identifier,
  alias: String,
  action_topic: String,
  status_topic: String,
  open_pin: OutputPin,
  /// `None` when the door uses one pin for both directions
  close_pin: Option<OutputPin>,
  status_pin: InputPin,
  active_high_relay: bool,
  switch_logic: SwitchLogic,
  supports_stop: bool,
  pulse_width: Duration,
  raw_sensor_level: Option<bool>,
  debouncer: Debouncer,
  last_transition: Option<Instant>,
  pulse: Option<Pulse>,
}

impl fmt::Display for Door {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Door ({})", self.alias)
  }
}

impl Door {
  pub fn with_config(identifier: Identifier, config: &DoorConfig) -> BridgeResult<Door> {
    let gpio = Gpio::new()?;
    let mut open_pin = gpio.get(config.open_pin.gpio_number())?.into_output();
    let mut close_pin = if config.close_pin == config.open_pin {
      None
    }
    else {
      Some(gpio.get(config.close_pin.gpio_number())?.into_output())
    };
    let status_pin = gpio.get(config.status_pin.gpio_number())?.into_input_pullup();

    // make sure no relay is energised before the first command
    drive(&mut open_pin, false, config.active_high_relay);
    if let Some(pin) = close_pin.as_mut() {
      drive(pin, false, config.active_high_relay);
    }

    Ok(Door {
      identifier,
      alias: config.alias.clone(),
      action_topic: config.action_topic.clone(),
      status_topic: config.status_topic.clone(),
      open_pin,
      close_pin,
      status_pin,
      active_high_relay: config.active_high_relay,
      switch_logic: config.status_switch_logic,
      supports_stop: config.supports_stop,
      pulse_width: config.pulse_width,
      raw_sensor_level: None,
      debouncer: Debouncer::new(SETTLE_SAMPLES),
      last_transition: None,
      pulse: None,
    })
  }

  pub fn identifier(&self) -> &Identifier {
    &self.identifier
  }

  pub fn action_topic(&self) -> &str {
    &self.action_topic
  }

  pub fn status_topic(&self) -> &str {
    &self.status_topic
  }

  /// The last confirmed state
  pub fn state(&self) -> DoorState {
    self.debouncer.state()
  }

  pub fn pending_pulse(&self) -> bool {
    self.pulse.is_some()
  }

  /// The raw level from the last sample, `None` when unreadable
  pub fn raw_sensor_level(&self) -> Option<bool> {
    self.raw_sensor_level
  }

  /// When the last confirmed transition happened
  pub fn last_transition(&self) -> Option<Instant> {
    self.last_transition
  }

  /// Apply a command, firing the relay if the interpreter decides the
  /// door should move. Never blocks; the pulse ends via
  /// [`service_pulse`](Self::service_pulse).
  pub fn handle_command(&mut self, command: Command, now: Instant) -> CommandOutcome {
    if self.pulse.is_some() {
      return CommandOutcome::Busy;
    }

    match command.decide(self.state(), self.supports_stop) {
      Decision::Pulse(intent) => {
        self.trigger_pulse(intent, now);
        CommandOutcome::Pulsed(intent)
      }
      Decision::AlreadyThere => CommandOutcome::AlreadyThere(self.state()),
      Decision::Unsupported => CommandOutcome::Unsupported,
    }
  }

  fn trigger_pulse(&mut self, intent: PulseIntent, now: Instant) {
    let pin = match intent {
      PulseIntent::Closing => match self.close_pin.as_mut() {
        Some(pin) => pin,
        None => &mut self.open_pin,
      },
      PulseIntent::Opening | PulseIntent::Cycling => &mut self.open_pin,
    };
    drive(pin, true, self.active_high_relay);

    self.pulse = Some(Pulse {
      intent,
      deactivate_at: now + self.pulse_width,
    });
  }

  /// De-energise the relay once the scheduled deactivation falls due.
  ///
  /// Returns the intent of the pulse that just finished, if one did.
  /// The pulse always clears on schedule, even if ticks were delayed,
  /// so a stalled loop recovers on its next pass.
  pub fn service_pulse(&mut self, now: Instant) -> Option<PulseIntent> {
    let pulse = self.pulse.as_ref()?;
    if now < pulse.deactivate_at {
      return None;
    }

    let intent = pulse.intent;
    drive(&mut self.open_pin, false, self.active_high_relay);
    if let Some(pin) = self.close_pin.as_mut() {
      drive(pin, false, self.active_high_relay);
    }
    self.pulse = None;
    Some(intent)
  }

  /// Take one sensor sample and advance the debouncer with it.
  ///
  /// Returns the transition if this sample confirmed one.
  pub fn sample(&mut self, now: Instant) -> Option<Transition> {
    let raw = self.read_sensor();
    self.raw_sensor_level = raw;

    let reading = raw.map(|level| self.switch_logic.door_state(level));
    let transition = self.debouncer.sample(reading);
    if transition.is_some() {
      self.last_transition = Some(now);
    }
    transition
  }

  #[cfg(feature = "arm")]
  fn read_sensor(&self) -> Option<bool> {
    Some(self.status_pin.is_high())
  }

  #[cfg(not(feature = "arm"))]
  fn read_sensor(&self) -> Option<bool> {
    self.status_pin.level()
  }
}

fn drive(pin: &mut OutputPin, energised: bool, active_high: bool) {
  if energised == active_high {
    pin.set_high();
  }
  else {
    pin.set_low();
  }
}
