//! Mimics rppal's API without the need to compile for ARM and use
//! physical hardware.
//!
//! Pin levels live in a thread-local registry so tests can drive sensor
//! inputs and observe relay outputs without cross-test interference.
//! A level of `None` models a floating pin (nothing wired).

pub use std::fmt::Error;
use std::{cell::RefCell, collections::HashMap};

thread_local! {
  static LEVELS: RefCell<HashMap<u8, Option<bool>>> = RefCell::new(HashMap::new());
}

/// Set the level a pin currently carries (`None` = floating)
pub fn set_level(pin: u8, level: Option<bool>) {
  LEVELS.with(|levels| levels.borrow_mut().insert(pin, level));
}

/// The level a pin currently carries, whether driven or set
pub fn level(pin: u8) -> Option<bool> {
  LEVELS.with(|levels| levels.borrow().get(&pin).copied().flatten())
}

pub struct Gpio;

impl Gpio {
  pub fn new() -> Result<Gpio, Error> {
    Ok(Gpio)
  }

  pub fn get(&self, pin: u8) -> Result<Pin, Error> {
    Ok(Pin(pin))
  }
}

#[derive(Debug)]
pub struct Pin(u8);

impl Pin {
  pub fn into_output(self) -> OutputPin {
    OutputPin(self.0)
  }

  pub fn into_input_pullup(self) -> InputPin {
    InputPin(self.0)
  }
}

#[derive(Debug)]
pub struct OutputPin(u8);

impl OutputPin {
  pub fn set_high(&mut self) {
    set_level(self.0, Some(true));
  }

  pub fn set_low(&mut self) {
    set_level(self.0, Some(false));
  }
}

#[derive(Debug)]
pub struct InputPin(u8);

impl InputPin {
  pub fn is_high(&self) -> bool {
    self.level() == Some(true)
  }

  /// The raw level on the pin, `None` when floating
  pub fn level(&self) -> Option<bool> {
    level(self.0)
  }
}
