use serde::Deserialize;

/// Mapping of NodeMCU-style pin labels to the ESP8266 GPIO they expose
/// See: https://randomnerdtutorials.com/esp8266-pinout-reference-gpios/
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardPin {
  D0,
  D1,
  D2,
  D3,
  D4,
  D5,
  D6,
  D7,
  D8,
}

impl BoardPin {
  /// Get the GPIO number for this board pin
  pub fn gpio_number(&self) -> u8 {
    use BoardPin::*;

    match self {
      D0 => 16,
      D1 => 5,
      D2 => 4,
      D3 => 0,
      D4 => 2,
      D5 => 14,
      D6 => 12,
      D7 => 13,
      D8 => 15,
    }
  }
}
