use std::collections::HashMap;

use serde::Deserialize;

use crate::{
  config::pin::BoardPin,
  door::{self, identifier::Identifier},
  error::ConfigError,
  mqtt_client::MqttClientConfig,
};

pub mod pin;

#[derive(Debug, Deserialize)]
pub struct Config {
  /// The MQTT configuration
  pub mqtt_client: MqttClientConfig,
  /// A list of all doors to control
  pub doors: HashMap<Identifier, door::DoorConfig>,
}

impl Config {
  /// Check the configuration is internally consistent.
  ///
  /// MQTT credentials must be given in full or not at all.
  ///
  /// Doors may not share pins or topics with each other, and a door's
  /// status pin may not double as one of its actuator pins. The one
  /// permitted collision is a door's own `open_pin == close_pin`
  /// (pulse-same-pin relay designs).
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.mqtt_client.username.is_some() != self.mqtt_client.password.is_some() {
      return Err(ConfigError::PartialCredentials);
    }

    // sorted so the first reported fault is deterministic
    let mut doors: Vec<(&Identifier, &door::DoorConfig)> = self.doors.iter().collect();
    doors.sort_by_key(|(identifier, _)| identifier.to_string());

    let mut claimed_pins: HashMap<BoardPin, Identifier> = HashMap::new();
    let mut claimed_topics: HashMap<&str, Identifier> = HashMap::new();

    for (identifier, door) in doors {
      for (topic, field) in [
        (&door.action_topic, "action_topic"),
        (&door.status_topic, "status_topic"),
      ] {
        if topic.is_empty() {
          return Err(ConfigError::EmptyTopic {
            door: identifier.clone(),
            field,
          });
        }
        if let Some(first) = claimed_topics.insert(topic, identifier.clone()) {
          return Err(ConfigError::DuplicateTopic {
            topic: topic.clone(),
            first,
            second: identifier.clone(),
          });
        }
      }

      if door.status_pin == door.open_pin || door.status_pin == door.close_pin {
        return Err(ConfigError::StatusPinConflict {
          door: identifier.clone(),
          pin: door.status_pin,
        });
      }

      let mut pins = vec![door.open_pin, door.status_pin];
      if door.close_pin != door.open_pin {
        pins.push(door.close_pin);
      }
      for pin in pins {
        if let Some(first) = claimed_pins.insert(pin, identifier.clone()) {
          return Err(ConfigError::DuplicatePin {
            pin,
            first,
            second: identifier.clone(),
          });
        }
      }
    }

    Ok(())
  }
}
