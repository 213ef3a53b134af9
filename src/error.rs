use thiserror::Error;
use tokio::task::JoinError;

use crate::{config::pin::BoardPin, door::identifier::Identifier};

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
  #[error(transparent)]
  #[cfg(feature = "arm")]
  Gpio(#[from] rppal::gpio::Error),
  #[cfg(not(feature = "arm"))]
  #[error(transparent)]
  Gpio(#[from] crate::mock_gpio::Error),
  #[error(transparent)]
  MqttClient(#[from] rumqttc::ClientError),
  #[error(transparent)]
  MqttConnection(#[from] rumqttc::ConnectionError),
  #[error("the MQTT client has been closed")]
  MqttClosed,
  #[error(transparent)]
  JoinError(#[from] JoinError),
}

/// Startup-time configuration faults. All of these abort the process
/// before the control loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("MQTT credentials need both a username and a password")]
  PartialCredentials,
  #[error("door {door} has an empty {field}")]
  EmptyTopic { door: Identifier, field: &'static str },
  #[error("{pin:?} is assigned to both {first} and {second}")]
  DuplicatePin {
    pin: BoardPin,
    first: Identifier,
    second: Identifier,
  },
  #[error("door {door} uses {pin:?} as both an actuator and status pin")]
  StatusPinConflict { door: Identifier, pin: BoardPin },
  #[error("topic {topic:?} is used by both {first} and {second}")]
  DuplicateTopic {
    topic: String,
    first: Identifier,
    second: Identifier,
  },
}
