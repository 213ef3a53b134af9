use std::time::Duration;

use rumqttc::{AsyncClient, LastWill, MqttOptions, QoS};
use serde::Deserialize;
use tokio::sync::mpsc;

pub use self::{
  receiver::{EventReceiver, MqttReceiver},
  sender::{MqttSender, PublishSender},
};

pub mod receiver;
pub mod sender;

#[derive(Debug, Clone, Deserialize)]
pub struct MqttClientConfig {
  /// The broker to connect to
  pub broker_host: String,

  #[serde(default = "default_broker_port")]
  pub broker_port: u16,

  #[serde(default = "default_client_id")]
  pub client_id: String,

  pub username: Option<String>,
  pub password: Option<String>,

  /// The topic availability is announced on (retained, with an
  /// offline last-will)
  pub availability_topic: String,

  #[serde(default = "default_online_payload")]
  pub online_payload: String,

  #[serde(default = "default_offline_payload")]
  pub offline_payload: String,
}

fn default_broker_port() -> u16 {
  1883
}

fn default_client_id() -> String {
  "mqtt-door-bridge".to_string()
}

fn default_online_payload() -> String {
  "online".to_string()
}

fn default_offline_payload() -> String {
  "offline".to_string()
}

/// An outbound MQTT message.
#[derive(Debug, Clone)]
pub struct MqttPublish {
  pub topic: String,
  pub qos: QoS,
  pub retain: bool,
  pub payload: String,
}

/// Inbound events delivered to the door controller.
#[derive(Debug)]
pub enum BridgeEvent {
  /// A message arrived on a subscribed topic
  Message { topic: String, payload: String },
  /// The broker (re)connected; retained door states should be
  /// republished
  Reconnected,
}

pub struct MqttClient {
  pub sender: MqttSender,
  pub receiver: MqttReceiver,
}

impl MqttClient {
  /// Build the MQTT client along with the channel endpoints the door
  /// controller talks to it over: a sender for outbound publishes and
  /// a receiver for inbound [`BridgeEvent`]s.
  pub fn with_config(
    config: MqttClientConfig,
    subscriptions: Vec<String>,
  ) -> (PublishSender, EventReceiver, MqttClient) {
    let mut options = MqttOptions::new(
      config.client_id.clone(),
      config.broker_host.clone(),
      config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(15));
    options.set_last_will(LastWill::new(
      config.availability_topic.clone(),
      config.offline_payload.clone(),
      QoS::AtLeastOnce,
      true,
    ));
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
      options.set_credentials(username, password);
    }

    let (client, event_loop) = AsyncClient::new(options, 10);
    let (publish_tx, publish_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mqtt_client = MqttClient {
      sender: MqttSender::new(client.clone(), publish_rx),
      receiver: MqttReceiver::new(client, event_loop, subscriptions, config, event_tx),
    };

    (publish_tx, event_rx, mqtt_client)
  }
}
