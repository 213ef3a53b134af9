use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;

use super::{BridgeEvent, MqttClientConfig};
use crate::error::{BridgeError, BridgeResult};

pub type EventReceiver = mpsc::UnboundedReceiver<BridgeEvent>;

pub struct MqttReceiver {
  client: AsyncClient,
  event_loop: EventLoop,
  /// The action topics of every configured door
  subscriptions: Vec<String>,
  config: MqttClientConfig,
  event_tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl MqttReceiver {
  pub(super) fn new(
    client: AsyncClient,
    event_loop: EventLoop,
    subscriptions: Vec<String>,
    config: MqttClientConfig,
    event_tx: mpsc::UnboundedSender<BridgeEvent>,
  ) -> MqttReceiver {
    MqttReceiver {
      client,
      event_loop,
      subscriptions,
      config,
      event_tx,
    }
  }

  /// Drive the MQTT connection, forwarding messages on subscribed
  /// topics to the controller.
  ///
  /// On every (re)connect the subscriptions are renewed, availability
  /// is announced and the controller is told to republish door states.
  /// Only returns on a connection error or when the controller is gone.
  pub async fn receive_messages(&mut self) -> BridgeResult<()> {
    loop {
      match self.event_loop.poll().await? {
        Event::Incoming(Packet::ConnAck(_)) => {
          log::info!("connected to MQTT broker at {}", self.config.broker_host);
          for topic in &self.subscriptions {
            self.client.subscribe(topic, QoS::AtLeastOnce).await?;
          }
          self
            .client
            .publish(
              &self.config.availability_topic,
              QoS::AtLeastOnce,
              true,
              self.config.online_payload.clone(),
            )
            .await?;
          self
            .event_tx
            .send(BridgeEvent::Reconnected)
            .map_err(|_| BridgeError::MqttClosed)?;
        }

        Event::Incoming(Packet::Publish(publish)) => {
          match String::from_utf8(publish.payload.to_vec()) {
            Ok(payload) => self
              .event_tx
              .send(BridgeEvent::Message {
                topic: publish.topic,
                payload,
              })
              .map_err(|_| BridgeError::MqttClosed)?,
            Err(_) => log::warn!("ignoring non-UTF-8 payload on {}", publish.topic),
          }
        }

        _ => {}
      }
    }
  }
}
