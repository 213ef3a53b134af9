use rumqttc::AsyncClient;
use tokio::sync::mpsc;

use super::MqttPublish;
use crate::error::BridgeResult;

pub type PublishSender = mpsc::UnboundedSender<MqttPublish>;
pub type PublishReceiver = mpsc::UnboundedReceiver<MqttPublish>;

pub struct MqttSender {
  client: AsyncClient,
  /// The channel with which messages to send to MQTT are received on
  send_channel: PublishReceiver,
}

impl MqttSender {
  pub(super) fn new(client: AsyncClient, send_channel: PublishReceiver) -> MqttSender {
    MqttSender { client, send_channel }
  }

  /// Drain the outbound channel into the broker.
  ///
  /// Returns `Ok` once every sender has hung up.
  pub async fn send_messages(&mut self) -> BridgeResult<()> {
    loop {
      if let Some(publish) = self.send_channel.recv().await {
        self
          .client
          .publish(publish.topic, publish.qos, publish.retain, publish.payload)
          .await?;
      }
      else {
        return Ok(());
      }
    }
  }
}
