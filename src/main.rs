#![warn(rust_2018_idioms)]

use std::{env, fs, process, time::Duration};

use log::LevelFilter;
use mqtt_door_bridge::{
  config::Config,
  controller::Controller,
  door::Door,
  error::BridgeError,
  mqtt_client::MqttClient,
};
use simple_logger::SimpleLogger;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
  SimpleLogger::new()
    .with_module_level("rumqttc", LevelFilter::Warn)
    .init()
    .unwrap();

  let path = env::args()
    .nth(1)
    .unwrap_or_else(|| "door-bridge.toml".to_string());
  let config = load_config(&path);

  loop {
    let err = run(&config).await;
    log::error!("Error occurred, restarting in 5 seconds: {:?}", err);
    // wait some time for the broker to come back online
    sleep(Duration::from_secs(5)).await;
  }
}

/// Read, parse and validate the configuration.
///
/// Any fault here is fatal; the control loop is never entered with a
/// bad configuration.
fn load_config(path: &str) -> Config {
  let raw = fs::read_to_string(path).unwrap_or_else(|err| {
    log::error!("unable to read {}: {}", path, err);
    process::exit(1);
  });
  let config: Config = toml::from_str(&raw).unwrap_or_else(|err| {
    log::error!("unable to parse {}: {}", path, err);
    process::exit(1);
  });
  if let Err(err) = config.validate() {
    log::error!("invalid configuration in {}: {}", path, err);
    process::exit(1);
  }
  config
}

/// Run the MQTT receiver and sender and the door controller.
/// Runs forever unless an error occurs
async fn run(config: &Config) -> BridgeError {
  let mut doors = Vec::with_capacity(config.doors.len());
  for (identifier, door_config) in &config.doors {
    match Door::with_config(identifier.clone(), door_config) {
      Ok(door) => doors.push(door),
      Err(err) => return err,
    }
  }

  let subscriptions = doors
    .iter()
    .map(|door| door.action_topic().to_string())
    .collect();
  let (mqtt_tx, events, client) = MqttClient::with_config(config.mqtt_client.clone(), subscriptions);
  let controller = Controller::new(doors, events, mqtt_tx);

  let MqttClient {
    mut sender,
    mut receiver,
  } = client;
  let mut receive = tokio::spawn(async move { receiver.receive_messages().await });
  let mut send = tokio::spawn(async move { sender.send_messages().await });
  let mut control = tokio::spawn(controller.run());

  // the tasks only end if an error occurs (most likely MQTT broker disconnection)
  let result = tokio::select! {
    result = &mut receive => result,
    result = &mut send => result,
    result = &mut control => result,
  };
  receive.abort();
  send.abort();
  control.abort();

  match result {
    Ok(Ok(())) => BridgeError::MqttClosed,
    Ok(Err(err)) => err,
    Err(err) => err.into(),
  }
}
