use std::time::{Duration, Instant};

use rumqttc::QoS;
use tokio::{
  sync::mpsc::error::TryRecvError,
  time::{self, MissedTickBehavior},
};

use crate::{
  door::{command::Command, state::DoorState, CommandOutcome, Door},
  error::{BridgeError, BridgeResult},
  mqtt_client::{BridgeEvent, EventReceiver, MqttPublish, PublishSender},
};

/// Period of the cooperative control tick
pub const TICK_PERIOD: Duration = Duration::from_millis(50);

/// Owns every door and runs the control loop.
///
/// Each tick services at most one inbound event, then advances every
/// door: expired pulses are released, the sensor is sampled, and any
/// confirmed transition is published. Doors never block each other and
/// nothing in a tick sleeps.
pub struct Controller {
  doors: Vec<Door>,
  events: EventReceiver,
  mqtt_tx: PublishSender,
}

impl Controller {
  pub fn new(doors: Vec<Door>, events: EventReceiver, mqtt_tx: PublishSender) -> Controller {
    Controller {
      doors,
      events,
      mqtt_tx,
    }
  }

  pub fn doors(&self) -> &[Door] {
    &self.doors
  }

  /// Tick forever at [`TICK_PERIOD`].
  ///
  /// Only returns when the MQTT side of either channel has gone away.
  pub async fn run(mut self) -> BridgeResult<()> {
    log::info!("controller running with {} door(s)", self.doors.len());
    let mut ticker = time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
      ticker.tick().await;
      self.tick(Instant::now())?;
    }
  }

  /// One pass of the control loop.
  pub fn tick(&mut self, now: Instant) -> BridgeResult<()> {
    // at most one inbound event per tick, preserving arrival order
    match self.events.try_recv() {
      Ok(BridgeEvent::Message { topic, payload }) => self.route_message(&topic, &payload, now),
      Ok(BridgeEvent::Reconnected) => self.republish_all()?,
      Err(TryRecvError::Empty) => {}
      Err(TryRecvError::Disconnected) => return Err(BridgeError::MqttClosed),
    }

    for door in &mut self.doors {
      if let Some(intent) = door.service_pulse(now) {
        log::debug!("{} finished {} pulse", door, intent);
      }

      if let Some(transition) = door.sample(now) {
        log::info!("{} is now {} (was {})", door, transition.current, transition.previous);
        send_state(&self.mqtt_tx, door.status_topic(), transition.current)?;
      }
    }

    Ok(())
  }

  /// Hand an inbound message to the door whose action topic matches.
  ///
  /// Messages for topics no door listens on belong to someone else and
  /// are dropped silently. Rejections (busy, invalid, unsupported) are
  /// logged and otherwise absorbed.
  fn route_message(&mut self, topic: &str, payload: &str, now: Instant) {
    let Some(door) = self
      .doors
      .iter_mut()
      .find(|door| door.action_topic() == topic)
    else {
      return;
    };

    let Ok(command) = payload.parse::<Command>()
    else {
      log::warn!("{} rejected invalid command {:?}", door, payload);
      return;
    };

    match door.handle_command(command, now) {
      CommandOutcome::Pulsed(intent) => log::info!("{} {} (pulse started)", door, intent),
      CommandOutcome::AlreadyThere(state) => {
        log::debug!("{} already {}, ignoring {:?}", door, state, payload)
      }
      CommandOutcome::Busy => log::warn!("{} is busy, rejecting {:?}", door, payload),
      CommandOutcome::Unsupported => log::warn!("{} does not support {:?}", door, payload),
    }
  }

  /// Republish the debounced state of every door, without waiting for
  /// a new transition. Used when the broker (re)connects.
  fn republish_all(&self) -> BridgeResult<()> {
    for door in &self.doors {
      send_state(&self.mqtt_tx, door.status_topic(), door.state())?;
    }
    Ok(())
  }
}

fn send_state(mqtt_tx: &PublishSender, topic: &str, state: DoorState) -> BridgeResult<()> {
  mqtt_tx
    .send(MqttPublish {
      topic: topic.to_string(),
      qos: QoS::AtLeastOnce,
      retain: true,
      payload: state.to_string(),
    })
    .map_err(|_| BridgeError::MqttClosed)
}

#[cfg(test)]
mod tests {
  use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

  use super::*;
  use crate::{
    config::pin::BoardPin,
    door::{config::SwitchLogic, DoorConfig, Identifier},
    mock_gpio,
  };

  const DOOR1_OPEN_GPIO: u8 = 4; // D2
  const DOOR1_STATUS_GPIO: u8 = 14; // D5
  const DOOR2_OPEN_GPIO: u8 = 5; // D1
  const DOOR2_STATUS_GPIO: u8 = 12; // D6

  fn door_config(index: usize) -> DoorConfig {
    let (open_pin, status_pin) = match index {
      1 => (BoardPin::D2, BoardPin::D5),
      _ => (BoardPin::D1, BoardPin::D6),
    };
    DoorConfig {
      alias: format!("Door {index}"),
      action_topic: format!("garage/door-{index}/action"),
      status_topic: format!("garage/door-{index}/status"),
      open_pin,
      close_pin: open_pin,
      status_pin,
      active_high_relay: true,
      status_switch_logic: SwitchLogic::NormallyOpen,
      supports_stop: false,
      pulse_width: Duration::from_millis(500),
    }
  }

  struct Harness {
    controller: Controller,
    event_tx: UnboundedSender<BridgeEvent>,
    publish_rx: UnboundedReceiver<MqttPublish>,
    now: Instant,
  }

  impl Harness {
    fn new(configs: &[DoorConfig]) -> Harness {
      let doors = configs
        .iter()
        .enumerate()
        .map(|(index, config)| {
          Door::with_config(Identifier::from(format!("door-{}", index + 1)), config).unwrap()
        })
        .collect();

      let (event_tx, event_rx) = mpsc::unbounded_channel();
      let (publish_tx, publish_rx) = mpsc::unbounded_channel();

      Harness {
        controller: Controller::new(doors, event_rx, publish_tx),
        event_tx,
        publish_rx,
        now: Instant::now(),
      }
    }

    fn send(&self, topic: &str, payload: &str) {
      self
        .event_tx
        .send(BridgeEvent::Message {
          topic: topic.to_string(),
          payload: payload.to_string(),
        })
        .unwrap();
    }

    fn tick(&mut self) {
      self.now += TICK_PERIOD;
      self.controller.tick(self.now).unwrap();
    }

    fn ticks(&mut self, count: usize) {
      for _ in 0..count {
        self.tick();
      }
    }

    fn published(&mut self) -> Vec<(String, String)> {
      let mut published = Vec::new();
      while let Ok(publish) = self.publish_rx.try_recv() {
        assert!(publish.retain);
        published.push((publish.topic, publish.payload));
      }
      published
    }
  }

  #[test]
  fn publishes_exactly_once_per_confirmed_transition() {
    let mut harness = Harness::new(&[door_config(1)]);
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(true));

    harness.ticks(2);
    assert_eq!(harness.published(), vec![]);

    harness.tick();
    assert_eq!(
      harness.published(),
      vec![("garage/door-1/status".to_string(), "open".to_string())]
    );

    // a stable sensor produces no further publishes
    harness.ticks(20);
    assert_eq!(harness.published(), vec![]);
  }

  #[test]
  fn sub_threshold_noise_publishes_nothing() {
    let mut harness = Harness::new(&[door_config(1)]);
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(true));
    harness.ticks(3);
    harness.published();

    // two-sample blips, never three in a row
    for _ in 0..5 {
      mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(false));
      harness.ticks(2);
      mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(true));
      harness.ticks(2);
    }

    assert_eq!(harness.published(), vec![]);
    assert_eq!(harness.controller.doors()[0].state(), DoorState::Open);
  }

  #[test]
  fn close_then_open_round_trip_publishes_closed_then_open() {
    let mut harness = Harness::new(&[door_config(1)]);
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(true));
    harness.ticks(3);
    assert_eq!(harness.controller.doors()[0].state(), DoorState::Open);
    harness.published();

    harness.send("garage/door-1/action", "CLOSE");
    harness.tick();
    assert!(harness.controller.doors()[0].pending_pulse());

    // the door starts moving and lands on the closed switch
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(false));
    harness.ticks(12); // > pulse width, pulse also clears along the way
    assert!(!harness.controller.doors()[0].pending_pulse());
    assert_eq!(harness.controller.doors()[0].state(), DoorState::Closed);

    harness.send("garage/door-1/action", "OPEN");
    harness.tick();
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(true));
    harness.ticks(12);
    assert_eq!(harness.controller.doors()[0].state(), DoorState::Open);

    assert_eq!(
      harness.published(),
      vec![
        ("garage/door-1/status".to_string(), "closed".to_string()),
        ("garage/door-1/status".to_string(), "open".to_string()),
      ]
    );
  }

  #[test]
  fn messages_for_unknown_topics_are_ignored() {
    let mut harness = Harness::new(&[door_config(1)]);

    harness.send("some/other/topic", "OPEN");
    harness.tick();

    assert!(!harness.controller.doors()[0].pending_pulse());
    assert_eq!(harness.published(), vec![]);
  }

  #[test]
  fn invalid_payloads_on_a_door_topic_have_no_side_effect() {
    let mut harness = Harness::new(&[door_config(1)]);

    harness.send("garage/door-1/action", "open");
    harness.tick();
    harness.send("garage/door-1/action", "JUMP");
    harness.tick();

    assert!(!harness.controller.doors()[0].pending_pulse());
    assert_eq!(harness.controller.doors()[0].state(), DoorState::Unknown);
    assert_eq!(harness.published(), vec![]);
  }

  #[test]
  fn services_one_command_per_tick_and_doors_stay_independent() {
    let mut harness = Harness::new(&[door_config(1), door_config(2)]);

    harness.send("garage/door-1/action", "TOGGLE");
    harness.send("garage/door-2/action", "TOGGLE");

    harness.tick();
    assert!(harness.controller.doors()[0].pending_pulse());
    assert!(!harness.controller.doors()[1].pending_pulse());

    harness.tick();
    assert!(harness.controller.doors()[1].pending_pulse());

    assert_eq!(mock_gpio::level(DOOR1_OPEN_GPIO), Some(true));
    assert_eq!(mock_gpio::level(DOOR2_OPEN_GPIO), Some(true));
  }

  #[test]
  fn rapid_repeat_commands_cause_a_single_actuation() {
    let mut harness = Harness::new(&[door_config(1)]);

    harness.send("garage/door-1/action", "OPEN");
    harness.send("garage/door-1/action", "OPEN");
    harness.tick();
    harness.tick(); // second command serviced here and rejected as busy

    assert!(harness.controller.doors()[0].pending_pulse());
    // the pulse ends exactly one width after the first command
    harness.ticks(9);
    assert!(!harness.controller.doors()[0].pending_pulse());
    assert_eq!(mock_gpio::level(DOOR1_OPEN_GPIO), Some(false));
  }

  #[test]
  fn reconnect_republishes_every_door_state() {
    let mut harness = Harness::new(&[door_config(1), door_config(2)]);
    mock_gpio::set_level(DOOR1_STATUS_GPIO, Some(false));
    mock_gpio::set_level(DOOR2_STATUS_GPIO, Some(true));
    harness.ticks(3);
    harness.published();

    harness.event_tx.send(BridgeEvent::Reconnected).unwrap();
    harness.tick();

    assert_eq!(
      harness.published(),
      vec![
        ("garage/door-1/status".to_string(), "closed".to_string()),
        ("garage/door-2/status".to_string(), "open".to_string()),
      ]
    );
  }

  #[test]
  fn a_disconnected_event_channel_ends_the_run() {
    let mut harness = Harness::new(&[door_config(1)]);
    drop(harness.event_tx);

    assert!(matches!(
      harness.controller.tick(harness.now),
      Err(BridgeError::MqttClosed)
    ));
  }
}
