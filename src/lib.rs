pub mod config;
pub mod controller;
pub mod door;
pub mod error;
#[cfg(not(feature = "arm"))]
pub mod mock_gpio;
pub mod mqtt_client;
