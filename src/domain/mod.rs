// Domain layer - Sensor data models and pure value types
pub mod animation;
pub mod channel;
pub mod quality;
pub mod reading;
pub mod rolling_buffer;
