// Audio module - microphone capture and lock-free power hand-off

pub mod power_ring;

#[cfg(not(target_os = "android"))]
pub mod input_cpal;

// Re-export commonly used types for convenience
pub use power_ring::{power_ring, BlockPower, PowerConsumer, PowerProducer, DEFAULT_RING_CAPACITY};

#[cfg(not(target_os = "android"))]
pub use input_cpal::InputStream;
