#![doc = include_str!("../README.md")]

pub mod consumer;
pub mod decode;
pub mod elastic;
pub mod error;

// --- 주요 타입 re-export ---

pub use consumer::{RedisConsumer, QUEUE_KEY};
pub use decode::{decode_record, sniff_metadata};
pub use elastic::ElasticWriter;
pub use error::IngestError;
