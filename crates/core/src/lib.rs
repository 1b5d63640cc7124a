#![doc = include_str!("../README.md")]

pub mod config;
pub mod dns;
pub mod error;
pub mod ip;
pub mod record;
pub mod translate;
pub mod writer;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    ConfigError, MirrorError, QueueError, RecordError, RotationError, WriteError, ZeekspoolError,
};

// 설정
pub use config::{Config, ElasticConfig, RedisConfig, TlsRuntime, ZeekConfig};

// 레코드
pub use record::{EcsMetadata, EcsRecord, NumericString};

// v8 변환
pub use translate::{parse_dns_answers, translate_v8_record, EcsRecordV8};

// Writer trait
pub use writer::{DynEcsWriter, EcsWriter, JsonWriter};
