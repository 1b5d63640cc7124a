//! 수집 크레이트 에러 타입
//!
//! `From<IngestError> for ZeekspoolError` 변환은 스킵 가능한 디코딩
//! 에러와 루프를 종료시키는 큐 에러의 구분을 보존합니다.

use zeekspool_core::error::{MirrorError, QueueError, RecordError, ZeekspoolError};

/// 수집 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Redis 연결 실패
    #[error("redis connection failed: {reason}")]
    Connection { reason: String },

    /// 미러 HTTP/TLS 클라이언트 구성 실패 (기동 시 치명적)
    #[error("could not build mirror client: {reason}")]
    Client { reason: String },

    /// blocking pop 실패 (루프 종료)
    #[error("redis pop failed: {reason}")]
    Pop { reason: String },

    /// JSON 디코딩 실패 (해당 메시지 스킵)
    #[error("could not decode ECS payload: {reason}")]
    Decode { reason: String },

    /// v8 변환 실패 (해당 메시지 스킵)
    #[error("{0}")]
    Record(#[from] RecordError),

    /// 미러 HTTP 요청 실패
    #[error("mirror request to '{index}' failed: {reason}")]
    MirrorRequest { index: String, reason: String },

    /// 미러가 2xx 이외의 상태를 반환
    #[error("mirror index '{index}' returned HTTP {status}")]
    MirrorStatus { index: String, status: u16 },
}

impl From<IngestError> for ZeekspoolError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Connection { reason } => {
                ZeekspoolError::Queue(QueueError::Connection { reason })
            }
            IngestError::Client { reason } => {
                ZeekspoolError::Config(zeekspool_core::error::ConfigError::InvalidValue {
                    field: "Elasticsearch.TLS".to_owned(),
                    reason,
                })
            }
            IngestError::Pop { reason } => ZeekspoolError::Queue(QueueError::Pop { reason }),
            IngestError::Decode { reason } => {
                ZeekspoolError::Record(RecordError::MalformedJson { reason })
            }
            IngestError::Record(inner) => ZeekspoolError::Record(inner),
            IngestError::MirrorRequest { index, reason } => {
                ZeekspoolError::Mirror(MirrorError::Request { index, reason })
            }
            IngestError::MirrorStatus { index, status } => {
                ZeekspoolError::Mirror(MirrorError::Status { index, status })
            }
        }
    }
}
