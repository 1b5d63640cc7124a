//! 출력 크레이트 에러 타입
//!
//! [`OutputError`]는 TSV 포매팅과 스풀/아카이브 I/O에서 발생하는 에러를
//! 표현합니다. `From<OutputError> for ZeekspoolError` 변환은 스킵 가능한
//! 레코드 에러와 치명적인 쓰기/회전 에러의 구분을 보존합니다.

use zeekspool_core::error::{RecordError, RotationError, WriteError, ZeekspoolError};

/// 출력 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// 잘못된 ECS 레코드 (해당 배치 중단, 호출자는 스킵 가능)
    #[error("{0}")]
    Malformed(#[from] RecordError),

    /// 스풀 파일 I/O 실패
    #[error("spool error: {path}: {reason}")]
    Spool { path: String, reason: String },

    /// 아카이브 생성 실패
    #[error("archive error: {path}: {reason}")]
    Archive { path: String, reason: String },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OutputError> for ZeekspoolError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Malformed(inner) => ZeekspoolError::Record(inner),
            OutputError::Spool { path, reason } => {
                ZeekspoolError::Write(WriteError::Spool { path, reason })
            }
            OutputError::Archive { path, reason } => {
                ZeekspoolError::Rotation(RotationError::Archive { path, reason })
            }
            OutputError::Io(inner) => ZeekspoolError::Io(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_converts_to_skippable() {
        let err = OutputError::Malformed(RecordError::MalformedTimestamp {
            value: "nope".to_owned(),
        });
        let converted: ZeekspoolError = err.into();
        assert!(converted.is_skippable());
    }

    #[test]
    fn spool_converts_to_fatal_write() {
        let err = OutputError::Spool {
            path: "/tmp/conn.log".to_owned(),
            reason: "broken pipe".to_owned(),
        };
        let converted: ZeekspoolError = err.into();
        assert!(matches!(converted, ZeekspoolError::Write(_)));
        assert!(!converted.is_skippable());
    }

    #[test]
    fn archive_converts_to_rotation() {
        let err = OutputError::Archive {
            path: "/tmp/conn.log.gz".to_owned(),
            reason: "no space".to_owned(),
        };
        let converted: ZeekspoolError = err.into();
        assert!(matches!(converted, ZeekspoolError::Rotation(_)));
    }
}
