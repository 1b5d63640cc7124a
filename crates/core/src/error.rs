//! 에러 타입 — 도메인별 에러 정의
//!
//! [`ZeekspoolError`]는 시스템 전체의 최상위 에러 타입입니다.
//! 설정 에러는 기동 시 치명적이고, 레코드 에러는 해당 레코드만 건너뛰고
//! 계속 진행하며, 쓰기/회전 에러는 프로세스를 내리는 치명적 에러입니다.

/// Zeekspool 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ZeekspoolError {
    /// 설정 관련 에러 (기동 시 치명적)
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 잘못된 ECS 레코드 (해당 레코드 스킵 후 계속)
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// 큐 통신 에러 (소비 루프 종료)
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// Elasticsearch 미러 에러 (스풀 경로에 영향 없음)
    #[error("mirror error: {0}")]
    Mirror(#[from] MirrorError),

    /// 스풀 쓰기 에러 (치명적 — 디스크 또는 불변식 위반)
    #[error("write error: {0}")]
    Write(#[from] WriteError),

    /// 로그 회전 에러 (치명적 — 스케줄러 정지 및 crash 콜백)
    #[error("rotation error: {0}")]
    Rotation(#[from] RotationError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZeekspoolError {
    /// 해당 레코드만 건너뛰면 되는 에러인지 확인합니다.
    ///
    /// 소비 루프는 이 값이 `true`이면 레코드를 스킵하고 계속 진행하며,
    /// `false`이면 루프를 종료합니다.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 잘못된 ECS 레코드 에러
///
/// 파싱 가능한 스킵 대상 에러와 치명적인 쓰기 에러를 구분하기 위한
/// sentinel 역할을 합니다.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// RFC3339Nano 타임스탬프 파싱 실패
    #[error("malformed ECS record: invalid RFC3339 timestamp '{value}'")]
    MalformedTimestamp { value: String },

    /// 이벤트 코드 파싱 실패 (v8 변환 중)
    #[error("malformed ECS record: unparseable event code '{value}'")]
    MalformedEventCode { value: String },

    /// JSON 디코딩 실패
    #[error("malformed ECS record: {reason}")]
    MalformedJson { reason: String },
}

/// 큐 통신 에러
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Redis 연결 실패
    #[error("connection failed: {reason}")]
    Connection { reason: String },

    /// blocking pop 실패
    #[error("pop failed: {reason}")]
    Pop { reason: String },
}

/// Elasticsearch 미러 에러
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// HTTP 요청 전송 실패
    #[error("request to index '{index}' failed: {reason}")]
    Request { index: String, reason: String },

    /// 2xx 이외의 HTTP 응답
    #[error("index '{index}' returned HTTP {status}")]
    Status { index: String, status: u16 },
}

/// 스풀 쓰기 에러
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// 스풀 파일 쓰기 실패
    #[error("spool write failed: {path}: {reason}")]
    Spool { path: String, reason: String },
}

/// 로그 회전 에러
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    /// 아카이브 생성 실패
    #[error("archive failed: {path}: {reason}")]
    Archive { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_are_skippable() {
        let err: ZeekspoolError = RecordError::MalformedTimestamp {
            value: "not-a-date".to_owned(),
        }
        .into();
        assert!(err.is_skippable());
    }

    #[test]
    fn write_errors_are_fatal() {
        let err: ZeekspoolError = WriteError::Spool {
            path: "/opt/zeek/logs/ecs-spool/conn.log".to_owned(),
            reason: "disk full".to_owned(),
        }
        .into();
        assert!(!err.is_skippable());
    }

    #[test]
    fn rotation_errors_are_fatal() {
        let err: ZeekspoolError = RotationError::Archive {
            path: "/opt/zeek/logs/2022-02-14/conn.16:00:00-17:00:00.log.gz".to_owned(),
            reason: "permission denied".to_owned(),
        }
        .into();
        assert!(!err.is_skippable());
    }

    #[test]
    fn malformed_timestamp_display() {
        let err = RecordError::MalformedTimestamp {
            value: "not-a-date".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("malformed ECS record"));
        assert!(msg.contains("not-a-date"));
    }

    #[test]
    fn mirror_status_display() {
        let err = MirrorError::Status {
            index: "sysmon-2022-02-14".to_owned(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("sysmon-2022-02-14"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "Redis.Host".to_owned(),
            reason: "must not be empty".to_owned(),
        };
        assert!(err.to_string().contains("Redis.Host"));
    }
}
