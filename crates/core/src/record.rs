//! ECS 레코드 모델 — 수집 텔레메트리의 정규화된 인메모리 표현
//!
//! [`EcsRecord`]는 지원하는 모든 winlogbeat 버전에서 나타나는 필드의
//! 합집합입니다. winlogbeat 7.x 문서는 이 형태로 바로 디코딩되며,
//! 8.x 문서는 [`crate::translate`]를 거쳐 이 형태로 재투영됩니다.
//!
//! Port와 Event.Code는 [`NumericString`]으로 표현합니다. JSON 생산자가
//! 정수(`1234`)와 따옴표 정수(`"1234"`)를 혼용하기 때문입니다.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::RecordError;

/// 정수와 문자열 JSON 표현을 모두 허용하는 숫자 문자열
///
/// 빈 문자열은 값의 부재를 나타냅니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericString(pub String);

impl NumericString {
    /// 내부 문자열 참조를 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 값이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NumericString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NumericString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for NumericString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumericStringVisitor;

        impl Visitor<'_> for NumericStringVisitor {
            type Value = NumericString;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an integer or a string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(NumericString(value.to_owned()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(NumericString(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(NumericString(value.to_string()))
            }
        }

        deserializer.deserialize_any(NumericStringVisitor)
    }
}

/// 정규화된 ECS 레코드
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsRecord {
    /// RFC3339Nano 타임스탬프 문자열
    #[serde(rename = "@timestamp", default)]
    pub timestamp: String,
    /// 수집 에이전트 정보
    #[serde(default)]
    pub agent: EcsAgent,
    /// 호스트 정보 (IP 목록)
    #[serde(default)]
    pub host: EcsHost,
    /// 출발지 엔드포인트
    #[serde(default)]
    pub source: EcsEndpoint,
    /// 목적지 엔드포인트
    #[serde(default)]
    pub destination: EcsEndpoint,
    /// 네트워크 계층 정보
    #[serde(default)]
    pub network: EcsNetwork,
    /// 이벤트 출처 정보
    #[serde(default)]
    pub event: EcsEvent,
    /// DNS 질의/응답 정보 (Sysmon 이벤트 코드 22)
    #[serde(default)]
    pub dns: EcsDns,
}

impl EcsRecord {
    /// `@timestamp` 필드를 RFC3339Nano로 파싱합니다.
    pub fn rfc3339_timestamp(&self) -> Result<DateTime<FixedOffset>, RecordError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map_err(|_| {
            RecordError::MalformedTimestamp {
                value: self.timestamp.clone(),
            }
        })
    }
}

/// 수집 에이전트 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsAgent {
    /// 에이전트 호스트명
    #[serde(default)]
    pub hostname: String,
    /// 에이전트 UUID
    #[serde(default)]
    pub id: String,
}

/// 호스트 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsHost {
    /// 호스트에 할당된 IP 목록 (입력 순서 유지)
    #[serde(default)]
    pub ip: Vec<String>,
}

/// 출발지/목적지 엔드포인트
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsEndpoint {
    /// IP 주소 (텍스트)
    #[serde(default)]
    pub ip: String,
    /// 포트 (십진 문자열)
    #[serde(default)]
    pub port: NumericString,
}

/// 네트워크 계층 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsNetwork {
    /// 전송 계층 프로토콜 (Zeek proto 열에 대응)
    #[serde(default)]
    pub transport: String,
    /// 응용 계층 프로토콜 (Zeek service 열에 대응)
    #[serde(default)]
    pub protocol: String,
}

/// 이벤트 출처 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsEvent {
    /// 이벤트 공급자 (예: "Microsoft-Windows-Sysmon")
    #[serde(default)]
    pub provider: String,
    /// 이벤트 코드 (십진 문자열)
    #[serde(default)]
    pub code: NumericString,
}

/// DNS 질의/응답 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsDns {
    /// 응답 목록 (입력 순서 유지)
    #[serde(default)]
    pub answers: Vec<EcsDnsAnswer>,
    /// 질의 정보
    #[serde(default)]
    pub question: EcsDnsQuestion,
}

/// 단일 DNS 응답
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsDnsAnswer {
    /// RR 타입 이름 (예: "A", "CNAME")
    #[serde(rename = "type", default)]
    pub rtype: String,
    /// 응답 데이터
    #[serde(default)]
    pub data: String,
}

/// DNS 질의 정보
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EcsDnsQuestion {
    /// 질의 도메인명
    #[serde(default)]
    pub name: String,
}

/// `@metadata` envelope — 디코딩 경로 선택에 사용
///
/// version 필드의 첫 글자가 `'8'`이면 v8 변환기를 거치고,
/// 그 외에는 [`EcsRecord`]로 바로 디코딩합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EcsMetadata {
    /// `@metadata` 객체
    #[serde(rename = "@metadata", default)]
    pub metadata: MetadataFields,
}

/// `@metadata` 내부 필드
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataFields {
    /// beats 버전 문자열 (예: "8.5.0", "7.17.9")
    #[serde(default)]
    pub version: String,
}

impl EcsMetadata {
    /// v8 winlogbeat envelope인지 확인합니다.
    pub fn is_v8(&self) -> bool {
        self.metadata.version.starts_with('8')
    }

    /// beats 버전 문자열을 반환합니다.
    pub fn version(&self) -> &str {
        &self.metadata.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_string_accepts_integer() {
        let value: NumericString = serde_json::from_str("1234").unwrap();
        assert_eq!(value.as_str(), "1234");
    }

    #[test]
    fn numeric_string_accepts_quoted_integer() {
        let value: NumericString = serde_json::from_str("\"1234\"").unwrap();
        assert_eq!(value.as_str(), "1234");
    }

    #[test]
    fn numeric_string_accepts_negative_integer() {
        let value: NumericString = serde_json::from_str("-3").unwrap();
        assert_eq!(value.as_str(), "-3");
    }

    #[test]
    fn numeric_string_default_is_empty() {
        assert!(NumericString::default().is_empty());
    }

    #[test]
    fn decode_v7_conn_record() {
        let raw = r#"{
            "@timestamp": "2022-02-14T16:17:18Z",
            "agent": {"hostname": "h", "id": "u"},
            "source": {"ip": "10.0.0.1", "port": 1234},
            "destination": {"ip": "10.0.0.2", "port": 80},
            "network": {"transport": "tcp", "protocol": "http"},
            "event": {"provider": "Microsoft-Windows-Sysmon", "code": "3"}
        }"#;
        let record: EcsRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.timestamp, "2022-02-14T16:17:18Z");
        assert_eq!(record.agent.hostname, "h");
        assert_eq!(record.agent.id, "u");
        assert_eq!(record.source.port.as_str(), "1234");
        assert_eq!(record.destination.port.as_str(), "80");
        assert_eq!(record.event.code.as_str(), "3");
    }

    #[test]
    fn decode_dns_answers() {
        let raw = r#"{
            "@timestamp": "2022-02-14T16:17:18Z",
            "event": {"provider": "Microsoft-Windows-Sysmon", "code": 22},
            "dns": {
                "question": {"name": "example.com"},
                "answers": [
                    {"type": "A", "data": "1.2.3.4"},
                    {"type": "CNAME", "data": "alias"}
                ]
            }
        }"#;
        let record: EcsRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.dns.question.name, "example.com");
        assert_eq!(record.dns.answers.len(), 2);
        assert_eq!(record.dns.answers[0].rtype, "A");
        assert_eq!(record.dns.answers[1].data, "alias");
        assert_eq!(record.event.code.as_str(), "22");
    }

    #[test]
    fn decode_missing_sections_defaults() {
        let record: EcsRecord = serde_json::from_str("{}").unwrap();
        assert!(record.timestamp.is_empty());
        assert!(record.host.ip.is_empty());
        assert!(record.source.port.is_empty());
    }

    #[test]
    fn rfc3339_timestamp_parses_nano() {
        let record = EcsRecord {
            timestamp: "2022-02-14T16:17:18.123456789Z".to_owned(),
            ..Default::default()
        };
        let parsed = record.rfc3339_timestamp().unwrap();
        assert_eq!(parsed.timestamp(), 1_644_855_438);
    }

    #[test]
    fn rfc3339_timestamp_rejects_garbage() {
        let record = EcsRecord {
            timestamp: "not-a-date".to_owned(),
            ..Default::default()
        };
        let err = record.rfc3339_timestamp().unwrap_err();
        assert!(matches!(err, RecordError::MalformedTimestamp { .. }));
    }

    #[test]
    fn metadata_version_selects_v8() {
        let raw = r#"{"@metadata": {"version": "8.5.0"}}"#;
        let meta: EcsMetadata = serde_json::from_str(raw).unwrap();
        assert!(meta.is_v8());
        assert_eq!(meta.version(), "8.5.0");
    }

    #[test]
    fn metadata_version_v7_is_not_v8() {
        let raw = r#"{"@metadata": {"version": "7.17.9"}}"#;
        let meta: EcsMetadata = serde_json::from_str(raw).unwrap();
        assert!(!meta.is_v8());
    }

    #[test]
    fn metadata_missing_defaults_to_direct_decoding() {
        let meta: EcsMetadata = serde_json::from_str("{}").unwrap();
        assert!(!meta.is_v8());
        assert!(meta.version().is_empty());
    }
}
