//! v8 winlogbeat 변환 — 8.x envelope을 정규 레코드로 재투영
//!
//! winlogbeat 8.x는 네트워크/DNS 필드를 최상위 ECS 필드 대신
//! `winlog.event_data` 아래에 원시 문자열로 실어 보냅니다.
//! 이 모듈은 그 형태를 [`EcsRecord`]로 변환하고, Sysmon이 자유 형식
//! 문자열로 내보내는 DNS 응답(QueryResults)을 타입이 있는 응답 목록으로
//! 파싱합니다.

use std::net::IpAddr;

use chrono::{NaiveDateTime, SecondsFormat};
use serde::Deserialize;

use crate::dns;
use crate::error::RecordError;
use crate::record::{EcsDnsAnswer, EcsHost, EcsRecord, NumericString};

/// Sysmon UtcTime 레이아웃 (예: "2022-02-14 16:17:18.000")
const UTC_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// winlogbeat 8.x envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EcsRecordV8 {
    /// 외부 `@timestamp` (UtcTime 파싱 실패 시 폴백)
    #[serde(rename = "@timestamp", default)]
    pub timestamp: String,
    /// 수집 에이전트 (v8은 hostname 대신 name 필드를 사용)
    #[serde(default)]
    pub agent: V8Agent,
    /// 호스트 정보
    #[serde(default)]
    pub host: EcsHost,
    /// winlog 섹션
    #[serde(default)]
    pub winlog: V8Winlog,
    /// 이벤트 출처 정보
    #[serde(default)]
    pub event: V8Event,
}

/// v8 에이전트 정보
#[derive(Debug, Clone, Default, Deserialize)]
pub struct V8Agent {
    /// 에이전트 호스트명
    #[serde(default)]
    pub name: String,
    /// 에이전트 UUID
    #[serde(default)]
    pub id: String,
}

/// winlog 섹션
#[derive(Debug, Clone, Default, Deserialize)]
pub struct V8Winlog {
    /// Sysmon 이벤트 데이터
    #[serde(default)]
    pub event_data: V8EventData,
}

/// Sysmon 이벤트 데이터 (원시 문자열 필드)
///
/// `-`와 빈 문자열은 모두 값의 부재를 나타냅니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct V8EventData {
    #[serde(rename = "SourceIp", default)]
    pub source_ip: String,
    #[serde(rename = "SourcePort", default)]
    pub source_port: String,
    #[serde(rename = "DestinationIp", default)]
    pub destination_ip: String,
    #[serde(rename = "DestinationPort", default)]
    pub destination_port: String,
    #[serde(rename = "Protocol", default)]
    pub protocol: String,
    #[serde(rename = "DestinationPortName", default)]
    pub destination_port_name: String,
    #[serde(rename = "QueryName", default)]
    pub query_name: String,
    #[serde(rename = "QueryResults", default)]
    pub query_results: String,
    #[serde(rename = "UtcTime", default)]
    pub utc_time: String,
}

/// v8 이벤트 출처 정보
#[derive(Debug, Clone, Default, Deserialize)]
pub struct V8Event {
    /// 이벤트 공급자
    #[serde(default)]
    pub provider: String,
    /// 이벤트 코드 (문자열)
    #[serde(default)]
    pub code: String,
}

/// v8 envelope을 정규 [`EcsRecord`]로 변환합니다.
///
/// # Errors
/// 이벤트 코드가 정수로 파싱되지 않으면
/// [`RecordError::MalformedEventCode`]를 반환합니다. 포트 파싱 실패는
/// 경고 로그 후 빈 값으로 두고 계속 진행합니다.
pub fn translate_v8_record(v8: &EcsRecordV8) -> Result<EcsRecord, RecordError> {
    let data = &v8.winlog.event_data;
    let mut record = EcsRecord {
        host: v8.host.clone(),
        ..Default::default()
    };

    // Sysmon UtcTime이 우선, 파싱 실패 시 외부 @timestamp로 폴백
    record.timestamp = match NaiveDateTime::parse_from_str(&data.utc_time, UTC_TIME_LAYOUT) {
        Ok(naive) => naive
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Err(_) => v8.timestamp.clone(),
    };

    record.agent.hostname = v8.agent.name.clone();
    record.agent.id = v8.agent.id.clone();

    record.source.ip = data.source_ip.clone();
    record.source.port = parse_port(&data.source_port);
    record.destination.ip = data.destination_ip.clone();
    record.destination.port = parse_port(&data.destination_port);

    record.network.transport = data.protocol.clone();
    record.network.protocol = data.destination_port_name.clone();

    record.event.provider = v8.event.provider.clone();
    let code: i64 =
        v8.event
            .code
            .trim()
            .parse()
            .map_err(|_| RecordError::MalformedEventCode {
                value: v8.event.code.clone(),
            })?;
    record.event.code = NumericString(code.to_string());

    // Sysmon DNS 이벤트는 DestinationPortName을 채우지 않는다
    if code == 22 {
        record.network.protocol = "dns".to_owned();
    }

    record.dns.question.name = data.query_name.clone();
    record.dns.answers = parse_dns_answers(&data.query_results);

    Ok(record)
}

/// 포트 문자열을 십진 정규 형태로 파싱합니다.
///
/// `-`와 빈 문자열은 부재로 취급합니다. 파싱 실패는 로그 후 빈 값을
/// 반환합니다.
fn parse_port(raw: &str) -> NumericString {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return NumericString::default();
    }
    match trimmed.parse::<u32>() {
        Ok(port) => NumericString(port.to_string()),
        Err(_) => {
            tracing::warn!(value = raw, "unparseable port in v8 event data, skipping");
            NumericString::default()
        }
    }
}

/// Sysmon QueryResults 문자열을 타입이 있는 DNS 응답 목록으로 파싱합니다.
///
/// 입력은 세미콜론으로 구분된 세그먼트입니다. 예:
/// `type:  5 a-ring.example.net;type:  5 example.net;::ffff:204.79.197.254;`
///
/// - `type:`으로 시작하는 세그먼트는 공백 기준 정확히 세 토큰이어야 하며,
///   숫자 타입 ID를 RR 타입 이름으로 변환합니다 (알 수 없는 ID는 빈 이름).
/// - 그 외 세그먼트는 `::ffff:` 접두사를 떼고 IP로 파싱되면
///   IPv4는 `A`, IPv6는 `AAAA` 응답으로 취급합니다.
/// - 어느 쪽에도 해당하지 않는 세그먼트는 건너뜁니다.
pub fn parse_dns_answers(raw: &str) -> Vec<EcsDnsAnswer> {
    let mut answers = Vec::new();
    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        if segment.starts_with("type:") {
            let tokens: Vec<&str> = segment.split_whitespace().collect();
            if tokens.len() != 3 {
                tracing::debug!(segment, "malformed typed DNS answer segment, skipping");
                continue;
            }
            let rtype = tokens[1]
                .parse::<u16>()
                .ok()
                .and_then(dns::type_id_to_name)
                .unwrap_or("");
            answers.push(EcsDnsAnswer {
                rtype: rtype.to_owned(),
                data: tokens[2].to_owned(),
            });
            continue;
        }

        let stripped = segment.strip_prefix("::ffff:").unwrap_or(segment);
        match stripped.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => answers.push(EcsDnsAnswer {
                rtype: "A".to_owned(),
                data: segment.to_owned(),
            }),
            Ok(IpAddr::V6(_)) => answers.push(EcsDnsAnswer {
                rtype: "AAAA".to_owned(),
                data: segment.to_owned(),
            }),
            Err(_) => {
                tracing::debug!(segment, "unrecognized DNS answer segment, skipping");
            }
        }
    }
    answers
}
