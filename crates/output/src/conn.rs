//! Conn 로그 포매터 — Sysmon 이벤트 코드 3 (네트워크 연결)
//!
//! Sysmon이 제공하지 않는 열(duration, byte 카운트, 연결 상태 등)은
//! 모두 부재 표기로 채웁니다.

use zeekspool_core::record::EcsRecord;

use crate::error::OutputError;
use crate::file_type::{format_epoch_ts, TsvFileType};
use crate::header::TsvHeader;

const CONN_FIELDS: &[&str] = &[
    "ts",
    "uid",
    "id.orig_h",
    "id.orig_p",
    "id.resp_h",
    "id.resp_p",
    "proto",
    "service",
    "duration",
    "orig_bytes",
    "resp_bytes",
    "conn_state",
    "local_orig",
    "local_resp",
    "missed_bytes",
    "history",
    "orig_pkts",
    "orig_ip_bytes",
    "resp_pkts",
    "resp_ip_bytes",
    "tunnel_parents",
    "agent_uuid",
    "agent_hostname",
];

const CONN_TYPES: &[&str] = &[
    "time",
    "string",
    "addr",
    "port",
    "addr",
    "port",
    "enum",
    "string",
    "interval",
    "count",
    "count",
    "string",
    "bool",
    "bool",
    "count",
    "string",
    "count",
    "count",
    "count",
    "count",
    "set[string]",
    "string",
    "string",
];

/// conn.log 파일 타입
pub struct ConnTsv;

impl TsvFileType for ConnTsv {
    fn header(&self) -> TsvHeader {
        TsvHeader {
            separator: "\\x09",
            set_separator: ",",
            empty_field: "(empty)",
            unset_field: "-",
            path: "conn",
            fields: CONN_FIELDS,
            types: CONN_TYPES,
        }
    }

    fn handles_ecs_record(&self, record: &EcsRecord) -> bool {
        record.event.provider == "Microsoft-Windows-Sysmon" && record.event.code.as_str() == "3"
    }

    fn format_lines(&self, records: &[&EcsRecord]) -> Result<String, OutputError> {
        let mut out = String::new();
        for record in records {
            let ts = format_epoch_ts(record)?;
            out.push_str(&format!(
                "{ts}\t-\t{}\t{}\t{}\t{}\t{}\t{}\t-\t-\t-\t-\tF\tF\t-\t-\t-\t-\t-\t-\t(empty)\t{}\t{}\n",
                record.source.ip,
                record.source.port,
                record.destination.ip,
                record.destination.port,
                record.network.transport,
                record.network.protocol,
                record.agent.id,
                record.agent.hostname,
            ));
        }
        Ok(out)
    }
}
