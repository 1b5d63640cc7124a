//! DNS 로그 포매터 — Sysmon 이벤트 코드 22 (DNS 질의)
//!
//! Sysmon DNS 이벤트에는 질의 출발지 주소가 없으므로, 호스트 IP 목록에서
//! 선택한 출발지 IP마다 한 줄씩 출력합니다. CNAME 응답과 `-` 데이터는
//! Zeek과 마찬가지로 answers 집합에서 제외합니다.

use zeekspool_core::dns::type_name_to_id;
use zeekspool_core::ip::select_public_private_ips;
use zeekspool_core::record::EcsRecord;

use crate::error::OutputError;
use crate::file_type::{format_epoch_ts, TsvFileType};
use crate::header::TsvHeader;

const DNS_FIELDS: &[&str] = &[
    "ts",
    "uid",
    "id.orig_h",
    "id.orig_p",
    "id.resp_h",
    "id.resp_p",
    "proto",
    "trans_id",
    "rtt",
    "query",
    "qclass",
    "qclass_name",
    "qtype",
    "qtype_name",
    "rcode",
    "rcode_name",
    "AA",
    "TC",
    "RD",
    "RA",
    "Z",
    "answers",
    "TTLs",
    "rejected",
    "agent_hostname",
    "agent_uuid",
];

const DNS_TYPES: &[&str] = &[
    "time",
    "string",
    "addr",
    "port",
    "addr",
    "port",
    "enum",
    "count",
    "interval",
    "string",
    "count",
    "string",
    "count",
    "string",
    "count",
    "string",
    "bool",
    "bool",
    "bool",
    "bool",
    "count",
    "vector[string]",
    "vector[interval]",
    "bool",
    "string",
    "string",
];

/// dns.log 파일 타입
pub struct DnsTsv;

/// CNAME 응답은 Zeek이 기록하지 않으므로 제외한다.
/// WEIRD: Windows는 IP 주소에 대해 A 질의를 발생시키고 answers로 "-"를
/// 돌려받는 경우가 있다.
fn should_handle_answer(dns_type: &str, dns_data: &str) -> bool {
    dns_type != "CNAME" && dns_data != "-"
}

impl TsvFileType for DnsTsv {
    fn header(&self) -> TsvHeader {
        TsvHeader {
            separator: "\\x09",
            set_separator: ",",
            empty_field: "(empty)",
            unset_field: "-",
            path: "dns",
            fields: DNS_FIELDS,
            types: DNS_TYPES,
        }
    }

    fn handles_ecs_record(&self, record: &EcsRecord) -> bool {
        record.event.provider == "Microsoft-Windows-Sysmon" && record.event.code.as_str() == "22"
    }

    fn format_lines(&self, records: &[&EcsRecord]) -> Result<String, OutputError> {
        let header = self.header();
        let separator = header.separator_byte();
        let mut out = String::new();

        for record in records {
            let ts = format_epoch_ts(record)?;

            let mut answers: Vec<&str> = Vec::new();
            let mut answer_type_name = header.unset_field;
            for answer in &record.dns.answers {
                if should_handle_answer(&answer.rtype, &answer.data) {
                    answers.push(&answer.data);
                    answer_type_name = &answer.rtype;
                }
            }

            let answer_type_id = type_name_to_id(answer_type_name)
                .map(|id| id.to_string())
                .unwrap_or_else(|| header.unset_field.to_owned());
            let answers_set = if answers.is_empty() {
                header.empty_field.to_owned()
            } else {
                answers.join(header.set_separator)
            };

            for source_ip in select_public_private_ips(&record.host.ip) {
                let values = [
                    ts.as_str(),                   // ts
                    header.unset_field,            // uid
                    source_ip.as_str(),            // id.orig_h
                    header.unset_field,            // id.orig_p
                    header.unset_field,            // id.resp_h
                    header.unset_field,            // id.resp_p
                    header.unset_field,            // proto
                    header.unset_field,            // trans_id
                    header.unset_field,            // rtt
                    record.dns.question.name.as_str(), // query
                    header.unset_field,            // qclass
                    header.unset_field,            // qclass_name
                    answer_type_id.as_str(),       // qtype
                    answer_type_name,              // qtype_name
                    header.unset_field,            // rcode
                    header.unset_field,            // rcode_name
                    header.unset_field,            // AA
                    header.unset_field,            // TC
                    header.unset_field,            // RD
                    header.unset_field,            // RA
                    header.unset_field,            // Z
                    answers_set.as_str(),          // answers
                    header.unset_field,            // TTLs
                    header.unset_field,            // rejected
                    record.agent.hostname.as_str(), // agent_hostname
                    record.agent.id.as_str(),      // agent_uuid
                ];
                out.push_str(&values.join(&separator));
                out.push('\n');
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeekspool_core::record::{
        EcsAgent, EcsDns, EcsDnsAnswer, EcsDnsQuestion, EcsEvent, EcsHost, NumericString,
    };

    fn sample_record() -> EcsRecord {
        EcsRecord {
            timestamp: "2022-02-14T16:17:18Z".to_owned(),
            agent: EcsAgent {
                hostname: "h".to_owned(),
                id: "u".to_owned(),
            },
            host: EcsHost {
                ip: vec!["10.0.0.1".to_owned(), "127.0.0.1".to_owned()],
            },
            event: EcsEvent {
                provider: "Microsoft-Windows-Sysmon".to_owned(),
                code: NumericString::from("22"),
            },
            dns: EcsDns {
                question: EcsDnsQuestion {
                    name: "example.com".to_owned(),
                },
                answers: vec![
                    EcsDnsAnswer {
                        rtype: "A".to_owned(),
                        data: "1.2.3.4".to_owned(),
                    },
                    EcsDnsAnswer {
                        rtype: "CNAME".to_owned(),
                        data: "alias".to_owned(),
                    },
                ],
            },
            ..Default::default()
        }
    }

    #[test]
    fn handles_only_sysmon_code_22() {
        assert!(DnsTsv.handles_ecs_record(&sample_record()));

        let mut wrong = sample_record();
        wrong.event.code = NumericString::from("3");
        assert!(!DnsTsv.handles_ecs_record(&wrong));
    }

    #[test]
    fn emits_one_line_per_selected_source_ip() {
        // 127.0.0.1은 선택에서 제외되므로 한 줄만 나온다
        let record = sample_record();
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        assert_eq!(lines.lines().count(), 1);

        let line = lines.lines().next().unwrap();
        let columns: Vec<&str> = line.split('\t').collect();
        assert_eq!(columns.len(), DNS_FIELDS.len());
        assert_eq!(columns[0], "1644855438.000000");
        assert_eq!(columns[2], "10.0.0.1"); // id.orig_h
        assert_eq!(columns[9], "example.com"); // query
        assert_eq!(columns[12], "1"); // qtype
        assert_eq!(columns[13], "A"); // qtype_name
        assert_eq!(columns[21], "1.2.3.4"); // answers (CNAME 제외)
        assert_eq!(columns[24], "h"); // agent_hostname
        assert_eq!(columns[25], "u"); // agent_uuid
    }

    #[test]
    fn cname_only_answers_emit_empty_set() {
        let mut record = sample_record();
        record.dns.answers = vec![EcsDnsAnswer {
            rtype: "CNAME".to_owned(),
            data: "alias".to_owned(),
        }];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[21], "(empty)");
        assert_eq!(columns[12], "-"); // qtype
        assert_eq!(columns[13], "-"); // qtype_name
    }

    #[test]
    fn dash_answer_data_is_filtered() {
        let mut record = sample_record();
        record.dns.answers = vec![EcsDnsAnswer {
            rtype: "A".to_owned(),
            data: "-".to_owned(),
        }];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[21], "(empty)");
    }

    #[test]
    fn multiple_answers_join_with_set_separator() {
        let mut record = sample_record();
        record.dns.answers = vec![
            EcsDnsAnswer {
                rtype: "A".to_owned(),
                data: "1.2.3.4".to_owned(),
            },
            EcsDnsAnswer {
                rtype: "A".to_owned(),
                data: "5.6.7.8".to_owned(),
            },
        ];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[21], "1.2.3.4,5.6.7.8");
    }

    #[test]
    fn translated_v8_answers_survive_cname_filtering() {
        // v8 QueryResults "type:  5 a.example.;::ffff:93.184.216.34;"가
        // 변환된 뒤의 형태
        let mut record = sample_record();
        record.dns.question.name = "a.example.".to_owned();
        record.dns.answers = vec![
            EcsDnsAnswer {
                rtype: "CNAME".to_owned(),
                data: "a.example.".to_owned(),
            },
            EcsDnsAnswer {
                rtype: "A".to_owned(),
                data: "::ffff:93.184.216.34".to_owned(),
            },
        ];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[21], "::ffff:93.184.216.34");
        assert_eq!(columns[13], "A");
        assert_eq!(columns[12], "1");
    }

    #[test]
    fn qtype_follows_last_valid_answer() {
        let mut record = sample_record();
        record.dns.answers = vec![
            EcsDnsAnswer {
                rtype: "A".to_owned(),
                data: "1.2.3.4".to_owned(),
            },
            EcsDnsAnswer {
                rtype: "AAAA".to_owned(),
                data: "2606:2800::1".to_owned(),
            },
        ];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[13], "AAAA");
        assert_eq!(columns[12], "28");
    }

    #[test]
    fn unknown_answer_type_leaves_qtype_unset() {
        let mut record = sample_record();
        record.dns.answers = vec![EcsDnsAnswer {
            rtype: "BOGUS".to_owned(),
            data: "1.2.3.4".to_owned(),
        }];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        let columns: Vec<&str> = lines.lines().next().unwrap().split('\t').collect();
        assert_eq!(columns[13], "BOGUS");
        assert_eq!(columns[12], "-");
    }

    #[test]
    fn no_selectable_source_ip_emits_zero_lines() {
        let mut record = sample_record();
        record.host.ip = vec!["127.0.0.1".to_owned(), "fe80::1".to_owned()];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn two_source_ips_emit_two_lines() {
        let mut record = sample_record();
        record.host.ip = vec!["10.0.0.1".to_owned(), "192.168.1.5".to_owned()];
        let lines = DnsTsv.format_lines(&[&record]).unwrap();
        assert_eq!(lines.lines().count(), 2);
        let second: Vec<&str> = lines.lines().nth(1).unwrap().split('\t').collect();
        assert_eq!(second[2], "192.168.1.5");
    }

    #[test]
    fn malformed_timestamp_aborts_batch() {
        let mut record = sample_record();
        record.timestamp = "not-a-date".to_owned();
        let err = DnsTsv.format_lines(&[&record]).unwrap_err();
        assert!(matches!(err, OutputError::Malformed(_)));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_count_matches_selected_ips(
                host_ips in prop::collection::vec(
                    prop_oneof![
                        Just("10.0.0.1".to_owned()),
                        Just("127.0.0.1".to_owned()),
                        Just("8.8.8.8".to_owned()),
                        Just("fe80::1".to_owned()),
                        Just("garbage".to_owned()),
                    ],
                    0..6,
                ),
            ) {
                let mut record = sample_record();
                record.host.ip = host_ips.clone();
                let lines = DnsTsv.format_lines(&[&record]).unwrap();
                let expected = select_public_private_ips(&host_ips).len();
                prop_assert_eq!(lines.lines().count(), expected);
            }
        }
    }
}
