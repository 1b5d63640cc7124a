//! Elasticsearch 미러 — 원시 JSON 문서 전달
//!
//! 큐에서 받은 문서를 디코딩 없이 그대로 Elasticsearch에 넘깁니다.
//! 문서당 요청 하나로, 배치나 Bulk API는 사용하지 않습니다. 호출 간
//! 상태가 없는 best-effort writer입니다.
//!
//! 대상 인덱스는 beats 버전으로 결정합니다:
//! - `8.x` → `winlogbeat-<ver>` (+ `winlogbeat-<ver>-routing` 파이프라인)
//! - `7.17.9` → `winlogbeat-7.17.9`
//! - 그 외 → `sysmon-YYYY-MM-DD`

use chrono::{NaiveDate, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Certificate;
use zeekspool_core::config::{ElasticConfig, TlsRuntime};
use zeekspool_core::error::ZeekspoolError;
use zeekspool_core::writer::JsonWriter;

use crate::error::IngestError;

/// Elasticsearch 미러 writer
#[derive(Debug)]
pub struct ElasticWriter {
    host: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl ElasticWriter {
    /// 설정과 TLS 자료에서 미러 writer를 생성합니다.
    pub fn new(config: &ElasticConfig, tls: Option<&TlsRuntime>) -> Result<Self, IngestError> {
        let mut builder = reqwest::Client::builder();

        if let Some(tls) = tls {
            if !tls.verify_certificate {
                builder = builder.danger_accept_invalid_certs(true);
            }
            if let Some(pem) = &tls.ca_pem {
                let certificate =
                    Certificate::from_pem(pem).map_err(|e| IngestError::Client {
                        reason: format!("invalid CA certificate: {e}"),
                    })?;
                builder = builder.add_root_certificate(certificate);
            }
        }

        let client = builder.build().map_err(|e| IngestError::Client {
            reason: e.to_string(),
        })?;

        Ok(Self {
            host: config.host.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// beats 버전으로 대상 인덱스와 수집 파이프라인을 결정합니다.
    fn target_index(beats_version: &str, today: NaiveDate) -> (String, Option<String>) {
        if beats_version.starts_with('8') {
            (
                format!("winlogbeat-{beats_version}"),
                Some(format!("winlogbeat-{beats_version}-routing")),
            )
        } else if beats_version == "7.17.9" {
            ("winlogbeat-7.17.9".to_owned(), None)
        } else {
            (format!("sysmon-{}", today.format("%Y-%m-%d")), None)
        }
    }

    fn doc_url(&self, index: &str, pipeline: Option<&str>) -> String {
        match pipeline {
            Some(pipeline) => format!("https://{}/{}/_doc?pipeline={}", self.host, index, pipeline),
            None => format!("https://{}/{}/_doc", self.host, index),
        }
    }

    async fn post_document(&self, doc: &str, beats_version: &str) -> Result<(), IngestError> {
        let (index, pipeline) = Self::target_index(beats_version, Utc::now().date_naive());
        let url = self.doc_url(&index, pipeline.as_deref());

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .body(doc.to_owned())
            .send()
            .await
            .map_err(|e| IngestError::MirrorRequest {
                index: index.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::MirrorStatus {
                index,
                status: status.as_u16(),
            });
        }

        tracing::debug!(status = status.as_u16(), index, "data transferred to elasticsearch");
        Ok(())
    }
}

impl JsonWriter for ElasticWriter {
    async fn write_ecs_records(
        &self,
        raw_docs: &[String],
        beats_version: &str,
    ) -> Result<(), ZeekspoolError> {
        for doc in raw_docs {
            self.post_document(doc, beats_version).await?;
        }
        Ok(())
    }

    /// 문서마다 독립된 요청을 보내므로 정리할 리소스가 없습니다.
    async fn close(&self) -> Result<(), ZeekspoolError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> ElasticWriter {
        let config = ElasticConfig {
            host: "es.example.net:9200".to_owned(),
            user: "sysmon-ingest".to_owned(),
            password: "secret".to_owned(),
            ..Default::default()
        };
        ElasticWriter::new(&config, None).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 2, 14).unwrap()
    }

    #[test]
    fn v8_versions_route_through_pipeline() {
        let (index, pipeline) = ElasticWriter::target_index("8.5.0", day());
        assert_eq!(index, "winlogbeat-8.5.0");
        assert_eq!(pipeline.as_deref(), Some("winlogbeat-8.5.0-routing"));
    }

    #[test]
    fn supported_v7_version_routes_to_fixed_index() {
        let (index, pipeline) = ElasticWriter::target_index("7.17.9", day());
        assert_eq!(index, "winlogbeat-7.17.9");
        assert!(pipeline.is_none());
    }

    #[test]
    fn unknown_versions_route_to_dated_sysmon_index() {
        let (index, pipeline) = ElasticWriter::target_index("", day());
        assert_eq!(index, "sysmon-2022-02-14");
        assert!(pipeline.is_none());

        let (index, _) = ElasticWriter::target_index("7.10.0", day());
        assert_eq!(index, "sysmon-2022-02-14");
    }

    #[test]
    fn doc_url_includes_pipeline_when_present() {
        let writer = writer();
        assert_eq!(
            writer.doc_url("winlogbeat-8.5.0", Some("winlogbeat-8.5.0-routing")),
            "https://es.example.net:9200/winlogbeat-8.5.0/_doc?pipeline=winlogbeat-8.5.0-routing"
        );
        assert_eq!(
            writer.doc_url("sysmon-2022-02-14", None),
            "https://es.example.net:9200/sysmon-2022-02-14/_doc"
        );
    }

    #[test]
    fn invalid_ca_pem_is_rejected() {
        let config = ElasticConfig::default();
        let tls = TlsRuntime {
            verify_certificate: true,
            ca_pem: Some(b"not a pem".to_vec()),
        };
        let err = ElasticWriter::new(&config, Some(&tls)).unwrap_err();
        assert!(matches!(err, IngestError::Client { .. }));
    }

    #[tokio::test]
    async fn close_is_a_noop() {
        JsonWriter::close(&writer()).await.unwrap();
    }
}
