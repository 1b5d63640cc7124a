//! 단발성 Writer — 스풀에 누적 후 Close 시 단일 아카이브
//!
//! 회전 없이 실행 전체를 하나의 스풀에 모았다가, Close 시 푸터를 쓰고
//! `<archiveDir>/<path>.log.gz`로 아카이브합니다.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use zeekspool_core::error::ZeekspoolError;
use zeekspool_core::record::EcsRecord;
use zeekspool_core::writer::EcsWriter;

use crate::error::OutputError;
use crate::file_type::{default_file_types, map_ecs_records_to_tsv_files, TsvFileType};
use crate::spool::{archive_spool, open_tsv_file, write_tsv_footer, write_tsv_lines, Spool};

/// 단발성 파일 writer
///
/// 모든 레코드를 파일 타입별 스풀 하나에 기록하고, Close 시점에
/// 타임스탬프 없는 단일 아카이브로 이동합니다.
pub struct StandardWriter {
    archive_dir: PathBuf,
    file_types: Vec<Arc<dyn TsvFileType>>,
    spools: Vec<Spool>,
}

impl StandardWriter {
    /// 대상 디렉토리 아래에 스풀을 열고 writer를 생성합니다.
    pub fn create(tgt_dir: impl Into<PathBuf>) -> Result<Self, OutputError> {
        Self::with_file_types(tgt_dir, default_file_types())
    }

    /// 주어진 레지스트리로 writer를 생성합니다.
    pub(crate) fn with_file_types(
        tgt_dir: impl Into<PathBuf>,
        file_types: Vec<Arc<dyn TsvFileType>>,
    ) -> Result<Self, OutputError> {
        let archive_dir = tgt_dir.into();
        let spool_dir = archive_dir.join("ecs-spool");

        let mut spools = Vec::with_capacity(file_types.len());
        for file_type in &file_types {
            let path = spool_dir.join(format!("{}.log", file_type.header().path));
            let file = open_tsv_file(file_type.as_ref(), &path, Utc::now())?;
            spools.push(Spool { path, file });
        }

        tracing::info!("initialized standard file writer");
        Ok(Self {
            archive_dir,
            file_types,
            spools,
        })
    }

    fn write_records(&mut self, records: &[EcsRecord]) -> Result<(), OutputError> {
        tracing::debug!(count = records.len(), "writing records");

        let buckets = map_ecs_records_to_tsv_files(&self.file_types, records);
        for (idx, bucket) in buckets.iter().enumerate() {
            write_tsv_lines(
                self.file_types[idx].as_ref(),
                bucket,
                &mut self.spools[idx].file,
            )?;
        }
        Ok(())
    }

    fn close_all(&mut self) -> Result<(), OutputError> {
        let close_time = Utc::now();

        for (file_type, spool) in self.file_types.iter().zip(self.spools.drain(..)) {
            let Spool { path, mut file } = spool;
            write_tsv_footer(file_type.as_ref(), close_time, &mut file)?;
            drop(file);

            let archive_path = self
                .archive_dir
                .join(format!("{}.log.gz", file_type.header().path));
            let size = archive_spool(&path, &archive_path)?;
            tracing::info!(path = %archive_path.display(), size, "log written");
        }
        Ok(())
    }
}

impl EcsWriter for StandardWriter {
    async fn write_ecs_records(&mut self, records: Vec<EcsRecord>) -> Result<(), ZeekspoolError> {
        self.write_records(&records).map_err(ZeekspoolError::from)
    }

    async fn close(&mut self) -> Result<(), ZeekspoolError> {
        self.close_all().map_err(ZeekspoolError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeekspool_core::record::{EcsAgent, EcsEndpoint, EcsEvent, EcsNetwork, NumericString};

    fn conn_record() -> EcsRecord {
        EcsRecord {
            timestamp: "2022-02-14T16:17:18Z".to_owned(),
            agent: EcsAgent {
                hostname: "h".to_owned(),
                id: "u".to_owned(),
            },
            source: EcsEndpoint {
                ip: "10.0.0.1".to_owned(),
                port: NumericString::from("1234"),
            },
            destination: EcsEndpoint {
                ip: "10.0.0.2".to_owned(),
                port: NumericString::from("80"),
            },
            network: EcsNetwork {
                transport: "tcp".to_owned(),
                protocol: "http".to_owned(),
            },
            event: EcsEvent {
                provider: "Microsoft-Windows-Sysmon".to_owned(),
                code: NumericString::from("3"),
            },
            ..Default::default()
        }
    }

    #[test]
    fn create_opens_spool_per_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let _writer = StandardWriter::create(dir.path()).unwrap();

        for file_type in default_file_types() {
            let spool = dir
                .path()
                .join("ecs-spool")
                .join(format!("{}.log", file_type.header().path));
            assert!(spool.exists(), "spool for {} should exist", file_type.header().path);
        }
    }

    #[test]
    fn close_archives_every_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StandardWriter::create(dir.path()).unwrap();
        writer.close_all().unwrap();

        for file_type in default_file_types() {
            let path = file_type.header().path;
            let archive = dir.path().join(format!("{path}.log.gz"));
            assert!(archive.exists(), "archive for {path} should exist");
            let spool = dir.path().join("ecs-spool").join(format!("{path}.log"));
            assert!(!spool.exists(), "spool for {path} should be removed");
        }
    }

    #[test]
    fn written_records_reach_the_spool() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StandardWriter::create(dir.path()).unwrap();
        writer.write_records(&[conn_record()]).unwrap();

        let spool = dir.path().join("ecs-spool/conn.log");
        let contents = std::fs::read_to_string(&spool).unwrap();
        assert!(contents.contains("1644855438.000000\t-\t10.0.0.1\t1234"));
    }

    #[test]
    fn malformed_record_leaves_spools_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StandardWriter::create(dir.path()).unwrap();

        let conn_spool = dir.path().join("ecs-spool/conn.log");
        let dns_spool = dir.path().join("ecs-spool/dns.log");
        let conn_len = std::fs::metadata(&conn_spool).unwrap().len();
        let dns_len = std::fs::metadata(&dns_spool).unwrap().len();

        let mut bad = conn_record();
        bad.timestamp = "not-a-date".to_owned();
        let err = writer.write_records(&[bad]).unwrap_err();
        assert!(matches!(err, OutputError::Malformed(_)));

        assert_eq!(std::fs::metadata(&conn_spool).unwrap().len(), conn_len);
        assert_eq!(std::fs::metadata(&dns_spool).unwrap().len(), dns_len);
    }

    #[tokio::test]
    async fn implements_ecs_writer() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = StandardWriter::create(dir.path()).unwrap();
        EcsWriter::write_ecs_records(&mut writer, vec![conn_record()])
            .await
            .unwrap();
        EcsWriter::close(&mut writer).await.unwrap();
        assert!(dir.path().join("conn.log.gz").exists());
    }
}
