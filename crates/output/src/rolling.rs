//! 롤링 Writer — 벽시계 정렬 회전 및 gzip 아카이브
//!
//! [`RollingWriter`]는 레코드를 스풀 파일에 계속 기록하다가 매 정시
//! (디버그 시 매 정분)에 푸터를 쓰고 gzip 아카이브한 뒤 새 스풀로
//! 교체합니다. 쓰기와 회전은 스풀 세트를 감싼 단일 뮤텍스로 직렬화되어,
//! 진행 중인 쓰기가 반쯤 회전된 스풀 세트를 관찰하는 일이 없습니다.
//!
//! 예약된 회전이 실패하면 스케줄러를 멈추고 crash 콜백을 호출하여
//! 호스트 프로세스의 전역 종료를 요청합니다.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use zeekspool_core::error::ZeekspoolError;
use zeekspool_core::record::EcsRecord;
use zeekspool_core::writer::EcsWriter;

use crate::error::OutputError;
use crate::file_type::{default_file_types, map_ecs_records_to_tsv_files, TsvFileType};
use crate::spool::{archive_spool, open_tsv_file, write_tsv_footer, write_tsv_lines, Spool};

/// 회전 주기
///
/// 분 단위 회전은 디버깅 보조 수단입니다. 아카이브 파일명이 주기 경계와
/// 일치해야 하므로 회전은 항상 벽시계 경계(0초/0분)에 맞춰 수행됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPeriod {
    /// 매 정시 회전 (기본)
    Hourly,
    /// 매 정분 회전 (디버그)
    Minutely,
}

impl RotationPeriod {
    fn delta(&self) -> TimeDelta {
        match self {
            Self::Hourly => TimeDelta::hours(1),
            Self::Minutely => TimeDelta::minutes(1),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Minutely => "minutely",
        }
    }
}

/// 다음 회전 시각(벽시계 경계)을 계산합니다.
pub(crate) fn next_rotation(now: DateTime<Utc>, period: RotationPeriod) -> DateTime<Utc> {
    let delta = period.delta();
    match now.duration_trunc(delta) {
        Ok(truncated) => truncated + delta,
        Err(_) => now + delta,
    }
}

/// 파일 타입별 스풀 세트 — 회전 뮤텍스가 보호하는 공유 상태
struct SpoolSet {
    archive_dir: PathBuf,
    spool_dir: PathBuf,
    period: RotationPeriod,
    file_types: Vec<Arc<dyn TsvFileType>>,
    spools: Vec<Option<Spool>>,
}

impl SpoolSet {
    fn open(
        archive_dir: PathBuf,
        period: RotationPeriod,
        file_types: Vec<Arc<dyn TsvFileType>>,
    ) -> Result<Self, OutputError> {
        let spool_dir = archive_dir.join("ecs-spool");

        let mut spools = Vec::with_capacity(file_types.len());
        for file_type in &file_types {
            let path = spool_dir.join(format!("{}.log", file_type.header().path));
            let file = open_tsv_file(file_type.as_ref(), &path, Utc::now())?;
            spools.push(Some(Spool { path, file }));
        }

        Ok(Self {
            archive_dir,
            spool_dir,
            period,
            file_types,
            spools,
        })
    }

    fn write_records(&mut self, records: &[EcsRecord]) -> Result<(), OutputError> {
        tracing::debug!(count = records.len(), "writing records");

        let buckets = map_ecs_records_to_tsv_files(&self.file_types, records);
        for (idx, bucket) in buckets.iter().enumerate() {
            let file_type = Arc::clone(&self.file_types[idx]);
            let Some(spool) = self.spools[idx].as_mut() else {
                return Err(OutputError::Spool {
                    path: self.spool_dir.display().to_string(),
                    reason: "spool already closed".to_owned(),
                });
            };
            write_tsv_lines(file_type.as_ref(), bucket, &mut spool.file)?;
        }
        Ok(())
    }

    /// 모든 스풀을 회전합니다: 푸터 기록, 닫기, gzip 아카이브, 삭제,
    /// 계속 실행 중이면 새 스풀 재생성.
    ///
    /// 실패 시 해당 사이클의 나머지는 중단되며 부분 커밋은 없습니다.
    fn rotate(&mut self, close_time: DateTime<Utc>, closing: bool) -> Result<(), OutputError> {
        if closing {
            tracing::debug!("closing files");
        } else {
            tracing::debug!("about to rotate logs");
        }

        for idx in 0..self.file_types.len() {
            let file_type = Arc::clone(&self.file_types[idx]);
            let Some(spool) = self.spools[idx].take() else {
                continue;
            };
            let Spool { path, mut file } = spool;

            write_tsv_footer(file_type.as_ref(), close_time, &mut file)?;
            drop(file);

            let archive_path = self.archive_path(file_type.header().path, close_time);
            let size = archive_spool(&path, &archive_path)?;
            tracing::info!(path = %archive_path.display(), size, "log written");

            if !closing {
                let file = open_tsv_file(file_type.as_ref(), &path, close_time)?;
                self.spools[idx] = Some(Spool { path, file });
                tracing::debug!(spool_dir = %self.spool_dir.display(), "re-created spool file");
            }
        }
        Ok(())
    }

    /// 회전된 구간의 아카이브 경로를 계산합니다.
    ///
    /// 파일명의 두 타임스탬프는 구간의 시작과 끝이며 주기 경계에
    /// 정렬됩니다 (예: `conn.16:00:00-17:00:00.log.gz`).
    fn archive_path(&self, file_path: &str, close_time: DateTime<Utc>) -> PathBuf {
        let (start, start_format, close_format) = match self.period {
            RotationPeriod::Hourly => (close_time - TimeDelta::hours(1), "%H:00:00", "%H:00:00"),
            RotationPeriod::Minutely => {
                (close_time - TimeDelta::minutes(1), "%H:%M:00", "%H:%M:%S")
            }
        };

        self.archive_dir
            .join(start.format("%Y-%m-%d").to_string())
            .join(format!(
                "{}.{}-{}.log.gz",
                file_path,
                start.format(start_format),
                close_time.format(close_format),
            ))
    }
}

/// 연속 실행용 롤링 writer
///
/// 생성 시 스풀을 열고 회전 스케줄러 태스크를 시작합니다. 회전 실패 시
/// `crash_callback`이 호출되며, 호스트는 이를 통해 전역 취소를
/// 트리거합니다.
pub struct RollingWriter {
    inner: Arc<Mutex<SpoolSet>>,
    cancel: CancellationToken,
    scheduler: Option<JoinHandle<()>>,
}

impl RollingWriter {
    /// 대상 디렉토리 아래에 스풀을 열고 스케줄러를 시작합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn create(
        tgt_dir: impl Into<PathBuf>,
        period: RotationPeriod,
        crash_callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, OutputError> {
        Self::with_file_types(tgt_dir, period, default_file_types(), crash_callback)
    }

    pub(crate) fn with_file_types(
        tgt_dir: impl Into<PathBuf>,
        period: RotationPeriod,
        file_types: Vec<Arc<dyn TsvFileType>>,
        crash_callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, OutputError> {
        let set = SpoolSet::open(tgt_dir.into(), period, file_types)?;
        tracing::info!(
            spool_dir = %set.spool_dir.display(),
            period = period.describe(),
            "initialized rolling file writer"
        );

        let inner = Arc::new(Mutex::new(set));
        let cancel = CancellationToken::new();
        let scheduler = tokio::spawn(rotation_task(
            Arc::clone(&inner),
            period,
            cancel.clone(),
            Arc::new(crash_callback),
        ));

        Ok(Self {
            inner,
            cancel,
            scheduler: Some(scheduler),
        })
    }
}

/// 벽시계 경계까지 잠들었다가 회전을 수행하는 스케줄러 태스크
async fn rotation_task(
    inner: Arc<Mutex<SpoolSet>>,
    period: RotationPeriod,
    cancel: CancellationToken,
    crash_callback: Arc<dyn Fn() + Send + Sync>,
) {
    loop {
        let now = Utc::now();
        let next = next_rotation(now, period);
        let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let mut set = inner.lock().await;
                if let Err(e) = set.rotate(Utc::now(), false) {
                    tracing::error!(
                        error = %e,
                        fatal = true,
                        "could not perform scheduled log rotation"
                    );
                    crash_callback();
                    break;
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

impl EcsWriter for RollingWriter {
    async fn write_ecs_records(&mut self, records: Vec<EcsRecord>) -> Result<(), ZeekspoolError> {
        let mut set = self.inner.lock().await;
        set.write_records(&records).map_err(ZeekspoolError::from)
    }

    async fn close(&mut self) -> Result<(), ZeekspoolError> {
        // 스케줄러를 먼저 세워 회전과 Close가 겹치지 않게 한다
        self.cancel.cancel();
        if let Some(task) = self.scheduler.take() {
            let _ = task.await;
        }

        let mut set = self.inner.lock().await;
        set.rotate(Utc::now(), true).map_err(ZeekspoolError::from)
    }
}
