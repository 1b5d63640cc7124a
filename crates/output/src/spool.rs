//! 스풀 파일 관리 — 생성/append 및 gzip 아카이브
//!
//! 스풀 파일은 회전 구간 동안 append되는 작업 파일입니다. 새로 만들 때만
//! Zeek 헤더를 기록하며, 이미 존재하면 (이전 실행이 남긴 파일 포함)
//! 헤더 없이 append 모드로 다시 엽니다.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use zeekspool_core::record::EcsRecord;

use crate::error::OutputError;
use crate::file_type::TsvFileType;

/// 열려 있는 스풀 파일 하나
#[derive(Debug)]
pub(crate) struct Spool {
    /// 스풀 파일 경로
    pub path: PathBuf,
    /// append 모드 파일 핸들
    pub file: File,
}

/// 스풀 파일을 엽니다.
///
/// 파일이 없으면 배타적으로 생성하고 주어진 open 시각으로 Zeek 헤더를
/// 기록합니다. 이미 존재하면 헤더를 다시 쓰지 않고 append 모드로 엽니다.
pub fn open_tsv_file(
    file_type: &dyn TsvFileType,
    file_path: &Path,
    open_time: DateTime<Utc>,
) -> Result<File, OutputError> {
    if let Some(directory) = file_path.parent() {
        std::fs::create_dir_all(directory).map_err(|e| spool_err(file_path, &e))?;
    }

    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(file_path)
    {
        Ok(mut file) => {
            let header = file_type.header().render(open_time);
            file.write_all(header.as_bytes())
                .map_err(|e| spool_err(file_path, &e))?;
            Ok(file)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => OpenOptions::new()
            .append(true)
            .open(file_path)
            .map_err(|e| spool_err(file_path, &e)),
        Err(e) => Err(spool_err(file_path, &e)),
    }
}

/// 레코드들을 해당 파일 타입의 TSV 라인으로 포매팅하여 기록합니다.
///
/// 빈 배치는 no-op입니다. 전체 배치를 먼저 포매팅한 뒤 단일 write
/// 호출로 기록하므로, 포매팅 실패 시 스풀에는 아무것도 남지 않습니다.
pub fn write_tsv_lines(
    file_type: &dyn TsvFileType,
    records: &[&EcsRecord],
    file: &mut File,
) -> Result<(), OutputError> {
    if records.is_empty() {
        return Ok(());
    }

    let lines = file_type.format_lines(records)?;
    file.write_all(lines.as_bytes()).map_err(OutputError::Io)
}

/// `#close` 푸터를 기록합니다.
pub fn write_tsv_footer(
    file_type: &dyn TsvFileType,
    close_time: DateTime<Utc>,
    file: &mut File,
) -> Result<(), OutputError> {
    let footer = file_type.header().render_close(close_time);
    file.write_all(footer.as_bytes()).map_err(OutputError::Io)
}

/// 스풀 파일을 gzip으로 아카이브하고 원본을 삭제합니다.
///
/// 압축된 바이트 수를 반환합니다. 실패 시에도 열린 디스크립터는 모두
/// 닫힙니다.
pub fn archive_spool(spool_path: &Path, archive_path: &Path) -> Result<u64, OutputError> {
    let mut src = File::open(spool_path).map_err(|e| archive_err(archive_path, &e))?;

    if let Some(directory) = archive_path.parent() {
        std::fs::create_dir_all(directory).map_err(|e| archive_err(archive_path, &e))?;
    }

    let gz_file = File::create(archive_path).map_err(|e| archive_err(archive_path, &e))?;
    let mut encoder = GzEncoder::new(gz_file, Compression::default());
    let size = io::copy(&mut src, &mut encoder).map_err(|e| archive_err(archive_path, &e))?;
    encoder
        .finish()
        .map_err(|e| archive_err(archive_path, &e))?;

    std::fs::remove_file(spool_path).map_err(|e| spool_err(spool_path, &e))?;

    Ok(size)
}

fn spool_err(path: &Path, err: &io::Error) -> OutputError {
    OutputError::Spool {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn archive_err(path: &Path, err: &io::Error) -> OutputError {
    OutputError::Archive {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
