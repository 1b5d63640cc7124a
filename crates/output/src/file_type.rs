//! TSV 파일 타입 레지스트리 및 디스패처
//!
//! [`TsvFileType`]은 하나의 Zeek 파일 타입(헤더, 라우팅 조건, 본문
//! 포매팅)을 기술하는 확장 포인트입니다. 레지스트리는 기동 시
//! [`default_file_types`]로 구성되며 프로세스 수명 동안 불변입니다.
//! 구현체는 모두 상태가 없습니다.

use std::sync::Arc;

use zeekspool_core::error::RecordError;
use zeekspool_core::record::EcsRecord;

use crate::conn::ConnTsv;
use crate::dns::DnsTsv;
use crate::error::OutputError;
use crate::header::TsvHeader;

/// 하나의 Zeek TSV 파일 타입
pub trait TsvFileType: Send + Sync {
    /// 이 파일 타입의 형식 기술자를 반환합니다. 순수 함수입니다.
    fn header(&self) -> TsvHeader;

    /// 주어진 레코드가 이 파일 타입의 라인으로 포매팅될 수 있는지
    /// 확인합니다. 여러 타입이 같은 레코드를 처리할 수 있습니다.
    fn handles_ecs_record(&self, record: &EcsRecord) -> bool;

    /// 레코드들을 이 파일 타입의 TSV 라인으로 포매팅합니다.
    ///
    /// 각 라인은 `\n`으로 끝나며, 반환 문자열은 라인들의 연결입니다.
    ///
    /// # Errors
    /// 타임스탬프가 RFC3339Nano로 파싱되지 않으면
    /// [`OutputError::Malformed`]를 반환하고 배치를 중단합니다.
    fn format_lines(&self, records: &[&EcsRecord]) -> Result<String, OutputError>;
}

/// 기본 파일 타입 레지스트리를 구성합니다.
///
/// 순서는 고정이며 (conn, dns) 디스패처의 버킷 순서가 됩니다.
pub fn default_file_types() -> Vec<Arc<dyn TsvFileType>> {
    vec![Arc::new(ConnTsv), Arc::new(DnsTsv)]
}

/// 레코드들을 파일 타입별 버킷으로 분배합니다.
///
/// 반환 벡터는 `file_types`와 나란히 대응하며, 버킷 내부 순서는 입력
/// 순서를 따릅니다. 하나의 레코드가 여러 타입의 조건을 만족하면 각
/// 버킷에 모두 들어갑니다.
pub fn map_ecs_records_to_tsv_files<'a>(
    file_types: &[Arc<dyn TsvFileType>],
    records: &'a [EcsRecord],
) -> Vec<Vec<&'a EcsRecord>> {
    let mut buckets: Vec<Vec<&EcsRecord>> = vec![Vec::new(); file_types.len()];
    for record in records {
        for (idx, file_type) in file_types.iter().enumerate() {
            if file_type.handles_ecs_record(record) {
                buckets[idx].push(record);
            }
        }
    }
    buckets
}

/// `@timestamp`를 epoch 초의 소수점 6자리 고정 표기로 포매팅합니다.
///
/// 다운스트림 소비자가 `.` 기준으로 분할하므로 지수 표기 없이 항상
/// 소수점 여섯 자리를 유지해야 합니다.
pub(crate) fn format_epoch_ts(record: &EcsRecord) -> Result<String, OutputError> {
    let parsed = record.rfc3339_timestamp().map_err(OutputError::Malformed)?;
    let nanos = parsed
        .timestamp_nanos_opt()
        .ok_or_else(|| {
            OutputError::Malformed(RecordError::MalformedTimestamp {
                value: record.timestamp.clone(),
            })
        })?;
    Ok(format!("{:.6}", nanos as f64 / 1e9))
}
