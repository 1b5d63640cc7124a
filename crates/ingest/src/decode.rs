//! ECS 메시지 디코딩 — 버전 분기 및 정규화
//!
//! 큐에서 꺼낸 JSON 문서는 먼저 `@metadata` envelope만 살펴 디코딩
//! 경로를 정합니다. 버전이 `'8'`로 시작하면 v8 envelope으로 디코딩한 뒤
//! 정규 레코드로 변환하고, 그 외에는 정규 레코드로 바로 디코딩합니다.

use zeekspool_core::record::{EcsMetadata, EcsRecord};
use zeekspool_core::translate::{translate_v8_record, EcsRecordV8};

use crate::error::IngestError;

/// `@metadata` envelope을 읽습니다.
///
/// envelope이 없거나 JSON이 깨져 있으면 빈 버전을 반환합니다.
/// 깨진 JSON의 실제 에러는 이후 [`decode_record`]에서 보고됩니다.
pub fn sniff_metadata(raw: &[u8]) -> EcsMetadata {
    serde_json::from_slice(raw).unwrap_or_default()
}

/// 원시 JSON 문서를 정규 [`EcsRecord`]로 디코딩합니다.
///
/// # Errors
/// JSON 디코딩 실패는 [`IngestError::Decode`], v8 변환 실패는
/// [`IngestError::Record`]를 반환합니다. 둘 다 스킵 가능한 에러입니다.
pub fn decode_record(raw: &[u8], metadata: &EcsMetadata) -> Result<EcsRecord, IngestError> {
    if metadata.is_v8() {
        let v8: EcsRecordV8 =
            serde_json::from_slice(raw).map_err(|e| IngestError::Decode {
                reason: e.to_string(),
            })?;
        translate_v8_record(&v8).map_err(IngestError::from)
    } else {
        serde_json::from_slice(raw).map_err(|e| IngestError::Decode {
            reason: e.to_string(),
        })
    }
}
