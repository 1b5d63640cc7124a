//! Writer trait — 출력 모듈의 확장 포인트
//!
//! [`EcsWriter`]는 정규화된 레코드를 받는 출력 인터페이스이며,
//! [`JsonWriter`]는 원시 JSON 문서를 받는 미러 인터페이스입니다.
//! `EcsWriter`는 RPITIT를 사용하므로 trait object가 필요한 곳에서는
//! [`DynEcsWriter`]를 사용합니다 (blanket impl로 자동 구현).

use std::future::Future;
use std::pin::Pin;

use crate::error::ZeekspoolError;
use crate::record::EcsRecord;

/// dyn-compatible Future 타입 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 정규화된 ECS 레코드를 출력하는 trait
///
/// # 구현 예시
/// ```ignore
/// struct NullWriter;
///
/// impl EcsWriter for NullWriter {
///     async fn write_ecs_records(&mut self, _records: Vec<EcsRecord>) -> Result<(), ZeekspoolError> {
///         Ok(())
///     }
///
///     async fn close(&mut self) -> Result<(), ZeekspoolError> {
///         Ok(())
///     }
/// }
/// ```
pub trait EcsWriter: Send + Sync {
    /// 레코드 배치를 출력합니다.
    ///
    /// 잘못된 레코드가 포함되어 있으면
    /// [`ZeekspoolError::Record`]를 반환하며, 호출자는 이를 스킵 가능한
    /// 에러로 처리할 수 있습니다.
    fn write_ecs_records(
        &mut self,
        records: Vec<EcsRecord>,
    ) -> impl Future<Output = Result<(), ZeekspoolError>> + Send;

    /// Writer를 닫고 보유한 리소스를 정리합니다.
    fn close(&mut self) -> impl Future<Output = Result<(), ZeekspoolError>> + Send;
}

/// dyn-compatible ECS writer trait
///
/// `EcsWriter`는 RPITIT를 사용하므로 `dyn EcsWriter`가 불가합니다.
/// `DynEcsWriter`는 `BoxFuture`를 반환하여 `Box<dyn DynEcsWriter>`로
/// writer를 동적으로 선택할 수 있게 합니다.
pub trait DynEcsWriter: Send + Sync {
    /// 레코드 배치를 출력합니다.
    fn write_ecs_records(
        &mut self,
        records: Vec<EcsRecord>,
    ) -> BoxFuture<'_, Result<(), ZeekspoolError>>;

    /// Writer를 닫습니다.
    fn close(&mut self) -> BoxFuture<'_, Result<(), ZeekspoolError>>;
}

impl<T: EcsWriter> DynEcsWriter for T {
    fn write_ecs_records(
        &mut self,
        records: Vec<EcsRecord>,
    ) -> BoxFuture<'_, Result<(), ZeekspoolError>> {
        Box::pin(EcsWriter::write_ecs_records(self, records))
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), ZeekspoolError>> {
        Box::pin(EcsWriter::close(self))
    }
}

/// 원시 JSON 문서를 출력하는 trait
///
/// Elasticsearch 미러가 구현합니다. 문서는 디코딩 없이 그대로 전달되며,
/// beats 버전 문자열로 대상 인덱스를 결정합니다.
pub trait JsonWriter: Send + Sync {
    /// 원시 JSON 문서들을 출력합니다.
    fn write_ecs_records(
        &self,
        raw_docs: &[String],
        beats_version: &str,
    ) -> impl Future<Output = Result<(), ZeekspoolError>> + Send;

    /// Writer를 닫습니다.
    fn close(&self) -> impl Future<Output = Result<(), ZeekspoolError>> + Send;
}
