//! Redis 소비 루프 — 큐에서 메시지를 blocking-pop
//!
//! 단일 태스크 순차 루프입니다. 큐에서 한 번에 한 메시지를 꺼내
//! (선택적으로) 미러에 전달하고, 디코딩하여 writer에 제출합니다.
//! pop은 1초 타임아웃으로 블록하며, 타임아웃마다 취소 토큰을 재평가해
//! graceful shutdown을 지원합니다.

use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio_util::sync::CancellationToken;
use zeekspool_core::config::{RedisConfig, TlsRuntime};
use zeekspool_core::error::ZeekspoolError;
use zeekspool_core::writer::{DynEcsWriter, JsonWriter};

use crate::decode;
use crate::error::IngestError;

/// 소비 대상 큐 키
pub const QUEUE_KEY: &str = "net-data:sysmon";

/// blocking pop 타임아웃 (초)
const POP_TIMEOUT_SECS: f64 = 1.0;

/// 기본 Redis 포트
const DEFAULT_REDIS_PORT: u16 = 6379;

/// Redis 소비자
pub struct RedisConsumer {
    connection: redis::aio::MultiplexedConnection,
    queue_key: String,
    cancel: CancellationToken,
}

impl RedisConsumer {
    /// Redis에 연결하고 소비자를 생성합니다.
    pub async fn connect(
        config: &RedisConfig,
        tls: Option<&TlsRuntime>,
        cancel: CancellationToken,
    ) -> Result<Self, IngestError> {
        let client = build_client(config, tls)?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| IngestError::Connection {
                reason: e.to_string(),
            })?;

        tracing::info!(host = %config.host, "connected to redis");
        Ok(Self {
            connection,
            queue_key: QUEUE_KEY.to_owned(),
            cancel,
        })
    }

    /// 소비 루프를 실행합니다.
    ///
    /// 취소 토큰이 설정되면 다음 pop 타임아웃에 루프를 빠져나갑니다.
    /// 큐 에러와 치명적 쓰기 에러는 루프를 종료시키며, writer의 Close는
    /// 호출자가 수행합니다.
    pub async fn run<W, M>(
        &mut self,
        writer: &mut W,
        mirror: Option<&M>,
    ) -> Result<(), ZeekspoolError>
    where
        W: DynEcsWriter + ?Sized,
        M: JsonWriter,
    {
        tracing::info!(queue = %self.queue_key, "starting redis consumer loop");

        loop {
            let reply: Option<(String, String)> = self
                .connection
                .blpop(&self.queue_key, POP_TIMEOUT_SECS)
                .await
                .map_err(|e| IngestError::Pop {
                    reason: e.to_string(),
                })?;

            let Some((_, payload)) = reply else {
                if self.cancel.is_cancelled() {
                    tracing::warn!("received exit signal, shutting down");
                    break;
                }
                tracing::trace!("timed out while polling redis for data");
                continue;
            };

            self.process_message(&payload, writer, mirror).await?;
        }

        Ok(())
    }

    /// 메시지 하나를 처리합니다: 미러 전달 → 디코딩 → writer 제출.
    ///
    /// 미러 실패와 잘못된 레코드는 로그 후 계속 진행하며, 치명적 쓰기
    /// 에러만 위로 전파합니다.
    async fn process_message<W, M>(
        &self,
        payload: &str,
        writer: &mut W,
        mirror: Option<&M>,
    ) -> Result<(), ZeekspoolError>
    where
        W: DynEcsWriter + ?Sized,
        M: JsonWriter,
    {
        let metadata = decode::sniff_metadata(payload.as_bytes());

        if let Some(mirror) = mirror {
            let docs = [payload.to_owned()];
            if let Err(e) = mirror.write_ecs_records(&docs, metadata.version()).await {
                tracing::error!(
                    error = %e,
                    input = payload,
                    "could not hand off data to elasticsearch"
                );
            }
        }

        let record = match decode::decode_record(payload.as_bytes(), &metadata) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, input = payload, "could not parse ECS data");
                return Ok(());
            }
        };

        if let Err(e) = writer.write_ecs_records(vec![record]).await {
            if e.is_skippable() {
                tracing::error!(error = %e, input = payload, "could not read malformed ECS data");
                return Ok(());
            }
            tracing::error!(error = %e, "could not write zeek data, shutting down");
            return Err(e);
        }

        Ok(())
    }
}

/// 설정에서 Redis 클라이언트를 구성합니다.
fn build_client(
    config: &RedisConfig,
    tls: Option<&TlsRuntime>,
) -> Result<redis::Client, IngestError> {
    let (host, port) = split_host_port(&config.host)?;

    let addr = match tls {
        Some(runtime) => ConnectionAddr::TcpTls {
            host,
            port,
            insecure: !runtime.verify_certificate,
            tls_params: None,
        },
        None => ConnectionAddr::Tcp(host, port),
    };

    let info = ConnectionInfo {
        addr,
        redis: RedisConnectionInfo {
            username: non_empty(&config.user),
            password: non_empty(&config.password),
            ..Default::default()
        },
    };

    // 커스텀 CA가 있으면 루트 풀을 교체한다
    match tls.and_then(|runtime| runtime.ca_pem.clone()) {
        Some(root_cert) => redis::Client::build_with_tls(
            info,
            redis::TlsCertificates {
                client_tls: None,
                root_cert: Some(root_cert),
            },
        )
        .map_err(|e| IngestError::Connection {
            reason: e.to_string(),
        }),
        None => redis::Client::open(info).map_err(|e| IngestError::Connection {
            reason: e.to_string(),
        }),
    }
}

/// "host:port" 문자열을 분리합니다. 포트가 없으면 기본 포트를 씁니다.
fn split_host_port(host: &str) -> Result<(String, u16), IngestError> {
    if host.is_empty() {
        return Err(IngestError::Connection {
            reason: "redis host is empty".to_owned(),
        });
    }

    match host.rsplit_once(':') {
        Some((name, port)) => {
            let port = port.parse::<u16>().map_err(|_| IngestError::Connection {
                reason: format!("invalid redis port in '{host}'"),
            })?;
            Ok((name.to_owned(), port))
        }
        None => Ok((host.to_owned(), DEFAULT_REDIS_PORT)),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}
