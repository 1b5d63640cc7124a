//! 설정 관리 — espy.yaml 파싱 및 런타임 설정
//!
//! 정적 설정은 YAML 파일에서 읽고, 모든 문자열 필드에 환경 변수 확장을
//! 적용합니다. TLS 자료(CA PEM)는 로드 시점에 한 번 읽어
//! [`TlsRuntime`]으로 보관하며, 이후 Redis/Elasticsearch 클라이언트
//! 빌드에 사용됩니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "/etc/espy/espy.yaml";

/// 로드 완료된 전체 설정
///
/// YAML에서 읽은 정적 설정과, 그로부터 파생된 런타임 TLS 자료를
/// 함께 담습니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis 큐 설정
    pub redis: RedisConfig,
    /// Elasticsearch 미러 설정 (Host가 비어 있으면 미러 비활성)
    pub elasticsearch: ElasticConfig,
    /// Zeek 출력 설정
    pub zeek: ZeekConfig,
    /// 로그 레벨 (logrus 호환 정수, 기본 3 = warn)
    pub log_level: i32,
    /// Redis TLS 런타임 자료 (TLS 비활성 시 None)
    pub redis_tls: Option<TlsRuntime>,
    /// Elasticsearch TLS 런타임 자료 (TLS 비활성 시 None)
    pub elastic_tls: Option<TlsRuntime>,
}

impl Config {
    /// 설정 파일을 로드합니다.
    ///
    /// `custom_path`가 `None`이면 [`DEFAULT_CONFIG_PATH`]를 사용합니다.
    pub fn load(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = custom_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ParseFailed {
                    reason: format!("{}: {e}", path.display()),
                }
            }
        })?;

        Self::parse(&contents)
    }

    /// YAML 문자열에서 설정을 파싱합니다.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut static_cfg: StaticConfig =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseFailed {
                reason: e.to_string(),
            })?;

        static_cfg.expand_env();
        static_cfg.clean_paths();
        static_cfg.validate()?;

        let redis_tls = TlsRuntime::from_static(&static_cfg.redis.tls);
        let elastic_tls = TlsRuntime::from_static(&static_cfg.elasticsearch.tls);

        Ok(Self {
            redis: static_cfg.redis,
            elasticsearch: static_cfg.elasticsearch,
            zeek: static_cfg.zeek,
            log_level: static_cfg.log_level,
            redis_tls,
            elastic_tls,
        })
    }
}

/// YAML 파일 형태 그대로의 정적 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StaticConfig {
    /// Redis 큐 설정
    #[serde(rename = "Redis", default)]
    redis: RedisConfig,
    /// Elasticsearch 미러 설정
    #[serde(rename = "Elasticsearch", default)]
    elasticsearch: ElasticConfig,
    /// Zeek 출력 설정
    #[serde(rename = "Zeek", default)]
    zeek: ZeekConfig,
    /// 로그 레벨
    #[serde(rename = "LogLevel", default = "default_log_level")]
    log_level: i32,
}

impl StaticConfig {
    /// 모든 문자열 필드에 환경 변수 확장을 적용합니다.
    fn expand_env(&mut self) {
        for field in [
            &mut self.redis.host,
            &mut self.redis.user,
            &mut self.redis.password,
            &mut self.redis.tls.ca_file,
            &mut self.elasticsearch.host,
            &mut self.elasticsearch.user,
            &mut self.elasticsearch.password,
            &mut self.elasticsearch.tls.ca_file,
            &mut self.zeek.path,
        ] {
            *field = expand_env(field);
        }
    }

    /// 경로 필드를 정규화합니다.
    fn clean_paths(&mut self) {
        for field in [
            &mut self.zeek.path,
            &mut self.redis.tls.ca_file,
            &mut self.elasticsearch.tls.ca_file,
        ] {
            *field = clean_path(field);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redis.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "Redis.Host".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.zeek.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "Zeek.Path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Redis 큐 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis 호스트 (host:port)
    #[serde(rename = "Host", default)]
    pub host: String,
    /// 인증 사용자
    #[serde(rename = "User", default)]
    pub user: String,
    /// 인증 비밀번호
    #[serde(rename = "Password", default)]
    pub password: String,
    /// TLS 설정
    #[serde(rename = "TLS", default)]
    pub tls: TlsConfig,
}

/// Elasticsearch 미러 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElasticConfig {
    /// Elasticsearch 호스트 (비어 있으면 미러 비활성)
    #[serde(rename = "Host", default)]
    pub host: String,
    /// 인증 사용자
    #[serde(rename = "User", default)]
    pub user: String,
    /// 인증 비밀번호
    #[serde(rename = "Password", default)]
    pub password: String,
    /// TLS 설정
    #[serde(rename = "TLS", default)]
    pub tls: TlsConfig,
}

/// Zeek 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeekConfig {
    /// 로그 출력 디렉토리
    #[serde(rename = "Path", default = "default_zeek_path")]
    pub path: String,
    /// 로그 회전 여부 (false면 단일 파일로 출력)
    #[serde(rename = "Rotate", default = "default_true")]
    pub rotate: bool,
}

impl Default for ZeekConfig {
    fn default() -> Self {
        Self {
            path: default_zeek_path(),
            rotate: true,
        }
    }
}

/// TLS 정적 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// TLS 사용 여부
    #[serde(rename = "Enable", default)]
    pub enabled: bool,
    /// 서버 인증서 검증 여부
    #[serde(rename = "VerifyCertificate", default)]
    pub verify_certificate: bool,
    /// CA 인증서 파일 경로 (비어 있으면 시스템 풀 사용)
    #[serde(rename = "CAFile", default)]
    pub ca_file: String,
}

/// 런타임 TLS 자료
///
/// CA 파일이 존재하는 일반 파일이면 그 PEM이 루트 풀을 대체하고,
/// 읽을 수 없으면 시스템 풀로 폴백합니다.
#[derive(Debug, Clone)]
pub struct TlsRuntime {
    /// 서버 인증서 검증 여부
    pub verify_certificate: bool,
    /// 커스텀 CA PEM (None이면 시스템 풀)
    pub ca_pem: Option<Vec<u8>>,
}

impl TlsRuntime {
    /// 정적 TLS 설정에서 런타임 자료를 구성합니다.
    ///
    /// TLS가 비활성이면 `None`을 반환합니다.
    fn from_static(tls: &TlsConfig) -> Option<Self> {
        if !tls.enabled {
            return None;
        }

        let ca_pem = match std::fs::metadata(&tls.ca_file) {
            Ok(meta) if meta.is_file() => match std::fs::read(&tls.ca_file) {
                Ok(pem) => Some(pem),
                Err(e) => {
                    tracing::warn!(
                        file = %tls.ca_file,
                        error = %e,
                        "could not read CA file, falling back to system roots"
                    );
                    None
                }
            },
            _ => {
                if !tls.ca_file.is_empty() {
                    tracing::warn!(
                        file = %tls.ca_file,
                        "CA file is not a regular file, falling back to system roots"
                    );
                }
                None
            }
        };

        Some(Self {
            verify_certificate: tls.verify_certificate,
            ca_pem,
        })
    }
}

fn default_log_level() -> i32 {
    3
}

fn default_zeek_path() -> String {
    "/opt/zeek/logs".to_owned()
}

fn default_true() -> bool {
    true
}

/// `$VAR` 및 `${VAR}` 형태의 환경 변수를 확장합니다.
///
/// 설정되지 않은 변수는 빈 문자열로 치환됩니다.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();

    while let Some((idx, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let rest = &input[idx + 1..];
        if let Some(stripped) = rest.strip_prefix('{') {
            // ${VAR}
            if let Some(end) = stripped.find('}') {
                let name = &stripped[..end];
                out.push_str(&std::env::var(name).unwrap_or_default());
                for _ in 0..name.chars().count() + 2 {
                    chars.next();
                }
                continue;
            }
            out.push(ch);
        } else {
            // $VAR
            let name_len = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .count();
            if name_len == 0 {
                out.push(ch);
                continue;
            }
            let name = &rest[..name_len];
            out.push_str(&std::env::var(name).unwrap_or_default());
            for _ in 0..name_len {
                chars.next();
            }
        }
    }

    out
}

/// 경로 문자열에서 중복 구분자와 `.` 컴포넌트를 제거합니다.
fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let cleaned: PathBuf = Path::new(path).components().collect();
    cleaned.display().to_string()
}
