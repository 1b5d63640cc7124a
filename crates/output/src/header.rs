//! Zeek TSV 헤더 모델
//!
//! [`TsvHeader`]는 하나의 Zeek TSV 파일 타입의 형식을 기술하는 불변
//! 구조체입니다. `separator` 필드는 파일에 그대로 기록되는 이스케이프
//! 리터럴(`\x09`)이며, 실제 필드 구분 바이트는 이를 풀어낸 탭입니다.

use chrono::{DateTime, Utc};

/// `#open`/`#close` 타임스탬프 형식
const HEADER_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// 하나의 Zeek TSV 파일 타입 형식 기술자
///
/// 불변식: `fields.len() == types.len()`, `path`는 확장자 없는 파일명.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvHeader {
    /// `#separator` 지시문에 기록되는 이스케이프 리터럴 (예: "\\x09")
    pub separator: &'static str,
    /// set 값 구분자 (예: ",")
    pub set_separator: &'static str,
    /// 빈 집합 표기 (예: "(empty)")
    pub empty_field: &'static str,
    /// 값 부재 표기 (예: "-")
    pub unset_field: &'static str,
    /// 파일명 stem (예: "conn")
    pub path: &'static str,
    /// 열 이름 목록
    pub fields: &'static [&'static str],
    /// 열 타입 목록 (fields와 길이 동일)
    pub types: &'static [&'static str],
}

impl TsvHeader {
    /// 이스케이프 리터럴을 실제 구분 문자로 풀어냅니다.
    pub fn separator_byte(&self) -> String {
        unescape_separator(self.separator)
    }

    /// Zeek TSV 헤더 블록을 렌더링합니다.
    ///
    /// `#separator` 줄만 공백 한 칸으로 구분되며 (이스케이프 리터럴이
    /// 해석되지 않고 표시되어야 하므로), 나머지 지시문은 풀어낸 구분
    /// 문자를 사용합니다.
    pub fn render(&self, open_time: DateTime<Utc>) -> String {
        let sep = self.separator_byte();
        let mut out = String::with_capacity(512);

        out.push_str(&format!("#separator {}\n", self.separator));
        out.push_str(&format!("#set_separator{sep}{}\n", self.set_separator));
        out.push_str(&format!("#empty_field{sep}{}\n", self.empty_field));
        out.push_str(&format!("#unset_field{sep}{}\n", self.unset_field));
        out.push_str(&format!("#path{sep}{}\n", self.path));
        out.push_str(&format!(
            "#open{sep}{}\n",
            open_time.format(HEADER_TIME_FORMAT)
        ));
        out.push_str(&format!("#fields{sep}{}\n", self.fields.join(&sep)));
        out.push_str(&format!("#types{sep}{}\n", self.types.join(&sep)));
        out
    }

    /// 파일 끝에 기록되는 `#close` 푸터를 렌더링합니다.
    pub fn render_close(&self, close_time: DateTime<Utc>) -> String {
        format!(
            "#close{}{}\n",
            self.separator_byte(),
            close_time.format(HEADER_TIME_FORMAT)
        )
    }
}

/// `\xNN` 형태의 이스케이프 리터럴을 해당 문자로 풀어냅니다.
///
/// 알 수 없는 형태는 리터럴 그대로 반환합니다.
fn unescape_separator(literal: &str) -> String {
    if let Some(hex) = literal.strip_prefix("\\x") {
        if let Ok(byte) = u8::from_str_radix(hex, 16) {
            return (byte as char).to_string();
        }
    }
    literal.to_owned()
}
