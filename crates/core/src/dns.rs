//! DNS RR 타입 테이블
//!
//! Zeek `qtype` 열과 Sysmon QueryResults 파싱에 사용되는 숫자 RR 타입
//! 코드 매핑입니다. 정의는 IANA RR 타입 레지스트리를 따릅니다.

/// RR 타입 이름과 숫자 코드 매핑 (이름 기준 정렬 아님 — 코드 순서)
const DNS_TYPES: &[(&str, u16)] = &[
    ("A", 1),
    ("NS", 2),
    ("MD", 3),
    ("MF", 4),
    ("CNAME", 5),
    ("SOA", 6),
    ("MB", 7),
    ("MG", 8),
    ("MR", 9),
    ("NULL", 10),
    ("PTR", 12),
    ("HINFO", 13),
    ("MINFO", 14),
    ("MX", 15),
    ("TXT", 16),
    ("RP", 17),
    ("AFSDB", 18),
    ("X25", 19),
    ("ISDN", 20),
    ("RT", 21),
    ("NSAPPTR", 23),
    ("SIG", 24),
    ("KEY", 25),
    ("PX", 26),
    ("GPOS", 27),
    ("AAAA", 28),
    ("LOC", 29),
    ("NXT", 30),
    ("EID", 31),
    ("NIMLOC", 32),
    ("SRV", 33),
    ("ATMA", 34),
    ("NAPTR", 35),
    ("KX", 36),
    ("CERT", 37),
    ("DNAME", 39),
    ("OPT", 41),
    ("APL", 42),
    ("DS", 43),
    ("SSHFP", 44),
    ("RRSIG", 46),
    ("NSEC", 47),
    ("DNSKEY", 48),
    ("DHCID", 49),
    ("NSEC3", 50),
    ("NSEC3PARAM", 51),
    ("TLSA", 52),
    ("SMIMEA", 53),
    ("HIP", 55),
    ("NINFO", 56),
    ("RKEY", 57),
    ("TALINK", 58),
    ("CDS", 59),
    ("CDNSKEY", 60),
    ("OPENPGPKEY", 61),
    ("CSYNC", 62),
    ("ZONEMD", 63),
    ("SVCB", 64),
    ("HTTPS", 65),
    ("SPF", 99),
    ("UINFO", 100),
    ("UID", 101),
    ("GID", 102),
    ("UNSPEC", 103),
    ("NID", 104),
    ("L32", 105),
    ("L64", 106),
    ("LP", 107),
    ("EUI48", 108),
    ("EUI64", 109),
    ("URI", 256),
    ("CAA", 257),
    ("AVC", 258),
];

/// RR 타입 이름을 숫자 코드로 변환합니다.
///
/// 알 수 없는 이름이면 `None`을 반환합니다.
pub fn type_name_to_id(name: &str) -> Option<u16> {
    DNS_TYPES
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, id)| *id)
}

/// 숫자 RR 타입 코드를 이름으로 변환합니다.
///
/// 알 수 없는 코드이면 `None`을 반환합니다.
pub fn type_id_to_name(id: u16) -> Option<&'static str> {
    DNS_TYPES
        .iter()
        .find(|(_, entry)| *entry == id)
        .map(|(name, _)| *name)
}
