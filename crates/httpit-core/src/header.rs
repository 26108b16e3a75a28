//! 요청 헤더 목록 파싱.
//!
//! `key:value` 문자열을 정확히 두 필드로 나누고, 키별로 Set(덮어쓰기) 또는
//! Add(추가) 의미를 적용한다. 키 대소문자는 전송 시 그대로 유지한다.

use crate::error::PitError;

/// 덮어쓰기 의미를 갖는 헤더 키 (소문자)
const REPLACE_KEYS: [&str; 6] = [
    "host",
    "content-type",
    "user-agent",
    "content-length",
    "connection",
    "transfer-encoding",
];

/// Set 의미 헤더인지 (대소문자 무시)
pub fn is_replace_key(key: &str) -> bool {
    REPLACE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// `key:value` 목록을 `[k1, v1, k2, v2, ...]`로 분해
///
/// 콜론이 없거나 둘 이상이면 `MalformedHeader`.
pub fn kvs<S: AsRef<str>>(headers: &[S]) -> Result<Vec<String>, PitError> {
    let mut list = Vec::with_capacity(headers.len() * 2);
    for header in headers {
        let header = header.as_ref();
        let mut parts = header.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(k), Some(v), None) => {
                list.push(k.trim().to_string());
                list.push(v.trim().to_string());
            }
            _ => return Err(PitError::MalformedHeader(header.to_string())),
        }
    }
    Ok(list)
}

/// 순서를 보존하는 헤더 집합
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    /// 빈 헤더 집합
    pub fn new() -> Self {
        Self::default()
    }

    /// 헤더 문자열 목록을 파싱해 Set/Add 의미로 적용
    pub fn parse<S: AsRef<str>>(headers: &[S]) -> Result<Self, PitError> {
        let kvs = kvs(headers)?;
        let mut list = Self::new();
        for pair in kvs.chunks_exact(2) {
            let (k, v) = (&pair[0], &pair[1]);
            if is_replace_key(k) {
                list.set(k, v);
            } else {
                list.add(k, v);
            }
        }
        Ok(list)
    }

    /// 같은 키(대소문자 무시)를 모두 지우고 하나로 설정
    pub fn set(&mut self, key: &str, value: &str) {
        match self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some(i) => {
                self.entries[i] = (key.to_string(), value.to_string());
                let mut idx = 0;
                self.entries.retain(|(k, _)| {
                    let keep = idx <= i || !k.eq_ignore_ascii_case(key);
                    idx += 1;
                    keep
                });
            }
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    /// 중복을 허용해 뒤에 추가
    pub fn add(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    /// 첫 번째 값 조회 (대소문자 무시)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 키 제거 후 마지막 값 반환
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let mut removed = None;
        self.entries.retain(|(k, v)| {
            if k.eq_ignore_ascii_case(key) {
                removed = Some(v.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
