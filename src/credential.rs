use std::fmt;

use thiserror::Error;
use zeroize::Zeroize;

/// Groq API 키가 반드시 가져야 하는 접두사
pub const API_KEY_PREFIX: &str = "gsk_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("API key is empty")]
    Empty,

    #[error("API key must start with '{expected}' (got '{actual}')")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },
}

/// 로그나 Debug 출력에 값이 노출되지 않는 API 키
///
/// 형식 검사(`gsk_` 접두사)를 통과한 값만 만들어진다. 서버에서 유효한지는 보장하지 않는다.
#[derive(Clone)]
pub struct ApiKey {
    inner: String,
}

impl ApiKey {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(CredentialError::Empty);
        }

        if !trimmed.starts_with(API_KEY_PREFIX) {
            // 접두사 길이만큼만 보여준다
            let actual: String = trimmed.chars().take(API_KEY_PREFIX.len()).collect();
            return Err(CredentialError::InvalidPrefix {
                expected: API_KEY_PREFIX,
                actual,
            });
        }

        Ok(Self {
            inner: trimmed.to_string(),
        })
    }

    /// 실제 요청을 보낼 때만 사용
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED API KEY]")
    }
}

impl Drop for ApiKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_key_with_groq_prefix() {
        let key = ApiKey::parse("gsk_abc123").unwrap();
        assert_eq!(key.as_str(), "gsk_abc123");
        assert_eq!(key.len(), 10);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let key = ApiKey::parse("  gsk_abc123\n").unwrap();
        assert_eq!(key.as_str(), "gsk_abc123");
    }

    #[test]
    fn rejects_empty_and_blank_keys() {
        assert_eq!(ApiKey::parse("").unwrap_err(), CredentialError::Empty);
        assert_eq!(ApiKey::parse("   ").unwrap_err(), CredentialError::Empty);
    }

    #[test]
    fn rejects_keys_without_prefix() {
        for raw in ["sk-abc123", "GSK_abc123", "gsk", "xgsk_abc"] {
            match ApiKey::parse(raw) {
                Err(CredentialError::InvalidPrefix { expected, .. }) => {
                    assert_eq!(expected, "gsk_");
                }
                other => panic!("expected prefix error for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn never_prints_the_secret() {
        let key = ApiKey::parse("gsk_supersecret").unwrap();
        assert!(!format!("{key:?}").contains("supersecret"));
        assert!(!format!("{key}").contains("supersecret"));
    }
}
