//! TLS 커넥터 구성 (native-tls).
//!
//! 클라이언트 인증서는 PEM 인증서 + PKCS#8 PEM 개인키 쌍이다.
//! 파일 읽기 실패는 `Io`, 인증서/키 해석 실패는 `Tls`로 생성 시점에 실패한다.

use httpit_core::config::BenchConfig;
use httpit_core::error::PitError;
use native_tls::Identity;
use std::fs;
use tokio_native_tls::TlsConnector;

/// 설정으로 TLS 커넥터 생성
pub fn build_connector(config: &BenchConfig) -> Result<TlsConnector, PitError> {
    let mut builder = native_tls::TlsConnector::builder();

    if config.insecure {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    match (&config.cert, &config.key) {
        (Some(cert), Some(key)) => {
            let cert = fs::read(cert)?;
            let key = fs::read(key)?;
            let identity = Identity::from_pkcs8(&cert, &key)
                .map_err(|e| PitError::Tls(format!("클라이언트 인증서 로드 실패: {e}")))?;
            builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(PitError::Tls(
                "cert와 key는 함께 지정해야 함".to_string(),
            ))
        }
    }

    let connector = builder
        .build()
        .map_err(|e| PitError::Tls(format!("TLS 커넥터 생성 실패: {e}")))?;
    Ok(TlsConnector::from(connector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_connector() {
        let config = BenchConfig::for_url("https://example.com");
        assert!(build_connector(&config).is_ok());

        let config = BenchConfig {
            insecure: true,
            ..BenchConfig::for_url("https://example.com")
        };
        assert!(build_connector(&config).is_ok());
    }

    #[test]
    fn missing_cert_file_is_io_error() {
        let config = BenchConfig {
            cert: Some("/nonexistent/cert.pem".into()),
            key: Some("/nonexistent/key.pem".into()),
            ..BenchConfig::for_url("https://example.com")
        };
        let err = build_connector(&config).unwrap_err();
        assert!(matches!(err, PitError::Io(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn garbage_cert_is_tls_error() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(b"not a certificate").unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        key.write_all(b"not a key").unwrap();

        let config = BenchConfig {
            cert: Some(cert.path().to_path_buf()),
            key: Some(key.path().to_path_buf()),
            ..BenchConfig::for_url("https://example.com")
        };
        let err = build_connector(&config).unwrap_err();
        assert!(matches!(err, PitError::Tls(_)));
    }

    #[test]
    fn cert_without_key() {
        let config = BenchConfig {
            cert: Some("/tmp/cert.pem".into()),
            ..BenchConfig::for_url("https://example.com")
        };
        assert!(matches!(
            build_connector(&config).unwrap_err(),
            PitError::Tls(_)
        ));
    }
}
