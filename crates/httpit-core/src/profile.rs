//! 실행 프로파일 로드.
//!
//! TOML/JSON/YAML 프로파일 파일(선택)과 `HTTPIT_` 접두 환경변수를 `config`
//! crate로 병합해 [`BenchConfig`]를 만든다. CLI 플래그는 그 위에 덮어쓴다.

use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

use crate::config::BenchConfig;
use crate::error::PitError;

/// 환경변수 접두어
pub const ENV_PREFIX: &str = "HTTPIT";

/// 프로파일 파일 + 환경변수에서 설정 로드
///
/// 파일이 없으면(`None`) 환경변수와 기본값만 사용한다.
pub fn load_profile(path: Option<&Path>) -> Result<BenchConfig, PitError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(PitError::Config(format!(
                "프로파일 파일 없음: {}",
                path.display()
            )));
        }
        debug!("프로파일 로드: {}", path.display());
        builder = builder.add_source(File::from(path));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("headers")
            .with_list_parse_key("args"),
    );

    builder
        .build()
        .and_then(|c| c.try_deserialize::<BenchConfig>())
        .map_err(|e| PitError::Config(format!("프로파일 파싱 실패: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn load_toml_profile() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
url = "http://127.0.0.1:8080/ping"
connections = 16
duration = "2s"
headers = ["x-run: smoke"]
pipeline = true
"#
        )
        .unwrap();

        let config = load_profile(Some(file.path())).unwrap();
        assert_eq!(config.url, "http://127.0.0.1:8080/ping");
        assert_eq!(config.connections, 16);
        assert_eq!(config.duration, Duration::from_secs(2));
        assert_eq!(config.headers, vec!["x-run: smoke".to_string()]);
        assert!(config.pipeline);
        // 지정하지 않은 필드는 기본값
        assert_eq!(config.timeout, crate::config::DEFAULT_TIMEOUT);
    }

    #[test]
    fn missing_profile_file() {
        let err = load_profile(Some(Path::new("/nonexistent/httpit.toml"))).unwrap_err();
        assert!(matches!(err, PitError::Config(_)));
    }

    #[test]
    fn defaults_without_profile() {
        let config = load_profile(None).unwrap();
        assert_eq!(config.connections, crate::config::DEFAULT_CONNECTIONS);
    }
}
