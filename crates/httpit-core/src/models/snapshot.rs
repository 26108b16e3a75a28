//! 집계 스냅샷과 최종 통계.
//!
//! 집계기 락 밖으로 복사된 읽기 전용 값이다. 리포터는 실행 중(진행 로그)과
//! 종료 후(최종 리포트) 모두 이 타입만 본다.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use super::outcome::StatusClass;

/// 상태 코드 분류별 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeCounts {
    pub code1xx: u64,
    pub code2xx: u64,
    pub code3xx: u64,
    pub code4xx: u64,
    pub code5xx: u64,
    pub other: u64,
}

impl CodeCounts {
    pub fn increment(&mut self, status: u16) {
        let slot = match StatusClass::of(status) {
            StatusClass::Informational => &mut self.code1xx,
            StatusClass::Success => &mut self.code2xx,
            StatusClass::Redirection => &mut self.code3xx,
            StatusClass::ClientError => &mut self.code4xx,
            StatusClass::ServerError => &mut self.code5xx,
            StatusClass::Other => &mut self.other,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.code1xx + self.code2xx + self.code3xx + self.code4xx + self.code5xx + self.other
    }
}

/// 표본 통계 (평균, 표본 표준편차, 최대)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SampleStats {
    pub mean: f64,
    pub stdev: f64,
    pub max: f64,
}

impl SampleStats {
    /// 표본이 없으면 모두 0, 2개 미만이면 stdev 0
    pub fn compute(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let max = samples.iter().copied().fold(f64::MIN, f64::max);
        let stdev = if samples.len() < 2 {
            0.0
        } else {
            let sq: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
            (sq / (n - 1.0)).sqrt()
        };
        Self { mean, stdev, max }
    }
}

/// 실행 중 진행 상황 (가벼운 뷰)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: u64,
    pub errors: u64,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub bytes: u64,
    pub done: bool,
}

/// 집계 스냅샷
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// 완료된(응답을 받은) 요청 수
    pub total: u64,
    /// 라운드 시간의 합 (벽시계 아님)
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub codes: CodeCounts,
    /// 지연 표본 (µs)
    pub latencies: Vec<u64>,
    /// 라운드별 RPS 표본
    pub rps: Vec<f64>,
    /// 에러 메시지 → 발생 횟수
    pub errors: HashMap<String, u64>,
    /// 읽기+쓰기 누적 바이트
    pub bytes: u64,
    pub done: bool,
}

impl Snapshot {
    pub fn rps_stats(&self) -> SampleStats {
        SampleStats::compute(&self.rps)
    }

    /// 지연 통계 (ms)
    pub fn latency_stats(&self) -> SampleStats {
        let ms: Vec<f64> = self.latencies.iter().map(|&us| us as f64 / 1000.0).collect();
        SampleStats::compute(&ms)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.values().sum()
    }

    /// 에러 목록 (횟수 내림차순, 같으면 메시지 순)
    pub fn sorted_errors(&self) -> Vec<(&str, u64)> {
        let mut errors: Vec<(&str, u64)> =
            self.errors.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        errors
    }

    /// 누적 바이트 / 누적 경과 초
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }
}

/// 처리량을 사람이 읽는 단위로 포맷 (1e3/1e6/1e9 경계)
pub fn format_throughput(bytes_per_sec: f64) -> String {
    if bytes_per_sec < 1e3 {
        format!("{bytes_per_sec:.2} B/s")
    } else if bytes_per_sec < 1e6 {
        format!("{:.2} KB/s", bytes_per_sec / 1e3)
    } else if bytes_per_sec < 1e9 {
        format!("{:.2} MB/s", bytes_per_sec / 1e6)
    } else {
        format!("{:.2} GB/s", bytes_per_sec / 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stats_law() {
        let stats = SampleStats::compute(&[1.0, 6.0, 5.0, 7.0, 9.0, 8.0]);
        assert!((stats.mean - 6.0).abs() < 1e-9);
        assert!((stats.stdev - 2.828427).abs() < 1e-6);
        assert!((stats.max - 9.0).abs() < 1e-9);
    }

    #[test]
    fn sample_stats_small_inputs() {
        assert_eq!(SampleStats::compute(&[]), SampleStats::default());
        let one = SampleStats::compute(&[4.0]);
        assert_eq!(one.mean, 4.0);
        assert_eq!(one.stdev, 0.0);
        assert_eq!(one.max, 4.0);
    }

    #[test]
    fn latency_stats_in_millis() {
        let snapshot = Snapshot {
            latencies: vec![1000, 6000, 5000, 7000, 9000, 8000],
            ..Snapshot::default()
        };
        let stats = snapshot.latency_stats();
        assert!((stats.mean - 6.0).abs() < 1e-9);
        assert!((stats.max - 9.0).abs() < 1e-9);
    }

    #[test]
    fn throughput_units() {
        assert_eq!(format_throughput(512.0), "512.00 B/s");
        assert_eq!(format_throughput(2_500.0), "2.50 KB/s");
        assert_eq!(format_throughput(3_000_000.0), "3.00 MB/s");
        assert_eq!(format_throughput(4_200_000_000.0), "4.20 GB/s");
    }

    #[test]
    fn throughput_uses_sampled_elapsed() {
        let snapshot = Snapshot {
            bytes: 2_000,
            elapsed: Duration::from_secs(2),
            ..Snapshot::default()
        };
        assert_eq!(snapshot.throughput(), 1_000.0);
        assert_eq!(Snapshot::default().throughput(), 0.0);
    }

    #[test]
    fn code_buckets() {
        let mut codes = CodeCounts::default();
        for code in [100, 200, 201, 302, 404, 503, 600, 42] {
            codes.increment(code);
        }
        assert_eq!(codes.code2xx, 2);
        assert_eq!(codes.other, 2);
        assert_eq!(codes.total(), 8);
    }

    #[test]
    fn errors_sorted_by_count() {
        let mut snapshot = Snapshot::default();
        snapshot.errors.insert("b".to_string(), 3);
        snapshot.errors.insert("a".to_string(), 3);
        snapshot.errors.insert("c".to_string(), 9);
        assert_eq!(snapshot.sorted_errors(), vec![("c", 9), ("a", 3), ("b", 3)]);
        assert_eq!(snapshot.error_count(), 15);
    }
}
