//! 텍스트 리포트.

use httpit_core::models::snapshot::{format_throughput, Progress, Snapshot};
use std::fmt::Write;

/// 실행 시작 제목 줄
pub fn title(url: &str, connections: usize) -> String {
    format!("Benchmarking {url} with {connections} connections")
}

/// 최종 리포트 본문
pub fn render(snapshot: &Snapshot) -> String {
    let rps = snapshot.rps_stats();
    let latency = snapshot.latency_stats();
    let codes = &snapshot.codes;

    let mut out = String::new();
    // String에 대한 write!는 실패하지 않는다
    let _ = write!(
        out,
        "Total requests: {}\n\
         Elapsed: {:.2}s\n\
         Statistics        Avg      Stdev        Max\n\
         \x20 Reqs/sec       {:.2}     {:.2}     {:.2}\n\
         \x20 Latency      {:.2}ms   {:.2}ms     {:.2}ms\n\
         \x20 HTTP codes:\n\
         \x20   1xx - {}, 2xx - {}, 3xx - {}, 4xx - {}, 5xx - {}\n\
         \x20   others - {}\n\
         \x20 Throughput: {}\n",
        snapshot.total,
        snapshot.elapsed.as_secs_f64(),
        rps.mean,
        rps.stdev,
        rps.max,
        latency.mean,
        latency.stdev,
        latency.max,
        codes.code1xx,
        codes.code2xx,
        codes.code3xx,
        codes.code4xx,
        codes.code5xx,
        codes.other,
        format_throughput(snapshot.throughput()),
    );

    if !snapshot.errors.is_empty() {
        out.push_str("  Errors\n");
        for (message, count) in snapshot.sorted_errors() {
            let _ = writeln!(out, "    {message}: {count}");
        }
    }
    out
}

/// 진행 상황 한 줄
pub fn progress_line(progress: &Progress, count: Option<u64>) -> String {
    let requests = match count {
        Some(count) => format!("{}/{}", progress.total, count),
        None => progress.total.to_string(),
    };
    let secs = progress.elapsed.as_secs_f64();
    let throughput = if secs > 0.0 {
        progress.bytes as f64 / secs
    } else {
        0.0
    };
    format!(
        "요청 {requests}, 에러 {}, 경과 {secs:.2}s, {}",
        progress.errors,
        format_throughput(throughput)
    )
}
