use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RunStatistics;

/// 每张输出图片折算的指令数（估算值，并非实测）
pub const INSTRUCTIONS_PER_IMAGE: u64 = 20;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// 一次运行的最终汇总报告
///
/// 所有 worker 上报后由协调器计算一次。`estimated_instructions` 固定为
/// `images_generated * 20`，吞吐量为 `bytes_processed_total / elapsed_seconds`。
/// 耗时为零时所有速率都记为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub elapsed_seconds: f64,
    pub images_generated: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub estimated_instructions: u64,
    pub estimated_mips: f64,
    pub bytes_processed_total: u64,
    pub throughput_mbps: f64,
    pub throughput_gbps: f64,
    pub generated_at: DateTime<Utc>,
}

impl FinalReport {
    pub fn from_totals(totals: &RunStatistics, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        let estimated_instructions = totals.images_generated * INSTRUCTIONS_PER_IMAGE;
        let bytes_processed_total = totals.total_bytes();

        let (estimated_mips, bytes_per_second) = if elapsed_seconds > 0.0 {
            (
                estimated_instructions as f64 / (1e6 * elapsed_seconds),
                bytes_processed_total as f64 / elapsed_seconds,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            elapsed_seconds,
            images_generated: totals.images_generated,
            bytes_read: totals.bytes_read,
            bytes_written: totals.bytes_written,
            estimated_instructions,
            estimated_mips,
            bytes_processed_total,
            throughput_mbps: bytes_per_second / BYTES_PER_MIB,
            throughput_gbps: bytes_per_second / BYTES_PER_GIB,
            generated_at: Utc::now(),
        }
    }

    /// 渲染为 results.txt 的文本格式
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total time: {:.2}s", self.elapsed_seconds);
        let _ = writeln!(out, "Images generated: {}", self.images_generated);
        let _ = writeln!(out, "Reads: {} bytes", self.bytes_read);
        let _ = writeln!(out, "Writes: {} bytes", self.bytes_written);
        let _ = writeln!(out, "Instructions: {}", self.estimated_instructions);
        let _ = writeln!(out, "Estimated MIPS: {:.10}", self.estimated_mips);
        let _ = writeln!(out, "Total bytes processed: {}", self.bytes_processed_total);
        let _ = writeln!(
            out,
            "Throughput: {:.2} MB/s ({:.2} GB/s)",
            self.throughput_mbps, self.throughput_gbps
        );
        out
    }
}
