//! Replay a capture through the stability engine

use anyhow::Result;
use colored::Colorize;
use profiler_lib::accelerator::format_accelerator_report;
use profiler_lib::session::{ProfilingSession, SessionOutcome, TickReport};
use profiler_lib::StructuredLogger;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::capture::Capture;
use crate::config::ProfilerConfig;
use crate::output::{
    color_state, describe_outcome, format_latency_ns, format_percent, format_rate,
    format_std_dev_us, print_json, print_success, print_table, print_warning, OutputFormat,
};

/// Row for the per-tick measurement table
#[derive(Tabled)]
struct TickRow {
    #[tabled(rename = "Tick")]
    tick: usize,
    #[tabled(rename = "Requests")]
    requests: usize,
    #[tabled(rename = "Delayed")]
    delayed: usize,
    #[tabled(rename = "Throughput")]
    throughput: String,
    #[tabled(rename = "Avg Latency")]
    avg_latency: String,
    #[tabled(rename = "Std Dev")]
    std_dev: String,
    #[tabled(rename = "p99")]
    p99: String,
    #[tabled(rename = "Overhead")]
    overhead: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&TickReport> for TickRow {
    fn from(report: &TickReport) -> Self {
        let summary = &report.summary;
        Self {
            tick: report.tick,
            requests: summary.request_count,
            delayed: summary.delayed_request_count,
            throughput: format_rate(summary.throughput_per_sec),
            avg_latency: summary
                .latency
                .map(|l| format_latency_ns(l.mean_ns))
                .unwrap_or_else(|| "-".to_string()),
            std_dev: format_std_dev_us(summary.latency.map(|l| l.std_dev_us)),
            p99: summary
                .percentiles
                .map(|p| format_latency_ns(p.p99_ns))
                .unwrap_or_else(|| "-".to_string()),
            overhead: format_percent(summary.overhead_pct),
            state: color_state(report.state),
        }
    }
}

/// Result of replaying a capture
#[derive(Debug, Serialize)]
pub struct AnalyzeResult {
    pub ticks: Vec<TickReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
}

/// Feed every tick of the capture to a profiling session until it finishes
pub fn replay(capture: &Capture, config: &ProfilerConfig, run_id: &str) -> Result<AnalyzeResult> {
    let logger = StructuredLogger::new(run_id);
    let mut session = ProfilingSession::new(config.session_config()?, logger);
    let mut ticks = Vec::with_capacity(capture.ticks.len());

    for (index, tick) in capture.ticks.iter().enumerate() {
        let report = session.record_tick(&capture.records, tick, capture.telemetry_for(index))?;
        ticks.push(report);
        if session.is_finished() {
            break;
        }
    }

    info!(
        run_id = %run_id,
        ticks = ticks.len(),
        outcome = ?session.outcome(),
        "Capture replay complete"
    );

    Ok(AnalyzeResult {
        ticks,
        outcome: session.outcome(),
    })
}

/// Replay a capture and print the measurements
pub fn analyze(
    capture: &Capture,
    config: &ProfilerConfig,
    run_id: &str,
    format: OutputFormat,
) -> Result<Option<SessionOutcome>> {
    let result = replay(capture, config, run_id)?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", format!("Profiling replay: {}", run_id).bold());
            let rows: Vec<TickRow> = result.ticks.iter().map(TickRow::from).collect();
            print_table(&rows);
            println!();

            if let Some(last) = result.ticks.last() {
                if !last.summary.accelerators.is_empty() {
                    println!("{}", "Accelerator metrics".bold());
                    print!(
                        "{}",
                        format_accelerator_report(
                            &last.summary.accelerators,
                            config.max_display_accelerators
                        )
                    );
                    println!();
                }
            }

            match result.outcome {
                Some(outcome @ SessionOutcome::Stable) => print_success(describe_outcome(outcome)),
                Some(outcome) => print_warning(describe_outcome(outcome)),
                None => print_warning("Capture ended before profiling finished"),
            }
        }
    }

    Ok(result.outcome)
}
