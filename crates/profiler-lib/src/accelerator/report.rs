//! Human-readable accelerator metrics

use crate::models::AcceleratorMetrics;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Most accelerators listed individually before output is suppressed
pub const DEFAULT_DISPLAY_CAP: usize = 16;

/// Printed instead of per-accelerator lines on hosts above the display cap
pub const TOO_MANY_ACCELERATORS: &str = "Too many GPUs on system to print out individual \
Prometheus metrics, use the CSV output feature to see metrics.";

const SIGNIFICANT_DIGITS: i32 = 6;

/// Render merged accelerator metrics as an indented text block
///
/// Each section lists accelerators in id order. Above `display_cap`
/// accelerators, a single advisory line is returned instead.
pub fn format_accelerator_report(metrics: &AcceleratorMetrics, display_cap: usize) -> String {
    if metrics.accelerator_count() > display_cap {
        return format!("{TOO_MANY_ACCELERATORS}\n");
    }

    let mut out = String::new();
    write_section(&mut out, "Avg GPU Utilization", &metrics.utilization, |v| {
        format!("{}%", format_general(v * 100.0))
    });
    write_section(&mut out, "Avg GPU Power Usage", &metrics.power_watts, |v| {
        format!("{} watts", format_general(v))
    });
    write_section(&mut out, "Max GPU Memory Usage", &metrics.memory_used_bytes, |v| {
        format!("{v} bytes")
    });
    write_section(&mut out, "Total GPU Memory", &metrics.memory_total_bytes, |v| {
        format!("{v} bytes")
    });
    out
}

fn write_section<T: Copy>(
    out: &mut String,
    title: &str,
    values: &BTreeMap<String, T>,
    render: impl Fn(T) -> String,
) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "    {title}:");
    for (id, &value) in values {
        let _ = writeln!(out, "      {id} : {}", render(value));
    }
}

/// Six significant digits with trailing zeros dropped (`70`, `84.5`, `45`)
fn format_general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");

    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
