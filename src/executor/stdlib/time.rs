//! Duration formatting
//!
//! Format tokens: `HH` total hours, `hh` 12-hour clock hour, `mm` minutes,
//! `ss` seconds, `ms` milliseconds, `a` for `AM`/`PM`. Anything else is copied
//! through.

use anyhow::Result;

use super::{arg, optional_arg, require_args};
use crate::executor::types::Value;

const DEFAULT_FORMAT: &str = "HH:mm:ss";

pub fn seconds_to_timestamp(args: &[Value]) -> Result<Value> {
    require_args("secondsToTimestamp", args, 1)?;
    let seconds = arg(args, 0).to_number();
    Ok(format_duration(seconds * 1000.0, format_arg(args)))
}

pub fn ms_to_timestamp(args: &[Value]) -> Result<Value> {
    require_args("msToTimestamp", args, 1)?;
    let ms = arg(args, 0).to_number();
    Ok(format_duration(ms, format_arg(args)))
}

/// Parse `HH:mm:ss`, `mm:ss` or `ss` back to seconds
pub fn timestamp_to_seconds(args: &[Value]) -> Result<Value> {
    require_args("timestampToSeconds", args, 1)?;
    let text = arg(args, 0).to_js_string();

    let parts: Option<Vec<f64>> = text
        .trim()
        .split(':')
        .map(|part| {
            let part = part.trim();
            if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit() || c == '.') {
                part.parse::<f64>().ok()
            } else {
                None
            }
        })
        .collect();

    let seconds = match parts.as_deref() {
        Some([h, m, s]) => h * 3600.0 + m * 60.0 + s,
        Some([m, s]) => m * 60.0 + s,
        Some([s]) => *s,
        _ => 0.0,
    };
    Ok(Value::Number(seconds))
}

fn format_arg(args: &[Value]) -> String {
    optional_arg(args, 1)
        .map(Value::to_js_string)
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
}

fn format_duration(total_ms: f64, format: String) -> Value {
    if !total_ms.is_finite() {
        return Value::String(String::new());
    }

    let negative = total_ms < 0.0;
    let total_ms = total_ms.abs().floor() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let clock_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hours % 24 < 12 { "AM" } else { "PM" };

    let mut out = String::new();
    if negative && total_ms > 0 {
        out.push('-');
    }

    let mut rest = format.as_str();
    while let Some(c) = rest.chars().next() {
        let token = ["HH", "hh", "mm", "ms", "ss", "a"]
            .into_iter()
            .find(|token| rest.starts_with(*token));
        match token {
            Some(token) => {
                match token {
                    "HH" => out.push_str(&format!("{:02}", hours)),
                    "hh" => out.push_str(&format!("{:02}", clock_hour)),
                    "mm" => out.push_str(&format!("{:02}", minutes)),
                    "ss" => out.push_str(&format!("{:02}", seconds)),
                    "ms" => out.push_str(&format!("{:03}", millis)),
                    _ => out.push_str(meridiem),
                }
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Value::String(out)
}
