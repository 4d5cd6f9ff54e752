use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use satlink_frame::{Frame, FrameBody};
use satlink_health::Alert;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    #[serde(flatten)]
    frame: &'a Frame,
    alerts: &'a [Alert],
    received_at: String,
}

#[derive(Serialize)]
struct SentOutput<'a> {
    target: String,
    bytes: usize,
    hex: &'a str,
}

pub fn print_frame(frame: &Frame, alerts: &[Alert], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                frame,
                alerts,
                received_at: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SATELLITE", "TIMESTAMP", "TYPE", "READINGS", "ALERTS"])
                .add_row(vec![
                    frame.satellite_id.to_string(),
                    frame.timestamp.to_string(),
                    frame.kind().as_str().to_string(),
                    readings_summary(frame),
                    alerts_summary(alerts),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sat={} ts={} type={} {}",
                frame.satellite_id,
                frame.timestamp,
                frame.kind().as_str(),
                readings_summary(frame)
            );
            for alert in alerts {
                println!("  [{} ALERT] {}", alert.level, alert.message);
            }
        }
        OutputFormat::Raw => {
            println!("{}", frame.raw_hex);
        }
    }
}

pub fn print_sent(target: SocketAddr, bytes: usize, hex: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SentOutput {
                target: target.to_string(),
                bytes,
                hex,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent {bytes} bytes to {target}");
        }
        OutputFormat::Raw => {
            println!("{hex}");
        }
    }
}

fn readings_summary(frame: &Frame) -> String {
    match &frame.body {
        FrameBody::Housekeeping(hk) => format!(
            "battery={}mV battery_temp={}°C msi_temp={}°C ssr={}MB",
            hk.battery_voltage_mv, hk.battery_temp_c, hk.msi_temperature_c, hk.ssr_used_mb
        ),
        FrameBody::PayloadData(data) => format!("payload={} bytes", data.payload_length),
    }
}

fn alerts_summary(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "-".to_string();
    }
    alerts
        .iter()
        .map(|alert| format!("{}: {}", alert.level, alert.message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
