//! Report formatting and output management

use crate::scanner::{AuditReport, HostReport, ProbeRecord};
use crate::tls::probe::ProbeOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};

/// Output format options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
    pub colored: bool,
    /// Show rejected and failed probes, not just accepted ciphers
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
            verbose: false,
        }
    }
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write the audit report to the configured destination
    pub fn write_report(&self, report: &AuditReport) -> io::Result<()> {
        let output = match self.config.format {
            OutputFormat::Text => self.format_text(report),
            OutputFormat::Json => self.format_json(report)?,
            OutputFormat::Csv => self.format_csv(report)?,
        };

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                print!("{}", output);
            }
        }

        Ok(())
    }

    /// Format the report as human-readable text
    fn format_text(&self, report: &AuditReport) -> String {
        let mut output = String::new();
        output.push('\n');

        for host_report in &report.hosts {
            let header = format!("Host: {}\n", host_report.host);
            output.push_str(&self.colorize(&header, "cyan"));

            if !host_report.status.is_scanned() {
                let line = format!("  {}\n\n", host_report.status);
                output.push_str(&self.colorize(&line, "red"));
                continue;
            }

            let accepted: Vec<&ProbeRecord> = host_report.accepted().collect();
            if accepted.is_empty() {
                output.push_str("  No ciphers accepted\n");
            } else {
                output.push_str(&self.colorize("🟢 ACCEPTED CIPHERS:\n", "neon_green"));
                for record in &accepted {
                    let line = format!(
                        "  {:<8} {:<42} ({} bits)\n",
                        record.protocol.name(),
                        record.cipher.name,
                        record.cipher.bits
                    );
                    output.push_str(&self.colorize(&line, "neon_green"));
                }
            }

            if self.config.verbose {
                let declined: Vec<&ProbeRecord> = host_report
                    .probes
                    .iter()
                    .filter(|r| !r.outcome.is_accepted())
                    .collect();
                if !declined.is_empty() {
                    output.push_str(&self.colorize("🔴 DECLINED CIPHERS:\n", "gray"));
                    for record in declined {
                        let line = format!(
                            "  {:<8} {:<42} {}\n",
                            record.protocol.name(),
                            record.cipher.name,
                            record.outcome
                        );
                        output.push_str(&self.colorize(&line, "gray"));
                    }
                }
            }

            let summary = format!(
                "  {}/{} cipher(s) accepted in {:.2}s\n\n",
                host_report.accepted_count(),
                host_report.probes.len(),
                host_report.duration.as_secs_f64()
            );
            output.push_str(&summary);
        }

        let footer = format!(
            "{} host(s) scanned, {} failed, {} cipher(s) accepted in {:.2}s\n",
            report.scanned_count(),
            report.failed_count(),
            report.total_accepted(),
            report.duration.as_secs_f64()
        );
        output.push_str(&self.colorize(&footer, "bold"));

        output
    }

    /// Format the report as JSON
    fn format_json(&self, report: &AuditReport) -> io::Result<String> {
        let json_report = JsonAuditReport::from(report);
        serde_json::to_string_pretty(&json_report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Format the report as CSV, one row per probe
    fn format_csv(&self, report: &AuditReport) -> io::Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .write_record(["host", "status", "protocol", "cipher", "bits", "outcome"])
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        for host_report in &report.hosts {
            if !host_report.status.is_scanned() {
                writer
                    .write_record([
                        host_report.host.as_str(),
                        host_report.status.name(),
                        "",
                        "",
                        "",
                        "",
                    ])
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                continue;
            }

            for record in &host_report.probes {
                if !self.config.verbose && !record.outcome.is_accepted() {
                    continue;
                }
                writer
                    .write_record([
                        host_report.host.as_str(),
                        host_report.status.name(),
                        record.protocol.name(),
                        record.cipher.name.as_str(),
                        &record.cipher.bits.to_string(),
                        record.outcome.name(),
                    ])
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            }
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Apply color formatting if enabled
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        let color_code = match color {
            "red" => "\x1b[31m",
            "green" => "\x1b[32m",
            "neon_green" => "\x1b[38;2;57;255;20m",
            "yellow" => "\x1b[33m",
            "cyan" => "\x1b[36m",
            "gray" => "\x1b[38;2;128;128;128m",
            "bold" => "\x1b[1m",
            _ => "",
        };

        format!("{}{}{}", color_code, text, "\x1b[0m")
    }
}

/// JSON-serializable audit report
#[derive(Debug, Serialize, Deserialize)]
struct JsonAuditReport {
    generated_at: DateTime<Utc>,
    started_at: DateTime<Utc>,
    duration_seconds: f64,
    total_accepted: usize,
    hosts: Vec<JsonHostReport>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonHostReport {
    host: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    duration_seconds: f64,
    accepted_count: usize,
    probes: Vec<JsonProbeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonProbeRecord {
    protocol: String,
    cipher: String,
    bits: i32,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl From<&AuditReport> for JsonAuditReport {
    fn from(report: &AuditReport) -> Self {
        Self {
            generated_at: Utc::now(),
            started_at: report.started_at,
            duration_seconds: report.duration.as_secs_f64(),
            total_accepted: report.total_accepted(),
            hosts: report.hosts.iter().map(JsonHostReport::from).collect(),
        }
    }
}

impl From<&HostReport> for JsonHostReport {
    fn from(report: &HostReport) -> Self {
        Self {
            host: report.host.clone(),
            status: report.status.name().to_string(),
            detail: report.status.detail().map(str::to_string),
            duration_seconds: report.duration.as_secs_f64(),
            accepted_count: report.accepted_count(),
            probes: report.probes.iter().map(JsonProbeRecord::from).collect(),
        }
    }
}

impl From<&ProbeRecord> for JsonProbeRecord {
    fn from(record: &ProbeRecord) -> Self {
        Self {
            protocol: record.protocol.name().to_string(),
            cipher: record.cipher.name.clone(),
            bits: record.cipher.bits,
            outcome: record.outcome.name().to_string(),
            detail: match &record.outcome {
                ProbeOutcome::Error(reason) => Some(reason.clone()),
                _ => None,
            },
        }
    }
}
