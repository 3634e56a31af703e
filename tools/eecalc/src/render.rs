//! Terminal rendering for reports and catalogues

use anyhow::Result;
use colored::*;
use ee_calc::{CalculatorKind, ParameterSpec, Report, RiskLevel};
use std::fmt::Write;

use crate::config::OutputFormat;

fn paint_level(text: &str, level: Option<RiskLevel>) -> ColoredString {
    match level {
        Some(RiskLevel::Ok) => text.green(),
        Some(RiskLevel::Caution) => text.yellow(),
        Some(RiskLevel::Danger) => text.red().bold(),
        None => text.dimmed(),
    }
}

pub fn calculator_list() -> String {
    let mut out = String::new();
    let width = CalculatorKind::ALL
        .iter()
        .map(|k| k.as_str().len())
        .max()
        .unwrap_or(0);
    for kind in CalculatorKind::ALL {
        let _ = writeln!(
            out,
            "  {:<width$}  {}",
            kind.as_str().bright_cyan(),
            kind.description(),
            width = width
        );
    }
    out
}

pub fn parameter_table(kind: CalculatorKind, specs: &[ParameterSpec]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", kind.as_str().bold(), kind.description());
    let name_w = specs.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let unit_w = specs.iter().map(|s| s.unit.chars().count()).max().unwrap_or(0);
    for spec in specs {
        let _ = writeln!(
            out,
            "  {:<name_w$}  {:<unit_w$}  {:>10}  {}",
            spec.name,
            spec.unit,
            spec.default.to_string(),
            spec.description.dimmed(),
            name_w = name_w,
            unit_w = unit_w,
        );
    }
    out
}

/// Plain-text report; undefined values show as "—"
pub fn report_text(report: &Report, precision: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.calculator.as_str().bold());

    let width = report.fields.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in &report.fields {
        let _ = writeln!(
            out,
            "  {:<width$}  {}",
            name,
            value.render(precision),
            width = width
        );
    }

    if !report.assessments.is_empty() {
        let _ = writeln!(out);
        for assessment in &report.assessments {
            let _ = writeln!(
                out,
                "  {:<10} {}",
                assessment.name,
                paint_level(&assessment.status, assessment.level)
            );
        }
    }

    if !report.flags.is_empty() {
        let _ = writeln!(out, "  {:<10} {}", "flags", report.flags.join(", ").yellow());
    }

    if let Some(level) = report.classification {
        let _ = writeln!(
            out,
            "\n{} {}",
            "classification:".bright_cyan(),
            paint_level(level.as_str(), Some(level))
        );
    }

    for note in &report.notes {
        let _ = writeln!(out, "{} {}", "note:".dimmed(), note);
    }
    out
}

pub fn report(report: &Report, format: OutputFormat, precision: usize) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report_text(report, precision),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
    })
}
