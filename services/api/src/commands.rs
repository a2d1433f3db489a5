use crate::infra::{build_analysis_service, build_delivery_service};
use clap::{ArgGroup, Args};
use copycheck::config::AppConfig;
use copycheck::error::AppError;
use copycheck::telemetry;
use copycheck::workflows::analysis::{
    score_response, AnalysisReport, AnalysisReportView, ExtractionMode, ResponseShape,
    ScoreExtractor,
};
use copycheck::workflows::delivery::{DocumentRenderer, PdfReportRenderer};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["text", "file"])))]
pub(crate) struct AnalyzeArgs {
    /// Copy to analyze, or an article URL
    #[arg(long)]
    pub(crate) text: Option<String>,
    /// Read the copy from a file
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
    /// E-mail the PDF report to this address
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Write the PDF report to this path
    #[arg(long)]
    pub(crate) pdf: Option<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Saved model reply to parse
    #[arg(long)]
    pub(crate) response: PathBuf,
    /// Text the reply was produced for, shown in the report
    #[arg(long)]
    pub(crate) source: Option<PathBuf>,
    /// Reply shapes to accept: auto, structured or free_text
    #[arg(long, default_value = "auto", value_parser = parse_mode)]
    pub(crate) mode: ExtractionMode,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_mode(raw: &str) -> Result<ExtractionMode, String> {
    ExtractionMode::parse(raw)
        .ok_or_else(|| format!("unknown extraction mode '{raw}' (auto, structured, free_text)"))
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    shape: ResponseShape,
    truncated: bool,
    report: AnalysisReportView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf: Option<&'a std::path::Path>,
}

pub(crate) async fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let input = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => String::new(),
    };

    let service = build_analysis_service(&config)?;
    let outcome = service.analyze(&input).await?;

    let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfReportRenderer);
    if let Some(path) = &args.pdf {
        let bytes = renderer.render(&outcome.report);
        std::fs::write(path, bytes)?;
    }

    print_report(
        &outcome.report,
        outcome.shape,
        outcome.truncated,
        args.pdf.as_deref(),
        args.json,
    )?;

    if let Some(address) = &args.email {
        let delivery = build_delivery_service(&config, renderer)?;
        let receipt = delivery.deliver(&outcome.report, address).await?;
        eprintln!("Report sent to {}.", receipt.address);
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.response)?;
    let source = match &args.source {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let (report, shape) = score_response(&ScoreExtractor::new(args.mode), &source, &raw)?;
    print_report(&report, shape, false, None, args.json)
}

fn print_report(
    report: &AnalysisReport,
    shape: ResponseShape,
    truncated: bool,
    pdf: Option<&std::path::Path>,
    json: bool,
) -> Result<(), AppError> {
    if json {
        let output = CommandOutput {
            shape,
            truncated,
            report: report.view(),
            pdf,
        };
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        print!("{}", render_text(report, shape, truncated));
        if let Some(path) = pdf {
            println!("PDF report written to {}", path.display());
        }
    }
    Ok(())
}

pub(crate) fn render_text(report: &AnalysisReport, shape: ResponseShape, truncated: bool) -> String {
    let view = report.view();
    let mut out = String::new();

    let shape = match shape {
        ResponseShape::Structured => "structured reply",
        ResponseShape::FreeText => "free-text reply",
    };
    let _ = writeln!(out, "Copycheck analysis ({shape})");
    if truncated {
        let _ = writeln!(out, "Note: the input was shortened before analysis.");
    }
    let _ = writeln!(
        out,
        "Overall score: {}% ({:.1}/10)",
        view.summary.overall_percent, view.summary.average_score
    );
    out.push('\n');

    for entry in &view.entries {
        let _ = writeln!(
            out,
            "  {:<11} {:>4.1}/10  {:?}",
            entry.criterion_label, entry.score, entry.band
        );
        if !entry.suggestion.is_empty() {
            let _ = writeln!(out, "      {}", entry.suggestion);
        }
    }

    out.push('\n');
    let _ = writeln!(out, "{}", view.summary.improvement_summary);
    let _ = writeln!(out, "{}", view.summary.final_comment);
    out
}
