use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use dorm_inspector::config::AppConfig;
use dorm_inspector::error::AppError;
use dorm_inspector::telemetry;
use dorm_inspector::workflows::inspection::export;
use dorm_inspector::workflows::inspection::{
    collect_keys, inspection_router, DateRange, DeclaredScorePolicy, ImportBatch, ImportOptions,
    InspectionImporter, InspectionReport, InspectionReportSummary, InspectionService,
    InspectionSettings, MemoryInspectionRepository, RecordValidator, ScoringEngine, ViolationSet,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Dorm Inspector",
    about = "Score, import, and report on dormitory room inspections",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with inspection data from the command line
    Inspection {
        #[command(subcommand)]
        command: InspectionCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum InspectionCommand {
    /// Score a set of violations
    Score(ScoreArgs),
    /// Import an inspection CSV and print the batch outcome
    Import(ImportArgs),
    /// Summarize an inspection CSV
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Regular violation label (repeatable)
    #[arg(long = "regular")]
    regular: Vec<String>,
    /// Auto-failure violation label (repeatable)
    #[arg(long = "auto-failure")]
    auto_failure: Vec<String>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CSV file to import
    csv: PathBuf,
    /// CSV of already stored inspections used for duplicate detection
    #[arg(long)]
    existing: Option<PathBuf>,
    /// Accept rows whose room and date are already present
    #[arg(long)]
    allow_duplicates: bool,
    /// Skip room, inspector, and date validation
    #[arg(long)]
    lenient: bool,
    /// Reject rows whose declared score or status disagrees with their violations
    #[arg(long)]
    reject_mismatched_scores: bool,
    /// Write accepted records to this CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// CSV file to summarize
    csv: PathBuf,
    /// Date window: week, month, or all
    #[arg(long, default_value = "all")]
    range: DateRange,
    /// Evaluation date for the window (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Inspection { command } => {
            let settings = AppConfig::load()?.inspection;
            match command {
                InspectionCommand::Score(args) => {
                    run_score(args, &settings);
                    Ok(())
                }
                InspectionCommand::Import(args) => run_import(args, &settings),
                InspectionCommand::Report(args) => run_report(args, &settings),
            }
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = InspectionService::new(
        Arc::new(MemoryInspectionRepository::new()),
        config.inspection.clone(),
    );
    let app = build_app(state, Arc::new(service)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rooms = %config.inspection.rooms,
        "dorm inspection service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(state: AppState, service: Arc<InspectionService<MemoryInspectionRepository>>) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(inspection_router(service))
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn run_score(args: ScoreArgs, settings: &InspectionSettings) {
    let regular = ViolationSet::from_labels(args.regular);
    let auto_failure = ViolationSet::from_labels(args.auto_failure);

    for label in settings.catalog.unknown_regular(&regular) {
        println!("warning: '{label}' is not a listed regular violation");
    }
    for label in settings.catalog.unknown_auto_failure(&auto_failure) {
        println!("warning: '{label}' is not a listed auto-failure violation");
    }

    let evaluation = ScoringEngine::new(settings.scoring).evaluate(&regular, &auto_failure);
    println!(
        "Score {} ({} regular, {} auto-failure): {}",
        evaluation.score,
        regular.len(),
        auto_failure.len(),
        evaluation.status
    );
}

fn importer_for(settings: &InspectionSettings) -> InspectionImporter {
    InspectionImporter::new(
        ScoringEngine::new(settings.scoring),
        RecordValidator::new(settings.rooms.clone()),
    )
}

fn run_import(args: ImportArgs, settings: &InspectionSettings) -> Result<(), AppError> {
    let importer = importer_for(settings);

    let existing = match &args.existing {
        Some(path) => {
            let stored = importer.import_path(
                path,
                &HashSet::new(),
                ImportOptions {
                    skip_duplicates: false,
                    strict_validation: false,
                    declared_score: DeclaredScorePolicy::Recompute,
                },
            )?;
            collect_keys(&stored.accepted)
        }
        None => HashSet::new(),
    };

    let options = ImportOptions {
        skip_duplicates: !args.allow_duplicates,
        strict_validation: !args.lenient,
        declared_score: if args.reject_mismatched_scores {
            DeclaredScorePolicy::Reject
        } else {
            DeclaredScorePolicy::Recompute
        },
    };

    let batch = importer.import_path(&args.csv, &existing, options)?;
    render_import(&batch);

    if let Some(path) = args.output {
        let writer = BufWriter::new(File::create(&path)?);
        export::write_csv(writer, &batch.accepted)
            .map_err(|err| AppError::Inspection(err.into()))?;
        println!("\nWrote {} records to {}", batch.accepted.len(), path.display());
    }

    Ok(())
}

fn run_report(args: ReportArgs, settings: &InspectionSettings) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let summary = summarize_csv(&args.csv, args.range, today, settings)?;
    let (start, end) = args.range.bounds(today);
    render_report(&summary, start, end);
    Ok(())
}

/// Reports on every readable row, including repeat inspections of a room on one date.
fn summarize_csv(
    path: &Path,
    range: DateRange,
    today: NaiveDate,
    settings: &InspectionSettings,
) -> Result<InspectionReportSummary, AppError> {
    let batch = importer_for(settings).import_path(
        path,
        &HashSet::new(),
        ImportOptions {
            skip_duplicates: false,
            strict_validation: false,
            ..ImportOptions::default()
        },
    )?;

    let in_range = range.filter(&batch.accepted, today);
    Ok(InspectionReport::build(in_range).summary())
}

fn render_import(batch: &ImportBatch) {
    let summary = batch.summary();
    println!("Inspection import");
    println!(
        "Imported {}, skipped {} duplicates, {} failed validation, {} unreadable rows",
        summary.accepted, summary.skipped_duplicates, summary.failed_validation, summary.parse_rejected
    );

    for rejected in &batch.rejected {
        println!("- {rejected}");
    }
    for skipped in &batch.skipped_duplicates {
        println!(
            "- Row {}: duplicate of room {} on {}",
            skipped.row_number, skipped.key.room_number, skipped.key.inspection_date
        );
    }
    for failure in &batch.failed_validation {
        println!("- Row {}: {}", failure.row_number, failure.errors.join("; "));
    }
    for adjustment in &batch.score_adjustments {
        println!(
            "- Row {}: declared {} {} recomputed as {} {}",
            adjustment.row_number,
            adjustment.declared_score,
            adjustment.declared_status,
            adjustment.computed.score,
            adjustment.computed.status
        );
    }
}

fn render_report(summary: &InspectionReportSummary, start: NaiveDate, end: NaiveDate) {
    println!("Inspection report");
    println!("Window: {start} -> {end}");
    println!(
        "{} inspections, {:.1}% passing",
        summary.total, summary.pass_rate
    );

    println!("\nStatus breakdown");
    for entry in &summary.status_counts {
        println!("- {}: {}", entry.status_label, entry.count);
    }

    if summary.inspectors.is_empty() {
        println!("\nInspectors: none");
    } else {
        println!("\nInspectors");
        for inspector in &summary.inspectors {
            println!(
                "- {}: {} inspections, {:.1}% passing, average score {:.1}",
                inspector.inspector, inspector.total, inspector.pass_rate, inspector.average_score
            );
        }
    }

    let top = summary.top_violations(5);
    if top.is_empty() {
        println!("\nMost cited violations: none");
    } else {
        println!("\nMost cited violations");
        for violation in top {
            println!(
                "- {}: {} ({:.1}%)",
                violation.label, violation.count, violation.percentage
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn test_app(ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        };
        let service = InspectionService::new(
            Arc::new(MemoryInspectionRepository::new()),
            InspectionSettings::default(),
        );
        build_app(state, Arc::new(service))
    }

    async fn get_status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        assert_eq!(get_status(test_app(false), "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get_status(test_app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn inspection_routes_are_mounted_beside_health() {
        let app = test_app(true);
        assert_eq!(get_status(app.clone(), "/health").await, StatusCode::OK);
        assert_eq!(get_status(app.clone(), "/metrics").await, StatusCode::OK);
        assert_eq!(get_status(app, "/api/v1/inspections").await, StatusCode::OK);
    }

    #[test]
    fn cli_parses_import_flags() {
        let cli = Cli::try_parse_from([
            "dorm-inspector",
            "inspection",
            "import",
            "inspections.csv",
            "--allow-duplicates",
            "--reject-mismatched-scores",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Inspection {
                command: InspectionCommand::Import(args),
            }) => {
                assert!(args.allow_duplicates);
                assert!(!args.lenient);
                assert!(args.reject_mismatched_scores);
                assert!(args.existing.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn csv_report_counts_repeat_inspections() {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/inspections.csv");
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).expect("valid date");

        let summary = summarize_csv(&fixture, DateRange::Week, today, &InspectionSettings::default())
            .expect("fixture summarizes");

        // Rows 2 and 6 both inspect room 214 on 2024-01-15; row 7 is out of range but lenient.
        assert_eq!(summary.total, 6);
        let hoskins = summary
            .inspectors
            .iter()
            .find(|entry| entry.inspector == "Hoskins")
            .expect("hoskins tracked");
        assert_eq!(hoskins.total, 3);
    }

    #[test]
    fn cli_parses_report_range() {
        let cli = Cli::try_parse_from([
            "dorm-inspector",
            "inspection",
            "report",
            "inspections.csv",
            "--range",
            "week",
            "--today",
            "2024-01-20",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Inspection {
                command: InspectionCommand::Report(args),
            }) => {
                assert_eq!(args.range, DateRange::Week);
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 1, 20));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
