//! Education registry report tool.
//!
//! Opens the configured repository, optionally seeds the sample registry and
//! prints one report as a text table or as JSON.
//!
//! # Usage
//!
//! ```bash
//! # By-region report from ./education.db
//! cargo run --bin edu-report
//!
//! # Financial report for one region, seeding an empty database first
//! cargo run --bin edu-report -- financial --scope region:1 --seed
//!
//! # In-memory repository with sample data, JSON output
//! REPOSITORY_TYPE=local cargo run --bin edu-report -- by-type --seed --json
//! ```
//!
//! # Environment Variables
//!
//! - `REPOSITORY_TYPE`: `sqlite` (default) or `local`
//! - `EDU_DATABASE_PATH`: SQLite database file (default: education.db)
//! - `EDU_BUSY_TIMEOUT_MS`, `EDU_MAX_RETRIES`: SQLite tuning
//! - `EDU_CONFIG`: Path to a `repository.toml`
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use edu_registry::db::{self, FullRepository, RepositoryConfig, RepositoryFactory};
use edu_registry::services::{overview, Report, ReportKind, ReportScope, ReportSession};

#[derive(Parser)]
#[command(name = "edu-report")]
#[command(about = "Print aggregate reports over the education institutions registry")]
struct Args {
    /// Report kind: by-region, by-district, by-type, statistics, infrastructure, financial
    #[arg(default_value = "by-region")]
    kind: ReportKind,

    /// Report scope: country, region:<id> or district:<id>
    #[arg(short, long, default_value = "country")]
    scope: ReportScope,

    /// Insert the sample registry when the database has no regions
    #[arg(long)]
    seed: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print the dashboard overview after the report
    #[arg(long)]
    overview: bool,

    /// Repository configuration file (overrides EDU_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let repository = open_repository(args.config.as_ref()).await?;
    info!("Repository initialized successfully");

    if args.seed && db::seed_sample_data(repository.as_ref()).await? {
        info!("Sample data inserted");
    }

    let mut session = ReportSession::load(repository.as_ref())
        .await
        .context("Failed to load registry snapshot")?;
    session.set_scope(args.scope);
    let report = session.set_kind(args.kind);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if args.overview {
            println!("{}", serde_json::to_string_pretty(&overview(session.snapshot()))?);
        }
    } else {
        print_report(&report);
        if args.overview {
            print_overview(&session);
        }
    }

    Ok(())
}

async fn open_repository(config: Option<&PathBuf>) -> anyhow::Result<Arc<dyn FullRepository>> {
    if let Some(path) = config {
        return RepositoryFactory::from_config_file(path)
            .await
            .with_context(|| format!("Failed to open repository from {}", path.display()));
    }

    match RepositoryConfig::from_default_location() {
        Ok(config) => Ok(RepositoryFactory::from_repository_config(&config).await?),
        Err(e) => {
            debug!("No repository.toml used ({}), configuring from environment", e);
            Ok(RepositoryFactory::from_env().await?)
        }
    }
}

fn print_report(report: &Report) {
    println!("{}", report.title);
    println!("Сформирован: {}  ({})", report.generated_at_display(), report.scope);
    println!();

    if report.kind.is_grouped() {
        println!(
            "{:<40} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "Категория",
            "Учрежд.",
            "Учащиеся",
            "Препод.",
            "Персонал",
            "Принято",
            "Отчисл.",
            "Компьют.",
            "Кабинеты",
            "Соотн."
        );
        for row in &report.rows {
            println!(
                "{:<40} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
                row.category,
                row.institution_count,
                row.student_count,
                row.teacher_count,
                row.staff_count,
                row.admitted_count,
                row.expelled_count,
                row.computer_count,
                row.classroom_count,
                row.ratio_display()
            );
        }
    } else {
        for row in &report.rows {
            println!("{:<52} {:>12}", row.category, row.value_display());
        }
    }

    println!();
    println!(
        "Итого: учреждений {}, учащихся {}, преподавателей {}, персонала {}",
        report.totals.institutions,
        report.totals.students,
        report.totals.teachers,
        report.totals.staff
    );
}

fn print_overview(session: &ReportSession) {
    let summary = overview(session.snapshot());
    println!();
    println!(
        "Обзор: учреждений {}, учащихся {}, преподавателей {}, персонала {}",
        summary.total_institutions,
        summary.total_students,
        summary.total_teachers,
        summary.total_staff
    );
    for institution in &summary.recent_institutions {
        println!(
            "  {}  {}  {}",
            institution.registration_date_display(),
            institution.name,
            institution.ratio_display()
        );
    }
}
