use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, error::ErrorKind};

use crate::config::EngineConfig;
use crate::data::{CandidateType, Dataset, PipelineStatus};
use crate::filters::{FilterSpec, filter_summary};
use crate::metrics::catalog::all_tiles;
use crate::metrics::explain::explain_metric;
use crate::metrics::Rag;
use crate::session::CockpitSession;

#[derive(Debug, Parser)]
#[command(
    name = "kpi_report",
    disable_help_subcommand = true,
    about = "Talent-acquisition KPI report",
    long_about = "Load a seven-sheet workbook or flat CSV, apply filters, and print the KPI catalog with key insights, health score, optional breakdowns and trends.",
    after_help = "Filters repeat: pass --business-unit twice to keep two units. Set RUST_LOG=info to see ingest and session logs."
)]
struct KpiReportCli {
    #[arg(long, value_name = "PATH", help = "Workbook (.xlsx/.xls) or CSV to load")]
    input: PathBuf,
    #[arg(long = "date-from", value_name = "YYYY-MM-DD", value_parser = parse_date_arg, help = "Inclusive lower bound on Application_Date")]
    date_from: Option<NaiveDate>,
    #[arg(long = "date-to", value_name = "YYYY-MM-DD", value_parser = parse_date_arg, help = "Inclusive upper bound on Application_Date")]
    date_to: Option<NaiveDate>,
    #[arg(long = "business-unit", value_name = "NAME", help = "Business unit to keep, repeat as needed")]
    business_units: Vec<String>,
    #[arg(long, value_name = "NAME", help = "Location to keep, repeat as needed")]
    location: Vec<String>,
    #[arg(long, value_name = "NAME", help = "Role name to keep, repeat as needed")]
    role: Vec<String>,
    #[arg(long, value_name = "NAME", help = "Source channel to keep, repeat as needed")]
    source: Vec<String>,
    #[arg(long = "candidate-type", value_name = "Internal|External", value_parser = parse_candidate_type_arg, help = "Candidate type to keep, repeat as needed")]
    candidate_types: Vec<CandidateType>,
    #[arg(long, value_name = "Active|Rejected|Hired", value_parser = parse_status_arg, help = "Pipeline status to keep, repeat as needed")]
    status: Vec<PipelineStatus>,
    #[arg(long, value_name = "ID", help = "Recruiter to keep, repeat as needed")]
    recruiter: Vec<String>,
    #[arg(long, help = "Print dimension breakdowns for red and amber metrics")]
    breakdowns: bool,
    #[arg(long, help = "Print weekly trend summaries for every metric")]
    trends: bool,
    #[arg(long, help = "Print meaning and formula for every metric")]
    explain: bool,
    #[arg(long = "csv-out", value_name = "PATH", help = "Write the CSV export here")]
    csv_out: Option<PathBuf>,
    #[arg(long = "xlsx-out", value_name = "PATH", help = "Write the XLSX export here")]
    xlsx_out: Option<PathBuf>,
    #[arg(long = "json-out", value_name = "PATH", help = "Write the narrative request JSON here")]
    json_out: Option<PathBuf>,
    #[arg(long = "max-weeks", value_name = "N", value_parser = parse_positive_usize, help = "Trend window in weeks")]
    max_weeks: Option<usize>,
    #[arg(long = "max-rows", value_name = "N", value_parser = parse_positive_usize, help = "Pipeline row ceiling for the upload")]
    max_rows: Option<usize>,
}

impl KpiReportCli {
    fn filters(&self) -> FilterSpec {
        fn some<T: Clone>(values: &[T]) -> Option<Vec<T>> {
            (!values.is_empty()).then(|| values.to_vec())
        }
        FilterSpec {
            date_from: self.date_from,
            date_to: self.date_to,
            business_units: some(&self.business_units),
            locations: some(&self.location),
            roles: some(&self.role),
            sources: some(&self.source),
            candidate_types: some(&self.candidate_types),
            statuses: some(&self.status),
            recruiters: some(&self.recruiter),
            ..FilterSpec::default()
        }
    }

    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(max_weeks) = self.max_weeks {
            config = config.with_trend_max_weeks(max_weeks);
        }
        if let Some(max_rows) = self.max_rows {
            config = config.with_max_pipeline_rows(max_rows);
        }
        config
    }
}

/// Load one file, print the KPI report, and write any requested exports.
pub fn run_kpi_report<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<KpiReportCli, _>(std::iter::once("kpi_report".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = cli.config();
    config.validate()?;
    let session = CockpitSession::new(config);
    let dataset = session.upload_path(&cli.input)?;
    let filters = cli.filters();

    println!("=== ta cockpit kpi report ===");
    println!("{}", session.label(&filters)?);
    println!("filters: {}", filter_summary(&filters));
    println!();
    print_diagnostics(&dataset);

    let catalog = session.catalog(&filters)?;
    for cluster in &catalog {
        println!("[{}]", cluster.title.to_uppercase());
        for tile in &cluster.tiles {
            println!(
                "  {:<6} {:<42} {:>14}   target {}",
                tile.rag.as_str(),
                tile.title,
                tile.value_text,
                tile.threshold_text
            );
            for fact in &tile.supporting_facts {
                println!("         - {fact}");
            }
        }
        println!();
    }

    let (insights, score) = session.summary(&filters)?;
    println!("[KEY INSIGHTS]");
    if insights.is_empty() {
        println!("  none: no metric is computable on this slice");
    }
    for insight in &insights {
        println!("  {}: {}", insight.title, insight.text);
    }
    println!("health score: {score}");
    println!();

    if cli.breakdowns {
        println!("[BREAKDOWNS]");
        for tile in all_tiles(&catalog).filter(|tile| tile.value_num.is_some() && tile.rag != Rag::Green) {
            for breakdown in session.breakdowns(&tile.id, &filters)? {
                println!("  {} by {}", tile.title, breakdown.dimension_label);
                for bar in &breakdown.bars {
                    println!(
                        "    {:<28} {:>14} {:<6} rows={}",
                        bar.dimension_value,
                        bar.value_text,
                        bar.rag.as_str(),
                        bar.row_count
                    );
                }
            }
        }
        println!();
    }

    if cli.trends {
        println!("[TRENDS]");
        for id in session.registry().ids() {
            let series = session.trend(id, &filters)?;
            println!("  {:<52} {} ({} weeks)", id, series.summary, series.points.len());
        }
        println!();
    }

    if cli.explain {
        println!("[DEFINITIONS]");
        for tile in all_tiles(&catalog) {
            if let Some(definition) = session.registry().get(&tile.id) {
                let explanation = explain_metric(definition, None);
                println!("  {}: {}", explanation.title, explanation.meaning);
                println!("    formula: {}", explanation.formula);
                if let Some(gap) = tile.gap_to_target() {
                    println!("    {gap}");
                }
            }
        }
        println!();
    }

    if let Some(path) = &cli.csv_out {
        write_output(path, &session.export_csv(&filters)?)?;
    }
    if let Some(path) = &cli.xlsx_out {
        write_output(path, &session.export_xlsx(&filters)?)?;
    }
    if let Some(path) = &cli.json_out {
        let request = session.narrative_request(&filters)?;
        write_output(path, request.to_json()?.as_bytes())?;
    }

    Ok(())
}

fn print_diagnostics(dataset: &Dataset) {
    let diagnostics = &dataset.diagnostics;
    println!("[DIAGNOSTICS]");
    println!("  input: {:?}", diagnostics.input);
    for sheet in &diagnostics.sheets {
        println!("  sheet {:<26} rows={}", sheet.name, sheet.row_count);
    }
    if let Some(joins) = &diagnostics.joins {
        println!(
            "  candidate coverage: {:.1}%  requisition coverage: {:.1}%",
            joins.candidate_coverage() * 100.0,
            joins.requisition_coverage() * 100.0
        );
    }
    for warning in &diagnostics.warnings {
        println!("  warning: {warning}");
    }
    println!();
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    println!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD, got '{raw}'"))
}

fn parse_candidate_type_arg(raw: &str) -> Result<CandidateType, String> {
    CandidateType::parse(raw).ok_or_else(|| format!("expected Internal or External, got '{raw}'"))
}

fn parse_status_arg(raw: &str) -> Result<PipelineStatus, String> {
    PipelineStatus::parse(raw).ok_or_else(|| format!("expected Active, Rejected, or Hired, got '{raw}'"))
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("expected a positive integer, got '{raw}'"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> KpiReportCli {
        parse_cli::<KpiReportCli, _>(
            std::iter::once("kpi_report").chain(args.iter().copied()),
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn repeated_flags_become_filter_selections() {
        let cli = parse(&[
            "--input",
            "data.xlsx",
            "--business-unit",
            "Technology",
            "--business-unit",
            "Finance",
            "--status",
            "Hired",
            "--date-from",
            "2024-01-01",
        ]);
        let filters = cli.filters();
        assert_eq!(
            filters.business_units,
            Some(vec!["Technology".to_string(), "Finance".to_string()])
        );
        assert_eq!(filters.statuses, Some(vec![PipelineStatus::Hired]));
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filters.locations, None);
    }

    #[test]
    fn limits_map_onto_config() {
        let cli = parse(&["--input", "data.csv", "--max-weeks", "8", "--max-rows", "500"]);
        let config = cli.config();
        assert_eq!(config.trend_max_weeks, 8);
        assert_eq!(config.max_pipeline_rows, 500);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_date_arg("01/02/2024").is_err());
        assert!(
            parse_cli::<KpiReportCli, _>(["kpi_report", "--input", "a.csv", "--max-weeks", "x"])
                .is_err()
        );
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(
            parse_cli::<KpiReportCli, _>(["kpi_report", "--help"])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn report_runs_end_to_end_on_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pipeline.csv");
        fs::write(
            &input,
            "Application_ID,Candidate_ID,Business_Unit,Skill_Match_Percentage,Application_Date\n\
             A1,C1,Technology,80,2024-01-02\n\
             A2,C2,Finance,50,2024-01-09\n",
        )
        .unwrap();
        let csv_out = dir.path().join("out/metrics.csv");
        run_kpi_report(
            [
                "--input",
                input.to_str().unwrap(),
                "--breakdowns",
                "--trends",
                "--csv-out",
                csv_out.to_str().unwrap(),
            ]
            .into_iter()
            .map(String::from),
        )
        .unwrap();
        let written = fs::read_to_string(csv_out).unwrap();
        assert!(written.starts_with("cluster,metricId"));
    }
}
