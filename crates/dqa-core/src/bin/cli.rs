use dqa_core::{
    AssessmentConfig, AssessmentReconciliation, ComparisonReport, ComparisonScope, PeriodType,
    ReconciliationEngine, SourceKind, SourceRows, SqliteDocumentStore, expand,
    load_assessment_config, load_rows_from_csv, load_rows_from_json, reconcile_assessment,
    record_summary, save_report_to_csv, save_report_to_json,
};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Write};
use std::str::FromStr;

fn render_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Float64(v) => v.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| {
                col.get(row_idx)
                    .map(|av| render_cell(&av))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_line = |values: &[String]| {
        let mut line = String::from("|");
        for (i, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[i].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_line(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_report(report: &ComparisonReport) -> String {
    match report.to_dataframe() {
        Ok(df) => format!(
            "{}\n{}",
            report.summary.to_cli_summary(),
            render_df_as_text_table(&df)
        ),
        Err(e) => format!("Could not build table: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  expand [<period> <frequency> <period_type>]\n                                     Expand a period (defaults to the assessment)\n  assess show                        Show the current assessment\n  assess load <json_path>            Load assessment configuration from JSON\n  assess set <period> <frequency> <period_type> <org_unit>\n                                     Update the assessment period and scope\n  assess variance <pct>              Set acceptable variance in percent\n  load <source> <json|csv> <path>    Load rows for register|summary|reported|correction\n  sources                            Show loaded row counts\n  clear                              Drop all loaded rows\n  compare <period> [org_unit]        Compare sources for one period\n  reconcile                          Compare every sub-period of the assessment\n  show                               Show the last comparison\n  export <json|csv> <path>           Write the last comparison to disk\n  record <db_path>                   Append last summaries to a sqlite document store\n  quit|exit                          Exit"
    );
}

fn print_assessment(config: &AssessmentConfig) {
    println!("Assessment id      : {}", config.id);
    println!("Assessment name    : {}", config.name);
    println!("Period             : {}", config.period);
    println!("Frequency          : {}", config.frequency);
    println!("Dataset period type: {}", config.dataset_period_type);
    println!("Org unit           : {}", config.org_unit);
    match config.acceptable_variance_pct {
        Some(pct) => println!("Acceptable variance: {pct}%"),
        None => println!("Acceptable variance: -"),
    }
}

fn print_sources(sources: &SourceRows) {
    for kind in SourceKind::ALL {
        println!("{:<11}: {} rows", kind.as_str(), sources.rows(kind).len());
    }
}

fn parse_period_type(value: Option<&str>) -> Option<PeriodType> {
    value.and_then(|v| PeriodType::from_str(v).ok())
}

struct Session {
    assessment: AssessmentConfig,
    sources: SourceRows,
    last_report: Option<ComparisonReport>,
    last_reconciliation: Option<AssessmentReconciliation>,
}

impl Session {
    fn last_summaries(&self) -> Vec<&dqa_core::ComparisonSummary> {
        if let Some(run) = &self.last_reconciliation {
            return run.reports.iter().map(|r| &r.summary).collect();
        }
        self.last_report.iter().map(|r| &r.summary).collect()
    }
}

fn main() {
    env_logger::init();

    let mut session = Session {
        assessment: AssessmentConfig::default(),
        sources: SourceRows::new(),
        last_report: None,
        last_reconciliation: None,
    };

    println!("DQA Reconciliation Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "expand" => {
                let period = parts.next();
                let (period, frequency, period_type) = match period {
                    None => (
                        session.assessment.period.clone(),
                        Some(session.assessment.frequency),
                        Some(session.assessment.dataset_period_type),
                    ),
                    Some(period) => (
                        period.to_string(),
                        parse_period_type(parts.next()),
                        parse_period_type(parts.next()),
                    ),
                };
                match (frequency, period_type) {
                    (Some(frequency), Some(period_type)) => {
                        let expansion = expand(&period, frequency, period_type);
                        for sub in &expansion.periods {
                            println!("  {:<10} {:<20} {}", sub.id, sub.display_name, sub.period_type);
                        }
                        if expansion.is_degraded() {
                            println!("Expansion degraded: {:?}", expansion.outcome);
                        }
                    }
                    _ => println!("Usage: expand <period> <frequency> <period_type>"),
                }
            }
            "assess" => match parts.next() {
                Some("show") => print_assessment(&session.assessment),
                Some("load") => match parts.next() {
                    Some(path) => match load_assessment_config(path) {
                        Ok(config) => {
                            session.assessment = config;
                            println!("Assessment loaded from {path}.");
                            print_assessment(&session.assessment);
                        }
                        Err(e) => println!("Load error: {e}"),
                    },
                    None => println!("Usage: assess load <json_path>"),
                },
                Some("set") => {
                    let period = parts.next();
                    let frequency = parse_period_type(parts.next());
                    let period_type = parse_period_type(parts.next());
                    let org_unit = parts.next();
                    match (period, frequency, period_type, org_unit) {
                        (Some(period), Some(frequency), Some(period_type), Some(org_unit)) => {
                            let mut updated = session.assessment.clone();
                            updated.period = period.to_string();
                            updated.frequency = frequency;
                            updated.dataset_period_type = period_type;
                            updated.org_unit = org_unit.to_string();
                            match updated.validate() {
                                Ok(()) => {
                                    session.assessment = updated;
                                    println!("Assessment updated.");
                                }
                                Err(e) => println!("Error: {e}"),
                            }
                        }
                        _ => println!(
                            "Usage: assess set <period> <frequency> <period_type> <org_unit>"
                        ),
                    }
                }
                Some("variance") => match parts.next().map(str::parse::<f64>) {
                    Some(Ok(pct)) => {
                        let mut updated = session.assessment.clone();
                        updated.acceptable_variance_pct = Some(pct);
                        match updated.validate() {
                            Ok(()) => {
                                session.assessment = updated;
                                println!("Acceptable variance set to {pct}%.");
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: assess variance <pct>"),
                },
                _ => println!("Usage: assess <show|load|set|variance>"),
            },
            "load" => {
                let kind = parts.next().map(SourceKind::from_str);
                let format = parts.next();
                let path = parts.next();
                match (kind, format, path) {
                    (Some(Ok(kind)), Some(format), Some(path)) => {
                        let result = match format.to_ascii_lowercase().as_str() {
                            "json" => load_rows_from_json(path),
                            "csv" => load_rows_from_csv(path),
                            other => {
                                println!("Unsupported format '{other}'. Use json or csv.");
                                continue;
                            }
                        };
                        match result {
                            Ok(rows) => {
                                println!("Loaded {} {} rows from {path}.", rows.len(), kind);
                                *session.sources.rows_mut(kind) = rows;
                            }
                            Err(e) => println!("Load error: {e}"),
                        }
                    }
                    (Some(Err(e)), _, _) => println!("{e}"),
                    _ => println!("Usage: load <source> <json|csv> <path>"),
                }
            }
            "sources" => print_sources(&session.sources),
            "clear" => {
                session.sources = SourceRows::new();
                session.last_report = None;
                session.last_reconciliation = None;
                println!("Sources cleared.");
            }
            "compare" => match parts.next() {
                Some(period) => {
                    let org_unit = parts
                        .next()
                        .map(str::to_string)
                        .unwrap_or_else(|| session.assessment.org_unit.clone());
                    let scoped = session.sources.scoped(period, &org_unit);
                    let scope = ComparisonScope::new(period, org_unit);
                    let report = ReconciliationEngine::new(&scoped).compare(&scope);
                    println!("{}", render_report(&report));
                    session.last_report = Some(report);
                    session.last_reconciliation = None;
                }
                None => println!("Usage: compare <period> [org_unit]"),
            },
            "reconcile" => match reconcile_assessment(&session.assessment, &session.sources) {
                Ok(run) => {
                    if run.expansion.is_degraded() {
                        println!("Expansion degraded: {:?}", run.expansion.outcome);
                    }
                    for report in &run.reports {
                        println!("{}", render_report(report));
                    }
                    let totals = &run.totals;
                    print!(
                        "Reconciled {} period(s): total={}, mismatches={}, missing={}",
                        run.reports.len(),
                        totals.total,
                        totals.mismatches,
                        totals.missing
                    );
                    match totals.beyond_tolerance {
                        Some(count) => println!(", beyond_tolerance={count}"),
                        None => println!(),
                    }
                    session.last_report = run.reports.last().cloned();
                    session.last_reconciliation = Some(run);
                }
                Err(e) => println!("Reconcile error: {e}"),
            },
            "show" => match &session.last_report {
                Some(report) => println!("{}", render_report(report)),
                None => println!("No comparison run yet."),
            },
            "export" => {
                let format = parts.next();
                let path = parts.next();
                let Some(report) = &session.last_report else {
                    println!("No comparison run yet.");
                    continue;
                };
                match (format, path) {
                    (Some("json"), Some(path)) => match save_report_to_json(report, path) {
                        Ok(()) => println!("Comparison saved to {path}."),
                        Err(e) => println!("Save error: {e}"),
                    },
                    (Some("csv"), Some(path)) => match save_report_to_csv(report, path) {
                        Ok(()) => println!("Comparison saved to {path}."),
                        Err(e) => println!("Save error: {e}"),
                    },
                    _ => println!("Usage: export <json|csv> <path>"),
                }
            }
            "record" => match parts.next() {
                Some(path) => {
                    let summaries = session.last_summaries();
                    if summaries.is_empty() {
                        println!("No comparison run yet.");
                        continue;
                    }
                    let store = match SqliteDocumentStore::new(path) {
                        Ok(store) => store,
                        Err(e) => {
                            println!("Store error: {e}");
                            continue;
                        }
                    };
                    for summary in summaries {
                        match record_summary(&store, summary) {
                            Ok(count) => println!(
                                "Recorded summary for {}/{} ({} stored).",
                                summary.org_unit, summary.period, count
                            ),
                            Err(e) => println!("Store error: {e}"),
                        }
                    }
                }
                None => println!("Usage: record <db_path>"),
            },
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }
}
