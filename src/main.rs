//! CLI entry point for tabstat.
//!
//! Provides subcommands for averaging a value column per group, totaling
//! product revenue, summarizing people by age category, and describing a
//! single numeric column.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use tabstat::analyzers::analyzer::{
    age_groups, find_people, group_averages, people_in_range, product_revenue, products,
    revenue_for, rows_at_or_above, shares, youngest_oldest,
};
use tabstat::analyzers::category::{AgeBounds, age_category};
use tabstat::analyzers::types::{Reduction, ShareRow, SummaryReport, parse_finite};
use tabstat::config::{LogConfig, env_filter};
use tabstat::output::{
    append_report, format_table, is_json_path, print_table, save_report, write_csv, write_json,
    write_rows,
};
use tabstat::source::{CsvTable, Person, read_csv_table, read_people};
use tabstat::stats::ColumnStats;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tabstat")]
#[command(about = "Grouped statistics over small CSV and JSON files", long_about = None)]
struct Cli {
    /// Field delimiter for CSV input
    #[arg(short, long, global = true, default_value_t = ',', value_parser = parse_delimiter)]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average a value column for every distinct key (e.g. temperature per weekday)
    Average {
        /// CSV file with a header row
        #[arg(value_name = "FILE", default_value = "temperature_data.csv")]
        input: String,

        /// Column holding the group label
        #[arg(short, long, default_value = "Day")]
        key: String,

        /// Column holding the numeric reading
        #[arg(short, long, default_value = "Temperature")]
        value: String,

        /// Unit suffix for displayed values
        #[arg(short, long, default_value = "°F")]
        unit: String,

        /// Write results to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        output: Option<String>,

        /// Append one line per group to this CSV history file
        #[arg(long, value_name = "PATH")]
        append: Option<String>,
    },
    /// Total revenue (quantity x price) per product
    Revenue {
        /// CSV file with product, quantity and price columns
        #[arg(value_name = "FILE", default_value = "sales_data.csv")]
        input: String,

        /// Only report this product (case-sensitive)
        #[arg(short, long)]
        product: Option<String>,

        /// Write results to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        output: Option<String>,

        /// Append one line per product to this CSV history file
        #[arg(long, value_name = "PATH")]
        append: Option<String>,
    },
    /// Count people and average their age per age category
    Ages {
        /// JSON file with a people list
        #[arg(value_name = "FILE", default_value = "multi_person_data.json")]
        input: String,

        /// Lowest age to include
        #[arg(long)]
        min_age: Option<f64>,

        /// Highest age to include
        #[arg(long)]
        max_age: Option<f64>,

        /// Look a person up by name, ignoring case
        #[arg(short, long)]
        name: Option<String>,

        /// Match any name containing --name
        #[arg(long, requires = "name")]
        partial: bool,

        /// Write results to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Describe one numeric column: count, mean, min, max and spread
    Summary {
        /// CSV file with a header row
        #[arg(value_name = "FILE", default_value = "temperature_data.csv")]
        input: String,

        /// Numeric column to describe
        #[arg(short, long, default_value = "High_Temp_F")]
        column: String,

        /// Also count values at or above this threshold
        #[arg(short, long)]
        above: Option<f64>,

        /// Also show the frequency of each value in this column
        #[arg(long)]
        count_by: Option<String>,

        /// Column shown next to the highest and lowest value (default: Date and
        /// Condition, when present)
        #[arg(short, long)]
        label: Vec<String>,

        /// Write the rows at or above --above to this CSV file
        #[arg(long, value_name = "PATH", requires = "above")]
        export_above: Option<String>,

        /// Write results to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Serialize)]
struct SummaryOutput {
    stats: ColumnStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    counts: Option<Vec<ShareRow>>,
}

fn parse_delimiter(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing(&LogConfig::from_env());
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Colored stderr logs plus a daily-rolling JSON log file.
fn init_tracing(config: &LogConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

fn run(cli: Cli) -> Result<()> {
    let delimiter = cli.delimiter as u8;

    match cli.command {
        Commands::Average {
            input,
            key,
            value,
            unit,
            output,
            append,
        } => {
            let groups = group_averages(&input, &key, &value, delimiter)?;
            if groups.is_empty() {
                warn!(input = %input, "No valid rows found");
            }

            print_table(
                &format!("Average {value} for each {key}:"),
                &format_table(&groups, &unit),
            );

            let report = SummaryReport::new(input, Reduction::Mean, groups);
            export(&report, output.as_deref(), append.as_deref())?;
        }
        Commands::Revenue {
            input,
            product,
            output,
            append,
        } => {
            let groups = product_revenue(&input, delimiter)?;

            match &product {
                Some(name) => {
                    let revenue = revenue_for(&groups, name);
                    println!("Total revenue for {name}: ${revenue:.2}");
                }
                None => {
                    println!("Available products: {}\n", products(&groups).join(", "));
                    for group in &groups {
                        println!("Total revenue for {}: ${:.2}", group.key, group.value);
                    }
                }
            }

            let groups = match &product {
                Some(name) => groups.into_iter().filter(|g| &g.key == name).collect(),
                None => groups,
            };
            let report = SummaryReport::new(input, Reduction::Sum, groups);
            export(&report, output.as_deref(), append.as_deref())?;
        }
        Commands::Ages {
            input,
            min_age,
            max_age,
            name,
            partial,
            output,
        } => {
            let bounds = AgeBounds::new(min_age, max_age);
            if bounds.is_inverted() {
                bail!("--min-age is greater than --max-age ({bounds})");
            }

            let people = read_people(&input)?;
            let groups = age_groups(&people, &bounds);
            info!(people = people.len(), categories = groups.len(), "Ages grouped");

            println!("Age categories:");
            println!("{}", "-".repeat(50));
            for group in &groups {
                println!(
                    "{:12} : {} people, mean age {:.1}",
                    group.key, group.count, group.value
                );
            }

            if let Some((youngest, oldest)) = youngest_oldest(&people) {
                println!();
                println!("{:12} : {}", "Youngest", describe_person(youngest));
                println!("{:12} : {}", "Oldest", describe_person(oldest));
            }

            if !bounds.is_unbounded() {
                println!("\nPeople {bounds}:");
                for person in people_in_range(&people, &bounds) {
                    println!("  {}", describe_person(person));
                }
            }

            if let Some(query) = &name {
                let found = find_people(&people, query, partial);
                if found.is_empty() {
                    println!("\nNo one matching '{query}'");
                } else {
                    println!("\nMatching '{query}':");
                    for person in found {
                        println!("  {}", describe_person(person));
                    }
                }
            }

            if let Some(path) = output {
                save_report(&path, &SummaryReport::new(input, Reduction::Mean, groups))?;
            }
        }
        Commands::Summary {
            input,
            column,
            above,
            count_by,
            label,
            export_above,
            output,
        } => {
            let table = read_csv_table(&input, delimiter)?;
            let raw = table.column(&column)?;
            let mut stats = ColumnStats::from_raw(&column, &raw);
            if let Some(threshold) = above {
                let values: Vec<f64> = raw.iter().filter_map(|s| parse_finite(s)).collect();
                stats = stats.with_threshold(&values, threshold);
            }

            let counts = match &count_by {
                Some(category) => Some(shares(&table.column(category)?)),
                None => None,
            };

            let labels = label_columns(&table, &label)?;
            print_stats(&stats, &table, &labels);
            if let (Some(category), Some(counts)) = (&count_by, &counts) {
                println!("\n{category}:");
                for share in counts {
                    println!("- {}: {} ({:.1}%)", share.key, share.count, share.percent);
                }
            }

            if let (Some(path), Some(threshold)) = (&export_above, above) {
                let rows = rows_at_or_above(&table, &column, threshold)?;
                let written = write_rows(path, &table.headers, rows)?;
                info!(path = %path, rows = written, "Rows exported");
            }

            if let Some(path) = output {
                if is_json_path(&path) {
                    write_json(&path, &SummaryOutput { stats, counts })?;
                } else {
                    write_csv(&path, &[stats])?;
                }
                info!(path = %path, "Summary saved");
            }
        }
    }

    Ok(())
}

fn export(report: &SummaryReport, output: Option<&str>, append: Option<&str>) -> Result<()> {
    if let Some(path) = output {
        save_report(path, report)?;
    }
    if let Some(path) = append {
        append_report(path, report)?;
    }
    Ok(())
}

fn describe_person(person: &Person) -> String {
    match person.age {
        Some(age) => format!("{} ({age}, {})", person.name, age_category(age)),
        None => format!("{} (age unknown)", person.name),
    }
}

/// Resolves the columns used to label the extreme rows. Without explicit
/// labels, `Date` and `Condition` are used when the file has them.
fn label_columns(table: &CsvTable, requested: &[String]) -> Result<Vec<usize>> {
    if requested.is_empty() {
        return Ok(["Date", "Condition"]
            .iter()
            .filter_map(|name| table.column_index(name).ok())
            .collect());
    }
    Ok(requested
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<Vec<_>, _>>()?)
}

fn row_label(table: &CsvTable, row: Option<usize>, columns: &[usize]) -> String {
    let Some(row) = row else {
        return String::new();
    };
    let cells: Vec<&str> = columns
        .iter()
        .map(|&column| table.cell(row, column))
        .filter(|cell| !cell.trim().is_empty())
        .collect();
    if cells.is_empty() {
        String::new()
    } else {
        format!(" ({})", cells.join(", "))
    }
}

fn print_stats(stats: &ColumnStats, table: &CsvTable, labels: &[usize]) {
    println!("{} statistics:", stats.column);
    println!("{}", "-".repeat(50));
    println!("{:12} : {}", "Rows", stats.rows);
    println!("{:12} : {}", "Valid", stats.count);
    println!("{:12} : {:.1}", "Mean", stats.mean);
    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("{:12} : {min}{}", "Lowest", row_label(table, stats.min_row, labels));
        println!("{:12} : {max}{}", "Highest", row_label(table, stats.max_row, labels));
    }
    println!("{:12} : {:.2}", "Std dev", stats.stddev);
    if let (Some(threshold), Some(count)) = (stats.threshold, stats.at_or_above) {
        println!("{:12} : {count}", format!(">= {threshold}"));
    }
}
