use std::path::PathBuf;
use std::process::{Command, Output};
use tabstat::aggregate;
use tabstat::analyzers::analyzer::{
    age_groups, find_people, group_averages, product_revenue, products, revenue_for,
    rows_at_or_above, shares, youngest_oldest,
};
use tabstat::analyzers::category::AgeBounds;
use tabstat::analyzers::types::{Reduction, SummaryReport};
use tabstat::output::{format_table, save_report};
use tabstat::source::{SourceError, read_csv_pairs, read_csv_table, read_people};
use tabstat::stats::ColumnStats;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_weekday_averages() {
    let groups = group_averages(fixture("temperature_data.csv"), "Day", "Temperature", b',')
        .expect("Failed to load temperature fixture");

    let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys.len(), 7);
    assert!(!keys.contains(&""));

    let monday = groups.iter().find(|g| g.key == "Monday").unwrap();
    assert_eq!(monday.value, 71.25);
    assert_eq!(monday.count, 4);

    let sunday = groups.iter().find(|g| g.key == "Sunday").unwrap();
    assert_eq!(sunday.value, 77.0);
    assert_eq!(sunday.count, 1);

    let lines = format_table(&groups, "°F");
    assert_eq!(lines[0], "Monday       : 71.25°F");
    assert!(lines[6].starts_with("Sunday"));
}

#[test]
fn test_aggregate_matches_loader_pipeline() {
    let pairs = read_csv_pairs(fixture("temperature_data.csv"), "Day", "Temperature", b',').unwrap();
    let summary = aggregate(pairs.clone());

    assert_eq!(summary["Tuesday"], 69.0);
    assert_eq!(summary["Wednesday"], 75.0);
    assert_eq!(summary, aggregate(pairs));
}

#[test]
fn test_product_revenue() {
    let groups = product_revenue(fixture("sales_data.csv"), b',').unwrap();

    assert_eq!(products(&groups), vec!["Keyboard", "Laptop", "Mouse"]);
    assert_eq!(revenue_for(&groups, "Laptop"), 12000.0);
    assert_eq!(revenue_for(&groups, "Mouse"), 637.5);
    assert_eq!(revenue_for(&groups, "Keyboard"), 600.0);
    assert_eq!(revenue_for(&groups, "Monitor"), 0.0);
}

#[test]
fn test_age_categories() {
    let people = read_people(fixture("multi_person_data.json")).unwrap();
    assert_eq!(people.len(), 6);

    let groups = age_groups(&people, &AgeBounds::default());
    let summary: Vec<(&str, usize, f64)> = groups
        .iter()
        .map(|g| (g.key.as_str(), g.count, g.value))
        .collect();
    assert_eq!(
        summary,
        vec![("Adult", 2, 38.5), ("Minor", 1, 12.0), ("Senior", 2, 78.0)]
    );

    let (youngest, oldest) = youngest_oldest(&people).unwrap();
    assert_eq!(youngest.name, "Ana");
    assert_eq!(oldest.name, "mk");

    let seniors = age_groups(&people, &AgeBounds::new(Some(60.0), None));
    assert_eq!(seniors.len(), 1);
    assert_eq!(seniors[0].count, 2);

    let found = find_people(&people, "SARAH", true);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].age, Some(32.0));
}

#[test]
fn test_column_summary_and_counts() {
    let table = read_csv_table(fixture("daily_weather.csv"), b',').unwrap();
    let raw = table.column("High_Temp_F").unwrap();
    let values: Vec<f64> = raw.iter().map(|s| s.parse().unwrap()).collect();
    let stats = ColumnStats::from_raw("High_Temp_F", &raw).with_threshold(&values, 75.0);

    assert_eq!(stats.count, 5);
    assert!((stats.mean - 70.8).abs() < 1e-9);
    assert_eq!(stats.min, Some(60.0));
    assert_eq!(stats.max, Some(78.0));
    assert_eq!(stats.at_or_above, Some(2));

    let date = table.column_index("Date").unwrap();
    let condition = table.column_index("Condition").unwrap();
    let hottest = stats.max_row.unwrap();
    assert_eq!(table.cell(hottest, date), "2025-10-09");
    assert_eq!(table.cell(hottest, condition), "Sunny");
    let coldest = stats.min_row.unwrap();
    assert_eq!(table.cell(coldest, date), "2025-10-08");
    assert_eq!(table.cell(coldest, condition), "Rainy");

    let counts = shares(&table.column("Condition").unwrap());
    assert_eq!(counts[0].key, "Sunny");
    assert_eq!(counts[0].count, 3);
    assert_eq!(counts[0].percent, 60.0);
    assert_eq!(counts.len(), 3);

    let hot = rows_at_or_above(&table, "High_Temp_F", 75.0).unwrap();
    let dates: Vec<&str> = hot.iter().map(|row| row[date].as_str()).collect();
    assert_eq!(dates, vec!["2025-10-06", "2025-10-09"]);
}

#[test]
fn test_missing_source_is_distinct_from_malformed() {
    let missing = group_averages(fixture("nope.csv"), "Day", "Temperature", b',').unwrap_err();
    assert!(matches!(missing, SourceError::NotFound { .. }));

    let malformed = group_averages(fixture("sales_data.csv"), "Day", "Temperature", b',').unwrap_err();
    assert!(matches!(malformed, SourceError::Malformed { .. }));
}

#[test]
fn test_report_round_trip_to_csv() {
    let path = format!("{}/tabstat_integration_report.csv", std::env::temp_dir().display());
    let _ = std::fs::remove_file(&path);

    let groups = product_revenue(fixture("sales_data.csv"), b',').unwrap();
    save_report(&path, &SummaryReport::new("sales_data.csv", Reduction::Sum, groups)).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "key,value,count");
    assert_eq!(lines[2], "Laptop,12000.0,3");

    std::fs::remove_file(&path).unwrap();
}

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn run_tabstat(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabstat"))
        .args(args)
        .current_dir(std::env::temp_dir())
        .env("LOG_FILE_PATH", std::env::temp_dir().join("tabstat_logs/cli.log"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tabstat")
}

#[test]
fn test_cli_missing_input_fails_without_output() {
    let output = temp_path("tabstat_cli_missing.json");
    let missing = fixture("missing.csv");

    let result = run_tabstat(&["average", &missing, "-o", output.to_str().unwrap()]);

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_cli_average_writes_report_and_history() {
    let output = temp_path("tabstat_cli_average.json");
    let history = temp_path("tabstat_cli_history.csv");
    let input = fixture("temperature_data.csv");

    for _ in 0..2 {
        let result = run_tabstat(&[
            "average",
            &input,
            "-o",
            output.to_str().unwrap(),
            "--append",
            history.to_str().unwrap(),
        ]);
        assert!(result.status.success());
    }

    let stdout = String::from_utf8_lossy(&run_tabstat(&["average", &input]).stdout).to_string();
    assert!(stdout.contains("Monday       : 71.25°F"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["reduction"], "mean");
    assert_eq!(report["groups"].as_array().unwrap().len(), 7);

    let lines = std::fs::read_to_string(&history).unwrap();
    let lines: Vec<&str> = lines.lines().collect();
    assert_eq!(lines.len(), 1 + 2 * 7);
    assert_eq!(lines[0], "generated_at,source,reduction,key,value,count");

    std::fs::remove_file(&output).unwrap();
    std::fs::remove_file(&history).unwrap();
}

#[test]
fn test_cli_summary_labels_and_export() {
    let export = temp_path("tabstat_cli_hot_days.csv");
    let input = fixture("daily_weather.csv");

    let result = run_tabstat(&[
        "summary",
        &input,
        "--above",
        "75",
        "--export-above",
        export.to_str().unwrap(),
    ]);
    assert!(result.status.success());

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Highest      : 78 (2025-10-09, Sunny)"));
    assert!(stdout.contains("Lowest       : 60 (2025-10-08, Rainy)"));

    let exported = std::fs::read_to_string(&export).unwrap();
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Date,High_Temp_F,Low_Temp_F,Condition,Humidity_%");
    assert!(lines[2].starts_with("2025-10-09,78"));

    std::fs::remove_file(&export).unwrap();
}

#[test]
fn test_cli_ages_bounds_and_lookup() {
    let input = fixture("multi_person_data.json");

    let result = run_tabstat(&["ages", &input, "--min-age", "60", "--name", "john", "--partial"]);
    assert!(result.status.success());

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("People aged 60 and above:"));
    assert!(!stdout.contains("1.7976931348623157e308"));
    assert!(stdout.contains("Matching 'john':"));
    assert!(stdout.contains("Oldest       : mk (89, Senior)"));

    let inverted = run_tabstat(&["ages", &input, "--min-age", "70", "--max-age", "30"]);
    assert!(!inverted.status.success());
}
