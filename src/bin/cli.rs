//! Vitalstream CLI
//!
//! Command-line client for a running Vitalstream server:
//! - Fetch any dashboard view
//! - Ingest a JSON file of metrics
//! - Check server status
//! - Classify a blood-pressure reading offline
//! - Generate a default config file

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

use vitalstream::api::dto::{IngestRequest, IngestResponse};
use vitalstream::backend::Metric;
use vitalstream::store::classify_bp;

#[derive(Parser)]
#[command(name = "vitalstream-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal health telemetry views")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:13001", global = true)]
    pub api_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Daily activity and energy totals
    Summary {
        /// Local date, YYYY-MM-DD (default: today on the server)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Heart rate in 10-minute buckets over the 24 hours ending now
    Hr {
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Blood pressure readings over 30 days
    Bp {
        /// Last local date of the window, YYYY-MM-DD
        #[arg(short, long)]
        end_date: Option<String>,
    },

    /// Glucose samples over 30 days
    Glucose {
        #[arg(short, long)]
        end_date: Option<String>,
    },

    /// Sleep nights over 7 days
    Sleep {
        #[arg(short, long)]
        end_date: Option<String>,
    },

    /// Workouts over 90 days
    Workouts {
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Daily nutrient totals with the 7-day calorie trend
    Dietary {
        #[arg(short, long)]
        end_date: Option<String>,
    },

    /// Today's meals
    Meals {
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Weight and body-fat pairs over 30 days
    Body {
        #[arg(short, long)]
        end_date: Option<String>,
    },

    /// Ingest metrics from a JSON file (`[...]` or `{"metrics": [...]}`)
    Ingest {
        path: PathBuf,
    },

    /// Show server status
    Status,

    /// Classify a blood-pressure reading without contacting the server
    Classify {
        systolic: i64,
        diastolic: i64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let view = match &cli.command {
        Commands::Summary { date } => Some(("summary", "date", date)),
        Commands::Hr { date } => Some(("vitals/hr", "date", date)),
        Commands::Bp { end_date } => Some(("vitals/bp", "end_date", end_date)),
        Commands::Glucose { end_date } => Some(("vitals/glucose", "end_date", end_date)),
        Commands::Sleep { end_date } => Some(("sleep", "end_date", end_date)),
        Commands::Workouts { date } => Some(("workouts", "date", date)),
        Commands::Dietary { end_date } => Some(("dietary/trends", "end_date", end_date)),
        Commands::Meals { date } => Some(("dietary/meals/today", "date", date)),
        Commands::Body { end_date } => Some(("body/composition", "end_date", end_date)),
        _ => None,
    };

    if let Some((path, param, date)) = view {
        let mut request = client.get(format!("{}/api/v1/{}", cli.api_url, path));
        if let Some(date) = date {
            request = request.query(&[(param, date)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            eprintln!("Request failed ({}): {}", status, text);
            std::process::exit(1);
        }

        let data: Value = response.json().await?;
        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
            OutputFormat::Csv => print_csv(&data)?,
            OutputFormat::Table => print_table(&data),
        }
        return Ok(());
    }

    match cli.command {
        Commands::Ingest { path } => {
            let content = std::fs::read_to_string(&path)?;
            let metrics = parse_metrics(&content)?;

            let response = client
                .post(format!("{}/api/v1/ingest", cli.api_url))
                .json(&IngestRequest { metrics })
                .send()
                .await?;

            if response.status().is_success() {
                let result: IngestResponse = response.json().await?;
                println!("Ingested {} metrics from {:?}", result.accepted, path);
            } else {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Ingest failed ({}): {}", status, text);
                std::process::exit(1);
            }
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Vitalstream v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!(
                        "Backend:    {} ({})",
                        health["backend"].as_str().unwrap_or("-"),
                        health["backend_status"].as_str().unwrap_or("-")
                    );
                    println!("Timezone:   {}", health["timezone"].as_str().unwrap_or("-"));

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:     {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Vitalstream API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin vitalstream");
                    std::process::exit(1);
                }
            }
        }

        Commands::Classify {
            systolic,
            diastolic,
        } => {
            println!("{}/{}: {}", systolic, diastolic, classify_bp(systolic, diastolic));
        }

        Commands::Config { output } => {
            let config = vitalstream::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }

        // Views were handled above
        _ => {}
    }

    Ok(())
}

/// Accept either a bare array of metrics or an ingest request body
fn parse_metrics(content: &str) -> Result<Vec<Metric>, serde_json::Error> {
    match serde_json::from_str::<Vec<Metric>>(content) {
        Ok(metrics) => Ok(metrics),
        Err(_) => serde_json::from_str::<IngestRequest>(content).map(|req| req.metrics),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

/// Views return either one record or a list of records
fn records(data: &Value) -> Vec<&serde_json::Map<String, Value>> {
    match data {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(record) => vec![record],
        _ => Vec::new(),
    }
}

fn columns(records: &[&serde_json::Map<String, Value>]) -> Vec<String> {
    records
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.1}", f),
            _ => n.to_string(),
        },
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn print_table(data: &Value) {
    let records = records(data);
    if records.is_empty() {
        println!("No data for the selected range");
        return;
    }

    let columns = columns(&records);
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| columns.iter().map(|c| cell(r.get(c))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    println!("{}", header.join(" | "));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1)));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect();
        println!("{}", line.join(" | "));
    }
}

fn print_csv(data: &Value) -> Result<(), Box<dyn std::error::Error>> {
    let records = records(data);
    let columns = columns(&records);

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| match record.get(c) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }))?;
    }
    writer.flush()?;
    Ok(())
}
