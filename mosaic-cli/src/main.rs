//! mosaic-cli — terminal frontend for the Mind Mosaic quiz server
//!
//! Drives one full session against the HTTP API: welcome quote, five questions
//! answered on stdin, the personality report and tips, an optional social post,
//! and the PDF report saved to disk.
//!
//! # Subcommands
//! - `play [--out <file>] [--platform <name> --tone <funny|serious>]` — take the quiz
//! - `status`                                                         — show server health

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8765";
const DEFAULT_REPORT: &str = "personacraft_pro_report.pdf";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "mosaic-cli", version, about = "Mind Mosaic personality quiz — terminal client")]
struct Cli {
    /// Mind Mosaic HTTP server URL (overrides MOSAIC_HTTP_URL env var)
    #[arg(long, env = "MOSAIC_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Take the quiz interactively
    Play {
        /// Where to save the PDF report
        #[arg(long, default_value = DEFAULT_REPORT)]
        out: PathBuf,

        /// Also draft a post for this platform (LinkedIn, Instagram, Facebook, WhatsApp, Twitter)
        #[arg(long)]
        platform: Option<String>,

        /// Tone for the drafted post
        #[arg(long, default_value = "serious", value_parser = ["funny", "serious"])]
        tone: String,
    },

    /// Show Mind Mosaic server status
    Status,
}

// ============================================================================
// Response Types
// ============================================================================

/// One screen returned by every session endpoint.
#[derive(Debug, Deserialize)]
pub struct ScreenResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub view: ViewBody,
}

/// The main view of a screen, tagged by `view`.
#[derive(Debug, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewBody {
    Welcome {
        title: String,
        quote: String,
    },
    Question {
        index: usize,
        total: usize,
        progress: f64,
        prompt: String,
    },
    Home {
        hint: String,
    },
    PersonalityReport {
        header: String,
        metrics: Vec<MetricRow>,
        chart_header: String,
        chart: Vec<ChartRow>,
    },
    SocialMediaPost {
        header: String,
        post: Option<String>,
    },
    SuccessTips {
        header: String,
        tips: Vec<String>,
    },
    DownloadReport {
        header: String,
        file_name: String,
        href: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartRow {
    #[serde(rename = "trait")]
    pub label: String,
    pub score: f64,
}

/// GET /health
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub classifier: String,
    pub completion_model: String,
    pub sessions: usize,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

// ============================================================================
// Screen Formatting
// ============================================================================

/// Text rendering of one screen returned by the server.
pub fn format_screen(view: &ViewBody) -> String {
    let mut out = String::new();
    match view {
        ViewBody::Welcome { title, quote } => {
            out.push_str(&format!("{title}\n\n"));
            out.push_str(&format!("  {}\n", quote.trim()));
        }
        ViewBody::Question {
            index,
            total,
            progress,
            prompt,
        } => {
            out.push_str(&format!(
                "[{}] Question {} of {}\n",
                progress_bar(*progress),
                index + 1,
                total
            ));
            out.push_str(&format!("### {prompt}\n"));
        }
        ViewBody::Home { hint } => out.push_str(&format!("{hint}\n")),
        ViewBody::PersonalityReport {
            header,
            metrics,
            chart_header,
            chart,
        } => {
            out.push_str(&format!("{header}\n"));
            for m in metrics {
                out.push_str(&format!("  {:<18} {}\n", m.label, m.value));
            }
            out.push_str(&format!("\n{chart_header}\n"));
            for bar in chart {
                out.push_str(&format!(
                    "  {:<18} {}\n",
                    bar.label,
                    "█".repeat((bar.score.clamp(0.0, 1.0) * 40.0).round() as usize)
                ));
            }
        }
        ViewBody::SocialMediaPost { header, post } => {
            out.push_str(&format!("{header}\n"));
            match post {
                Some(post) => out.push_str(&format!("\n  {}\n", post.trim())),
                None => out.push_str("  (no post generated yet)\n"),
            }
        }
        ViewBody::SuccessTips { header, tips } => {
            out.push_str(&format!("{header}\n"));
            for tip in tips {
                out.push_str(&format!("  • {tip}\n"));
            }
        }
        ViewBody::DownloadReport {
            header, file_name, ..
        } => {
            out.push_str(&format!("{header}\n"));
            out.push_str(&format!("  {file_name}\n"));
        }
        ViewBody::Unknown => out.push_str("(unsupported view; update mosaic-cli)\n"),
    }
    out
}

fn progress_bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(20 - filled))
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

struct MosaicClient {
    http: reqwest::blocking::Client,
    server: String,
}

impl MosaicClient {
    fn new(server: &str) -> anyhow::Result<Self> {
        // Generation calls are unbounded upstream, so allow a generous timeout.
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            server: server.to_string(),
        })
    }

    fn check(resp: reqwest::blocking::Response) -> anyhow::Result<reqwest::blocking::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body: ErrorResponse = resp.json().unwrap_or_default();
        if body.error.is_empty() {
            bail!("server returned {status}")
        }
        bail!("server returned {}: {}", status, body.error)
    }

    fn create_session(&self) -> anyhow::Result<ScreenResponse> {
        let url = format!("{}/sessions", self.server);
        let resp = self
            .http
            .post(&url)
            .send()
            .with_context(|| format!("connection failed to {url}"))?;
        Ok(Self::check(resp)?.json()?)
    }

    fn act(&self, id: &str, action: Value) -> anyhow::Result<ScreenResponse> {
        let url = format!("{}/sessions/{}/actions", self.server, id);
        let resp = self.http.post(&url).json(&action).send()?;
        Ok(Self::check(resp)?.json()?)
    }

    fn download(&self, href: &str) -> anyhow::Result<Vec<u8>> {
        let url = format!("{}{}", self.server, href);
        let resp = self.http.get(&url).send()?;
        Ok(Self::check(resp)?.bytes()?.to_vec())
    }

    fn end(&self, id: &str) -> anyhow::Result<()> {
        let url = format!("{}/sessions/{}", self.server, id);
        Self::check(self.http.delete(&url).send()?)?;
        Ok(())
    }
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Take the quiz end to end.
fn do_play(server: &str, out: &PathBuf, platform: Option<&str>, tone: &str) -> anyhow::Result<()> {
    let client = MosaicClient::new(server)?;

    let screen = client.create_session()?;
    let id = screen.session_id.clone();
    println!("{}", format_screen(&screen.view));
    read_line("Press Enter to start the personality analysis 🚀 ")?;

    let mut screen = client.act(&id, json!({ "action": "start" }))?;
    while matches!(screen.view, ViewBody::Question { .. }) {
        print!("\n{}", format_screen(&screen.view));
        let response = read_line("Your response: ")?;
        screen = client.act(&id, json!({ "action": "answer", "response": response }))?;
    }

    for page in ["📋 Personality Report", "💡 Success Tips"] {
        let screen = client.act(&id, json!({ "action": "navigate", "page": page }))?;
        println!("\n{}", format_screen(&screen.view));
    }

    if let Some(platform) = platform {
        client.act(&id, json!({ "action": "navigate", "page": "📱 Social Media Post" }))?;
        let screen = client.act(
            &id,
            json!({ "action": "generate_post", "platform": platform, "tone": tone }),
        )?;
        println!("\n{}", format_screen(&screen.view));
    }

    let screen = client.act(&id, json!({ "action": "navigate", "page": "📥 Download Report" }))?;
    let ViewBody::DownloadReport { href, .. } = &screen.view else {
        bail!("server did not return the download view");
    };
    let pdf = client.download(href)?;
    std::fs::write(out, &pdf).with_context(|| format!("cannot write {}", out.display()))?;
    println!(
        "\n{}  saved to {} ({} bytes)",
        format_screen(&screen.view).trim_end(),
        out.display(),
        pdf.len()
    );

    client.end(&id)
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let health: HealthResponse = r.json()?;
            println!("Mind Mosaic server: {}", health.status);
            println!("Version:            {}", health.version);
            println!("Classifier:         {}", health.classifier);
            println!("Completion model:   {}", health.completion_model);
            println!("Live sessions:      {}", health.sessions);
        }
        Ok(r) => {
            eprintln!("mosaic-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("mosaic-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Play { out, platform, tone } => do_play(&server, &out, platform.as_deref(), &tone),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("mosaic-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
