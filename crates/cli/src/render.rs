//! Terminal output.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::path::Path;
use vv_core::config::ClientConfig;
use vv_core::transport::SocketEvent;
use vv_protocol::api_models::Paginated;
use vv_protocol::prompt_models::Prompt;
use vv_protocol::run_models::{Run, RunStatus, Stage, StageStatus};
use vv_protocol::studio_models::{StudioSettings, UiState};

const BAR_WIDTH: usize = 24;

pub fn json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::Completed => status.as_str().green().bold(),
        RunStatus::Failed => status.as_str().red().bold(),
        RunStatus::Cancelled => status.as_str().dimmed(),
        RunStatus::Pending => status.as_str().yellow(),
        _ => status.as_str().cyan(),
    }
}

fn bar(progress: f64) -> String {
    let filled = (progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn percent(progress: f64) -> String {
    format!("{:>3.0}%", progress.clamp(0.0, 1.0) * 100.0)
}

/// One-line progress summary used while following a run.
pub fn progress_line(run: &Run) -> String {
    let mut line = format!(
        "{} {} {} {}",
        run.id.bold(),
        status(run.status),
        bar(run.progress),
        percent(run.progress)
    );
    if let Some(stage) = &run.current_stage {
        line.push_str(&format!("  {}", stage.label()));
    }
    if let Some(eta) = run.estimated_time_remaining {
        line.push_str(&format!("  eta {eta:.0}s").as_str().dimmed().to_string());
    }
    line
}

fn stage_marker(stage: &Stage) -> ColoredString {
    match stage.status {
        StageStatus::Completed => "✓".green(),
        StageStatus::Failed => "✗".red(),
        StageStatus::Running => "▶".cyan(),
        _ => "·".dimmed(),
    }
}

pub fn run_details(run: &Run) {
    println!("{}", progress_line(run));
    if let Some(prompt_id) = &run.prompt_id {
        println!("  prompt    {prompt_id}");
    }
    if let Some(started) = run.started_at {
        println!("  started   {}", started.to_rfc3339());
    }
    if let Some(completed) = run.completed_at {
        println!("  finished  {}", completed.to_rfc3339());
    }
    for stage in &run.stages {
        println!(
            "  {} {:<16} {}",
            stage_marker(stage),
            stage.name,
            percent(stage.progress)
        );
    }
    if let Some(result) = &run.result {
        println!("  model     {}", result.model_url.underline());
        println!("  preview   {}", result.thumbnail_url);
    }
    if let Some(error) = &run.error {
        println!("  {}     {}", "error".red(), error);
    }
}

pub fn run_page(page: &Paginated<Run>) {
    if page.items.is_empty() {
        println!("No runs.");
        return;
    }
    for run in &page.items {
        println!("{}", progress_line(run));
    }
    page_footer(page);
}

fn prompt_line(prompt: &Prompt) -> String {
    let mut line = format!("{}  {}", prompt.id.bold(), prompt.text);
    if !prompt.tags.is_empty() {
        line.push_str(&format!("  [{}]", prompt.tags.join(", ")).as_str().dimmed().to_string());
    }
    line
}

pub fn prompt_details(prompt: &Prompt) {
    println!("{}", prompt_line(prompt));
    println!(
        "  quality {:?}, format {:?}, poly budget {}",
        prompt.parameters.quality, prompt.parameters.export_format, prompt.parameters.poly_budget
    );
    println!("  used {} times{}", prompt.usage_count, if prompt.is_public { ", public" } else { "" });
}

pub fn prompt_page(page: &Paginated<Prompt>) {
    if page.items.is_empty() {
        println!("No prompts.");
        return;
    }
    for prompt in &page.items {
        println!("{}", prompt_line(prompt));
    }
    page_footer(page);
}

fn page_footer<T>(page: &Paginated<T>) {
    let mut footer = format!("page {} · {} of {} total", page.page, page.items.len(), page.total);
    if page.has_next {
        footer.push_str(&format!(" · next: --page {}", page.page + 1));
    }
    println!("{}", footer.as_str().dimmed());
}

pub fn prompt_history(history: &[Prompt]) {
    if history.is_empty() {
        println!("No prompts in history.");
        return;
    }
    for (index, prompt) in history.iter().enumerate() {
        println!("{:>2}. {}", index + 1, prompt_line(prompt));
    }
}

pub fn settings(settings: &StudioSettings, ui: &UiState) {
    println!("auto-save               {}", settings.auto_save);
    println!("auto-save-interval      {} ms", settings.auto_save_interval);
    println!("max-history-size        {}", settings.max_history_size);
    println!("default-quality         {:?}", settings.default_quality);
    println!("default-export-format   {:?}", settings.default_export_format);
    println!("theme                   {:?}", ui.theme);
}

pub fn config(config: &ClientConfig, config_path: &Path, data_dir: &Path) {
    println!("config file             {}", config_path.display());
    println!("data dir                {}", data_dir.display());
    println!("api url                 {}", config.api_url);
    println!("ws url                  {}", config.ws_url);
    println!("request timeout         {}s", config.request_timeout_secs);
    println!("reconnect interval      {} ms", config.reconnect_interval_ms);
    println!("max reconnect attempts  {}", config.max_reconnect_attempts);
}

/// Report connection events that are not run updates.
pub fn socket_event(event: &SocketEvent, max_attempts: u32) {
    match event {
        SocketEvent::Connected => eprintln!("{}", "connected to run stream".dimmed()),
        SocketEvent::Error(error) => eprintln!("{} {error}", "stream error:".red()),
        SocketEvent::ReconnectScheduled { attempt, delay } => eprintln!(
            "{}",
            format!(
                "stream closed, reconnecting in {}s (attempt {attempt}/{max_attempts})",
                delay.as_secs_f64()
            )
            .as_str()
            .yellow()
        ),
        SocketEvent::RetriesExhausted => {
            eprintln!("{}", "giving up on the run stream".red().bold())
        }
        SocketEvent::Disconnected | SocketEvent::Message(_) => {}
    }
}
