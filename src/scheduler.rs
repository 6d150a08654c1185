//! Cron scheduling for the periodic pipeline trigger
//!
//! Scheduling is external to the pipeline: a crontab entry invokes the
//! orchestrator on a fixed interval. This module edits the user crontab
//! through the `crontab` binary; there is no in-process timer loop.

use crate::error::{PipelineError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::info;

/// Command a new entry runs unless overridden
pub const DEFAULT_COMMAND: &str = "driftgate run";

/// Default trigger interval
pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;

/// Crontab line firing `command` every `interval_minutes`
pub fn cron_line(interval_minutes: u32, command: &str) -> String {
    format!("*/{interval_minutes} * * * * {command}")
}

/// Lines with `command` filtered out, plus how many were removed
fn without_command(lines: &[String], command: &str) -> (Vec<String>, usize) {
    let kept: Vec<String> = lines
        .iter()
        .filter(|line| !line.contains(command))
        .cloned()
        .collect();
    let removed = lines.len() - kept.len();
    (kept, removed)
}

/// Current user crontab; an absent crontab reads as empty
fn read_crontab() -> Result<Vec<String>> {
    let output = Command::new("crontab").arg("-l").output()?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            Ok(Vec::new())
        } else {
            Err(PipelineError::Scheduler(format!(
                "crontab -l failed: {}",
                stderr.trim()
            )))
        }
    }
}

/// Replace the user crontab with `lines`
fn write_crontab(lines: &[String]) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .spawn()?;

    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    child
        .stdin
        .take()
        .ok_or_else(|| PipelineError::Scheduler("crontab stdin unavailable".to_string()))?
        .write_all(body.as_bytes())?;

    let status = child.wait()?;
    if !status.success() {
        return Err(PipelineError::Scheduler(format!(
            "crontab - exited with {status}"
        )));
    }
    Ok(())
}

/// Install a periodic trigger; returns the installed line
///
/// An already-installed identical line is left alone.
pub fn add(interval_minutes: u32, command: &str) -> Result<String> {
    let line = cron_line(interval_minutes, command);
    let mut lines = read_crontab()?;
    if lines.contains(&line) {
        info!(%line, "cron entry already installed");
        return Ok(line);
    }
    lines.push(line.clone());
    write_crontab(&lines)?;
    info!(%line, "installed cron entry");
    Ok(line)
}

/// All current crontab lines
pub fn list() -> Result<Vec<String>> {
    read_crontab()
}

/// Remove every entry whose line mentions `command`; returns the count
pub fn remove(command: &str) -> Result<usize> {
    let lines = read_crontab()?;
    let (kept, removed) = without_command(&lines, command);
    if removed > 0 {
        write_crontab(&kept)?;
    }
    info!(removed, command, "removed cron entries");
    Ok(removed)
}
