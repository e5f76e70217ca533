pub mod memory;
pub mod onboard;
pub mod run;
pub mod status;

use crewloop_config::AppConfig;
use crewloop_core::memory::MemoryRecord;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// One line per memory row: time, role, first line of content.
pub(crate) fn format_record(record: &MemoryRecord) -> String {
    let first_line = record.content.lines().next().unwrap_or_default();
    let mut line = format!(
        "  {} [{}] {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
        record.agent_role,
        truncate(first_line, 100)
    );
    if let Some(meta) = record.metadata_json() {
        if let Some(tool) = meta.get("tool").and_then(|t| t.as_str()) {
            line.push_str(&format!("  (tool: {tool})"));
        } else if let Some(decision) = meta.get("decision").and_then(|d| d.as_str()) {
            line.push_str(&format!("  (routed to {decision})"));
        }
    }
    line
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
