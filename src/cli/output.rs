use anyhow::{Context, Result};
use cartridge_admin::{ServerDetails, ServerStat, TopologySnapshot};
use serde::Serialize;
use std::fmt::Write;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output as JSON")?;
    println!("{}", text);
    Ok(())
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "ro",
        Some(false) => "rw",
        None => "--",
    }
}

pub fn render_topology(snapshot: &TopologySnapshot) -> String {
    let mut out = String::new();
    for replicaset in &snapshot.replicasets {
        let _ = writeln!(
            out,
            "{} [{}] roles={} status={}",
            replicaset.alias.as_deref().unwrap_or(&replicaset.uuid),
            replicaset.uuid,
            replicaset.roles.join(","),
            replicaset.status.as_deref().unwrap_or("unknown")
        );
        for server in &replicaset.servers {
            let leader = replicaset.active_master_uuid.as_deref() == Some(server.uuid.as_str());
            let _ = writeln!(
                out,
                "  {} {:<40} {:<12} {}{}",
                if leader { "*" } else { " " },
                server.display_label(),
                server.status.as_str(),
                flag(server.ro),
                if server.disabled { " disabled" } else { "" }
            );
        }
    }

    let unconfigured: Vec<_> = snapshot.unconfigured_servers().collect();
    if !unconfigured.is_empty() {
        let _ = writeln!(out, "unconfigured");
        for server in unconfigured {
            let _ = writeln!(out, "    {}", server.uri);
        }
    }

    for issue in &snapshot.issues {
        let _ = writeln!(out, "! [{}] {}", issue.level, issue.message);
    }
    out
}

pub fn render_suggestions(snapshot: &TopologySnapshot) -> String {
    if snapshot.suggestions.is_empty() {
        return "no suggestions\n".to_string();
    }
    let mut out = String::new();
    for suggestion in &snapshot.suggestions {
        let _ = writeln!(out, "{}", suggestion.kind.as_str());
        for uuid in &suggestion.targets {
            let _ = writeln!(out, "    {}", snapshot.server_label(uuid));
        }
    }
    out
}

pub fn render_stats(snapshot: &TopologySnapshot, stats: &[ServerStat]) -> String {
    let mut out = String::new();
    for stat in stats {
        let used = stat.statistics.get("arena_used_ratio").cloned().unwrap_or_default();
        let quota = stat.statistics.get("quota_size").cloned().unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<40} quota={} arena_used={}",
            snapshot.server_label(&stat.uuid),
            quota,
            used
        );
    }
    out
}

pub fn render_details(details: &ServerDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        details.uri,
        details.alias.as_deref().unwrap_or(""),
        details.status
    );
    if let Some(message) = &details.message {
        let _ = writeln!(out, "  {}", message);
    }
    if !details.roles.is_empty() {
        let _ = writeln!(out, "  roles: {}", details.roles.join(", "));
    }
    for (name, value) in &details.labels {
        let _ = writeln!(out, "  label {}={}", name, value);
    }
    for (section, fields) in &details.boxinfo {
        let _ = writeln!(out, "  [{}]", section);
        if let Some(fields) = fields.as_object() {
            for (name, value) in fields {
                let hint = details
                    .descriptions
                    .general
                    .get(name)
                    .filter(|_| section == "general")
                    .map(|text| format!("  # {}", text))
                    .unwrap_or_default();
                let _ = writeln!(out, "    {} = {}{}", name, value, hint);
            }
        }
    }
    out
}
