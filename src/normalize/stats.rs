use super::wire::RawStatEntry;
use crate::core::{AdminError, Result, ServerStat};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

/// Keeps the statistic entries of servers that have reported structured stats.
///
/// An entry survives when it has a non-empty uuid and a non-empty keyed
/// statistics record. Entries whose statistics is a positional sequence come
/// from servers that have not reported yet (or from an older backend); they are
/// dropped and logged rather than treated as errors. Running the filter on its
/// own output returns the same list.
pub fn filter_server_stat(entries: Vec<Value>) -> Vec<ServerStat> {
    let mut positional = 0usize;
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        let Ok(raw) = RawStatEntry::deserialize(entry) else {
            continue;
        };
        let Some(uuid) = raw.uuid.filter(|uuid| !uuid.is_empty()) else {
            continue;
        };
        match raw.statistics {
            Some(Value::Object(statistics)) if !statistics.is_empty() => kept.push(ServerStat {
                uuid,
                uri: raw.uri,
                statistics,
            }),
            Some(Value::Array(_)) => positional += 1,
            _ => {}
        }
    }

    if positional > 0 {
        debug!(
            "dropped {} server statistic entries with positional statistics",
            positional
        );
    }
    kept
}

/// Normalizes the standalone statistics query.
pub fn normalize_server_stat(data: Value) -> Result<Vec<ServerStat>> {
    match data {
        Value::Object(mut map) => match map.remove("serverStat") {
            Some(Value::Array(entries)) => Ok(filter_server_stat(entries)),
            Some(Value::Null) | None => Err(AdminError::MalformedResponse(
                "statistics response has no serverStat".to_string(),
            )),
            Some(other) => Err(AdminError::MalformedResponse(format!(
                "serverStat must be a list, got {}",
                other
            ))),
        },
        other => Err(AdminError::MalformedResponse(format!(
            "statistics response must be an object, got {}",
            other
        ))),
    }
}
