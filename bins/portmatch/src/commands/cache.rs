//! Cache management commands

use crate::app::App;
use anyhow::Result;
use owo_colors::OwoColorize;
use portmatch_cli::output::{describe_port, format_age, format_count, Status};
use portmatch_core::clock::{Clock, SystemClock};
use std::process::ExitCode;

/// List cached ports, most recently used first
pub async fn list(app: &App, json: bool) -> Result<ExitCode> {
    let mut ports = app.resolver.cached_ports().await;
    ports.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(ExitCode::SUCCESS);
    }

    if ports.is_empty() {
        Status::info("The ports cache is empty");
        return Ok(ExitCode::SUCCESS);
    }

    let now = SystemClock.now_ms();
    Status::header(&format!("{} cached", format_count(ports.len(), "port", "ports")));
    for port in &ports {
        let used = port.last_accessed.map_or_else(|| "never".to_string(), |at| format_age(now, at));
        let query = port
            .original_query
            .as_deref()
            .map(|q| format!(" from \"{q}\""))
            .unwrap_or_default();
        println!("  {}{} {}", describe_port(port), query.dimmed(), format!("used {used}").dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

/// Show cache size and age
pub async fn stats(app: &App, json: bool) -> Result<ExitCode> {
    let stats = app.resolver.cache().stats().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(ExitCode::SUCCESS);
    }

    let now = SystemClock.now_ms();
    let cache_config = app.resolver.cache().config();
    Status::header("Ports cache");
    println!("  Entries:      {} / {}", stats.entries, stats.capacity);
    println!("  TTL:          {} days", cache_config.ttl_ms / 86_400_000);
    println!("  Storage key:  {}", cache_config.cache_key);
    if let Some(dir) = &app.config.schema.cache.storage_dir {
        println!("  Location:     {dir}");
    }
    if let Some(saved) = stats.oldest_saved_at {
        println!("  Oldest entry: saved {}", format_age(now, saved));
    }
    if let Some(accessed) = stats.newest_access {
        println!("  Last use:     {}", format_age(now, accessed));
    }
    Ok(ExitCode::SUCCESS)
}

/// Remove cached ports by name
pub async fn remove(app: &App, name: &str) -> Result<ExitCode> {
    if app.resolver.remove_cached_port_by_name(name).await {
        Status::success(&format!("Removed \"{name}\" from the ports cache"));
        Ok(ExitCode::SUCCESS)
    } else {
        Status::warning(&format!("\"{name}\" is not cached"));
        Ok(ExitCode::FAILURE)
    }
}

/// Drop every cached port
pub async fn clear(app: &App) -> Result<ExitCode> {
    app.resolver.clear_ports_cache().await;
    Status::success("Cleared the ports cache");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use portmatch_core::config::Config;
    use portmatch_ports::{PortEntry, PortSource};
    use tempfile::TempDir;

    fn offline_app(dir: &TempDir) -> App {
        let mut config = Config::defaults();
        config.schema.cache.storage_dir = Some(dir.path().to_string_lossy().into_owned());
        let options = AppOptions {
            offline: true,
            ..AppOptions::default()
        };
        App::build(config, &options).unwrap()
    }

    #[tokio::test]
    async fn test_remove_only_matching_entry() {
        let dir = TempDir::new().unwrap();
        let app = offline_app(&dir);

        app.resolver
            .upsert_cached_port(PortEntry::new("Qaqortoq", 60.7184, -46.0356, PortSource::Online))
            .await;

        remove(&app, "Nuuk").await.unwrap();
        assert_eq!(app.resolver.cached_ports().await.len(), 1);

        remove(&app, "Qaqortoq").await.unwrap();
        assert!(app.resolver.cached_ports().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_persists_across_apps() {
        let dir = TempDir::new().unwrap();
        offline_app(&dir)
            .resolver
            .upsert_cached_port(PortEntry::new("Qaqortoq", 60.7184, -46.0356, PortSource::Online))
            .await;

        let app = offline_app(&dir);
        assert_eq!(app.resolver.cached_ports().await.len(), 1);
        clear(&app).await.unwrap();
        assert!(offline_app(&dir).resolver.cached_ports().await.is_empty());
    }
}
