//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use portmatch_ports::{PortEntry, PortMatch, PortSource};

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{mins}m {remaining_secs:.0}s")
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Format a match score as a whole percentage
pub fn format_score(score: f64) -> String {
    format!("{:.0}%", score.clamp(0.0, 1.0) * 100.0)
}

/// Format the time between two epoch-ms instants, e.g. `3d ago`
pub fn format_age(now_ms: i64, then_ms: i64) -> String {
    let secs = (now_ms - then_ms).max(0) / 1000;
    match secs {
        0..60 => "just now".to_string(),
        60..3_600 => format!("{}m ago", secs / 60),
        3_600..86_400 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Plain one-line description of a port
pub fn describe_port(port: &PortEntry) -> String {
    let mut line = port.name.clone();
    match (&port.region_code, &port.country) {
        (Some(region), Some(country)) => line.push_str(&format!(", {region}, {country}")),
        (None, Some(country)) => line.push_str(&format!(", {country}")),
        (Some(region), None) => line.push_str(&format!(", {region}")),
        (None, None) => {}
    }
    line.push_str(&format!(" ({:.4}, {:.4})", port.lat, port.lng));
    line
}

/// Colored match line for terminal listings
pub fn match_line(rank: usize, found: &PortMatch) -> String {
    let source = match found.item.source {
        PortSource::Online => found.item.source.as_str().magenta().to_string(),
        PortSource::Cache => found.item.source.as_str().cyan().to_string(),
        _ => found.item.source.as_str().dimmed().to_string(),
    };
    let score = format_score(found.score);
    let score = if found.score >= 0.9 {
        score.green().to_string()
    } else if found.score >= 0.6 {
        score.yellow().to_string()
    } else {
        score.red().to_string()
    };
    format!(
        "{:>2}. {} {} [{}]",
        rank,
        describe_port(&found.item).bold(),
        score,
        source
    )
}
