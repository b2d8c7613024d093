use crate::alerts::types::{Alert, Priority};

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "🚨",
        Priority::High => "❗",
        Priority::Medium => "⚠️",
        Priority::Low => "ℹ️",
    }
}

/// Render one alert for delivery. Pure.
pub fn format_alert(alert: &Alert) -> String {
    let marker = priority_marker(alert.priority);
    let timestamp = alert.timestamp.format("%H:%M:%S");
    format!("{} **ALERT** - {}\n\n{}", marker, timestamp, alert.message)
}

/// Render a grouped summary of the given alerts, bucketed by priority.
/// LOW alerts are not listed; an empty input yields a fixed sentence.
pub fn format_summary(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No alerts at this time.".to_string();
    }

    let mut summary = format!("📋 **Alert Summary** ({} alerts)\n\n", alerts.len());

    let sections = [
        (Priority::Critical, "🚨", "CRITICAL"),
        (Priority::High, "❗", "HIGH"),
        (Priority::Medium, "⚠️", "MEDIUM"),
    ];

    for (priority, marker, name) in sections {
        let bucket: Vec<&Alert> = alerts.iter().filter(|a| a.priority == priority).collect();
        if bucket.is_empty() {
            continue;
        }
        summary.push_str(&format!("{} **{} ({}):**\n", marker, name, bucket.len()));
        for alert in &bucket {
            summary.push_str(&format!("• {}: {}\n", alert.symbol, alert.kind.label()));
        }
        summary.push('\n');
    }

    summary.trim_end().to_string()
}
