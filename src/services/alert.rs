//! Alert email composition.

use chrono::{DateTime, Utc};

use crate::models::{Notice, Settings};
use crate::services::mailer::EmailMessage;
use crate::utils::escape_html;

/// Subject line: pluralized count, plus an urgency suffix when any notice is
/// urgent.
pub fn subject_line(notices: &[Notice]) -> String {
    let count = notices.len();
    let noun = if count == 1 { "Notice" } else { "Notices" };
    let mut subject = format!("{count} New {noun}");
    if notices.iter().any(|n| n.is_urgent) {
        subject.push_str(" (URGENT)");
    }
    subject
}

fn priority_color(priority: u8) -> &'static str {
    match priority {
        4..=5 => "#dc3545",
        2..=3 => "#fd7e14",
        1 => "#ffc107",
        _ => "#6c757d",
    }
}

fn badge(label: &str, color: &str) -> String {
    format!(
        "<span style=\"background-color: {color}; color: white; padding: 2px 6px; \
         border-radius: 4px; font-size: 11px; font-weight: bold; margin-right: 4px;\">{label}</span>"
    )
}

fn render_notice(notice: &Notice) -> String {
    let priority = notice.priority();
    let mut badges = String::new();
    if notice.is_urgent {
        badges.push_str(&badge("URGENT", "#dc3545"));
    }
    if notice.is_new {
        badges.push_str(&badge("NEW", "#28a745"));
    }
    badges.push_str(&badge(notice.category.as_str(), "#3498db"));
    badges.push_str(&badge(
        &format!("P{priority}"),
        priority_color(priority),
    ));

    let text = escape_html(&notice.text);
    let title = match &notice.link {
        Some(link) => format!(
            "<a href=\"{}\" style=\"color: #2c3e50;\">{text}</a>",
            escape_html(link)
        ),
        None => text,
    };

    format!(
        "  <li style=\"margin-bottom: 12px;\">\n    <div>{badges}</div>\n    \
         <div style=\"font-size: 15px; margin-top: 4px;\">{title}</div>\n    \
         <div style=\"color: #888; font-size: 11px;\">{}</div>\n  </li>\n",
        notice.language()
    )
}

/// Render the HTML body listing `notices` in the given order.
pub fn render_html(notices: &[Notice], checked_at: DateTime<Utc>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n\
         <body style=\"font-family: Arial, sans-serif; color: #333; max-width: 720px;\">\n",
    );
    html.push_str(&format!("<h2>{}</h2>\n<ul>\n", subject_line(notices)));
    for notice in notices {
        html.push_str(&render_notice(notice));
    }
    html.push_str("</ul>\n");
    html.push_str(&format!(
        "<p style=\"color: #888; font-size: 12px;\">Checked at {}</p>\n</body>\n</html>\n",
        checked_at.format("%Y-%m-%d %H:%M UTC")
    ));
    html
}

/// Build the alert email for a batch of new notices.
pub fn compose_alert(
    notices: &[Notice],
    settings: &Settings,
    checked_at: DateTime<Utc>,
) -> EmailMessage {
    EmailMessage {
        from: settings.config.mail.from.clone(),
        to: settings.credentials.recipient.clone(),
        reply_to: settings.reply_to().to_string(),
        subject: subject_line(notices),
        html_body: render_html(notices, checked_at),
    }
}
