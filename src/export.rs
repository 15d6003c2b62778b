//! Staff reports of orders and follow-up notifications.
//!
//! Supported formats:
//! - Markdown - an order table plus a notification log
//! - JSON - structured data for programmatic use
//! - Plain Text - simple, copy-paste friendly format

use crate::model::types::{Notification, Order, OrderStatus};
use crate::validate::format_phone_for_display;
use chrono::{DateTime, Utc};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
    #[value(name = "text")]
    PlainText,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Json => "JSON",
            Self::PlainText => "Plain Text",
        }
    }

    /// Get the file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
            Self::PlainText => "txt",
        }
    }
}

/// Options for export customization
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Only orders currently in this status.
    pub status: Option<OrderStatus>,
    /// Append the notification log.
    pub include_notifications: bool,
    /// Maximum message length (0 = unlimited)
    pub max_message_len: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            status: None,
            include_notifications: true,
            max_message_len: 200,
        }
    }
}

/// Render orders (and optionally notifications) in the requested format.
pub fn export_report(
    orders: &[Order],
    notifications: &[Notification],
    format: ExportFormat,
    options: &ExportOptions,
) -> String {
    let orders: Vec<&Order> = orders
        .iter()
        .filter(|o| options.status.is_none_or(|s| o.status == s))
        .collect();
    let notifications: &[Notification] = if options.include_notifications {
        notifications
    } else {
        &[]
    };
    match format {
        ExportFormat::Markdown => export_markdown(&orders, notifications, options),
        ExportFormat::Json => export_json(&orders, notifications, options),
        ExportFormat::PlainText => export_plain_text(&orders, notifications, options),
    }
}

/// Escape special Markdown characters to prevent formatting issues or injection.
fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('`', "\\`")
        .replace('\n', " ")
}

fn format_millis(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn export_markdown(orders: &[&Order], notifications: &[Notification], options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Orders Report\n\n");
    if let Some(status) = options.status {
        output.push_str(&format!("**Status:** {status}\n\n"));
    }
    output.push_str(&format!(
        "**Orders:** {} | **Exported:** {}\n\n",
        orders.len(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str("| Order | Customer | Phone | Service | Pickup | Status |\n");
    output.push_str("|-------|----------|-------|---------|--------|--------|\n");
    for order in orders {
        output.push_str(&format!(
            "| `{}` | {} | {} | {} | {} {} | {} |\n",
            order.order_id,
            escape_markdown(&order.full_name),
            format_phone_for_display(&order.phone_number),
            escape_markdown(&order.service_type),
            order.pickup_date,
            order.pickup_time,
            order.status
        ));
    }
    output.push('\n');

    if !notifications.is_empty() {
        output.push_str("## Notifications\n\n");
        for n in notifications {
            let order = n
                .order_id
                .as_deref()
                .map(|id| format!(" `{id}`"))
                .unwrap_or_default();
            output.push_str(&format!(
                "- {} **{}**{} {}\n",
                format_millis(n.created_at),
                n.category,
                order,
                escape_markdown(&truncate_text(&n.message, options.max_message_len))
            ));
        }
        output.push('\n');
    }

    output
}

fn export_json(orders: &[&Order], notifications: &[Notification], options: &ExportOptions) -> String {
    let export_data = serde_json::json!({
        "status": options.status,
        "count": orders.len(),
        "exported_at": Utc::now().to_rfc3339(),
        "orders": orders,
        "notifications": notifications.iter().map(|n| {
            serde_json::json!({
                "id": n.id,
                "order_id": n.order_id,
                "phone_number": n.phone_number,
                "category": n.category.as_str(),
                "message": truncate_text(&n.message, options.max_message_len),
                "created_at": n.created_at,
            })
        }).collect::<Vec<_>>(),
    });

    serde_json::to_string_pretty(&export_data).unwrap_or_else(|_| "{}".to_string())
}

fn export_plain_text(orders: &[&Order], notifications: &[Notification], options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("ORDERS REPORT\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "Orders: {} | Exported: {}\n",
        orders.len(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for (i, order) in orders.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", i + 1, order.order_id));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("Customer: {}\n", order.full_name));
        output.push_str(&format!(
            "Phone: {}\n",
            format_phone_for_display(&order.phone_number)
        ));
        if let Some(email) = &order.email {
            output.push_str(&format!("Email: {email}\n"));
        }
        output.push_str(&format!("Service: {}\n", order.service_type));
        output.push_str(&format!(
            "Pickup: {} {} at {}\n",
            order.pickup_date, order.pickup_time, order.pickup_address
        ));
        output.push_str(&format!("Status: {}\n", order.status));
        if let Some(notes) = &order.notes {
            output.push_str(&format!("Notes: {notes}\n"));
        }
        output.push('\n');
    }

    if !notifications.is_empty() {
        output.push_str("NOTIFICATIONS\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for n in notifications {
            output.push_str(&format!(
                "{}  {:<22} {}\n",
                format_millis(n.created_at),
                n.category.as_str(),
                truncate_text(&n.message, options.max_message_len)
            ));
        }
    }

    output
}

/// Truncate text to max length (in characters), adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return text.to_string();
    }

    let char_count = text.chars().count();
    if char_count <= max_len {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
