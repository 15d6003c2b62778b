//! Terminal rendering for the CLI.
//!
//! Every function returns the text instead of printing it. Colors come from
//! `colored` and are switched off globally by [`apply_color_choice`].

use std::io::IsTerminal;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use colored::Colorize;

use crate::config::BusinessInfo;
use crate::model::types::{Notification, Offer, Order, OrderStatus};
use crate::search::FaqEntry;
use crate::service::{FaqAnswer, ScheduledOrder, TrackOutcome};
use crate::validate::{FieldError, format_phone_for_display};

const THIN_SEP: &str = "------------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Resolves `choice` against the terminal and `NO_COLOR`, then applies it.
pub fn apply_color_choice(choice: ColorChoice) {
    let enabled = match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
    };
    colored::control::set_override(enabled);
}

pub fn header(business: &BusinessInfo, greeting: &str) -> String {
    format!(
        "{}\n{}\n{}, how can we help today?\n",
        business.name.bold(),
        business.tagline.dimmed(),
        greeting
    )
}

pub fn confirmation(scheduled: &ScheduledOrder) -> String {
    let order = &scheduled.order;
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        "Thank you! Your pickup order has been scheduled.".green().bold()
    ));
    out.push_str(THIN_SEP);
    out.push('\n');
    out.push_str(&format!("  Order ID:  {}\n", order.order_id.bold()));
    out.push_str(&format!("  Service:   {}\n", order.service_type));
    out.push_str(&format!(
        "  Pickup:    {} at {}\n",
        order.pickup_date, order.pickup_time
    ));
    out.push_str(&format!("  Address:   {}\n", order.pickup_address));
    out.push_str(&format!(
        "  Phone:     {}\n",
        format_phone_for_display(&order.phone_number)
    ));
    out.push_str(THIN_SEP);
    out.push('\n');
    out.push_str("Our team will contact you shortly to confirm your pickup.\n");
    if !scheduled.offers.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Current offers".cyan()));
        for offer in &scheduled.offers {
            out.push_str(&offer_line(offer));
        }
    }
    out
}

pub fn order_details(order: &Order) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", "Order".bold(), order.order_id.bold()));
    out.push_str(THIN_SEP);
    out.push('\n');
    out.push_str(&format!("  Customer:  {}\n", order.full_name));
    out.push_str(&format!(
        "  Phone:     {}\n",
        format_phone_for_display(&order.phone_number)
    ));
    out.push_str(&format!("  Service:   {}\n", order.service_type));
    out.push_str(&format!(
        "  Pickup:    {} at {}\n",
        order.pickup_date, order.pickup_time
    ));
    out.push_str(&format!("  Status:    {}\n", status_badge(order.status)));
    out.push_str(&format!("             {}\n", order.status.description()));
    out.push('\n');
    out.push_str(&timeline(order.status));
    out
}

/// One line per timeline step; reached steps are marked.
pub fn timeline(status: OrderStatus) -> String {
    let current = status.timeline_position();
    OrderStatus::TIMELINE
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let (mark, label) = if i < current {
                ("[x]".green().to_string(), step.timeline_label().normal())
            } else if i == current {
                ("[>]".yellow().bold().to_string(), step.timeline_label().bold())
            } else {
                ("[ ]".dimmed().to_string(), step.timeline_label().dimmed())
            };
            format!("  {mark} {:<11} {label}\n", step.as_str())
        })
        .collect()
}

fn status_badge(status: OrderStatus) -> String {
    match status {
        OrderStatus::Scheduled | OrderStatus::Pending => status.as_str().yellow().to_string(),
        OrderStatus::Delivered => status.as_str().green().bold().to_string(),
        _ => status.as_str().cyan().to_string(),
    }
}

pub fn track_outcome(outcome: &TrackOutcome) -> String {
    match outcome {
        TrackOutcome::Found { order } => order_details(order),
        TrackOutcome::NotFound { lookup, follow_up } => format!(
            "{}\n{}\n",
            format!("No order found for {lookup}.").yellow(),
            follow_up
        ),
    }
}

pub fn faq_answer(answer: &FaqAnswer) -> String {
    let mut out = String::new();
    match &answer.matched {
        Some(m) => {
            out.push_str(&format!("{}\n", m.question.bold()));
            out.push_str(&format!("{}\n", m.answer));
            if !answer.related.is_empty() {
                out.push('\n');
                out.push_str(&format!("{}\n", "Related questions".cyan()));
                for r in &answer.related {
                    out.push_str(&format!("  - {}\n", r.question));
                }
            }
        }
        None => {
            out.push_str(&format!(
                "{}\n",
                "I couldn't find an exact match for your question.".yellow()
            ));
            out.push_str("Try different keywords, or our team will get back to you shortly.\n");
            if !answer.suggestions.is_empty() {
                out.push('\n');
                out.push_str(&format!("{}\n", "Popular questions".cyan()));
                for q in &answer.suggestions {
                    out.push_str(&format!("  - {q}\n"));
                }
            }
        }
    }
    out
}

pub fn faq_list(entries: &[FaqEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{:>3}. {}\n", i + 1, e.question))
        .collect()
}

fn offer_line(offer: &Offer) -> String {
    let label = offer
        .discount_label()
        .map(|l| format!(" [{}]", l.green().bold()))
        .unwrap_or_default();
    format!(
        "  * {}{} - {} (until {})\n",
        offer.name.bold(),
        label,
        offer.description,
        offer.valid_to
    )
}

pub fn offers(offers: &[Offer]) -> String {
    if offers.is_empty() {
        return "No offers are running right now. Check back soon!\n".to_string();
    }
    offers.iter().map(offer_line).collect()
}

pub fn orders_table(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.\n".to_string();
    }
    let mut out = format!(
        "{:<20} {:<22} {:<18} {:<17} {}\n",
        "ORDER", "CUSTOMER", "PHONE", "PICKUP", "STATUS"
    );
    for o in orders {
        out.push_str(&format!(
            "{:<20} {:<22} {:<18} {:<17} {}\n",
            o.order_id,
            truncate(&o.full_name, 22),
            format_phone_for_display(&o.phone_number),
            format!("{} {}", o.pickup_date, o.pickup_time),
            status_badge(o.status)
        ));
    }
    out
}

pub fn notifications(items: &[Notification]) -> String {
    if items.is_empty() {
        return "No notifications.\n".to_string();
    }
    items
        .iter()
        .map(|n| {
            let when = DateTime::from_timestamp_millis(n.created_at)
                .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!(
                "{} {:<22} {:<18} {}\n",
                when.dimmed(),
                n.category.as_str().cyan(),
                format_phone_for_display(&n.phone_number),
                n.message
            )
        })
        .collect()
}

pub fn services(business: &BusinessInfo) -> String {
    let mut out = format!("{}\n", "Services".bold());
    for s in &business.services {
        out.push_str(&format!("  - {s}\n"));
    }
    out.push_str(&format!(
        "\nCoverage: {}\nPhone: {} | Email: {} | {}\n",
        business.coverage_areas.join(", "),
        business.phone,
        business.email,
        business.website
    ));
    out
}

pub fn slots(dates: &[NaiveDate], times: &[NaiveTime]) -> String {
    let mut out = format!("{}\n", "Available pickup dates".bold());
    for d in dates {
        out.push_str(&format!("  {}\n", d.format("%a %d %b %Y")));
    }
    out.push_str(&format!("\n{}\n", "Time slots".bold()));
    let labels: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
    for row in labels.chunks(6) {
        out.push_str(&format!("  {}\n", row.join("  ")));
    }
    out
}

pub fn field_errors(errors: &[FieldError]) -> String {
    let mut out = format!("{}\n", "Please fix the following:".red().bold());
    for e in errors {
        out.push_str(&format!("  - {}: {}\n", e.field.label().bold(), e.message));
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus) -> Order {
        Order {
            order_id: "CC2026101800AA11BB".into(),
            full_name: "Sara Khan".into(),
            phone_number: "+971561112233".into(),
            email: None,
            pickup_address: "Apt 1204, Marina Gate 2, Dubai Marina".into(),
            pickup_date: "2026-10-21".into(),
            pickup_time: "18:00".into(),
            service_type: "Soft Toy Cleaning".into(),
            status,
            notes: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_timeline_marks_progress() {
        colored::control::set_override(false);
        let text = timeline(OrderStatus::Processing);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[2].contains("[x] Picked Up"));
        assert!(lines[3].contains("[>] Processing"));
        assert!(lines[4].contains("[ ] Ready"));
    }

    #[test]
    fn test_order_details_formats_phone() {
        colored::control::set_override(false);
        let text = order_details(&order(OrderStatus::Confirmed));
        assert!(text.contains("+971 56 111 2233"));
        assert!(text.contains("Order confirmed and scheduled"));
    }

    #[test]
    fn test_truncate_marks_cut() {
        assert_eq!(truncate("Muhammad Abdullah Al Falasi Jr", 10), "Muhammad ~");
        assert_eq!(truncate("Sara", 10), "Sara");
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(offers(&[]), "No offers are running right now. Check back soon!\n");
        assert_eq!(orders_table(&[]), "No orders yet.\n");
    }
}
