use serde::{Deserialize, Serialize};

/// Lifecycle of a pickup order as shown on the tracking timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Scheduled,
    Pending,
    Confirmed,
    #[serde(rename = "Picked Up")]
    PickedUp,
    Processing,
    Ready,
    Delivered,
}

impl OrderStatus {
    /// Tracking timeline order. `Scheduled` sits alongside `Pending` at the start.
    pub const TIMELINE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::PickedUp,
        OrderStatus::Processing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::PickedUp => "Picked Up",
            Self::Processing => "Processing",
            Self::Ready => "Ready",
            Self::Delivered => "Delivered",
        }
    }

    /// Accepts the display form or a slug (`picked-up`, `picked_up`), any case.
    pub fn parse(input: &str) -> Option<Self> {
        let key: String = input
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "scheduled" => Some(Self::Scheduled),
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "pickedup" => Some(Self::PickedUp),
            "processing" => Some(Self::Processing),
            "ready" => Some(Self::Ready),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Scheduled => "Your pickup is scheduled; our team will contact you shortly",
            Self::Pending => "Your order is pending confirmation",
            Self::Confirmed => "Order confirmed and scheduled",
            Self::PickedUp => "Items have been picked up",
            Self::Processing => "Items are being processed",
            Self::Ready => "Items are ready for delivery",
            Self::Delivered => "Items have been delivered",
        }
    }

    pub fn timeline_label(self) -> &'static str {
        match self {
            Self::Scheduled | Self::Pending => "Awaiting confirmation",
            Self::Confirmed => "Confirmed - Ready for pickup",
            Self::PickedUp => "Items picked up from your location",
            Self::Processing => "Currently being cleaned/processed",
            Self::Ready => "Ready for delivery",
            Self::Delivered => "Delivered successfully",
        }
    }

    /// Index on [`Self::TIMELINE`].
    pub fn timeline_position(self) -> usize {
        match self {
            Self::Scheduled | Self::Pending => 0,
            Self::Confirmed => 1,
            Self::PickedUp => 2,
            Self::Processing => 3,
            Self::Ready => 4,
            Self::Delivered => 5,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields captured by the pickup form, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub full_name: String,
    /// Canonical `+9715XXXXXXXX`.
    pub phone_number: String,
    pub email: Option<String>,
    pub pickup_address: String,
    /// `YYYY-MM-DD`
    pub pickup_date: String,
    /// `HH:MM`
    pub pickup_time: String,
    pub service_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub pickup_address: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub service_type: String,
    pub status: OrderStatus,
    pub notes: Option<String>,
    /// Unix millis.
    pub created_at: i64,
}

/// Why a follow-up row was logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewPickupScheduled,
    OrderNotFound,
    FaqUnanswered,
    OfferSubscription,
    ContactRequest,
    #[serde(untagged)]
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewPickupScheduled => "new_pickup_scheduled",
            Self::OrderNotFound => "order_not_found",
            Self::FaqUnanswered => "faq_unanswered",
            Self::OfferSubscription => "offer_subscription",
            Self::ContactRequest => "contact_request",
            Self::Other(v) => v,
        }
    }

    pub fn from_str_lossy(value: &str) -> Self {
        match value {
            "new_pickup_scheduled" => Self::NewPickupScheduled,
            "order_not_found" => Self::OrderNotFound,
            "faq_unanswered" => Self::FaqUnanswered,
            "offer_subscription" => Self::OfferSubscription,
            "contact_request" => Self::ContactRequest,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only follow-up entry for the team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: Option<String>,
    /// Canonical phone, or `"unknown"` when the customer gave none.
    pub phone_number: String,
    pub category: NotificationKind,
    pub message: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOffer {
    pub name: String,
    pub description: String,
    pub discount_percent: Option<f64>,
    pub discount_amount: Option<f64>,
    /// `YYYY-MM-DD`, inclusive.
    pub valid_from: String,
    /// `YYYY-MM-DD`, inclusive.
    pub valid_to: String,
    pub target_audience: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub discount_percent: Option<f64>,
    pub discount_amount: Option<f64>,
    pub valid_from: String,
    pub valid_to: String,
    pub target_audience: String,
    pub active: bool,
}

impl Offer {
    /// Headline such as `20% OFF` or `AED 50 OFF`; `None` for non-monetary offers.
    pub fn discount_label(&self) -> Option<String> {
        match (self.discount_percent, self.discount_amount) {
            (Some(p), _) if p > 0.0 => Some(format!("{p:.0}% OFF")),
            (_, Some(a)) if a > 0.0 => Some(format!("AED {a:.0} OFF")),
            _ => None,
        }
    }
}
