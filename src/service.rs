//! Customer-facing operations on top of the matcher and the store.
//!
//! Every front end (CLI today) goes through [`Assistant`]; it owns the
//! configuration, the FAQ matcher and the SQLite handle.

use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::model::types::{NewOrder, Notification, NotificationKind, Offer, Order, OrderStatus};
use crate::search::canonicalize::meaningful_len;
use crate::search::{FaqCatalog, FaqMatch, FaqMatcher};
use crate::storage::sqlite::SqliteStorage;
use crate::validate::{
    self, FieldError, ValidationError, format_phone_for_display, validate_phone_number,
};

/// Offers attached to a confirmation.
const CONFIRMATION_OFFERS: usize = 3;
/// Related questions shown under an answer.
const RELATED_LIMIT: usize = 3;
/// Stand-in phone for anonymous notifications.
const UNKNOWN_PHONE: &str = "unknown";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<FieldError> for ServiceError {
    fn from(err: FieldError) -> Self {
        Self::Validation(ValidationError(vec![err]))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Raw pickup form input, exactly as the customer typed it.
#[derive(Debug, Clone, Default)]
pub struct PickupRequest {
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub pickup_address: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub service_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledOrder {
    pub order: Order,
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone)]
pub enum OrderLookup {
    Id(String),
    Phone(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrackOutcome {
    Found { order: Order },
    NotFound { lookup: String, follow_up: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FaqAnswer {
    pub question: String,
    pub matched: Option<FaqMatch>,
    pub related: Vec<FaqMatch>,
    /// Popular questions offered when nothing matched.
    pub suggestions: Vec<String>,
}

pub struct Assistant {
    config: AppConfig,
    matcher: FaqMatcher,
    storage: SqliteStorage,
    today: Option<NaiveDate>,
}

impl Assistant {
    pub fn new(config: AppConfig, catalog: FaqCatalog, storage: SqliteStorage) -> Self {
        let matcher = FaqMatcher::new(catalog, config.matcher.clone());
        Self {
            config,
            matcher,
            storage,
            today: None,
        }
    }

    /// Loads the catalog named by `faq_path` (or the embedded one) and opens `db_path`.
    pub fn open(config: AppConfig, db_path: &Path, faq_path: Option<&Path>) -> anyhow::Result<Self> {
        let catalog = match faq_path.or(config.faq_path.as_deref()) {
            Some(path) => FaqCatalog::load_from(path)
                .with_context(|| format!("loading FAQ catalog {}", path.display()))?,
            None => FaqCatalog::embedded().context("loading embedded FAQ catalog")?,
        };
        let storage = SqliteStorage::open(db_path)?;
        tracing::debug!(entries = catalog.len(), db = %db_path.display(), "assistant_ready");
        Ok(Self::new(config, catalog, storage))
    }

    /// Pins "today" for date validation and offer windows.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn matcher(&self) -> &FaqMatcher {
        &self.matcher
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Validates the whole form, stores the order and notifies the team.
    #[tracing::instrument(name = "schedule_order", skip_all, fields(service = %request.service_type))]
    pub fn schedule_order(&self, request: &PickupRequest) -> ServiceResult<ScheduledOrder> {
        let new_order = self.validate_request(request)?;
        let order_id = self.storage.create_order(&new_order)?;

        self.storage.log_notification(
            Some(&order_id),
            &new_order.phone_number,
            &NotificationKind::NewPickupScheduled,
            &format!(
                "New pickup order scheduled: {} on {} at {}",
                new_order.service_type, new_order.pickup_date, new_order.pickup_time
            ),
        )?;

        let order = self
            .storage
            .get_order(&order_id)?
            .with_context(|| format!("order {order_id} missing after insert"))?;
        let mut offers = self.storage.active_offers(Some("all"), self.today())?;
        offers.truncate(CONFIRMATION_OFFERS);

        Ok(ScheduledOrder { order, offers })
    }

    fn validate_request(&self, request: &PickupRequest) -> Result<NewOrder, ValidationError> {
        let pickup = &self.config.pickup;
        let mut errors = Vec::new();

        let full_name = validate::validate_full_name(&request.full_name)
            .map_err(|e| errors.push(e))
            .ok();
        let phone_number = validate_phone_number(&request.phone_number)
            .map_err(|e| errors.push(e))
            .ok();
        let email = match request.email.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => validate::validate_email(e)
                .map(Some)
                .map_err(|err| errors.push(err))
                .ok(),
            _ => Some(None),
        };
        let pickup_address = validate::validate_address(&request.pickup_address)
            .map_err(|e| errors.push(e))
            .ok();
        let pickup_date = validate::validate_pickup_date(&request.pickup_date, self.today(), pickup)
            .map_err(|e| errors.push(e))
            .ok();
        let pickup_time = validate::validate_pickup_time(&request.pickup_time, pickup)
            .map_err(|e| errors.push(e))
            .ok();
        let service_type = validate::validate_service(&request.service_type, &self.config.business)
            .map_err(|e| errors.push(e))
            .ok();
        let notes = validate::validate_notes(request.notes.as_deref())
            .map_err(|e| errors.push(e))
            .ok();

        match (
            full_name,
            phone_number,
            email,
            pickup_address,
            pickup_date,
            pickup_time,
            service_type,
            notes,
        ) {
            (
                Some(full_name),
                Some(phone_number),
                Some(email),
                Some(pickup_address),
                Some(date),
                Some(time),
                Some(service_type),
                Some(notes),
            ) if errors.is_empty() => Ok(NewOrder {
                full_name,
                phone_number,
                email,
                pickup_address,
                pickup_date: date.format("%Y-%m-%d").to_string(),
                pickup_time: time.format("%H:%M").to_string(),
                service_type,
                notes,
            }),
            _ => {
                tracing::info!(failed = errors.len(), "pickup_rejected");
                Err(ValidationError(errors))
            }
        }
    }

    /// Finds an order by ID or by the customer's phone (latest order wins).
    #[tracing::instrument(name = "track_order", skip_all)]
    pub fn track_order(&self, lookup: &OrderLookup) -> ServiceResult<TrackOutcome> {
        match lookup {
            OrderLookup::Id(id) => {
                let id = id.trim().to_uppercase();
                if let Some(order) = self.storage.get_order(&id)? {
                    return Ok(TrackOutcome::Found { order });
                }
                self.storage.log_notification(
                    None,
                    UNKNOWN_PHONE,
                    &NotificationKind::OrderNotFound,
                    &format!("Customer searched for non-existent order ID: {id}"),
                )?;
                Ok(TrackOutcome::NotFound {
                    lookup: id,
                    follow_up: "Our team will reach out to you shortly to help locate your order."
                        .into(),
                })
            }
            OrderLookup::Phone(raw) => {
                let phone = validate_phone_number(raw)?;
                if let Some(order) = self.storage.latest_order_for_phone(&phone)? {
                    return Ok(TrackOutcome::Found { order });
                }
                let display = format_phone_for_display(&phone);
                self.storage.log_notification(
                    None,
                    &phone,
                    &NotificationKind::OrderNotFound,
                    &format!("Customer searched for order with phone: {display}"),
                )?;
                Ok(TrackOutcome::NotFound {
                    lookup: display,
                    follow_up: "No orders found for this phone number. Our team will reach out to you shortly."
                        .into(),
                })
            }
        }
    }

    /// Answers a free-text question. Real misses are logged for the team.
    pub fn answer_faq(&self, question: &str) -> ServiceResult<FaqAnswer> {
        let question = question.trim();
        let matched = self.matcher.answer(question);
        if matched.is_some() {
            return Ok(FaqAnswer {
                question: question.to_string(),
                related: self.matcher.related(question, RELATED_LIMIT),
                matched,
                suggestions: Vec::new(),
            });
        }

        // too-short input was rejected, not left unanswered
        if meaningful_len(question) >= self.matcher.settings().min_query_chars {
            self.storage.log_notification(
                None,
                UNKNOWN_PHONE,
                &NotificationKind::FaqUnanswered,
                &format!("Customer asked unanswered question: {question}"),
            )?;
        }
        Ok(FaqAnswer {
            question: question.to_string(),
            matched: None,
            related: Vec::new(),
            suggestions: self.config.business.popular_questions.clone(),
        })
    }

    /// Leaves a phone number so the team can follow up on an unanswered question.
    pub fn request_contact(&self, phone: &str, issue: &str) -> ServiceResult<i64> {
        let phone = validate_phone_number(phone)?;
        let issue = issue.trim();
        if issue.is_empty() {
            return Err(FieldError::new(validate::Field::Notes, "describe what you need help with").into());
        }
        let id = self.storage.log_notification(
            None,
            &phone,
            &NotificationKind::ContactRequest,
            &format!("Unanswered FAQ: {issue}"),
        )?;
        Ok(id)
    }

    pub fn list_offers(&self, audience: Option<&str>) -> ServiceResult<Vec<Offer>> {
        Ok(self.storage.active_offers(audience, self.today())?)
    }

    /// Returns `false` when no offer has this ID.
    pub fn deactivate_offer(&self, offer_id: i64) -> ServiceResult<bool> {
        let changed = self.storage.set_offer_active(offer_id, false)?;
        if changed {
            tracing::info!(offer_id, "offer_deactivated");
        }
        Ok(changed)
    }

    /// Returns the normalized email.
    pub fn subscribe_offers(&self, email: &str) -> ServiceResult<String> {
        let email = validate::validate_email(email)?;
        self.storage.log_notification(
            None,
            UNKNOWN_PHONE,
            &NotificationKind::OfferSubscription,
            &format!("Customer subscribed to offers: {email}"),
        )?;
        Ok(email)
    }

    pub fn list_orders(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.storage.list_orders()?)
    }

    /// Returns `false` when the order does not exist.
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> ServiceResult<bool> {
        Ok(self
            .storage
            .update_order_status(&order_id.trim().to_uppercase(), status)?)
    }

    pub fn notifications(&self, limit: usize) -> ServiceResult<Vec<Notification>> {
        Ok(self.storage.recent_notifications(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> Assistant {
        Assistant::new(
            AppConfig::default(),
            FaqCatalog::embedded().unwrap(),
            SqliteStorage::open_in_memory().unwrap(),
        )
        .with_today(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn request() -> PickupRequest {
        PickupRequest {
            full_name: "Fatima Al Mansoori".into(),
            phone_number: "050 123 4567".into(),
            email: Some("fatima@example.com".into()),
            pickup_address: "Villa 7, Street 12, Jumeirah 1, Dubai".into(),
            pickup_date: "2026-10-20".into(),
            pickup_time: "10:30 AM".into(),
            service_type: "bag & shoe spa".into(),
            notes: Some("Ring the bell twice".into()),
        }
    }

    #[test]
    fn test_validate_request_normalizes_fields() {
        let order = assistant().validate_request(&request()).unwrap();
        assert_eq!(order.phone_number, "+971501234567");
        assert_eq!(order.pickup_date, "2026-10-20");
        assert_eq!(order.pickup_time, "10:30");
        assert_eq!(order.service_type, "Bag & Shoe Spa");
    }

    #[test]
    fn test_validate_request_collects_all_errors() {
        let bad = PickupRequest {
            full_name: "X".into(),
            phone_number: "12345".into(),
            email: Some("nope".into()),
            pickup_address: "short".into(),
            pickup_date: "yesterday".into(),
            pickup_time: "23:00".into(),
            service_type: "Car wash".into(),
            notes: None,
        };
        let err = assistant().validate_request(&bad).unwrap_err();
        assert_eq!(err.errors().len(), 7);
    }

    #[test]
    fn test_blank_email_is_optional() {
        let mut req = request();
        req.email = Some("  ".into());
        let order = assistant().validate_request(&req).unwrap();
        assert_eq!(order.email, None);
    }
}
