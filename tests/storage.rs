use champion_assistant::model::types::{NewOffer, NewOrder, NotificationKind, OrderStatus};
use champion_assistant::storage::sqlite::SqliteStorage;
use chrono::{Datelike, Local, NaiveDate};

mod util;
use util::TempFixtureDir;

fn order_for(phone: &str, service: &str) -> NewOrder {
    NewOrder {
        full_name: "Storage Test".into(),
        phone_number: phone.into(),
        email: Some("storage@example.com".into()),
        pickup_address: "Shop 2, Al Wasl Road, Umm Suqeim".into(),
        pickup_date: "2026-03-15".into(),
        pickup_time: "11:00".into(),
        service_type: service.into(),
        notes: Some("Fragile".into()),
    }
}

#[test]
fn create_then_get_roundtrips_fields() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let id = storage
        .create_order(&order_for("+971501112222", "Permanent Creasing"))
        .unwrap();
    assert!(id.starts_with("CC"));
    assert_eq!(id.len(), 18);

    let order = storage.get_order(&id).unwrap().expect("stored order");
    assert_eq!(order.order_id, id);
    assert_eq!(order.service_type, "Permanent Creasing");
    assert_eq!(order.status, OrderStatus::Scheduled);
    assert_eq!(order.notes.as_deref(), Some("Fragile"));
    assert!(order.created_at > 0);

    assert!(storage.get_order("CC00000000NOTREAL").unwrap().is_none());
}

#[test]
fn phone_lookup_returns_latest_order() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let phone = "+971559998877";
    storage.create_order(&order_for(phone, "Bag & Shoe Spa")).unwrap();
    let second = storage
        .create_order(&order_for(phone, "Soft Toy Cleaning"))
        .unwrap();
    storage
        .create_order(&order_for("+971501234567", "Alteration Clinique"))
        .unwrap();

    let latest = storage.latest_order_for_phone(phone).unwrap().unwrap();
    assert_eq!(latest.order_id, second);
    assert!(storage.latest_order_for_phone("+971540000000").unwrap().is_none());

    let all = storage.list_orders().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].service_type, "Alteration Clinique");
}

#[test]
fn status_updates_only_touch_existing_orders() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let id = storage
        .create_order(&order_for("+971521231234", "Wash & Fold Service"))
        .unwrap();

    assert!(storage.update_order_status(&id, OrderStatus::PickedUp).unwrap());
    assert_eq!(
        storage.get_order(&id).unwrap().unwrap().status,
        OrderStatus::PickedUp
    );
    assert!(!storage
        .update_order_status("CC20260101FFFFFFFF", OrderStatus::Ready)
        .unwrap());
}

#[test]
fn notifications_are_listed_newest_first() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let first = storage
        .log_notification(None, "unknown", &NotificationKind::FaqUnanswered, "one")
        .unwrap();
    let second = storage
        .log_notification(
            Some("CC20260310ABCDEF01"),
            "+971501234567",
            &NotificationKind::Other("callback_requested".into()),
            "two",
        )
        .unwrap();
    assert!(second > first);

    let items = storage.recent_notifications(10).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, second);
    assert_eq!(
        items[0].category,
        NotificationKind::Other("callback_requested".into())
    );
    assert_eq!(items[0].order_id.as_deref(), Some("CC20260310ABCDEF01"));
    assert_eq!(items[1].category, NotificationKind::FaqUnanswered);

    assert_eq!(storage.recent_notifications(1).unwrap().len(), 1);
}

#[test]
fn offers_filter_by_window_and_audience() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let year = Local::now().year();
    let mid_year = NaiveDate::from_ymd_opt(year, 6, 15).unwrap();
    let january = NaiveDate::from_ymd_opt(year, 1, 20).unwrap();

    // seeded: welcome (new_customers), winter (all, Jan-Feb), loyalty (returning)
    assert_eq!(storage.active_offers(None, january).unwrap().len(), 3);
    assert_eq!(storage.active_offers(None, mid_year).unwrap().len(), 2);

    let for_all = storage.active_offers(Some("all"), january).unwrap();
    assert_eq!(for_all.len(), 1);
    assert_eq!(for_all[0].name, "Winter Special");

    let returning = storage.active_offers(Some("returning"), january).unwrap();
    let names: Vec<&str> = returning.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Loyalty Reward", "Winter Special"]);

    let id = storage
        .add_offer(&NewOffer {
            name: "Abaya Care Week".into(),
            description: "AED 25 off abaya cleaning".into(),
            discount_percent: None,
            discount_amount: Some(25.0),
            valid_from: format!("{year}-06-01"),
            valid_to: format!("{year}-06-30"),
            target_audience: "all".into(),
        })
        .unwrap();
    let june = storage.active_offers(Some("all"), mid_year).unwrap();
    assert_eq!(june.len(), 1);
    assert_eq!(june[0].discount_label().as_deref(), Some("AED 25 OFF"));

    assert!(storage.set_offer_active(id, false).unwrap());
    assert!(storage.active_offers(Some("all"), mid_year).unwrap().is_empty());
}

#[test]
fn file_database_survives_reopen() {
    let fixture = TempFixtureDir::new();
    let db = fixture.path().join("nested").join("orders.db");
    let id = {
        let storage = SqliteStorage::open(&db).unwrap();
        storage
            .create_order(&order_for("+971561231231", "Hanger Amnesty"))
            .unwrap()
    };

    let storage = SqliteStorage::open(&db).unwrap();
    assert_eq!(
        storage.get_order(&id).unwrap().unwrap().service_type,
        "Hanger Amnesty"
    );
}
