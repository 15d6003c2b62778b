use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use std::fs;

mod util;
use util::TempFixtureDir;

fn base_cmd(fixture: &TempFixtureDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("champion"));
    cmd.env("XDG_CONFIG_HOME", fixture.path())
        .env_remove("CHAMPION_LOG")
        .env("NO_COLOR", "1")
        .arg("--db")
        .arg(fixture.db_path());
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().clone();
    serde_json::from_slice(&output.stdout).expect("valid JSON output")
}

fn schedule_args() -> Vec<&'static str> {
    vec![
        "schedule",
        "--name",
        "Hassan Qureshi",
        "--phone",
        "+971 50 765 4321",
        "--address",
        "Villa 22, Street 9, Mirdif, Dubai",
        "--date",
        "tomorrow",
        "--time",
        "10:00",
        "--service",
        "wash & fold service",
    ]
}

#[test]
fn help_lists_commands() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("schedule"))
        .stdout(contains("track"))
        .stdout(contains("faq"))
        .stdout(contains("offers"));
}

#[test]
fn bare_invocation_greets() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .assert()
        .success()
        .stdout(contains("Champion Cleaners"))
        .stdout(contains("how can we help today?"));
}

#[test]
fn faq_ask_returns_matching_entry_as_json() {
    let fixture = TempFixtureDir::new();
    let json = json_stdout(base_cmd(&fixture).args(["--json", "faq", "ask", "bag", "cleaning"]));
    assert_eq!(
        json["matched"]["question"],
        "What is the Bag & Shoe Spa service?"
    );
    assert!(json["matched"]["score"].as_f64().unwrap() > 0.0);
    assert_eq!(json["suggestions"].as_array().unwrap().len(), 0);
}

#[test]
fn faq_miss_shows_popular_questions_and_is_logged() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .args(["faq", "ask", "xyzzy quantum flux"])
        .assert()
        .success()
        .stdout(contains("couldn't find an exact match"))
        .stdout(contains("Popular questions"));

    let json = json_stdout(base_cmd(&fixture).args(["--json", "notifications"]));
    assert_eq!(json[0]["category"], "faq_unanswered");
}

#[test]
fn faq_list_prints_catalog() {
    let fixture = TempFixtureDir::new();
    let json = json_stdout(base_cmd(&fixture).args(["--json", "faq", "list"]));
    assert_eq!(json.as_array().unwrap().len(), 20);
}

#[test]
fn invalid_schedule_exits_with_code_2() {
    let fixture = TempFixtureDir::new();
    let mut args = schedule_args();
    args[4] = "12345";
    args[10] = "23:30";
    base_cmd(&fixture)
        .args(&args)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("phone number"))
        .stderr(contains("pickup time"));
}

#[test]
fn schedule_track_and_update_flow() {
    let fixture = TempFixtureDir::new();

    let scheduled = json_stdout(base_cmd(&fixture).arg("--json").args(schedule_args()));
    let order_id = scheduled["order"]["order_id"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("CC"));
    assert_eq!(scheduled["order"]["service_type"], "Wash & Fold Service");
    assert_eq!(scheduled["order"]["phone_number"], "+971507654321");

    let tracked = json_stdout(base_cmd(&fixture).args(["--json", "track", "--phone", "0507654321"]));
    assert_eq!(tracked["outcome"], "found");
    assert_eq!(tracked["order"]["order_id"], order_id.as_str());

    base_cmd(&fixture)
        .args(["orders", "status", &order_id, "picked-up"])
        .assert()
        .success()
        .stdout(contains("is now Picked Up"));

    base_cmd(&fixture)
        .args(["track", "--id", &order_id])
        .assert()
        .success()
        .stdout(contains("Items have been picked up"))
        .stdout(contains("[>] Picked Up"));

    let orders = json_stdout(base_cmd(&fixture).args(["--json", "orders", "list", "--status", "Picked Up"]));
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[test]
fn unknown_order_id_is_not_an_error() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .args(["track", "--id", "CC20260101DEADBEEF"])
        .assert()
        .success()
        .stdout(contains("No order found for CC20260101DEADBEEF"));
}

#[test]
fn status_update_for_missing_order_fails() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .args(["orders", "status", "CC20260101DEADBEEF", "ready"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no order with ID"));
}

#[test]
fn bad_status_is_rejected_by_parser() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .args(["orders", "status", "CC20260101DEADBEEF", "lost"])
        .assert()
        .failure()
        .stderr(contains("unknown status"));
}

#[test]
fn services_and_slots_need_no_database() {
    let fixture = TempFixtureDir::new();
    let services = json_stdout(base_cmd(&fixture).args(["--json", "services"]));
    assert_eq!(services["services"].as_array().unwrap().len(), 10);

    let slots = json_stdout(base_cmd(&fixture).args(["--json", "slots"]));
    let times = slots["times"].as_array().unwrap();
    assert_eq!(times.first().unwrap(), "08:00");
    assert_eq!(times.last().unwrap(), "19:30");
    assert_eq!(slots["dates"].as_array().unwrap().len(), 30);

    assert!(!fixture.db_path().exists());
}

#[test]
fn config_file_changes_pickup_hours() {
    let fixture = TempFixtureDir::new();
    let config = fixture.write(
        "custom.toml",
        r#"
        [pickup]
        opening_time = "09:00"
        closing_time = "12:00"
        slot_minutes = 60
        "#,
    );
    let slots = json_stdout(
        base_cmd(&fixture)
            .arg("--config")
            .arg(&config)
            .args(["--json", "slots"]),
    );
    assert_eq!(
        slots["times"],
        serde_json::json!(["09:00", "10:00", "11:00"])
    );
}

#[test]
fn invalid_config_is_reported() {
    let fixture = TempFixtureDir::new();
    let config = fixture.write("bad.toml", "[matcher]\nconfidence_floor = 3.0\n");
    base_cmd(&fixture)
        .arg("--config")
        .arg(&config)
        .arg("services")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("confidence_floor"));
}

#[test]
fn offers_subscribe_and_add() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .args(["offers", "subscribe", "news@example.com"])
        .assert()
        .success()
        .stdout(contains("news@example.com"));

    base_cmd(&fixture)
        .args(["offers", "subscribe", "not-an-email"])
        .assert()
        .failure()
        .code(2);

    base_cmd(&fixture)
        .args([
            "offers",
            "add",
            "--name",
            "Eid Special",
            "--description",
            "30% off all abayas",
            "--percent",
            "30",
            "--from",
            "2000-01-01",
            "--to",
            "2099-12-31",
        ])
        .assert()
        .success();

    let offers = json_stdout(base_cmd(&fixture).args(["--json", "offers", "list", "--audience", "all"]));
    assert!(
        offers
            .as_array()
            .unwrap()
            .iter()
            .any(|o| o["name"] == "Eid Special")
    );
}

#[test]
fn staff_can_deactivate_an_offer() {
    let fixture = TempFixtureDir::new();
    let added = json_stdout(base_cmd(&fixture).args([
        "--json",
        "offers",
        "add",
        "--name",
        "Ramadan Pressing",
        "--description",
        "AED 10 off pressing",
        "--amount",
        "10",
        "--from",
        "2000-01-01",
        "--to",
        "2099-12-31",
    ]));
    let id = added["offer_id"].as_i64().unwrap().to_string();

    base_cmd(&fixture)
        .args(["offers", "deactivate", &id])
        .assert()
        .success()
        .stdout(contains("no longer running"));

    let offers = json_stdout(base_cmd(&fixture).args(["--json", "offers", "list"]));
    assert!(
        offers
            .as_array()
            .unwrap()
            .iter()
            .all(|o| o["name"] != "Ramadan Pressing")
    );

    base_cmd(&fixture)
        .args(["offers", "deactivate", "999999"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no offer with ID 999999"));
}

#[test]
fn export_writes_report_file() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture).args(schedule_args()).assert().success();

    let out = fixture.path().join("report.json");
    base_cmd(&fixture)
        .args(["export", "--format", "json", "--output"])
        .arg(&out)
        .assert()
        .success();

    let report: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["count"], 1);
    assert_eq!(report["notifications"][0]["category"], "new_pickup_scheduled");
}

#[test]
fn color_never_has_no_ansi() {
    let fixture = TempFixtureDir::new();
    base_cmd(&fixture)
        .env_remove("NO_COLOR")
        .args(["--color", "never", "faq", "ask", "free pickup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{1b}").not());
}

#[test]
fn log_file_receives_events() {
    let fixture = TempFixtureDir::new();
    let log = fixture.path().join("logs").join("champion.log");
    base_cmd(&fixture)
        .env("CHAMPION_LOG", "info")
        .arg("--log-file")
        .arg(&log)
        .args(["faq", "ask", "bag cleaning"])
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("faq_matched"));
}
