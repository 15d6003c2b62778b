use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use champion_assistant::config::AppConfig;
use champion_assistant::search::FaqCatalog;
use champion_assistant::service::{Assistant, PickupRequest};
use champion_assistant::storage::sqlite::SqliteStorage;
use chrono::NaiveDate;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }
}

#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }

    pub fn remove(key: &str) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Scratch directory holding a database and config for one test.
#[allow(dead_code)]
pub struct TempFixtureDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TempFixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("champion.db")
    }

    /// Not created; a missing config file means defaults.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }
}

/// Fixed "today" so date validation is reproducible.
#[allow(dead_code)]
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

/// Assistant over the embedded catalog and a private in-memory store.
#[allow(dead_code)]
pub fn memory_assistant() -> Assistant {
    Assistant::new(
        AppConfig::default(),
        FaqCatalog::embedded().unwrap(),
        SqliteStorage::open_in_memory().unwrap(),
    )
    .with_today(fixed_today())
}

#[allow(dead_code)]
pub fn pickup_request() -> PickupRequest {
    PickupRequest {
        full_name: "Layla Haddad".into(),
        phone_number: "+971 52 765 4321".into(),
        email: Some("layla@example.com".into()),
        pickup_address: "Flat 803, Al Nahda Tower 2, Sharjah".into(),
        pickup_date: "2026-03-12".into(),
        pickup_time: "4:30 PM".into(),
        service_type: "Wedding Gown Restoration".into(),
        notes: None,
    }
}
