use chrono::NaiveDate;
use model::{Category, CategoryId, Wallet, WalletId};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::context::AppContext;
use crate::session::{Session, SessionToken};
use crate::settings::ClientSettings;
use crate::store::{MemoryStore, StoreSnapshot};

pub const TEST_TOKEN: &str = "test-token";

/// Stderr subscriber for the current test, honouring `RUST_LOG` levels.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn category(title: &str) -> Category {
    Category::new(CategoryId::new_random(), title)
}

pub fn wallet(name: &str) -> Wallet {
    Wallet::new(WalletId::new_random(), name)
}

/// Context over a memory store seeded with `snapshot` and a valid session.
pub fn context_with(snapshot: StoreSnapshot) -> AppContext<MemoryStore> {
    let token = SessionToken::new(TEST_TOKEN);
    AppContext::new(
        MemoryStore::with_snapshot(token.clone(), snapshot),
        Session::new(token),
        ClientSettings::default(),
    )
}
