mod expense_tests;
mod report_tests;

use crate::core::models::Account;
use crate::core::service::LedgerService;
use crate::infrastructure::notify::in_memory::InMemoryNotifier;
use crate::infrastructure::store::in_memory::InMemoryStore;

pub type TestService = LedgerService<InMemoryStore, InMemoryNotifier>;

pub fn create_test_service() -> (TestService, InMemoryNotifier) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let notifier = InMemoryNotifier::new();
    let service = LedgerService::new(InMemoryStore::new(), notifier.clone());
    (service, notifier)
}

pub async fn register(service: &TestService, name: &str) -> Account {
    service
        .register_account(name, &format!("{name}@example.com"))
        .await
        .unwrap()
}
