//! In-memory DNS provider for exercising solvers without a network
//!
//! Available to other crates through the `tests` feature.

use crate::credentials::ApiKey;
use crate::error::ProviderError;
use crate::provider::{DnsProvider, DnsRecord, ProviderResult};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Provider that keeps records in memory and logs every call
#[derive(Debug, Default)]
pub struct FakeProvider {
    records: Mutex<Vec<DnsRecord>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
    reject_duplicates: bool,
    reject_adds: Option<String>,
    fail_lists: bool,
    fail_deletes: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_record(self, record: DnsRecord) -> Self {
        self.lock_records().push(record);
        self
    }

    /// Reject adds of a record that already exists, like most providers do
    #[must_use]
    pub fn reject_duplicates(mut self) -> Self {
        self.reject_duplicates = true;
        self
    }

    /// Reject every add with `detail`
    #[must_use]
    pub fn reject_adds(mut self, detail: &str) -> Self {
        self.reject_adds = Some(detail.to_string());
        self
    }

    /// Fail every list with a transport error
    #[must_use]
    pub fn fail_lists(mut self) -> Self {
        self.fail_lists = true;
        self
    }

    /// Fail every delete with a transport error
    #[must_use]
    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn records(&self) -> Vec<DnsRecord> {
        self.lock_records().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record_call(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, Vec<DnsRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn add_record(
        &self,
        _api_key: &ApiKey,
        zone: &str,
        record_type: &str,
        host: &str,
        value: &str,
    ) -> ProviderResult<()> {
        self.record_call(format!("add {zone} {record_type} {host} {value}"));

        if let Some(detail) = &self.reject_adds {
            return Err(ProviderError::Rejected {
                code: "110".to_string(),
                detail: detail.clone(),
            });
        }

        let fqdn = format!("{host}.{zone}");
        let mut records = self.lock_records();
        let exists = records
            .iter()
            .any(|r| r.host == fqdn && r.record_type == record_type && r.value == value);
        if exists && self.reject_duplicates {
            return Err(ProviderError::Rejected {
                code: "280".to_string(),
                detail: "record already exists".to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        records.push(DnsRecord {
            id: id.to_string(),
            record_type: record_type.to_string(),
            host: fqdn,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn list_records(&self, _api_key: &ApiKey, zone: &str) -> ProviderResult<Vec<DnsRecord>> {
        self.record_call(format!("list {zone}"));
        if self.fail_lists {
            return Err(ProviderError::from_status(503, "503 Service Unavailable"));
        }
        Ok(self.records())
    }

    async fn delete_record(
        &self,
        _api_key: &ApiKey,
        _zone: &str,
        record_id: &str,
    ) -> ProviderResult<()> {
        self.record_call(format!("delete {record_id}"));
        if self.fail_deletes {
            return Err(ProviderError::from_status(500, "500 Internal Server Error"));
        }

        let mut records = self.lock_records();
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(ProviderError::Rejected {
                code: "280".to_string(),
                detail: format!("record {record_id} does not exist"),
            });
        }
        Ok(())
    }
}
