//! Engine-level tests against an in-memory store implementation.

use async_trait::async_trait;
use replica_verify::{
    LagReport, ReplicaVerifier, RowRecord, ScalarValue, Store, StoreRole, VerifyConfig,
    VerifyError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct TableFixture {
    rows: Vec<RowRecord>,
    /// Overrides the row count reported to the engine (for large-table
    /// scenarios that never materialize rows).
    reported_count: Option<i64>,
    fail_count: bool,
}

struct MockStore {
    role: StoreRole,
    tables: BTreeMap<String, TableFixture>,
    lag: LagReport,
    fetch_calls: AtomicUsize,
}

impl MockStore {
    fn new(role: StoreRole) -> Self {
        Self {
            role,
            tables: BTreeMap::new(),
            lag: LagReport::Unsupported,
            fetch_calls: AtomicUsize::new(0),
        }
    }

    fn with_table(mut self, name: &str, rows: Vec<RowRecord>) -> Self {
        self.tables.insert(
            name.to_string(),
            TableFixture {
                rows,
                ..Default::default()
            },
        );
        self
    }

    fn with_counted_table(mut self, name: &str, count: i64) -> Self {
        self.tables.insert(
            name.to_string(),
            TableFixture {
                reported_count: Some(count),
                ..Default::default()
            },
        );
        self
    }

    fn with_failing_count(mut self, name: &str) -> Self {
        self.tables.insert(
            name.to_string(),
            TableFixture {
                fail_count: true,
                ..Default::default()
            },
        );
        self
    }

    fn with_lag(mut self, lag: LagReport) -> Self {
        self.lag = lag;
        self
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn fixture(&self, table: &str) -> Result<&TableFixture, VerifyError> {
        self.tables
            .get(table)
            .ok_or_else(|| VerifyError::TableQuery {
                role: self.role,
                table: table.to_string(),
                message: "relation does not exist".to_string(),
            })
    }
}

#[async_trait]
impl Store for MockStore {
    fn role(&self) -> StoreRole {
        self.role
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>, VerifyError> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn count_rows(&self, table: &str) -> Result<i64, VerifyError> {
        let fixture = self.fixture(table)?;
        if fixture.fail_count {
            return Err(VerifyError::TableQuery {
                role: self.role,
                table: table.to_string(),
                message: "permission denied".to_string(),
            });
        }
        Ok(fixture
            .reported_count
            .unwrap_or(fixture.rows.len() as i64))
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<RowRecord>, VerifyError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fixture(table)?.rows.clone())
    }

    async fn replication_lag(&self) -> LagReport {
        self.lag
    }
}

fn product(id: i64, name: &str, price: f64) -> RowRecord {
    RowRecord::new(vec![
        ("id".to_string(), ScalarValue::Int(id)),
        ("name".to_string(), ScalarValue::Text(name.to_string())),
        ("price".to_string(), ScalarValue::Float(price)),
    ])
}

fn products() -> Vec<RowRecord> {
    vec![
        product(1, "anvil", 9.99),
        product(2, "rope", 4.50),
        product(3, "dynamite", 12.00),
    ]
}

fn no_wait() -> VerifyConfig {
    VerifyConfig {
        wait_for_lag: false,
        ..VerifyConfig::default()
    }
}

#[tokio::test]
async fn missing_table_on_replica_still_compares_the_rest() {
    let primary = MockStore::new(StoreRole::Primary)
        .with_table("products", products())
        .with_table("orders", vec![]);
    let replica = MockStore::new(StoreRole::Replica).with_table("products", products());

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(!verdict.tables_match());
    assert!(verdict.table_diff.only_in_replica.is_empty());
    assert_eq!(
        verdict.table_diff.only_in_primary,
        ["orders".to_string()].into_iter().collect::<BTreeSet<_>>()
    );

    // "products" lives on both sides and is still compared
    assert_eq!(verdict.tables.len(), 1);
    let products_result = &verdict.tables[0];
    assert_eq!(products_result.table, "products");
    assert!(products_result.count_match);
    assert_eq!(products_result.data_match, Some(true));
}

#[tokio::test]
async fn identical_rows_in_different_physical_order_match() {
    let mut shuffled = products();
    shuffled.rotate_left(2);

    let primary = MockStore::new(StoreRole::Primary).with_table("products", products());
    let replica = MockStore::new(StoreRole::Replica).with_table("products", shuffled);

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(verdict.tables_match());
    let result = &verdict.tables[0];
    assert!(result.count_match);
    assert_eq!(result.data_match, Some(true));
    assert!(!result.skipped_data_check);
}

#[tokio::test]
async fn large_table_with_equal_counts_skips_data_check() {
    let primary = MockStore::new(StoreRole::Primary).with_counted_table("orders", 5000);
    let replica = MockStore::new(StoreRole::Replica).with_counted_table("orders", 5000);

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(verdict.tables_match());
    let result = &verdict.tables[0];
    assert!(result.count_match);
    assert_eq!(result.data_match, None);
    assert!(result.skipped_data_check);
    assert_eq!(primary.fetch_calls(), 0);
    assert_eq!(replica.fetch_calls(), 0);
}

#[tokio::test]
async fn threshold_boundary_is_strictly_less_than() {
    let rows = products();
    let config = VerifyConfig {
        threshold: 3,
        wait_for_lag: false,
    };

    // Exactly threshold rows: counts only
    let primary = MockStore::new(StoreRole::Primary).with_table("products", rows.clone());
    let replica = MockStore::new(StoreRole::Replica).with_table("products", rows.clone());
    let verdict = ReplicaVerifier::new(&primary, &replica, config.clone())
        .verify()
        .await
        .unwrap();
    assert!(verdict.tables[0].skipped_data_check);
    assert_eq!(verdict.tables[0].data_match, None);
    assert_eq!(primary.fetch_calls(), 0);

    // One under threshold: full comparison runs
    let fewer: Vec<_> = rows.into_iter().take(2).collect();
    let primary = MockStore::new(StoreRole::Primary).with_table("products", fewer.clone());
    let replica = MockStore::new(StoreRole::Replica).with_table("products", fewer);
    let verdict = ReplicaVerifier::new(&primary, &replica, config)
        .verify()
        .await
        .unwrap();
    assert!(!verdict.tables[0].skipped_data_check);
    assert_eq!(verdict.tables[0].data_match, Some(true));
    assert_eq!(primary.fetch_calls(), 1);
}

#[tokio::test]
async fn count_mismatch_short_circuits_data_fetch() {
    let primary = MockStore::new(StoreRole::Primary).with_table("products", products());
    let replica = MockStore::new(StoreRole::Replica)
        .with_table("products", products().into_iter().take(2).collect());

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(!verdict.tables_match());
    let result = &verdict.tables[0];
    assert!(!result.count_match);
    assert_eq!(result.primary_count, Some(3));
    assert_eq!(result.replica_count, Some(2));
    assert_eq!(result.data_match, None);
    assert!(result.skipped_data_check);
    assert_eq!(primary.fetch_calls(), 0);
    assert_eq!(replica.fetch_calls(), 0);
}

#[tokio::test]
async fn data_drift_with_equal_counts_is_detected() {
    let mut drifted = products();
    drifted[1] = product(2, "rope", 5.00);

    let primary = MockStore::new(StoreRole::Primary).with_table("products", products());
    let replica = MockStore::new(StoreRole::Replica).with_table("products", drifted);

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(!verdict.tables_match());
    let result = &verdict.tables[0];
    assert!(result.count_match);
    assert_eq!(result.data_match, Some(false));
}

#[tokio::test]
async fn per_table_failure_does_not_abort_the_run() {
    let primary = MockStore::new(StoreRole::Primary)
        .with_failing_count("broken")
        .with_table("products", products());
    let replica = MockStore::new(StoreRole::Replica)
        .with_table("broken", vec![])
        .with_table("products", products());

    let verdict = ReplicaVerifier::new(&primary, &replica, no_wait())
        .verify()
        .await
        .unwrap();

    assert!(!verdict.tables_match());
    assert_eq!(verdict.tables.len(), 2);

    // Results stay sorted by table name regardless of processing details
    assert_eq!(verdict.tables[0].table, "broken");
    assert_eq!(verdict.tables[1].table, "products");

    let broken = &verdict.tables[0];
    assert!(!broken.count_match);
    assert_eq!(broken.primary_count, None);
    assert_eq!(broken.replica_count, Some(0));
    assert!(broken.error.as_deref().unwrap().contains("permission denied"));

    // The healthy table was still fully verified
    let healthy = &verdict.tables[1];
    assert!(healthy.count_match);
    assert_eq!(healthy.data_match, Some(true));
}

#[tokio::test]
async fn zero_lag_and_unsupported_lag_do_not_wait() {
    for lag in [LagReport::Measured(0), LagReport::Unsupported] {
        let primary = MockStore::new(StoreRole::Primary).with_table("products", products());
        let replica = MockStore::new(StoreRole::Replica)
            .with_table("products", products())
            .with_lag(lag);

        // wait_for_lag enabled: completes immediately because the policy
        // waits only for a measured, non-zero lag
        let config = VerifyConfig::default();
        let verdict = ReplicaVerifier::new(&primary, &replica, config)
            .verify()
            .await
            .unwrap();
        assert!(verdict.tables_match());
        assert_eq!(verdict.lag, lag);
    }
}
