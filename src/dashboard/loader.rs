//! Dashboard loading.
//!
//! The three upstream requests are issued together and awaited as a group.
//! A failed request is replaced by its empty default so the dashboard can
//! always be rendered. The whole group can be abandoned through a
//! cancellation token, in which case nothing is returned.

use crate::analysis::{merge, row_totals, totals_diverge};
use crate::api::{ApiClient, ApiError};
use crate::models::{DashboardData, DataSource, SitesResponse, StatsResponse, TableInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Anything that can supply the three dashboard datasets.
pub trait DashboardSource {
    async fn fetch_tables(&self) -> Result<Vec<TableInfo>, ApiError>;
    async fn fetch_sites(&self) -> Result<SitesResponse, ApiError>;
    async fn fetch_stats(&self) -> Result<StatsResponse, ApiError>;
}

impl DashboardSource for ApiClient {
    async fn fetch_tables(&self) -> Result<Vec<TableInfo>, ApiError> {
        ApiClient::fetch_tables(self).await
    }

    async fn fetch_sites(&self) -> Result<SitesResponse, ApiError> {
        ApiClient::fetch_sites(self).await
    }

    async fn fetch_stats(&self) -> Result<StatsResponse, ApiError> {
        ApiClient::fetch_stats(self).await
    }
}

/// Result of a dashboard load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(DashboardData),
    /// The consumer went away before all requests settled.
    Cancelled,
}

/// Fetch all dashboard data concurrently and merge it.
pub async fn load_dashboard<S: DashboardSource>(
    source: &S,
    cancel: &CancellationToken,
) -> LoadOutcome {
    let fetch_all = async {
        tokio::join!(
            source.fetch_tables(),
            source.fetch_sites(),
            source.fetch_stats()
        )
    };

    let (tables, sites, stats) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Dashboard load cancelled; discarding in-flight requests");
            return LoadOutcome::Cancelled;
        }
        results = fetch_all => results,
    };

    let mut degraded = Vec::new();
    let tables = settle(DataSource::Tables, tables, &mut degraded);
    let sites = settle(DataSource::Sites, sites, &mut degraded);
    let stats = settle(DataSource::Stats, stats, &mut degraded);

    let rows = merge(&sites.sites, &stats.sites);
    debug!(
        "Loaded {} tables, {} sites ({} with stats)",
        tables.len(),
        rows.len(),
        stats.sites.len()
    );

    if totals_diverge(&stats.totals, &rows) {
        let summed = row_totals(&rows);
        debug!(
            "API totals ({:.2} MWh, {:.2}k LSL) differ from row sums ({:.2} MWh, {:.2}k LSL)",
            stats.totals.mwh, stats.totals.lsl_thousands, summed.mwh, summed.lsl_thousands
        );
    }

    LoadOutcome::Loaded(DashboardData {
        tables,
        sites: rows,
        totals: stats.totals,
        degraded,
    })
}

/// Unwrap a fetch result, falling back to the default on failure.
fn settle<T: Default>(
    source: DataSource,
    result: Result<T, ApiError>,
    degraded: &mut Vec<DataSource>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to fetch {}: {}; using empty data", source, e);
            degraded.push(source);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::models::{SiteCustomerCount, SiteRow, SiteStat, Totals};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct FakeSource {
        fail_tables: bool,
        fail_sites: bool,
        fail_stats: bool,
        delay: Option<Duration>,
        barrier: Option<Arc<Barrier>>,
    }

    impl FakeSource {
        async fn wait(&self) {
            if let Some(ref barrier) = self.barrier {
                barrier.wait().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn failure() -> ApiError {
            ApiError::Connect {
                url: "http://fake".to_string(),
            }
        }
    }

    impl DashboardSource for FakeSource {
        async fn fetch_tables(&self) -> Result<Vec<TableInfo>, ApiError> {
            self.wait().await;
            if self.fail_tables {
                return Err(Self::failure());
            }
            Ok(vec![TableInfo {
                name: "customers".to_string(),
                row_count: 10,
                column_count: 3,
            }])
        }

        async fn fetch_sites(&self) -> Result<SitesResponse, ApiError> {
            self.wait().await;
            if self.fail_sites {
                return Err(Self::failure());
            }
            Ok(SitesResponse {
                sites: vec![
                    SiteCustomerCount {
                        concession: "A".to_string(),
                        customer_count: 10,
                    },
                    SiteCustomerCount {
                        concession: "B".to_string(),
                        customer_count: 0,
                    },
                ],
            })
        }

        async fn fetch_stats(&self) -> Result<StatsResponse, ApiError> {
            self.wait().await;
            if self.fail_stats {
                return Err(Self::failure());
            }
            Ok(StatsResponse {
                sites: vec![SiteStat {
                    site: "A".to_string(),
                    mwh: 5.0,
                    lsl_thousands: 2.0,
                }],
                totals: Totals {
                    mwh: 5.0,
                    lsl_thousands: 2.0,
                },
            })
        }
    }

    fn loaded(outcome: LoadOutcome) -> DashboardData {
        match outcome {
            LoadOutcome::Loaded(data) => data,
            LoadOutcome::Cancelled => panic!("expected data, load was cancelled"),
        }
    }

    #[tokio::test]
    async fn test_load_merges_all_sources() {
        let data = loaded(load_dashboard(&FakeSource::default(), &CancellationToken::new()).await);

        assert_eq!(data.tables.len(), 1);
        assert_eq!(
            data.sites,
            vec![
                SiteRow {
                    concession: "A".to_string(),
                    customer_count: 10,
                    mwh: 5.0,
                    lsl_thousands: 2.0,
                },
                SiteRow {
                    concession: "B".to_string(),
                    customer_count: 0,
                    mwh: 0.0,
                    lsl_thousands: 0.0,
                },
            ]
        );
        assert_eq!(data.totals.mwh, 5.0);
        assert!(data.degraded.is_empty());
    }

    #[tokio::test]
    async fn test_each_single_failure_degrades_only_that_source() {
        let source = FakeSource {
            fail_tables: true,
            ..Default::default()
        };
        let data = loaded(load_dashboard(&source, &CancellationToken::new()).await);
        assert!(data.tables.is_empty());
        assert_eq!(data.sites.len(), 2);
        assert_eq!(data.degraded, vec![DataSource::Tables]);

        let source = FakeSource {
            fail_sites: true,
            ..Default::default()
        };
        let data = loaded(load_dashboard(&source, &CancellationToken::new()).await);
        assert_eq!(data.tables.len(), 1);
        assert!(data.sites.is_empty());
        assert_eq!(data.totals.mwh, 5.0);
        assert_eq!(data.degraded, vec![DataSource::Sites]);

        let source = FakeSource {
            fail_stats: true,
            ..Default::default()
        };
        let data = loaded(load_dashboard(&source, &CancellationToken::new()).await);
        assert_eq!(data.sites.len(), 2);
        assert!(data.sites.iter().all(|r| r.mwh == 0.0));
        assert_eq!(data.totals, Totals::default());
        assert_eq!(data.degraded, vec![DataSource::Stats]);
    }

    #[tokio::test]
    async fn test_all_sources_fail() {
        let source = FakeSource {
            fail_tables: true,
            fail_sites: true,
            fail_stats: true,
            ..Default::default()
        };
        let data = loaded(load_dashboard(&source, &CancellationToken::new()).await);

        assert!(data.tables.is_empty());
        assert!(data.sites.is_empty());
        assert_eq!(data.degraded.len(), 3);
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        // Each fetch waits for the other two; a sequential loader would hang.
        let source = FakeSource {
            barrier: Some(Arc::new(Barrier::new(3))),
            ..Default::default()
        };
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            load_dashboard(&source, &CancellationToken::new()),
        )
        .await
        .expect("fetches did not run concurrently");

        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    }

    #[test]
    fn test_cancel_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = tokio_test::block_on(load_dashboard(&FakeSource::default(), &cancel));
        assert_eq!(outcome, LoadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_while_in_flight() {
        let source = FakeSource {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), load_dashboard(&source, &cancel))
            .await
            .expect("cancellation did not abort the load");
        assert_eq!(outcome, LoadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_load_from_http_with_failing_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "customers", "row_count": 3, "column_count": 2}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sites": [
                    {"concession": "MAK", "customer_count": 12},
                    {"concession": "SEH", "customer_count": 0}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stats/summary"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = ApiConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
            ..ApiConfig::default()
        };
        let client = ApiClient::new(config, None).unwrap();
        let data = loaded(load_dashboard(&client, &CancellationToken::new()).await);

        assert_eq!(data.tables[0].name, "customers");
        assert_eq!(data.sites.len(), 2);
        assert_eq!(data.sites[0].concession, "MAK");
        assert_eq!(data.sites[0].mwh, 0.0);
        assert_eq!(data.totals, Totals::default());
        assert_eq!(data.degraded, vec![DataSource::Stats]);
    }
}
