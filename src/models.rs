//! Data models for the dashboard.
//!
//! This module contains the wire types returned by the Customer Care API
//! and the derived structures the dashboard is rendered from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata about a database table exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name, unique within the API.
    pub name: String,
    /// Number of rows in the table.
    #[serde(default)]
    pub row_count: u64,
    /// Number of columns in the table.
    #[serde(default)]
    pub column_count: u64,
}

/// Number of customers registered at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCustomerCount {
    /// Site code.
    pub concession: String,
    #[serde(default)]
    pub customer_count: u64,
}

/// Energy and revenue statistics for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStat {
    /// Site code.
    pub site: String,
    /// Energy delivered, in megawatt-hours.
    #[serde(default)]
    pub mwh: f64,
    /// Revenue in thousands of LSL.
    #[serde(default)]
    pub lsl_thousands: f64,
}

/// One merged dashboard row per site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRow {
    pub concession: String,
    pub customer_count: u64,
    pub mwh: f64,
    pub lsl_thousands: f64,
}

/// Grand totals as reported by the summary endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub mwh: f64,
    #[serde(default)]
    pub lsl_thousands: f64,
}

/// Response body of `GET /api/sites`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitesResponse {
    #[serde(default)]
    pub sites: Vec<SiteCustomerCount>,
}

/// Response body of the summary statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub sites: Vec<SiteStat>,
    #[serde(default)]
    pub totals: Totals,
}

/// One of the three upstream sources the dashboard is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Tables,
    Sites,
    Stats,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Tables => write!(f, "tables"),
            DataSource::Sites => write!(f, "sites"),
            DataSource::Stats => write!(f, "stats"),
        }
    }
}

/// Everything the dashboard view needs, after all fetches have settled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub tables: Vec<TableInfo>,
    /// Merged per-site rows, in customer-count order.
    pub sites: Vec<SiteRow>,
    pub totals: Totals,
    /// Sources that failed and were replaced by their empty default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DataSource>,
}

/// Metadata printed at the top of a rendered dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Base URL of the API the data came from.
    pub api_url: String,
    /// When the dashboard was rendered.
    pub generated_at: DateTime<Utc>,
    /// Signed-in user.
    pub username: String,
    /// Account category of the signed-in user.
    pub user_class: String,
}

/// A rendered dashboard: metadata plus the loaded data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub data: DashboardData,
}
