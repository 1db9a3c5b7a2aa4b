//! Site statistics aggregation.
//!
//! Joins per-site customer counts with per-site energy statistics and
//! computes the derived figures shown on the dashboard.

use crate::models::{SiteCustomerCount, SiteRow, SiteStat, Totals};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Placeholder shown where a ratio has no meaningful value.
pub const NO_VALUE: &str = "N/A";

/// A per-customer ratio that is undefined when there are no customers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ratio {
    Value(f64),
    NoValue,
}

impl Ratio {
    /// Formats the ratio with a fixed number of decimals, or the sentinel.
    pub fn format(&self, precision: usize) -> String {
        match self {
            Ratio::Value(v) => format!("{:.*}", precision, v),
            Ratio::NoValue => NO_VALUE.to_string(),
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(2))
    }
}

/// Left-join customer counts with site statistics.
///
/// Produces exactly one row per customer-count entry, in the same order.
/// Sites without statistics get zero MWh and revenue; statistics for sites
/// that have no customer-count entry are dropped. When `stats` repeats a
/// site code, the last entry wins.
pub fn merge(customer_counts: &[SiteCustomerCount], stats: &[SiteStat]) -> Vec<SiteRow> {
    let lookup: HashMap<&str, &SiteStat> = stats.iter().map(|s| (s.site.as_str(), s)).collect();

    customer_counts
        .iter()
        .map(|count| {
            let stat = lookup.get(count.concession.as_str());
            SiteRow {
                concession: count.concession.clone(),
                customer_count: count.customer_count,
                mwh: stat.map_or(0.0, |s| s.mwh),
                lsl_thousands: stat.map_or(0.0, |s| s.lsl_thousands),
            }
        })
        .collect()
}

/// Sum of customers across all rows.
pub fn total_customers(rows: &[SiteRow]) -> u64 {
    rows.iter().map(|r| r.customer_count).sum()
}

/// MWh per customer, or [`Ratio::NoValue`] when there are no customers.
pub fn mwh_per_customer(mwh: f64, customers: u64) -> Ratio {
    if customers > 0 {
        Ratio::Value(mwh / customers as f64)
    } else {
        Ratio::NoValue
    }
}

/// Ratio for a single merged row.
pub fn row_mwh_per_customer(row: &SiteRow) -> Ratio {
    mwh_per_customer(row.mwh, row.customer_count)
}

/// Grand-total MWh per customer, using the API totals against the row customers.
pub fn grand_mwh_per_customer(totals: &Totals, rows: &[SiteRow]) -> Ratio {
    mwh_per_customer(totals.mwh, total_customers(rows))
}

/// Sum MWh and revenue across rows.
///
/// The dashboard displays the totals from the API, not this sum; it is only
/// used to detect when the two disagree.
pub fn row_totals(rows: &[SiteRow]) -> Totals {
    rows.iter().fold(Totals::default(), |acc, r| Totals {
        mwh: acc.mwh + r.mwh,
        lsl_thousands: acc.lsl_thousands + r.lsl_thousands,
    })
}

/// Returns true if the API totals differ from the row sums beyond rounding.
pub fn totals_diverge(api: &Totals, rows: &[SiteRow]) -> bool {
    const EPSILON: f64 = 1e-6;
    let summed = row_totals(rows);
    (api.mwh - summed.mwh).abs() > EPSILON
        || (api.lsl_thousands - summed.lsl_thousands).abs() > EPSILON
}

/// The `n` sites with the highest MWh. Ties keep their original order.
pub fn top_sites_by_mwh(rows: &[SiteRow], n: usize) -> Vec<&SiteRow> {
    let mut sorted: Vec<&SiteRow> = rows.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| b.mwh.partial_cmp(&a.mwh).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}
