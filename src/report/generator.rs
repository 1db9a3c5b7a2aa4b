//! Dashboard report generation.
//!
//! Renders the loaded dashboard as Markdown (summary cards, tables list and
//! per-site table) or as JSON.

use crate::access::Route;
use crate::analysis::{
    grand_mwh_per_customer, row_mwh_per_customer, top_sites_by_mwh, total_customers, Ratio,
};
use crate::models::{DashboardData, DashboardReport, ReportMetadata, SiteRow, TableInfo};
use anyhow::Result;
use serde::Serialize;

/// Placeholder for a section with nothing to show.
pub const NO_DATA: &str = "No data available.";

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Entries in the "Top sites" card.
    pub top_sites: usize,
    /// Decimals for MWh/customer ratios.
    pub ratio_precision: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            top_sites: 5,
            ratio_precision: 2,
        }
    }
}

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(report: &DashboardReport, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Customer Care Dashboard\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.data, options));
    output.push_str(&generate_top_sites_section(&report.data.sites, options.top_sites));
    output.push_str(&generate_tables_section(&report.data.tables));
    output.push_str(&generate_sites_section(&report.data.sites, options));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **API:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **User:** {} ({})\n",
        metadata.username, metadata.user_class
    ));
    section.push('\n');

    section
}

/// Generate the summary cards.
fn generate_summary_section(data: &DashboardData, options: &RenderOptions) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Tables | Customers | Total MWh | Revenue (k LSL) | MWh/Customer |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {:.2} | {:.2} | {} |\n\n",
        data.tables.len(),
        total_customers(&data.sites),
        data.totals.mwh,
        data.totals.lsl_thousands,
        grand_mwh_per_customer(&data.totals, &data.sites).format(options.ratio_precision),
    ));

    section
}

/// Generate the "Top sites" card.
fn generate_top_sites_section(rows: &[SiteRow], n: usize) -> String {
    let top = top_sites_by_mwh(rows, n);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("### Top Sites by Energy\n\n");
    for (i, row) in top.iter().enumerate() {
        section.push_str(&format!(
            "{}. **{}** - {:.2} MWh\n",
            i + 1,
            row.concession,
            row.mwh
        ));
    }
    section.push('\n');

    section
}

/// Generate the tables section.
fn generate_tables_section(tables: &[TableInfo]) -> String {
    let mut section = String::new();

    section.push_str("## Tables\n\n");

    if tables.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    section.push_str("| Table | Rows | Columns | Link |\n");
    section.push_str("|:---|---:|---:|:---|\n");
    for table in tables {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            escape_cell(&table.name),
            table.row_count,
            table.column_count,
            escape_cell(&Route::Table(table.name.clone()).path())
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-site section.
fn generate_sites_section(rows: &[SiteRow], options: &RenderOptions) -> String {
    let mut section = String::new();

    section.push_str("## Sites\n\n");

    if rows.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    section.push_str("| Site | Customers | MWh | Revenue (k LSL) | MWh/Customer | Link |\n");
    section.push_str("|:---|---:|---:|---:|---:|:---|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {:.2} | {} | `{}` |\n",
            escape_cell(&row.concession),
            row.customer_count,
            row.mwh,
            row.lsl_thousands,
            row_mwh_per_customer(row).format(options.ratio_precision),
            escape_cell(&Route::Site(row.concession.clone()).path())
        ));
    }
    section.push('\n');

    section
}

/// Keep `|` in API-provided text from splitting a table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Generated by caredash*\n".to_string()
}

/// Render the inline message shown instead of the dashboard when a role is missing.
pub fn render_access_denied(message: &str) -> String {
    format!("# Customer Care Dashboard\n\n> ⛔ {}\n", message)
}

#[derive(Serialize)]
struct JsonSiteRow<'a> {
    #[serde(flatten)]
    row: &'a SiteRow,
    mwh_per_customer: Ratio,
}

#[derive(Serialize)]
struct JsonSummary {
    table_count: usize,
    total_customers: u64,
    total_mwh: f64,
    total_lsl_thousands: f64,
    mwh_per_customer: Ratio,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    summary: JsonSummary,
    tables: &'a [TableInfo],
    sites: Vec<JsonSiteRow<'a>>,
}

/// Generate a JSON dashboard. Undefined ratios are `null`.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    let data = &report.data;
    let json = JsonReport {
        metadata: &report.metadata,
        summary: JsonSummary {
            table_count: data.tables.len(),
            total_customers: total_customers(&data.sites),
            total_mwh: data.totals.mwh,
            total_lsl_thousands: data.totals.lsl_thousands,
            mwh_per_customer: grand_mwh_per_customer(&data.totals, &data.sites),
        },
        tables: &data.tables,
        sites: data
            .sites
            .iter()
            .map(|row| JsonSiteRow {
                row,
                mwh_per_customer: row_mwh_per_customer(row),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&json).map_err(Into::into)
}
