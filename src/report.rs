use term_table::row::Row;
use term_table::table_cell::{Alignment as CellAlignment, TableCell};
use term_table::{Table, TableStyle};
use tracing::{info, warn};

use crate::workflow::RunReport;

/// Render the run summary table
pub fn render_run_summary(report: &RunReport) -> String {
    let mut table = Table::new();
    table.style = TableStyle::extended();

    let header = match (report.receipt.status, report.values_match()) {
        (true, true) => "✅  VALUE STORED AND READ BACK ✅",
        (false, _) => "❌  TRANSACTION REVERTED  ❌",
        (true, false) => "⚠️  READ BACK A DIFFERENT VALUE  ⚠️",
    };
    table.add_row(Row::new(vec![TableCell::builder(header)
        .col_span(2)
        .alignment(CellAlignment::Center)
        .build()]));

    let status = if report.receipt.status {
        "success"
    } else {
        "reverted"
    };
    let block = report
        .receipt
        .block_number
        .map(|b| b.to_string())
        .unwrap_or_else(|| "pending".to_string());

    let rows = [
        ("RPC URL", report.endpoint.clone()),
        ("Chain ID", report.chain_id.to_string()),
        ("Account", format!("{:?}", report.account)),
        ("Contract", format!("{:?}", report.contract_address)),
        ("Stored", report.stored_value.to_string()),
        ("Tx Hash", format!("{:?}", report.tx_hash)),
        ("Receipt", format!("{status} (block {block}, gas {})", report.receipt.gas_used)),
        ("Raw Read", report.raw_value.clone()),
        ("Bound Read", report.bound_value.clone()),
    ];
    for (label, value) in rows {
        table.add_row(Row::new(vec![
            TableCell::builder(label)
                .alignment(CellAlignment::Right)
                .build(),
            TableCell::builder(value)
                .alignment(CellAlignment::Left)
                .build(),
        ]));
    }

    table.render()
}

/// Log the run summary, as a warning when the run did not land the value.
pub fn display_run_summary(report: &RunReport) {
    let rendered = render_run_summary(report);
    if report.receipt.status && report.values_match() {
        info!("\n{}", rendered);
    } else {
        warn!("\n{}", rendered);
    }
}
