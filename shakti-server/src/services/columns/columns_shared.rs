use serde_json::Value;
use shakti_auth::Role;
use shakti_core::{ServiceCapabilities, ServiceMethodKind, ShaktiApp};

use crate::models::ColumnConfig;
use crate::services::{gate, ShaktiParams, ShaktiState};
use crate::store::{Query, Store, Table};
use crate::utils::rows::from_rows;

pub const SAVE: &str = "save";
pub const CLEAR: &str = "clear";
pub const TEMPLATE: &str = "template";

/// Header of the employee-ID column in upload templates.
pub const EMPID_HEADER: &str = "EMPID";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::from_methods(vec![ServiceMethodKind::Find]).with_custom(&[SAVE, CLEAR, TEMPLATE])
}

pub fn register_hooks(app: &ShaktiApp<Value, ShaktiParams>, state: &ShaktiState) -> anyhow::Result<()> {
    use ServiceMethodKind::*;
    gate(
        app,
        state,
        "columns",
        &[
            (Find, Role::TeamIncharge),
            (Custom(TEMPLATE), Role::TeamIncharge),
            (Custom(SAVE), Role::CompanyAdmin),
            (Custom(CLEAR), Role::CompanyAdmin),
        ],
    )
}

const DEFAULTS: [(&str, &str, &str, bool); 17] = [
    ("customerName", "Customer Name", "text", true),
    ("loanId", "Loan ID", "text", true),
    ("loanAmount", "Loan Amount", "currency", true),
    ("mobileNo", "Mobile No", "phone", true),
    ("dpd", "DPD", "number", true),
    ("outstandingAmount", "Outstanding Amount", "currency", true),
    ("posAmount", "POS Amount", "currency", true),
    ("emiAmount", "EMI Amount", "currency", true),
    ("pendingDues", "Pending Dues", "currency", true),
    ("address", "Address", "text", true),
    ("sanctionDate", "Sanction Date", "date", true),
    ("lastPaidAmount", "Last Paid Amount", "currency", true),
    ("lastPaidDate", "Last Paid Date", "date", true),
    ("paymentLink", "Payment Link", "url", true),
    ("branchName", "Branch Name", "text", true),
    ("loanType", "Loan Type", "text", true),
    ("remarks", "Remarks", "text", false),
];

/// The columns a new product starts with.
pub fn default_columns(tenant_id: &str, product: &str) -> Vec<ColumnConfig> {
    DEFAULTS
        .iter()
        .zip(1..)
        .map(|(&(column_name, display_name, data_type, is_active), order)| ColumnConfig {
            id: None,
            tenant_id: tenant_id.to_string(),
            product_name: product.to_string(),
            column_name: column_name.to_string(),
            display_name: display_name.to_string(),
            data_type: data_type.to_string(),
            is_active,
            is_custom: false,
            column_order: order,
        })
        .collect()
}

/// Example cell for the upload template, one of two borrower profiles.
pub fn sample_value(column_name: &str, second: bool) -> &'static str {
    let (a, b) = match column_name {
        "customerName" => ("Rajesh Kumar", "Sunita Sharma"),
        "loanId" => ("LN001234567", "LN002345678"),
        "loanAmount" => ("500000", "350000"),
        "mobileNo" => ("9876543210", "9876543220"),
        "dpd" => ("45", "30"),
        "outstandingAmount" => ("450000", "195000"),
        "posAmount" => ("50000", "155000"),
        "emiAmount" => ("15000", "12000"),
        "pendingDues" => ("75000", "36000"),
        "address" => ("123 MG Road, Sector 15, Gurgaon", "456 Park Street, Mumbai"),
        "sanctionDate" => ("2023-01-15", "2023-09-20"),
        "lastPaidAmount" => ("15000", "12000"),
        "lastPaidDate" => ("2024-11-15", "2024-02-10"),
        "paymentLink" => ("https://pay.company.com/LN001234567", "https://pay.company.com/LN002345678"),
        "branchName" => ("Gurgaon Branch", "Mumbai Branch"),
        "loanType" => ("Personal Loan", "Home Loan"),
        "remarks" => ("Cooperative customer", "Needs follow-up"),
        _ => ("", ""),
    };
    if second {
        b
    } else {
        a
    }
}

/// Column rows of one product, in display order.
pub async fn product_columns(
    store: &dyn Store,
    tenant_id: &str,
    product: &str,
    active_only: bool,
) -> anyhow::Result<Vec<ColumnConfig>> {
    let mut query = Query::tenant(Table::ColumnConfigurations, tenant_id)
        .eq("product_name", product)
        .order_by("column_order", true);
    if active_only {
        query = query.eq("is_active", true);
    }
    from_rows(store.select(&query).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ordered_and_only_remarks_is_hidden() {
        let cols = default_columns("t1", "Personal Loan");
        assert_eq!(cols.len(), 17);
        assert_eq!(cols[0].column_name, "customerName");
        assert_eq!(cols[16].column_order, 17);
        let hidden: Vec<_> = cols.iter().filter(|c| !c.is_active).map(|c| c.column_name.as_str()).collect();
        assert_eq!(hidden, ["remarks"]);
        assert!(cols.iter().all(|c| c.product_name == "Personal Loan" && !c.is_custom));
    }

    #[test]
    fn samples_cover_both_profiles() {
        assert_eq!(sample_value("customerName", false), "Rajesh Kumar");
        assert_eq!(sample_value("customerName", true), "Sunita Sharma");
        assert_eq!(sample_value("custom_field", false), "");
    }
}
