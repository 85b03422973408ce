//! Stored records. Password hashes deserialize but never serialize, so a
//! record can be returned to clients as is.

pub mod account;
pub mod call_log;
pub mod case;
pub mod column;
pub mod team;
pub mod tenant;

pub use account::{CompanyAdmin, Employee, EmployeeStatus, SuperAdmin};
pub use call_log::CallLog;
pub use case::{CaseStatus, CustomerCase};
pub use column::ColumnConfig;
pub use team::{Team, TeamStatus};
pub use tenant::{Tenant, TenantStatus};
