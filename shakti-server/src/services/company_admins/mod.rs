pub mod company_admins_schema;
pub mod company_admins_service;
pub mod company_admins_shared;

pub use company_admins_service::CompanyAdminsService;
