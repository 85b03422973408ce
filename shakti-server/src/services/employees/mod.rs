pub mod employees_schema;
pub mod employees_service;
pub mod employees_shared;

pub use employees_service::EmployeesService;
