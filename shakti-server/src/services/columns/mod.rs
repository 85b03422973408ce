pub mod columns_schema;
pub mod columns_service;
pub mod columns_shared;

pub use columns_service::ColumnsService;
