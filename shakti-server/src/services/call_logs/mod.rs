pub mod call_logs_schema;
pub mod call_logs_service;
pub mod call_logs_shared;

pub use call_logs_service::CallLogsService;
