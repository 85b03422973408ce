pub mod products_schema;
pub mod products_service;
pub mod products_shared;

pub use products_service::ProductsService;
