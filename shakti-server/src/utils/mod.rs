pub mod rows;
pub mod validator;
