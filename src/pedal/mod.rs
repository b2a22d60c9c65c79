pub mod gateway;
pub mod model;
