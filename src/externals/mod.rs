pub mod display;
pub mod sensor_endpoints;
