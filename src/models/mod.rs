pub mod board;
pub mod co2;
pub mod display_update;
pub mod element;
pub mod humidity;
pub mod reading;
pub mod temperature;
