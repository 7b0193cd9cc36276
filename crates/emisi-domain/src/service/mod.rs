//! Domain services

pub mod filter;
pub mod test_form;
pub mod user_form;
pub mod vehicle_form;

pub use filter::{filter_vehicles, TestedFilter, VehicleFilter};
pub use test_form::{TestForm, TestInputs};
pub use user_form::validate_password_pair;
pub use vehicle_form::{normalize_plate, validate_update, VehicleDraft};
