//! Application layer - config, notifications, list and test-result controllers, forms, statistics
//!
//! Controllers hold UI state and transitions only. Network calls go through
//! the repository traits, and rendering is left to the cli and gui crates.

pub mod config;
pub mod confirm;
pub mod forms;
pub mod list;
pub mod modal;
pub mod notify;
pub mod report;

pub use config::Config;
pub use confirm::Confirmation;
pub use list::{ListRenderer, ListView, VehicleListController};
pub use modal::TestResultModal;
pub use notify::{Notifier, Toast, ToastLevel};
pub use report::StatisticsBoard;
