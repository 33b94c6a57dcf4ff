pub mod generator;
pub mod stats;

pub use generator::{export_expenses, generate_report, render_invoice};
