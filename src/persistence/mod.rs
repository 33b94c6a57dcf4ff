pub mod config;
pub mod files;
pub mod records;
pub mod store;

pub use config::{load_config, save_config, AppConfig};
pub use files::{
    atomic_write, config_file, ensure_data_dir, expenses_file, init_local_data_dir, invoices_file,
    report_file, tasks_file,
};
pub use records::RecordFile;
pub use store::{match_id_prefix, resolve_id, JsonFileStore, TaskStore};
