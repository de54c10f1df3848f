pub mod environment;
pub mod paths;
pub mod terminal;
pub mod time;

pub use environment::get_data_dir;
pub use paths::{format_path_with_tilde, validate_file_size};
pub use terminal::sanitize_line;
pub use time::{days_before, format_timestamp, now_millis};
