mod format;
mod path;

pub use format::format_timestamp;
pub use path::{dir_prefixes, parent_dir};
