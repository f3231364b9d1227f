mod append;

pub use append::{append_line, ensure_dir};
