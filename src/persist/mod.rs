pub mod codec;

pub use codec::{load_file, read_model, save_file, write_model};
