pub mod buffer;
pub mod writer;

pub use buffer::RecordBuffer;
pub use writer::{read_binary, BinaryHeader, OutputFormat, RecordWriter};
