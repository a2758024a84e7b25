pub mod reader;

pub use reader::{LogRecord, ReadOutcome, ReaderError, TailReader};
