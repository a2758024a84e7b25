pub mod generator;
pub mod writer;

pub use generator::MessageGenerator;
pub use writer::{run_producer, MessageWriter, ProducerError};
