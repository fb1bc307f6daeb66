pub mod append_log;
pub mod traits;

pub use append_log::AppendLog;
pub use traits::{EventSink, SinkError};
