pub mod clock;
pub mod dispatch;
pub mod event;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{DispatchState, Dispatcher};
pub use event::{window_message, EventSink, PipelineEvent, RunSummary, SharedSink, TracingSink};
