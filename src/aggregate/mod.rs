pub mod alert;
pub mod window;

pub use alert::{AlertReport, AlertState, Vocabulary};
pub use window::{WindowReport, WindowState};
