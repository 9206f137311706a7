pub mod error;
pub mod event;
pub mod state;
pub mod widget;

pub use error::{OverlayError, Result};
pub use event::Message;
pub use state::{ChannelReading, MetricsSnapshot, Reading};
