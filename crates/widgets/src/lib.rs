pub mod channel;
pub mod fps;
pub mod frame;
pub mod overlay;

pub use channel::ChannelWidget;
pub use fps::FpsWidget;
pub use frame::FrameWidget;
pub use overlay::Overlay;
