//! Events - 进度事件与按项目的多播

mod progress;
mod publisher;

pub use progress::ProgressEvent;
pub use publisher::{ProgressBroadcaster, ProgressSink, SinkClosed, Subscription};
