//! Progress Broadcaster
//!
//! 按项目维护订阅者集合，发布即投递，不缓冲、不回放

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::mpsc;

use super::ProgressEvent;
use crate::domain::project::ProjectId;

/// 订阅端已关闭
#[derive(Debug, Error)]
#[error("progress sink closed")]
pub struct SinkClosed;

/// 进度事件接收端
pub trait ProgressSink: Send + Sync {
    fn deliver(&self, event: &ProgressEvent) -> Result<(), SinkClosed>;
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn deliver(&self, event: &ProgressEvent) -> Result<(), SinkClosed> {
        self.send(event.clone()).map_err(|_| SinkClosed)
    }
}

type SinkEntry = (u64, Arc<dyn ProgressSink>);

/// 进度广播器
pub struct ProgressBroadcaster {
    /// project_id -> 订阅者列表
    subscribers: DashMap<ProjectId, Vec<SinkEntry>>,
    next_sink_id: AtomicU64,
}

impl ProgressBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_sink_id: AtomicU64::new(1),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅项目进度；返回的 Subscription 被丢弃时自动退订
    pub fn subscribe(
        self: &Arc<Self>,
        project_id: ProjectId,
        sink: Arc<dyn ProgressSink>,
    ) -> Subscription {
        let sink_id = self.next_sink_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(project_id.clone())
            .or_default()
            .push((sink_id, sink));

        tracing::debug!(project_id = %project_id, sink_id, "Progress subscriber added");

        Subscription {
            broadcaster: Arc::downgrade(self),
            project_id,
            sink_id,
            active: true,
        }
    }

    /// 以 unbounded channel 作为接收端订阅
    pub fn subscribe_channel(
        self: &Arc<Self>,
        project_id: ProjectId,
    ) -> (mpsc::UnboundedReceiver<ProgressEvent>, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(project_id, Arc::new(tx));
        (rx, subscription)
    }

    /// 投递给当前所有订阅者；单个订阅者失败只记录日志
    pub fn publish(&self, project_id: &ProjectId, event: ProgressEvent) {
        let sinks: Vec<SinkEntry> = match self.subscribers.get(project_id) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        for (sink_id, sink) in sinks {
            if let Err(e) = sink.deliver(&event) {
                tracing::debug!(
                    project_id = %project_id,
                    sink_id,
                    event = event.kind(),
                    error = %e,
                    "Failed to deliver progress event"
                );
            }
        }
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self, project_id: &ProjectId) -> usize {
        self.subscribers
            .get(project_id)
            .map_or(0, |entry| entry.len())
    }

    fn unsubscribe(&self, project_id: &ProjectId, sink_id: u64) {
        if let Some(mut entry) = self.subscribers.get_mut(project_id) {
            entry.retain(|(id, _)| *id != sink_id);
        }
        self.subscribers
            .remove_if(project_id, |_, sinks| sinks.is_empty());

        tracing::debug!(project_id = %project_id, sink_id, "Progress subscriber removed");
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// 订阅句柄
pub struct Subscription {
    broadcaster: Weak<ProgressBroadcaster>,
    project_id: ProjectId,
    sink_id: u64,
    active: bool,
}

impl Subscription {
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// 显式退订
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.unsubscribe(&self.project_id, self.sink_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
