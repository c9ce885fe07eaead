//! 取込の進捗通知
//!
//! 進捗は段階ごとの固定値で、単調増加する。購読者がいなくても取込の動作は変わらない。

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Start,
    Extracting,
    Structuring,
    Validating,
    Done,
    Failed,
}

impl ImportStage {
    /// 段階ごとの進捗値（Failedは直前の値を引き継ぐ）
    pub fn checkpoint(&self) -> Option<u8> {
        match self {
            ImportStage::Start => Some(0),
            ImportStage::Extracting => Some(10),
            ImportStage::Structuring => Some(40),
            ImportStage::Validating => Some(80),
            ImportStage::Done => Some(100),
            ImportStage::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStage::Done | ImportStage::Failed)
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportStage::Start => "start",
            ImportStage::Extracting => "extracting",
            ImportStage::Structuring => "structuring",
            ImportStage::Validating => "validating",
            ImportStage::Done => "done",
            ImportStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: ImportStage,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// tokioチャネルへ転送（受信側が閉じていても無視）
pub struct ChannelSink {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: &ProgressEvent) {
        let _ = self.sender.send(event.clone());
    }
}

/// 受け取ったイベントを溜めておく
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// indicatifのプログレスバーに表示
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos:>3}% {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(label.to_string());
        Self { bar }
    }
}

impl ProgressSink for ProgressBarSink {
    fn emit(&self, event: &ProgressEvent) {
        self.bar.set_position(u64::from(event.progress));
        match event.stage {
            ImportStage::Done => self.bar.finish_with_message(event.message.clone()),
            ImportStage::Failed => {
                let reason = event.error.as_deref().unwrap_or(&event.message);
                self.bar.abandon_with_message(format!("失敗: {}", reason));
            }
            _ => self.bar.set_message(event.message.clone()),
        }
    }
}

/// 1回の取込ぶんの進捗を送る
pub(crate) struct ProgressReporter<'a> {
    sink: Option<&'a dyn ProgressSink>,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(sink: Option<&'a dyn ProgressSink>) -> Self {
        Self { sink, last: 0 }
    }

    pub(crate) fn advance(&mut self, stage: ImportStage, message: impl Into<String>) {
        let progress = stage.checkpoint().unwrap_or(self.last).max(self.last);
        self.last = progress;
        self.send(ProgressEvent {
            stage,
            progress,
            message: message.into(),
            error: None,
        });
    }

    pub(crate) fn fail(&mut self, error: &dyn std::error::Error) {
        self.send(ProgressEvent {
            stage: ImportStage::Failed,
            progress: self.last,
            message: "取込に失敗しました".into(),
            error: Some(error.to_string()),
        });
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(sink) = self.sink {
            sink.emit(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_increase() {
        let stages = [
            ImportStage::Start,
            ImportStage::Extracting,
            ImportStage::Structuring,
            ImportStage::Validating,
            ImportStage::Done,
        ];
        let values: Vec<u8> = stages.iter().filter_map(|s| s.checkpoint()).collect();
        assert_eq!(values, vec![0, 10, 40, 80, 100]);
        assert!(ImportStage::Failed.checkpoint().is_none());
    }

    #[test]
    fn test_failed_keeps_last_progress() {
        let sink = RecordingSink::new();
        let mut reporter = ProgressReporter::new(Some(&sink));
        reporter.advance(ImportStage::Start, "start");
        reporter.advance(ImportStage::Structuring, "structuring");
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        reporter.fail(&err);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].stage, ImportStage::Failed);
        assert_eq!(events[2].progress, 40);
        assert_eq!(events[2].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_reporter_without_sink() {
        let mut reporter = ProgressReporter::new(None);
        reporter.advance(ImportStage::Start, "start");
        reporter.advance(ImportStage::Done, "done");
        assert_eq!(reporter.last, 100);
    }

    #[tokio::test]
    async fn test_channel_sink_ignores_closed_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        let event = ProgressEvent {
            stage: ImportStage::Start,
            progress: 0,
            message: "start".into(),
            error: None,
        };
        sink.emit(&event);
        assert_eq!(rx.recv().await, Some(event.clone()));

        drop(rx);
        sink.emit(&event);
    }

    #[test]
    fn test_event_serialization() {
        let event = ProgressEvent {
            stage: ImportStage::Validating,
            progress: 80,
            message: "検証中".into(),
            error: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"stage":"validating","progress":80,"message":"検証中"}"#);
    }
}
