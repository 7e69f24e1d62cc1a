use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Events that can be emitted by components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    LogLine {
        level: String,
        message: String,
    },

    // API events
    APICallStarted {
        provider: String,
        model: String,
    },
    APICallCompleted {
        provider: String,
        tokens: usize,
        cost: f32,
    },
    APIError {
        provider: String,
        error: String,
    },

    // Search flow events
    CatalogLoaded {
        count: usize,
    },
    SearchCompleted {
        matches: usize,
    },

    // Report flow events
    ReportSaved {
        path: String,
    },
}

/// Event bus for component communication
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    metrics: Arc<RwLock<Metrics>>,
}

/// Accumulated metrics from events
#[derive(Debug, Default, Clone)]
pub struct Metrics {
    pub total_api_calls: usize,
    pub total_tokens: usize,
    pub total_cost: f32,
    pub searches_run: usize,
    pub reports_saved: usize,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            metrics: Arc::new(RwLock::new(Metrics::default())),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    pub async fn emit(&self, event: Event) -> Result<()> {
        // Update metrics based on event
        self.update_metrics(&event).await;

        // Send event to subscribers
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(_) => {
                // No receivers, but that's okay
                Ok(())
            }
        }
    }

    /// Get current metrics
    pub async fn get_metrics(&self) -> Metrics {
        self.metrics.read().await.clone()
    }

    /// Update metrics based on event
    async fn update_metrics(&self, event: &Event) {
        let mut metrics = self.metrics.write().await;

        match event {
            Event::APICallCompleted { tokens, cost, .. } => {
                metrics.total_api_calls += 1;
                metrics.total_tokens += tokens;
                metrics.total_cost += cost;
            }
            Event::SearchCompleted { .. } => {
                metrics.searches_run += 1;
            }
            Event::ReportSaved { .. } => {
                metrics.reports_saved += 1;
            }
            _ => {}
        }
    }
}

/// Trait for components that can emit events
#[async_trait::async_trait]
pub trait EventEmitter {
    #[allow(dead_code)]
    fn set_event_bus(&mut self, bus: Arc<EventBus>);

    #[allow(dead_code)]
    async fn emit_event(&self, event: Event) -> Result<()>;
}

/// Helper macro to implement EventEmitter trait
#[macro_export]
macro_rules! impl_event_emitter {
    ($type:ty) => {
        #[async_trait::async_trait]
        impl EventEmitter for $type {
            fn set_event_bus(&mut self, bus: Arc<EventBus>) {
                self.event_bus = Some(bus);
            }

            async fn emit_event(&self, event: Event) -> Result<()> {
                if let Some(bus) = &self.event_bus {
                    bus.emit(event).await
                } else {
                    Ok(())
                }
            }
        }
    };
}
