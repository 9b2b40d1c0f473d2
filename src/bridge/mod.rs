//! Per-call bridge wiring
//!
//! One media leg = one transcription connection + two concurrent paths:
//! the media ingress loop (this task) and the transcription listener
//! (a spawned task). They share only the call session and the leg's
//! active call identifier.

mod teardown;

pub use teardown::close_leg;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::media::{IngressExit, IngressSummary, MediaIngress, MediaTransport};
use crate::reply::ReplyOrchestrator;
use crate::session::SessionRegistry;
use crate::transcription::UplinkConnector;
use crate::turn::{run_listener, AccumulationMode, ListenerExit, TurnProcessor};

/// Everything a media leg needs, shared across all calls
#[derive(Clone)]
pub struct BridgeContext {
    pub registry: SessionRegistry,
    pub connector: Arc<dyn UplinkConnector>,
    pub orchestrator: Arc<ReplyOrchestrator>,
    pub accumulation: AccumulationMode,
    pub listener_grace: Duration,
}

impl BridgeContext {
    pub fn new(
        registry: SessionRegistry,
        connector: Arc<dyn UplinkConnector>,
        orchestrator: Arc<ReplyOrchestrator>,
        config: &Config,
    ) -> Self {
        Self {
            registry,
            connector,
            orchestrator,
            accumulation: config.turns.accumulation,
            listener_grace: config.transcription.listener_grace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegExit {
    /// Transcription backend unreachable; nothing was relayed
    ConnectFailed(String),
    Ingress(IngressExit),
}

#[derive(Debug, Clone)]
pub struct LegSummary {
    pub leg_id: Uuid,
    pub call_id: String,
    pub exit: LegExit,
    pub ingress: Option<IngressSummary>,
    /// `None` if the listener was still running when the grace period ran out
    pub listener: Option<ListenerExit>,
}

/// Run one media leg to completion and release both connections
pub async fn run_call_leg<T: MediaTransport>(
    ctx: &BridgeContext,
    call_id: &str,
    mut transport: T,
) -> LegSummary {
    let leg_id = Uuid::new_v4();
    info!("Media leg {} open: call={}", leg_id, call_id);

    let (mut uplink, events) = match ctx.connector.open().await {
        Ok(pair) => pair,
        Err(e) => {
            error!("Media leg {}: {}", leg_id, e);
            if let Err(close_err) = transport.close().await {
                debug!("Closing media stream after connect failure: {}", close_err);
            }
            return LegSummary {
                leg_id,
                call_id: call_id.to_string(),
                exit: LegExit::ConnectFailed(e.to_string()),
                ingress: None,
                listener: None,
            };
        }
    };

    if !call_id.is_empty() {
        ctx.registry.get_or_create(call_id).await;
    }

    let (active_tx, active_rx) = watch::channel(call_id.to_string());

    let processor = TurnProcessor::new(
        ctx.registry.clone(),
        active_rx,
        Arc::clone(&ctx.orchestrator),
        ctx.accumulation,
    );
    let mut listener = tokio::spawn(run_listener(events, processor));

    let mut ingress = MediaIngress::new(ctx.registry.clone(), active_tx, call_id);
    let summary = ingress.run(&mut transport, uplink.as_mut()).await;

    close_leg(uplink.as_mut(), &mut transport).await;

    let listener_exit = match tokio::time::timeout(ctx.listener_grace, &mut listener).await {
        Ok(Ok(exit)) => Some(exit),
        Ok(Err(e)) => {
            error!("Media leg {}: transcription listener panicked: {}", leg_id, e);
            None
        }
        Err(_) => {
            debug!("Media leg {}: listener still running, aborting", leg_id);
            listener.abort();
            None
        }
    };

    info!(
        "Media leg {} closed: call={} frames={} exit={:?}",
        leg_id, summary.call_id, summary.frames_forwarded, summary.exit
    );

    LegSummary {
        leg_id,
        call_id: summary.call_id.clone(),
        exit: LegExit::Ingress(summary.exit.clone()),
        ingress: Some(summary),
        listener: listener_exit,
    }
}
