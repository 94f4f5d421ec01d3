//! Playback adapter
//!
//! Hides the difference between adaptive streams (decoded by an
//! [`AdaptiveEngine`]) and embedded-player streams behind one surface. The
//! adapter owns at most one activation at a time and reports an
//! unrecoverable failure of that activation at most once.

pub mod engine;
pub mod ffmpeg;

use std::sync::mpsc::{channel, Receiver, TryRecvError};

pub use engine::{
    AdaptiveEngine, DecodedFrame, EngineEvent, EngineSession, FaultKind, PlaybackFault,
    SessionOptions,
};
pub use ffmpeg::DefaultEngine;

use crate::streams::{
    FailoverController, FailoverOutcome, FailoverState, PlaybackTechnology, StreamDescriptor,
    StreamId,
};

/// What the video surface should show right now
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceStatus {
    Connecting,
    Playing,
    /// Ready, waiting for the viewer to start playback
    ClickToPlay,
    /// No decoder in this build; not a stream failure
    Unavailable(String),
    Failed(String),
}

enum Surface {
    Adaptive {
        session: Box<dyn EngineSession>,
        events: Receiver<EngineEvent>,
    },
    Embedded,
}

struct Activation {
    descriptor: StreamDescriptor,
    surface: Surface,
    fault_reported: bool,
    status: SurfaceStatus,
}

impl Activation {
    fn same_source(&self, descriptor: &StreamDescriptor) -> bool {
        self.descriptor.id() == descriptor.id()
            && self.descriptor.source_locator() == descriptor.source_locator()
            && self.descriptor.technology() == descriptor.technology()
    }
}

pub struct PlaybackAdapter<E: AdaptiveEngine> {
    engine: E,
    options: SessionOptions,
    activation: Option<Activation>,
}

impl<E: AdaptiveEngine> PlaybackAdapter<E> {
    pub fn new(engine: E, options: SessionOptions) -> Self {
        Self {
            engine,
            options,
            activation: None,
        }
    }

    /// Show `descriptor`. Re-activating the stream already on screen does nothing.
    pub fn activate(&mut self, descriptor: &StreamDescriptor) {
        if self
            .activation
            .as_ref()
            .is_some_and(|a| a.same_source(descriptor))
        {
            return;
        }

        // Old session must be gone before the new one starts
        self.teardown();

        let (surface, status) = match descriptor.technology() {
            PlaybackTechnology::AdaptiveStreaming => {
                let (tx, rx) = channel();
                let session = self
                    .engine
                    .start(descriptor.source_locator(), &self.options, tx);
                (
                    Surface::Adaptive {
                        session,
                        events: rx,
                    },
                    SurfaceStatus::Connecting,
                )
            }
            PlaybackTechnology::EmbeddedPlayer => (Surface::Embedded, SurfaceStatus::Playing),
        };

        tracing::info!(
            stream = %descriptor.id(),
            technology = ?descriptor.technology(),
            "activating stream"
        );
        self.activation = Some(Activation {
            descriptor: descriptor.clone(),
            surface,
            fault_reported: false,
            status,
        });
    }

    /// Drain engine events for the current activation. The first fatal error
    /// of an activation is passed to `on_stream_error`; later ones are not.
    pub fn poll<F: FnMut(&StreamId)>(&mut self, mut on_stream_error: F) {
        let Some(activation) = self.activation.as_mut() else {
            return;
        };
        let Surface::Adaptive { events, .. } = &activation.surface else {
            return;
        };

        let mut pending = Vec::new();
        loop {
            match events.try_recv() {
                Ok(event) => pending.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        for event in pending {
            match event {
                EngineEvent::Attached => {
                    tracing::debug!(stream = %activation.descriptor.id(), "media attached");
                }
                EngineEvent::Playing => activation.status = SurfaceStatus::Playing,
                EngineEvent::AutoplayBlocked => {
                    tracing::warn!(stream = %activation.descriptor.id(), "autoplay was prevented");
                    activation.status = SurfaceStatus::ClickToPlay;
                }
                EngineEvent::Recovered(detail) => {
                    tracing::warn!(
                        stream = %activation.descriptor.id(),
                        %detail,
                        "recoverable playback error"
                    );
                }
                EngineEvent::Unavailable(reason) => {
                    activation.status = SurfaceStatus::Unavailable(reason);
                }
                EngineEvent::Fatal(fault) => {
                    activation.status = SurfaceStatus::Failed(fault.kind.message().to_string());
                    if activation.fault_reported {
                        tracing::debug!(
                            stream = %activation.descriptor.id(),
                            %fault,
                            "further fatal error ignored"
                        );
                        continue;
                    }
                    activation.fault_reported = true;
                    tracing::error!(
                        stream = %activation.descriptor.id(),
                        %fault,
                        "fatal playback error"
                    );
                    on_stream_error(activation.descriptor.id());
                }
            }
        }
    }

    /// Start playback after autoplay was blocked
    pub fn click_to_play(&mut self) {
        if let Some(activation) = self.activation.as_mut() {
            if activation.status != SurfaceStatus::ClickToPlay {
                return;
            }
            if let Surface::Adaptive { session, .. } = &mut activation.surface {
                session.resume();
                activation.status = SurfaceStatus::Connecting;
            }
        }
    }

    /// End the current activation, if any
    pub fn teardown(&mut self) {
        if let Some(mut activation) = self.activation.take() {
            if let Surface::Adaptive { session, .. } = &mut activation.surface {
                session.stop();
            }
            tracing::debug!(stream = %activation.descriptor.id(), "activation torn down");
        }
    }

    pub fn current(&self) -> Option<&StreamDescriptor> {
        self.activation.as_ref().map(|a| &a.descriptor)
    }

    pub fn status(&self) -> Option<&SurfaceStatus> {
        self.activation.as_ref().map(|a| &a.status)
    }

    pub fn take_frame(&self) -> Option<DecodedFrame> {
        match self.activation.as_ref().map(|a| &a.surface) {
            Some(Surface::Adaptive { session, .. }) => session.take_frame(),
            _ => None,
        }
    }

    /// Address to open for an embedded-player activation
    pub fn embedded_source(&self) -> Option<String> {
        let activation = self.activation.as_ref()?;
        match activation.surface {
            Surface::Embedded => Some(embed_source(
                activation.descriptor.source_locator(),
                Some(self.options.volume),
            )),
            Surface::Adaptive { .. } => None,
        }
    }

    /// Applies to the embedded source and to sessions started afterwards
    pub fn set_volume(&mut self, volume: f32) {
        self.options.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.options.autoplay = autoplay;
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl<E: AdaptiveEngine> Drop for PlaybackAdapter<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Feed the adapter's fatal errors into `failover`, then show whichever
/// stream it settles on. Returns false once every stream has failed, after
/// tearing the surface down.
pub fn drive_failover<E: AdaptiveEngine>(
    adapter: &mut PlaybackAdapter<E>,
    failover: &mut FailoverController,
) -> bool {
    adapter.poll(|id| match failover.on_stream_failure(id) {
        FailoverOutcome::Switched { from, to } => {
            tracing::info!(%from, %to, "switched stream after failure");
        }
        FailoverOutcome::AllFailed => tracing::error!("all streams have failed"),
        FailoverOutcome::AlreadyFailed | FailoverOutcome::UnknownStream => {}
    });

    match failover.state() {
        FailoverState::Playing(descriptor) => {
            adapter.activate(descriptor);
            true
        }
        FailoverState::AllFailed => {
            adapter.teardown();
            false
        }
    }
}

/// Rewrite the `mute` parameter of an embed address to follow the volume.
/// Without a volume the locator is returned as is.
pub fn embed_source(locator: &str, volume: Option<f32>) -> String {
    let Some(volume) = volume else {
        return locator.to_string();
    };
    let mute = if volume <= 0.0 { "mute=1" } else { "mute=0" };

    let (base, query) = match locator.split_once('?') {
        Some((base, query)) => (base, query),
        None => (locator, ""),
    };
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && *p != "mute=0" && *p != "mute=1")
        .collect();
    params.push(mute);
    format!("{}?{}", base, params.join("&"))
}

#[cfg(test)]
#[path = "player_tests.rs"]
mod tests;
