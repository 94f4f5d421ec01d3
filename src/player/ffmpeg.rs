// Adaptive stream playback using ffmpeg-next
// Requires FFmpeg libraries: libavcodec, libavformat, libavutil, libswscale
//
// To install FFmpeg development libraries:
// - Ubuntu/Debian: sudo apt install libavcodec-dev libavformat-dev libavutil-dev
//   libswscale-dev libavdevice-dev
// - Fedora: sudo dnf install ffmpeg-devel
// - macOS: brew install ffmpeg
// - Windows: Download from https://ffmpeg.org and set FFMPEG_DIR environment variable

#[cfg(feature = "internal-player")]
mod engine_impl {
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    extern crate ffmpeg_next as ffmpeg;
    use ffmpeg::format::Pixel;
    use ffmpeg::media::Type;
    use ffmpeg::software::scaling::{context::Context as ScalingContext, flag::Flags};
    use ffmpeg::util::frame::video::Video as VideoFrame;

    use crate::player::engine::{
        AdaptiveEngine, DecodeFailures, DecodeVerdict, DecodedFrame, EngineEvent, EngineSession,
        FaultKind, PlaybackFault, SessionOptions,
    };

    /// Commands to send to the decode thread
    enum SessionCommand {
        Stop,
        Resume,
    }

    pub struct FfmpegEngine;

    impl FfmpegEngine {
        pub fn new() -> Self {
            if let Err(e) = ffmpeg::init() {
                tracing::error!(error = %e, "ffmpeg initialisation failed");
            }
            Self
        }
    }

    impl Default for FfmpegEngine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AdaptiveEngine for FfmpegEngine {
        fn start(
            &mut self,
            locator: &str,
            options: &SessionOptions,
            events: Sender<EngineEvent>,
        ) -> Box<dyn EngineSession> {
            let (cmd_tx, cmd_rx) = channel();
            let current_frame = Arc::new(Mutex::new(None));

            let url = locator.to_string();
            let options = options.clone();
            let frame_slot = Arc::clone(&current_frame);
            thread::spawn(move || {
                decode_thread(url, options, frame_slot, cmd_rx, events);
            });

            Box::new(FfmpegSession {
                command_sender: Some(cmd_tx),
                current_frame,
            })
        }
    }

    struct FfmpegSession {
        command_sender: Option<Sender<SessionCommand>>,
        current_frame: Arc<Mutex<Option<DecodedFrame>>>,
    }

    impl EngineSession for FfmpegSession {
        fn resume(&mut self) {
            if let Some(ref sender) = self.command_sender {
                let _ = sender.send(SessionCommand::Resume);
            }
        }

        fn stop(&mut self) {
            if let Some(sender) = self.command_sender.take() {
                let _ = sender.send(SessionCommand::Stop);
            }
            if let Ok(mut slot) = self.current_frame.lock() {
                *slot = None;
            }
        }

        fn take_frame(&self) -> Option<DecodedFrame> {
            self.current_frame.lock().ok().and_then(|mut slot| slot.take())
        }
    }

    impl Drop for FfmpegSession {
        fn drop(&mut self) {
            self.stop();
        }
    }

    fn fatal(events: &Sender<EngineEvent>, kind: FaultKind, detail: String) {
        tracing::debug!(?kind, %detail, "decode thread giving up");
        let _ = events.send(EngineEvent::Fatal(PlaybackFault::new(kind, detail)));
    }

    /// Wait for the viewer to start playback. False when the session went away.
    fn wait_for_resume(cmd_rx: &Receiver<SessionCommand>) -> bool {
        matches!(cmd_rx.recv(), Ok(SessionCommand::Resume))
    }

    fn decode_thread(
        url: String,
        options: SessionOptions,
        current_frame: Arc<Mutex<Option<DecodedFrame>>>,
        cmd_rx: Receiver<SessionCommand>,
        events: Sender<EngineEvent>,
    ) {
        // Set options for network streams
        let mut dict = ffmpeg::Dictionary::new();
        dict.set("user_agent", &options.user_agent);
        dict.set("reconnect", "1");
        dict.set("reconnect_streamed", "1");
        dict.set("reconnect_delay_max", "5");
        dict.set("timeout", "5000000"); // 5 second timeout

        let mut ictx = match ffmpeg::format::input_with_dictionary(&url, dict) {
            Ok(ctx) => ctx,
            Err(e) => {
                let detail = format!("Failed to open stream: {}", e);
                return fatal(&events, FaultKind::Transport, detail);
            }
        };

        let Some(video_stream) = ictx.streams().best(Type::Video) else {
            return fatal(&events, FaultKind::Media, "No video stream found".to_string());
        };
        let video_stream_index = video_stream.index();

        let codec_context =
            ffmpeg::codec::context::Context::from_parameters(video_stream.parameters());
        let mut decoder = match codec_context.and_then(|context| context.decoder().video()) {
            Ok(d) => d,
            Err(e) => {
                let detail = format!("Failed to create decoder: {}", e);
                return fatal(&events, FaultKind::Media, detail);
            }
        };

        let width = decoder.width();
        let height = decoder.height();

        // Scale to reasonable size if too large
        let (target_width, target_height) = if width > 1280 || height > 720 {
            let scale = f64::min(1280.0 / width as f64, 720.0 / height as f64);
            ((width as f64 * scale) as u32, (height as f64 * scale) as u32)
        } else {
            (width, height)
        };

        let mut scaler = match ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            target_width,
            target_height,
            Flags::BILINEAR,
        ) {
            Ok(s) => s,
            Err(e) => {
                let detail = format!("Failed to create scaler: {}", e);
                return fatal(&events, FaultKind::Media, detail);
            }
        };

        let _ = events.send(EngineEvent::Attached);

        if !options.autoplay {
            let _ = events.send(EngineEvent::AutoplayBlocked);
            if !wait_for_resume(&cmd_rx) {
                return;
            }
        }
        let _ = events.send(EngineEvent::Playing);

        let frame_duration = Duration::from_secs_f64(1.0 / 30.0); // Target 30fps display
        let mut last_frame_time = Instant::now();
        let mut failures = DecodeFailures::default();

        for (stream, packet) in ictx.packets() {
            match cmd_rx.try_recv() {
                Ok(SessionCommand::Stop) | Err(TryRecvError::Disconnected) => return,
                Ok(SessionCommand::Resume) | Err(TryRecvError::Empty) => {}
            }

            if stream.index() != video_stream_index {
                continue;
            }

            if let Err(e) = decoder.send_packet(&packet) {
                match failures.record_failure() {
                    DecodeVerdict::Skip => {
                        let detail = format!("skipped corrupt packet: {}", e);
                        let _ = events.send(EngineEvent::Recovered(detail));
                    }
                    DecodeVerdict::SkipQuietly => {}
                    DecodeVerdict::GiveUp => {
                        let detail = format!(
                            "{} packets in a row failed to decode: {}",
                            failures.consecutive(),
                            e
                        );
                        return fatal(&events, FaultKind::Media, detail);
                    }
                }
                continue;
            }

            let mut decoded = VideoFrame::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = VideoFrame::empty();
                if scaler.run(&decoded, &mut rgb_frame).is_err() {
                    continue;
                }

                let data = rgb_frame.data(0);
                let stride = rgb_frame.stride(0);
                let row_len = target_width as usize * 3;

                // Copy frame data (handling stride)
                let mut frame_data = Vec::with_capacity(row_len * target_height as usize);
                for y in 0..target_height as usize {
                    let row_start = y * stride;
                    frame_data.extend_from_slice(&data[row_start..row_start + row_len]);
                }

                failures.record_frame();
                if let Ok(mut slot) = current_frame.lock() {
                    *slot = Some(DecodedFrame {
                        width: target_width,
                        height: target_height,
                        data: frame_data,
                    });
                }

                // Rate limiting to avoid overwhelming the UI
                let elapsed = last_frame_time.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
                last_frame_time = Instant::now();
            }
        }

        // Live streams do not end on their own; running out of packets means
        // the connection was lost for good.
        if matches!(cmd_rx.try_recv(), Err(TryRecvError::Empty)) {
            fatal(&events, FaultKind::Transport, "Stream ended unexpectedly".to_string());
        }
    }

    pub type DefaultEngine = FfmpegEngine;
}

#[cfg(not(feature = "internal-player"))]
mod engine_impl {
    use std::sync::mpsc::Sender;

    use crate::player::engine::{
        AdaptiveEngine, DecodedFrame, EngineEvent, EngineSession, SessionOptions,
    };

    /// Stand-in used when the crate is built without a decoder
    #[derive(Default)]
    pub struct UnavailableEngine;

    impl UnavailableEngine {
        pub fn new() -> Self {
            Self
        }
    }

    impl AdaptiveEngine for UnavailableEngine {
        fn start(
            &mut self,
            _locator: &str,
            _options: &SessionOptions,
            events: Sender<EngineEvent>,
        ) -> Box<dyn EngineSession> {
            let _ = events.send(EngineEvent::Unavailable(
                "Video playback not enabled. Build with --features internal-player".to_string(),
            ));
            Box::new(IdleSession)
        }
    }

    struct IdleSession;

    impl EngineSession for IdleSession {
        fn resume(&mut self) {}
        fn stop(&mut self) {}
        fn take_frame(&self) -> Option<DecodedFrame> {
            None
        }
    }

    pub type DefaultEngine = UnavailableEngine;
}

pub use engine_impl::*;
