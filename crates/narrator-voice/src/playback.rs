//! In-process audio output through rodio (feature `rodio`).
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on a
//! dedicated thread for the lifetime of the output. Only the `Send` stream
//! handle crosses back; every clip gets its own `Sink`.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use narrator_core::{AudioClip, AudioElement, AudioOutput, AudioOutputError, PlaybackCompletion};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

pub struct RodioAudioOutput {
    stream_handle: OutputStreamHandle,
    shutdown_tx: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioAudioOutput {
    /// Open the default output device on a dedicated audio thread.
    pub fn new() -> Result<Self, AudioOutputError> {
        let (init_tx, init_rx) = mpsc::channel::<Result<OutputStreamHandle, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("narrator-audio".into())
            .spawn(move || {
                let (stream, stream_handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = init_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if init_tx.send(Ok(stream_handle)).is_err() {
                    return;
                }

                // Park until the output is dropped; the stream must stay on this thread.
                let _ = shutdown_rx.recv();
                drop(stream);
                tracing::debug!("Audio thread shutting down");
            })
            .map_err(|e| {
                AudioOutputError::Unavailable(format!("failed to spawn audio thread: {e}"))
            })?;

        let stream_handle = init_rx
            .recv()
            .map_err(|_| AudioOutputError::Unavailable("audio thread died".to_string()))?
            .map_err(AudioOutputError::Unavailable)?;

        tracing::info!("Audio playback initialized on default output device");
        Ok(Self {
            stream_handle,
            shutdown_tx,
            thread: Some(thread),
        })
    }
}

impl AudioOutput for RodioAudioOutput {
    fn name(&self) -> &str {
        "rodio"
    }

    fn load(&self, clip: &AudioClip) -> Result<Box<dyn AudioElement>, AudioOutputError> {
        let file = File::open(&clip.path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| AudioOutputError::Load(e.to_string()))?;
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioOutputError::Unavailable(e.to_string()))?;
        sink.pause();
        sink.append(source);

        Ok(Box::new(RodioElement {
            sink: Arc::new(sink),
            halted: Arc::new(AtomicBool::new(false)),
        }))
    }
}

impl Drop for RodioAudioOutput {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

struct RodioElement {
    sink: Arc<Sink>,
    halted: Arc<AtomicBool>,
}

impl AudioElement for RodioElement {
    fn play(&self) -> Result<PlaybackCompletion, AudioOutputError> {
        let (tx, rx) = oneshot::channel();
        let sink = Arc::clone(&self.sink);
        let halted = Arc::clone(&self.halted);
        sink.play();

        // `sleep_until_end()` returns early once `stop()` clears the queue,
        // so the halted flag decides whether this was a natural end.
        thread::spawn(move || {
            sink.sleep_until_end();
            if halted.load(Ordering::SeqCst) {
                return;
            }
            tracing::debug!("Playback finished naturally");
            let _ = tx.send(Ok(()));
        });
        Ok(rx)
    }

    fn pause(&self) -> bool {
        if self.sink.is_paused() || self.sink.empty() {
            return false;
        }
        self.sink.pause();
        true
    }

    fn resume(&self) -> bool {
        if !self.sink.is_paused() || self.sink.empty() {
            return false;
        }
        self.sink.play();
        true
    }

    fn reset_position(&self) {
        self.halted.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}
