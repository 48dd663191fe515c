//! Fallback chain ordering, failure mapping and composition.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use narrator_core::{
    AttemptReason, AudioOutput, BackendAttempt, BackendKind, FailureKind, NarratorSettings,
    SessionToken, SpeechEngine,
};
use narrator_voice::{
    EngineBackend, FallbackChain, HostCapabilities, RemoteBackend, RemoteSynthesisRequest,
    SimulatedBackend, SpeechBackend, SpeechRequest, SynthesisTransport, TransportError,
    TransportResponse,
};
use tokio::time::Instant;

use common::{FakeEngine, FakeOutput, FakeTransport, ScriptedBackend, SpeakBehavior, registry};

mock! {
    pub Transport {}

    #[async_trait]
    impl SynthesisTransport for Transport {
        async fn synthesize(
            &self,
            request: &RemoteSynthesisRequest,
        ) -> Result<TransportResponse, TransportError>;
    }
}

fn remote(
    transport: Arc<dyn SynthesisTransport>,
    output: Arc<dyn AudioOutput>,
) -> Arc<dyn SpeechBackend> {
    Arc::new(RemoteBackend::new(
        transport,
        output,
        &NarratorSettings::new().with_api_token("hf_test"),
    ))
}

fn engine(engine: Arc<dyn SpeechEngine>) -> Arc<dyn SpeechBackend> {
    Arc::new(EngineBackend::new(Some(engine), Duration::from_millis(3000)))
}

type RunResult = (Result<BackendKind, Vec<BackendAttempt>>, Vec<BackendAttempt>);

async fn run(chain: &FallbackChain, text: &str, voice_id: &str) -> RunResult {
    let registry = registry();
    let request = SpeechRequest {
        token: SessionToken(1),
        text,
        profile: registry.lookup(voice_id),
    };
    let mut skipped = Vec::new();
    let result = chain
        .run(&request, |attempt| skipped.push(attempt.clone()))
        .await
        .map(|playback| playback.kind());
    (result, skipped)
}

fn failure_kind(attempt: &BackendAttempt) -> Option<FailureKind> {
    match &attempt.reason {
        AttemptReason::Failure { kind, .. } => Some(*kind),
        AttemptReason::Unsupported { .. } => None,
    }
}

#[tokio::test]
async fn network_failure_falls_through_to_engine_without_retrying_remote() {
    let mut transport = MockTransport::new();
    transport
        .expect_synthesize()
        .times(1)
        .returning(|_| Err(TransportError::Client("connection refused".to_string())));

    let fake_engine = FakeEngine::with_voices(&["Alex", "Microsoft Zira Desktop"]);
    let chain = FallbackChain::new(vec![
        remote(Arc::new(transport), Arc::new(FakeOutput::default())),
        engine(fake_engine.clone()),
        Arc::new(SimulatedBackend),
    ]);

    let (result, skipped) = run(&chain, "Hello world", "emma_stone").await;

    assert_eq!(result.unwrap(), BackendKind::Engine);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].backend, BackendKind::Remote);
    assert_eq!(failure_kind(&skipped[0]), Some(FailureKind::Network));

    let spoken = fake_engine.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].voice.as_ref().unwrap().name, "Microsoft Zira Desktop");
    assert!((spoken[0].rate - 1.1).abs() < f32::EPSILON);
}

#[tokio::test]
async fn rate_limited_remote_moves_on() {
    let mut transport = MockTransport::new();
    transport
        .expect_synthesize()
        .withf(|request| request.inputs == "Breaking news")
        .times(1)
        .returning(|_| {
            Ok(TransportResponse {
                status: 429,
                content_type: None,
                body: Vec::new(),
            })
        });

    let chain = FallbackChain::new(vec![
        remote(Arc::new(transport), Arc::new(FakeOutput::default())),
        Arc::new(SimulatedBackend),
    ]);

    let (result, skipped) = run(&chain, "Breaking news", "samuel_jackson").await;

    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert_eq!(failure_kind(&skipped[0]), Some(FailureKind::RateLimited));
}

#[tokio::test(start_paused = true)]
async fn slow_remote_times_out_as_network_failure() {
    let transport = Arc::new(FakeTransport::audio(b"RIFF").with_delay(Duration::from_secs(60)));
    let chain = FallbackChain::new(vec![
        remote(transport.clone(), Arc::new(FakeOutput::default())),
        Arc::new(SimulatedBackend),
    ]);

    let started = Instant::now();
    let (result, skipped) = run(&chain, "Hello", "emma_stone").await;

    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert_eq!(
        skipped[0].reason,
        AttemptReason::Failure {
            kind: FailureKind::Network,
            detail: "timeout".to_string(),
        }
    );
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn remote_success_spools_the_payload() {
    let transport = Arc::new(FakeTransport::audio(b"RIFF-audio-bytes"));
    let output = Arc::new(FakeOutput::default());
    let chain = FallbackChain::new(vec![
        remote(transport.clone(), output.clone()),
        Arc::new(SimulatedBackend),
    ]);

    let (result, skipped) = run(&chain, "Hello", "david_attenborough").await;

    assert_eq!(result.unwrap(), BackendKind::Remote);
    assert!(skipped.is_empty());
    assert_eq!(output.last().contents, b"RIFF-audio-bytes");

    let request = &transport.requests()[0];
    assert_eq!(request.inputs, "Hello");
    assert_eq!(request.parameters.language, "en");
    assert_eq!(
        request.parameters.speaker_wav.as_deref(),
        Some("https://example.com/david_attenborough_sample.wav")
    );
}

#[tokio::test]
async fn empty_remote_payload_falls_through() {
    let output = Arc::new(FakeOutput::default());
    let chain = FallbackChain::new(vec![
        remote(Arc::new(FakeTransport::audio(b"")), output.clone()),
        Arc::new(SimulatedBackend),
    ]);

    let (result, skipped) = run(&chain, "Hello", "emma_stone").await;

    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert_eq!(
        skipped[0].reason,
        AttemptReason::Failure {
            kind: FailureKind::Unknown,
            detail: "empty audio payload".to_string(),
        }
    );
    assert!(output.clips().is_empty());
}

#[tokio::test]
async fn exhaustion_lists_every_attempt_in_order() {
    let remote = ScriptedBackend::failing(
        BackendKind::Remote,
        FailureKind::Unauthorized,
        "invalid API token",
    );
    let chain = FallbackChain::new(vec![
        remote.clone() as Arc<dyn SpeechBackend>,
        Arc::new(EngineBackend::new(None, Duration::from_millis(3000))),
    ]);

    let (result, skipped) = run(&chain, "Hello", "emma_stone").await;
    let attempts = result.unwrap_err();

    assert_eq!(attempts, skipped);
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].backend, BackendKind::Remote);
    assert_eq!(failure_kind(&attempts[0]), Some(FailureKind::Unauthorized));
    assert_eq!(attempts[1].backend, BackendKind::Engine);
    assert!(matches!(attempts[1].reason, AttemptReason::Unsupported { .. }));
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn engine_error_before_start_falls_through() {
    let fake_engine = FakeEngine::with_voices(&["Daniel"]);
    fake_engine.set_behavior(SpeakBehavior::FailBeforeStart("audio device busy".to_string()));
    let chain = FallbackChain::new(vec![engine(fake_engine.clone()), Arc::new(SimulatedBackend)]);

    let (result, skipped) = run(&chain, "Hello", "morgan_freeman").await;

    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert_eq!(
        skipped[0].reason,
        AttemptReason::Failure {
            kind: FailureKind::EngineError,
            detail: "audio device busy".to_string(),
        }
    );
    assert_eq!(fake_engine.cancelled(), vec![SessionToken(1)]);
}

#[tokio::test(start_paused = true)]
async fn silent_engine_is_waited_for_once() {
    let fake_engine = FakeEngine::without_voices(true);
    let chain = FallbackChain::new(vec![engine(fake_engine.clone()), Arc::new(SimulatedBackend)]);

    let started = Instant::now();
    let (result, skipped) = run(&chain, "Hi", "emma_stone").await;
    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert!(matches!(skipped[0].reason, AttemptReason::Unsupported { .. }));
    assert!(started.elapsed() >= Duration::from_millis(3000));

    let second = Instant::now();
    let (result, _) = run(&chain, "Hi", "emma_stone").await;
    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert!(second.elapsed() < Duration::from_millis(10));
    assert!(fake_engine.spoken().is_empty());
}

#[tokio::test(start_paused = true)]
async fn voices_published_during_the_wait_are_used() {
    let fake_engine = FakeEngine::without_voices(true);
    let publisher = fake_engine.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        publisher.publish_voices(&["Google UK English Male"]);
    });

    let chain = FallbackChain::new(vec![engine(fake_engine.clone()), Arc::new(SimulatedBackend)]);
    let started = Instant::now();
    let (result, _) = run(&chain, "Hi", "benedict_cumberbatch").await;

    assert_eq!(result.unwrap(), BackendKind::Engine);
    assert!(started.elapsed() < Duration::from_millis(3000));
    assert_eq!(
        fake_engine.spoken()[0].voice.as_ref().unwrap().name,
        "Google UK English Male"
    );
}

#[tokio::test(start_paused = true)]
async fn engine_without_explicit_voice_lets_the_host_pick() {
    let fake_engine = FakeEngine::without_voices(false);
    let chain = FallbackChain::new(vec![engine(fake_engine.clone())]);

    let (result, _) = run(&chain, "Hi", "emma_stone").await;

    assert_eq!(result.unwrap(), BackendKind::Engine);
    assert_eq!(fake_engine.spoken()[0].voice, None);
}

// ── Composition from settings ──────────────────────────────────────

#[test]
fn chain_without_credential_skips_remote() {
    let host = HostCapabilities::none().with_audio_output(Arc::new(FakeOutput::default()));
    let chain = FallbackChain::from_settings(&NarratorSettings::new(), &host).unwrap();
    assert_eq!(chain.describe(), vec![BackendKind::Simulated]);
}

#[test]
fn chain_with_credential_and_engine_is_complete() {
    let host = HostCapabilities::none()
        .with_audio_output(Arc::new(FakeOutput::default()))
        .with_engine(FakeEngine::with_voices(&["Alex"]));
    let settings = NarratorSettings::new().with_api_token("hf_test");

    let chain = FallbackChain::from_settings(&settings, &host).unwrap();
    assert_eq!(
        chain.describe(),
        vec![BackendKind::Remote, BackendKind::Engine, BackendKind::Simulated]
    );
}

#[test]
fn remote_needs_an_audio_output() {
    let settings = NarratorSettings::new().with_api_token("hf_test");
    let chain = FallbackChain::from_settings(&settings, &HostCapabilities::none()).unwrap();
    assert_eq!(chain.describe(), vec![BackendKind::Simulated]);
}

#[test]
fn disabled_backends_are_left_out() {
    let host = HostCapabilities::none()
        .with_audio_output(Arc::new(FakeOutput::default()))
        .with_engine(FakeEngine::with_voices(&["Alex"]));
    let settings = NarratorSettings::new()
        .with_api_token("hf_test")
        .without_remote()
        .without_engine();

    let chain = FallbackChain::from_settings(&settings, &host).unwrap();
    assert_eq!(chain.describe(), vec![BackendKind::Simulated]);
}

#[tokio::test]
async fn unresponsive_service_is_reported_as_timeout() {
    // Accepts connections at the kernel level and never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/tts", listener.local_addr().unwrap());

    let host = HostCapabilities::none().with_audio_output(Arc::new(FakeOutput::default()));
    let settings = NarratorSettings::new()
        .with_api_token("hf_test")
        .with_remote_endpoint(endpoint)
        .with_request_timeout(Duration::from_millis(200));
    let chain = FallbackChain::from_settings(&settings, &host).unwrap();

    let (result, skipped) = run(&chain, "Hello", "emma_stone").await;

    assert_eq!(result.unwrap(), BackendKind::Simulated);
    assert_eq!(
        skipped[0].reason,
        AttemptReason::Failure {
            kind: FailureKind::Network,
            detail: "timeout".to_string(),
        }
    );
    drop(listener);
}
