use std::fmt;

use async_trait::async_trait;

use lesson_core::model::{AudioStep, MediaUri};

use crate::error::PlaybackError;

//
// ─── TRANSPORT COLLABORATOR ────────────────────────────────────────────────────
//

/// Progress report delivered by the transport while a resource plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
    pub did_finish: bool,
}

/// A loaded, playable audio resource.
///
/// Dropping a handle releases the underlying resource; `stop` exists to
/// interrupt playback explicitly before release.
#[async_trait]
pub trait AudioHandle: Send {
    /// Begin or resume playback.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    async fn play(&mut self) -> Result<(), PlaybackError>;

    /// Pause playback, keeping the current position.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    async fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Stop playback.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    async fn stop(&mut self) -> Result<(), PlaybackError>;
}

/// Audio transport collaborator. The real implementation (platform player,
/// codec, buffering) lives outside this core.
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Resolve a locator into a playable handle. Loading alone does not
    /// start playback.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` if the resource cannot be loaded.
    async fn load(&self, locator: &MediaUri) -> Result<Box<dyn AudioHandle>, PlaybackError>;
}

//
// ─── PLAYBACK STATE MACHINE ────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioPhase {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Owns the transport handle for the currently displayed audio step.
///
/// At most one handle exists at a time; the machine releases before it
/// acquires, and the owning runner stops it on every step change and on
/// lesson exit so playback never leaks across steps.
#[derive(Default)]
pub struct AudioPlayback {
    phase: AudioPhase,
    position_ms: u64,
    duration_ms: u64,
    handle: Option<Box<dyn AudioHandle>>,
}

impl AudioPlayback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> AudioPhase {
        self.phase
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.phase == AudioPhase::Playing
    }

    #[must_use]
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Fraction of the resource played so far, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    /// Start playback from idle, or resume from pause.
    ///
    /// Calling while already playing is a no-op: pausing is a distinct
    /// explicit action, not a toggle on this call.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::MissingSource` if the step carries no
    /// locator, or `PlaybackError::Transport` if loading or starting fails.
    /// On error the machine is back in the idle phase.
    pub async fn play(
        &mut self,
        step: &AudioStep,
        transport: &dyn AudioTransport,
    ) -> Result<(), PlaybackError> {
        match self.phase {
            AudioPhase::Playing | AudioPhase::Loading => Ok(()),
            AudioPhase::Paused => {
                if let Some(handle) = self.handle.as_mut() {
                    handle.play().await?;
                }
                self.phase = AudioPhase::Playing;
                Ok(())
            }
            AudioPhase::Idle => {
                let locator = step.locator.as_ref().ok_or(PlaybackError::MissingSource)?;
                self.phase = AudioPhase::Loading;
                let started = async {
                    let mut handle = transport.load(locator).await?;
                    handle.play().await?;
                    Ok::<_, PlaybackError>(handle)
                }
                .await;
                match started {
                    Ok(handle) => {
                        self.handle = Some(handle);
                        self.position_ms = 0;
                        self.duration_ms = 0;
                        self.phase = AudioPhase::Playing;
                        Ok(())
                    }
                    Err(err) => {
                        self.phase = AudioPhase::Idle;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Pause playback in place. A no-op unless currently playing.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Transport` on transport failure.
    pub async fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.phase != AudioPhase::Playing {
            return Ok(());
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.pause().await?;
        }
        self.phase = AudioPhase::Paused;
        Ok(())
    }

    /// Stop playback and release the handle. Safe to call in any phase.
    ///
    /// Transport failures during teardown are logged, not surfaced; the
    /// handle is released either way.
    pub async fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.stop().await {
                tracing::debug!(error = %err, "audio stop failed during teardown");
            }
        }
        self.phase = AudioPhase::Idle;
        self.position_ms = 0;
        self.duration_ms = 0;
    }

    /// Apply a transport progress report.
    ///
    /// Reports arriving while idle (a stale continuation from a step that is
    /// no longer displayed) are discarded. A finish report releases the
    /// handle and resets position to zero.
    pub fn apply_status(&mut self, status: TransportStatus) {
        if self.phase == AudioPhase::Idle || self.handle.is_none() {
            return;
        }

        if status.did_finish {
            self.handle = None;
            self.phase = AudioPhase::Idle;
            self.position_ms = 0;
            return;
        }

        self.position_ms = status.position_ms;
        self.duration_ms = status.duration_ms;
        self.phase = if status.is_playing {
            AudioPhase::Playing
        } else {
            AudioPhase::Paused
        };
    }
}

impl fmt::Debug for AudioPlayback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayback")
            .field("phase", &self.phase)
            .field("position_ms", &self.position_ms)
            .field("duration_ms", &self.duration_ms)
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeTransport {
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_load: bool,
    }

    struct FakeHandle {
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl AudioHandle for FakeHandle {
        async fn play(&mut self) -> Result<(), PlaybackError> {
            self.events.lock().unwrap().push("play");
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), PlaybackError> {
            self.events.lock().unwrap().push("pause");
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), PlaybackError> {
            self.events.lock().unwrap().push("stop");
            Ok(())
        }
    }

    #[async_trait]
    impl AudioTransport for FakeTransport {
        async fn load(&self, _locator: &MediaUri) -> Result<Box<dyn AudioHandle>, PlaybackError> {
            if self.fail_load {
                return Err(PlaybackError::Transport("boom".into()));
            }
            self.events.lock().unwrap().push("load");
            Ok(Box::new(FakeHandle {
                events: self.events.clone(),
            }))
        }
    }

    fn audio_step(locator: Option<&str>) -> AudioStep {
        AudioStep {
            locator: locator.and_then(MediaUri::parse),
            description: None,
        }
    }

    #[tokio::test]
    async fn play_without_locator_is_a_hard_error_and_stays_idle() {
        let transport = FakeTransport::default();
        let mut playback = AudioPlayback::new();

        let err = playback
            .play(&audio_step(None), &transport)
            .await
            .unwrap_err();
        assert_eq!(err, PlaybackError::MissingSource);
        assert_eq!(playback.phase(), AudioPhase::Idle);
        assert!(transport.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn play_pause_resume_round_trip() {
        let transport = FakeTransport::default();
        let mut playback = AudioPlayback::new();
        let step = audio_step(Some("https://cdn.example.com/a.mp3"));

        playback.play(&step, &transport).await.unwrap();
        assert!(playback.is_playing());

        playback.pause().await.unwrap();
        assert_eq!(playback.phase(), AudioPhase::Paused);

        playback.play(&step, &transport).await.unwrap();
        assert!(playback.is_playing());

        // resume reuses the existing handle; only one load ever happened
        let events = transport.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| **e == "load").count(), 1);
    }

    #[tokio::test]
    async fn play_while_playing_is_not_a_toggle() {
        let transport = FakeTransport::default();
        let mut playback = AudioPlayback::new();
        let step = audio_step(Some("https://cdn.example.com/a.mp3"));

        playback.play(&step, &transport).await.unwrap();
        playback.play(&step, &transport).await.unwrap();
        assert!(playback.is_playing());
        assert_eq!(transport.events.lock().unwrap().iter().filter(|e| **e == "load").count(), 1);
    }

    #[tokio::test]
    async fn failed_load_returns_to_idle() {
        let transport = FakeTransport {
            fail_load: true,
            ..FakeTransport::default()
        };
        let mut playback = AudioPlayback::new();
        let step = audio_step(Some("https://cdn.example.com/a.mp3"));

        let err = playback.play(&step, &transport).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Transport(_)));
        assert_eq!(playback.phase(), AudioPhase::Idle);

        // the machine recovers: a later play may be attempted again
        assert_eq!(playback.position_ms(), 0);
    }

    #[tokio::test]
    async fn stop_releases_the_handle_and_resets() {
        let transport = FakeTransport::default();
        let mut playback = AudioPlayback::new();
        let step = audio_step(Some("https://cdn.example.com/a.mp3"));

        playback.play(&step, &transport).await.unwrap();
        playback.apply_status(TransportStatus {
            position_ms: 1_000,
            duration_ms: 9_000,
            is_playing: true,
            did_finish: false,
        });
        assert_eq!(playback.position_ms(), 1_000);
        assert!(playback.progress_fraction() > 0.1);

        playback.stop().await;
        assert_eq!(playback.phase(), AudioPhase::Idle);
        assert_eq!(playback.position_ms(), 0);
        assert!(transport.events.lock().unwrap().contains(&"stop"));
    }

    #[tokio::test]
    async fn natural_end_resets_position_and_releases() {
        let transport = FakeTransport::default();
        let mut playback = AudioPlayback::new();
        let step = audio_step(Some("https://cdn.example.com/a.mp3"));

        playback.play(&step, &transport).await.unwrap();
        playback.apply_status(TransportStatus {
            position_ms: 9_000,
            duration_ms: 9_000,
            is_playing: false,
            did_finish: true,
        });

        assert_eq!(playback.phase(), AudioPhase::Idle);
        assert_eq!(playback.position_ms(), 0);
    }

    #[tokio::test]
    async fn stale_status_reports_are_discarded() {
        let mut playback = AudioPlayback::new();
        playback.apply_status(TransportStatus {
            position_ms: 5_000,
            duration_ms: 9_000,
            is_playing: true,
            did_finish: false,
        });
        assert_eq!(playback.phase(), AudioPhase::Idle);
        assert_eq!(playback.position_ms(), 0);
    }
}
