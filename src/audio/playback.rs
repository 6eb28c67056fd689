use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::{AudioManager, AudioManagerSettings, DefaultBackend, Tween};

/// Audio preview playback. Like the viewport's render target there is at most
/// one active sound; starting the next preview stops the previous one. The
/// main track gain comes from the CLI so previews don't blast at full volume.
pub struct AudioPlaybackManager {
    audio_manager: AudioManager,
    current: Option<StaticSoundHandle>,
}

impl AudioPlaybackManager {
    pub fn new(gain: f32) -> anyhow::Result<Self> {
        let mut settings = AudioManagerSettings::default();
        let main_track_builder = settings
            .main_track_builder
            .volume(kira::Value::Fixed(gain.into()));
        settings.main_track_builder = main_track_builder;

        Ok(Self {
            audio_manager: AudioManager::<DefaultBackend>::new(settings)?,
            current: None,
        })
    }

    pub fn play(&mut self, sound: StaticSoundData) -> anyhow::Result<()> {
        self.stop();
        self.current = Some(self.audio_manager.play(sound)?);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.stop(Tween::default());
        }
    }
}
