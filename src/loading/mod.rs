use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};

use anyhow::Context;
use kira::sound::static_sound::StaticSoundData;
use log::info;
use rend3::Renderer;
use tokio::runtime::Runtime;

use crate::explorer::reference::{FileKind, FileReference};
use crate::rendering::loader::blp_loader::BLPLoader;
use crate::rendering::loader::m2_loader::M2Loader;
use crate::rendering::loader::texture_cache::TextureCache;
use crate::rendering::loader::wmo_loader::WMOLoader;
use crate::rendering::renderable::Renderable;
use crate::rendering::renderable::game_model::GameModelRenderable;
use crate::rendering::renderable::image::ImageRenderable;
use crate::rendering::renderable::world_model::WorldModelRenderable;
use crate::settings::GameVersion;

/// Generation handle for one load request. Tokens from a [`TokenSource`]
/// supersede each other: only the newest one is "current", and every pipeline
/// stage checks before continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken {
    generation: u64,
}

#[derive(Default)]
pub struct TokenSource {
    current: AtomicU64,
}

impl TokenSource {
    /// Atomically supersedes every previously issued token.
    pub fn issue(&self) -> LoadToken {
        LoadToken {
            generation: self.current.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.generation
    }
}

/// Visual previews and audio previews cancel independently: starting a sound
/// must not abort an in-flight model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Asset,
    Audio,
}

/// Which control page the window enables after a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPage {
    None,
    Image,
    GameModel,
    WorldModel,
    /// reserved for animated model previews
    Animation,
    Audio,
}

pub enum LoadedContent {
    Visual {
        renderable: Box<dyn Renderable>,
        page: ControlPage,
    },
    Audio {
        sound: StaticSoundData,
    },
}

/// Handed back to the UI thread; the token gets re-validated there before the
/// swap actually happens.
pub struct LoadOutcome {
    pub token: LoadToken,
    pub class: TokenClass,
    pub file_path: String,
    pub result: Result<LoadedContent, anyhow::Error>,
}

/// Drives "load bytes → construct → initialize → hand over" on the
/// background runtime. The swap itself always happens on the UI thread,
/// which drains the outcome channel.
pub struct LoadPipeline {
    runtime: Runtime,
    asset_tokens: Arc<TokenSource>,
    audio_tokens: Arc<TokenSource>,
    textures: Arc<TextureCache>,
    sender: Sender<LoadOutcome>,
}

impl LoadPipeline {
    pub fn new(textures: Arc<TextureCache>) -> Result<(Self, Receiver<LoadOutcome>), anyhow::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("Asset Loading")
            .build()?;
        let (sender, receiver) = channel();

        Ok((
            Self {
                runtime,
                asset_tokens: Arc::new(TokenSource::default()),
                audio_tokens: Arc::new(TokenSource::default()),
                textures,
                sender,
            },
            receiver,
        ))
    }

    pub fn is_current(&self, class: TokenClass, token: LoadToken) -> bool {
        match class {
            TokenClass::Asset => self.asset_tokens.is_current(token),
            TokenClass::Audio => self.audio_tokens.is_current(token),
        }
    }

    pub fn page_for(kind: FileKind) -> ControlPage {
        match kind {
            FileKind::Image => ControlPage::Image,
            FileKind::GameModel => ControlPage::GameModel,
            FileKind::WorldModel => ControlPage::WorldModel,
            FileKind::Audio => ControlPage::Audio,
            FileKind::Data => ControlPage::None,
        }
    }

    /// Starts a visual preview load, superseding any in-flight one. The
    /// returned token is already registered; the caller only needs it for
    /// bookkeeping.
    pub fn request_preview(
        &self,
        reference: FileReference,
        renderer: Arc<Renderer>,
        version: GameVersion,
    ) -> LoadToken {
        let token = self.asset_tokens.issue();
        let tokens = self.asset_tokens.clone();
        let textures = self.textures.clone();
        let sender = self.sender.clone();

        self.runtime.spawn(async move {
            let file_path = reference.file_path.clone();
            match Self::run_visual_stages(reference, renderer, version, textures, &tokens, token).await {
                Ok(Some(content)) => {
                    let _ = sender.send(LoadOutcome {
                        token,
                        class: TokenClass::Asset,
                        file_path,
                        result: Ok(content),
                    });
                }
                // cancellation is expected and not an error
                Ok(None) => info!("Preview load of {} was superseded", file_path),
                Err(err) => {
                    let _ = sender.send(LoadOutcome {
                        token,
                        class: TokenClass::Asset,
                        file_path,
                        result: Err(err),
                    });
                }
            }
        });
        token
    }

    /// Decodes an audio preview on its own token class.
    pub fn request_audio(&self, reference: FileReference) -> LoadToken {
        let token = self.audio_tokens.issue();
        let tokens = self.audio_tokens.clone();
        let sender = self.sender.clone();

        self.runtime.spawn(async move {
            let file_path = reference.file_path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let bytes = reference
                    .read_bytes()
                    .with_context(|| format!("Missing audio file {}", reference.file_path))?;
                StaticSoundData::from_cursor(Cursor::new(bytes))
                    .with_context(|| format!("Decoding audio file {}", reference.file_path))
            })
            .await;

            if !tokens.is_current(token) {
                info!("Audio load of {} was superseded", file_path);
                return;
            }

            let result = match result {
                Ok(Ok(sound)) => Ok(LoadedContent::Audio { sound }),
                Ok(Err(err)) => Err(err),
                Err(join_err) => Err(anyhow::Error::from(join_err)),
            };
            let _ = sender.send(LoadOutcome {
                token,
                class: TokenClass::Audio,
                file_path,
                result,
            });
        });
        token
    }

    /// The staged visual load. `Ok(None)` means a newer request superseded
    /// this one at some stage boundary; nothing was swapped and nothing will
    /// be.
    async fn run_visual_stages(
        reference: FileReference,
        renderer: Arc<Renderer>,
        version: GameVersion,
        textures: Arc<TextureCache>,
        tokens: &TokenSource,
        token: LoadToken,
    ) -> Result<Option<LoadedContent>, anyhow::Error> {
        if !tokens.is_current(token) {
            return Ok(None);
        }

        // byte load, off the UI thread
        let byte_source = reference.clone();
        let bytes = tokio::task::spawn_blocking(move || byte_source.read_bytes())
            .await?
            .with_context(|| format!("File {} not found in any mounted archive", reference.file_path))?;

        if !tokens.is_current(token) {
            return Ok(None);
        }

        // domain object + renderable construction
        let kind = reference.kind();
        let page = Self::page_for(kind);
        let mut renderable = tokio::task::spawn_blocking(move || {
            Self::construct_renderable(kind, &reference, bytes, &textures, version)
        })
        .await??;

        if !tokens.is_current(token) {
            return Ok(None);
        }

        // GPU resource allocation; rend3 accepts resource creation from any
        // thread. A backend that pins this to the context-owning thread would
        // need this stage marshalled there.
        renderable = tokio::task::spawn_blocking(move || {
            renderable.initialize(&renderer)?;
            Ok::<_, anyhow::Error>(renderable)
        })
        .await??;

        if !tokens.is_current(token) {
            return Ok(None);
        }

        Ok(Some(LoadedContent::Visual { renderable, page }))
    }

    fn construct_renderable(
        kind: FileKind,
        reference: &FileReference,
        bytes: Vec<u8>,
        textures: &TextureCache,
        version: GameVersion,
    ) -> Result<Box<dyn Renderable>, anyhow::Error> {
        match kind {
            FileKind::Image => {
                // the bytes are already here, no need for the shared cache
                let blp = BLPLoader::parse(&bytes, &reference.file_path)
                    .with_context(|| format!("Decoding BLP {}", reference.file_path))?;
                Ok(Box::new(ImageRenderable::new(
                    reference.file_path.clone(),
                    Arc::new(blp),
                )))
            }
            FileKind::GameModel => {
                let model = M2Loader::load_no_lod(reference, bytes, textures, version)?;
                Ok(Box::new(GameModelRenderable::new(model)))
            }
            FileKind::WorldModel => {
                let model = WMOLoader::load(reference, bytes, textures)?;
                Ok(Box::new(WorldModelRenderable::new(model)))
            }
            FileKind::Audio | FileKind::Data => {
                anyhow::bail!("No visual preview for {}", reference.file_path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuing_supersedes_older_tokens() {
        let source = TokenSource::default();
        let first = source.issue();
        assert!(source.is_current(first));

        let second = source.issue();
        assert!(!source.is_current(first));
        assert!(source.is_current(second));
    }

    /// The swap-guard property: once a second load was requested, the first
    /// one can never pass another stage boundary, no matter how the two
    /// interleave from here.
    #[test]
    fn a_superseded_load_never_swaps() {
        let source = TokenSource::default();
        let l1 = source.issue();

        // l1 passes its first stage while still current
        assert!(source.is_current(l1));

        let l2 = source.issue();

        // l1 finishes its work late; every later boundary check now refuses
        for _ in 0..3 {
            assert!(!source.is_current(l1));
        }
        assert!(source.is_current(l2));
    }

    #[test]
    fn token_classes_are_independent() {
        let assets = TokenSource::default();
        let audio = TokenSource::default();

        let visual = assets.issue();
        let _sound = audio.issue();
        // the audio request did not cancel the visual one
        assert!(assets.is_current(visual));
    }

    #[test]
    fn control_pages_key_off_the_file_kind() {
        assert_eq!(LoadPipeline::page_for(FileKind::Image), ControlPage::Image);
        assert_eq!(LoadPipeline::page_for(FileKind::GameModel), ControlPage::GameModel);
        assert_eq!(LoadPipeline::page_for(FileKind::WorldModel), ControlPage::WorldModel);
        assert_eq!(LoadPipeline::page_for(FileKind::Audio), ControlPage::Audio);
        assert_eq!(LoadPipeline::page_for(FileKind::Data), ControlPage::None);
    }
}
