//! Audio thread and the systems that bridge it with the ECS world.
//!
//! - [`audio_thread`] runs on its own OS thread, owns the [`AudioBackend`]
//!   and every loaded sample, and processes [`AudioCmd`] messages, emitting
//!   [`AudioMessage`] responses.
//! - [`poll_audio_messages`] non-blockingly drains the audio thread's
//!   receiver into the ECS message queue each frame.
//! - [`apply_audio_messages`] folds load results into the sound registry.
//! - [`update_bevy_audio_messages`] advances the ECS message queue.
//!
//! The thread is created by [`crate::resources::audio::setup_audio`] and
//! joined by [`crate::resources::audio::shutdown_audio`].

use bevy_ecs::prelude::{MessageReader, MessageWriter, Messages, Res, ResMut};
use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;

use crate::backend::{AudioBackend, SampleHandle};
use crate::components::sound::{SoundLoad, SoundRegistry};
use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;

/// Drain pending messages from the audio thread into `Messages<AudioMessage>`.
pub fn poll_audio_messages(
    bridge: Option<Res<AudioBridge>>,
    mut writer: MessageWriter<AudioMessage>,
) {
    if let Some(bridge) = bridge {
        writer.write_batch(bridge.rx_msg.try_iter());
    }
}

/// Update sound load state from the audio thread's replies.
pub fn apply_audio_messages(
    mut reader: MessageReader<AudioMessage>,
    mut sounds: ResMut<SoundRegistry>,
) {
    for msg in reader.read() {
        match msg {
            AudioMessage::Loaded { id } => {
                if let Ok(sound) = sounds.get_mut(*id) {
                    sound.load = SoundLoad::Ready;
                }
            }
            AudioMessage::LoadFailed { id, error } => {
                log::warn!("sound {} failed to load: {}", id, error);
                if let Ok(sound) = sounds.get_mut(*id) {
                    sound.load = SoundLoad::Failed {
                        error: error.clone(),
                    };
                }
            }
            AudioMessage::PlayFailed { id, error } => {
                log::warn!("sound {} failed to play: {}", id, error);
            }
            AudioMessage::Unloaded { id } => {
                log::trace!("sound {} unloaded", id);
            }
        }
    }
}

/// Advance the ECS message queue for [`AudioMessage`].
pub fn update_bevy_audio_messages(mut messages: ResMut<Messages<AudioMessage>>) {
    messages.update();
}

fn free_all(backend: &mut dyn AudioBackend, samples: &mut FxHashMap<u32, SampleHandle>) {
    for (_, sample) in samples.drain() {
        backend.free_sample(sample);
    }
}

/// Entry point of the dedicated audio thread.
///
/// Blocks on the command channel and handles commands strictly in the order
/// they were sent, so a `Play` queued right after a `Load` always sees the
/// loaded sample. Exits on [`AudioCmd::Shutdown`] or when every sender is
/// gone, freeing all samples first.
pub fn audio_thread(
    rx_cmd: Receiver<AudioCmd>,
    tx_msg: Sender<AudioMessage>,
    mut backend: Box<dyn AudioBackend>,
) {
    log::debug!(
        "[audio] thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut samples: FxHashMap<u32, SampleHandle> = FxHashMap::default();

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            AudioCmd::Load { id, path } => {
                if let Some(old) = samples.remove(&id) {
                    backend.free_sample(old);
                }
                match backend.load_sample(&path) {
                    Ok(sample) => {
                        log::debug!("[audio] loaded id={} path='{}'", id, path);
                        samples.insert(id, sample);
                        let _ = tx_msg.send(AudioMessage::Loaded { id });
                    }
                    Err(e) => {
                        log::debug!("[audio] load failed id={} path='{}': {}", id, path, e);
                        let _ = tx_msg.send(AudioMessage::LoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                }
            }
            AudioCmd::Play { id, loops } => {
                let result = match samples.get(&id) {
                    Some(sample) => backend.play(*sample, loops).map_err(|e| e.to_string()),
                    None => Err("not loaded".to_string()),
                };
                if let Err(error) = result {
                    let _ = tx_msg.send(AudioMessage::PlayFailed { id, error });
                }
            }
            AudioCmd::FadeIn { id, loops, ms } => {
                let result = match samples.get(&id) {
                    Some(sample) => backend
                        .fade_in(*sample, loops, ms)
                        .map_err(|e| e.to_string()),
                    None => Err("not loaded".to_string()),
                };
                if let Err(error) = result {
                    let _ = tx_msg.send(AudioMessage::PlayFailed { id, error });
                }
            }
            AudioCmd::FadeOut { ms } => backend.fade_out(ms),
            AudioCmd::Pause => backend.pause(),
            AudioCmd::Volume { volume } => backend.set_volume(volume),
            AudioCmd::Unload { id } => {
                if let Some(sample) = samples.remove(&id) {
                    log::debug!("[audio] unload id={}", id);
                    backend.free_sample(sample);
                    let _ = tx_msg.send(AudioMessage::Unloaded { id });
                }
            }
            AudioCmd::UnloadAll => {
                log::debug!("[audio] unload all");
                free_all(backend.as_mut(), &mut samples);
            }
            AudioCmd::Shutdown => {
                log::debug!("[audio] shutdown requested");
                break;
            }
        }
    }

    free_all(backend.as_mut(), &mut samples);
    log::debug!(
        "[audio] thread exiting (id={:?})",
        std::thread::current().id()
    );
}
