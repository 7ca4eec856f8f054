//! ECS resources that bridge the render thread with the background audio thread.
//!
//! Use [`setup_audio`] once during initialization to spawn the audio thread
//! and insert the [`AudioBridge`] and `Messages<AudioMessage>` resources. Call
//! [`shutdown_audio`] during teardown to stop the thread and free every
//! loaded sample.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::backend::AudioBackend;
use crate::error::{EngineError, EngineResult};
use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::engineconfig::AudioConfig;
use crate::systems::audio::audio_thread;

/// Shared bridge between the ECS world and the audio thread.
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] messages (audio thread -> ECS).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread.
    pub handle: std::thread::JoinHandle<()>,
}

impl AudioBridge {
    /// Queue a command. Returns `false` if the audio thread is gone.
    pub fn send(&self, cmd: AudioCmd) -> bool {
        match self.tx_cmd.send(cmd) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("audio thread not running, dropped {:?}", err.0);
                false
            }
        }
    }
}

/// Spawn the audio thread and register bridge resources.
///
/// The backend device is opened on the audio thread itself; this function
/// waits for that to finish and surfaces a failure as
/// [`EngineError::Init`].
pub fn setup_audio(
    world: &mut World,
    backend: Box<dyn AudioBackend>,
    config: AudioConfig,
) -> EngineResult<()> {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();
    let (tx_ready, rx_ready) = bounded::<Result<(), String>>(1);

    let handle = std::thread::Builder::new()
        .name("audio".into())
        .spawn(move || {
            let mut backend = backend;
            if let Err(err) = backend.open(&config) {
                let _ = tx_ready.send(Err(err.to_string()));
                return;
            }
            let _ = tx_ready.send(Ok(()));
            audio_thread(rx_cmd, tx_msg, backend);
        })
        .map_err(|err| EngineError::Init(format!("cannot spawn audio thread: {err}")))?;

    let opened = rx_ready
        .recv()
        .unwrap_or_else(|_| Err("audio thread exited during startup".to_string()));
    if let Err(reason) = opened {
        let _ = handle.join();
        return Err(EngineError::Init(format!("audio device: {reason}")));
    }

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.insert_resource(Messages::<AudioMessage>::default());
    Ok(())
}

/// Request shutdown of the audio thread and join it.
///
/// If the bridge resource exists, sends [`AudioCmd::Shutdown`], waits for the
/// thread to exit, and removes the resource from the world.
pub fn shutdown_audio(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
        if bridge.handle.join().is_err() {
            log::error!("audio thread panicked");
        }
    }
}
