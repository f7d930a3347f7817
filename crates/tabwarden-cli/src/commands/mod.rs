pub mod activity;
pub mod config;
pub mod run;
pub mod status;
pub mod tabs;
pub mod timer;

use std::sync::Arc;

use tabwarden_core::{
    AudioChannel, AudioSandbox, Background, Clock, Command, Config, Host, HostError, Notifier,
    Priority, Sound, SqliteStore, SystemClock, Tab, TabHost, TabId,
};

/// Host used by one-shot subcommands: no browser is attached.
///
/// Tab queries fail (so no cap is enforced from the CLI), notifications go
/// to the log and sounds are dropped.
struct Detached;

impl TabHost for Detached {
    fn query(&self) -> Result<Vec<Tab>, HostError> {
        Err(HostError::Unavailable("no browser attached".to_string()))
    }

    fn close(&self, tab_id: TabId) -> Result<(), HostError> {
        Err(HostError::NoSuchTab(tab_id))
    }
}

impl Notifier for Detached {
    fn notify(&self, title: &str, message: &str, _priority: Priority) {
        tracing::info!(title, message, "notification");
    }
}

impl AudioSandbox for Detached {
    fn play(&self, _sound: Sound, _looping: bool) -> Result<(), HostError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn close(&self) -> Result<(), HostError> {
        Ok(())
    }
}

/// Background service over the on-disk store, for one-shot subcommands.
pub fn offline_service() -> Result<(Background, i64), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open()?);
    let config = Config::load_or_default();
    let detached = Arc::new(Detached);
    let audio = Arc::new(AudioChannel::new(detached.clone(), config.audio.clone()));
    let host = Host::new(store, detached.clone(), detached, audio);
    Ok((Background::new(host, config), SystemClock.now_ms()))
}

/// Apply one command to the stored state and print the outcome as JSON.
pub fn apply(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let (mut bg, now) = offline_service()?;
    let (response, events) = bg.handle(command, now);
    if !response.success {
        return Err(response.message.unwrap_or_else(|| "command rejected".to_string()).into());
    }
    let output = serde_json::json!({ "response": response, "events": events });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
