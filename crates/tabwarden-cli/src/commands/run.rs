use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use tabwarden_core::runtime;
use tabwarden_core::{AudioChannel, Background, Config, Host, SqliteStore, SystemClock};

use crate::bridge::{BridgeIn, BridgeOut, TabMirror};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(serve())
}

async fn write_lines(mut rx: mpsc::UnboundedReceiver<BridgeOut>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        let mut buf = serde_json::to_vec(&line)?;
        buf.push(b'\n');
        stdout.write_all(&buf).await?;
        stdout.flush().await?;
    }
    Ok(())
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SqliteStore::open()?);
    let config = Config::load_or_default();

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(out_rx));

    let mirror = TabMirror::new(out_tx.clone());
    let audio = Arc::new(AudioChannel::new(mirror.clone(), config.audio.clone()));
    let host = Host::new(store, mirror.clone(), mirror.clone(), audio);

    let (handle, mut events, service) = runtime::spawn(Background::new(host, config), Arc::new(SystemClock));
    let forward = {
        let out = out_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if out.send(BridgeOut::Event { event }).is_err() {
                    break;
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<BridgeIn>(line) {
            Ok(BridgeIn::Command { id, command }) => {
                let response = handle.command(command).await?;
                let _ = out_tx.send(BridgeOut::Response { id, response });
            }
            Ok(BridgeIn::Tab { event }) => {
                mirror.apply(&event);
                handle.tab_event(event).await?;
            }
            Ok(BridgeIn::Tabs { tabs }) => mirror.replace(tabs),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable input line");
                let _ = out_tx.send(BridgeOut::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!("input closed; shutting down");
    handle.shutdown().await;
    service.await?;
    forward.await?;
    // The writer ends once the last sender is gone.
    drop(mirror);
    drop(out_tx);
    writer.await??;
    Ok(())
}
