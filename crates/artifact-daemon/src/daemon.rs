//! Event loop driving one editing session.
//!
//! The daemon owns the session's single logical timeline: commands from the
//! host and the debounce timer are handled one at a time, and pending edits are
//! flushed on every exit path (end of input, shutdown signal or an I/O error).

use crate::message::{Command, LineReader, Output};
use anyhow::Result;
use artifact_core::{ArtifactEvent, DocumentStorage, EditingSession, SessionError, Subscription};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use web_time::Instant;

/// Session plus the channel its events are forwarded through.
pub struct Daemon<S: DocumentStorage> {
    session: EditingSession<S>,
    event_rx: mpsc::UnboundedReceiver<ArtifactEvent>,
    /// Keeps the forwarding callback registered
    _subscription: Subscription,
}

impl<S: DocumentStorage> Daemon<S> {
    pub fn new(session: EditingSession<S>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let subscription = session.events().subscribe(move |event| {
            // Receiver dropped means the daemon is shutting down
            let _ = event_tx.send(event.clone());
        });

        Self {
            session,
            event_rx,
            _subscription: subscription,
        }
    }

    pub fn session(&self) -> &EditingSession<S> {
        &self.session
    }

    /// Handle one command from the host.
    pub async fn handle(&mut self, command: Command) -> std::result::Result<(), SessionError> {
        debug!("Command: {:?}", command);

        match command {
            Command::Stream { part } => {
                self.session.on_stream_part(part).await?;
            }
            Command::Edit { content, debounce } => {
                self.session.save_content(content, debounce).await?;
            }
            Command::Save => {
                self.session.flush().await?;
            }
            Command::Version { change } => {
                self.session.change_version(change).await?;
            }
            Command::Metadata { patch } => {
                self.session.set_metadata(patch)?;
            }
            Command::TogglePreview => {
                self.session.toggle_preview()?;
            }
        }
        Ok(())
    }

    /// Commit pending edits whose quiet period has elapsed.
    pub async fn on_timer(&mut self) {
        if let Err(e) = self.session.poll(Instant::now()).await {
            error!("Debounced commit failed: {}", e);
        }
    }

    /// Drain queued session events.
    pub fn drain_events(&mut self) -> Vec<ArtifactEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Run until input ends or `shutdown` resolves, then flush.
    ///
    /// The flush also runs when the loop stops on an I/O error; that error is
    /// returned afterwards.
    pub async fn run<R, W>(mut self, input: R, mut output: W, shutdown: impl Future<Output = ()>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let served = self.serve(LineReader::new(input), &mut output, shutdown).await;
        if let Err(e) = &served {
            error!("Session loop stopped: {}", e);
        }

        let flushed = self.finish(&mut output).await;
        served.and(flushed)
    }

    async fn serve<R, W>(
        &mut self,
        mut lines: LineReader<R>,
        output: &mut W,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tokio::pin!(shutdown);

        loop {
            let deadline = self.session.deadline();

            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(Ok(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            self.on_line(&line, output).await?;
                        }
                        Some(Err(e)) => {
                            warn!("Rejected input line: {}", e);
                            write_output(output, &Output::error(e.to_string())).await?;
                        }
                        None => {
                            info!("Input closed");
                            return Ok(());
                        }
                    }
                }

                _ = sleep_until(deadline) => {
                    self.on_timer().await;
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return Ok(());
                }
            }

            self.write_events(output).await?;
        }
    }

    /// Final flush, then drain events and the writer.
    async fn finish<W: AsyncWrite + Unpin>(&mut self, output: &mut W) -> Result<()> {
        let flushed = self.session.flush().await;
        self.write_events(output).await?;
        if let Err(e) = flushed {
            error!("Final flush failed, latest edit not persisted: {}", e);
            write_output(output, &Output::error(e.to_string())).await?;
        }
        output.flush().await?;
        Ok(())
    }

    async fn on_line<W: AsyncWrite + Unpin>(&mut self, line: &str, output: &mut W) -> Result<()> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Rejected input line: {}", e);
                return write_output(output, &Output::error(e.to_string())).await;
            }
        };

        if let Err(e) = self.handle(command).await {
            // Events (e.g. CommitFailed) go out first, then the error
            self.write_events(output).await?;
            return write_output(output, &Output::error(e.to_string())).await;
        }
        Ok(())
    }

    async fn write_events<W: AsyncWrite + Unpin>(&mut self, output: &mut W) -> Result<()> {
        for event in self.drain_events() {
            write_output(output, &Output::Event(event)).await?;
        }
        Ok(())
    }
}

async fn write_output<W: AsyncWrite + Unpin>(output: &mut W, line: &Output) -> Result<()> {
    output.write_all(line.to_line()?.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Sleep until the debounce deadline, or forever if no timer is running.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
