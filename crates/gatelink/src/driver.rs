//! Async driver: runs a `Connection` on a frame clock.
//!
//! The session machine is synchronous and wants one `main_process(dt)` per
//! frame. [`SessionActor`] provides those frames from a [`FramePacer`] and
//! serialises control calls from any number of [`SessionHandle`]s through
//! one channel, so the machine never sees two callers at once.
//!
//! Service handles are built from `Fn` closures and shared with `Rc`, so a
//! `Connection` is not `Send`. Await [`SessionActor::run`] on the current
//! task, join it with the code that uses the handle, or put it on a
//! `tokio::task::LocalSet`:
//!
//! ```rust,ignore
//! let (actor, handle) = SessionActor::new(conn, FrameConfig::default());
//! let (conn, ()) = tokio::join!(actor.run(), async move {
//!     handle.login(vendor).await?;
//!     handle.wait_for_step(|s| s == Step::AppLifeDidAccess).await?;
//!     handle.shutdown().await
//! });
//! ```

use gatelink_protocol::{Codec, GameId, JsonCodec, Vendor};
use gatelink_session::{Connection, SessionError, Step};
use gatelink_tick::{FrameConfig, FramePacer};
use tokio::sync::{mpsc, oneshot, watch};

use crate::GatelinkError;

/// Control requests queued between frames.
///
/// Variants carrying a `oneshot::Sender` answer the caller once the
/// request has been applied.
enum SessionCommand {
    Login {
        vendor: Vendor,
        reply: oneshot::Sender<bool>,
    },
    DecideToKick {
        kick: bool,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Reconnect {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Logout {
        reply: oneshot::Sender<()>,
    },
    JoinGame {
        game: GameId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    WebFlightModeSwitch {
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Channel depth for control requests.
const COMMAND_BUFFER: usize = 32;

/// Cloneable front end of a running [`SessionActor`].
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    step: watch::Receiver<Step>,
}

impl SessionHandle {
    /// Records the credentials for the next login; false if a login is
    /// already under way.
    pub async fn login(&self, vendor: Vendor) -> Result<bool, GatelinkError> {
        self.request(|reply| SessionCommand::Login { vendor, reply })
            .await
    }

    pub async fn decide_to_kick(&self, kick: bool) -> Result<(), GatelinkError> {
        Ok(self
            .request(|reply| SessionCommand::DecideToKick { kick, reply })
            .await??)
    }

    pub async fn reconnect(&self) -> Result<(), GatelinkError> {
        Ok(self
            .request(|reply| SessionCommand::Reconnect { reply })
            .await??)
    }

    pub async fn logout(&self) -> Result<(), GatelinkError> {
        self.request(|reply| SessionCommand::Logout { reply }).await
    }

    pub async fn join_game(&self, game: GameId) -> Result<(), GatelinkError> {
        Ok(self
            .request(|reply| SessionCommand::JoinGame { game, reply })
            .await??)
    }

    pub async fn reset(&self) -> Result<(), GatelinkError> {
        self.request(|reply| SessionCommand::Reset { reply }).await
    }

    /// Toggles simulated flight mode; returns the new mode.
    pub async fn web_flight_mode_switch(&self) -> Result<bool, GatelinkError> {
        self.request(|reply| SessionCommand::WebFlightModeSwitch { reply })
            .await
    }

    /// Stops the actor after the request queue drains up to this point.
    pub async fn shutdown(&self) -> Result<(), GatelinkError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| GatelinkError::DriverStopped)
    }

    /// The step published after the last frame.
    pub fn step(&self) -> Step {
        *self.step.borrow()
    }

    /// A receiver that sees every published step change.
    pub fn subscribe_steps(&self) -> watch::Receiver<Step> {
        self.step.clone()
    }

    /// Waits until the published step satisfies `pred` and returns it.
    /// Resolves immediately if it already does.
    pub async fn wait_for_step(
        &self,
        pred: impl Fn(Step) -> bool,
    ) -> Result<Step, GatelinkError> {
        let mut rx = self.step.clone();
        let step = rx
            .wait_for(|step| pred(*step))
            .await
            .map_err(|_| GatelinkError::DriverStopped)?;
        Ok(*step)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, GatelinkError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| GatelinkError::DriverStopped)?;
        reply_rx.await.map_err(|_| GatelinkError::DriverStopped)
    }
}

/// Owns a [`Connection`] and ticks it on a [`FramePacer`].
pub struct SessionActor<C: Codec = JsonCodec> {
    conn: Connection<C>,
    pacer: FramePacer,
    receiver: mpsc::Receiver<SessionCommand>,
    step: watch::Sender<Step>,
}

impl<C: Codec> SessionActor<C> {
    pub fn new(conn: Connection<C>, frames: FrameConfig) -> (Self, SessionHandle) {
        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (step, step_rx) = watch::channel(conn.step());
        let actor = Self {
            conn,
            pacer: FramePacer::new(frames),
            receiver,
            step,
        };
        let handle = SessionHandle {
            sender,
            step: step_rx,
        };
        (actor, handle)
    }

    /// Runs frames and control requests until shutdown, or until every
    /// handle is dropped. Returns the connection for inspection.
    pub async fn run(mut self) -> Connection<C> {
        tracing::info!(rate_hz = self.pacer.frame_rate_hz(), "session driver started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!("all session handles dropped");
                        break;
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                frame = self.pacer.wait_for_frame() => {
                    self.conn.main_process(frame.dt);
                    self.publish();
                }
            }
        }

        tracing::info!(step = %self.conn.step(), "session driver stopped");
        self.conn
    }

    /// Applies one request. Returns false on shutdown.
    fn handle(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Login { vendor, reply } => {
                let _ = reply.send(self.conn.login(vendor));
            }
            SessionCommand::DecideToKick { kick, reply } => {
                let _ = reply.send(self.conn.decide_to_kick(kick));
            }
            SessionCommand::Reconnect { reply } => {
                let _ = reply.send(self.conn.reconnect());
            }
            SessionCommand::Logout { reply } => {
                self.conn.logout();
                let _ = reply.send(());
            }
            SessionCommand::JoinGame { game, reply } => {
                let _ = reply.send(self.conn.join_game(game));
            }
            SessionCommand::Reset { reply } => {
                self.conn.reset();
                self.publish();
                let _ = reply.send(());
            }
            SessionCommand::WebFlightModeSwitch { reply } => {
                let _ = reply.send(self.conn.web_flight_mode_switch());
            }
            SessionCommand::Shutdown => {
                tracing::info!("session driver shutting down");
                return false;
            }
        }
        true
    }

    fn publish(&self) {
        let step = self.conn.step();
        self.step.send_if_modified(|current| {
            if *current == step {
                return false;
            }
            *current = step;
            true
        });
    }
}
