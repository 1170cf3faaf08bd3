//! The session orchestrator.
//!
//! A [`Connection`] owns every service handle of one app session and drives
//! them through a single state machine:
//!
//! ```text
//! login ─→ app-life connect ─→ (kick arbitration) ─→ connected ─→ did access
//!                                                                    │
//!                                       reconnect ←── disconnect ←───┘
//! ```
//!
//! # Threading
//!
//! Everything happens inside [`Connection::main_process`], called once per
//! frame from one logical thread. The public methods only record intent
//! (a vendor, a kick decision, a pending transition); the machine acts on it
//! during the next tick. Service handles do their own I/O and expose the
//! results through synchronous getters, so "waiting for the network" is just
//! staying in the same [`Step`] and looking again next frame.

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use gatelink_protocol::{
    AppLifeMessage, AuthHeaders, CloseReason, Codec, Command, ConnectionResult, GameId,
    GameNotice, JoinGameAck, JsonCodec, KickResult, LeaveGameAck, LoginAck, ServiceType,
    Vendor, u2s,
};
use gatelink_service::{
    AppLifeService, GameLinks, GameRequest, InboundCommand, LoginService, PoolKind,
    ServiceHandle, ServiceLinks, ServicePoolManager, SocketError,
};
use gatelink_state::FiniteState;

use crate::url::{UrlParts, generate_url, push_path};
use crate::{ConnectionConfig, GameCatalog, Platform, ServiceCatalog, SessionError, Step};

const LOGIN: u32 = ServiceType::LOGIN.0;
const APPLIFE: u32 = ServiceType::APPLIFE.0;

/// Drives login, app-life, kick arbitration and reconnect for one session.
///
/// `C` is the codec used for app-life payloads; [`JsonCodec`] unless built
/// with [`Connection::with_codec`].
pub struct Connection<C: Codec = JsonCodec> {
    url: String,
    vendor: Option<Vendor>,
    step: FiniteState<Step>,
    pools: ServicePoolManager,

    config: ConnectionConfig,
    services: ServiceCatalog,
    games: GameCatalog,
    platform: Platform,
    codec: C,

    retry_count: u32,
    web_flight_mode_on: bool,
    kick_decision: Option<bool>,

    /// Auth headers of the current login, shared with every handle.
    headers: watch::Sender<Option<AuthHeaders>>,
    commands_tx: mpsc::UnboundedSender<InboundCommand>,
    commands_rx: mpsc::UnboundedReceiver<InboundCommand>,
    requests_tx: mpsc::UnboundedSender<GameRequest>,
    requests_rx: mpsc::UnboundedReceiver<GameRequest>,
}

impl Connection<JsonCodec> {
    /// Creates a connection with default timing, the web platform and the
    /// JSON codec.
    pub fn new(services: ServiceCatalog, games: GameCatalog) -> Self {
        Self::with_codec(services, games, JsonCodec)
    }
}

impl<C: Codec> Connection<C> {
    pub fn with_codec(services: ServiceCatalog, games: GameCatalog, codec: C) -> Self {
        let (headers, _) = watch::channel(None);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        Self {
            url: String::new(),
            vendor: None,
            step: FiniteState::new(Step::Wait),
            pools: ServicePoolManager::new(),
            config: ConnectionConfig::default(),
            services,
            games,
            platform: Platform::default(),
            codec,
            retry_count: 0,
            web_flight_mode_on: false,
            kick_decision: None,
            headers,
            commands_tx,
            commands_rx,
            requests_tx,
            requests_rx,
        }
    }

    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config.validated();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Sets the base URL and creates the API services into the persistent
    /// pool.
    pub fn init(&mut self, url: impl Into<String>) {
        self.url = url.into();
        let api: Vec<ServiceType> = self
            .services
            .iter()
            .filter(|(_, config)| config.api)
            .map(|(service, _)| service)
            .collect();
        for service in api {
            if let Err(e) = self.create_service(service, None, true) {
                warn!(%service, error = %e, "api service not created");
            }
        }
    }

    /// Records the credentials for the next login. Ignored (returns false)
    /// while a vendor is already set; `reset` clears it.
    pub fn login(&mut self, vendor: Vendor) -> bool {
        if self.vendor.is_some() {
            warn!("login ignored, a vendor is already set");
            return false;
        }
        self.vendor = Some(vendor);
        true
    }

    /// Drops the vendor and every non-persistent handle and returns to
    /// [`Step::Wait`].
    pub fn reset(&mut self) {
        self.vendor = None;
        self.pools.reset();
        self.step = FiniteState::new(Step::Wait);
        self.retry_count = 0;
        self.kick_decision = None;
        self.headers.send_replace(None);
        while self.commands_rx.try_recv().is_ok() {}
        while self.requests_rx.try_recv().is_ok() {}
        info!("connection reset");
    }

    /// Advances the session by one frame.
    ///
    /// Order within a frame: queued game requests go out, every pool is
    /// pumped, frames the app-life handle pushed are routed, then the state
    /// machine ticks.
    pub fn main_process(&mut self, dt: Duration) {
        self.flush_game_requests();
        self.pools.process(dt);
        self.drain_inbound();

        let step = self.step.tick(dt);
        if self.step.is_entering() {
            info!(from = ?self.step.prev(), to = %step, "step");
        }

        match step {
            Step::Wait => {
                if self.vendor.is_some() {
                    self.retry_count = 0;
                    self.step.transit_timed(Step::Login, self.config.stage_timeout);
                }
            }

            // -- Login --
            Step::Login => self.process_login(),
            Step::LoginFail => {
                if self.step.is_entering() {
                    self.close_login(CloseReason::LoginConnectFail);
                }
            }
            Step::LoginTimeout => {
                if self.step.is_entering() {
                    self.retry_or_fail(Step::LoginTimeoutWaitRetry, Step::LoginFatalFail);
                }
            }
            Step::LoginTimeoutWaitRetry => {
                if self.step.is_timeout() {
                    self.close_login(CloseReason::LoginConnectRetry);
                    self.step.transit_timed(Step::Login, self.config.stage_timeout);
                }
            }
            Step::LoginFatalFail => {
                if self.step.is_entering() {
                    self.close_login(CloseReason::LoginConnectingWaitTimeout);
                }
            }

            // -- App-life connect --
            Step::AppLifeConnect => self.process_app_life_connect(),
            Step::AppLifeConnectTimeout => {
                if self.step.is_entering() {
                    self.retry_or_fail(
                        Step::AppLifeConnectTimeoutWaitRetry,
                        Step::AppLifeConnectFatalFail,
                    );
                }
            }
            Step::AppLifeConnectTimeoutWaitRetry => {
                if self.step.is_timeout() {
                    self.close_app_life(CloseReason::AppLifeConnectRetry);
                    self.step.transit_timed(Step::AppLifeConnect, self.config.stage_timeout);
                }
            }
            Step::AppLifeConnectFatalFail => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeConnectTimeout);
                }
            }
            Step::AppLifeConnectFail => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeConnectFail);
                }
            }

            // -- Kick arbitration --
            Step::AppLifeConnectNeedUserAgreeKick => {
                if !self.step.is_entering() && self.socket_error().is_some() {
                    self.step.transit(Step::AppLifeSocketError);
                } else {
                    match self.kick_decision {
                        Some(true) => {
                            self.step.transit_timed(
                                Step::AppLifeConnectUserDidAgreeKick,
                                self.config.kick_timeout,
                            );
                        }
                        Some(false) => {
                            self.step.transit(Step::AppLifeConnectUserDisagreeKick);
                        }
                        None => {}
                    }
                }
            }
            Step::AppLifeConnectUserDidAgreeKick => self.process_agree_kick(),
            Step::AppLifeConnectUserDisagreeKick => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeUserDisagreeKick);
                }
            }
            Step::AppLifeConnectUserAgreeKickTimeout => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeUserAgreeKickTimeout);
                }
            }
            Step::AppLifeConnectUserAgreeKickFail => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeUserAgreeKickFail);
                }
            }

            // -- Connected --
            Step::AppLifeConnected => self.process_connected(),
            Step::AppLifeConnectedTimeout => {
                if self.step.is_entering() {
                    self.retry_or_fail(
                        Step::AppLifeConnectedTimeoutWaitRetry,
                        Step::AppLifeConnectedFatalFail,
                    );
                }
            }
            Step::AppLifeConnectedTimeoutWaitRetry => {
                if self.step.is_entering() {
                    self.step.transit_timed(Step::AppLifeConnected, self.config.stage_timeout);
                }
            }
            Step::AppLifeConnectedFatalFail => {
                if self.step.is_entering() {
                    self.close_app_life(CloseReason::AppLifeConnectedTimeout);
                }
            }

            Step::AppLifeDidAccessPreparation => {
                let auxiliary: Vec<ServiceType> = self
                    .services
                    .iter()
                    .filter(|(_, config)| !config.api)
                    .map(|(service, _)| service)
                    .collect();
                for service in auxiliary {
                    if let Err(e) = self.create_service(service, None, false) {
                        warn!(%service, error = %e, "service not created");
                    }
                }
                self.step.transit(Step::AppLifeDidAccess);
            }
            Step::AppLifeDidAccess => {
                if !self.app_life().is_some_and(|s| s.is_connected()) {
                    self.step.transit(Step::AppLifeDisconnect);
                }
            }

            // -- Disconnect and reconnect --
            Step::AppLifeDisconnect => {
                // Stays here until `reconnect` moves the machine on.
                if self.step.is_entering() {
                    let code = self
                        .app_life()
                        .and_then(|s| s.close_code())
                        .unwrap_or(CloseReason::AppLifeSection.code());
                    self.pools.close(code);
                }
            }
            Step::AppLifeWaitReconnect => {
                let network_back = match &self.platform {
                    Platform::Web => !self.web_flight_mode_on,
                    Platform::Native(probe) => probe.has_network(),
                };
                if network_back {
                    self.step.transit(Step::AppLifeReconnecting);
                }
            }
            Step::AppLifeReconnecting => self.process_reconnecting(),

            Step::AppLifeSocketError => {}
        }
    }

    /// Toggles simulated flight mode on the web platform. Turning it on
    /// closes the app-life channel; while it is on, the machine won't
    /// leave `APPLIFE_WAIT_RECONNECT`. Returns the new mode; always false
    /// on native platforms.
    pub fn web_flight_mode_switch(&mut self) -> bool {
        if !self.platform.is_web() {
            return false;
        }
        self.web_flight_mode_on = !self.web_flight_mode_on;
        if self.web_flight_mode_on {
            self.close_app_life(CloseReason::TempWebFlightMode);
        }
        info!(on = self.web_flight_mode_on, "web flight mode");
        self.web_flight_mode_on
    }

    /// Records the user's answer to the kick prompt.
    ///
    /// # Errors
    /// [`SessionError::NoKickPending`] unless the machine is in
    /// `APPLIFE_CONNECT_NEED_USER_AGREE_KICK`.
    pub fn decide_to_kick(&mut self, kick: bool) -> Result<(), SessionError> {
        if self.step.current() != Step::AppLifeConnectNeedUserAgreeKick {
            warn!(kick, step = %self.step.current(), "kick decision outside kick prompt");
            return Err(SessionError::NoKickPending);
        }
        self.kick_decision = Some(kick);
        Ok(())
    }

    /// Logs out and closes the app-life channel. After this,
    /// [`reconnect`](Self::reconnect) is refused.
    pub fn logout(&mut self) {
        if let Some(app_life) = self.app_life_mut() {
            app_life.logout();
            app_life.close(CloseReason::UserRequestLogout.code());
        }
    }

    /// Starts joining `game`.
    ///
    /// A fresh handle is built, asked to `join`, and parked in the pending
    /// pool until the ack arrives. Asking again for a game that is already
    /// pending (or active) does nothing.
    ///
    /// # Errors
    /// - [`SessionError::GameAlreadyActive`] while another game is joined.
    /// - [`SessionError::MissingAppLife`] before the app-life handle exists.
    /// - [`SessionError::JoinNotSent`] if app-life refused the join request;
    ///   the handle has already been told and dropped.
    pub fn join_game(&mut self, game: GameId) -> Result<(), SessionError> {
        if !self.pools.select(PoolKind::Game).is_empty() {
            warn!(%game, "join refused, a game is already active");
            return Err(SessionError::GameAlreadyActive(game));
        }
        if self.app_life().is_none() {
            warn!(%game, "join refused, no app-life channel");
            return Err(SessionError::MissingAppLife);
        }

        let id = game.id();
        if self.pools.has(PoolKind::Game, id) || self.pools.has(PoolKind::GamePending, id) {
            debug!(%game, "join already in flight");
            return Ok(());
        }

        let links = self.service_links(id);
        let game_links = GameLinks::new(self.requests_tx.clone());
        let mut handle = self.games.create(game, links, game_links);
        handle.join();

        let pending = self.pools.select_mut(PoolKind::GamePending);
        pending.reset();
        pending.add(id, ServiceHandle::Game(handle));
        debug!(%game, "join pending");

        self.flush_game_requests();
        if !self.pools.has(PoolKind::GamePending, id) {
            return Err(SessionError::JoinNotSent(game));
        }
        Ok(())
    }

    /// Moves a disconnected session towards reconnecting.
    ///
    /// # Errors
    /// [`SessionError::ReconnectRefused`] outside `APPLIFE_DISCONNECT`,
    /// without an app-life handle, or once the account was kicked by
    /// another device or logged out.
    pub fn reconnect(&mut self) -> Result<(), SessionError> {
        if !self.should_reconnect() {
            warn!(step = %self.step.current(), "reconnect refused");
            return Err(SessionError::ReconnectRefused);
        }
        self.step.transit(Step::AppLifeWaitReconnect);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.step.current() == Step::AppLifeDidAccess
    }

    pub fn is_connection_closed(&self) -> bool {
        self.step.current().is_connection_closed()
    }

    pub fn is_logout(&self) -> bool {
        self.app_life().is_some_and(|s| s.is_logout())
    }

    /// Routes one app-life frame.
    ///
    /// Join/leave acks and game notices are handled here; any other kind is
    /// forwarded to the service, then the game, whose id equals the kind.
    /// Returns false if the frame couldn't be decoded or nothing took it.
    pub fn redirect_command(&mut self, command: Command) -> bool {
        let message = match AppLifeMessage::decode(command, &self.codec) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "undecodable app-life frame dropped");
                return false;
            }
        };

        match message {
            AppLifeMessage::JoinGameAck(ack) => {
                self.on_game_join(ack);
                true
            }
            AppLifeMessage::LeaveGameAck(ack) => {
                self.on_game_leave(&ack);
                true
            }
            AppLifeMessage::NotifyLeaveGame(notice) => {
                self.on_game_notice(&notice, false)
            }
            AppLifeMessage::ExpelGame(notice) => self.on_game_notice(&notice, true),
            AppLifeMessage::Forward(command) => {
                let target = [PoolKind::Service, PoolKind::Game, PoolKind::GamePending]
                    .into_iter()
                    .find(|kind| self.pools.has(*kind, command.kind));
                match target {
                    Some(kind) => {
                        debug!(kind = command.kind, pool = %kind, "frame forwarded");
                        if let Some(handle) = self.pools.get_from_mut(kind, command.kind) {
                            handle.on_redirect_message(&command.content);
                        }
                        true
                    }
                    None => {
                        debug!(kind = command.kind, "no handle for frame");
                        false
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    pub fn step(&self) -> Step {
        self.step.current()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn pools(&self) -> &ServicePoolManager {
        &self.pools
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The login answer; explains a `LOGIN_FAIL`.
    pub fn login_ack(&self) -> Option<&LoginAck> {
        self.login_service().and_then(|s| s.ack_data())
    }

    pub fn connect_result(&self) -> Option<ConnectionResult> {
        self.app_life().and_then(|s| s.connect_result())
    }

    pub fn kick_result(&self) -> Option<KickResult> {
        self.app_life().and_then(|s| s.kick_result())
    }

    /// The app-life close code, else the login close code.
    pub fn connection_closed_reason(&self) -> Option<u16> {
        self.app_life()
            .and_then(|s| s.close_code())
            .or_else(|| self.login_service().and_then(|s| s.close_code()))
    }

    pub fn socket_error(&self) -> Option<&SocketError> {
        self.app_life().and_then(|s| s.socket_error())
    }

    /// True while the kick prompt is up (or about to be) and unanswered.
    pub fn need_user_confirm_kick(&self) -> bool {
        let prompt = Step::AppLifeConnectNeedUserAgreeKick;
        (self.step.current() == prompt || self.step.next() == Some(prompt))
            && self.kick_decision.is_none()
    }

    /// True on the frame the "kick" answer is being acted on.
    pub fn reply_kick_decision(&self) -> bool {
        self.step.next() == Some(Step::AppLifeConnectUserDidAgreeKick)
    }

    pub fn is_reconnecting(&self) -> bool {
        self.step.current() == Step::AppLifeReconnecting
    }

    /// Receives the auth headers every time a login completes or resets.
    pub fn subscribe_headers(&self) -> watch::Receiver<Option<AuthHeaders>> {
        self.headers.subscribe()
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    fn process_login(&mut self) {
        if self.step.is_entering() {
            self.headers.send_replace(None);
            self.start_login();
        }

        let permission = self.login_ack().map(|ack| ack.permission);
        if self.step.is_timeout() {
            warn!("login timed out");
            self.step.transit(Step::LoginTimeout);
            return;
        }
        match permission {
            Some(permission) if !permission.is_ok() => {
                warn!(?permission, "login denied");
                self.step.transit(Step::LoginFail);
            }
            Some(_) => {
                self.retry_count = 0;
                self.close_login(CloseReason::LoginFinish);
                self.step.transit_timed(Step::AppLifeConnect, self.config.stage_timeout);
            }
            None => {}
        }
    }

    fn start_login(&mut self) {
        if let Some(handle) = self.pools.get_from_mut(PoolKind::Service, LOGIN) {
            handle.reconnect();
        } else if let Err(e) = self.create_service(ServiceType::LOGIN, None, false) {
            warn!(error = %e, "login service not created");
            return;
        }

        let (Some(vendor), Some(handle)) = (
            self.vendor.as_ref(),
            self.pools.get_from_mut(PoolKind::Service, LOGIN),
        ) else {
            return;
        };
        let found = handle.kind();
        match handle.as_login_mut() {
            Some(login) => login.login(vendor),
            None => {
                let e = SessionError::WrongHandleKind {
                    service: ServiceType::LOGIN,
                    expected: "login",
                    found,
                };
                warn!(error = %e, "login not sent");
            }
        }
    }

    fn process_app_life_connect(&mut self) {
        if self.step.is_entering() {
            self.start_app_life();
            return;
        }
        if self.step.is_timeout() {
            warn!("app-life connect timed out");
            self.step.transit(Step::AppLifeConnectTimeout);
            return;
        }
        if self.socket_error().is_some() {
            self.step.transit(Step::AppLifeSocketError);
            return;
        }
        match self.connect_result() {
            Some(ConnectionResult::WaitBackKick) => {
                self.step.transit(Step::AppLifeConnectNeedUserAgreeKick);
            }
            Some(ConnectionResult::Rejected { code }) => {
                warn!(code, "app-life connect rejected");
                self.step.transit(Step::AppLifeConnectFail);
            }
            Some(ConnectionResult::Success) => {
                self.retry_count = 0;
                self.step.transit_timed(Step::AppLifeConnected, self.config.stage_timeout);
            }
            None => {}
        }
    }

    fn start_app_life(&mut self) {
        // A decision only answers the prompt of this attempt.
        self.kick_decision = None;

        let Some(headers) = self.login_ack().map(LoginAck::auth_headers) else {
            warn!("app-life connect without a login ack");
            return;
        };
        let relative = format!("{}/{}", headers.account_id, headers.token);
        self.headers.send_replace(Some(headers));

        if let Some(handle) = self.pools.get_from_mut(PoolKind::Service, APPLIFE) {
            handle.reconnect();
        } else if let Err(e) = self.create_service(ServiceType::APPLIFE, Some(&relative), false) {
            warn!(error = %e, "app-life service not created");
            return;
        }

        if let Some(handle) = self.pools.get_from(PoolKind::Service, APPLIFE) {
            if handle.as_app_life().is_none() {
                let e = SessionError::WrongHandleKind {
                    service: ServiceType::APPLIFE,
                    expected: "app-life",
                    found: handle.kind(),
                };
                warn!(error = %e, "app-life unusable");
            }
        }
    }

    fn process_agree_kick(&mut self) {
        if self.step.is_entering() {
            if let Some(app_life) = self.app_life_mut() {
                app_life.user_agree_to_kick();
            }
            return;
        }
        if self.step.is_timeout() {
            warn!("kick timed out");
            self.step.transit(Step::AppLifeConnectUserAgreeKickTimeout);
            return;
        }
        match self.kick_result() {
            Some(KickResult::Failed { code }) => {
                warn!(code, "kick failed");
                self.step.transit(Step::AppLifeConnectUserAgreeKickFail);
            }
            Some(KickResult::Success) => {
                self.retry_count = 0;
                self.step.transit_timed(Step::AppLifeConnected, self.config.stage_timeout);
            }
            None => {}
        }
    }

    fn process_connected(&mut self) {
        if self.step.is_entering() {
            if let Some(app_life) = self.app_life_mut() {
                app_life.keep_alive();
                app_life.access_user_info();
            }
            return;
        }
        if self.step.is_timeout() {
            warn!("user info timed out");
            self.step.transit(Step::AppLifeConnectedTimeout);
        } else if self.socket_error().is_some() {
            self.step.transit(Step::AppLifeSocketError);
        } else if self.app_life().is_some_and(|s| s.user_info().is_some()) {
            self.step.transit(Step::AppLifeDidAccessPreparation);
        }
    }

    fn process_reconnecting(&mut self) {
        if self.step.is_entering() {
            if let Some(app_life) = self.app_life_mut() {
                app_life.reconnect();
            }
        }

        let failed = self.socket_error().is_some()
            || self.connect_result().is_some_and(|r| !r.is_success());
        if failed {
            warn!(result = ?self.connect_result(), "reconnect failed");
            self.close_app_life(CloseReason::AppLifeReconnectFail);
            self.step.transit(Step::AppLifeDisconnect);
        } else if self.connect_result() == Some(ConnectionResult::Success) {
            self.pools.reconnect();
            self.step.transit(Step::AppLifeDidAccess);
        }
    }

    fn retry_or_fail(&mut self, retry: Step, fatal: Step) {
        if self.retry_count >= self.config.retry_limit {
            warn!(retries = self.retry_count, "retry limit reached");
            self.step.transit(fatal);
        } else {
            self.retry_count += 1;
            self.step.transit_timed(retry, self.config.wait_retry);
        }
    }

    fn should_reconnect(&self) -> bool {
        self.step.current() == Step::AppLifeDisconnect
            && self
                .app_life()
                .is_some_and(|s| !s.is_kicked_by_others() && !s.is_logout())
    }

    // -----------------------------------------------------------------------
    // Game sub-protocol
    // -----------------------------------------------------------------------

    fn on_game_join(&mut self, mut ack: JoinGameAck) -> bool {
        let id = ack.game_id.id();
        if !self.pools.has(PoolKind::GamePending, id) {
            warn!(game = %ack.game_id, "join ack without a pending join");
            return false;
        }

        let composed = ack.conn_type.map(|conn_type| {
            let endpoint = self.games.endpoint(ack.game_id);
            let parts = UrlParts {
                is_http: conn_type.is_http(),
                id: ack.theme_id,
                append_path: &ack.uri,
                test_url: endpoint.test_url.as_deref(),
                test_full_custom_path: endpoint.test_full_custom_path,
            };
            generate_url(&self.url, PoolKind::Game, &parts)
        });
        let uri = match composed.transpose() {
            Ok(uri) => uri.map(String::from),
            Err(e) => {
                warn!(game = %ack.game_id, error = %e, "join uri not composable");
                self.pools.select_mut(PoolKind::GamePending).reset();
                return false;
            }
        };
        if let Some(uri) = &uri {
            ack.uri = uri.clone();
        }

        let joined = self
            .pools
            .get_from_mut(PoolKind::GamePending, id)
            .and_then(ServiceHandle::as_game_mut)
            .is_some_and(|game| game.on_joined(&ack, uri.as_deref()));

        if !joined {
            warn!(game = %ack.game_id, result = ?ack.result, "join failed");
            self.pools.select_mut(PoolKind::GamePending).reset();
            return false;
        }
        if let Some(handle) = self.pools.delete_from(PoolKind::GamePending, id) {
            self.pools.add_to(PoolKind::Game, id, handle);
        }
        info!(game = %ack.game_id, uri = ?uri, "game joined");
        true
    }

    fn on_game_leave(&mut self, ack: &LeaveGameAck) -> bool {
        let left = self
            .pools
            .get_from_mut(PoolKind::Game, ack.game_id.id())
            .and_then(ServiceHandle::as_game_mut)
            .is_some_and(|game| game.on_left(ack));
        if left {
            self.pools.select_mut(PoolKind::Game).reset();
            info!(game = %ack.game_id, result = ?ack.result, "game left");
        }
        left
    }

    fn on_game_notice(&mut self, notice: &GameNotice, expel: bool) -> bool {
        let Some(game) = self
            .pools
            .get_from_mut(PoolKind::Game, notice.game_id.id())
            .and_then(ServiceHandle::as_game_mut)
        else {
            debug!(game = %notice.game_id, "notice for a game that is not active");
            return false;
        };
        if expel {
            game.on_expel(notice.reason);
        } else {
            game.notify_leave(notice.reason);
        }
        true
    }

    fn flush_game_requests(&mut self) {
        while let Ok(request) = self.requests_rx.try_recv() {
            if let Err(e) = self.send_game_request(&request) {
                warn!(error = %e, ?request, "game request not sent");
                self.on_game_request_failed(&request);
            }
        }
    }

    /// Tells the requesting game its request went nowhere. A join that
    /// never left would wait forever for its ack, so the pending handle is
    /// destroyed; a failed leave keeps the game active.
    fn on_game_request_failed(&mut self, request: &GameRequest) {
        let (kind, id) = match request {
            GameRequest::Join(req) => (PoolKind::GamePending, req.game_id.id()),
            GameRequest::Leave(req) => (PoolKind::Game, req.game_id.id()),
        };
        if let Some(game) = self
            .pools
            .get_from_mut(kind, id)
            .and_then(ServiceHandle::as_game_mut)
        {
            game.on_request_failed(request);
        }
        if kind == PoolKind::GamePending {
            if let Some(mut handle) = self.pools.delete_from(kind, id) {
                handle.destroy();
            }
        }
    }

    fn send_game_request(&mut self, request: &GameRequest) -> Result<(), SessionError> {
        let (kind, content) = match request {
            GameRequest::Join(req) => (u2s::REQ_JOIN_GAME, self.codec.encode(req)?),
            GameRequest::Leave(req) => (u2s::REQ_LEAVE_GAME, self.codec.encode(req)?),
        };
        let app_life = self
            .pools
            .get_from_mut(PoolKind::Service, APPLIFE)
            .ok_or(SessionError::MissingAppLife)?;
        if !app_life.send_command(kind, content) {
            return Err(SessionError::SendRefused(kind));
        }
        Ok(())
    }

    fn drain_inbound(&mut self) {
        while let Ok(inbound) = self.commands_rx.try_recv() {
            if inbound.source == APPLIFE {
                self.redirect_command(inbound.command);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Handles
    // -----------------------------------------------------------------------

    fn login_service(&self) -> Option<&dyn LoginService> {
        self.pools.get_from(PoolKind::Service, LOGIN)?.as_login()
    }

    fn app_life(&self) -> Option<&dyn AppLifeService> {
        self.pools.get_from(PoolKind::Service, APPLIFE)?.as_app_life()
    }

    fn app_life_mut(&mut self) -> Option<&mut dyn AppLifeService> {
        self.pools.get_from_mut(PoolKind::Service, APPLIFE)?.as_app_life_mut()
    }

    fn close_login(&mut self, reason: CloseReason) {
        if let Some(handle) = self.pools.get_from_mut(PoolKind::Service, LOGIN) {
            debug!(%reason, "closing login");
            handle.close(reason.code());
        }
    }

    fn close_app_life(&mut self, reason: CloseReason) {
        if let Some(handle) = self.pools.get_from_mut(PoolKind::Service, APPLIFE) {
            debug!(%reason, "closing app-life");
            handle.close(reason.code());
        }
    }

    fn service_links(&self, source: u32) -> ServiceLinks {
        ServiceLinks::new(source, self.commands_tx.clone(), self.headers.subscribe())
    }

    /// Builds, connects and pools the handle for `service` unless one is
    /// already pooled.
    fn create_service(
        &mut self,
        service: ServiceType,
        relative_path: Option<&str>,
        api: bool,
    ) -> Result<(), SessionError> {
        let pool = if api { PoolKind::ApiService } else { PoolKind::Service };
        let id = service.id();
        if self.pools.has(pool, id) {
            return Ok(());
        }

        let config = self
            .services
            .get(service)
            .ok_or(SessionError::UnknownService(service))?;
        let parts = UrlParts {
            is_http: config.is_http,
            id,
            append_path: "",
            test_url: config.test_url.as_deref(),
            test_full_custom_path: config.test_full_custom_path,
        };
        let mut url = generate_url(&self.url, pool, &parts)?;
        if let Some(relative) = relative_path {
            push_path(&mut url, relative);
        }
        let mut handle = (config.creator)(service, self.service_links(id));

        debug!(%service, %pool, %url, "creating service");
        handle.connect(url.as_str());
        self.pools.add_to(pool, id, handle);
        Ok(())
    }
}

impl<C: Codec> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url)
            .field("step", &self.step)
            .field("vendor_set", &self.vendor.is_some())
            .field("retry_count", &self.retry_count)
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}
