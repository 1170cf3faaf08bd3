//! Walks one session through login, kick arbitration, the lobby and a game
//! join against an in-memory backend.
//!
//! Run with `RUST_LOG=debug cargo run -p login-flow` to see every step.

use std::time::Duration;

use gatelink::prelude::*;
use gatelink::protocol::{
    ConnectionType, JoinGameAck, JoinGameRequest, JoinResult, LeaveGameAck, LeaveResult,
    ThemeType, s2u, u2s,
};
use tracing::{info, warn};

/// How long the simulated backend takes to answer anything.
const LATENCY: Duration = Duration::from_millis(120);

const SLOT: GameId = GameId(5001);

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SimulatedLogin {
    url: String,
    asked_at: Option<Duration>,
    clock: Duration,
    ack: Option<LoginAck>,
    close_code: Option<u16>,
}

impl Service for SimulatedLogin {
    fn id(&self) -> u32 {
        ServiceType::LOGIN.id()
    }
    fn is_connected(&self) -> bool {
        self.close_code.is_none()
    }
    fn status(&self) -> ServiceStatus {
        match self.close_code {
            Some(_) => ServiceStatus::Closed,
            None => ServiceStatus::Connected,
        }
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn is_auto_managed(&self) -> bool {
        false
    }
    fn main_process(&mut self, dt: Duration) -> Result<(), ServiceError> {
        self.clock += dt;
        if let Some(asked) = self.asked_at {
            if self.ack.is_none() && self.clock >= asked + LATENCY {
                self.ack = Some(LoginAck {
                    permission: Permission::Ok,
                    account_id: 4242,
                    token: "d3m0".into(),
                });
            }
        }
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        info!(url, "login endpoint");
        self.url = url.to_string();
        true
    }
    fn reconnect(&mut self) -> bool {
        self.close_code = None;
        self.ack = None;
        true
    }
    fn close(&mut self, code: u16) -> bool {
        self.close_code = Some(code);
        true
    }
    fn destroy(&mut self) {}
    fn send_command(&mut self, _kind: u32, _content: Vec<u8>) -> bool {
        false
    }
    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
    fn socket_error(&self) -> Option<&SocketError> {
        None
    }
    fn on_redirect_message(&mut self, _content: &[u8]) {}
}

impl LoginService for SimulatedLogin {
    fn login(&mut self, vendor: &Vendor) {
        info!(?vendor, "login requested");
        self.asked_at = Some(self.clock);
    }
    fn ack_data(&self) -> Option<&LoginAck> {
        self.ack.as_ref()
    }
}

// ---------------------------------------------------------------------------
// App-life
// ---------------------------------------------------------------------------

/// The app-life channel of an account that is still online on another
/// device: the first connect asks for a kick.
struct SimulatedAppLife {
    links: ServiceLinks,
    url: String,
    clock: Duration,
    connected_at: Option<Duration>,
    result: Option<ConnectionResult>,
    other_device_online: bool,
    kick_asked_at: Option<Duration>,
    kick: Option<KickResult>,
    info_asked_at: Option<Duration>,
    user_info: Option<UserInfo>,
    /// Frames the backend will push, with the clock time they are due.
    outbox: Vec<(Duration, Command)>,
    close_code: Option<u16>,
    logged_out: bool,
}

impl SimulatedAppLife {
    fn new(links: ServiceLinks) -> Self {
        Self {
            links,
            url: String::new(),
            clock: Duration::ZERO,
            connected_at: None,
            result: None,
            other_device_online: true,
            kick_asked_at: None,
            kick: None,
            info_asked_at: None,
            user_info: None,
            outbox: Vec::new(),
            close_code: None,
            logged_out: false,
        }
    }

    fn due(&self, since: Option<Duration>) -> bool {
        since.is_some_and(|t| self.clock >= t + LATENCY)
    }

    fn push_later(&mut self, command: Command) {
        self.outbox.push((self.clock + LATENCY, command));
    }

    fn answer_join(&mut self, content: &[u8]) -> bool {
        let request: JoinGameRequest = match JsonCodec.decode(content) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "bad join request");
                return false;
            }
        };
        info!(game = %request.game_id, theme = %request.theme_name, "backend: join requested");
        let ack = JoinGameAck {
            game_id: request.game_id,
            theme_id: 12,
            result: JoinResult::Success,
            conn_type: Some(ConnectionType::WebSocket),
            uri: format!("/slot/{}", request.game_id.id()),
        };
        match JsonCodec.encode(&ack) {
            Ok(bytes) => {
                self.push_later(Command::new(s2u::ACK_JOIN_GAME, bytes));
                self.push_later(Command::new(
                    ServiceType::LOBBY.id(),
                    b"jackpot won on table 3".to_vec(),
                ));
                true
            }
            Err(e) => {
                warn!(error = %e, "join ack not encoded");
                false
            }
        }
    }
}

impl Service for SimulatedAppLife {
    fn id(&self) -> u32 {
        ServiceType::APPLIFE.id()
    }
    fn is_connected(&self) -> bool {
        self.connected_at.is_some()
    }
    fn status(&self) -> ServiceStatus {
        match (self.connected_at, self.close_code) {
            (Some(_), _) => ServiceStatus::Connected,
            (None, Some(_)) => ServiceStatus::Closed,
            (None, None) => ServiceStatus::Connecting,
        }
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn is_auto_managed(&self) -> bool {
        false
    }
    fn main_process(&mut self, dt: Duration) -> Result<(), ServiceError> {
        self.clock += dt;

        if self.result.is_none() && self.due(self.connected_at) {
            self.result = Some(if self.other_device_online {
                ConnectionResult::WaitBackKick
            } else {
                ConnectionResult::Success
            });
        }
        if self.kick.is_none() && self.due(self.kick_asked_at) {
            self.other_device_online = false;
            self.kick = Some(KickResult::Success);
        }
        if self.user_info.is_none() && self.due(self.info_asked_at) {
            self.user_info = Some(UserInfo {
                account_id: 4242,
                nickname: "demo-player".into(),
                balance: 1_250.0,
            });
        }

        let clock = self.clock;
        let (ready, later): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.outbox).into_iter().partition(|(at, _)| *at <= clock);
        self.outbox = later;
        for (_, command) in ready {
            self.links.forward(command);
        }
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        info!(url, "app-life endpoint");
        self.url = url.to_string();
        self.connected_at = Some(self.clock);
        true
    }
    fn reconnect(&mut self) -> bool {
        self.connected_at = Some(self.clock);
        self.result = None;
        self.close_code = None;
        true
    }
    fn close(&mut self, code: u16) -> bool {
        self.connected_at = None;
        self.close_code = Some(code);
        true
    }
    fn destroy(&mut self) {}
    fn send_command(&mut self, kind: u32, content: Vec<u8>) -> bool {
        if !self.is_connected() {
            return false;
        }
        match kind {
            u2s::REQ_JOIN_GAME => self.answer_join(&content),
            u2s::REQ_LEAVE_GAME => {
                let request: gatelink::protocol::LeaveGameRequest =
                    match JsonCodec.decode(&content) {
                        Ok(request) => request,
                        Err(_) => return false,
                    };
                let ack = LeaveGameAck {
                    game_id: request.game_id,
                    theme_id: request.theme_id,
                    result: LeaveResult::Success,
                };
                match JsonCodec.encode(&ack) {
                    Ok(bytes) => {
                        self.push_later(Command::new(s2u::ACK_LEAVE_GAME, bytes));
                        true
                    }
                    Err(_) => false,
                }
            }
            _ => true,
        }
    }
    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
    fn socket_error(&self) -> Option<&SocketError> {
        None
    }
    fn on_redirect_message(&mut self, _content: &[u8]) {}
}

impl AppLifeService for SimulatedAppLife {
    fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }
    fn access_user_info(&mut self) {
        self.info_asked_at = Some(self.clock);
    }
    fn keep_alive(&mut self) {}
    fn connect_result(&self) -> Option<ConnectionResult> {
        self.result
    }
    fn user_agree_to_kick(&mut self) {
        info!("backend: kicking the other device");
        self.kick_asked_at = Some(self.clock);
    }
    fn kick_result(&self) -> Option<KickResult> {
        self.kick
    }
    fn logout(&mut self) {
        self.logged_out = true;
    }
    fn is_logout(&self) -> bool {
        self.logged_out
    }
    fn is_kicked_by_others(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Lobby and game
// ---------------------------------------------------------------------------

struct Lobby {
    links: ServiceLinks,
    url: String,
}

impl Service for Lobby {
    fn id(&self) -> u32 {
        ServiceType::LOBBY.id()
    }
    fn is_connected(&self) -> bool {
        !self.url.is_empty()
    }
    fn status(&self) -> ServiceStatus {
        ServiceStatus::Connected
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn main_process(&mut self, _dt: Duration) -> Result<(), ServiceError> {
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        let account = self.links.auth_headers().map(|h| h.pairs());
        info!(url, ?account, "lobby connected");
        self.url = url.to_string();
        true
    }
    fn reconnect(&mut self) -> bool {
        true
    }
    fn close(&mut self, code: u16) -> bool {
        info!(code, "lobby closed");
        true
    }
    fn destroy(&mut self) {}
    fn send_command(&mut self, _kind: u32, _content: Vec<u8>) -> bool {
        true
    }
    fn close_code(&self) -> Option<u16> {
        None
    }
    fn socket_error(&self) -> Option<&SocketError> {
        None
    }
    fn on_redirect_message(&mut self, content: &[u8]) {
        info!(message = %String::from_utf8_lossy(content), "lobby broadcast");
    }
}

struct Slot {
    id: GameId,
    links: GameLinks,
    url: String,
}

impl Service for Slot {
    fn id(&self) -> u32 {
        self.id.id()
    }
    fn is_connected(&self) -> bool {
        !self.url.is_empty()
    }
    fn status(&self) -> ServiceStatus {
        ServiceStatus::Connected
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn main_process(&mut self, _dt: Duration) -> Result<(), ServiceError> {
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        self.url = url.to_string();
        true
    }
    fn reconnect(&mut self) -> bool {
        true
    }
    fn close(&mut self, _code: u16) -> bool {
        true
    }
    fn destroy(&mut self) {}
    fn send_command(&mut self, _kind: u32, _content: Vec<u8>) -> bool {
        true
    }
    fn close_code(&self) -> Option<u16> {
        None
    }
    fn socket_error(&self) -> Option<&SocketError> {
        None
    }
    fn on_redirect_message(&mut self, _content: &[u8]) {}
}

impl GameService for Slot {
    fn join(&mut self) {
        self.links.request_join(JoinGameRequest {
            theme_name: "lucky-sevens".into(),
            game_id: self.id,
            theme_type: ThemeType::Slot,
            reason: Default::default(),
            client_version: env!("CARGO_PKG_VERSION").into(),
        });
    }
    fn on_joined(&mut self, ack: &JoinGameAck, uri: Option<&str>) -> bool {
        let Some(uri) = uri else {
            return false;
        };
        info!(game = %ack.game_id, uri, "slot joined");
        self.connect(uri)
    }
    fn on_left(&mut self, ack: &LeaveGameAck) -> bool {
        info!(game = %ack.game_id, result = ?ack.result, "slot left");
        true
    }
    fn notify_leave(&mut self, reason: LeaveResult) {
        info!(?reason, "slot must leave");
    }
    fn on_expel(&mut self, reason: LeaveResult) {
        info!(?reason, "slot expelled");
    }
    fn on_request_failed(&mut self, request: &GameRequest) {
        warn!(?request, "slot request not sent");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn connection() -> Connection {
    let services = ServiceCatalog::new()
        .with(
            ServiceType::LOGIN,
            ServiceConfig::new(|_, _| ServiceHandle::Login(Box::<SimulatedLogin>::default()))
                .http(),
        )
        .with(
            ServiceType::APPLIFE,
            ServiceConfig::new(|_, links| {
                ServiceHandle::AppLife(Box::new(SimulatedAppLife::new(links)))
            }),
        )
        .with(
            ServiceType::LOBBY,
            ServiceConfig::new(|_, links| {
                ServiceHandle::General(Box::new(Lobby {
                    links,
                    url: String::new(),
                }))
            }),
        );
    let games = GameCatalog::new(|id, _, links| {
        Box::new(Slot {
            id,
            links,
            url: String::new(),
        }) as Box<dyn GameService>
    });

    let mut conn = Connection::new(services, games);
    conn.init("gw.example.com");
    conn
}

async fn play(handle: SessionHandle) -> Result<(), GatelinkError> {
    handle
        .login(Vendor::Guest {
            device_id: "demo-device".into(),
        })
        .await?;

    let step = handle
        .wait_for_step(|s| {
            s == Step::AppLifeConnectNeedUserAgreeKick
                || s == Step::AppLifeDidAccess
                || s.is_connection_closed()
        })
        .await?;
    if step == Step::AppLifeConnectNeedUserAgreeKick {
        info!("account online elsewhere, agreeing to kick");
        handle.decide_to_kick(true).await?;
    }

    let step = handle
        .wait_for_step(|s| s == Step::AppLifeDidAccess || s.is_connection_closed())
        .await?;
    if step != Step::AppLifeDidAccess {
        warn!(%step, "session did not come up");
        return handle.shutdown().await;
    }

    handle.join_game(SLOT).await?;
    tokio::time::sleep(LATENCY * 3).await;

    handle.logout().await?;
    handle
        .wait_for_step(|s| s == Step::AppLifeDisconnect)
        .await?;
    handle.shutdown().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), GatelinkError> {
    init_tracing();

    let (actor, handle) = SessionActor::new(connection(), FrameConfig::with_rate(30));
    let (conn, result) = tokio::join!(actor.run(), play(handle));
    result?;

    info!(
        step = %conn.step(),
        closed_with = ?conn.connection_closed_reason(),
        games = conn.pools().len(PoolKind::Game),
        "demo finished"
    );
    Ok(())
}
