//! Scripted service handles for driving a `Connection` in tests.
//!
//! Each mock owns a copy of what a real handle would have received from its
//! transport and refreshes it from a shared script in `main_process`, the
//! same way a real handle pumps its socket once per tick. The test body
//! edits the script between ticks and reads back what the mock recorded.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gatelink_protocol::{
    Command, ConnectionResult, GameId, JoinGameAck, JoinGameRequest, KickResult, LeaveGameAck,
    LeaveResult, LoginAck, Permission, ServiceType, UserInfo, Vendor,
};
use gatelink_service::{
    AppLifeService, GameLinks, GameRequest, GameService, LoginService, Service, ServiceError,
    ServiceHandle, ServiceLinks, ServiceStatus, SocketError,
};
use gatelink_session::{
    Connection, ConnectionConfig, GameCatalog, Platform, ServiceCatalog, ServiceConfig, Step,
};

pub const FRAME: Duration = Duration::from_millis(16);

pub type Shared<T> = Rc<RefCell<T>>;

fn shared<T: Default>() -> Shared<T> {
    Rc::new(RefCell::new(T::default()))
}

// =========================================================================
// Login
// =========================================================================

#[derive(Debug, Default)]
pub struct LoginScript {
    pub ack: Option<LoginAck>,
    pub urls: Vec<String>,
    pub logins: u32,
    pub reconnects: u32,
    pub closes: Vec<u16>,
}

struct MockLogin {
    script: Shared<LoginScript>,
    ack: Option<LoginAck>,
    url: String,
    close_code: Option<u16>,
}

impl Service for MockLogin {
    fn id(&self) -> u32 {
        ServiceType::LOGIN.id()
    }
    fn is_connected(&self) -> bool {
        self.close_code.is_none()
    }
    fn status(&self) -> ServiceStatus {
        ServiceStatus::Connected
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn is_auto_managed(&self) -> bool {
        false
    }
    fn main_process(&mut self, _dt: Duration) -> Result<(), ServiceError> {
        self.ack = self.script.borrow().ack.clone();
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        self.url = url.to_string();
        self.script.borrow_mut().urls.push(url.to_string());
        true
    }
    fn reconnect(&mut self) -> bool {
        self.close_code = None;
        self.script.borrow_mut().reconnects += 1;
        true
    }
    fn close(&mut self, code: u16) -> bool {
        self.close_code = Some(code);
        self.script.borrow_mut().closes.push(code);
        true
    }
    fn destroy(&mut self) {}
    fn send_command(&mut self, _kind: u32, _content: Vec<u8>) -> bool {
        true
    }
    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
    fn socket_error(&self) -> Option<&SocketError> {
        None
    }
    fn on_redirect_message(&mut self, _content: &[u8]) {}
}

impl LoginService for MockLogin {
    fn login(&mut self, _vendor: &Vendor) {
        self.script.borrow_mut().logins += 1;
    }
    fn ack_data(&self) -> Option<&LoginAck> {
        self.ack.as_ref()
    }
}

// =========================================================================
// App-life
// =========================================================================

#[derive(Debug, Default)]
pub struct AppLifeScript {
    pub connected: bool,
    pub connect_result: Option<ConnectionResult>,
    pub kick_result: Option<KickResult>,
    pub user_info: Option<UserInfo>,
    pub socket_error: Option<SocketError>,
    pub kicked_by_others: bool,
    /// Makes `send_command` return false.
    pub refuse_send: bool,
    /// Frames the "server" pushes; forwarded on the next tick.
    pub inbound: Vec<Command>,

    pub urls: Vec<String>,
    pub closes: Vec<u16>,
    pub reconnects: u32,
    pub sent: Vec<(u32, Vec<u8>)>,
    pub keep_alive: bool,
    pub access_user_info: bool,
    pub agreed_to_kick: bool,
    pub logged_out: bool,
    pub destroyed: bool,
}

struct MockAppLife {
    script: Shared<AppLifeScript>,
    links: ServiceLinks,
    url: String,
    connected: bool,
    connect_result: Option<ConnectionResult>,
    kick_result: Option<KickResult>,
    user_info: Option<UserInfo>,
    socket_error: Option<SocketError>,
    close_code: Option<u16>,
    logged_out: bool,
}

impl Service for MockAppLife {
    fn id(&self) -> u32 {
        ServiceType::APPLIFE.id()
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
    fn status(&self) -> ServiceStatus {
        if self.connected {
            ServiceStatus::Connected
        } else {
            ServiceStatus::Closed
        }
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn is_auto_managed(&self) -> bool {
        false
    }
    fn main_process(&mut self, _dt: Duration) -> Result<(), ServiceError> {
        let inbound = {
            let mut script = self.script.borrow_mut();
            self.connected = script.connected;
            self.connect_result = script.connect_result;
            self.kick_result = script.kick_result;
            self.user_info = script.user_info.clone();
            self.socket_error = script.socket_error.clone();
            std::mem::take(&mut script.inbound)
        };
        for command in inbound {
            self.links.forward(command);
        }
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        self.url = url.to_string();
        self.script.borrow_mut().urls.push(url.to_string());
        true
    }
    fn reconnect(&mut self) -> bool {
        let mut script = self.script.borrow_mut();
        script.reconnects += 1;
        script.connect_result = None;
        script.socket_error = None;
        self.connect_result = None;
        self.socket_error = None;
        self.close_code = None;
        true
    }
    fn close(&mut self, code: u16) -> bool {
        let mut script = self.script.borrow_mut();
        script.closes.push(code);
        script.connected = false;
        self.connected = false;
        self.close_code = Some(code);
        true
    }
    fn destroy(&mut self) {
        self.script.borrow_mut().destroyed = true;
    }
    fn send_command(&mut self, kind: u32, content: Vec<u8>) -> bool {
        let mut script = self.script.borrow_mut();
        if script.refuse_send {
            return false;
        }
        script.sent.push((kind, content));
        true
    }
    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
    fn socket_error(&self) -> Option<&SocketError> {
        self.socket_error.as_ref()
    }
    fn on_redirect_message(&mut self, _content: &[u8]) {}
}

impl AppLifeService for MockAppLife {
    fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }
    fn access_user_info(&mut self) {
        self.script.borrow_mut().access_user_info = true;
    }
    fn keep_alive(&mut self) {
        self.script.borrow_mut().keep_alive = true;
    }
    fn connect_result(&self) -> Option<ConnectionResult> {
        self.connect_result
    }
    fn user_agree_to_kick(&mut self) {
        self.script.borrow_mut().agreed_to_kick = true;
    }
    fn kick_result(&self) -> Option<KickResult> {
        self.kick_result
    }
    fn logout(&mut self) {
        self.logged_out = true;
        self.script.borrow_mut().logged_out = true;
    }
    fn is_logout(&self) -> bool {
        self.logged_out
    }
    fn is_kicked_by_others(&self) -> bool {
        self.script.borrow().kicked_by_others
    }
}

// =========================================================================
// Auxiliary services (lobby, API)
// =========================================================================

/// `"{id}:{event}"` lines from every auxiliary service.
pub type EventLog = Shared<Vec<String>>;

struct MockGeneral {
    id: u32,
    url: String,
    log: EventLog,
    /// False for RESTful API services, which the pools never sweep.
    auto_managed: bool,
}

impl MockGeneral {
    fn push(&self, event: String) {
        self.log.borrow_mut().push(format!("{}:{event}", self.id));
    }
}

impl Service for MockGeneral {
    fn id(&self) -> u32 {
        self.id
    }
    fn is_connected(&self) -> bool {
        true
    }
    fn status(&self) -> ServiceStatus {
        ServiceStatus::Connected
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn is_auto_managed(&self) -> bool {
        self.auto_managed
    }
    fn main_process(&mut self, _dt: Duration) -> Result<(), ServiceError> {
        Ok(())
    }
    fn connect(&mut self, url: &str) -> bool {
        self.url = url.to_string();
        self.push(format!("connect {url}"));
        true
    }
    fn reconnect(&mut self) -> bool {
        self.push("reconnect".into());
        true
    }
    fn close(&mut self, code: u16) -> bool {
        self.push(format!("close {code}"));
        true
    }
    fn destroy(&mut self) {
        self.push("destroy".into());
    }
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
        self.push(format!("redirect {}", String::from_utf8_lossy(content)));
    }
}

// =========================================================================
// Games
// =========================================================================

#[derive(Debug)]
pub struct GameScript {
    pub accept_join: bool,
    pub joins: Vec<GameId>,
    pub joined: Vec<(JoinGameAck, Option<String>)>,
    pub left: Vec<LeaveGameAck>,
    pub leave_notices: Vec<LeaveResult>,
    pub expels: Vec<LeaveResult>,
    pub redirected: Vec<Vec<u8>>,
    pub failed_requests: Vec<GameRequest>,
    pub destroyed: Vec<GameId>,
}

impl Default for GameScript {
    fn default() -> Self {
        Self {
            accept_join: true,
            joins: Vec::new(),
            joined: Vec::new(),
            left: Vec::new(),
            leave_notices: Vec::new(),
            expels: Vec::new(),
            redirected: Vec::new(),
            failed_requests: Vec::new(),
            destroyed: Vec::new(),
        }
    }
}

struct MockGame {
    id: GameId,
    script: Shared<GameScript>,
    game_links: GameLinks,
    url: String,
}

impl Service for MockGame {
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
    fn destroy(&mut self) {
        self.script.borrow_mut().destroyed.push(self.id);
    }
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
        self.script.borrow_mut().redirected.push(content.to_vec());
    }
}

impl GameService for MockGame {
    fn join(&mut self) {
        self.script.borrow_mut().joins.push(self.id);
        self.game_links.request_join(JoinGameRequest {
            theme_name: "lucky-seven".into(),
            game_id: self.id,
            theme_type: Default::default(),
            reason: Default::default(),
            client_version: "1.0.0".into(),
        });
    }
    fn on_joined(&mut self, ack: &JoinGameAck, uri: Option<&str>) -> bool {
        let mut script = self.script.borrow_mut();
        script.joined.push((ack.clone(), uri.map(str::to_string)));
        if let Some(uri) = uri {
            self.url = uri.to_string();
        }
        script.accept_join
    }
    fn on_left(&mut self, ack: &LeaveGameAck) -> bool {
        self.script.borrow_mut().left.push(ack.clone());
        true
    }
    fn notify_leave(&mut self, reason: LeaveResult) {
        self.script.borrow_mut().leave_notices.push(reason);
    }
    fn on_expel(&mut self, reason: LeaveResult) {
        self.script.borrow_mut().expels.push(reason);
    }
    fn on_request_failed(&mut self, request: &GameRequest) {
        self.script.borrow_mut().failed_requests.push(request.clone());
    }
}

// =========================================================================
// Harness
// =========================================================================

pub struct Harness {
    pub conn: Connection,
    pub login: Shared<LoginScript>,
    pub app: Shared<AppLifeScript>,
    pub games: Shared<GameScript>,
    pub events: EventLog,
}

impl Harness {
    pub const BASE_URL: &'static str = "example.com";

    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    /// A connection with login, app-life, lobby and one API service,
    /// initialised against [`Self::BASE_URL`].
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self::build(config, Platform::Web)
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self::build(ConnectionConfig::default(), platform)
    }

    fn build(config: ConnectionConfig, platform: Platform) -> Self {
        let login: Shared<LoginScript> = shared();
        let app: Shared<AppLifeScript> = shared();
        let games: Shared<GameScript> = shared();
        let events: EventLog = shared();

        let services = {
            let login = Rc::clone(&login);
            let app = Rc::clone(&app);
            let lobby_log = Rc::clone(&events);
            let api_log = Rc::clone(&events);
            ServiceCatalog::new()
                .with(
                    ServiceType::LOGIN,
                    ServiceConfig::new(move |_, _| {
                        ServiceHandle::Login(Box::new(MockLogin {
                            script: Rc::clone(&login),
                            ack: None,
                            url: String::new(),
                            close_code: None,
                        }))
                    })
                    .http(),
                )
                .with(
                    ServiceType::APPLIFE,
                    ServiceConfig::new(move |_, links| {
                        ServiceHandle::AppLife(Box::new(MockAppLife {
                            script: Rc::clone(&app),
                            links,
                            url: String::new(),
                            connected: false,
                            connect_result: None,
                            kick_result: None,
                            user_info: None,
                            socket_error: None,
                            close_code: None,
                            logged_out: false,
                        }))
                    }),
                )
                .with(
                    ServiceType::LOBBY,
                    ServiceConfig::new(move |service, _| {
                        ServiceHandle::General(Box::new(MockGeneral {
                            id: service.id(),
                            url: String::new(),
                            log: Rc::clone(&lobby_log),
                            auto_managed: true,
                        }))
                    }),
                )
                .with(
                    ServiceType::PLATFORM_API,
                    ServiceConfig::new(move |service, _| {
                        ServiceHandle::General(Box::new(MockGeneral {
                            id: service.id(),
                            url: String::new(),
                            log: Rc::clone(&api_log),
                            auto_managed: false,
                        }))
                    })
                    .api(),
                )
        };

        let game_catalog = {
            let games = Rc::clone(&games);
            GameCatalog::new(move |id, _links, game_links| {
                Box::new(MockGame {
                    id,
                    script: Rc::clone(&games),
                    game_links,
                    url: String::new(),
                }) as Box<dyn GameService>
            })
        };

        let mut conn = Connection::new(services, game_catalog)
            .with_config(config)
            .with_platform(platform);
        conn.init(Self::BASE_URL);

        Self {
            conn,
            login,
            app,
            games,
            events,
        }
    }

    pub fn tick(&mut self) -> Step {
        self.conn.main_process(FRAME);
        self.conn.step()
    }

    pub fn tick_by(&mut self, dt: Duration) -> Step {
        self.conn.main_process(dt);
        self.conn.step()
    }

    pub fn guest() -> Vendor {
        Vendor::Guest {
            device_id: "device-1".into(),
        }
    }

    pub fn ok_ack() -> LoginAck {
        LoginAck {
            permission: Permission::Ok,
            account_id: 1,
            token: "t".into(),
        }
    }

    /// Logs in and stops on the first `APPLIFE_CONNECT` frame.
    pub fn drive_to_app_life_connect(&mut self) {
        assert!(self.conn.login(Self::guest()));
        assert_eq!(self.tick(), Step::Wait);
        assert_eq!(self.tick(), Step::Login);
        self.login.borrow_mut().ack = Some(Self::ok_ack());
        assert_eq!(self.tick(), Step::Login);
        assert_eq!(self.tick(), Step::AppLifeConnect);
    }

    /// Runs the whole happy path and stops on `APPLIFE_DID_ACCESS`.
    pub fn drive_to_did_access(&mut self) {
        self.drive_to_app_life_connect();
        {
            let mut app = self.app.borrow_mut();
            app.connected = true;
            app.connect_result = Some(ConnectionResult::Success);
        }
        assert_eq!(self.tick(), Step::AppLifeConnect);
        assert_eq!(self.tick(), Step::AppLifeConnected);
        self.app.borrow_mut().user_info = Some(UserInfo {
            account_id: 1,
            nickname: "lucky".into(),
            balance: 100.0,
        });
        assert_eq!(self.tick(), Step::AppLifeConnected);
        assert_eq!(self.tick(), Step::AppLifeDidAccessPreparation);
        assert_eq!(self.tick(), Step::AppLifeDidAccess);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}
