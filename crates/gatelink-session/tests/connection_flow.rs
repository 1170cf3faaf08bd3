//! End-to-end tests of the session machine.
//!
//! Every test drives a real `Connection` frame by frame against scripted
//! service handles (see `support`). The script plays the backend: the test
//! sets what the server "answered" and the next tick's `main_process` hands
//! it to the handle, exactly like a socket read would.

mod support;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gatelink_protocol::{
    AuthHeaders, Codec, Command, ConnectionResult, ConnectionType, GameId, GameNotice,
    JoinGameAck, JoinResult, JsonCodec, KickResult, LeaveGameAck, LeaveResult, LoginAck,
    Permission, ServiceType, s2u, u2s,
};
use gatelink_service::{GameRequest, PoolKind, SocketError};
use gatelink_session::{ConnectionConfig, Platform, SessionError, Step};

use support::Harness;

fn frame<T: serde::Serialize>(kind: u32, record: &T) -> Command {
    Command::new(kind, JsonCodec.encode(record).unwrap())
}

// =========================================================================
// Login and app-life handshake
// =========================================================================

#[test]
fn test_happy_path_reaches_did_access() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    assert!(h.conn.is_connected());
    assert!(!h.conn.is_connection_closed());
    assert_eq!(h.login.borrow().logins, 1);
    assert!(h.app.borrow().keep_alive);
    assert!(h.app.borrow().access_user_info);
}

#[test]
fn test_service_urls_are_composed_from_base() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    assert_eq!(h.login.borrow().urls, vec!["http://example.com/service/200/client"]);
    assert_eq!(h.app.borrow().urls, vec!["ws://example.com/service/202/client/1/t"]);
    let events = h.events();
    assert!(events.contains(&"232:connect http://example.com/service/232".to_string()));
    assert!(events.contains(&"201:connect ws://example.com/service/201/client".to_string()));
}

#[test]
fn test_init_creates_only_api_services() {
    let h = Harness::new();
    assert_eq!(h.conn.pools().len(PoolKind::ApiService), 1);
    assert_eq!(h.conn.pools().len(PoolKind::Service), 0);
    assert_eq!(h.conn.step(), Step::Wait);
}

#[test]
fn test_login_twice_is_ignored() {
    let mut h = Harness::new();
    assert!(h.conn.login(Harness::guest()));
    assert!(!h.conn.login(Harness::guest()));
}

#[test]
fn test_login_success_closes_login_with_finish() {
    let mut h = Harness::new();
    h.drive_to_app_life_connect();
    assert_eq!(h.login.borrow().closes, vec![4304]);
}

#[test]
fn test_auth_headers_published_on_app_life_connect() {
    let mut h = Harness::new();
    let headers = h.conn.subscribe_headers();
    h.drive_to_app_life_connect();

    assert_eq!(
        *headers.borrow(),
        Some(AuthHeaders {
            account_id: 1,
            token: "t".into(),
        })
    );
}

#[test]
fn test_login_denied_goes_to_login_fail() {
    let mut h = Harness::new();
    h.conn.login(Harness::guest());
    h.tick();
    h.tick();
    h.login.borrow_mut().ack = Some(LoginAck {
        permission: Permission::Denied(3),
        account_id: 0,
        token: String::new(),
    });
    h.tick();
    assert_eq!(h.tick(), Step::LoginFail);

    assert!(h.conn.is_connection_closed());
    assert_eq!(h.login.borrow().closes, vec![4302]);
    assert_eq!(h.conn.connection_closed_reason(), Some(4302));
    assert_eq!(h.conn.login_ack().map(|a| a.permission), Some(Permission::Denied(3)));
}

#[test]
fn test_login_timeout_without_retries_is_fatal() {
    let config = ConnectionConfig {
        stage_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let mut h = Harness::with_config(config);
    h.conn.login(Harness::guest());
    h.tick();
    assert_eq!(h.tick(), Step::Login);

    h.tick_by(Duration::from_millis(100));
    assert_eq!(h.tick(), Step::LoginTimeout);
    assert_eq!(h.tick(), Step::LoginFatalFail);
    assert_eq!(h.login.borrow().closes, vec![4301]);
    assert!(h.conn.is_connection_closed());
}

#[test]
fn test_login_timeout_with_retry_logs_in_again() {
    let config = ConnectionConfig {
        stage_timeout: Duration::from_millis(100),
        wait_retry: Duration::from_millis(10),
        retry_limit: 1,
        ..Default::default()
    };
    let mut h = Harness::with_config(config);
    h.conn.login(Harness::guest());
    h.tick();
    h.tick();
    h.tick_by(Duration::from_millis(100));
    assert_eq!(h.tick(), Step::LoginTimeout);
    assert_eq!(h.tick(), Step::LoginTimeoutWaitRetry);
    assert_eq!(h.conn.retry_count(), 1);

    h.tick_by(Duration::from_millis(10));
    assert_eq!(h.login.borrow().closes, vec![4303]);
    assert_eq!(h.tick(), Step::Login);
    assert_eq!(h.login.borrow().reconnects, 1);
    assert_eq!(h.login.borrow().logins, 2);

    // Second timeout exhausts the single retry.
    h.tick_by(Duration::from_millis(100));
    h.tick();
    assert_eq!(h.tick(), Step::LoginFatalFail);
}

#[test]
fn test_app_life_rejected_closes_with_connect_fail() {
    let mut h = Harness::new();
    h.drive_to_app_life_connect();
    h.app.borrow_mut().connect_result = Some(ConnectionResult::Rejected { code: 7 });
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnectFail);
    assert_eq!(h.app.borrow().closes, vec![4401]);
}

#[test]
fn test_app_life_connect_timeout_retries_then_fails() {
    let config = ConnectionConfig {
        stage_timeout: Duration::from_millis(100),
        wait_retry: Duration::from_millis(10),
        retry_limit: 1,
        ..Default::default()
    };
    let mut h = Harness::with_config(config);
    h.drive_to_app_life_connect();

    h.tick_by(Duration::from_millis(100));
    assert_eq!(h.tick(), Step::AppLifeConnectTimeout);
    assert_eq!(h.tick(), Step::AppLifeConnectTimeoutWaitRetry);
    h.tick_by(Duration::from_millis(10));
    assert_eq!(h.app.borrow().closes, vec![4405]);
    assert_eq!(h.tick(), Step::AppLifeConnect);
    assert_eq!(h.app.borrow().reconnects, 1);

    h.tick_by(Duration::from_millis(100));
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnectFatalFail);
    assert_eq!(h.app.borrow().closes, vec![4405, 4406]);
}

#[test]
fn test_connected_timeout_is_fatal_without_retries() {
    let mut h = Harness::new();
    h.drive_to_app_life_connect();
    h.app.borrow_mut().connected = true;
    h.app.borrow_mut().connect_result = Some(ConnectionResult::Success);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnected);

    h.tick_by(Duration::from_secs(5));
    assert_eq!(h.tick(), Step::AppLifeConnectedTimeout);
    assert_eq!(h.tick(), Step::AppLifeConnectedFatalFail);
    assert_eq!(h.app.borrow().closes, vec![4407]);
}

#[test]
fn test_connected_timeout_retries_until_limit_then_fails() {
    let config = ConnectionConfig {
        stage_timeout: Duration::from_millis(100),
        wait_retry: Duration::from_millis(10),
        retry_limit: 1,
        ..Default::default()
    };
    let mut h = Harness::with_config(config);
    h.drive_to_app_life_connect();
    h.app.borrow_mut().connected = true;
    h.app.borrow_mut().connect_result = Some(ConnectionResult::Success);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnected);

    h.tick_by(Duration::from_millis(100));
    assert_eq!(h.tick(), Step::AppLifeConnectedTimeout);
    assert_eq!(h.tick(), Step::AppLifeConnectedTimeoutWaitRetry);
    assert_eq!(h.conn.retry_count(), 1);

    // The retry re-enters CONNECTED and asks for the user info again.
    h.app.borrow_mut().access_user_info = false;
    assert_eq!(h.tick(), Step::AppLifeConnected);
    assert!(h.app.borrow().access_user_info);
    assert!(h.app.borrow().closes.is_empty());

    h.tick_by(Duration::from_millis(100));
    assert_eq!(h.tick(), Step::AppLifeConnectedTimeout);
    assert_eq!(h.tick(), Step::AppLifeConnectedFatalFail);
    assert_eq!(h.conn.retry_count(), 1);
    assert_eq!(h.app.borrow().closes, vec![4407]);
    assert!(h.conn.is_connection_closed());
}

#[test]
fn test_socket_error_during_connect() {
    let mut h = Harness::new();
    h.drive_to_app_life_connect();
    h.app.borrow_mut().socket_error = Some(SocketError::new(1006, "abnormal"));
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeSocketError);

    assert!(h.conn.is_connection_closed());
    assert_eq!(h.conn.socket_error().map(|e| e.code), Some(1006));
}

// =========================================================================
// Kick arbitration
// =========================================================================

fn drive_to_kick_prompt(h: &mut Harness) {
    h.drive_to_app_life_connect();
    h.app.borrow_mut().connect_result = Some(ConnectionResult::WaitBackKick);
    h.tick();
    assert!(h.conn.need_user_confirm_kick());
    assert_eq!(h.tick(), Step::AppLifeConnectNeedUserAgreeKick);
}

#[test]
fn test_decide_to_kick_outside_prompt_is_rejected() {
    let mut h = Harness::new();
    h.drive_to_app_life_connect();
    assert!(matches!(h.conn.decide_to_kick(true), Err(SessionError::NoKickPending)));
}

#[test]
fn test_kick_disagree_closes_app_life() {
    let mut h = Harness::new();
    drive_to_kick_prompt(&mut h);

    h.conn.decide_to_kick(false).unwrap();
    assert!(!h.conn.need_user_confirm_kick());
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnectUserDisagreeKick);

    assert!(h.conn.is_connection_closed());
    assert_eq!(h.conn.connection_closed_reason(), Some(4402));
}

#[test]
fn test_kick_agree_reaches_connected() {
    let mut h = Harness::new();
    drive_to_kick_prompt(&mut h);

    h.conn.decide_to_kick(true).unwrap();
    h.tick();
    assert!(h.conn.reply_kick_decision());
    assert_eq!(h.tick(), Step::AppLifeConnectUserDidAgreeKick);
    assert!(h.app.borrow().agreed_to_kick);

    h.app.borrow_mut().connected = true;
    h.app.borrow_mut().kick_result = Some(KickResult::Success);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnected);
    assert_eq!(h.conn.kick_result(), Some(KickResult::Success));
}

#[test]
fn test_kick_agree_times_out() {
    let config = ConnectionConfig {
        kick_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut h = Harness::with_config(config);
    drive_to_kick_prompt(&mut h);
    h.conn.decide_to_kick(true).unwrap();
    h.tick();
    h.tick();

    h.tick_by(Duration::from_millis(60));
    assert_eq!(h.tick(), Step::AppLifeConnectUserAgreeKickTimeout);
    assert_eq!(h.app.borrow().closes, vec![4403]);
}

#[test]
fn test_kick_failure_closes_with_agree_kick_fail() {
    let mut h = Harness::new();
    drive_to_kick_prompt(&mut h);
    h.conn.decide_to_kick(true).unwrap();
    h.tick();
    h.tick();

    h.app.borrow_mut().kick_result = Some(KickResult::Failed { code: 9 });
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeConnectUserAgreeKickFail);
    assert_eq!(h.app.borrow().closes, vec![4404]);
}

#[test]
fn test_socket_error_beats_pending_kick_decision() {
    let mut h = Harness::new();
    drive_to_kick_prompt(&mut h);

    h.conn.decide_to_kick(true).unwrap();
    h.app.borrow_mut().socket_error = Some(SocketError::new(1006, "gone"));
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeSocketError);
    assert!(!h.app.borrow().agreed_to_kick);
}

// =========================================================================
// Reset
// =========================================================================

#[test]
fn test_reset_returns_to_wait_and_keeps_api_pool() {
    let mut h = Harness::new();
    let headers = h.conn.subscribe_headers();
    h.drive_to_did_access();

    h.conn.reset();
    assert_eq!(h.conn.step(), Step::Wait);
    assert_eq!(h.conn.pools().len(PoolKind::Service), 0);
    assert!(h.conn.pools().has(PoolKind::ApiService, ServiceType::PLATFORM_API.id()));
    assert!(h.app.borrow().destroyed);
    assert!(headers.borrow().is_none());

    // A fresh login is accepted again.
    assert!(h.conn.login(Harness::guest()));
    assert_eq!(h.tick(), Step::Wait);
    assert_eq!(h.tick(), Step::Login);
}

#[test]
fn test_reset_during_pending_join_empties_game_pools() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    h.conn.join_game(GameId(9)).unwrap();
    assert!(h.conn.pools().has(PoolKind::GamePending, 9));

    h.conn.reset();
    assert_eq!(h.conn.step(), Step::Wait);
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    assert_eq!(h.conn.pools().len(PoolKind::Game), 0);
    assert_eq!(h.games.borrow().destroyed, vec![GameId(9)]);

    // The same game can be joined on the next session.
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);
    assert!(h.conn.pools().has(PoolKind::Game, 9));
    assert_eq!(h.games.borrow().joins, vec![GameId(9), GameId(9)]);
}

#[test]
fn test_reset_from_kick_prompt_drops_decision_and_pools() {
    let mut h = Harness::new();
    drive_to_kick_prompt(&mut h);
    h.conn.decide_to_kick(true).unwrap();

    h.conn.reset();
    assert_eq!(h.conn.step(), Step::Wait);
    assert!(!h.conn.need_user_confirm_kick());
    assert!(matches!(h.conn.decide_to_kick(true), Err(SessionError::NoKickPending)));
    assert_eq!(h.conn.pools().len(PoolKind::Service), 0);
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    assert_eq!(h.conn.pools().len(PoolKind::Game), 0);

    h.drive_to_did_access();
    assert!(!h.app.borrow().agreed_to_kick);
    join_and_ack(&mut h, 9);
    assert!(h.conn.pools().has(PoolKind::Game, 9));
}

// =========================================================================
// Games
// =========================================================================

fn join_ack(game: u32, result: JoinResult) -> JoinGameAck {
    JoinGameAck {
        game_id: GameId(game),
        theme_id: game,
        result,
        conn_type: Some(ConnectionType::WebSocket),
        uri: format!("/room/{game}"),
    }
}

fn join_and_ack(h: &mut Harness, game: u32) {
    h.conn.join_game(GameId(game)).unwrap();
    h.app
        .borrow_mut()
        .inbound
        .push(frame(s2u::ACK_JOIN_GAME, &join_ack(game, JoinResult::Success)));
    h.tick();
}

#[test]
fn test_join_game_twice_sends_one_request() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    h.conn.join_game(GameId(9)).unwrap();
    h.conn.join_game(GameId(9)).unwrap();

    assert_eq!(h.games.borrow().joins, vec![GameId(9)]);
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 1);
    let sent = h.app.borrow().sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, u2s::REQ_JOIN_GAME);
}

#[test]
fn test_join_game_before_app_life_is_refused() {
    let mut h = Harness::new();

    let result = h.conn.join_game(GameId(9));
    assert!(matches!(result, Err(SessionError::MissingAppLife)));
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    assert!(h.games.borrow().joins.is_empty());

    h.drive_to_did_access();
    h.conn.join_game(GameId(9)).unwrap();
    assert_eq!(h.games.borrow().joins, vec![GameId(9)]);
    assert_eq!(h.app.borrow().sent.len(), 1);
}

#[test]
fn test_join_game_refused_send_drops_pending_handle() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    h.app.borrow_mut().refuse_send = true;

    let result = h.conn.join_game(GameId(9));
    assert!(matches!(result, Err(SessionError::JoinNotSent(GameId(9)))));
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    {
        let games = h.games.borrow();
        assert_eq!(games.failed_requests.len(), 1);
        assert!(matches!(
            &games.failed_requests[0],
            GameRequest::Join(req) if req.game_id == GameId(9)
        ));
        assert_eq!(games.destroyed, vec![GameId(9)]);
    }

    // Nothing is left behind to block a second attempt.
    h.app.borrow_mut().refuse_send = false;
    h.conn.join_game(GameId(9)).unwrap();
    assert!(h.conn.pools().has(PoolKind::GamePending, 9));
    assert_eq!(h.app.borrow().sent.len(), 1);
    assert_eq!(h.app.borrow().sent[0].0, u2s::REQ_JOIN_GAME);
}

#[test]
fn test_join_ack_promotes_pending_game_with_composed_uri() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);

    let games = h.games.borrow();
    assert_eq!(games.joined.len(), 1);
    assert_eq!(games.joined[0].1.as_deref(), Some("ws://example.com/room/9/client"));
    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    assert!(h.conn.pools().has(PoolKind::Game, 9));
}

#[test]
fn test_second_game_is_refused_while_one_is_active() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);

    let result = h.conn.join_game(GameId(10));
    assert!(matches!(result, Err(SessionError::GameAlreadyActive(GameId(10)))));
}

#[test]
fn test_refused_join_clears_pending_pool() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    h.games.borrow_mut().accept_join = false;
    join_and_ack(&mut h, 9);

    assert_eq!(h.conn.pools().len(PoolKind::GamePending), 0);
    assert_eq!(h.conn.pools().len(PoolKind::Game), 0);
}

#[test]
fn test_leave_ack_clears_active_game() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);

    let ack = LeaveGameAck {
        game_id: GameId(9),
        theme_id: 9,
        result: LeaveResult::Success,
    };
    assert!(h.conn.redirect_command(frame(s2u::ACK_LEAVE_GAME, &ack)));

    assert_eq!(h.games.borrow().left.len(), 1);
    assert_eq!(h.conn.pools().len(PoolKind::Game), 0);
}

#[test]
fn test_game_notices_reach_active_game() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);

    let leave = GameNotice {
        game_id: GameId(9),
        reason: LeaveResult::Maintenance,
    };
    let expel = GameNotice {
        game_id: GameId(9),
        reason: LeaveResult::Idle,
    };
    assert!(h.conn.redirect_command(frame(s2u::NOTIFY_LEAVE_GAME, &leave)));
    assert!(h.conn.redirect_command(frame(s2u::EXPEL_GAME, &expel)));

    let games = h.games.borrow();
    assert_eq!(games.leave_notices, vec![LeaveResult::Maintenance]);
    assert_eq!(games.expels, vec![LeaveResult::Idle]);
}

#[test]
fn test_notice_for_unknown_game_is_not_handled() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    let notice = GameNotice {
        game_id: GameId(3),
        reason: LeaveResult::Expelled,
    };
    assert!(!h.conn.redirect_command(frame(s2u::EXPEL_GAME, &notice)));
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_redirect_forwards_by_kind() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    join_and_ack(&mut h, 9);

    assert!(h.conn.redirect_command(Command::new(201, b"hello".to_vec())));
    assert!(h.conn.redirect_command(Command::new(9, b"spin".to_vec())));
    assert!(!h.conn.redirect_command(Command::new(999, b"lost".to_vec())));

    assert!(h.events().contains(&"201:redirect hello".to_string()));
    assert_eq!(h.games.borrow().redirected, vec![b"spin".to_vec()]);
}

#[test]
fn test_inbound_app_life_frames_are_routed_each_tick() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    h.app.borrow_mut().inbound.push(Command::new(201, b"push".to_vec()));
    h.tick();
    assert!(h.events().contains(&"201:redirect push".to_string()));
}

#[test]
fn test_undecodable_session_frame_is_dropped() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    assert!(!h.conn.redirect_command(Command::new(s2u::ACK_JOIN_GAME, b"{".to_vec())));
}

// =========================================================================
// Disconnect and reconnect
// =========================================================================

fn drop_app_life(h: &mut Harness) {
    h.app.borrow_mut().connected = false;
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeDisconnect);
}

#[test]
fn test_disconnect_closes_pools_with_section_code() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    drop_app_life(&mut h);

    assert!(h.conn.is_connection_closed());
    assert!(h.events().contains(&"201:close 4400".to_string()));
    // Login, API and app-life are not auto-managed; the pools leave them alone.
    assert!(h.app.borrow().closes.is_empty());
    assert_eq!(h.login.borrow().closes, vec![4304]);
    assert!(!h.events().iter().any(|e| e.starts_with("232:close")));
}

#[test]
fn test_reconnect_returns_to_did_access() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    drop_app_life(&mut h);

    h.conn.reconnect().unwrap();
    assert_eq!(h.tick(), Step::AppLifeWaitReconnect);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeReconnecting);
    assert!(h.conn.is_reconnecting());
    assert_eq!(h.app.borrow().reconnects, 1);

    h.app.borrow_mut().connected = true;
    h.app.borrow_mut().connect_result = Some(ConnectionResult::Success);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeDidAccess);
    assert!(h.conn.is_connected());
    assert!(h.events().contains(&"201:reconnect".to_string()));
    assert!(!h.events().contains(&"232:reconnect".to_string()));
    assert_eq!(h.login.borrow().reconnects, 0);
}

#[test]
fn test_failed_reconnect_falls_back_to_disconnect() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    drop_app_life(&mut h);
    h.conn.reconnect().unwrap();
    h.tick();
    h.tick();
    h.tick();

    h.app.borrow_mut().connect_result = Some(ConnectionResult::Rejected { code: 1 });
    h.tick();
    assert_eq!(h.app.borrow().closes, vec![4408]);
    assert_eq!(h.tick(), Step::AppLifeDisconnect);
    assert!(h.events().contains(&"201:close 4408".to_string()));
}

#[test]
fn test_reconnect_refused_while_connected() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    assert!(matches!(h.conn.reconnect(), Err(SessionError::ReconnectRefused)));
}

#[test]
fn test_reconnect_refused_after_kicked_by_others() {
    let mut h = Harness::new();
    h.drive_to_did_access();
    h.app.borrow_mut().kicked_by_others = true;
    drop_app_life(&mut h);
    assert!(matches!(h.conn.reconnect(), Err(SessionError::ReconnectRefused)));
}

#[test]
fn test_logout_closes_app_life_and_refuses_reconnect() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    h.conn.logout();
    assert!(h.conn.is_logout());
    assert_eq!(h.app.borrow().closes, vec![4703]);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeDisconnect);
    assert_eq!(h.conn.connection_closed_reason(), Some(4703));
    assert!(matches!(h.conn.reconnect(), Err(SessionError::ReconnectRefused)));
}

#[test]
fn test_web_flight_mode_holds_reconnect_until_switched_off() {
    let mut h = Harness::new();
    h.drive_to_did_access();

    assert!(h.conn.web_flight_mode_switch());
    assert_eq!(h.app.borrow().closes, vec![4801]);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeDisconnect);

    h.conn.reconnect().unwrap();
    assert_eq!(h.tick(), Step::AppLifeWaitReconnect);
    assert_eq!(h.tick(), Step::AppLifeWaitReconnect);

    assert!(!h.conn.web_flight_mode_switch());
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeReconnecting);
}

#[test]
fn test_native_platform_waits_for_probe() {
    let online = Rc::new(Cell::new(false));
    let probe = {
        let online = Rc::clone(&online);
        move || online.get()
    };
    let mut h = Harness::with_platform(Platform::native(probe));
    assert!(!h.conn.web_flight_mode_switch());

    h.drive_to_did_access();
    drop_app_life(&mut h);
    h.conn.reconnect().unwrap();
    assert_eq!(h.tick(), Step::AppLifeWaitReconnect);
    assert_eq!(h.tick(), Step::AppLifeWaitReconnect);

    online.set(true);
    h.tick();
    assert_eq!(h.tick(), Step::AppLifeReconnecting);
}
