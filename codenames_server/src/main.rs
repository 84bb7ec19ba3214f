mod config;
mod service;
mod store;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use dashmap::DashMap;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use codenames_core::{ClientMessage, GameId, PlayerId, ServerMessage};
use config::Config;
use service::{now_millis, Action, GameService};
use store::{StoreError, StoredGame};

// 服务器全局状态。游戏本身保存在 service 的存储里，这里只维护网络连接
struct AppState {
    service: GameService,
    rooms: DashMap<GameId, Arc<Room>>,
}

// 一局游戏对应的所有在线连接
struct Room {
    // 将 PlayerId 映射到具体的网络连接
    players: RwLock<HashMap<PlayerId, PlayerConnection>>,
}

// 玩家的网络连接信息
struct PlayerConnection {
    // 用于向该玩家的 WebSocket 任务发送消息的通道
    sender: mpsc::Sender<ServerMessage>,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = SharedState::new(AppState {
        service: GameService::new(config.max_players, config.write_retries),
        rooms: DashMap::new(),
    });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state);

    let addr = config.addr();
    info!("服务器正在监听 {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法绑定地址 {}", addr))?;
    axum::serve(listener, app).await.context("服务器异常退出")?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(p) => p,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接所在的游戏和身份，加入成功后填充
    let mut player_context: Option<(GameId, PlayerId)> = None;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, state.clone(), &tx, &mut player_context).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                    let _ = tx.send(ServerMessage::Error { message: format!("无法解析的消息: {}", e) }).await;
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some((game_id, player_id)) = player_context {
        handle_disconnect(state, game_id, player_id).await;
    }
    info!("客户端连接关闭");
}

/// 引擎拒绝原样转发，其余存储错误只给出描述
fn error_message(error: StoreError) -> ServerMessage {
    match error {
        StoreError::Game(e) => ServerMessage::Rejected(e),
        other => ServerMessage::Error { message: other.to_string() },
    }
}

/// 取得游戏对应的房间，不存在时新建
fn room_for(state: &AppState, game_id: GameId) -> Arc<Room> {
    state
        .rooms
        .entry(game_id)
        .or_insert_with(|| {
            Arc::new(Room {
                players: RwLock::new(HashMap::new()),
            })
        })
        .clone()
}

/// 核心消息处理逻辑
async fn handle_client_message(
    msg: ClientMessage,
    state: SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(GameId, PlayerId)>,
) {
    let now = now_millis();
    match msg {
        ClientMessage::ListGames { limit } => {
            let games = state.service.list_games(limit);
            let _ = tx.send(ServerMessage::GameList { games }).await;
        }
        ClientMessage::CreateGame { name, player_id, words } => {
            if context.is_some() {
                let _ = tx.send(ServerMessage::Error { message: "你已经在一个游戏里了".to_string() }).await;
                return;
            }

            let player_id = player_id.unwrap_or_else(Uuid::new_v4);
            let stored = match state.service.create_game(&name, player_id, words, now) {
                Ok(stored) => stored,
                Err(e) => {
                    let _ = tx.send(error_message(e)).await;
                    return;
                }
            };

            let game_id = stored.game.id;
            let room = room_for(&state, game_id);
            room.players.write().await.insert(player_id, PlayerConnection { sender: tx.clone() });

            info!("玩家 {} 创建了新游戏 {}", player_id, game_id);
            *context = Some((game_id, player_id));
            let _ = tx.send(ServerMessage::GameJoined {
                your_id: player_id,
                version: stored.version,
                game: stored.game.for_client(&player_id),
            }).await;
        }
        ClientMessage::JoinGame { game_id, name, player_id } => {
            // 同一局游戏内允许用原身份重新加入，例如名单被清空之后
            let player_id = match *context {
                Some((current, id)) if current == game_id => player_id.unwrap_or(id),
                Some(_) => {
                    let _ = tx.send(ServerMessage::Error { message: "你已经在一个游戏里了".to_string() }).await;
                    return;
                }
                None => player_id.unwrap_or_else(Uuid::new_v4),
            };

            let stored = match state.service.join_game(&game_id, player_id, &name, now) {
                Ok(stored) => stored,
                Err(e) => {
                    let _ = tx.send(error_message(e)).await;
                    return;
                }
            };

            let room = room_for(&state, game_id);
            room.players.write().await.insert(player_id, PlayerConnection { sender: tx.clone() });

            info!("玩家 {} 加入了游戏 {}", player_id, game_id);
            *context = Some((game_id, player_id));
            let _ = tx.send(ServerMessage::GameJoined {
                your_id: player_id,
                version: stored.version,
                game: stored.game.for_client(&player_id),
            }).await;
            push_snapshots(&room, &stored, Some(player_id)).await;
        }
        // ... 其他需要先加入游戏才能执行的消息
        _ => {
            let Some((game_id, player_id)) = *context else {
                let _ = tx.send(ServerMessage::Error { message: "请先加入或创建游戏".to_string() }).await;
                return;
            };
            let room = room_for(&state, game_id);

            let action = match msg {
                ClientMessage::LeaveGame => {
                    match state.service.leave_game(&game_id, &player_id) {
                        Ok(stored) => {
                            room.players.write().await.remove(&player_id);
                            *context = None;
                            let _ = tx.send(ServerMessage::Info { message: "你已离开游戏".to_string() }).await;
                            let players = room.players.read().await;
                            broadcast(players.iter(), &ServerMessage::PlayerLeft { player_id }, None).await;
                            drop(players);
                            push_snapshots(&room, &stored, None).await;
                            drop_room_if_empty(&state, game_id, &room).await;
                        }
                        Err(e) => {
                            let _ = tx.send(error_message(e)).await;
                        }
                    }
                    return;
                }
                ClientMessage::DeleteGame => {
                    match state.service.delete_game(&game_id, &player_id) {
                        Ok(()) => {
                            let players = room.players.read().await;
                            broadcast(players.iter(), &ServerMessage::GameDeleted { game_id }, None).await;
                            drop(players);
                            state.rooms.remove(&game_id);
                            *context = None;
                        }
                        Err(e) => {
                            let _ = tx.send(error_message(e)).await;
                        }
                    }
                    return;
                }
                ClientMessage::AssignTeam { team, role } => Action::AssignTeam { team, role },
                ClientMessage::StartGame => Action::Start,
                ClientMessage::GiveClue { clue, count } => Action::GiveClue { clue, count },
                ClientMessage::EndTurn => Action::EndTurn,
                ClientMessage::RevealCard { card_id } => Action::Reveal { card_id },
                ClientMessage::RestartGame { words } => Action::Restart { words },
                ClientMessage::ResetPlayers => Action::ResetPlayers,
                ClientMessage::CreateGame { .. } | ClientMessage::JoinGame { .. } | ClientMessage::ListGames { .. } => {
                    return;
                }
            };

            match state.service.apply(&game_id, player_id, action, now) {
                Ok((stored, outcome)) => {
                    // 翻牌结果先于快照发出
                    if let Some(outcome) = outcome {
                        let msg = ServerMessage::CardRevealed { player_id, outcome };
                        broadcast(room.players.read().await.iter(), &msg, None).await;
                    }
                    push_snapshots(&room, &stored, None).await;
                }
                Err(e) => {
                    // 错误消息只发给当前玩家
                    let _ = tx.send(error_message(e)).await;
                }
            }
        }
    }
}

/// 快照需要为每个玩家单独生成，附带写入时的版本供客户端排序
async fn push_snapshots(room: &Room, stored: &StoredGame, exclude: Option<PlayerId>) {
    for (pid, conn) in room.players.read().await.iter() {
        if Some(*pid) == exclude {
            continue;
        }
        let msg = ServerMessage::GameUpdated {
            version: stored.version,
            game: stored.game.for_client(pid),
        };
        if conn.sender.send(msg).await.is_err() {
            warn!("向玩家 {} 推送快照失败（可能已断开）", pid);
        }
    }
}

/// 玩家断开连接后的处理。游戏本身保留在存储中，玩家稍后可以重新加入。
async fn handle_disconnect(state: SharedState, game_id: GameId, player_id: PlayerId) {
    info!("玩家 {} 从游戏 {} 断开连接", player_id, game_id);
    let room = match state.rooms.get(&game_id) {
        None => return,
        Some(r) => r.clone(),
    };

    room.players.write().await.remove(&player_id);

    match state.service.set_online(&game_id, &player_id, false) {
        Ok(stored) => push_snapshots(&room, &stored, None).await,
        Err(e) => warn!("更新玩家 {} 的在线状态失败: {}", player_id, e),
    }

    drop_room_if_empty(&state, game_id, &room).await;
}

/// 房间没有任何连接时移除，游戏本身仍保留在存储中
async fn drop_room_if_empty(state: &AppState, game_id: GameId, room: &Room) {
    if room.players.read().await.is_empty() {
        state.rooms.remove(&game_id);
        info!("游戏 {} 已没有在线连接，房间已被移除", game_id);
    }
}

/// 向房间内所有玩家广播消息
async fn broadcast(
    players: impl Iterator<Item = (&PlayerId, &PlayerConnection)>,
    message: &ServerMessage,
    exclude: Option<PlayerId>,
) {
    for (player_id, conn) in players {
        if Some(*player_id) == exclude {
            continue;
        }
        if conn.sender.send(message.clone()).await.is_err() {
            // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
            warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
        }
    }
}
