//! 玩家名单管理：加入、分队、离开、清空。
//!
//! 所有函数都接收一个只读快照并返回新快照，失败时原快照保持不变。

use crate::board::Team;
use crate::error::{GameError, Result};
use crate::state::{GamePhase, GameState, Player, PlayerId, Role, TeamState, Teams, Timestamp};
use tracing::{debug, info};

/// 将玩家从其当前队伍/角色中移除，并清空其 team/role
fn detach(state: &mut GameState, player_id: &PlayerId) {
    let Some(player) = state.players.get_mut(player_id) else { return };
    let (team, role) = (player.team.take(), player.role.take());

    let Some(team) = team else { return };
    let team_state = &mut state.teams[team];
    match role {
        Some(Role::Spymaster) if team_state.spymaster == Some(*player_id) => {
            team_state.spymaster = None;
        }
        Some(Role::Operative) => {
            team_state.operatives.remove(player_id);
        }
        _ => {}
    }
}

fn attach(state: &mut GameState, player_id: PlayerId, team: Team, role: Role) {
    if let Some(player) = state.players.get_mut(&player_id) {
        player.team = Some(team);
        player.role = Some(role);
    }
    match role {
        Role::Spymaster => state.teams[team].spymaster = Some(player_id),
        Role::Operative => {
            state.teams[team].operatives.insert(player_id);
        }
    }
}

/// 队长位置只能有一人，被其他玩家占用时拒绝
fn check_spymaster_slot(state: &GameState, player_id: &PlayerId, team: Team, role: Role) -> Result<()> {
    match (role, state.teams[team].spymaster) {
        (Role::Spymaster, Some(holder)) if holder != *player_id => {
            Err(GameError::CallerSlotOccupied { team, holder })
        }
        _ => Ok(()),
    }
}

/// 添加玩家或处理重新加入
///
/// - 同一 ID 但名字不同会被视为身份冲突。
/// - 重新加入时先解除原有分队，再以未分队状态覆盖。
/// - 新玩家在房间满员时被拒绝，重新加入不受人数限制。
pub fn add_player(
    state: &GameState,
    player_id: PlayerId,
    name: &str,
    assignment: Option<(Team, Role)>,
    now: Timestamp,
) -> Result<GameState> {
    match state.players.get(&player_id) {
        Some(existing) if existing.name != name => {
            return Err(GameError::PlayerIdentityConflict {
                player_id,
                existing: existing.name.clone(),
            });
        }
        Some(_) => {}
        None if state.players.len() >= state.settings.max_players => {
            return Err(GameError::GameFull { max_players: state.settings.max_players });
        }
        None => {}
    }
    if let Some((team, role)) = assignment {
        check_spymaster_slot(state, &player_id, team, role)?;
    }

    let mut next = state.clone();
    detach(&mut next, &player_id);
    next.players.insert(player_id, Player {
        id: player_id,
        name: name.to_string(),
        team: None,
        role: None,
        is_online: true,
        joined_at: now,
    });
    if let Some((team, role)) = assignment {
        attach(&mut next, player_id, team, role);
    }

    info!("玩家 {} ({}) 加入了游戏 {}", name, player_id, state.id);
    Ok(next)
}

/// 把玩家分配到指定队伍和角色，必要时先从原队伍移除
pub fn assign_team(state: &GameState, player_id: PlayerId, team: Team, role: Role) -> Result<GameState> {
    let player = state.players.get(&player_id).ok_or(GameError::PlayerNotFound { player_id })?;
    check_spymaster_slot(state, &player_id, team, role)?;

    let mut next = state.clone();
    if player.assignment() != Some((team, role)) {
        detach(&mut next, &player_id);
        attach(&mut next, player_id, team, role);
    }

    debug!("玩家 {} 被分配到 {} 队 ({:?})", player_id, team, role);
    Ok(next)
}

/// 彻底移除玩家。玩家不存在时不做任何改变。
pub fn remove_player(state: &GameState, player_id: &PlayerId) -> GameState {
    let mut next = state.clone();
    if next.players.contains_key(player_id) {
        detach(&mut next, player_id);
        next.players.remove(player_id);
        info!("玩家 {} 离开了游戏 {}", player_id, state.id);
    }
    next
}

/// 清空所有玩家和队伍进度，回到等待阶段，保留棋盘和各队卡牌总数
pub fn reset_roster(state: &GameState) -> GameState {
    let mut next = state.clone();
    next.players.clear();
    next.teams = Teams {
        red: TeamState::new(state.teams.red.cards_total),
        blue: TeamState::new(state.teams.blue.cards_total),
    };
    next.phase = GamePhase::Waiting;
    next.winner = None;
    next.current_team = state.starting_team;
    info!("游戏 {} 的玩家已被清空", state.id);
    next
}

/// 更新玩家的在线状态，未知玩家忽略
pub fn set_online(state: &GameState, player_id: &PlayerId, online: bool) -> GameState {
    let mut next = state.clone();
    if let Some(player) = next.players.get_mut(player_id) {
        player.is_online = online;
    }
    next
}

// --- 单元测试 ---
