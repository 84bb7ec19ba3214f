use crate::board::*;
use crate::error::{GameError, Result};
use crate::state::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 线索数量上限
pub const MAX_CLUE_COUNT: i32 = 9;

/// 一次翻牌的结果，供表现层选择提示信息，不应用来反推状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    pub card_id: CardId,
    pub card_type: CardType,
    pub continues_turn: bool,
    pub game_ended: bool,
    pub winner: Option<Team>,
}

// --- 核心游戏流程函数 ---

/// 创建一局新游戏
///
/// 新游戏处于等待阶段，名单为空，棋盘已完整生成，当前回合属于先手队伍。
pub fn create_game<R, S>(
    id: GameId,
    words: &[S],
    created_by: Option<PlayerId>,
    settings: GameSettings,
    now: Timestamp,
    rng: &mut R,
) -> Result<GameState>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let (cards, starting_team) = generate_board(words, rng)?;

    info!("游戏 {} 已创建，先手队伍: {}，词库: {:?}", id, starting_team, settings.word_source);
    Ok(GameState {
        id,
        created_at: now,
        created_by,
        started_at: None,
        phase: GamePhase::Waiting,
        current_team: starting_team,
        starting_team,
        cards,
        players: Default::default(),
        teams: Teams::for_starting_team(starting_team),
        winner: None,
        round: 1,
        clues: Vec::new(),
        history: Vec::new(),
        settings,
    })
}

/// 开始游戏
///
/// 两队都必须有一名队长和至少一名队员。
pub fn start_game(state: &GameState, now: Timestamp) -> Result<GameState> {
    if state.phase != GamePhase::Waiting {
        return Err(GameError::GameAlreadyStarted);
    }
    if let Some(team) = Team::ALL.into_iter().find(|t| !state.teams[*t].is_complete()) {
        return Err(GameError::TeamIncomplete { team });
    }

    let mut next = state.clone();
    next.phase = GamePhase::InProgress;
    next.started_at = Some(now);
    next.current_team = state.starting_team;
    next.history.push(GameEvent::GameStarted {
        starting_team: state.starting_team,
        timestamp: now,
    });

    info!("游戏 {} 开始，{} 队先手", state.id, state.starting_team);
    Ok(next)
}

/// 检查玩家是否能在当前回合行动，返回其队伍和角色
fn acting_player(state: &GameState, player_id: &PlayerId) -> Result<(Team, Option<Role>)> {
    let player = state.player(player_id).ok_or(GameError::PlayerNotFound { player_id: *player_id })?;
    if !state.is_active() {
        return Err(GameError::GameNotActive);
    }
    match player.team {
        Some(team) if team == state.current_team => Ok((team, player.role)),
        _ => Err(GameError::NotYourTurn),
    }
}

/// 队长给出线索
///
/// 线索只追加到历史中，不改变回合和阶段。
pub fn give_clue<R: Rng + ?Sized>(
    state: &GameState,
    player_id: PlayerId,
    text: &str,
    count: i32,
    now: Timestamp,
    rng: &mut R,
) -> Result<GameState> {
    let (team, role) = acting_player(state, &player_id)?;
    if role != Some(Role::Spymaster) {
        return Err(GameError::WrongRole);
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(GameError::EmptyClue);
    }
    if !(0..=MAX_CLUE_COUNT).contains(&count) {
        return Err(GameError::CountOutOfRange { count });
    }

    let count = count as u8;
    let clue = Clue {
        id: new_id(rng),
        text: text.to_uppercase(),
        count,
        team,
        round: state.round,
        spymaster: player_id,
        timestamp: now,
        guesses_remaining: count + 1, // 额外多一次猜测机会
    };

    let mut next = state.clone();
    next.history.push(GameEvent::ClueGiven {
        player_id,
        team,
        clue: clue.text.clone(),
        count,
        timestamp: now,
    });
    debug!("{} 队给出线索 {} ({})", team, clue.text, count);
    next.clues.push(clue);
    Ok(next)
}

/// 结束当前队伍的回合。队伍中任何角色都可以结束回合。
pub fn end_turn(state: &GameState, player_id: PlayerId, now: Timestamp) -> Result<GameState> {
    let (team, _) = acting_player(state, &player_id)?;

    let mut next = state.clone();
    next.current_team = team.other();
    next.history.push(GameEvent::TurnEnded {
        player_id,
        team,
        timestamp: now,
    });

    debug!("{} 队结束回合", team);
    Ok(next)
}

/// 翻开一张卡牌并结算其效果
///
/// - 己方颜色：己方进度 +1，回合继续。
/// - 对方颜色：对方进度 +1，回合结束。
/// - 中立：回合结束。
/// - 刺客：游戏立即结束，对方获胜。
///
/// 非刺客牌翻开后按先红后蓝的顺序检查是否有队伍翻完了全部己方卡牌。
pub fn reveal(state: &GameState, card_id: CardId, player_id: PlayerId, now: Timestamp) -> Result<(GameState, RevealOutcome)> {
    let idx = state
        .cards
        .iter()
        .position(|c| c.id == card_id)
        .ok_or(GameError::CardNotFound { card_id })?;
    if state.cards[idx].revealed {
        return Err(GameError::AlreadyRevealed { card_id });
    }
    if !state.is_active() {
        return Err(GameError::GameNotActive);
    }
    let (team, role) = acting_player(state, &player_id)?;
    if role != Some(Role::Operative) {
        return Err(GameError::WrongRole);
    }

    let mut next = state.clone();
    let card_type = {
        let card = &mut next.cards[idx];
        card.revealed = true;
        card.revealed_by = Some(player_id);
        card.revealed_at = Some(now);
        card.card_type
    };
    next.history.push(GameEvent::CardRevealed {
        card_id,
        player_id,
        team,
        card_type,
        timestamp: now,
    });

    let mut continues_turn = false;
    if card_type == CardType::Assassin {
        finish(&mut next, team.other());
    } else {
        if let Some(owner) = card_type.team() {
            next.teams[owner].cards_revealed += 1;
            continues_turn = owner == team;
        }
        if let Some(winner) = Team::ALL.into_iter().find(|t| next.teams[*t].has_won()) {
            finish(&mut next, winner);
        }
    }

    let game_ended = next.phase == GamePhase::Finished;
    if !continues_turn && !game_ended {
        next.current_team = team.other();
    }

    debug!("{} 队翻开了 {} ({})", team, next.cards[idx].word, card_type);
    let outcome = RevealOutcome {
        card_id,
        card_type,
        continues_turn,
        game_ended,
        winner: next.winner,
    };
    Ok((next, outcome))
}

fn finish(state: &mut GameState, winner: Team) {
    state.phase = GamePhase::Finished;
    state.winner = Some(winner);
    info!("游戏 {} 结束，{} 队获胜", state.id, winner);
}

/// 用新词语重开一局已结束的游戏
///
/// 重新生成棋盘和先手队伍，清空双方阵容和进度，回到等待阶段并进入下一轮。
/// 线索和日志保留，重开事件追加在日志末尾。玩家保留在房间中但不再属于任何队伍。
pub fn restart_game<R, S>(
    state: &GameState,
    words: &[S],
    word_source: WordSource,
    now: Timestamp,
    rng: &mut R,
) -> Result<GameState>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    if state.phase != GamePhase::Finished {
        return Err(GameError::GameNotFinished);
    }
    let (cards, starting_team) = generate_board(words, rng)?;

    let mut next = state.clone();
    next.cards = cards;
    next.starting_team = starting_team;
    next.current_team = starting_team;
    next.teams = Teams::for_starting_team(starting_team);
    next.phase = GamePhase::Waiting;
    next.winner = None;
    next.started_at = None;
    next.round += 1;
    next.history.push(GameEvent::GameRestarted {
        starting_team,
        timestamp: now,
    });
    next.settings.word_source = word_source;
    for player in next.players.values_mut() {
        player.team = None;
        player.role = None;
    }

    info!("游戏 {} 已重开（第 {} 轮），先手队伍: {}", state.id, next.round, starting_team);
    Ok(next)
}

// --- 单元测试 ---
