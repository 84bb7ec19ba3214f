//! 服务层：把客户端请求翻译成 “读取快照 -> 引擎函数 -> 条件写入”。
//!
//! 这里的函数都是同步的，不跨越 await，随机数生成器也只在函数内部短暂存在。

use crate::store::{GameStore, StoreError, StoredGame};
use codenames_core::words::{balanced_words, normalize_words};
use codenames_core::{
    add_player, assign_team, create_game, end_turn, give_clue, remove_player, reset_roster, restart_game,
    reveal, set_online, start_game, CardId, GameError, GameId, GameSettings, GameState, GameSummary, PlayerId,
    RevealOutcome, Role, Team, Timestamp, WordSource, BOARD_SIZE,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// 游戏内的操作
#[derive(Debug, Clone)]
pub enum Action {
    AssignTeam { team: Team, role: Role },
    Start,
    GiveClue { clue: String, count: i32 },
    EndTurn,
    Reveal { card_id: CardId },
    Restart { words: Option<Vec<String>> },
    ResetPlayers,
}

/// 客户端提供词表时先清洗，否则从内置词库中均衡抽取
fn prepare_words(words: Option<Vec<String>>) -> (Vec<String>, WordSource) {
    match words {
        Some(raw) => (normalize_words(raw), WordSource::Custom),
        None => (balanced_words(BOARD_SIZE, &mut rand::rng()), WordSource::Curated),
    }
}

fn require_creator(game: &GameState, player_id: &PlayerId) -> Result<(), GameError> {
    if game.created_by == Some(*player_id) {
        Ok(())
    } else {
        Err(GameError::NotGameCreator)
    }
}

pub struct GameService {
    store: GameStore,
    max_players: usize,
    write_retries: usize,
}

impl GameService {
    pub fn new(max_players: usize, write_retries: usize) -> Self {
        GameService {
            store: GameStore::new(),
            max_players,
            write_retries,
        }
    }

    /// 创建游戏，创建者自动加入
    pub fn create_game(
        &self,
        name: &str,
        player_id: PlayerId,
        words: Option<Vec<String>>,
        now: Timestamp,
    ) -> Result<StoredGame, StoreError> {
        let (words, word_source) = prepare_words(words);
        let settings = GameSettings {
            max_players: self.max_players,
            word_source,
            ..GameSettings::default()
        };
        let game = create_game(Uuid::new_v4(), &words, Some(player_id), settings, now, &mut rand::rng())?;
        let game = add_player(&game, player_id, name, None, now)?;
        let version = self.store.insert(game.clone());
        Ok(StoredGame { version, game })
    }

    /// 加入游戏。已在名单中且名字一致的玩家视为断线重连，只恢复在线状态并保留原来的队伍和角色。
    pub fn join_game(&self, game_id: &GameId, player_id: PlayerId, name: &str, now: Timestamp) -> Result<StoredGame, StoreError> {
        let (stored, _) = self.store.update(game_id, self.write_retries, |g| {
            let next = match g.player(&player_id) {
                Some(existing) if existing.name == name => {
                    debug!("玩家 {} 重新连接到游戏 {}", player_id, game_id);
                    set_online(g, &player_id, true)
                }
                _ => add_player(g, player_id, name, None, now)?,
            };
            Ok((next, ()))
        })?;
        Ok(stored)
    }

    pub fn list_games(&self, limit: usize) -> Vec<GameSummary> {
        self.store.active_games(limit)
    }

    pub fn set_online(&self, game_id: &GameId, player_id: &PlayerId, online: bool) -> Result<StoredGame, StoreError> {
        let (stored, _) = self
            .store
            .update(game_id, self.write_retries, |g| Ok((set_online(g, player_id, online), ())))?;
        Ok(stored)
    }

    pub fn leave_game(&self, game_id: &GameId, player_id: &PlayerId) -> Result<StoredGame, StoreError> {
        let (stored, _) = self
            .store
            .update(game_id, self.write_retries, |g| Ok((remove_player(g, player_id), ())))?;
        Ok(stored)
    }

    /// 删除游戏，仅创建者可以执行
    pub fn delete_game(&self, game_id: &GameId, player_id: &PlayerId) -> Result<(), StoreError> {
        let stored = self.store.load(game_id)?;
        require_creator(&stored.game, player_id)?;
        self.store.remove(game_id);
        info!("游戏 {} 已被 {} 删除", game_id, player_id);
        Ok(())
    }

    /// 执行一个游戏内操作，翻牌时额外返回结算结果
    pub fn apply(
        &self,
        game_id: &GameId,
        player_id: PlayerId,
        action: Action,
        now: Timestamp,
    ) -> Result<(StoredGame, Option<RevealOutcome>), StoreError> {
        debug!("玩家 {} 在游戏 {} 中执行 {:?}", player_id, game_id, action);
        self.store.update(game_id, self.write_retries, |g| match &action {
            Action::AssignTeam { team, role } => Ok((assign_team(g, player_id, *team, *role)?, None)),
            Action::Start => Ok((start_game(g, now)?, None)),
            Action::GiveClue { clue, count } => {
                Ok((give_clue(g, player_id, clue, *count, now, &mut rand::rng())?, None))
            }
            Action::EndTurn => Ok((end_turn(g, player_id, now)?, None)),
            Action::Reveal { card_id } => {
                let (next, outcome) = reveal(g, *card_id, player_id, now)?;
                Ok((next, Some(outcome)))
            }
            Action::Restart { words } => {
                let (words, source) = prepare_words(words.clone());
                Ok((restart_game(g, &words, source, now, &mut rand::rng())?, None))
            }
            Action::ResetPlayers => {
                require_creator(g, &player_id)?;
                Ok((reset_roster(g), None))
            }
        })
    }
}
