//! 内存中的游戏存储
//!
//! 每局游戏一条记录，带一个单调递增的版本号。写入必须带上读取时的版本，
//! 版本不一致说明期间有别的写入，此时拒绝并由调用方用新快照重试。

use codenames_core::{GameError, GameId, GamePhase, GameState, GameSummary, Version};
use dashmap::DashMap;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct StoredGame {
    pub version: Version,
    pub game: GameState,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("游戏 {game_id} 版本过期：期望 {expected}，实际 {actual}")]
    Stale { game_id: GameId, expected: Version, actual: Version },

    #[error("游戏 {game_id} 在 {attempts} 次尝试后仍然写入冲突")]
    Conflict { game_id: GameId, attempts: usize },
}

#[derive(Default)]
pub struct GameStore {
    games: DashMap<GameId, StoredGame>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存一局新游戏，返回初始版本
    pub fn insert(&self, game: GameState) -> Version {
        let version = 1;
        self.games.insert(game.id, StoredGame { version, game });
        version
    }

    /// 读取最新快照（克隆），不持有任何锁
    pub fn load(&self, game_id: &GameId) -> Result<StoredGame, GameError> {
        self.games
            .get(game_id)
            .map(|entry| entry.clone())
            .ok_or(GameError::GameNotFound { game_id: *game_id })
    }

    /// 条件写入：只有当前版本等于 `expected` 时才会覆盖
    pub fn save(&self, game_id: &GameId, expected: Version, game: GameState) -> Result<Version, StoreError> {
        let mut entry = self
            .games
            .get_mut(game_id)
            .ok_or(GameError::GameNotFound { game_id: *game_id })?;
        if entry.version != expected {
            return Err(StoreError::Stale {
                game_id: *game_id,
                expected,
                actual: entry.version,
            });
        }
        entry.version += 1;
        entry.game = game;
        Ok(entry.version)
    }

    pub fn remove(&self, game_id: &GameId) -> Option<StoredGame> {
        self.games.remove(game_id).map(|(_, stored)| stored)
    }

    /// 读取-计算-条件写入，版本冲突时用新快照重试，最多 `retries` 次。
    /// 成功时返回写入后的快照及其版本。
    pub fn update<T, F>(&self, game_id: &GameId, retries: usize, mut f: F) -> Result<(StoredGame, T), StoreError>
    where
        F: FnMut(&GameState) -> Result<(GameState, T), GameError>,
    {
        let attempts = retries + 1;
        for attempt in 1..=attempts {
            let current = self.load(game_id)?;
            let (next, output) = f(&current.game)?;
            match self.save(game_id, current.version, next.clone()) {
                Ok(version) => return Ok((StoredGame { version, game: next }, output)),
                Err(StoreError::Stale { expected, actual, .. }) => {
                    warn!("游戏 {} 写入冲突 (第 {} 次，版本 {} -> {})，重试", game_id, attempt, expected, actual);
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::Conflict { game_id: *game_id, attempts })
    }

    /// 等待中或进行中的游戏，按创建时间从新到旧
    pub fn active_games(&self, limit: usize) -> Vec<GameSummary> {
        let mut games: Vec<GameSummary> = self
            .games
            .iter()
            .filter(|entry| matches!(entry.game.phase, GamePhase::Waiting | GamePhase::InProgress))
            .map(|entry| entry.game.summary())
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        games.truncate(limit);
        games
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codenames_core::{create_game, set_online, GameSettings};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::Cell;
    use uuid::Uuid;

    fn game_at(created_at: u64) -> GameState {
        let words: Vec<String> = (0..25).map(|i| format!("w{}", i)).collect();
        let mut rng = StdRng::seed_from_u64(created_at);
        create_game(Uuid::new_v4(), &words, None, GameSettings::default(), created_at, &mut rng).unwrap()
    }

    #[test]
    fn test_load_missing_game() {
        let store = GameStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.load(&id).unwrap_err(), GameError::GameNotFound { game_id: id });
    }

    #[test]
    fn test_stale_save_rejected() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        let version = store.insert(game.clone());

        assert_eq!(store.save(&id, version, game.clone()).unwrap(), 2);
        let err = store.save(&id, version, game).unwrap_err();
        assert!(matches!(err, StoreError::Stale { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_update_retries_with_fresh_snapshot() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        store.insert(game);

        let calls = Cell::new(0);
        let (updated, seen_version) = store
            .update(&id, 3, |g| {
                calls.set(calls.get() + 1);
                let seen = store.load(&id)?.version;
                if calls.get() == 1 {
                    // 模拟另一个客户端抢先写入
                    let stored = store.load(&id)?;
                    store.save(&id, stored.version, stored.game).map_err(|_| GameError::GameNotFound { game_id: id })?;
                }
                Ok((g.clone(), seen))
            })
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(seen_version, 2);
        assert_eq!(updated.game.id, id);
        assert_eq!(updated.version, 3);
        assert_eq!(store.load(&id).unwrap().version, 3);
    }

    #[test]
    fn test_update_gives_up_after_retries() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        store.insert(game);

        let err = store
            .update(&id, 1, |g| {
                let stored = store.load(&id)?;
                store.save(&id, stored.version, stored.game).map_err(|_| GameError::GameNotFound { game_id: id })?;
                Ok((g.clone(), ()))
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { attempts: 2, .. }));
    }

    #[test]
    fn test_update_surfaces_engine_error_without_writing() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        store.insert(game);

        let err = store
            .update(&id, 3, |_| -> Result<(GameState, ()), GameError> { Err(GameError::GameNotActive) })
            .unwrap_err();
        assert!(matches!(err, StoreError::Game(GameError::GameNotActive)));
        assert_eq!(store.load(&id).unwrap().version, 1);
    }

    #[test]
    fn test_active_games_sorted_and_filtered() {
        let store = GameStore::new();
        let old = game_at(10);
        let new = game_at(20);
        let mut finished = game_at(30);
        finished.phase = GamePhase::Finished;
        let (old_id, new_id) = (old.id, new.id);
        store.insert(old);
        store.insert(new);
        store.insert(finished);

        let games = store.active_games(10);
        assert_eq!(games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![new_id, old_id]);
        assert_eq!(store.active_games(1).len(), 1);
    }

    #[test]
    fn test_update_applies_engine_op() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        store.insert(game);

        let player = Uuid::new_v4();
        let (updated, _) = store.update(&id, 0, |g| Ok((set_online(g, &player, false), ()))).unwrap();
        assert_eq!(store.load(&id).unwrap().game, updated.game);
        assert_eq!(store.load(&id).unwrap().version, 2);
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_update_versions_strictly_increase() {
        let store = GameStore::new();
        let game = game_at(0);
        let id = game.id;
        let mut last = store.insert(game);

        for _ in 0..5 {
            let (stored, _) = store.update(&id, 0, |g| Ok((g.clone(), ()))).unwrap();
            assert!(stored.version > last);
            last = stored.version;
        }
        assert_eq!(last, 6);
    }
}
