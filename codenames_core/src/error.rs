//! 游戏引擎的错误类型
//!
//! 每一种可预期的非法输入都对应一个变体，调用方可以据此决定是重试（例如刷新快照后）
//! 还是直接展示给用户。引擎内部不做任何重试。

use crate::board::Team;
use crate::state::{CardId, GameId, PlayerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameError {
    #[error("需要恰好 25 个词语，实际收到 {actual} 个")]
    InvalidWordCount { actual: usize },

    #[error("玩家不存在: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("玩家 ID {player_id} 已被 \"{existing}\" 使用")]
    PlayerIdentityConflict { player_id: PlayerId, existing: String },

    #[error("房间已满（最多 {max_players} 人）")]
    GameFull { max_players: usize },

    #[error("{team} 队的队长位置已被占用")]
    CallerSlotOccupied { team: Team, holder: PlayerId },

    #[error("{team} 队需要一名队长和至少一名队员")]
    TeamIncomplete { team: Team },

    #[error("游戏已经开始")]
    GameAlreadyStarted,

    #[error("游戏未在进行中")]
    GameNotActive,

    #[error("只能重开已结束的游戏")]
    GameNotFinished,

    #[error("还没轮到你的队伍")]
    NotYourTurn,

    #[error("当前角色不能执行该操作")]
    WrongRole,

    #[error("线索不能为空")]
    EmptyClue,

    #[error("线索数量必须在 0 到 9 之间，实际为 {count}")]
    CountOutOfRange { count: i32 },

    #[error("卡牌不存在: {card_id}")]
    CardNotFound { card_id: CardId },

    #[error("卡牌已被翻开")]
    AlreadyRevealed { card_id: CardId },

    #[error("只有房间创建者可以执行该操作")]
    NotGameCreator,

    /// 由存储层抛出，引擎本身不会产生
    #[error("游戏不存在: {game_id}")]
    GameNotFound { game_id: GameId },
}

pub type Result<T> = std::result::Result<T, GameError>;
