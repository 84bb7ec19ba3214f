use crate::board::Team;
use crate::error::GameError;
use crate::logic::RevealOutcome;
use crate::state::{CardId, GameId, GameSummary, GameView, PlayerId, Role, Version};
use serde::{Deserialize, Serialize};

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ClientMessage {
    // --- 房间管理消息 ---
    /// 创建新游戏，创建者自动加入。`words` 为空时使用内置词库。
    CreateGame {
        name: String,
        player_id: Option<PlayerId>,
        words: Option<Vec<String>>,
    },
    /// 加入已存在的游戏。带上之前的 `player_id` 可以恢复会话。
    JoinGame {
        game_id: GameId,
        name: String,
        player_id: Option<PlayerId>,
    },
    /// 查询等待中和进行中的游戏
    ListGames { limit: usize },

    // --- 游戏内消息 ---
    /// 选择队伍和角色
    AssignTeam { team: Team, role: Role },
    /// 离开游戏
    LeaveGame,
    StartGame,
    /// 队长给出线索
    GiveClue { clue: String, count: i32 },
    EndTurn,
    /// 队员翻开一张牌
    RevealCard { card_id: CardId },
    /// 用新词语重开已结束的游戏
    RestartGame { words: Option<Vec<String>> },
    /// 清空所有玩家（仅创建者）
    ResetPlayers,
    /// 删除游戏（仅创建者）
    DeleteGame,
}

// --- 服务器 -> 客户端 的消息 ---
// 这些是服务器在游戏状态改变后，推送给客户端的事件通知。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 成功加入或创建游戏后，服务器私密地发给该玩家
    GameJoined {
        your_id: PlayerId,
        version: Version,
        game: GameView,
    },
    /// 净化后的完整游戏快照，每个连接单独生成。
    /// 推送顺序不保证，客户端应丢弃版本低于已收到快照的更新。
    GameUpdated {
        version: Version,
        game: GameView,
    },
    /// 翻牌结果，一次性的通知
    CardRevealed {
        player_id: PlayerId,
        outcome: RevealOutcome,
    },
    GameList { games: Vec<GameSummary> },
    PlayerLeft { player_id: PlayerId },
    GameDeleted { game_id: GameId },

    /// 引擎拒绝了该操作
    Rejected(GameError),
    Info { message: String },
    Error { message: String },
}

impl From<GameError> for ServerMessage {
    fn from(error: GameError) -> Self {
        ServerMessage::Rejected(error)
    }
}
