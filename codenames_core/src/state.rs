use crate::board::{Card, CardType, Team};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};
use uuid::Uuid;

pub type GameId = Uuid;
pub type PlayerId = Uuid;
pub type CardId = Uuid;
pub type ClueId = Uuid;
/// 毫秒级 Unix 时间戳，由调用方注入
pub type Timestamp = u64;
/// 持久化层为每次成功写入分配的单调递增版本号
pub type Version = u64;

/// 从注入的随机源生成 v4 UUID，保证测试中的可复现性
pub(crate) fn new_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}

/// 一局游戏的完整快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub id: GameId,
    pub created_at: Timestamp,
    pub created_by: Option<PlayerId>,
    pub started_at: Option<Timestamp>,

    pub phase: GamePhase,
    pub current_team: Team,
    pub starting_team: Team,
    pub cards: Vec<Card>, // 恒为 25 张，按 position 排列
    pub players: HashMap<PlayerId, Player>,
    pub teams: Teams,
    pub winner: Option<Team>,
    /// 当前轮次，从 1 开始，每次重开加一
    pub round: u32,
    // 以下两个列表只追加，不删除
    pub clues: Vec<Clue>,
    pub history: Vec<GameEvent>,
    pub settings: GameSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Waiting,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 队长：能看到所有卡牌归属，负责给线索
    Spymaster,
    /// 队员：根据线索翻牌
    Operative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: Option<Team>,
    pub role: Option<Role>, // 只有 team 不为空时才有意义
    pub is_online: bool,
    pub joined_at: Timestamp,
}

impl Player {
    pub fn assignment(&self) -> Option<(Team, Role)> {
        self.team.zip(self.role)
    }
}

/// 单个队伍的阵容与进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    pub spymaster: Option<PlayerId>,
    pub operatives: HashSet<PlayerId>,
    pub cards_revealed: usize,
    pub cards_total: usize, // 8 或 9，生成棋盘时确定
}

impl TeamState {
    pub fn new(cards_total: usize) -> Self {
        TeamState {
            spymaster: None,
            operatives: HashSet::new(),
            cards_revealed: 0,
            cards_total,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.spymaster.is_some() && !self.operatives.is_empty()
    }

    pub fn has_won(&self) -> bool {
        self.cards_revealed >= self.cards_total
    }

    /// 翻开进度的百分比
    pub fn progress(&self) -> f64 {
        if self.cards_total == 0 {
            return 0.0;
        }
        self.cards_revealed as f64 / self.cards_total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teams {
    pub red: TeamState,
    pub blue: TeamState,
}

impl Teams {
    /// 先手队伍拥有 9 张牌，另一队 8 张
    pub fn for_starting_team(starting_team: Team) -> Self {
        use crate::board::{OTHER_TEAM_CARDS, STARTING_TEAM_CARDS};
        let total = |team: Team| if team == starting_team { STARTING_TEAM_CARDS } else { OTHER_TEAM_CARDS };
        Teams {
            red: TeamState::new(total(Team::Red)),
            blue: TeamState::new(total(Team::Blue)),
        }
    }
}

impl Index<Team> for Teams {
    type Output = TeamState;

    fn index(&self, team: Team) -> &TeamState {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
}

impl IndexMut<Team> for Teams {
    fn index_mut(&mut self, team: Team) -> &mut TeamState {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }
}

/// 队长给出的一条线索
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub id: ClueId,
    pub text: String, // 去除首尾空白并转为大写
    pub count: u8,
    pub team: Team,
    pub spymaster: PlayerId,
    pub round: u32,
    pub timestamp: Timestamp,
    pub guesses_remaining: u8, // count + 1
}

/// 游戏事件日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        starting_team: Team,
        timestamp: Timestamp,
    },
    ClueGiven {
        player_id: PlayerId,
        team: Team,
        clue: String,
        count: u8,
        timestamp: Timestamp,
    },
    CardRevealed {
        card_id: CardId,
        player_id: PlayerId,
        team: Team,
        card_type: CardType,
        timestamp: Timestamp,
    },
    TurnEnded {
        player_id: PlayerId,
        team: Team,
        timestamp: Timestamp,
    },
    GameRestarted {
        starting_team: Team,
        timestamp: Timestamp,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WordSource {
    /// 内置词库
    Curated,
    /// 由客户端提供，经过清洗
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub max_players: usize,
    pub time_limit_secs: Option<u32>, // 暂未使用
    pub word_source: WordSource,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            max_players: 8,
            time_limit_secs: None,
            word_source: WordSource::Curated,
        }
    }
}

// --- 面向单个玩家的只读视图 ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProgress {
    pub cards_revealed: usize,
    pub cards_total: usize,
    pub progress: f64,
}

/// 从某个玩家的视角推导出的游戏状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatus {
    pub phase: GamePhase,
    pub current_team: Team,
    pub is_your_turn: bool,
    pub can_reveal_cards: bool,
    pub can_give_clues: bool,
    pub is_spymaster: bool,
    pub winner: Option<Team>,
    pub red: TeamProgress,
    pub blue: TeamProgress,
    pub last_clue: Option<Clue>,
}

/// 发给客户端的卡牌，未翻开的牌可能隐藏归属
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub word: String,
    pub position: u8,
    pub revealed: bool,
    pub revealed_by: Option<PlayerId>,
    pub card_type: Option<CardType>,
}

/// 净化后的游戏快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub id: GameId,
    pub created_by: Option<PlayerId>,
    pub phase: GamePhase,
    pub current_team: Team,
    pub starting_team: Team,
    pub cards: Vec<CardView>,
    pub players: HashMap<PlayerId, Player>,
    pub teams: Teams,
    pub winner: Option<Team>,
    pub round: u32,
    pub clues: Vec<Clue>,
    pub history: Vec<GameEvent>,
    pub settings: GameSettings,
    pub status: GameStatus,
}

/// 大厅列表中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: GameId,
    pub phase: GamePhase,
    pub player_count: usize,
    pub max_players: usize,
    pub created_at: Timestamp,
}

// --- GameState 的实现方法 ---

impl GameState {
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == *card_id)
    }

    /// 本轮最近的一条线索，之前轮次的线索只保留在历史中
    pub fn last_clue(&self) -> Option<&Clue> {
        self.clues.last().filter(|c| c.round == self.round)
    }

    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::InProgress
    }

    /// 推导某个玩家的状态。未知玩家按旁观者处理，所有能力标记为 false。
    pub fn status_for(&self, player_id: &PlayerId) -> GameStatus {
        let player = self.players.get(player_id);
        let assignment = player.and_then(Player::assignment);
        let is_your_turn = player.is_some_and(|p| p.team == Some(self.current_team));
        let has_role = |role: Role| assignment.is_some_and(|(_, r)| r == role);

        let progress = |team: Team| {
            let t = &self.teams[team];
            TeamProgress {
                cards_revealed: t.cards_revealed,
                cards_total: t.cards_total,
                progress: t.progress(),
            }
        };

        GameStatus {
            phase: self.phase,
            current_team: self.current_team,
            is_your_turn,
            can_reveal_cards: is_your_turn && has_role(Role::Operative),
            can_give_clues: is_your_turn && has_role(Role::Spymaster),
            is_spymaster: has_role(Role::Spymaster),
            winner: self.winner,
            red: progress(Team::Red),
            blue: progress(Team::Blue),
            last_clue: self.last_clue().cloned(),
        }
    }

    /// 为指定客户端生成净化后的快照。
    /// 队长和已结束的游戏可以看到全部归属，其他人只能看到已翻开的牌。
    pub fn for_client(&self, client_id: &PlayerId) -> GameView {
        let status = self.status_for(client_id);
        let show_all = status.is_spymaster || self.phase == GamePhase::Finished;

        let cards = self
            .cards
            .iter()
            .map(|card| CardView {
                id: card.id,
                word: card.word.clone(),
                position: card.position,
                revealed: card.revealed,
                revealed_by: card.revealed_by,
                card_type: (show_all || card.revealed).then_some(card.card_type),
            })
            .collect();

        GameView {
            id: self.id,
            created_by: self.created_by,
            phase: self.phase,
            current_team: self.current_team,
            starting_team: self.starting_team,
            cards,
            players: self.players.clone(),
            teams: self.teams.clone(),
            winner: self.winner,
            round: self.round,
            clues: self.clues.clone(),
            history: self.history.clone(),
            settings: self.settings.clone(),
            status,
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id,
            phase: self.phase,
            player_count: self.players.len(),
            max_players: self.settings.max_players,
            created_at: self.created_at,
        }
    }
}

// --- 单元测试 ---
