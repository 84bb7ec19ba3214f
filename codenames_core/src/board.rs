use crate::error::{GameError, Result};
use crate::state::{new_id, CardId, PlayerId, Timestamp};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

// --- 核心数据结构定义 ---

/// 棋盘上的卡牌总数
pub const BOARD_SIZE: usize = 25;
/// 先手队伍拥有的卡牌数
pub const STARTING_TEAM_CARDS: usize = 9;
/// 后手队伍拥有的卡牌数
pub const OTHER_TEAM_CARDS: usize = 8;
pub const NEUTRAL_CARDS: usize = 7;
pub const ASSASSIN_CARDS: usize = 1;

/// 队伍颜色
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// 对手队伍
    pub fn other(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// 胜负判定时的检查顺序：先红后蓝
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];
}

/// 卡牌归属
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Red,
    Blue,
    Neutral,
    /// 刺客牌，翻开即输
    Assassin,
}

impl CardType {
    /// 队伍颜色对应的卡牌类型
    pub fn of_team(team: Team) -> CardType {
        match team {
            Team::Red => CardType::Red,
            Team::Blue => CardType::Blue,
        }
    }

    /// 卡牌所属的队伍，中立牌和刺客牌返回 None
    pub fn team(self) -> Option<Team> {
        match self {
            CardType::Red => Some(Team::Red),
            CardType::Blue => Some(Team::Blue),
            CardType::Neutral | CardType::Assassin => None,
        }
    }
}

/// 棋盘上的单张卡牌
///
/// 创建之后只有 `revealed: false -> true` 这一个单向变化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub word: String, // 大写
    pub card_type: CardType,
    pub revealed: bool,
    pub revealed_by: Option<PlayerId>,
    pub revealed_at: Option<Timestamp>,
    pub position: u8, // 0..25，与输入词语顺序一致
}

// --- 实现辅助功能 ---

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Team::Red => "红",
            Team::Blue => "蓝",
        })
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            CardType::Red => "红队",
            CardType::Blue => "蓝队",
            CardType::Neutral => "中立",
            CardType::Assassin => "刺客",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.revealed {
            write!(f, "{}[{}]", self.word, self.card_type)
        } else {
            write!(f, "{}", self.word)
        }
    }
}

// --- 随机棋盘生成 ---

/// 生成 25 张卡牌的类型袋：先手 9 张，后手 8 张，中立 7 张，刺客 1 张
fn create_type_bag(starting_team: Team) -> Vec<CardType> {
    let mut bag = Vec::with_capacity(BOARD_SIZE);
    bag.extend(std::iter::repeat_n(CardType::of_team(starting_team), STARTING_TEAM_CARDS));
    bag.extend(std::iter::repeat_n(CardType::of_team(starting_team.other()), OTHER_TEAM_CARDS));
    bag.extend(std::iter::repeat_n(CardType::Neutral, NEUTRAL_CARDS));
    bag.extend(std::iter::repeat_n(CardType::Assassin, ASSASSIN_CARDS));
    bag
}

/// 根据 25 个词语生成棋盘，并随机决定先手队伍
///
/// 词语的顺序即卡牌的 `position`，被打乱的只是类型分配。
pub fn generate_board<R, S>(words: &[S], rng: &mut R) -> Result<(Vec<Card>, Team)>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    if words.len() != BOARD_SIZE {
        return Err(GameError::InvalidWordCount { actual: words.len() });
    }

    let starting_team = if rng.random_bool(0.5) { Team::Red } else { Team::Blue };
    let mut bag = create_type_bag(starting_team);
    bag.shuffle(rng);

    let cards: Vec<Card> = words
        .iter()
        .zip(bag)
        .enumerate()
        .map(|(position, (word, card_type))| Card {
            id: new_id(rng),
            word: word.as_ref().to_uppercase(),
            card_type,
            revealed: false,
            revealed_by: None,
            revealed_at: None,
            position: position as u8,
        })
        .collect();

    let report = validate_distribution(&cards, starting_team);
    debug!("棋盘已生成，先手: {}，分布: {:?}", starting_team, report.counts);
    if !report.is_valid {
        warn!("卡牌分布异常: {:?}", report);
    }

    Ok((cards, starting_team))
}

/// 各类型卡牌的数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub red: usize,
    pub blue: usize,
    pub neutral: usize,
    pub assassin: usize,
}

impl TypeCounts {
    pub fn of_team(&self, team: Team) -> usize {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub counts: TypeCounts,
    pub starting_team: Team,
    pub is_valid: bool,
}

/// 统计卡牌类型分布，并检查是否符合 9/8/7/1 的规则
pub fn validate_distribution(cards: &[Card], starting_team: Team) -> DistributionReport {
    let mut counts = TypeCounts::default();
    for card in cards {
        match card.card_type {
            CardType::Red => counts.red += 1,
            CardType::Blue => counts.blue += 1,
            CardType::Neutral => counts.neutral += 1,
            CardType::Assassin => counts.assassin += 1,
        }
    }

    let is_valid = cards.len() == BOARD_SIZE
        && counts.of_team(starting_team) == STARTING_TEAM_CARDS
        && counts.of_team(starting_team.other()) == OTHER_TEAM_CARDS
        && counts.neutral == NEUTRAL_CARDS
        && counts.assassin == ASSASSIN_CARDS;

    DistributionReport { counts, starting_team, is_valid }
}

// --- 单元测试 ---
