//! 内置足球主题词库
//!
//! 游戏引擎只要求 25 个词语，这里提供一个按类别均衡抽取的默认来源，
//! 以及对外部生成词表的清洗。

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 单个词语的最大长度（按字符计）
pub const MAX_WORD_LEN: usize = 20;

pub struct Category {
    pub name: &'static str,
    pub words: &'static [&'static str],
}

pub const CATEGORIES: &[Category] = &[
    Category {
        name: "players",
        words: &[
            "MESSI", "RONALDO", "NEYMAR", "MBAPPE", "HAALAND", "MODRIC", "SALAH", "KANE",
            "PELE", "MARADONA", "CRUYFF", "ZIDANE", "HENRY", "PIRLO", "MALDINI", "BUFFON",
        ],
    },
    Category {
        name: "nations",
        words: &[
            "BRAZIL", "ARGENTINA", "FRANCE", "SPAIN", "ENGLAND", "GERMANY", "ITALY", "PORTUGAL",
            "NETHERLANDS", "CROATIA", "MOROCCO", "URUGUAY", "JAPAN", "SENEGAL", "GHANA", "MEXICO",
        ],
    },
    Category {
        name: "stadiums",
        words: &[
            "WEMBLEY", "CAMP NOU", "BERNABEU", "OLD TRAFFORD", "ANFIELD", "SAN SIRO", "MARACANA",
            "BOMBONERA", "AZTECA", "ALLIANZ ARENA", "CELTIC PARK", "DE KUIP",
        ],
    },
    Category {
        name: "competitions",
        words: &[
            "PREMIER LEAGUE", "LA LIGA", "SERIE A", "BUNDESLIGA", "LIGUE 1", "CHAMPIONS LEAGUE",
            "WORLD CUP", "EUROS", "COPA AMERICA", "FA CUP", "EREDIVISIE", "MLS",
        ],
    },
    Category {
        name: "clubs",
        words: &[
            "REAL MADRID", "BARCELONA", "LIVERPOOL", "ARSENAL", "CHELSEA", "JUVENTUS", "AC MILAN",
            "NAPOLI", "AJAX", "PORTO", "BENFICA", "PSG", "BAYERN MUNICH", "SEVILLA",
        ],
    },
    Category {
        name: "trophies",
        words: &[
            "BALLON DOR", "GOLDEN BOOT", "GOLDEN BALL", "GOLDEN GLOVE", "PUSKAS AWARD",
            "FAIR PLAY AWARD", "COACH AWARD", "YOUNG PLAYER AWARD",
        ],
    },
    Category {
        name: "positions",
        words: &[
            "GOALKEEPER", "DEFENDER", "MIDFIELDER", "STRIKER", "WINGER", "FULLBACK", "SWEEPER",
            "LIBERO", "PLAYMAKER", "REGISTA", "FALSE NINE", "CAPTAIN",
        ],
    },
    Category {
        name: "terms",
        words: &[
            "GOAL", "ASSIST", "TACKLE", "VOLLEY", "HEADER", "PENALTY", "CORNER", "OFFSIDE",
            "RED CARD", "NUTMEG", "RABONA", "PANENKA", "HAT TRICK", "CLEAN SHEET", "TIKI TAKA",
        ],
    },
];

/// 所有类别的词语
pub fn all_words() -> Vec<&'static str> {
    CATEGORIES.iter().flat_map(|c| c.words.iter().copied()).collect()
}

/// 从每个类别均匀抽取词语，余数分给排在前面的类别，最后整体打乱
pub fn balanced_words<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<String> {
    let per_category = count / CATEGORIES.len();
    let remainder = count % CATEGORIES.len();

    let mut selected: Vec<String> = CATEGORIES
        .iter()
        .enumerate()
        .flat_map(|(i, category)| {
            let take = per_category + usize::from(i < remainder);
            category
                .words
                .choose_multiple(rng, take)
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    selected.shuffle(rng);
    selected
}

/// 清洗外部词表：去空白、转大写、丢弃空串和过长的词，并按首次出现去重
pub fn normalize_words<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|w| w.as_ref().trim().to_uppercase())
        .filter(|w| !w.is_empty() && w.chars().count() <= MAX_WORD_LEN)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListReport {
    pub total: usize,
    pub unique: usize,
    pub duplicates: Vec<String>,
}

impl WordListReport {
    pub fn is_valid(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// 统计词表中的重复项
pub fn validate_word_list<S: AsRef<str>>(words: &[S]) -> WordListReport {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for word in words {
        let word = word.as_ref();
        if !seen.insert(word) {
            duplicates.push(word.to_string());
        }
    }
    WordListReport {
        total: words.len(),
        unique: seen.len(),
        duplicates,
    }
}
