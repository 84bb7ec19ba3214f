//! # 猜词游戏核心逻辑库
//!
//! 这个 `core` crate 包含了游戏的全部规则：棋盘生成、玩家分队、
//! 回合与线索、翻牌结算、胜负判定，以及客户端-服务器通信消息的定义。
//! 所有操作都是纯函数：接收一个快照，返回新快照或类型化的错误，不做任何 I/O。
//! 它的设计目标是与具体实现（如网络服务器、客户端UI）解耦，
//! 使其可以被任何上层应用复用。

mod board;
mod error;
mod logic;
mod message;
mod roster;
mod state;
pub mod words;

pub use board::*;

pub use error::*;

pub use logic::*;

pub use message::*;

pub use roster::*;

pub use state::*;
