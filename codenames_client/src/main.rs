use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;
use uuid::Uuid;

use codenames_core::{CardType, ClientMessage, GameId, GameView, Role, ServerMessage, Team, Version, BOARD_SIZE};

#[derive(Parser, Debug)]
#[command(name = "codenames_client")]
#[command(about = "猜词游戏命令行客户端", long_about = None)]
struct Args {
    /// 服务器 WebSocket 地址
    #[arg(long, default_value = "ws://127.0.0.1:25917/ws")]
    url: Url,
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// 5x5 打印棋盘。未知归属的牌只显示词语
fn render_board(game: &GameView) {
    println!("--- 棋盘（{} 队回合，阶段 {:?}）---", game.current_team, game.phase);
    for row in game.cards.chunks(5) {
        let cells: Vec<String> = row
            .iter()
            .map(|card| {
                let mark = match card.card_type {
                    Some(CardType::Red) => "R",
                    Some(CardType::Blue) => "B",
                    Some(CardType::Neutral) => "N",
                    Some(CardType::Assassin) => "X",
                    None => "?",
                };
                let flag = if card.revealed { "*" } else { " " };
                format!("{:>2}{}{}:{:<12}", card.position, flag, mark, card.word)
            })
            .collect();
        println!("{}", cells.join(" "));
    }
    let status = &game.status;
    println!(
        "红队 {}/{}  蓝队 {}/{}",
        status.red.cards_revealed, status.red.cards_total, status.blue.cards_revealed, status.blue.cards_total
    );
    if let Some(clue) = &status.last_clue {
        println!("当前线索: {} {}（剩余 {} 次）", clue.text, clue.count, clue.guesses_remaining);
    }
    if let Some(winner) = status.winner {
        println!("游戏结束，{} 队获胜!", winner);
    }
}

/// 最近一次渲染的快照及其版本
#[derive(Default)]
struct Latest {
    version: Option<(GameId, Version)>,
    view: Option<GameView>,
}

impl Latest {
    /// 同一局游戏中版本更旧的快照会被丢弃，换了游戏则总是接受
    fn accept(&mut self, version: Version, game: GameView) -> Option<&GameView> {
        match self.version {
            Some((id, seen)) if id == game.id && version < seen => None,
            _ => {
                self.version = Some((game.id, version));
                self.view = Some(game);
                self.view.as_ref()
            }
        }
    }

    fn clear(&mut self) {
        self.version = None;
        self.view = None;
    }
}

fn parse_team(s: &str) -> Option<Team> {
    match s.to_lowercase().as_str() {
        "red" | "r" => Some(Team::Red),
        "blue" | "b" => Some(Team::Blue),
        _ => None,
    }
}

fn parse_role(s: &str) -> Option<Role> {
    match s.to_lowercase().as_str() {
        "spymaster" | "s" => Some(Role::Spymaster),
        "operative" | "o" => Some(Role::Operative),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 最近一次收到的快照，用于把棋盘位置换成卡牌 ID
    let latest: Arc<Mutex<Latest>> = Arc::new(Mutex::new(Latest::default()));
    let reader_latest = latest.clone();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::GameJoined { your_id, version, game }) => {
                        println!("\n<-- 已加入游戏 {}，你的 ID: {}", game.id, your_id);
                        if let Ok(mut latest) = reader_latest.lock() {
                            latest.clear();
                            if let Some(view) = latest.accept(version, game) {
                                render_board(view);
                            }
                        }
                        prompt();
                    }
                    Ok(ServerMessage::GameUpdated { version, game }) => {
                        if let Ok(mut latest) = reader_latest.lock() {
                            if let Some(view) = latest.accept(version, game) {
                                println!();
                                render_board(view);
                                prompt();
                            }
                        }
                    }
                    Ok(ServerMessage::GameDeleted { game_id }) => {
                        println!("\n<-- 游戏 {} 已被删除", game_id);
                        if let Ok(mut latest) = reader_latest.lock() {
                            latest.clear();
                        }
                        prompt();
                    }
                    Ok(server_msg) => {
                        // 其余消息直接打印
                        println!("\n<-- [服务器消息]:\n{:#?}\n", server_msg);
                        prompt();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 猜词游戏客户端 ---");
    println!("可用命令:");
    println!("  create <昵称>                   - 创建新游戏");
    println!("  join <游戏ID> <昵称> [玩家ID]   - 加入游戏，带上玩家ID和原昵称可断线重连并保留队伍");
    println!("  list                            - 查看可加入的游戏");
    println!("  assign <red|blue> <spymaster|operative> - 选择队伍和角色");
    println!("  start                           - 开始游戏");
    println!("  clue <词> <数量>                - 给出线索 (队长)");
    println!("  reveal <位置|卡牌ID>            - 翻牌 (队员)");
    println!("  end                             - 结束本队回合");
    println!("  restart                         - 重新开始已结束的游戏");
    println!("  reset                           - 清空所有玩家 (仅创建者)");
    println!("  leave                           - 离开游戏");
    println!("  delete                          - 删除游戏 (仅创建者)");
    println!("  exit                            - 退出");

    loop {
        prompt();

        let Some(line) = stdin.next_line().await? else { break };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts.first().copied();

        let client_msg = match command {
            Some("create") => {
                let name = parts.get(1).unwrap_or(&"新玩家").to_string();
                ClientMessage::CreateGame { name, player_id: None, words: None }
            }
            Some("join") => {
                let (Some(game_id), Some(name)) = (parts.get(1).and_then(|s| s.parse::<GameId>().ok()), parts.get(2))
                else {
                    println!("用法: join <游戏ID> <昵称> [玩家ID]");
                    continue;
                };
                let player_id = parts.get(3).and_then(|s| s.parse::<Uuid>().ok());
                ClientMessage::JoinGame { game_id, name: name.to_string(), player_id }
            }
            Some("list") => ClientMessage::ListGames { limit: 20 },
            Some("assign") => {
                let (Some(team), Some(role)) = (
                    parts.get(1).and_then(|s| parse_team(s)),
                    parts.get(2).and_then(|s| parse_role(s)),
                ) else {
                    println!("用法: assign <red|blue> <spymaster|operative>");
                    continue;
                };
                ClientMessage::AssignTeam { team, role }
            }
            Some("start") => ClientMessage::StartGame,
            Some("clue") => {
                let (Some(clue), Some(count)) = (parts.get(1), parts.get(2).and_then(|s| s.parse::<i32>().ok())) else {
                    println!("用法: clue <词> <数量>");
                    continue;
                };
                ClientMessage::GiveClue { clue: clue.to_string(), count }
            }
            Some("reveal") => {
                let Some(target) = parts.get(1) else {
                    println!("用法: reveal <位置|卡牌ID>");
                    continue;
                };
                let card_id = match target.parse::<usize>() {
                    Ok(position) if position < BOARD_SIZE => latest.lock().ok().and_then(|latest| {
                        latest
                            .view
                            .as_ref()
                            .and_then(|g| g.cards.iter().find(|c| usize::from(c.position) == position))
                            .map(|c| c.id)
                    }),
                    _ => target.parse::<Uuid>().ok(),
                };
                let Some(card_id) = card_id else {
                    println!("找不到这张牌: {}", target);
                    continue;
                };
                ClientMessage::RevealCard { card_id }
            }
            Some("end") => ClientMessage::EndTurn,
            Some("restart") => ClientMessage::RestartGame { words: None },
            Some("reset") => ClientMessage::ResetPlayers,
            Some("leave") => ClientMessage::LeaveGame,
            Some("delete") => ClientMessage::DeleteGame,
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            None => continue,
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codenames_core::{create_game, GameSettings};
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    fn view() -> GameView {
        let words: Vec<String> = (0..BOARD_SIZE).map(|i| format!("w{}", i)).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let game = create_game(Uuid::new_v4(), &words, None, GameSettings::default(), 0, &mut rng).unwrap();
        game.for_client(&Uuid::new_v4())
    }

    #[test]
    fn test_older_snapshot_is_dropped() {
        let mut latest = Latest::default();
        let game = view();

        assert!(latest.accept(3, game.clone()).is_some());
        assert!(latest.accept(2, game.clone()).is_none());
        assert_eq!(latest.version, Some((game.id, 3)));
        assert!(latest.accept(3, game.clone()).is_some());
        assert!(latest.accept(4, game).is_some());
    }

    #[test]
    fn test_other_game_always_accepted() {
        let mut latest = Latest::default();
        let first = view();
        let second = view();

        latest.accept(9, first);
        assert!(latest.accept(1, second.clone()).is_some());
        assert_eq!(latest.version, Some((second.id, 1)));

        latest.clear();
        assert!(latest.view.is_none());
    }
}
