//! 完整对局流程测试：从创建、分队、开局到结束和重开。

use codenames_core::{
    add_player, assign_team, create_game, end_turn, generate_board, give_clue, restart_game, reveal, start_game,
    validate_distribution, words, CardId, CardType, GameError, GamePhase, GameSettings, GameState, PlayerId, Role,
    Team, WordSource, BOARD_SIZE,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

struct Lobby {
    state: GameState,
    red_spymaster: PlayerId,
    red_operative: PlayerId,
    blue_spymaster: PlayerId,
    blue_operative: PlayerId,
}

impl Lobby {
    fn operative(&self, team: Team) -> PlayerId {
        match team {
            Team::Red => self.red_operative,
            Team::Blue => self.blue_operative,
        }
    }

    fn spymaster(&self, team: Team) -> PlayerId {
        match team {
            Team::Red => self.red_spymaster,
            Team::Blue => self.blue_spymaster,
        }
    }
}

fn board_words() -> Vec<String> {
    (0..BOARD_SIZE).map(|i| format!("word{}", i)).collect()
}

fn open_lobby(seed: u64) -> Lobby {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let creator = Uuid::new_v4();
    let state = create_game(Uuid::new_v4(), &board_words(), Some(creator), GameSettings::default(), 0, &mut rng).unwrap();
    let state = add_player(&state, creator, "creator", None, 0).unwrap();
    let state = assign_team(&state, creator, Team::Red, Role::Spymaster).unwrap();

    let red_operative = Uuid::new_v4();
    let blue_spymaster = Uuid::new_v4();
    let blue_operative = Uuid::new_v4();
    let state = add_player(&state, red_operative, "r-op", Some((Team::Red, Role::Operative)), 1).unwrap();
    let state = add_player(&state, blue_spymaster, "b-sm", Some((Team::Blue, Role::Spymaster)), 2).unwrap();
    let state = add_player(&state, blue_operative, "b-op", Some((Team::Blue, Role::Operative)), 3).unwrap();

    Lobby {
        state,
        red_spymaster: creator,
        red_operative,
        blue_spymaster,
        blue_operative,
    }
}

fn first_unrevealed(state: &GameState, card_type: CardType) -> CardId {
    state.cards.iter().find(|c| c.card_type == card_type && !c.revealed).unwrap().id
}

#[test]
fn scenario_assassin_reveal_hands_win_to_opponents() {
    let mut lobby = open_lobby(1);
    lobby.state = start_game(&lobby.state, 10).unwrap();
    // 确保红队行动
    if lobby.state.current_team == Team::Blue {
        lobby.state = end_turn(&lobby.state, lobby.blue_operative, 11).unwrap();
    }

    let assassin = first_unrevealed(&lobby.state, CardType::Assassin);
    let (state, outcome) = reveal(&lobby.state, assassin, lobby.red_operative, 12).unwrap();

    assert_eq!(outcome.card_type, CardType::Assassin);
    assert!(outcome.game_ended);
    assert_eq!(outcome.winner, Some(Team::Blue));
    assert_eq!(state.phase, GamePhase::Finished);
}

#[test]
fn scenario_team_completes_its_cards() {
    let mut lobby = open_lobby(2);
    lobby.state = start_game(&lobby.state, 0).unwrap();
    let team = lobby.state.current_team;
    let operative = lobby.operative(team);
    let total = lobby.state.teams[team].cards_total;

    let mut state = lobby.state.clone();
    for i in 0..total {
        let card = first_unrevealed(&state, CardType::of_team(team));
        let (next, outcome) = reveal(&state, card, operative, i as u64).unwrap();
        assert!(outcome.continues_turn);
        assert_eq!(outcome.game_ended, i + 1 == total);
        state = next;
    }

    assert_eq!(state.phase, GamePhase::Finished);
    assert_eq!(state.winner, Some(team));
    assert_eq!(state.teams[team].cards_revealed, total);
    assert_eq!(state.status_for(&operative).red.cards_total + state.status_for(&operative).blue.cards_total, 17);
}

#[test]
fn scenario_turn_alternation_over_a_round() {
    let mut lobby = open_lobby(3);
    lobby.state = start_game(&lobby.state, 0).unwrap();
    let first = lobby.state.current_team;

    let state = give_clue(&lobby.state, lobby.spymaster(first), "Stadium", 1, 1, &mut ChaCha8Rng::seed_from_u64(30)).unwrap();
    let neutral = first_unrevealed(&state, CardType::Neutral);
    let (state, outcome) = reveal(&state, neutral, lobby.operative(first), 2).unwrap();
    assert!(!outcome.continues_turn);
    assert_eq!(state.current_team, first.other());

    let state = give_clue(&state, lobby.spymaster(first.other()), "Trophy", 0, 3, &mut ChaCha8Rng::seed_from_u64(31)).unwrap();
    let state = end_turn(&state, lobby.spymaster(first.other()), 4).unwrap();
    assert_eq!(state.current_team, first);

    let status = state.status_for(&lobby.operative(first));
    assert!(status.can_reveal_cards);
    assert_eq!(status.last_clue.unwrap().text, "TROPHY");
    assert_eq!(state.clues.len(), 2);
    assert_eq!(state.history.len(), 5);
}

#[test]
fn reveal_twice_never_double_counts() {
    let mut lobby = open_lobby(4);
    lobby.state = start_game(&lobby.state, 0).unwrap();
    let team = lobby.state.current_team;
    let card = first_unrevealed(&lobby.state, CardType::of_team(team));

    let (state, _) = reveal(&lobby.state, card, lobby.operative(team), 0).unwrap();
    let err = reveal(&state, card, lobby.operative(team), 0).unwrap_err();
    assert_eq!(err, GameError::AlreadyRevealed { card_id: card });
    assert_eq!(state.teams[team].cards_revealed, 1);
}

#[test]
fn finished_game_rejects_actions_then_restarts() {
    let mut lobby = open_lobby(5);
    lobby.state = start_game(&lobby.state, 0).unwrap();
    let team = lobby.state.current_team;
    let assassin = first_unrevealed(&lobby.state, CardType::Assassin);
    let (finished, _) = reveal(&lobby.state, assassin, lobby.operative(team), 0).unwrap();

    assert_eq!(end_turn(&finished, lobby.operative(team), 0).unwrap_err(), GameError::GameNotActive);
    assert_eq!(
        give_clue(&finished, lobby.spymaster(team), "late", 1, 0, &mut ChaCha8Rng::seed_from_u64(32)).unwrap_err(),
        GameError::GameNotActive
    );

    let mut rng = ChaCha8Rng::seed_from_u64(50);
    let words = words::balanced_words(BOARD_SIZE, &mut rng);
    let restarted = restart_game(&finished, &words, WordSource::Curated, 1, &mut rng).unwrap();
    assert_eq!(restarted.phase, GamePhase::Waiting);
    assert_eq!(restarted.history.len(), finished.history.len() + 1);
    assert!(validate_distribution(&restarted.cards, restarted.starting_team).is_valid);
    assert_eq!(start_game(&restarted, 2).unwrap_err(), GameError::TeamIncomplete { team: Team::Red });
}

#[test]
fn snapshot_survives_json_between_actions() {
    let mut lobby = open_lobby(6);
    lobby.state = start_game(&lobby.state, 0).unwrap();
    let team = lobby.state.current_team;

    let json = serde_json::to_string(&lobby.state).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();
    let card = first_unrevealed(&restored, CardType::Neutral);
    let (state, outcome) = reveal(&restored, card, lobby.operative(team), 0).unwrap();
    assert_eq!(outcome.card_type, CardType::Neutral);
    assert_eq!(state.current_team, team.other());
}

proptest! {
    #[test]
    fn generated_boards_have_fixed_distribution(seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (cards, starting_team) = generate_board(&board_words(), &mut rng).unwrap();
        let report = validate_distribution(&cards, starting_team);
        prop_assert!(report.is_valid);
        prop_assert_eq!(cards.len(), BOARD_SIZE);
        prop_assert_eq!(report.counts.assassin, 1);
        prop_assert_eq!(report.counts.of_team(starting_team), 9);
        prop_assert_eq!(report.counts.of_team(starting_team.other()), 8);
        prop_assert_eq!(report.counts.neutral, 7);
    }

    #[test]
    fn out_of_range_clue_counts_are_rejected(count in prop_oneof![i32::MIN..0, 10..i32::MAX]) {
        let mut lobby = open_lobby(7);
        lobby.state = start_game(&lobby.state, 0).unwrap();
        let spymaster = lobby.spymaster(lobby.state.current_team);
        let err = give_clue(&lobby.state, spymaster, "word", count, 0, &mut ChaCha8Rng::seed_from_u64(33)).unwrap_err();
        prop_assert_eq!(err, GameError::CountOutOfRange { count });
    }
}
