//! End-to-end scenarios: two peers kept in sync over the wire, AI games
//! driven to completion, and games resumed from their share-URL form.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use othello_sync::{
    generate_game_id, Board, Disc, Effect, Game, GameAttrs, GameEvent, GameSession, Outcome,
    Phase, PlayerRole, WireMessage,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Deliver every outbound wire message in `effects` to the other peer,
/// returning whatever that peer sends back.
async fn relay(effects: &[Effect], peer: &GameSession) -> Vec<Effect> {
    let mut replies = Vec::new();
    for effect in effects {
        if let Effect::Send(message) = effect {
            let raw = message.to_json().expect("serializable message");
            replies.extend(peer.deliver_wire(&raw).await.expect("peer accepts frame"));
        }
    }
    replies
}

async fn wait_for_game_over(outputs: &mut mpsc::Receiver<Effect>) -> Outcome {
    loop {
        let effect = timeout(Duration::from_secs(60), outputs.recv())
            .await
            .expect("game should finish")
            .expect("session alive until game over");
        if let Effect::GameOver { outcome } = effect {
            return outcome;
        }
    }
}

#[tokio::test]
async fn two_peers_stay_in_sync_over_the_wire() {
    init_logging();
    let (host, _host_out) = GameSession::spawn();
    let (joiner, _joiner_out) = GameSession::spawn();

    let game_id = generate_game_id();
    host.apply(GameEvent::StartRealtime {
        game_id: game_id.clone(),
    })
    .await
    .unwrap();
    let join_effects = joiner
        .apply(GameEvent::StartRealtime { game_id })
        .await
        .unwrap();

    // the joiner's join frame reaches the host, whose seat assignment
    // travels back
    let assignment = relay(&join_effects, &host).await;
    relay(&assignment, &joiner).await;

    let host_game = host.snapshot().await;
    let joiner_game = joiner.snapshot().await;
    assert_eq!(host_game.players[1].role, PlayerRole::Remote);
    assert_eq!(joiner_game.players[0].role, PlayerRole::Remote);

    // host (black) opens, joiner (white) answers; each move crosses the
    // wire exactly once
    let effects = host.apply(GameEvent::LocalMove { index: 19 }).await.unwrap();
    relay(&effects, &joiner).await;
    let effects = joiner
        .apply(GameEvent::LocalMove { index: 18 })
        .await
        .unwrap();
    relay(&effects, &host).await;

    let host_game = host.snapshot().await;
    let joiner_game = joiner.snapshot().await;
    assert_eq!(host_game.board, joiner_game.board);
    assert_eq!(host_game.turn(), Disc::Black);
    assert_eq!(host_game.players[0].score, 3);
    assert_eq!(host_game.players[1].score, 3);

    // neither side may move for the seat the peer controls
    assert!(joiner.apply(GameEvent::LocalMove { index: 26 }).await.is_err());

    // the peer vanishing resets the host to a fresh local game
    host.deliver_wire(&WireMessage::PeerDisconnected.to_json().unwrap())
        .await
        .unwrap();
    let host_game = host.snapshot().await;
    assert_eq!(host_game.session, None);
    assert_eq!(host_game.board, Board::new());
}

#[tokio::test]
async fn ai_versus_ai_plays_to_completion() {
    init_logging();
    let (session, mut outputs) = GameSession::spawn();
    session
        .apply(GameEvent::SetRole {
            seat: Disc::White,
            role: PlayerRole::Ai,
        })
        .await
        .unwrap();
    session
        .apply(GameEvent::SetRole {
            seat: Disc::Black,
            role: PlayerRole::Ai,
        })
        .await
        .unwrap();

    let outcome = wait_for_game_over(&mut outputs).await;

    let game = session.snapshot().await;
    assert_eq!(game.phase, Phase::Over);
    let (black, white, empty) = game.board.counts();
    assert_eq!(black + white + empty, 64);
    // the reported outcome matches the final count
    match outcome {
        Outcome::Winner(Disc::Black) => assert!(black > white),
        Outcome::Winner(Disc::White) => assert!(white > black),
        Outcome::Tie => assert_eq!(black, white),
    }
    // a finished game accepts no further moves
    assert!(session.apply(GameEvent::LocalMove { index: 0 }).await.is_err());
}

#[tokio::test]
async fn game_resumes_from_its_share_url_form() {
    init_logging();
    let mut game = Game::new();
    game.handle(GameEvent::LocalMove { index: 19 }).unwrap();
    game.handle(GameEvent::LocalMove { index: 18 }).unwrap();
    let params = game.attrs.to_params();
    let expected_board = game.board;

    // the three parameters are all another client needs
    let attrs = GameAttrs::from_params(
        Some(&params[0].1),
        Some(&params[1].1),
        Some(&params[2].1),
    )
    .expect("well-formed parameters");

    let (session, _outputs) = GameSession::spawn();
    session.apply(GameEvent::Load(attrs)).await.unwrap();
    let restored = session.snapshot().await;
    assert_eq!(restored.board, expected_board);
    assert_eq!(restored.turn(), Disc::Black);

    // play continues from the restored position
    let effects = session.apply(GameEvent::LocalMove { index: 26 }).await.unwrap();
    assert!(matches!(effects[0], Effect::Update(_)));
}

#[tokio::test]
async fn human_versus_ai_alternates_turns() {
    init_logging();
    let (session, mut outputs) = GameSession::spawn();
    session
        .apply(GameEvent::SetRole {
            seat: Disc::White,
            role: PlayerRole::Ai,
        })
        .await
        .unwrap();

    session.apply(GameEvent::LocalMove { index: 19 }).await.unwrap();

    // wait until the AI's white reply lands and it is black's turn again
    let deadline = timeout(Duration::from_secs(10), async {
        loop {
            match outputs.recv().await {
                Some(Effect::Update(update)) if update.turn == Disc::Black => break update,
                Some(_) => continue,
                None => panic!("session closed mid-game"),
            }
        }
    })
    .await
    .expect("AI should reply");

    assert!(deadline.last_move.is_some());
    let game = session.snapshot().await;
    assert_eq!(game.turn(), Disc::Black);
    assert_eq!(game.board.counts().0 + game.board.counts().1, 6);
}
