use serde_json::{Value, json};

use crate::common::TestServer;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn id_of(view: &Value) -> i64 {
    view["id"].as_i64().expect("game id missing from match view")
}

#[tokio::test]
async fn white_starts_on_an_empty_board() {
    let server = TestServer::start().await;

    let view = server.start_match(None, "w", "medium").await;
    assert_eq!(view["stage"], "playing");
    assert_eq!(view["status"], "active");
    assert_eq!(view["pgn"], "");
    assert_eq!(view["fen"], START_FEN);
    assert_eq!(view["turn"], "w");
    assert_eq!(view["isPlayerTurn"], true);
    assert_eq!(view["moves"], json!([]));
    assert_eq!(view["engineMove"], Value::Null);
    assert_eq!(view["version"], 0);
    assert!(server.engine.requests().is_empty());

    let fetched = server.get_ok(&format!("/api/matches/{}", id_of(&view))).await;
    assert_eq!(fetched["fen"], START_FEN);
    assert_eq!(fetched["stage"], "playing");
}

#[tokio::test]
async fn engine_opens_when_player_is_black() {
    let server = TestServer::start().await;
    server.engine.push("e2e4");

    let view = server.start_match(None, "b", "easy").await;
    assert_eq!(view["engineMove"], "e2e4");
    assert_eq!(view["moves"], json!(["e4"]));
    assert_eq!(view["pgn"], "1. e4");
    assert_eq!(view["turn"], "b");
    assert_eq!(view["isPlayerTurn"], true);
    assert_eq!(view["version"], 1);

    // Easy searches at depth 6 from the initial position.
    assert_eq!(server.engine.requests(), vec![(START_FEN.to_string(), 6)]);
}

#[tokio::test]
async fn engine_depth_follows_difficulty() {
    let server = TestServer::start().await;
    server.engine.push("e7e5");

    let view = server.start_match(None, "w", "hard").await;
    server.play_ok(id_of(&view), "e2e4").await;

    let requests = server.engine.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, 15);
}

#[tokio::test]
async fn mating_the_engine_is_a_win() {
    let server = TestServer::start().await;
    let user = server.create_user("kate").await;
    server.engine.push("f2f3");
    server.engine.push("g2g4");

    let view = server.start_match(Some(user), "b", "medium").await;
    let id = id_of(&view);
    let view = server.play_ok(id, "e7e5").await;
    assert_eq!(view["engineMove"], "g2g4");

    let view = server.play_ok(id, "d8h4").await;
    assert_eq!(view["stage"], "gameover");
    assert_eq!(view["status"], "completed");
    assert_eq!(view["result"], "win");
    assert_eq!(view["terminal"], "checkmate");
    assert_eq!(view["engineMove"], Value::Null);
    assert_eq!(view["pgn"], "1. f3 e5 2. g4 Qh4#");

    let owner = server.user(user).await;
    assert_eq!(owner["rating"], 1216);
    assert_eq!(owner["wins"], 1);
    assert_eq!(owner["gamesPlayed"], 1);
}

#[tokio::test]
async fn being_mated_is_a_loss() {
    let server = TestServer::start().await;
    let user = server.create_user("liam").await;
    server.engine.push("e7e5");
    server.engine.push("d8h4");

    let view = server.start_match(Some(user), "w", "medium").await;
    let id = id_of(&view);
    server.play_ok(id, "f2f3").await;
    let view = server.play_ok(id, "g2g4").await;
    assert_eq!(view["engineMove"], "d8h4");
    assert_eq!(view["stage"], "gameover");
    assert_eq!(view["result"], "loss");
    assert_eq!(view["isPlayerTurn"], false);

    let owner = server.user(user).await;
    assert_eq!(owner["rating"], 1184);
    assert_eq!(owner["losses"], 1);
}

#[tokio::test]
async fn repetition_is_a_draw_and_keeps_the_rating() {
    let server = TestServer::start().await;
    let user = server.create_user("mona").await;
    for mv in ["g8f6", "f6g8", "g8f6", "f6g8"] {
        server.engine.push(mv);
    }

    let view = server.start_match(Some(user), "w", "medium").await;
    let id = id_of(&view);
    let mut view = Value::Null;
    for mv in ["g1f3", "f3g1", "g1f3", "f3g1"] {
        view = server.play_ok(id, mv).await;
    }
    assert_eq!(view["stage"], "gameover");
    assert_eq!(view["result"], "draw");
    assert_eq!(view["terminal"], "threefold_repetition");

    let owner = server.user(user).await;
    assert_eq!(owner["rating"], 1200);
    assert_eq!(owner["draws"], 1);
}

#[tokio::test]
async fn resigning_twice_counts_once() {
    let server = TestServer::start().await;
    let user = server.create_user("nina").await;

    let view = server.start_match(Some(user), "w", "medium").await;
    let id = id_of(&view);

    let resp = server
        .client
        .post(server.url(&format!("/api/matches/{id}/resign")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["stage"], "gameover");
    assert_eq!(view["result"], "loss");
    assert_eq!(view["ending"]["kind"], "resignation");

    let resp = server
        .client
        .post(server.url(&format!("/api/matches/{id}/resign")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = server.play(id, "e2e4").await;
    assert_eq!(resp.status(), 409);

    let owner = server.user(user).await;
    assert_eq!(owner["losses"], 1);
    assert_eq!(owner["gamesPlayed"], 1);
    assert_eq!(owner["rating"], 1184);

    // Reloading a resigned game keeps its result.
    let view = server.get_ok(&format!("/api/matches/{id}")).await;
    assert_eq!(view["stage"], "gameover");
    assert_eq!(view["result"], "loss");
}

#[tokio::test]
async fn illegal_moves_change_nothing() {
    let server = TestServer::start().await;
    let view = server.start_match(None, "w", "medium").await;
    let id = id_of(&view);

    for mv in ["e2e5", "zz", "e7e5"] {
        let resp = server.play(id, mv).await;
        assert_eq!(resp.status(), 400, "move {mv}");
    }

    let resp = server
        .post(&format!("/api/matches/{id}/moves"), json!({ "move": "" }))
        .await;
    assert_eq!(resp.status(), 400);

    let view = server.get_ok(&format!("/api/matches/{id}")).await;
    assert_eq!(view["version"], 0);
    assert_eq!(view["pgn"], "");
}

#[tokio::test]
async fn engine_failure_leaves_the_engine_to_move() {
    let server = TestServer::start().await;
    server.engine.push_failure();

    let view = server.start_match(None, "b", "medium").await;
    let id = id_of(&view);
    assert_eq!(view["stage"], "playing");
    assert_eq!(view["engineMove"], Value::Null);
    assert_eq!(view["isPlayerTurn"], false);
    assert_eq!(view["version"], 0);

    let resp = server.play(id, "e7e5").await;
    assert_eq!(resp.status(), 400);

    server.engine.push("d2d4");
    let view = server
        .post_ok(&format!("/api/matches/{id}/engine-move"), json!({}))
        .await;
    assert_eq!(view["engineMove"], "d2d4");
    assert_eq!(view["isPlayerTurn"], true);

    let resp = server
        .post(&format!("/api/matches/{id}/engine-move"), json!({}))
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unusable_engine_moves_are_ignored() {
    let server = TestServer::start().await;
    server.engine.push("a1a8");

    let view = server.start_match(None, "b", "medium").await;
    assert_eq!(view["engineMove"], Value::Null);
    assert_eq!(view["moves"], json!([]));
    assert_eq!(view["isPlayerTurn"], false);
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let server = TestServer::start().await;
    server.engine.push("e7e5");

    let view = server.start_match(None, "w", "medium").await;
    let id = id_of(&view);

    let view = server
        .post_ok(
            &format!("/api/matches/{id}/moves"),
            json!({ "move": "e2e4", "expectedVersion": 0 }),
        )
        .await;
    assert_eq!(view["version"], 2);

    let resp = server
        .post(
            &format!("/api/matches/{id}/moves"),
            json!({ "move": "g1f3", "expectedVersion": 0 }),
        )
        .await;
    assert_eq!(resp.status(), 409);

    let resp = server
        .post(
            &format!("/api/matches/{id}/resign"),
            json!({ "expectedVersion": 1 }),
        )
        .await;
    assert_eq!(resp.status(), 409);

    let view = server.get_ok(&format!("/api/matches/{id}")).await;
    assert_eq!(view["stage"], "playing");
    assert_eq!(view["pgn"], "1. e4 e5");
}

#[tokio::test]
async fn undo_takes_back_both_sides() {
    let server = TestServer::start().await;
    server.engine.push("e7e5");

    let view = server.start_match(None, "w", "medium").await;
    let id = id_of(&view);
    let view = server.play_ok(id, "e2e4").await;
    assert_eq!(view["moves"], json!(["e4", "e5"]));

    let view = server
        .post_ok(&format!("/api/matches/{id}/undo"), json!({}))
        .await;
    assert_eq!(view["moves"], json!([]));
    assert_eq!(view["pgn"], "");
    assert_eq!(view["isPlayerTurn"], true);

    let resp = server
        .post(&format!("/api/matches/{id}/undo"), json!({}))
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn hints_only_on_the_players_turn() {
    let server = TestServer::start().await;
    server.engine.push("e2e4");

    let view = server.start_match(None, "w", "easy").await;
    let id = id_of(&view);

    let hint = server.get_ok(&format!("/api/matches/{id}/hint")).await;
    assert_eq!(hint["hint"], "e2e4");
    assert_eq!(server.engine.requests()[0].1, 15);

    // No more scripted replies: the hint is simply absent.
    let hint = server.get_ok(&format!("/api/matches/{id}/hint")).await;
    assert_eq!(hint["hint"], Value::Null);

    server.engine.push_failure();
    let black = server.start_match(None, "b", "easy").await;
    let resp = server
        .get(&format!("/api/matches/{}/hint", id_of(&black)))
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_match_is_404() {
    let server = TestServer::start().await;

    let resp = server.get("/api/matches/9999").await;
    assert_eq!(resp.status(), 404);

    let resp = server.play(9999, "e2e4").await;
    assert_eq!(resp.status(), 404);

    let resp = server
        .post(
            "/api/matches",
            json!({ "userId": 9999, "playerColor": "w", "difficulty": "easy" }),
        )
        .await;
    assert_eq!(resp.status(), 404);
}
