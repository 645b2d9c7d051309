//! Async driver around the [`Game`] state machine.
//!
//! [`GameSession`] owns the game behind a mutex and funnels every event
//! through a single consumer task, so concurrent sources (UI, peer
//! messages, AI replies) are serialized into one total order. Effects the
//! integrator must execute come back on the output channel; AI move
//! requests are answered by the built-in advisor, or forwarded to an
//! external move service when the session is built with
//! [`GameSession::with_external_ai`].

use std::sync::Arc;

use anyhow::Context;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tokio::select;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

use crate::error::GameError;
use crate::game::board::Disc;
use crate::game::{advisor, codec, Effect, Game, GameEvent};
use crate::wire::{AiMoveResponse, WireMessage};

/// Share-URL game identifiers are eight lowercase alphanumerics.
const GAME_ID_LEN: usize = 8;

const QUEUE_CAPACITY: usize = 32;
const OUTPUT_CAPACITY: usize = 64;

struct QueueItem {
    event: GameEvent,
    /// Absent for internally generated events (AI replies).
    reply: Option<oneshot::Sender<Result<Vec<Effect>, GameError>>>,
}

/// Who answers AI move requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AiBackend {
    /// The built-in advisor, resolved inside the session.
    Builtin,
    /// An external move service; requests are forwarded on the output
    /// channel and replies come back through [`GameSession::deliver_ai_reply`].
    External,
}

/// Handle to a running game. Dropping it aborts the consumer task.
pub struct GameSession {
    game: Arc<Mutex<Game>>,
    queue: mpsc::Sender<QueueItem>,
    cancel: CancellationToken,
    _listener: AbortOnDropHandle<()>,
}

impl GameSession {
    /// Start a session over a fresh game. The returned receiver carries
    /// the effects the integrator must execute (UI updates, wire sends).
    pub fn spawn() -> (Self, mpsc::Receiver<Effect>) {
        Self::with_game(Game::new())
    }

    /// Start a session over an existing game, e.g. one restored from
    /// persisted attributes. AI seats are played by the built-in advisor.
    pub fn with_game(game: Game) -> (Self, mpsc::Receiver<Effect>) {
        Self::start(game, AiBackend::Builtin)
    }

    /// Like [`Self::with_game`], but AI requests are handed to the
    /// integrator as [`Effect::RequestAiMove`] for an external move
    /// service; feed replies back via [`Self::deliver_ai_reply`].
    pub fn with_external_ai(game: Game) -> (Self, mpsc::Receiver<Effect>) {
        Self::start(game, AiBackend::External)
    }

    fn start(game: Game, backend: AiBackend) -> (Self, mpsc::Receiver<Effect>) {
        let game = Arc::new(Mutex::new(game));
        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CAPACITY);
        let cancel = CancellationToken::new();

        let listener = AbortOnDropHandle::new(tokio::spawn(consume_events(
            game.clone(),
            queue_rx,
            queue_tx.clone(),
            output_tx,
            cancel.clone(),
            backend,
        )));

        (
            Self {
                game,
                queue: queue_tx,
                cancel,
                _listener: listener,
            },
            output_rx,
        )
    }

    /// Apply one event and wait for its outcome. The effects are also
    /// forwarded on the output channel; the returned copy lets callers
    /// react inline.
    pub async fn apply(&self, event: GameEvent) -> Result<Vec<Effect>, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.queue
            .send(QueueItem {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| GameError::SessionDisconnected)?;
        reply_rx.await.map_err(|_| GameError::SessionDisconnected)?
    }

    /// Decode one raw transport frame and apply it. This is the only
    /// place peer input enters the machine.
    pub async fn deliver_wire(&self, raw: &str) -> anyhow::Result<Vec<Effect>> {
        let message = WireMessage::from_json(raw)?;
        let event = match message {
            // a dumb relay may broadcast the join itself rather than a
            // dedicated notification; both mean the peer is here
            WireMessage::Join { .. } | WireMessage::PeerJoined => GameEvent::PeerJoined,
            WireMessage::SeatAssigned { seat } => {
                let seat =
                    Disc::from_index(seat as usize).context("assigned seat out of range")?;
                GameEvent::SeatAssigned { seat }
            }
            WireMessage::Move { move_index, player } => {
                let mover =
                    Disc::from_index(player as usize).context("mover seat out of range")?;
                GameEvent::RemoteMove {
                    index: move_index as usize,
                    mover,
                }
            }
            WireMessage::PeerDisconnected => GameEvent::PeerDisconnected,
        };
        Ok(self.apply(event).await?)
    }

    /// Decode one raw reply from the external move service and apply it.
    /// `epoch` and `mover` are the values carried by the originating
    /// [`Effect::RequestAiMove`].
    pub async fn deliver_ai_reply(
        &self,
        raw: &str,
        epoch: u64,
        mover: Disc,
    ) -> anyhow::Result<Vec<Effect>> {
        let response: AiMoveResponse =
            serde_json::from_str(raw).context("malformed move service reply")?;
        let event = GameEvent::AiMove {
            epoch,
            mover,
            index: response.move_index(),
        };
        Ok(self.apply(event).await?)
    }

    /// Clone of the current authoritative state.
    pub async fn snapshot(&self) -> Game {
        self.game.lock().await.clone()
    }

    /// Stop the consumer task. Queued events are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn consume_events(
    game: Arc<Mutex<Game>>,
    mut queue: mpsc::Receiver<QueueItem>,
    feedback: mpsc::Sender<QueueItem>,
    output: mpsc::Sender<Effect>,
    cancel: CancellationToken,
    backend: AiBackend,
) {
    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            item = queue.recv() => {
                let Some(QueueItem { event, reply }) = item else {
                    break;
                };
                let result = game.lock().await.handle(event);
                match &result {
                    Ok(effects) => {
                        for effect in effects {
                            dispatch(effect.clone(), &feedback, &output, backend).await;
                        }
                    }
                    Err(err) => tracing::warn!(%err, "event rejected"),
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
    }
    tracing::debug!("session consumer stopped");
}

/// Forward one effect to the integrator, or service it internally.
async fn dispatch(
    effect: Effect,
    feedback: &mpsc::Sender<QueueItem>,
    output: &mpsc::Sender<Effect>,
    backend: AiBackend,
) {
    match effect {
        Effect::RequestAiMove {
            epoch,
            board_str,
            mover,
        } if backend == AiBackend::Builtin => {
            // resolve off the consumer loop so the queue stays live; the
            // reply re-enters through the same queue as any other event
            let feedback = feedback.clone();
            tokio::spawn(async move {
                let index = match codec::decode(&board_str) {
                    Ok(board) => advisor::choose(&advisor::suggest_moves(&board, mover)),
                    Err(err) => {
                        tracing::error!(%err, "advisor got an undecodable board");
                        None
                    }
                };
                let sent = feedback
                    .send(QueueItem {
                        event: GameEvent::AiMove {
                            epoch,
                            mover,
                            index,
                        },
                        reply: None,
                    })
                    .await;
                if sent.is_err() {
                    tracing::debug!("session gone before the AI reply landed");
                }
            });
        }
        other => {
            if output.send(other).await.is_err() {
                tracing::debug!("output receiver dropped");
            }
        }
    }
}

/// Fresh identifier for a shareable realtime game.
pub fn generate_game_id() -> String {
    let mut rng = thread_rng();
    (0..GAME_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect()
}
