//! The turn/player state machine.
//!
//! One authoritative [`Game`] per session arbitrates three sources of
//! mutation: local input, replies from the external move service, and
//! moves relayed by a peer. Every mutation goes through
//! [`Game::handle`], which either returns the follow-up [`Effect`]s or an
//! error with the previous state completely unchanged. Effects are return
//! values, not side effects: persisting, sending to the peer, and
//! requesting an AI move are the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::board::{Board, Cell, Disc};
use crate::wire::WireMessage;

pub mod advisor;
pub mod board;
pub mod codec;

/// Who controls a seat.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerRole {
    #[default]
    Human,
    Ai,
    /// The peer node is responsible for this seat.
    Remote,
}

/// One of the two seats.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    /// Disc count, recomputed from the board after every update.
    pub score: u32,
    pub role: PlayerRole,
    /// Whether this seat has a legal move; recomputed from the board,
    /// never stored independently of it.
    pub has_move: bool,
}

impl Player {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            score: 0,
            role: PlayerRole::Human,
            has_move: true,
        }
    }
}

/// The minimal state needed to resume a game from an external
/// representation (the `board`/`turn`/`lastPiece` parameters).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GameAttrs {
    /// Board in its codec token form.
    pub board_str: String,
    /// Seat expected to move next.
    pub turn: Disc,
    /// Cell index of the most recent move, if any.
    pub last_move: Option<usize>,
}

impl GameAttrs {
    /// Build attrs from the three serialized parameters. Any missing or
    /// unparseable one means "start a fresh game".
    pub fn from_params(
        board: Option<&str>,
        turn: Option<&str>,
        last_piece: Option<&str>,
    ) -> Option<Self> {
        let board_str = board?.to_owned();
        if board_str.is_empty() {
            return None;
        }
        let turn = match turn? {
            "0" => Disc::Black,
            "1" => Disc::White,
            _ => return None,
        };
        let last_piece = last_piece?;
        let last_move = if last_piece.is_empty() {
            None
        } else {
            Some(last_piece.parse().ok()?)
        };
        Some(Self {
            board_str,
            turn,
            last_move,
        })
    }

    /// The three serialized parameters, written on every update.
    pub fn to_params(&self) -> [(&'static str, String); 3] {
        [
            ("board", self.board_str.clone()),
            ("turn", self.turn.index().to_string()),
            (
                "lastPiece",
                self.last_move.map(|i| i.to_string()).unwrap_or_default(),
            ),
        ]
    }
}

/// Result of an accepted move or reset: the unit of propagation to the
/// UI, the URL layer, and the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardUpdate {
    pub board: Board,
    pub board_str: String,
    pub turn: Disc,
    pub last_move: Option<usize>,
}

/// Final standing once neither seat can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Disc),
    Tie,
}

/// Where the machine currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a local or remote move.
    #[default]
    AwaitingMove,
    /// An AI request is outstanding; moves for that seat are refused
    /// until the reply arrives.
    AwaitingAi,
    /// Neither seat can move; only a reset leaves this phase.
    Over,
}

/// Network session association, present only for realtime games. The
/// connection itself lives with the integrator; this records identity and
/// whether the second peer has arrived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeSession {
    pub game_id: String,
    pub joined: bool,
}

/// Everything that can drive a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A cell pick from this node's own UI.
    LocalMove { index: usize },
    /// A move relayed by the peer.
    RemoteMove { index: usize, mover: Disc },
    /// Reply from the external move service. `epoch` must match the value
    /// carried by the request; stale replies are dropped silently.
    AiMove {
        epoch: u64,
        mover: Disc,
        index: Option<usize>,
    },
    /// Toggle a local seat between human and AI control.
    SetRole { seat: Disc, role: PlayerRole },
    /// A second peer entered our realtime game.
    PeerJoined,
    /// We joined someone else's game and were handed this seat.
    SeatAssigned { seat: Disc },
    /// The peer went away.
    PeerDisconnected,
    /// Resume from previously persisted attributes.
    Load(GameAttrs),
    /// Open a fresh realtime game under this id.
    StartRealtime { game_id: String },
    /// Detach from the current realtime game, keeping the board.
    LeaveRealtime,
    Reset,
}

/// Side effects requested by a transition, executed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// New authoritative state for the UI and the URL layer.
    Update(BoardUpdate),
    /// Forward a message to the connected peer.
    Send(WireMessage),
    /// Ask the external move service for the next move; the reply must
    /// come back as [`GameEvent::AiMove`] with the same epoch.
    RequestAiMove {
        epoch: u64,
        board_str: String,
        mover: Disc,
    },
    /// The side to move had no legal move and was skipped.
    TurnSkipped { skipped: Disc },
    /// Both sides are out of moves.
    GameOver { outcome: Outcome },
    /// Close the connection of the now-dissolved realtime session before
    /// opening any new one.
    LeaveSession,
}

/// Authoritative game state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub board: Board,
    /// Seat 0 (black) and seat 1 (white).
    pub players: [Player; 2],
    pub attrs: GameAttrs,
    pub phase: Phase,
    pub session: Option<RealtimeSession>,
    /// Bumped whenever the board is replaced wholesale (reset, load, or
    /// a session change); events stamped with an older epoch are dropped.
    pub epoch: u64,
}

impl Game {
    pub fn new() -> Self {
        let board = Board::new();
        let mut game = Self {
            board,
            players: [Player::new("Player A"), Player::new("Player B")],
            attrs: GameAttrs {
                board_str: codec::encode(&board),
                turn: Disc::Black,
                last_move: None,
            },
            phase: Phase::AwaitingMove,
            session: None,
            epoch: 0,
        };
        game.refresh_players();
        game
    }

    /// Seat expected to move next.
    pub fn turn(&self) -> Disc {
        self.attrs.turn
    }

    pub fn player(&self, seat: Disc) -> &Player {
        &self.players[seat.index()]
    }

    /// Final standing, purely derived from the scores.
    pub fn outcome(&self) -> Outcome {
        let black = self.players[0].score;
        let white = self.players[1].score;
        if black > white {
            Outcome::Winner(Disc::Black)
        } else if white > black {
            Outcome::Winner(Disc::White)
        } else {
            Outcome::Tie
        }
    }

    /// Apply one event. On error the state is exactly as it was.
    pub fn handle(&mut self, event: GameEvent) -> Result<Vec<Effect>, GameError> {
        match event {
            GameEvent::LocalMove { index } => self.local_move(index),
            GameEvent::RemoteMove { index, mover } => self.remote_move(index, mover),
            GameEvent::AiMove {
                epoch,
                mover,
                index,
            } => self.ai_move(epoch, mover, index),
            GameEvent::SetRole { seat, role } => self.set_role(seat, role),
            GameEvent::PeerJoined => self.peer_joined(),
            GameEvent::SeatAssigned { seat } => self.seat_assigned(seat),
            GameEvent::PeerDisconnected => self.peer_disconnected(),
            GameEvent::Load(attrs) => self.load(attrs),
            GameEvent::StartRealtime { game_id } => Ok(self.start_realtime(game_id)),
            GameEvent::LeaveRealtime => Ok(self.leave_realtime()),
            GameEvent::Reset => Ok(self.reset()),
        }
    }

    fn local_move(&mut self, index: usize) -> Result<Vec<Effect>, GameError> {
        let mover = self.attrs.turn;
        let seat = mover.index();
        if self.phase == Phase::Over {
            return Err(GameError::IllegalMove { index });
        }
        if self.phase == Phase::AwaitingAi {
            return Err(GameError::UnauthorizedMover { seat });
        }
        // in a realtime game the host sits tight until the peer arrives
        if let Some(session) = &self.session {
            if !session.joined {
                return Err(GameError::UnauthorizedMover { seat });
            }
        }
        if self.players[seat].role == PlayerRole::Remote {
            return Err(GameError::UnauthorizedMover { seat });
        }

        let mut effects = self.play(index, mover)?;
        if self.session.is_some() {
            effects.push(Effect::Send(WireMessage::Move {
                move_index: index as u8,
                player: seat as u8,
            }));
        }
        effects.extend(self.settle());
        Ok(effects)
    }

    fn remote_move(&mut self, index: usize, mover: Disc) -> Result<Vec<Effect>, GameError> {
        let seat = mover.index();
        // a peer may only move the seat it was handed, and only in turn;
        // anything else is a spoof or a stale message
        if self.players[seat].role != PlayerRole::Remote
            || self.phase != Phase::AwaitingMove
            || self.attrs.turn != mover
        {
            return Err(GameError::UnauthorizedMover { seat });
        }
        let mut effects = self.play(index, mover)?;
        effects.extend(self.settle());
        Ok(effects)
    }

    fn ai_move(
        &mut self,
        epoch: u64,
        mover: Disc,
        index: Option<usize>,
    ) -> Result<Vec<Effect>, GameError> {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "dropping stale AI reply");
            return Ok(Vec::new());
        }
        let seat = mover.index();
        if self.phase != Phase::AwaitingAi || self.attrs.turn != mover {
            return Err(GameError::UnauthorizedMover { seat });
        }
        let Some(index) = index else {
            self.phase = Phase::AwaitingMove;
            tracing::warn!(seat, "move service returned no move");
            return Err(GameError::AiMoveUnavailable { seat });
        };
        let mut effects = match self.play(index, mover) {
            Ok(effects) => effects,
            Err(err) => {
                // an unusable index is the same failure as no index
                self.phase = Phase::AwaitingMove;
                tracing::warn!(seat, %err, "move service returned a rejected move");
                return Err(GameError::AiMoveUnavailable { seat });
            }
        };
        if self.session.is_some() {
            effects.push(Effect::Send(WireMessage::Move {
                move_index: index as u8,
                player: seat as u8,
            }));
        }
        effects.extend(self.settle());
        Ok(effects)
    }

    fn set_role(&mut self, seat: Disc, role: PlayerRole) -> Result<Vec<Effect>, GameError> {
        let index = seat.index();
        // remote control is granted by the session handshake, never toggled
        if self.players[index].role == PlayerRole::Remote || role == PlayerRole::Remote {
            return Err(GameError::UnauthorizedMover { seat: index });
        }
        self.players[index].role = role;
        tracing::info!(seat = index, ?role, "seat control changed");
        if self.phase == Phase::AwaitingMove {
            // an AI seat whose turn it already is starts thinking now
            return Ok(self.settle());
        }
        Ok(Vec::new())
    }

    fn peer_joined(&mut self) -> Result<Vec<Effect>, GameError> {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!("peer-joined notification without an active session");
            return Ok(Vec::new());
        };
        session.joined = true;
        self.players[Disc::White.index()].role = PlayerRole::Remote;
        tracing::info!("peer joined; white seat is now remote");
        Ok(vec![Effect::Send(WireMessage::SeatAssigned {
            seat: Disc::White.index() as u8,
        })])
    }

    fn seat_assigned(&mut self, seat: Disc) -> Result<Vec<Effect>, GameError> {
        if let Some(session) = self.session.as_mut() {
            session.joined = true;
        }
        // we control the assigned seat; the other one belongs to the host
        self.players[seat.opponent().index()].role = PlayerRole::Remote;
        tracing::info!(seat = seat.index(), "assigned seat by host");
        Ok(Vec::new())
    }

    fn peer_disconnected(&mut self) -> Result<Vec<Effect>, GameError> {
        tracing::warn!("peer disconnected; resetting game and session");
        Ok(self.reset())
    }

    fn load(&mut self, attrs: GameAttrs) -> Result<Vec<Effect>, GameError> {
        let board = codec::decode(&attrs.board_str)?;
        if let Some(last) = attrs.last_move {
            // a recorded last move must point at an occupied cell
            match board.get(last) {
                Some(Cell::Empty) | None => return Err(GameError::MalformedEncoding),
                Some(_) => {}
            }
        }
        self.board = board;
        self.attrs = attrs;
        self.phase = Phase::AwaitingMove;
        // the board was replaced wholesale; fence out any AI reply that
        // was computed for the previous one
        self.epoch += 1;
        self.refresh_players();
        let mut effects = vec![Effect::Update(self.update())];
        effects.extend(self.settle());
        Ok(effects)
    }

    fn start_realtime(&mut self, game_id: String) -> Vec<Effect> {
        // a realtime game always starts from scratch; any previous
        // session is dissolved first
        let mut effects = self.reset();
        tracing::info!(%game_id, "starting realtime session");
        self.session = Some(RealtimeSession {
            game_id: game_id.clone(),
            joined: false,
        });
        effects.push(Effect::Send(WireMessage::Join { game_id }));
        effects
    }

    fn leave_realtime(&mut self) -> Vec<Effect> {
        if self.session.take().is_none() {
            return Vec::new();
        }
        self.epoch += 1;
        // remote seats fall back to local control
        for player in &mut self.players {
            if player.role == PlayerRole::Remote {
                player.role = PlayerRole::Human;
            }
        }
        tracing::info!("left realtime session");
        vec![Effect::LeaveSession]
    }

    fn reset(&mut self) -> Vec<Effect> {
        let had_session = self.session.is_some();
        let epoch = self.epoch + 1;
        *self = Game::new();
        self.epoch = epoch;
        let mut effects = vec![Effect::Update(self.update())];
        if had_session {
            effects.push(Effect::LeaveSession);
        }
        effects
    }

    /// Validate and apply one move, toggling the turn and refreshing the
    /// derived player fields. No settlement here; callers follow up with
    /// [`Self::settle`].
    fn play(&mut self, index: usize, mover: Disc) -> Result<Vec<Effect>, GameError> {
        let board = self.board.apply_move(index, mover)?;
        self.board = board;
        self.attrs = GameAttrs {
            board_str: codec::encode(&board),
            turn: mover.opponent(),
            last_move: Some(index),
        };
        self.refresh_players();
        tracing::debug!(index, mover = mover.index(), "move accepted");
        Ok(vec![Effect::Update(self.update())])
    }

    /// Synchronous recomputation after every accepted transition: skip a
    /// stuck side, close the game when both are stuck, and kick off an AI
    /// request when an AI seat is up. Runs immediately rather than as a
    /// scheduled task, so derived state can never lag the board.
    fn settle(&mut self) -> Vec<Effect> {
        let to_move = self.attrs.turn;
        let other = to_move.opponent();
        let mut effects = Vec::new();

        if !self.players[to_move.index()].has_move {
            if !self.players[other.index()].has_move {
                self.phase = Phase::Over;
                let outcome = self.outcome();
                tracing::info!(?outcome, "game over");
                effects.push(Effect::GameOver { outcome });
                return effects;
            }
            // an explicit skip: its own turn toggle, distinct from the
            // move that produced this state
            self.attrs.turn = other;
            tracing::info!(skipped = to_move.index(), "turn skipped");
            effects.push(Effect::TurnSkipped { skipped: to_move });
            effects.push(Effect::Update(self.update()));
        }

        self.phase = Phase::AwaitingMove;
        let current = self.attrs.turn;
        let player = &self.players[current.index()];
        if player.role == PlayerRole::Ai && player.has_move {
            self.phase = Phase::AwaitingAi;
            effects.push(Effect::RequestAiMove {
                epoch: self.epoch,
                board_str: self.attrs.board_str.clone(),
                mover: current,
            });
        }
        effects
    }

    fn update(&self) -> BoardUpdate {
        BoardUpdate {
            board: self.board,
            board_str: self.attrs.board_str.clone(),
            turn: self.attrs.turn,
            last_move: self.attrs.last_move,
        }
    }

    fn refresh_players(&mut self) {
        for seat in [Disc::Black, Disc::White] {
            self.players[seat.index()].score = self.board.score(seat);
            self.players[seat.index()].has_move = self.board.can_move(seat);
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
