//! Lobby aggregate.
//!
//! Owns the connection arena, the matchmaking pool and the session registry.
//! All mutation of that shared state goes through `&mut Lobby`, so whoever
//! holds the lobby (a single mutex in the server) is the serialization point.

use std::collections::HashMap;

use super::{
    AppliedMove, Color, Connection, ConnectionId, DisplayName, GameError, MatchmakingPool,
    MoveCommand, Role, RulesEngine, SeatPolicy, Seats, Session, SessionId, SessionIdFactory,
    SessionRegistry, SpectatorTargetPolicy, Timestamp, most_recent_active,
};

/// Result of a `join` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Queued; waiting for an opponent
    Waiting { player_id: usize },
    /// Completed a pair; a new session was registered
    Paired {
        player_id: usize,
        session_id: SessionId,
        seats: Seats,
    },
    /// Pool full; attached to `session_id` as a spectator, or left idle when
    /// there is nothing to watch
    Spectating { session_id: Option<SessionId> },
}

/// Result of a disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// Session that lost a seated player and must be closed
    pub abandoned_session: Option<SessionId>,
}

pub struct Lobby {
    connections: HashMap<ConnectionId, Connection>,
    pool: MatchmakingPool,
    registry: SessionRegistry,
    spectator_policy: SpectatorTargetPolicy,
    next_connection_id: u64,
    next_sequence: u64,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}

impl Lobby {
    /// Create an empty lobby routing late joiners to the most recent session
    pub fn new() -> Self {
        Self::with_spectator_policy(most_recent_active)
    }

    pub fn with_spectator_policy(spectator_policy: SpectatorTargetPolicy) -> Self {
        Self {
            connections: HashMap::new(),
            pool: MatchmakingPool::new(),
            registry: SessionRegistry::new(),
            spectator_policy,
            next_connection_id: 1,
            next_sequence: 1,
        }
    }

    /// Register a freshly opened connection and return its handle.
    pub fn connect(&mut self, connected_at: Timestamp) -> ConnectionId {
        let id = ConnectionId::new(self.next_connection_id);
        self.next_connection_id += 1;
        self.connections.insert(id, Connection::new(id, connected_at));
        id
    }

    /// Seat `id` in the pool, pair it, or route it to spectating.
    ///
    /// # Errors
    ///
    /// * `ConnectionNotFound` - `id` is not registered
    /// * `AlreadyJoined` - `id` is already waiting, seated or spectating
    pub fn join(
        &mut self,
        id: ConnectionId,
        name: DisplayName,
        rules: &dyn RulesEngine,
        now: Timestamp,
    ) -> Result<JoinOutcome, GameError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(GameError::ConnectionNotFound)?;
        if connection.has_joined() {
            return Err(GameError::AlreadyJoined);
        }
        connection.display_name = Some(name);

        if self.pool.is_full() {
            let target = (self.spectator_policy)(&self.registry);
            if let Some(session_id) = &target
                && let Some(session) = self.registry.get_mut(session_id)
            {
                session.add_spectator(id);
                connection.role = Role::Spectating;
                connection.session_id = Some(session_id.clone());
            }
            return Ok(JoinOutcome::Spectating { session_id: target });
        }

        connection.role = Role::Waiting;
        let player_id = self.pool.enqueue(id);

        let Some((white, black)) = self.pool.take_pair() else {
            return Ok(JoinOutcome::Waiting { player_id });
        };

        let session_id = SessionIdFactory::generate();
        let seats = Seats { white, black };
        let session = Session::new(
            session_id.clone(),
            seats,
            rules.new_game(),
            now,
            self.next_sequence,
        );
        self.next_sequence += 1;
        self.registry.insert(session);
        self.pool.bind_cycle(session_id.clone());

        for (seat, color) in [(white, Color::White), (black, Color::Black)] {
            if let Some(player) = self.connections.get_mut(&seat) {
                player.role = Role::Seated(color);
                player.session_id = Some(session_id.clone());
            }
        }

        Ok(JoinOutcome::Paired {
            player_id,
            session_id,
            seats,
        })
    }

    /// Validate and apply a move on the referenced session.
    ///
    /// The session is not removed here, even when the move ends the game;
    /// the caller notifies members first and then calls [`Lobby::close_session`].
    pub fn apply_move(
        &mut self,
        requester: ConnectionId,
        command: &MoveCommand,
        rules: &dyn RulesEngine,
        policy: SeatPolicy,
    ) -> Result<(SessionId, AppliedMove), GameError> {
        let session_id =
            SessionId::new(command.session_id.clone()).map_err(|_| GameError::InvalidSession)?;
        let session = self
            .registry
            .get_mut(&session_id)
            .ok_or(GameError::InvalidSession)?;
        let applied = session.apply_move(requester, command, rules, policy)?;
        Ok((session_id, applied))
    }

    /// Remove a session from the registry.
    ///
    /// Remaining members return to idle and the pool accepts a new pair if
    /// this session was its current cycle. Returns `None` if the session was
    /// already removed.
    pub fn close_session(&mut self, session_id: &SessionId) -> Option<Session> {
        let session = self.registry.remove(session_id)?;
        for member in session.members() {
            if let Some(connection) = self.connections.get_mut(&member)
                && connection.session_id.as_ref() == Some(session_id)
            {
                connection.reset();
            }
        }
        self.pool.release_cycle(session_id);
        Some(session)
    }

    /// Drop a connection from the arena, the pool and any spectator list.
    ///
    /// A seated connection leaves its session in place, reported as
    /// `abandoned_session`, so the caller can notify the opponent before
    /// closing it.
    pub fn disconnect(&mut self, id: ConnectionId) -> DisconnectOutcome {
        let Some(connection) = self.connections.remove(&id) else {
            return DisconnectOutcome::default();
        };
        self.pool.remove(id);

        let mut outcome = DisconnectOutcome::default();
        let Some(session_id) = connection.session_id else {
            return outcome;
        };
        match connection.role {
            Role::Spectating => {
                if let Some(session) = self.registry.get_mut(&session_id) {
                    session.remove_spectator(id);
                }
            }
            Role::Seated(_) => {
                if self.registry.contains(&session_id) {
                    outcome.abandoned_session = Some(session_id);
                }
            }
            Role::Idle | Role::Waiting => {}
        }
        outcome
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn display_name(&self, id: ConnectionId) -> Option<&DisplayName> {
        self.connections
            .get(&id)
            .and_then(|c| c.display_name.as_ref())
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.registry.get(id)
    }

    /// Sessions ordered by creation
    pub fn sessions(&self) -> Vec<&Session> {
        self.registry.sessions()
    }

    /// Everyone a broadcast for `session_id` reaches; `None` if it is gone.
    pub fn session_members(&self, session_id: &SessionId) -> Option<Vec<ConnectionId>> {
        self.registry.get(session_id).map(Session::members)
    }

    pub fn waiting(&self) -> &[ConnectionId] {
        self.pool.waiting()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MoveVerdict, Position, SessionStatus, rules::MockRulesEngine};

    fn name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    fn create_rules() -> MockRulesEngine {
        let mut rules = MockRulesEngine::new();
        rules
            .expect_new_game()
            .returning(|| Position::new("start".to_string()));
        rules.expect_apply_move().returning(|position, mv| {
            MoveVerdict::Legal(Position::new(format!("{} {}{}", position, mv.from, mv.to)))
        });
        rules.expect_is_game_over().return_const(false);
        rules.expect_is_draw_by_history().return_const(false);
        rules.expect_is_checkmate().return_const(false);
        rules
    }

    fn move_command(session_id: &SessionId, from: &str, to: &str, color: &str) -> MoveCommand {
        MoveCommand {
            session_id: session_id.as_str().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            color: color.to_string(),
            promotion: None,
        }
    }

    /// Lobby with two paired players; returns (lobby, white, black, session_id)
    fn paired_lobby(rules: &MockRulesEngine) -> (Lobby, ConnectionId, ConnectionId, SessionId) {
        let mut lobby = Lobby::new();
        let alice = lobby.connect(Timestamp::new(0));
        let bob = lobby.connect(Timestamp::new(0));
        lobby
            .join(alice, name("alice"), rules, Timestamp::new(1))
            .unwrap();
        let outcome = lobby
            .join(bob, name("bob"), rules, Timestamp::new(2))
            .unwrap();
        let JoinOutcome::Paired { session_id, .. } = outcome else {
            panic!("expected pairing, got {outcome:?}");
        };
        (lobby, alice, bob, session_id)
    }

    #[test]
    fn test_first_join_waits() {
        // テスト項目: 最初の参加者は待機列に入り playerId 1 を受け取る
        // given (前提条件):
        let rules = create_rules();
        let mut lobby = Lobby::new();
        let alice = lobby.connect(Timestamp::new(0));

        // when (操作):
        let outcome = lobby.join(alice, name("alice"), &rules, Timestamp::new(1));

        // then (期待する結果):
        assert_eq!(outcome, Ok(JoinOutcome::Waiting { player_id: 1 }));
        assert_eq!(lobby.waiting(), &[alice]);
        assert_eq!(lobby.connection(alice).unwrap().role, Role::Waiting);
    }

    #[test]
    fn test_second_join_pairs_into_session() {
        // テスト項目: 2 人目の参加で白=先着・黒=後着のセッションが作成される
        // given (前提条件):
        let rules = create_rules();

        // when (操作):
        let (lobby, alice, bob, session_id) = paired_lobby(&rules);

        // then (期待する結果):
        let session = lobby.session(&session_id).unwrap();
        assert_eq!(session.seats.white, alice);
        assert_eq!(session.seats.black, bob);
        assert_eq!(session.turn, Color::White);
        assert_eq!(session.position.as_str(), "start");
        assert!(lobby.waiting().is_empty());
        assert_eq!(lobby.connection(alice).unwrap().seat(), Some(Color::White));
        assert_eq!(lobby.connection(bob).unwrap().seat(), Some(Color::Black));
        assert_eq!(
            lobby.connection(bob).unwrap().session_id.as_ref(),
            Some(&session_id)
        );
    }

    #[test]
    fn test_third_join_spectates_active_session() {
        // テスト項目: 対局中の 3 人目は観戦者として既存セッションに追加される
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, _, _, session_id) = paired_lobby(&rules);
        let carol = lobby.connect(Timestamp::new(0));

        // when (操作):
        let outcome = lobby.join(carol, name("carol"), &rules, Timestamp::new(3));

        // then (期待する結果):
        assert_eq!(
            outcome,
            Ok(JoinOutcome::Spectating {
                session_id: Some(session_id.clone())
            })
        );
        assert_eq!(lobby.session(&session_id).unwrap().spectators, vec![carol]);
        assert_eq!(lobby.connection(carol).unwrap().role, Role::Spectating);
        assert_eq!(lobby.session_members(&session_id).unwrap().len(), 3);
    }

    #[test]
    fn test_spectator_without_target_stays_idle() {
        // テスト項目: 観戦先がない場合、接続は待機状態にならず idle のまま残る
        // given (前提条件):
        let rules = create_rules();
        let mut lobby = Lobby::with_spectator_policy(|_| None);
        let alice = lobby.connect(Timestamp::new(0));
        let bob = lobby.connect(Timestamp::new(0));
        let carol = lobby.connect(Timestamp::new(0));
        lobby
            .join(alice, name("alice"), &rules, Timestamp::new(1))
            .unwrap();
        lobby
            .join(bob, name("bob"), &rules, Timestamp::new(2))
            .unwrap();

        // when (操作):
        let outcome = lobby.join(carol, name("carol"), &rules, Timestamp::new(3));

        // then (期待する結果):
        assert_eq!(outcome, Ok(JoinOutcome::Spectating { session_id: None }));
        assert_eq!(lobby.connection(carol).unwrap().role, Role::Idle);
    }

    #[test]
    fn test_duplicate_join_rejected() {
        // テスト項目: 参加済みの接続が再度 join すると AlreadyJoined
        // given (前提条件):
        let rules = create_rules();
        let mut lobby = Lobby::new();
        let alice = lobby.connect(Timestamp::new(0));
        lobby
            .join(alice, name("alice"), &rules, Timestamp::new(1))
            .unwrap();

        // when (操作):
        let result = lobby.join(alice, name("alice"), &rules, Timestamp::new(2));

        // then (期待する結果):
        assert_eq!(result, Err(GameError::AlreadyJoined));
        assert_eq!(lobby.waiting().len(), 1);
    }

    #[test]
    fn test_join_unknown_connection() {
        // テスト項目: 登録されていない接続の join は ConnectionNotFound
        // given (前提条件):
        let rules = create_rules();
        let mut lobby = Lobby::new();

        // when (操作):
        let result = lobby.join(
            ConnectionId::new(42),
            name("ghost"),
            &rules,
            Timestamp::new(0),
        );

        // then (期待する結果):
        assert_eq!(result, Err(GameError::ConnectionNotFound));
    }

    #[test]
    fn test_apply_move_unknown_session() {
        // テスト項目: 存在しないセッションへの指し手は InvalidSession
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, alice, _, _) = paired_lobby(&rules);
        let unknown = SessionIdFactory::generate();

        // when (操作):
        let missing = lobby.apply_move(
            alice,
            &move_command(&unknown, "e2", "e4", "white"),
            &rules,
            SeatPolicy::default(),
        );
        let empty = lobby.apply_move(
            alice,
            &MoveCommand {
                session_id: String::new(),
                ..move_command(&unknown, "e2", "e4", "white")
            },
            &rules,
            SeatPolicy::default(),
        );

        // then (期待する結果):
        assert_eq!(missing, Err(GameError::InvalidSession));
        assert_eq!(empty, Err(GameError::InvalidSession));
    }

    #[test]
    fn test_apply_move_then_out_of_turn() {
        // テスト項目: 白の着手後、白が続けて指すと OutOfTurn
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, alice, _, session_id) = paired_lobby(&rules);

        // when (操作):
        let first = lobby.apply_move(
            alice,
            &move_command(&session_id, "e2", "e4", "white"),
            &rules,
            SeatPolicy::default(),
        );
        let second = lobby.apply_move(
            alice,
            &move_command(&session_id, "d2", "d4", "white"),
            &rules,
            SeatPolicy::default(),
        );

        // then (期待する結果):
        let (id, applied) = first.unwrap();
        assert_eq!(id, session_id);
        assert_eq!(applied.turn, Color::Black);
        assert_eq!(second, Err(GameError::OutOfTurn));
        assert_eq!(lobby.session(&session_id).unwrap().move_log.len(), 1);
    }

    #[test]
    fn test_disconnect_seated_abandons_session() {
        // テスト項目: 着席者の切断でセッションが放棄され、close 後は相手が idle に戻り再参加できる
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, alice, bob, session_id) = paired_lobby(&rules);

        // when (操作):
        let outcome = lobby.disconnect(alice);
        let closed = lobby.close_session(&session_id);
        let closed_again = lobby.close_session(&session_id);

        // then (期待する結果):
        assert_eq!(outcome.abandoned_session, Some(session_id.clone()));
        assert!(closed.is_some());
        assert!(closed_again.is_none());
        assert!(lobby.session(&session_id).is_none());
        assert!(lobby.connection(alice).is_none());
        assert_eq!(lobby.connection(bob).unwrap().role, Role::Idle);
        assert_eq!(lobby.connection(bob).unwrap().session_id, None);
    }

    #[test]
    fn test_pool_reopens_after_session_closed() {
        // テスト項目: セッション終了後は新しい参加者が再びペアリングされる
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, alice, bob, session_id) = paired_lobby(&rules);
        lobby.close_session(&session_id);
        let carol = lobby.connect(Timestamp::new(0));

        // when (操作):
        let carol_outcome = lobby.join(carol, name("carol"), &rules, Timestamp::new(5));
        let bob_outcome = lobby.join(bob, name("bob"), &rules, Timestamp::new(6));

        // then (期待する結果):
        assert_eq!(carol_outcome, Ok(JoinOutcome::Waiting { player_id: 1 }));
        let Ok(JoinOutcome::Paired { seats, .. }) = bob_outcome else {
            panic!("expected pairing, got {bob_outcome:?}");
        };
        assert_eq!(seats.white, carol);
        assert_eq!(seats.black, bob);
        assert_ne!(seats.white, alice);
    }

    #[test]
    fn test_disconnect_spectator_keeps_session() {
        // テスト項目: 観戦者の切断はセッションに影響しない
        // given (前提条件):
        let rules = create_rules();
        let (mut lobby, _, _, session_id) = paired_lobby(&rules);
        let carol = lobby.connect(Timestamp::new(0));
        lobby
            .join(carol, name("carol"), &rules, Timestamp::new(3))
            .unwrap();

        // when (操作):
        let outcome = lobby.disconnect(carol);

        // then (期待する結果):
        assert_eq!(outcome.abandoned_session, None);
        let session = lobby.session(&session_id).unwrap();
        assert!(session.spectators.is_empty());
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[test]
    fn test_disconnect_waiting_leaves_pool() {
        // テスト項目: 待機中の切断で待機列から取り除かれる
        // given (前提条件):
        let rules = create_rules();
        let mut lobby = Lobby::new();
        let alice = lobby.connect(Timestamp::new(0));
        lobby
            .join(alice, name("alice"), &rules, Timestamp::new(1))
            .unwrap();

        // when (操作):
        let outcome = lobby.disconnect(alice);

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::default());
        assert!(lobby.waiting().is_empty());
        assert_eq!(lobby.connection_count(), 0);
    }
}
