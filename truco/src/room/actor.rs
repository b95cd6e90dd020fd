//! Room actor implementation with async message handling.

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{RwLock, mpsc, oneshot},
    time::{Instant, sleep_until},
};
use uuid::Uuid;

use super::{
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    messages::{Joined, RoomMessage, RoomSummary},
};
use crate::{
    bot::{BotDecisionContext, BotDecisionMaker, bot_name},
    game::{
        CardGame, GameInstance, GameView, Phase, PlayerAction, PlayerId, SeatIndex, Team,
        Username,
    },
    net::messages::{MemberView, ServerMessage},
};

/// Shared map of live rooms, keyed by room code.
pub type RoomRegistry = Arc<RwLock<HashMap<String, RoomHandle>>>;

/// Room inbox capacity.
const INBOX_CAPACITY: usize = 100;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    code: String,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, code: String) -> Self {
        Self { sender, code }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether both handles reach the same actor.
    #[must_use]
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> RoomResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomError::RoomClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> RoomResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| RoomError::RoomClosed)
    }

    pub async fn join(
        &self,
        player_id: PlayerId,
        name: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<Joined> {
        self.request(|response| RoomMessage::Join {
            player_id,
            name,
            outbox,
            response,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> RoomResult<()> {
        self.request(|response| RoomMessage::Leave {
            player_id,
            response,
        })
        .await?
    }

    pub async fn add_bot(&self, player_id: PlayerId) -> RoomResult<MemberView> {
        self.request(|response| RoomMessage::AddBot {
            player_id,
            response,
        })
        .await?
    }

    pub async fn remove_bot(&self, player_id: PlayerId) -> RoomResult<()> {
        self.request(|response| RoomMessage::RemoveBot {
            player_id,
            response,
        })
        .await?
    }

    pub async fn start_game(&self, player_id: PlayerId) -> RoomResult<()> {
        self.request(|response| RoomMessage::StartGame {
            player_id,
            response,
        })
        .await?
    }

    pub async fn act(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
        on_behalf_of: Option<SeatIndex>,
    ) -> RoomResult<()> {
        self.request(|response| RoomMessage::Action {
            player_id,
            action,
            on_behalf_of,
            response,
        })
        .await?
    }

    pub async fn view(&self, player_id: PlayerId) -> RoomResult<Option<GameView>> {
        self.request(|response| RoomMessage::GetView {
            player_id,
            response,
        })
        .await?
    }

    pub async fn summary(&self) -> RoomResult<RoomSummary> {
        self.request(|response| RoomMessage::GetSummary { response })
            .await
    }

    pub async fn close(&self) -> RoomResult<()> {
        self.request(|response| RoomMessage::Close { response }).await
    }
}

/// One occupant of a room.
#[derive(Debug)]
struct Member {
    id: PlayerId,
    name: Username,
    is_bot: bool,
    /// `None` for bots and for members whose connection went away.
    outbox: Option<mpsc::Sender<ServerMessage>>,
}

impl Member {
    fn is_human(&self) -> bool {
        !self.is_bot
    }
}

/// Actor owning one room: its roster, its game and its pending timer.
///
/// Every mutation of the room happens inside [`RoomActor::run`], one
/// message at a time, so the game needs no locking.
pub struct RoomActor {
    code: String,

    config: RoomConfig,

    created_at: DateTime<Utc>,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Occupants in seat order; once a game starts, index == seat
    members: Vec<Member>,

    host: Option<PlayerId>,

    game: Option<GameInstance>,

    /// When the next scheduled step (bot move or continuation) runs
    deadline: Option<Instant>,

    bot: BotDecisionMaker,

    rng: StdRng,

    /// Registry to deregister from on teardown
    registry: Option<RoomRegistry>,

    /// Our own inbox, to recognise our registry entry without keeping the
    /// inbox open.
    own_sender: mpsc::WeakSender<RoomMessage>,

    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor and the handle used to reach it.
    pub fn new(code: String, config: RoomConfig, registry: Option<RoomRegistry>) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (bot, rng) = match config.seed {
            Some(seed) => (
                BotDecisionMaker::with_seed(config.bot.clone(), seed),
                StdRng::seed_from_u64(seed),
            ),
            None => (
                BotDecisionMaker::with_config(config.bot.clone()),
                StdRng::from_os_rng(),
            ),
        };
        let actor = Self {
            code: code.clone(),
            config,
            created_at: Utc::now(),
            inbox,
            members: Vec::new(),
            host: None,
            game: None,
            deadline: None,
            bot,
            rng,
            registry,
            own_sender: sender.downgrade(),
            is_closed: false,
        };
        (actor, RoomHandle::new(sender, code))
    }

    /// Run the room event loop until the room closes or every handle is
    /// dropped.
    pub async fn run(mut self) {
        log::info!("room {} ({}) open", self.code, self.config.game);

        loop {
            let deadline = self.deadline;
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },

                () = wait_until(deadline) => {
                    self.deadline = None;
                    self.run_scheduled_step();
                }
            }

            if self.is_closed {
                break;
            }
        }

        self.teardown().await;
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player_id,
                name,
                outbox,
                response,
            } => {
                let result = self.handle_join(player_id, name, outbox);
                let _ = response.send(result);
            }

            RoomMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.handle_leave(player_id);
                let _ = response.send(result);
            }

            RoomMessage::AddBot {
                player_id,
                response,
            } => {
                let result = self.handle_add_bot(player_id);
                let _ = response.send(result);
            }

            RoomMessage::RemoveBot {
                player_id,
                response,
            } => {
                let result = self.handle_remove_bot(player_id);
                let _ = response.send(result);
            }

            RoomMessage::StartGame {
                player_id,
                response,
            } => {
                let result = self.handle_start(player_id);
                let _ = response.send(result);
            }

            RoomMessage::Action {
                player_id,
                action,
                on_behalf_of,
                response,
            } => {
                let result = self.handle_action(player_id, action, on_behalf_of);
                if let Err(e) = &result {
                    log::debug!("room {}: rejected {action} from {player_id}: {e}", self.code);
                }
                let _ = response.send(result);
            }

            RoomMessage::GetView {
                player_id,
                response,
            } => {
                let result = self.member_seat(player_id).map(|seat| {
                    self.game.as_ref().map(|game| game.view_for(Some(seat)))
                });
                let _ = response.send(result);
            }

            RoomMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(());
            }
        }
    }

    fn game_in_progress(&self) -> bool {
        self.game
            .as_ref()
            .is_some_and(|game| game.phase() != Phase::Finished)
    }

    fn humans(&self) -> usize {
        self.members.iter().filter(|m| m.is_human()).count()
    }

    fn member_seat(&self, player_id: PlayerId) -> RoomResult<SeatIndex> {
        self.members
            .iter()
            .position(|m| m.id == player_id && m.is_human())
            .ok_or(RoomError::NotInRoom)
    }

    fn ensure_host(&self, player_id: PlayerId) -> RoomResult<()> {
        self.member_seat(player_id)?;
        if self.host == Some(player_id) {
            Ok(())
        } else {
            Err(RoomError::NotHost)
        }
    }

    fn ensure_lobby(&self) -> RoomResult<()> {
        if self.game_in_progress() {
            Err(RoomError::GameAlreadyStarted)
        } else {
            Ok(())
        }
    }

    fn member_views(&self) -> Vec<MemberView> {
        self.members
            .iter()
            .enumerate()
            .map(|(seat, m)| MemberView {
                player_id: m.id,
                name: m.name.clone(),
                player_index: seat,
                is_bot: m.is_bot,
                is_host: self.host == Some(m.id),
            })
            .collect()
    }

    fn summary(&self) -> RoomSummary {
        let humans = self.humans();
        RoomSummary {
            code: self.code.clone(),
            game: self.config.game,
            humans,
            bots: self.members.len() - humans,
            capacity: self.config.max_players,
            started: self.game_in_progress(),
            phase: self.game.as_ref().map(CardGame::phase),
            created_at: self.created_at,
        }
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<Joined> {
        if self.members.iter().any(|m| m.id == player_id) {
            return Err(RoomError::AlreadyJoined);
        }
        self.ensure_lobby()?;
        if self.members.len() >= self.config.max_players {
            return Err(RoomError::RoomFull {
                capacity: self.config.max_players,
            });
        }

        let is_creator = self.members.is_empty();
        let player_index = self.members.len();
        if self.host.is_none() {
            self.host = Some(player_id);
        }
        let is_host = self.host == Some(player_id);
        let greeting = if is_creator {
            ServerMessage::RoomCreated {
                room_id: self.code.clone(),
                player_id,
                is_host,
                game_type: self.config.game,
            }
        } else {
            ServerMessage::RoomJoined {
                room_id: self.code.clone(),
                player_id,
                player_index,
            }
        };
        let _ = outbox.try_send(greeting);

        log::info!("room {}: {name} joined at seat {player_index}", self.code);
        self.members.push(Member {
            id: player_id,
            name,
            is_bot: false,
            outbox: Some(outbox),
        });

        let players = self.member_views();
        if let Some(player) = players.get(player_index).cloned() {
            self.broadcast_except(
                player_id,
                &ServerMessage::PlayerJoined {
                    player,
                    player_count: players.len(),
                },
            );
        }
        self.broadcast(&ServerMessage::PlayersUpdated { players });

        Ok(Joined {
            room_id: self.code.clone(),
            player_index,
            is_host,
        })
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> RoomResult<()> {
        let seat = self.member_seat(player_id)?;

        if self.game_in_progress() {
            // The seat stays in the game; a bot plays it from now on.
            if let Some(game) = self.game.as_mut() {
                game.hand_to_bot(seat)?;
            }
            let member = &mut self.members[seat];
            member.is_bot = true;
            member.outbox = None;
            log::info!("room {}: seat {seat} handed to a bot", self.code);
        } else {
            self.members.remove(seat);
            log::info!("room {}: seat {seat} left", self.code);
        }

        if self.host == Some(player_id) {
            self.host = self.members.iter().find(|m| m.is_human()).map(|m| m.id);
            if let Some(host) = self.host {
                self.broadcast(&ServerMessage::HostChanged { player_id: host });
            }
        }

        if self.humans() == 0 {
            log::info!("room {}: no humans left, closing", self.code);
            self.is_closed = true;
            return Ok(());
        }

        self.broadcast(&ServerMessage::PlayerLeft {
            player_id,
            player_count: self.humans(),
        });
        self.broadcast(&ServerMessage::PlayersUpdated {
            players: self.member_views(),
        });
        // A step already on the clock is unaffected by who holds the seat.
        if self.game_in_progress() && self.deadline.is_none() {
            self.schedule_next_step();
        }
        Ok(())
    }

    fn handle_add_bot(&mut self, player_id: PlayerId) -> RoomResult<MemberView> {
        self.member_seat(player_id)?;
        self.ensure_lobby()?;
        if self.members.len() >= self.config.max_players {
            return Err(RoomError::RoomFull {
                capacity: self.config.max_players,
            });
        }

        let seat = self.members.len();
        let bot_id = Uuid::new_v4();
        let name = bot_name(seat, &mut self.rng);
        log::debug!("room {}: bot {name} added at seat {seat}", self.code);
        self.members.push(Member {
            id: bot_id,
            name,
            is_bot: true,
            outbox: None,
        });

        let players = self.member_views();
        let added = players[seat].clone();
        self.broadcast(&ServerMessage::PlayersUpdated { players });
        Ok(added)
    }

    fn handle_remove_bot(&mut self, player_id: PlayerId) -> RoomResult<()> {
        self.member_seat(player_id)?;
        self.ensure_lobby()?;
        let seat = self
            .members
            .iter()
            .rposition(|m| m.is_bot)
            .ok_or(RoomError::NoBotToRemove)?;
        self.members.remove(seat);
        self.broadcast(&ServerMessage::PlayersUpdated {
            players: self.member_views(),
        });
        Ok(())
    }

    fn handle_start(&mut self, player_id: PlayerId) -> RoomResult<()> {
        self.ensure_host(player_id)?;
        self.ensure_lobby()?;

        let participants = self
            .members
            .iter()
            .map(|m| (m.id, m.name.clone(), m.is_bot))
            .collect::<Vec<_>>();
        let mut game = match self.config.seed {
            Some(seed) => GameInstance::with_seed(self.config.game, participants, seed)?,
            None => GameInstance::new(self.config.game, participants)?,
        };
        game.start()?;

        log::info!(
            "room {}: {} started with {} players",
            self.code,
            self.config.game,
            self.members.len()
        );
        for (seat, member) in self.members.iter_mut().enumerate() {
            let view = game.view_for(Some(seat));
            send_to(
                &self.code,
                member,
                ServerMessage::GameStarted {
                    players: view.players,
                    local_player_index: Some(seat),
                    current_player: view.current_player,
                },
            );
        }
        self.game = Some(game);
        self.publish();
        Ok(())
    }

    fn handle_action(
        &mut self,
        player_id: PlayerId,
        action: PlayerAction,
        on_behalf_of: Option<SeatIndex>,
    ) -> RoomResult<()> {
        let own_seat = self.member_seat(player_id)?;
        if !self.game_in_progress() {
            return Err(RoomError::GameNotStarted);
        }
        let seat = match on_behalf_of {
            Some(seat) if seat != own_seat => {
                self.check_bot_partner(own_seat, seat)?;
                seat
            }
            _ => own_seat,
        };
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;
        game.apply(seat, action)?;
        self.publish();
        Ok(())
    }

    /// A human may answer for a bot seated on their own team.
    fn check_bot_partner(&self, own_seat: SeatIndex, seat: SeatIndex) -> RoomResult<()> {
        let is_partner = self
            .game
            .as_ref()
            .filter(|game| game.kind().is_team_game())
            .and_then(|game| game.players().get(seat))
            .is_some_and(|p| p.is_bot && p.team == Some(Team::for_seat(own_seat)));
        if is_partner {
            Ok(())
        } else {
            Err(RoomError::NotYourBot(seat))
        }
    }

    /// Relay drained game events, refresh every member's private view and
    /// schedule whatever comes next.
    fn publish(&mut self) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let events = game.drain_events();
        for event in events {
            log::debug!("room {}: {event}", self.code);
            self.broadcast(&ServerMessage::from(event));
        }
        self.send_views();
        self.schedule_next_step();
    }

    fn send_views(&mut self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        for (seat, member) in self.members.iter_mut().enumerate() {
            if member.outbox.is_some() {
                let view = game.view_for(Some(seat));
                send_to(&self.code, member, ServerMessage::State { view });
            }
        }
    }

    /// Arm the single room timer for the game's next automatic step.
    fn schedule_next_step(&mut self) {
        self.deadline = None;
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let delay = if let Some(step) = game.continuation() {
            self.config.delay_for(step)
        } else if let Some(seat) = game.awaiting_seat()
            && game.players().get(seat).is_some_and(|p| p.is_bot)
        {
            self.config.bot_delay
        } else {
            return;
        };
        self.deadline = Some(Instant::now() + delay);
    }

    fn run_scheduled_step(&mut self) {
        let Some(step) = self.game.as_ref().map(CardGame::continuation) else {
            return;
        };
        let result = match step {
            Some(_) => self.game.as_mut().map_or(Ok(()), |game| game.resume()),
            None => self.play_bot_turn(),
        };
        if let Err(e) = result {
            log::error!("room {}: scheduled step failed: {e}", self.code);
        }
        self.publish();
    }

    fn play_bot_turn(&mut self) -> crate::game::Result<()> {
        let Some(game) = self.game.as_ref() else {
            return Ok(());
        };
        let Some(seat) = game.awaiting_seat() else {
            return Ok(());
        };
        let player = game.seats().get(seat)?;
        if !player.is_bot {
            return Ok(());
        }
        let legal = game.legal_actions(seat);
        let ctx = BotDecisionContext {
            kind: game.kind(),
            legal: &legal,
            hand: &player.hand,
        };
        let Some(action) = self.bot.decide_action(&ctx) else {
            log::warn!("room {}: bot at seat {seat} has no legal action", self.code);
            return Ok(());
        };
        log::debug!("room {}: bot at seat {seat} chose {action}", self.code);
        match self.game.as_mut() {
            Some(game) => game.apply(seat, action),
            None => Ok(()),
        }
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        for member in &mut self.members {
            send_to(&self.code, member, message.clone());
        }
    }

    fn broadcast_except(&mut self, skip: PlayerId, message: &ServerMessage) {
        for member in self.members.iter_mut().filter(|m| m.id != skip) {
            send_to(&self.code, member, message.clone());
        }
    }

    async fn teardown(&mut self) {
        self.deadline = None;
        self.game = None;
        for member in &mut self.members {
            member.outbox = None;
        }
        if let Some(registry) = self.registry.take() {
            let mut rooms = registry.write().await;
            // The code may already belong to a newer room.
            let ours = self.own_sender.upgrade().is_some_and(|sender| {
                rooms
                    .get(&self.code)
                    .is_some_and(|handle| handle.sender.same_channel(&sender))
            });
            if ours {
                rooms.remove(&self.code);
            }
        }
        log::info!("room {} closed", self.code);
    }
}

/// Deliver without blocking the room. A full outbox drops the message; a
/// closed one is forgotten.
fn send_to(code: &str, member: &mut Member, message: ServerMessage) {
    let Some(outbox) = &member.outbox else {
        return;
    };
    match outbox.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("room {code}: outbox of {} full, dropping message", member.id);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("room {code}: {} disconnected", member.id);
            member.outbox = None;
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
