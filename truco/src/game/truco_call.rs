//! Truco call negotiation overlaid on the turn order.
//!
//! A hand starts at value 1. Calling asks the opposing team to play for 3;
//! they may accept, reject (conceding the hand at the previous rung) or
//! raise by 3, which sends the question back the other way. Nothing else
//! can happen on the table while a call is pending.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::{TRUCO_BASE_VALUE, TRUCO_FIRST_CALL_VALUE, TRUCO_MAX_VALUE, TRUCO_RAISE_STEP};
use super::entities::{SeatIndex, Team};
use super::errors::{GameError, Result};

/// Answer to a pending call. Encoded on the wire as 1/2/3.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TrucoResponse {
    Accept,
    Reject,
    Raise,
}

impl TryFrom<u8> for TrucoResponse {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Accept),
            2 => Ok(Self::Reject),
            3 => Ok(Self::Raise),
            other => Err(GameError::IllegalTrucoResponse(format!(
                "unknown response code {other}"
            ))),
        }
    }
}

impl From<TrucoResponse> for u8 {
    fn from(value: TrucoResponse) -> Self {
        match value {
            TrucoResponse::Accept => 1,
            TrucoResponse::Reject => 2,
            TrucoResponse::Raise => 3,
        }
    }
}

impl fmt::Display for TrucoResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Accept => "accepts",
            Self::Reject => "rejects",
            Self::Raise => "raises",
        };
        write!(f, "{repr}")
    }
}

/// Public view of a pending call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrucoState {
    pub is_active: bool,
    /// Team whose call awaits an answer from the other team.
    pub caller_team: Team,
    pub current_value: u8,
    /// Value that becomes current if the call is accepted.
    pub potential_value: u8,
}

impl TrucoState {
    #[must_use]
    pub fn awaiting_team(&self) -> Team {
        self.caller_team.opponent()
    }
}

#[derive(Clone, Debug)]
struct PendingCall {
    state: TrucoState,
    /// Seat that held the turn when the first call interrupted play.
    resume_seat: SeatIndex,
    /// Seat that made the most recent call or raise.
    last_caller: SeatIndex,
    /// Seat expected to answer (any seat of the awaiting team may).
    responder: SeatIndex,
}

/// What a response did to the hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallOutcome {
    /// Stakes moved up; play resumes at `resume_seat`.
    Accepted { value: u8, resume_seat: SeatIndex },
    /// The hand is over: `winner` takes it at `value`.
    Rejected { winner: Team, value: u8 },
    /// The call bounced back; `responder` must now answer.
    Raised { state: TrucoState, responder: SeatIndex },
}

/// Stakes of the current hand and any call in flight.
#[derive(Clone, Debug)]
pub struct TrucoStakes {
    value: u8,
    pending: Option<PendingCall>,
}

impl Default for TrucoStakes {
    fn default() -> Self {
        Self {
            value: TRUCO_BASE_VALUE,
            pending: None,
        }
    }
}

impl TrucoStakes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the hand.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.value
    }

    #[must_use]
    pub fn state(&self) -> Option<TrucoState> {
        self.pending.as_ref().map(|p| p.state)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn awaiting_team(&self) -> Option<Team> {
        self.pending.as_ref().map(|p| p.state.awaiting_team())
    }

    #[must_use]
    pub fn responder_seat(&self) -> Option<SeatIndex> {
        self.pending.as_ref().map(|p| p.responder)
    }

    /// Whether a new call may be opened.
    #[must_use]
    pub fn can_call(&self) -> bool {
        self.pending.is_none() && self.value < TRUCO_MAX_VALUE
    }

    /// Whether the pending call can still be raised.
    #[must_use]
    pub fn can_raise(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.state.potential_value < TRUCO_MAX_VALUE)
    }

    /// Back to a plain hand worth 1.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Open a call. `resume_seat` is the seat holding the turn, which is
    /// where play continues once the call is accepted.
    pub fn call(
        &mut self,
        caller_seat: SeatIndex,
        caller_team: Team,
        responder: SeatIndex,
    ) -> Result<TrucoState> {
        if self.pending.is_some() {
            return Err(GameError::TrucoPending);
        }
        if self.value >= TRUCO_MAX_VALUE {
            return Err(GameError::IllegalTrucoCall(format!(
                "the hand is already worth {TRUCO_MAX_VALUE}"
            )));
        }

        let potential_value = if self.value == TRUCO_BASE_VALUE {
            TRUCO_FIRST_CALL_VALUE
        } else {
            self.value + TRUCO_RAISE_STEP
        };
        let state = TrucoState {
            is_active: true,
            caller_team,
            current_value: self.value,
            potential_value,
        };
        self.pending = Some(PendingCall {
            state,
            resume_seat: caller_seat,
            last_caller: caller_seat,
            responder,
        });
        Ok(state)
    }

    /// Answer the pending call on behalf of `team`.
    pub fn respond(
        &mut self,
        seat: SeatIndex,
        team: Team,
        response: TrucoResponse,
    ) -> Result<CallOutcome> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(GameError::IllegalTrucoResponse(
                "no truco call is pending".to_string(),
            ));
        };
        if team != pending.state.awaiting_team() {
            return Err(GameError::IllegalTrucoResponse(format!(
                "{team} is not being asked"
            )));
        }

        match response {
            TrucoResponse::Accept => {
                let value = pending.state.potential_value;
                let resume_seat = pending.resume_seat;
                self.value = value;
                self.pending = None;
                Ok(CallOutcome::Accepted { value, resume_seat })
            }
            TrucoResponse::Reject => {
                let value = pending
                    .state
                    .potential_value
                    .saturating_sub(TRUCO_RAISE_STEP)
                    .max(TRUCO_BASE_VALUE);
                let winner = pending.state.caller_team;
                self.value = value;
                self.pending = None;
                Ok(CallOutcome::Rejected { winner, value })
            }
            TrucoResponse::Raise => {
                if pending.state.potential_value >= TRUCO_MAX_VALUE {
                    return Err(GameError::IllegalTrucoResponse(format!(
                        "cannot raise past {TRUCO_MAX_VALUE}"
                    )));
                }
                pending.state.potential_value += TRUCO_RAISE_STEP;
                pending.state.caller_team = team;
                pending.responder = pending.last_caller;
                pending.last_caller = seat;
                Ok(CallOutcome::Raised {
                    state: pending.state,
                    responder: pending.responder,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_codes() {
        assert_eq!(TrucoResponse::try_from(1).unwrap(), TrucoResponse::Accept);
        assert_eq!(TrucoResponse::try_from(2).unwrap(), TrucoResponse::Reject);
        assert_eq!(TrucoResponse::try_from(3).unwrap(), TrucoResponse::Raise);
        assert!(TrucoResponse::try_from(4).is_err());
        assert_eq!(u8::from(TrucoResponse::Raise), 3);

        let parsed: TrucoResponse = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, TrucoResponse::Reject);
        assert!(serde_json::from_str::<TrucoResponse>("0").is_err());
    }

    #[test]
    fn test_first_call_jumps_to_three() {
        let mut stakes = TrucoStakes::new();
        let state = stakes.call(0, Team::A, 1).unwrap();
        assert!(state.is_active);
        assert_eq!(state.current_value, 1);
        assert_eq!(state.potential_value, 3);
        assert_eq!(stakes.awaiting_team(), Some(Team::B));
        assert_eq!(stakes.responder_seat(), Some(1));
    }

    #[test]
    fn test_call_while_pending_fails() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        assert_eq!(stakes.call(1, Team::B, 2), Err(GameError::TrucoPending));
    }

    #[test]
    fn test_accept_moves_value_and_returns_turn() {
        let mut stakes = TrucoStakes::new();
        stakes.call(2, Team::A, 3).unwrap();
        let outcome = stakes.respond(3, Team::B, TrucoResponse::Accept).unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Accepted {
                value: 3,
                resume_seat: 2
            }
        );
        assert_eq!(stakes.value(), 3);
        assert!(stakes.state().is_none());
    }

    #[test]
    fn test_second_call_after_accept_adds_three() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        stakes.respond(1, Team::B, TrucoResponse::Accept).unwrap();
        let state = stakes.call(1, Team::B, 2).unwrap();
        assert_eq!(state.current_value, 3);
        assert_eq!(state.potential_value, 6);
    }

    #[test]
    fn test_raise_then_accept_returns_to_original_caller() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        let raised = stakes.respond(1, Team::B, TrucoResponse::Raise).unwrap();
        match raised {
            CallOutcome::Raised { state, responder } => {
                assert_eq!(state.potential_value, 6);
                assert_eq!(state.caller_team, Team::B);
                assert_eq!(responder, 0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let accepted = stakes.respond(0, Team::A, TrucoResponse::Accept).unwrap();
        assert_eq!(
            accepted,
            CallOutcome::Accepted {
                value: 6,
                resume_seat: 0
            }
        );
    }

    #[test]
    fn test_reject_first_call_awards_caller_at_one() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        let outcome = stakes.respond(1, Team::B, TrucoResponse::Reject).unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Rejected {
                winner: Team::A,
                value: 1
            }
        );
    }

    #[test]
    fn test_reject_after_raise_awards_raiser() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        stakes.respond(1, Team::B, TrucoResponse::Raise).unwrap();
        let outcome = stakes.respond(0, Team::A, TrucoResponse::Reject).unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Rejected {
                winner: Team::B,
                value: 3
            }
        );
    }

    #[test]
    fn test_wrong_team_cannot_respond() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        let err = stakes.respond(2, Team::A, TrucoResponse::Accept).unwrap_err();
        assert!(matches!(err, GameError::IllegalTrucoResponse(_)));
        // Still pending and unchanged
        assert_eq!(stakes.state().unwrap().potential_value, 3);
    }

    #[test]
    fn test_respond_without_call() {
        let mut stakes = TrucoStakes::new();
        assert!(matches!(
            stakes.respond(1, Team::B, TrucoResponse::Accept),
            Err(GameError::IllegalTrucoResponse(_))
        ));
    }

    #[test]
    fn test_raise_caps_at_twelve() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        stakes.respond(1, Team::B, TrucoResponse::Raise).unwrap(); // 6
        stakes.respond(0, Team::A, TrucoResponse::Raise).unwrap(); // 9
        stakes.respond(1, Team::B, TrucoResponse::Raise).unwrap(); // 12
        assert_eq!(stakes.state().unwrap().potential_value, 12);
        assert!(!stakes.can_raise());

        let err = stakes.respond(0, Team::A, TrucoResponse::Raise).unwrap_err();
        assert!(matches!(err, GameError::IllegalTrucoResponse(_)));
        assert_eq!(stakes.state().unwrap().potential_value, 12);

        // Accepting at 12 is still fine
        stakes.respond(0, Team::A, TrucoResponse::Accept).unwrap();
        assert_eq!(stakes.value(), 12);
        assert!(!stakes.can_call());
        assert!(matches!(
            stakes.call(0, Team::A, 1),
            Err(GameError::IllegalTrucoCall(_))
        ));
    }

    #[test]
    fn test_reset() {
        let mut stakes = TrucoStakes::new();
        stakes.call(0, Team::A, 1).unwrap();
        stakes.reset();
        assert_eq!(stakes.value(), 1);
        assert!(!stakes.is_pending());
    }
}
