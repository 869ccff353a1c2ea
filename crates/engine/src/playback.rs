//! The stream-policy consumer of decision codes.
//!
//! A stream policy tree decides over four states, which are folded into the
//! three states a player understands.

use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::eval::{Decision, EvalError};

/// Decision values of a stream policy tree, in code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDecision {
    Teardown = 0,
    Disconnected = 1,
    Connected = 2,
    Suspended = 3,
}

impl StreamDecision {
    pub const ALL: [StreamDecision; 4] = [
        StreamDecision::Teardown,
        StreamDecision::Disconnected,
        StreamDecision::Connected,
        StreamDecision::Suspended,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StreamDecision::Teardown => "teardown",
            StreamDecision::Disconnected => "disconnected",
            StreamDecision::Connected => "connected",
            StreamDecision::Suspended => "suspended",
        }
    }

    pub fn playback(self) -> PlaybackState {
        match self {
            StreamDecision::Teardown | StreamDecision::Disconnected => PlaybackState::Stop,
            StreamDecision::Connected => PlaybackState::Play,
            StreamDecision::Suspended => PlaybackState::Pause,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} is not a stream decision code")]
pub struct InvalidDecisionCode(pub i32);

impl TryFrom<i32> for StreamDecision {
    type Error = InvalidDecisionCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(InvalidDecisionCode(code))
    }
}

impl fmt::Display for StreamDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Stop,
    Pause,
    Play,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Stop => "stop",
            PlaybackState::Pause => "pause",
            PlaybackState::Play => "play",
        }
    }
}

impl From<StreamDecision> for PlaybackState {
    fn from(decision: StreamDecision) -> Self {
        decision.playback()
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns evaluation results into decision codes for a single stream.
///
/// When no branch matches, the stream keeps its previous decision, or gets
/// code 0 if it never had one.
#[derive(Debug, Clone, Default)]
pub struct DecisionPolicy {
    previous: Option<i32>,
}

impl DecisionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<i32> {
        self.previous
    }

    pub fn apply(&mut self, result: Result<Decision<'_>, EvalError>) -> Result<i32, EvalError> {
        let code = match result {
            Ok(decision) => decision.code().unwrap_or(0),
            Err(EvalError::NoMatch) => {
                let code = self.previous.unwrap_or(0);
                trace!(code, "no branch matched, keeping previous decision");
                code
            }
            Err(err) => return Err(err),
        };
        self.previous = Some(code);
        Ok(code)
    }

    /// Like [`DecisionPolicy::apply`], mapped onto a player state.
    pub fn playback(
        &mut self,
        result: Result<Decision<'_>, EvalError>,
    ) -> Result<PlaybackState, EvalError> {
        let code = self.apply(result)?;
        Ok(StreamDecision::try_from(code)
            .map(StreamDecision::playback)
            .unwrap_or(PlaybackState::Stop))
    }
}
