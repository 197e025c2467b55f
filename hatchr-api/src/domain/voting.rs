use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hatchr_shared::errors::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Parses the `direction` field of a vote request.
    pub fn parse_request(raw: Option<&str>) -> Result<Self, AppError> {
        raw.ok_or_else(|| AppError::new(ErrorCode::InvalidVoteDirection, "direction is required"))?
            .parse()
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(AppError::new(
                ErrorCode::InvalidVoteDirection,
                format!("direction must be \"up\" or \"down\", got \"{other}\""),
            )),
        }
    }
}

/// What a vote request does to the caller's vote row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Insert(VoteDirection),
    Remove,
    Switch(VoteDirection),
}

impl VoteAction {
    /// Toggle semantics: repeating the current direction withdraws the vote,
    /// the opposite direction flips the existing row in place.
    pub fn resolve(existing: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match existing {
            None => Self::Insert(requested),
            Some(current) if current == requested => Self::Remove,
            Some(_) => Self::Switch(requested),
        }
    }

    /// The caller's vote after the action has been applied.
    pub fn resulting_vote(&self) -> Option<VoteDirection> {
        match self {
            Self::Insert(dir) | Self::Switch(dir) => Some(*dir),
            Self::Remove => None,
        }
    }

    pub fn is_new_vote(&self) -> bool {
        matches!(self, Self::Insert(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub up: i32,
    pub down: i32,
}

impl VoteTally {
    pub fn net(&self) -> i32 {
        self.up - self.down
    }
}

impl FromIterator<VoteDirection> for VoteTally {
    fn from_iter<I: IntoIterator<Item = VoteDirection>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut tally, dir| {
            match dir {
                VoteDirection::Up => tally.up += 1,
                VoteDirection::Down => tally.down += 1,
            }
            tally
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vote_inserts() {
        let action = VoteAction::resolve(None, VoteDirection::Up);
        assert_eq!(action, VoteAction::Insert(VoteDirection::Up));
        assert!(action.is_new_vote());
        assert_eq!(action.resulting_vote(), Some(VoteDirection::Up));
    }

    #[test]
    fn same_direction_twice_removes_the_vote() {
        let action = VoteAction::resolve(Some(VoteDirection::Down), VoteDirection::Down);
        assert_eq!(action, VoteAction::Remove);
        assert_eq!(action.resulting_vote(), None);
        assert!(!action.is_new_vote());
    }

    #[test]
    fn opposite_direction_switches_in_place() {
        let action = VoteAction::resolve(Some(VoteDirection::Up), VoteDirection::Down);
        assert_eq!(action, VoteAction::Switch(VoteDirection::Down));
        assert_eq!(action.resulting_vote(), Some(VoteDirection::Down));
        assert!(!action.is_new_vote());
    }

    #[test]
    fn tally_counts_both_directions() {
        let tally: VoteTally = [VoteDirection::Up, VoteDirection::Up, VoteDirection::Down, VoteDirection::Up]
            .into_iter()
            .collect();
        assert_eq!(tally, VoteTally { up: 3, down: 1 });
        assert_eq!(tally.net(), 2);
        assert_eq!(VoteTally::default().net(), 0);
    }

    #[test]
    fn direction_parsing() {
        assert_eq!("up".parse::<VoteDirection>().unwrap(), VoteDirection::Up);
        assert_eq!(
            "sideways".parse::<VoteDirection>().unwrap_err().code(),
            Some(ErrorCode::InvalidVoteDirection)
        );
        assert_eq!(
            VoteDirection::parse_request(None).unwrap_err().code(),
            Some(ErrorCode::InvalidVoteDirection)
        );
        // case sensitive, as stored in the check constraint
        assert!("UP".parse::<VoteDirection>().is_err());
    }
}
