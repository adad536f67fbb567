//! Status codes.
//!
//! `Status` is the closed set of editorial states. `StatusCode` is what is
//! actually persisted on a puzzle or comment: a known status, or a raw code
//! left behind by an old rename that must still load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a persisted status code.
pub const MAX_CODE_LENGTH: usize = 2;

/// Puzzle status enumeration.
///
/// Variants serialize to their two-letter storage code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "II")]
    InitialIdea,
    #[serde(rename = "AE")]
    AwaitingEditor,
    #[serde(rename = "ND")]
    NeedsDiscussion,
    #[serde(rename = "WR")]
    WaitingForRound,
    #[serde(rename = "AR")]
    AwaitingReview,
    #[serde(rename = "AA")]
    AwaitingAnswer,
    #[serde(rename = "W")]
    Writing,
    #[serde(rename = "WF")]
    WritingFlexible,
    #[serde(rename = "AT")]
    AwaitingEditorPreTestsolve,
    #[serde(rename = "T")]
    Testsolving,
    #[serde(rename = "TR")]
    AwaitingTestsolveReview,
    #[serde(rename = "R")]
    Revising,
    #[serde(rename = "RP")]
    RevisingPostTestsolving,
    #[serde(rename = "AO")]
    AwaitingApprovalPostTestsolving,
    #[serde(rename = "SS")]
    NeedsSolutionSketch,
    #[serde(rename = "NS")]
    NeedsSolution,
    #[serde(rename = "AS")]
    AwaitingSolutionAndHintsApproval,
    #[serde(rename = "NP")]
    NeedsPostprod,
    #[serde(rename = "PP")]
    ActivelyPostprodding,
    #[serde(rename = "PB")]
    PostprodBlocked,
    #[serde(rename = "BT")]
    PostprodBlockedOnTech,
    #[serde(rename = "AP")]
    AwaitingPostprodApproval,
    #[serde(rename = "NF")]
    NeedsFactcheck,
    #[serde(rename = "NR")]
    NeedsFinalRevisions,
    #[serde(rename = "NC")]
    NeedsCopyEdits,
    #[serde(rename = "NA")]
    NeedsArtCheck,
    #[serde(rename = "NK")]
    NeedsFinalDayFactcheck,
    #[serde(rename = "D")]
    Done,
    #[serde(rename = "DF")]
    Deferred,
    #[serde(rename = "X")]
    Dead,
}

/// The canonical pipeline order. Ranks are positions in this list.
///
/// Inserting or reordering a state here shifts the rank of everything after
/// it; persisted data only stores codes, so no migration is needed.
pub const CANONICAL_ORDER: [Status; 30] = [
    Status::InitialIdea,
    Status::AwaitingEditor,
    Status::NeedsDiscussion,
    Status::WaitingForRound,
    Status::AwaitingReview,
    Status::AwaitingAnswer,
    Status::Writing,
    Status::WritingFlexible,
    Status::AwaitingEditorPreTestsolve,
    Status::Testsolving,
    Status::AwaitingTestsolveReview,
    Status::Revising,
    Status::RevisingPostTestsolving,
    Status::AwaitingApprovalPostTestsolving,
    Status::NeedsSolutionSketch,
    Status::NeedsSolution,
    Status::AwaitingSolutionAndHintsApproval,
    Status::NeedsPostprod,
    Status::ActivelyPostprodding,
    Status::PostprodBlocked,
    Status::PostprodBlockedOnTech,
    Status::AwaitingPostprodApproval,
    Status::NeedsFactcheck,
    Status::NeedsFinalRevisions,
    Status::NeedsCopyEdits,
    Status::NeedsArtCheck,
    Status::NeedsFinalDayFactcheck,
    Status::Done,
    Status::Deferred,
    Status::Dead,
];

impl Status {
    /// Storage code for this status.
    pub const fn code(self) -> &'static str {
        match self {
            Status::InitialIdea => "II",
            Status::AwaitingEditor => "AE",
            Status::NeedsDiscussion => "ND",
            Status::WaitingForRound => "WR",
            Status::AwaitingReview => "AR",
            Status::AwaitingAnswer => "AA",
            Status::Writing => "W",
            Status::WritingFlexible => "WF",
            Status::AwaitingEditorPreTestsolve => "AT",
            Status::Testsolving => "T",
            Status::AwaitingTestsolveReview => "TR",
            Status::Revising => "R",
            Status::RevisingPostTestsolving => "RP",
            Status::AwaitingApprovalPostTestsolving => "AO",
            Status::NeedsSolutionSketch => "SS",
            Status::NeedsSolution => "NS",
            Status::AwaitingSolutionAndHintsApproval => "AS",
            Status::NeedsPostprod => "NP",
            Status::ActivelyPostprodding => "PP",
            Status::PostprodBlocked => "PB",
            Status::PostprodBlockedOnTech => "BT",
            Status::AwaitingPostprodApproval => "AP",
            Status::NeedsFactcheck => "NF",
            Status::NeedsFinalRevisions => "NR",
            Status::NeedsCopyEdits => "NC",
            Status::NeedsArtCheck => "NA",
            Status::NeedsFinalDayFactcheck => "NK",
            Status::Done => "D",
            Status::Deferred => "DF",
            Status::Dead => "X",
        }
    }

    /// Look up a status by storage code.
    pub fn from_code(code: &str) -> Option<Status> {
        CANONICAL_ORDER.iter().copied().find(|s| s.code() == code)
    }

    /// Whether entering this status clears the puzzle's answer assignments.
    pub fn clears_answers(self) -> bool {
        matches!(self, Status::Dead | Status::Deferred)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors for syntactically invalid status codes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusCodeError {
    #[error("status code is empty")]
    Empty,

    #[error("status code {0:?} is longer than {MAX_CODE_LENGTH} characters")]
    TooLong(String),

    #[error("status code {0:?} contains a non-alphanumeric character")]
    InvalidCharacter(String),
}

/// A persisted status value.
///
/// Stale codes deserialize into `Unknown` instead of failing, so a puzzle
/// whose status was renamed out from under it still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Known(Status),
    Unknown(String),
}

impl StatusCode {
    /// Parse a raw code from user input.
    ///
    /// A code is well-formed when it has 1 to `MAX_CODE_LENGTH` ASCII
    /// alphanumeric characters. Well-formed but unrecognized codes are
    /// accepted as `Unknown`.
    pub fn parse(raw: &str) -> Result<StatusCode, StatusCodeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StatusCodeError::Empty);
        }
        if raw.chars().count() > MAX_CODE_LENGTH {
            return Err(StatusCodeError::TooLong(raw.to_string()));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StatusCodeError::InvalidCharacter(raw.to_string()));
        }
        Ok(StatusCode::from(raw))
    }

    /// The known status, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            StatusCode::Known(s) => Some(*s),
            StatusCode::Unknown(_) => None,
        }
    }

    /// The raw storage code.
    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::Known(s) => s.code(),
            StatusCode::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, StatusCode::Known(_))
    }

    /// Check against a specific status
    pub fn is(&self, status: Status) -> bool {
        self.status() == Some(status)
    }
}

impl From<Status> for StatusCode {
    fn from(status: Status) -> Self {
        StatusCode::Known(status)
    }
}

impl From<&str> for StatusCode {
    fn from(raw: &str) -> Self {
        match Status::from_code(raw) {
            Some(status) => StatusCode::Known(status),
            None => StatusCode::Unknown(raw.to_string()),
        }
    }
}

impl FromStr for StatusCode {
    type Err = StatusCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusCode::parse(s)
    }
}

impl PartialEq<Status> for StatusCode {
    fn eq(&self, other: &Status) -> bool {
        self.is(*other)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_short() {
        let codes: HashSet<&str> = CANONICAL_ORDER.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), CANONICAL_ORDER.len());
        assert!(codes.iter().all(|c| !c.is_empty() && c.len() <= MAX_CODE_LENGTH));
    }

    #[test]
    fn test_from_code_round_trips_every_status() {
        for status in CANONICAL_ORDER {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code("ZZ"), None);
    }

    #[test]
    fn test_serde_uses_storage_code() {
        let json = serde_json::to_string(&Status::Dead).unwrap();
        assert_eq!(json, "\"X\"");

        let parsed: Status = serde_json::from_str("\"AO\"").unwrap();
        assert_eq!(parsed, Status::AwaitingApprovalPostTestsolving);
    }

    #[test]
    fn test_stale_code_deserializes_as_unknown() {
        let parsed: StatusCode = serde_json::from_str("\"NH\"").unwrap();
        assert_eq!(parsed, StatusCode::Unknown("NH".to_string()));

        let parsed: StatusCode = serde_json::from_str("\"NP\"").unwrap();
        assert_eq!(parsed, StatusCode::Known(Status::NeedsPostprod));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"NP\"");
    }

    #[test]
    fn test_parse_accepts_unknown_but_well_formed() {
        assert_eq!(StatusCode::parse("T").unwrap(), Status::Testsolving);
        assert_eq!(
            StatusCode::parse("Q9").unwrap(),
            StatusCode::Unknown("Q9".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(StatusCode::parse(""), Err(StatusCodeError::Empty));
        assert_eq!(StatusCode::parse("   "), Err(StatusCodeError::Empty));
        assert!(matches!(
            StatusCode::parse("ABC"),
            Err(StatusCodeError::TooLong(_))
        ));
        assert!(matches!(
            StatusCode::parse("A-"),
            Err(StatusCodeError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_clears_answers() {
        assert!(Status::Dead.clears_answers());
        assert!(Status::Deferred.clears_answers());
        assert!(!Status::Done.clears_answers());
    }
}
