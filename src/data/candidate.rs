use crate::{
    data::student::{StudentId, StudentRecord},
    error::{GradRegResult, InvalidSeatNumberSnafu},
};
use snafu::{OptionExt, ensure};

/// Parses a seat number exactly as it was typed. Seats start at 1.
pub fn parse_seat_num(raw: &str) -> GradRegResult<i32> {
    let seat_num = raw
        .trim()
        .parse::<i32>()
        .ok()
        .context(InvalidSeatNumberSnafu { original: raw })?;
    ensure!(seat_num >= 1, InvalidSeatNumberSnafu { original: raw });
    Ok(seat_num)
}

/// What the presentation layer holds between looking a student up and them confirming.
///
/// Never consulted when registering - the registration transaction re-reads the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub student_id: StudentId,
    pub claimed_seat_num: i32,
    pub record: StudentRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    SeatMismatch,
    AlreadyRegistered,
    Confirmable,
}

impl Candidate {
    pub const fn new(student_id: StudentId, claimed_seat_num: i32, record: StudentRecord) -> Self {
        Self {
            student_id,
            claimed_seat_num,
            record,
        }
    }

    /// The advisory check: only a confirmable candidate gets offered the register button.
    pub const fn state(&self) -> CandidateState {
        if self.record.seat_num != self.claimed_seat_num {
            CandidateState::SeatMismatch
        } else if self.record.is_registered() {
            CandidateState::AlreadyRegistered
        } else {
            CandidateState::Confirmable
        }
    }
}
