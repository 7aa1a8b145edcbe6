pub mod candidate;
pub mod student;

pub use candidate::{Candidate, CandidateState, parse_seat_num};
pub use student::{Registration, StudentId, StudentRecord};
