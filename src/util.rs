pub mod object;
pub mod poll;
pub mod retry;
