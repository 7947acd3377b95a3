pub mod entities;
pub mod membership;
pub mod requests;
pub mod responses;
