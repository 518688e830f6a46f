pub mod assessment;
pub mod responses;
