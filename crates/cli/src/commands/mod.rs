pub mod doctor;
pub mod onboard;
pub mod query;
pub mod serve;
pub mod status;
