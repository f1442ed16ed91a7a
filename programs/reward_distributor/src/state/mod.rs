pub mod reward_account;

pub use reward_account::*;
