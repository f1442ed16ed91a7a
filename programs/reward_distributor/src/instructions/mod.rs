pub mod initialize_reward_account;
pub mod change_authority;
pub mod change_authority_with_device_sig;
pub mod claim_rewards;

pub use initialize_reward_account::*;
pub use change_authority::*;
pub use change_authority_with_device_sig::*;
pub use claim_rewards::*;
