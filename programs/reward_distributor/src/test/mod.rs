pub mod test_ed25519;

use anchor_lang::error::Error;
use anchor_lang::prelude::*;

use crate::error::RewardDistributorError;

/// Assert that `result` failed with the given program error
pub fn assert_program_error<T>(result: Result<T>, expected: RewardDistributorError) {
    match result {
        Err(Error::AnchorError(err)) => assert_eq!(
            err.error_code_number,
            u32::from(expected),
            "expected {}, got {}",
            expected,
            err.error_name
        ),
        Err(other) => panic!("expected {}, got {}", expected, other),
        Ok(_) => panic!("expected {}, got Ok", expected),
    }
}
