#[cfg(test)]
mod tests {
    use anchor_lang::prelude::*;

    use crate::constants::VOUCHER_MESSAGE_LEN;
    use crate::error::RewardDistributorError;
    use crate::test::assert_program_error;
    use crate::utils::*;

    fn sample_signature() -> [u8; SIGNATURE_LEN] {
        let mut signature = [0u8; SIGNATURE_LEN];
        for (i, byte) in signature.iter_mut().enumerate() {
            *byte = i as u8;
        }
        signature
    }

    #[test]
    fn test_voucher_message_layout() {
        let device = Pubkey::new_unique();
        let message = voucher_message(&device, 0x0102_0304_0506_0708, 1_700_000_000_000);

        assert_eq!(message.len(), VOUCHER_MESSAGE_LEN);
        assert_eq!(&message[..32], device.as_ref());
        assert_eq!(
            &message[32..40],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(&message[40..], &1_700_000_000_000u64.to_le_bytes());
    }

    #[test]
    fn test_rotation_message_is_base58_text() {
        let new_authority = Pubkey::new_unique();
        let message = rotation_message(&new_authority);
        let expected = format!("I want to claim: {}", new_authority);

        assert_eq!(message, expected.as_bytes());
    }

    #[test]
    fn test_instruction_data_canonical_offsets() {
        let signer = Pubkey::new_unique();
        let message = b"hello device";
        let data = new_ed25519_instruction_data(&signer, &sample_signature(), message);

        assert_eq!(data[0], 1, "one signature");
        assert_eq!(data[1], 0, "padding");
        assert_eq!(u16::from_le_bytes([data[2], data[3]]), 48, "signature offset");
        assert_eq!(u16::from_le_bytes([data[6], data[7]]), 16, "public key offset");
        assert_eq!(u16::from_le_bytes([data[10], data[11]]), 112, "message offset");
        assert_eq!(u16::from_le_bytes([data[12], data[13]]), message.len() as u16);
        assert_eq!(data.len(), 112 + message.len());
    }

    #[test]
    fn test_parse_recovers_fields() {
        let signer = Pubkey::new_unique();
        let message = voucher_message(&Pubkey::new_unique(), 42, 7);
        let data = new_ed25519_instruction_data(&signer, &sample_signature(), &message);

        let verification = Ed25519Verification::parse(&data).unwrap();
        assert_eq!(verification.signer, signer);
        assert_eq!(verification.signature, sample_signature());
        assert_eq!(verification.message, message.to_vec());
    }

    #[test]
    fn test_parse_rejects_truncated_data() {
        let signer = Pubkey::new_unique();
        let data = new_ed25519_instruction_data(&signer, &sample_signature(), b"truncate me");

        assert_program_error(
            Ed25519Verification::parse(&data[..10]),
            RewardDistributorError::InvalidInstruction,
        );
        assert_program_error(
            Ed25519Verification::parse(&data[..data.len() - 1]),
            RewardDistributorError::InvalidInstruction,
        );
        assert_program_error(
            Ed25519Verification::parse(&[]),
            RewardDistributorError::InvalidInstruction,
        );
    }

    #[test]
    fn test_parse_rejects_multiple_signatures() {
        let signer = Pubkey::new_unique();
        let mut data = new_ed25519_instruction_data(&signer, &sample_signature(), b"msg");
        data[0] = 2;

        assert_program_error(
            Ed25519Verification::parse(&data),
            RewardDistributorError::InvalidInstruction,
        );
    }

    #[test]
    fn test_parse_rejects_cross_instruction_references() {
        let signer = Pubkey::new_unique();
        let data = new_ed25519_instruction_data(&signer, &sample_signature(), b"msg");

        // signature, public key and message instruction indices
        for index_at in [4usize, 8, 14] {
            let mut tampered = data.clone();
            tampered[index_at..index_at + 2].copy_from_slice(&0u16.to_le_bytes());
            assert_program_error(
                Ed25519Verification::parse(&tampered),
                RewardDistributorError::InvalidInstruction,
            );
        }
    }

    #[test]
    fn test_parse_rejects_offsets_past_end() {
        let signer = Pubkey::new_unique();
        let mut data = new_ed25519_instruction_data(&signer, &sample_signature(), b"msg");
        data[12..14].copy_from_slice(&u16::MAX.to_le_bytes());

        assert_program_error(
            Ed25519Verification::parse(&data),
            RewardDistributorError::InvalidInstruction,
        );
    }

    #[test]
    fn test_expect_binds_signer_and_message() {
        let signer = Pubkey::new_unique();
        let message = voucher_message(&Pubkey::new_unique(), 10, 99);
        let data = new_ed25519_instruction_data(&signer, &sample_signature(), &message);
        let verification = Ed25519Verification::parse(&data).unwrap();

        assert!(verification.expect(&signer, &message).is_ok());

        assert_program_error(
            verification.expect(&Pubkey::new_unique(), &message),
            RewardDistributorError::InvalidSignature,
        );

        let mut other_message = message;
        other_message[VOUCHER_MESSAGE_LEN - 1] ^= 0x01;
        assert_program_error(
            verification.expect(&signer, &other_message),
            RewardDistributorError::InvalidSignature,
        );
    }
}
