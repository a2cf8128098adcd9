//! Transactions produced by the swap builder, ready for local signing.

use fee_relayer::FeeAmount;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;

use crate::error::SwapError;

/// A transaction assembled by the builder, signed by nobody yet.
pub struct PreparedTransaction {
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
    /// Ephemeral keys that must sign besides the owner.
    pub signers: Vec<Keypair>,
    /// Relay account paying the network fee.
    pub fee_payer: Pubkey,
    /// Blockhash the transaction is bound to.
    pub recent_blockhash: Hash,
    /// Network fee and rent the relay fronts for this transaction.
    pub expected_fee: FeeAmount,
}

impl std::fmt::Debug for PreparedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTransaction")
            .field("instructions", &self.instructions.len())
            .field(
                "signers",
                &self.signers.iter().map(Signer::pubkey).collect::<Vec<_>>(),
            )
            .field("fee_payer", &self.fee_payer)
            .field("expected_fee", &self.expected_fee)
            .finish_non_exhaustive()
    }
}

impl PreparedTransaction {
    /// Compiles the instructions with the fee payer as payer.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Signing`] if the message cannot be compiled.
    pub fn message(&self) -> Result<VersionedMessage, SwapError> {
        MessageV0::try_compile(&self.fee_payer, &self.instructions, &[], self.recent_blockhash)
            .map(VersionedMessage::V0)
            .map_err(|e| SwapError::Signing(format!("{e:?}")))
    }

    /// Signs with `owner` and the ephemeral keys. The fee payer's slot keeps
    /// a default signature for the relay to fill; `owner` is skipped when the
    /// transaction does not need it.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Signing`] if compiling or signing fails, or if an
    /// ephemeral key is not a required signer.
    pub fn sign<S: Signer>(&self, owner: &S) -> Result<VersionedTransaction, SwapError> {
        let message = self.message()?;
        let num_required = usize::from(message.header().num_required_signatures);
        let required_keys = &message.static_account_keys()[..num_required];
        let message_bytes = message.serialize();
        let mut signatures = vec![Signature::default(); num_required];

        let mut sign_with = |signer: &dyn Signer, optional: bool| -> Result<(), SwapError> {
            let pubkey = signer
                .try_pubkey()
                .map_err(|e| SwapError::Signing(format!("{e}")))?;
            match required_keys.iter().position(|k| *k == pubkey) {
                Some(position) => {
                    signatures[position] = signer
                        .try_sign_message(&message_bytes)
                        .map_err(|e| SwapError::Signing(format!("{e}")))?;
                    Ok(())
                }
                None if optional => Ok(()),
                None => Err(SwapError::Signing(format!(
                    "{pubkey} is not a required signer"
                ))),
            }
        };

        sign_with(owner, true)?;
        for keypair in &self.signers {
            sign_with(keypair, false)?;
        }

        Ok(VersionedTransaction {
            signatures,
            message,
        })
    }
}
