//! SPL token account helpers: associated token accounts and wrapped SOL.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::{Pubkey, pubkey};

use crate::error::SwapError;

/// Associated token account program.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Rent sysvar.
pub const SYSVAR_RENT_PUBKEY: Pubkey = pubkey!("SysvarRent111111111111111111111111111111111");

/// Wrapped SOL mint.
pub const NATIVE_MINT: Pubkey = spl_token::native_mint::ID;

/// Size of an SPL token account.
pub const TOKEN_ACCOUNT_LEN: u64 = 165;

/// A token holding supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccount {
    /// Account address. For native SOL this is the wallet address itself.
    pub address: Pubkey,
    /// Mint of the held token.
    pub mint: Pubkey,
    /// Wallet owning the account.
    pub owner: Pubkey,
    /// Spendable amount in the mint's smallest unit.
    pub balance: u64,
}

impl TokenAccount {
    /// Whether this is the wallet's native SOL balance rather than a token account.
    #[must_use]
    pub fn is_native_sol(&self) -> bool {
        self.mint == NATIVE_MINT && self.address == self.owner
    }
}

/// Derives the associated token account of `owner` for `mint`.
#[must_use]
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (ata, _) = Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );
    ata
}

/// Creates the associated token account of `owner` for `mint`, funded by `payer`.
#[must_use]
pub fn create_associated_token_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    Instruction {
        program_id: ATA_PROGRAM_PUBKEY,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(associated_token_address(owner, mint), false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(solana_system_interface::program::ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(SYSVAR_RENT_PUBKEY, false),
        ],
        data: vec![],
    }
}

/// Allocates a token account of `lamports` at `account`, paid by `payer`.
#[must_use]
pub fn create_token_account(payer: &Pubkey, account: &Pubkey, lamports: u64) -> Instruction {
    solana_system_interface::instruction::create_account(
        payer,
        account,
        lamports,
        TOKEN_ACCOUNT_LEN,
        &spl_token::ID,
    )
}

/// Initializes `account` as a token account of `mint` owned by `owner`.
///
/// # Errors
///
/// Returns [`SwapError::Instruction`] if the token program rejects the arguments.
pub fn initialize_account(account: &Pubkey, mint: &Pubkey, owner: &Pubkey) -> Result<Instruction, SwapError> {
    spl_token::instruction::initialize_account(&spl_token::ID, account, mint, owner)
        .map_err(|e| SwapError::Instruction(format!("{e}")))
}

/// Closes `account`, sending its lamports to `destination`.
///
/// # Errors
///
/// Returns [`SwapError::Instruction`] if the token program rejects the arguments.
pub fn close_account(account: &Pubkey, destination: &Pubkey, owner: &Pubkey) -> Result<Instruction, SwapError> {
    spl_token::instruction::close_account(&spl_token::ID, account, destination, owner, &[])
        .map_err(|e| SwapError::Instruction(format!("{e}")))
}
