//! ERC-20 style account book.
//!
//! Balances and allowances live in prefix-namespaced maps (`bal`, `alw`), token
//! metadata under underscore keys that can never collide with account names.
//! Every balance movement is recorded in the [`EventLedger`].
//!
//! Operations validate everything before writing anything, so a failed call
//! leaves storage as it found it even without the host's staged commit.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::collections::PersistentMap;
use crate::ledger::{EventLedger, LedgerError};
use crate::runtime::{CallContext, Contract, ContractError};
use crate::storage::{Storage, StorageError, StorageExt};
use crate::types::{AccountId, Amount, TokenConfig};

pub const BALANCES_PREFIX: &str = "bal";
pub const ALLOWANCES_PREFIX: &str = "alw";

pub const NAME_KEY: &str = "_name";
pub const SYMBOL_KEY: &str = "_symbol";
pub const DECIMALS_KEY: &str = "_decimals";
pub const TOTAL_SUPPLY_KEY: &str = "_totalSupply";
pub const EXCHANGE_RATE_KEY: &str = "_exchangeRate";
pub const BANK_KEY: &str = "_bank";
/// Supply chosen by `customize`, minted by `initialize`.
pub const CONFIGURED_SUPPLY_KEY: &str = "_supply";

const DEFAULT_EVENT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Ledger error: {0}")]
    LedgerError(#[from] LedgerError),
    #[error("Insufficient funds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        account: AccountId,
        available: Amount,
        required: Amount,
    },
    #[error("Unauthorized: {spender} may move {allowed} from {owner}, requested {requested}")]
    Unauthorized {
        owner: AccountId,
        spender: AccountId,
        allowed: Amount,
        requested: Amount,
    },
    #[error("Sender can not be empty")]
    InvalidSender,
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Token already initialized")]
    AlreadyInitialized,
    #[error("Amount overflow crediting {0}")]
    AmountOverflow(AccountId),
}

/// Only the contract account itself may run privileged setup.
pub fn assert_true_owner(caller: &AccountId, contract: &AccountId) -> Result<(), TokenError> {
    if contract.is_empty() {
        return Err(TokenError::PermissionDenied(
            "contract identity unavailable".to_string(),
        ));
    }
    if caller != contract {
        return Err(TokenError::PermissionDenied(format!(
            "{} is not the contract account {}",
            caller, contract
        )));
    }
    Ok(())
}

fn allowance_key(owner: &AccountId, spender: &AccountId) -> String {
    format!("{}:{}", owner, spender)
}

#[derive(Debug, Clone)]
pub struct Token {
    balances: PersistentMap<Amount>,
    allowances: PersistentMap<Amount>,
    ledger: EventLedger,
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl Token {
    pub fn new() -> Self {
        Token {
            balances: PersistentMap::new(BALANCES_PREFIX),
            allowances: PersistentMap::new(ALLOWANCES_PREFIX),
            ledger: EventLedger::new(),
        }
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn customize<S: Storage + ?Sized>(
        &self,
        storage: &S,
        caller: &AccountId,
        contract: &AccountId,
        config: &TokenConfig,
    ) -> Result<(), TokenError> {
        assert_true_owner(caller, contract)?;
        if self.is_initialized(storage)? {
            return Err(TokenError::AlreadyInitialized);
        }

        storage.set_value(BANK_KEY, caller.as_str())?;
        storage.set_value(NAME_KEY, &config.name)?;
        storage.set_value(SYMBOL_KEY, &config.symbol)?;
        storage.set_value(DECIMALS_KEY, &config.decimals)?;
        storage.set_value(CONFIGURED_SUPPLY_KEY, &config.supply)?;
        storage.set_value(EXCHANGE_RATE_KEY, &config.exchange_rate)?;
        Ok(())
    }

    /// Mints the configured supply to the contract account. Returns the supply.
    pub fn initialize<S: Storage + ?Sized>(
        &self,
        storage: &S,
        caller: &AccountId,
        contract: &AccountId,
    ) -> Result<Amount, TokenError> {
        assert_true_owner(caller, contract)?;
        if self.is_initialized(storage)? {
            return Err(TokenError::AlreadyInitialized);
        }

        let supply = storage.get_or_default(CONFIGURED_SUPPLY_KEY, TokenConfig::default().supply)?;
        storage.set_value(TOTAL_SUPPLY_KEY, &supply)?;
        storage.set_value(BANK_KEY, caller.as_str())?;
        self.balances.set(storage, caller.as_str(), &supply)?;

        let zero = AccountId::zero();
        self.ledger.record_transfer(storage, &zero, &zero, caller, supply)?;

        info!(bank = %caller, %supply, "token initialized");
        Ok(supply)
    }

    pub fn is_initialized<S: Storage + ?Sized>(&self, storage: &S) -> Result<bool, TokenError> {
        Ok(storage.contains(TOTAL_SUPPLY_KEY)?)
    }

    pub fn name<S: Storage + ?Sized>(&self, storage: &S) -> Result<String, TokenError> {
        Ok(storage.get_or_default(NAME_KEY, TokenConfig::default().name)?)
    }

    pub fn symbol<S: Storage + ?Sized>(&self, storage: &S) -> Result<String, TokenError> {
        Ok(storage.get_or_default(SYMBOL_KEY, TokenConfig::default().symbol)?)
    }

    pub fn decimals<S: Storage + ?Sized>(&self, storage: &S) -> Result<u8, TokenError> {
        Ok(storage.get_or_default(DECIMALS_KEY, TokenConfig::default().decimals)?)
    }

    pub fn exchange_rate<S: Storage + ?Sized>(&self, storage: &S) -> Result<u8, TokenError> {
        Ok(storage.get_or_default(EXCHANGE_RATE_KEY, TokenConfig::default().exchange_rate)?)
    }

    /// Zero until `initialize` has run.
    pub fn total_supply<S: Storage + ?Sized>(&self, storage: &S) -> Result<Amount, TokenError> {
        Ok(storage.get_or_default(TOTAL_SUPPLY_KEY, Amount::ZERO)?)
    }

    pub fn bank<S: Storage + ?Sized>(&self, storage: &S) -> Result<Option<AccountId>, TokenError> {
        let bank: Option<String> = storage.get_value(BANK_KEY)?;
        Ok(bank.map(AccountId::from))
    }

    pub fn balance_of<S: Storage + ?Sized>(&self, storage: &S, account: &AccountId) -> Result<Amount, TokenError> {
        Ok(self.balances.get_or(storage, account.as_str(), Amount::ZERO)?)
    }

    pub fn allowance<S: Storage + ?Sized>(
        &self,
        storage: &S,
        owner: &AccountId,
        spender: &AccountId,
    ) -> Result<Amount, TokenError> {
        Ok(self
            .allowances
            .get_or(storage, &allowance_key(owner, spender), Amount::ZERO)?)
    }

    pub fn transfer<S: Storage + ?Sized>(
        &self,
        storage: &S,
        sender: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if sender.is_empty() {
            return Err(TokenError::InvalidSender);
        }
        self.move_tokens(storage, sender, to, amount)?;
        self.ledger.record_transfer(storage, sender, sender, to, amount)?;
        Ok(())
    }

    /// Overwrites the allowance `owner` grants `spender`. The allowance may not
    /// exceed the owner's balance at the time of approval.
    pub fn approve<S: Storage + ?Sized>(
        &self,
        storage: &S,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let balance = self.balance_of(storage, owner)?;
        if balance < amount {
            return Err(TokenError::InsufficientFunds {
                account: owner.clone(),
                available: balance,
                required: amount,
            });
        }

        let key = allowance_key(owner, spender);
        let old_value = self.allowances.get_or(storage, &key, Amount::ZERO)?;
        self.allowances.set(storage, &key, &amount)?;
        self.ledger
            .record_approval(storage, owner, spender, old_value, amount)?;
        Ok(())
    }

    /// Delegated transfer: `spender` moves `amount` from `owner` to `to`
    /// against the allowance `owner` granted.
    pub fn transfer_from<S: Storage + ?Sized>(
        &self,
        storage: &S,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if spender.is_empty() {
            return Err(TokenError::InvalidSender);
        }

        let key = allowance_key(owner, spender);
        let allowed = self.allowances.get_or(storage, &key, Amount::ZERO)?;
        let remaining = allowed
            .checked_sub(amount)
            .ok_or_else(|| TokenError::Unauthorized {
                owner: owner.clone(),
                spender: spender.clone(),
                allowed,
                requested: amount,
            })?;

        self.move_tokens(storage, owner, to, amount)?;
        self.allowances.set(storage, &key, &remaining)?;
        self.ledger.record_transfer(storage, spender, owner, to, amount)?;
        Ok(())
    }

    fn move_tokens<S: Storage + ?Sized>(
        &self,
        storage: &S,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(storage, from)?;
        let debited = from_balance
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientFunds {
                account: from.clone(),
                available: from_balance,
                required: amount,
            })?;

        if from == to {
            // Self-transfer: balance unchanged, but still a valid (recorded) transfer
            return Ok(());
        }

        let to_balance = self.balance_of(storage, to)?;
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::AmountOverflow(to.clone()))?;

        self.balances.set(storage, from.as_str(), &debited)?;
        self.balances.set(storage, to.as_str(), &credited)?;
        Ok(())
    }
}

/// Externally invocable token operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum TokenCall {
    Customize(TokenConfig),
    Initialize,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    ExchangeRate,
    Bank,
    BalanceOf {
        account: AccountId,
    },
    Transfer {
        to: AccountId,
        amount: Amount,
    },
    Approve {
        spender: AccountId,
        amount: Amount,
    },
    Allowance {
        owner: AccountId,
        spender: AccountId,
    },
    TransferFrom {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    PopNewestTransfer,
    PopOldestTransfer,
    PopNewestApproval,
    PopOldestApproval,
    RecentTransfers {
        #[serde(default = "default_event_limit")]
        limit: usize,
    },
    RecentApprovals {
        #[serde(default = "default_event_limit")]
        limit: usize,
    },
}

fn default_event_limit() -> usize {
    DEFAULT_EVENT_LIMIT
}

impl Contract for Token {
    type Call = TokenCall;

    fn execute(
        &self,
        ctx: &CallContext<'_>,
        storage: &dyn Storage,
        call: TokenCall,
    ) -> Result<Value, ContractError> {
        let signer = ctx.signer();
        let value = match call {
            TokenCall::Customize(config) => {
                ctx.log(format!(
                    "[call] customize('{}', '{}', {}, {}, {})",
                    config.name, config.symbol, config.decimals, config.supply, config.exchange_rate
                ));
                self.customize(storage, signer, ctx.contract(), &config)?;
                Value::Null
            }
            TokenCall::Initialize => {
                ctx.log("[call] initialize()");
                let supply = self.initialize(storage, signer, ctx.contract())?;
                ctx.log(format!("[status] Initial owner: {}", signer));
                serde_json::to_value(supply)?
            }
            TokenCall::Name => json!(self.name(storage)?),
            TokenCall::Symbol => json!(self.symbol(storage)?),
            TokenCall::Decimals => json!(self.decimals(storage)?),
            TokenCall::TotalSupply => serde_json::to_value(self.total_supply(storage)?)?,
            TokenCall::ExchangeRate => json!(self.exchange_rate(storage)?),
            TokenCall::Bank => serde_json::to_value(self.bank(storage)?)?,
            TokenCall::BalanceOf { account } => {
                ctx.log(format!("[call] balanceOf({})", account));
                serde_json::to_value(self.balance_of(storage, &account)?)?
            }
            TokenCall::Transfer { to, amount } => {
                ctx.log(format!("[call] transfer({}, {})", to, amount));
                self.transfer(storage, signer, &to, amount)?;
                Value::Bool(true)
            }
            TokenCall::Approve { spender, amount } => {
                ctx.log(format!("[call] approve({}, {})", spender, amount));
                self.approve(storage, signer, &spender, amount)?;
                Value::Bool(true)
            }
            TokenCall::Allowance { owner, spender } => {
                ctx.log(format!("[call] allowance({}, {})", owner, spender));
                serde_json::to_value(self.allowance(storage, &owner, &spender)?)?
            }
            TokenCall::TransferFrom { from, to, amount } => {
                ctx.log(format!("[call] transferFrom({}, {}, {})", from, to, amount));
                self.transfer_from(storage, signer, &from, &to, amount)?;
                Value::Bool(true)
            }
            TokenCall::PopNewestTransfer => {
                serde_json::to_value(self.ledger.pop_newest_transfer(storage)?)?
            }
            TokenCall::PopOldestTransfer => {
                serde_json::to_value(self.ledger.pop_oldest_transfer(storage)?)?
            }
            TokenCall::PopNewestApproval => {
                serde_json::to_value(self.ledger.pop_newest_approval(storage)?)?
            }
            TokenCall::PopOldestApproval => {
                serde_json::to_value(self.ledger.pop_oldest_approval(storage)?)?
            }
            TokenCall::RecentTransfers { limit } => {
                serde_json::to_value(self.ledger.transfers(storage, limit)?)?
            }
            TokenCall::RecentApprovals { limit } => {
                serde_json::to_value(self.ledger.approvals(storage, limit)?)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const CONTRACT: &str = "example-token";

    fn id(s: &str) -> AccountId {
        AccountId::new(s)
    }

    fn amount(v: u64) -> Amount {
        Amount::from(v)
    }

    fn initialized(supply: u64) -> (MemoryStorage, Token) {
        let storage = MemoryStorage::new();
        let token = Token::new();
        let config = TokenConfig {
            supply: amount(supply),
            ..TokenConfig::default()
        };
        token
            .customize(&storage, &id(CONTRACT), &id(CONTRACT), &config)
            .unwrap();
        token.initialize(&storage, &id(CONTRACT), &id(CONTRACT)).unwrap();
        (storage, token)
    }

    #[test]
    fn test_defaults_before_customize() {
        let storage = MemoryStorage::new();
        let token = Token::new();

        assert_eq!(token.name(&storage).unwrap(), "Solidus Wonder Token");
        assert_eq!(token.symbol(&storage).unwrap(), "SWT");
        assert_eq!(token.decimals(&storage).unwrap(), 2);
        assert_eq!(token.exchange_rate(&storage).unwrap(), 100);
        assert_eq!(token.total_supply(&storage).unwrap(), Amount::ZERO);
        assert_eq!(token.bank(&storage).unwrap(), None);
    }

    #[test]
    fn test_initialize_mints_default_supply_to_contract() {
        let storage = MemoryStorage::new();
        let token = Token::new();

        let supply = token.initialize(&storage, &id(CONTRACT), &id(CONTRACT)).unwrap();

        assert_eq!(supply, amount(100_000_000));
        assert_eq!(token.total_supply(&storage).unwrap(), supply);
        assert_eq!(token.balance_of(&storage, &id(CONTRACT)).unwrap(), supply);
        assert_eq!(token.bank(&storage).unwrap(), Some(id(CONTRACT)));

        let event = token.ledger().pop_newest_transfer(&storage).unwrap();
        assert_eq!(event.spender, AccountId::zero());
        assert_eq!(event.from, AccountId::zero());
        assert_eq!(event.to, id(CONTRACT));
        assert_eq!(event.value, supply);
    }

    #[test]
    fn test_initialize_twice_is_rejected() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(40)).unwrap();

        let result = token.initialize(&storage, &id(CONTRACT), &id(CONTRACT));
        assert!(matches!(result, Err(TokenError::AlreadyInitialized)));

        assert_eq!(token.balance_of(&storage, &id(CONTRACT)).unwrap(), amount(60));
        assert_eq!(token.balance_of(&storage, &id("alice")).unwrap(), amount(40));
        assert_eq!(token.total_supply(&storage).unwrap(), amount(100));
    }

    #[test]
    fn test_privileged_ops_require_contract_account() {
        let storage = MemoryStorage::new();
        let token = Token::new();

        let result = token.initialize(&storage, &id("mallory"), &id(CONTRACT));
        assert!(matches!(result, Err(TokenError::PermissionDenied(_))));

        let result = token.customize(&storage, &id("mallory"), &id(CONTRACT), &TokenConfig::default());
        assert!(matches!(result, Err(TokenError::PermissionDenied(_))));

        let result = token.initialize(&storage, &id(""), &id(""));
        assert!(matches!(result, Err(TokenError::PermissionDenied(_))));

        assert!(storage.entries().unwrap().is_empty());
    }

    #[test]
    fn test_customize_after_initialize_is_rejected() {
        let (storage, token) = initialized(100);
        let config = TokenConfig {
            name: "Other".to_string(),
            ..TokenConfig::default()
        };

        let result = token.customize(&storage, &id(CONTRACT), &id(CONTRACT), &config);
        assert!(matches!(result, Err(TokenError::AlreadyInitialized)));
        assert_eq!(token.name(&storage).unwrap(), "Solidus Wonder Token");
    }

    #[test]
    fn test_transfer_moves_balance_and_records_event() {
        let (storage, token) = initialized(100);

        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(30)).unwrap();

        assert_eq!(token.balance_of(&storage, &id(CONTRACT)).unwrap(), amount(70));
        assert_eq!(token.balance_of(&storage, &id("alice")).unwrap(), amount(30));

        let event = token.ledger().pop_newest_transfer(&storage).unwrap();
        assert_eq!(event.spender, id(CONTRACT));
        assert_eq!(event.from, id(CONTRACT));
        assert_eq!(event.to, id("alice"));
        assert_eq!(event.value, amount(30));
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(10)).unwrap();

        let result = token.transfer(&storage, &id("alice"), &id("bob"), amount(11));
        assert!(matches!(
            result,
            Err(TokenError::InsufficientFunds { available, required, .. })
                if available == amount(10) && required == amount(11)
        ));
        assert_eq!(token.balance_of(&storage, &id("alice")).unwrap(), amount(10));
        assert_eq!(token.balance_of(&storage, &id("bob")).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_transfer_from_empty_sender() {
        let (storage, token) = initialized(100);
        let result = token.transfer(&storage, &id(""), &id("bob"), Amount::ZERO);
        assert!(matches!(result, Err(TokenError::InvalidSender)));
    }

    #[test]
    fn test_whitespace_sender_is_an_ordinary_account() {
        let (storage, token) = initialized(100);

        token.transfer(&storage, &id(" "), &id("bob"), Amount::ZERO).unwrap();

        let event = token.ledger().pop_newest_transfer(&storage).unwrap();
        assert_eq!(event.from, id(" "));
    }

    #[test]
    fn test_delegated_transfer_with_empty_spender() {
        let (storage, token) = initialized(100);
        let before = storage.entries().unwrap();

        let result = token.transfer_from(&storage, &id(""), &id(CONTRACT), &id("bob"), Amount::ZERO);

        assert!(matches!(result, Err(TokenError::InvalidSender)));
        assert_eq!(storage.entries().unwrap(), before);
    }

    #[test]
    fn test_approve_accepts_empty_owner() {
        let (storage, token) = initialized(100);

        token.approve(&storage, &id(""), &id("bob"), Amount::ZERO).unwrap();

        let approval = token.ledger().pop_newest_approval(&storage).unwrap();
        assert_eq!(approval.owner, id(""));
        assert_eq!(approval.value, Amount::ZERO);
    }

    #[test]
    fn test_zero_value_transfer_from_empty_account() {
        let (storage, token) = initialized(100);
        let before = token.ledger().transfer_count(&storage).unwrap();

        token.transfer(&storage, &id("derek"), &id("alice"), Amount::ZERO).unwrap();

        assert_eq!(token.ledger().transfer_count(&storage).unwrap(), before + 1);
        let event = token.ledger().pop_newest_transfer(&storage).unwrap();
        assert_eq!(event.from, id("derek"));
        assert_eq!(event.value, Amount::ZERO);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id(CONTRACT), amount(25)).unwrap();
        assert_eq!(token.balance_of(&storage, &id(CONTRACT)).unwrap(), amount(100));

        let result = token.transfer(&storage, &id(CONTRACT), &id(CONTRACT), amount(101));
        assert!(matches!(result, Err(TokenError::InsufficientFunds { .. })));
    }

    #[test]
    fn test_approve_overwrites_and_records_old_value() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(50)).unwrap();

        assert_eq!(token.allowance(&storage, &id("alice"), &id("bob")).unwrap(), Amount::ZERO);

        token.approve(&storage, &id("alice"), &id("bob"), amount(10)).unwrap();
        token.approve(&storage, &id("alice"), &id("bob"), amount(20)).unwrap();
        assert_eq!(token.allowance(&storage, &id("alice"), &id("bob")).unwrap(), amount(20));

        assert!(storage.contains("alw::alice:bob").unwrap());

        let latest = token.ledger().pop_newest_approval(&storage).unwrap();
        assert_eq!(latest.old_value, amount(10));
        assert_eq!(latest.value, amount(20));
        let first = token.ledger().pop_newest_approval(&storage).unwrap();
        assert_eq!(first.old_value, Amount::ZERO);
        assert_eq!(first.value, amount(10));
    }

    #[test]
    fn test_approve_capped_by_balance() {
        let (storage, token) = initialized(100);

        let result = token.approve(&storage, &id("derek"), &id("bob"), amount(10));
        assert!(matches!(result, Err(TokenError::InsufficientFunds { .. })));
        assert_eq!(token.ledger().approval_count(&storage).unwrap(), 0);
    }

    #[test]
    fn test_allowance_decrements_until_unauthorized() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(50)).unwrap();
        token.approve(&storage, &id("alice"), &id("bob"), amount(10)).unwrap();

        token
            .transfer_from(&storage, &id("bob"), &id("alice"), &id("carol"), amount(4))
            .unwrap();
        token
            .transfer_from(&storage, &id("bob"), &id("alice"), &id("carol"), amount(5))
            .unwrap();
        assert_eq!(token.allowance(&storage, &id("alice"), &id("bob")).unwrap(), amount(1));

        let result = token.transfer_from(&storage, &id("bob"), &id("alice"), &id("carol"), amount(2));
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));

        assert_eq!(token.balance_of(&storage, &id("alice")).unwrap(), amount(41));
        assert_eq!(token.balance_of(&storage, &id("carol")).unwrap(), amount(9));

        let event = token.ledger().pop_newest_transfer(&storage).unwrap();
        assert_eq!(event.spender, id("bob"));
        assert_eq!(event.from, id("alice"));
        assert_eq!(event.to, id("carol"));
        assert_eq!(event.value, amount(5));
    }

    #[test]
    fn test_transfer_from_checks_owner_balance() {
        let (storage, token) = initialized(100);
        token.transfer(&storage, &id(CONTRACT), &id("alice"), amount(10)).unwrap();
        token.approve(&storage, &id("alice"), &id("bob"), amount(10)).unwrap();
        token.transfer(&storage, &id("alice"), &id("carol"), amount(8)).unwrap();

        let result = token.transfer_from(&storage, &id("bob"), &id("alice"), &id("carol"), amount(5));
        assert!(matches!(result, Err(TokenError::InsufficientFunds { .. })));
        // Allowance untouched by the failed attempt
        assert_eq!(token.allowance(&storage, &id("alice"), &id("bob")).unwrap(), amount(10));
    }

    #[test]
    fn test_token_call_json_shapes() {
        let call: TokenCall =
            serde_json::from_str(r#"{"method": "transfer", "args": {"to": "bob", "amount": "10"}}"#).unwrap();
        assert_eq!(
            call,
            TokenCall::Transfer {
                to: id("bob"),
                amount: amount(10)
            }
        );

        let call: TokenCall = serde_json::from_str(r#"{"method": "initialize"}"#).unwrap();
        assert_eq!(call, TokenCall::Initialize);

        let call: TokenCall =
            serde_json::from_str(r#"{"method": "recent_transfers", "args": {}}"#).unwrap();
        assert_eq!(call, TokenCall::RecentTransfers { limit: DEFAULT_EVENT_LIMIT });

        let call: TokenCall =
            serde_json::from_str(r#"{"method": "customize", "args": {"symbol": "TST"}}"#).unwrap();
        match call {
            TokenCall::Customize(config) => {
                assert_eq!(config.symbol, "TST");
                assert_eq!(config.name, "Solidus Wonder Token");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
