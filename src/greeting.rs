//! Greeting sample: echoes and remembers the signer's name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::{CallContext, Contract, ContractError};
use crate::storage::{Storage, StorageExt};
use crate::types::AccountId;

pub const SENDER_KEY: &str = "sender";

#[derive(Debug, Clone, Copy, Default)]
pub struct Greeting;

impl Greeting {
    pub fn say_my_name(&self, ctx: &CallContext<'_>) -> String {
        ctx.log("sayMyName() function was called");
        format!("Hello, {}!", ctx.signer())
    }

    pub fn save_my_name(&self, ctx: &CallContext<'_>, storage: &dyn Storage) -> Result<(), ContractError> {
        ctx.log("saveMyName() function was called");
        storage.set_value(SENDER_KEY, ctx.signer().as_str())?;
        Ok(())
    }

    pub fn saved_name(&self, storage: &dyn Storage) -> Result<Option<AccountId>, ContractError> {
        let name: Option<String> = storage.get_value(SENDER_KEY)?;
        Ok(name.map(AccountId::from))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum GreetingCall {
    SayMyName,
    SaveMyName,
    SavedName,
}

impl Contract for Greeting {
    type Call = GreetingCall;

    fn execute(
        &self,
        ctx: &CallContext<'_>,
        storage: &dyn Storage,
        call: GreetingCall,
    ) -> Result<Value, ContractError> {
        match call {
            GreetingCall::SayMyName => Ok(Value::String(self.say_my_name(ctx))),
            GreetingCall::SaveMyName => {
                self.save_my_name(ctx, storage)?;
                Ok(Value::Null)
            }
            GreetingCall::SavedName => Ok(serde_json::to_value(self.saved_name(storage)?)?),
        }
    }
}
