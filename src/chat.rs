//! Chat sample: messages grouped into channels and threads.
//!
//! Each message is appended to three vectors: the global message list, its
//! channel's collection and its thread's collection. Posting to thread 0 starts
//! a new thread numbered after the message itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::collections::{PersistentMap, PersistentVector};
use crate::runtime::{CallContext, Contract, ContractError};
use crate::storage::{Storage, StorageError};
use crate::types::AccountId;

pub const CHANNEL_PREFIX: &str = "CHANNEL10:";
pub const THREAD_PREFIX: &str = "THREAD10:";
pub const MESSAGES_PREFIX: &str = "MESSAGES10";
pub const THREAD_NAMES_PREFIX: &str = "THREADNAME10";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Message text can not be blank")]
    EmptyMessage,
    #[error("Channel name can not be blank")]
    EmptyChannel,
    #[error("Thread {thread} belongs to channel {actual}, not {requested}")]
    ChannelMismatch {
        thread: u64,
        requested: String,
        actual: String,
    },
}

pub fn channel_collection_name(channel: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, channel)
}

pub fn thread_collection_name(thread: u64) -> String {
    format!("{}{}", THREAD_PREFIX, thread)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub id: u64,
    pub sender: AccountId,
    pub text: String,
    pub thread: u64,
    pub channel: String,
}

/// Name given to a thread, together with the channel it was named in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadLabel {
    pub channel: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ChatBoard {
    messages: PersistentVector<PostedMessage>,
    thread_names: PersistentMap<ThreadLabel>,
}

impl Default for ChatBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBoard {
    pub fn new() -> Self {
        ChatBoard {
            messages: PersistentVector::new(MESSAGES_PREFIX),
            thread_names: PersistentMap::new(THREAD_NAMES_PREFIX),
        }
    }

    pub fn add_message<S: Storage + ?Sized>(
        &self,
        storage: &S,
        sender: &AccountId,
        channel: &str,
        thread: u64,
        text: &str,
    ) -> Result<PostedMessage, ChatError> {
        if channel.trim().is_empty() {
            return Err(ChatError::EmptyChannel);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let id = self.messages.len(storage)?;
        let message = PostedMessage {
            id,
            sender: sender.clone(),
            text: text.to_string(),
            thread: if thread == 0 { id } else { thread },
            channel: channel.to_string(),
        };

        self.messages.push(storage, &message)?;
        PersistentVector::new(channel_collection_name(channel)).push(storage, &message)?;
        PersistentVector::new(thread_collection_name(message.thread)).push(storage, &message)?;
        Ok(message)
    }

    pub fn messages_for_thread<S: Storage + ?Sized>(
        &self,
        storage: &S,
        thread: u64,
    ) -> Result<Vec<PostedMessage>, ChatError> {
        Ok(PersistentVector::new(thread_collection_name(thread)).to_vec(storage)?)
    }

    pub fn messages_for_channel<S: Storage + ?Sized>(
        &self,
        storage: &S,
        channel: &str,
    ) -> Result<Vec<PostedMessage>, ChatError> {
        Ok(PersistentVector::new(channel_collection_name(channel)).to_vec(storage)?)
    }

    pub fn all_messages<S: Storage + ?Sized>(&self, storage: &S) -> Result<Vec<PostedMessage>, ChatError> {
        Ok(self.messages.to_vec(storage)?)
    }

    /// Names `thread`. A thread that already has messages can only be named
    /// from the channel those messages were posted to.
    pub fn set_thread_name<S: Storage + ?Sized>(
        &self,
        storage: &S,
        channel: &str,
        thread: u64,
        name: &str,
    ) -> Result<(), ChatError> {
        if channel.trim().is_empty() {
            return Err(ChatError::EmptyChannel);
        }
        let first = PersistentVector::<PostedMessage>::new(thread_collection_name(thread)).get(storage, 0)?;
        if let Some(first) = first {
            if first.channel != channel {
                return Err(ChatError::ChannelMismatch {
                    thread,
                    requested: channel.to_string(),
                    actual: first.channel,
                });
            }
        }

        let label = ThreadLabel {
            channel: channel.to_string(),
            name: name.to_string(),
        };
        self.thread_names.set(storage, &thread.to_string(), &label)?;
        Ok(())
    }

    /// The name as it was given, without any collection prefix.
    pub fn thread_name<S: Storage + ?Sized>(&self, storage: &S, thread: u64) -> Result<Option<String>, ChatError> {
        Ok(self.thread_label(storage, thread)?.map(|label| label.name))
    }

    pub fn thread_label<S: Storage + ?Sized>(&self, storage: &S, thread: u64) -> Result<Option<ThreadLabel>, ChatError> {
        Ok(self.thread_names.get(storage, &thread.to_string())?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "snake_case")]
pub enum ChatCall {
    AddMessage {
        channel: String,
        #[serde(default)]
        thread: u64,
        text: String,
    },
    MessagesForThread {
        thread: u64,
    },
    MessagesForChannel {
        channel: String,
    },
    AllMessages,
    SetThreadName {
        channel: String,
        thread: u64,
        name: String,
    },
    ThreadName {
        thread: u64,
    },
}

impl Contract for ChatBoard {
    type Call = ChatCall;

    fn execute(
        &self,
        ctx: &CallContext<'_>,
        storage: &dyn Storage,
        call: ChatCall,
    ) -> Result<Value, ContractError> {
        let value = match call {
            ChatCall::AddMessage { channel, thread, text } => {
                ctx.log(format!("[call] addMessage({}, {})", channel, thread));
                serde_json::to_value(self.add_message(storage, ctx.signer(), &channel, thread, &text)?)?
            }
            ChatCall::MessagesForThread { thread } => {
                serde_json::to_value(self.messages_for_thread(storage, thread)?)?
            }
            ChatCall::MessagesForChannel { channel } => {
                serde_json::to_value(self.messages_for_channel(storage, &channel)?)?
            }
            ChatCall::AllMessages => serde_json::to_value(self.all_messages(storage)?)?,
            ChatCall::SetThreadName { channel, thread, name } => {
                self.set_thread_name(storage, &channel, thread, &name)?;
                Value::Null
            }
            ChatCall::ThreadName { thread } => serde_json::to_value(self.thread_name(storage, thread)?)?,
        };
        Ok(value)
    }
}
