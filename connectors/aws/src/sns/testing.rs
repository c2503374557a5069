//! Scripted in-memory subscription client for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use core_types::ServiceError;

use super::attributes::{AttributeMap, AttributeName};
use super::client::{SubscribeRequest, SubscriptionClient};

type Reply<T> = Result<T, ServiceError>;
type RawAttributes = HashMap<String, String>;

/// A call the fake received
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Call {
    Subscribe(SubscribeRequest),
    GetAttributes(String),
    SetAttribute(String, AttributeName, Option<String>),
    Unsubscribe(String),
}

pub(crate) fn attributes(pairs: &[(AttributeName, &str)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(name, value)| (*name, value.to_string()))
        .collect()
}

/// Replays queued reads, then repeats the fallback read forever
pub(crate) struct FakeSubscriptionClient {
    subscribe_reply: Mutex<Reply<Option<String>>>,
    reads: Mutex<VecDeque<Reply<RawAttributes>>>,
    fallback_read: Mutex<Reply<RawAttributes>>,
    set_reply: Mutex<Reply<()>>,
    unsubscribe_reply: Mutex<Reply<()>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeSubscriptionClient {
    pub(crate) fn new() -> Self {
        Self {
            subscribe_reply: Mutex::new(Ok(None)),
            reads: Mutex::new(VecDeque::new()),
            fallback_read: Mutex::new(Err(ServiceError::NotFound(
                "Subscription does not exist".to_string(),
            ))),
            set_reply: Mutex::new(Ok(())),
            unsubscribe_reply: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_subscribe_reply(self, reply: Reply<Option<String>>) -> Self {
        *self.subscribe_reply.lock().unwrap() = reply;
        self
    }

    pub(crate) fn push_read(self, reply: Reply<AttributeMap>) -> Self {
        self.push_raw_read(reply.map(AttributeMap::into_remote))
    }

    /// Queue a response exactly as the service would send it
    pub(crate) fn push_raw_read(self, reply: Reply<RawAttributes>) -> Self {
        self.reads.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn with_fallback_read(self, reply: Reply<AttributeMap>) -> Self {
        *self.fallback_read.lock().unwrap() = reply.map(AttributeMap::into_remote);
        self
    }

    pub(crate) fn with_set_reply(self, reply: Reply<()>) -> Self {
        *self.set_reply.lock().unwrap() = reply;
        self
    }

    pub(crate) fn with_unsubscribe_reply(self, reply: Reply<()>) -> Self {
        *self.unsubscribe_reply.lock().unwrap() = reply;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn read_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::GetAttributes(_)))
            .count()
    }

    pub(crate) fn set_calls(&self) -> Vec<(AttributeName, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetAttribute(_, name, value) => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SubscriptionClient for FakeSubscriptionClient {
    async fn subscribe(&self, request: SubscribeRequest) -> Reply<Option<String>> {
        self.record(Call::Subscribe(request));
        self.subscribe_reply.lock().unwrap().clone()
    }

    async fn get_attributes(&self, arn: &str) -> Reply<RawAttributes> {
        self.record(Call::GetAttributes(arn.to_string()));
        let queued = self.reads.lock().unwrap().pop_front();
        match queued {
            Some(reply) => reply,
            None => self.fallback_read.lock().unwrap().clone(),
        }
    }

    async fn set_attribute(&self, arn: &str, name: AttributeName, value: Option<String>) -> Reply<()> {
        self.record(Call::SetAttribute(arn.to_string(), name, value));
        self.set_reply.lock().unwrap().clone()
    }

    async fn unsubscribe(&self, arn: &str) -> Reply<()> {
        self.record(Call::Unsubscribe(arn.to_string()));
        self.unsubscribe_reply.lock().unwrap().clone()
    }
}
