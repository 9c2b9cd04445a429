//! Scripted in-memory backend for exercising the sync engine without HTTP.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{ClientError, ResourceClient};
use crate::models::stack::{StackDetail, StackSummary};

#[derive(Default)]
struct FakeState {
    stacks: Vec<StackSummary>,
    details: HashMap<String, StackDetail>,
    fail_list: bool,
    fail_detail: HashMap<String, bool>,
    fail_delete: bool,
    detail_delay: HashMap<String, Duration>,
    list_delays: Vec<Duration>,
    delete_delay: Duration,
    list_calls: usize,
    detail_calls: HashMap<String, usize>,
    deletes: Vec<String>,
}

#[derive(Default)]
pub struct FakeClient {
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listing. Known details are kept.
    pub fn set_stacks(&self, names: &[&str]) {
        self.state.lock().unwrap().stacks = names
            .iter()
            .map(|n| StackSummary::new(*n, "111111111111"))
            .collect();
    }

    pub fn set_detail(&self, detail: StackDetail) {
        self.state
            .lock()
            .unwrap()
            .details
            .insert(detail.name.clone(), detail);
    }

    pub fn fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn fail_detail(&self, name: &str, fail: bool) {
        self.state
            .lock()
            .unwrap()
            .fail_detail
            .insert(name.to_string(), fail);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub fn delay_detail(&self, name: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .detail_delay
            .insert(name.to_string(), delay);
    }

    /// Latency for upcoming list calls, consumed one per call.
    pub fn queue_list_delays(&self, delays: &[Duration]) {
        self.state.lock().unwrap().list_delays.extend_from_slice(delays);
    }

    pub fn delay_delete(&self, delay: Duration) {
        self.state.lock().unwrap().delete_delay = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn detail_calls(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .detail_calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }
}

pub fn detail(name: &str, address: &str) -> StackDetail {
    StackDetail {
        name: name.to_string(),
        address: address.to_string(),
        account: "111111111111".to_string(),
        cfstatus: "CREATE_COMPLETE".to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl ResourceClient for FakeClient {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ClientError> {
        let (delay, fail, stacks) = {
            let mut s = self.state.lock().unwrap();
            s.list_calls += 1;
            let delay = if s.list_delays.is_empty() {
                Duration::ZERO
            } else {
                s.list_delays.remove(0)
            };
            (delay, s.fail_list, s.stacks.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ClientError::Backend("list unavailable".into()));
        }
        Ok(stacks)
    }

    async fn get_stack_detail(&self, stack: &StackSummary) -> Result<StackDetail, ClientError> {
        let (delay, fail, found) = {
            let mut s = self.state.lock().unwrap();
            *s.detail_calls.entry(stack.name.clone()).or_default() += 1;
            (
                s.detail_delay.get(&stack.name).copied().unwrap_or_default(),
                s.fail_detail.get(&stack.name).copied().unwrap_or(false),
                s.details.get(&stack.name).cloned(),
            )
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ClientError::Backend(format!("detail for {} unavailable", stack.name)));
        }
        found.ok_or_else(|| ClientError::Backend(format!("no such stack {}", stack.name)))
    }

    async fn delete_stack(&self, stack: &StackSummary) -> Result<(), ClientError> {
        let (delay, fail) = {
            let s = self.state.lock().unwrap();
            (s.delete_delay, s.fail_delete)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ClientError::Backend("delete rejected".into()));
        }
        self.state.lock().unwrap().deletes.push(stack.name.clone());
        Ok(())
    }

    fn certificate_download_url(&self, stack: &StackSummary) -> String {
        format!("http://fake/api/stacks/{}/{}/ca", stack.account, stack.name)
    }
}
