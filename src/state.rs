use dashmap::DashMap;
use tracing::debug;

use crate::ast::NodeId;
use crate::clock::Clock;
use crate::value::Value;

/// Kind-specific memory of a temporal function node.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TemporalState {
    #[default]
    Empty,
    Init(Value),
    Smoothing(Vec<f64>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    pub last_value: Option<Value>,
    pub last_step: Option<u64>,
    pub temporal: TemporalState,
    /// Value the node last published to the host.
    pub external: Option<Value>,
    /// Value the host fed in; survives automatic new-run resets.
    pub injected: Option<Value>,
}

impl NodeState {
    /// Drops the temporal memory and host-injected value; the last-result
    /// memo is kept.
    pub fn reset(&mut self) {
        self.start_run();
        self.injected = None;
    }

    /// Drops what the previous run accumulated.
    fn start_run(&mut self) {
        self.last_step = None;
        self.temporal = TemporalState::Empty;
        self.external = None;
    }
}

/// How the clock moved since a node's previous call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProgress {
    /// The clock carries no step.
    Unclocked,
    /// First call of the node in this run.
    Fresh,
    /// Same step as the previous call.
    Repeated,
    Advanced,
}

impl StepProgress {
    pub fn should_integrate(self) -> bool {
        matches!(self, StepProgress::Unclocked | StepProgress::Advanced)
    }
}

/// Side table of per-node memory, keyed by [`NodeId`].
///
/// Guards are never held across an `.await`; callers read a snapshot,
/// evaluate, then write back.
#[derive(Debug, Default)]
pub struct StateStore {
    nodes: DashMap<NodeId, NodeState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, id: NodeId) -> Option<NodeState> {
        self.nodes.get(&id).map(|node| node.clone())
    }

    pub fn last_value(&self, id: NodeId) -> Option<Value> {
        self.nodes.get(&id).and_then(|node| node.last_value.clone())
    }

    pub fn record_result(&self, id: NodeId, value: Value) {
        self.nodes.entry(id).or_default().last_value = Some(value);
    }

    /// Registers a temporal call against the clock.
    ///
    /// A step lower than the node's last observed step starts a new run and
    /// resets the node when `reset_on_new_run` is set.
    pub fn begin_call(&self, id: NodeId, clock: &Clock, reset_on_new_run: bool) -> StepProgress {
        let mut node = self.nodes.entry(id).or_default();
        let progress = match (node.last_step, clock.step) {
            (_, None) => StepProgress::Unclocked,
            (None, Some(_)) => StepProgress::Fresh,
            (Some(last), Some(step)) if step < last && reset_on_new_run => {
                debug!("node {} starts a new run at step {} (was {})", id, step, last);
                node.start_run();
                StepProgress::Fresh
            }
            (Some(last), Some(step)) if step == last => StepProgress::Repeated,
            (Some(_), Some(_)) => StepProgress::Advanced,
        };
        if let Some(step) = clock.step {
            node.last_step = Some(step);
        }
        progress
    }

    pub fn temporal(&self, id: NodeId) -> TemporalState {
        self.nodes
            .get(&id)
            .map(|node| node.temporal.clone())
            .unwrap_or_default()
    }

    pub fn set_temporal(&self, id: NodeId, temporal: TemporalState) {
        self.nodes.entry(id).or_default().temporal = temporal;
    }

    pub fn external(&self, id: NodeId) -> Option<Value> {
        self.nodes.get(&id).and_then(|node| node.external.clone())
    }

    pub fn set_external(&self, id: NodeId, value: Value) {
        self.nodes.entry(id).or_default().external = Some(value);
    }

    pub fn injected(&self, id: NodeId) -> Option<Value> {
        self.nodes.get(&id).and_then(|node| node.injected.clone())
    }

    pub fn inject(&self, id: NodeId, value: Value) {
        self.nodes.entry(id).or_default().injected = Some(value);
    }

    pub fn reset(&self, id: NodeId) {
        if let Some(mut node) = self.nodes.get_mut(&id) {
            node.reset();
        }
    }

    pub fn reset_all(&self) {
        debug!("resetting temporal state of {} node(s)", self.nodes.len());
        for mut node in self.nodes.iter_mut() {
            node.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
