use core::fmt;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::{Expression, NodeId};
use crate::cancel::{CancelHandle, CancelSignal};
use crate::clock::Clock;
use crate::config::EvaluateOptions;
use crate::context::{EvaluationContext, Parameter, Parameters, SharedRng};
use crate::eval::evaluator::ExpressionEvaluator;
use crate::extension::{Extensions, FunctionResolver, ParameterResolver};
use crate::state::StateStore;
use crate::value::Value;
use crate::EvalResult;

/// An expression tree together with everything needed to evaluate it.
///
/// The per-node side table (last results, temporal memory) and the random
/// source live with the formula and are shared by its clones. Walks over the
/// same formula interleave that memory, so hosts evaluate one formula from
/// one task at a time.
#[derive(Clone)]
pub struct Formula {
    expression: Arc<Expression>,
    options: EvaluateOptions,
    parameters: Parameters,
    extensions: Extensions,
    state: Arc<StateStore>,
    rng: SharedRng,
    cancel: CancelHandle,
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Formula")
            .field("expression", &self.expression)
            .field("options", &self.options)
            .field("parameters", &self.parameters)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl Formula {
    pub fn new(expression: Expression) -> Self {
        Self::with_options(expression, EvaluateOptions::default())
    }

    pub fn with_options(expression: Expression, options: EvaluateOptions) -> Self {
        let rng = match options.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            expression: Arc::new(expression),
            options,
            parameters: Parameters::new(),
            extensions: Extensions::new(),
            state: Arc::new(StateStore::new()),
            rng: Arc::new(Mutex::new(rng)),
            cancel: CancelHandle::new(),
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn options(&self) -> &EvaluateOptions {
        &self.options
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Parameter>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Parameter>) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn add_parameter_resolver(&mut self, resolver: impl ParameterResolver + 'static) {
        self.extensions.add_parameter_resolver(resolver);
    }

    pub fn add_function_resolver(&mut self, resolver: impl FunctionResolver + 'static) {
        self.extensions.add_function_resolver(resolver);
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Evaluates without a clock.
    pub async fn evaluate(&self) -> EvalResult<Value> {
        self.evaluate_at(Clock::default()).await
    }

    #[tracing::instrument(skip(self), fields(parameters = self.parameters.len()))]
    pub async fn evaluate_at(&self, clock: Clock) -> EvalResult<Value> {
        let context = EvaluationContext {
            options: self.options.clone(),
            clock,
            parameters: self.parameters.clone(),
            extensions: self.extensions.clone(),
            state: self.state.clone(),
            rng: self.rng.clone(),
            cancel: self.cancel.signal(),
        };
        ExpressionEvaluator::new()
            .eval_expression(&self.expression, Arc::new(context))
            .await
    }

    /// Context for evaluating this formula as a binding of an outer walk.
    ///
    /// The outer bindings shadow this formula's own bindings of the same name.
    pub(crate) fn nested_context(
        &self,
        clock: Clock,
        outer: &Parameters,
        cancel: CancelSignal,
    ) -> EvaluationContext {
        let mut parameters = self.parameters.clone();
        for (name, parameter) in outer {
            parameters.insert(name.clone(), parameter.clone());
        }
        EvaluationContext {
            options: self.options.clone(),
            clock,
            parameters,
            extensions: self.extensions.clone(),
            state: self.state.clone(),
            rng: self.rng.clone(),
            cancel,
        }
    }

    /// Result of the node's most recent evaluation, if it ran at least once.
    pub fn last_value(&self, id: NodeId) -> Option<Value> {
        self.state.last_value(id)
    }

    /// Ids of the calls to `name` (ASCII case-insensitive), in document order.
    pub fn find_calls(&self, name: &str) -> Vec<NodeId> {
        self.expression
            .function_calls()
            .into_iter()
            .filter(|call| call.name.eq_ignore_ascii_case(name))
            .map(|call| call.id)
            .collect()
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Starts a new run for every temporal node of the tree.
    pub fn reset_state(&self) {
        self.state.reset_all();
    }

    pub fn reset_node(&self, id: NodeId) {
        self.state.reset(id);
    }

    /// Feeds an external value to an `externalUpdate` node. The value holds
    /// until the node is reset explicitly.
    pub fn inject_external(&self, id: NodeId, value: impl Into<Value>) {
        self.state.inject(id, value.into());
    }

    /// Current external value of a `value` or `externalUpdate` node.
    pub fn external_value(&self, id: NodeId) -> Option<Value> {
        self.state.external(id)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}
