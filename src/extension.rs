//! Host extension chains.
//!
//! Two independent chains resolve what the evaluator cannot: free
//! identifiers and function calls. Every handler of a chain runs, in
//! registration order; the first handler that writes a result wins.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::cancel::CancelSignal;
use crate::context::Argument;
use crate::value::Value;
use crate::EvalResult;

/// Result slot handed to identifier handlers.
#[derive(Debug, Default)]
pub struct ParameterArgs {
    result: Option<Value>,
}

impl ParameterArgs {
    /// Claims the call; ignored when an earlier handler already claimed it.
    pub fn set_result(&mut self, value: Value) {
        if self.result.is_none() {
            self.result = Some(value);
        } else {
            trace!("parameter result already claimed, ignoring {:?}", value);
        }
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

/// Unevaluated arguments plus result slot handed to function handlers.
#[derive(Debug)]
pub struct FunctionArgs {
    parameters: Vec<Argument>,
    result: Option<Value>,
}

impl FunctionArgs {
    pub fn new(parameters: Vec<Argument>) -> Self {
        Self {
            parameters,
            result: None,
        }
    }

    pub fn parameters(&self) -> &[Argument] {
        &self.parameters
    }

    /// Evaluates every argument left to right.
    pub async fn evaluate_parameters(&self) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            values.push(parameter.evaluate().await?);
        }
        Ok(values)
    }

    /// Claims the call; ignored when an earlier handler already claimed it.
    pub fn set_result(&mut self, value: Value) {
        if self.result.is_none() {
            self.result = Some(value);
        } else {
            trace!("function result already claimed, ignoring {:?}", value);
        }
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

#[async_trait]
pub trait ParameterResolver: Send + Sync {
    async fn evaluate_parameter(&self, name: &str, args: &mut ParameterArgs) -> EvalResult<()>;
}

#[async_trait]
pub trait FunctionResolver: Send + Sync {
    async fn evaluate_function(&self, name: &str, args: &mut FunctionArgs) -> EvalResult<()>;
}

type ParameterHandler =
    Box<dyn Fn(String) -> BoxFuture<'static, EvalResult<Option<Value>>> + Send + Sync>;
type FunctionHandler =
    Box<dyn Fn(String, Vec<Argument>) -> BoxFuture<'static, EvalResult<Option<Value>>> + Send + Sync>;

/// Identifier handler built from an async closure; `Some` claims the call.
pub struct ParameterFn(ParameterHandler);

impl ParameterFn {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, EvalResult<Option<Value>>> + Send + Sync + 'static,
    {
        Self(Box::new(handler))
    }
}

#[async_trait]
impl ParameterResolver for ParameterFn {
    async fn evaluate_parameter(&self, name: &str, args: &mut ParameterArgs) -> EvalResult<()> {
        if let Some(value) = (self.0)(name.to_string()).await? {
            args.set_result(value);
        }
        Ok(())
    }
}

/// Function handler built from an async closure; `Some` claims the call.
pub struct FunctionFn(FunctionHandler);

impl FunctionFn {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(String, Vec<Argument>) -> BoxFuture<'static, EvalResult<Option<Value>>>
            + Send
            + Sync
            + 'static,
    {
        Self(Box::new(handler))
    }
}

#[async_trait]
impl FunctionResolver for FunctionFn {
    async fn evaluate_function(&self, name: &str, args: &mut FunctionArgs) -> EvalResult<()> {
        if let Some(value) = (self.0)(name.to_string(), args.parameters().to_vec()).await? {
            args.set_result(value);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Extensions {
    parameter_resolvers: Vec<Arc<dyn ParameterResolver>>,
    function_resolvers: Vec<Arc<dyn FunctionResolver>>,
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("parameter_resolvers", &self.parameter_resolvers.len())
            .field("function_resolvers", &self.function_resolvers.len())
            .finish()
    }
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter_resolver(&mut self, resolver: impl ParameterResolver + 'static) {
        self.parameter_resolvers.push(Arc::new(resolver));
    }

    pub fn add_function_resolver(&mut self, resolver: impl FunctionResolver + 'static) {
        self.function_resolvers.push(Arc::new(resolver));
    }

    pub fn is_empty(&self) -> bool {
        self.parameter_resolvers.is_empty() && self.function_resolvers.is_empty()
    }

    /// Broadcasts an identifier to every handler; the first claim wins.
    pub async fn resolve_parameter(
        &self,
        name: &str,
        cancel: &CancelSignal,
    ) -> EvalResult<Option<Value>> {
        let mut args = ParameterArgs::default();
        for resolver in &self.parameter_resolvers {
            cancel
                .guard(resolver.evaluate_parameter(name, &mut args))
                .await?;
        }
        if args.has_result() {
            debug!("parameter {} resolved by extension", name);
        }
        Ok(args.result)
    }

    /// Broadcasts a function call to every handler; the first claim wins.
    pub async fn resolve_function(
        &self,
        name: &str,
        arguments: Vec<Argument>,
        cancel: &CancelSignal,
    ) -> EvalResult<Option<Value>> {
        if self.function_resolvers.is_empty() {
            return Ok(None);
        }
        let mut args = FunctionArgs::new(arguments);
        for resolver in &self.function_resolvers {
            cancel
                .guard(resolver.evaluate_function(name, &mut args))
                .await?;
        }
        if args.has_result() {
            debug!("function {} resolved by extension", name);
        }
        Ok(args.result)
    }
}
