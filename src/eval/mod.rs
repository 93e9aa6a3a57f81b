pub mod evaluator;

pub use evaluator::ExpressionEvaluator;
