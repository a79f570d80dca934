//! Property-based tests for deferred unwinding under arbitrary exit orders

use proptest::prelude::*;
use stdio_context::{
    Capture, ContextOptions, Environment, ExitDisciplineError, InputStream, OutputStream,
    StdioContext,
};

/// Exit orders: a shuffled permutation of 0..n for n in 1..8.
fn exit_orders() -> impl Strategy<Value = Vec<usize>> {
    (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

/// Reference model of the stack: entry indices still pushed, plus exited flags.
struct Model {
    stack: Vec<usize>,
    exited: Vec<bool>,
}

impl Model {
    fn new(n: usize) -> Self {
        Self {
            stack: (0..n).collect(),
            exited: vec![false; n],
        }
    }

    /// Returns whether `index` was the top entry when it exited.
    fn exit(&mut self, index: usize) -> bool {
        let was_top = self.stack.last() == Some(&index);
        self.exited[index] = true;
        while let Some(&top) = self.stack.last() {
            if !self.exited[top] {
                break;
            }
            self.stack.pop();
        }
        was_top
    }
}

fn run_order(order: &[usize], strict: bool) -> Result<(), TestCaseError> {
    let out = Capture::new();
    let env = Environment::with_streams(InputStream::empty(), out.stream(), OutputStream::discard());
    let captures: Vec<Capture> = order.iter().map(|_| Capture::new()).collect();
    let contexts: Vec<StdioContext> = captures
        .iter()
        .map(|capture| {
            StdioContext::with_environment(&env, ContextOptions::new().output(capture).strict(strict))
                .unwrap()
        })
        .collect();

    for context in &contexts {
        context.enter();
    }
    prop_assert_eq!(env.depth(), contexts.len());

    let mut model = Model::new(contexts.len());
    for &index in order {
        let was_top = model.exit(index);
        let result = contexts[index].exit();
        if strict && !was_top {
            prop_assert!(matches!(result, Err(ExitDisciplineError::MismatchedExit(_))));
        } else {
            prop_assert!(result.is_ok());
        }

        prop_assert_eq!(env.depth(), model.stack.len());
        let expected = match model.stack.last() {
            Some(&top) => captures[top].stream(),
            None => out.stream(),
        };
        prop_assert!(OutputStream::ptr_eq(&env.output().unwrap(), &expected));
    }

    prop_assert_eq!(env.depth(), 0);
    prop_assert!(OutputStream::ptr_eq(&env.output().unwrap(), &out.stream()));
    Ok(())
}

/// Any exit order leaves the innermost unexited context in effect and ends
/// with the original streams.
#[test]
fn test_any_exit_order_unwinds_completely() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&exit_orders(), |order| run_order(&order, false))
        .unwrap();
}

/// Strict contexts report every out-of-order exit but unwind identically.
#[test]
fn test_strict_exit_order_reports_mismatches() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&exit_orders(), |order| run_order(&order, true))
        .unwrap();
}

/// Once fully unwound, any further exit is extra.
#[test]
fn test_exits_after_unwinding_are_extra() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(exit_orders(), any::<prop::sample::Index>()), |(order, pick)| {
            let env = Environment::new();
            let contexts: Vec<StdioContext> = order
                .iter()
                .map(|_| {
                    StdioContext::with_environment(&env, ContextOptions::new().strict(true))
                        .unwrap()
                })
                .collect();
            for context in &contexts {
                context.enter();
            }
            for context in contexts.iter().rev() {
                prop_assert!(context.exit().is_ok());
            }

            let again = &contexts[pick.index(contexts.len())];
            prop_assert!(matches!(again.exit(), Err(ExitDisciplineError::ExtraExit(_))));
            Ok(())
        })
        .unwrap();
}
