//! Restoration policy: slots changed from outside a context.

use super::test_utils::Fixture;
use std::sync::Arc;
use stdio_context::environment::{Accessor, Binding};
use stdio_context::{
    Capture, ContextOptions, Descriptor, ExitDisciplineError, OutputStream, Slot, SlotValue,
    StdioContext,
};

fn enter_and_tamper(fixture: &Fixture, options: ContextOptions) -> (StdioContext, OutputStream) {
    let context = StdioContext::with_environment(&fixture.env, options.null_output()).unwrap();
    context.enter();
    let outsider = OutputStream::discard();
    assert!(fixture.env.assign(Slot::Output, outsider.clone()));
    (context, outsider)
}

#[test]
fn test_externally_modified_slot_is_kept_by_default() {
    let fixture = Fixture::new();
    let console = fixture.env.console().unwrap();
    let (context, outsider) = enter_and_tamper(&fixture, ContextOptions::new());

    context.exit().unwrap();

    assert!(OutputStream::ptr_eq(&fixture.env.output().unwrap(), &outsider));
    // The untouched console slot is still restored.
    assert!(Arc::ptr_eq(&fixture.env.console().unwrap(), &console));
    assert_eq!(fixture.env.depth(), 0);
}

#[test]
fn test_overwrite_restores_original_anyway() {
    let fixture = Fixture::new();
    let console = fixture.console_value();
    let (context, _) = enter_and_tamper(&fixture, ContextOptions::new().overwrite(true));

    context.exit().unwrap();

    fixture.assert_pristine(&console);
}

#[test]
fn test_strict_reports_modified_slot_and_keeps_it() {
    let fixture = Fixture::new();
    let (context, outsider) = enter_and_tamper(&fixture, ContextOptions::new().strict(true));

    let err = context.exit().unwrap_err();

    assert_eq!(err, ExitDisciplineError::ModifiedOutsideContext(Slot::Output));
    assert!(err.to_string().contains("output modified outside"));
    assert!(OutputStream::ptr_eq(&fixture.env.output().unwrap(), &outsider));
    assert_eq!(fixture.env.depth(), 0);
}

#[test]
fn test_strict_wrapper_surfaces_modified_slot() {
    let fixture = Fixture::new();
    let context =
        StdioContext::with_environment(&fixture.env, ContextOptions::new().null_error().strict(true))
            .unwrap();

    let result = context.exec_sync(|| {
        fixture.env.assign(Slot::Error, OutputStream::discard());
        "finished"
    });

    assert_eq!(
        result.unwrap_err(),
        ExitDisciplineError::ModifiedOutsideContext(Slot::Error)
    );
}

#[test]
fn test_changed_attributes_count_as_modification() {
    let fixture = Fixture::new();
    let context = StdioContext::with_environment(
        &fixture.env,
        ContextOptions::new().null_output().strict(true),
    )
    .unwrap();

    context.enter();
    let hidden = fixture.env.descriptor(Slot::Output).unwrap().enumerable(false);
    fixture.env.define(Slot::Output, hidden);

    assert_eq!(
        context.exit().unwrap_err(),
        ExitDisciplineError::ModifiedOutsideContext(Slot::Output)
    );
}

#[test]
fn test_preserves_enumerability_and_writability() {
    let fixture = Fixture::new();
    let original = fixture.out.stream();
    fixture.env.define(
        Slot::Output,
        Descriptor::value(original.clone().into())
            .enumerable(false)
            .writable(false),
    );
    let replacement = Capture::new();
    let context =
        StdioContext::with_environment(&fixture.env, ContextOptions::new().output(&replacement))
            .unwrap();

    context.enter();
    let inside = fixture.env.descriptor(Slot::Output).unwrap();
    assert!(!inside.enumerable);
    assert!(!inside.writable);
    assert!(inside.configurable);
    assert!(!fixture.env.assign(Slot::Output, OutputStream::discard()));
    context.exit().unwrap();

    let after = fixture.env.descriptor(Slot::Output).unwrap();
    assert!(!after.enumerable);
    assert!(!after.writable);
    assert!(matches!(after.binding, Binding::Value(SlotValue::Output(ref s)) if OutputStream::ptr_eq(s, &original)));
}

#[test]
fn test_accessor_slots_are_restored_exactly() {
    let fixture = Fixture::new();
    let backing = fixture.out.stream();
    let accessor = Accessor::getter(move || SlotValue::Output(backing.clone())).with_setter(|_| {});
    let descriptor = Descriptor::accessor(accessor);
    fixture.env.define(Slot::Output, descriptor.clone());

    let context =
        StdioContext::with_environment(&fixture.env, ContextOptions::new().null_output()).unwrap();
    context.enter();
    // A setter leaves the overridden slot writable.
    assert!(fixture.env.descriptor(Slot::Output).unwrap().writable);
    context.exit().unwrap();

    assert!(fixture.env.descriptor(Slot::Output).unwrap().same(&descriptor));
    fixture.write_out("via accessor");
    assert_eq!(fixture.out.contents(), "via accessor");
}

#[test]
fn test_console_follows_overridden_streams() {
    let fixture = Fixture::new();
    let console = fixture.console_value();
    let out = Capture::new();
    let context =
        StdioContext::with_environment(&fixture.env, ContextOptions::new().output(&out)).unwrap();

    context
        .exec_sync(|| {
            let inner = fixture.env.console().unwrap();
            inner.log(format_args!("to capture"));
            inner.error(format_args!("to original error"));
        })
        .unwrap();
    fixture.env.console().unwrap().log(format_args!("to original output"));

    assert_eq!(out.contents(), "to capture\n");
    assert_eq!(fixture.err.contents(), "to original error\n");
    assert_eq!(fixture.out.contents(), "to original output\n");
    fixture.assert_pristine(&console);
}

#[test]
fn test_absent_slots_become_absent_again() {
    let fixture = Fixture::new();
    fixture.env.remove(Slot::Error);
    let context =
        StdioContext::with_environment(&fixture.env, ContextOptions::new().null_error()).unwrap();

    context.enter();
    assert!(fixture.env.error().is_some());
    context.exit().unwrap();
    assert!(fixture.env.error().is_none());
}
