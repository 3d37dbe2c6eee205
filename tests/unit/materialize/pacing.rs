use super::*;

#[test]
fn cancel_token_breaks_after_cancel() {
    let mut token = CancelToken::new();
    let remote = token.clone();
    assert_eq!(
        token.on_yield(Progress { processed: 20 }),
        ControlFlow::Continue(())
    );
    remote.cancel();
    assert_eq!(token.on_yield(Progress { processed: 40 }), ControlFlow::Break(()));
}

#[test]
fn closures_are_hooks() {
    let mut seen = Vec::new();
    let mut hook = |p: Progress| {
        seen.push(p.processed);
        ControlFlow::Continue(())
    };
    hook.on_yield(Progress { processed: 20 });
    hook.on_yield(Progress { processed: 40 });
    assert_eq!(seen, vec![20, 40]);
    assert_eq!(NoYield.on_yield(Progress { processed: 1 }), ControlFlow::Continue(()));
}
