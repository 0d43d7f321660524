//! Input-source handoff between the dispatcher and poll coordinators.

use std::sync::Arc;
use std::time::Duration;

use cellform::{
    Action, CoordinatorState, ExitReason, Form, FormError, FormSet, OuterDispatcher, Outcome,
    PollCoordinator, SharedForm, TextBoxSpec, spawn_submission_watcher, submission_channel,
};
use cellscreen::{Event, Key, MemoryScreen};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

fn two_field_form(screen: &Arc<MemoryScreen>, name: &str) -> Form {
    let mut form = Form::new(name, screen.clone());
    form.add_text_box(
        TextBoxSpec::new("first")
            .tab_order(0)
            .position(10, 1)
            .size(8, 1),
    )
    .unwrap();
    form.add_text_box(
        TextBoxSpec::new("second")
            .tab_order(1)
            .position(10, 3)
            .size(8, 1)
            .password(true),
    )
    .unwrap();
    form
}

fn started(screen: &Arc<MemoryScreen>, name: &str) -> SharedForm {
    let mut form = two_field_form(screen, name);
    form.start().unwrap();
    form.into_shared()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

mod coordinator_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn enter_publishes_form_name_once() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, mut rx) = submission_channel(4);

        screen.type_str("ab");
        screen.push_key(Key::Enter);
        let delegation = PollCoordinator::new(form.clone(), tx).spawn();
        assert_eq!(delegation.form(), "F");

        let outcome = delegation.finished().await.unwrap();
        assert_eq!(outcome, Outcome::Submitted);
        assert_eq!(rx.recv().await.as_deref(), Some("F"));
        assert!(rx.try_recv().is_err());
        assert_eq!(form.lock().collect()["first"], "ab");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn escape_does_not_publish() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, mut rx) = submission_channel(4);

        screen.type_str("x");
        screen.push_key(Key::Esc);
        let outcome = PollCoordinator::new(form.clone(), tx)
            .spawn()
            .finished()
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Escaped);
        assert!(rx.try_recv().is_err());
        assert_eq!(form.lock().collect()["first"], "x");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn keys_edit_and_move_focus() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, _rx) = submission_channel(4);

        screen.type_str("abc");
        screen.push_key(Key::Backspace);
        screen.push_key(Key::Tab);
        screen.type_str("pw");
        screen.push_key(Key::BackTab);
        screen.type_str("z");
        screen.push_key(Key::Other("up".into()));
        screen.push(Event::Resize {
            width: 40,
            height: 6,
        });
        screen.push_key(Key::Esc);

        let outcome = PollCoordinator::new(form.clone(), tx)
            .spawn()
            .finished()
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Escaped);

        let values = form.lock().collect();
        assert_eq!(values["first"], "abz");
        assert_eq!(values["second"], "pw");
        assert_eq!(screen.text_at(10, 1, 3), "abz");
        assert_eq!(screen.text_at(10, 3, 2), "**");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancellation_consumes_exactly_one_wake() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, mut rx) = submission_channel(4);
        let token = CancellationToken::new();

        let delegation = PollCoordinator::new(form, tx)
            .with_cancellation(token.clone())
            .spawn();
        assert!(screen.wait_for_idle_reader(WAIT));
        assert_eq!(delegation.state(), CoordinatorState::Polling);

        token.cancel();
        let outcome = delegation.finished().await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(screen.wake_count(), 1);
        assert_eq!(screen.pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wake_for_another_delegation_is_skipped() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, _rx) = submission_channel(4);

        let coordinator = PollCoordinator::new(form, tx);
        let foreign = coordinator.id() + 1000;
        screen.push(Event::Wake(foreign));
        screen.type_str("a");
        screen.push_key(Key::Esc);

        let delegation = coordinator.spawn();
        wait_until(|| delegation.state() == CoordinatorState::Closed).await;
        assert_eq!(delegation.stale_wakes(), 1);
        assert_eq!(delegation.finished().await.unwrap(), Outcome::Escaped);
        assert_eq!(screen.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn state_is_closed_after_completion() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, _rx) = submission_channel(4);

        let coordinator = PollCoordinator::new(form, tx);
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        screen.push_key(Key::Esc);
        let delegation = coordinator.spawn();
        wait_until(|| delegation.state() == CoordinatorState::Closed).await;
        assert_eq!(delegation.finished().await.unwrap(), Outcome::Escaped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unstarted_form_is_rejected() {
        let screen = MemoryScreen::new(40, 6);
        let form = two_field_form(&screen, "F").into_shared();
        let (tx, _rx) = submission_channel(4);

        let err = PollCoordinator::new(form, tx)
            .spawn()
            .finished()
            .await
            .unwrap_err();
        assert_eq!(err, FormError::NotStarted("F".into()));
        assert_eq!(screen.poll_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn closed_source_ends_delegation() {
        let screen = MemoryScreen::new(40, 6);
        let form = started(&screen, "F");
        let (tx, _rx) = submission_channel(4);

        let delegation = PollCoordinator::new(form, tx).spawn();
        assert!(screen.wait_for_idle_reader(WAIT));
        screen.close();

        assert_eq!(delegation.finished().await.unwrap(), Outcome::SourceClosed);
    }
}

mod dispatcher_tests {
    use super::*;

    fn dispatcher(screen: &Arc<MemoryScreen>) -> (OuterDispatcher, FormSet) {
        let forms = FormSet::new();
        let mut form = two_field_form(screen, "F");
        form.start().unwrap();
        forms.insert(form);
        let (tx, rx) = submission_channel(4);
        spawn_submission_watcher(rx, forms.clone(), |_, _| {});
        (OuterDispatcher::new(screen.clone(), forms.clone(), tx), forms)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn only_one_reader_at_a_time() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, forms) = dispatcher(&screen);
        dispatcher.bind('j', Action::delegate("F")).unwrap();

        screen.push_key(Key::Char('j'));
        screen.type_str("hello");
        screen.push_key(Key::Enter);
        screen.push_key(Key::Ctrl('c'));

        let summary = tokio::task::spawn_blocking(move || dispatcher.run())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.exit, ExitReason::Requested);
        assert_eq!(summary.delegations.len(), 1);
        assert_eq!(summary.delegations[0].form, "F");
        assert_eq!(summary.delegations[0].outcome, Outcome::Submitted);
        assert_eq!(screen.max_concurrent_readers(), 1);
        // 'j' and ctrl+c by the dispatcher, six keys by the coordinator
        assert_eq!(screen.poll_count(), 8);

        let form = forms.get("F").unwrap();
        assert_eq!(form.lock().collect()["first"], "hello");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unbound_keys_are_ignored() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, _forms) = dispatcher(&screen);

        screen.type_str("xyz");
        screen.push_key(Key::Tab);
        screen.push_key(Key::Ctrl('c'));

        let summary = tokio::task::spawn_blocking(move || dispatcher.run())
            .await
            .unwrap()
            .unwrap();
        assert!(summary.delegations.is_empty());
        assert_eq!(screen.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timeout_cancels_delegation() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, _forms) = dispatcher(&screen);
        dispatcher
            .bind(
                'j',
                Action::Delegate {
                    form: "F".into(),
                    timeout: Some(Duration::from_millis(30)),
                },
            )
            .unwrap();

        screen.push_key(Key::Char('j'));
        let run = tokio::task::spawn_blocking(move || dispatcher.run());

        wait_until(|| screen.wake_count() == 1).await;
        assert!(screen.wait_for_idle_reader(WAIT));
        screen.push_key(Key::Ctrl('c'));

        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.delegations.len(), 1);
        assert_eq!(summary.delegations[0].outcome, Outcome::Cancelled);
        assert_eq!(summary.stale_wakes, 0);
        assert_eq!(screen.max_concurrent_readers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parent_token_cancels_delegation() {
        let screen = MemoryScreen::new(40, 6);
        let (dispatcher, _forms) = dispatcher(&screen);
        let parent = CancellationToken::new();
        let mut dispatcher = dispatcher.with_cancellation(parent.clone());
        dispatcher.bind('j', Action::delegate("F")).unwrap();

        screen.push_key(Key::Char('j'));
        let run = tokio::task::spawn_blocking(move || dispatcher.run());

        wait_until(|| screen.poll_count() == 2 && screen.active_readers() == 1).await;
        parent.cancel();

        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.delegations.len(), 1);
        assert_eq!(summary.delegations[0].outcome, Outcome::Cancelled);
        assert_eq!(summary.exit, ExitReason::Cancelled);
        assert_eq!(screen.max_concurrent_readers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parent_token_stops_idle_dispatcher() {
        let screen = MemoryScreen::new(40, 6);
        let (dispatcher, _forms) = dispatcher(&screen);
        let parent = CancellationToken::new();
        let mut dispatcher = dispatcher.with_cancellation(parent.clone());
        dispatcher.bind('j', Action::delegate("F")).unwrap();

        let run = tokio::task::spawn_blocking(move || dispatcher.run());
        assert!(screen.wait_for_idle_reader(WAIT));
        parent.cancel();

        let summary = run.await.unwrap().unwrap();
        assert!(summary.delegations.is_empty());
        assert_eq!(summary.stale_wakes, 0);
        assert_eq!(summary.exit, ExitReason::Cancelled);
        assert_eq!(screen.wake_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delegation_after_cancel_can_submit() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, forms) = dispatcher(&screen);
        dispatcher
            .bind(
                'j',
                Action::Delegate {
                    form: "F".into(),
                    timeout: Some(Duration::from_millis(30)),
                },
            )
            .unwrap();
        dispatcher.bind('k', Action::delegate("F")).unwrap();

        screen.push_key(Key::Char('j'));
        let run = tokio::task::spawn_blocking(move || dispatcher.run());
        wait_until(|| screen.wake_count() == 1).await;
        assert!(screen.wait_for_idle_reader(WAIT));

        screen.push_key(Key::Char('k'));
        screen.type_str("x");
        screen.push_key(Key::Enter);
        screen.push_key(Key::Ctrl('c'));

        let summary = run.await.unwrap().unwrap();
        let outcomes: Vec<_> = summary.delegations.iter().map(|d| d.outcome).collect();
        assert_eq!(outcomes, vec![Outcome::Cancelled, Outcome::Submitted]);
        assert_eq!(summary.stale_wakes, 0);
        assert_eq!(summary.exit, ExitReason::Requested);
        assert_eq!(forms.get("F").unwrap().lock().collect()["first"], "x");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn late_wake_does_not_cancel_next_delegation() {
        let screen = MemoryScreen::new(40, 6);
        let forms = FormSet::new();
        for name in ["F", "G"] {
            let mut form = two_field_form(&screen, name);
            form.start().unwrap();
            forms.insert(form);
        }
        // A full channel holds F's Enter until its timeout has fired.
        let (tx, mut rx) = submission_channel(1);
        tx.try_send("filler".to_string()).unwrap();

        let mut dispatcher = OuterDispatcher::new(screen.clone(), forms, tx);
        dispatcher
            .bind(
                'j',
                Action::Delegate {
                    form: "F".into(),
                    timeout: Some(Duration::from_millis(100)),
                },
            )
            .unwrap();
        dispatcher.bind('k', Action::delegate("G")).unwrap();

        screen.push_key(Key::Char('j'));
        screen.push_key(Key::Enter);
        screen.push_key(Key::Char('k'));
        let run = tokio::task::spawn_blocking(move || dispatcher.run());

        // F has read Enter and is blocked on the channel, then its wake lands
        // behind 'k'.
        wait_until(|| {
            screen.poll_count() == 2 && screen.active_readers() == 0 && screen.pending() == 1
        })
        .await;
        wait_until(|| screen.pending() == 2).await;
        assert_eq!(screen.wake_count(), 0);
        assert_eq!(rx.recv().await.as_deref(), Some("filler"));
        assert_eq!(rx.recv().await.as_deref(), Some("F"));
        screen.push_key(Key::Esc);
        screen.push_key(Key::Ctrl('c'));

        let summary = run.await.unwrap().unwrap();
        let outcomes: Vec<_> = summary
            .delegations
            .iter()
            .map(|d| (d.form.as_str(), d.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![("F", Outcome::Submitted), ("G", Outcome::Escaped)]
        );
        assert_eq!(summary.stale_wakes, 1);
        assert_eq!(summary.exit, ExitReason::Requested);
        assert_eq!(screen.wake_count(), 1);
        assert_eq!(screen.max_concurrent_readers(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stale_wake_is_discarded() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, _forms) = dispatcher(&screen);

        screen.push(Event::Wake(42));
        screen.push_key(Key::Ctrl('c'));

        let summary = tokio::task::spawn_blocking(move || dispatcher.run())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.stale_wakes, 1);
        assert_eq!(summary.exit, ExitReason::Requested);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn exit_binding_and_shift() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, forms) = dispatcher(&screen);
        dispatcher
            .bind(
                'u',
                Action::Shift {
                    form: "F".into(),
                    dx: 2,
                    dy: 1,
                },
            )
            .unwrap();
        dispatcher.bind('q', Action::Exit).unwrap();

        screen.push_key(Key::Char('u'));
        screen.push_key(Key::Char('q'));

        let summary = tokio::task::spawn_blocking(move || dispatcher.run())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.exit, ExitReason::Requested);

        let form = forms.get("F").unwrap();
        assert_eq!(form.lock().field("first").unwrap().position(), (12, 2));
        assert_eq!(form.lock().field("second").unwrap().position(), (12, 4));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn source_close_ends_run() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, _forms) = dispatcher(&screen);
        dispatcher.bind('j', Action::delegate("F")).unwrap();

        screen.push_key(Key::Char('j'));
        let run = tokio::task::spawn_blocking(move || dispatcher.run());
        wait_until(|| screen.poll_count() == 2 && screen.active_readers() == 1).await;
        screen.close();

        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.exit, ExitReason::SourceClosed);
        assert_eq!(summary.delegations[0].outcome, Outcome::SourceClosed);
    }

    #[tokio::test]
    async fn binding_unknown_form_fails() {
        let screen = MemoryScreen::new(40, 6);
        let (mut dispatcher, _forms) = dispatcher(&screen);
        let err = dispatcher.bind('k', Action::delegate("missing")).unwrap_err();
        assert_eq!(err, FormError::UnknownForm("missing".into()));
        assert!(dispatcher.bindings().is_empty());
    }
}

mod submission_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn watcher_collects_submitted_form() {
        let screen = MemoryScreen::new(40, 6);
        let forms = FormSet::new();
        let form = forms.insert(two_field_form(&screen, "F"));
        form.lock().start().unwrap();

        let (tx, rx) = submission_channel(4);
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
        let watcher = spawn_submission_watcher(rx, forms.clone(), move |name, values| {
            let _ = seen_tx.send((name.to_string(), values));
        });

        screen.type_str("ok");
        screen.push_key(Key::Tab);
        screen.type_str("secret");
        screen.push_key(Key::Enter);
        let outcome = PollCoordinator::new(form, tx)
            .spawn()
            .finished()
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Submitted);

        let (name, values) = seen_rx.recv().await.unwrap();
        assert_eq!(name, "F");
        assert_eq!(values["first"], "ok");
        assert_eq!(values["second"], "secret");

        // The coordinator dropped its sender, so the watcher winds down.
        tokio::time::timeout(WAIT, watcher).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn watcher_skips_unknown_names() {
        let forms = FormSet::new();
        let (tx, rx) = submission_channel(4);
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let watcher = spawn_submission_watcher(rx, forms, move |name, _| {
            let _ = seen_tx.send(name.to_string());
        });

        tx.send("ghost".into()).await.unwrap();
        drop(tx);
        watcher.await.unwrap();
        assert!(seen_rx.recv().await.is_none());
    }
}
