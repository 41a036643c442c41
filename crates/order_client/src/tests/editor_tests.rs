use shared::protocol::ActionResponse;

use super::*;
use crate::test_support::{RecordingApi, Reply};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

fn original() -> OrderFields {
    [
        ("order_id", "42"),
        ("customer_name", "Acme Mills"),
        ("yarn_type", "Cotton 30s"),
        ("quantity_kg", "500"),
        ("startup_date", "2026-11-01"),
        ("order_type", "export"),
        ("amount_usd", "12000"),
        ("notes", ""),
    ]
    .into_iter()
    .collect()
}

fn editor(api: Arc<RecordingApi>) -> OrderEditor {
    OrderEditor::new(api, Settings::default(), original()).with_today(today)
}

fn drain(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn input_updates_draft_and_marks_field() {
    let editor = editor(Arc::new(RecordingApi::new()));

    assert_eq!(
        editor.on_input("quantity_kg", "0").await,
        Err(FieldError::QuantityOutOfRange)
    );
    assert!(editor.has_unsaved_changes().await);
    let mark = editor.field_mark("quantity_kg").await.expect("mark");
    assert_eq!(
        mark.message(),
        Some("Quantity must be between 0.01 and 10,000 kg")
    );

    assert_eq!(editor.on_input("quantity_kg", "750").await, Ok(()));
    assert_eq!(
        editor.field_mark("quantity_kg").await,
        Some(FieldMark::Valid)
    );
}

#[tokio::test]
async fn error_highlight_expires_but_message_stays() {
    let editor = editor(Arc::new(RecordingApi::new()));
    let before = Instant::now();
    editor
        .on_input("customer_name", "A")
        .await
        .expect_err("too short");

    let mark = editor.field_mark("customer_name").await.expect("mark");
    assert!(mark.is_highlighted(before));
    assert!(!mark.is_highlighted(Instant::now() + Duration::from_secs(4)));
    assert_eq!(
        mark.message(),
        Some("Customer name must be at least 2 characters")
    );
}

#[tokio::test]
async fn reset_restores_original_and_clears_unsaved() {
    let editor = editor(Arc::new(RecordingApi::new()));
    let mut events = editor.subscribe_events();

    editor.on_input("yarn_type", "Polyester").await.expect("valid");
    assert!(editor.has_unsaved_changes().await);
    assert!(editor.leave_prompt().await.is_some());

    assert!(editor.reset().await);
    assert_eq!(editor.value("yarn_type").await, "Cotton 30s");
    assert!(!editor.has_unsaved_changes().await);
    assert!(editor.leave_prompt().await.is_none());
    assert!(editor.field_mark("yarn_type").await.is_none());
    assert!(drain(&mut events).contains(&ClientEvent::notice(
        NoticeLevel::Info,
        "Form reset to original values"
    )));

    assert!(!editor.reset().await);
}

#[tokio::test]
async fn auto_save_without_changes_sends_nothing() {
    let api = Arc::new(RecordingApi::new());
    let editor = editor(Arc::clone(&api));

    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Clean);
    assert_eq!(
        editor.on_blur("customer_name").await,
        Some(AutoSaveOutcome::Clean)
    );
    assert!(api.forms.lock().await.is_empty());
}

#[tokio::test]
async fn auto_save_sends_full_form_and_clears_unsaved() {
    let api = Arc::new(RecordingApi::new());
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.on_input("quantity_kg", "900").await.expect("valid");
    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Saved);

    let sent = api.form_calls("/auto_save_order").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value("quantity_kg"), "900");
    assert_eq!(sent[0].value("customer_name"), "Acme Mills");
    assert!(!editor.has_unsaved_changes().await);

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            ClientEvent::AutoSave(AutoSaveStatus::Saving),
            ClientEvent::AutoSave(AutoSaveStatus::Saved),
        ]
    );
}

#[tokio::test]
async fn failed_auto_save_keeps_changes_unsaved() {
    let api = Arc::new(RecordingApi::replying([
        Reply::Fail("connection reset"),
        Reply::Respond(ActionResponse::default()),
    ]));
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.on_input("amount_usd", "15000").await.expect("valid");
    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Failed);
    assert!(editor.has_unsaved_changes().await);
    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Failed);
    assert!(editor.has_unsaved_changes().await);
    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Saved);
    assert!(!editor.has_unsaved_changes().await);

    assert_eq!(api.form_calls("/auto_save_order").await.len(), 3);
    assert!(drain(&mut events).contains(&ClientEvent::AutoSave(AutoSaveStatus::Failed)));
}

#[tokio::test]
async fn blur_only_saves_designated_fields() {
    let api = Arc::new(RecordingApi::new());
    let editor = editor(Arc::clone(&api));

    editor.on_input("notes", "rush order").await.expect("valid");
    assert_eq!(editor.on_blur("notes").await, None);
    assert!(api.forms.lock().await.is_empty());

    assert_eq!(
        editor.on_blur("amount_usd").await,
        Some(AutoSaveOutcome::Saved)
    );
    assert_eq!(api.form_calls("/auto_save_order").await.len(), 1);
}

#[tokio::test]
async fn edits_during_auto_save_stay_unsaved() {
    let (api, gate) = RecordingApi::new().held();
    let api = Arc::new(api);
    let editor = Arc::new(editor(Arc::clone(&api)));

    editor.on_input("quantity_kg", "600").await.expect("valid");
    let pending = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.auto_save().await })
    };
    while api.form_calls("/auto_save_order").await.is_empty() {
        tokio::task::yield_now().await;
    }

    editor.on_input("quantity_kg", "650").await.expect("valid");
    assert_eq!(editor.auto_save().await, AutoSaveOutcome::Busy);
    assert!(matches!(
        editor.submit().await,
        Err(ClientError::SaveInFlight)
    ));

    gate.notify_one();
    assert_eq!(pending.await.expect("join"), AutoSaveOutcome::Saved);
    assert!(editor.has_unsaved_changes().await);
    assert_eq!(editor.value("quantity_kg").await, "650");
}

#[tokio::test]
async fn submit_blocks_invalid_form_without_request() {
    let api = Arc::new(RecordingApi::new());
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.on_input("startup_date", "2026-10-18").await.expect_err("past");
    editor.on_input("amount_usd", "0").await.expect_err("range");

    match editor.submit().await {
        Err(ClientError::Validation { field, message }) => {
            assert_eq!(field, "startup_date");
            assert_eq!(message, "Startup date cannot be in the past");
        }
        other => panic!("unexpected submit result: {other:?}"),
    }
    assert!(api.forms.lock().await.is_empty());
    assert!(matches!(
        editor.field_mark("amount_usd").await,
        Some(FieldMark::Invalid { .. })
    ));
    assert!(drain(&mut events).contains(&ClientEvent::notice(
        NoticeLevel::Error,
        FORM_INVALID_NOTICE
    )));
}

#[tokio::test]
async fn successful_submit_clears_unsaved_and_redirects() {
    let api = Arc::new(RecordingApi::new());
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.on_input("customer_name", "Acme Ltd").await.expect("valid");
    let outcome = editor.submit().await.expect("submit");

    assert_eq!(
        outcome,
        SubmitOutcome {
            redirect_to: DASHBOARD_PATH.to_string(),
            after: REDIRECT_DELAY,
        }
    );
    let sent = api.form_calls("/update_order").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value("customer_name"), "Acme Ltd");
    assert_eq!(sent[0].value("order_id"), "42");
    assert!(!editor.has_unsaved_changes().await);

    let events = drain(&mut events);
    assert!(events.contains(&ClientEvent::notice(
        NoticeLevel::Success,
        "Order updated successfully!"
    )));
    assert!(events.contains(&ClientEvent::Navigate {
        path: DASHBOARD_PATH.to_string(),
        after: REDIRECT_DELAY,
    }));
}

#[tokio::test]
async fn rejected_submit_surfaces_server_message_and_keeps_changes() {
    let api = Arc::new(RecordingApi::replying([Reply::Respond(
        ActionResponse::rejected("Permission denied"),
    )]));
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.on_input("yarn_type", "Viscose").await.expect("valid");
    match editor.submit().await {
        Err(ClientError::Rejected { message }) => assert_eq!(message, "Permission denied"),
        other => panic!("unexpected submit result: {other:?}"),
    }
    assert!(editor.has_unsaved_changes().await);
    assert!(drain(&mut events).contains(&ClientEvent::notice(
        NoticeLevel::Error,
        "Permission denied"
    )));
}

#[tokio::test]
async fn submit_transport_failure_uses_generic_notice() {
    let api = Arc::new(RecordingApi::replying([Reply::Fail("timed out")]));
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    let err = editor.submit().await.expect_err("transport failure");
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.notice_text("Error updating order"), "Error updating order");
    assert!(drain(&mut events).contains(&ClientEvent::notice(
        NoticeLevel::Error,
        "Error updating order"
    )));
}

#[tokio::test]
async fn save_draft_posts_even_when_clean() {
    let api = Arc::new(RecordingApi::replying([
        Reply::Respond(ActionResponse::ok()),
        Reply::Respond(ActionResponse::default()),
    ]));
    let editor = editor(Arc::clone(&api));
    let mut events = editor.subscribe_events();

    editor.save_draft().await.expect("draft saved");
    editor.on_input("notes", "call before shipping").await.expect("valid");
    let err = editor.save_draft().await.expect_err("rejected");
    assert!(matches!(err, ClientError::Rejected { .. }));
    assert!(editor.has_unsaved_changes().await);

    assert_eq!(api.form_calls("/save_draft").await.len(), 2);
    let events = drain(&mut events);
    assert!(events.contains(&ClientEvent::notice(
        NoticeLevel::Success,
        "Draft saved successfully!"
    )));
    assert!(events.contains(&ClientEvent::notice(
        NoticeLevel::Error,
        "Failed to save draft"
    )));
}

#[tokio::test]
async fn auto_save_task_saves_on_interval_and_stops_on_drop() {
    let api = Arc::new(RecordingApi::new());
    let settings = Settings {
        auto_save_interval: Duration::from_millis(20),
        ..Settings::default()
    };
    let editor = Arc::new(
        OrderEditor::new(Arc::clone(&api) as Arc<dyn OrderApi>, settings, original())
            .with_today(today),
    );

    let task = crate::AutoSaveTask::spawn(Arc::clone(&editor));
    assert!(task.is_running());
    editor.on_input("quantity_kg", "800").await.expect("valid");

    tokio::time::timeout(Duration::from_secs(2), async {
        while editor.has_unsaved_changes().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("auto-save tick");
    assert_eq!(api.form_calls("/auto_save_order").await.len(), 1);

    drop(task);
    editor.on_input("quantity_kg", "850").await.expect("valid");
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(editor.has_unsaved_changes().await);
    assert_eq!(api.form_calls("/auto_save_order").await.len(), 1);
}

#[tokio::test]
async fn submit_sends_exactly_the_values_it_validated() {
    let api = Arc::new(RecordingApi::new());
    let editor = Arc::new(editor(Arc::clone(&api)));

    // Queue a submit and then an edit behind a held form lock, so the edit
    // lands right after submit's validation pass.
    let held = editor.inner.lock().await;
    let submit = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.submit().await })
    };
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
    let edit = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.on_input("quantity_kg", "lots").await })
    };
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
    drop(held);

    submit.await.expect("join").expect("submit");
    edit.await.expect("join").expect_err("not a number");

    let sent = api.form_calls("/update_order").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value("quantity_kg"), "500");
    assert_eq!(editor.value("quantity_kg").await, "lots");
    assert!(editor.has_unsaved_changes().await);
}
