use pagebook::AppAction;
use pagebook::event_source::{KeyCode, KeyEvent, KeyModifiers};
use pagebook::run_app_with_event_source;
use pagebook::test_utils::test_helpers::*;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn test_first_page_layout() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);
    terminal.draw(|f| app.draw(f)).unwrap();
    let snapshot = capture_terminal_state(&terminal);

    assert!(snapshot.contains("דני והגור"), "{snapshot}");
    assert!(snapshot.contains("Book cover: דני והגור"), "{snapshot}");
    assert!(snapshot.contains("Page 1 of 5"));
    assert!(snapshot.contains("Views: 1 | Completed reads: 0"));
    assert!(snapshot.contains("d Dark mode"));
    assert!(snapshot.contains("n With marks"));
    assert!(snapshot.contains("< Next"));
    assert!(snapshot.contains("Previous >"));
    assert!(snapshot.contains("Read aloud is off"));
    assert!(!snapshot.contains("Widen the terminal"));
}

#[test]
fn test_last_page_after_event_loop() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .next_page(2)
        .press_key(KeyCode::PageDown)
        .press_char(' ')
        .press_char('d')
        .press_char('n')
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    let snapshot = capture_terminal_state(&terminal);

    assert_eq!(app.current_page(), 4);
    assert!(snapshot.contains("Page 5 of 5"), "{snapshot}");
    assert!(snapshot.contains("Completed reads: 1"));
    assert!(snapshot.contains("d Light mode"));
    assert!(snapshot.contains("n Without marks"));
    assert!(snapshot.contains("Illustration for chapter 5: לילה טוב"));
}

#[test]
fn test_narrow_terminal_uses_compact_layout() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(60, 24);
    terminal.draw(|f| app.draw(f)).unwrap();
    let snapshot = capture_terminal_state(&terminal);

    assert!(app.viewport().is_narrow());
    assert!(snapshot.contains("Widen the terminal"), "{snapshot}");
    assert!(snapshot.contains("[Book cover: דני והגור]"));
    // buttons shrink to their keys
    assert!(!snapshot.contains("Dark mode"));

    let mut wide = create_test_terminal(120, 30);
    wide.draw(|f| app.draw(f)).unwrap();
    assert!(!app.viewport().is_narrow());
    assert!(capture_terminal_state(&wide).contains("d Dark mode"));
}

#[test]
fn test_resize_event_updates_viewport() {
    let (mut app, _) = TestAppBuilder::sample().build();
    assert!(!app.viewport().is_narrow());
    app.handle_resize(50);
    assert!(app.viewport().is_narrow());
    app.handle_resize(80);
    assert!(!app.viewport().is_narrow());
}

#[test]
fn test_popups_render_over_page() {
    let (mut app, _) = TestAppBuilder::sample()
        .config(|config| config.show_welcome = true)
        .build();
    let mut terminal = create_test_terminal(100, 30);

    terminal.draw(|f| app.draw(f)).unwrap();
    assert!(capture_terminal_state(&terminal).contains("Welcome"));

    app.handle_key_event(key(KeyCode::Esc));
    app.handle_key_event(key(KeyCode::Char('i')));
    terminal.draw(|f| app.draw(f)).unwrap();
    let snapshot = capture_terminal_state(&terminal);
    assert!(snapshot.contains("About"), "{snapshot}");

    // the popup takes the keys: 'q' closes it instead of quitting
    assert_eq!(app.handle_key_event(key(KeyCode::Char('q'))), None);
    assert_eq!(app.active_popup(), None);
}

#[test]
fn test_invalid_jump_message_in_help_bar() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new().go_to_page("9").quit().build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    let snapshot = capture_terminal_state(&terminal);
    assert!(snapshot.contains("Invalid page number"), "{snapshot}");
    assert_eq!(app.current_page(), 0);
}

#[test]
fn test_escape_dismisses_message_before_quitting() {
    let (mut app, _) = TestAppBuilder::sample().build();
    app.jump_to_input("42");
    assert_eq!(app.handle_key_event(key(KeyCode::Esc)), None);
    assert!(app.notifications.current().is_none());
    assert_eq!(
        app.handle_key_event(key(KeyCode::Esc)),
        Some(AppAction::Quit)
    );
}
