use std::time::{Duration, Instant};

use pagebook::content::{BookContent, Illustration, Page};
use pagebook::pagination::Direction;
use pagebook::render::{Block, render};
use pagebook::storage::{JsonFileStore, KeyValueStore};
use pagebook::test_utils::test_helpers::*;
use pagebook::theme::Theme;
use pagebook::widget::welcome_popup::{USER_INFO_KEY, UserProfile};
use pagebook::{app::PopupKind, run_app_with_event_source};
use tempfile::TempDir;

fn chapter(text: &str) -> Page {
    Page::Chapter {
        image: Illustration::from("images/page.png".to_string()),
        image_title: "A page".to_string(),
        text: text.to_string(),
    }
}

fn book_of(pages: usize) -> BookContent {
    let plain: Vec<Page> = (0..pages).map(|i| chapter(&format!("text {i}"))).collect();
    let annotated: Vec<Page> = (0..pages).map(|i| chapter(&format!("tëxt {i}"))).collect();
    BookContent::new("Test book", plain, annotated).unwrap()
}

#[test]
fn test_index_stays_in_bounds() {
    let (mut app, _) = TestAppBuilder::sample().build();

    app.previous_page();
    app.previous_page();
    assert_eq!(app.current_page(), 0);

    for _ in 0..12 {
        app.next_page();
    }
    assert_eq!(app.current_page(), 4);
    assert!(app.paginator().is_last());
    assert_eq!(app.paginator().progress_label(), "Page 5 of 5");
}

#[test]
fn test_single_page_book_never_moves() {
    let (mut app, _) = TestAppBuilder::new(book_of(1)).build();
    app.next_page();
    app.previous_page();
    assert_eq!(app.current_page(), 0);
    assert_eq!(app.paginator().progress_label(), "Page 1 of 1");
    assert_eq!(app.counts().reads, 0);
}

#[test]
fn test_invalid_jump_leaves_page_and_reports() {
    let (mut app, _) = TestAppBuilder::new(book_of(10)).build();
    app.next_page();

    for input in ["11", "0", "", "abc"] {
        app.jump_to_input(input);
        assert_eq!(app.current_page(), 1, "input {input:?}");
        let message = &app.notifications.current().unwrap().message;
        assert!(message.starts_with("Invalid page number"), "{message}");
    }

    app.jump_to_input("10");
    assert_eq!(app.current_page(), 9);
}

#[test]
fn test_completed_read_counts_once_per_arrival() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);

    for _ in 0..4 {
        app.next_page();
    }
    assert_eq!(app.counts().reads, 1);

    // parked on the last page: redraws and no-op turns change nothing
    for _ in 0..3 {
        terminal.draw(|f| app.draw(f)).unwrap();
        app.next_page();
    }
    app.jump_to_input("5");
    assert_eq!(app.counts().reads, 1);

    app.previous_page();
    app.next_page();
    assert_eq!(app.counts().reads, 2);

    app.jump_to_input("1");
    app.jump_to_input("5");
    assert_eq!(app.counts().reads, 3);
    assert_eq!(app.store().get("readCount").as_deref(), Some("3"));
}

#[test]
fn test_view_count_is_once_per_mount() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    {
        let (mut app, _) = TestAppBuilder::sample()
            .store(JsonFileStore::open(&path).unwrap())
            .build();
        assert_eq!(app.counts().views, 1);
        for _ in 0..6 {
            app.next_page();
        }
        assert_eq!(app.counts().views, 1);
    }

    let (app, _) = TestAppBuilder::sample()
        .store(JsonFileStore::open(&path).unwrap())
        .build();
    assert_eq!(app.counts().views, 2);
    // the read from the first session survives
    assert_eq!(app.counts().reads, 1);
}

#[test]
fn test_diacritics_toggle_keeps_page_and_image() {
    let (mut app, _) = TestAppBuilder::sample().build();
    app.jump_to_input("3");
    let before = app.current_view().unwrap();

    app.toggle_diacritics();
    let after = app.current_view().unwrap();

    assert_eq!(app.current_page(), 2);
    assert_eq!(before.index, after.index);
    assert_eq!(before.blocks[0], after.blocks[0]);
    assert!(matches!(before.blocks[0], Block::Illustration { .. }));
    assert_ne!(before.blocks[1], after.blocks[1]);
    match &after.blocks[1] {
        Block::Body { text } => assert!(text.contains("בַּבֹּקֶר")),
        other => panic!("expected body, got {other:?}"),
    }
}

#[test]
fn test_render_is_pure() {
    let book = BookContent::sample().unwrap();
    let (app, _) = TestAppBuilder::sample().build();
    let options = app.options();
    for index in 0..book.len() {
        assert_eq!(
            render(index, &book, &options),
            render(index, &book, &options)
        );
    }
    assert_eq!(render(book.len(), &book, &options), None);
}

#[test]
fn test_dark_mode_reflects_on_surface_only() {
    let (mut app, handles) = TestAppBuilder::sample().build();
    let before = app.current_view();

    app.toggle_dark_mode();
    assert_eq!(app.theme(), Theme::Dark);
    assert_eq!(app.current_view(), before);

    app.toggle_dark_mode();
    assert_eq!(
        *handles.themes.borrow(),
        vec![Theme::Light, Theme::Dark, Theme::Light]
    );
}

#[test]
fn test_page_form_through_event_loop() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .next_page(1)
        .go_to_page("4")
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.current_page(), 3);
    assert_eq!(app.active_popup(), None);
}

#[test]
fn test_page_form_escape_cancels() {
    let (mut app, _) = TestAppBuilder::sample().build();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .press_char('g')
        .type_text("3")
        .press_esc()
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.current_page(), 0);
}

#[test]
fn test_welcome_form_stores_profile_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    {
        let (mut app, _) = TestAppBuilder::sample()
            .store(JsonFileStore::open(&path).unwrap())
            .config(|config| config.show_welcome = true)
            .build();
        assert_eq!(app.active_popup(), Some(PopupKind::Welcome));

        let mut terminal = create_test_terminal(100, 30);
        let mut events = TestScenarioBuilder::new()
            // navigation keys go to the form while it is open
            .type_text("Noa")
            .press_key(pagebook::event_source::KeyCode::Tab)
            .type_text("noa@example.org")
            .press_enter()
            .quit()
            .build();
        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

        assert_eq!(app.current_page(), 0);
        let stored = app.store().get(USER_INFO_KEY).unwrap();
        let profile: UserProfile = serde_json::from_str(&stored).unwrap();
        assert_eq!(profile.name, "Noa");
        assert_eq!(profile.email, "noa@example.org");
    }

    let (app, _) = TestAppBuilder::sample()
        .store(JsonFileStore::open(&path).unwrap())
        .config(|config| config.show_welcome = true)
        .build();
    assert_eq!(app.active_popup(), None);
}

#[test]
fn test_welcome_skip_stores_nothing() {
    let (mut app, _) = TestAppBuilder::sample()
        .config(|config| config.show_welcome = true)
        .build();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new().press_esc().quit().build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
    assert_eq!(app.active_popup(), None);
    assert_eq!(app.store().get(USER_INFO_KEY), None);
}

#[test]
fn test_share_actions_are_recorded() {
    let (mut app, handles) = TestAppBuilder::sample().build();
    app.next_page();
    let mut terminal = create_test_terminal(100, 30);
    let mut events = TestScenarioBuilder::new()
        .press_char('s')
        .press_enter()
        .press_char('c')
        .press_esc()
        .quit()
        .build();

    run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();

    let shares = handles.shares.borrow();
    assert_eq!(shares.len(), 2);
    match &shares[0] {
        ShareCall::Open(url) => {
            assert!(url.starts_with("https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2F"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        shares[1],
        ShareCall::Copy("https://example.org/pagebook/dani-and-the-kitten".to_string())
    );
    assert_eq!(app.active_popup(), None);
}

#[test]
fn test_share_without_link_warns() {
    let (mut app, handles) = TestAppBuilder::new(book_of(3)).build();
    app.open_share();
    assert_eq!(app.active_popup(), None);
    assert_eq!(
        app.notifications.current().unwrap().message,
        "This book has no share link"
    );
    assert!(handles.shares.borrow().is_empty());
}

#[test]
fn test_turn_style_comes_from_indices_not_keys() {
    let (mut app, _) = TestAppBuilder::sample()
        .config(|config| config.transition_duration = Duration::from_millis(300))
        .build();
    let mut terminal = create_test_terminal(100, 30);

    app.next_page();
    app.next_page();
    let transition = app.transition();
    assert!(transition.is_animating());
    assert_eq!(
        transition.current().class_name().as_deref(),
        Some("page-turn-next-enter")
    );
    // the second turn settled the first one
    assert_eq!(transition.exiting().unwrap().index, 1);
    terminal.draw(|f| app.draw(f)).unwrap();

    // a jump backwards animates as a previous-page turn but is not a
    // directional step
    app.jump_to_input("1");
    assert_eq!(app.paginator().direction(), Direction::Forward);
    assert_eq!(
        app.transition().current().class_name().as_deref(),
        Some("page-turn-prev-enter")
    );
    terminal.draw(|f| app.draw(f)).unwrap();

    assert!(app.tick(Instant::now() + Duration::from_secs(1)));
    assert!(!app.transition().is_animating());
    assert_eq!(app.transition().current().index, 0);
}
