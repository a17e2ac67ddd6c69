use std::time::{Duration, Instant};

use marquee_core::{
    to_tlf, AnnotationSurface, App, Geometry, ImageInfo, Key, KeyEvent, MarkerId, Modifiers,
    PointerEvent, SurfaceEvent,
};

fn drag(app: &mut App, from: (f64, f64), to: (f64, f64)) {
    app.handle_pointer(PointerEvent::down(from.0, from.1));
    app.handle_pointer(PointerEvent::moved(to.0, to.1));
    app.handle_pointer(PointerEvent::up(to.0, to.1));
}

fn click(app: &mut App, x: f64, y: f64) -> MarkerId {
    app.handle_pointer(PointerEvent::down(x, y));
    app.handle_pointer(PointerEvent::up(x, y));
    app.selected_id()
}

fn type_text(app: &mut App, text: &str) {
    let now = Instant::now();
    for c in text.chars() {
        app.handle_key(KeyEvent::down(Key::Char(c)), now);
        app.handle_key(KeyEvent::up(Key::Char(c)), now);
    }
}

fn new_app() -> App {
    let mut app = App::new();
    app.load_image(ImageInfo {
        name: "photo.png".to_string(),
        width: 640,
        height: 480,
    });
    app
}

#[test]
fn drags_in_every_quadrant_commit_top_left_origin() {
    let mut app = new_app();
    let center = (100.0, 100.0);
    for (dx, dy) in [(30.0, 20.0), (-30.0, 20.0), (30.0, -20.0), (-30.0, -20.0)] {
        drag(&mut app, center, (center.0 + dx, center.1 + dy));
    }

    let geometries: Vec<Geometry> = app.surface.markers().iter().map(|m| m.geometry).collect();
    assert_eq!(
        geometries,
        vec![
            Geometry::new(100.0, 100.0, 30.0, 20.0),
            Geometry::new(70.0, 100.0, 30.0, 20.0),
            Geometry::new(100.0, 80.0, 30.0, 20.0),
            Geometry::new(70.0, 80.0, 30.0, 20.0),
        ]
    );
}

#[test]
fn tiny_drags_never_create_markers() {
    let mut app = new_app();
    drag(&mut app, (10.0, 10.0), (15.0, 20.0));
    drag(&mut app, (10.0, 10.0), (0.0, 5.0));
    assert!(app.surface.markers().is_empty());
    assert!(app.annotations.is_empty());
}

#[test]
fn ids_increase_and_are_never_reused() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (20.0, 20.0));
    drag(&mut app, (40.0, 0.0), (60.0, 20.0));
    click(&mut app, 50.0, 10.0);
    app.remove_selected();
    drag(&mut app, (80.0, 0.0), (100.0, 20.0));

    let ids: Vec<u32> = app.surface.markers().iter().map(|m| m.id.get()).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn stacked_markers_cycle_on_repeated_clicks() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (100.0, 100.0));
    drag(&mut app, (20.0, 20.0), (120.0, 120.0));
    drag(&mut app, (40.0, 40.0), (140.0, 140.0));

    let picks: Vec<u32> = (0..4).map(|_| click(&mut app, 50.0, 50.0).get()).collect();
    assert_eq!(picks, vec![1, 2, 3, 1]);
}

#[test]
fn removal_falls_back_to_ledger_predecessor() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (20.0, 20.0));
    drag(&mut app, (40.0, 0.0), (60.0, 20.0));
    drag(&mut app, (80.0, 0.0), (100.0, 20.0));

    click(&mut app, 90.0, 10.0);
    click(&mut app, 10.0, 10.0);
    click(&mut app, 50.0, 10.0);
    app.drain_events();

    app.handle_key(
        KeyEvent::down(Key::Backspace).with_modifiers(Modifiers::ALT),
        Instant::now(),
    );
    assert_eq!(app.selected_id(), MarkerId(1));

    let events = app.drain_events();
    assert_eq!(events[0], SurfaceEvent::MarkerRemoved { id: MarkerId(2) });
    assert!(matches!(
        events[1],
        SurfaceEvent::ActiveMarkerChanged { id: MarkerId(1), .. }
    ));

    app.remove_selected();
    assert_eq!(app.selected_id(), MarkerId(3));
    app.remove_selected();
    assert_eq!(app.selected_id(), MarkerId::NONE);
    assert!(app.surface.markers().is_empty());
}

#[test]
fn next_marker_visits_ascending_and_wraps() {
    let mut surface = AnnotationSurface::new();
    for x in [0.0, 30.0, 60.0] {
        surface.handle_pointer(PointerEvent::down(x, 0.0));
        surface.handle_pointer(PointerEvent::up(x + 20.0, 20.0));
    }

    let visits: Vec<u32> = (0..5)
        .filter_map(|_| surface.advance_to_next_marker())
        .map(|ev| match ev {
            SurfaceEvent::ActiveMarkerChanged { id, .. } => id.get(),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(visits, vec![1, 2, 3, 1, 2]);
}

#[test]
fn held_delete_key_removes_four_characters_in_350ms() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (20.0, 20.0));
    click(&mut app, 10.0, 10.0);
    type_text(&mut app, "annotation");

    let t0 = Instant::now();
    app.handle_key(KeyEvent::down(Key::Backspace), t0);
    let mut now = t0;
    while now < t0 + Duration::from_millis(350) {
        now += Duration::from_millis(10);
        app.poll(now);
    }
    app.handle_key(KeyEvent::up(Key::Backspace), now);
    app.poll(now + Duration::from_secs(1));

    assert_eq!(app.active_text(), "annota");
    assert_eq!(app.annotations.text(MarkerId(1)), "annota");
}

#[test]
fn deselect_reports_zero_and_empty_geometry() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (20.0, 20.0));
    click(&mut app, 10.0, 10.0);
    app.drain_events();

    assert_eq!(click(&mut app, 300.0, 300.0), MarkerId::NONE);
    assert_eq!(
        app.drain_events(),
        vec![SurfaceEvent::ActiveMarkerChanged {
            id: MarkerId::NONE,
            geometry: Geometry::new(0.0, 0.0, 0.0, 0.0),
        }]
    );
    assert!(!app.text.is_enabled());
}

#[test]
fn export_after_editing_session() {
    let mut app = new_app();
    drag(&mut app, (0.0, 0.0), (10.0, 20.0));
    drag(&mut app, (5.0, 5.0), (15.0, 15.0));

    click(&mut app, 2.0, 2.0);
    type_text(&mut app, "hi");
    click(&mut app, 12.0, 12.0);
    type_text(&mut app, "lo");

    assert_eq!(
        to_tlf(&app.annotations),
        "1:hi\n2:lo\n\n1{0,0}/{10,20};2{5,5}/{10,10};"
    );
}
