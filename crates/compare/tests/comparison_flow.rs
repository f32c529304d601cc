use std::rc::Rc;

use compare::{
    ComparisonSelection, ComparisonView, DragState, HeadlessProvider, ViewMode, ViewerConfig,
    ViewportPhase, ViewportRole,
};
use foundation::bounds::ScreenRect;
use foundation::time::CalendarDate;
use foundation::view::ViewState;
use layers::{Layer, LayerKind};
use pretty_assertions::assert_eq;
use runtime::scope::{HostEvent, RecordingHost};

struct Harness {
    view: ComparisonView,
    surfaces: HeadlessProvider,
    host: Rc<RecordingHost>,
}

fn harness() -> Harness {
    let surfaces = HeadlessProvider::new([800.0, 600.0]);
    let host = Rc::new(RecordingHost::new());
    let view = ComparisonView::new(
        ViewerConfig::default(),
        Box::new(surfaces.clone()),
        host.clone(),
    );
    Harness {
        view,
        surfaces,
        host,
    }
}

fn date(s: &str) -> CalendarDate {
    s.parse().unwrap()
}

fn modis_march() -> ComparisonSelection {
    ComparisonSelection::new("modis", date("2024-03-01"), date("2024-03-15"))
}

fn layer_ids(view: &ComparisonView, role: ViewportRole) -> Vec<String> {
    let vp = view.viewport(role).unwrap();
    let vp = vp.borrow();
    vp.attached_layers()
        .iter()
        .map(|d| d.id().as_str().to_string())
        .collect()
}

#[test]
fn entering_comparison_swaps_one_viewport_for_two() {
    let mut h = harness();
    let single = h.view.viewport(ViewportRole::Single).unwrap();
    let moved = ViewState::new(-1.5, 36.8, 7.0);
    h.view.set_view_state(ViewportRole::Single, moved);

    let warnings = h.view.enter_comparison_mode(modis_march()).unwrap();
    assert!(warnings.is_empty());

    assert_eq!(single.borrow().phase(), ViewportPhase::Destroyed);
    assert_eq!(h.view.viewport_count(), 2);
    assert_eq!(h.surfaces.created_count(), 3);
    assert_eq!(h.surfaces.live_count(), 2);
    assert!(h.view.viewport(ViewportRole::Single).is_none());
    assert_eq!(h.view.mode(), ViewMode::Comparison);
    assert!(h.view.is_synchronized());

    // Both panes start where the single map was.
    for role in [ViewportRole::Before, ViewportRole::After] {
        let vp = h.view.viewport(role).unwrap();
        assert_eq!(vp.borrow().view_state(), moved);
    }

    assert_eq!(
        layer_ids(&h.view, ViewportRole::Before),
        vec!["basemap:esri".to_string(), "modis@2024-03-01".to_string()]
    );
    assert_eq!(
        layer_ids(&h.view, ViewportRole::After),
        vec!["basemap:esri".to_string(), "modis@2024-03-15".to_string()]
    );
}

#[test]
fn exiting_comparison_restores_a_single_viewport_at_the_pair_view() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let before = h.view.viewport(ViewportRole::Before).unwrap();
    let after = h.view.viewport(ViewportRole::After).unwrap();
    let there = ViewState::new(51.5, -0.12, 9.0);
    h.view.set_view_state(ViewportRole::After, there);

    assert!(h.view.exit_comparison_mode());
    assert!(!h.view.exit_comparison_mode());

    assert_eq!(before.borrow().phase(), ViewportPhase::Destroyed);
    assert_eq!(after.borrow().phase(), ViewportPhase::Destroyed);
    assert_eq!(before.borrow().listener_count(), 0);
    assert_eq!(h.view.viewport_count(), 1);
    assert_eq!(h.surfaces.live_count(), 1);
    assert_eq!(h.view.active_view_state(), there);
    assert_eq!(
        layer_ids(&h.view, ViewportRole::Single),
        vec!["basemap:esri".to_string()]
    );
    assert!(!h.view.is_synchronized());
}

#[test]
fn pan_on_one_pane_is_mirrored_exactly_once() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    assert_eq!(h.view.mirrored_count(), 0);

    let v = ViewState::new(10.0, 20.0, 5.0);
    assert!(h.view.set_view_state(ViewportRole::Before, v));
    let after = h.view.viewport(ViewportRole::After).unwrap();
    assert_eq!(after.borrow().view_state(), v);
    assert_eq!(h.view.mirrored_count(), 1);

    h.view.pan_by(ViewportRole::After, 64.0, -32.0);
    h.view.zoom_by(ViewportRole::After, 1.0);
    let before = h.view.viewport(ViewportRole::Before).unwrap();
    assert_eq!(
        before.borrow().view_state(),
        after.borrow().view_state()
    );
    assert_eq!(before.borrow().view_state().zoom_level, 6.0);
    assert_eq!(h.view.mirrored_count(), 3);
}

#[test]
fn switching_basemap_keeps_views_and_overlays() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let v = ViewState::new(-33.9, 18.4, 8.0);
    h.view.set_view_state(ViewportRole::Before, v);

    assert_eq!(h.view.switch_basemap("dark"), "dark");

    for (role, overlay) in [
        (ViewportRole::Before, "modis@2024-03-01"),
        (ViewportRole::After, "modis@2024-03-15"),
    ] {
        assert_eq!(
            layer_ids(&h.view, role),
            vec!["basemap:dark".to_string(), overlay.to_string()]
        );
        let vp = h.view.viewport(role).unwrap();
        assert_eq!(vp.borrow().view_state(), v);
    }
    // Still one instance per pane.
    assert_eq!(h.surfaces.created_count(), 3);

    let frame = h.surfaces.latest(ViewportRole::After).unwrap().last_frame.unwrap();
    let basemap = frame.layer(LayerKind::Basemap).unwrap();
    assert!(basemap.tiles.iter().all(|t| t.url.contains("dark_all")));
    assert_eq!(basemap.attribution, "© CartoDB");
}

#[test]
fn unknown_basemap_resolves_to_default() {
    let mut h = harness();
    h.view.switch_basemap("dark");
    assert_eq!(h.view.switch_basemap("watercolor"), "esri");
    assert_eq!(
        layer_ids(&h.view, ViewportRole::Single),
        vec!["basemap:esri".to_string()]
    );
}

#[test]
fn basemap_choice_carries_into_comparison() {
    let mut h = harness();
    h.view.switch_basemap("osm");
    h.view.enter_comparison_mode(modis_march()).unwrap();
    assert_eq!(
        layer_ids(&h.view, ViewportRole::Before)[0],
        "basemap:osm".to_string()
    );
}

#[test]
fn slider_drag_clamps_and_releases_listeners() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    h.view.set_container(ScreenRect::new(0.0, 0.0, 800.0, 600.0));

    assert!(h.view.pointer_down());
    assert!(h.host.is_listening(HostEvent::PointerMove));
    assert_eq!(h.view.slider_state(), DragState::Dragging);

    h.view.pointer_move(200.0);
    assert_eq!(h.view.slider_position(), 25.0);
    h.view.pointer_move(-10.0);
    assert_eq!(h.view.slider_position(), 0.0);
    h.view.pointer_move(1200.0);
    assert_eq!(h.view.slider_position(), 100.0);
    h.view.pointer_move(600.0);
    assert!(h.view.pointer_up());

    assert_eq!(h.host.live_count(), 0);
    assert_eq!(h.view.slider_position(), 75.0);
    assert!(!h.view.pointer_move(100.0));

    let split = h.view.layout();
    assert_eq!(split.before.width, 600.0);
    assert_eq!(split.after.left, 600.0);
    assert_eq!(split.before.width + split.after.width, 800.0);
}

#[test]
fn every_exit_from_dragging_releases_listeners() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    h.view.set_container(ScreenRect::new(0.0, 0.0, 800.0, 600.0));

    h.view.pointer_down();
    h.view.pointer_cancel();
    assert_eq!(h.host.live_count(), 0);

    h.view.pointer_down();
    h.view.exit_comparison_mode();
    assert_eq!(h.host.live_count(), 0);

    h.view.enter_comparison_mode(modis_march()).unwrap();
    h.view.pointer_down();
    drop(h.view);
    assert_eq!(h.host.live_count(), 0);
    assert_eq!(h.host.attached_total(), h.host.detached_total());
    assert_eq!(h.surfaces.live_count(), 0);
}

#[test]
fn slider_position_survives_mode_switches() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    h.view.set_container(ScreenRect::new(0.0, 0.0, 400.0, 300.0));
    h.view.pointer_down();
    h.view.pointer_move(100.0);
    h.view.pointer_up();
    h.view.exit_comparison_mode();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    assert_eq!(h.view.slider_position(), 25.0);
}

#[test]
fn tile_failures_raise_one_notice_per_pane_and_date() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();

    let before = h.view.viewport(ViewportRole::Before).unwrap();
    let (overlay, coords) = {
        let vp = before.borrow();
        let overlay = vp.imagery().unwrap().id().clone();
        let frame = h
            .surfaces
            .latest(ViewportRole::Before)
            .unwrap()
            .last_frame
            .unwrap();
        let coords: Vec<_> = frame
            .layer(LayerKind::Imagery)
            .unwrap()
            .tiles
            .iter()
            .map(|t| t.coord)
            .collect();
        (overlay, coords)
    };
    assert!(coords.len() >= 2);

    assert!(h.view.report_tile_error(ViewportRole::Before, &overlay, coords[0]));
    assert!(h.view.report_tile_error(ViewportRole::Before, &overlay, coords[1]));

    let notices = h.view.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].pane, ViewportRole::Before);
    assert_eq!(notices[0].date, date("2024-03-01"));
    assert!(h.view.drain_notices().is_empty());

    // Basemap tile failures only show the fallback.
    let basemap = before.borrow().basemap().unwrap().id().clone();
    let frame = h.surfaces.latest(ViewportRole::Before).unwrap().last_frame.unwrap();
    let base_coord = frame.layer(LayerKind::Basemap).unwrap().tiles[0].coord;
    assert!(h.view.report_tile_error(ViewportRole::Before, &basemap, base_coord));
    assert!(h.view.drain_notices().is_empty());
}

#[test]
fn a_new_pair_reports_failures_again() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let fail_first_overlay_tile = |h: &mut Harness| {
        let vp = h.view.viewport(ViewportRole::After).unwrap();
        let overlay = vp.borrow().imagery().unwrap().id().clone();
        let frame = h.surfaces.latest(ViewportRole::After).unwrap().last_frame.unwrap();
        let coord = frame.layer(LayerKind::Imagery).unwrap().tiles[0].coord;
        h.view.report_tile_error(ViewportRole::After, &overlay, coord)
    };

    assert!(fail_first_overlay_tile(&mut h));
    assert_eq!(h.view.drain_notices().len(), 1);

    h.view.enter_comparison_mode(modis_march()).unwrap();
    assert!(fail_first_overlay_tile(&mut h));
    assert_eq!(h.view.drain_notices().len(), 1);
}

#[test]
fn reports_for_destroyed_panes_are_no_ops() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let before = h.view.viewport(ViewportRole::Before).unwrap();
    let overlay = before.borrow().imagery().unwrap().id().clone();
    let frame = h.surfaces.latest(ViewportRole::Before).unwrap().last_frame.unwrap();
    let coord = frame.layer(LayerKind::Imagery).unwrap().tiles[0].coord;

    h.view.exit_comparison_mode();
    assert!(!before.borrow_mut().report_tile_error(&overlay, coord));
    assert!(!h.view.report_tile_error(ViewportRole::Before, &overlay, coord));
    assert!(h.view.drain_notices().is_empty());
}

#[test]
fn unknown_imagery_shows_basemap_only() {
    let mut h = harness();
    let selection = ComparisonSelection::new("sentinel-2", date("2024-03-01"), date("2024-03-15"));
    h.view.enter_comparison_mode(selection).unwrap();
    assert_eq!(
        layer_ids(&h.view, ViewportRole::Before),
        vec!["basemap:esri".to_string()]
    );
    assert!(h.view.is_synchronized());
}

#[test]
fn reentering_rebuilds_the_pair() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let old_before = h.view.viewport(ViewportRole::Before).unwrap();
    let old_handle = old_before.borrow().handle();

    let viirs = ComparisonSelection::new("viirs", date("2023-01-01"), date("2024-01-01"));
    h.view.enter_comparison_mode(viirs).unwrap();

    assert_eq!(old_before.borrow().phase(), ViewportPhase::Destroyed);
    let new_before = h.view.viewport(ViewportRole::Before).unwrap();
    assert_ne!(new_before.borrow().handle(), old_handle);
    assert_eq!(h.view.viewport_count(), 2);
    assert_eq!(h.surfaces.live_count(), 2);
    assert_eq!(
        layer_ids(&h.view, ViewportRole::After),
        vec!["basemap:esri".to_string(), "viirs@2024-01-01".to_string()]
    );
}

#[test]
fn imagery_urls_carry_the_pane_dates() {
    let mut h = harness();
    h.view.enter_comparison_mode(modis_march()).unwrap();
    let frame = h.surfaces.latest(ViewportRole::Before).unwrap().last_frame.unwrap();
    let imagery = frame.layer(LayerKind::Imagery).unwrap();
    assert!(!imagery.tiles.is_empty());
    for tile in &imagery.tiles {
        assert!(tile.url.contains("/MODIS_Terra_CorrectedReflectance_TrueColor/default/2024-03-01/"));
        assert!(tile.url.ends_with(".jpeg"));
    }
}
