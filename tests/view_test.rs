#[cfg(test)]
mod view_tests {
    use camkit::config::CamkitConfig;
    use camkit::permissions::{PermissionStatus, StaticPermissions};
    use camkit::setup::SetupPhase;
    use camkit::testing::{CaptureScript, DeferredPermissions, ManualExecutor, RecordingDevice};
    use camkit::timing::ManualClock;
    use camkit::types::{
        CameraFacing, Dimensions, Orientation, OrientationEvent, Rect, Size, TorchMode, ZoomEvent,
        ZoomMode,
    };
    use camkit::widgets::HeadlessWidgets;
    use camkit::{
        CameraProps, CameraView, ChangedProps, CodeFormat, EventHandler, PermissionState,
        PinchGesture, PropName, ScanEvent, SimulatorCamera,
    };
    use std::sync::{Arc, Mutex};

    struct Harness {
        view: Arc<CameraView>,
        camera: Arc<SimulatorCamera>,
        executor: Arc<ManualExecutor>,
        widgets: HeadlessWidgets,
        clock: Arc<ManualClock>,
    }

    fn harness(permissions: Arc<dyn camkit::permissions::PermissionProvider>) -> Harness {
        let camera = Arc::new(SimulatorCamera::new(Dimensions {
            width: 640,
            height: 480,
        }));
        let executor = Arc::new(ManualExecutor::new());
        let widgets = HeadlessWidgets::new();
        let clock = Arc::new(ManualClock::new(10_000));
        let view = CameraView::builder(CamkitConfig::default())
            .device(camera.clone())
            .widgets(widgets.widget_set())
            .executor(executor.clone())
            .permissions(permissions)
            .clock(clock.clone())
            .build()
            .map(Arc::new)
            .unwrap();
        Harness {
            view,
            camera,
            executor,
            widgets,
            clock,
        }
    }

    fn changed(props: &[PropName]) -> ChangedProps {
        props.iter().copied().collect()
    }

    #[test]
    fn test_permission_then_props_sets_up_once() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        h.executor.run_until_idle();
        assert_eq!(h.camera.setup_calls(), 0);
        assert_eq!(
            h.view.setup_phase(),
            SetupPhase::Awaiting {
                configuration_ready: false,
                permission_granted: true
            }
        );

        for _ in 0..3 {
            h.view.set_props(CameraProps::default(), &ChangedProps::all());
        }
        assert_eq!(h.camera.setup_calls(), 1);
        assert_eq!(h.camera.setup_facing(), Some(CameraFacing::Back));
    }

    #[test]
    fn test_late_permission_grant_sets_up() {
        let provider = Arc::new(DeferredPermissions::new(PermissionStatus::NotDetermined));
        let h = harness(provider.clone());
        h.view.set_props(CameraProps::default(), &ChangedProps::all());
        h.executor.run_until_idle();
        assert_eq!(h.view.permission_state(), PermissionState::Pending);
        assert_eq!(h.camera.setup_calls(), 0);

        // Answer arrives from a foreign thread.
        let answering = Arc::clone(&provider);
        std::thread::spawn(move || answering.resolve(true))
            .join()
            .unwrap();
        assert_eq!(h.camera.setup_calls(), 0);

        h.executor.run_ui_turn();
        assert_eq!(h.view.permission_state(), PermissionState::Granted);
        assert_eq!(h.camera.setup_calls(), 1);
    }

    #[test]
    fn test_scanning_end_to_end_with_throttle() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let events: Arc<Mutex<Vec<ScanEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let props = CameraProps {
            scan_barcode: true,
            on_read_code: Some(EventHandler::new(move |e| sink.lock().unwrap().push(e))),
            ..CameraProps::default()
        };
        h.view.set_props(props, &ChangedProps::all());
        h.executor.run_until_idle();

        for step in [0, 500, 500, 1500] {
            h.clock.advance(step);
            assert!(h.camera.simulate_code("4006381333931", CodeFormat::Ean13));
        }
        assert!(events.lock().unwrap().is_empty());
        h.executor.run_ui_turn();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].code_string_value, "4006381333931");
        assert_eq!(events[0].code_format, CodeFormat::Ean13);
    }

    #[test]
    fn test_disabling_scan_stops_decodes() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let mut props = CameraProps {
            scan_barcode: true,
            on_read_code: Some(EventHandler::new(|_| {})),
            ..CameraProps::default()
        };
        h.view.set_props(props.clone(), &ChangedProps::all());
        assert!(h.camera.is_scanning());

        props.scan_barcode = false;
        h.view.set_props(props, &changed(&[PropName::ScanBarcode]));
        assert!(!h.camera.is_scanning());
        assert!(!h.camera.simulate_code("x", CodeFormat::Qr));
    }

    #[test]
    fn test_show_frame_and_layout_push_geometry() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        h.view.set_frame(Rect::new(0.0, 0.0, 390.0, 844.0));
        assert_eq!(h.camera.scan_frame(), None);

        let props = CameraProps {
            show_frame: true,
            ..CameraProps::default()
        };
        h.view.set_props(props, &changed(&[PropName::ShowFrame]));
        assert!(h.widgets.scanner.is_hidden());
        h.executor.run_ui_turn();
        assert!(!h.widgets.scanner.is_hidden());
        assert_eq!(
            h.camera.scan_frame(),
            Some(Size {
                width: 330.0,
                height: 200.0
            })
        );

        h.view.set_frame(Rect::new(0.0, 0.0, 100.0, 150.0));
        assert_eq!(
            h.camera.scan_frame(),
            Some(Size {
                width: 40.0,
                height: 150.0
            })
        );
        assert_eq!(h.widgets.preview.frame(), Rect::new(0.0, 0.0, 100.0, 150.0));
    }

    #[test]
    fn test_camera_switch_forwards_torch() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let props = CameraProps {
            torch_mode: TorchMode::On,
            ..CameraProps::default()
        };
        h.view.set_props(props.clone(), &changed(&[PropName::TorchMode]));
        assert_eq!(h.camera.torch_mode(), TorchMode::On);

        let props = CameraProps {
            camera_type: CameraFacing::Front,
            ..props
        };
        h.view.set_props(props, &changed(&[PropName::CameraType]));
        assert_eq!(h.camera.facing(), CameraFacing::Front);
        // Torch was re-sent for the new camera, which has none.
        assert_eq!(h.camera.torch_mode(), TorchMode::Off);
    }

    #[test]
    fn test_pinch_zoom_reports_zoom_events() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let zooms: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&zooms);
        let props = CameraProps {
            on_zoom: Some(EventHandler::new(move |e: ZoomEvent| {
                sink.lock().unwrap().push(e.zoom)
            })),
            max_zoom: Some(3.0),
            ..CameraProps::default()
        };
        h.view
            .set_props(props.clone(), &changed(&[PropName::OnZoom, PropName::MaxZoom]));

        assert!(h.view.handle_pinch(PinchGesture::began()));
        h.view.handle_pinch(PinchGesture::changed(2.0));
        h.view.handle_pinch(PinchGesture::changed(5.0));
        h.view.handle_pinch(PinchGesture::ended(5.0));
        assert_eq!(h.camera.zoom(), 3.0);
        h.executor.run_ui_turn();
        assert_eq!(*zooms.lock().unwrap(), vec![2.0, 3.0]);

        let props = CameraProps {
            zoom_mode: ZoomMode::Off,
            ..props
        };
        h.view.set_props(props, &changed(&[PropName::ZoomMode]));
        assert!(!h.view.handle_pinch(PinchGesture::began()));
        assert_eq!(h.widgets.host.active_recognizers(), 0);
    }

    #[test]
    fn test_orientation_callback_is_forwarded() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let props = CameraProps {
            on_orientation_change: Some(EventHandler::new(move |e: OrientationEvent| {
                *sink.lock().unwrap() = Some(e.orientation)
            })),
            ..CameraProps::default()
        };
        h.view
            .set_props(props, &changed(&[PropName::OnOrientationChange]));
        h.camera.simulate_orientation(Orientation::LandscapeLeft);
        assert_eq!(*seen.lock().unwrap(), None);
        h.executor.run_ui_turn();
        assert_eq!(*seen.lock().unwrap(), Some(Orientation::LandscapeLeft));
    }

    #[test]
    fn test_remove_from_host_detaches_simulator() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        h.view.remove_from_host();
        assert!(h.camera.is_detached());
    }

    #[test]
    fn test_zoom_handler_can_call_back_into_view() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let slot: Arc<Mutex<Option<Arc<CameraView>>>> = Arc::new(Mutex::new(None));
        let seen: Arc<Mutex<Vec<(f64, Option<f64>)>>> = Arc::new(Mutex::new(Vec::new()));

        let (view_slot, sink) = (Arc::clone(&slot), Arc::clone(&seen));
        let props = CameraProps {
            max_zoom: Some(4.0),
            on_zoom: Some(EventHandler::new(move |e: ZoomEvent| {
                let view = view_slot.lock().unwrap().clone();
                if let Some(view) = view {
                    let current = view.props();
                    sink.lock().unwrap().push((e.zoom, current.max_zoom));
                    // Controlled zoom: feed the reported value back as a prop.
                    view.update_props(CameraProps {
                        zoom: Some(e.zoom),
                        ..current
                    });
                }
            })),
            ..CameraProps::default()
        };
        *slot.lock().unwrap() = Some(Arc::clone(&h.view));
        h.view
            .set_props(props, &changed(&[PropName::OnZoom, PropName::MaxZoom]));

        assert!(h.view.handle_pinch(PinchGesture::began()));
        h.view.handle_pinch(PinchGesture::changed(2.0));
        assert!(seen.lock().unwrap().is_empty());

        h.executor.run_until_idle();
        assert_eq!(*seen.lock().unwrap(), vec![(2.0, Some(4.0))]);
        assert_eq!(h.view.props().zoom, Some(2.0));
        assert_eq!(h.camera.zoom(), 2.0);
        slot.lock().unwrap().take();
    }

    #[test]
    fn test_orientation_handler_can_update_layout() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let view = Arc::downgrade(&h.view);
        let props = CameraProps {
            on_orientation_change: Some(EventHandler::new(move |e: OrientationEvent| {
                if let (Some(view), Orientation::LandscapeLeft) = (view.upgrade(), e.orientation)
                {
                    view.set_frame(Rect::new(0.0, 0.0, 844.0, 390.0));
                }
            })),
            ..CameraProps::default()
        };
        h.view
            .set_props(props, &changed(&[PropName::OnOrientationChange]));

        h.camera.simulate_orientation(Orientation::LandscapeLeft);
        h.executor.run_until_idle();
        assert_eq!(h.widgets.preview.frame(), Rect::new(0.0, 0.0, 844.0, 390.0));
    }

    #[test]
    fn test_layout_while_show_frame_is_pending() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        h.view.set_frame(Rect::new(0.0, 0.0, 390.0, 844.0));

        let props = CameraProps {
            show_frame: true,
            ..CameraProps::default()
        };
        h.view.set_props(props, &changed(&[PropName::ShowFrame]));
        // New layout lands before the deferred frame update runs.
        h.view.set_frame(Rect::new(0.0, 0.0, 100.0, 150.0));
        assert!(h.widgets.scanner.is_hidden());

        h.executor.run_ui_turn();
        assert!(!h.widgets.scanner.is_hidden());
        assert_eq!(
            h.camera.scan_frame(),
            Some(Size {
                width: 40.0,
                height: 150.0
            })
        );
    }

    #[test]
    fn test_host_calls_off_the_ui_thread_wait_for_ui_turn() {
        let h = harness(Arc::new(StaticPermissions(PermissionStatus::Granted)));
        let props = CameraProps {
            torch_mode: TorchMode::On,
            ..CameraProps::default()
        };

        let view = Arc::clone(&h.view);
        std::thread::spawn(move || {
            view.set_props(props, &ChangedProps::all());
            view.set_frame(Rect::new(0.0, 0.0, 200.0, 400.0));
        })
        .join()
        .unwrap();
        assert_eq!(h.camera.setup_calls(), 0);
        assert_eq!(h.camera.torch_mode(), TorchMode::Off);
        assert_eq!(h.widgets.preview.frame(), Rect::default());

        h.executor.run_until_idle();
        assert_eq!(h.camera.setup_calls(), 1);
        assert_eq!(h.camera.torch_mode(), TorchMode::On);
        assert_eq!(h.widgets.preview.frame(), Rect::new(0.0, 0.0, 200.0, 400.0));
    }

    #[test]
    fn test_abandoned_capture_reports_one_error() {
        let device = Arc::new(RecordingDevice::with_script(CaptureScript::Abandon));
        let executor = Arc::new(ManualExecutor::new());
        let view = CameraView::builder(CamkitConfig::default())
            .device(device.clone())
            .executor(executor.clone())
            .permissions(Arc::new(StaticPermissions(PermissionStatus::Granted)))
            .build()
            .unwrap();

        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let (ok, err) = (Arc::clone(&outcomes), Arc::clone(&outcomes));
        view.capture(
            move |result| ok.lock().unwrap().push(Ok(result)),
            move |message| err.lock().unwrap().push(Err(message)),
        );
        executor.run_until_idle();

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].as_ref().unwrap_err(),
            "Capture abandoned before completing"
        );
    }
}
