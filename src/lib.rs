// Re-export all public modules so they can be used from main.rs
pub mod error;
pub mod labels;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub use web::start;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tracing::{error, info, warn};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, Window};

    use crate::controller::input::wasm::{keyboard_event_to_input, mouse_move_to_input};
    use crate::controller::pointer_lock::wasm::{ElementLock, ElementOverlay};
    use crate::controller::{install_scene, ControllerConfig, FrameLoopContext, InputEvent, LoadedScene, WalkController};
    use crate::logging;
    use crate::model::{load_scene, Camera};
    use crate::view::{GpuContext, RenderState};

    /// Scene fetched at startup, relative to the page
    const SCENE_ID: &str = "assets/scene.json";

    const BLOCKER_STYLE: &str = "position:absolute;inset:0;display:flex;flex-direction:column;\
        justify-content:center;align-items:center;background:rgba(0,0,0,0.5);color:#fff;\
        font-family:sans-serif;cursor:pointer;";

    const INSTRUCTIONS: &str = "<p style=\"font-size:36px\">Click to walk</p>\
        <p>Move: WASD / arrow keys<br/>Look: mouse<br/>Release: Escape</p>";

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        let (window, document, canvas) = init_canvas(800, 600)?;
        let blocker = init_blocker(&document)?;
        setup_app(&window, &document, &canvas, blocker).await
    }

    /// Main application setup for WASM
    async fn setup_app(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        blocker: HtmlElement,
    ) -> Result<(), JsValue> {
        let gpu = GpuContext::new(canvas, canvas.width(), canvas.height())
            .await
            .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

        let cam = Rc::new(RefCell::new(Camera::new(gpu.config.width, gpu.config.height)));
        let mut render_state = RenderState::new(gpu.device.as_ref(), &gpu.config);

        let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
        let canvas_el: HtmlElement = canvas.clone().unchecked_into();
        let walker = Rc::new(RefCell::new(WalkController::new(
            cam.clone(),
            Box::new(ElementLock { element: canvas_el, document: document.clone() }),
            Box::new(ElementOverlay(blocker.clone())),
            ControllerConfig::default(),
            now,
        )));

        // Load the scene in the background; early frames see an empty collision set
        let pending_scene: Rc<RefCell<Option<LoadedScene>>> = Rc::new(RefCell::new(None));
        {
            let pending_scene = pending_scene.clone();
            let collidables = walker.borrow().collidables().clone();
            wasm_bindgen_futures::spawn_local(async move {
                match load_scene(SCENE_ID).await {
                    Ok(scene) => {
                        *pending_scene.borrow_mut() = Some(install_scene(scene, &collidables));
                    }
                    Err(e) => error!("failed to load scene '{SCENE_ID}': {e}"),
                }
            });
        }

        let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
        setup_input_listeners(document, window, canvas, &blocker, walker.clone(), egui_events.clone())?;

        let mut frame_ctx = FrameLoopContext {
            cam,
            walker,
            pending_scene,
            labels: Vec::new(),
            egui_ctx: egui::Context::default(),
            egui_events,
            last_time: now,
        };

        // Continuous redraw using requestAnimationFrame
        let f = RcCellCallback::new(window.clone(), {
            let window_for_loop = window.clone();

            move || {
                let overlay = frame_ctx.update(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &window_for_loop,
                    &gpu.surface,
                    &mut render_state,
                );
                if let Err(e) = render_state.draw_frame(gpu.device.as_ref(), gpu.queue.as_ref(), &gpu.surface, Some(overlay)) {
                    warn!("skipped frame: {e}");
                }
            }
        });
        f.start();

        info!("walkthrough started");
        Ok(())
    }

    /// Route DOM events into the walk controller
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        canvas: &HtmlCanvasElement,
        blocker: &HtmlElement,
        walker: Rc<RefCell<WalkController>>,
        egui_events: Rc<RefCell<Vec<egui::Event>>>,
    ) -> Result<(), JsValue> {
        // Keyboard down
        {
            let walker = walker.clone();
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                let mut walker = walker.borrow_mut();
                if walker.input().bindings().direction_for(&e.code()).is_some() {
                    e.prevent_default();
                }
                walker.handle_event(&keyboard_event_to_input(&e, true));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }

        // Keyboard up
        {
            let walker = walker.clone();
            let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                walker.borrow_mut().handle_event(&keyboard_event_to_input(&e, false));
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
            keyup.forget();
        }

        // Focus loss - clear all keys
        {
            let walker = walker.clone();
            let blur = Closure::wrap(Box::new(move |_e: Event| {
                walker.borrow_mut().handle_event(&InputEvent::FocusLost);
            }) as Box<dyn FnMut(Event)>);
            window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
            blur.forget();
        }

        // Visibility change
        {
            let walker = walker.clone();
            let doc_vis = document.clone();
            let visibility = Closure::wrap(Box::new(move |_e: Event| {
                let visible = !doc_vis.hidden();
                walker.borrow_mut().handle_event(&InputEvent::VisibilityChanged { visible });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
            visibility.forget();
        }

        // Pointer lock change
        {
            let walker = walker.clone();
            let doc_pl = document.clone();
            let plc = Closure::wrap(Box::new(move |_e: Event| {
                let locked = doc_pl.pointer_lock_element().is_some();
                walker.borrow_mut().handle_event(&InputEvent::PointerLockChanged { locked });
            }) as Box<dyn FnMut(Event)>);
            document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
            plc.forget();
        }

        // Canvas or blocker click to enter pointer lock
        for target in [canvas.unchecked_ref::<HtmlElement>(), blocker] {
            let walker = walker.clone();
            let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
                let walker = walker.borrow();
                if !walker.is_locked() {
                    walker.lock();
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            target.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
            click.forget();
        }

        // Mouse move
        {
            let walker = walker.clone();
            let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
                let mut walker = walker.borrow_mut();
                if walker.is_locked() {
                    walker.handle_event(&mouse_move_to_input(&e));
                } else {
                    let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
                    egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
                }
            }) as Box<dyn FnMut(MouseEvent)>);
            document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
            mm.forget();
        }

        Ok(())
    }

    fn init_canvas(width: u32, height: u32) -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        canvas_el.set_width(width);
        canvas_el.set_height(height);
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    /// Full-page instructions overlay, visible until the pointer is locked
    fn init_blocker(document: &Document) -> Result<HtmlElement, JsValue> {
        let body = document.body().ok_or(js_error("no body on document"))?;
        let blocker = document
            .create_element("div")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| js_error("failed to create blocker"))?;
        blocker.set_id("blocker");
        blocker.set_attribute("style", BLOCKER_STYLE)?;
        blocker.set_inner_html(INSTRUCTIONS);
        body.append_child(&blocker)?;
        Ok(blocker)
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Recursively schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        error!("requestAnimationFrame failed: {e:?}");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    error!("requestAnimationFrame failed to start: {e:?}");
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
