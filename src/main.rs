//! Bullet Hell entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, HtmlSelectElement, MouseEvent, TouchEvent};

    use bullet_hell::consts::MAX_BULLETS;
    use bullet_hell::leaderboard::{
        self, BoardState, DEFAULT_LIMIT, Leaderboard, LeaderboardBoard, ScoreSubmission,
        SubmitOutcome,
    };
    use bullet_hell::platform::{DeviceClass, InputState};
    use bullet_hell::renderer::{GpuCanvas, PlayerMarker, draw_frame};
    use bullet_hell::sim::{
        BulletPattern, Density, Difficulty, GamePhase, GameState, RunConfig, RunMode, RunSummary,
        tick,
    };
    use bullet_hell::{BulletEngine, BulletField, Playfield, Settings};

    /// Game instance holding all state
    struct App {
        state: GameState,
        engine: BulletField,
        input: InputState,
        gpu: Option<GpuCanvas>,
        client: Leaderboard,
        board: LeaderboardBoard,
        settings: Settings,
        last_time: f64,
        /// Phase the DOM screens were last laid out for
        shown_phase: Option<GamePhase>,
        /// Backing store has been matched to the CSS size at least once
        canvas_sized: bool,
    }

    impl App {
        fn new(seed: u64, device: DeviceClass, playfield: Playfield, client: Leaderboard) -> Self {
            let settings = Settings::load();
            let mut state = GameState::new(seed, device, playfield);
            state.configure(settings.run);
            Self {
                state,
                engine: BulletField::new(MAX_BULLETS, playfield.width, playfield.height),
                input: InputState::new(device, playfield),
                gpu: None,
                client,
                board: LeaderboardBoard::new(),
                settings,
                last_time: 0.0,
                shown_phase: None,
                canvas_sized: false,
            }
        }

        /// Follow the canvas' CSS size; hidden canvases keep the last known size
        fn sync_canvas_size(&mut self, canvas: &HtmlCanvasElement) {
            let (client_w, client_h) = (canvas.client_width(), canvas.client_height());
            if client_w <= 0 || client_h <= 0 {
                return;
            }
            let playfield = Playfield::new(client_w as f32, client_h as f32);
            if self.canvas_sized && playfield == self.state.playfield() {
                return;
            }
            self.canvas_sized = true;

            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let width = (f64::from(client_w) * dpr) as u32;
            let height = (f64::from(client_h) * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            self.state.resize(playfield);
            self.input.resize(playfield);
            self.engine.resize(playfield.width, playfield.height);
            if let Some(gpu) = self.gpu.as_mut() {
                gpu.resize(width, height, playfield);
            }
            log::info!("Canvas {}x{} ({}x{} physical)", client_w, client_h, width, height);
        }

        /// Run one frame; returns the summary when the run ended this frame
        fn update(&mut self, dt: f32) -> Option<RunSummary> {
            let now_secs = js_sys::Date::now() / 1000.0;
            let report = tick(&mut self.state, &self.input, &mut self.engine, dt, now_secs);
            if report.game_over {
                self.state.summary().cloned()
            } else {
                None
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let player = (self.state.phase == GamePhase::Playing).then(|| PlayerMarker {
                pos: self.state.session.aim,
                invincible: self.state.session.invincible,
            });
            if let Some(gpu) = self.gpu.as_mut() {
                draw_frame(&self.engine.view(), player, time, gpu);
                match gpu.present() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => gpu.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let session = &self.state.session;
            if self.state.shows_run_stats() {
                set_text("hpDisplay", &session.hp_label());
                set_text("survivalTime", &format!("{:.2}s", session.survival_time));
            }
            set_text("bulletCount", &self.engine.bullet_count().to_string());

            if self.shown_phase != Some(self.state.phase) {
                self.shown_phase = Some(self.state.phase);
                self.show_screens();
            }
        }

        /// Show the panels that belong to the current phase and mode
        fn show_screens(&self) {
            let phase = self.state.phase;
            let ranked = self.state.mode == RunMode::Ranked;
            let menu = matches!(phase, GamePhase::MenuSelect | GamePhase::Configuring);

            set_hidden("modeSelector", !menu);
            set_hidden("usernameInput", !(phase == GamePhase::MenuSelect && ranked));
            set_hidden("gameSettings", phase != GamePhase::Configuring);
            set_hidden("leaderboard", !(ranked && phase != GamePhase::Playing));
            set_hidden("rankedModeIndicator", !(ranked && self.state.username().is_some()));
            set_hidden("canvasContainer", menu);
            set_hidden("gameOver", phase != GamePhase::GameOver);

            set_class("practiceMode", "active", !ranked);
            set_class("rankedMode", "active", ranked);

            if let Some(name) = self.state.username() {
                set_text(
                    "currentPlayerName",
                    &format!("{} ({})", name, self.state.device().label()),
                );
            }

            // Ranked runs use pinned settings; show them and lock the selects
            let config = self.state.effective_config();
            write_run_config(&config, ranked);

            if phase == GamePhase::GameOver {
                set_text("finalTime", &format!("{:.2}s", self.state.session.survival_time));
            }
        }

        fn remember_settings(&mut self) {
            self.settings.run = self.state.config;
            self.settings.mode = self.state.mode;
            self.settings.save();
        }
    }

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    fn by_id(id: &str) -> Option<web_sys::Element> {
        document()?.get_element_by_id(id)
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(id: &str, class: &str, on: bool) {
        if let Some(el) = by_id(id) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        set_class(id, "hidden", hidden);
    }

    fn select(id: &str) -> Option<HtmlSelectElement> {
        by_id(id)?.dyn_into().ok()
    }

    fn select_value(id: &str) -> Option<String> {
        select(id).map(|s| s.value())
    }

    /// Settings-screen choices, falling back to `current` for anything unreadable
    fn read_run_config(current: RunConfig) -> RunConfig {
        RunConfig {
            difficulty: select_value("difficulty")
                .and_then(|v| Difficulty::from_str(&v))
                .unwrap_or(current.difficulty),
            density: select_value("bulletDensity")
                .and_then(|v| Density::from_str(&v))
                .unwrap_or(current.density),
            pattern: select_value("bulletPattern")
                .and_then(|v| BulletPattern::from_str(&v))
                .unwrap_or(current.pattern),
            max_hp: select_value("maxHp")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(current.max_hp),
        }
        .sanitized()
    }

    fn write_run_config(config: &RunConfig, locked: bool) {
        let max_hp = config.max_hp.to_string();
        for (id, value) in [
            ("difficulty", config.difficulty.as_str()),
            ("bulletDensity", config.density.as_str()),
            ("bulletPattern", config.pattern.as_str()),
            ("maxHp", max_hp.as_str()),
        ] {
            if let Some(el) = select(id) {
                el.set_value(value);
                el.set_disabled(locked);
            }
        }
    }

    /// Rebuild the leaderboard table body
    fn render_board(state: &BoardState, difficulty: Difficulty) {
        let Some(document) = document() else {
            return;
        };
        let Some(body) = document.get_element_by_id("leaderboardBody") else {
            return;
        };
        set_text("leaderboardDifficulty", difficulty.title());
        body.set_inner_html("");

        let message_row = |text: &str| {
            if let (Ok(tr), Ok(td)) = (document.create_element("tr"), document.create_element("td")) {
                let _ = td.set_attribute("colspan", "4");
                td.set_text_content(Some(text));
                let _ = tr.append_child(&td);
                let _ = body.append_child(&tr);
            }
        };

        match state {
            BoardState::Idle => {}
            BoardState::Loading => message_row("Loading..."),
            BoardState::Unavailable(message) => message_row(message),
            BoardState::Loaded(entries) if entries.is_empty() => message_row("No scores yet"),
            BoardState::Loaded(entries) => {
                for entry in entries {
                    let Ok(tr) = document.create_element("tr") else {
                        continue;
                    };
                    let cells = [
                        format!("#{}", entry.rank),
                        entry.username.clone(),
                        format!("{:.2}s", entry.survival_time),
                        format!("{} / {}", entry.bullet_density, entry.bullet_pattern),
                    ];
                    for text in cells {
                        if let Ok(td) = document.create_element("td") {
                            td.set_text_content(Some(&text));
                            let _ = tr.append_child(&td);
                        }
                    }
                    let _ = body.append_child(&tr);
                }
            }
        }
    }

    /// Fetch the board for the ranked difficulty; superseded responses are dropped
    fn load_leaderboard(app: Rc<RefCell<App>>) {
        let (client, ticket, difficulty, device) = {
            let mut a = app.borrow_mut();
            let ticket = a.board.begin();
            render_board(a.board.state(), a.state.effective_config().difficulty);
            (
                a.client.clone(),
                ticket,
                a.state.effective_config().difficulty,
                a.state.device(),
            )
        };

        wasm_bindgen_futures::spawn_local(async move {
            let result = leaderboard::fetch_leaderboard(&client, difficulty, device, DEFAULT_LIMIT).await;
            if let Err(e) = &result {
                log::warn!("Leaderboard fetch failed: {}", e);
            }
            let mut a = app.borrow_mut();
            if a.board.resolve(ticket, result) {
                render_board(a.board.state(), difficulty);
            }
        });
    }

    /// Submit a finished ranked run and show the outcome on the game-over screen
    fn submit_score(app: Rc<RefCell<App>>, submission: ScoreSubmission) {
        let client = app.borrow().client.clone();
        set_hidden("rankInfo", false);
        set_text("rankDisplay", "Submitting score...");
        set_text("personalBest", "");

        wasm_bindgen_futures::spawn_local(async move {
            let result = leaderboard::submit_score(&client, &submission).await;
            match &result {
                Ok(response) => log::info!("Score submitted: {:?}", response),
                Err(e) => log::warn!("Score submission failed: {}", e),
            }
            let outcome = SubmitOutcome::from_result(result);
            set_text("rankDisplay", &outcome.headline());
            set_text("personalBest", outcome.detail());
            if !matches!(outcome, SubmitOutcome::Failed(_)) {
                load_leaderboard(app);
            }
        });
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Bullet Hell starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let device = DeviceClass::detect_browser();
        set_text("deviceTypeDisplay", device.label());

        let location = window.location();
        let client = Leaderboard::for_host(
            &location.hostname().unwrap_or_default(),
            &location.port().unwrap_or_default(),
        );
        log::info!("Leaderboard API at {}", client.base());

        let playfield = Playfield::new(canvas.width() as f32, canvas.height() as f32);
        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(seed, device, playfield, client)));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU (WebGL2 fallback)
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter: {}", e)))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let gpu = GpuCanvas::new(surface, &adapter, canvas.width(), canvas.height(), playfield)
            .await
            .map_err(|e| JsValue::from_str(&format!("device: {}", e)))?;
        app.borrow_mut().gpu = Some(gpu);

        {
            let a = app.borrow();
            if let Some(name) = &a.settings.username {
                if let Some(field) = by_id("usernameField").and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
                    field.set_value(name);
                }
            }
            a.show_screens();
        }

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        setup_input_handlers(&canvas, app.clone())?;
        setup_menu_buttons(app.clone());
        setup_game_buttons(&canvas, app.clone());
        setup_resize(&canvas, app.clone());

        request_animation_frame(app);

        log::info!("Bullet Hell running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        // Mouse move, canvas-relative
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut()
                    .input
                    .pointer_moved(event.offset_x() as f32, event.offset_y() as f32);
            });
            canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch: non-passive so the page never scrolls or zooms under the player
        let options = web_sys::AddEventListenerOptions::new();
        options.set_passive(false);

        for (name, kind) in [
            ("touchstart", TouchKind::Start),
            ("touchmove", TouchKind::Move),
            ("touchend", TouchKind::End),
            ("touchcancel", TouchKind::End),
        ] {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                if kind == TouchKind::End {
                    a.input.touch_ended();
                    return;
                }
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    let y = touch.client_y() as f32 - rect.top() as f32;
                    match kind {
                        TouchKind::Start => a.input.touch_started(x, y),
                        _ => a.input.touch_moved(x, y),
                    }
                }
            });
            canvas.add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &options,
            )?;
            closure.forget();
        }

        let window = web_sys::window().ok_or("no window")?;

        // Keyboard: held-key set from press/release edges
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                if a.input.key_down(&event.key()) && a.state.phase == GamePhase::Playing {
                    event.prevent_default();
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                app.borrow_mut().input.key_up(&event.key());
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Key-up events are lost while the window is unfocused
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().input.release_all();
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum TouchKind {
        Start,
        Move,
        End,
    }

    fn on_click(id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(btn) = by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("Missing #{} button", id);
        }
    }

    fn setup_menu_buttons(app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            on_click("practiceMode", move || {
                let mut a = app.borrow_mut();
                a.state.select_mode(RunMode::Practice);
                let run = a.settings.run;
                a.state.configure(run);
                a.remember_settings();
                a.show_screens();
            });
        }

        {
            let app = app.clone();
            on_click("rankedMode", move || {
                {
                    let mut a = app.borrow_mut();
                    a.state.select_mode(RunMode::Ranked);
                    a.settings.mode = RunMode::Ranked;
                    a.settings.save();
                    a.show_screens();
                }
                load_leaderboard(app.clone());
            });
        }

        {
            let app = app.clone();
            on_click("confirmUsername", move || {
                let raw = by_id("usernameField")
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|field| field.value())
                    .unwrap_or_default();
                let mut a = app.borrow_mut();
                match a.state.confirm_username(&raw) {
                    Ok(false) => {}
                    Ok(true) => {
                        set_hidden("usernameError", true);
                        a.settings.remember_username(&raw);
                        a.settings.save();
                        a.show_screens();
                    }
                    Err(e) => {
                        log::info!("Rejected player name: {}", e);
                        set_text("usernameError", e.user_message());
                        set_hidden("usernameError", false);
                    }
                }
            });
        }

        {
            let app = app.clone();
            on_click("backFromUsername", move || {
                let mut a = app.borrow_mut();
                a.state.back_to_menu();
                a.show_screens();
            });
        }

        on_click("refreshLeaderboard", move || load_leaderboard(app.clone()));
    }

    fn setup_game_buttons(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        for id in ["startBtn", "retryBtn"] {
            let app = app.clone();
            let canvas = canvas.clone();
            on_click(id, move || {
                let mut a = app.borrow_mut();
                if a.state.mode == RunMode::Practice {
                    let config = read_run_config(a.state.config);
                    a.state.configure(config);
                    a.remember_settings();
                }
                set_hidden("rankInfo", true);
                // Show the canvas first so its size can be measured
                set_hidden("canvasContainer", false);
                a.sync_canvas_size(&canvas);

                let App {
                    state,
                    input,
                    engine,
                    ..
                } = &mut *a;
                if state.start(input, engine) {
                    a.last_time = 0.0;
                }
                a.show_screens();
            });
        }

        on_click("backToSettingsBtn", move || {
            let mut a = app.borrow_mut();
            let App { state, engine, .. } = &mut *a;
            state.back_to_settings(engine);
            a.show_screens();
        });
    }

    fn setup_resize(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().sync_canvas_size(&canvas);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let finished = {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            a.last_time = time;

            let finished = a.update(dt);
            a.render(time);
            a.update_hud();
            finished
        };

        if let Some(submission) = finished.as_ref().and_then(ScoreSubmission::from_summary) {
            submit_score(app.clone(), submission);
        } else if finished.is_some() {
            set_hidden("rankInfo", true);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", e);
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("loading"))
        {
            el.set_text_content(Some("WebGPU is not available in this browser"));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bullet Hell (native) starting...");
    log::info!("Native mode runs a headless simulation - run with `trunk serve` for the web version");

    headless_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Simulate a stationary player at the playfield center until the run ends
#[cfg(not(target_arch = "wasm32"))]
fn headless_run() {
    use bullet_hell::consts::MAX_BULLETS;
    use bullet_hell::platform::{DeviceClass, InputState};
    use bullet_hell::sim::{GamePhase, GameState, RunMode, tick};
    use bullet_hell::{BulletEngine, BulletField, Playfield, Settings};

    const FRAME: f32 = 1.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;

    let settings = Settings::load();
    let playfield = Playfield::default();
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);

    let mut state = GameState::new(seed, DeviceClass::Pc, playfield);
    let mut input = InputState::new(DeviceClass::Pc, playfield);
    let mut engine = BulletField::new(MAX_BULLETS, playfield.width, playfield.height);

    state.select_mode(RunMode::Practice);
    state.configure(settings.run);
    if !state.start(&mut input, &mut engine) {
        log::error!("Could not start a run");
        return;
    }

    let mut peak = 0;
    for frame in 0..MAX_FRAMES {
        let now = f64::from(frame) * f64::from(FRAME);
        let report = tick(&mut state, &input, &mut engine, FRAME, now);
        peak = peak.max(engine.bullet_count());
        if report.hit {
            log::info!("Hit at {:.2}s, {} HP left", state.session.survival_time, state.session.hp);
        }
        if state.phase == GamePhase::GameOver {
            break;
        }
    }

    let config = state.effective_config();
    println!(
        "\n{} / {} / {}: survived {:.2}s, peak {} bullets",
        config.difficulty.title(),
        config.density.as_str(),
        config.pattern.as_str(),
        state.session.survival_time,
        peak
    );
}
