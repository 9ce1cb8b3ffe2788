// Event loop runtime
// Hosts the overlay in a winit window and routes window events to it

use crate::app::Overlay;
use crate::cli::Settings;
use crate::keymap::{self, Action};
use crate::platform::{self, GdiPresenter, Win32Controller, WINDOW_TITLE};
use crate::render::{Frame, PromptPainter, BACKGROUND};
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowId, WindowLevel};

struct OverlayApp {
    settings: Settings,
    overlay: Overlay<Win32Controller>,
    window: Option<Window>,
    presenter: Option<GdiPresenter>,
    prompt: PromptPainter,
    modifiers: ModifiersState,
    /// First fatal error, reported once the loop has stopped
    failure: Option<anyhow::Error>,
}

impl OverlayApp {
    fn new(settings: Settings) -> Self {
        let overlay = Overlay::new(Win32Controller::new(), settings.opacity, settings.size);
        Self {
            settings,
            overlay,
            window: None,
            presenter: None,
            prompt: PromptPainter::new(),
            modifiers: ModifiersState::empty(),
            failure: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.settings.size;
        let (x, y) = self.settings.position;
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_position(PhysicalPosition::new(x, y))
            .with_window_level(WindowLevel::AlwaysOnTop);

        let window = event_loop
            .create_window(attributes)
            .context("Failed to create overlay window")?;
        let presenter = GdiPresenter::new(&window).context("Failed to attach to overlay window")?;

        let size = window.inner_size();
        info!("Window created: {}x{}", size.width, size.height);

        self.window = Some(window);
        self.presenter = Some(presenter);
        self.overlay.apply_window_attributes();
        self.overlay
            .on_resize(size.width, size.height, Instant::now());

        if let Some(path) = self.settings.image_path.take() {
            self.overlay.open_image(&path);
        }
        self.request_redraw();
        Ok(())
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, action: Action) {
        debug!("Action: {:?}", action);
        match action {
            Action::Close => {
                info!("Exit key pressed");
                event_loop.exit();
            }
            Action::ToggleClickThrough => {
                self.overlay.toggle_click_through();
            }
            Action::IncreaseOpacity => self.overlay.increase_opacity(),
            Action::DecreaseOpacity => self.overlay.decrease_opacity(),
            Action::OpenImage => {
                let Some(window) = self.window.as_ref() else {
                    return;
                };
                if let Some(path) = platform::pick_image(window) {
                    if self.overlay.open_image(&path) {
                        window.request_redraw();
                    }
                }
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(presenter)) = (self.window.as_ref(), self.presenter.as_ref())
        else {
            return;
        };

        let size = window.inner_size();
        match self.overlay.rendered() {
            // Between a resize and its deferred render the old frame stays at the top-left
            Some(frame) => presenter.present(frame, size.width, size.height),
            None if self.overlay.prompt_visible() => {
                let frame = self
                    .prompt
                    .paint(size.width, size.height, window.scale_factor());
                presenter.present(&frame, size.width, size.height);
            }
            None => {
                let blank = Frame::filled(0, 0, BACKGROUND);
                presenter.present(&blank, size.width, size.height);
            }
        }
    }
}

impl ApplicationHandler for OverlayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            error!("{:#}", e);
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.overlay
                    .on_resize(size.width, size.height, Instant::now());
                self.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let action = keymap::resolve_key(physical_key, &logical_key, self.modifiers);
                if let Some(action) = action {
                    self.dispatch(event_loop, action);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if let Some(action) = keymap::resolve_mouse(button) {
                    self.dispatch(event_loop, action);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.overlay.poll_resize(Instant::now()) {
            self.request_redraw();
        }

        // Sleep until the deferred render is due, or until the next event
        match self.overlay.pending_render() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

/// Open the overlay window and run the event loop until it closes
pub fn run(settings: Settings) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = OverlayApp::new(settings);
    info!("Controls: Right-click to open an image, Up/Down to adjust opacity");
    info!("Ctrl+T toggles click-through, Esc closes the overlay");

    event_loop
        .run_app(&mut app)
        .context("Event loop terminated abnormally")?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => {
            info!("Exiting application");
            Ok(())
        }
    }
}
