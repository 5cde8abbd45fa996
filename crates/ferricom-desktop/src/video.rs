//! The presentation thread: window, surface, event pump.
//!
//! Runs the winit event loop on the main thread. Every redraw takes the
//! pending frame out of the shared slot (if any) and uploads it; key
//! events update the shared button snapshot. Closing the window or a
//! surface error flips the shared state to exiting so the emulation
//! thread drains too.

use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use ferricom_core::{FRAME_HEIGHT, FRAME_WIDTH};

use crate::input::KeyMap;
use crate::sync::Shared;

/// The winit application state.
struct Presenter {
    shared: Arc<Shared>,
    keymap: KeyMap,
    title: String,
    scale: u32,
    buttons: u8,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
}

impl Presenter {
    fn shutdown(&self, event_loop: &ActiveEventLoop) {
        self.shared.stop();
        event_loop.exit();
    }
}

impl ApplicationHandler for Presenter {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = LogicalSize::new(
            FRAME_WIDTH as u32 * self.scale,
            FRAME_HEIGHT as u32 * self.scale,
        );
        let attributes = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(size)
            .with_resizable(false);

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!("window creation failed: {err}");
                self.shutdown(event_loop);
                return;
            }
        };

        let inner = window.inner_size();
        let surface = SurfaceTexture::new(inner.width, inner.height, Arc::clone(&window));
        match Pixels::new(FRAME_WIDTH as u32, FRAME_HEIGHT as u32, surface) {
            Ok(pixels) => {
                self.window = Some(window);
                self.pixels = Some(pixels);
            }
            Err(err) => {
                tracing::error!("surface creation failed: {err}");
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(button) = self.keymap.button_for(code) {
                    match state {
                        ElementState::Pressed => self.buttons |= button as u8,
                        ElementState::Released => self.buttons &= !(button as u8),
                    }
                    self.shared.set_buttons(self.buttons);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(pixels) = self.pixels.as_mut() {
                    self.shared.take_frame(pixels.frame_mut());
                    if let Err(err) = pixels.render() {
                        tracing::error!("render failed: {err}");
                        self.shutdown(event_loop);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.shared.exiting() {
            event_loop.exit();
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Run the event loop until shutdown.
pub fn run(
    shared: Arc<Shared>,
    keymap: KeyMap,
    title: String,
    scale: u32,
) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut presenter = Presenter {
        shared,
        keymap,
        title,
        scale: scale.clamp(1, 8),
        buttons: 0,
        window: None,
        pixels: None,
    };
    event_loop.run_app(&mut presenter)
}
