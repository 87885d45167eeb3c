use crate::display::{DisplayError, DisplaySurface};
use image::RgbImage;
use log::{debug, info};
use pixels::{Pixels, SurfaceTexture};
use std::collections::HashMap;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder, WindowId};

/// winit allows a single event loop per process
static EVENT_LOOP_CREATED: AtomicBool = AtomicBool::new(false);

struct ImageWindow {
    // Declared first so the GPU surface is dropped before its window
    pixels: Pixels,
    window: Window,
    buffer_size: (u32, u32),
}

impl ImageWindow {
    fn upload(&mut self, image: &RgbImage) -> Result<(), DisplayError> {
        let (width, height) = image.dimensions();
        if self.buffer_size != (width, height) {
            self.pixels
                .resize_buffer(width, height)
                .map_err(|e| DisplayError::Surface(e.to_string()))?;
            self.window.set_inner_size(LogicalSize::new(width, height));
            self.buffer_size = (width, height);
        }
        fill_rgba(self.pixels.frame_mut(), image);
        self.window.request_redraw();
        Ok(())
    }
}

/// Resizable desktop windows keyed by name
#[derive(Default)]
pub struct WindowSurface {
    event_loop: Option<EventLoop<()>>,
    /// Why the event loop could not be created, once that has happened
    broken: Option<String>,
    windows: HashMap<String, ImageWindow>,
}

impl WindowSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn event_loop(&mut self) -> Result<&EventLoop<()>, DisplayError> {
        if let Some(reason) = &self.broken {
            return Err(DisplayError::Unavailable(reason.clone()));
        }
        if self.event_loop.is_none() {
            if !display_available() {
                return Err(DisplayError::Unavailable("neither DISPLAY nor WAYLAND_DISPLAY is set".to_string()));
            }
            if EVENT_LOOP_CREATED.swap(true, Ordering::SeqCst) {
                return Err(DisplayError::Unavailable("event loop already owned by another surface".to_string()));
            }
            debug!("creating event loop");
            match without_panicking(EventLoop::new) {
                Ok(event_loop) => self.event_loop = Some(event_loop),
                Err(err) => {
                    self.broken = Some(err.to_string());
                    return Err(err);
                }
            }
        }
        self.event_loop
            .as_ref()
            .ok_or_else(|| DisplayError::Unavailable("event loop missing".to_string()))
    }

    fn open(&mut self, name: &str, width: u32, height: u32) -> Result<ImageWindow, DisplayError> {
        let event_loop = self.event_loop()?;
        let window = WindowBuilder::new()
            .with_title(name)
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(true)
            .build(event_loop)
            .map_err(|e| DisplayError::Window(e.to_string()))?;

        let size = window.inner_size();
        let texture = SurfaceTexture::new(size.width, size.height, &window);
        let pixels = Pixels::new(width, height, texture).map_err(|e| DisplayError::Surface(e.to_string()))?;
        info!("opened window '{}' ({}x{})", name, width, height);
        Ok(ImageWindow {
            pixels,
            window,
            buffer_size: (width, height),
        })
    }
}

impl DisplaySurface for WindowSurface {
    fn show(&mut self, name: &str, image: &RgbImage) -> Result<(), DisplayError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DisplayError::EmptyImage(name.to_string()));
        }

        if !self.windows.contains_key(name) {
            let window = self.open(name, width, height)?;
            self.windows.insert(name.to_string(), window);
        }
        match self.windows.get_mut(name) {
            Some(window) => window.upload(image),
            None => Err(DisplayError::Window(format!("window '{}' disappeared", name))),
        }
    }

    /// Pumps window events until a key is pressed or every window is closed
    fn wait_for_user(&mut self) -> Result<(), DisplayError> {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return Ok(());
        };
        if self.windows.is_empty() {
            return Ok(());
        }

        let windows = &mut self.windows;
        for w in windows.values() {
            w.window.request_redraw();
        }

        let mut failure = None;
        event_loop.run_return(|event, _, control_flow| {
            control_flow.set_wait();

            match event {
                Event::RedrawRequested(id) => {
                    if let Some(w) = find(windows, id) {
                        if let Err(e) = w.pixels.render() {
                            failure = Some(DisplayError::Surface(e.to_string()));
                            control_flow.set_exit();
                        }
                    }
                }
                Event::WindowEvent { window_id, event } => match event {
                    WindowEvent::KeyboardInput {
                        input: KeyboardInput {
                            state: ElementState::Pressed,
                            ..
                        },
                        ..
                    } => control_flow.set_exit(),
                    WindowEvent::CloseRequested => {
                        windows.retain(|_, w| w.window.id() != window_id);
                        if windows.is_empty() {
                            control_flow.set_exit();
                        }
                    }
                    WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                        if let Some(w) = find(windows, window_id) {
                            if let Err(e) = w.pixels.resize_surface(size.width, size.height) {
                                failure = Some(DisplayError::Surface(e.to_string()));
                                control_flow.set_exit();
                                return;
                            }
                            w.window.request_redraw();
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close_all(&mut self) {
        if !self.windows.is_empty() {
            debug!("closing {} windows", self.windows.len());
        }
        self.windows.clear();
    }
}

fn find(windows: &mut HashMap<String, ImageWindow>, id: WindowId) -> Option<&mut ImageWindow> {
    windows.values_mut().find(|w| w.window.id() == id)
}

/// Run a constructor that panics when no backend can be reached, such as
/// winit's `EventLoop::new` with a stale `DISPLAY`
fn without_panicking<T>(build: impl FnOnce() -> T) -> Result<T, DisplayError> {
    panic::catch_unwind(panic::AssertUnwindSafe(build)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "display backend failed to initialize".to_string());
        DisplayError::Unavailable(reason)
    })
}

fn display_available() -> bool {
    if cfg!(all(unix, not(target_os = "macos"))) {
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
    } else {
        true
    }
}

/// Copy RGB pixels into an RGBA frame, opaque
fn fill_rgba(frame: &mut [u8], image: &RgbImage) {
    for (dst, src) in frame.chunks_exact_mut(4).zip(image.as_raw().chunks_exact(3)) {
        dst[..3].copy_from_slice(src);
        dst[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fill_rgba() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([1, 2, 3]));
        img.put_pixel(1, 0, Rgb([4, 5, 6]));

        let mut frame = vec![0u8; 8];
        fill_rgba(&mut frame, &img);
        assert_eq!(frame, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_backend_panic_becomes_unavailable() {
        let result: Result<(), DisplayError> = without_panicking(|| panic!("Failed to initialize any backend!"));
        assert_eq!(
            result,
            Err(DisplayError::Unavailable("Failed to initialize any backend!".to_string()))
        );

        let formatted: Result<(), DisplayError> = without_panicking(|| panic!("no display {}", ":99"));
        assert_eq!(formatted, Err(DisplayError::Unavailable("no display :99".to_string())));

        assert_eq!(without_panicking(|| 7), Ok(7));
    }

    #[test]
    fn test_broken_backend_is_remembered() {
        let mut surface = WindowSurface {
            broken: Some("Failed to initialize any backend!".to_string()),
            ..WindowSurface::default()
        };
        let img = RgbImage::new(4, 4);
        for name in ["first", "second"] {
            assert!(matches!(surface.show(name, &img), Err(DisplayError::Unavailable(_))));
        }
        assert!(surface.windows.is_empty());
    }

    #[test]
    fn test_idle_surface() {
        let mut surface = WindowSurface::new();
        assert!(surface.wait_for_user().is_ok());
        surface.close_all();
        assert_eq!(
            surface.show("empty", &RgbImage::new(0, 3)),
            Err(DisplayError::EmptyImage("empty".to_string()))
        );
    }
}
