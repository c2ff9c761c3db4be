//! SDL2 window display.
//! Creates a centered window and streams annotated frames into a BGR24
//! texture.

use std::time::Duration;

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;
use tracing::info;

use crate::capture::BgrImage;
use crate::display::{DisplayError, DisplaySink};

pub struct Sdl2Display {
    _sdl: sdl2::Sdl,
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
    width: u32,
    height: u32,
    torn_down: bool,
}

impl Sdl2Display {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let sdl = sdl2::init().map_err(DisplayError)?;
        let video_subsystem = sdl.video().map_err(DisplayError)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| DisplayError(e.to_string()))?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| DisplayError(e.to_string()))?;
        let texture_creator = canvas.texture_creator();
        let event_pump = sdl.event_pump().map_err(DisplayError)?;

        Ok(Self {
            _sdl: sdl,
            canvas,
            texture_creator,
            event_pump,
            width,
            height,
            torn_down: false,
        })
    }
}

impl DisplaySink for Sdl2Display {
    fn show(&mut self, image: &BgrImage) -> Result<(), DisplayError> {
        let (w, h) = image.dimensions();
        if (w, h) != (self.width, self.height) {
            return Err(DisplayError(format!(
                "frame is {w}x{h}, window is {}x{}",
                self.width, self.height
            )));
        }

        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::BGR24, w, h)
            .map_err(|e| DisplayError(e.to_string()))?;

        texture
            .update(None, image.as_raw(), (w * 3) as usize)
            .map_err(|e| DisplayError(e.to_string()))?;

        self.canvas.clear();
        self.canvas.copy(&texture, None, None).map_err(DisplayError)?;
        self.canvas.present();
        Ok(())
    }

    fn poll_key(&mut self, wait: Duration) -> Option<char> {
        let timeout = (wait.as_millis() as u32).max(1);
        let mut event = self.event_pump.wait_event_timeout(timeout);
        while let Some(ev) = event {
            match ev {
                // Closing the window behaves like the quit key.
                Event::Quit { .. } => return Some('q'),
                Event::KeyDown {
                    keycode: Some(Keycode::Q),
                    ..
                } => return Some('q'),
                _ => {}
            }
            event = self.event_pump.poll_event();
        }
        None
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.canvas.window_mut().hide();
        info!("display window closed");
    }
}
