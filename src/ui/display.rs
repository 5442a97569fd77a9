//! Frames and the SSD1306 OLED sink they are pushed to.
//!
//! Screens draw into a [`Frame`], a plain 1-bpp buffer that implements
//! `embedded_graphics::DrawTarget`, so rendering never touches the I²C
//! bus.  The [`FrameSink`] owns the bus side.

use core::convert::Infallible;
use core::ops::Range;

use embedded_graphics::mono_font::ascii::FONT_6X9;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::config::TEXT_ROW_HEIGHT;
use crate::error::Error;

const FONT: &MonoFont<'static> = &FONT_6X9;

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(FONT)
        .text_color(BinaryColor::On)
        .build()
}

/// Width in pixels of `line` in the panel font.
pub fn text_width(line: &str) -> u32 {
    let advance = FONT.character_size.width + FONT.character_spacing;
    line.chars().count() as u32 * advance
}

/// A fully rendered monochrome bitmap.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    /// Row-major, one bit per pixel, MSB first.
    bits: Vec<u8>,
}

impl Frame {
    /// Blank (all off) frame.
    pub fn new(size: Size) -> Self {
        let bytes = (size.width * size.height).div_ceil(8) as usize;
        Self {
            width: size.width,
            height: size.height,
            bits: vec![0; bytes],
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bit = y * self.width + x;
        Some(((bit / 8) as usize, 0x80 >> (bit % 8)))
    }

    /// Whether the pixel at `(x, y)` is lit.  Out of range reads as off.
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        self.index(x, y)
            .is_some_and(|(byte, mask)| self.bits[byte] & mask != 0)
    }

    fn set(&mut self, x: u32, y: u32, on: bool) {
        if let Some((byte, mask)) = self.index(x, y) {
            if on {
                self.bits[byte] |= mask;
            } else {
                self.bits[byte] &= !mask;
            }
        }
    }

    /// Number of lit pixels.
    pub fn lit(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// True if any pixel in the given rows is lit.
    pub fn has_ink_in_rows(&self, rows: Range<u32>) -> bool {
        rows.flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .any(|(x, y)| self.is_on(x, y))
    }

    /// All pixels, lit or not, for pushing to a display driver.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<BinaryColor>> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| {
                Pixel(
                    Point::new(x as i32, y as i32),
                    BinaryColor::from(self.is_on(x, y)),
                )
            })
        })
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    ///
    /// Multi-line text advances one text row per line.
    pub fn text(&mut self, x: i32, y: i32, text: &str) {
        for (row, line) in text.lines().enumerate() {
            let top = y + row as i32 * TEXT_ROW_HEIGHT;
            let _ = Text::with_baseline(line, Point::new(x, top), text_style(), Baseline::Top)
                .draw(self);
        }
    }

    /// Draw `text` starting at row `y`, each line centered horizontally.
    pub fn text_centered(&mut self, y: i32, text: &str) {
        for (row, line) in text.lines().enumerate() {
            let x = (self.width as i32 - text_width(line) as i32) / 2;
            self.text(x.max(0), y + row as i32 * TEXT_ROW_HEIGHT, line);
        }
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("lit", &self.lit())
            .finish()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

/// Where rendered frames end up.
pub trait FrameSink {
    /// Show `frame` on the display.
    fn push_frame(&mut self, frame: &Frame) -> Result<(), Error>;

    fn power_on(&mut self) -> Result<(), Error>;

    fn power_off(&mut self) -> Result<(), Error>;

    /// Fill the whole display with one color and show it.
    fn fill(&mut self, color: BinaryColor) -> Result<(), Error>;
}

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C bus.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// SSD1306 frame sink in buffered graphics mode.
pub struct Ssd1306Sink<I2C> {
    display: Display<I2C>,
}

impl<I2C> Ssd1306Sink<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the display at `address` and clear the screen.
    pub fn init(i2c: I2C, address: u8) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        Ok(Self { display })
    }
}

impl<I2C> FrameSink for Ssd1306Sink<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn push_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        self.display.clear_buffer();
        self.display
            .draw_iter(frame.pixels())
            .map_err(|_| Error::Display)?;
        self.display.flush().map_err(|_| Error::Display)
    }

    fn power_on(&mut self) -> Result<(), Error> {
        self.display.set_display_on(true).map_err(|_| Error::Display)
    }

    fn power_off(&mut self) -> Result<(), Error> {
        self.display.set_display_on(false).map_err(|_| Error::Display)
    }

    fn fill(&mut self, color: BinaryColor) -> Result<(), Error> {
        DrawTarget::clear(&mut self.display, color).map_err(|_| Error::Display)?;
        self.display.flush().map_err(|_| Error::Display)
    }
}
