//! Drawing surface
//!
//! The interpreter only talks to the [`Canvas`] trait. [`TraceCanvas`] is an
//! in-memory implementation that validates every call the way a bounded
//! drawing surface would and records what was drawn.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure raised by the drawing surface. This is the only error that stops a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("position ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds { x: i64, y: i64, width: i64, height: i64 },

    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(i64),

    #[error("rectangle dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("colour components must be within 0..=255, got ({r}, {g}, {b})")]
    InvalidColor { r: i64, g: i64, b: i64 },

    #[error("canvas size must be positive, got {width}x{height}")]
    InvalidSize { width: i64, height: i64 },
}

/// Drawing capability consumed by the interpreter
pub trait Canvas {
    fn move_to(&mut self, x: i64, y: i64) -> Result<(), CanvasError>;
    fn draw_to(&mut self, x: i64, y: i64) -> Result<(), CanvasError>;
    fn draw_circle(&mut self, radius: i64) -> Result<(), CanvasError>;
    fn draw_rectangle(&mut self, width: i64, height: i64) -> Result<(), CanvasError>;
    fn set_pen_color(&mut self, r: i64, g: i64, b: i64) -> Result<(), CanvasError>;
    fn write_text(&mut self, text: &str) -> Result<(), CanvasError>;
    fn clear(&mut self) -> Result<(), CanvasError>;
    fn x(&self) -> i64;
    fn y(&self) -> i64;

    /// Return the pen to the origin
    fn reset(&mut self) -> Result<(), CanvasError> {
        self.move_to(0, 0)
    }
}

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasOp {
    MoveTo { x: i64, y: i64 },
    Line { from: (i64, i64), to: (i64, i64) },
    Circle { x: i64, y: i64, radius: i64 },
    Rect { x: i64, y: i64, width: i64, height: i64 },
    Pen { r: u8, g: u8, b: u8 },
    Text { x: i64, y: i64, text: String },
    Clear,
}

impl fmt::Display for CanvasOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasOp::MoveTo { x, y } => write!(f, "moveto {x},{y}"),
            CanvasOp::Line { from, to } => {
                write!(f, "line {},{} -> {},{}", from.0, from.1, to.0, to.1)
            }
            CanvasOp::Circle { x, y, radius } => write!(f, "circle r={radius} at {x},{y}"),
            CanvasOp::Rect { x, y, width, height } => {
                write!(f, "rect {width}x{height} at {x},{y}")
            }
            CanvasOp::Pen { r, g, b } => write!(f, "pen {r},{g},{b}"),
            CanvasOp::Text { x, y, text } => write!(f, "text {text:?} at {x},{y}"),
            CanvasOp::Clear => write!(f, "clear"),
        }
    }
}

/// Bounds-checked canvas that records every operation
#[derive(Debug, Clone)]
pub struct TraceCanvas {
    width: i64,
    height: i64,
    x: i64,
    y: i64,
    pen: (u8, u8, u8),
    ops: Vec<CanvasOp>,
}

impl TraceCanvas {
    pub fn new(width: i64, height: i64) -> Result<Self, CanvasError> {
        if width <= 0 || height <= 0 {
            return Err(CanvasError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            x: 0,
            y: 0,
            pen: (0, 0, 0),
            ops: Vec::new(),
        })
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn pen(&self) -> (u8, u8, u8) {
        self.pen
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<CanvasOp> {
        std::mem::take(&mut self.ops)
    }

    /// Text passed to [`Canvas::write_text`], in order
    pub fn written_text(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            CanvasOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// The operation log, one line per operation
    pub fn log(&self) -> String {
        self.ops
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn check_position(&self, x: i64, y: i64) -> Result<(), CanvasError> {
        if (0..self.width).contains(&x) && (0..self.height).contains(&y) {
            Ok(())
        } else {
            Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl Canvas for TraceCanvas {
    fn move_to(&mut self, x: i64, y: i64) -> Result<(), CanvasError> {
        self.check_position(x, y)?;
        self.x = x;
        self.y = y;
        self.ops.push(CanvasOp::MoveTo { x, y });
        Ok(())
    }

    fn draw_to(&mut self, x: i64, y: i64) -> Result<(), CanvasError> {
        self.check_position(x, y)?;
        self.ops.push(CanvasOp::Line {
            from: (self.x, self.y),
            to: (x, y),
        });
        self.x = x;
        self.y = y;
        Ok(())
    }

    fn draw_circle(&mut self, radius: i64) -> Result<(), CanvasError> {
        if radius <= 0 {
            return Err(CanvasError::InvalidRadius(radius));
        }
        self.ops.push(CanvasOp::Circle {
            x: self.x,
            y: self.y,
            radius,
        });
        Ok(())
    }

    fn draw_rectangle(&mut self, width: i64, height: i64) -> Result<(), CanvasError> {
        if width <= 0 || height <= 0 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        self.ops.push(CanvasOp::Rect {
            x: self.x,
            y: self.y,
            width,
            height,
        });
        Ok(())
    }

    fn set_pen_color(&mut self, r: i64, g: i64, b: i64) -> Result<(), CanvasError> {
        let component = |c: i64| u8::try_from(c).ok();
        let (Some(rr), Some(gg), Some(bb)) = (component(r), component(g), component(b)) else {
            return Err(CanvasError::InvalidColor { r, g, b });
        };
        self.pen = (rr, gg, bb);
        self.ops.push(CanvasOp::Pen { r: rr, g: gg, b: bb });
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), CanvasError> {
        if text.is_empty() {
            return Ok(());
        }
        self.ops.push(CanvasOp::Text {
            x: self.x,
            y: self.y,
            text: text.to_string(),
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CanvasError> {
        self.x = 0;
        self.y = 0;
        self.pen = (0, 0, 0);
        self.ops.push(CanvasOp::Clear);
        Ok(())
    }

    fn x(&self) -> i64 {
        self.x
    }

    fn y(&self) -> i64 {
        self.y
    }
}
