//! Per-artist stroke logs.
//!
//! Strokes are opaque bytes. The only thing the server reads is the first
//! byte, the op-code, so it can tell a clear from everything else. Every
//! stroke is re-enveloped with the artist's pen index in front so viewers
//! can tell artists apart without knowing who they are:
//!
//! ```text
//! inbound:   [op][args...]
//! relayed:   [pen][op][args...]
//! ```

use scrawl_protocol::ParticipantId;

/// Stroke op-codes.
pub mod op {
    pub const CLEAR: u8 = 0;
    pub const COLOR: u8 = 1;
    pub const LINE_WIDTH: u8 = 2;
    pub const MOVE_TO: u8 = 3;
    pub const MOVE_TO_REL: u8 = 4;
    pub const LINE_TO: u8 = 5;
    pub const LINE_TO_REL: u8 = 6;
}

/// Why a stroke was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrokeError {
    /// The stroke had no op-code.
    #[error("empty stroke")]
    Empty,

    /// Pen indices are a single byte.
    #[error("no pen index left for another artist")]
    OutOfPens,
}

/// One artist's stroke buffer.
#[derive(Debug, Clone)]
pub struct Pen {
    index: u8,
    buffer: Vec<u8>,
}

impl Pen {
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// The drawing of one round: a pen per artist, in creation order.
#[derive(Debug, Clone, Default)]
pub struct StrokeLog {
    pens: Vec<(ParticipantId, Pen)>,
}

impl StrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stroke from `artist` and returns the enveloped bytes to
    /// relay. A clear empties the artist's own pen and is not stored.
    pub fn draw(&mut self, artist: ParticipantId, stroke: &[u8]) -> Result<Vec<u8>, StrokeError> {
        let &opcode = stroke.first().ok_or(StrokeError::Empty)?;
        let pen = self.pen_for(artist)?;

        let mut enveloped = Vec::with_capacity(stroke.len() + 1);
        enveloped.push(pen.index);
        enveloped.extend_from_slice(stroke);

        if opcode == op::CLEAR {
            pen.buffer.clear();
        } else {
            pen.buffer.extend_from_slice(&enveloped);
        }
        Ok(enveloped)
    }

    /// Everything drawn so far, all pens concatenated in creation order.
    pub fn replay(&self) -> Vec<u8> {
        self.pens
            .iter()
            .flat_map(|(_, pen)| pen.buffer.iter().copied())
            .collect()
    }

    /// The pen belonging to `artist`, if they have drawn this round.
    pub fn pen(&self, artist: ParticipantId) -> Option<&Pen> {
        self.pens
            .iter()
            .find(|(owner, _)| *owner == artist)
            .map(|(_, pen)| pen)
    }

    /// `true` if no pen holds any strokes.
    pub fn is_empty(&self) -> bool {
        self.pens.iter().all(|(_, pen)| pen.buffer.is_empty())
    }

    fn pen_for(&mut self, artist: ParticipantId) -> Result<&mut Pen, StrokeError> {
        let position = match self.pens.iter().position(|(owner, _)| *owner == artist) {
            Some(position) => position,
            None => {
                let index = u8::try_from(self.pens.len()).map_err(|_| StrokeError::OutOfPens)?;
                self.pens.push((
                    artist,
                    Pen {
                        index,
                        buffer: Vec::new(),
                    },
                ));
                self.pens.len() - 1
            }
        };
        Ok(&mut self.pens[position].1)
    }
}
