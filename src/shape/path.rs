//! Path shape: coordinates tagged with move/line/curve commands

use super::curve::{push_cubic, push_quadratic};
use super::{Shape, ShapeCore};
use crate::coord::{Coord, PointSource};
use crate::log::debug;
use crate::persist::{Reader, Writer};
use crate::types::Point;

/// Drawing command attached to a coordinate.
///
/// The command sits on the first coordinate of its operand group: `CurveTo`
/// consumes that coordinate and the next two (control 1, control 2, end),
/// `QuadTo` consumes two (control, end). Tags on the remaining operands of
/// a group are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathCommand {
    MoveTo,
    #[default]
    LineTo,
    CurveTo,
    QuadTo,
}

impl PathCommand {
    fn letter(self) -> char {
        match self {
            PathCommand::MoveTo => 'M',
            PathCommand::LineTo => 'L',
            PathCommand::CurveTo => 'C',
            PathCommand::QuadTo => 'Q',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'M' => Some(PathCommand::MoveTo),
            'L' => Some(PathCommand::LineTo),
            'C' => Some(PathCommand::CurveTo),
            'Q' => Some(PathCommand::QuadTo),
            _ => None,
        }
    }
}

/// Command tag of one coordinate; `close` closes the subpath after its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathStep {
    pub command: PathCommand,
    pub close: bool,
}

#[derive(Debug, Clone)]
pub struct PathShape {
    core: ShapeCore,
    steps: Vec<PathStep>,
    /// Command for the group being pushed, consumed when it is inserted
    pending: Option<PathCommand>,
}

impl Default for PathShape {
    fn default() -> Self {
        Self::new()
    }
}

impl PathShape {
    pub fn new() -> Self {
        PathShape {
            core: ShapeCore::default(),
            steps: Vec::new(),
            pending: None,
        }
    }

    fn from_parts(coords: Vec<Coord>, steps: Vec<PathStep>) -> Self {
        let mut shape = PathShape {
            core: ShapeCore::new(coords),
            steps,
            pending: None,
        };
        shape.steps.resize(shape.core.coordinates.len(), PathStep::default());
        shape.refresh();
        shape
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Append a command with its operand coordinates. The group is tagged
    /// before the point list is rebuilt, so observers see the final outline.
    pub fn push(&mut self, command: PathCommand, coords: Vec<Coord>) -> bool {
        let index = self.coordinate_count();
        self.pending = Some(command);
        let inserted = self.insert_coordinates_at(index, coords);
        self.pending = None;
        inserted
    }

    pub fn move_to(&mut self, p: Point) -> bool {
        self.push(PathCommand::MoveTo, vec![Coord::from_point(p)])
    }

    pub fn line_to(&mut self, p: Point) -> bool {
        self.push(PathCommand::LineTo, vec![Coord::from_point(p)])
    }

    pub fn curve_to(&mut self, cp1: Point, cp2: Point, end: Point) -> bool {
        let coords = [cp1, cp2, end].into_iter().map(Coord::from_point).collect();
        self.push(PathCommand::CurveTo, coords)
    }

    pub fn quad_to(&mut self, cp: Point, end: Point) -> bool {
        let coords = [cp, end].into_iter().map(Coord::from_point).collect();
        self.push(PathCommand::QuadTo, coords)
    }

    /// Close the current subpath after the last command group
    pub fn close(&mut self) {
        if let Some(index) = self.last_group_start() {
            self.steps[index].close = true;
            self.refresh();
        }
    }

    fn last_group_start(&self) -> Option<usize> {
        let mut i = 0;
        let mut last = None;
        while i < self.steps.len() {
            last = Some(i);
            i += self.group_len(i);
        }
        last
    }

    /// Coordinates consumed by the group starting at `i`
    fn group_len(&self, i: usize) -> usize {
        let remaining = self.steps.len() - i;
        match self.steps[i].command {
            PathCommand::CurveTo if remaining >= 3 => 3,
            PathCommand::QuadTo if remaining >= 2 => 2,
            _ => 1,
        }
    }

    fn encode_steps(&self) -> String {
        self.steps
            .iter()
            .map(|s| {
                let mut text = s.command.letter().to_string();
                if s.close {
                    text.push('z');
                }
                text
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn decode_steps(text: &str) -> Vec<PathStep> {
        text.split_whitespace()
            .map(|token| {
                let mut chars = token.chars();
                let command = chars.next().and_then(PathCommand::from_letter).unwrap_or_else(|| {
                    debug!(token, "unknown path command");
                    PathCommand::LineTo
                });
                PathStep {
                    command,
                    close: token.ends_with('z') || token.ends_with('Z'),
                }
            })
            .collect()
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node, coords: Vec<Coord>) -> Self {
        let steps = reader
            .attribute(node, "steps")
            .map(Self::decode_steps)
            .unwrap_or_default();
        Self::from_parts(coords, steps)
    }
}

impl Shape for PathShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "path"
    }

    fn is_closed(&self) -> bool {
        self.steps.iter().any(|s| s.close)
    }

    fn build_point_list(&self) -> Vec<Point> {
        let points: Vec<Point> = self.core.coordinates.iter().map(|c| c.to_point()).collect();
        let n = points.len().min(self.steps.len());
        let mut out = Vec::with_capacity(n);
        let mut current: Option<Point> = None;
        let mut start = Point::ZERO;

        let mut i = 0;
        while i < n {
            let step = self.steps[i];
            let len = self.group_len(i);
            match (current, step.command, len) {
                (None, ..) | (_, PathCommand::MoveTo, _) => {
                    out.push(points[i]);
                    start = points[i];
                }
                (Some(from), PathCommand::CurveTo, 3) => {
                    push_cubic(&mut out, from, points[i], points[i + 1], points[i + 2]);
                }
                (Some(from), PathCommand::QuadTo, 2) => {
                    push_quadratic(&mut out, from, points[i], points[i + 1]);
                }
                _ => out.push(points[i]),
            }
            current = Some(points[i + len - 1]);
            if step.close {
                out.push(start);
                current = Some(start);
            }
            i += len;
        }
        out
    }

    fn coordinates_inserted(&mut self, index: usize, count: usize) {
        let at = index.min(self.steps.len());
        let pending = self.pending.take();
        let fresh = (0..count).map(|k| PathStep {
            command: match pending {
                Some(command) if k == 0 => command,
                _ if at + k == 0 => PathCommand::MoveTo,
                _ => PathCommand::LineTo,
            },
            close: false,
        });
        self.steps.splice(at..at, fresh);
    }

    fn coordinates_removed(&mut self, index: usize, count: usize) {
        let end = (index + count).min(self.steps.len());
        self.steps.drain(index.min(end)..end);
    }

    fn coordinates_replaced(&mut self) {
        let n = self.core.coordinates.len();
        self.steps = (0..n)
            .map(|i| PathStep {
                command: if i == 0 { PathCommand::MoveTo } else { PathCommand::LineTo },
                close: false,
            })
            .collect();
    }

    fn save_extra(&self, writer: &mut dyn Writer) {
        writer.write_attribute_string("steps", &self.encode_steps());
    }
}
