use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::Point;

/// Identifier of an action function understood by the environment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum FunctionId {
    #[display("no_op")]
    NoOp,
    #[display("select_army")]
    SelectArmy,
    #[display("Move_screen")]
    MoveScreen,
}

impl FunctionId {
    pub const ALL: [Self; 3] = [Self::NoOp, Self::SelectArmy, Self::MoveScreen];

    /// Numeric function id as used on the wire.
    #[must_use]
    pub const fn id(self) -> u16 {
        match self {
            Self::NoOp => 0,
            Self::SelectArmy => 7,
            Self::MoveScreen => 331,
        }
    }
}

/// Whether an order replaces the current one or is appended to the queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Queue {
    #[default]
    Now,
    Queued,
}

/// Whether a selection replaces or extends the current selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectAdd {
    #[default]
    Replace,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionArgument {
    Queue(Queue),
    SelectAdd(SelectAdd),
    Screen(Point),
}

/// A function identifier plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    function: FunctionId,
    arguments: ArrayVec<ActionArgument, 2>,
}

impl FunctionCall {
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            function: FunctionId::NoOp,
            arguments: ArrayVec::new(),
        }
    }

    #[must_use]
    pub fn select_army(select_add: SelectAdd) -> Self {
        let mut arguments = ArrayVec::new();
        arguments.push(ActionArgument::SelectAdd(select_add));
        Self {
            function: FunctionId::SelectArmy,
            arguments,
        }
    }

    #[must_use]
    pub fn move_screen(queue: Queue, target: Point) -> Self {
        let mut arguments = ArrayVec::new();
        arguments.push(ActionArgument::Queue(queue));
        arguments.push(ActionArgument::Screen(target));
        Self {
            function: FunctionId::MoveScreen,
            arguments,
        }
    }

    #[must_use]
    pub fn function(&self) -> FunctionId {
        self.function
    }

    #[must_use]
    pub fn arguments(&self) -> &[ActionArgument] {
        &self.arguments
    }

    /// Screen target argument, if this call carries one.
    #[must_use]
    pub fn screen_target(&self) -> Option<Point> {
        self.arguments.iter().find_map(|arg| match arg {
            ActionArgument::Screen(p) => Some(*p),
            _ => None,
        })
    }
}
