use std::fmt;
use std::str::FromStr;

/// A high-level request any host (desktop window, CLI script) can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Drop a sphere with a random horizontal offset.
    SpawnSphere,
    /// Drop a box with a random horizontal offset.
    SpawnBox,
    /// Remove every spawned object.
    Reset,
    /// Rebuild procedural geometry with the current parameters.
    Regenerate,
    /// Kick every simulated body.
    Push,
    /// Rotate the orbit camera by angles in radians.
    Orbit { azimuth: f32, polar: f32 },
    /// Multiply the camera distance. Above 1 moves away.
    Zoom(f32),
    /// Scroll by a number of viewport heights. Positive scrolls down.
    Scroll(f32),
    /// Pointer position normalized to `[-0.5, 0.5]` on both axes.
    CursorMove { x: f32, y: f32 },
    /// Stop the frame loop.
    Quit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SpawnSphere => "spawn-sphere",
            Self::SpawnBox => "spawn-box",
            Self::Reset => "reset",
            Self::Regenerate => "regenerate",
            Self::Push => "push",
            Self::Orbit { .. } => "orbit",
            Self::Zoom(_) => "zoom",
            Self::Scroll(_) => "scroll",
            Self::CursorMove { .. } => "cursor",
            Self::Quit => "quit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orbit { azimuth, polar } => write!(f, "orbit={azimuth},{polar}"),
            Self::Zoom(factor) => write!(f, "zoom={factor}"),
            Self::Scroll(by) => write!(f, "scroll={by}"),
            Self::CursorMove { x, y } => write!(f, "cursor={x},{y}"),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("action `{action}` expects {expected}, got `{got}`")]
    BadArgument {
        action: &'static str,
        expected: &'static str,
        got: String,
    },
}

fn parse_floats<const N: usize>(action: &'static str, raw: &str) -> Result<[f32; N], InputError> {
    let bad = || InputError::BadArgument {
        action,
        expected: if N == 1 { "a number" } else { "two comma-separated numbers" },
        got: raw.to_string(),
    };
    let mut out = [0.0; N];
    let mut parts = raw.split(',');
    for slot in &mut out {
        *slot = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(bad)?;
    }
    if parts.next().is_some() {
        return Err(bad());
    }
    Ok(out)
}

/// Parses the [`Display`](fmt::Display) form: `reset`, `zoom=1.5`, `orbit=0.1,0`.
impl FromStr for Action {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (s.trim(), None),
        };
        let action = match (name, arg) {
            ("spawn-sphere", None) => Self::SpawnSphere,
            ("spawn-box", None) => Self::SpawnBox,
            ("reset", None) => Self::Reset,
            ("regenerate", None) => Self::Regenerate,
            ("push", None) => Self::Push,
            ("quit", None) => Self::Quit,
            ("orbit", Some(arg)) => {
                let [azimuth, polar] = parse_floats("orbit", arg)?;
                Self::Orbit { azimuth, polar }
            }
            ("zoom", Some(arg)) => Self::Zoom(parse_floats::<1>("zoom", arg)?[0]),
            ("scroll", Some(arg)) => Self::Scroll(parse_floats::<1>("scroll", arg)?[0]),
            ("cursor", Some(arg)) => {
                let [x, y] = parse_floats("cursor", arg)?;
                Self::CursorMove { x, y }
            }
            _ => return Err(InputError::UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}

/// Actions collected between frames, drained once per frame.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        tracing::trace!(%action, "action queued");
        self.pending.push(action);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending action in arrival order.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_argument_actions() {
        assert_eq!("reset".parse::<Action>(), Ok(Action::Reset));
        assert_eq!("spawn-box".parse::<Action>(), Ok(Action::SpawnBox));
        assert_eq!("push".parse::<Action>(), Ok(Action::Push));
        assert_eq!(Action::Push.to_string(), "push");
        assert_eq!("zoom=1.5".parse::<Action>(), Ok(Action::Zoom(1.5)));
        assert_eq!(
            "orbit=0.25, -0.5".parse::<Action>(),
            Ok(Action::Orbit {
                azimuth: 0.25,
                polar: -0.5
            })
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        let action = Action::CursorMove { x: 0.5, y: -0.25 };
        assert_eq!(action.to_string().parse::<Action>(), Ok(action));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            "jump".parse::<Action>(),
            Err(InputError::UnknownAction(_))
        ));
        assert!(matches!(
            "zoom=fast".parse::<Action>(),
            Err(InputError::BadArgument { action: "zoom", .. })
        ));
        assert!(matches!(
            "orbit=1,2,3".parse::<Action>(),
            Err(InputError::BadArgument { .. })
        ));
        assert!("reset=1".parse::<Action>().is_err());
    }

    #[test]
    fn queue_drains_in_order() {
        let mut queue = ActionQueue::new();
        queue.push(Action::SpawnSphere);
        queue.push(Action::Reset);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(), vec![Action::SpawnSphere, Action::Reset]);
        assert!(queue.is_empty());
    }
}
