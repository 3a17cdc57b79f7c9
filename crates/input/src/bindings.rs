use crate::Action;
use std::collections::BTreeMap;

/// Host-independent key identifiers the lessons bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Space,
    B,
    R,
    G,
    P,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Plus,
    Minus,
    Escape,
}

const ORBIT_STEP: f32 = 0.05;
const ZOOM_STEP: f32 = 1.1;

/// Key-to-action table.
#[derive(Debug, Clone)]
pub struct Bindings {
    map: BTreeMap<Key, Action>,
}

impl Default for Bindings {
    fn default() -> Self {
        let map = BTreeMap::from([
            (Key::Space, Action::SpawnSphere),
            (Key::B, Action::SpawnBox),
            (Key::R, Action::Reset),
            (Key::G, Action::Regenerate),
            (Key::P, Action::Push),
            (
                Key::Left,
                Action::Orbit {
                    azimuth: -ORBIT_STEP,
                    polar: 0.0,
                },
            ),
            (
                Key::Right,
                Action::Orbit {
                    azimuth: ORBIT_STEP,
                    polar: 0.0,
                },
            ),
            (
                Key::Up,
                Action::Orbit {
                    azimuth: 0.0,
                    polar: -ORBIT_STEP,
                },
            ),
            (
                Key::Down,
                Action::Orbit {
                    azimuth: 0.0,
                    polar: ORBIT_STEP,
                },
            ),
            (Key::PageUp, Action::Scroll(-1.0)),
            (Key::PageDown, Action::Scroll(1.0)),
            (Key::Plus, Action::Zoom(1.0 / ZOOM_STEP)),
            (Key::Minus, Action::Zoom(ZOOM_STEP)),
            (Key::Escape, Action::Quit),
        ]);
        Self { map }
    }
}

impl Bindings {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: Key) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Bind `key`, returning the action it replaced.
    pub fn bind(&mut self, key: Key, action: Action) -> Option<Action> {
        self.map.insert(key, action)
    }

    pub fn unbind(&mut self, key: Key) -> Option<Action> {
        self.map.remove(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, Action)> + '_ {
        self.map.iter().map(|(k, a)| (*k, *a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_lesson_keys() {
        let bindings = Bindings::default();
        assert_eq!(bindings.get(Key::Space), Some(Action::SpawnSphere));
        assert_eq!(bindings.get(Key::B), Some(Action::SpawnBox));
        assert_eq!(bindings.get(Key::R), Some(Action::Reset));
        assert_eq!(bindings.get(Key::G), Some(Action::Regenerate));
        assert_eq!(bindings.get(Key::P), Some(Action::Push));
        assert_eq!(bindings.get(Key::Escape), Some(Action::Quit));
        assert!(matches!(bindings.get(Key::Left), Some(Action::Orbit { .. })));
    }

    #[test]
    fn rebinding_replaces() {
        let mut bindings = Bindings::empty();
        assert_eq!(bindings.bind(Key::R, Action::Regenerate), None);
        assert_eq!(
            bindings.bind(Key::R, Action::Reset),
            Some(Action::Regenerate)
        );
        assert_eq!(bindings.iter().count(), 1);
        assert_eq!(bindings.unbind(Key::R), Some(Action::Reset));
        assert_eq!(bindings.get(Key::R), None);
    }
}
