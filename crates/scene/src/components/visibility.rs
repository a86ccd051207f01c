/// Render and pick gating for an entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
    /// Whether pointer rays consider this entity. Only recolorable top faces set it.
    pub pickable: bool,
}

impl Visibility {
    pub fn visible() -> Self {
        Self {
            visible: true,
            pickable: false,
        }
    }

    pub fn pickable() -> Self {
        Self {
            visible: true,
            pickable: true,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            pickable: false,
        }
    }

    pub fn is_pick_target(&self) -> bool {
        self.visible && self.pickable
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::visible()
    }
}
