//! Arena of region records keyed by `adcode`.
//!
//! One record per logical region, however many solids it was built from.
//! Picking resolves an entity to its region through the owner index, which is
//! a direct lookup by entity index.

use std::collections::HashMap;

use foundation::color::Color;
use foundation::math::Vec3;

use crate::components::{GeometryRole, RegionProperties};
use crate::entity::EntityId;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub properties: RegionProperties,
    /// Label anchor in root-local space (on top of the solid).
    pub anchor: Vec3,
    pub top_faces: Vec<EntityId>,
    pub side_walls: Vec<EntityId>,
    pub bottoms: Vec<EntityId>,
    pub edge_lines: Vec<EntityId>,
    /// Last metric color applied by the recolor pass; hover restores to it.
    pub base_color: Color,
    /// Metric value for the selected period, if any.
    pub value: Option<f64>,
}

impl RegionRecord {
    pub fn adcode(&self) -> i64 {
        self.properties.adcode
    }

    pub fn entities(&self, role: GeometryRole) -> &[EntityId] {
        match role {
            GeometryRole::TopFace => &self.top_faces,
            GeometryRole::SideWall => &self.side_walls,
            GeometryRole::Bottom => &self.bottoms,
            GeometryRole::EdgeLine => &self.edge_lines,
        }
    }
}

#[derive(Debug, Default)]
pub struct RegionRegistry {
    records: Vec<RegionRecord>,
    by_adcode: HashMap<i64, usize>,
    owners: Vec<Option<usize>>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a region, or returns the existing record for a repeated adcode.
    ///
    /// Repeated adcodes keep the first properties record so every solid of a
    /// region shares it.
    pub fn upsert(
        &mut self,
        properties: RegionProperties,
        anchor: Vec3,
        base_color: Color,
    ) -> &mut RegionRecord {
        let slot = match self.by_adcode.get(&properties.adcode) {
            Some(&slot) => slot,
            None => {
                let slot = self.records.len();
                self.by_adcode.insert(properties.adcode, slot);
                self.records.push(RegionRecord {
                    properties,
                    anchor,
                    top_faces: Vec::new(),
                    side_walls: Vec::new(),
                    bottoms: Vec::new(),
                    edge_lines: Vec::new(),
                    base_color,
                    value: None,
                });
                slot
            }
        };
        &mut self.records[slot]
    }

    /// Records `entity` as a part of region `adcode`. Unknown adcodes are ignored.
    pub fn attach(&mut self, adcode: i64, entity: EntityId, role: GeometryRole) -> bool {
        let Some(&slot) = self.by_adcode.get(&adcode) else {
            return false;
        };
        let record = &mut self.records[slot];
        match role {
            GeometryRole::TopFace => record.top_faces.push(entity),
            GeometryRole::SideWall => record.side_walls.push(entity),
            GeometryRole::Bottom => record.bottoms.push(entity),
            GeometryRole::EdgeLine => record.edge_lines.push(entity),
        }
        let idx = entity.index() as usize;
        if self.owners.len() <= idx {
            self.owners.resize(idx + 1, None);
        }
        self.owners[idx] = Some(slot);
        true
    }

    pub fn owner_of(&self, entity: EntityId) -> Option<&RegionRecord> {
        let slot = self.owners.get(entity.index() as usize).copied().flatten()?;
        self.records.get(slot)
    }

    pub fn get(&self, adcode: i64) -> Option<&RegionRecord> {
        self.records.get(*self.by_adcode.get(&adcode)?)
    }

    pub fn get_mut(&mut self, adcode: i64) -> Option<&mut RegionRecord> {
        let slot = *self.by_adcode.get(&adcode)?;
        self.records.get_mut(slot)
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegionRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_adcode.clear();
        self.owners.clear();
    }
}
