//! Populating occupancy fields from a world source.

use log::info;
use web_time::Instant;

use crate::fields::snapshot::OccupancyFields;
use crate::shading::palette::is_empty_block;
use crate::shading::MaterialLibrary;
use crate::world_source::{ScanZone, WorldSource};

/// Counts from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Loaded voxels written to the fields.
    pub scanned: usize,
    /// Of those, how many were solid.
    pub solid: usize,
    /// Voxels the source had not loaded; left untouched.
    pub unloaded: usize,
}

/// Writes every loaded voxel of `zone` into `fields`.
///
/// Identifiers whose registered name is an empty block are stored as `0`.
pub fn populate<W: WorldSource + ?Sized>(
    fields: &mut OccupancyFields,
    world: &W,
    library: &MaterialLibrary,
    zone: &ScanZone,
) -> ScanReport {
    let started = Instant::now();
    let mut report = ScanReport::default();

    for voxel in zone.voxels() {
        let Some(id) = world.block_at(voxel) else {
            report.unloaded += 1;
            continue;
        };
        let id = match library.name_of(id) {
            Some(name) if is_empty_block(name) => 0,
            _ => id,
        };
        fields.record(voxel, id);
        report.scanned += 1;
        if id != 0 {
            report.solid += 1;
        }
    }

    info!(
        "Scanned {} voxels ({} solid, {} unloaded) in {:?}",
        report.scanned,
        report.solid,
        report.unloaded,
        started.elapsed()
    );
    report
}
