//! C5: streaming pair reconciliation — a bounded-memory cache that meets
//! both mates of a read pair in arbitrary order and stages anchor/IRR
//! region evidence per canonical motif.

use crate::contig::ReferenceContigInfo;
use crate::errors::Result;
use crate::region::{create_countable_region, CountFeature, Region};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A read's own aligned (or mate-inherited, per SAM convention for
/// half-unmapped pairs) position — the coordinate a region is built from.
#[derive(Debug, Clone, Copy)]
pub struct ReadPosition {
    pub contig_id: i64,
    pub pos: i64,
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Irr {
        region: Region<CountFeature>,
        motif: String,
    },
    Anchor {
        region: Region<CountFeature>,
    },
    Other,
}

/// The unpaired cache: read name -> (type, plus region/motif for
/// IRR/anchor entries). State machine per name: absent -> cached(type) ->
/// absent. Seeing an already-cached name always evicts it.
#[derive(Debug, Default)]
struct ReadCache {
    entries: HashMap<String, CacheEntry>,
}

impl ReadCache {
    fn take(&mut self, name: &str) -> Option<CacheEntry> {
        self.entries.remove(name)
    }

    fn insert(&mut self, name: String, entry: CacheEntry) {
        self.entries.insert(name, entry);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Owns the unpaired cache and the two per-motif region lists
/// (`anchorRegions`, `irrRegions`), plus an optional pair-log sink.
pub struct PairCollector {
    contig_info: ReferenceContigInfo,
    cache: ReadCache,
    anchor_regions: HashMap<String, Vec<Region<CountFeature>>>,
    irr_regions: HashMap<String, Vec<Region<CountFeature>>>,
    log: Option<BufWriter<File>>,
}

impl PairCollector {
    pub fn new(contig_info: ReferenceContigInfo) -> Self {
        Self {
            contig_info,
            cache: ReadCache::default(),
            anchor_regions: HashMap::new(),
            irr_regions: HashMap::new(),
            log: None,
        }
    }

    /// Opens the optional pair-log sink. Must not be called twice.
    pub fn enable_pair_log(&mut self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "pair_type\tmotif\trole\tpos\tmate_role\tmate_pos\tfragment_name"
        )?;
        self.log = Some(writer);
        Ok(())
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn anchor_regions(&self) -> &HashMap<String, Vec<Region<CountFeature>>> {
        &self.anchor_regions
    }

    pub fn irr_regions(&self) -> &HashMap<String, Vec<Region<CountFeature>>> {
        &self.irr_regions
    }

    pub fn into_regions(
        self,
    ) -> (
        HashMap<String, Vec<Region<CountFeature>>>,
        HashMap<String, Vec<Region<CountFeature>>>,
    ) {
        (self.anchor_regions, self.irr_regions)
    }

    pub fn add_anchor(&mut self, name: &str, pos: ReadPosition) -> Result<()> {
        if let Some(entry) = self.cache.take(name) {
            if let CacheEntry::Irr { region: irr_region, motif } = entry {
                let anchor_region = create_countable_region(pos.contig_id, pos.pos, pos.pos + 1)?;
                self.log_anchored_irr(name, &motif, &irr_region, &anchor_region)?;
                self.anchor_regions
                    .entry(motif.clone())
                    .or_default()
                    .push(anchor_region);
                self.irr_regions.entry(motif).or_default().push(irr_region);
            }
            // Anchor or Other mate: nothing to emit, entry already evicted.
        } else {
            let region = create_countable_region(pos.contig_id, pos.pos, pos.pos + 1)?;
            self.cache.insert(name.to_string(), CacheEntry::Anchor { region });
        }
        Ok(())
    }

    pub fn add_irr(&mut self, name: &str, pos: ReadPosition, motif: &str) -> Result<()> {
        if let Some(entry) = self.cache.take(name) {
            match entry {
                CacheEntry::Irr {
                    region: mate_region,
                    motif: mate_motif,
                } => {
                    let region = create_countable_region(pos.contig_id, pos.pos, pos.pos + 1)?;
                    self.log_irr_pair(name, &region, motif, &mate_region, &mate_motif)?;
                    if motif == mate_motif {
                        self.irr_regions
                            .entry(motif.to_string())
                            .or_default()
                            .push(region);
                        self.irr_regions
                            .entry(mate_motif)
                            .or_default()
                            .push(mate_region);
                    }
                }
                CacheEntry::Anchor { region: anchor_region } => {
                    let irr_region = create_countable_region(pos.contig_id, pos.pos, pos.pos + 1)?;
                    self.log_anchored_irr(name, motif, &irr_region, &anchor_region)?;
                    self.irr_regions
                        .entry(motif.to_string())
                        .or_default()
                        .push(irr_region);
                    self.anchor_regions
                        .entry(motif.to_string())
                        .or_default()
                        .push(anchor_region);
                }
                CacheEntry::Other => {}
            }
        } else {
            let region = create_countable_region(pos.contig_id, pos.pos, pos.pos + 1)?;
            self.cache.insert(
                name.to_string(),
                CacheEntry::Irr {
                    region,
                    motif: motif.to_string(),
                },
            );
        }
        Ok(())
    }

    pub fn add_other(&mut self, name: &str) {
        if self.cache.take(name).is_none() {
            self.cache.insert(name.to_string(), CacheEntry::Other);
        }
    }

    fn log_anchored_irr(
        &mut self,
        name: &str,
        motif: &str,
        irr_region: &Region<CountFeature>,
        anchor_region: &Region<CountFeature>,
    ) -> Result<()> {
        if let Some(writer) = &mut self.log {
            writeln!(
                writer,
                "anchored_irr\t{motif}\tirr\t{}\tanchor\t{}\t{name}",
                irr_region.encode(&self.contig_info)?,
                anchor_region.encode(&self.contig_info)?,
            )?;
        }
        Ok(())
    }

    fn log_irr_pair(
        &mut self,
        name: &str,
        region: &Region<CountFeature>,
        motif: &str,
        mate_region: &Region<CountFeature>,
        mate_motif: &str,
    ) -> Result<()> {
        if self.log.is_none() {
            return Ok(());
        }
        let (first_motif, first_region, second_region) = if motif == mate_motif {
            (motif.to_string(), region, mate_region)
        } else if motif <= mate_motif {
            (format!("{motif}_{mate_motif}"), region, mate_region)
        } else {
            (format!("{mate_motif}_{motif}"), mate_region, region)
        };
        let writer = self.log.as_mut().unwrap();
        writeln!(
            writer,
            "irr_pair\t{first_motif}\tirr\t{}\tirr\t{}\t{name}",
            first_region.encode(&self.contig_info)?,
            second_region.encode(&self.contig_info)?,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> PairCollector {
        PairCollector::new(ReferenceContigInfo::new(vec![("chr1".to_string(), 1_000_000)]))
    }

    #[test]
    fn anchor_then_irr_produces_anchored_irr() {
        let mut pc = collector();
        pc.add_anchor("frag1", ReadPosition { contig_id: 0, pos: 100 })
            .unwrap();
        pc.add_irr("frag1", ReadPosition { contig_id: 0, pos: 5000 }, "CCG")
            .unwrap();
        assert_eq!(pc.anchor_regions()["CCG"].len(), 1);
        assert_eq!(pc.irr_regions()["CCG"].len(), 1);
        assert_eq!(pc.cache_len(), 0);
    }

    #[test]
    fn irr_then_irr_same_motif_produces_pair() {
        let mut pc = collector();
        pc.add_irr("frag2", ReadPosition { contig_id: 0, pos: 10 }, "CCG")
            .unwrap();
        pc.add_irr("frag2", ReadPosition { contig_id: 0, pos: 10 }, "CCG")
            .unwrap();
        assert_eq!(pc.irr_regions()["CCG"].len(), 2);
        assert!(pc.anchor_regions().get("CCG").is_none());
    }

    #[test]
    fn irr_then_irr_different_motif_records_nothing_but_evicts() {
        let mut pc = collector();
        pc.add_irr("frag3", ReadPosition { contig_id: 0, pos: 10 }, "CCG")
            .unwrap();
        pc.add_irr("frag3", ReadPosition { contig_id: 0, pos: 10 }, "AAATG")
            .unwrap();
        assert!(pc.irr_regions().get("CCG").is_none());
        assert!(pc.irr_regions().get("AAATG").is_none());
        assert_eq!(pc.cache_len(), 0);
    }

    #[test]
    fn other_then_anchor_evicts_without_emitting() {
        let mut pc = collector();
        pc.add_other("frag4");
        pc.add_anchor("frag4", ReadPosition { contig_id: 0, pos: 10 })
            .unwrap();
        assert!(pc.anchor_regions().is_empty());
        assert_eq!(pc.cache_len(), 0);
    }

    #[test]
    fn singleton_remains_cached_until_discarded() {
        let mut pc = collector();
        pc.add_anchor("frag5", ReadPosition { contig_id: 0, pos: 10 })
            .unwrap();
        assert_eq!(pc.cache_len(), 1);
        // end-of-stream: caller simply drops the collector/cache.
    }

    #[test]
    fn smoke_test_pair_pipeline_anchored_and_paired() {
        let mut pc = collector();
        // Two IRR mates with motif CGG -> canonical CCG.
        pc.add_irr("pairA", ReadPosition { contig_id: 0, pos: 10 }, "CCG")
            .unwrap();
        pc.add_irr("pairA", ReadPosition { contig_id: 0, pos: 20 }, "CCG")
            .unwrap();
        // One anchor with an IRR-CGG mate.
        pc.add_irr("pairB", ReadPosition { contig_id: 0, pos: 30 }, "CCG")
            .unwrap();
        pc.add_anchor("pairB", ReadPosition { contig_id: 0, pos: 1000 })
            .unwrap();

        let anchored_irr_count = pc.anchor_regions()["CCG"].len();
        let irr_region_count = pc.irr_regions()["CCG"].len();
        let irr_pair_count = (irr_region_count - anchored_irr_count) / 2;

        assert_eq!(anchored_irr_count, 1);
        assert_eq!(irr_pair_count, 1);
    }
}
