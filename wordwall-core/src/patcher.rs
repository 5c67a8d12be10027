use chrono::Local;
use log::info;
use rand::Rng;
use std::path::PathBuf;

use crate::config::{load_config, resolve_discovery, Discovery, SettingsDocument};
use crate::discovery::find_references;
use crate::filter::resolve_set;
use crate::host::Host;
use crate::ids::GlobalId;
use crate::report::PatchLog;
use crate::shuffle::ShufflePairing;
use crate::word_wall::{self, WordWall, WordWallField};
use crate::{PatcherError, PatcherPaths, PatcherSettings, Result};

pub const ESL_FLAG: &str = "ESL";

/// State carried from one lifecycle hook to the next.
pub struct RunContext<H: Host> {
    discovery: Discovery<H::Handle>,
    patch_file: H::File,
    log: PatchLog,
    pairing: Option<ShufflePairing<H::Handle>>,
    patched: usize,
}

impl<H: Host> RunContext<H> {
    pub fn discovery(&self) -> &Discovery<H::Handle> {
        &self.discovery
    }

    pub fn patch_file(&self) -> &H::File {
        &self.patch_file
    }

    pub fn log(&self) -> &PatchLog {
        &self.log
    }

    pub fn pairing(&self) -> Option<&ShufflePairing<H::Handle>> {
        self.pairing.as_ref()
    }

    pub fn patched(&self) -> usize {
        self.patched
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub patched: usize,
    pub log_path: PathBuf,
    pub report: String,
}

/// Drives one patch run against a host: `initialize`, `process_records`,
/// one `patch` per processed record, then `finalize`.
pub struct Patcher<'h, H: Host, R: Rng> {
    host: &'h mut H,
    settings: PatcherSettings,
    paths: PatcherPaths,
    rng: R,
}

impl<'h, H: Host, R: Rng> Patcher<'h, H, R> {
    pub fn new(host: &'h mut H, settings: PatcherSettings, paths: PatcherPaths, rng: R) -> Self {
        Self {
            host,
            settings,
            paths,
            rng,
        }
    }

    pub fn host(&self) -> &H {
        &*self.host
    }

    pub fn settings(&self) -> &PatcherSettings {
        &self.settings
    }

    pub fn initialize(&mut self) -> Result<RunContext<H>> {
        let document = load_config(&self.paths.settings_path)?;
        self.initialize_with(&document)
    }

    pub fn initialize_with(&mut self, document: &SettingsDocument) -> Result<RunContext<H>> {
        let mut log = PatchLog::new(Local::now(), &self.settings);
        info!("Ignored files: {}", self.settings.ignored_files.join(", "));

        let patch_file = self.host.patch_file(&self.settings.patch_file_name)?;
        let discovery = resolve_discovery(&*self.host, &self.settings, document)?;

        match &discovery {
            Discovery::Dynamic {
                trigger_ids,
                blacklist,
                ..
            } => {
                info!("Loaded triggers: {}", join_ids(trigger_ids));
                log.push_ids("Loaded triggers", trigger_ids);
                info!("Loaded blacklist: {}", join_ids(blacklist));
                log.push_ids("Loaded blacklist", blacklist);
            }
            Discovery::Hardcoded { wall_ids, .. } => {
                info!("Loaded hardcoded walls: {}", join_ids(wall_ids));
                log.push_ids("Loaded hardcoded walls", wall_ids);
            }
        }

        Ok(RunContext {
            discovery,
            patch_file,
            log,
            pairing: None,
            patched: 0,
        })
    }

    /// Loaded files other than the patch itself and the ignored plugins.
    pub fn files_to_patch(&self, patch_file: &H::File) -> Vec<H::File> {
        let patch_name = self.host.file_name(patch_file);
        self.host
            .loaded_files()
            .into_iter()
            .filter(|file| {
                let name = self.host.file_name(file);
                !name.eq_ignore_ascii_case(&patch_name) && !self.settings.is_ignored(&name)
            })
            .collect()
    }

    /// Finds, filters and shuffles the word walls of this run. Returns the
    /// processed set; each of its records is to be patched once.
    pub fn process_records(&mut self, ctx: &mut RunContext<H>) -> Result<Vec<H::Handle>> {
        let (raw, blacklist) = match &ctx.discovery {
            Discovery::Dynamic {
                triggers,
                blacklist,
                ..
            } => {
                for file in self.files_to_patch(&ctx.patch_file) {
                    info!("Building references for {}...", self.host.file_name(&file));
                    self.host.build_references(&file);
                }
                info!("Getting Word Wall Trigger references...");
                (find_references(&*self.host, triggers), blacklist.as_slice())
            }
            Discovery::Hardcoded { walls, .. } => (walls.clone(), &[][..]),
        };

        let processed = resolve_set(&*self.host, &raw, blacklist, &ctx.patch_file);
        info!(
            "{} word walls to randomize ({} candidates found)",
            processed.len(),
            raw.len()
        );

        ctx.pairing = Some(ShufflePairing::new(&processed, &mut self.rng));
        ctx.patched = 0;
        Ok(processed)
    }

    /// Patches `record`, the patch file's override of the next processed
    /// word wall, with the values of the next shuffled source.
    pub fn patch(&mut self, ctx: &mut RunContext<H>, record: &H::Handle) -> Result<()> {
        info!("Patching {}...", self.host.hex_form_id(record));

        let source_handle = ctx
            .pairing
            .as_mut()
            .ok_or(PatcherError::PairingExhausted(ctx.patched))?
            .next_source()?;

        let source = WordWall::materialize(&*self.host, &source_handle)?;
        let target = WordWall::materialize(&*self.host, record)?;

        let original_shout = self
            .host
            .value(target.value(WordWallField::Shout))
            .unwrap_or_default();
        let randomized_shout = self
            .host
            .value(source.value(WordWallField::Shout))
            .unwrap_or_default();
        ctx.log.push_patched(
            &target.form_id,
            &target.cell_name,
            &original_shout,
            &randomized_shout,
        );

        word_wall::patch(&mut *self.host, &target, &source)?;
        ctx.patched += 1;
        Ok(())
    }

    pub fn finalize(&mut self, ctx: RunContext<H>) -> Result<RunSummary> {
        info!("Setting ESL flag to {}.", self.settings.set_esl);
        self.host
            .set_file_flag(&ctx.patch_file, ESL_FLAG, self.settings.set_esl)?;

        info!("Saving log file to {}", self.paths.log_path.display());
        ctx.log.append_to(&self.paths.log_path)?;

        Ok(RunSummary {
            patched: ctx.patched,
            log_path: self.paths.log_path.clone(),
            report: ctx.log.render(),
        })
    }

    /// Runs every hook in order, copying each processed record into the
    /// patch file before patching it.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut ctx = self.initialize()?;
        self.run_from(&mut ctx)?;
        self.finalize(ctx)
    }

    pub fn run_with(&mut self, document: &SettingsDocument) -> Result<RunSummary> {
        let mut ctx = self.initialize_with(document)?;
        self.run_from(&mut ctx)?;
        self.finalize(ctx)
    }

    fn run_from(&mut self, ctx: &mut RunContext<H>) -> Result<()> {
        let records = self.process_records(ctx)?;
        for record in &records {
            let copy = self.host.add_override(&ctx.patch_file, record)?;
            self.patch(ctx, &copy)?;
        }
        Ok(())
    }
}

fn join_ids(ids: &[GlobalId]) -> String {
    ids.iter().map(GlobalId::as_str).collect::<Vec<_>>().join(", ")
}
