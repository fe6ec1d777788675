//! Configuration Tweak
//!
//! [`PsetTweak`] carries the job-wide settings (output modules, LFN base,
//! agent number, job counter, seeding) and applies a job's files and mask
//! to a [`ProcessConfig`].

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rand::Rng;

use super::job::{InputFileDescriptor, JobMask, Seeding};
use super::process::{OutputModule, ProcessConfig};
use super::TweakError;

/// Configuration read from the job working directory.
pub const PSET_INPUT: &str = "PSet.json";

/// Tweaked configuration written next to it.
pub const PSET_OUTPUT: &str = "PSet.tweaked.json";

const MAX_SEED: u32 = 900_000_000;

/// Immutable description of how to tweak a job configuration.
///
/// # Example
///
/// ```rust
/// use crabinterface::pset::{InputFileDescriptor, JobMask, ProcessConfig, PsetTweak};
///
/// let tweak = PsetTweak::new(vec!["o".to_string()])
///     .with_lfn_base("/store/temp/user/jdoe")
///     .with_counter(1234);
///
/// let mut config = ProcessConfig::default();
/// let files = vec![InputFileDescriptor::new("/store/data/a.root")];
/// tweak.apply(&mut config, &files, &JobMask::new()).unwrap();
///
/// assert_eq!(config.source.file_names, vec!["/store/data/a.root"]);
/// ```
#[derive(Debug, Clone)]
pub struct PsetTweak {
    output_modules: Vec<String>,
    lfn_base: Option<String>,
    agent_number: u32,
    counter: u64,
    lhe_input: bool,
    seeding: Option<Seeding>,
}

impl PsetTweak {
    pub fn new(output_modules: Vec<String>) -> Self {
        Self {
            output_modules,
            lfn_base: None,
            agent_number: 0,
            counter: 0,
            lhe_input: false,
            seeding: None,
        }
    }

    pub fn with_lfn_base(mut self, base: impl Into<String>) -> Self {
        self.lfn_base = Some(base.into());
        self
    }

    pub fn with_agent_number(mut self, agent_number: u32) -> Self {
        self.agent_number = agent_number;
        self
    }

    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_lhe_input(mut self, lhe_input: bool) -> Self {
        self.lhe_input = lhe_input;
        self
    }

    pub fn with_seeding(mut self, seeding: Option<Seeding>) -> Self {
        self.seeding = seeding;
        self
    }

    pub fn output_modules(&self) -> &[String] {
        &self.output_modules
    }

    /// Directory component grouping a thousand jobs, e.g. `00001` for job 1234.
    pub fn lfn_group(&self) -> String {
        format!("{}{:04}", self.agent_number, self.counter / 1000)
    }

    /// Applies the job's files and mask using the thread-local RNG.
    pub fn apply(
        &self,
        config: &mut ProcessConfig,
        files: &[InputFileDescriptor],
        mask: &JobMask,
    ) -> Result<(), TweakError> {
        self.apply_with_rng(config, files, mask, &mut rand::thread_rng())
    }

    /// Applies the job's files and mask. `config` is left untouched on error.
    pub fn apply_with_rng<R: Rng + ?Sized>(
        &self,
        config: &mut ProcessConfig,
        files: &[InputFileDescriptor],
        mask: &JobMask,
        rng: &mut R,
    ) -> Result<(), TweakError> {
        let mut tweaked = config.clone();

        let primary = self.fix_input_files(&mut tweaked, files, mask)?;
        self.fix_mask(&mut tweaked, mask, !primary.is_empty())?;
        self.fix_output_modules(&mut tweaked);
        self.fix_seeds(&mut tweaked, rng);

        *config = tweaked;
        Ok(())
    }

    fn fix_input_files<'a>(
        &self,
        config: &mut ProcessConfig,
        files: &'a [InputFileDescriptor],
        mask: &JobMask,
    ) -> Result<Vec<&'a InputFileDescriptor>, TweakError> {
        let mut primary = Vec::new();

        for file in files {
            if file.is_placeholder() {
                let first_lumi = mask
                    .first_lumi
                    .ok_or_else(|| TweakError::MissingFirstLumi(file.lfn.clone()))?;
                config.source.first_luminosity_block = Some(first_lumi);
            } else {
                primary.push(file);
            }
        }

        if !primary.is_empty() {
            config.source.file_names = primary.iter().map(|f| f.lfn.clone()).collect();
            debug!("Set {} primary input files", primary.len());
        }

        if files.len() > 1 {
            config.source.secondary_file_names = files
                .iter()
                .flat_map(|f| f.parents.iter().cloned())
                .collect();
            debug!(
                "Set {} secondary input files",
                config.source.secondary_file_names.len()
            );
        }

        Ok(primary)
    }

    fn fix_mask(
        &self,
        config: &mut ProcessConfig,
        mask: &JobMask,
        has_primary: bool,
    ) -> Result<(), TweakError> {
        config.max_events.input = mask
            .max_events()
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(-1);

        if !has_primary && mask.first_event.is_none() {
            return Err(TweakError::MissingFirstEvent);
        }

        if let Some(first) = mask.first_event {
            if self.lhe_input {
                config.source.skip_events = Some(first.saturating_sub(1));
            } else if has_primary {
                config.source.skip_events = Some(first);
            } else {
                config.source.first_event = Some(first);
            }
        }

        match mask.first_run {
            Some(run) => config.source.first_run = Some(run),
            None if !has_primary => config.source.first_run = Some(1),
            None => {}
        }

        if !mask.run_and_lumis.is_empty() {
            config.source.lumis_to_process = mask.run_and_lumis.lumis_to_process();
        }

        Ok(())
    }

    fn fix_output_modules(&self, config: &mut ProcessConfig) {
        let group = self.lfn_group();

        for name in &self.output_modules {
            let file_name = format!("{}.root", name);
            let module = config
                .output_modules
                .entry(name.clone())
                .or_insert_with(OutputModule::default);

            if let Some(base) = &self.lfn_base {
                module.logical_file_name = Some(format!("{}/{}/{}", base, group, file_name));
            }
            module.file_name = file_name;
        }
    }

    fn fix_seeds<R: Rng + ?Sized>(&self, config: &mut ProcessConfig, rng: &mut R) {
        match &self.seeding {
            None => {}
            Some(Seeding::Reproducible) => info!("Reproducible seeding: keeping configured seeds"),
            Some(Seeding::Automatic(policy)) => match &mut config.random_number_generator_service {
                Some(engines) => {
                    for (name, engine) in engines.iter_mut() {
                        engine.initial_seed = rng.gen_range(1..=MAX_SEED);
                        debug!("Seeded engine {} with {}", name, engine.initial_seed);
                    }
                    info!("{} seeding: drew seeds for {} engines", policy, engines.len());
                }
                None => warn!("{} seeding requested but no random engines are configured", policy),
            },
        }
    }
}

/// Tweaks `location/PSet.json` into `location/PSet.tweaked.json`.
///
/// Nothing is written if loading or tweaking fails.
pub fn setup_pset(
    location: &Path,
    tweak: &PsetTweak,
    files: &[InputFileDescriptor],
    mask: &JobMask,
) -> Result<PathBuf, TweakError> {
    let mut config = ProcessConfig::load(&location.join(PSET_INPUT))?;
    tweak.apply(&mut config, files, mask)?;

    let output = location.join(PSET_OUTPUT);
    config.save(&output)?;
    Ok(output)
}
