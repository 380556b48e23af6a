//! Stage DAG with a persistent state file.
//!
//! Stages run in topological order (the vec is already sorted). A stage is
//! skipped when its cached outputs are provably current, executed otherwise.
//! Failure persists the error and aborts; a later invocation resumes from
//! the failed stage because everything before it still cache-skips.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Map;
use crate::cli::Options;
use crate::config::SourceConfig;
use crate::path::PathManager;
use crate::utils::write_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageState {
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// On-disk pipeline state. Stages this build does not know about are
/// retained verbatim: the map is read whole and only our keys are updated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineState {
    pub stages: Map<String, StageState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl PipelineState {
    /// Load the state file. An unreadable file refuses to run: the operator
    /// must remove or repair it, silently starting over would hide whatever
    /// corrupted it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        crate::utils::read_json(path).with_context(|| {
            format!(
                "state file {} is unreadable; remove or repair it before rerunning",
                path.display()
            )
        })
    }

    fn persist(&mut self, path: &Path, pretty: bool) -> Result<()> {
        self.last_update = Some(Utc::now());
        write_json(path, self, pretty)
    }

    fn set(&mut self, name: &str, update: impl FnOnce(&mut StageState)) {
        let entry = self.stages.entry(name.to_string()).or_default();
        update(entry);
    }
}

/// Everything a stage body gets to see.
pub struct StageCtx<'a> {
    pub pm: &'a PathManager,
    pub cfg: &'a SourceConfig,
    pub opts: &'a Options,
}

pub struct Stage {
    pub name: &'static str,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub run: fn(&StageCtx) -> Result<()>,
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|md| md.modified()).ok()
}

/// Outputs exist and are at least as new as every input that exists.
fn outputs_current(stage: &Stage) -> bool {
    let mut oldest_output: Option<SystemTime> = None;
    for output in &stage.outputs {
        match mtime(output) {
            None => return false,
            Some(t) => {
                oldest_output = Some(match oldest_output {
                    None => t,
                    Some(prev) => prev.min(t),
                });
            }
        }
    }
    let Some(oldest_output) = oldest_output else {
        return false;
    };
    stage
        .inputs
        .iter()
        .filter_map(|input| mtime(input))
        .all(|input_time| oldest_output >= input_time)
}

fn inputs_missing(stage: &Stage) -> bool {
    !stage.inputs.is_empty() && stage.inputs.iter().all(|input| !input.exists())
}

/// Execute the stage list. `force` reruns everything; `from_stage` reruns
/// the named stage and every stage downstream of it through its artifacts.
pub fn run_pipeline(
    ctx: &StageCtx,
    stages: &[Stage],
    force: bool,
    from_stage: Option<&str>,
) -> Result<()> {
    let state_path = ctx.pm.path_state();
    let mut state = PipelineState::load(&state_path)?;

    if let Some(name) = from_stage {
        if !stages.iter().any(|s| s.name == name) {
            bail!(
                "unknown stage '{name}'. Stages: {}",
                stages.iter().map(|s| s.name).collect::<Vec<_>>().join(" | ")
            );
        }
    }

    // descendants of from_stage, via artifact reachability
    let mut dirty_paths: Vec<PathBuf> = Vec::new();
    let mut seen_from = false;

    for stage in stages {
        let mut forced = force;
        if let Some(name) = from_stage {
            if stage.name == name {
                seen_from = true;
                forced = true;
            } else if seen_from && stage.inputs.iter().any(|i| dirty_paths.contains(i)) {
                forced = true;
            }
        }
        if forced {
            dirty_paths.extend(stage.outputs.iter().cloned());
        }

        // a skipped stage stays cached: its outputs were validated when it
        // was first marked completed, and again on every later skip
        let completed = state
            .stages
            .get(stage.name)
            .is_some_and(|s| {
                matches!(s.status, StageStatus::Completed | StageStatus::Skipped)
            });

        if !forced && completed && outputs_current(stage) {
            tracing::debug!("stage {}: cached", stage.name);
            state.set(stage.name, |s| s.status = StageStatus::Skipped);
            state.persist(&state_path, ctx.opts.pretty)?;
            continue;
        }

        if inputs_missing(stage) {
            tracing::info!("stage {}: inputs missing, skipping", stage.name);
            state.set(stage.name, |s| {
                s.status = StageStatus::Skipped;
                s.error = None;
            });
            state.persist(&state_path, ctx.opts.pretty)?;
            continue;
        }

        if !ctx.opts.quiet {
            println!("▶ {}", stage.name);
        }
        state.set(stage.name, |s| {
            s.status = StageStatus::Running;
            s.start_time = Some(Utc::now());
            s.end_time = None;
            s.error = None;
        });
        state.persist(&state_path, ctx.opts.pretty)?;

        match (stage.run)(ctx) {
            Ok(()) => {
                state.set(stage.name, |s| {
                    s.status = StageStatus::Completed;
                    s.end_time = Some(Utc::now());
                });
                state.persist(&state_path, ctx.opts.pretty)?;
            }
            Err(err) => {
                let message = format!("{err:#}");
                state.set(stage.name, |s| {
                    s.status = StageStatus::Failed;
                    s.end_time = Some(Utc::now());
                    s.error = Some(message.clone());
                });
                state.persist(&state_path, ctx.opts.pretty)?;
                return Err(err.context(format!("stage '{}' failed", stage.name)));
            }
        }
    }

    Ok(())
}

/// The per-stage status table, one row per known stage plus any rows the
/// state file carries for stages we no longer know.
pub fn status_table(pm: &PathManager, stages: &[Stage]) -> Result<Vec<(String, StageState)>> {
    let state = PipelineState::load(&pm.path_state())?;
    let mut rows: Vec<(String, StageState)> = stages
        .iter()
        .map(|stage| {
            let row = state.stages.get(stage.name).cloned().unwrap_or_default();
            (stage.name.to_string(), row)
        })
        .collect();
    for (name, row) in &state.stages {
        if !stages.iter().any(|s| s.name == name) {
            rows.push((name.clone(), row.clone()));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn scratch() -> (tempfile::TempDir, PathManager) {
        let dir = tempfile::tempdir().unwrap();
        let pm = PathManager::new(dir.path());
        pm.setup_dirs().unwrap();
        (dir, pm)
    }

    fn ctx_parts() -> (SourceConfig, Options) {
        (SourceConfig::default(), Options::default())
    }

    fn touch(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    fn stage_ok(name: &'static str, inputs: Vec<PathBuf>, outputs: Vec<PathBuf>) -> Stage {
        fn nop(_: &StageCtx) -> Result<()> {
            Ok(())
        }
        Stage {
            name,
            inputs,
            outputs,
            run: nop,
        }
    }

    #[test]
    fn corrupt_state_refuses_to_run() {
        let (_dir, pm) = scratch();
        touch(&pm.path_state(), "{not json");
        let (cfg, opts) = ctx_parts();
        let ctx = StageCtx {
            pm: &pm,
            cfg: &cfg,
            opts: &opts,
        };
        let err = run_pipeline(&ctx, &[], false, None).unwrap_err();
        assert!(format!("{err:#}").contains("remove or repair"));
    }

    #[test]
    fn missing_inputs_mark_skipped() {
        let (_dir, pm) = scratch();
        let (cfg, opts) = ctx_parts();
        let ctx = StageCtx {
            pm: &pm,
            cfg: &cfg,
            opts: &opts,
        };
        let stages = vec![stage_ok(
            "extract",
            vec![pm.dir_dumps().join("absent.bz2")],
            vec![pm.dir_work().join("out.jsonl")],
        )];
        run_pipeline(&ctx, &stages, false, None).unwrap();
        let state = PipelineState::load(&pm.path_state()).unwrap();
        assert_eq!(state.stages["extract"].status, StageStatus::Skipped);
    }

    #[test]
    fn failed_stage_persists_error_and_aborts() {
        let (_dir, pm) = scratch();
        let (cfg, opts) = ctx_parts();
        let ctx = StageCtx {
            pm: &pm,
            cfg: &cfg,
            opts: &opts,
        };
        fn boom(_: &StageCtx) -> Result<()> {
            bail!("kaboom")
        }
        let stages = vec![
            Stage {
                name: "first",
                inputs: vec![],
                outputs: vec![],
                run: boom,
            },
            stage_ok("second", vec![], vec![]),
        ];
        let err = run_pipeline(&ctx, &stages, false, None).unwrap_err();
        assert!(format!("{err:#}").contains("first"));
        let state = PipelineState::load(&pm.path_state()).unwrap();
        assert_eq!(state.stages["first"].status, StageStatus::Failed);
        assert_eq!(state.stages["first"].error.as_deref(), Some("kaboom"));
        // the pipeline aborted before the second stage ran
        assert!(!state.stages.contains_key("second"));
    }

    #[test]
    fn unknown_stages_are_retained() {
        let (_dir, pm) = scratch();
        touch(
            &pm.path_state(),
            r#"{"stages": {"legacy-stage": {"status": "completed"}}}"#,
        );
        let (cfg, opts) = ctx_parts();
        let ctx = StageCtx {
            pm: &pm,
            cfg: &cfg,
            opts: &opts,
        };
        let stages = vec![stage_ok("fresh", vec![], vec![])];
        run_pipeline(&ctx, &stages, false, None).unwrap();
        let state = PipelineState::load(&pm.path_state()).unwrap();
        assert_eq!(state.stages["legacy-stage"].status, StageStatus::Completed);
        assert_eq!(state.stages["fresh"].status, StageStatus::Completed);
    }

    #[test]
    fn unknown_from_stage_is_an_error() {
        let (_dir, pm) = scratch();
        let (cfg, opts) = ctx_parts();
        let ctx = StageCtx {
            pm: &pm,
            cfg: &cfg,
            opts: &opts,
        };
        let stages = vec![stage_ok("only", vec![], vec![])];
        assert!(run_pipeline(&ctx, &stages, false, Some("nope")).is_err());
    }
}
