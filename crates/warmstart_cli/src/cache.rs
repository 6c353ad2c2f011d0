//! `warmstart cache` and `warmstart consume`: code caches on disk.
//!
//! The artifact file is an opaque byte blob. `consume` hands it to a fresh
//! context; a rejected artifact is reported and the script is compiled from
//! source unless `--strict` is given.

use warmstart_engine::{CacheOutcome, Context};

use crate::run::print_completion;
use crate::session::{
    default_artifact_path, load_engine, read_artifact, read_source, write_artifact,
    CommandResult,
};
use crate::{CacheArgs, ConsumeArgs, GlobalArgs};

/// Runs the `warmstart cache` command.
pub fn write(args: &CacheArgs, global: &GlobalArgs) -> CommandResult {
    let engine = load_engine(global)?;
    let source = read_source(&args.script)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_artifact_path(&args.script));

    let mut cx = Context::create(&engine);
    let script = cx.compile(&source)?;
    let artifact = cx.create_code_cache(&script)?;
    write_artifact(&output, &artifact)?;

    if !global.quiet {
        eprintln!(
            "      Cached {} ({} bytes) -> {}",
            args.script.display(),
            artifact.len(),
            output.display()
        );
    }
    Ok(0)
}

/// Runs the `warmstart consume` command.
///
/// Exit code 0 when the artifact was consumed, 2 when it was rejected and the
/// script ran from a fresh compile.
pub fn consume(args: &ConsumeArgs, global: &GlobalArgs) -> CommandResult {
    let engine = load_engine(global)?;
    let source = read_source(&args.script)?;
    let path = args
        .artifact
        .clone()
        .unwrap_or_else(|| default_artifact_path(&args.script));
    let artifact = read_artifact(&path)?;

    let mut cx = Context::create(&engine);
    let (script, outcome) = if args.strict {
        (cx.consume_code_cache(&source, &artifact)?, CacheOutcome::Consumed)
    } else {
        cx.compile_or_consume(&source, Some(&artifact))?
    };

    if !global.quiet {
        match outcome {
            CacheOutcome::Consumed => eprintln!("    Consumed {}", path.display()),
            CacheOutcome::Rejected(reason) => {
                eprintln!("    Rejected {} ({reason}), compiled fresh", path.display())
            }
            CacheOutcome::NoCache => {}
        }
    }

    let value = cx.run(&script)?;
    print_completion(&mut cx, &value);
    Ok(exit_code(outcome))
}

fn exit_code(outcome: CacheOutcome) -> i32 {
    match outcome {
        CacheOutcome::Consumed | CacheOutcome::NoCache => 0,
        CacheOutcome::Rejected(_) => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use warmstart_engine::{EngineError, RejectReason};

    struct Fixture {
        dir: tempfile::TempDir,
        config: PathBuf,
    }

    impl Fixture {
        fn new(config: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("warmstart.toml");
            fs::write(&path, config).unwrap();
            Self { dir, config: path }
        }

        fn script(&self, name: &str, text: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        }

        fn global(&self) -> GlobalArgs {
            GlobalArgs {
                quiet: true,
                verbose: false,
                config: Some(self.config.clone()),
            }
        }
    }

    fn cache_args(script: &Path) -> CacheArgs {
        CacheArgs {
            script: script.to_path_buf(),
            output: None,
        }
    }

    fn consume_args(script: &Path, strict: bool) -> ConsumeArgs {
        ConsumeArgs {
            script: script.to_path_buf(),
            artifact: None,
            strict,
        }
    }

    #[test]
    fn cache_then_consume() {
        let fx = Fixture::new("");
        let script = fx.script("sqrt.js", "Math.sqrt(16)");
        assert_eq!(write(&cache_args(&script), &fx.global()).unwrap(), 0);
        assert!(default_artifact_path(&script).is_file());
        assert_eq!(consume(&consume_args(&script, false), &fx.global()).unwrap(), 0);
    }

    #[test]
    fn edited_script_falls_back() {
        let fx = Fixture::new("");
        let script = fx.script("sqrt.js", "Math.sqrt(16)");
        write(&cache_args(&script), &fx.global()).unwrap();
        fs::write(&script, "Math.sqrt(25)").unwrap();
        assert_eq!(consume(&consume_args(&script, false), &fx.global()).unwrap(), 2);
    }

    #[test]
    fn strict_consume_fails_on_rejection() {
        let fx = Fixture::new("");
        let script = fx.script("sqrt.js", "Math.sqrt(16)");
        write(&cache_args(&script), &fx.global()).unwrap();
        fs::write(&script, "Math.sqrt(25)").unwrap();
        let err = consume(&consume_args(&script, true), &fx.global()).err().unwrap();
        let err = err.downcast::<EngineError>().unwrap();
        assert!(matches!(*err, EngineError::Cache(ref e) if e.is_recoverable()));
        assert!(err.to_string().contains(&RejectReason::SourceMismatch.to_string()));
    }

    #[test]
    fn other_config_is_a_version_mismatch() {
        let producer = Fixture::new("");
        let script = producer.script("sqrt.js", "Math.sqrt(16)");
        write(&cache_args(&script), &producer.global()).unwrap();

        let consumer = Fixture::new("[engine]\nhash_seed = 42\n");
        let err = consume(&consume_args(&script, true), &consumer.global())
            .err()
            .unwrap();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let fx = Fixture::new("");
        let script = fx.script("lonely.js", "1");
        let err = consume(&consume_args(&script, false), &fx.global()).err().unwrap();
        assert!(err.to_string().contains("cannot read artifact"));
    }

    #[test]
    fn explicit_output_path() {
        let fx = Fixture::new("");
        let script = fx.script("plain.js", "let a = 1; a + 1");
        let output = fx.dir.path().join("custom.bin");
        let args = CacheArgs {
            script: script.clone(),
            output: Some(output.clone()),
        };
        assert_eq!(write(&args, &fx.global()).unwrap(), 0);
        assert!(output.is_file());
        assert!(!default_artifact_path(&script).exists());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(CacheOutcome::Consumed), 0);
        assert_eq!(exit_code(CacheOutcome::NoCache), 0);
        assert_eq!(exit_code(CacheOutcome::Rejected(RejectReason::Malformed)), 2);
    }
}
