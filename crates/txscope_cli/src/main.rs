//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `txscope_core` linkage and run one provided-session round trip.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `txscope_cli [db_path] [log_dir]`. Without `db_path` a database is
//! created in the system temp directory. Logs are written only when an
//! absolute `log_dir` is given.

use std::path::PathBuf;
use std::process::ExitCode;
use txscope_core::{
    default_log_level, guarded, init_logging, AllowAllGate, CallerIdentity, ProvideSession,
    SqliteSessionFactory, TaskInstance, TaskInstanceKey, TaskInstanceService, TaskState,
};

const DEFAULT_DB_FILE_NAME: &str = "txscope_smoke.sqlite3";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

    if let Some(log_dir) = args.next() {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("txscope_cli logging=disabled error={err}");
        }
    }

    println!("txscope_core ping={}", txscope_core::ping());
    println!("txscope_core version={}", txscope_core::core_version());

    match run_smoke(db_path) {
        Ok(instance) => {
            println!(
                "txscope_core task={} state={} try_number={}",
                instance.key,
                instance.state.as_str(),
                instance.try_number
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("txscope_core smoke=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke(db_path: PathBuf) -> Result<TaskInstance, Box<dyn std::error::Error>> {
    let service = TaskInstanceService::new(ProvideSession::new(SqliteSessionFactory::open(
        db_path,
    )));
    let caller = CallerIdentity::new("txscope_cli").with_role("smoke");
    let key = TaskInstanceKey::new("smoke", "probe", "manual");

    let instance = guarded(&AllowAllGate, &caller, || {
        service.record(None, &TaskInstance::queued(key.clone()))?;
        service.set_state(None, &key, TaskState::Running)
    })??;
    Ok(instance)
}
