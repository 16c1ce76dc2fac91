use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use cogless::{COGLESS_VERSION, WorkerConfig, run_file_worker};
use cogless_predictors::create_predictor;

#[derive(Debug, PartialEq)]
struct Args {
    working_dir: PathBuf,
    module_name: String,
    class_name: String,
    poll_interval: Option<Duration>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Args),
    Help,
}

const USAGE: &str = "\
Usage: cogless-file-runner --working-dir <dir> --module-name <name> --class-name <name>

Options:
  --working-dir <dir>       Directory shared with the parent process
  --module-name <name>      Predictor module, e.g. sleep
  --class-name <name>       Predictor class, e.g. Predictor
  --poll-interval-ms <ms>   Idle scan interval [default: 100]
  -h, --help                Print this help";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let args = match parse_args(&args) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{USAGE}");
            process::exit(0);
        }
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!();
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    cogless::init_tracing();
    tracing::info!(version = COGLESS_VERSION, "cogless-file-runner starting");

    process::exit(run(args));
}

fn run(args: Args) -> i32 {
    let mut config = WorkerConfig::new(&args.working_dir, &args.module_name, &args.class_name);
    if let Some(poll_interval) = args.poll_interval {
        config = config.with_poll_interval(poll_interval);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return 2;
        }
    };

    let (module_name, class_name) = (args.module_name, args.class_name);
    let loader = move || create_predictor(&module_name, &class_name).map_err(anyhow::Error::from);

    rt.block_on(async {
        match run_file_worker(config, loader, Arc::new(cogless::ParentProcessNotifier)).await {
            Ok(exit) => {
                tracing::info!(?exit, "cogless-file-runner exiting");
                exit.exit_code()
            }
            Err(e) => {
                tracing::error!(error = %e, "File worker failed");
                2
            }
        }
    })
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut working_dir: Option<PathBuf> = None;
    let mut module_name: Option<String> = None;
    let mut class_name: Option<String> = None;
    let mut poll_interval = None;

    let mut i = 1; // skip argv[0]
    while i < args.len() {
        match args[i].as_str() {
            "--working-dir" => {
                i += 1;
                working_dir = Some(PathBuf::from(
                    args.get(i).ok_or("--working-dir requires a value")?,
                ));
            }
            "--module-name" => {
                i += 1;
                module_name = Some(args.get(i).ok_or("--module-name requires a value")?.clone());
            }
            "--class-name" => {
                i += 1;
                class_name = Some(args.get(i).ok_or("--class-name requires a value")?.clone());
            }
            "--poll-interval-ms" => {
                i += 1;
                let raw = args.get(i).ok_or("--poll-interval-ms requires a value")?;
                let ms: u64 = raw
                    .parse()
                    .map_err(|_| format!("invalid --poll-interval-ms: {raw}"))?;
                poll_interval = Some(Duration::from_millis(ms));
            }
            "--help" | "-h" => return Ok(Command::Help),
            arg if arg.starts_with('-') => return Err(format!("unknown flag: {arg}")),
            arg => return Err(format!("unexpected argument: {arg}")),
        }
        i += 1;
    }

    Ok(Command::Run(Args {
        working_dir: working_dir.ok_or("missing required option: --working-dir")?,
        module_name: module_name.ok_or("missing required option: --module-name")?,
        class_name: class_name.ok_or("missing required option: --class-name")?,
        poll_interval,
    }))
}
