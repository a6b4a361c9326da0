use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{ExitCode, Stdio};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use spinline::config::{Config, Messages, Style};
use spinline::renderer::Renderer;
use spinline::sink;
use spinline::spinner::Spinner;

#[derive(Parser)]
#[command(
    name = "spinline",
    version,
    about = "Show a spinner while something runs, then report how it went."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON style file (prefix, suffix, progress_glyphs, success_glyph, fail_glyph, hide_cursor)
    #[arg(long, global = true)]
    style: Option<PathBuf>,

    /// Leave the cursor visible while spinning
    #[arg(long, default_value_t = false, global = true)]
    no_hide_cursor: bool,

    /// Draw on stderr instead of stdout
    #[arg(long, default_value_t = false, global = true)]
    stderr: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program under a spinner; its output is shown once it finishes
    Run {
        /// Message shown while the program runs (defaults to the command line)
        #[arg(short, long)]
        message: Option<String>,

        /// Message shown when the program succeeds
        #[arg(long)]
        success_message: Option<String>,

        /// Message shown when the program fails
        #[arg(long)]
        fail_message: Option<String>,

        /// Program and its arguments
        #[arg(required = true, last = true)]
        program: Vec<String>,
    },
    /// Show one spinner that succeeds and one that fails
    Demo {
        /// How long each spinner runs, in milliseconds
        #[arg(short, long, default_value_t = 5000)]
        duration_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut style = match &cli.style {
        Some(path) => Style::load(path)?,
        None => Style::default(),
    };
    if cli.no_hide_cursor {
        style.hide_cursor = false;
    }

    match cli.command {
        Command::Run {
            message,
            success_message,
            fail_message,
            program,
        } => {
            let progress = message.unwrap_or_else(|| program.join(" "));
            let messages = Messages {
                success: success_message.unwrap_or_else(|| progress.clone()),
                fail: fail_message.unwrap_or_else(|| progress.clone()),
                progress,
            };
            run_program(build_spinner(style, messages, cli.stderr)?, &program).await
        }
        Command::Demo { duration_ms } => {
            let duration = Duration::from_millis(duration_ms);

            let mut succeeding = build_spinner(
                style.clone(),
                Messages::from_args(&["Running operation 1"]),
                cli.stderr,
            )?;
            succeeding.run()?;
            tokio::time::sleep(duration).await;
            succeeding.success().await?;

            let mut failing = build_spinner(
                style,
                Messages::from_args(&["Running operation 2"]),
                cli.stderr,
            )?;
            failing.run()?;
            tokio::time::sleep(duration).await;
            failing.fail().await?;

            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_spinner(
    style: Style,
    messages: Messages,
    on_stderr: bool,
) -> anyhow::Result<Box<dyn Renderer>> {
    let mut config = Config::new(style, messages);
    if on_stderr {
        config.sink = Some(sink::stderr());
    }
    Ok(Box::new(Spinner::new(config)?))
}

async fn run_program(
    mut spinner: Box<dyn Renderer>,
    program: &[String],
) -> anyhow::Result<ExitCode> {
    let (name, args) = program.split_first().context("no program given")?;

    spinner.run()?;
    let output = tokio::process::Command::new(name)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            spinner.fail().await?;
            return Err(e).with_context(|| format!("failed to start {name}"));
        }
    };

    if output.status.success() {
        spinner.success().await?;
    } else {
        spinner.fail().await?;
    }
    tracing::info!(status = %output.status, "program finished");

    io::stdout().write_all(&output.stdout)?;
    io::stderr().write_all(&output.stderr)?;

    let code = output.status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
