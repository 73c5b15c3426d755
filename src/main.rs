use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gruntfile_editor::output::{write_gruntfile, WriteResult};
use gruntfile_editor::plan::{apply_plan, discover_plan_files, load_from_path, EditOutcome};
use gruntfile_editor::{GruntfileEditor, DEFAULT_GRUNTFILE};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gruntfile-editor")]
#[command(about = "Idempotent structural edits for Gruntfile.js", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edit plans to a Gruntfile
    Apply {
        /// Gruntfile to edit (the default template is used if it does not exist)
        #[arg(short, long, default_value = "Gruntfile.js")]
        file: PathBuf,

        #[command(flatten)]
        source: PlanSource,

        /// Dry run - show what would change without writing the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print the resulting Gruntfile instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Report whether applying the plans would change the Gruntfile
    Status {
        #[arg(short, long, default_value = "Gruntfile.js")]
        file: PathBuf,

        #[command(flatten)]
        source: PlanSource,
    },

    /// Print the default Gruntfile template
    Default,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PlanSource {
    /// A single edit plan
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Directory of edit plans, applied in file name order
    #[arg(long)]
    plans: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            file,
            source,
            dry_run,
            diff,
            stdout,
        } => cmd_apply(&file, &source, dry_run, diff, stdout),

        Commands::Status { file, source } => cmd_status(&file, &source),

        Commands::Default => {
            print!("{DEFAULT_GRUNTFILE}");
            Ok(())
        }
    }
}

/// Plan files named on the command line, or every `.toml` directly inside
/// the plans directory.
fn collect_plan_files(source: &PlanSource) -> Result<Vec<PathBuf>> {
    match (&source.plan, &source.plans) {
        (Some(plan), _) => Ok(vec![plan.clone()]),
        (None, Some(dir)) => Ok(discover_plan_files(dir)?),
        (None, None) => anyhow::bail!("either --plan or --plans is required"),
    }
}

/// Editor for `file`, plus the file's current text when it exists.
fn load_editor(file: &Path) -> Result<(GruntfileEditor, Option<String>)> {
    match fs::read_to_string(file) {
        Ok(text) => {
            let editor = GruntfileEditor::from_source(&text)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            Ok((editor, Some(text)))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!(file = %file.display(), "file not found, starting from the default template");
            Ok((GruntfileEditor::new(), None))
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", file.display())),
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    eprintln!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    eprintln!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        eprint!("{}", sign);
    }
}

#[derive(Default)]
struct Totals {
    applied: usize,
    already_applied: usize,
    failed: usize,
}

/// Apply every plan to `editor`, reporting each edit on stderr.
fn run_plans(editor: &mut GruntfileEditor, plan_files: &[PathBuf], dry_run: bool) -> Totals {
    let mut totals = Totals::default();

    for plan_file in plan_files {
        eprintln!("Loading edits from {}...", plan_file.display());

        let plan = match load_from_path(plan_file) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                totals.failed += 1;
                continue;
            }
        };

        match apply_plan(&plan, editor) {
            Ok(outcomes) => {
                for outcome in outcomes {
                    match outcome {
                        EditOutcome::Applied { label } if dry_run => {
                            eprintln!("{} {}: Would apply", "✓".green(), label);
                            totals.applied += 1;
                        }
                        EditOutcome::Applied { label } => {
                            eprintln!("{} {}: Applied", "✓".green(), label);
                            totals.applied += 1;
                        }
                        EditOutcome::AlreadyApplied { label } => {
                            eprintln!("{} {}: Already applied", "⊙".yellow(), label);
                            totals.already_applied += 1;
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                eprintln!("  No edits from {} were applied", plan_file.display());
                totals.failed += 1;
            }
        }
    }

    totals
}

fn cmd_apply(
    file: &Path,
    source: &PlanSource,
    dry_run: bool,
    show_diff: bool,
    stdout: bool,
) -> Result<()> {
    let plan_files = collect_plan_files(source)?;
    let (mut editor, original) = load_editor(file)?;

    if dry_run {
        eprintln!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }
    let totals = run_plans(&mut editor, &plan_files, dry_run);
    let text = editor.serialize();

    if show_diff {
        let before = original.as_deref().unwrap_or("");
        if before != text {
            display_diff(file, before, &text);
        }
    }

    eprintln!();
    eprintln!("{}", "Summary:".bold());
    eprintln!("  {} applied", format!("{}", totals.applied).green());
    eprintln!(
        "  {} already applied",
        format!("{}", totals.already_applied).yellow()
    );
    eprintln!("  {} failed", format!("{}", totals.failed).red());

    if totals.failed > 0 {
        eprintln!("{}", format!("Not writing {}", file.display()).red());
        std::process::exit(1);
    }

    if stdout {
        print!("{text}");
    } else if !dry_run {
        match write_gruntfile(file, &text)? {
            WriteResult::Written { bytes } => {
                eprintln!("Wrote {} ({} bytes)", file.display(), bytes);
            }
            WriteResult::Unchanged => {
                eprintln!("{}", format!("{} unchanged", file.display()).dimmed());
            }
        }
    }

    Ok(())
}

fn cmd_status(file: &Path, source: &PlanSource) -> Result<()> {
    let plan_files = collect_plan_files(source)?;
    let (mut editor, original) = load_editor(file)?;

    println!("{}", "Gruntfile Status Report".bold());
    println!("File: {}", file.display());
    println!();

    let totals = run_plans(&mut editor, &plan_files, true);
    let pending = original.as_deref() != Some(editor.serialize().as_str());

    println!();
    if totals.failed > 0 {
        println!("{}", format!("{} plan(s) failed to apply", totals.failed).red());
        std::process::exit(2);
    }
    if pending {
        println!(
            "{}",
            format!("{} edit(s) pending", totals.applied).yellow()
        );
        std::process::exit(1);
    }
    println!("{}", "Up to date".green());

    Ok(())
}
